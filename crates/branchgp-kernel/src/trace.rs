//! Trace points for covariance construction
//!
//! Three fixed points are instrumented: topology resolution, branch-block
//! inversion and cross-block assembly. All are gated by [`TraceConfig`].

use crate::config::TraceConfig;
use ndarray::Array2;
use std::fmt::Write;

pub(crate) const TOPOLOGY: &str = "branchgp::topology";
pub(crate) const INVERSION: &str = "branchgp::inversion";
pub(crate) const ASSEMBLY: &str = "branchgp::assembly";

/// Emits trace-point events when enabled
#[derive(Debug, Clone, Copy)]
pub(crate) struct Tracer {
    config: TraceConfig,
}

impl Tracer {
    pub(crate) fn new(config: TraceConfig) -> Self {
        Self { config }
    }

    /// Pair map resolved from the topology tensor
    pub(crate) fn topology(&self, functions: usize, depth: usize, pairs: &[((usize, usize), Vec<usize>)]) {
        if !self.config.active() {
            return;
        }
        let coupled = pairs.iter().filter(|(_, idx)| !idx.is_empty()).count();
        for ((fi, fj), indices) in pairs.iter().take(self.config.summarize) {
            tracing::debug!(
                target: TOPOLOGY,
                row_function = fi,
                col_function = fj,
                branch_indices = ?indices,
                "resolved function pair"
            );
        }
        tracing::debug!(target: TOPOLOGY, functions, depth, coupled, "topology resolved");
    }

    /// `Kbb` built and factorised for a function pair
    pub(crate) fn inversion(&self, fi: usize, fj: usize, locations: &[f64], kbb: &Array2<f64>, jitter: f64) {
        if !self.config.active() {
            return;
        }
        tracing::trace!(
            target: INVERSION,
            row_function = fi,
            col_function = fj,
            size = kbb.nrows(),
            jitter,
            branch_locations = %self.render(locations.iter().copied()),
            kbb = %self.render(kbb.iter().copied()),
            "inverted branch block"
        );
    }

    /// Cross block written into the result
    pub(crate) fn assembly(&self, fi: usize, fj: usize, entries: usize, block: &Array2<f64>) {
        if !self.config.active() {
            return;
        }
        tracing::trace!(
            target: ASSEMBLY,
            row_function = fi,
            col_function = fj,
            entries,
            block = %self.render(block.iter().copied()),
            "assembled cross block"
        );
    }

    fn render(&self, values: impl Iterator<Item = f64>) -> String {
        summarize(values, self.config.summarize)
    }
}

/// Render at most `limit` values, eliding the rest
pub(crate) fn summarize(values: impl Iterator<Item = f64>, limit: usize) -> String {
    let mut out = String::from("[");
    let mut rest = 0usize;
    for (i, v) in values.enumerate() {
        if i >= limit {
            rest += 1;
            continue;
        }
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "{v:.4e}");
    }
    if rest > 0 {
        let _ = write!(out, ", ... {rest} more");
    }
    out.push(']');
    out
}
