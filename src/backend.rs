//! Backend discovery and per-query telemetry.
//!
//! Both backends named in `CheckerConfig::Backend` are always compiled
//! in, so `available_backends` has no feature-gated branches to report
//! on.

use crate::config::Backend;

/// Lists the backends this build can dispatch to. Both variants are
/// always available — there is no external-tool dependency to probe.
pub fn available_backends() -> Vec<Backend> {
    vec![Backend::Smt, Backend::DecisionDiagram]
}

pub fn is_available(backend: Backend) -> bool {
    available_backends().contains(&backend)
}

/// Per-query telemetry the façade reports after `find`/`maximize`/
/// `minimize` returns, scoped to what this core's single-query model
/// actually tracks.
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckerStats {
    /// Number of distinct `Arbitrary` nodes registered during evaluation.
    pub arbitrary_count: usize,
    /// Number of leaf solver variables allocated (a structured arbitrary
    /// — record/union/list/finite-map — contributes more than one).
    pub solver_variable_count: usize,
    /// Wall-clock time spent inside the backend's `check`/`maximize`/
    /// `minimize` call.
    pub solve_time: std::time::Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_backends_are_always_available() {
        let backends = available_backends();
        assert!(backends.contains(&Backend::Smt));
        assert!(backends.contains(&Backend::DecisionDiagram));
        assert!(is_available(Backend::Smt));
        assert!(is_available(Backend::DecisionDiagram));
    }
}
