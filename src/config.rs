//! Checker configuration — the enumerated options of the external interface.

use serde::Deserialize;
use std::time::Duration;

/// Which decision procedure a query runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Backend {
    /// External quantifier-free SMT theory solver (Z3).
    Smt,
    /// Decision-diagram backend. Rejects expressions containing unbounded
    /// integers, reals, sequences, or characters (§6).
    DecisionDiagram,
}

/// Which solver call an optimization query should favor internally.
/// Some SMT backends expose a distinct optimizing context separate from
/// the plain satisfiability context; this selects between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum OptimizationContext {
    Solving,
    Optimization,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckerConfig {
    pub backend: Backend,
    /// Maximum materialized length for `list`-typed arbitrary expressions.
    pub list_max_length: u32,
    /// Caller-provided deadline for `check`/`maximize`/`minimize`. When it
    /// elapses the core reports `Timeout` and discards the solver instance.
    #[serde(default, with = "duration_ms_opt")]
    pub timeout: Option<Duration>,
    pub optimization_context: OptimizationContext,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        CheckerConfig {
            backend: Backend::Smt,
            list_max_length: 5,
            timeout: None,
            optimization_context: OptimizationContext::Solving,
        }
    }
}

mod duration_ms_opt {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis: Option<u64> = Option::deserialize(deserializer)?;
        Ok(millis.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_spec_defaults() {
        let cfg = CheckerConfig::default();
        assert_eq!(cfg.backend, Backend::Smt);
        assert_eq!(cfg.list_max_length, 5);
        assert_eq!(cfg.timeout, None);
        assert_eq!(cfg.optimization_context, OptimizationContext::Solving);
    }
}
