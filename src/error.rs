use thiserror::Error;

/// Caller errors surfaced by the rating engine.
///
/// Malformed cells, empty cohorts and zero divisors are not errors; they resolve to `0`
/// locally. Only configuration mismatches between the caller and the catalog end up here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("unknown profile: {0}")]
    UnknownProfile(String),
    #[error("unknown position: {0}")]
    UnknownPosition(String),
    #[error("no metrics selected")]
    EmptyMetricSet,
}
