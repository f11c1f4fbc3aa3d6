use thiserror::Error;

/// Failures surfaced by the decision engine.
///
/// None of these are retried internally: a failed decision request is
/// reported to the caller as-is.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SearchError {
    #[error("iteration budget must be positive (got {iterations}) unless a time limit is set")]
    InvalidBudget { iterations: usize },
    #[error("invalid search configuration: {field}: {message}")]
    InvalidConfig {
        field: &'static str,
        message: String,
    },
    #[error("no legal actions at the root position")]
    NoLegalActions,
    #[error("cannot aggregate an empty set of permutation results")]
    EmptyAggregation,
    #[error("full-information search found {count} consistent permutations, expected exactly 1")]
    FullInformationViolated { count: u128 },
    #[error("worker {worker} failed: {message}")]
    WorkerFailed { worker: usize, message: String },
    #[error("worker pool has been shut down")]
    PoolShutdown,
}
