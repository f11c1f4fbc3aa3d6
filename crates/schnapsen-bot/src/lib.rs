//! Decision engine for two-player trick-taking games with hidden cards.
//!
//! A [`SearchOrchestrator`] samples concrete worlds consistent with what a
//! player can see, grows one [`GameTree`] per world on a [`WorkerPool`], and
//! merges the per-world statistics into a single move. When nothing is
//! hidden the [`AlphaBeta`] engine can solve the position instead.

pub mod aggregate;
pub mod budget;
pub mod config;
pub mod determinize;
pub mod error;
pub mod exact;
pub mod orchestrator;
pub mod policy;
pub mod pool;
pub mod search;

pub use aggregate::{AggregateOptions, MergeStrategy, RankedAction, aggregate, select_best};
pub use budget::{BudgetTracker, SearchBudget};
pub use config::SearchConfig;
pub use determinize::{
    Determinizer, DeterminizerKind, LexicographicDeterminizer, PermutationRequest,
    RandomDeterminizer, StratifiedDeterminizer, distinct_count,
};
pub use error::SearchError;
pub use exact::{AlphaBeta, Bound, CacheEntry, SearchStats};
pub use orchestrator::{Decision, SearchOrchestrator};
pub use policy::{ExactPolicy, Policy, RandomPolicy, SearchPolicy};
pub use pool::WorkerPool;
pub use search::{GameTree, Node, NodeId, ScoringInfo, SearchReport, WorldScores};
