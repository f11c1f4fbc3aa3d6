//! Incremental game-tree search over one determinized world.

mod node;
mod scoring;
mod tree;

pub use node::{Node, NodeId, ucb};
pub use scoring::{ConfidenceBounds, ScoringInfo, WorldScores};
pub use tree::{DEFAULT_EXPLORATION, GameTree, SearchReport};
