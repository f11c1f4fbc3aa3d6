//! Turns "what is unknown to me" into concrete, fully observable worlds.
//!
//! This module is composed of:
//! - `random`: uniform sampling with deduplication.
//! - `lexicographic`: exhaustive, deterministic enumeration.
//! - `stratified`: one sample per equal-width stratum of the ranked space,
//!   driven by binomial and factorial tables.
//!
//! Every generator returns pairwise-distinct [`Permutation`]s whose
//! opponent-hand prefix is sorted, and never more than exist.

mod lexicographic;
mod random;
mod stratified;
mod tables;

pub use lexicographic::LexicographicDeterminizer;
pub use random::RandomDeterminizer;
pub use stratified::StratifiedDeterminizer;

use rand::Rng;
use schnapsen_core::rules::Permutation;
use serde::{Deserialize, Serialize};
use std::hash::Hash;

/// How many permutations a caller wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermutationRequest {
    Count(usize),
    All,
}

impl PermutationRequest {
    /// Caps the request at the number of distinct permutations.
    pub fn resolve(self, total: u128) -> usize {
        let total = usize::try_from(total).unwrap_or(usize::MAX);
        match self {
            PermutationRequest::Count(requested) => requested.min(total),
            PermutationRequest::All => total,
        }
    }
}

/// Number of outcome-distinct permutations of `unseen` cards when
/// `opponent_slots` of them form an unordered hand: `n! / k!`.
///
/// Saturates at `u128::MAX`; zero when the slots exceed the cards.
pub fn distinct_count(unseen: usize, opponent_slots: usize) -> u128 {
    if opponent_slots > unseen {
        return 0;
    }
    ((opponent_slots + 1)..=unseen).fold(1u128, |acc, factor| acc.saturating_mul(factor as u128))
}

/// Shared contract of every permutation generator.
pub trait Determinizer {
    fn generate<C, R>(
        &self,
        unseen: &[C],
        opponent_slots: usize,
        request: PermutationRequest,
        rng: &mut R,
    ) -> Vec<Permutation<C>>
    where
        C: Copy + Ord + Hash,
        R: Rng + ?Sized;
}

/// Configurable choice of generator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeterminizerKind {
    #[default]
    Random,
    Lexicographic,
    Stratified,
}

impl Determinizer for DeterminizerKind {
    fn generate<C, R>(
        &self,
        unseen: &[C],
        opponent_slots: usize,
        request: PermutationRequest,
        rng: &mut R,
    ) -> Vec<Permutation<C>>
    where
        C: Copy + Ord + Hash,
        R: Rng + ?Sized,
    {
        match self {
            DeterminizerKind::Random => {
                RandomDeterminizer.generate(unseen, opponent_slots, request, rng)
            }
            DeterminizerKind::Lexicographic => {
                LexicographicDeterminizer.generate(unseen, opponent_slots, request, rng)
            }
            DeterminizerKind::Stratified => {
                StratifiedDeterminizer.generate(unseen, opponent_slots, request, rng)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinct_count_matches_closed_form() {
        assert_eq!(distinct_count(6, 0), 720);
        assert_eq!(distinct_count(6, 4), 30);
        assert_eq!(distinct_count(6, 6), 1);
        assert_eq!(distinct_count(0, 0), 1);
        assert_eq!(distinct_count(3, 4), 0);
        // 14 unseen cards at the start of a deal, 5 of them in the opponent's hand.
        assert_eq!(distinct_count(14, 5), 2002 * 362_880);
    }

    #[test]
    fn request_is_capped_silently() {
        assert_eq!(PermutationRequest::Count(50).resolve(30), 30);
        assert_eq!(PermutationRequest::Count(5).resolve(30), 5);
        assert_eq!(PermutationRequest::All.resolve(720), 720);
    }
}
