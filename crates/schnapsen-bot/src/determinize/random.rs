use super::lexicographic::enumerate;
use super::{Determinizer, PermutationRequest, distinct_count};
use rand::Rng;
use rand::seq::SliceRandom;
use schnapsen_core::rules::Permutation;
use std::collections::HashSet;
use std::hash::Hash;

/// Above this share of the space, enumerate and subsample instead of
/// rejection sampling.
const ENUMERATION_SHARE: u128 = 2;
const MAX_ATTEMPTS_PER_SAMPLE: usize = 64;

/// Uniform sampling over outcome-distinct permutations.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomDeterminizer;

impl Determinizer for RandomDeterminizer {
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
        let total = distinct_count(unseen.len(), opponent_slots);
        let target = request.resolve(total);
        if target == 0 {
            return Vec::new();
        }
        if (target as u128).saturating_mul(ENUMERATION_SHARE) >= total {
            let mut all = enumerate(unseen, opponent_slots, usize::MAX);
            if target >= all.len() {
                return all;
            }
            all.shuffle(rng);
            all.truncate(target);
            return all;
        }

        let mut seen = HashSet::with_capacity(target);
        let mut out = Vec::with_capacity(target);
        let mut pool = unseen.to_vec();
        let mut attempts = target.saturating_mul(MAX_ATTEMPTS_PER_SAMPLE);
        while out.len() < target && attempts > 0 {
            attempts -= 1;
            pool.shuffle(rng);
            let candidate = Permutation::new(pool.clone(), opponent_slots);
            if seen.insert(candidate.clone()) {
                out.push(candidate);
            }
        }
        out
    }
}
