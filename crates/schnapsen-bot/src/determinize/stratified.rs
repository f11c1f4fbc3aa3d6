use super::tables::CombinatoricsTable;
use super::{Determinizer, PermutationRequest, RandomDeterminizer, distinct_count};
use rand::Rng;
use schnapsen_core::rules::Permutation;
use std::hash::Hash;

/// Splits the ranked permutation space into equal-width strata and draws
/// one index from each.
///
/// Rank `r` decodes as `r / (n-k)!` for the opponent's hand (a
/// lexicographic `k`-subset) and `r % (n-k)!` for the draw pile order,
/// so ranks follow the same order [`super::LexicographicDeterminizer`]
/// enumerates in.
///
/// Spaces too large to rank in a `u128` (more than 34 unseen cards) are
/// sampled by [`RandomDeterminizer`] instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct StratifiedDeterminizer;

impl Determinizer for StratifiedDeterminizer {
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
        let n = unseen.len();
        let total = distinct_count(n, opponent_slots);
        let target = request.resolve(total);
        if target == 0 {
            return Vec::new();
        }
        let strata = target as u128;
        if total == u128::MAX || total.checked_mul(strata).is_none() {
            return RandomDeterminizer.generate(unseen, opponent_slots, request, rng);
        }
        let mut sorted = unseen.to_vec();
        sorted.sort();
        let table = CombinatoricsTable::new(n);
        (0..strata)
            .map(|stratum| {
                let low = stratum * total / strata;
                let high = (stratum + 1) * total / strata;
                let rank = rng.gen_range(low..high);
                unrank(&table, &sorted, opponent_slots, rank)
            })
            .collect()
    }
}

fn unrank<C: Copy + Ord>(
    table: &CombinatoricsTable,
    sorted: &[C],
    opponent_slots: usize,
    rank: u128,
) -> Permutation<C> {
    let n = sorted.len();
    let pile_orders = table.factorial(n - opponent_slots);
    let hand_indices = table.unrank_combination(rank / pile_orders, n, opponent_slots);
    let mut in_hand = vec![false; n];
    for &index in &hand_indices {
        in_hand[index] = true;
    }
    let rest: Vec<C> = sorted
        .iter()
        .enumerate()
        .filter(|(index, _)| !in_hand[*index])
        .map(|(_, card)| *card)
        .collect();
    let mut cards: Vec<C> = hand_indices.iter().map(|&index| sorted[index]).collect();
    cards.extend(table.unrank_permutation(rank % pile_orders, rest));
    Permutation::new(cards, opponent_slots)
}
