use super::{Determinizer, PermutationRequest, distinct_count};
use rand::Rng;
use schnapsen_core::rules::Permutation;
use std::hash::Hash;

/// Enumerates permutations in ascending order of (opponent hand, draw pile).
///
/// Ignores the rng; the output depends only on the unseen set.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicographicDeterminizer;

impl Determinizer for LexicographicDeterminizer {
    fn generate<C, R>(
        &self,
        unseen: &[C],
        opponent_slots: usize,
        request: PermutationRequest,
        _rng: &mut R,
    ) -> Vec<Permutation<C>>
    where
        C: Copy + Ord + Hash,
        R: Rng + ?Sized,
    {
        let target = request.resolve(distinct_count(unseen.len(), opponent_slots));
        enumerate(unseen, opponent_slots, target)
    }
}

pub(crate) fn enumerate<C>(unseen: &[C], opponent_slots: usize, target: usize) -> Vec<Permutation<C>>
where
    C: Copy + Ord,
{
    let mut out = Vec::with_capacity(target.min(4096));
    if target == 0 || opponent_slots > unseen.len() {
        return out;
    }
    let mut sorted = unseen.to_vec();
    sorted.sort();
    let n = sorted.len();
    let mut combo: Vec<usize> = (0..opponent_slots).collect();
    loop {
        let mut in_hand = vec![false; n];
        for &index in &combo {
            in_hand[index] = true;
        }
        let hand: Vec<C> = combo.iter().map(|&index| sorted[index]).collect();
        let mut pile: Vec<C> = sorted
            .iter()
            .enumerate()
            .filter(|(index, _)| !in_hand[*index])
            .map(|(_, card)| *card)
            .collect();
        loop {
            let mut cards = hand.clone();
            cards.extend_from_slice(&pile);
            out.push(Permutation::new(cards, opponent_slots));
            if out.len() == target {
                return out;
            }
            if !next_permutation(&mut pile) {
                break;
            }
        }
        if !next_combination(&mut combo, n) {
            return out;
        }
    }
}

/// Advances `items` to the next lexicographic permutation in place.
fn next_permutation<T: Ord>(items: &mut [T]) -> bool {
    if items.len() < 2 {
        return false;
    }
    let mut pivot = items.len() - 1;
    while pivot > 0 && items[pivot - 1] >= items[pivot] {
        pivot -= 1;
    }
    if pivot == 0 {
        return false;
    }
    let mut successor = items.len() - 1;
    while items[successor] <= items[pivot - 1] {
        successor -= 1;
    }
    items.swap(pivot - 1, successor);
    items[pivot..].reverse();
    true
}

/// Advances a sorted `k`-subset of `0..n` to its lexicographic successor.
fn next_combination(combo: &mut [usize], n: usize) -> bool {
    let k = combo.len();
    let Some(position) = (0..k).rev().find(|&i| combo[i] < n - k + i) else {
        return false;
    };
    combo[position] += 1;
    for i in (position + 1)..k {
        combo[i] = combo[i - 1] + 1;
    }
    true
}
