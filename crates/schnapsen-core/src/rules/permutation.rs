use serde::Serialize;

/// A determinized world: a concrete card for every unknown slot.
///
/// The first `split` cards fill the opponent's unknown hand slots and are kept
/// sorted, since the order of a hand never changes the outcome. The remaining
/// cards are the draw pile from the top down and keep their order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Permutation<C> {
    cards: Vec<C>,
    split: usize,
}

impl<C: Ord> Permutation<C> {
    /// Canonicalizes the opponent-hand prefix.
    ///
    /// # Panics
    ///
    /// Panics if `split` exceeds the number of cards.
    pub fn new(mut cards: Vec<C>, split: usize) -> Self {
        assert!(
            split <= cards.len(),
            "opponent slots ({split}) exceed unseen cards ({})",
            cards.len()
        );
        cards[..split].sort();
        Self { cards, split }
    }

    pub fn opponent_hand(&self) -> &[C] {
        &self.cards[..self.split]
    }

    pub fn draw_pile(&self) -> &[C] {
        &self.cards[self.split..]
    }

    pub fn cards(&self) -> &[C] {
        &self.cards
    }

    pub fn split(&self) -> usize {
        self.split
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}
