//! Narrow interface between the decision engine and a rules implementation.
//!
//! - `GameState`: a fully observable position (legality, transition, payoffs).
//! - `ObservedState`: a position as one player sees it, with hidden slots erased.
//! - `Observable`: produces the observed view of a full position.
//! - `Permutation`: one concrete assignment of the unseen cards.

mod permutation;

pub use permutation::Permutation;

use std::fmt::Debug;
use std::hash::Hash;

/// A fully observable game position.
///
/// Implementations must be pure: `apply` returns a new state and never mutates
/// the receiver. Structural `Eq`/`Hash` make states usable as cache keys.
pub trait GameState: Clone + Eq + Hash + Debug + Send + Sync + 'static {
    type Action: Copy + Eq + Ord + Hash + Debug + Send + Sync + 'static;
    type Player: Copy + Eq + Hash + Debug + Send + Sync + 'static;

    fn legal_actions(&self) -> Vec<Self::Action>;

    /// Applies a legal action. Behaviour for illegal actions is unspecified.
    fn apply(&self, action: Self::Action) -> Self;

    fn is_terminal(&self) -> bool;

    /// Signed payoff for `player` at a terminal state (own minus opponent).
    fn terminal_value(&self, player: Self::Player) -> f64;

    fn acting_player(&self) -> Self::Player;
}

/// A position seen from one player's perspective.
pub trait ObservedState: Clone + Debug + Send + Sync + 'static {
    type Card: Copy + Ord + Hash + Debug + Send + Sync + 'static;
    type World: GameState;

    fn perspective(&self) -> <Self::World as GameState>::Player;

    /// Every card whose location is unknown to the observer, sorted.
    fn unseen_cards(&self) -> Vec<Self::Card>;

    /// How many of the unseen cards sit in the opponent's hand.
    fn opponent_unknown_count(&self) -> usize;

    /// Materialises the full position described by `permutation`.
    fn determinize(&self, permutation: &Permutation<Self::Card>) -> Self::World;

    /// True when exactly one world is consistent with the observation: every
    /// unseen card must sit in the opponent's hand, whose order is irrelevant.
    fn is_fully_observed(&self) -> bool {
        self.unseen_cards().len() == self.opponent_unknown_count()
    }
}

/// A game state that can erase what `player` is not allowed to see.
pub trait Observable: GameState {
    type View: ObservedState<World = Self>;

    fn observer_view(&self, player: Self::Player) -> Self::View;
}
