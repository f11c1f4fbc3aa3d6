//! Seat-level players built on top of the engine.

mod exact;
mod random;
mod search;

pub use exact::ExactPolicy;
pub use random::RandomPolicy;
pub use search::SearchPolicy;

use crate::error::SearchError;
use schnapsen_core::model::card::Card;
use schnapsen_core::model::view::PlayerView;

/// Anything that can pick a card for the seat a [`PlayerView`] belongs to.
pub trait Policy: Send {
    fn name(&self) -> &str;

    /// Choose one legal card. Only called when it is the view's turn.
    fn choose_play(&mut self, view: &PlayerView) -> Result<Card, SearchError>;

    /// Release any background resources. Defaults to a no-op.
    fn shutdown(&mut self) {}
}
