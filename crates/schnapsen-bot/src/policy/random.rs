use super::Policy;
use crate::error::SearchError;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use schnapsen_core::model::card::Card;
use schnapsen_core::model::view::PlayerView;

/// Uniformly random legal card. Baseline opponent for the bench.
pub struct RandomPolicy {
    rng: StdRng,
}

impl RandomPolicy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Policy for RandomPolicy {
    fn name(&self) -> &str {
        "random"
    }

    fn choose_play(&mut self, view: &PlayerView) -> Result<Card, SearchError> {
        view.legal_cards()
            .choose(&mut self.rng)
            .copied()
            .ok_or(SearchError::NoLegalActions)
    }
}
