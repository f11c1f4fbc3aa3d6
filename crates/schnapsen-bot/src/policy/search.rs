use super::Policy;
use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::orchestrator::{Decision, SearchOrchestrator};
use schnapsen_core::model::card::Card;
use schnapsen_core::model::round::RoundState;
use schnapsen_core::model::view::PlayerView;

/// Determinized tree search through a [`SearchOrchestrator`].
pub struct SearchPolicy {
    orchestrator: SearchOrchestrator<PlayerView>,
    config: SearchConfig,
    last_decision: Option<Decision<RoundState>>,
}

impl SearchPolicy {
    pub fn new(config: SearchConfig, seed: u64) -> Result<Self, SearchError> {
        config.validate()?;
        Ok(Self {
            orchestrator: SearchOrchestrator::with_seed(seed),
            config,
            last_decision: None,
        })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn last_decision(&self) -> Option<&Decision<RoundState>> {
        self.last_decision.as_ref()
    }
}

impl Policy for SearchPolicy {
    fn name(&self) -> &str {
        "search"
    }

    fn choose_play(&mut self, view: &PlayerView) -> Result<Card, SearchError> {
        let decision = self.orchestrator.decide(view, &self.config)?;
        let card = decision.action;
        self.last_decision = Some(decision);
        Ok(card)
    }

    fn shutdown(&mut self) {
        self.orchestrator.shutdown();
    }
}
