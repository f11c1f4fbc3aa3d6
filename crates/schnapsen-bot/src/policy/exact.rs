use super::{Policy, SearchPolicy};
use crate::aggregate::{AggregateOptions, MergeStrategy, RankedAction, aggregate, select_best};
use crate::config::SearchConfig;
use crate::determinize::{Determinizer, PermutationRequest, RandomDeterminizer};
use crate::error::SearchError;
use crate::exact::AlphaBeta;
use crate::search::{ScoringInfo, WorldScores};
use rand::SeedableRng;
use rand::rngs::StdRng;
use schnapsen_core::model::card::Card;
use schnapsen_core::model::round::RoundState;
use schnapsen_core::model::view::PlayerView;
use schnapsen_core::rules::ObservedState;
use tracing::{Level, event};

/// Stock size (hidden cards plus the turned trump) at which the solver
/// takes over from tree search.
pub const DEFAULT_SOLVER_STOCK: usize = 2;

/// Alpha-beta over every consistent world once the stock is nearly gone.
///
/// Each world is solved exactly and the per-card values are averaged, so
/// with an empty stock (one world) play is perfect. Earlier in the deal the
/// full game is too deep to solve, so moves come from tree search.
pub struct ExactPolicy {
    engine: AlphaBeta<RoundState>,
    rng: StdRng,
    fallback: SearchPolicy,
    solver_stock: usize,
    max_worlds: usize,
}

impl ExactPolicy {
    pub fn new(fallback: SearchConfig, seed: u64) -> Result<Self, SearchError> {
        let max_worlds = fallback.max_permutations;
        Ok(Self {
            engine: AlphaBeta::new(),
            rng: StdRng::seed_from_u64(seed),
            fallback: SearchPolicy::new(fallback, seed.wrapping_add(1))?,
            solver_stock: DEFAULT_SOLVER_STOCK,
            max_worlds,
        })
    }

    pub fn with_solver_stock(mut self, stock: usize) -> Self {
        self.solver_stock = stock;
        self
    }

    pub fn engine(&self) -> &AlphaBeta<RoundState> {
        &self.engine
    }

    /// Mean exact value of each legal card over the consistent worlds, best
    /// first. At most `max_permutations` worlds are solved.
    pub fn rank_cards(&mut self, view: &PlayerView) -> Result<Vec<RankedAction<Card>>, SearchError> {
        let permutations = RandomDeterminizer.generate(
            &view.unseen_cards(),
            view.opponent_unknown_count(),
            PermutationRequest::Count(self.max_worlds),
            &mut self.rng,
        );
        let worlds: Vec<WorldScores<Card>> = permutations
            .iter()
            .map(|permutation| {
                let world = view.determinize(permutation);
                self.engine
                    .action_values(&world)
                    .into_iter()
                    .map(|(card, value)| (card, ScoringInfo::exact(value)))
                    .collect()
            })
            .collect();
        let ranking = aggregate(
            &worlds,
            &AggregateOptions::with_strategy(MergeStrategy::Mean),
            &mut self.rng,
        )
        .map_err(|err| match err {
            SearchError::EmptyAggregation => SearchError::NoLegalActions,
            other => other,
        })?;
        if tracing::enabled!(Level::TRACE) {
            event!(
                target: "schnapsen_bot::exact",
                Level::TRACE,
                worlds = worlds.len() as u64,
                fully_observed = view.is_fully_observed(),
                best = ranking.first().map(|entry| entry.score),
                cache = self.engine.cache_len() as u64,
            );
        }
        Ok(ranking)
    }
}

impl Policy for ExactPolicy {
    fn name(&self) -> &str {
        "exact"
    }

    fn choose_play(&mut self, view: &PlayerView) -> Result<Card, SearchError> {
        if view.stock_len() <= self.solver_stock {
            let ranking = self.rank_cards(view)?;
            select_best(&ranking, &mut self.rng)
        } else {
            self.fallback.choose_play(view)
        }
    }

    fn shutdown(&mut self) {
        self.fallback.shutdown();
    }
}
