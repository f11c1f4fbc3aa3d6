//! Fans one tree search per determinized world across the worker pool and
//! merges the per-world statistics into a single decision.

use crate::aggregate::{RankedAction, aggregate, select_best};
use crate::budget::SearchBudget;
use crate::config::SearchConfig;
use crate::determinize::{Determinizer, PermutationRequest, distinct_count};
use crate::error::SearchError;
use crate::exact::AlphaBeta;
use crate::pool::WorkerPool;
use crate::search::{GameTree, ScoringInfo, SearchReport, WorldScores};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use schnapsen_core::rules::{GameState, ObservedState};
use std::marker::PhantomData;
use std::time::{Duration, Instant};
use tracing::{Level, event};

/// Outcome of one decision request.
#[derive(Debug, Clone)]
pub struct Decision<S: GameState> {
    pub action: S::Action,
    /// Every candidate action, best first.
    pub ranking: Vec<RankedAction<S::Action>>,
    /// Worlds actually searched.
    pub worlds: usize,
    /// Distinct worlds consistent with the observer's knowledge.
    pub consistent_worlds: u128,
    /// Worlds whose root was solved outright.
    pub solved_worlds: usize,
    pub iterations: usize,
    /// Decided by the alpha-beta engine rather than tree search.
    pub exact: bool,
    pub elapsed: Duration,
    /// Whole per-world trees, present only with `retain_trees`.
    pub trees: Option<Vec<GameTree<S>>>,
}

struct WorldOutcome<S: GameState> {
    scores: WorldScores<S::Action>,
    report: SearchReport,
    tree: Option<GameTree<S>>,
}

/// Decision engine for one seat.
///
/// Owns the random source (so a seeded orchestrator is reproducible no
/// matter how the pool schedules its work), the worker pool, and the
/// alpha-beta cache, which persists across calls.
pub struct SearchOrchestrator<V: ObservedState> {
    rng: StdRng,
    pool: Option<WorkerPool>,
    exact: AlphaBeta<V::World>,
    shut_down: bool,
    _view: PhantomData<fn(&V)>,
}

impl<V: ObservedState> Default for SearchOrchestrator<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: ObservedState> SearchOrchestrator<V> {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            rng,
            pool: None,
            exact: AlphaBeta::new(),
            shut_down: false,
            _view: PhantomData,
        }
    }

    pub fn exact_engine(&self) -> &AlphaBeta<V::World> {
        &self.exact
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    pub fn choose_action(
        &mut self,
        view: &V,
        config: &SearchConfig,
    ) -> Result<<V::World as GameState>::Action, SearchError> {
        self.decide(view, config).map(|decision| decision.action)
    }

    pub fn decide(&mut self, view: &V, config: &SearchConfig) -> Result<Decision<V::World>, SearchError> {
        if self.shut_down {
            return Err(SearchError::PoolShutdown);
        }
        config.validate()?;
        let budget = config.budget()?;
        let started = Instant::now();

        let unseen = view.unseen_cards();
        let slots = view.opponent_unknown_count();
        let consistent_worlds = distinct_count(unseen.len(), slots);
        if consistent_worlds == 0 {
            return Err(SearchError::InvalidConfig {
                field: "opponent_unknown_count",
                message: format!("{slots} hidden slots but only {} unseen cards", unseen.len()),
            });
        }
        if config.full_information && consistent_worlds != 1 {
            return Err(SearchError::FullInformationViolated {
                count: consistent_worlds,
            });
        }

        let requested = if config.full_information {
            1
        } else {
            config.max_permutations
        };
        let permutations = config.determinizer.generate(
            &unseen,
            slots,
            PermutationRequest::Count(requested),
            &mut self.rng,
        );
        let worlds: Vec<V::World> = permutations
            .iter()
            .map(|permutation| view.determinize(permutation))
            .collect();
        if worlds
            .first()
            .is_none_or(|world| world.is_terminal() || world.legal_actions().is_empty())
        {
            return Err(SearchError::NoLegalActions);
        }

        let decision = if consistent_worlds == 1 && config.exact_full_information {
            self.decide_exact(&worlds[0], config, consistent_worlds, started)?
        } else {
            self.decide_sampled(worlds, config, budget, consistent_worlds, started)?
        };

        if tracing::enabled!(Level::DEBUG) {
            let best_score = decision.ranking.first().map(|entry| entry.score);
            event!(
                target: "schnapsen_bot::search",
                Level::DEBUG,
                action = ?decision.action,
                best_score,
                candidates = decision.ranking.len(),
                worlds = decision.worlds,
                consistent_worlds = decision.consistent_worlds as f64,
                solved_worlds = decision.solved_worlds,
                iterations = decision.iterations,
                exact = decision.exact,
                elapsed_ms = decision.elapsed.as_millis() as u64,
            );
        }
        Ok(decision)
    }

    fn decide_exact(
        &mut self,
        world: &V::World,
        config: &SearchConfig,
        consistent_worlds: u128,
        started: Instant,
    ) -> Result<Decision<V::World>, SearchError> {
        let scores: WorldScores<_> = self
            .exact
            .action_values(world)
            .into_iter()
            .map(|(action, value)| (action, ScoringInfo::exact(value)))
            .collect();
        let ranking = aggregate(&[scores], &config.aggregate_options(), &mut self.rng)?;
        let action = select_best(&ranking, &mut self.rng)?;
        Ok(Decision {
            action,
            ranking,
            worlds: 1,
            consistent_worlds,
            solved_worlds: 1,
            iterations: 0,
            exact: true,
            elapsed: started.elapsed(),
            trees: None,
        })
    }

    fn decide_sampled(
        &mut self,
        worlds: Vec<V::World>,
        config: &SearchConfig,
        budget: SearchBudget,
        consistent_worlds: u128,
        started: Instant,
    ) -> Result<Decision<V::World>, SearchError> {
        let tasks: Vec<(V::World, u64)> = worlds
            .into_iter()
            .map(|world| (world, self.rng.next_u64()))
            .collect();
        let exploration = config.exploration_constant;
        let record_samples = config.record_samples;
        let retain_trees = config.retain_trees;

        let pool = self.pool(config.num_workers)?;
        let outcomes = pool.run_batches(tasks, move |(world, seed)| {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut tree = GameTree::with_exploration(world, exploration).recording_samples(record_samples);
            let report = tree.run(&budget, &mut rng);
            WorldOutcome {
                scores: tree.root_scoring(),
                report,
                tree: retain_trees.then_some(tree),
            }
        })?;

        let searched = outcomes.len();
        let solved_worlds = outcomes.iter().filter(|outcome| outcome.report.exhausted).count();
        let iterations = outcomes.iter().map(|outcome| outcome.report.iterations).sum();
        let mut scores = Vec::with_capacity(searched);
        let mut trees = Vec::new();
        for outcome in outcomes {
            scores.push(outcome.scores);
            trees.extend(outcome.tree);
        }

        let ranking = aggregate(&scores, &config.aggregate_options(), &mut self.rng)?;
        let action = select_best(&ranking, &mut self.rng)?;
        Ok(Decision {
            action,
            ranking,
            worlds: searched,
            consistent_worlds,
            solved_worlds,
            iterations,
            exact: false,
            elapsed: started.elapsed(),
            trees: retain_trees.then_some(trees),
        })
    }

    /// The pool sized for this request, rebuilt when the size changes.
    fn pool(&mut self, workers: usize) -> Result<&WorkerPool, SearchError> {
        if self.pool.as_ref().is_none_or(|pool| pool.size() != workers) {
            self.pool = Some(WorkerPool::new(workers)?);
        }
        self.pool.as_ref().ok_or(SearchError::PoolShutdown)
    }

    /// Releases the worker threads. Every later request fails with
    /// [`SearchError::PoolShutdown`].
    pub fn shutdown(&mut self) {
        if let Some(mut pool) = self.pool.take() {
            pool.shutdown();
        }
        self.shut_down = true;
    }
}
