//! Alpha-beta negamax with a transposition cache that outlives a single call.
//!
//! The cache is keyed by the full state (structural `Eq`/`Hash`) and owned
//! by one [`AlphaBeta`] instance. `&mut self` on every search keeps it
//! single-writer; share an engine across threads only behind a lock.

mod cache;

pub use cache::{Bound, CacheEntry, SearchStats};

use schnapsen_core::rules::GameState;
use std::collections::HashMap;
use tracing::{Level, event};

#[derive(Debug, Clone)]
pub struct AlphaBeta<S: GameState> {
    cache: HashMap<S, CacheEntry<S>>,
    stats: SearchStats,
}

impl<S: GameState> Default for AlphaBeta<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: GameState> AlphaBeta<S> {
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
            stats: SearchStats::default(),
        }
    }

    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn entry(&self, state: &S) -> Option<&CacheEntry<S>> {
        self.cache.get(state)
    }

    /// Exact value of `state` for its acting player.
    pub fn value(&mut self, state: &S) -> f64 {
        self.search(state, f64::NEG_INFINITY, f64::INFINITY)
    }

    /// Negamax value of `state` for its acting player within `(alpha, beta)`.
    ///
    /// Fail-soft: a result `<= alpha` is an upper bound and a result
    /// `>= beta` a lower bound on the true value.
    pub fn search(&mut self, state: &S, mut alpha: f64, beta: f64) -> f64 {
        self.stats.nodes_visited += 1;
        let me = state.acting_player();
        if state.is_terminal() {
            return state.terminal_value(me);
        }

        let (children, previous_best) = match self.cache.remove(state) {
            Some(entry) if entry.cutoff(alpha, beta) => {
                self.stats.cache_hits += 1;
                let score = entry.score;
                self.cache.insert(state.clone(), entry);
                return score;
            }
            Some(entry) => (entry.children, entry.best_action),
            None => {
                let children: Vec<(S::Action, S)> = state
                    .legal_actions()
                    .into_iter()
                    .map(|action| (action, state.apply(action)))
                    .collect();
                self.stats.children_generated += children.len() as u64;
                (children, None)
            }
        };

        if children.is_empty() {
            let score = state.terminal_value(me);
            self.store(state, score, Bound::Exact, children, None);
            return score;
        }

        let alpha_in = alpha;
        let mut best = f64::NEG_INFINITY;
        let mut best_action = None;
        for (action, child) in ordered(&children, previous_best) {
            let score = if child.acting_player() == me {
                self.search(child, alpha, beta)
            } else {
                -self.search(child, -beta, -alpha)
            };
            if score > best {
                best = score;
                best_action = Some(*action);
            }
            alpha = alpha.max(score);
            if alpha >= beta {
                break;
            }
        }

        let bound = if best <= alpha_in {
            Bound::Upper
        } else if best >= beta {
            Bound::Lower
        } else {
            Bound::Exact
        };
        self.store(state, best, bound, children, best_action);
        best
    }

    /// Best action at `state` with its exact value, or `None` when nothing
    /// is playable.
    pub fn best_action(&mut self, state: &S) -> Option<(S::Action, f64)> {
        let before = self.stats;
        let value = self.value(state);
        let action = self.cache.get(state).and_then(|entry| entry.best_action)?;
        if tracing::enabled!(Level::DEBUG) {
            event!(
                target: "schnapsen_bot::exact",
                Level::DEBUG,
                value,
                nodes = self.stats.nodes_visited - before.nodes_visited,
                cache_hits = self.stats.cache_hits - before.cache_hits,
                children_generated = self.stats.children_generated - before.children_generated,
                cache_len = self.cache.len(),
            );
        }
        Some((action, value))
    }

    /// Exact value of every legal action at `state`, from its acting
    /// player's perspective.
    pub fn action_values(&mut self, state: &S) -> Vec<(S::Action, f64)> {
        if state.is_terminal() {
            return Vec::new();
        }
        self.value(state);
        let me = state.acting_player();
        let children = match self.cache.get(state) {
            Some(entry) => entry.children.clone(),
            None => return Vec::new(),
        };
        children
            .into_iter()
            .map(|(action, child)| {
                let value = self.value(&child);
                let value = if child.acting_player() == me { value } else { -value };
                (action, value)
            })
            .collect()
    }

    fn store(
        &mut self,
        state: &S,
        score: f64,
        bound: Bound,
        children: Vec<(S::Action, S)>,
        best_action: Option<S::Action>,
    ) {
        self.cache.insert(
            state.clone(),
            CacheEntry {
                score,
                bound,
                children,
                best_action,
            },
        );
    }
}

/// Children with the previously best action moved to the front.
fn ordered<A: PartialEq, S>(
    children: &[(A, S)],
    first: Option<A>,
) -> impl Iterator<Item = &(A, S)> {
    let lead = first.and_then(|best| children.iter().position(|(action, _)| *action == best));
    lead.map(|index| &children[index]).into_iter().chain(
        children
            .iter()
            .enumerate()
            .filter(move |(index, _)| Some(*index) != lead)
            .map(|(_, child)| child),
    )
}
