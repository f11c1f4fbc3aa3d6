//! Merges per-world first-level statistics into one ranked action list.

mod bootstrap;

pub use bootstrap::lower_confidence_bound;

use crate::error::SearchError;
use crate::search::{ScoringInfo, WorldScores};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_BOOTSTRAP_RESAMPLES: usize = 200;
pub const DEFAULT_BOOTSTRAP_QUANTILE: f64 = 0.05;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// `Mean` when every entry is solved, otherwise `BootstrapLcb` if raw
    /// samples were kept, otherwise `WeightedQ`.
    #[default]
    Auto,
    Mean,
    WeightedQ,
    BootstrapLcb,
    MajorityVote,
    VisitCount,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregateOptions {
    pub strategy: MergeStrategy,
    pub bootstrap_resamples: usize,
    pub bootstrap_quantile: f64,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            strategy: MergeStrategy::Auto,
            bootstrap_resamples: DEFAULT_BOOTSTRAP_RESAMPLES,
            bootstrap_quantile: DEFAULT_BOOTSTRAP_QUANTILE,
        }
    }
}

impl AggregateOptions {
    pub fn with_strategy(strategy: MergeStrategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedAction<A> {
    pub action: A,
    pub score: f64,
    /// Total visits across every world that reported the action.
    pub visits: u64,
    /// Number of worlds that reported the action.
    pub worlds: usize,
}

/// Ranks every reported action, best first.
///
/// An action missing from a world's map contributes nothing for that
/// world. Fails with [`SearchError::EmptyAggregation`] when no world
/// reported any action.
pub fn aggregate<A, R>(
    worlds: &[WorldScores<A>],
    options: &AggregateOptions,
    rng: &mut R,
) -> Result<Vec<RankedAction<A>>, SearchError>
where
    A: Copy + Ord,
    R: Rng + ?Sized,
{
    let mut per_action: BTreeMap<A, Vec<&ScoringInfo>> = BTreeMap::new();
    for world in worlds {
        for (action, info) in world {
            per_action.entry(*action).or_default().push(info);
        }
    }
    if per_action.is_empty() {
        return Err(SearchError::EmptyAggregation);
    }

    let strategy = resolve(options.strategy, worlds);
    let votes = match strategy {
        MergeStrategy::MajorityVote => majority_votes(worlds),
        _ => BTreeMap::new(),
    };

    let mut ranked: Vec<RankedAction<A>> = per_action
        .iter()
        .map(|(action, infos)| {
            let score = match strategy {
                MergeStrategy::Auto | MergeStrategy::Mean => mean_score(infos),
                MergeStrategy::WeightedQ => weighted_q(infos),
                MergeStrategy::BootstrapLcb => lower_confidence_bound(
                    &pooled_samples(infos),
                    options.bootstrap_resamples,
                    options.bootstrap_quantile,
                    rng,
                ),
                MergeStrategy::MajorityVote => {
                    votes.get(action).copied().unwrap_or(0.0) / worlds.len() as f64
                }
                MergeStrategy::VisitCount => total_visits(infos) as f64,
            };
            RankedAction {
                action: *action,
                score,
                visits: total_visits(infos),
                worlds: infos.len(),
            }
        })
        .collect();
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    Ok(ranked)
}

/// Action with the maximal aggregated score, ties broken uniformly.
pub fn select_best<A: Copy, R: Rng + ?Sized>(
    ranked: &[RankedAction<A>],
    rng: &mut R,
) -> Result<A, SearchError> {
    let best = ranked
        .iter()
        .map(|entry| entry.score)
        .fold(f64::NEG_INFINITY, f64::max);
    let tied: Vec<A> = ranked
        .iter()
        .filter(|entry| entry.score == best)
        .map(|entry| entry.action)
        .collect();
    tied.choose(rng).copied().ok_or(SearchError::EmptyAggregation)
}

fn resolve<A>(strategy: MergeStrategy, worlds: &[WorldScores<A>]) -> MergeStrategy {
    if strategy != MergeStrategy::Auto {
        return strategy;
    }
    let mut infos = worlds.iter().flat_map(|world| world.values());
    if infos.clone().all(|info| info.fully_simulated) {
        MergeStrategy::Mean
    } else if infos.any(|info| info.samples.as_ref().is_some_and(|s| !s.is_empty())) {
        MergeStrategy::BootstrapLcb
    } else {
        MergeStrategy::WeightedQ
    }
}

fn mean_score(infos: &[&ScoringInfo]) -> f64 {
    infos.iter().map(|info| info.estimate()).sum::<f64>() / infos.len() as f64
}

fn weighted_q(infos: &[&ScoringInfo]) -> f64 {
    let weight: f64 = infos.iter().map(|info| f64::from(info.n)).sum();
    if weight == 0.0 {
        return mean_score(infos);
    }
    infos
        .iter()
        .map(|info| f64::from(info.n) * info.estimate())
        .sum::<f64>()
        / weight
}

fn total_visits(infos: &[&ScoringInfo]) -> u64 {
    infos.iter().map(|info| u64::from(info.n)).sum()
}

/// Solved entries contribute their exact value once per visit; others
/// their raw rewards, or their mean when none were kept.
fn pooled_samples(infos: &[&ScoringInfo]) -> Vec<f64> {
    let mut pool = Vec::new();
    for info in infos {
        if info.fully_simulated {
            pool.extend(std::iter::repeat_n(info.score, info.n.max(1) as usize));
        } else {
            match info.samples.as_deref() {
                Some(samples) if !samples.is_empty() => pool.extend_from_slice(samples),
                _ => pool.push(info.estimate()),
            }
        }
    }
    pool
}

/// One vote per world, split evenly between tied best actions.
fn majority_votes<A: Copy + Ord>(worlds: &[WorldScores<A>]) -> BTreeMap<A, f64> {
    let mut votes = BTreeMap::new();
    for world in worlds {
        let best = world
            .values()
            .map(ScoringInfo::estimate)
            .fold(f64::NEG_INFINITY, f64::max);
        let winners: Vec<A> = world
            .iter()
            .filter(|(_, info)| info.estimate() == best)
            .map(|(action, _)| *action)
            .collect();
        let share = 1.0 / winners.len().max(1) as f64;
        for action in winners {
            *votes.entry(action).or_insert(0.0) += share;
        }
    }
    votes
}
