use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};
use thiserror::Error;

use crate::config::{AgentKind, BenchmarkConfig};
use crate::tournament::GameOutcome;

const CONFIDENCE_LEVEL: f64 = 0.95;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("agent '{0}' defined in results but missing from configuration")]
    UnknownAgent(String),
    #[error("failed to build normal distribution: {0}")]
    Distribution(String),
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Folds finished games into per-agent statistics.
pub struct AnalyticsCollector {
    baseline: String,
    agents: HashMap<String, AgentAccumulator>,
    agent_order: Vec<String>,
    differentials: Vec<f64>,
}

impl AnalyticsCollector {
    /// The first configured agent acts as the baseline for paired comparisons.
    pub fn new(config: &BenchmarkConfig) -> Self {
        let mut agents = HashMap::new();
        let mut order = Vec::new();
        for agent in &config.agents {
            agents.insert(
                agent.name.clone(),
                AgentAccumulator::new(agent.name.clone(), agent.kind),
            );
            order.push(agent.name.clone());
        }
        Self {
            baseline: order.first().cloned().unwrap_or_default(),
            agents,
            agent_order: order,
            differentials: Vec::new(),
        }
    }

    pub fn record_game(&mut self, outcome: &GameOutcome) -> Result<(), AnalyticsError> {
        let mut baseline_points = 0.0;
        let mut challenger_points = 0.0;
        for seat in &outcome.seat_results {
            let acc = self
                .agents
                .get_mut(&seat.agent_name)
                .ok_or_else(|| AnalyticsError::UnknownAgent(seat.agent_name.clone()))?;
            acc.record(seat);
            if seat.agent_name == self.baseline {
                baseline_points = f64::from(seat.game_points);
            } else {
                challenger_points = f64::from(seat.game_points);
            }
        }
        self.differentials.push(challenger_points - baseline_points);
        Ok(())
    }

    pub fn finalize(mut self) -> Result<AnalyticsSummary, AnalyticsError> {
        let z = critical_value(CONFIDENCE_LEVEL)?;
        let mut reports = Vec::new();
        for name in &self.agent_order {
            if let Some(acc) = self.agents.remove(name) {
                reports.push(acc.into_report(z));
            }
        }
        let (p_value, sample_size) = wilcoxon_signed_rank(&self.differentials)?;
        Ok(AnalyticsSummary {
            baseline: self.baseline,
            agents: reports,
            p_value,
            sample_size,
        })
    }
}

struct AgentAccumulator {
    name: String,
    kind: AgentKind,
    games: usize,
    wins: usize,
    game_points: Vec<f64>,
    card_points: u64,
    decisions: u64,
    total_ms: f64,
}

impl AgentAccumulator {
    fn new(name: String, kind: AgentKind) -> Self {
        Self {
            name,
            kind,
            games: 0,
            wins: 0,
            game_points: Vec::new(),
            card_points: 0,
            decisions: 0,
            total_ms: 0.0,
        }
    }

    fn record(&mut self, seat: &crate::tournament::SeatResult) {
        self.games += 1;
        if seat.won {
            self.wins += 1;
        }
        self.game_points.push(f64::from(seat.game_points));
        self.card_points += u64::from(seat.card_points);
        self.decisions += u64::from(seat.metrics.decisions);
        self.total_ms += seat.metrics.total_ms;
    }

    fn into_report(self, z: f64) -> AgentReport {
        let win_rate = if self.games == 0 {
            0.0
        } else {
            self.wins as f64 / self.games as f64
        };
        let avg_game_points = mean(&self.game_points);
        AgentReport {
            win_ci: wilson_interval(self.wins, self.games, z),
            points_ci: confidence_interval(&self.game_points, z),
            avg_card_points: if self.games == 0 {
                0.0
            } else {
                self.card_points as f64 / self.games as f64
            },
            average_ms_per_decision: if self.decisions == 0 {
                0.0
            } else {
                self.total_ms / self.decisions as f64
            },
            name: self.name,
            kind: self.kind,
            games: self.games,
            wins: self.wins,
            win_rate,
            avg_game_points,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AnalyticsSummary {
    pub baseline: String,
    pub agents: Vec<AgentReport>,
    /// Two-sided Wilcoxon signed-rank p-value on per-game point differentials.
    pub p_value: f64,
    pub sample_size: usize,
}

impl AnalyticsSummary {
    pub fn write_markdown(&self, path: impl AsRef<Path>) -> Result<(), AnalyticsError> {
        let mut rows = String::new();
        rows.push_str("# Match Summary\n\n");
        rows.push_str(&format!(
            "Baseline: {} (paired p-value {:.3} over {} decisive games)\n\n",
            self.baseline, self.p_value, self.sample_size
        ));
        rows.push_str("| Agent | Kind | Games | Win % | 95% CI | Avg game points | 95% CI | Avg card points | Avg ms/decision |\n");
        rows.push_str("|-------|------|-------|-------|--------|-----------------|--------|-----------------|-----------------|\n");

        for agent in &self.agents {
            rows.push_str(&format!(
                "| {name} | {kind:?} | {games} | {win:.1}% | [{wlo:.1}%, {whi:.1}%] | {pts:.3} | [{plo:.3}, {phi:.3}] | {cards:.1} | {latency:.2} |\n",
                name = agent.name,
                kind = agent.kind,
                games = agent.games,
                win = agent.win_rate * 100.0,
                wlo = agent.win_ci.0 * 100.0,
                whi = agent.win_ci.1 * 100.0,
                pts = agent.avg_game_points,
                plo = agent.points_ci.0,
                phi = agent.points_ci.1,
                cards = agent.avg_card_points,
                latency = agent.average_ms_per_decision,
            ));
        }

        fs::write(path.as_ref(), rows).map_err(|e| AnalyticsError::Io {
            context: "writing summary markdown",
            source: e,
        })?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentReport {
    pub name: String,
    pub kind: AgentKind,
    pub games: usize,
    pub wins: usize,
    pub win_rate: f64,
    pub win_ci: (f64, f64),
    pub avg_game_points: f64,
    pub points_ci: (f64, f64),
    pub avg_card_points: f64,
    pub average_ms_per_decision: f64,
}

fn standard_normal() -> Result<Normal, AnalyticsError> {
    Normal::new(0.0, 1.0).map_err(|err| AnalyticsError::Distribution(err.to_string()))
}

fn critical_value(level: f64) -> Result<f64, AnalyticsError> {
    Ok(standard_normal()?.inverse_cdf(0.5 + level / 2.0))
}

fn mean(points: &[f64]) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    points.iter().sum::<f64>() / points.len() as f64
}

fn confidence_interval(points: &[f64], z: f64) -> (f64, f64) {
    let mean = mean(points);
    if points.len() < 2 {
        return (mean, mean);
    }
    let variance = points
        .iter()
        .map(|value| (value - mean).powi(2))
        .sum::<f64>()
        / (points.len() as f64 - 1.0);
    let margin = z * (variance / points.len() as f64).sqrt();
    (mean - margin, mean + margin)
}

fn wilson_interval(successes: usize, trials: usize, z: f64) -> (f64, f64) {
    if trials == 0 {
        return (0.0, 0.0);
    }
    let n = trials as f64;
    let p = successes as f64 / n;
    let z2 = z * z;
    let denom = 1.0 + z2 / n;
    let centre = (p + z2 / (2.0 * n)) / denom;
    let half = z * (p * (1.0 - p) / n + z2 / (4.0 * n * n)).sqrt() / denom;
    ((centre - half).max(0.0), (centre + half).min(1.0))
}

fn wilcoxon_signed_rank(diffs: &[f64]) -> Result<(f64, usize), AnalyticsError> {
    let mut paired: Vec<(f64, f64)> = diffs
        .iter()
        .filter(|d| d.abs() > f64::EPSILON)
        .map(|d| (d.abs(), d.signum()))
        .collect();
    let n = paired.len();
    if n == 0 {
        return Ok((1.0, 0));
    }
    paired.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut w_plus = 0.0;
    let mut w_minus = 0.0;
    let mut tie_adjustment = 0.0;
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && (paired[j + 1].0 - paired[i].0).abs() < 1e-12 {
            j += 1;
        }
        let rank = (i + j + 2) as f64 / 2.0;
        for (_, sign) in &paired[i..=j] {
            if *sign > 0.0 {
                w_plus += rank;
            } else {
                w_minus += rank;
            }
        }
        let ties = (j - i + 1) as f64;
        if ties > 1.0 {
            tie_adjustment += (ties.powi(3) - ties) / 48.0;
        }
        i = j + 1;
    }

    let n_f = n as f64;
    let mean_w = n_f * (n_f + 1.0) / 4.0;
    let variance_w = n_f * (n_f + 1.0) * (2.0 * n_f + 1.0) / 24.0 - tie_adjustment;
    if variance_w <= 0.0 {
        return Ok((1.0, n));
    }

    let w = f64::min(w_plus, w_minus);
    let z = (((w - mean_w).abs() - 0.5) / variance_w.sqrt()).max(0.0);
    let p = 2.0 * (1.0 - standard_normal()?.cdf(z));
    Ok((p.clamp(0.0, 1.0), n))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn critical_value_matches_table() {
        let z = critical_value(0.95).unwrap();
        assert!((z - 1.959964).abs() < 1e-4);
    }

    #[test]
    fn wilson_interval_stays_in_unit_range() {
        let z = critical_value(0.95).unwrap();
        let (lo, hi) = wilson_interval(10, 10, z);
        assert!(lo > 0.6 && lo < 1.0);
        assert!((hi - 1.0).abs() < 1e-9);
        let (lo, hi) = wilson_interval(0, 10, z);
        assert!(lo.abs() < 1e-9);
        assert!(hi < 0.4);
        assert_eq!(wilson_interval(0, 0, z), (0.0, 0.0));
    }

    #[test]
    fn confidence_interval_brackets_mean() {
        let z = critical_value(0.95).unwrap();
        let (lo, hi) = confidence_interval(&[1.0, 2.0, 3.0, 2.0], z);
        assert!(lo < 2.0 && hi > 2.0);
        assert_eq!(confidence_interval(&[3.0], z), (3.0, 3.0));
    }

    #[test]
    fn wilcoxon_detects_one_sided_sample() {
        let diffs: Vec<f64> = (1..=20).map(f64::from).collect();
        let (p, n) = wilcoxon_signed_rank(&diffs).unwrap();
        assert_eq!(n, 20);
        assert!(p < 0.001);

        let balanced = [1.0, -1.0, 2.0, -2.0, 3.0, -3.0];
        let (p, _) = wilcoxon_signed_rank(&balanced).unwrap();
        assert!(p > 0.5);
    }

    #[test]
    fn wilcoxon_ignores_ties_at_zero() {
        assert_eq!(wilcoxon_signed_rank(&[0.0, 0.0]).unwrap(), (1.0, 0));
    }
}
