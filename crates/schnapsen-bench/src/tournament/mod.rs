use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::analytics::{AnalyticsCollector, AnalyticsError, AnalyticsSummary};
use rand::{RngCore, SeedableRng, rngs::StdRng};
use schnapsen_bot::{ExactPolicy, Policy, RandomPolicy, SearchError, SearchPolicy};
use schnapsen_core::model::deck::Deck;
use schnapsen_core::model::player::Player;
use schnapsen_core::model::round::{PlayError, PlayOutcome, RoundState};
use schnapsen_core::model::view::PlayerView;
use serde::Serialize;
use thiserror::Error;
use tracing::{Level, event};

use crate::config::{AgentConfig, AgentKind, BenchmarkConfig, ResolvedOutputs, ValidationError};

/// Upper bound on plays in one deal; twenty cards means ten tricks.
const MAX_PLAYS_PER_GAME: usize = 20;

/// Plays a head-to-head match between the two configured agents.
pub struct TournamentRunner {
    config: BenchmarkConfig,
    outputs: ResolvedOutputs,
    agents: Vec<AgentBlueprint>,
    logging_enabled: bool,
}

/// Summary details returned after a run.
pub struct RunSummary {
    pub games_played: usize,
    pub rows_written: usize,
    pub jsonl_path: PathBuf,
    pub summary_path: PathBuf,
    pub analytics: AnalyticsSummary,
}

impl TournamentRunner {
    /// Build a runner from a validated configuration.
    pub fn new(config: BenchmarkConfig, outputs: ResolvedOutputs) -> Result<Self, RunnerError> {
        let agents = AgentBlueprint::from_configs(&config.agents)?;
        if agents.len() != 2 {
            return Err(RunnerError::SeatCount {
                found: agents.len(),
            });
        }

        Ok(Self {
            logging_enabled: config.logging.enable_structured,
            config,
            outputs,
            agents,
        })
    }

    /// Execute the match, streaming JSONL rows to disk.
    pub fn run(&self) -> Result<RunSummary, RunnerError> {
        ensure_parent(self.outputs.jsonl.parent())?;
        ensure_parent(self.outputs.summary_md.parent())?;

        let mut writer = BufWriter::new(File::create(&self.outputs.jsonl)?);
        let mut rng = StdRng::seed_from_u64(self.config.games.seed.unwrap_or(0));
        let mut seats = self
            .agents
            .iter()
            .zip(Player::LOOP)
            .map(|(agent, seat)| SeatState::new(seat, agent, rng.next_u64()))
            .collect::<Result<Vec<_>, _>>()?;
        let mut analytics = AnalyticsCollector::new(&self.config);

        let played = self.play_games(&mut seats, &mut rng, &mut writer, &mut analytics);
        for seat in &mut seats {
            seat.policy.shutdown();
        }
        let rows_written = played?;

        let analytics = analytics.finalize()?;
        analytics.write_markdown(&self.outputs.summary_md)?;

        Ok(RunSummary {
            games_played: self.config.games.count,
            rows_written,
            jsonl_path: self.outputs.jsonl.clone(),
            summary_path: self.outputs.summary_md.clone(),
            analytics,
        })
    }

    fn play_games(
        &self,
        seats: &mut [SeatState],
        rng: &mut StdRng,
        writer: &mut BufWriter<File>,
        analytics: &mut AnalyticsCollector,
    ) -> Result<usize, RunnerError> {
        let mut rows_written = 0usize;
        for game_index in 0..self.config.games.count {
            let deal_seed = rng.next_u64();
            let leader = if self.config.games.alternate_leader && game_index % 2 == 1 {
                Player::Two
            } else {
                Player::One
            };
            let outcome = self.play_game(seats, game_index, deal_seed, leader)?;
            analytics.record_game(&outcome)?;
            rows_written +=
                write_game_rows(writer, &self.config, game_index, deal_seed, leader, &outcome)?;
        }
        writer.flush()?;
        Ok(rows_written)
    }

    fn play_game(
        &self,
        seats: &mut [SeatState],
        game_index: usize,
        deal_seed: u64,
        leader: Player,
    ) -> Result<GameOutcome, RunnerError> {
        let mut round = RoundState::deal(&Deck::shuffled_with_seed(deal_seed), leader);
        for seat in seats.iter_mut() {
            seat.metrics = DecisionMetrics::default();
        }

        let mut plays = 0usize;
        let outcome = loop {
            if let Some(outcome) = round.outcome() {
                break outcome;
            }
            if plays >= MAX_PLAYS_PER_GAME {
                return Err(RunnerError::game(format!(
                    "game {game_index} did not finish after {plays} plays"
                )));
            }

            let player = round.expected_player();
            let seat = &mut seats[player.index()];
            let view = PlayerView::observe(&round, player);
            let start = Instant::now();
            let card = seat
                .policy
                .choose_play(&view)
                .map_err(|source| RunnerError::Policy {
                    agent: seat.agent_name.clone(),
                    source,
                })?;
            let elapsed_ms = seat.metrics.record(start.elapsed());

            if self.logging_enabled && tracing::enabled!(Level::INFO) {
                event!(
                    target: "schnapsen_bench::play",
                    Level::INFO,
                    run_id = %self.config.run_id,
                    game_index = game_index as u32,
                    seat = seat_label(player),
                    agent = %seat.agent_name,
                    card = %card,
                    elapsed_ms
                );
            }

            plays += 1;
            match round.play_card(player, card) {
                Ok(PlayOutcome::GameOver(outcome)) => break outcome,
                Ok(PlayOutcome::Played | PlayOutcome::TrickCompleted { .. }) => {}
                Err(source) => {
                    return Err(RunnerError::IllegalPlay {
                        agent: seat.agent_name.clone(),
                        source,
                    });
                }
            }
        };

        let seat_results = seats
            .iter_mut()
            .map(|seat| {
                let won = outcome.winner == seat.seat;
                SeatResult {
                    agent_name: seat.agent_name.clone(),
                    seat: seat.seat,
                    won,
                    game_points: if won { outcome.game_points } else { 0 },
                    card_points: round.card_points(seat.seat),
                    metrics: std::mem::take(&mut seat.metrics).finalize(),
                }
            })
            .collect();

        Ok(GameOutcome {
            winner: outcome.winner,
            seat_results,
        })
    }
}

fn ensure_parent(path: Option<&Path>) -> Result<(), RunnerError> {
    if let Some(dir) = path.filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

fn write_game_rows(
    writer: &mut BufWriter<File>,
    config: &BenchmarkConfig,
    game_index: usize,
    deal_seed: u64,
    leader: Player,
    outcome: &GameOutcome,
) -> Result<usize, RunnerError> {
    let mut rows_written = 0usize;
    for seat in &outcome.seat_results {
        let row = GameLogRow {
            run_id: &config.run_id,
            game_index,
            deal_seed,
            leader: seat_label(leader),
            agent: &seat.agent_name,
            seat: seat_label(seat.seat),
            won: seat.won,
            game_points: seat.game_points,
            card_points: seat.card_points,
            decisions: seat.metrics.decisions,
            avg_ms_per_decision: seat.metrics.avg_ms_per_decision,
        };

        serde_json::to_writer(&mut *writer, &row)?;
        writer.write_all(b"\n")?;
        rows_written += 1;
    }

    Ok(rows_written)
}

fn seat_label(player: Player) -> &'static str {
    match player {
        Player::One => "one",
        Player::Two => "two",
    }
}

struct SeatState {
    seat: Player,
    agent_name: String,
    policy: Box<dyn Policy>,
    metrics: DecisionMetrics,
}

impl SeatState {
    fn new(seat: Player, agent: &AgentBlueprint, seed: u64) -> Result<Self, RunnerError> {
        Ok(Self {
            seat,
            agent_name: agent.name.clone(),
            policy: agent.spawn_policy(seed)?,
            metrics: DecisionMetrics::default(),
        })
    }
}

pub struct GameOutcome {
    pub winner: Player,
    pub seat_results: Vec<SeatResult>,
}

pub struct SeatResult {
    pub agent_name: String,
    pub seat: Player,
    pub won: bool,
    pub game_points: u8,
    pub card_points: u16,
    pub metrics: DecisionSummary,
}

#[derive(Default)]
struct DecisionMetrics {
    total: Duration,
    decisions: u32,
}

impl DecisionMetrics {
    fn record(&mut self, duration: Duration) -> f64 {
        self.total += duration;
        self.decisions += 1;
        duration.as_secs_f64() * 1000.0
    }

    fn finalize(self) -> DecisionSummary {
        let avg_ms = if self.decisions == 0 {
            0.0
        } else {
            self.total.as_secs_f64() * 1000.0 / f64::from(self.decisions)
        };

        DecisionSummary {
            decisions: self.decisions,
            avg_ms_per_decision: avg_ms,
            total_ms: self.total.as_secs_f64() * 1000.0,
        }
    }
}

#[derive(Clone)]
pub struct DecisionSummary {
    pub decisions: u32,
    pub avg_ms_per_decision: f64,
    pub total_ms: f64,
}

#[derive(Serialize)]
struct GameLogRow<'a> {
    run_id: &'a str,
    game_index: usize,
    deal_seed: u64,
    leader: &'static str,
    agent: &'a str,
    seat: &'static str,
    won: bool,
    game_points: u8,
    card_points: u16,
    decisions: u32,
    avg_ms_per_decision: f64,
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("{0}")]
    Agent(#[from] ValidationError),
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("failed to serialize log row: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
    #[error("agent '{agent}' failed to choose a card: {source}")]
    Policy {
        agent: String,
        #[source]
        source: SearchError,
    },
    #[error("agent '{agent}' made an illegal play: {source}")]
    IllegalPlay {
        agent: String,
        #[source]
        source: PlayError,
    },
    #[error("game execution failed: {message}")]
    Game { message: String },
    #[error("configuration requires exactly 2 agents but found {found}")]
    SeatCount { found: usize },
    #[error("analytics error: {0}")]
    Analytics(#[from] AnalyticsError),
}

impl RunnerError {
    fn game(message: String) -> Self {
        RunnerError::Game { message }
    }
}

struct AgentBlueprint {
    name: String,
    implementation: AgentImplementation,
}

enum AgentImplementation {
    Search(schnapsen_bot::SearchConfig),
    Exact(schnapsen_bot::SearchConfig),
    Random,
}

impl AgentBlueprint {
    fn from_configs(configs: &[AgentConfig]) -> Result<Vec<Self>, ValidationError> {
        configs.iter().map(Self::from_config).collect()
    }

    fn from_config(config: &AgentConfig) -> Result<Self, ValidationError> {
        let implementation = match config.kind {
            AgentKind::Search => AgentImplementation::Search(config.search_config()?),
            AgentKind::Exact => AgentImplementation::Exact(config.search_config()?),
            AgentKind::Random => AgentImplementation::Random,
        };
        Ok(Self {
            name: config.name.clone(),
            implementation,
        })
    }

    fn spawn_policy(&self, seed: u64) -> Result<Box<dyn Policy>, RunnerError> {
        let policy: Box<dyn Policy> = match &self.implementation {
            AgentImplementation::Search(config) => Box::new(
                SearchPolicy::new(config.clone(), seed).map_err(|source| RunnerError::Policy {
                    agent: self.name.clone(),
                    source,
                })?,
            ),
            AgentImplementation::Exact(config) => Box::new(
                ExactPolicy::new(config.clone(), seed).map_err(|source| RunnerError::Policy {
                    agent: self.name.clone(),
                    source,
                })?,
            ),
            AgentImplementation::Random => Box::new(RandomPolicy::new(seed)),
        };
        Ok(policy)
    }
}
