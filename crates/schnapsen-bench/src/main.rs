use std::path::PathBuf;

use clap::Parser;

use schnapsen_bench::config::{BenchmarkConfig, ResolvedOutputs};
use schnapsen_bench::logging::init_logging;
use schnapsen_bench::tournament::TournamentRunner;

/// Match harness for Schnapsen engines.
#[derive(Debug, Parser)]
#[command(
    name = "schnapsen-bench",
    author,
    version,
    about = "Deterministic head-to-head Schnapsen match harness"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "bench/bench.yaml")]
    config: PathBuf,

    /// Override the run identifier (substitutes {run_id} templates).
    #[arg(long, value_name = "RUN_ID")]
    run_id: Option<String>,

    /// Override the number of games to play.
    #[arg(long, value_name = "GAMES")]
    games: Option<usize>,

    /// Override the RNG seed for deal generation.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Exit after validating the configuration (no games are played).
    #[arg(long)]
    validate_only: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = BenchmarkConfig::from_path(&cli.config)?;

    if let Some(run_id) = cli.run_id {
        config.run_id = run_id;
    }

    if let Some(games) = cli.games {
        config.games.count = games;
    }

    if let Some(seed) = cli.seed {
        config.games.seed = Some(seed);
    }

    config.validate()?;

    let outputs: ResolvedOutputs = config.resolved_outputs();
    let run_id = config.run_id.clone();
    let games = config.games.count;
    let names = config
        .agents
        .iter()
        .map(|agent| agent.name.as_str())
        .collect::<Vec<_>>()
        .join(" vs ");

    println!("Loaded configuration '{run_id}': {names} over {games} games");

    let event_log = init_logging(&config, &outputs)?;
    let runner = TournamentRunner::new(config, outputs)?;

    if cli.validate_only {
        println!("Validation-only mode: match execution skipped.");
        return Ok(());
    }

    let summary = runner.run()?;
    println!(
        "Match complete for '{run_id}': {} games → {} rows at {}",
        summary.games_played,
        summary.rows_written,
        summary.jsonl_path.display()
    );
    for agent in &summary.analytics.agents {
        println!(
            "  {}: {:.1}% wins [{:.1}%, {:.1}%], {:.3} game points per game",
            agent.name,
            agent.win_rate * 100.0,
            agent.win_ci.0 * 100.0,
            agent.win_ci.1 * 100.0,
            agent.avg_game_points
        );
    }
    println!("Summary table: {}", summary.summary_path.display());
    if let Some(log) = event_log.as_ref() {
        println!("Event log: {}", log.path.display());
    }

    Ok(())
}
