use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{Level, event};
use tracing_appender::non_blocking::{self, WorkerGuard};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{AgentKind, BenchmarkConfig, ResolvedOutputs};

/// Engine targets that receive the configured level; everything else logs
/// warnings only.
const ENGINE_TARGETS: [&str; 4] = [
    "schnapsen_bench",
    "schnapsen_bot::search",
    "schnapsen_bot::pool",
    "schnapsen_bot::exact",
];

/// Open event log for one run. Dropping it flushes pending events.
pub struct EventLog {
    _guard: WorkerGuard,
    pub path: PathBuf,
}

/// Installs the JSON event subscriber and records the run header.
///
/// Returns `None` when structured logging is disabled. `RUST_LOG` overrides
/// the per-target filter.
pub fn init_logging(config: &BenchmarkConfig, outputs: &ResolvedOutputs) -> Result<Option<EventLog>> {
    if !config.logging.enable_structured {
        return Ok(None);
    }

    let path = events_path(&outputs.jsonl);
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating event log directory at {}", dir.display()))?;
    }
    let file = File::create(&path)
        .with_context(|| format!("creating event log at {}", path.display()))?;
    let (writer, guard) = non_blocking::NonBlockingBuilder::default()
        .lossy(false)
        .finish(file);

    let level = config.logging.level().unwrap_or(Level::INFO);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(level)));

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .json()
        .with_current_span(false)
        .with_span_events(FmtSpan::NONE)
        .with_writer(writer)
        .finish();

    // A global subscriber may already be installed when running under tests.
    let _ = tracing::subscriber::set_global_default(subscriber);
    announce_run(config);

    Ok(Some(EventLog {
        _guard: guard,
        path,
    }))
}

/// `games.jsonl` logs its events to `games.events.jsonl` alongside it.
fn events_path(rows: &Path) -> PathBuf {
    let stem = rows
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "run".to_string());
    rows.with_file_name(format!("{stem}.events.jsonl"))
}

fn filter_directives(level: Level) -> String {
    let level = level.as_str().to_ascii_lowercase();
    std::iter::once("warn".to_string())
        .chain(ENGINE_TARGETS.iter().map(|target| format!("{target}={level}")))
        .collect::<Vec<_>>()
        .join(",")
}

fn announce_run(config: &BenchmarkConfig) {
    event!(
        target: "schnapsen_bench::run",
        Level::INFO,
        run_id = %config.run_id,
        games = config.games.count as u64,
        seed = config.games.seed.unwrap_or(0),
        alternate_leader = config.games.alternate_leader,
        "match started"
    );
    for agent in &config.agents {
        let engine = match agent.kind {
            AgentKind::Random => None,
            AgentKind::Search | AgentKind::Exact => agent
                .search_config()
                .ok()
                .and_then(|search| serde_json::to_string(&search).ok()),
        };
        event!(
            target: "schnapsen_bench::run",
            Level::INFO,
            agent = %agent.name,
            kind = ?agent.kind,
            engine = engine.as_deref().unwrap_or("-"),
            "agent configured"
        );
    }
}
