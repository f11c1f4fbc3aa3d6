use crate::aggregate::{
    AggregateOptions, DEFAULT_BOOTSTRAP_QUANTILE, DEFAULT_BOOTSTRAP_RESAMPLES, MergeStrategy,
};
use crate::budget::SearchBudget;
use crate::determinize::DeterminizerKind;
use crate::error::SearchError;
use crate::search::DEFAULT_EXPLORATION;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Caller-tunable knobs for one decision request.
///
/// `max_iterations_per_permutation = 0` means "no iteration cap" and is
/// only valid together with `time_limit_seconds`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    pub max_iterations_per_permutation: usize,
    pub max_permutations: usize,
    pub num_workers: usize,
    pub exploration_constant: f64,
    pub merge_strategy: MergeStrategy,
    pub time_limit_seconds: Option<f64>,
    pub determinizer: DeterminizerKind,
    /// Require exactly one consistent world.
    pub full_information: bool,
    /// Solve full-information positions with alpha-beta instead of tree search.
    pub exact_full_information: bool,
    /// Ship whole trees back from the workers instead of first-level scores.
    pub retain_trees: bool,
    pub record_samples: bool,
    pub bootstrap_resamples: usize,
    pub bootstrap_quantile: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_iterations_per_permutation: 1000,
            max_permutations: 20,
            num_workers: 4,
            exploration_constant: DEFAULT_EXPLORATION,
            merge_strategy: MergeStrategy::Auto,
            time_limit_seconds: None,
            determinizer: DeterminizerKind::Random,
            full_information: false,
            exact_full_information: false,
            retain_trees: false,
            record_samples: false,
            bootstrap_resamples: DEFAULT_BOOTSTRAP_RESAMPLES,
            bootstrap_quantile: DEFAULT_BOOTSTRAP_QUANTILE,
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.max_iterations_per_permutation == 0 && self.time_limit_seconds.is_none() {
            return Err(SearchError::InvalidBudget { iterations: 0 });
        }
        if let Some(limit) = self.time_limit_seconds {
            if !limit.is_finite() || limit <= 0.0 {
                return Err(invalid("time_limit_seconds", format!("must be positive, got {limit}")));
            }
        }
        if self.max_permutations == 0 {
            return Err(invalid("max_permutations", "must be at least 1".into()));
        }
        if self.num_workers == 0 {
            return Err(invalid("num_workers", "must be at least 1".into()));
        }
        if !self.exploration_constant.is_finite() || self.exploration_constant < 0.0 {
            return Err(invalid(
                "exploration_constant",
                format!("must be finite and non-negative, got {}", self.exploration_constant),
            ));
        }
        if !(self.bootstrap_quantile > 0.0 && self.bootstrap_quantile < 1.0) {
            return Err(invalid(
                "bootstrap_quantile",
                format!("must lie in (0, 1), got {}", self.bootstrap_quantile),
            ));
        }
        Ok(())
    }

    pub fn budget(&self) -> Result<SearchBudget, SearchError> {
        let iterations = match self.max_iterations_per_permutation {
            0 => None,
            n => Some(n),
        };
        let time_limit = self.time_limit_seconds.map(Duration::from_secs_f64);
        SearchBudget::new(iterations, time_limit)
    }

    pub fn aggregate_options(&self) -> AggregateOptions {
        AggregateOptions {
            strategy: self.merge_strategy,
            bootstrap_resamples: self.bootstrap_resamples,
            bootstrap_quantile: self.bootstrap_quantile,
        }
    }

    /// Layers `SCHNAPSEN_*` environment variables over `self`.
    ///
    /// Unparseable values are ignored.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    fn with_overrides_from<F>(mut self, mut read: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        if let Some(value) = read("SCHNAPSEN_MAX_ITERATIONS").and_then(|raw| raw.trim().parse().ok()) {
            self.max_iterations_per_permutation = value;
        }
        if let Some(value) = read("SCHNAPSEN_MAX_PERMUTATIONS").and_then(|raw| raw.trim().parse().ok()) {
            self.max_permutations = value;
        }
        if let Some(value) = read("SCHNAPSEN_WORKERS").and_then(|raw| raw.trim().parse().ok()) {
            self.num_workers = value;
        }
        if let Some(value) = read("SCHNAPSEN_EXPLORATION")
            .and_then(|raw| raw.trim().parse::<f64>().ok())
            .filter(|value| value.is_finite())
        {
            self.exploration_constant = value;
        }
        if let Some(value) = read("SCHNAPSEN_TIME_LIMIT_SECONDS")
            .and_then(|raw| raw.trim().parse::<f64>().ok())
            .filter(|value| value.is_finite() && *value > 0.0)
        {
            self.time_limit_seconds = Some(value);
        }
        if let Some(value) = read("SCHNAPSEN_MERGE_STRATEGY").and_then(|raw| parse_merge_strategy(&raw)) {
            self.merge_strategy = value;
        }
        if let Some(value) = read("SCHNAPSEN_DETERMINIZER").and_then(|raw| parse_determinizer(&raw)) {
            self.determinizer = value;
        }
        if let Some(raw) = read("SCHNAPSEN_RECORD_SAMPLES") {
            self.record_samples = matches!(raw.trim(), "1" | "true" | "TRUE" | "on" | "ON");
        }
        self
    }
}

fn invalid(field: &'static str, message: String) -> SearchError {
    SearchError::InvalidConfig { field, message }
}

fn parse_merge_strategy(raw: &str) -> Option<MergeStrategy> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "auto" => Some(MergeStrategy::Auto),
        "mean" => Some(MergeStrategy::Mean),
        "weighted_q" => Some(MergeStrategy::WeightedQ),
        "bootstrap_lcb" => Some(MergeStrategy::BootstrapLcb),
        "majority_vote" => Some(MergeStrategy::MajorityVote),
        "visit_count" => Some(MergeStrategy::VisitCount),
        _ => None,
    }
}

fn parse_determinizer(raw: &str) -> Option<DeterminizerKind> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "random" => Some(DeterminizerKind::Random),
        "lexicographic" => Some(DeterminizerKind::Lexicographic),
        "stratified" => Some(DeterminizerKind::Stratified),
        _ => None,
    }
}
