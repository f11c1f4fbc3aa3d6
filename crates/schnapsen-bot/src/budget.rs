use crate::error::SearchError;
use std::time::{Duration, Instant};

/// Per-world search limit: an iteration count, a wall-clock cap, or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchBudget {
    iterations: Option<usize>,
    time_limit: Option<Duration>,
}

impl SearchBudget {
    pub fn new(iterations: Option<usize>, time_limit: Option<Duration>) -> Result<Self, SearchError> {
        match (iterations, time_limit) {
            (Some(0), _) => Err(SearchError::InvalidBudget { iterations: 0 }),
            (None, None) => Err(SearchError::InvalidBudget { iterations: 0 }),
            _ => Ok(Self {
                iterations,
                time_limit,
            }),
        }
    }

    pub fn iterations(iterations: usize) -> Result<Self, SearchError> {
        Self::new(Some(iterations), None)
    }

    pub fn time_limit(limit: Duration) -> Self {
        Self {
            iterations: None,
            time_limit: Some(limit),
        }
    }

    pub fn max_iterations(&self) -> Option<usize> {
        self.iterations
    }

    pub fn max_duration(&self) -> Option<Duration> {
        self.time_limit
    }

    pub fn start(&self) -> BudgetTracker {
        BudgetTracker {
            budget: *self,
            start: Instant::now(),
            steps: 0,
        }
    }
}

/// Running counter checked between iterations, never during one.
#[derive(Debug, Clone)]
pub struct BudgetTracker {
    budget: SearchBudget,
    start: Instant,
    steps: usize,
}

impl BudgetTracker {
    pub fn tick(&mut self) {
        self.steps = self.steps.saturating_add(1);
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn should_stop(&self) -> bool {
        if let Some(cap) = self.budget.iterations {
            if self.steps >= cap {
                return true;
            }
        }
        self.timed_out()
    }

    pub fn timed_out(&self) -> bool {
        self.budget
            .time_limit
            .is_some_and(|limit| self.start.elapsed() >= limit)
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn utilization_percent(&self) -> u8 {
        if let Some(cap) = self.budget.iterations {
            return (((self.steps as f32) / (cap as f32)) * 100.0)
                .round()
                .clamp(0.0, 100.0) as u8;
        }
        match self.budget.time_limit {
            Some(limit) if !limit.is_zero() => {
                ((self.elapsed().as_secs_f32() / limit.as_secs_f32()) * 100.0)
                    .round()
                    .clamp(0.0, 100.0) as u8
            }
            _ => 0,
        }
    }
}
