use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};
use std::collections::BTreeMap;

const CONFIDENCE_LEVEL: f64 = 0.95;

/// Per-action record produced by one world's search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoringInfo {
    pub q: f64,
    pub n: u32,
    pub score: f64,
    pub fully_simulated: bool,
    pub terminal: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounds: Option<ConfidenceBounds>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub samples: Option<Vec<f64>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConfidenceBounds {
    pub lower: f64,
    pub upper: f64,
}

/// One world's first-level statistics keyed by root action.
pub type WorldScores<A> = BTreeMap<A, ScoringInfo>;

impl ScoringInfo {
    pub fn from_stats(
        q: f64,
        n: u32,
        score: f64,
        fully_simulated: bool,
        terminal: bool,
        samples: Option<Vec<f64>>,
    ) -> Self {
        let bounds = if fully_simulated {
            Some(ConfidenceBounds {
                lower: score,
                upper: score,
            })
        } else {
            samples.as_deref().and_then(normal_interval)
        };
        Self {
            q,
            n,
            score,
            fully_simulated,
            terminal,
            bounds,
            samples,
        }
    }

    /// A solved action with a single visit.
    pub fn exact(score: f64) -> Self {
        Self::from_stats(score, 1, score, true, false, None)
    }

    pub fn mean(&self) -> f64 {
        if self.n == 0 {
            0.0
        } else {
            self.q / f64::from(self.n)
        }
    }

    /// Exact score when solved, otherwise the sampled mean.
    pub fn estimate(&self) -> f64 {
        if self.fully_simulated {
            self.score
        } else {
            self.mean()
        }
    }
}

fn normal_interval(samples: &[f64]) -> Option<ConfidenceBounds> {
    if samples.len() < 2 {
        return None;
    }
    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    let variance = samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let z = Normal::new(0.0, 1.0)
        .ok()?
        .inverse_cdf(0.5 + CONFIDENCE_LEVEL / 2.0);
    let half_width = z * (variance / n).sqrt();
    Some(ConfidenceBounds {
        lower: mean - half_width,
        upper: mean + half_width,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solved_actions_have_degenerate_bounds() {
        let info = ScoringInfo::exact(2.0);
        assert_eq!(
            info.bounds,
            Some(ConfidenceBounds {
                lower: 2.0,
                upper: 2.0
            })
        );
        assert_eq!(info.estimate(), 2.0);
    }

    #[test]
    fn sampled_actions_get_symmetric_interval() {
        let samples = vec![1.0, -1.0, 1.0, -1.0];
        let info = ScoringInfo::from_stats(0.0, 4, 0.5, false, false, Some(samples));
        let bounds = info.bounds.expect("interval");
        assert!((bounds.lower + bounds.upper).abs() < 1e-12);
        // sd = sqrt(4/3), se = sd / 2, z ~ 1.96
        assert!((bounds.upper - 1.959_964 * (4.0_f64 / 3.0).sqrt() / 2.0).abs() < 1e-4);
        assert_eq!(info.estimate(), 0.0);
    }

    #[test]
    fn too_few_samples_give_no_interval() {
        let info = ScoringInfo::from_stats(1.0, 1, 1.0, false, false, Some(vec![1.0]));
        assert!(info.bounds.is_none());
    }
}
