use rand::Rng;

/// Bootstrap lower confidence bound of the mean of `samples`.
///
/// Draws `resamples` resamples with replacement and returns the `quantile`
/// of their means. A single sample, or no resampling, yields the plain mean.
pub fn lower_confidence_bound<R: Rng + ?Sized>(
    samples: &[f64],
    resamples: usize,
    quantile: f64,
    rng: &mut R,
) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let mean = samples.iter().sum::<f64>() / samples.len() as f64;
    if samples.len() == 1 || resamples == 0 {
        return mean;
    }
    let mut means: Vec<f64> = (0..resamples)
        .map(|_| {
            let total: f64 = (0..samples.len())
                .map(|_| samples[rng.gen_range(0..samples.len())])
                .sum();
            total / samples.len() as f64
        })
        .collect();
    means.sort_by(f64::total_cmp);
    let index = (quantile.clamp(0.0, 1.0) * (resamples - 1) as f64).floor() as usize;
    means[index]
}
