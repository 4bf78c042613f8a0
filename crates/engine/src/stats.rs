//! Sample statistics over a token's baseline.

/// Arithmetic mean, `None` for an empty slice
#[must_use]
pub fn mean(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    Some(samples.iter().sum::<f64>() / samples.len() as f64)
}

/// Sample standard deviation (n - 1 denominator), `None` below two samples
#[must_use]
pub fn sample_std_dev(samples: &[f64]) -> Option<f64> {
    if samples.len() < 2 {
        return None;
    }
    let mean = mean(samples)?;
    let sum_sq: f64 = samples.iter().map(|x| (x - mean).powi(2)).sum();
    Some((sum_sq / (samples.len() - 1) as f64).sqrt())
}

/// `(observed - mean) / stdev` of `samples`.
///
/// `None` when the distribution is degenerate: fewer than two samples or a
/// standard deviation of exactly zero.
#[must_use]
pub fn z_score(observed: f64, samples: &[f64]) -> Option<f64> {
    let std_dev = sample_std_dev(samples)?;
    if std_dev == 0.0 {
        return None;
    }
    let mean = mean(samples)?;
    Some((observed - mean) / std_dev)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn mean_and_std_dev() {
        let samples = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((mean(&samples).unwrap() - 5.0).abs() < EPS);
        // Population stdev is 2.0; sample stdev is sqrt(32 / 7)
        assert!((sample_std_dev(&samples).unwrap() - (32.0f64 / 7.0).sqrt()).abs() < EPS);
    }

    #[test]
    fn z_score_sign_follows_observation() {
        let samples = [1.0, 2.0, 3.0];
        assert!((z_score(2.0, &samples).unwrap()).abs() < EPS);
        assert!((z_score(4.0, &samples).unwrap() - 2.0).abs() < EPS);
        assert!((z_score(0.0, &samples).unwrap() + 2.0).abs() < EPS);
    }

    #[test]
    fn degenerate_distributions() {
        assert_eq!(mean(&[]), None);
        assert_eq!(sample_std_dev(&[3.0]), None);
        assert_eq!(z_score(1.0, &[3.0]), None);
        assert_eq!(z_score(1.0, &[4.0, 4.0, 4.0]), None);
    }
}
