//! Threshold anomaly detection over a series of readings

/// Readings further than this many standard deviations from the mean are anomalies
pub const DEFAULT_SIGMAS: f64 = 2.0;

/// Arithmetic mean, `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let mean = mean(values)?;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

/// Outcome of a `mean ± sigmas·σ` scan
#[derive(Debug, Clone, PartialEq)]
pub struct AnomalyReport {
    pub mean: f64,
    pub std_dev: f64,

    /// Half-width of the normal band
    pub threshold: f64,

    /// Indices of the flagged readings, ascending
    pub anomalies: Vec<usize>,

    /// Largest absolute distance from the mean over all readings
    pub max_deviation: f64,

    pub samples: usize,
}

impl AnomalyReport {
    /// Flag every reading whose distance from the mean is strictly greater
    /// than `sigmas` standard deviations.
    ///
    /// Returns `None` for an empty series or one holding a non-finite value.
    /// A constant series has a zero-width band and no anomalies.
    pub fn detect(values: &[f64], sigmas: f64) -> Option<Self> {
        if values.iter().any(|v| !v.is_finite()) {
            return None;
        }
        let mean = mean(values)?;
        let std_dev = std_dev(values)?;
        let threshold = sigmas.abs() * std_dev;

        let mut anomalies = Vec::new();
        let mut max_deviation = 0.0_f64;
        for (index, value) in values.iter().enumerate() {
            let deviation = (value - mean).abs();
            max_deviation = max_deviation.max(deviation);
            if deviation > threshold {
                anomalies.push(index);
            }
        }

        Some(Self {
            mean,
            std_dev,
            threshold,
            anomalies,
            max_deviation,
            samples: values.len(),
        })
    }

    pub fn count(&self) -> usize {
        self.anomalies.len()
    }

    /// Share of flagged readings in percent
    pub fn rate_percent(&self) -> f64 {
        if self.samples == 0 {
            0.0
        } else {
            self.count() as f64 * 100.0 / self.samples as f64
        }
    }

    pub fn upper_bound(&self) -> f64 {
        self.mean + self.threshold
    }

    pub fn lower_bound(&self) -> f64 {
        self.mean - self.threshold
    }

    pub fn is_anomaly(&self, index: usize) -> bool {
        self.anomalies.binary_search(&index).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_population_moments() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!(close(mean(&values).unwrap(), 5.0));
        assert!(close(std_dev(&values).unwrap(), 2.0));
        assert_eq!(mean(&[]), None);
        assert_eq!(std_dev(&[]), None);
    }

    #[test]
    fn test_two_sigma_flags_outliers() {
        // Nineteen readings at 26 and one spike at 36
        let mut values = vec![26.0; 19];
        values.push(36.0);

        let report = AnomalyReport::detect(&values, DEFAULT_SIGMAS).unwrap();
        assert!(close(report.mean, 26.5));
        assert!(close(report.std_dev, 4.75_f64.sqrt()));
        assert_eq!(report.anomalies, vec![19]);
        assert_eq!(report.count(), 1);
        assert!(close(report.rate_percent(), 5.0));
        assert!(close(report.max_deviation, 9.5));
        assert!(report.is_anomaly(19));
        assert!(!report.is_anomaly(0));
        assert!(report.lower_bound() < 26.0 && report.upper_bound() < 36.0);
    }

    #[test]
    fn test_deviation_on_the_band_edge_is_normal() {
        // Mean 0 and σ 1, every reading sits exactly on the 1σ band edge
        let values = [-1.0, 1.0, -1.0, 1.0];
        let report = AnomalyReport::detect(&values, 1.0).unwrap();
        assert!(close(report.threshold, 1.0));
        assert!(report.anomalies.is_empty());
        assert_eq!(report.rate_percent(), 0.0);
    }

    #[test]
    fn test_constant_series_has_no_anomalies() {
        let report = AnomalyReport::detect(&[27.0; 10], DEFAULT_SIGMAS).unwrap();
        assert_eq!(report.std_dev, 0.0);
        assert_eq!(report.count(), 0);
        assert_eq!(report.max_deviation, 0.0);
    }

    #[test]
    fn test_empty_or_non_finite_series_is_rejected() {
        assert_eq!(AnomalyReport::detect(&[], DEFAULT_SIGMAS), None);
        assert_eq!(AnomalyReport::detect(&[1.0, f64::NAN], DEFAULT_SIGMAS), None);
        assert_eq!(AnomalyReport::detect(&[f64::INFINITY], DEFAULT_SIGMAS), None);
    }
}
