use crate::athlete::AthleteRecord;
use crate::metrics::{MetricDefinition, normalize};

const Z_CLAMP: f64 = 3.0;

/// Population mean and standard deviation of a metric. A zero spread becomes `1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Distribution {
    pub mean: f64,
    pub std: f64,
}

impl Distribution {
    pub fn of(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self { mean: 0.0, std: 1.0 };
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values
            .iter()
            .map(|v| {
                let d = v - mean;
                d * d
            })
            .sum::<f64>()
            / n;
        let std = var.sqrt();
        let std = if std > 0.0 && std.is_finite() { std } else { 1.0 };
        Self { mean, std }
    }

    pub fn z(&self, value: f64) -> f64 {
        ((value - self.mean) / self.std).clamp(-Z_CLAMP, Z_CLAMP)
    }
}

pub fn z_to_score(z: f64) -> f64 {
    (50.0 + z * (50.0 / Z_CLAMP)).clamp(0.0, 100.0)
}

pub fn metric_score(
    athlete: &AthleteRecord,
    metric: &MetricDefinition,
    reference: &[&AthleteRecord],
) -> f64 {
    let values: Vec<f64> = reference.iter().map(|a| normalize(a, metric)).collect();
    let dist = Distribution::of(&values);
    let mut z = dist.z(normalize(athlete, metric));
    if metric.invert {
        z = -z;
    }
    z_to_score(z)
}

/// `reference` is used exactly as given. Empty inputs yield `0.0`.
pub fn zscore_rate(
    athlete: &AthleteRecord,
    metrics: &[MetricDefinition],
    reference: &[&AthleteRecord],
) -> f64 {
    if metrics.is_empty() || reference.is_empty() {
        return 0.0;
    }
    let total: f64 = metrics
        .iter()
        .map(|m| metric_score(athlete, m, reference))
        .sum();
    total / metrics.len() as f64
}
