use serde::{Deserialize, Serialize};

use crate::athlete::AthleteRecord;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Aggregation {
    Raw,
    Per90,
    /// Volume column weighted by its success-rate column, then scaled to 90 minutes.
    SuccessPer90 { pct_key: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetricDefinition {
    pub key: String,
    pub aggregation: Aggregation,
    /// Smaller raw values are better (fouls, errors, goals conceded).
    #[serde(default)]
    pub invert: bool,
}

impl MetricDefinition {
    pub fn raw(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            aggregation: Aggregation::Raw,
            invert: false,
        }
    }

    pub fn per90(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            aggregation: Aggregation::Per90,
            invert: false,
        }
    }

    pub fn inverted(mut self) -> Self {
        self.invert = true;
        self
    }
}

/// Placeholders and non-numeric cells read as `0.0`.
pub fn parse_cell(raw: &str) -> f64 {
    let s = raw.trim();
    let s = s.strip_suffix('%').unwrap_or(s);
    let s = s.replacen(',', ".", 1);

    let mut cleaned = String::with_capacity(s.len());
    for ch in s.chars() {
        if ch.is_ascii_digit() || ch == '.' {
            cleaned.push(ch);
        } else if ch == '-' && cleaned.is_empty() {
            cleaned.push(ch);
        }
    }
    if cleaned.is_empty() || cleaned == "-" {
        return 0.0;
    }
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

pub fn normalize(record: &AthleteRecord, metric: &MetricDefinition) -> f64 {
    let raw = record.raw_value(&metric.key);
    match &metric.aggregation {
        Aggregation::Raw => raw,
        Aggregation::Per90 => per90(raw, record.minutes_played),
        Aggregation::SuccessPer90 { pct_key } => {
            let pct = record.raw_value(pct_key);
            per90(raw * pct / 100.0, record.minutes_played)
        }
    }
}

fn per90(value: f64, minutes: f64) -> f64 {
    if minutes > 0.0 {
        let v = value / minutes * 90.0;
        if v.is_finite() { v } else { 0.0 }
    } else {
        0.0
    }
}
