use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::metrics::parse_cell;
use crate::positions::{PositionCode, PositionTable, normalize_position};

/// One athlete's season snapshot. Built once per data load, never mutated by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AthleteRecord {
    /// Display name; acts as the natural key.
    pub id: String,
    pub position_raw: String,
    pub position_code: Option<PositionCode>,
    pub minutes_played: f64,
    /// Every column of the source row, keyed by trimmed header.
    pub metrics: HashMap<String, String>,
}

impl AthleteRecord {
    pub fn new(
        id: impl Into<String>,
        position_raw: impl Into<String>,
        minutes_played: f64,
        metrics: HashMap<String, String>,
    ) -> Self {
        let minutes_played = if minutes_played.is_finite() {
            minutes_played
        } else {
            0.0
        };
        Self {
            id: id.into(),
            position_raw: position_raw.into(),
            position_code: None,
            minutes_played,
            metrics,
        }
    }

    pub fn with_position_code(mut self, code: PositionCode) -> Self {
        self.position_code = Some(code);
        self
    }

    /// Derive `position_code` from `position_raw`.
    pub fn resolve_position(mut self, table: &PositionTable) -> Self {
        self.position_code = normalize_position(&self.position_raw, table);
        self
    }

    pub fn cell(&self, key: &str) -> &str {
        self.metrics.get(key).map(String::as_str).unwrap_or("")
    }

    /// Parsed value of a column; absent or malformed cells read as `0.0`.
    pub fn raw_value(&self, key: &str) -> f64 {
        self.metrics.get(key).map(|v| parse_cell(v)).unwrap_or(0.0)
    }
}
