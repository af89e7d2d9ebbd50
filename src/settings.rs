use std::env;
use std::path::PathBuf;

use anyhow::Result;

use crate::catalog::{CATALOG_PATH_ENV, ProfileCatalog};
use crate::similarity::DEFAULT_TOP_K;

pub const DEFAULT_NAME_COLUMN: &str = "Jogador";
pub const DEFAULT_POSITION_COLUMN: &str = "Posição";
pub const DEFAULT_MINUTES_COLUMN: &str = "Minutos jogados";
const MAX_TOP_K: usize = 50;

/// Runtime knobs read from the environment. Malformed values fall back to defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub catalog_path: Option<PathBuf>,
    pub min_minutes: f64,
    pub top_k: usize,
    pub threads: Option<usize>,
    pub name_column: String,
    pub position_column: String,
    pub minutes_column: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            catalog_path: None,
            min_minutes: 0.0,
            top_k: DEFAULT_TOP_K,
            threads: None,
            name_column: DEFAULT_NAME_COLUMN.to_string(),
            position_column: DEFAULT_POSITION_COLUMN.to_string(),
            minutes_column: DEFAULT_MINUTES_COLUMN.to_string(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(opt_env)
    }

    /// Build settings from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            catalog_path: lookup(CATALOG_PATH_ENV).map(PathBuf::from),
            min_minutes: lookup("SCOUT_MIN_MINUTES")
                .and_then(|val| val.trim().parse::<f64>().ok())
                .filter(|m| m.is_finite())
                .map(|m| m.max(0.0))
                .unwrap_or(defaults.min_minutes),
            top_k: lookup("SCOUT_TOP_K")
                .and_then(|val| val.trim().parse::<usize>().ok())
                .unwrap_or(defaults.top_k)
                .clamp(1, MAX_TOP_K),
            threads: lookup("SCOUT_THREADS")
                .and_then(|val| val.trim().parse::<usize>().ok())
                .map(|n| n.clamp(1, 64)),
            name_column: lookup("SCOUT_NAME_COLUMN").unwrap_or(defaults.name_column),
            position_column: lookup("SCOUT_POSITION_COLUMN").unwrap_or(defaults.position_column),
            minutes_column: lookup("SCOUT_MINUTES_COLUMN").unwrap_or(defaults.minutes_column),
        }
    }

    pub fn catalog(&self) -> Result<ProfileCatalog> {
        ProfileCatalog::load_from(self.catalog_path.as_deref())
    }
}

fn opt_env(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|val| {
        let val = val.trim();
        if val.is_empty() {
            None
        } else {
            Some(val.to_string())
        }
    })
}
