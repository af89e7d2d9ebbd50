use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::EngineError;
use crate::metrics::MetricDefinition;
use crate::positions::{PositionAlias, PositionCode, PositionKeyword, PositionTable};

pub const CATALOG_VERSION: u32 = 1;
pub const CATALOG_PATH_ENV: &str = "SCOUT_CATALOG_PATH";
const WEIGHT_SUM_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub name: String,
    pub description: String,
    pub weights: Vec<(MetricDefinition, f64)>,
}

impl Profile {
    pub fn new(name: impl Into<String>, weights: Vec<(MetricDefinition, f64)>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            weights,
        }
    }

    pub fn metrics(&self) -> impl Iterator<Item = &MetricDefinition> {
        self.weights.iter().map(|(m, _)| m)
    }

    pub fn total_weight(&self) -> f64 {
        self.weights.iter().map(|(_, w)| *w).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionMetricSet {
    pub position: PositionCode,
    pub metrics: Vec<MetricDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricTemplate {
    pub name: String,
    pub label: String,
    pub metrics: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CatalogFile {
    version: u32,
    #[serde(default)]
    metrics: Vec<MetricDefinition>,
    profiles: Vec<ProfileEntry>,
    eligibility: Vec<EligibilityEntry>,
    #[serde(default)]
    position_aliases: Vec<PositionAlias>,
    #[serde(default)]
    position_keywords: Vec<PositionKeyword>,
    #[serde(default)]
    position_metric_sets: Vec<PositionMetricSet>,
    #[serde(default)]
    templates: Vec<MetricTemplate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ProfileEntry {
    name: String,
    #[serde(default)]
    description: String,
    weights: Vec<WeightEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WeightEntry {
    metric: String,
    weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EligibilityEntry {
    position: PositionCode,
    profiles: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileCatalog {
    profiles: Vec<Profile>,
    eligibility: Vec<(PositionCode, Vec<String>)>,
    positions: PositionTable,
    metric_defs: Vec<MetricDefinition>,
    metric_sets: Vec<PositionMetricSet>,
    templates: Vec<MetricTemplate>,
}

impl ProfileCatalog {
    /// Minimal catalog with no position aliases; codes are taken from `eligibility`.
    pub fn new(profiles: Vec<Profile>, eligibility: Vec<(PositionCode, Vec<String>)>) -> Self {
        let known = eligibility.iter().map(|(code, _)| code.clone()).collect();
        Self {
            profiles,
            eligibility,
            positions: PositionTable::new(Vec::new(), Vec::new(), known),
            metric_defs: Vec::new(),
            metric_sets: Vec::new(),
            templates: Vec::new(),
        }
    }

    pub fn with_position_table(mut self, table: PositionTable) -> Self {
        self.positions = table;
        self
    }

    pub fn with_metric_sets(mut self, sets: Vec<PositionMetricSet>) -> Self {
        self.metric_sets = sets;
        self
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let file: CatalogFile = serde_json::from_str(raw).context("parse profile catalog")?;
        if file.version != CATALOG_VERSION {
            return Err(anyhow!(
                "unsupported profile catalog version {} (expected {})",
                file.version,
                CATALOG_VERSION
            ));
        }
        Ok(Self::from_file(file))
    }

    pub fn bundled() -> Result<Self> {
        Self::from_json(include_str!("../assets/profile_catalog_v1.json"))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read profile catalog {}", path.display()))?;
        let catalog = Self::from_json(&raw)
            .with_context(|| format!("load profile catalog {}", path.display()))?;
        info!(
            path = %path.display(),
            profiles = catalog.profiles.len(),
            "loaded profile catalog"
        );
        Ok(catalog)
    }

    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_path(path);
        }
        let catalog = Self::bundled()?;
        debug!(profiles = catalog.profiles.len(), "loaded bundled profile catalog");
        Ok(catalog)
    }

    /// Catalog from `SCOUT_CATALOG_PATH` when set, otherwise the bundled tables.
    pub fn load() -> Result<Self> {
        Self::load_from(catalog_path_override().as_deref())
    }

    fn from_file(file: CatalogFile) -> Self {
        let resolve = |key: &str| -> MetricDefinition {
            file.metrics
                .iter()
                .find(|m| m.key == key)
                .cloned()
                .unwrap_or_else(|| MetricDefinition::raw(key))
        };

        let profiles: Vec<Profile> = file
            .profiles
            .iter()
            .map(|p| Profile {
                name: p.name.clone(),
                description: p.description.clone(),
                weights: p
                    .weights
                    .iter()
                    .map(|w| (resolve(&w.metric), w.weight))
                    .collect(),
            })
            .collect();

        for p in &profiles {
            let total = p.total_weight();
            if (total - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
                warn!(profile = %p.name, total, "profile weights do not sum to 1.0");
            }
        }

        let mut eligibility = Vec::with_capacity(file.eligibility.len());
        for entry in file.eligibility {
            let mut names = Vec::with_capacity(entry.profiles.len());
            for name in entry.profiles {
                if profiles.iter().any(|p| p.name == name) {
                    names.push(name);
                } else {
                    warn!(position = %entry.position, profile = %name, "eligibility names unknown profile");
                }
            }
            eligibility.push((entry.position, names));
        }

        let known = eligibility.iter().map(|(code, _)| code.clone()).collect();
        let positions = PositionTable::new(file.position_aliases, file.position_keywords, known);

        Self {
            profiles,
            eligibility,
            positions,
            metric_defs: file.metrics,
            metric_sets: file.position_metric_sets,
            templates: file.templates,
        }
    }

    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    pub fn profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    pub fn require_profile(&self, name: &str) -> Result<&Profile, EngineError> {
        self.profile(name)
            .ok_or_else(|| EngineError::UnknownProfile(name.to_string()))
    }

    pub fn position_table(&self) -> &PositionTable {
        &self.positions
    }

    pub fn position_codes(&self) -> impl Iterator<Item = &PositionCode> {
        self.eligibility.iter().map(|(code, _)| code)
    }

    pub fn profiles_for_position(&self, position: &PositionCode) -> &[String] {
        self.eligibility
            .iter()
            .find(|(code, _)| code == position)
            .map(|(_, names)| names.as_slice())
            .unwrap_or(&[])
    }

    pub fn eligible_profiles(&self, position: Option<&PositionCode>) -> Vec<&Profile> {
        let declared: Vec<&Profile> = position
            .map(|code| {
                self.profiles_for_position(code)
                    .iter()
                    .filter_map(|name| self.profile(name))
                    .collect()
            })
            .unwrap_or_default();
        if declared.is_empty() {
            self.profiles.iter().collect()
        } else {
            declared
        }
    }

    pub fn positions_for_profile(&self, profile: &str) -> Vec<PositionCode> {
        self.eligibility
            .iter()
            .filter(|(_, names)| names.iter().any(|n| n == profile))
            .map(|(code, _)| code.clone())
            .collect()
    }

    /// Definition for a metric key; unknown keys are plain raw metrics.
    pub fn metric(&self, key: &str) -> MetricDefinition {
        if let Some(def) = self.metric_defs.iter().find(|m| m.key == key) {
            return def.clone();
        }
        self.profiles
            .iter()
            .flat_map(|p| p.metrics())
            .find(|m| m.key == key)
            .cloned()
            .unwrap_or_else(|| MetricDefinition::raw(key))
    }

    pub fn metrics_for_keys<S: AsRef<str>>(&self, keys: &[S]) -> Vec<MetricDefinition> {
        keys.iter().map(|k| self.metric(k.as_ref())).collect()
    }

    pub fn metric_set_for(&self, position: &PositionCode) -> Option<&[MetricDefinition]> {
        self.metric_sets
            .iter()
            .find(|s| &s.position == position)
            .map(|s| s.metrics.as_slice())
    }

    pub fn templates(&self) -> &[MetricTemplate] {
        &self.templates
    }

    pub fn template(&self, name: &str) -> Option<&MetricTemplate> {
        self.templates
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }

    pub fn referenced_metric_keys(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for metric in self.profiles.iter().flat_map(|p| p.metrics()) {
            if !out.contains(&metric.key.as_str()) {
                out.push(metric.key.as_str());
            }
            if let crate::metrics::Aggregation::SuccessPer90 { pct_key } = &metric.aggregation
                && !out.contains(&pct_key.as_str())
            {
                out.push(pct_key.as_str());
            }
        }
        out
    }

    /// Profile metric keys absent from a dataset header. They read as `0` for every athlete.
    pub fn missing_columns<S: AsRef<str>>(&self, columns: &[S]) -> Vec<String> {
        self.referenced_metric_keys()
            .into_iter()
            .filter(|key| !columns.iter().any(|c| c.as_ref() == *key))
            .map(str::to_string)
            .collect()
    }
}

pub fn global_catalog() -> Option<&'static ProfileCatalog> {
    static CATALOG: OnceLock<Option<ProfileCatalog>> = OnceLock::new();
    CATALOG
        .get_or_init(|| match ProfileCatalog::load() {
            Ok(catalog) => Some(catalog),
            Err(err) => {
                warn!("profile catalog unavailable: {err:#}");
                None
            }
        })
        .as_ref()
}

fn catalog_path_override() -> Option<PathBuf> {
    env::var(CATALOG_PATH_ENV)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}
