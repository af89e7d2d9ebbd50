use std::collections::HashMap;

use once_cell::sync::OnceCell;
use rayon::prelude::*;
use serde::Serialize;

use crate::athlete::AthleteRecord;
use crate::catalog::{Profile, ProfileCatalog};
use crate::cohort::{cohort, cohort_for_positions, peers_of};
use crate::error::EngineError;
use crate::metrics::{MetricDefinition, normalize};
use crate::percentile::{inverted_percentile, percentile};
use crate::positions::PositionCode;
use crate::zscore::zscore_rate;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingResult {
    pub athlete_id: String,
    pub profile_name: String,
    pub score: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricContribution {
    pub key: String,
    pub value: f64,
    pub percentile: u8,
    pub weight: f64,
}

impl MetricContribution {
    pub fn weighted(&self) -> f64 {
        self.percentile as f64 * self.weight
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RankedAthlete<'a> {
    pub athlete: &'a AthleteRecord,
    pub score: u8,
}

pub fn breakdown(
    athlete: &AthleteRecord,
    profile: &Profile,
    cohort: &[&AthleteRecord],
) -> Vec<MetricContribution> {
    profile
        .weights
        .iter()
        .map(|(metric, weight)| {
            let value = normalize(athlete, metric);
            let population: Vec<f64> = cohort.iter().map(|p| normalize(p, metric)).collect();
            let pct = if metric.invert {
                inverted_percentile(value, &population)
            } else {
                percentile(value, &population)
            };
            MetricContribution {
                key: metric.key.clone(),
                value,
                percentile: pct,
                weight: *weight,
            }
        })
        .collect()
}

/// Weighted-percentile rating, 0–100. An empty cohort leaves the athlete unrated (`0`).
pub fn rate(athlete: &AthleteRecord, profile: &Profile, cohort: &[&AthleteRecord]) -> u8 {
    if cohort.is_empty() {
        return 0;
    }
    let sum: f64 = breakdown(athlete, profile, cohort)
        .iter()
        .map(MetricContribution::weighted)
        .sum();
    sum.round().clamp(0.0, 100.0) as u8
}

pub fn rate_by_name(
    athlete: &AthleteRecord,
    profile_name: &str,
    cohort: &[&AthleteRecord],
    catalog: &ProfileCatalog,
) -> Result<RatingResult, EngineError> {
    let profile = catalog.require_profile(profile_name)?;
    Ok(RatingResult {
        athlete_id: athlete.id.clone(),
        profile_name: profile.name.clone(),
        score: rate(athlete, profile, cohort),
    })
}

/// Ties keep population order.
pub fn rank_cohort<'a>(
    population: &'a [AthleteRecord],
    profile_name: &str,
    min_minutes: f64,
    catalog: &ProfileCatalog,
) -> Result<Vec<RankedAthlete<'a>>, EngineError> {
    let profile = catalog.require_profile(profile_name)?;
    let positions = catalog.positions_for_profile(&profile.name);
    let candidates = cohort_for_positions(population, &positions, min_minutes);
    let cohorts: HashMap<PositionCode, Vec<&AthleteRecord>> = positions
        .iter()
        .map(|code| (code.clone(), cohort(population, code, min_minutes)))
        .collect();

    let mut rows: Vec<RankedAthlete<'a>> = with_rating_pool(|| {
        candidates
            .par_iter()
            .map(|athlete| {
                let peers = athlete
                    .position_code
                    .as_ref()
                    .and_then(|code| cohorts.get(code))
                    .map(Vec::as_slice)
                    .unwrap_or(&[]);
                RankedAthlete {
                    athlete: *athlete,
                    score: rate(athlete, profile, peers),
                }
            })
            .collect()
    });
    rows.sort_by(|a, b| b.score.cmp(&a.score));
    Ok(rows)
}

#[derive(Debug, Clone, PartialEq)]
pub enum RatingStrategy {
    ProfilePercentile { profile: String },
    PopulationZScore { metrics: Vec<MetricDefinition> },
}

impl RatingStrategy {
    pub fn label(&self) -> &'static str {
        match self {
            RatingStrategy::ProfilePercentile { .. } => "percentile",
            RatingStrategy::PopulationZScore { .. } => "zscore",
        }
    }

    /// The percentile engine narrows `population` to the athlete's cohort with no minutes floor.
    pub fn score(
        &self,
        athlete: &AthleteRecord,
        population: &[AthleteRecord],
        catalog: &ProfileCatalog,
    ) -> Result<f64, EngineError> {
        match self {
            RatingStrategy::ProfilePercentile { profile } => {
                let profile = catalog.require_profile(profile)?;
                let peers = peers_of(athlete, population, 0.0);
                Ok(rate(athlete, profile, &peers) as f64)
            }
            RatingStrategy::PopulationZScore { metrics } => {
                if metrics.is_empty() {
                    return Err(EngineError::EmptyMetricSet);
                }
                let reference: Vec<&AthleteRecord> = population.iter().collect();
                Ok(zscore_rate(athlete, metrics, &reference))
            }
        }
    }
}

static POOL: OnceCell<Option<rayon::ThreadPool>> = OnceCell::new();

/// Size the rating pool before first use. Returns `false` once the pool already exists.
pub fn init_rating_pool(threads: Option<usize>) -> bool {
    POOL.set(build_pool(threads)).is_ok()
}

fn build_pool(threads: Option<usize>) -> Option<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads?)
        .build()
        .ok()
}

fn rating_pool() -> &'static Option<rayon::ThreadPool> {
    POOL.get_or_init(|| None)
}

pub fn rating_threads() -> usize {
    with_rating_pool(rayon::current_num_threads)
}

pub(crate) fn with_rating_pool<T>(action: impl FnOnce() -> T + Send) -> T
where
    T: Send,
{
    if let Some(pool) = rating_pool().as_ref() {
        pool.install(action)
    } else {
        action()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricDefinition;

    fn athlete(id: &str, code: &str, minutes: f64, cells: &[(&str, f64)]) -> AthleteRecord {
        let metrics = cells
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AthleteRecord::new(id, code, minutes, metrics).with_position_code(PositionCode::new(code))
    }

    fn two_metric_profile() -> Profile {
        Profile::new(
            "Teste",
            vec![
                (MetricDefinition::raw("A"), 0.6),
                (MetricDefinition::raw("B"), 0.4),
            ],
        )
    }

    fn five_meias() -> Vec<AthleteRecord> {
        vec![
            athlete("alvo", "MEIA", 900.0, &[("A", 4.0), ("B", 3.0)]),
            athlete("p1", "MEIA", 900.0, &[("A", 4.0), ("B", 1.0)]),
            athlete("p2", "MEIA", 900.0, &[("A", 1.0), ("B", 2.0)]),
            athlete("p3", "MEIA", 900.0, &[("A", 2.0), ("B", 4.0)]),
            athlete("p4", "MEIA", 900.0, &[("A", 3.0), ("B", 5.0)]),
        ]
    }

    #[test]
    fn weighted_aggregation() {
        let all = five_meias();
        let peers: Vec<&AthleteRecord> = all.iter().collect();
        let parts = breakdown(&all[0], &two_metric_profile(), &peers);
        assert_eq!(parts[0].percentile, 80);
        assert_eq!(parts[1].percentile, 50);
        assert_eq!(rate(&all[0], &two_metric_profile(), &peers), 68);
    }

    #[test]
    fn empty_cohort_is_unrated() {
        let all = five_meias();
        assert_eq!(rate(&all[0], &two_metric_profile(), &[]), 0);
    }

    #[test]
    fn inverted_metric_flips_percentile() {
        let all = five_meias();
        let peers: Vec<&AthleteRecord> = all.iter().collect();
        let normal = Profile::new("n", vec![(MetricDefinition::raw("B"), 1.0)]);
        let flipped = Profile::new("f", vec![(MetricDefinition::raw("B").inverted(), 1.0)]);
        let a = rate(&all[4], &normal, &peers);
        let b = rate(&all[4], &flipped, &peers);
        assert_eq!(a, 90);
        assert_eq!(b, 10);
    }

    #[test]
    fn unknown_metric_key_is_tolerated() {
        let all = five_meias();
        let peers: Vec<&AthleteRecord> = all.iter().collect();
        let profile = Profile::new("x", vec![(MetricDefinition::raw("Nada"), 1.0)]);
        for a in &all {
            assert_eq!(rate(a, &profile, &peers), 50);
        }
    }

    #[test]
    fn rate_by_name_rejects_unknown_profile() {
        let all = five_meias();
        let catalog = ProfileCatalog::new(vec![two_metric_profile()], Vec::new());
        let err = rate_by_name(&all[0], "Outro", &[], &catalog).unwrap_err();
        assert_eq!(err, EngineError::UnknownProfile("Outro".to_string()));
        let ok = rate_by_name(&all[0], "Teste", &[], &catalog).expect("known profile");
        assert_eq!(ok.score, 0);
    }

    #[test]
    fn rank_cohort_sorts_and_respects_minutes() {
        let mut all = five_meias();
        all.push(athlete("reserva", "MEIA", 30.0, &[("A", 9.0), ("B", 9.0)]));
        all.push(athlete("zag", "ZAGUEIRO", 900.0, &[("A", 9.0), ("B", 9.0)]));
        let catalog = ProfileCatalog::new(
            vec![two_metric_profile()],
            vec![(PositionCode::new("MEIA"), vec!["Teste".to_string()])],
        );
        let rows = rank_cohort(&all, "Teste", 90.0, &catalog).expect("ranking");
        let ids: Vec<&str> = rows.iter().map(|r| r.athlete.id.as_str()).collect();
        assert_eq!(rows.len(), 5);
        assert!(!ids.contains(&"reserva"));
        assert!(!ids.contains(&"zag"));
        assert!(rows.windows(2).all(|w| w[0].score >= w[1].score));
        assert_eq!(rows[0].athlete.id, "alvo");
    }

    #[test]
    fn strategies_are_independent() {
        let all = five_meias();
        let catalog = ProfileCatalog::new(vec![two_metric_profile()], Vec::new());
        let pct = RatingStrategy::ProfilePercentile {
            profile: "Teste".to_string(),
        };
        assert_eq!(pct.score(&all[0], &all, &catalog), Ok(68.0));

        let z = RatingStrategy::PopulationZScore {
            metrics: vec![MetricDefinition::raw("A")],
        };
        let s = z.score(&all[0], &all, &catalog).expect("zscore");
        assert!(s > 50.0 && s <= 100.0);

        let empty = RatingStrategy::PopulationZScore { metrics: Vec::new() };
        assert_eq!(
            empty.score(&all[0], &all, &catalog),
            Err(EngineError::EmptyMetricSet)
        );
    }
}
