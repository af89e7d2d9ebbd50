use rayon::prelude::*;
use serde::Serialize;

use crate::athlete::AthleteRecord;
use crate::catalog::ProfileCatalog;
use crate::cohort::peers_of;
use crate::metrics::normalize;
use crate::rating::{rate, with_rating_pool};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DominantProfile {
    pub profile: String,
    pub score: u8,
}

/// Ties go to the profile declared first.
pub fn dominant_profile(
    athlete: &AthleteRecord,
    population: &[AthleteRecord],
    catalog: &ProfileCatalog,
) -> Option<DominantProfile> {
    let peers = peers_of(athlete, population, 0.0);
    let mut best: Option<DominantProfile> = None;
    for profile in catalog.eligible_profiles(athlete.position_code.as_ref()) {
        let score = rate(athlete, profile, &peers);
        let better = best.as_ref().is_none_or(|b| score > b.score);
        if better {
            best = Some(DominantProfile {
                profile: profile.name.clone(),
                score,
            });
        }
    }
    best
}

pub fn dominant_profiles(
    population: &[AthleteRecord],
    catalog: &ProfileCatalog,
) -> Vec<Option<DominantProfile>> {
    with_rating_pool(|| {
        population
            .par_iter()
            .map(|athlete| dominant_profile(athlete, population, catalog))
            .collect()
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileSuggestion {
    pub profile: String,
    pub score: f64,
    pub relative: u8,
}

/// Min–max fit of every eligible profile, best first.
pub fn suggest_profiles(
    athlete: &AthleteRecord,
    population: &[AthleteRecord],
    catalog: &ProfileCatalog,
) -> Vec<ProfileSuggestion> {
    let mut scored: Vec<(String, f64)> = catalog
        .eligible_profiles(athlete.position_code.as_ref())
        .into_iter()
        .map(|profile| {
            let mut sum = 0.0;
            let mut total_weight = 0.0;
            for (metric, weight) in &profile.weights {
                let (lo, hi) = value_range(population.iter().map(|p| normalize(p, metric)));
                sum += min_max(normalize(athlete, metric), lo, hi) * weight;
                total_weight += weight;
            }
            let score = if total_weight > 0.0 {
                sum / total_weight
            } else {
                0.0
            };
            (profile.name.clone(), score)
        })
        .collect();

    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    let top = scored
        .first()
        .map(|(_, s)| *s)
        .filter(|s| *s > 0.0)
        .unwrap_or(1.0);
    scored
        .into_iter()
        .map(|(profile, score)| ProfileSuggestion {
            profile,
            score,
            relative: (score / top * 100.0).round().clamp(0.0, 100.0) as u8,
        })
        .collect()
}

fn value_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for v in values.filter(|v| v.is_finite() && *v >= 0.0) {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if lo.is_finite() { (lo, hi) } else { (0.0, 1.0) }
}

fn min_max(value: f64, lo: f64, hi: f64) -> f64 {
    if hi <= lo {
        return 0.0;
    }
    ((value - lo) / (hi - lo)).clamp(0.0, 1.0)
}
