use rayon::prelude::*;
use serde::Serialize;

use crate::athlete::AthleteRecord;
use crate::catalog::ProfileCatalog;
use crate::dominant::dominant_profile;
use crate::error::EngineError;
use crate::metrics::{MetricDefinition, normalize};
use crate::rating::with_rating_pool;

pub const DEFAULT_TOP_K: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityResult {
    pub athlete_id: String,
    pub score: f64,
}

/// Not symmetric: a zero reference makes the candidate value the discrepancy.
pub fn metric_difference(reference: f64, candidate: f64) -> f64 {
    if reference == 0.0 {
        candidate
    } else {
        (reference - candidate).abs() / reference.abs()
    }
}

fn dominant_score(athlete: &AthleteRecord, population: &[AthleteRecord], catalog: &ProfileCatalog) -> f64 {
    dominant_profile(athlete, population, catalog)
        .map(|d| d.score as f64)
        .unwrap_or(0.0)
}

pub fn similarity_score(
    target: &AthleteRecord,
    target_dominant: f64,
    candidate: &AthleteRecord,
    metrics: &[MetricDefinition],
    population: &[AthleteRecord],
    catalog: &ProfileCatalog,
) -> f64 {
    let mut sum: f64 = metrics
        .iter()
        .map(|m| {
            let diff = metric_difference(normalize(target, m), normalize(candidate, m));
            diff * diff
        })
        .sum();
    let profile_gap = (target_dominant - dominant_score(candidate, population, catalog)) / 10.0;
    sum += profile_gap * profile_gap;

    let distance = (sum / (metrics.len() + 1) as f64).sqrt();
    (100.0 - distance * 50.0).max(0.0)
}

/// `candidates` must not contain the target. Ties keep candidate order.
pub fn find_similar(
    target: &AthleteRecord,
    candidates: &[&AthleteRecord],
    metrics: &[MetricDefinition],
    top_k: usize,
    population: &[AthleteRecord],
    catalog: &ProfileCatalog,
) -> Vec<SimilarityResult> {
    let target_dominant = dominant_score(target, population, catalog);
    let mut results: Vec<SimilarityResult> = with_rating_pool(|| {
        candidates
            .par_iter()
            .map(|c| SimilarityResult {
                athlete_id: c.id.clone(),
                score: similarity_score(target, target_dominant, c, metrics, population, catalog),
            })
            .collect()
    });
    results.sort_by(|a, b| b.score.total_cmp(&a.score));
    results.truncate(top_k);
    results
}

pub fn default_metrics(
    athlete: &AthleteRecord,
    catalog: &ProfileCatalog,
) -> Result<Vec<MetricDefinition>, EngineError> {
    let code = athlete
        .position_code
        .as_ref()
        .ok_or_else(|| EngineError::UnknownPosition(athlete.position_raw.clone()))?;
    catalog
        .metric_set_for(code)
        .map(<[MetricDefinition]>::to_vec)
        .ok_or_else(|| EngineError::UnknownPosition(code.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Profile;
    use crate::metrics::Aggregation;
    use crate::positions::PositionCode;

    fn athlete(id: &str, cells: &[(&str, f64)]) -> AthleteRecord {
        let metrics = cells
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AthleteRecord::new(id, "Atacante", 900.0, metrics)
            .with_position_code(PositionCode::new("ATACANTE"))
    }

    fn empty_catalog() -> ProfileCatalog {
        ProfileCatalog::new(Vec::new(), Vec::new())
    }

    #[test]
    fn zero_reference_uses_candidate_value() {
        assert_eq!(metric_difference(0.0, 4.0), 4.0);
        assert!((metric_difference(10.0, 12.0) - 0.2).abs() < 1e-12);
        assert!((metric_difference(-10.0, -12.0) - 0.2).abs() < 1e-12);
    }

    #[test]
    fn identical_candidate_scores_full() {
        let target = athlete("t", &[("Gols", 5.0), ("Chutes", 20.0)]);
        let twin = athlete("c", &[("Gols", 5.0), ("Chutes", 20.0)]);
        let metrics = [MetricDefinition::raw("Gols"), MetricDefinition::raw("Chutes")];
        let population = vec![target.clone(), twin.clone()];
        let out = find_similar(&target, &[&twin], &metrics, 5, &population, &empty_catalog());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].score, 100.0);
    }

    #[test]
    fn distance_formula() {
        // One metric, 10 vs 12: diff 0.2, no profile gap. sqrt(0.04 / 2) * 50.
        let target = athlete("t", &[("Gols", 10.0)]);
        let c = athlete("c", &[("Gols", 12.0)]);
        let metrics = [MetricDefinition::raw("Gols")];
        let population = vec![target.clone(), c.clone()];
        let out = find_similar(&target, &[&c], &metrics, 5, &population, &empty_catalog());
        let expected = 100.0 - (0.04f64 / 2.0).sqrt() * 50.0;
        assert!((out[0].score - expected).abs() < 1e-9);
    }

    #[test]
    fn sorted_descending_truncated_and_stable() {
        let target = athlete("t", &[("Gols", 10.0)]);
        let far = athlete("far", &[("Gols", 30.0)]);
        let near_a = athlete("near_a", &[("Gols", 11.0)]);
        let near_b = athlete("near_b", &[("Gols", 11.0)]);
        let mid = athlete("mid", &[("Gols", 15.0)]);
        let metrics = [MetricDefinition::raw("Gols")];
        let population = vec![target.clone(), far.clone(), near_a.clone(), near_b.clone(), mid.clone()];
        let candidates = [&far, &near_a, &near_b, &mid];

        let out = find_similar(&target, &candidates, &metrics, 3, &population, &empty_catalog());
        let ids: Vec<&str> = out.iter().map(|r| r.athlete_id.as_str()).collect();
        assert_eq!(ids, vec!["near_a", "near_b", "mid"]);

        let none = find_similar(&target, &candidates, &metrics, 0, &population, &empty_catalog());
        assert!(none.is_empty());
    }

    #[test]
    fn score_never_negative() {
        let target = athlete("t", &[("Gols", 0.0)]);
        let c = athlete("c", &[("Gols", 1000.0)]);
        let metrics = [MetricDefinition::raw("Gols")];
        let population = vec![target.clone(), c.clone()];
        let out = find_similar(&target, &[&c], &metrics, 5, &population, &empty_catalog());
        assert_eq!(out[0].score, 0.0);
    }

    #[test]
    fn asymmetric_when_reference_is_zero() {
        let a = athlete("a", &[("Gols", 0.0)]);
        let b = athlete("b", &[("Gols", 4.0)]);
        let metrics = [MetricDefinition::raw("Gols")];
        let population = vec![a.clone(), b.clone()];
        let ab = find_similar(&a, &[&b], &metrics, 1, &population, &empty_catalog());
        let ba = find_similar(&b, &[&a], &metrics, 1, &population, &empty_catalog());
        assert!(ab[0].score < ba[0].score);
    }

    #[test]
    fn dominant_profile_gap_counts() {
        let catalog = ProfileCatalog::new(
            vec![Profile::new("Finalizador", vec![(MetricDefinition::raw("Gols"), 1.0)])],
            vec![(PositionCode::new("ATACANTE"), vec!["Finalizador".to_string()])],
        );
        let target = athlete("t", &[("Gols", 10.0), ("Passes", 5.0)]);
        let next = athlete("next", &[("Gols", 9.0), ("Passes", 5.0)]);
        let mut population = vec![target.clone(), next.clone()];
        for g in 1..=8 {
            population.push(athlete(&format!("p{g}"), &[("Gols", g as f64)]));
        }
        let metrics = [MetricDefinition::raw("Passes")];
        let dominant_t = dominant_score(&target, &population, &catalog);
        assert_eq!(dominant_t, 95.0);
        assert_eq!(dominant_score(&next, &population, &catalog), 85.0);
        let s = similarity_score(&target, dominant_t, &next, &metrics, &population, &catalog);
        // gap of one unit over two terms
        let expected = 100.0 - (1.0f64 / 2.0).sqrt() * 50.0;
        assert!((s - expected).abs() < 1e-9);
    }

    #[test]
    fn default_metrics_need_a_position_set() {
        let catalog = ProfileCatalog::bundled().expect("bundled catalog");
        let striker = athlete("s", &[]);
        let metrics = default_metrics(&striker, &catalog).expect("striker metric set");
        assert!(!metrics.is_empty());

        let unknown = AthleteRecord::new("u", "Roupeiro", 0.0, Default::default());
        assert_eq!(
            default_metrics(&unknown, &catalog),
            Err(EngineError::UnknownPosition("Roupeiro".to_string()))
        );
    }

    #[test]
    fn winger_dribbles_weighted_by_success_rate() {
        let catalog = ProfileCatalog::bundled().expect("bundled catalog");
        let winger = AthleteRecord::new(
            "w",
            "Extremo",
            900.0,
            [
                ("Dribles".to_string(), "10".to_string()),
                ("% de dribles com sucesso".to_string(), "60%".to_string()),
            ]
            .into_iter()
            .collect(),
        )
        .with_position_code(PositionCode::new("EXTREMO"));
        let metrics = default_metrics(&winger, &catalog).expect("winger metric set");
        let dribbles = metrics
            .iter()
            .find(|m| m.key == "Dribles")
            .expect("dribbles in winger set");
        assert_eq!(
            dribbles.aggregation,
            Aggregation::SuccessPer90 {
                pct_key: "% de dribles com sucesso".to_string()
            }
        );
        // 10 attempts at 60% over 900 minutes.
        assert!((normalize(&winger, dribbles) - 0.6).abs() < 1e-9);
    }
}
