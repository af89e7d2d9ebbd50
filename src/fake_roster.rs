use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::athlete::AthleteRecord;
use crate::catalog::ProfileCatalog;
use crate::positions::PositionCode;
use crate::settings::{DEFAULT_MINUTES_COLUMN, DEFAULT_NAME_COLUMN, DEFAULT_POSITION_COLUMN};

const MAX_MINUTES: f64 = 3_400.0;

/// Header of a synthetic export: identity columns then every metric the catalog reads.
pub fn roster_columns(catalog: &ProfileCatalog) -> Vec<String> {
    let mut cols = vec![
        DEFAULT_NAME_COLUMN.to_string(),
        DEFAULT_POSITION_COLUMN.to_string(),
        DEFAULT_MINUTES_COLUMN.to_string(),
    ];
    for key in catalog.referenced_metric_keys() {
        if !cols.iter().any(|c| c == key) {
            cols.push(key.to_string());
        }
    }
    cols
}

/// Deterministic roster of `n` plausible athletes spread over the catalog's positions.
///
/// Cells are written the way scouting exports write them: decimal commas, `%` suffixes and
/// the odd `-` placeholder.
pub fn synthetic_roster(n: usize, seed: u64, catalog: &ProfileCatalog) -> Vec<AthleteRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    let codes: Vec<PositionCode> = catalog.position_codes().cloned().collect();
    let columns = roster_columns(catalog);

    (0..n)
        .map(|i| {
            let position = codes
                .get(rng.gen_range(0..codes.len().max(1)))
                .map(|c| c.to_string())
                .unwrap_or_default();
            let minutes = if rng.gen_bool(0.05) {
                0.0
            } else {
                rng.gen_range(90.0..MAX_MINUTES).round()
            };
            let name = format!("Atleta {:03}", i + 1);

            let mut cells: HashMap<String, String> = HashMap::with_capacity(columns.len());
            cells.insert(DEFAULT_NAME_COLUMN.to_string(), name.clone());
            cells.insert(DEFAULT_POSITION_COLUMN.to_string(), position.clone());
            cells.insert(DEFAULT_MINUTES_COLUMN.to_string(), format!("{minutes}"));
            for key in columns.iter().skip(3) {
                cells.insert(key.clone(), fake_cell(key, minutes, &mut rng));
            }

            AthleteRecord::new(name, position, minutes, cells)
                .resolve_position(catalog.position_table())
        })
        .collect()
}

fn fake_cell(key: &str, minutes: f64, rng: &mut impl Rng) -> String {
    if rng.gen_bool(0.03) {
        return "-".to_string();
    }
    if key.contains('%') {
        let pct: f64 = rng.gen_range(20.0..95.0);
        return format!("{pct:.1}%").replace('.', ",");
    }
    let per90: f64 = rng.gen_range(0.0..4.0);
    let total = per90 * minutes / 90.0;
    if rng.gen_bool(0.5) {
        format!("{total:.0}")
    } else {
        format!("{total:.2}").replace('.', ",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_for_a_seed() {
        let catalog = ProfileCatalog::bundled().expect("bundled catalog");
        let a = synthetic_roster(40, 7, &catalog);
        let b = synthetic_roster(40, 7, &catalog);
        assert_eq!(a.len(), 40);
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.id, y.id);
            assert_eq!(x.metrics, y.metrics);
            assert_eq!(x.position_code, y.position_code);
        }
    }

    #[test]
    fn every_record_has_a_position_and_all_columns() {
        let catalog = ProfileCatalog::bundled().expect("bundled catalog");
        let columns = roster_columns(&catalog);
        assert!(catalog.missing_columns(&columns).is_empty());
        for a in synthetic_roster(25, 1, &catalog) {
            assert!(a.position_code.is_some(), "{}", a.position_raw);
            for col in &columns {
                assert!(a.metrics.contains_key(col), "{col}");
            }
            assert!(a.minutes_played >= 0.0);
        }
    }
}
