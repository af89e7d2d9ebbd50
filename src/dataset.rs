use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, info, warn};

use crate::athlete::AthleteRecord;
use crate::catalog::ProfileCatalog;
use crate::metrics::parse_cell;
use crate::settings::Settings;

/// Cell tokens that stand for "no value" in scouting exports.
const PLACEHOLDERS: [&str; 5] = ["nan", "NaN", "-", "null", "undefined"];

/// A loaded export: header in file order plus one record per named row.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub columns: Vec<String>,
    pub records: Vec<AthleteRecord>,
}

impl Dataset {
    pub fn find(&self, name: &str) -> Option<&AthleteRecord> {
        self.records
            .iter()
            .find(|a| a.id == name)
            .or_else(|| self.records.iter().find(|a| a.id.eq_ignore_ascii_case(name)))
    }
}

pub fn load_dataset(path: &Path, settings: &Settings, catalog: &ProfileCatalog) -> Result<Dataset> {
    let file = File::open(path).with_context(|| format!("open dataset {}", path.display()))?;
    let dataset = dataset_from_reader(file, settings, catalog)
        .with_context(|| format!("read dataset {}", path.display()))?;
    info!(
        path = %path.display(),
        athletes = dataset.records.len(),
        columns = dataset.columns.len(),
        "loaded dataset"
    );
    Ok(dataset)
}

pub fn load_records(
    path: &Path,
    settings: &Settings,
    catalog: &ProfileCatalog,
) -> Result<Vec<AthleteRecord>> {
    load_dataset(path, settings, catalog).map(|d| d.records)
}

/// Parse CSV rows into athlete records with resolved position codes.
///
/// Rows without a name are dropped. Extra columns are kept in `metrics`; missing profile
/// columns are reported and read as zero downstream.
pub fn dataset_from_reader<R: Read>(
    reader: R,
    settings: &Settings,
    catalog: &ProfileCatalog,
) -> Result<Dataset> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let columns: Vec<String> = rdr
        .headers()
        .context("read CSV header")?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();
    if !columns.iter().any(|c| *c == settings.name_column) {
        return Err(anyhow!("missing name column {:?}", settings.name_column));
    }
    if !columns.iter().any(|c| *c == settings.position_column) {
        warn!(column = %settings.position_column, "position column absent; athletes will be unrated");
    }
    for key in catalog.missing_columns(&columns) {
        warn!(column = %key, "profile metric column absent from dataset");
    }

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for (row, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("parse CSV row {}", row + 2))?;
        let mut cells: HashMap<String, String> = HashMap::with_capacity(columns.len());
        for (key, raw) in columns.iter().zip(record.iter()) {
            if key.is_empty() || cells.contains_key(key) {
                continue;
            }
            cells.insert(key.clone(), clean_cell(raw));
        }

        let name = cells.get(&settings.name_column).cloned().unwrap_or_default();
        if name.is_empty() {
            skipped += 1;
            continue;
        }
        let position = cells
            .get(&settings.position_column)
            .cloned()
            .unwrap_or_default();
        let minutes = cells
            .get(&settings.minutes_column)
            .map(|v| parse_cell(v))
            .unwrap_or(0.0);
        let athlete = AthleteRecord::new(name, position, minutes, cells)
            .resolve_position(catalog.position_table());
        if athlete.position_code.is_none() {
            debug!(athlete = %athlete.id, position = %athlete.position_raw, "unrecognised position");
        }
        records.push(athlete);
    }
    if skipped > 0 {
        debug!(skipped, "dropped rows without a name");
    }

    Ok(Dataset { columns, records })
}

/// Trim a cell and blank out placeholder tokens.
pub fn clean_cell(raw: &str) -> String {
    let v = raw.trim();
    if PLACEHOLDERS.contains(&v) {
        String::new()
    } else {
        v.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_become_empty() {
        assert_eq!(clean_cell("  nan "), "");
        assert_eq!(clean_cell("-"), "");
        assert_eq!(clean_cell("undefined"), "");
        assert_eq!(clean_cell(" 12,5 "), "12,5");
        assert_eq!(clean_cell("-3"), "-3");
    }

    #[test]
    fn reads_rows_in_any_column_order() {
        let csv = "Extra,Minutos jogados,Posição,Jogador,Gols\n\
                   x,900,Centroavante,Fulano,7\n\
                   y,nan,Zagueiro Central,Beltrano,-\n\
                   z,300,Lateral,,2\n";
        let catalog = ProfileCatalog::bundled().expect("bundled catalog");
        let ds = dataset_from_reader(csv.as_bytes(), &Settings::default(), &catalog)
            .expect("dataset");
        assert_eq!(ds.columns.len(), 5);
        assert_eq!(ds.records.len(), 2);

        let fulano = ds.find("fulano").expect("case-insensitive lookup");
        assert_eq!(fulano.minutes_played, 900.0);
        assert_eq!(fulano.raw_value("Gols"), 7.0);
        assert_eq!(fulano.cell("Extra"), "x");
        assert_eq!(
            fulano.position_code.as_ref().map(|c| c.as_str()),
            Some("ATACANTE")
        );

        let beltrano = ds.find("Beltrano").expect("row");
        assert_eq!(beltrano.minutes_played, 0.0);
        assert_eq!(beltrano.cell("Gols"), "");
        assert_eq!(
            beltrano.position_code.as_ref().map(|c| c.as_str()),
            Some("ZAGUEIRO")
        );
    }

    #[test]
    fn short_rows_are_tolerated() {
        let csv = "Jogador,Posição,Gols\nCicrano,Meia\n";
        let catalog = ProfileCatalog::bundled().expect("bundled catalog");
        let ds = dataset_from_reader(csv.as_bytes(), &Settings::default(), &catalog)
            .expect("dataset");
        assert_eq!(ds.records.len(), 1);
        assert_eq!(ds.records[0].raw_value("Gols"), 0.0);
    }

    #[test]
    fn missing_name_column_is_an_error() {
        let csv = "Nome,Gols\nFulano,1\n";
        let catalog = ProfileCatalog::bundled().expect("bundled catalog");
        assert!(dataset_from_reader(csv.as_bytes(), &Settings::default(), &catalog).is_err());
    }
}
