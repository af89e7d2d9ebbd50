use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use rust_xlsxwriter::{Workbook, Worksheet};
use tracing::info;

use crate::catalog::Profile;
use crate::metrics::normalize;
use crate::rating::RankedAthlete;

pub struct ExportReport {
    pub athletes: usize,
    pub metrics: usize,
}

enum Cell {
    Text(String),
    Number(f64),
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

/// Write a profile ranking to an `.xlsx` workbook with a `Ranking` and an `Info` sheet.
pub fn export_ranking(path: &Path, profile: &Profile, rows: &[RankedAthlete<'_>]) -> Result<ExportReport> {
    let ranking_rows = ranking_rows(profile, rows);
    let info_rows = info_rows(profile, rows.len());

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Ranking")?;
        write_rows(sheet, &ranking_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Info")?;
        write_rows(sheet, &info_rows)?;
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;
    info!(path = %path.display(), profile = %profile.name, athletes = rows.len(), "exported ranking");

    Ok(ExportReport {
        athletes: rows.len(),
        metrics: profile.weights.len(),
    })
}

fn ranking_rows(profile: &Profile, rows: &[RankedAthlete<'_>]) -> Vec<Vec<Cell>> {
    let mut header: Vec<Cell> = vec![
        "#".into(),
        "Jogador".into(),
        "Posição".into(),
        "Código".into(),
        "Minutos".into(),
        "Nota".into(),
    ];
    header.extend(profile.metrics().map(|m| Cell::from(m.key.as_str())));

    let mut out = Vec::with_capacity(rows.len() + 1);
    out.push(header);
    for (idx, row) in rows.iter().enumerate() {
        let a = row.athlete;
        let mut line: Vec<Cell> = vec![
            ((idx + 1) as f64).into(),
            a.id.clone().into(),
            a.position_raw.clone().into(),
            a.position_code
                .as_ref()
                .map(|c| c.to_string())
                .unwrap_or_default()
                .into(),
            a.minutes_played.into(),
            (row.score as f64).into(),
        ];
        line.extend(profile.metrics().map(|m| Cell::from(normalize(a, m))));
        out.push(line);
    }
    out
}

fn info_rows(profile: &Profile, athletes: usize) -> Vec<Vec<Cell>> {
    let mut out: Vec<Vec<Cell>> = vec![
        vec!["Perfil".into(), profile.name.clone().into()],
        vec!["Descrição".into(), profile.description.clone().into()],
        vec!["Atletas".into(), (athletes as f64).into()],
        vec![
            "Gerado em".into(),
            Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string().into(),
        ],
        Vec::new(),
        vec!["Métrica".into(), "Peso".into(), "Invertida".into()],
    ];
    for (metric, weight) in &profile.weights {
        out.push(vec![
            metric.key.as_str().into(),
            (*weight).into(),
            if metric.invert { "sim" } else { "não" }.into(),
        ]);
    }
    out
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<Cell>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            let (r, c) = (row_idx as u32, col_idx as u16);
            match value {
                Cell::Text(s) => worksheet.write_string(r, c, s),
                Cell::Number(n) => worksheet.write_number(r, c, *n),
            }
            .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
