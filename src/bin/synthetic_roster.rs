use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};

use scout_engine::fake_roster::{roster_columns, synthetic_roster};
use scout_engine::logging::init_logging;
use scout_engine::settings::Settings;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    init_logging()?;

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let count = parse_arg(&args, "--count")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(200)
        .clamp(1, 100_000);
    let seed = parse_arg(&args, "--seed")
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(42);

    let catalog = Settings::from_env().catalog()?;
    let columns = roster_columns(&catalog);
    let roster = synthetic_roster(count, seed, &catalog);

    match parse_arg(&args, "--out").map(PathBuf::from) {
        Some(path) => {
            let mut wtr = csv::Writer::from_path(&path)
                .with_context(|| format!("create {}", path.display()))?;
            write_roster(&mut wtr, &columns, &roster)?;
            wtr.flush().with_context(|| format!("flush {}", path.display()))?;
            eprintln!("Wrote {} athletes to {}", roster.len(), path.display());
        }
        None => {
            let mut wtr = csv::Writer::from_writer(io::stdout().lock());
            write_roster(&mut wtr, &columns, &roster)?;
            wtr.flush().context("flush stdout")?;
        }
    }
    Ok(())
}

fn write_roster<W: io::Write>(
    wtr: &mut csv::Writer<W>,
    columns: &[String],
    roster: &[scout_engine::AthleteRecord],
) -> Result<()> {
    wtr.write_record(columns).context("write header")?;
    for athlete in roster {
        wtr.write_record(columns.iter().map(|c| athlete.cell(c)))
            .with_context(|| format!("write row for {}", athlete.id))?;
    }
    Ok(())
}

fn parse_arg(args: &[String], flag: &str) -> Option<String> {
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(flag).and_then(|r| r.strip_prefix('=')) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == flag {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}
