use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use tracing::info;

use scout_engine::categories::categorize;
use scout_engine::cohort::{cohort, peers_of};
use scout_engine::dataset::{Dataset, load_dataset};
use scout_engine::dominant::{dominant_profile, suggest_profiles};
use scout_engine::export::export_ranking;
use scout_engine::logging::init_logging;
use scout_engine::rating::{self, RatingStrategy, breakdown, rank_cohort, rate_by_name};
use scout_engine::settings::Settings;
use scout_engine::similarity::{default_metrics, find_similar};
use scout_engine::zscore::zscore_rate;
use scout_engine::{AthleteRecord, MetricDefinition, ProfileCatalog, global_catalog};

const USAGE: &str = "\
usage: scout_engine <command> [flags]

commands:
  profiles                      list profiles and eligible positions
  categories --data F           group dataset columns by category
  rank       --data F --profile P [--min-minutes M] [--top N] [--out F.xlsx]
  rate       --data F --player A --profile P [--engine percentile|zscore] [--metrics a,b]
  zscore     --data F --player A [--metrics a,b | --template T] [--min-minutes M]
  dominant   --data F --player A
  similar    --data F --player A [--metrics a,b | --template T] [--top N] [--min-minutes M]
";

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    init_logging()?;

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let Some(command) = args.first().cloned() else {
        print!("{USAGE}");
        return Ok(());
    };

    let mut settings = Settings::from_env();
    if let Some(m) = arg_value(&args, "--min-minutes") {
        settings.min_minutes = m
            .parse::<f64>()
            .with_context(|| format!("invalid --min-minutes {m:?}"))?
            .max(0.0);
    }
    if let Some(n) = arg_value(&args, "--top") {
        settings.top_k = n
            .parse::<usize>()
            .with_context(|| format!("invalid --top {n:?}"))?
            .clamp(1, 50);
    }
    rating::init_rating_pool(settings.threads);
    info!(threads = rating::rating_threads(), "rating pool ready");
    let catalog = global_catalog().context("profile catalog unavailable")?;

    match command.as_str() {
        "profiles" => list_profiles(catalog),
        "categories" => {
            let data = load(&args, &settings, catalog)?;
            for (category, columns) in categorize(&data.columns) {
                if columns.is_empty() {
                    continue;
                }
                println!("{} ({})", category.label(), columns.len());
                for c in columns {
                    println!("  {c}");
                }
            }
            Ok(())
        }
        "rank" => run_rank(&args, &settings, catalog),
        "rate" => run_rate(&args, &settings, catalog),
        "zscore" => run_zscore(&args, &settings, catalog),
        "dominant" => run_dominant(&args, &settings, catalog),
        "similar" => run_similar(&args, &settings, catalog),
        "help" | "--help" | "-h" => {
            print!("{USAGE}");
            Ok(())
        }
        other => {
            eprint!("{USAGE}");
            Err(anyhow!("unknown command {other:?}"))
        }
    }
}

fn list_profiles(catalog: &ProfileCatalog) -> Result<()> {
    for profile in catalog.profiles() {
        let positions = catalog
            .positions_for_profile(&profile.name)
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        println!("{} [{}]", profile.name, positions);
        if !profile.description.is_empty() {
            println!("  {}", profile.description);
        }
    }
    println!();
    println!("templates:");
    for t in catalog.templates() {
        println!("  {:<10} {} ({})", t.name, t.label, t.metrics.join(", "));
    }
    Ok(())
}

fn run_rank(args: &[String], settings: &Settings, catalog: &ProfileCatalog) -> Result<()> {
    let data = load(args, settings, catalog)?;
    let profile_name = required(args, "--profile")?;
    let profile = catalog.require_profile(profile_name)?;
    let rows = rank_cohort(&data.records, profile_name, settings.min_minutes, catalog)?;
    info!(profile = %profile.name, ranked = rows.len(), "ranking complete");

    println!("{} (min {} min)", profile.name, settings.min_minutes);
    for (idx, row) in rows.iter().take(settings.top_k).enumerate() {
        println!(
            "{:>3}. {:<28} {:<18} {:>6.0} min  {:>3}",
            idx + 1,
            row.athlete.id,
            row.athlete
                .position_code
                .as_ref()
                .map(|c| c.to_string())
                .unwrap_or_default(),
            row.athlete.minutes_played,
            row.score
        );
    }

    if let Some(out) = arg_value(args, "--out") {
        let path = PathBuf::from(out);
        let report = export_ranking(&path, profile, &rows)?;
        println!(
            "Exported {} athletes x {} metrics to {}",
            report.athletes,
            report.metrics,
            path.display()
        );
    }
    Ok(())
}

fn run_rate(args: &[String], settings: &Settings, catalog: &ProfileCatalog) -> Result<()> {
    let data = load(args, settings, catalog)?;
    let athlete = player(args, &data)?;
    let profile_name = required(args, "--profile")?;
    let engine = arg_value(args, "--engine").unwrap_or("percentile");

    match engine {
        "percentile" => {
            let profile = catalog.require_profile(profile_name)?;
            let peers = peers_of(athlete, &data.records, settings.min_minutes);
            for part in breakdown(athlete, profile, &peers) {
                println!(
                    "  {:<45} {:>10.2}  p{:<3} x{:.2}",
                    part.key, part.value, part.percentile, part.weight
                );
            }
            let result = rate_by_name(athlete, profile_name, &peers, catalog)?;
            println!(
                "{} / {}: {} ({} peers)",
                result.athlete_id,
                result.profile_name,
                result.score,
                peers.len()
            );
        }
        "zscore" => {
            let metrics = match metric_args(args, catalog)? {
                Some(m) => m,
                None => catalog.require_profile(profile_name)?.metrics().cloned().collect(),
            };
            let strategy = RatingStrategy::PopulationZScore { metrics };
            let pool: Vec<AthleteRecord> = peers_of(athlete, &data.records, settings.min_minutes)
                .into_iter()
                .cloned()
                .collect();
            let score = strategy.score(athlete, &pool, catalog)?;
            println!("{} / {} [{}]: {:.1}", athlete.id, profile_name, strategy.label(), score);
        }
        other => bail!("unknown engine {other:?} (expected percentile or zscore)"),
    }
    Ok(())
}

fn run_zscore(args: &[String], settings: &Settings, catalog: &ProfileCatalog) -> Result<()> {
    let data = load(args, settings, catalog)?;
    let athlete = player(args, &data)?;
    let metrics = match metric_args(args, catalog)? {
        Some(m) => m,
        None => default_metrics(athlete, catalog)?,
    };
    let reference = peers_of(athlete, &data.records, settings.min_minutes);
    let score = zscore_rate(athlete, &metrics, &reference);
    println!(
        "{}: {:.1} over {} metrics ({} in reference)",
        athlete.id,
        score,
        metrics.len(),
        reference.len()
    );
    Ok(())
}

fn run_dominant(args: &[String], settings: &Settings, catalog: &ProfileCatalog) -> Result<()> {
    let data = load(args, settings, catalog)?;
    let athlete = player(args, &data)?;
    match dominant_profile(athlete, &data.records, catalog) {
        Some(d) => println!("{}: {} ({})", athlete.id, d.profile, d.score),
        None => println!("{}: no profile", athlete.id),
    }
    for s in suggest_profiles(athlete, &data.records, catalog).iter().take(3) {
        println!("  {:<32} {:>3}%", s.profile, s.relative);
    }
    Ok(())
}

fn run_similar(args: &[String], settings: &Settings, catalog: &ProfileCatalog) -> Result<()> {
    let data = load(args, settings, catalog)?;
    let target = player(args, &data)?;
    let metrics = match metric_args(args, catalog)? {
        Some(m) => m,
        None => default_metrics(target, catalog)?,
    };
    let pool = match &target.position_code {
        Some(code) => cohort(&data.records, code, settings.min_minutes),
        None => data
            .records
            .iter()
            .filter(|a| a.minutes_played >= settings.min_minutes)
            .collect(),
    };
    let candidates: Vec<&AthleteRecord> = pool.into_iter().filter(|a| a.id != target.id).collect();

    let results = find_similar(
        target,
        &candidates,
        &metrics,
        settings.top_k,
        &data.records,
        catalog,
    );
    println!("Similar to {} ({} candidates)", target.id, candidates.len());
    for (idx, r) in results.iter().enumerate() {
        println!("{:>3}. {:<28} {:>5.1}", idx + 1, r.athlete_id, r.score);
    }
    Ok(())
}

fn load(args: &[String], settings: &Settings, catalog: &ProfileCatalog) -> Result<Dataset> {
    let path = PathBuf::from(required(args, "--data")?);
    load_dataset(&path, settings, catalog)
}

fn player<'a>(args: &[String], data: &'a Dataset) -> Result<&'a AthleteRecord> {
    let name = required(args, "--player")?;
    data.find(name)
        .with_context(|| format!("athlete {name:?} not found in dataset"))
}

/// Explicit `--metrics` list or a named `--template`; `None` when neither is given.
fn metric_args(args: &[String], catalog: &ProfileCatalog) -> Result<Option<Vec<MetricDefinition>>> {
    if let Some(raw) = arg_value(args, "--metrics") {
        let keys: Vec<&str> = raw
            .split([',', ';'])
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .collect();
        if keys.is_empty() {
            bail!("--metrics is empty");
        }
        return Ok(Some(catalog.metrics_for_keys(&keys)));
    }
    if let Some(name) = arg_value(args, "--template") {
        let template = catalog
            .template(name)
            .with_context(|| format!("unknown template {name:?}"))?;
        return Ok(Some(catalog.metrics_for_keys(&template.metrics)));
    }
    Ok(None)
}

fn required<'a>(args: &'a [String], flag: &str) -> Result<&'a str> {
    arg_value(args, flag).with_context(|| format!("missing {flag}"))
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg
            .strip_prefix(flag)
            .and_then(|rest| rest.strip_prefix('='))
        {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed);
            }
        }
        if arg == flag {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() && !next.starts_with("--") {
                return Some(next.trim());
            }
        }
    }
    None
}
