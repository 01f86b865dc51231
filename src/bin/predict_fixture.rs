use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;

use goalcast::artifacts;
use goalcast::dataset::DATE_FORMAT;
use goalcast::predictor::{PredictorHandle, PredictorSnapshot};
use goalcast::run_config::RunConfig;

fn main() -> Result<()> {
    let mut config = RunConfig::from_env();
    if let Some(dir) = parse_path_arg("--models-dir") {
        config.models_dir = dir;
    }

    let home = parse_string_arg("--home").context("--home <team> is required")?;
    let away = parse_string_arg("--away").context("--away <team> is required")?;
    let date_raw = parse_string_arg("--date").context("--date <DD/MM/YY> is required")?;
    let date = NaiveDate::parse_from_str(date_raw.trim(), DATE_FORMAT)
        .with_context(|| format!("unparseable --date {date_raw:?}, expected DD/MM/YY"))?;

    let model = artifacts::load_latest_model(&config.models_dir)?;
    let handle = PredictorHandle::new();
    handle.install(PredictorSnapshot::new(model));

    match handle.predict(&home, &away, date) {
        Ok(prediction) => {
            println!(
                "{home} vs {away} on {date_raw}: {:.2} - {:.2}",
                prediction.home_goals, prediction.away_goals
            );
            match prediction.actual {
                Some((actual_home, actual_away)) => {
                    println!("Actual result: {actual_home} - {actual_away}");
                }
                None => {
                    println!(
                        "Fixture not in the held-out set; features reconstructed from \
                         each team's most recent independent appearance."
                    );
                }
            }
        }
        Err(err) => {
            println!("No prediction available: {err}");
        }
    }
    Ok(())
}

fn parse_path_arg(name: &str) -> Option<PathBuf> {
    parse_string_arg(name).map(PathBuf::from)
}

fn parse_string_arg(name: &str) -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let prefix = format!("{name}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix)
            && !value.trim().is_empty()
        {
            return Some(value.trim().to_string());
        }
        if arg == name
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}
