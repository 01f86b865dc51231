use std::path::PathBuf;

use anyhow::Result;

use goalcast::run_config::RunConfig;
use goalcast::{artifacts, dataset, feature_table, regression};

fn main() -> Result<()> {
    let mut config = RunConfig::from_env();
    if let Some(dir) = parse_path_arg("--raw-dir") {
        config.raw_dir = dir;
    }
    if let Some(dir) = parse_path_arg("--features-dir") {
        config.features_dir = dir;
    }
    if let Some(dir) = parse_path_arg("--models-dir") {
        config.models_dir = dir;
    }
    if let Some(window) = parse_usize_arg("--window") {
        config.window = window.max(1);
    }
    if let Some(splits) = parse_usize_arg("--splits") {
        config.n_splits = splits.max(1);
    }

    println!("Loading match files from {}", config.raw_dir.display());
    let table = dataset::load_dir(&config.raw_dir)?;
    println!("Loaded {} matches", table.len());

    println!("Computing rolling features (window {})", config.window);
    let features = feature_table::assemble(&table, config.window);
    let snapshot_path = feature_table::save_snapshot(&features, &config.features_dir)?;
    println!("Feature snapshot: {}", snapshot_path.display());

    println!("Training goal regressors ({} folds)", config.n_splits);
    let model = regression::train(&features, config.n_splits)?;
    println!("Held-out fold: {} matches", model.held_out.matches.len());

    let paths = artifacts::save_model(&model, &config.models_dir)?;
    println!("Home model: {}", paths.home.display());
    println!("Away model: {}", paths.away.display());
    println!("Test set:   {}", paths.test_set.display());
    Ok(())
}

fn parse_path_arg(name: &str) -> Option<PathBuf> {
    parse_string_arg(name).map(PathBuf::from)
}

fn parse_usize_arg(name: &str) -> Option<usize> {
    parse_string_arg(name).and_then(|raw| raw.parse().ok())
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
