use std::path::PathBuf;

use anyhow::Result;

use goalcast::run_config::RunConfig;
use goalcast::{dataset, feature_table};

fn main() -> Result<()> {
    let mut config = RunConfig::from_env();
    if let Some(dir) = parse_path_arg("--raw-dir") {
        config.raw_dir = dir;
    }
    if let Some(dir) = parse_path_arg("--features-dir") {
        config.features_dir = dir;
    }
    if let Some(window) = parse_usize_arg("--window") {
        config.window = window.max(1);
    }

    let table = dataset::load_dir(&config.raw_dir)?;
    println!(
        "Loaded {} matches from {}",
        table.len(),
        config.raw_dir.display()
    );

    let features = feature_table::assemble(&table, config.window);
    let complete = features
        .features
        .iter()
        .filter(|f| f.dense().is_some())
        .count();
    let path = feature_table::save_snapshot(&features, &config.features_dir)?;

    println!("Feature snapshot: {}", path.display());
    println!(
        "Rows: {} total, {} with full history (window {})",
        features.matches.len(),
        complete,
        config.window
    );
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
