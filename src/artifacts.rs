use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::Utc;

use crate::errors::DataError;
use crate::feature_table::{load_snapshot, write_snapshot};
use crate::regression::{OlsRegressor, TrainedModel};

/// Filenames of one persisted training run.
#[derive(Debug, Clone)]
pub struct ModelArtifactPaths {
    pub home: PathBuf,
    pub away: PathBuf,
    pub test_set: PathBuf,
}

/// Persists the two regressors as JSON and the held-out fold as CSV under
/// `dir`, one timestamped artifact set per training run. Prior runs are
/// never overwritten.
pub fn save_model(model: &TrainedModel, dir: &Path) -> Result<ModelArtifactPaths, DataError> {
    fs::create_dir_all(dir)?;

    let stamp = Utc::now().format("%Y-%m-%d_%H-%M-%S").to_string();
    let mut tag = stamp.clone();
    let mut attempt = 1u32;
    let paths = loop {
        let paths = ModelArtifactPaths {
            home: dir.join(format!("home_model_{tag}.json")),
            away: dir.join(format!("away_model_{tag}.json")),
            test_set: dir.join(format!("test_set_{tag}.csv")),
        };
        if !paths.home.exists() && !paths.away.exists() && !paths.test_set.exists() {
            break paths;
        }
        attempt += 1;
        tag = format!("{stamp}-{attempt}");
    };

    write_json(&model.home, &paths.home)?;
    write_json(&model.away, &paths.away)?;
    write_snapshot(&model.held_out, &paths.test_set)?;
    Ok(paths)
}

/// Loads the most recent artifact set from `dir`, each file selected by
/// modification time independently, matching how the artifacts are
/// superseded wholesale on retrain.
pub fn load_latest_model(dir: &Path) -> Result<TrainedModel, DataError> {
    let missing = || DataError::NoModelArtifacts(dir.to_path_buf());

    let home_path = latest_by_mtime(dir, "home_model_", ".json")?.ok_or_else(missing)?;
    let away_path = latest_by_mtime(dir, "away_model_", ".json")?.ok_or_else(missing)?;
    let test_path = latest_by_mtime(dir, "test_set_", ".csv")?.ok_or_else(missing)?;

    Ok(TrainedModel {
        home: read_json(&home_path)?,
        away: read_json(&away_path)?,
        held_out: load_snapshot(&test_path)?,
    })
}

fn write_json(model: &OlsRegressor, path: &Path) -> Result<(), DataError> {
    let json = serde_json::to_string_pretty(model)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn read_json(path: &Path) -> Result<OlsRegressor, DataError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Most recently modified file in `dir` whose name has the given prefix
/// and suffix; name order breaks mtime ties so the pick is deterministic.
pub(crate) fn latest_by_mtime(
    dir: &Path,
    prefix: &str,
    suffix: &str,
) -> Result<Option<PathBuf>, DataError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };

    let mut best: Option<(SystemTime, String, PathBuf)> = None;
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !path.is_file() || !name.starts_with(prefix) || !name.ends_with(suffix) {
            continue;
        }
        let modified = entry
            .metadata()
            .and_then(|meta| meta.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        let name = name.to_string();
        if best
            .as_ref()
            .is_none_or(|(t, n, _)| (modified, name.as_str()) > (*t, n.as_str()))
        {
            best = Some((modified, name, path));
        }
    }
    Ok(best.map(|(_, _, path)| path))
}
