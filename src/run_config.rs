use std::path::PathBuf;

/// Tunables and locations for one pipeline run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// How many of a team's most recent matches feed each rolling stat.
    pub window: usize,
    /// Fold count for the rolling-origin split; only the final fold's
    /// boundary is used.
    pub n_splits: usize,
    pub raw_dir: PathBuf,
    pub features_dir: PathBuf,
    pub models_dir: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            window: 5,
            n_splits: 5,
            raw_dir: PathBuf::from("data/raw"),
            features_dir: PathBuf::from("data/features"),
            models_dir: PathBuf::from("data/models"),
        }
    }
}

impl RunConfig {
    /// Defaults overridden by environment variables where set:
    /// `FORM_WINDOW`, `TIME_SPLITS`, `RAW_DATA_DIR`, `FEATURES_DIR`,
    /// `MODELS_DIR`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            window: env_usize("FORM_WINDOW").unwrap_or(defaults.window).max(1),
            n_splits: env_usize("TIME_SPLITS").unwrap_or(defaults.n_splits).max(1),
            raw_dir: env_path("RAW_DATA_DIR").unwrap_or(defaults.raw_dir),
            features_dir: env_path("FEATURES_DIR").unwrap_or(defaults.features_dir),
            models_dir: env_path("MODELS_DIR").unwrap_or(defaults.models_dir),
        }
    }
}

fn env_usize(key: &str) -> Option<usize> {
    std::env::var(key).ok().and_then(|val| val.trim().parse().ok())
}

fn env_path(key: &str) -> Option<PathBuf> {
    let val = std::env::var(key).ok()?;
    let trimmed = val.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(PathBuf::from(trimmed))
}
