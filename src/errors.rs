use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors raised while loading match data, assembling features or
/// training. Nothing partial is persisted when one of these surfaces.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("no match files found in {0}")]
    NoInputFiles(PathBuf),
    #[error("missing required column: {0}")]
    MissingColumn(String),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("date parse error: {0}")]
    DateParse(#[from] chrono::ParseError),
    #[error("invalid value {value:?} for column {column} at data row {row}")]
    InvalidField {
        column: String,
        row: usize,
        value: String,
    },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("artifact encode/decode error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("not enough complete feature rows to split: {rows} rows for {splits} folds")]
    InsufficientData { rows: usize, splits: usize },
    #[error("model fit failed: {0}")]
    Fit(String),
    #[error("no feature snapshot found in {0}")]
    NoSnapshot(PathBuf),
    #[error("no model artifacts found in {0}")]
    NoModelArtifacts(PathBuf),
}

/// Recoverable prediction failures. The predictor never panics; a serving
/// layer maps these onto its own not-found/unavailable responses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PredictError {
    #[error("prediction model is not loaded")]
    ModelUnavailable,
    #[error("no held-out record can resolve {home} vs {away}")]
    FixtureNotFound { home: String, away: String },
    #[error("reconstructed feature vector contains unknown values")]
    AmbiguousReconstruction,
}
