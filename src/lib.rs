//! Turns a history of football match results into per-match rolling
//! features and fits two ordinary-least-squares regressors (home goals,
//! away goals) on a leakage-free temporal split. The predictor resolves a
//! fixture against the held-out fold, with a documented reconstruction
//! fallback for fixtures it has never seen.

pub mod artifacts;
pub mod dataset;
pub mod errors;
pub mod feature_calculators;
pub mod feature_table;
pub mod predictor;
pub mod regression;
pub mod run_config;
pub mod team_history;
