use std::sync::{Arc, RwLock};

use chrono::NaiveDate;

use crate::errors::PredictError;
use crate::feature_table::FeatureVector;
use crate::regression::TrainedModel;

/// A resolved forecast. `actual` is present only when the fixture was
/// found verbatim in the held-out set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub home_goals: f64,
    pub away_goals: f64,
    pub actual: Option<(u32, u32)>,
}

/// An immutable trained model plus its held-out fold, ready to serve.
#[derive(Debug, Clone)]
pub struct PredictorSnapshot {
    model: TrainedModel,
}

impl PredictorSnapshot {
    pub fn new(model: TrainedModel) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &TrainedModel {
        &self.model
    }

    /// Resolves a fixture to a feature vector and runs both regressors.
    ///
    /// An exact (home, away, date) hit in the held-out set uses that
    /// row's features and reports its true goals. Otherwise the vector is
    /// reconstructed from the home side of `home_team`'s most recent
    /// held-out home appearance and the away side of `away_team`'s most
    /// recent held-out away appearance. That path is an approximation: it
    /// blends two unrelated matches' form snapshots and reports no actual
    /// goals.
    pub fn predict(
        &self,
        home_team: &str,
        away_team: &str,
        date: NaiveDate,
    ) -> Result<Prediction, PredictError> {
        let held_out = &self.model.held_out;

        let exact = held_out
            .matches
            .records()
            .iter()
            .zip(&held_out.features)
            .find(|(record, _)| {
                record.date == date
                    && record.home_team == home_team
                    && record.away_team == away_team
            });

        if let Some((record, features)) = exact {
            let prediction = self.run_regressors(features)?;
            return Ok(Prediction {
                actual: Some((record.home_goals, record.away_goals)),
                ..prediction
            });
        }

        let rows = held_out.matches.records().iter().zip(&held_out.features);
        let home_half = rows
            .clone()
            .filter(|(record, _)| record.home_team == home_team)
            .next_back();
        let away_half = rows
            .filter(|(record, _)| record.away_team == away_team)
            .next_back();

        let (Some((_, home_features)), Some((_, away_features))) = (home_half, away_half) else {
            return Err(PredictError::FixtureNotFound {
                home: home_team.to_string(),
                away: away_team.to_string(),
            });
        };

        let reconstructed = FeatureVector {
            home_win_streak: home_features.home_win_streak,
            home_avg_goals: home_features.home_avg_goals,
            home_avg_goals_against: home_features.home_avg_goals_against,
            home_avg_shots: home_features.home_avg_shots,
            home_avg_shots_against: home_features.home_avg_shots_against,
            home_avg_corners: home_features.home_avg_corners,
            home_avg_corners_against: home_features.home_avg_corners_against,
            home_points: home_features.home_points,
            home_goals_per_shot: home_features.home_goals_per_shot,
            away_win_streak: away_features.away_win_streak,
            away_avg_goals: away_features.away_avg_goals,
            away_avg_goals_against: away_features.away_avg_goals_against,
            away_avg_shots: away_features.away_avg_shots,
            away_avg_shots_against: away_features.away_avg_shots_against,
            away_avg_corners: away_features.away_avg_corners,
            away_avg_corners_against: away_features.away_avg_corners_against,
            away_points: away_features.away_points,
            away_goals_per_shot: away_features.away_goals_per_shot,
        };
        self.run_regressors(&reconstructed)
    }

    fn run_regressors(&self, features: &FeatureVector) -> Result<Prediction, PredictError> {
        let Some(dense) = features.dense() else {
            return Err(PredictError::AmbiguousReconstruction);
        };
        Ok(Prediction {
            home_goals: self.model.home.predict(&dense),
            away_goals: self.model.away.predict(&dense),
            actual: None,
        })
    }
}

/// Shared handle for serving layers. Starts unloaded; `install` swaps in
/// a whole snapshot atomically, so concurrent readers observe either the
/// previous model or the new one, never a mix.
#[derive(Debug, Default)]
pub struct PredictorHandle {
    snapshot: RwLock<Option<Arc<PredictorSnapshot>>>,
}

impl PredictorHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install(&self, snapshot: PredictorSnapshot) {
        let mut guard = match self.snapshot.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Some(Arc::new(snapshot));
    }

    pub fn snapshot(&self) -> Option<Arc<PredictorSnapshot>> {
        let guard = match self.snapshot.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.clone()
    }

    pub fn is_ready(&self) -> bool {
        self.snapshot().is_some()
    }

    pub fn predict(
        &self,
        home_team: &str,
        away_team: &str,
        date: NaiveDate,
    ) -> Result<Prediction, PredictError> {
        let Some(snapshot) = self.snapshot() else {
            return Err(PredictError::ModelUnavailable);
        };
        snapshot.predict(home_team, away_team, date)
    }
}
