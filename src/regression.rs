use linfa::prelude::*;
use linfa_linear::LinearRegression;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::dataset::MatchTable;
use crate::errors::DataError;
use crate::feature_table::{FEATURE_COUNT, FeatureTable};

/// A fitted ordinary-least-squares regressor over the canonical feature
/// columns. The coefficient order follows the canonical column order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OlsRegressor {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl OlsRegressor {
    pub fn predict(&self, features: &[f64]) -> f64 {
        debug_assert_eq!(features.len(), self.coefficients.len());
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(features)
                .map(|(c, x)| c * x)
                .sum::<f64>()
    }
}

/// Two independent regressors plus the exact held-out fold they were
/// evaluated against. Immutable; a retrain produces a whole new value.
#[derive(Debug, Clone)]
pub struct TrainedModel {
    pub home: OlsRegressor,
    pub away: OlsRegressor,
    pub held_out: FeatureTable,
}

/// Final-fold boundary of a rolling-origin split over `rows` rows:
/// the test fold is the last `rows / (splits + 1)` rows, everything
/// before it trains.
pub fn final_fold_boundary(rows: usize, splits: usize) -> Result<usize, DataError> {
    let test_len = rows / (splits + 1);
    if splits == 0 || test_len == 0 {
        return Err(DataError::InsufficientData { rows, splits });
    }
    Ok(rows - test_len)
}

/// Fits the home-goals and away-goals regressors on the rows before the
/// final-fold boundary and captures the rows at/after it as the held-out
/// set. Rows with any unknown feature are dropped first and never
/// participate in either side of the split.
pub fn train(table: &FeatureTable, n_splits: usize) -> Result<TrainedModel, DataError> {
    let records = table.matches.records();

    let complete: Vec<(usize, [f64; FEATURE_COUNT])> = table
        .features
        .iter()
        .enumerate()
        .filter_map(|(idx, features)| features.dense().map(|dense| (idx, dense)))
        .collect();

    let boundary = final_fold_boundary(complete.len(), n_splits)?;
    let (train_rows, test_rows) = complete.split_at(boundary);

    let x = Array2::from_shape_fn((train_rows.len(), FEATURE_COUNT), |(i, j)| {
        train_rows[i].1[j]
    });
    let y_home = Array1::from_iter(
        train_rows
            .iter()
            .map(|(idx, _)| f64::from(records[*idx].home_goals)),
    );
    let y_away = Array1::from_iter(
        train_rows
            .iter()
            .map(|(idx, _)| f64::from(records[*idx].away_goals)),
    );

    let home = fit_ols(x.clone(), y_home)?;
    let away = fit_ols(x, y_away)?;

    // Held out by value: the source table may change underneath a later
    // run, the fold must not.
    let held_out = FeatureTable {
        matches: MatchTable::from_records(
            test_rows
                .iter()
                .map(|(idx, _)| records[*idx].clone())
                .collect(),
        ),
        features: test_rows
            .iter()
            .map(|(idx, _)| table.features[*idx])
            .collect(),
    };

    Ok(TrainedModel {
        home,
        away,
        held_out,
    })
}

fn fit_ols(x: Array2<f64>, y: Array1<f64>) -> Result<OlsRegressor, DataError> {
    let dataset = Dataset::new(x, y);
    let fitted = LinearRegression::new()
        .fit(&dataset)
        .map_err(|err| DataError::Fit(err.to_string()))?;
    Ok(OlsRegressor {
        intercept: fitted.intercept(),
        coefficients: fitted.params().to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_matches_rolling_origin_final_fold() {
        // 19 rows, 2 folds: test fold is 19 / 3 = 6 rows.
        assert_eq!(final_fold_boundary(19, 2).unwrap(), 13);
        // 10 rows, 4 folds: test fold is 2 rows.
        assert_eq!(final_fold_boundary(10, 4).unwrap(), 8);
    }

    #[test]
    fn boundary_rejects_degenerate_splits() {
        assert!(matches!(
            final_fold_boundary(3, 5),
            Err(DataError::InsufficientData { rows: 3, splits: 5 })
        ));
        assert!(matches!(
            final_fold_boundary(10, 0),
            Err(DataError::InsufficientData { .. })
        ));
    }

    #[test]
    fn regressor_predict_is_affine() {
        let model = OlsRegressor {
            intercept: 0.5,
            coefficients: vec![1.0, -2.0, 0.0],
        };
        assert_eq!(model.predict(&[2.0, 1.0, 9.0]), 0.5 + 2.0 - 2.0);
    }
}
