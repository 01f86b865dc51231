use std::io::Write;

use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use goalcast::dataset::{self, MatchOutcome, MatchRecord, MatchTable};
use goalcast::errors::PredictError;
use goalcast::feature_table::{FEATURE_COUNT, FeatureTable, FeatureVector, assemble};
use goalcast::predictor::{PredictorHandle, PredictorSnapshot};
use goalcast::regression::{final_fold_boundary, train};

const TEAMS: [&str; 8] = [
    "Ajax", "Betis", "Celta", "Dinamo", "Empoli", "Fulham", "Genk", "Hertha",
];

/// A feature table with pseudo-random integer-valued features and goals
/// chosen by `goals`; every row is complete, dates are unique.
fn crafted_table(
    rows: usize,
    seed: u64,
    goals: impl Fn(&[f64; FEATURE_COUNT], &mut StdRng) -> (u32, u32),
) -> FeatureTable {
    let mut rng = StdRng::seed_from_u64(seed);
    let base = NaiveDate::from_ymd_opt(2019, 8, 1).unwrap();

    let mut records = Vec::with_capacity(rows);
    let mut features = Vec::with_capacity(rows);
    for i in 0..rows {
        let mut values = [None; FEATURE_COUNT];
        for value in &mut values {
            *value = Some(f64::from(rng.gen_range(0..7u32)));
        }
        let dense: [f64; FEATURE_COUNT] = std::array::from_fn(|j| values[j].unwrap());
        let (home_goals, away_goals) = goals(&dense, &mut rng);

        records.push(MatchRecord {
            date: base + Duration::days(i as i64),
            home_team: TEAMS[i % TEAMS.len()].to_string(),
            away_team: TEAMS[(i + 3) % TEAMS.len()].to_string(),
            home_goals,
            away_goals,
            result: MatchOutcome::from_goals(home_goals, away_goals),
            home_shots: 10,
            away_shots: 8,
            home_corners: 4,
            away_corners: 3,
        });
        features.push(FeatureVector::from_array(values));
    }

    FeatureTable {
        matches: MatchTable::from_records(records),
        features,
    }
}

#[test]
fn ols_reproduces_an_exactly_linear_target() {
    // Home goals equal the first feature, away goals the second; the
    // unique least-squares fit must recover that relationship and
    // predict held-out rows exactly.
    let table = crafted_table(80, 11, |x, _| (x[0] as u32, x[1] as u32));
    let model = train(&table, 3).unwrap();

    assert_eq!(model.held_out.matches.len(), 20);
    assert!((model.home.coefficients[0] - 1.0).abs() < 1e-6);
    assert!((model.away.coefficients[1] - 1.0).abs() < 1e-6);

    for (record, features) in model
        .held_out
        .matches
        .records()
        .iter()
        .zip(&model.held_out.features)
    {
        let dense = features.dense().unwrap();
        let predicted_home = model.home.predict(&dense);
        let predicted_away = model.away.predict(&dense);
        assert!((predicted_home - f64::from(record.home_goals)).abs() < 1e-6);
        assert!((predicted_away - f64::from(record.away_goals)).abs() < 1e-6);
    }

    // The exact-match path reports the true goals alongside.
    let snapshot = PredictorSnapshot::new(model);
    let held = snapshot.model().held_out.matches.records()[0].clone();
    let prediction = snapshot
        .predict(&held.home_team, &held.away_team, held.date)
        .unwrap();
    assert_eq!(prediction.actual, Some((held.home_goals, held.away_goals)));
    assert!((prediction.home_goals - f64::from(held.home_goals)).abs() < 1e-6);
}

#[test]
fn fitted_residuals_are_orthogonal_to_the_training_features() {
    // First-order optimality of least squares: residuals sum to zero and
    // are orthogonal to every feature column, for both targets.
    let table = crafted_table(80, 23, |_, rng| {
        (rng.gen_range(0..5u32), rng.gen_range(0..4u32))
    });
    let boundary = final_fold_boundary(table.matches.len(), 3).unwrap();
    let model = train(&table, 3).unwrap();

    for (regressor, target) in [(&model.home, "home"), (&model.away, "away")] {
        let mut residual_sum = 0.0;
        let mut dot = [0.0; FEATURE_COUNT];
        for (record, features) in table.matches.records()[..boundary]
            .iter()
            .zip(&table.features[..boundary])
        {
            let dense = features.dense().unwrap();
            let y = match target {
                "home" => f64::from(record.home_goals),
                _ => f64::from(record.away_goals),
            };
            let residual = y - regressor.predict(&dense);
            residual_sum += residual;
            for (slot, x) in dot.iter_mut().zip(dense) {
                *slot += residual * x;
            }
        }
        assert!(residual_sum.abs() < 1e-5, "{target}: {residual_sum}");
        for (j, value) in dot.iter().enumerate() {
            assert!(value.abs() < 1e-5, "{target} column {j}: {value}");
        }
    }
}

/// Twenty A-vs-B matches with deterministic goals, fed through the real
/// loader, assembler and trainer with two folds.
fn two_team_pipeline() -> (MatchTable, PredictorSnapshot) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("league.csv");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "Date,HomeTeam,AwayTeam,FTHG,FTAG,FTR,HS,AS,HC,AC").unwrap();

    let base = NaiveDate::from_ymd_opt(2019, 8, 3).unwrap();
    for i in 0..20u32 {
        let (home, away) = if i % 2 == 0 { ("A", "B") } else { ("B", "A") };
        let home_goals = i % 4;
        let away_goals = (i + 1) % 3;
        let result = MatchOutcome::from_goals(home_goals, away_goals).code();
        let date = (base + Duration::weeks(i as i64))
            .format(dataset::DATE_FORMAT)
            .to_string();
        writeln!(
            file,
            "{date},{home},{away},{home_goals},{away_goals},{result},{},{},{},{}",
            home_goals * 3 + 4,
            away_goals * 3 + 4,
            i % 5,
            (i + 2) % 5
        )
        .unwrap();
    }
    drop(file);

    let table = dataset::load_dir(dir.path()).unwrap();
    assert_eq!(table.len(), 20);
    let features = assemble(&table, 5);
    let model = train(&features, 2).unwrap();
    (table, PredictorSnapshot::new(model))
}

#[test]
fn exact_held_out_fixture_returns_its_true_goals() {
    let (table, snapshot) = two_team_pipeline();

    // Only the opening round lacks history, so 19 rows survive and the
    // final fold holds the last 19 / 3 = 6 of them.
    assert_eq!(snapshot.model().held_out.matches.len(), 6);

    let last = table.records().last().unwrap().clone();
    let prediction = snapshot
        .predict(&last.home_team, &last.away_team, last.date)
        .unwrap();
    assert_eq!(prediction.actual, Some((last.home_goals, last.away_goals)));
    assert!(prediction.home_goals.is_finite());
    assert!(prediction.away_goals.is_finite());
}

#[test]
fn unseen_fixture_is_reconstructed_without_actuals() {
    let (_, snapshot) = two_team_pipeline();
    let future = NaiveDate::from_ymd_opt(2020, 6, 1).unwrap();

    let prediction = snapshot.predict("A", "B", future).unwrap();
    assert_eq!(prediction.actual, None);
    assert!(prediction.home_goals.is_finite());
    assert!(prediction.away_goals.is_finite());

    // The vector must splice A's home-side columns with B's away-side
    // columns, each from that team's most recent independent record.
    let held = snapshot.model().held_out.clone();
    let (_, home_half) = held
        .matches
        .records()
        .iter()
        .zip(&held.features)
        .filter(|(record, _)| record.home_team == "A")
        .next_back()
        .unwrap();
    let (_, away_half) = held
        .matches
        .records()
        .iter()
        .zip(&held.features)
        .filter(|(record, _)| record.away_team == "B")
        .next_back()
        .unwrap();
    let spliced = FeatureVector {
        home_win_streak: home_half.home_win_streak,
        home_avg_goals: home_half.home_avg_goals,
        home_avg_goals_against: home_half.home_avg_goals_against,
        home_avg_shots: home_half.home_avg_shots,
        home_avg_shots_against: home_half.home_avg_shots_against,
        home_avg_corners: home_half.home_avg_corners,
        home_avg_corners_against: home_half.home_avg_corners_against,
        home_points: home_half.home_points,
        home_goals_per_shot: home_half.home_goals_per_shot,
        away_win_streak: away_half.away_win_streak,
        away_avg_goals: away_half.away_avg_goals,
        away_avg_goals_against: away_half.away_avg_goals_against,
        away_avg_shots: away_half.away_avg_shots,
        away_avg_shots_against: away_half.away_avg_shots_against,
        away_avg_corners: away_half.away_avg_corners,
        away_avg_corners_against: away_half.away_avg_corners_against,
        away_points: away_half.away_points,
        away_goals_per_shot: away_half.away_goals_per_shot,
    };
    let dense = spliced.dense().unwrap();
    assert_eq!(prediction.home_goals, snapshot.model().home.predict(&dense));
    assert_eq!(prediction.away_goals, snapshot.model().away.predict(&dense));
}

#[test]
fn team_without_held_out_appearances_is_fixture_not_found() {
    let (_, snapshot) = two_team_pipeline();
    let date = NaiveDate::from_ymd_opt(2020, 6, 1).unwrap();

    let err = snapshot.predict("C", "B", date).unwrap_err();
    assert!(matches!(err, PredictError::FixtureNotFound { .. }));
    let err = snapshot.predict("A", "C", date).unwrap_err();
    assert!(matches!(err, PredictError::FixtureNotFound { .. }));
}

#[test]
fn handle_serves_only_after_a_snapshot_is_installed() {
    let (table, snapshot) = two_team_pipeline();
    let handle = PredictorHandle::new();
    let last = table.records().last().unwrap().clone();

    assert_eq!(
        handle.predict(&last.home_team, &last.away_team, last.date),
        Err(PredictError::ModelUnavailable)
    );

    handle.install(snapshot);
    assert!(handle.is_ready());
    let prediction = handle
        .predict(&last.home_team, &last.away_team, last.date)
        .unwrap();
    assert_eq!(prediction.actual, Some((last.home_goals, last.away_goals)));
}

#[test]
fn too_few_complete_rows_cannot_be_split() {
    let table = MatchTable::from_records(
        (0..4u32)
            .map(|i| {
                let base = NaiveDate::from_ymd_opt(2019, 8, 3).unwrap();
                MatchRecord {
                    date: base + Duration::weeks(i as i64),
                    home_team: "A".to_string(),
                    away_team: "B".to_string(),
                    home_goals: 1,
                    away_goals: 0,
                    result: MatchOutcome::HomeWin,
                    home_shots: 9,
                    away_shots: 5,
                    home_corners: 4,
                    away_corners: 2,
                }
            })
            .collect(),
    );
    let features = assemble(&table, 5);
    let err = train(&features, 5).unwrap_err();
    assert!(matches!(
        err,
        goalcast::errors::DataError::InsufficientData { rows: 3, splits: 5 }
    ));
}
