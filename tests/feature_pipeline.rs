use chrono::NaiveDate;

use goalcast::dataset::{DATE_FORMAT, MatchOutcome, MatchRecord, MatchTable};
use goalcast::feature_calculators::default_calculators;
use goalcast::feature_table::{FEATURE_COLUMNS, assemble};
use goalcast::team_history::TeamHistoryIndex;

fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
}

fn played(
    date: &str,
    home: &str,
    away: &str,
    home_goals: u32,
    away_goals: u32,
    home_shots: u32,
    away_shots: u32,
) -> MatchRecord {
    MatchRecord {
        date: day(date),
        home_team: home.to_string(),
        away_team: away.to_string(),
        home_goals,
        away_goals,
        result: MatchOutcome::from_goals(home_goals, away_goals),
        home_shots,
        away_shots,
        home_corners: home_shots / 2,
        away_corners: away_shots / 2,
    }
}

/// Four teams trading fixtures across two months.
fn league_table() -> MatchTable {
    MatchTable::from_records(vec![
        played("01/09/19", "A", "B", 2, 0, 11, 6),
        played("01/09/19", "C", "D", 1, 1, 9, 9),
        played("08/09/19", "B", "C", 0, 2, 7, 12),
        played("08/09/19", "D", "A", 1, 3, 8, 14),
        played("15/09/19", "A", "C", 2, 2, 10, 10),
        played("15/09/19", "B", "D", 1, 0, 9, 5),
        played("22/09/19", "C", "A", 0, 1, 6, 9),
        played("22/09/19", "D", "B", 2, 2, 7, 8),
        played("29/09/19", "A", "D", 4, 0, 15, 3),
        played("29/09/19", "C", "B", 1, 0, 8, 6),
        played("06/10/19", "B", "A", 1, 1, 7, 9),
        played("06/10/19", "D", "C", 0, 1, 5, 10),
    ])
}

#[test]
fn windows_never_leak_future_or_same_date_matches() {
    let table = league_table();
    let index = TeamHistoryIndex::build(&table);
    let n = 3;

    for record in table.records() {
        for team in [&record.home_team, &record.away_team] {
            let window = index.window(&table, team, record.date, n);
            assert!(window.len() <= n);
            for past in &window {
                assert!(past.date < record.date);
                assert!(past.involves(team));
            }
        }
    }
}

#[test]
fn efficiency_matches_a_hand_computed_window() {
    // A's prior three matches: 2 goals from 10 shots, 3 from 9, 1 from 5.
    // B's prior three: 1 from 4, 0 from 6, 1 from 7.
    let table = MatchTable::from_records(vec![
        played("01/09/19", "A", "B", 2, 1, 10, 4),
        played("08/09/19", "B", "A", 0, 3, 6, 9),
        played("15/09/19", "A", "B", 1, 1, 5, 7),
        played("22/09/19", "A", "B", 0, 0, 8, 8),
    ]);
    let features = assemble(&table, 3);
    let last = &features.features[3];

    let home_expected = (2.0 + 3.0 + 1.0) / (10.0 + 9.0 + 5.0);
    let away_expected = (1.0 + 0.0 + 1.0) / (4.0 + 6.0 + 7.0);
    assert!((last.home_goals_per_shot.unwrap() - home_expected).abs() < 1e-12);
    assert!((last.away_goals_per_shot.unwrap() - away_expected).abs() < 1e-12);
}

#[test]
fn assembling_twice_yields_identical_features() {
    let table = league_table();
    let first = assemble(&table, 5);
    let second = assemble(&table, 5);
    assert_eq!(first.features, second.features);
}

#[test]
fn calculators_emit_the_canonical_column_order() {
    let emitted: Vec<&str> = default_calculators()
        .iter()
        .flat_map(|calc| calc.columns().iter().copied())
        .collect();
    assert_eq!(emitted, FEATURE_COLUMNS);
    assert_eq!(FEATURE_COLUMNS.len(), 18);
}

#[test]
fn win_streak_is_zero_without_history_or_after_a_loss() {
    // A wins twice, then loses, then plays again: the loss resets the
    // streak regardless of the earlier wins.
    let table = MatchTable::from_records(vec![
        played("01/09/19", "A", "B", 2, 0, 9, 5),
        played("08/09/19", "B", "A", 0, 1, 6, 8),
        played("15/09/19", "A", "B", 0, 2, 7, 10),
        played("22/09/19", "A", "B", 1, 1, 8, 8),
    ]);
    let features = assemble(&table, 5);

    // First-ever match for both sides.
    assert_eq!(features.features[0].home_win_streak, Some(0.0));
    assert_eq!(features.features[0].away_win_streak, Some(0.0));
    // Two wins behind it on row 2.
    assert_eq!(features.features[2].home_win_streak, Some(2.0));
    // The immediately preceding loss zeroes row 3.
    assert_eq!(features.features[3].home_win_streak, Some(0.0));
    // B won its most recent match before row 3.
    assert_eq!(features.features[3].away_win_streak, Some(1.0));
}

#[test]
fn first_appearance_rows_carry_the_unknown_sentinel() {
    let table = league_table();
    let features = assemble(&table, 5);
    let first = &features.features[0];

    assert_eq!(first.home_avg_goals, None);
    assert_eq!(first.away_avg_goals_against, None);
    assert_eq!(first.home_avg_shots, None);
    assert_eq!(first.away_avg_corners, None);
    assert_eq!(first.home_points, None);
    assert_eq!(first.away_goals_per_shot, None);
    // Streaks are 0 for no history, not unknown.
    assert_eq!(first.home_win_streak, Some(0.0));
    assert!(first.dense().is_none());
}

#[test]
fn later_rows_average_each_side_from_its_own_window() {
    let table = league_table();
    let features = assemble(&table, 5);
    // Row 4: A vs C on 15/09. A's window: 2-0 win over B, 3-1 win at D.
    let row = &features.features[4];
    assert_eq!(row.home_avg_goals, Some((2.0 + 3.0) / 2.0));
    assert_eq!(row.home_avg_goals_against, Some((0.0 + 1.0) / 2.0));
    assert_eq!(row.home_points, Some(6.0));
    assert_eq!(row.home_win_streak, Some(2.0));
    // C's window: 1-1 draw with D, 2-0 win at B.
    assert_eq!(row.away_avg_goals, Some((1.0 + 2.0) / 2.0));
    assert_eq!(row.away_points, Some(4.0));
}
