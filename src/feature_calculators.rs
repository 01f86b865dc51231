use rayon::prelude::*;

use crate::dataset::{MatchRecord, MatchTable};
use crate::feature_table::{
    AVG_CORNERS_COLUMNS, AVG_GOALS_COLUMNS, AVG_SHOTS_COLUMNS, EFFICIENCY_COLUMNS,
    FeatureColumns, POINTS_COLUMNS, STREAK_COLUMNS,
};
use crate::team_history::TeamHistoryIndex;

/// One family of rolling statistics. Implementations are pure: they read
/// team/date columns and raw match stats only, never another family's
/// output, so they can run in any order against the same table.
pub trait FeatureCalculator {
    fn name(&self) -> &'static str;

    /// Column names this calculator owns, in emission order.
    fn columns(&self) -> &'static [&'static str];

    fn calculate(
        &self,
        table: &MatchTable,
        history: &TeamHistoryIndex,
        n: usize,
    ) -> FeatureColumns;
}

/// The calculators in their fixed assembly order.
pub fn default_calculators() -> Vec<Box<dyn FeatureCalculator>> {
    vec![
        Box::new(StreakCalculator),
        Box::new(AvgGoalsCalculator),
        Box::new(AvgShotsCalculator),
        Box::new(AvgCornersCalculator),
        Box::new(PointsCalculator),
        Box::new(EfficiencyCalculator),
    ]
}

/// Resolves both teams' windows for every row and applies `row_fn`.
/// Row-parallel; each row only reads strictly earlier rows, so the
/// results are identical to a sequential pass.
fn per_row<F>(
    names: &'static [&'static str],
    table: &MatchTable,
    history: &TeamHistoryIndex,
    n: usize,
    row_fn: F,
) -> FeatureColumns
where
    F: Fn(&MatchRecord, &[&MatchRecord], &[&MatchRecord]) -> Vec<Option<f64>> + Sync,
{
    let rows = table
        .records()
        .par_iter()
        .map(|record| {
            let home_window = history.window(table, &record.home_team, record.date, n);
            let away_window = history.window(table, &record.away_team, record.date, n);
            row_fn(record, &home_window, &away_window)
        })
        .collect();
    FeatureColumns { names, rows }
}

fn mean_by<F>(window: &[&MatchRecord], value: F) -> f64
where
    F: Fn(&MatchRecord) -> u32,
{
    let sum: u32 = window.iter().map(|m| value(m)).sum();
    f64::from(sum) / window.len() as f64
}

/// Consecutive wins walking a team's window from most recent backwards,
/// stopping at the first non-win.
pub struct StreakCalculator;

impl StreakCalculator {
    fn winning_streak(window: &[&MatchRecord], team: &str) -> u32 {
        let mut streak = 0;
        for record in window.iter().rev() {
            if record.is_win_for(team) {
                streak += 1;
            } else {
                break;
            }
        }
        streak
    }
}

impl FeatureCalculator for StreakCalculator {
    fn name(&self) -> &'static str {
        "win_streaks"
    }

    fn columns(&self) -> &'static [&'static str] {
        &STREAK_COLUMNS
    }

    fn calculate(
        &self,
        table: &MatchTable,
        history: &TeamHistoryIndex,
        n: usize,
    ) -> FeatureColumns {
        // No history counts as streak 0, not unknown; each side is
        // evaluated against its own window only.
        per_row(&STREAK_COLUMNS, table, history, n, |record, home, away| {
            vec![
                Some(f64::from(Self::winning_streak(home, &record.home_team))),
                Some(f64::from(Self::winning_streak(away, &record.away_team))),
            ]
        })
    }
}

/// Mean goals scored/conceded per team across its window.
pub struct AvgGoalsCalculator;

impl FeatureCalculator for AvgGoalsCalculator {
    fn name(&self) -> &'static str {
        "avg_goals"
    }

    fn columns(&self) -> &'static [&'static str] {
        &AVG_GOALS_COLUMNS
    }

    fn calculate(
        &self,
        table: &MatchTable,
        history: &TeamHistoryIndex,
        n: usize,
    ) -> FeatureColumns {
        per_row(&AVG_GOALS_COLUMNS, table, history, n, |record, home, away| {
            if home.is_empty() || away.is_empty() {
                return vec![None; AVG_GOALS_COLUMNS.len()];
            }
            vec![
                Some(mean_by(home, |m| m.goals_for(&record.home_team))),
                Some(mean_by(home, |m| m.goals_against(&record.home_team))),
                Some(mean_by(away, |m| m.goals_for(&record.away_team))),
                Some(mean_by(away, |m| m.goals_against(&record.away_team))),
            ]
        })
    }
}

/// Mean shots taken/faced per team across its window.
pub struct AvgShotsCalculator;

impl FeatureCalculator for AvgShotsCalculator {
    fn name(&self) -> &'static str {
        "avg_shots"
    }

    fn columns(&self) -> &'static [&'static str] {
        &AVG_SHOTS_COLUMNS
    }

    fn calculate(
        &self,
        table: &MatchTable,
        history: &TeamHistoryIndex,
        n: usize,
    ) -> FeatureColumns {
        per_row(&AVG_SHOTS_COLUMNS, table, history, n, |record, home, away| {
            if home.is_empty() || away.is_empty() {
                return vec![None; AVG_SHOTS_COLUMNS.len()];
            }
            vec![
                Some(mean_by(home, |m| m.shots_for(&record.home_team))),
                Some(mean_by(home, |m| m.shots_against(&record.home_team))),
                Some(mean_by(away, |m| m.shots_for(&record.away_team))),
                Some(mean_by(away, |m| m.shots_against(&record.away_team))),
            ]
        })
    }
}

/// Mean corners won/conceded per team across its window.
pub struct AvgCornersCalculator;

impl FeatureCalculator for AvgCornersCalculator {
    fn name(&self) -> &'static str {
        "avg_corners"
    }

    fn columns(&self) -> &'static [&'static str] {
        &AVG_CORNERS_COLUMNS
    }

    fn calculate(
        &self,
        table: &MatchTable,
        history: &TeamHistoryIndex,
        n: usize,
    ) -> FeatureColumns {
        per_row(
            &AVG_CORNERS_COLUMNS,
            table,
            history,
            n,
            |record, home, away| {
                if home.is_empty() || away.is_empty() {
                    return vec![None; AVG_CORNERS_COLUMNS.len()];
                }
                vec![
                    Some(mean_by(home, |m| m.corners_for(&record.home_team))),
                    Some(mean_by(home, |m| m.corners_against(&record.home_team))),
                    Some(mean_by(away, |m| m.corners_for(&record.away_team))),
                    Some(mean_by(away, |m| m.corners_against(&record.away_team))),
                ]
            },
        )
    }
}

/// League points accrued across the window, from each team's own
/// perspective in every historical match.
pub struct PointsCalculator;

impl FeatureCalculator for PointsCalculator {
    fn name(&self) -> &'static str {
        "points"
    }

    fn columns(&self) -> &'static [&'static str] {
        &POINTS_COLUMNS
    }

    fn calculate(
        &self,
        table: &MatchTable,
        history: &TeamHistoryIndex,
        n: usize,
    ) -> FeatureColumns {
        per_row(&POINTS_COLUMNS, table, history, n, |record, home, away| {
            if home.is_empty() || away.is_empty() {
                return vec![None; POINTS_COLUMNS.len()];
            }
            let home_points: u32 = home.iter().map(|m| m.points_for(&record.home_team)).sum();
            let away_points: u32 = away.iter().map(|m| m.points_for(&record.away_team)).sum();
            vec![Some(f64::from(home_points)), Some(f64::from(away_points))]
        })
    }
}

/// Goals-per-shot over the whole window: summed goals divided by summed
/// shots, not a mean of per-match ratios. A window whose shot total is
/// zero scores 0.0; an empty window is unknown.
pub struct EfficiencyCalculator;

impl EfficiencyCalculator {
    fn goals_per_shot(window: &[&MatchRecord], team: &str) -> f64 {
        let goals: u32 = window.iter().map(|m| m.goals_for(team)).sum();
        let shots: u32 = window.iter().map(|m| m.shots_for(team)).sum();
        if shots == 0 {
            0.0
        } else {
            f64::from(goals) / f64::from(shots)
        }
    }
}

impl FeatureCalculator for EfficiencyCalculator {
    fn name(&self) -> &'static str {
        "efficiency"
    }

    fn columns(&self) -> &'static [&'static str] {
        &EFFICIENCY_COLUMNS
    }

    fn calculate(
        &self,
        table: &MatchTable,
        history: &TeamHistoryIndex,
        n: usize,
    ) -> FeatureColumns {
        per_row(
            &EFFICIENCY_COLUMNS,
            table,
            history,
            n,
            |record, home, away| {
                if home.is_empty() || away.is_empty() {
                    return vec![None; EFFICIENCY_COLUMNS.len()];
                }
                vec![
                    Some(Self::goals_per_shot(home, &record.home_team)),
                    Some(Self::goals_per_shot(away, &record.away_team)),
                ]
            },
        )
    }
}
