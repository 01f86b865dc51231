use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::artifacts::latest_by_mtime;
use crate::dataset::{
    self, AWAY_CORNERS_COLUMN, AWAY_GOALS_COLUMN, AWAY_SHOTS_COLUMN, AWAY_TEAM_COLUMN,
    DATE_COLUMN, DATE_FORMAT, EssentialColumns, HOME_CORNERS_COLUMN, HOME_GOALS_COLUMN,
    HOME_SHOTS_COLUMN, HOME_TEAM_COLUMN, MatchTable, RESULT_COLUMN,
};
use crate::errors::DataError;
use crate::feature_calculators::default_calculators;
use crate::team_history::TeamHistoryIndex;

pub const STREAK_COLUMNS: [&str; 2] = ["H_WinStreak", "A_WinStreak"];
pub const AVG_GOALS_COLUMNS: [&str; 4] = [
    "H_AvgGoals",
    "H_AvgGoalsAgainst",
    "A_AvgGoals",
    "A_AvgGoalsAgainst",
];
pub const AVG_SHOTS_COLUMNS: [&str; 4] = [
    "H_AvgShots",
    "H_AvgShotsAgainst",
    "A_AvgShots",
    "A_AvgShotsAgainst",
];
pub const AVG_CORNERS_COLUMNS: [&str; 4] = [
    "H_AvgCorners",
    "H_AvgCornersAgainst",
    "A_AvgCorners",
    "A_AvgCornersAgainst",
];
pub const POINTS_COLUMNS: [&str; 2] = ["H_Points", "A_Points"];
pub const EFFICIENCY_COLUMNS: [&str; 2] = ["H_Eff_GoalsPerShot", "A_Eff_GoalsPerShot"];

pub const FEATURE_COUNT: usize = 18;

/// The canonical feature-column order. Assembler, trainer and predictor
/// all index through this one constant; a trained model's coefficients
/// are meaningless under any other ordering.
pub const FEATURE_COLUMNS: [&str; FEATURE_COUNT] = [
    "H_WinStreak",
    "A_WinStreak",
    "H_AvgGoals",
    "H_AvgGoalsAgainst",
    "A_AvgGoals",
    "A_AvgGoalsAgainst",
    "H_AvgShots",
    "H_AvgShotsAgainst",
    "A_AvgShots",
    "A_AvgShotsAgainst",
    "H_AvgCorners",
    "H_AvgCornersAgainst",
    "A_AvgCorners",
    "A_AvgCornersAgainst",
    "H_Points",
    "A_Points",
    "H_Eff_GoalsPerShot",
    "A_Eff_GoalsPerShot",
];

/// Derived statistics for one match row. `None` is the "unknown" sentinel
/// for a side with no usable history; it is distinct from any computed
/// value, including zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FeatureVector {
    pub home_win_streak: Option<f64>,
    pub away_win_streak: Option<f64>,
    pub home_avg_goals: Option<f64>,
    pub home_avg_goals_against: Option<f64>,
    pub away_avg_goals: Option<f64>,
    pub away_avg_goals_against: Option<f64>,
    pub home_avg_shots: Option<f64>,
    pub home_avg_shots_against: Option<f64>,
    pub away_avg_shots: Option<f64>,
    pub away_avg_shots_against: Option<f64>,
    pub home_avg_corners: Option<f64>,
    pub home_avg_corners_against: Option<f64>,
    pub away_avg_corners: Option<f64>,
    pub away_avg_corners_against: Option<f64>,
    pub home_points: Option<f64>,
    pub away_points: Option<f64>,
    pub home_goals_per_shot: Option<f64>,
    pub away_goals_per_shot: Option<f64>,
}

impl FeatureVector {
    /// Field values in canonical column order.
    pub fn as_array(&self) -> [Option<f64>; FEATURE_COUNT] {
        [
            self.home_win_streak,
            self.away_win_streak,
            self.home_avg_goals,
            self.home_avg_goals_against,
            self.away_avg_goals,
            self.away_avg_goals_against,
            self.home_avg_shots,
            self.home_avg_shots_against,
            self.away_avg_shots,
            self.away_avg_shots_against,
            self.home_avg_corners,
            self.home_avg_corners_against,
            self.away_avg_corners,
            self.away_avg_corners_against,
            self.home_points,
            self.away_points,
            self.home_goals_per_shot,
            self.away_goals_per_shot,
        ]
    }

    pub fn from_array(values: [Option<f64>; FEATURE_COUNT]) -> Self {
        Self {
            home_win_streak: values[0],
            away_win_streak: values[1],
            home_avg_goals: values[2],
            home_avg_goals_against: values[3],
            away_avg_goals: values[4],
            away_avg_goals_against: values[5],
            home_avg_shots: values[6],
            home_avg_shots_against: values[7],
            away_avg_shots: values[8],
            away_avg_shots_against: values[9],
            home_avg_corners: values[10],
            home_avg_corners_against: values[11],
            away_avg_corners: values[12],
            away_avg_corners_against: values[13],
            home_points: values[14],
            away_points: values[15],
            home_goals_per_shot: values[16],
            away_goals_per_shot: values[17],
        }
    }

    /// All 18 values, or `None` if any of them is unknown.
    pub fn dense(&self) -> Option<[f64; FEATURE_COUNT]> {
        let values = self.as_array();
        let mut out = [0.0; FEATURE_COUNT];
        for (slot, value) in out.iter_mut().zip(values) {
            *slot = value?;
        }
        Some(out)
    }
}

/// One calculator's output: its owned column names plus one value row per
/// match row, aligned with the table.
#[derive(Debug, Clone)]
pub struct FeatureColumns {
    pub names: &'static [&'static str],
    pub rows: Vec<Vec<Option<f64>>>,
}

/// A match table plus one feature vector per row, aligned by position.
#[derive(Debug, Clone)]
pub struct FeatureTable {
    pub matches: MatchTable,
    pub features: Vec<FeatureVector>,
}

/// Runs the calculators in their fixed order and zips their columns into
/// one `FeatureVector` per row. Deterministic: the same table always
/// yields identical features.
pub fn assemble(table: &MatchTable, window: usize) -> FeatureTable {
    let history = TeamHistoryIndex::build(table);
    let calculators = default_calculators();

    let mut outputs = Vec::with_capacity(calculators.len());
    for calculator in &calculators {
        let columns = calculator.calculate(table, &history, window);
        debug_assert_eq!(columns.rows.len(), table.len());
        outputs.push(columns);
    }

    let emitted: Vec<&str> = outputs
        .iter()
        .flat_map(|c| c.names.iter().copied())
        .collect();
    debug_assert_eq!(emitted, FEATURE_COLUMNS);

    let features = (0..table.len())
        .map(|row| {
            let mut values = [None; FEATURE_COUNT];
            let mut offset = 0;
            for columns in &outputs {
                for (j, value) in columns.rows[row].iter().enumerate() {
                    values[offset + j] = *value;
                }
                offset += columns.names.len();
            }
            FeatureVector::from_array(values)
        })
        .collect();

    FeatureTable {
        matches: table.clone(),
        features,
    }
}

/// Persists a new timestamped snapshot in `dir` and returns its path.
/// Existing snapshots are never overwritten; a same-second rerun gets a
/// numeric suffix.
pub fn save_snapshot(table: &FeatureTable, dir: &Path) -> Result<PathBuf, DataError> {
    fs::create_dir_all(dir)?;
    let stamp = Utc::now().format("%Y-%m-%d_%H-%M-%S").to_string();
    let mut path = dir.join(format!("features_{stamp}.csv"));
    let mut attempt = 1u32;
    while path.exists() {
        attempt += 1;
        path = dir.join(format!("features_{stamp}-{attempt}.csv"));
    }
    write_snapshot(table, &path)?;
    Ok(path)
}

/// Writes the snapshot CSV: the essential match columns followed by the
/// canonical feature columns, unknowns as empty cells.
pub fn write_snapshot(table: &FeatureTable, path: &Path) -> Result<(), DataError> {
    let mut writer = csv::Writer::from_path(path)?;

    let mut header = vec![
        DATE_COLUMN,
        HOME_TEAM_COLUMN,
        AWAY_TEAM_COLUMN,
        HOME_GOALS_COLUMN,
        AWAY_GOALS_COLUMN,
        RESULT_COLUMN,
        HOME_SHOTS_COLUMN,
        AWAY_SHOTS_COLUMN,
        HOME_CORNERS_COLUMN,
        AWAY_CORNERS_COLUMN,
    ];
    header.extend(FEATURE_COLUMNS);
    writer.write_record(&header)?;

    for (record, features) in table.matches.records().iter().zip(&table.features) {
        let mut row = vec![
            record.date.format(DATE_FORMAT).to_string(),
            record.home_team.clone(),
            record.away_team.clone(),
            record.home_goals.to_string(),
            record.away_goals.to_string(),
            record.result.code().to_string(),
            record.home_shots.to_string(),
            record.away_shots.to_string(),
            record.home_corners.to_string(),
            record.away_corners.to_string(),
        ];
        for value in features.as_array() {
            row.push(value.map(|v| v.to_string()).unwrap_or_default());
        }
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Most recently modified `features_*.csv` in `dir`.
pub fn latest_snapshot(dir: &Path) -> Result<PathBuf, DataError> {
    latest_by_mtime(dir, "features_", ".csv")?
        .ok_or_else(|| DataError::NoSnapshot(dir.to_path_buf()))
}

/// Reads a snapshot back. The feature columns are located by header name
/// so extra columns are tolerated; empty cells become unknowns.
pub fn load_snapshot(path: &Path) -> Result<FeatureTable, DataError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;
    let headers = reader.headers()?.clone();
    let match_columns = EssentialColumns::locate(&headers)?;
    let feature_indices: Vec<usize> = FEATURE_COLUMNS
        .iter()
        .map(|name| dataset::locate_column(&headers, name))
        .collect::<Result<_, _>>()?;

    let mut records = Vec::new();
    let mut features = Vec::new();
    for (row_idx, row) in reader.records().enumerate() {
        let row = row?;
        records.push(match_columns.parse_row(&row, row_idx)?);

        let mut values = [None; FEATURE_COUNT];
        for (slot, (&idx, name)) in values
            .iter_mut()
            .zip(feature_indices.iter().zip(FEATURE_COLUMNS))
        {
            let raw = row.get(idx).unwrap_or_default().trim();
            if raw.is_empty() {
                continue;
            }
            *slot = Some(raw.parse::<f64>().map_err(|_| DataError::InvalidField {
                column: name.to_string(),
                row: row_idx,
                value: raw.to_string(),
            })?);
        }
        features.push(FeatureVector::from_array(values));
    }

    // Snapshot rows are already date-sorted; the stable re-sort keeps
    // rows and features aligned.
    Ok(FeatureTable {
        matches: MatchTable::from_records(records),
        features,
    })
}
