use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use csv::StringRecord;

use crate::errors::DataError;

/// Source files store dates as day/month/two-digit-year.
pub const DATE_FORMAT: &str = "%d/%m/%y";

pub const DATE_COLUMN: &str = "Date";
pub const HOME_TEAM_COLUMN: &str = "HomeTeam";
pub const AWAY_TEAM_COLUMN: &str = "AwayTeam";
pub const HOME_GOALS_COLUMN: &str = "FTHG";
pub const AWAY_GOALS_COLUMN: &str = "FTAG";
pub const RESULT_COLUMN: &str = "FTR";
pub const HOME_SHOTS_COLUMN: &str = "HS";
pub const AWAY_SHOTS_COLUMN: &str = "AS";
pub const HOME_CORNERS_COLUMN: &str = "HC";
pub const AWAY_CORNERS_COLUMN: &str = "AC";

/// Full-time result from the home side's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    HomeWin,
    Draw,
    AwayWin,
}

impl MatchOutcome {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "H" => Some(Self::HomeWin),
            "D" => Some(Self::Draw),
            "A" => Some(Self::AwayWin),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::HomeWin => "H",
            Self::Draw => "D",
            Self::AwayWin => "A",
        }
    }

    pub fn from_goals(home_goals: u32, away_goals: u32) -> Self {
        if home_goals > away_goals {
            Self::HomeWin
        } else if home_goals < away_goals {
            Self::AwayWin
        } else {
            Self::Draw
        }
    }
}

/// One played fixture. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    pub date: NaiveDate,
    pub home_team: String,
    pub away_team: String,
    pub home_goals: u32,
    pub away_goals: u32,
    pub result: MatchOutcome,
    pub home_shots: u32,
    pub away_shots: u32,
    pub home_corners: u32,
    pub away_corners: u32,
}

impl MatchRecord {
    pub fn is_home(&self, team: &str) -> bool {
        self.home_team == team
    }

    pub fn involves(&self, team: &str) -> bool {
        self.home_team == team || self.away_team == team
    }

    // The perspective accessors below expect a team that appears in the
    // record; any other name reads as the away side.

    pub fn goals_for(&self, team: &str) -> u32 {
        if self.is_home(team) {
            self.home_goals
        } else {
            self.away_goals
        }
    }

    pub fn goals_against(&self, team: &str) -> u32 {
        if self.is_home(team) {
            self.away_goals
        } else {
            self.home_goals
        }
    }

    pub fn shots_for(&self, team: &str) -> u32 {
        if self.is_home(team) {
            self.home_shots
        } else {
            self.away_shots
        }
    }

    pub fn shots_against(&self, team: &str) -> u32 {
        if self.is_home(team) {
            self.away_shots
        } else {
            self.home_shots
        }
    }

    pub fn corners_for(&self, team: &str) -> u32 {
        if self.is_home(team) {
            self.home_corners
        } else {
            self.away_corners
        }
    }

    pub fn corners_against(&self, team: &str) -> u32 {
        if self.is_home(team) {
            self.away_corners
        } else {
            self.home_corners
        }
    }

    pub fn is_win_for(&self, team: &str) -> bool {
        match self.result {
            MatchOutcome::HomeWin => self.is_home(team),
            MatchOutcome::AwayWin => !self.is_home(team),
            MatchOutcome::Draw => false,
        }
    }

    /// League points earned by `team` in this match: 3 win, 1 draw, 0 loss.
    pub fn points_for(&self, team: &str) -> u32 {
        match self.result {
            MatchOutcome::Draw => 1,
            _ if self.is_win_for(team) => 3,
            _ => 0,
        }
    }
}

/// A chronologically sorted sequence of match records, the unit of truth
/// for one training/inference run. Never mutated in place.
#[derive(Debug, Clone, Default)]
pub struct MatchTable {
    records: Vec<MatchRecord>,
}

impl MatchTable {
    /// Sorts ascending by date. Relative order of same-date records is
    /// whatever the input order was; nothing may depend on it.
    pub fn from_records(mut records: Vec<MatchRecord>) -> Self {
        records.sort_by_key(|r| r.date);
        Self { records }
    }

    pub fn records(&self) -> &[MatchRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Reads every `*.csv` file in `dir`, keeps the essential columns, parses
/// dates and returns one date-sorted table. Read-only; order across files
/// is insignificant because rows are re-sorted afterward.
pub fn load_dir(dir: &Path) -> Result<MatchTable, DataError> {
    let files = list_csv_files(dir)?;
    if files.is_empty() {
        return Err(DataError::NoInputFiles(dir.to_path_buf()));
    }

    let mut records = Vec::new();
    for file in &files {
        read_match_file(file, &mut records)?;
    }
    Ok(MatchTable::from_records(records))
}

fn list_csv_files(dir: &Path) -> Result<Vec<PathBuf>, DataError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(DataError::NoInputFiles(dir.to_path_buf()));
        }
        Err(err) => return Err(err.into()),
    };

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if path.is_file() && is_csv {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn read_match_file(path: &Path, out: &mut Vec<MatchRecord>) -> Result<(), DataError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;
    let headers = reader.headers()?.clone();
    let columns = EssentialColumns::locate(&headers)?;

    for (row_idx, row) in reader.records().enumerate() {
        let row = row?;
        out.push(columns.parse_row(&row, row_idx)?);
    }
    Ok(())
}

/// Header indices of the essential columns within one source file.
pub(crate) struct EssentialColumns {
    date: usize,
    home_team: usize,
    away_team: usize,
    home_goals: usize,
    away_goals: usize,
    result: usize,
    home_shots: usize,
    away_shots: usize,
    home_corners: usize,
    away_corners: usize,
}

impl EssentialColumns {
    pub(crate) fn locate(headers: &StringRecord) -> Result<Self, DataError> {
        Ok(Self {
            date: locate_column(headers, DATE_COLUMN)?,
            home_team: locate_column(headers, HOME_TEAM_COLUMN)?,
            away_team: locate_column(headers, AWAY_TEAM_COLUMN)?,
            home_goals: locate_column(headers, HOME_GOALS_COLUMN)?,
            away_goals: locate_column(headers, AWAY_GOALS_COLUMN)?,
            result: locate_column(headers, RESULT_COLUMN)?,
            home_shots: locate_column(headers, HOME_SHOTS_COLUMN)?,
            away_shots: locate_column(headers, AWAY_SHOTS_COLUMN)?,
            home_corners: locate_column(headers, HOME_CORNERS_COLUMN)?,
            away_corners: locate_column(headers, AWAY_CORNERS_COLUMN)?,
        })
    }

    pub(crate) fn parse_row(
        &self,
        row: &StringRecord,
        row_idx: usize,
    ) -> Result<MatchRecord, DataError> {
        let date_raw = cell(row, self.date, DATE_COLUMN, row_idx)?;
        let date = NaiveDate::parse_from_str(date_raw.trim(), DATE_FORMAT)?;

        let result_raw = cell(row, self.result, RESULT_COLUMN, row_idx)?;
        let result =
            MatchOutcome::from_code(result_raw).ok_or_else(|| DataError::InvalidField {
                column: RESULT_COLUMN.to_string(),
                row: row_idx,
                value: result_raw.to_string(),
            })?;

        Ok(MatchRecord {
            date,
            home_team: cell(row, self.home_team, HOME_TEAM_COLUMN, row_idx)?.to_string(),
            away_team: cell(row, self.away_team, AWAY_TEAM_COLUMN, row_idx)?.to_string(),
            home_goals: parse_count(row, self.home_goals, HOME_GOALS_COLUMN, row_idx)?,
            away_goals: parse_count(row, self.away_goals, AWAY_GOALS_COLUMN, row_idx)?,
            result,
            home_shots: parse_count(row, self.home_shots, HOME_SHOTS_COLUMN, row_idx)?,
            away_shots: parse_count(row, self.away_shots, AWAY_SHOTS_COLUMN, row_idx)?,
            home_corners: parse_count(row, self.home_corners, HOME_CORNERS_COLUMN, row_idx)?,
            away_corners: parse_count(row, self.away_corners, AWAY_CORNERS_COLUMN, row_idx)?,
        })
    }
}

pub(crate) fn locate_column(headers: &StringRecord, name: &str) -> Result<usize, DataError> {
    headers
        .iter()
        .position(|header| header.trim() == name)
        .ok_or_else(|| DataError::MissingColumn(name.to_string()))
}

fn cell<'a>(
    row: &'a StringRecord,
    idx: usize,
    column: &str,
    row_idx: usize,
) -> Result<&'a str, DataError> {
    row.get(idx).ok_or_else(|| DataError::InvalidField {
        column: column.to_string(),
        row: row_idx,
        value: "<missing>".to_string(),
    })
}

fn parse_count(
    row: &StringRecord,
    idx: usize,
    column: &str,
    row_idx: usize,
) -> Result<u32, DataError> {
    let raw = cell(row, idx, column, row_idx)?;
    raw.trim()
        .parse::<u32>()
        .map_err(|_| DataError::InvalidField {
            column: column.to_string(),
            row: row_idx,
            value: raw.to_string(),
        })
}
