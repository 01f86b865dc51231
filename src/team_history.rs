use std::collections::HashMap;

use chrono::NaiveDate;

use crate::dataset::{MatchRecord, MatchTable};

/// Per-team appearance index over one match table. Built once per run so
/// window resolution is a slice lookup instead of a full-table scan; the
/// returned windows are identical to what a scan would produce.
#[derive(Debug, Clone, Default)]
pub struct TeamHistoryIndex {
    by_team: HashMap<String, Vec<usize>>,
}

impl TeamHistoryIndex {
    pub fn build(table: &MatchTable) -> Self {
        let mut by_team: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, record) in table.records().iter().enumerate() {
            by_team.entry(record.home_team.clone()).or_default().push(idx);
            by_team.entry(record.away_team.clone()).or_default().push(idx);
        }
        Self { by_team }
    }

    /// Up to `n` most recent appearances of `team` strictly before
    /// `before`, oldest first. Same-date records are excluded; an unknown
    /// team or no prior appearances yields an empty window.
    pub fn window<'a>(
        &self,
        table: &'a MatchTable,
        team: &str,
        before: NaiveDate,
        n: usize,
    ) -> Vec<&'a MatchRecord> {
        let Some(indices) = self.by_team.get(team) else {
            return Vec::new();
        };
        let records = table.records();
        // Appearance lists follow table order, so dates are non-decreasing.
        let cut = indices.partition_point(|&idx| records[idx].date < before);
        let start = cut.saturating_sub(n);
        indices[start..cut].iter().map(|&idx| &records[idx]).collect()
    }
}
