use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{SnapshotDate, format_snapshot_date};

/// Per-date counts derived from one comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: SnapshotDate,
    pub total_agents: usize,
    pub new_agents: usize,
    pub unlinked_agents: usize,
}

/// Ascending, duplicate-free history of [`DailySummary`] rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatisticsSeries {
    entries: Vec<DailySummary>,
}

impl StatisticsSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds summaries into a series; a later summary for the same date wins.
    pub fn from_summaries(summaries: impl IntoIterator<Item = DailySummary>) -> Self {
        let mut series = Self::new();
        for summary in summaries {
            series.upsert(summary);
        }
        series
    }

    /// Appends or replaces the entry for `summary.date`, keeping date order.
    pub fn upsert(&mut self, summary: DailySummary) {
        match self.entries.binary_search_by_key(&summary.date, |s| s.date) {
            Ok(pos) => self.entries[pos] = summary,
            Err(pos) => self.entries.insert(pos, summary),
        }
    }

    pub fn get(&self, date: SnapshotDate) -> Option<&DailySummary> {
        self.entries
            .binary_search_by_key(&date, |s| s.date)
            .ok()
            .map(|pos| &self.entries[pos])
    }

    pub fn entries(&self) -> &[DailySummary] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest(&self) -> Option<&DailySummary> {
        self.entries.last()
    }

    /// True when dates are strictly ascending. Always holds for series built
    /// through [`Self::upsert`]; decoded artifacts are checked with it.
    pub fn is_well_formed(&self) -> bool {
        self.entries.windows(2).all(|w| w[0].date < w[1].date)
    }
}

impl fmt::Display for StatisticsSeries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return write!(f, "No statistics");
        }

        let header = format!(
            "{:<10}  {:>12}  {:>10}  {:>15}",
            "date", "total_agents", "new_agents", "unlinked_agents"
        );
        writeln!(f, "{header}")?;
        for _ in 0..header.len() {
            write!(f, "-")?;
        }
        writeln!(f)?;
        for s in &self.entries {
            writeln!(
                f,
                "{:<10}  {:>12}  {:>10}  {:>15}",
                format_snapshot_date(s.date),
                s.total_agents,
                s.new_agents,
                s.unlinked_agents
            )?;
        }
        Ok(())
    }
}
