//! In-memory [`SnapshotStore`] for tests, benches and dry runs.

use std::collections::BTreeMap;

use crate::{
    agent::AgentRecord,
    core::{
        roster::Roster,
        series::{DailySummary, StatisticsSeries},
    },
    types::{SnapshotDate, SubsetLabel},
};

use super::{PersistError, PersistResult, SnapshotStore};

/// Store that keeps every artifact in ordered maps.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotStore {
    rosters: BTreeMap<SnapshotDate, Roster>,
    subsets: BTreeMap<(SnapshotDate, SubsetLabel), Vec<AgentRecord>>,
    summaries: BTreeMap<SnapshotDate, DailySummary>,
    series: Option<StatisticsSeries>,
    writes: usize,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store pre-populated with `rosters`.
    pub fn with_rosters(rosters: impl IntoIterator<Item = Roster>) -> Self {
        let mut store = Self::new();
        for roster in rosters {
            store.rosters.insert(roster.date(), roster);
        }
        store
    }

    /// Number of successful write calls of any kind.
    pub fn write_count(&self) -> usize {
        self.writes
    }

    /// Drops a date's summary; lets tests simulate a partially lost history.
    pub fn remove_summary(&mut self, date: SnapshotDate) -> Option<DailySummary> {
        self.summaries.remove(&date)
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn list_available_dates(&self) -> PersistResult<Vec<SnapshotDate>> {
        Ok(self.rosters.keys().copied().collect())
    }

    fn read_roster(&self, date: SnapshotDate) -> PersistResult<Roster> {
        self.rosters
            .get(&date)
            .cloned()
            .ok_or(PersistError::RosterNotFound(date))
    }

    fn write_roster(&mut self, roster: &Roster) -> PersistResult<()> {
        self.rosters.insert(roster.date(), roster.clone());
        self.writes += 1;
        Ok(())
    }

    fn read_subset(

        &self,

        date: SnapshotDate,

        label: SubsetLabel,

    ) -> PersistResult<Option<Vec<AgentRecord>>> {
        Ok(self.subsets.get(&(date, label)).cloned())
    }

    fn write_subset(

        &mut self,

        date: SnapshotDate,

        label: SubsetLabel,

        records: &[AgentRecord],

    ) -> PersistResult<()> {
        self.subsets.insert((date, label), records.to_vec());
        self.writes += 1;
        Ok(())
    }

    fn read_summary(&self, date: SnapshotDate) -> PersistResult<Option<DailySummary>> {
        Ok(self.summaries.get(&date).copied())
    }

    fn write_summary(&mut self, summary: &DailySummary) -> PersistResult<()> {
        self.summaries.insert(summary.date, *summary);
        self.writes += 1;
        Ok(())
    }

    fn summary_dates(&self) -> PersistResult<Vec<SnapshotDate>> {
        Ok(self.summaries.keys().copied().collect())
    }

    fn read_series(&self) -> PersistResult<Option<StatisticsSeries>> {
        Ok(self.series.clone())
    }

    fn write_series(&mut self, series: &StatisticsSeries) -> PersistResult<()> {
        self.series = Some(series.clone());
        self.writes += 1;
        Ok(())
    }
}
