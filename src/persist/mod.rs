pub mod fs;
pub mod memory;
pub mod sqlite;

use std::path::PathBuf;

use thiserror::Error;
use tracing::debug;

use crate::{
    agent::AgentRecord,
    core::{
        roster::{Roster, RosterError},
        series::{DailySummary, StatisticsSeries},
    },
    types::{SnapshotDate, SubsetLabel},
};

/// Version number for the persisted series envelope.
pub const SERIES_FORMAT_VERSION: u16 = 1;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("no roster persisted for {0}")]
    RosterNotFound(SnapshotDate),
    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
    #[error(transparent)]
    Roster(#[from] RosterError),
    #[error("unsupported series format version {0}")]
    UnsupportedFormat(u16),
    #[error("{0}")]
    Message(String),
}

impl PersistError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type PersistResult<T> = Result<T, PersistError>;

/// Read/write access to dated rosters and the artifacts derived from them.
///
/// Implementations assume a single writer; callers must not run two
/// recomputations against the same store at once.
pub trait SnapshotStore {
    /// Every date with a persisted roster, ascending. Labels that are not
    /// canonical `YYYY-MM-DD` dates are skipped.
    fn list_available_dates(&self) -> PersistResult<Vec<SnapshotDate>>;

    /// Fails with [`PersistError::RosterNotFound`] when no roster exists.
    fn read_roster(&self, date: SnapshotDate) -> PersistResult<Roster>;

    fn write_roster(&mut self, roster: &Roster) -> PersistResult<()>;

    fn read_subset(

        &self,

        date: SnapshotDate,

        label: SubsetLabel,

    ) -> PersistResult<Option<Vec<AgentRecord>>>;

    /// Replaces whatever was stored under `label` for `date`.
    fn write_subset(
        &mut self,
        date: SnapshotDate,
        label: SubsetLabel,
        records: &[AgentRecord],
    ) -> PersistResult<()>;

    fn read_summary(&self, date: SnapshotDate) -> PersistResult<Option<DailySummary>>;

    /// Replaces any prior summary for `summary.date`.
    fn write_summary(&mut self, summary: &DailySummary) -> PersistResult<()>;

    /// Dates that currently carry a persisted summary, ascending.
    fn summary_dates(&self) -> PersistResult<Vec<SnapshotDate>>;

    fn read_series(&self) -> PersistResult<Option<StatisticsSeries>>;

    fn write_series(&mut self, series: &StatisticsSeries) -> PersistResult<()>;

    /// Folds every persisted summary into one series and stores it as the
    /// canonical series artifact.
    fn append_series(&mut self) -> PersistResult<StatisticsSeries> {
        let mut summaries = Vec::new();
        for date in self.summary_dates()? {
            if let Some(summary) = self.read_summary(date)? {
                summaries.push(summary);
            }
        }
        let series = StatisticsSeries::from_summaries(summaries);
        self.write_series(&series)?;
        debug!(entries = series.len(), "series persisted");
        Ok(series)
    }
}

/// Series payload wrapper so older artifacts can be detected on read.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub(crate) struct SeriesEnvelope {
    pub format_version: u16,
    pub series: StatisticsSeries,
}

impl SeriesEnvelope {
    pub fn new(series: StatisticsSeries) -> Self {
        Self {
            format_version: SERIES_FORMAT_VERSION,
            series,
        }
    }

    pub fn into_series(self) -> PersistResult<StatisticsSeries> {
        if self.format_version != SERIES_FORMAT_VERSION {
            return Err(PersistError::UnsupportedFormat(self.format_version));
        }
        if !self.series.is_well_formed() {
            return Err(PersistError::Message(
                "series artifact is not sorted by date".to_string(),
            ));
        }
        Ok(self.series)
    }
}
