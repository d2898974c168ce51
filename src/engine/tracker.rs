use thiserror::Error;
use tracing::{info, warn};

use crate::{
    core::series::StatisticsSeries,
    persist::{PersistError, SnapshotStore},
    types::{SnapshotDate, SubsetLabel},
};

use super::delta::{DeltaResult, compute_delta};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no roster persisted for {0}")]
    NotFound(SnapshotDate),
    #[error("snapshot store has no dated rosters")]
    EmptyStore,
    #[error(transparent)]
    Persist(PersistError),
}

impl From<PersistError> for EngineError {
    fn from(value: PersistError) -> Self {
        match value {
            PersistError::RosterNotFound(date) => Self::NotFound(date),
            other => Self::Persist(other),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Runs roster comparisons against a [`SnapshotStore`] and keeps the
/// statistics series in step with the per-date summaries.
pub struct DeltaEngine<S: SnapshotStore> {
    store: S,
}

impl<S: SnapshotStore> DeltaEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Compares `current_date` against `previous_date` and persists the
    /// `new`/`unlinked` subsets and the summary under `current_date`.
    ///
    /// Both rosters are read before anything is written, so a missing roster
    /// leaves the store untouched. Writes stop at the first failure.
    pub fn compare(
        &mut self,
        current_date: SnapshotDate,
        previous_date: Option<SnapshotDate>,
    ) -> EngineResult<DeltaResult> {
        let current = self.store.read_roster(current_date)?;
        let previous = match previous_date {
            Some(date) => {
                if date >= current_date {
                    warn!(
                        current = %current_date,
                        previous = %date,
                        "previous date is not earlier than current date"
                    );
                }
                Some(self.store.read_roster(date)?)
            }
            None => None,
        };

        let delta = compute_delta(&current, previous.as_ref());

        for label in SubsetLabel::ALL {
            let records = match label {
                SubsetLabel::New => &delta.new_records,
                SubsetLabel::Unlinked => &delta.unlinked_records,
            };
            self.store.write_subset(current_date, label, records)?;
        }
        self.store.write_summary(&delta.summary())?;

        info!(
            date = %delta.date,
            previous = ?delta.previous_date,
            total = delta.total_agents,
            new = delta.new_agents,
            unlinked = delta.unlinked_agents,
            "compared rosters"
        );
        Ok(delta)
    }

    /// Compares the newest roster with the one before it, optionally walks
    /// back through every older date, then rebuilds the series from all
    /// persisted summaries.
    pub fn compute_latest(&mut self, recompute_all: bool) -> EngineResult<StatisticsSeries> {
        let dates = self.store.list_available_dates()?;
        if dates.is_empty() {
            return Err(EngineError::EmptyStore);
        }

        for idx in (0..dates.len()).rev() {
            let previous = idx.checked_sub(1).map(|p| dates[p]);
            self.compare(dates[idx], previous)?;
            if !recompute_all {
                break;
            }
        }

        let series = self.store.append_series()?;
        info!(entries = series.len(), recompute_all, "statistics series updated");
        Ok(series)
    }

    /// Returns the persisted series, rebuilding it from summaries when the
    /// artifact is missing.
    pub fn series(&mut self) -> EngineResult<StatisticsSeries> {
        match self.store.read_series()? {
            Some(series) => Ok(series),
            None => {
                warn!("series artifact missing; rebuilding from daily summaries");
                Ok(self.store.append_series()?)
            }
        }
    }
}
