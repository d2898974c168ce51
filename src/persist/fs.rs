//! Directory-per-date store.
//!
//! Layout under the root directory:
//!
//! ```text
//! <root>/stats.json              series envelope
//! <root>/2024-01-02/agents.json  full roster
//! <root>/2024-01-02/new.json     agents new since the previous date
//! <root>/2024-01-02/unlinked.json
//! <root>/2024-01-02/stats.json   daily summary
//! ```
//!
//! Every file is pretty-printed JSON with a trailing newline and records
//! sorted by id, so unchanged inputs produce byte-identical files. Writes land
//! in a sibling `.tmp` file first and are renamed into place.

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::{
    agent::AgentRecord,
    core::{
        roster::Roster,
        series::{DailySummary, StatisticsSeries},
    },
    types::{SnapshotDate, SubsetLabel, format_snapshot_date, parse_snapshot_date},
};

use super::{PersistError, PersistResult, SeriesEnvelope, SnapshotStore};

const ROSTER_FILE: &str = "agents.json";
const SUMMARY_FILE: &str = "stats.json";
const SERIES_FILE: &str = "stats.json";

/// [`SnapshotStore`] backed by one directory per calendar date.
#[derive(Debug, Clone)]
pub struct DirSnapshotStore {
    root: PathBuf,
}

impl DirSnapshotStore {
    /// Opens (creating if needed) a store rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> PersistResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|e| PersistError::io(&root, e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding every artifact for `date`.
    pub fn date_dir(&self, date: SnapshotDate) -> PathBuf {
        self.root.join(format_snapshot_date(date))
    }

    pub fn series_path(&self) -> PathBuf {
        self.root.join(SERIES_FILE)
    }

    fn subset_path(&self, date: SnapshotDate, label: SubsetLabel) -> PathBuf {
        self.date_dir(date).join(format!("{}.json", label.as_str()))
    }

    /// Dated directories that contain `file`, ascending.
    fn dates_with(&self, file: &str) -> PersistResult<Vec<SnapshotDate>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(PersistError::io(&self.root, err)),
        };

        let mut dates = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| PersistError::io(&self.root, e))?;
            let name = entry.file_name();
            let Some(date) = name.to_str().and_then(parse_snapshot_date) else {
                warn!(entry = ?name, "ignoring non-date store entry");
                continue;
            };
            let path = entry.path();
            if path.is_dir() && path.join(file).is_file() {
                dates.push(date);
            }
        }
        dates.sort();
        Ok(dates)
    }
}

impl SnapshotStore for DirSnapshotStore {
    fn list_available_dates(&self) -> PersistResult<Vec<SnapshotDate>> {
        self.dates_with(ROSTER_FILE)
    }

    fn read_roster(&self, date: SnapshotDate) -> PersistResult<Roster> {
        let path = self.date_dir(date).join(ROSTER_FILE);
        let records: Vec<AgentRecord> =
            read_json(&path)?.ok_or(PersistError::RosterNotFound(date))?;
        Ok(Roster::from_records(date, records)?)
    }

    fn write_roster(&mut self, roster: &Roster) -> PersistResult<()> {
        let path = self.date_dir(roster.date()).join(ROSTER_FILE);
        write_json(&path, &roster.sorted_records())
    }

    fn read_subset(

        &self,

        date: SnapshotDate,

        label: SubsetLabel,

    ) -> PersistResult<Option<Vec<AgentRecord>>> {
        read_json(&self.subset_path(date, label))
    }

    fn write_subset(

        &mut self,

        date: SnapshotDate,

        label: SubsetLabel,

        records: &[AgentRecord],

    ) -> PersistResult<()> {
        write_json(&self.subset_path(date, label), &records)
    }

    fn read_summary(&self, date: SnapshotDate) -> PersistResult<Option<DailySummary>> {
        let summary: Option<DailySummary> = read_json(&self.date_dir(date).join(SUMMARY_FILE))?;
        match summary {
            Some(s) if s.date != date => {
                warn!(
                    dir = %format_snapshot_date(date),
                    recorded = %s.date,
                    "summary date does not match its directory"
                );
                Err(PersistError::Message(format!(
                    "summary in {} is recorded for {}",
                    format_snapshot_date(date),
                    s.date
                )))
            }
            other => Ok(other),
        }
    }

    fn write_summary(&mut self, summary: &DailySummary) -> PersistResult<()> {
        write_json(&self.date_dir(summary.date).join(SUMMARY_FILE), summary)
    }

    fn summary_dates(&self) -> PersistResult<Vec<SnapshotDate>> {
        self.dates_with(SUMMARY_FILE)
    }

    fn read_series(&self) -> PersistResult<Option<StatisticsSeries>> {
        let env: Option<SeriesEnvelope> = read_json(&self.series_path())?;
        env.map(SeriesEnvelope::into_series).transpose()
    }

    fn write_series(&mut self, series: &StatisticsSeries) -> PersistResult<()> {
        write_json(&self.series_path(), &SeriesEnvelope::new(series.clone()))
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> PersistResult<Option<T>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(PersistError::io(path, err)),
    };
    Ok(Some(serde_json::from_slice(&bytes)?))
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> PersistResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| PersistError::io(parent, e))?;
    }
    let mut bytes = serde_json::to_vec_pretty(value)?;
    bytes.push(b'\n');

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, &bytes).map_err(|e| PersistError::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| PersistError::io(path, e))?;
    debug!(path = %path.display(), bytes = bytes.len(), "wrote artifact");
    Ok(())
}
