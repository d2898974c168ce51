//! SQLite-backed snapshot store.

use std::path::Path;

use rusqlite::{Connection, OptionalExtension, Transaction, params};
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

/// SQLite implementation of [`crate::persist::SnapshotStore`].
pub struct SqliteSnapshotStore {
    conn: Connection,
}

impl SqliteSnapshotStore {
    /// Opens or creates a SQLite-backed store at `path`.
    ///
    /// Enables WAL mode, foreign keys, and sets `synchronous=NORMAL`.
    pub fn open(path: impl AsRef<Path>) -> PersistResult<Self> {
        let conn = Connection::open(path)?;
        Self::init_connection(conn)
    }

    /// Opens an in-memory SQLite store.
    pub fn open_in_memory() -> PersistResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_connection(conn)
    }

    fn init_connection(conn: Connection) -> PersistResult<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(include_str!("schema.sql"))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        Ok(Self { conn })
    }

    fn dates_from(&self, sql: &str) -> PersistResult<Vec<SnapshotDate>> {
        let mut stmt = self.conn.prepare(sql)?;
        let labels = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut out = Vec::new();
        for label in labels {
            let label = label?;
            match parse_snapshot_date(&label) {
                Some(date) => out.push(date),
                None => warn!(label = %label, "ignoring non-date row"),
            }
        }
        out.sort();
        Ok(out)
    }

    fn load_payloads(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> PersistResult<Vec<AgentRecord>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| row.get::<_, Vec<u8>>(0))?;

        let mut out = Vec::new();
        for payload in rows {
            out.push(serde_json::from_slice(&payload?)?);
        }
        Ok(out)
    }
}

impl SnapshotStore for SqliteSnapshotStore {
    fn list_available_dates(&self) -> PersistResult<Vec<SnapshotDate>> {
        self.dates_from("SELECT date FROM rosters")
    }

    fn read_roster(&self, date: SnapshotDate) -> PersistResult<Roster> {
        let label = format_snapshot_date(date);
        let exists: Option<i64> = self
            .conn
            .query_row("SELECT 1 FROM rosters WHERE date = ?1", params![label], |row| row.get(0))
            .optional()?;
        if exists.is_none() {
            return Err(PersistError::RosterNotFound(date));
        }

        let records = self.load_payloads(
            "SELECT payload FROM roster_agents WHERE date = ?1 ORDER BY agent_id ASC",
            params![label],
        )?;
        Ok(Roster::from_records(date, records)?)
    }

    fn write_roster(&mut self, roster: &Roster) -> PersistResult<()> {
        let label = format_snapshot_date(roster.date());
        let tx = self.conn.transaction()?;
        tx.execute("INSERT OR IGNORE INTO rosters(date) VALUES (?1)", params![label])?;
        tx.execute("DELETE FROM roster_agents WHERE date = ?1", params![label])?;
        insert_records(
            &tx,
            "INSERT INTO roster_agents(date, agent_id, payload) VALUES (?1, ?2, ?3)",
            &label,
            None,
            roster.sorted_records(),
        )?;
        tx.commit()?;
        debug!(date = %label, agents = roster.len(), "roster persisted");
        Ok(())
    }

    fn read_subset(

        &self,

        date: SnapshotDate,

        label: SubsetLabel,

    ) -> PersistResult<Option<Vec<AgentRecord>>> {
        let date_label = format_snapshot_date(date);
        let exists: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM subsets WHERE date = ?1 AND label = ?2",
                params![date_label, label.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Ok(None);
        }

        let records = self.load_payloads(
            "SELECT payload FROM subset_agents \
             WHERE date = ?1 AND label = ?2 ORDER BY agent_id ASC",
            params![date_label, label.as_str()],
        )?;
        Ok(Some(records))
    }

    fn write_subset(

        &mut self,

        date: SnapshotDate,

        label: SubsetLabel,

        records: &[AgentRecord],

    ) -> PersistResult<()> {
        let date_label = format_snapshot_date(date);
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM subsets WHERE date = ?1 AND label = ?2",
            params![date_label, label.as_str()],
        )?;
        tx.execute(
            "INSERT INTO subsets(date, label) VALUES (?1, ?2)",
            params![date_label, label.as_str()],
        )?;
        insert_records(
            &tx,
            "INSERT INTO subset_agents(date, label, agent_id, payload) VALUES (?1, ?4, ?2, ?3)",
            &date_label,
            Some(label),
            records.iter(),
        )?;
        tx.commit()?;
        Ok(())
    }

    fn read_summary(&self, date: SnapshotDate) -> PersistResult<Option<DailySummary>> {
        let summary = self
            .conn
            .query_row(
                "SELECT total_agents, new_agents, unlinked_agents FROM summaries WHERE date = ?1",
                params![format_snapshot_date(date)],
                |row| {
                    Ok(DailySummary {
                        date,
                        total_agents: row.get::<_, i64>(0)? as usize,
                        new_agents: row.get::<_, i64>(1)? as usize,
                        unlinked_agents: row.get::<_, i64>(2)? as usize,
                    })
                },
            )
            .optional()?;
        Ok(summary)
    }

    fn write_summary(&mut self, summary: &DailySummary) -> PersistResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO summaries(date, total_agents, new_agents, unlinked_agents) \
             VALUES (?1, ?2, ?3, ?4)",
            params![
                format_snapshot_date(summary.date),
                summary.total_agents as i64,
                summary.new_agents as i64,
                summary.unlinked_agents as i64,
            ],
        )?;
        Ok(())
    }

    fn summary_dates(&self) -> PersistResult<Vec<SnapshotDate>> {
        self.dates_from("SELECT date FROM summaries")
    }

    fn read_series(&self) -> PersistResult<Option<StatisticsSeries>> {
        let payload: Option<Vec<u8>> = self
            .conn
            .query_row("SELECT payload FROM series WHERE id = 1", [], |row| row.get(0))
            .optional()?;

        let Some(payload) = payload else {
            return Ok(None);
        };
        let env: SeriesEnvelope = serde_json::from_slice(&payload)?;
        env.into_series().map(Some)
    }

    fn write_series(&mut self, series: &StatisticsSeries) -> PersistResult<()> {
        let env = SeriesEnvelope::new(series.clone());
        let payload = serde_json::to_vec(&env)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO series(id, format_version, payload) VALUES (1, ?1, ?2)",
            params![env.format_version, payload],
        )?;
        Ok(())
    }
}

/// Inserts one row per record; `?1` is the date, `?2` the agent id, `?3` the
/// JSON payload and `?4` the subset label when one is given.
fn insert_records<'a>(
    tx: &Transaction<'_>,
    sql: &str,
    date: &str,
    label: Option<SubsetLabel>,
    records: impl IntoIterator<Item = &'a AgentRecord>,
) -> PersistResult<usize> {
    let mut stmt = tx.prepare(sql)?;
    let mut count = 0;
    for rec in records {
        let payload = serde_json::to_vec(rec)?;
        match label {
            Some(label) => stmt.execute(params![date, rec.id, payload, label.as_str()])?,
            None => stmt.execute(params![date, rec.id, payload])?,
        };
        count += 1;
    }
    Ok(count)
}
