use hashbrown::{HashMap, HashSet};
use thiserror::Error;

use crate::{
    agent::AgentRecord,
    types::{AgentId, SnapshotDate},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    #[error("agent id {id:?} appears more than once in the roster for {date}")]
    DuplicateId { date: SnapshotDate, id: AgentId },
    #[error("agent id must not be empty (roster for {0})")]
    EmptyId(SnapshotDate),
}

/// Every agent observed on one calendar date, keyed by id.
#[derive(Debug, Clone, PartialEq)]
pub struct Roster {
    date: SnapshotDate,
    records: HashMap<AgentId, AgentRecord>,
}

impl Roster {
    pub fn new(date: SnapshotDate) -> Self {
        Self {
            date,
            records: HashMap::new(),
        }
    }

    pub fn from_records(
        date: SnapshotDate,
        records: impl IntoIterator<Item = AgentRecord>,
    ) -> Result<Self, RosterError> {
        let mut roster = Self::new(date);
        for rec in records {
            roster.insert(rec)?;
        }
        Ok(roster)
    }

    pub fn insert(&mut self, record: AgentRecord) -> Result<(), RosterError> {
        if record.id.is_empty() {
            return Err(RosterError::EmptyId(self.date));
        }
        if self.records.contains_key(&record.id) {
            return Err(RosterError::DuplicateId {
                date: self.date,
                id: record.id,
            });
        }
        self.records.insert(record.id.clone(), record);
        Ok(())
    }

    pub fn date(&self) -> SnapshotDate {
        self.date
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&AgentRecord> {
        self.records.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    pub fn ids(&self) -> HashSet<&str> {
        self.records.keys().map(String::as_str).collect()
    }

    /// Records in ascending id order.
    pub fn sorted_records(&self) -> Vec<&AgentRecord> {
        let mut out: Vec<&AgentRecord> = self.records.values().collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }

    pub fn sorted_records_cloned(&self) -> Vec<AgentRecord> {
        self.sorted_records().into_iter().cloned().collect()
    }

    /// Records whose id is in `ids`, in ascending id order.
    pub fn select_sorted(&self, ids: &HashSet<&str>) -> Vec<AgentRecord> {
        let mut out: Vec<AgentRecord> = ids
            .iter()
            .filter_map(|id| self.records.get(*id).cloned())
            .collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }
}
