use hashbrown::HashSet;

use crate::{
    agent::AgentRecord,
    core::{roster::Roster, series::DailySummary},
    types::SnapshotDate,
};

/// Classification of one roster against an optional earlier roster.
#[derive(Debug, Clone, PartialEq)]
pub struct DeltaResult {
    pub date: SnapshotDate,
    pub previous_date: Option<SnapshotDate>,
    pub total_agents: usize,
    pub new_agents: usize,
    pub unlinked_agents: usize,
    /// Current-roster records whose id is absent from the previous roster,
    /// ascending by id.
    pub new_records: Vec<AgentRecord>,
    /// Previous-roster records whose id is absent from the current roster,
    /// ascending by id.
    pub unlinked_records: Vec<AgentRecord>,
}

impl DeltaResult {
    pub fn summary(&self) -> DailySummary {
        DailySummary {
            date: self.date,
            total_agents: self.total_agents,
            new_agents: self.new_agents,
            unlinked_agents: self.unlinked_agents,
        }
    }
}

/// Compares `current` against `previous` by agent id.
///
/// Without a previous roster every current agent counts as new and nothing
/// is unlinked.
pub fn compute_delta(current: &Roster, previous: Option<&Roster>) -> DeltaResult {
    let Some(previous) = previous else {
        let new_records = current.sorted_records_cloned();
        return DeltaResult {
            date: current.date(),
            previous_date: None,
            total_agents: current.len(),
            new_agents: new_records.len(),
            unlinked_agents: 0,
            new_records,
            unlinked_records: Vec::new(),
        };
    };

    let current_ids = current.ids();
    let previous_ids = previous.ids();

    let new_ids: HashSet<&str> = current_ids.difference(&previous_ids).copied().collect();
    let unlinked_ids: HashSet<&str> = previous_ids.difference(&current_ids).copied().collect();

    DeltaResult {
        date: current.date(),
        previous_date: Some(previous.date()),
        total_agents: current.len(),
        new_agents: new_ids.len(),
        unlinked_agents: unlinked_ids.len(),
        new_records: current.select_sorted(&new_ids),
        unlinked_records: previous.select_sorted(&unlinked_ids),
    }
}
