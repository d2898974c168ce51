//! Synthetic daily rosters for demos and tests.
//!
//! Starting from a seed roster, each [`DayStep`] drops the first
//! `num_removed` agents in id order and adds `num_new` agents cloned from
//! random records of the previous day under fresh ids.

use chrono::Days;
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::{
    agent::AgentRecord,
    core::roster::{Roster, RosterError},
    types::{AgentId, SnapshotDate},
};

/// Agents added and removed between two consecutive days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayStep {
    pub num_new: usize,
    pub num_removed: usize,
}

impl DayStep {
    pub const fn new(num_new: usize, num_removed: usize) -> Self {
        Self { num_new, num_removed }
    }
}

/// Ten-day plan mixing growth, shrinkage and churn.
pub fn default_plan() -> Vec<DayStep> {
    vec![
        DayStep::new(20, 0),
        DayStep::new(20, 0),
        DayStep::new(50, 0),
        DayStep::new(10, 0),
        DayStep::new(0, 20),
        DayStep::new(20, 20),
        DayStep::new(10, 30),
        DayStep::new(30, 10),
        DayStep::new(0, 10),
        DayStep::new(0, 5),
    ]
}

/// Deterministic roster generator.
pub struct RosterGenerator {
    rng: StdRng,
}

impl RosterGenerator {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Random UUID-formatted identifier.
    pub fn fresh_id(&mut self) -> AgentId {
        let v: u128 = self.rng.r#gen();
        let hex = format!("{v:032x}");
        format!(
            "{}-{}-{}-{}-{}",
            &hex[0..8],
            &hex[8..12],
            &hex[12..16],
            &hex[16..20],
            &hex[20..32]
        )
    }

    /// Applies one step to `roster`, producing the roster for `date`.
    ///
    /// New agents are cloned from the whole input roster, removed agents
    /// included, so a step that empties the roster still yields populated
    /// records. They are bare ids only when `roster` itself is empty.
    pub fn next_day(
        &mut self,
        roster: &Roster,
        date: SnapshotDate,
        step: DayStep,
    ) -> Result<Roster, RosterError> {
        let templates = roster.sorted_records();
        let removed = step.num_removed.min(templates.len());

        let mut next = Roster::new(date);
        for rec in &templates[removed..] {
            next.insert((*rec).clone())?;
        }

        let mut added = 0;
        while added < step.num_new {
            let id = self.fresh_id();
            if roster.contains(&id) || next.contains(&id) {
                continue;
            }
            let rec = if templates.is_empty() {
                AgentRecord::new(id)
            } else {
                let pick = self.rng.gen_range(0..templates.len());
                templates[pick].cloned_as(id)
            };
            next.insert(rec)?;
            added += 1;
        }
        Ok(next)
    }

    /// Seed roster on `start`, then one roster per step on the following days.
    pub fn generate(&mut self, seed: Roster, plan: &[DayStep]) -> Result<Vec<Roster>, RosterError> {
        let start = seed.date();
        let mut out = Vec::with_capacity(plan.len() + 1);
        out.push(seed);
        for (offset, step) in plan.iter().enumerate() {
            let date = start + Days::new(offset as u64 + 1);
            let next = self.next_day(&out[offset], date, *step)?;
            out.push(next);
        }
        Ok(out)
    }
}

/// Stored dates later than the last generated roster, ascending.
pub fn dates_after(stored: &[SnapshotDate], generated: &[Roster]) -> Vec<SnapshotDate> {
    let Some(last) = generated.iter().map(Roster::date).max() else {
        return Vec::new();
    };
    let mut later: Vec<SnapshotDate> = stored.iter().copied().filter(|d| *d > last).collect();
    later.sort();
    later
}
