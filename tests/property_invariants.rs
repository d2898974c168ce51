use std::collections::BTreeSet;

use chrono::{Days, NaiveDate};
use proptest::prelude::*;

use agent_trends::{
    agent::AgentRecord,
    core::roster::Roster,
    engine::{delta::compute_delta, tracker::DeltaEngine},
    persist::{SnapshotStore, memory::MemorySnapshotStore},
    types::SnapshotDate,
};

fn base_date() -> SnapshotDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).expect("date")
}

fn id_set() -> impl Strategy<Value = BTreeSet<u8>> {
    prop::collection::btree_set(0u8..48, 0..32)
}

fn roster_from(date: SnapshotDate, ids: &BTreeSet<u8>) -> Roster {
    Roster::from_records(date, ids.iter().map(|i| AgentRecord::new(format!("agent-{i:02}"))))
        .expect("unique ids")
}

fn is_sorted_by_id(records: &[AgentRecord]) -> bool {
    records.windows(2).all(|w| w[0].id < w[1].id)
}

proptest! {
    #[test]
    fn delta_counts_follow_set_algebra(current in id_set(), previous in id_set()) {
        let cur = roster_from(base_date() + Days::new(1), &current);
        let prev = roster_from(base_date(), &previous);

        let delta = compute_delta(&cur, Some(&prev));
        let common = current.intersection(&previous).count();

        prop_assert_eq!(delta.total_agents, current.len());
        prop_assert_eq!(delta.new_agents, current.difference(&previous).count());
        prop_assert_eq!(delta.unlinked_agents, previous.difference(&current).count());
        prop_assert_eq!(delta.new_agents + common, delta.total_agents);
        prop_assert_eq!(delta.new_records.len(), delta.new_agents);
        prop_assert_eq!(delta.unlinked_records.len(), delta.unlinked_agents);
        prop_assert!(is_sorted_by_id(&delta.new_records));
        prop_assert!(is_sorted_by_id(&delta.unlinked_records));
        prop_assert!(
            delta.new_records.iter().all(|r| cur.contains(&r.id) && !prev.contains(&r.id))
        );
        prop_assert!(
            delta.unlinked_records.iter().all(|r| prev.contains(&r.id) && !cur.contains(&r.id))
        );
    }

    #[test]
    fn no_previous_means_everything_is_new(current in id_set()) {
        let cur = roster_from(base_date(), &current);
        let delta = compute_delta(&cur, None);

        prop_assert_eq!(delta.previous_date, None);
        prop_assert_eq!(delta.new_agents, delta.total_agents);
        prop_assert_eq!(delta.unlinked_agents, 0);
        prop_assert!(delta.unlinked_records.is_empty());
    }

    #[test]
    fn recompute_all_is_idempotent_and_series_is_ordered(
        days in prop::collection::vec((id_set(), 0u64..4), 1..8)
    ) {
        let mut store = MemorySnapshotStore::new();
        let mut date = base_date();
        for (ids, gap) in &days {
            date = date + Days::new(gap + 1);
            store.write_roster(&roster_from(date, ids)).expect("write");
        }

        let mut engine = DeltaEngine::new(store);
        let first = engine.compute_latest(true).expect("first");
        let second = engine.compute_latest(true).expect("second");

        prop_assert_eq!(&first, &second);
        prop_assert!(first.is_well_formed());
        prop_assert_eq!(first.len(), days.len());
        prop_assert_eq!(first.len(), engine.store().summary_dates().expect("dates").len());

        let oldest = &first.entries()[0];
        prop_assert_eq!(oldest.new_agents, oldest.total_agents);
        prop_assert_eq!(oldest.unlinked_agents, 0);
    }

    #[test]
    fn latest_only_runs_accumulate_one_entry_per_day(
        days in prop::collection::vec(id_set(), 1..8)
    ) {
        let mut engine = DeltaEngine::new(MemorySnapshotStore::new());
        for (offset, ids) in days.iter().enumerate() {
            let date = base_date() + Days::new(offset as u64);
            engine.store_mut().write_roster(&roster_from(date, ids)).expect("write");
            let series = engine.compute_latest(false).expect("compute");

            prop_assert!(series.is_well_formed());
            prop_assert_eq!(series.len(), offset + 1);
            prop_assert_eq!(series.latest().map(|s| s.date), Some(date));
        }

        let incremental = engine.series().expect("series");
        let full = engine.compute_latest(true).expect("full");
        prop_assert_eq!(incremental, full);
    }
}
