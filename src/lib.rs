//! Day-over-day membership tracking for a fleet of monitoring agents.
//!
//! Each day's roster is compared with the previous one by agent id; agents
//! that appeared are `new`, agents that vanished are `unlinked`, and the daily
//! counts accumulate into a [`core::series::StatisticsSeries`].
//!
//! # Examples
//!
//! In-memory usage with [`persist::memory::MemorySnapshotStore`]:
//! ```
//! use agent_trends::{
//!     agent::AgentRecord,
//!     core::roster::Roster,
//!     engine::tracker::DeltaEngine,
//!     persist::memory::MemorySnapshotStore,
//! };
//! use chrono::NaiveDate;
//!
//! fn roster(day: u32, ids: &[&str]) -> Roster {
//!     let date = NaiveDate::from_ymd_opt(2024, 1, day).expect("date");
//!     Roster::from_records(date, ids.iter().map(|id| AgentRecord::new(*id))).expect("roster")
//! }
//!
//! let store = MemorySnapshotStore::with_rosters([
//!     roster(1, &["a", "b", "c"]),
//!     roster(2, &["b", "c", "d"]),
//! ]);
//! let mut engine = DeltaEngine::new(store);
//! let series = engine.compute_latest(true).expect("compute");
//!
//! let latest = series.latest().expect("summary");
//! assert_eq!((latest.total_agents, latest.new_agents, latest.unlinked_agents), (3, 1, 1));
//! ```
//!
//! On-disk usage with [`persist::fs::DirSnapshotStore`]:
//! ```no_run
//! use agent_trends::{
//!     engine::tracker::DeltaEngine,
//!     ingest::RecordDecoder,
//!     persist::{fs::DirSnapshotStore, SnapshotStore},
//! };
//! use chrono::NaiveDate;
//!
//! let mut store = DirSnapshotStore::open("./data").expect("open store");
//! let date = NaiveDate::from_ymd_opt(2024, 1, 2).expect("date");
//! let roster = RecordDecoder::default().load_roster("agents.json", date).expect("decode");
//! store.write_roster(&roster).expect("write roster");
//!
//! let series = DeltaEngine::new(store).compute_latest(false).expect("compute");
//! println!("{series}");
//! ```

/// Agent record model.
pub mod agent;
/// Runtime configuration.
pub mod config;
/// Roster and statistics data model.
pub mod core;
/// Snapshot comparison and series accumulation.
pub mod engine;
/// Synthetic roster generation.
pub mod generate;
/// Flat-record ingestion.
pub mod ingest;
/// Snapshot store abstraction and implementations.
pub mod persist;
/// Shared primitive types and date helpers.
pub mod types;
