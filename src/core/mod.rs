//! Roster and statistics data model.

/// Per-date agent roster keyed by agent id.
pub mod roster;
/// Daily summaries and the accumulated statistics series.
pub mod series;
