//! Roster comparison and statistics accumulation.

/// Pure set-difference classification of two rosters.
pub mod delta;
/// Store-backed engine owning the date-selection and recompute policies.
pub mod tracker;
