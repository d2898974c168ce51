//! Shared primitive identifiers, date helpers, and subset labels.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Opaque agent identifier, stable across days for the same agent.
pub type AgentId = String;
/// Calendar date a roster was captured on.
pub type SnapshotDate = NaiveDate;

/// Canonical on-disk date label format.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a store label as a snapshot date.
///
/// Only the canonical zero-padded `YYYY-MM-DD` spelling is accepted, so
/// `2024-1-5` or `2024-01-05.bak` yield `None`.
pub fn parse_snapshot_date(label: &str) -> Option<SnapshotDate> {
    if label.len() != 10 {
        return None;
    }
    let date = NaiveDate::parse_from_str(label, DATE_FORMAT).ok()?;
    (format_snapshot_date(date) == label).then_some(date)
}

/// Formats a snapshot date as its canonical label.
pub fn format_snapshot_date(date: SnapshotDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Named partial record set persisted next to a roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubsetLabel {
    /// Agents present today but not on the previous date.
    New,
    /// Agents present on the previous date but gone today.
    Unlinked,
}

impl SubsetLabel {
    /// Both labels in write order.
    pub const ALL: [SubsetLabel; 2] = [SubsetLabel::New, SubsetLabel::Unlinked];

    /// Stable lowercase name used in file names and table rows.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Unlinked => "unlinked",
        }
    }
}

impl fmt::Display for SubsetLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
