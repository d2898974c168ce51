//! Agent roster record and its timestamp fields.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::AgentId;

/// Source field carrying the agent's most recent check-in.
pub const LAST_CONNECT_FIELD: &str = "last_connect";
/// Source field carrying the time the agent was linked.
pub const LINKED_ON_FIELD: &str = "linked_on";
/// Source field carrying the agent's most recent scan.
pub const LAST_SCANNED_FIELD: &str = "last_scanned";

/// One entry in a daily roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRecord {
    /// Stable agent identifier; the join key across days.
    pub id: AgentId,
    /// Last time the agent connected, if reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Utc>>,
    /// Time the agent was linked, if reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_on: Option<DateTime<Utc>>,
    /// Last time the agent was scanned, if reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_scanned: Option<DateTime<Utc>>,
    /// Descriptive fields, passed through unchanged.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, Value>,
}

impl AgentRecord {
    /// Creates a record with only an identifier.
    pub fn new(id: impl Into<AgentId>) -> Self {
        Self {
            id: id.into(),
            last_seen: None,
            linked_on: None,
            last_scanned: None,
            attributes: BTreeMap::new(),
        }
    }

    /// Builder-style helper to set `last_seen`.
    pub fn with_last_seen(mut self, ts: DateTime<Utc>) -> Self {
        self.last_seen = Some(ts);
        self
    }

    /// Builder-style helper to add one attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Returns a copy carrying a different identifier.
    pub fn cloned_as(&self, id: impl Into<AgentId>) -> Self {
        Self {
            id: id.into(),
            ..self.clone()
        }
    }
}
