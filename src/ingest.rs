//! Decoding of flat key/value agent records into rosters.
//!
//! Input is either a JSON array of objects or JSON lines, one object per
//! line. The identifier field is read as an opaque string; numeric ids are
//! stringified. The three known timestamp fields accept epoch seconds
//! (integer or float), RFC 3339, or `YYYY-MM-DD HH:MM:SS` taken as UTC.

use std::{fs, io, path::Path};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::{
    agent::{AgentRecord, LAST_CONNECT_FIELD, LAST_SCANNED_FIELD, LINKED_ON_FIELD},
    core::roster::{Roster, RosterError},
    types::SnapshotDate,
};

/// Identifier field used by the inventory export.
pub const DEFAULT_ID_FIELD: &str = "uuid";

const NAIVE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("invalid JSON on record {row}: {source}")]
    Json {
        row: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("record {row} is not a JSON object")]
    NotAnObject { row: usize },
    #[error("record {row} has no usable `{field}` identifier")]
    MissingId { row: usize, field: String },
    #[error("record {row} has an unparseable `{field}` timestamp: {value}")]
    InvalidTimestamp { row: usize, field: String, value: String },
    #[error(transparent)]
    Roster(#[from] RosterError),
}

/// Converts flat source records into [`AgentRecord`]s.
#[derive(Debug, Clone)]
pub struct RecordDecoder {
    id_field: String,
}

impl Default for RecordDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_ID_FIELD)
    }
}

impl RecordDecoder {
    pub fn new(id_field: impl Into<String>) -> Self {
        Self {
            id_field: id_field.into(),
        }
    }

    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    /// Decodes one flat record; `row` only feeds error messages.
    pub fn decode(
        &self,
        row: usize,
        mut fields: Map<String, Value>,
    ) -> Result<AgentRecord, IngestError> {
        let id = match fields.remove(&self.id_field) {
            Some(Value::String(s)) if !s.trim().is_empty() => s,
            Some(Value::Number(n)) => n.to_string(),
            _ => {
                return Err(IngestError::MissingId {
                    row,
                    field: self.id_field.clone(),
                });
            }
        };

        let mut record = AgentRecord::new(id);
        record.last_seen = take_timestamp(&mut fields, LAST_CONNECT_FIELD, row)?;
        record.linked_on = take_timestamp(&mut fields, LINKED_ON_FIELD, row)?;
        record.last_scanned = take_timestamp(&mut fields, LAST_SCANNED_FIELD, row)?;
        record.attributes = fields.into_iter().collect();
        Ok(record)
    }

    /// Decodes a JSON array of objects or JSON lines.
    pub fn decode_str(&self, input: &str) -> Result<Vec<AgentRecord>, IngestError> {
        let trimmed = input.trim_start_matches('\u{feff}').trim_start();
        let values: Vec<Value> = if trimmed.starts_with('[') {
            serde_json::from_str(trimmed).map_err(|source| IngestError::Json { row: 0, source })?
        } else {
            trimmed
                .lines()
                .filter(|line| !line.trim().is_empty())
                .enumerate()
                .map(|(row, line)| {
                    serde_json::from_str(line).map_err(|source| IngestError::Json { row, source })
                })
                .collect::<Result<_, _>>()?
        };

        values
            .into_iter()
            .enumerate()
            .map(|(row, value)| match value {
                Value::Object(fields) => self.decode(row, fields),
                _ => Err(IngestError::NotAnObject { row }),
            })
            .collect()
    }

    /// Reads `path` and builds the roster for `date`.
    pub fn load_roster(
        &self,
        path: impl AsRef<Path>,
        date: SnapshotDate,
    ) -> Result<Roster, IngestError> {
        let path = path.as_ref();
        let input = fs::read_to_string(path).map_err(|source| IngestError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let records = self.decode_str(&input)?;
        debug!(path = %path.display(), records = records.len(), "decoded roster file");
        Ok(Roster::from_records(date, records)?)
    }
}

fn take_timestamp(
    fields: &mut Map<String, Value>,
    field: &str,
    row: usize,
) -> Result<Option<DateTime<Utc>>, IngestError> {
    let Some(value) = fields.remove(field) else {
        return Ok(None);
    };
    parse_timestamp(&value).ok_or_else(|| IngestError::InvalidTimestamp {
        row,
        field: field.to_string(),
        value: value.to_string(),
    })
}

/// `Some(None)` means the field was present but empty.
fn parse_timestamp(value: &Value) -> Option<Option<DateTime<Utc>>> {
    match value {
        Value::Null => Some(None),
        Value::Number(n) => {
            if let Some(secs) = n.as_i64() {
                return DateTime::from_timestamp(secs, 0).map(Some);
            }
            let secs = n.as_f64()?;
            let whole = secs.floor();
            let nanos = ((secs - whole) * 1e9).round() as u32;
            DateTime::from_timestamp(whole as i64, nanos.min(999_999_999)).map(Some)
        }
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Some(None);
            }
            if let Ok(secs) = s.parse::<i64>() {
                return DateTime::from_timestamp(secs, 0).map(Some);
            }
            if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
                return Some(Some(ts.with_timezone(&Utc)));
            }
            NaiveDateTime::parse_from_str(s, NAIVE_TIMESTAMP_FORMAT)
                .ok()
                .map(|naive| Some(naive.and_utc()))
        }
        _ => None,
    }
}
