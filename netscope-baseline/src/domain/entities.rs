//! Snapshot entities

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One uniform record of structured command output (one interface, one route...).
///
/// Field order carries no meaning; a `BTreeMap` keeps iteration deterministic.
pub type Record = BTreeMap<String, Value>;

/// A stored, versioned capture of one command's output for one device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub device_id: String,
    pub command: String,
    /// Monotonically increasing per `(device_id, command)`, assigned at write time
    pub version: u64,
    pub raw_output: String,
    /// Structured records as produced by the parser, when available
    pub normalized_output: Option<Value>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Snapshot contents handed to a store; the store assigns version and timestamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSnapshot {
    pub device_id: String,
    pub command: String,
    pub raw_output: String,
    pub normalized_output: Option<Value>,
    pub notes: Option<String>,
}

impl NewSnapshot {
    pub fn new(
        device_id: impl Into<String>,
        command: impl Into<String>,
        raw_output: impl Into<String>,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            command: command.into(),
            raw_output: raw_output.into(),
            normalized_output: None,
            notes: None,
        }
    }

    /// Build a snapshot whose raw and normalized payloads both come from `records`
    pub fn from_records(
        device_id: impl Into<String>,
        command: impl Into<String>,
        records: &[Record],
    ) -> Result<Self, serde_json::Error> {
        let normalized = serde_json::to_value(records)?;
        let raw = serde_json::to_string_pretty(&normalized)?;
        Ok(Self::new(device_id, command, raw).with_normalized(normalized))
    }

    pub fn with_normalized(mut self, normalized: Value) -> Self {
        self.normalized_output = Some(normalized);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub(crate) fn into_snapshot(self, version: u64, created_at: DateTime<Utc>) -> Snapshot {
        Snapshot {
            device_id: self.device_id,
            command: self.command,
            version,
            raw_output: self.raw_output,
            normalized_output: self.normalized_output,
            notes: self.notes,
            created_at,
        }
    }
}

/// Why a snapshot payload could not be read as a record collection
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    #[error("payload is not a JSON array of records: {0}")]
    NotAnArray(String),

    #[error("entry {index} is not an object")]
    NotAnObject { index: usize },

    #[error("entry {index} field '{field}' is not a scalar value")]
    NonScalarField { index: usize, field: String },
}

impl Snapshot {
    /// Resolve the snapshot payload into records.
    ///
    /// The normalized output wins; otherwise the raw output must itself be a
    /// JSON array of flat objects.
    pub fn records(&self) -> Result<Vec<Record>, PayloadError> {
        match &self.normalized_output {
            Some(value) => records_from_value(value),
            None => {
                let value: Value = serde_json::from_str(&self.raw_output)
                    .map_err(|e| PayloadError::NotAnArray(e.to_string()))?;
                records_from_value(&value)
            }
        }
    }
}

/// Validate and convert a JSON value into a collection of flat records
pub fn records_from_value(value: &Value) -> Result<Vec<Record>, PayloadError> {
    let entries = value
        .as_array()
        .ok_or_else(|| PayloadError::NotAnArray(json_kind(value).to_string()))?;

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let object = entry
                .as_object()
                .ok_or(PayloadError::NotAnObject { index })?;

            object
                .iter()
                .map(|(field, value)| {
                    if value.is_array() || value.is_object() {
                        Err(PayloadError::NonScalarField {
                            index,
                            field: field.clone(),
                        })
                    } else {
                        Ok((field.clone(), value.clone()))
                    }
                })
                .collect::<Result<Record, _>>()
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
