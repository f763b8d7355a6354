//! Keyed structural diff of record collections

use std::collections::{BTreeSet, HashMap};

use serde_json::Value;

use crate::domain::entities::Record;
use crate::domain::value_objects::{
    ChangedEntry, CommandKind, ComparisonResult, FieldChange, KeyedRecord,
};

/// How a record's natural identity is extracted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySpec {
    /// Identity built from these fields' values
    Fields(Vec<String>),
    /// The full record is its own identity
    WholeRecord,
}

impl KeySpec {
    pub fn fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Fields(fields.into_iter().map(Into::into).collect())
    }

    /// Key used for a stored command; unknown commands fall back to whole-record identity
    pub fn for_command(command: &str) -> Self {
        match CommandKind::from_command(command) {
            Some(kind) => Self::for_kind(kind),
            None => Self::WholeRecord,
        }
    }

    pub fn for_kind(kind: CommandKind) -> Self {
        Self::fields(kind.key_fields().iter().copied())
    }

    /// Identity of `record`; distinct field values always give distinct keys.
    ///
    /// When every key field holds a non-empty string without `|` that does not
    /// start with `[`, the key is those strings joined with `|`
    /// (`10.0.0.0|255.0.0.0`). Otherwise the whole key is a JSON array with
    /// one element per field: `[value]` when present, `[]` when missing.
    pub fn key_of(&self, record: &Record) -> String {
        match self {
            Self::Fields(fields) => {
                let parts: Vec<Option<&Value>> =
                    fields.iter().map(|field| record.get(field)).collect();

                let plain: Option<Vec<&str>> = parts
                    .iter()
                    .map(|part| match part {
                        Some(Value::String(s))
                            if !s.is_empty() && !s.contains('|') && !s.starts_with('[') =>
                        {
                            Some(s.as_str())
                        }
                        _ => None,
                    })
                    .collect();

                match plain {
                    Some(plain) => plain.join("|"),
                    None => {
                        let encoded = parts
                            .iter()
                            .map(|part| Value::Array(part.iter().map(|v| (*v).clone()).collect()))
                            .collect();
                        Value::Array(encoded).to_string()
                    }
                }
            }
            Self::WholeRecord => {
                let object = record
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect::<serde_json::Map<_, _>>();
                Value::Object(object).to_string()
            }
        }
    }
}

/// Render a scalar the way operators read it: strings bare, everything else as JSON
pub(crate) fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

struct RecordIndex<'a> {
    order: Vec<String>,
    by_key: HashMap<String, &'a Record>,
}

impl<'a> RecordIndex<'a> {
    fn build<F>(records: &'a [Record], key_fn: &F) -> Self
    where
        F: Fn(&Record) -> String,
    {
        let mut order = Vec::with_capacity(records.len());
        let mut by_key = HashMap::with_capacity(records.len());

        for record in records {
            let key = key_fn(record);
            // Duplicate keys: position of the first occurrence, contents of the last
            if by_key.insert(key.clone(), record).is_none() {
                order.push(key);
            } else {
                tracing::debug!(key = %key, "Duplicate record key, keeping last occurrence");
            }
        }

        Self { order, by_key }
    }
}

/// Compare two record collections keyed by `key_fn`.
///
/// Output order is stable: keys in first-seen order of the new set, then
/// old-only keys in old-set order. Record order within each input carries no
/// meaning beyond that.
pub fn compare<F>(old_records: &[Record], new_records: &[Record], key_fn: F) -> ComparisonResult
where
    F: Fn(&Record) -> String,
{
    let old_index = RecordIndex::build(old_records, &key_fn);
    let new_index = RecordIndex::build(new_records, &key_fn);

    let mut added = Vec::new();
    let mut changed = Vec::new();

    for key in &new_index.order {
        let new_record = new_index.by_key[key];
        match old_index.by_key.get(key) {
            None => added.push(KeyedRecord {
                key: key.clone(),
                record: new_record.clone(),
            }),
            Some(old_record) => {
                let changes = diff_fields(old_record, new_record);
                if !changes.is_empty() {
                    changed.push(ChangedEntry {
                        key: key.clone(),
                        old: (*old_record).clone(),
                        new: new_record.clone(),
                        changes,
                    });
                }
            }
        }
    }

    let removed = old_index
        .order
        .iter()
        .filter(|key| !new_index.by_key.contains_key(*key))
        .map(|key| KeyedRecord {
            key: key.clone(),
            record: old_index.by_key[key].clone(),
        })
        .collect();

    ComparisonResult::from_parts(added, removed, changed)
}

/// Field-level differences over the union of both records' field names
pub fn diff_fields(old: &Record, new: &Record) -> Vec<FieldChange> {
    let fields: BTreeSet<&String> = old.keys().chain(new.keys()).collect();

    fields
        .into_iter()
        .filter_map(|field| {
            let before = old.get(field);
            let after = new.get(field);
            (before != after).then(|| FieldChange {
                field: field.clone(),
                old: before.cloned(),
                new: after.cloned(),
            })
        })
        .collect()
}
