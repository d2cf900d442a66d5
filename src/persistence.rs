use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::clock::IdGenerator;
use crate::error::{DeserializationError, PersistenceFailed};
use crate::models::{parse_due_date, parse_timestamp, Task, TaskId, Timestamp};
use crate::storage::KeyValueStore;

pub type RawRecord = Map<String, Value>;

/// Reads and writes the whole task collection under one key.
pub struct TaskPersistence<S> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> TaskPersistence<S> {
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn save(&mut self, tasks: &[Task]) -> Result<(), PersistenceFailed> {
        let json = serde_json::to_string(tasks).map_err(|err| PersistenceFailed(err.into()))?;
        self.store.set(&self.key, &json)?;
        Ok(())
    }

    /// Never fails: unreadable or corrupt data degrades to `None`.
    pub fn load(&self) -> Option<Vec<RawRecord>> {
        match self.try_load() {
            Ok(records) => records,
            Err(err) => {
                log::warn!(
                    "persistence: discarding stored data key={} error={err}",
                    self.key
                );
                None
            }
        }
    }

    fn try_load(&self) -> Result<Option<Vec<RawRecord>>, DeserializationError> {
        let raw = match self.store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Ok(None),
            Err(err) => {
                log::warn!("persistence: read failed key={} error={err}", self.key);
                return Ok(None);
            }
        };
        parse_collection(&raw).map(Some)
    }
}

pub fn parse_collection(raw: &str) -> Result<Vec<RawRecord>, DeserializationError> {
    let value: Value = serde_json::from_str(raw)?;
    let Value::Array(items) = value else {
        return Err(DeserializationError::NotAnArray);
    };
    let mut records = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match item {
            Value::Object(record) => records.push(record),
            other => log::warn!(
                "persistence: skipping non-object record index={index} kind={}",
                value_kind(&other)
            ),
        }
    }
    Ok(records)
}

#[derive(Debug, Default)]
pub struct Normalized {
    pub tasks: Vec<Task>,
    /// Records that needed a fresh id.
    pub reassigned_ids: usize,
}

/// Fills defaults for missing or malformed fields so every task satisfies the model invariants.
pub fn normalize_records(
    records: Vec<RawRecord>,
    untitled_title: &str,
    now: Timestamp,
) -> Normalized {
    let parsed_ids: Vec<Option<TaskId>> =
        records.iter().map(|record| read_id(record.get("id"))).collect();
    let mut ids = IdGenerator::seeded(parsed_ids.iter().flatten());
    let mut seen = HashSet::new();
    let mut out = Normalized::default();

    for (record, id) in records.iter().zip(parsed_ids) {
        let id = match id {
            Some(id) if !seen.contains(&id) => id,
            original => {
                let fresh = ids.next_id(now);
                log::warn!(
                    "persistence: reassigning id original={} fresh={fresh}",
                    original
                        .map(|id| id.to_string())
                        .unwrap_or_else(|| "<missing>".to_string())
                );
                out.reassigned_ids += 1;
                fresh
            }
        };
        seen.insert(id.clone());

        let title = match record.get("title") {
            Some(Value::String(title)) if !title.trim().is_empty() => title.clone(),
            _ => untitled_title.to_string(),
        };
        let description = match record.get("description") {
            Some(Value::String(description)) => description.clone(),
            _ => String::new(),
        };
        let due_date = match record.get("dueDate") {
            Some(Value::String(raw)) if !raw.trim().is_empty() => {
                let parsed = parse_due_date(raw);
                if parsed.is_none() {
                    log::warn!("persistence: dropping unparseable due date id={id} value={raw}");
                }
                parsed
            }
            _ => None,
        };
        let created_at = record
            .get("createdAt")
            .and_then(Value::as_str)
            .and_then(parse_timestamp)
            .unwrap_or(now);
        let updated_at = record
            .get("updatedAt")
            .and_then(Value::as_str)
            .and_then(parse_timestamp);

        out.tasks.push(Task {
            id,
            title,
            description,
            due_date,
            completed: record.get("completed").is_some_and(is_truthy),
            created_at,
            updated_at,
        });
    }
    out
}

fn read_id(value: Option<&Value>) -> Option<TaskId> {
    match value? {
        Value::Number(number) => match number.as_i64() {
            Some(id) => Some(TaskId::Number(id)),
            None => {
                log::warn!("persistence: id outside the integer range, kept as text id={number}");
                Some(TaskId::Text(number.to_string()))
            }
        },
        Value::String(text) if !text.trim().is_empty() => Some(TaskId::Text(text.clone())),
        _ => None,
    }
}

/// Loose boolean coercion: `false`, `null`, `0`, `NaN` and `""` are false.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
