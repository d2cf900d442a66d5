use std::fmt;
use std::path::Path;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::query::Filter;

pub type Timestamp = DateTime<Utc>;

pub const DUE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Task identifier. Older data stored epoch-millisecond numbers, so both shapes load.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskId {
    Number(i64),
    Text(String),
}

impl TaskId {
    pub fn as_number(&self) -> Option<i64> {
        match self {
            TaskId::Number(value) => Some(*value),
            TaskId::Text(_) => None,
        }
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskId::Number(value) => write!(f, "{value}"),
            TaskId::Text(value) => f.write_str(value),
        }
    }
}

impl From<i64> for TaskId {
    fn from(value: i64) -> Self {
        TaskId::Number(value)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        TaskId::Text(value.to_string())
    }
}

/// One persisted record. Field names are fixed by the stored format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, with = "due_date_format")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub completed: bool,
    #[serde(with = "timestamp_format")]
    pub created_at: Timestamp,
    #[serde(
        default,
        with = "opt_timestamp_format",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<Timestamp>,
}

impl Task {
    pub fn new(
        id: TaskId,
        title: String,
        description: String,
        due_date: Option<NaiveDate>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            title,
            description,
            due_date,
            completed: false,
            created_at,
            updated_at: None,
        }
    }
}

/// Editable fields shared by create and update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, with = "due_date_format")]
    pub due_date: Option<NaiveDate>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn due(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Settings {
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
    #[serde(default = "default_untitled_title")]
    pub untitled_title: String,
    #[serde(default, deserialize_with = "lenient_filter::deserialize")]
    pub default_filter: Filter,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            storage_key: default_storage_key(),
            untitled_title: default_untitled_title(),
            default_filter: Filter::All,
        }
    }
}

impl Settings {
    /// Reads a JSON settings file. Missing or malformed files fall back to defaults.
    pub fn load(path: &Path) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(err) => {
                log::warn!("settings: read failed path={} error={err}", path.display());
                return Self::default();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|err| {
            log::warn!("settings: using defaults path={} error={err}", path.display());
            Self::default()
        })
    }
}

fn default_storage_key() -> String {
    "tasks".to_string()
}

fn default_untitled_title() -> String {
    "Untitled task".to_string()
}

/// Drops sub-millisecond precision so stored timestamps compare equal after a reload.
pub fn truncate_to_millis(value: Timestamp) -> Timestamp {
    DateTime::from_timestamp_millis(value.timestamp_millis()).unwrap_or(value)
}

pub fn format_timestamp(value: &Timestamp) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|value| truncate_to_millis(value.with_timezone(&Utc)))
}

pub fn parse_due_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DUE_DATE_FORMAT).ok()
}

/// An unknown filter name falls back to `all` instead of rejecting the whole settings file.
mod lenient_filter {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use crate::query::Filter;

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Filter, D::Error> {
        let value = Value::deserialize(d)?;
        let parsed = value.as_str().and_then(|name| name.parse::<Filter>().ok());
        Ok(parsed.unwrap_or_else(|| {
            log::warn!("settings: unknown default_filter value={value}, using all");
            Filter::default()
        }))
    }
}

mod due_date_format {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    use super::{parse_due_date, DUE_DATE_FORMAT};

    pub fn serialize<S: Serializer>(value: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(date) => s.serialize_str(&date.format(DUE_DATE_FORMAT).to_string()),
            None => s.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw = Option::<String>::deserialize(d)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => parse_due_date(value)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid due date `{value}`"))),
        }
    }
}

mod timestamp_format {
    use serde::{de, Deserialize, Deserializer, Serializer};

    use super::{format_timestamp, parse_timestamp, Timestamp};

    pub fn serialize<S: Serializer>(value: &Timestamp, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format_timestamp(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Timestamp, D::Error> {
        let raw = String::deserialize(d)?;
        parse_timestamp(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp `{raw}`")))
    }
}

mod opt_timestamp_format {
    use serde::{de, Deserialize, Deserializer, Serializer};

    use super::{format_timestamp, parse_timestamp, Timestamp};

    pub fn serialize<S: Serializer>(value: &Option<Timestamp>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(value) => s.serialize_str(&format_timestamp(value)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Timestamp>, D::Error> {
        match Option::<String>::deserialize(d)? {
            None => Ok(None),
            Some(raw) => parse_timestamp(&raw)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid timestamp `{raw}`"))),
        }
    }
}
