use std::fmt;

use crate::models::TaskId;
use crate::storage::StorageError;

/// A save was rejected by the backing store. The in-memory change stays applied.
#[derive(Debug)]
pub struct PersistenceFailed(pub StorageError);

impl fmt::Display for PersistenceFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "persistence failed: {}", self.0)
    }
}

impl std::error::Error for PersistenceFailed {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl From<StorageError> for PersistenceFailed {
    fn from(value: StorageError) -> Self {
        PersistenceFailed(value)
    }
}

/// Stored data could not be read back as a task list.
#[derive(Debug)]
pub enum DeserializationError {
    Json(serde_json::Error),
    NotAnArray,
}

impl fmt::Display for DeserializationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeserializationError::Json(err) => write!(f, "malformed json: {err}"),
            DeserializationError::NotAnArray => f.write_str("stored value is not an array"),
        }
    }
}

impl std::error::Error for DeserializationError {}

impl From<serde_json::Error> for DeserializationError {
    fn from(value: serde_json::Error) -> Self {
        DeserializationError::Json(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    NotFound(TaskId),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound(id) => write!(f, "task not found: {id}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Result of a mutation that reached memory, plus the save failure if there was one.
#[derive(Debug)]
pub struct Applied<T> {
    pub value: T,
    pub warning: Option<PersistenceFailed>,
}

impl<T> Applied<T> {
    pub fn new(value: T, saved: Result<(), PersistenceFailed>) -> Self {
        Self {
            value,
            warning: saved.err(),
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.warning.is_none()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Applied<U> {
        Applied {
            value: f(self.value),
            warning: self.warning,
        }
    }
}
