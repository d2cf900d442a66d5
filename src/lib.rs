// Task list core: the task collection, its local persistence, and the derived views
// (search, filters, counters) a front end renders.
pub mod clock;
pub mod commands;
pub mod error;
pub mod logging;
pub mod models;
pub mod persistence;
pub mod query;
pub mod state;
pub mod stats;
pub mod storage;

pub use crate::clock::{Clock, IdGenerator, SystemClock};
pub use crate::error::{Applied, DeserializationError, PersistenceFailed, StoreError};
pub use crate::models::{Settings, Task, TaskDraft, TaskId, Timestamp};
pub use crate::persistence::TaskPersistence;
pub use crate::query::{visible_tasks, visible_tasks_now, Filter, ParseFilterError};
pub use crate::state::TaskStore;
pub use crate::stats::{stats, Stats};
pub use crate::storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
