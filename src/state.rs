use crate::clock::{stamp_after, Clock, IdGenerator, SystemClock};
use crate::error::{Applied, PersistenceFailed, StoreError};
use crate::models::{Settings, Task, TaskDraft, TaskId, Timestamp};
use crate::persistence::{normalize_records, TaskPersistence};
use crate::storage::KeyValueStore;

/// Owns the task collection. Every mutation goes through here and is saved right away.
///
/// A failed save is reported through [`Applied::warning`]; the in-memory change is kept so
/// the list stays usable while storage is unavailable.
pub struct TaskStore<S, C = SystemClock> {
    tasks: Vec<Task>,
    persistence: TaskPersistence<S>,
    clock: C,
    ids: IdGenerator,
}

impl<S: KeyValueStore> TaskStore<S> {
    pub fn open(store: S, settings: &Settings) -> Self {
        let persistence = TaskPersistence::new(store, settings.storage_key.clone());
        Self::load(persistence, settings, SystemClock)
    }
}

impl<S: KeyValueStore, C: Clock> TaskStore<S, C> {
    /// Missing or corrupt stored data yields an empty list.
    pub fn load(persistence: TaskPersistence<S>, settings: &Settings, clock: C) -> Self {
        let tasks = match persistence.load() {
            Some(records) => {
                let normalized = normalize_records(records, &settings.untitled_title, clock.now());
                log::info!(
                    "store: loaded key={} tasks={} reassigned_ids={}",
                    persistence.key(),
                    normalized.tasks.len(),
                    normalized.reassigned_ids
                );
                normalized.tasks
            }
            None => {
                log::info!("store: no stored tasks key={}", persistence.key());
                Vec::new()
            }
        };
        let ids = IdGenerator::seeded(tasks.iter().map(|task| &task.id));
        Self {
            tasks,
            persistence,
            clock,
            ids,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| &task.id == id)
    }

    pub fn persistence(&self) -> &TaskPersistence<S> {
        &self.persistence
    }

    pub fn persistence_mut(&mut self) -> &mut TaskPersistence<S> {
        &mut self.persistence
    }

    /// Inserts a new task at the front. The title must be non-empty; callers validate it.
    pub fn add(&mut self, draft: TaskDraft) -> Applied<Task> {
        let now = self.clock.now();
        let id = self.ids.next_id(now);
        let task = Task::new(id, draft.title, draft.description, draft.due_date, now);
        self.tasks.insert(0, task.clone());
        log::debug!("store: added id={}", task.id);
        Applied::new(task, self.persist())
    }

    pub fn update(&mut self, id: &TaskId, draft: TaskDraft) -> Result<Applied<Task>, StoreError> {
        let now = self.clock.now();
        let task = self.find_mut(id)?;
        task.title = draft.title;
        task.description = draft.description;
        task.due_date = draft.due_date;
        task.updated_at = Some(next_stamp(task, now));
        let updated = task.clone();
        log::debug!("store: updated id={id}");
        Ok(Applied::new(updated, self.persist()))
    }

    /// Removing an unknown id is a no-op and does not touch storage.
    pub fn remove(&mut self, id: &TaskId) -> Applied<Option<Task>> {
        let Some(index) = self.tasks.iter().position(|task| &task.id == id) else {
            log::debug!("store: remove ignored, unknown id={id}");
            return Applied::new(None, Ok(()));
        };
        let removed = self.tasks.remove(index);
        log::debug!("store: removed id={id}");
        Applied::new(Some(removed), self.persist())
    }

    pub fn toggle_completed(&mut self, id: &TaskId) -> Result<Applied<Task>, StoreError> {
        let now = self.clock.now();
        let task = self.find_mut(id)?;
        task.completed = !task.completed;
        task.updated_at = Some(next_stamp(task, now));
        let toggled = task.clone();
        log::debug!("store: toggled id={id} completed={}", toggled.completed);
        Ok(Applied::new(toggled, self.persist()))
    }

    fn find_mut(&mut self, id: &TaskId) -> Result<&mut Task, StoreError> {
        match self.tasks.iter_mut().find(|task| &task.id == id) {
            Some(task) => Ok(task),
            None => {
                log::warn!("store: task not found id={id}");
                Err(StoreError::NotFound(id.clone()))
            }
        }
    }

    fn persist(&mut self) -> Result<(), PersistenceFailed> {
        let result = self.persistence.save(&self.tasks);
        if let Err(err) = &result {
            log::error!(
                "store: save failed key={} tasks={} error={err}",
                self.persistence.key(),
                self.tasks.len()
            );
        }
        result
    }
}

/// `updated_at` moves forward on every change, even within one clock tick.
fn next_stamp(task: &Task, now: Timestamp) -> Timestamp {
    stamp_after(now, task.updated_at.unwrap_or(task.created_at))
}
