use chrono::NaiveDate;

use crate::clock::Clock;
use crate::error::Applied;
use crate::models::{Settings, Task, TaskDraft, TaskId};
use crate::query::{local_today, visible_tasks, Filter};
use crate::state::TaskStore;
use crate::stats::{stats, Stats};
use crate::storage::KeyValueStore;

#[derive(Debug, serde::Serialize)]
pub struct CommandResult<T> {
    pub ok: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub warning: Option<String>,
}

/// The front end's side of the boundary: where "today" comes from and where
/// refreshed views and save warnings go.
pub trait CommandCtx {
    fn today(&self) -> NaiveDate;
    fn emit_view_updated(&self, payload: ViewPayload);
    fn notify_warning(&self, message: &str);
}

/// Current search box and filter selection.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ViewQuery {
    pub keyword: String,
    pub filter: Filter,
}

impl ViewQuery {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            keyword: String::new(),
            filter: settings.default_filter,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewPayload {
    pub tasks: Vec<Task>,
    pub stats: Stats,
    pub keyword: String,
    pub filter: Filter,
}

/// Context for running without a front end: local calendar date, logs instead of UI.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadlessCtx;

impl CommandCtx for HeadlessCtx {
    fn today(&self) -> NaiveDate {
        local_today()
    }

    fn emit_view_updated(&self, payload: ViewPayload) {
        log::debug!(
            "commands: view updated visible={} total={} filter={}",
            payload.tasks.len(),
            payload.stats.total,
            payload.filter
        );
    }

    fn notify_warning(&self, message: &str) {
        log::warn!("commands: {message}");
    }
}

fn ok<T>(data: T) -> CommandResult<T> {
    CommandResult {
        ok: true,
        data: Some(data),
        error: None,
        warning: None,
    }
}

fn err<T>(message: &str) -> CommandResult<T> {
    CommandResult {
        ok: false,
        data: None,
        error: Some(message.to_string()),
        warning: None,
    }
}

pub fn build_view<S: KeyValueStore, C: Clock>(
    store: &TaskStore<S, C>,
    view: &ViewQuery,
    today: NaiveDate,
) -> ViewPayload {
    let tasks = store.tasks();
    ViewPayload {
        tasks: visible_tasks(tasks, &view.keyword, view.filter, today)
            .into_iter()
            .cloned()
            .collect(),
        stats: stats(tasks),
        keyword: view.keyword.clone(),
        filter: view.filter,
    }
}

fn refresh<S: KeyValueStore, C: Clock>(
    ctx: &impl CommandCtx,
    store: &TaskStore<S, C>,
    view: &ViewQuery,
) -> ViewPayload {
    let payload = build_view(store, view, ctx.today());
    ctx.emit_view_updated(payload.clone());
    payload
}

fn finish<S: KeyValueStore, C: Clock, T>(
    ctx: &impl CommandCtx,
    store: &TaskStore<S, C>,
    view: &ViewQuery,
    applied: Applied<T>,
) -> CommandResult<T> {
    let warning = applied.warning.map(|failed| {
        let message = format!("changes are kept in memory but were not saved: {failed}");
        ctx.notify_warning(&message);
        message
    });
    refresh(ctx, store, view);
    CommandResult {
        warning,
        ..ok(applied.value)
    }
}

pub fn load_view<S: KeyValueStore, C: Clock>(
    ctx: &impl CommandCtx,
    store: &TaskStore<S, C>,
    view: &ViewQuery,
) -> CommandResult<ViewPayload> {
    ok(refresh(ctx, store, view))
}

pub fn create_task<S: KeyValueStore, C: Clock>(
    ctx: &impl CommandCtx,
    store: &mut TaskStore<S, C>,
    view: &ViewQuery,
    mut draft: TaskDraft,
) -> CommandResult<Task> {
    let title = draft.title.trim();
    if title.is_empty() {
        return err("title is required");
    }
    draft.title = title.to_string();
    let applied = store.add(draft);
    finish(ctx, store, view, applied)
}

pub fn update_task<S: KeyValueStore, C: Clock>(
    ctx: &impl CommandCtx,
    store: &mut TaskStore<S, C>,
    view: &ViewQuery,
    id: &TaskId,
    mut draft: TaskDraft,
) -> CommandResult<Task> {
    let title = draft.title.trim();
    if title.is_empty() {
        return err("title is required");
    }
    draft.title = title.to_string();
    match store.update(id, draft) {
        Ok(applied) => finish(ctx, store, view, applied),
        Err(error) => err(&error.to_string()),
    }
}

pub fn delete_task<S: KeyValueStore, C: Clock>(
    ctx: &impl CommandCtx,
    store: &mut TaskStore<S, C>,
    view: &ViewQuery,
    id: &TaskId,
) -> CommandResult<bool> {
    let applied = store.remove(id).map(|removed| removed.is_some());
    finish(ctx, store, view, applied)
}

pub fn toggle_task<S: KeyValueStore, C: Clock>(
    ctx: &impl CommandCtx,
    store: &mut TaskStore<S, C>,
    view: &ViewQuery,
    id: &TaskId,
) -> CommandResult<Task> {
    match store.toggle_completed(id) {
        Ok(applied) => finish(ctx, store, view, applied),
        Err(error) => err(&error.to_string()),
    }
}

pub fn set_keyword<S: KeyValueStore, C: Clock>(
    ctx: &impl CommandCtx,
    store: &TaskStore<S, C>,
    view: &mut ViewQuery,
    keyword: &str,
) -> CommandResult<ViewPayload> {
    view.keyword = keyword.to_string();
    ok(refresh(ctx, store, view))
}

/// Unknown filter names leave the current selection untouched.
pub fn set_filter<S: KeyValueStore, C: Clock>(
    ctx: &impl CommandCtx,
    store: &TaskStore<S, C>,
    view: &mut ViewQuery,
    name: &str,
) -> CommandResult<ViewPayload> {
    match name.parse::<Filter>() {
        Ok(filter) => {
            view.filter = filter;
            ok(refresh(ctx, store, view))
        }
        Err(error) => {
            log::warn!("commands: {error}");
            err(&error.to_string())
        }
    }
}
