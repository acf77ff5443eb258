//! The task registry: entity maps, id allocation and every derived view.
//!
//! All state (the three maps, the id counter, the prioritized schedule
//! index and the recency history) sits behind one coarse lock. Epic
//! aggregation and overlap detection need consistent reads across several
//! maps at once, so per-map locking would reopen the race windows this
//! design closes.

mod aggregate;
mod history;
mod schedule;

pub use history::HISTORY_CAPACITY;
pub use schedule::overlaps;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{EntityKind, RegistryError, Result};
use crate::models::{
    Epic, EpicInput, Status, Subtask, SubtaskInput, Task, TaskEntry, TaskId, TaskInput,
};
use crate::store::{Snapshot, SnapshotStore};

use history::History;
use schedule::ScheduleIndex;

pub struct Registry {
    inner: Arc<Mutex<Inner>>,
    store: Option<SnapshotStore>,
}

struct Inner {
    tasks: HashMap<TaskId, Task>,
    epics: HashMap<TaskId, Epic>,
    subtasks: HashMap<TaskId, Subtask>,
    next_id: TaskId,
    schedule: ScheduleIndex,
    history: History,
}

impl Registry {
    /// Fresh in-memory registry with no persistence.
    pub fn open_memory() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::new())),
            store: None,
        }
    }

    /// Registry backed by a snapshot file. Existing state is loaded up
    /// front; every successful mutation rewrites the snapshot.
    pub fn open(path: PathBuf) -> anyhow::Result<Self> {
        let store = SnapshotStore::new(path);
        let inner = match store.load()? {
            Some(snapshot) => Inner::from_snapshot(snapshot)?,
            None => Inner::new(),
        };
        Ok(Self {
            inner: Arc::new(Mutex::new(inner)),
            store: Some(store),
        })
    }

    /// Registry backed by the snapshot file in the platform data directory.
    pub fn open_default() -> anyhow::Result<Self> {
        Self::open(SnapshotStore::default_path()?)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("registry lock poisoned")
    }

    /// Rewrite the snapshot if this registry is file-backed. Persistence is
    /// best-effort: the in-memory state is already consistent, so a failed
    /// write is logged rather than unwound.
    fn persist(&self, inner: &Inner) {
        if let Some(store) = &self.store {
            if let Err(err) = store.save(&inner.snapshot()) {
                tracing::error!("failed to persist snapshot: {err:#}");
            }
        }
    }

    // ============================================================
    // Task operations
    // ============================================================

    pub fn add_task(&self, input: TaskInput) -> Result<Task> {
        let mut inner = self.lock();
        let candidate = input.into_task(0);
        inner.check_conflict(&candidate, None)?;

        let id = inner.generate_id();
        let task = Task { id, ..candidate };
        inner.schedule.insert(&task);
        inner.tasks.insert(id, task.clone());
        self.persist(&inner);
        Ok(task)
    }

    /// Fetch a task and record the access in history.
    pub fn get_task(&self, id: TaskId) -> Result<Task> {
        let mut inner = self.lock();
        let task = inner
            .tasks
            .get(&id)
            .cloned()
            .ok_or(RegistryError::not_found(EntityKind::Task, id))?;
        inner.history.record(id);
        Ok(task)
    }

    pub fn all_tasks(&self) -> Vec<Task> {
        let inner = self.lock();
        let mut tasks: Vec<Task> = inner.tasks.values().cloned().collect();
        tasks.sort_by_key(|t| t.id);
        tasks
    }

    /// Fully replace a task, keeping its id.
    pub fn update_task(&self, id: TaskId, input: TaskInput) -> Result<Task> {
        let mut inner = self.lock();
        let old = inner
            .tasks
            .get(&id)
            .cloned()
            .ok_or(RegistryError::not_found(EntityKind::Task, id))?;
        let task = input.into_task(id);
        inner.check_conflict(&task, Some(id))?;

        inner.schedule.remove(&old);
        inner.schedule.insert(&task);
        inner.tasks.insert(id, task.clone());
        self.persist(&inner);
        Ok(task)
    }

    pub fn remove_task(&self, id: TaskId) -> Result<()> {
        let mut inner = self.lock();
        let removed = inner
            .tasks
            .remove(&id)
            .ok_or(RegistryError::not_found(EntityKind::Task, id))?;
        inner.schedule.remove(&removed);
        inner.history.forget(id);
        self.persist(&inner);
        Ok(())
    }

    pub fn clear_tasks(&self) {
        let mut inner = self.lock();
        let ids: Vec<TaskId> = inner.tasks.keys().copied().collect();
        for id in ids {
            if let Some(task) = inner.tasks.remove(&id) {
                inner.schedule.remove(&task);
                inner.history.forget(id);
            }
        }
        self.persist(&inner);
    }

    // ============================================================
    // Epic operations
    // ============================================================

    pub fn add_epic(&self, input: EpicInput) -> Result<Epic> {
        let mut inner = self.lock();
        let id = inner.generate_id();
        let epic = Epic {
            task: Task {
                id,
                title: input.title,
                description: input.description,
                status: Status::New,
                start_time: None,
                duration_minutes: 0,
            },
            end_time: None,
            subtask_ids: Vec::new(),
        };
        inner.epics.insert(id, epic.clone());
        self.persist(&inner);
        Ok(epic)
    }

    /// Fetch an epic and record the access in history.
    pub fn get_epic(&self, id: TaskId) -> Result<Epic> {
        let mut inner = self.lock();
        let epic = inner
            .epics
            .get(&id)
            .cloned()
            .ok_or(RegistryError::not_found(EntityKind::Epic, id))?;
        inner.history.record(id);
        Ok(epic)
    }

    pub fn all_epics(&self) -> Vec<Epic> {
        let inner = self.lock();
        let mut epics: Vec<Epic> = inner.epics.values().cloned().collect();
        epics.sort_by_key(Epic::id);
        epics
    }

    /// Replace an epic's title and description. Status, window and the
    /// subtask list stay registry-authoritative.
    pub fn update_epic(&self, id: TaskId, input: EpicInput) -> Result<Epic> {
        let mut inner = self.lock();
        let epic = inner
            .epics
            .get_mut(&id)
            .ok_or(RegistryError::not_found(EntityKind::Epic, id))?;
        epic.task.title = input.title;
        epic.task.description = input.description;
        let epic = epic.clone();
        self.persist(&inner);
        Ok(epic)
    }

    /// Remove an epic and cascade to every subtask it owns: each leaves the
    /// subtask map, the schedule index and history before the epic does.
    pub fn remove_epic(&self, id: TaskId) -> Result<()> {
        let mut inner = self.lock();
        let removed = inner
            .epics
            .remove(&id)
            .ok_or(RegistryError::not_found(EntityKind::Epic, id))?;
        for subtask_id in &removed.subtask_ids {
            if let Some(subtask) = inner.subtasks.remove(subtask_id) {
                inner.schedule.remove(&subtask.task);
                inner.history.forget(*subtask_id);
            }
        }
        inner.history.forget(id);
        self.persist(&inner);
        Ok(())
    }

    /// Current subtasks of an epic, in insertion order.
    pub fn epic_subtasks(&self, id: TaskId) -> Result<Vec<Subtask>> {
        let inner = self.lock();
        let epic = inner
            .epics
            .get(&id)
            .ok_or(RegistryError::not_found(EntityKind::Epic, id))?;
        Ok(epic
            .subtask_ids
            .iter()
            .filter_map(|subtask_id| inner.subtasks.get(subtask_id).cloned())
            .collect())
    }

    pub fn clear_epics(&self) {
        let mut inner = self.lock();
        let subtask_ids: Vec<TaskId> = inner.subtasks.keys().copied().collect();
        for id in subtask_ids {
            if let Some(subtask) = inner.subtasks.remove(&id) {
                inner.schedule.remove(&subtask.task);
                inner.history.forget(id);
            }
        }
        let epic_ids: Vec<TaskId> = inner.epics.keys().copied().collect();
        for id in epic_ids {
            inner.history.forget(id);
        }
        inner.epics.clear();
        self.persist(&inner);
    }

    // ============================================================
    // Subtask operations
    // ============================================================

    pub fn add_subtask(&self, input: SubtaskInput) -> Result<Subtask> {
        let mut inner = self.lock();
        if !inner.epics.contains_key(&input.epic_id) {
            return Err(RegistryError::not_found(EntityKind::Epic, input.epic_id));
        }
        let candidate = input.fields.into_task(0);
        inner.check_conflict(&candidate, None)?;

        let id = inner.generate_id();
        let subtask = Subtask {
            task: Task { id, ..candidate },
            epic_id: input.epic_id,
        };
        inner.schedule.insert(&subtask.task);
        inner.subtasks.insert(id, subtask.clone());
        if let Some(epic) = inner.epics.get_mut(&input.epic_id) {
            epic.subtask_ids.push(id);
        }
        inner.recompute_epic(input.epic_id);
        self.persist(&inner);
        Ok(subtask)
    }

    /// Fetch a subtask and record the access in history.
    pub fn get_subtask(&self, id: TaskId) -> Result<Subtask> {
        let mut inner = self.lock();
        let subtask = inner
            .subtasks
            .get(&id)
            .cloned()
            .ok_or(RegistryError::not_found(EntityKind::Subtask, id))?;
        inner.history.record(id);
        Ok(subtask)
    }

    pub fn all_subtasks(&self) -> Vec<Subtask> {
        let inner = self.lock();
        let mut subtasks: Vec<Subtask> = inner.subtasks.values().cloned().collect();
        subtasks.sort_by_key(Subtask::id);
        subtasks
    }

    /// Fully replace a subtask, keeping its id. Supplying a different
    /// `epic_id` moves it; the old and new epics are both recomputed.
    pub fn update_subtask(&self, id: TaskId, input: SubtaskInput) -> Result<Subtask> {
        let mut inner = self.lock();
        let old = inner
            .subtasks
            .get(&id)
            .cloned()
            .ok_or(RegistryError::not_found(EntityKind::Subtask, id))?;
        if input.epic_id == id {
            return Err(RegistryError::InvalidReference(format!(
                "subtask {id} cannot be its own epic"
            )));
        }
        if !inner.epics.contains_key(&input.epic_id) {
            return Err(RegistryError::not_found(EntityKind::Epic, input.epic_id));
        }
        let subtask = Subtask {
            task: input.fields.into_task(id),
            epic_id: input.epic_id,
        };
        inner.check_conflict(&subtask.task, Some(id))?;

        inner.schedule.remove(&old.task);
        inner.schedule.insert(&subtask.task);
        inner.subtasks.insert(id, subtask.clone());
        if old.epic_id != subtask.epic_id {
            if let Some(previous) = inner.epics.get_mut(&old.epic_id) {
                previous.subtask_ids.retain(|&subtask_id| subtask_id != id);
            }
            if let Some(next) = inner.epics.get_mut(&subtask.epic_id) {
                next.subtask_ids.push(id);
            }
            inner.recompute_epic(old.epic_id);
        }
        inner.recompute_epic(subtask.epic_id);
        self.persist(&inner);
        Ok(subtask)
    }

    /// Remove a subtask, detach it from its epic and recompute the epic.
    pub fn remove_subtask(&self, id: TaskId) -> Result<()> {
        let mut inner = self.lock();
        let removed = inner
            .subtasks
            .remove(&id)
            .ok_or(RegistryError::not_found(EntityKind::Subtask, id))?;
        inner.schedule.remove(&removed.task);
        if let Some(epic) = inner.epics.get_mut(&removed.epic_id) {
            epic.subtask_ids.retain(|&subtask_id| subtask_id != id);
        }
        inner.recompute_epic(removed.epic_id);
        inner.history.forget(id);
        self.persist(&inner);
        Ok(())
    }

    pub fn clear_subtasks(&self) {
        let mut inner = self.lock();
        let ids: Vec<TaskId> = inner.subtasks.keys().copied().collect();
        for id in ids {
            if let Some(subtask) = inner.subtasks.remove(&id) {
                inner.schedule.remove(&subtask.task);
                inner.history.forget(id);
            }
        }
        let epic_ids: Vec<TaskId> = inner.epics.keys().copied().collect();
        for id in epic_ids {
            if let Some(epic) = inner.epics.get_mut(&id) {
                epic.subtask_ids.clear();
            }
            inner.recompute_epic(id);
        }
        self.persist(&inner);
    }

    // ============================================================
    // Derived views
    // ============================================================

    /// All timed tasks and subtasks, ascending by start time. Untimed items
    /// are excluded.
    pub fn prioritized(&self) -> Vec<TaskEntry> {
        let inner = self.lock();
        inner
            .schedule
            .ids()
            .filter_map(|id| inner.entry(id))
            .collect()
    }

    /// Recently accessed entities, oldest to most recent, resolved against
    /// the live maps.
    pub fn history(&self) -> Vec<TaskEntry> {
        let inner = self.lock();
        inner
            .history
            .ids()
            .into_iter()
            .filter_map(|id| inner.entry(id))
            .collect()
    }

    /// Empty every map and view. The id counter is preserved: ids are never
    /// reused within a process lifetime, even across a full clear.
    pub fn clear_all(&self) {
        let mut inner = self.lock();
        inner.tasks.clear();
        inner.epics.clear();
        inner.subtasks.clear();
        inner.schedule.clear();
        inner.history.clear();
        self.persist(&inner);
    }
}

impl Clone for Registry {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            store: self.store.clone(),
        }
    }
}

impl Inner {
    fn new() -> Self {
        Self {
            tasks: HashMap::new(),
            epics: HashMap::new(),
            subtasks: HashMap::new(),
            next_id: 1,
            schedule: ScheduleIndex::default(),
            history: History::default(),
        }
    }

    fn generate_id(&mut self) -> TaskId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Reject `candidate` if its window overlaps any scheduled item other
    /// than `exclude`. Runs before any mutation, id allocation included, so
    /// a rejected call leaves no trace.
    fn check_conflict(&self, candidate: &Task, exclude: Option<TaskId>) -> Result<()> {
        if candidate.start_time.is_none() {
            return Ok(());
        }
        for id in self.schedule.ids() {
            if Some(id) == exclude {
                continue;
            }
            let Some(other) = self.timed_record(id) else {
                continue;
            };
            if schedule::overlaps(candidate, other) {
                return Err(RegistryError::TimeConflict { existing: id });
            }
        }
        Ok(())
    }

    /// Shared record behind a schedule index id. Only tasks and subtasks
    /// are indexed.
    fn timed_record(&self, id: TaskId) -> Option<&Task> {
        self.tasks
            .get(&id)
            .or_else(|| self.subtasks.get(&id).map(|subtask| &subtask.task))
    }

    fn recompute_epic(&mut self, epic_id: TaskId) {
        let Inner { epics, subtasks, .. } = self;
        let subtasks: &HashMap<TaskId, Subtask> = subtasks;
        let Some(epic) = epics.get_mut(&epic_id) else {
            return;
        };
        let current: Vec<&Subtask> = epic
            .subtask_ids
            .iter()
            .filter_map(|id| subtasks.get(id))
            .collect();
        aggregate::recompute(epic, &current);
    }

    fn entry(&self, id: TaskId) -> Option<TaskEntry> {
        if let Some(task) = self.tasks.get(&id) {
            return Some(TaskEntry::Task(task.clone()));
        }
        if let Some(subtask) = self.subtasks.get(&id) {
            return Some(TaskEntry::Subtask(subtask.clone()));
        }
        self.epics.get(&id).map(|epic| TaskEntry::Epic(epic.clone()))
    }

    fn snapshot(&self) -> Snapshot {
        let mut tasks: Vec<Task> = self.tasks.values().cloned().collect();
        tasks.sort_by_key(|t| t.id);
        let mut epics: Vec<Epic> = self.epics.values().cloned().collect();
        epics.sort_by_key(Epic::id);
        let mut subtasks: Vec<Subtask> = self.subtasks.values().cloned().collect();
        subtasks.sort_by_key(Subtask::id);

        Snapshot {
            tasks,
            epics,
            subtasks,
            history: self.history.ids(),
        }
    }

    /// Rebuild registry state from a snapshot. Subtask links and epic
    /// derived state come from re-linking and re-aggregation, not from the
    /// file; the id counter restarts above the highest surviving id.
    fn from_snapshot(snapshot: Snapshot) -> anyhow::Result<Self> {
        let mut inner = Inner::new();

        for task in snapshot.tasks {
            inner.schedule.insert(&task);
            inner.tasks.insert(task.id, task);
        }
        for mut epic in snapshot.epics {
            epic.subtask_ids.clear();
            inner.epics.insert(epic.id(), epic);
        }
        for subtask in snapshot.subtasks {
            if subtask.epic_id == subtask.id() {
                anyhow::bail!(
                    "snapshot corrupt: subtask {} references itself as its epic",
                    subtask.id()
                );
            }
            let Some(epic) = inner.epics.get_mut(&subtask.epic_id) else {
                anyhow::bail!(
                    "snapshot corrupt: subtask {} references missing epic {}",
                    subtask.id(),
                    subtask.epic_id
                );
            };
            epic.subtask_ids.push(subtask.id());
            inner.schedule.insert(&subtask.task);
            inner.subtasks.insert(subtask.id(), subtask);
        }

        let epic_ids: Vec<TaskId> = inner.epics.keys().copied().collect();
        for id in epic_ids {
            inner.recompute_epic(id);
        }
        for id in snapshot.history {
            if inner.tasks.contains_key(&id)
                || inner.epics.contains_key(&id)
                || inner.subtasks.contains_key(&id)
            {
                inner.history.record(id);
            }
        }

        let high_water = inner
            .tasks
            .keys()
            .chain(inner.epics.keys())
            .chain(inner.subtasks.keys())
            .copied()
            .max()
            .unwrap_or(0);
        inner.next_id = high_water + 1;

        Ok(inner)
    }
}
