use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Task, TaskId};

/// A task whose status and time window are derived from its subtasks.
///
/// Callers never set an epic's status or schedule directly: after every
/// subtask mutation the registry recomputes them from the current subtask
/// set, so they are a pure function of it at all times. `subtask_ids` holds
/// back-references only; the registry's subtask map is the single source of
/// truth for subtask content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Epic {
    #[serde(flatten)]
    pub task: Task,
    /// Latest end among timed subtasks. Stored separately because an epic's
    /// end is not `start + duration`: its duration is an additive total
    /// over all subtasks and may exceed the span they cover.
    pub end_time: Option<DateTime<Utc>>,
    /// Owned subtasks, in insertion order.
    pub subtask_ids: Vec<TaskId>,
}

impl Epic {
    pub fn id(&self) -> TaskId {
        self.task.id
    }
}

/// Input for creating or renaming an epic.
///
/// Status, schedule and the subtask list are registry-owned and cannot be
/// supplied here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpicInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
}
