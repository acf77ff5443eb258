use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Epic, Status, Subtask, Task, TaskId};

/// Any entity the registry tracks, tagged by kind.
///
/// Mixed collections (the prioritized view, history) carry this instead of
/// a common supertype, so an epic can never be smuggled in where a plain
/// task is expected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskEntry {
    Task(Task),
    Epic(Epic),
    Subtask(Subtask),
}

impl TaskEntry {
    pub fn id(&self) -> TaskId {
        self.record().id
    }

    pub fn status(&self) -> Status {
        self.record().status
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.record().start_time
    }

    /// The shared record behind the variant.
    pub fn record(&self) -> &Task {
        match self {
            Self::Task(task) => task,
            Self::Epic(epic) => &epic.task,
            Self::Subtask(subtask) => &subtask.task,
        }
    }
}
