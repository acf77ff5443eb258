use serde::{Deserialize, Serialize};

use super::{Task, TaskId, TaskInput};

/// A task owned by exactly one epic.
///
/// `epic_id` must name an existing epic at creation and at update time, and
/// can never equal the subtask's own id. Every mutation of a subtask
/// triggers re-aggregation of the owning epic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subtask {
    #[serde(flatten)]
    pub task: Task,
    pub epic_id: TaskId,
}

impl Subtask {
    pub fn id(&self) -> TaskId {
        self.task.id
    }
}

/// Input for creating or replacing a subtask. Same full-replace semantics
/// as [`TaskInput`], plus the owning epic. Supplying a different `epic_id`
/// on update moves the subtask; both epics are recomputed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtaskInput {
    pub epic_id: TaskId,
    #[serde(flatten)]
    pub fields: TaskInput,
}
