use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Identifier assigned by the registry.
///
/// Ids come from a monotonic counter starting at 1 and are never reused,
/// even after the entity they named is removed. This keeps history and
/// schedule references stable across unrelated deletions.
pub type TaskId = u32;

/// A schedulable unit of work.
///
/// `Task` doubles as the record shared by [`Epic`](super::Epic) and
/// [`Subtask`](super::Subtask), which embed it with `#[serde(flatten)]`.
/// Identity is the id alone: the registry keys every map and index by it,
/// so two records with the same id are the same entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub status: Status,
    /// When work is scheduled to begin. Untimed tasks never appear in the
    /// prioritized view and never conflict with anything.
    pub start_time: Option<DateTime<Utc>>,
    /// Scheduled length in whole minutes. Zero is allowed.
    pub duration_minutes: u32,
}

impl Task {
    /// Scheduled end, `start_time + duration`. `None` for untimed tasks.
    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
            .map(|start| start + Duration::minutes(i64::from(self.duration_minutes)))
    }
}

/// Workflow status of a task.
///
/// Caller-driven for tasks and subtasks: any status may follow any other;
/// the tracker does not enforce workflow order. Registry-driven for epics,
/// which derive theirs from their subtask set.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    New,
    InProgress,
    Done,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::InProgress => "in_progress",
            Self::Done => "done",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "new" => Some(Self::New),
            "in_progress" => Some(Self::InProgress),
            "done" => Some(Self::Done),
            _ => None,
        }
    }
}

/// Input for creating or replacing a task.
///
/// Updates are a full replace with the id preserved, not a partial patch:
/// an omitted field takes its default, it does not keep the stored value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Defaults to `New` if not specified.
    pub status: Option<Status>,
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration_minutes: u32,
}

impl TaskInput {
    pub(crate) fn into_task(self, id: TaskId) -> Task {
        Task {
            id,
            title: self.title,
            description: self.description,
            status: self.status.unwrap_or(Status::New),
            start_time: self.start_time,
            duration_minutes: self.duration_minutes,
        }
    }
}
