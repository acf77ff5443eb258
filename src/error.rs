use thiserror::Error;

use crate::models::TaskId;

/// Which map an id was looked up in. Carried in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Task,
    Epic,
    Subtask,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Task => "task",
            Self::Epic => "epic",
            Self::Subtask => "subtask",
        })
    }
}

/// Failures surfaced by registry operations.
///
/// Every variant is a synchronous return-path failure: a failed call leaves
/// the maps, the prioritized view and history exactly as they were before
/// the call.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The referenced id is absent from the relevant map.
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: TaskId },

    /// A structurally invalid reference, e.g. a subtask naming itself as
    /// its own epic.
    #[error("invalid reference: {0}")]
    InvalidReference(String),

    /// The item's time window overlaps an already scheduled item.
    #[error("time conflict: window overlaps scheduled item {existing}")]
    TimeConflict { existing: TaskId },
}

impl RegistryError {
    pub(crate) fn not_found(kind: EntityKind, id: TaskId) -> Self {
        Self::NotFound { kind, id }
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;
