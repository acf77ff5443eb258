use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::models::{Task, TaskId};

/// Whether two scheduled windows share any open interval of time.
///
/// Half-open semantics: an item ending exactly when another starts does not
/// conflict. Untimed items never conflict with anything. The predicate is
/// symmetric; callers exclude self before calling.
pub fn overlaps(a: &Task, b: &Task) -> bool {
    match (a.start_time, a.end_time(), b.start_time, b.end_time()) {
        (Some(start_a), Some(end_a), Some(start_b), Some(end_b)) => {
            end_a > start_b && end_b > start_a
        }
        _ => false,
    }
}

/// Materialized time-ordered index over the task and subtask maps.
///
/// Holds `(start, id)` keys for timed items only; entity content always
/// lives in the maps, so the index cannot diverge from them. Remove before
/// re-insert on updates; the key embeds the start time.
#[derive(Debug, Default)]
pub(crate) struct ScheduleIndex {
    entries: BTreeSet<(DateTime<Utc>, TaskId)>,
}

impl ScheduleIndex {
    /// Index `task` if it is timed. Untimed items are excluded.
    pub fn insert(&mut self, task: &Task) {
        if let Some(start) = task.start_time {
            self.entries.insert((start, task.id));
        }
    }

    pub fn remove(&mut self, task: &Task) {
        if let Some(start) = task.start_time {
            self.entries.remove(&(start, task.id));
        }
    }

    /// Ids of all scheduled items, ascending by start time.
    pub fn ids(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.entries.iter().map(|&(_, id)| id)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
