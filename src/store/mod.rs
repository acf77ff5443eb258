//! Snapshot persistence for the registry.
//!
//! The whole entity graph is serialized to a single JSON file after every
//! successful mutating call and read back before first use. The file holds
//! ground truth only (task, epic and subtask records plus the history
//! order); epic derived state and subtask links are recomputed on load
//! rather than trusted from disk.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::models::{Epic, Subtask, Task, TaskId};

/// Serialized form of the registry's entire state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub tasks: Vec<Task>,
    pub epics: Vec<Epic>,
    pub subtasks: Vec<Subtask>,
    /// History ids, oldest to most recent.
    pub history: Vec<TaskId>,
}

/// Reads and writes [`Snapshot`]s at a fixed path.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Snapshot location under the platform data directory.
    pub fn default_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("", "", "taskboard")
            .context("could not determine data directory")?;
        Ok(dirs.data_dir().join("taskboard.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the snapshot, or `None` if no file exists yet.
    pub fn load(&self) -> Result<Option<Snapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read snapshot {}", self.path.display()))?;
        let snapshot = serde_json::from_str(&raw)
            .with_context(|| format!("malformed snapshot {}", self.path.display()))?;
        Ok(Some(snapshot))
    }

    /// Write the snapshot atomically: temp file in the same directory, then
    /// rename over the target.
    pub fn save(&self, snapshot: &Snapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let raw =
            serde_json::to_string_pretty(snapshot).context("failed to serialize snapshot")?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, raw).with_context(|| format!("failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("failed to replace {}", self.path.display()))?;
        Ok(())
    }
}
