use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A task enriched with the metadata of its uploaded files.
#[derive(Debug, Clone, Serialize)]
pub struct Task {
    pub id: String,
    pub description: String,
    pub due: Option<DateTime<Utc>>,
    /// Non-null means done. Setting it back to null re-opens the task.
    pub completed: Option<DateTime<Utc>>,
    pub files: Vec<FileRef>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileRef {
    pub id: String,
    pub name: String,
}

/// Task as it appears inside task-list details (no file fan-out there).
#[derive(Debug, Clone, Serialize)]
pub struct TaskSummary {
    pub id: String,
    pub description: String,
    pub due: Option<DateTime<Utc>>,
    pub completed: Option<DateTime<Utc>>,
}

/// The three mutable task fields, replaced atomically on update.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskInput {
    pub description: String,
    #[serde(default)]
    pub due: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed: Option<DateTime<Utc>>,
}
