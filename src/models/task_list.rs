use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::task::TaskSummary;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TaskList {
    pub id: String,
    pub account_id: String,
    pub name: String,
}

/// A task list together with its tasks. A list with zero tasks still has
/// an entry here, with an empty `tasks` array.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListDetails {
    pub id: String,
    pub account_id: String,
    pub name: String,
    pub tasks: Vec<TaskSummary>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskListNameRequest {
    pub name: String,
}
