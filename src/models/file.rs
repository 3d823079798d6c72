use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// File metadata row. `file_path` is the opaque on-disk location and is
/// only used internally for streaming; it is never serialized to clients.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    pub id: String,
    pub task_id: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub file_path: String,
}

/// Upload body: user-facing name plus base64-encoded binary content.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadFileRequest {
    pub name: String,
    pub content: String,
}
