use std::path::Path;

use sqlx::{SqliteConnection, SqlitePool};

use crate::error::AppError;
use crate::models::StoredFile;
use crate::storage::FileStore;
use crate::util::new_id;

/// Write the content to disk, then insert the metadata row referencing
/// the written path. If the insert fails the disk file is left behind as
/// a reconcilable orphan; the reverse (row without content) cannot occur.
pub async fn save_file(
    db: &SqlitePool,
    store: &FileStore,
    task_id: &str,
    name: &str,
    content: &[u8],
) -> Result<Option<StoredFile>, AppError> {
    let file_path = store.write(task_id, content).await?;
    let file_path = file_path.to_string_lossy().into_owned();

    let id = new_id();
    let result = sqlx::query("INSERT INTO files (id, task_id, name, file_path) VALUES (?1, ?2, ?3, ?4)")
        .bind(&id)
        .bind(task_id)
        .bind(name)
        .bind(&file_path)
        .execute(db)
        .await?;

    Ok((result.rows_affected() > 0).then(|| StoredFile {
        id,
        task_id: task_id.to_string(),
        name: name.to_string(),
        file_path,
    }))
}

pub async fn get_file(db: &SqlitePool, file_id: &str) -> Result<Option<StoredFile>, AppError> {
    let file = sqlx::query_as::<_, StoredFile>(
        "SELECT id, task_id, name, file_path FROM files WHERE id = ?1",
    )
    .bind(file_id)
    .fetch_optional(db)
    .await?;
    Ok(file)
}

/// Delete the metadata row, then unlink the content. Removes the task's
/// directory once its last file is gone, so the directory exists exactly
/// when the task still has files. Missing ids are a silent no-op.
pub async fn delete_file(
    db: &SqlitePool,
    store: &FileStore,
    file_id: &str,
) -> Result<(), AppError> {
    let deleted: Option<(String, String)> =
        sqlx::query_as("DELETE FROM files WHERE id = ?1 RETURNING task_id, file_path")
            .bind(file_id)
            .fetch_optional(db)
            .await?;

    let Some((task_id, file_path)) = deleted else {
        return Ok(());
    };

    store.remove(Path::new(&file_path)).await?;

    let (remaining,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM files WHERE task_id = ?1")
        .bind(&task_id)
        .fetch_one(db)
        .await?;
    if remaining == 0 {
        store.remove_task_dir(&task_id).await?;
    }
    Ok(())
}

/// Cascade entry point: deletes all metadata rows for the task on the
/// given connection, unlinks each file's content, then removes the
/// emptied per-task directory. A failed unlink propagates and aborts the
/// enclosing transaction rather than leaving the hierarchy half-deleted.
pub async fn delete_files_for_task(
    conn: &mut SqliteConnection,
    store: &FileStore,
    task_id: &str,
) -> Result<(), AppError> {
    let paths: Vec<(String,)> =
        sqlx::query_as("DELETE FROM files WHERE task_id = ?1 RETURNING file_path")
            .bind(task_id)
            .fetch_all(&mut *conn)
            .await?;

    if paths.is_empty() {
        return Ok(());
    }

    for (file_path,) in &paths {
        store.remove(Path::new(file_path)).await?;
    }
    store.remove_task_dir(task_id).await?;
    Ok(())
}
