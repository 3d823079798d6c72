use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};

use crate::db::{TxContext, files};
use crate::error::AppError;
use crate::models::{FileRef, Task, TaskInput};
use crate::storage::FileStore;
use crate::util::new_id;

/// Result of the ownership check used to authorize task- and file-scoped
/// operations. Callers branch: `!exists` is not-found (or a no-op for
/// idempotent deletes), `exists && !access` is forbidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessCheck {
    pub exists: bool,
    pub access: bool,
}

/// Does the task exist, and is it transitively owned by `account_id`?
pub async fn check_access(
    db: &SqlitePool,
    account_id: &str,
    task_id: &str,
) -> Result<AccessCheck, AppError> {
    let owner: Option<(String,)> = sqlx::query_as(
        "SELECT L.account_id FROM tasks T \
         INNER JOIN task_lists L ON T.task_list_id = L.id \
         WHERE T.id = ?1",
    )
    .bind(task_id)
    .fetch_optional(db)
    .await?;

    Ok(match owner {
        Some((owner_id,)) => AccessCheck {
            exists: true,
            access: owner_id == account_id,
        },
        None => AccessCheck {
            exists: false,
            access: false,
        },
    })
}

pub async fn create_task(
    db: &SqlitePool,
    task_list_id: &str,
    input: &TaskInput,
) -> Result<Task, AppError> {
    let id = new_id();
    sqlx::query(
        "INSERT INTO tasks (id, task_list_id, description, due, completed) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(&id)
    .bind(task_list_id)
    .bind(&input.description)
    .bind(input.due)
    .bind(input.completed)
    .execute(db)
    .await?;

    Ok(Task {
        id,
        description: input.description.clone(),
        due: input.due,
        completed: input.completed,
        files: Vec::new(),
    })
}

/// One row per (task, file) pair from the outer join; tasks without files
/// produce a single row with null file columns.
#[derive(Debug, FromRow)]
struct TaskFileRow {
    task_id: String,
    description: String,
    due: Option<DateTime<Utc>>,
    completed: Option<DateTime<Utc>>,
    file_id: Option<String>,
    file_name: Option<String>,
}

const TASK_FILE_SELECT: &str = "SELECT T.id AS task_id, T.description, T.due, T.completed, \
    F.id AS file_id, F.name AS file_name \
    FROM tasks T LEFT JOIN files F ON F.task_id = T.id";

/// Collapse join fan-out: multiple files for one task group under a
/// single task entry instead of repeating the task.
fn group_task_rows(rows: Vec<TaskFileRow>) -> Vec<Task> {
    let mut results: Vec<Task> = Vec::new();

    for row in rows {
        let file = match (row.file_id, row.file_name) {
            (Some(id), Some(name)) => Some(FileRef { id, name }),
            _ => None,
        };

        match results.iter_mut().find(|task| task.id == row.task_id) {
            Some(task) => {
                if let Some(file) = file {
                    task.files.push(file);
                }
            }
            None => results.push(Task {
                id: row.task_id,
                description: row.description,
                due: row.due,
                completed: row.completed,
                files: file.into_iter().collect(),
            }),
        }
    }

    results
}

pub async fn get_task(db: &SqlitePool, task_id: &str) -> Result<Option<Task>, AppError> {
    let rows = sqlx::query_as::<_, TaskFileRow>(&format!("{TASK_FILE_SELECT} WHERE T.id = ?1"))
        .bind(task_id)
        .fetch_all(db)
        .await?;
    Ok(group_task_rows(rows).into_iter().next())
}

pub async fn get_tasks(db: &SqlitePool, task_list_id: &str) -> Result<Vec<Task>, AppError> {
    let rows = sqlx::query_as::<_, TaskFileRow>(&format!(
        "{TASK_FILE_SELECT} WHERE T.task_list_id = ?1"
    ))
    .bind(task_list_id)
    .fetch_all(db)
    .await?;
    Ok(group_task_rows(rows))
}

/// Full replace of the three mutable fields. Returns the updated task
/// re-fetched with its files, or `None` if no row matched.
pub async fn set_task(
    db: &SqlitePool,
    task_id: &str,
    input: &TaskInput,
) -> Result<Option<Task>, AppError> {
    let result = sqlx::query("UPDATE tasks SET description = ?1, due = ?2, completed = ?3 WHERE id = ?4")
        .bind(&input.description)
        .bind(input.due)
        .bind(input.completed)
        .bind(task_id)
        .execute(db)
        .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    get_task(db, task_id).await
}

/// Delete the task, its file rows, and their disk content in one
/// transaction. Deleting a missing task is a successful no-op.
pub async fn delete_task(
    db: &SqlitePool,
    store: &FileStore,
    task_id: &str,
) -> Result<(), AppError> {
    let mut tx = TxContext::begin(db).await?;
    match delete_task_rows(tx.conn(), store, task_id).await {
        Ok(()) => tx.commit().await,
        Err(err) => {
            tx.rollback().await;
            Err(err)
        }
    }
}

async fn delete_task_rows(
    conn: &mut SqliteConnection,
    store: &FileStore,
    task_id: &str,
) -> Result<(), AppError> {
    sqlx::query("DELETE FROM tasks WHERE id = ?1")
        .bind(task_id)
        .execute(&mut *conn)
        .await?;

    files::delete_files_for_task(conn, store, task_id).await
}

/// Cascade entry point: joins the transaction already open on `conn` and
/// removes every task of the list, cascading into the file controller.
pub async fn delete_tasks_for_list(
    conn: &mut SqliteConnection,
    store: &FileStore,
    task_list_id: &str,
) -> Result<(), AppError> {
    let mut tx = TxContext::join(conn);

    let task_ids: Vec<(String,)> =
        sqlx::query_as("DELETE FROM tasks WHERE task_list_id = ?1 RETURNING id")
            .bind(task_list_id)
            .fetch_all(tx.conn())
            .await?;

    for (task_id,) in task_ids {
        files::delete_files_for_task(tx.conn(), store, &task_id).await?;
    }

    // No-op: the boundary belongs to the caller that opened it.
    tx.commit().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{test_pool, test_store};
    use crate::db::{accounts, files, task_lists};
    use chrono::TimeZone;

    async fn seed_list(pool: &SqlitePool, username: &str) -> (String, String) {
        let account = accounts::create_account(pool, username, "pw")
            .await
            .expect("Failed to create account")
            .expect("Insert affected zero rows");
        let list = task_lists::create_task_list(pool, &account.id, "list")
            .await
            .expect("Failed to create list")
            .expect("Insert affected zero rows");
        (account.id, list.id)
    }

    fn input(description: &str) -> TaskInput {
        TaskInput {
            description: description.to_string(),
            due: None,
            completed: None,
        }
    }

    #[tokio::test]
    async fn test_create_then_get_roundtrip() {
        let pool = test_pool().await;
        let (_, list_id) = seed_list(&pool, "alice").await;

        let due = Utc.with_ymd_and_hms(2026, 9, 1, 12, 0, 0).unwrap();
        let created = create_task(
            &pool,
            &list_id,
            &TaskInput {
                description: "water plants".to_string(),
                due: Some(due),
                completed: None,
            },
        )
        .await
        .expect("Failed to create task");
        assert!(created.files.is_empty());

        let fetched = get_task(&pool, &created.id)
            .await
            .expect("Failed to fetch task")
            .expect("Task should exist");
        assert_eq!(fetched.description, "water plants");
        assert_eq!(fetched.due, Some(due));
        assert_eq!(fetched.completed, None);
        assert!(fetched.files.is_empty());
    }

    #[tokio::test]
    async fn test_set_task_replaces_all_fields() {
        let pool = test_pool().await;
        let (_, list_id) = seed_list(&pool, "alice").await;

        let task = create_task(&pool, &list_id, &input("draft")).await.unwrap();

        let completed = Utc.with_ymd_and_hms(2026, 8, 23, 8, 30, 0).unwrap();
        let updated = set_task(
            &pool,
            &task.id,
            &TaskInput {
                description: "final".to_string(),
                due: None,
                completed: Some(completed),
            },
        )
        .await
        .expect("Failed to update task")
        .expect("Task should exist");
        assert_eq!(updated.description, "final");
        assert_eq!(updated.completed, Some(completed));

        // Re-opening: completed back to null is a valid update.
        let reopened = set_task(&pool, &task.id, &input("final"))
            .await
            .expect("Failed to update task")
            .expect("Task should exist");
        assert_eq!(reopened.completed, None);

        let missing = set_task(&pool, "no-such-task", &input("x"))
            .await
            .expect("Failed to update task");
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_files_group_under_one_task_entry() {
        let pool = test_pool().await;
        let (store, _dir) = test_store();
        let (_, list_id) = seed_list(&pool, "alice").await;

        let task = create_task(&pool, &list_id, &input("attachments")).await.unwrap();
        for name in ["a.txt", "b.txt", "c.txt"] {
            files::save_file(&pool, &store, &task.id, name, b"data")
                .await
                .expect("Failed to save file")
                .expect("Insert affected zero rows");
        }
        // A second, file-less task shares the list.
        create_task(&pool, &list_id, &input("bare")).await.unwrap();

        let fetched = get_task(&pool, &task.id)
            .await
            .expect("Failed to fetch task")
            .expect("Task should exist");
        assert_eq!(fetched.files.len(), 3, "exactly one entry per file");

        let all = get_tasks(&pool, &list_id).await.expect("Failed to fetch tasks");
        assert_eq!(all.len(), 2, "join fan-out must not duplicate tasks");
        let bare = all.iter().find(|t| t.description == "bare").unwrap();
        assert!(bare.files.is_empty());
    }

    #[tokio::test]
    async fn test_check_access_branches() {
        let pool = test_pool().await;
        let (owner_id, list_id) = seed_list(&pool, "owner").await;
        let other = accounts::create_account(&pool, "intruder", "pw")
            .await
            .expect("Failed to create account")
            .expect("Insert affected zero rows");

        let task = create_task(&pool, &list_id, &input("private")).await.unwrap();

        let own = check_access(&pool, &owner_id, &task.id).await.unwrap();
        assert_eq!(own, AccessCheck { exists: true, access: true });

        let foreign = check_access(&pool, &other.id, &task.id).await.unwrap();
        assert_eq!(foreign, AccessCheck { exists: true, access: false });

        let missing = check_access(&pool, &owner_id, "no-such-task").await.unwrap();
        assert_eq!(missing, AccessCheck { exists: false, access: false });
    }

    #[tokio::test]
    async fn test_delete_task_removes_files_and_directory() {
        let pool = test_pool().await;
        let (store, _dir) = test_store();
        let (_, list_id) = seed_list(&pool, "alice").await;

        let task = create_task(&pool, &list_id, &input("doomed")).await.unwrap();
        let file = files::save_file(&pool, &store, &task.id, "notes.txt", b"gone soon")
            .await
            .expect("Failed to save file")
            .expect("Insert affected zero rows");

        delete_task(&pool, &store, &task.id)
            .await
            .expect("Failed to delete task");

        assert!(get_task(&pool, &task.id).await.unwrap().is_none());
        assert!(files::get_file(&pool, &file.id).await.unwrap().is_none());
        assert!(!store.task_dir_exists(&task.id).await);

        // Idempotent on a second call.
        delete_task(&pool, &store, &task.id)
            .await
            .expect("Second delete must succeed");
    }
}
