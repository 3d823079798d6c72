use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};

use crate::db::{TxContext, tasks};
use crate::error::AppError;
use crate::models::{TaskList, TaskListDetails, TaskSummary};
use crate::storage::FileStore;
use crate::util::new_id;

pub async fn create_task_list(
    db: &SqlitePool,
    account_id: &str,
    name: &str,
) -> Result<Option<TaskList>, AppError> {
    if name.is_empty() {
        return Err(AppError::BadRequest(
            "Task list name cannot be blank".to_string(),
        ));
    }

    let id = new_id();
    let result = sqlx::query("INSERT INTO task_lists (id, account_id, name) VALUES (?1, ?2, ?3)")
        .bind(&id)
        .bind(account_id)
        .bind(name)
        .execute(db)
        .await?;

    Ok((result.rows_affected() > 0).then(|| TaskList {
        id,
        account_id: account_id.to_string(),
        name: name.to_string(),
    }))
}

pub async fn get_task_lists(db: &SqlitePool, account_id: &str) -> Result<Vec<TaskList>, AppError> {
    let lists = sqlx::query_as::<_, TaskList>(
        "SELECT id, account_id, name FROM task_lists WHERE account_id = ?1",
    )
    .bind(account_id)
    .fetch_all(db)
    .await?;
    Ok(lists)
}

/// One row per task via a left join, so a list with zero tasks still
/// comes back (with an empty task array).
#[derive(Debug, FromRow)]
struct ListTaskRow {
    account_id: String,
    name: String,
    task_id: Option<String>,
    description: Option<String>,
    due: Option<DateTime<Utc>>,
    completed: Option<DateTime<Utc>>,
}

pub async fn get_task_list_details(
    db: &SqlitePool,
    task_list_id: &str,
) -> Result<Option<TaskListDetails>, AppError> {
    let rows = sqlx::query_as::<_, ListTaskRow>(
        "SELECT L.account_id, L.name, T.id AS task_id, T.description, T.due, T.completed \
         FROM task_lists L LEFT JOIN tasks T ON T.task_list_id = L.id \
         WHERE L.id = ?1",
    )
    .bind(task_list_id)
    .fetch_all(db)
    .await?;

    let Some(first) = rows.first() else {
        return Ok(None);
    };

    let details = TaskListDetails {
        id: task_list_id.to_string(),
        account_id: first.account_id.clone(),
        name: first.name.clone(),
        tasks: rows
            .iter()
            .filter_map(|row| {
                let task_id = row.task_id.clone()?;
                Some(TaskSummary {
                    id: task_id,
                    description: row.description.clone().unwrap_or_default(),
                    due: row.due,
                    completed: row.completed,
                })
            })
            .collect(),
    };
    Ok(Some(details))
}

pub async fn rename_task_list(
    db: &SqlitePool,
    task_list_id: &str,
    name: &str,
) -> Result<Option<TaskList>, AppError> {
    if name.is_empty() {
        return Err(AppError::BadRequest(
            "Task list name cannot be blank".to_string(),
        ));
    }

    let list = sqlx::query_as::<_, TaskList>(
        "UPDATE task_lists SET name = ?1 WHERE id = ?2 RETURNING id, account_id, name",
    )
    .bind(name)
    .bind(task_list_id)
    .fetch_optional(db)
    .await?;
    Ok(list)
}

/// Delete the list and every task and file under it in one transaction.
/// Deleting a missing list is a successful no-op.
pub async fn delete_task_list(
    db: &SqlitePool,
    store: &FileStore,
    task_list_id: &str,
) -> Result<(), AppError> {
    let mut tx = TxContext::begin(db).await?;
    match delete_task_list_rows(tx.conn(), store, task_list_id).await {
        Ok(()) => tx.commit().await,
        Err(err) => {
            tx.rollback().await;
            Err(err)
        }
    }
}

async fn delete_task_list_rows(
    conn: &mut SqliteConnection,
    store: &FileStore,
    task_list_id: &str,
) -> Result<(), AppError> {
    sqlx::query("DELETE FROM task_lists WHERE id = ?1")
        .bind(task_list_id)
        .execute(&mut *conn)
        .await?;

    tasks::delete_tasks_for_list(conn, store, task_list_id).await
}

/// Cascade entry point: always called with the connection of an
/// already-open transaction owned further up the hierarchy.
pub async fn delete_task_lists_for_account(
    conn: &mut SqliteConnection,
    store: &FileStore,
    account_id: &str,
) -> Result<(), AppError> {
    let list_ids: Vec<(String,)> =
        sqlx::query_as("DELETE FROM task_lists WHERE account_id = ?1 RETURNING id")
            .bind(account_id)
            .fetch_all(&mut *conn)
            .await?;

    for (list_id,) in list_ids {
        tasks::delete_tasks_for_list(conn, store, &list_id).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{test_pool, test_store};
    use crate::db::{accounts, files, tasks};
    use crate::models::TaskInput;

    async fn seed_account(pool: &SqlitePool, username: &str) -> String {
        accounts::create_account(pool, username, "pw")
            .await
            .expect("Failed to create account")
            .expect("Insert affected zero rows")
            .id
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let pool = test_pool().await;
        let account_id = seed_account(&pool, "alice").await;

        let first = create_task_list(&pool, &account_id, "first")
            .await
            .expect("Failed to create list")
            .expect("Insert affected zero rows");
        create_task_list(&pool, &account_id, "second")
            .await
            .expect("Failed to create list");

        let lists = get_task_lists(&pool, &account_id)
            .await
            .expect("Failed to fetch lists");
        assert_eq!(lists.len(), 2);
        assert!(lists.iter().any(|l| l.id == first.id));

        let none = get_task_lists(&pool, "other-account")
            .await
            .expect("Failed to fetch lists");
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let pool = test_pool().await;
        let account_id = seed_account(&pool, "alice").await;

        let err = create_task_list(&pool, &account_id, "").await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let list = create_task_list(&pool, &account_id, "chores")
            .await
            .expect("Failed to create list")
            .expect("Insert affected zero rows");
        let err = rename_task_list(&pool, &list.id, "").await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_details_include_empty_task_array() {
        let pool = test_pool().await;
        let account_id = seed_account(&pool, "alice").await;

        let list = create_task_list(&pool, &account_id, "empty")
            .await
            .expect("Failed to create list")
            .expect("Insert affected zero rows");

        let details = get_task_list_details(&pool, &list.id)
            .await
            .expect("Failed to fetch details")
            .expect("List should exist");
        assert_eq!(details.name, "empty");
        assert_eq!(details.account_id, account_id);
        assert!(details.tasks.is_empty());

        let missing = get_task_list_details(&pool, "no-such-list")
            .await
            .expect("Failed to fetch details");
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_details_collect_tasks() {
        let pool = test_pool().await;
        let account_id = seed_account(&pool, "alice").await;

        let list = create_task_list(&pool, &account_id, "chores")
            .await
            .expect("Failed to create list")
            .expect("Insert affected zero rows");
        for description in ["sweep", "mop"] {
            tasks::create_task(
                &pool,
                &list.id,
                &TaskInput {
                    description: description.to_string(),
                    due: None,
                    completed: None,
                },
            )
            .await
            .expect("Failed to create task");
        }

        let details = get_task_list_details(&pool, &list.id)
            .await
            .expect("Failed to fetch details")
            .expect("List should exist");
        assert_eq!(details.tasks.len(), 2);
    }

    #[tokio::test]
    async fn test_rename() {
        let pool = test_pool().await;
        let account_id = seed_account(&pool, "alice").await;

        let list = create_task_list(&pool, &account_id, "old name")
            .await
            .expect("Failed to create list")
            .expect("Insert affected zero rows");

        let renamed = rename_task_list(&pool, &list.id, "new name")
            .await
            .expect("Failed to rename")
            .expect("List should exist");
        assert_eq!(renamed.id, list.id);
        assert_eq!(renamed.name, "new name");

        let missing = rename_task_list(&pool, "no-such-list", "name")
            .await
            .expect("Failed to rename");
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_delete_missing_list_is_noop() {
        let pool = test_pool().await;
        let (store, _dir) = test_store();

        delete_task_list(&pool, &store, "no-such-list")
            .await
            .expect("Deleting a missing list must succeed");
    }

    #[tokio::test]
    async fn test_delete_list_cascades_to_tasks_and_files() {
        let pool = test_pool().await;
        let (store, _dir) = test_store();

        // create account "foo" -> list "first" -> task "buy milk" -> file.
        let account_id = seed_account(&pool, "foo").await;
        let list = create_task_list(&pool, &account_id, "first")
            .await
            .expect("Failed to create list")
            .expect("Insert affected zero rows");
        let task = tasks::create_task(
            &pool,
            &list.id,
            &TaskInput {
                description: "buy milk".to_string(),
                due: None,
                completed: None,
            },
        )
        .await
        .expect("Failed to create task");
        files::save_file(&pool, &store, &task.id, "list.txt", b"1% milk")
            .await
            .expect("Failed to save file")
            .expect("Insert affected zero rows");

        delete_task_list(&pool, &store, &list.id)
            .await
            .expect("Failed to delete list");

        let (task_count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM tasks WHERE task_list_id = ?1")
                .bind(&list.id)
                .fetch_one(&pool)
                .await
                .expect("Failed to count tasks");
        assert_eq!(task_count, 0);

        let (file_count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM files WHERE task_id = ?1")
                .bind(&task.id)
                .fetch_one(&pool)
                .await
                .expect("Failed to count files");
        assert_eq!(file_count, 0);

        assert!(
            !store.task_dir_exists(&task.id).await,
            "task file directory must be removed with the list"
        );

        // Idempotent: a second delete changes nothing and succeeds.
        delete_task_list(&pool, &store, &list.id)
            .await
            .expect("Second delete must succeed");
    }
}
