use sqlx::{FromRow, SqliteConnection, SqlitePool};

use crate::auth;
use crate::db::{TxContext, task_lists};
use crate::error::AppError;
use crate::models::{Account, UpdateAccountRequest};
use crate::storage::FileStore;
use crate::util::new_id;

#[derive(Debug, FromRow)]
struct AccountRow {
    id: String,
    username: String,
    password: String,
}

impl AccountRow {
    fn into_account(self) -> Account {
        Account {
            id: self.id,
            username: self.username,
        }
    }
}

async fn account_row(db: &SqlitePool, username: &str) -> Result<Option<AccountRow>, AppError> {
    let row = sqlx::query_as::<_, AccountRow>(
        "SELECT id, username, password FROM accounts WHERE username = ?1",
    )
    .bind(username)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// Verify credentials against the stored hash. Returns `None` both for an
/// unknown username and for a wrong password; the caller maps either to
/// "unauthenticated".
pub async fn authenticate(
    db: &SqlitePool,
    username: &str,
    password: &str,
) -> Result<Option<Account>, AppError> {
    let Some(row) = account_row(db, username).await? else {
        return Ok(None);
    };

    if auth::verify_password(password, &row.password)? {
        Ok(Some(row.into_account()))
    } else {
        Ok(None)
    }
}

pub async fn create_account(
    db: &SqlitePool,
    username: &str,
    password: &str,
) -> Result<Option<Account>, AppError> {
    if username.is_empty() {
        return Err(AppError::BadRequest("Username cannot be blank".to_string()));
    }
    if password.is_empty() {
        return Err(AppError::BadRequest("Password cannot be blank".to_string()));
    }

    let id = new_id();
    let hash = auth::hash_password(password)?;

    let result = sqlx::query("INSERT INTO accounts (id, username, password) VALUES (?1, ?2, ?3)")
        .bind(&id)
        .bind(username)
        .bind(&hash)
        .execute(db)
        .await;

    // Two concurrent creates can both pass the route-level existence check;
    // the UNIQUE constraint decides the race.
    let result = match result {
        Ok(result) => result,
        Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
            return Err(AppError::Conflict(format!(
                "Username '{username}' is already taken"
            )));
        }
        Err(err) => return Err(err.into()),
    };

    Ok((result.rows_affected() > 0).then(|| Account {
        id,
        username: username.to_string(),
    }))
}

pub async fn get_account(db: &SqlitePool, username: &str) -> Result<Option<Account>, AppError> {
    Ok(account_row(db, username).await?.map(AccountRow::into_account))
}

/// Update only the supplied, changed fields in a single statement.
/// No supplied change means no write: the current projection is returned.
pub async fn update_account(
    db: &SqlitePool,
    username: &str,
    update: &UpdateAccountRequest,
) -> Result<Option<Account>, AppError> {
    let Some(account) = get_account(db, username).await? else {
        return Ok(None);
    };

    let new_username = match update.username.as_deref() {
        Some("") => return Err(AppError::BadRequest("Username cannot be blank".to_string())),
        Some(u) if u != username => Some(u),
        _ => None,
    };

    // The stored value is a salted hash, so a supplied password always
    // counts as a change.
    let new_password = match update.password.as_deref() {
        Some("") => return Err(AppError::BadRequest("Password cannot be blank".to_string())),
        Some(p) => Some(auth::hash_password(p)?),
        None => None,
    };

    let query = match (new_username, new_password.as_deref()) {
        (None, None) => return Ok(Some(account)),
        (Some(u), None) => sqlx::query("UPDATE accounts SET username = ?1 WHERE username = ?2")
            .bind(u)
            .bind(username),
        (None, Some(p)) => sqlx::query("UPDATE accounts SET password = ?1 WHERE username = ?2")
            .bind(p)
            .bind(username),
        (Some(u), Some(p)) => {
            sqlx::query("UPDATE accounts SET username = ?1, password = ?2 WHERE username = ?3")
                .bind(u)
                .bind(p)
                .bind(username)
        }
    };
    query.execute(db).await?;

    Ok(Some(Account {
        id: account.id,
        username: new_username.unwrap_or(username).to_string(),
    }))
}

/// Delete the account and everything it transitively owns in one
/// transaction. Deleting a missing account is a successful no-op.
pub async fn delete_account(
    db: &SqlitePool,
    store: &FileStore,
    username: &str,
) -> Result<(), AppError> {
    let Some(account) = get_account(db, username).await? else {
        return Ok(());
    };

    let mut tx = TxContext::begin(db).await?;
    match delete_account_rows(tx.conn(), store, username, &account.id).await {
        Ok(()) => tx.commit().await,
        Err(err) => {
            tx.rollback().await;
            Err(err)
        }
    }
}

async fn delete_account_rows(
    conn: &mut SqliteConnection,
    store: &FileStore,
    username: &str,
    account_id: &str,
) -> Result<(), AppError> {
    sqlx::query("DELETE FROM accounts WHERE username = ?1")
        .bind(username)
        .execute(&mut *conn)
        .await?;

    task_lists::delete_task_lists_for_account(conn, store, account_id).await
}
