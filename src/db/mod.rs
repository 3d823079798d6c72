//! Data-access layer: transaction coordination and one controller module
//! per entity in the ownership hierarchy.

use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use tracing::warn;

use crate::error::AppError;

pub mod accounts;
pub mod files;
pub mod task_lists;
pub mod tasks;

/// Explicit transaction context threaded through every cascading delete.
///
/// Whichever caller constructs the context with [`TxContext::begin`] owns
/// the transaction boundary: only it issues COMMIT or ROLLBACK, and only
/// it returns the connection to the pool. A cascading call further down
/// the hierarchy wraps the connection it was handed with
/// [`TxContext::join`]; commit and rollback on a joined context do
/// nothing, so the whole cascade stays atomic end to end.
pub enum TxContext<'c> {
    Owner(Transaction<'c, Sqlite>),
    Joined(&'c mut SqliteConnection),
}

impl<'c> TxContext<'c> {
    /// Check a connection out of the pool and open a transaction on it.
    pub async fn begin(pool: &SqlitePool) -> Result<TxContext<'static>, AppError> {
        Ok(TxContext::Owner(pool.begin().await?))
    }

    /// Reuse an already-open transaction from an enclosing cascade.
    pub fn join(conn: &'c mut SqliteConnection) -> Self {
        TxContext::Joined(conn)
    }

    /// The active connection. Every statement of a cascade runs on this.
    pub fn conn(&mut self) -> &mut SqliteConnection {
        match self {
            TxContext::Owner(tx) => &mut **tx,
            TxContext::Joined(conn) => conn,
        }
    }

    /// Commit if this context owns the boundary; no-op when joined.
    pub async fn commit(self) -> Result<(), AppError> {
        if let TxContext::Owner(tx) = self {
            tx.commit().await?;
        }
        Ok(())
    }

    /// Roll back if this context owns the boundary; no-op when joined.
    ///
    /// Used on the error path, where the work's own error is the one the
    /// caller needs to see; a rollback failure is only logged. The
    /// connection returns to the pool either way.
    pub async fn rollback(self) {
        if let TxContext::Owner(tx) = self {
            if let Err(err) = tx.rollback().await {
                warn!("transaction rollback failed: {}", err);
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use sqlx::SqlitePool;
    use sqlx::sqlite::SqlitePoolOptions;

    /// In-memory database with the schema applied. A single connection so
    /// every checkout sees the same in-memory store.
    pub async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite://:memory:")
            .await
            .expect("Failed to create test db");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        pool
    }

    /// File store rooted in a fresh temp directory, returned with its
    /// guard so the directory outlives the test body.
    pub fn test_store() -> (crate::storage::FileStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = crate::storage::FileStore::new(dir.path());
        (store, dir)
    }
}
