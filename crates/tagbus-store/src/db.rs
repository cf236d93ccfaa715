// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! SQLite connection pool and schema bootstrap.
//!
//! The store keeps machine and tag configuration in two tables:
//!
//! ```text
//! machines (id, name UNIQUE, ip_address, port, slave)
//! tags     (id, machine_id → machines ON DELETE CASCADE,
//!           tag_name, tag_type, logical_register, real_register,
//!           permission, UNIQUE(machine_id, tag_name))
//! ```
//!
//! WAL journaling and foreign keys are enabled on every pool; deleting a
//! machine cascades to its tags.

use std::path::Path;
use std::time::Duration;

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::SqlitePool;

use tagbus_core::error::{StoreError, StoreResult};

// =============================================================================
// Store
// =============================================================================

/// Handle to the configuration database.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Opens (creating if missing) the database at `path`.
    pub async fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StoreError::database_with("failed to create data directory", e))?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5))
            .foreign_keys(true)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::database_with("failed to open database", e))?;

        let store = Self { pool };
        store.init_schema().await?;

        tracing::info!(path = %path.display(), "Configuration database opened");

        Ok(store)
    }

    /// Opens an in-memory database, used by tests.
    pub async fn open_in_memory() -> StoreResult<Self> {
        let options = SqliteConnectOptions::new()
            .in_memory(true)
            .foreign_keys(true);

        // A single connection keeps every query on the same in-memory
        // database instance.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::database_with("failed to open in-memory database", e))?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Returns the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Closes the pool.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::debug!("Configuration database closed");
    }

    async fn init_schema(&self) -> StoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS machines (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT UNIQUE NOT NULL,
                ip_address TEXT NOT NULL,
                port INTEGER NOT NULL DEFAULT 502,
                slave INTEGER NOT NULL DEFAULT 1
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::database_with("failed to create machines table", e))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tags (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                machine_id INTEGER NOT NULL,
                tag_name TEXT NOT NULL,
                tag_type TEXT NOT NULL,
                logical_register TEXT NOT NULL,
                real_register TEXT NOT NULL,
                permission TEXT NOT NULL,
                FOREIGN KEY (machine_id) REFERENCES machines(id) ON DELETE CASCADE,
                UNIQUE (machine_id, tag_name)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::database_with("failed to create tags table", e))?;

        Ok(())
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").finish()
    }
}
