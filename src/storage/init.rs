/*
 * Copyright 2025 Flamewire
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

use crate::config::StoreConfig;
use crate::error::LogDbError;
use crate::storage::SCHEMA;
use crate::validated_types::StoreLocation;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::debug;

/// Open the pool described by `config` and make sure the schema exists.
pub async fn init_pool(config: &StoreConfig) -> Result<SqlitePool, LogDbError> {
    let location = config.location.to_string();
    let open_err = |e: sqlx::Error| LogDbError::Open {
        location: location.clone(),
        source: Box::new(e),
    };

    let options = match &config.location {
        StoreLocation::File(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .map_err(|e| open_err(sqlx::Error::Io(e)))?;
                }
            }
            SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
        }
        StoreLocation::Memory => SqliteConnectOptions::from_str("sqlite::memory:").map_err(open_err)?,
    }
    .busy_timeout(config.busy_timeout);

    // An in-memory database lives exactly as long as its single connection.
    let pool = SqlitePoolOptions::new()
        .max_connections(config.pool_size())
        .min_connections(if config.location.is_memory() { 1 } else { 0 })
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .map_err(open_err)?;

    for statement in SCHEMA {
        if let Err(e) = sqlx::query(statement).execute(&pool).await {
            pool.close().await;
            return Err(open_err(e));
        }
    }
    debug!(target: "logdb", %location, "schema ready");

    Ok(pool)
}
