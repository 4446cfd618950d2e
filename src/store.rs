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

use crate::batch::BlockBatch;
use crate::codec;
use crate::config::StoreConfig;
use crate::context::Context;
use crate::error::LogDbError;
use crate::filter::{EventFilter, Query, TransferFilter};
use crate::storage::init::init_pool;
use crate::storage::sqlite;
use crate::types::{BlockHeader, BlockNumber, Event, Transfer};
use crate::validated_types::StoreLocation;
use futures::TryStreamExt;
use sqlx::sqlite::SqliteRow;
use sqlx::SqlitePool;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// State shared by a store and the batches it prepared.
pub(crate) struct Shared {
    pub(crate) pool: SqlitePool,
    /// Held for the whole of a commit; at most one commit runs at a time.
    pub(crate) writer: Mutex<()>,
    closed: AtomicBool,
    location: StoreLocation,
}

impl Shared {
    pub(crate) fn ensure_open(&self) -> Result<(), LogDbError> {
        if self.closed.load(Ordering::Acquire) {
            Err(LogDbError::Closed)
        } else {
            Ok(())
        }
    }
}

/// Index of contract events and value transfers.
///
/// Clones share the same connection pool and writer lock. Opening two stores
/// over the same file is not supported.
#[derive(Clone)]
pub struct LogStore {
    shared: Arc<Shared>,
}

impl LogStore {
    pub async fn connect(config: StoreConfig) -> Result<Self, LogDbError> {
        config.validate()?;
        let pool = init_pool(&config).await?;
        info!(target: "logdb", location = %config.location, "log store opened");
        Ok(Self {
            shared: Arc::new(Shared {
                pool,
                writer: Mutex::new(()),
                closed: AtomicBool::new(false),
                location: config.location,
            }),
        })
    }

    /// Create or open a store at `path`. Existing data is kept.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, LogDbError> {
        Self::connect(StoreConfig::file(path.as_ref())).await
    }

    pub async fn open_in_memory() -> Result<Self, LogDbError> {
        Self::connect(StoreConfig::in_memory()).await
    }

    pub fn location(&self) -> &StoreLocation {
        &self.shared.location
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }

    /// Close the backing pool. Waits for an in-flight commit to finish.
    pub async fn close(&self) {
        if self.shared.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let _guard = self.shared.writer.lock().await;
        self.shared.pool.close().await;
        info!(target: "logdb", location = %self.shared.location, "log store closed");
    }

    /// The last committed block above genesis, or 0 if there is none.
    pub async fn last_indexed_block(&self) -> Result<BlockNumber, LogDbError> {
        self.shared.ensure_open()?;
        let raw = sqlite::load_marker(&self.shared.pool)
            .await
            .map_err(|e| LogDbError::storage("load_marker", e))?;
        match raw {
            Some(bytes) => codec::decode_marker(&bytes),
            None => Ok(0),
        }
    }

    /// Start a batch for `header`. Nothing touches the database until
    /// [`BlockBatch::commit`].
    pub fn prepare(&self, header: BlockHeader) -> BlockBatch {
        BlockBatch::new(self.shared.clone(), header)
    }

    /// Events matching `filter`, or every event when `filter` is `None`.
    pub async fn filter_events(
        &self,
        ctx: &Context,
        filter: Option<&EventFilter>,
    ) -> Result<Vec<Event>, LogDbError> {
        self.scan(ctx, Query::events(filter), sqlite::decode_event)
            .await
    }

    /// Transfers matching `filter`, or every transfer when `filter` is `None`.
    pub async fn filter_transfers(
        &self,
        ctx: &Context,
        filter: Option<&TransferFilter>,
    ) -> Result<Vec<Transfer>, LogDbError> {
        self.scan(ctx, Query::transfers(filter), sqlite::decode_transfer)
            .await
    }

    /// Run `query`, decoding rows until the stream ends or `ctx` fires.
    /// Nothing is returned unless every row was read and decoded.
    async fn scan<T>(
        &self,
        ctx: &Context,
        query: Query,
        decode: fn(&SqliteRow) -> Result<T, LogDbError>,
    ) -> Result<Vec<T>, LogDbError> {
        self.shared.ensure_open()?;
        if let Some(err) = ctx.err() {
            return Err(err);
        }

        let mut builder = query.build();
        let mut rows = builder.build().fetch(&self.shared.pool);
        let mut records = Vec::new();
        loop {
            let next = tokio::select! {
                biased;
                _ = ctx.done() => return Err(ctx.fired()),
                next = rows.try_next() => next.map_err(|e| LogDbError::storage("query", e))?,
            };
            let Some(row) = next else {
                break;
            };
            if let Some(err) = ctx.err() {
                return Err(err);
            }
            records.push(decode(&row)?);
        }

        debug!(target: "logdb", rows = records.len(), "filter scan finished");
        Ok(records)
    }
}
