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

use crate::codec;
use crate::error::LogDbError;
use crate::storage::sqlite;
use crate::store::Shared;
use crate::types::{
    Address, BlockHeader, Event, RawEvent, RawTransfer, Transfer, B256, TOPIC_SLOTS,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Accumulates the records of one block and writes them in a single
/// transaction.
///
/// Committing at height `H > 0` first removes every stored record at or above
/// `H` and moves the last-indexed marker to `H`, so replaying a block after a
/// reorg leaves exactly the new records behind. Height 0 is written as-is.
///
/// A block holds at most `u32::MAX + 1` records of each kind; appending past
/// that makes the commit fail with [`LogDbError::InvalidInput`].
pub struct BlockBatch {
    shared: Arc<Shared>,
    header: BlockHeader,
    events: Vec<Event>,
    transfers: Vec<Transfer>,
    rejected: Option<LogDbError>,
}

impl BlockBatch {
    pub(crate) fn new(shared: Arc<Shared>, header: BlockHeader) -> Self {
        Self {
            shared,
            header,
            events: Vec::new(),
            transfers: Vec::new(),
            rejected: None,
        }
    }

    pub fn header(&self) -> &BlockHeader {
        &self.header
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn transfers(&self) -> &[Transfer] {
        &self.transfers
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.transfers.is_empty()
    }

    /// Start appending the output of transaction `tx_id`, signed by `tx_origin`.
    pub fn for_transaction(&mut self, tx_id: B256, tx_origin: Address) -> TransactionBatch<'_> {
        TransactionBatch {
            batch: self,
            tx_id,
            tx_origin,
        }
    }

    fn push_event(&mut self, tx_id: B256, tx_origin: Address, clause_index: u32, raw: &RawEvent) {
        let index = match codec::sequence_index("event_index", self.events.len()) {
            Ok(index) => index,
            Err(e) => {
                self.rejected.get_or_insert(e);
                return;
            }
        };
        if raw.topics.len() > TOPIC_SLOTS {
            debug!(
                target: "logdb",
                block = self.header.number,
                topics = raw.topics.len(),
                "dropping topics past the indexed slots"
            );
        }
        let mut topics = [None; TOPIC_SLOTS];
        for (slot, topic) in topics.iter_mut().zip(&raw.topics) {
            *slot = Some(*topic);
        }
        self.events.push(Event {
            block_number: self.header.number,
            index,
            block_id: self.header.id,
            block_time: self.header.timestamp,
            tx_id,
            tx_origin,
            clause_index,
            address: raw.address,
            topics,
            data: raw.data.clone(),
        });
    }

    fn push_transfer(
        &mut self,
        tx_id: B256,
        tx_origin: Address,
        clause_index: u32,
        raw: &RawTransfer,
    ) {
        let index = match codec::sequence_index("transfer_index", self.transfers.len()) {
            Ok(index) => index,
            Err(e) => {
                self.rejected.get_or_insert(e);
                return;
            }
        };
        self.transfers.push(Transfer {
            block_number: self.header.number,
            index,
            block_id: self.header.id,
            block_time: self.header.timestamp,
            tx_id,
            tx_origin,
            clause_index,
            sender: raw.sender,
            recipient: raw.recipient,
            amount: raw.amount.clone(),
        });
    }

    /// Persist the batch. Either everything lands or nothing does; on error
    /// prepare a fresh batch to retry.
    ///
    /// Records that cannot be stored without loss are rejected before any
    /// write starts.
    pub async fn commit(mut self) -> Result<(), LogDbError> {
        self.shared.ensure_open()?;
        if let Err(e) = self.check() {
            warn!(target: "logdb", block = self.header.number, error = %e, "batch rejected");
            return Err(e);
        }
        let _guard = self.shared.writer.lock().await;
        // The store may have been closed while waiting for the writer.
        self.shared.ensure_open()?;

        match self.write().await {
            Ok(()) => {
                debug!(
                    target: "logdb",
                    block = self.header.number,
                    events = self.events.len(),
                    transfers = self.transfers.len(),
                    truncated = self.header.number > 0,
                    "committed block"
                );
                Ok(())
            }
            Err(e) => {
                warn!(target: "logdb", block = self.header.number, error = %e, "commit rolled back");
                Err(e)
            }
        }
    }

    fn check(&mut self) -> Result<(), LogDbError> {
        if let Some(e) = self.rejected.take() {
            return Err(e);
        }
        codec::sql_int("block_time", self.header.timestamp)?;
        Ok(())
    }

    async fn write(&self) -> Result<(), LogDbError> {
        let number = self.header.number;
        let mut tx = self
            .shared
            .pool
            .begin()
            .await
            .map_err(|e| LogDbError::storage("begin", e))?;

        // Genesis is the base of every branch: never truncated, never marked.
        if number > 0 {
            sqlite::delete_from(&mut tx, number)
                .await
                .map_err(|e| LogDbError::storage("truncate", e))?;
            sqlite::store_marker(&mut tx, number)
                .await
                .map_err(|e| LogDbError::storage("store_marker", e))?;
        }

        for event in &self.events {
            sqlite::insert_event(&mut tx, event)
                .await
                .map_err(|e| LogDbError::storage("insert_event", e))?;
        }
        for transfer in &self.transfers {
            sqlite::insert_transfer(&mut tx, transfer)
                .await
                .map_err(|e| LogDbError::storage("insert_transfer", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| LogDbError::storage("commit", e))
    }
}

/// Appends the records of one transaction to its [`BlockBatch`].
pub struct TransactionBatch<'a> {
    batch: &'a mut BlockBatch,
    tx_id: B256,
    tx_origin: Address,
}

impl TransactionBatch<'_> {
    /// Append the events and transfers produced by clause `clause_index`.
    /// Each record is numbered by its position in the whole block.
    pub fn insert(
        &mut self,
        events: &[RawEvent],
        transfers: &[RawTransfer],
        clause_index: u32,
    ) -> &mut Self {
        for event in events {
            self.batch
                .push_event(self.tx_id, self.tx_origin, clause_index, event);
        }
        for transfer in transfers {
            self.batch
                .push_transfer(self.tx_id, self.tx_origin, clause_index, transfer);
        }
        self
    }
}
