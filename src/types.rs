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

pub use alloy_primitives::{Address, Bytes, B256};
pub use num::BigUint;

pub type BlockNumber = u32;

/// Number of topic slots indexed per event.
pub const TOPIC_SLOTS: usize = 5;

/// The block fields stamped onto every record of a batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockHeader {
    pub number: BlockNumber,
    pub id: B256,
    pub timestamp: u64,
}

impl BlockHeader {
    pub const fn new(number: BlockNumber, id: B256, timestamp: u64) -> Self {
        Self {
            number,
            id,
            timestamp,
        }
    }
}

/// A contract log as produced by executing one clause.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawEvent {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
}

/// A value transfer as produced by executing one clause.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawTransfer {
    pub sender: Address,
    pub recipient: Address,
    pub amount: BigUint,
}

/// An indexed contract event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    pub block_number: BlockNumber,
    /// Position of the event within its block, across all transactions.
    pub index: u32,
    pub block_id: B256,
    pub block_time: u64,
    pub tx_id: B256,
    pub tx_origin: Address,
    pub clause_index: u32,
    pub address: Address,
    pub topics: [Option<B256>; TOPIC_SLOTS],
    pub data: Bytes,
}

/// An indexed value transfer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transfer {
    pub block_number: BlockNumber,
    /// Position of the transfer within its block, across all transactions.
    pub index: u32,
    pub block_id: B256,
    pub block_time: u64,
    pub tx_id: B256,
    pub tx_origin: Address,
    pub clause_index: u32,
    pub sender: Address,
    pub recipient: Address,
    pub amount: BigUint,
}
