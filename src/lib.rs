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

//! Reorg-safe index of contract events and value transfers.
//!
//! A chain pipeline records each block through a [`BlockBatch`] obtained
//! from [`LogStore::prepare`]; readers query with [`EventFilter`] and
//! [`TransferFilter`].

pub mod batch;
pub mod codec;
pub mod config;
pub mod context;
pub mod error;
pub mod filter;
pub mod prelude;
pub mod storage;
pub mod store;
pub mod types;
pub mod validated_types;

pub use crate::batch::{BlockBatch, TransactionBatch};
pub use crate::config::StoreConfig;
pub use crate::context::Context;
pub use crate::error::LogDbError;
pub use crate::filter::{
    EventCriteria, EventFilter, Options, Order, Range, RangeUnit, TransferCriteria,
    TransferFilter,
};
pub use crate::store::LogStore;
pub use crate::types::{BlockHeader, BlockNumber, Event, RawEvent, RawTransfer, Transfer};
pub use crate::validated_types::{SqliteUrl, StoreLocation};
