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

pub mod init;
pub mod sqlite;

/// Key of the config row holding the last indexed block number.
pub const MARKER_KEY: &str = "blockNum";

const EVENT_COLUMNS: &[&str] = &[
    "block_number",
    "event_index",
    "block_id",
    "block_time",
    "tx_id",
    "tx_origin",
    "clause_index",
    "address",
    "topic0",
    "topic1",
    "topic2",
    "topic3",
    "topic4",
    "data",
];

const TRANSFER_COLUMNS: &[&str] = &[
    "block_number",
    "transfer_index",
    "block_id",
    "block_time",
    "tx_id",
    "tx_origin",
    "clause_index",
    "sender",
    "recipient",
    "amount",
];

/// The two record tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Table {
    Event,
    Transfer,
}

impl Table {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Event => "event",
            Self::Transfer => "transfer",
        }
    }

    /// Second half of the `(block_number, index)` key.
    pub const fn index_column(self) -> &'static str {
        match self {
            Self::Event => "event_index",
            Self::Transfer => "transfer_index",
        }
    }

    pub const fn columns(self) -> &'static [&'static str] {
        match self {
            Self::Event => EVENT_COLUMNS,
            Self::Transfer => TRANSFER_COLUMNS,
        }
    }
}

/// Statements run on every open. All of them are idempotent.
pub const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS config (
        key   TEXT PRIMARY KEY,
        value BLOB
    )",
    "CREATE TABLE IF NOT EXISTS event (
        block_number INTEGER NOT NULL,
        event_index  INTEGER NOT NULL,
        block_id     BLOB    NOT NULL,
        block_time   INTEGER NOT NULL,
        tx_id        BLOB    NOT NULL,
        tx_origin    BLOB    NOT NULL,
        clause_index INTEGER NOT NULL,
        address      BLOB    NOT NULL,
        topic0       BLOB,
        topic1       BLOB,
        topic2       BLOB,
        topic3       BLOB,
        topic4       BLOB,
        data         BLOB    NOT NULL,
        PRIMARY KEY (block_number, event_index)
    )",
    "CREATE INDEX IF NOT EXISTS idx_event_block_time ON event (block_time)",
    "CREATE INDEX IF NOT EXISTS idx_event_address ON event (address)",
    "CREATE INDEX IF NOT EXISTS idx_event_topic0 ON event (topic0)",
    "CREATE TABLE IF NOT EXISTS transfer (
        block_number   INTEGER NOT NULL,
        transfer_index INTEGER NOT NULL,
        block_id       BLOB    NOT NULL,
        block_time     INTEGER NOT NULL,
        tx_id          BLOB    NOT NULL,
        tx_origin      BLOB    NOT NULL,
        clause_index   INTEGER NOT NULL,
        sender         BLOB    NOT NULL,
        recipient      BLOB    NOT NULL,
        amount         BLOB    NOT NULL,
        PRIMARY KEY (block_number, transfer_index)
    )",
    "CREATE INDEX IF NOT EXISTS idx_transfer_block_time ON transfer (block_time)",
    "CREATE INDEX IF NOT EXISTS idx_transfer_tx_id ON transfer (tx_id)",
    "CREATE INDEX IF NOT EXISTS idx_transfer_tx_origin ON transfer (tx_origin)",
    "CREATE INDEX IF NOT EXISTS idx_transfer_sender ON transfer (sender)",
    "CREATE INDEX IF NOT EXISTS idx_transfer_recipient ON transfer (recipient)",
];
