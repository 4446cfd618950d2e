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

//! Statements against the SQLite tables and row decoding.
//!
//! Write helpers take a `SqliteConnection` so the caller decides which
//! transaction they belong to.

use crate::codec;
use crate::error::LogDbError;
use crate::storage::MARKER_KEY;
use crate::types::{BlockNumber, Event, Transfer, B256, TOPIC_SLOTS};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};

pub async fn delete_from(
    ex: &mut SqliteConnection,
    block_number: BlockNumber,
) -> Result<(), sqlx::Error> {
    const QUERY_EVENT: &str = "DELETE FROM event WHERE block_number >= ?";
    sqlx::query(QUERY_EVENT)
        .bind(i64::from(block_number))
        .execute(&mut *ex)
        .await?;

    const QUERY_TRANSFER: &str = "DELETE FROM transfer WHERE block_number >= ?";
    sqlx::query(QUERY_TRANSFER)
        .bind(i64::from(block_number))
        .execute(&mut *ex)
        .await?;
    Ok(())
}

pub async fn store_marker(
    ex: &mut SqliteConnection,
    block_number: BlockNumber,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT OR REPLACE INTO config (key, value) VALUES (?, ?)")
        .bind(MARKER_KEY)
        .bind(codec::encode_marker(block_number).to_vec())
        .execute(ex)
        .await?;
    Ok(())
}

pub async fn load_marker(pool: &SqlitePool) -> Result<Option<Vec<u8>>, sqlx::Error> {
    sqlx::query_scalar("SELECT value FROM config WHERE key = ?")
        .bind(MARKER_KEY)
        .fetch_optional(pool)
        .await
}

fn stored_int(value: u64) -> Result<i64, sqlx::Error> {
    i64::try_from(value).map_err(|e| sqlx::Error::Encode(Box::new(e)))
}

fn topic_value(topic: &Option<B256>) -> Option<Vec<u8>> {
    topic.map(|t| t.to_vec())
}

pub async fn insert_event(ex: &mut SqliteConnection, event: &Event) -> Result<(), sqlx::Error> {
    const QUERY: &str = "\
        INSERT OR REPLACE INTO event (block_number, event_index, block_id, block_time, tx_id, \
         tx_origin, clause_index, address, topic0, topic1, topic2, topic3, topic4, data) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";
    sqlx::query(QUERY)
        .bind(i64::from(event.block_number))
        .bind(i64::from(event.index))
        .bind(event.block_id.to_vec())
        .bind(stored_int(event.block_time)?)
        .bind(event.tx_id.to_vec())
        .bind(event.tx_origin.to_vec())
        .bind(i64::from(event.clause_index))
        .bind(event.address.to_vec())
        .bind(topic_value(&event.topics[0]))
        .bind(topic_value(&event.topics[1]))
        .bind(topic_value(&event.topics[2]))
        .bind(topic_value(&event.topics[3]))
        .bind(topic_value(&event.topics[4]))
        .bind(event.data.to_vec())
        .execute(ex)
        .await?;
    Ok(())
}

pub async fn insert_transfer(
    ex: &mut SqliteConnection,
    transfer: &Transfer,
) -> Result<(), sqlx::Error> {
    const QUERY: &str = "\
        INSERT OR REPLACE INTO transfer (block_number, transfer_index, block_id, block_time, \
         tx_id, tx_origin, clause_index, sender, recipient, amount) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";
    sqlx::query(QUERY)
        .bind(i64::from(transfer.block_number))
        .bind(i64::from(transfer.index))
        .bind(transfer.block_id.to_vec())
        .bind(stored_int(transfer.block_time)?)
        .bind(transfer.tx_id.to_vec())
        .bind(transfer.tx_origin.to_vec())
        .bind(i64::from(transfer.clause_index))
        .bind(transfer.sender.to_vec())
        .bind(transfer.recipient.to_vec())
        .bind(codec::encode_amount(&transfer.amount))
        .execute(ex)
        .await?;
    Ok(())
}

fn get<'r, T>(row: &'r SqliteRow, column: &str) -> Result<T, LogDbError>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(column)
        .map_err(|e| LogDbError::decode(column, e.to_string()))
}

fn get_u32(row: &SqliteRow, column: &str) -> Result<u32, LogDbError> {
    codec::block_number(column, get::<i64>(row, column)?)
}

pub fn decode_event(row: &SqliteRow) -> Result<Event, LogDbError> {
    const TOPIC_COLUMNS: [&str; TOPIC_SLOTS] = ["topic0", "topic1", "topic2", "topic3", "topic4"];
    let mut topics = [None; TOPIC_SLOTS];
    for (slot, column) in TOPIC_COLUMNS.iter().enumerate() {
        let raw: Option<Vec<u8>> = get(row, column)?;
        topics[slot] = codec::topic(column, raw.as_deref())?;
    }

    Ok(Event {
        block_number: get_u32(row, "block_number")?,
        index: get_u32(row, "event_index")?,
        block_id: codec::hash("block_id", &get::<Vec<u8>>(row, "block_id")?)?,
        block_time: codec::timestamp("block_time", get(row, "block_time")?)?,
        tx_id: codec::hash("tx_id", &get::<Vec<u8>>(row, "tx_id")?)?,
        tx_origin: codec::address("tx_origin", &get::<Vec<u8>>(row, "tx_origin")?)?,
        clause_index: get_u32(row, "clause_index")?,
        address: codec::address("address", &get::<Vec<u8>>(row, "address")?)?,
        topics,
        data: get::<Vec<u8>>(row, "data")?.into(),
    })
}

pub fn decode_transfer(row: &SqliteRow) -> Result<Transfer, LogDbError> {
    Ok(Transfer {
        block_number: get_u32(row, "block_number")?,
        index: get_u32(row, "transfer_index")?,
        block_id: codec::hash("block_id", &get::<Vec<u8>>(row, "block_id")?)?,
        block_time: codec::timestamp("block_time", get(row, "block_time")?)?,
        tx_id: codec::hash("tx_id", &get::<Vec<u8>>(row, "tx_id")?)?,
        tx_origin: codec::address("tx_origin", &get::<Vec<u8>>(row, "tx_origin")?)?,
        clause_index: get_u32(row, "clause_index")?,
        sender: codec::address("sender", &get::<Vec<u8>>(row, "sender")?)?,
        recipient: codec::address("recipient", &get::<Vec<u8>>(row, "recipient")?)?,
        amount: codec::decode_amount(&get::<Vec<u8>>(row, "amount")?),
    })
}
