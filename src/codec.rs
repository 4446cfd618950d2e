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

//! Column encodings shared by the write and read paths.
//!
//! Addresses and hashes are stored as blobs of their exact width, amounts as
//! minimal big-endian bytes and the marker as a 4-byte big-endian integer.

use crate::error::LogDbError;
use crate::types::{Address, BigUint, BlockNumber, B256};
use alloy_primitives::FixedBytes;

pub fn fixed<const N: usize>(column: &str, bytes: &[u8]) -> Result<FixedBytes<N>, LogDbError> {
    FixedBytes::<N>::try_from(bytes).map_err(|_| {
        LogDbError::decode(column, format!("expected {N} bytes, got {}", bytes.len()))
    })
}

pub fn address(column: &str, bytes: &[u8]) -> Result<Address, LogDbError> {
    fixed::<20>(column, bytes).map(Address::from)
}

pub fn hash(column: &str, bytes: &[u8]) -> Result<B256, LogDbError> {
    fixed::<32>(column, bytes)
}

/// Absent slots are stored as NULL, never as a zero hash.
pub fn topic(column: &str, bytes: Option<&[u8]>) -> Result<Option<B256>, LogDbError> {
    bytes.map(|b| hash(column, b)).transpose()
}

pub fn encode_amount(amount: &BigUint) -> Vec<u8> {
    if amount.bits() == 0 {
        Vec::new()
    } else {
        amount.to_bytes_be()
    }
}

pub fn decode_amount(bytes: &[u8]) -> BigUint {
    BigUint::from_bytes_be(bytes)
}

pub fn encode_marker(number: BlockNumber) -> [u8; 4] {
    number.to_be_bytes()
}

pub fn decode_marker(bytes: &[u8]) -> Result<BlockNumber, LogDbError> {
    let raw: [u8; 4] = bytes.try_into().map_err(|_| {
        LogDbError::decode("config.value", format!("expected 4 bytes, got {}", bytes.len()))
    })?;
    Ok(BlockNumber::from_be_bytes(raw))
}

/// SQLite integers are signed 64-bit; larger unsigned values saturate.
/// Only for the query side, never for stored values.
pub fn to_sql_int(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Stored integers must round-trip, so values past `i64::MAX` are rejected.
pub fn sql_int(column: &str, value: u64) -> Result<i64, LogDbError> {
    i64::try_from(value).map_err(|_| {
        LogDbError::invalid_input(column, format!("{value} exceeds the SQLite integer range"))
    })
}

/// In-block sequence index for the record appended at `position`.
pub fn sequence_index(column: &str, position: usize) -> Result<u32, LogDbError> {
    u32::try_from(position).map_err(|_| {
        LogDbError::invalid_input(column, format!("position {position} does not fit in u32"))
    })
}

pub fn block_number(column: &str, value: i64) -> Result<BlockNumber, LogDbError> {
    BlockNumber::try_from(value)
        .map_err(|_| LogDbError::decode(column, format!("{value} out of range for u32")))
}

pub fn timestamp(column: &str, value: i64) -> Result<u64, LogDbError> {
    u64::try_from(value).map_err(|_| LogDbError::decode(column, format!("negative value {value}")))
}
