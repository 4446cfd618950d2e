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

use flamewire_logdb::error::LogDbError;

#[test]
fn construct_errors() {
    let e = LogDbError::Closed;
    assert_eq!(format!("{e}"), "Log store is closed");

    let e = LogDbError::Open {
        location: "sqlite://index.db".into(),
        source: Box::new(sqlx::Error::PoolTimedOut),
    };
    assert!(format!("{e}").contains("Failed to open log store at sqlite://index.db"));

    let e = LogDbError::storage("insert_event", sqlx::Error::RowNotFound);
    assert!(format!("{e}").contains("Storage insert_event failed"));

    let e = LogDbError::decode("tx_origin", "expected 20 bytes, got 3");
    assert_eq!(
        format!("{e}"),
        "Failed to decode column `tx_origin`: expected 20 bytes, got 3"
    );

    let e = LogDbError::invalid_input("block_time", "too large");
    assert_eq!(format!("{e}"), "Cannot store `block_time`: too large");

    let e = LogDbError::invalid_config("path", "bad");
    assert!(format!("{e}").contains("Invalid config for `path`"));

    assert_eq!(format!("{}", LogDbError::Cancelled), "Query cancelled");
    assert_eq!(
        format!("{}", LogDbError::DeadlineExceeded),
        "Query deadline exceeded"
    );
}

#[test]
fn closed_pool_maps_to_closed() {
    let e = LogDbError::storage("query", sqlx::Error::PoolClosed);
    assert!(matches!(e, LogDbError::Closed));
}

#[test]
fn classification() {
    assert!(LogDbError::Cancelled.is_cancellation());
    assert!(LogDbError::DeadlineExceeded.is_cancellation());
    assert!(!LogDbError::Closed.is_cancellation());

    assert!(LogDbError::storage("commit", sqlx::Error::PoolTimedOut).is_retryable());
    let disk = sqlx::Error::Io(std::io::Error::other("disk"));
    assert!(LogDbError::storage("commit", disk).is_retryable());
    assert!(!LogDbError::invalid_input("block_time", "too large").is_retryable());
    assert!(!LogDbError::storage("query", sqlx::Error::RowNotFound).is_retryable());
    assert!(!LogDbError::Closed.is_retryable());
    assert!(!LogDbError::Cancelled.is_retryable());
    assert!(!LogDbError::decode("amount", "x").is_retryable());
}
