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

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LogDbError {
    #[error("Failed to open log store at {location}: {source}")]
    Open {
        location: String,
        #[source]
        source: Box<sqlx::Error>,
    },

    #[error("Log store is closed")]
    Closed,

    #[error("Storage {operation} failed: {source}")]
    Storage {
        operation: String,
        #[source]
        source: Box<sqlx::Error>,
    },

    #[error("Query cancelled")]
    Cancelled,

    #[error("Query deadline exceeded")]
    DeadlineExceeded,

    #[error("Failed to decode column `{column}`: {message}")]
    Decode { column: String, message: String },

    #[error("Invalid config for `{field}`: {message}")]
    InvalidConfig { field: String, message: String },

    #[error("Cannot store `{field}`: {message}")]
    InvalidInput { field: String, message: String },
}

impl LogDbError {
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn invalid_input(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Wrap a backend failure. A closed pool is reported as [`LogDbError::Closed`].
    pub fn storage(operation: impl Into<String>, err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolClosed => Self::Closed,
            err => Self::Storage {
                operation: operation.into(),
                source: Box::new(err),
            },
        }
    }

    /// Cancellation and deadline errors come from the caller, not the backend.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }

    /// Whether retrying the same operation (with a fresh batch for commits)
    /// can succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Storage { source, .. } => is_transient(source),
            _ => false,
        }
    }
}

const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

fn is_transient(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut => true,
        sqlx::Error::Database(db) => db
            .code()
            .and_then(|code| code.parse::<i32>().ok())
            .map(|code| matches!(code & 0xff, SQLITE_BUSY | SQLITE_LOCKED))
            .unwrap_or(false),
        _ => false,
    }
}
