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

use crate::error::LogDbError;
use std::fmt;
use std::path::{Path, PathBuf};

/// Where a log store keeps its data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreLocation {
    File(PathBuf),
    /// Ephemeral database, dropped with the store.
    Memory,
}

impl StoreLocation {
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::File(path) => Some(path),
            Self::Memory => None,
        }
    }

    pub fn is_memory(&self) -> bool {
        matches!(self, Self::Memory)
    }
}

impl fmt::Display for StoreLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "sqlite://{}", path.display()),
            Self::Memory => f.write_str("sqlite::memory:"),
        }
    }
}

/// Validated SQLite database URL
#[derive(Clone, Debug)]
pub struct SqliteUrl(StoreLocation);

impl SqliteUrl {
    /// Accepts `sqlite://<path>`, `sqlite::memory:` and `sqlite://:memory:`.
    pub fn parse(input: &str) -> Result<Self, LogDbError> {
        let input = input.trim();
        if input == "sqlite::memory:" {
            return Ok(Self(StoreLocation::Memory));
        }
        let Some(path) = input.strip_prefix("sqlite://") else {
            return Err(LogDbError::invalid_config(
                "database_url",
                "must start with sqlite://",
            ));
        };
        match path {
            "" => Err(LogDbError::invalid_config(
                "database_url",
                "path cannot be empty",
            )),
            ":memory:" => Ok(Self(StoreLocation::Memory)),
            path => Ok(Self(StoreLocation::File(PathBuf::from(path)))),
        }
    }

    pub fn location(&self) -> &StoreLocation {
        &self.0
    }

    pub fn into_location(self) -> StoreLocation {
        self.0
    }
}

impl fmt::Display for SqliteUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
