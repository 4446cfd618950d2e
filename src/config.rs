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
use crate::validated_types::{SqliteUrl, StoreLocation};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_MAX_CONNECTIONS: u32 = 4;
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for a [`LogStore`](crate::store::LogStore).
#[derive(Clone, Debug)]
pub struct StoreConfig {
    pub location: StoreLocation,
    /// Pool size for file stores. In-memory stores always use one connection.
    pub max_connections: u32,
    pub busy_timeout: Duration,
}

impl StoreConfig {
    /// Create a new [`StoreConfigBuilder`].
    pub fn builder() -> StoreConfigBuilder {
        StoreConfigBuilder::new()
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            location: StoreLocation::File(path.into()),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    pub fn in_memory() -> Self {
        Self {
            location: StoreLocation::Memory,
            max_connections: 1,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    /// Validate this configuration.
    pub fn validate(&self) -> Result<(), LogDbError> {
        if let StoreLocation::File(path) = &self.location {
            if path.as_os_str().is_empty() {
                return Err(LogDbError::invalid_config("path", "cannot be empty"));
            }
        }

        if self.max_connections == 0 {
            return Err(LogDbError::invalid_config(
                "max_connections",
                "must be at least 1",
            ));
        }

        Ok(())
    }

    /// Connections the pool is allowed to open.
    pub fn pool_size(&self) -> u32 {
        if self.location.is_memory() {
            1
        } else {
            self.max_connections
        }
    }
}

/// Builder pattern for [`StoreConfig`].
pub struct StoreConfigBuilder {
    database_url: Option<String>,
    location: Option<StoreLocation>,
    max_connections: u32,
    busy_timeout: Duration,
}

impl Default for StoreConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreConfigBuilder {
    /// Create a new builder with default values.
    pub fn new() -> Self {
        Self {
            database_url: None,
            location: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    /// Use a `sqlite://` URL. Takes precedence over [`Self::path`].
    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    /// Store the index in a file, creating it if missing.
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.location = Some(StoreLocation::File(path.into()));
        self
    }

    /// Keep the index in memory only.
    pub fn in_memory(mut self) -> Self {
        self.location = Some(StoreLocation::Memory);
        self
    }

    pub fn max_connections(mut self, value: u32) -> Self {
        self.max_connections = value;
        self
    }

    pub fn busy_timeout(mut self, value: Duration) -> Self {
        self.busy_timeout = value;
        self
    }

    /// Build the configuration and validate it.
    pub fn build(self) -> Result<StoreConfig, LogDbError> {
        let location = match (self.database_url, self.location) {
            (Some(url), _) => SqliteUrl::parse(&url)?.into_location(),
            (None, Some(location)) => location,
            (None, None) => {
                return Err(LogDbError::invalid_config("location", "missing"));
            }
        };
        let config = StoreConfig {
            location,
            max_connections: self.max_connections,
            busy_timeout: self.busy_timeout,
        };
        config.validate()?;
        Ok(config)
    }
}
