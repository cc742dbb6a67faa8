// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


//! Tunables for the asset cache.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Sizing hints and behaviour switches for the asset cache.
///
/// Every field has a default, so a configuration file only needs to list the
/// values it overrides:
///
/// ```
/// use hoard_core::CacheConfig;
///
/// let config = CacheConfig::from_toml_str("loaded_capacity = 512").unwrap();
/// assert_eq!(config.loaded_capacity, 512);
/// assert_eq!(config.loading_capacity, 20);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Initial capacity of the pending request table.
    pub loading_capacity: usize,
    /// Initial capacity of the resolved asset table.
    pub loaded_capacity: usize,
    /// Initial number of instance groups.
    pub instance_group_capacity: usize,
    /// Initial capacity of each new instance group.
    pub instances_per_group: usize,
    /// Log a warning when unloading or destroying instances of a key the cache does not know.
    pub warn_on_unknown_unload: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            loading_capacity: 20,
            loaded_capacity: 100,
            instance_group_capacity: 10,
            instances_per_group: 20,
            warn_on_unknown_unload: true,
        }
    }
}

impl CacheConfig {
    /// Parses a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse asset cache configuration")
    }

    /// Loads the configuration at `path`.
    ///
    /// A missing file is not an error: the defaults are returned instead.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!(
                "No asset cache configuration at '{}'. Using defaults.",
                path.display()
            );
            return Ok(Self::default());
        }

        log::info!("Loading asset cache configuration from '{}'.", path.display());
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file at '{}'", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("Failed to parse TOML from '{}'", path.display()))
    }
}
