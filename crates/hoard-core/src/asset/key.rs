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

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AssetError;

/// A globally unique, persistent logical key for a requestable asset.
///
/// The key represents the "idea" of an asset, decoupled from the physical
/// location the engine loads it from. Several keys may alias the same physical
/// location; the cache still tracks each key individually.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetKey(Uuid);

impl AssetKey {
    /// Creates a new, random (version 4) `AssetKey`.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a deterministic (version 5) key from a source path.
    pub fn new_v5(path: &str) -> Self {
        Self(Uuid::new_v5(&Uuid::NAMESPACE_URL, path.as_bytes()))
    }

    /// Wraps an existing UUID.
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parses a textual GUID (hyphenated, simple, braced or urn form).
    pub fn parse(raw: &str) -> Result<Self, AssetError> {
        Uuid::parse_str(raw.trim())
            .map(Self)
            .map_err(|_| AssetError::InvalidKey {
                key: raw.to_string(),
            })
    }

    /// Returns the underlying UUID.
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for AssetKey {
    /// Creates a new, random (version 4) `AssetKey`.
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// A serializable reference to an asset, as stored in scenes and data files.
///
/// The runtime key is kept as raw text so that a malformed reference can be
/// carried around and only rejected when it is actually used.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetReference {
    runtime_key: String,
}

impl AssetReference {
    /// Creates a reference from its raw runtime key text.
    pub fn new(runtime_key: impl Into<String>) -> Self {
        Self {
            runtime_key: runtime_key.into(),
        }
    }

    /// Returns the raw runtime key text.
    pub fn raw_key(&self) -> &str {
        &self.runtime_key
    }

    /// Returns `true` if the runtime key parses as an [`AssetKey`].
    pub fn runtime_key_is_valid(&self) -> bool {
        AssetKey::parse(&self.runtime_key).is_ok()
    }
}

impl From<AssetKey> for AssetReference {
    fn from(key: AssetKey) -> Self {
        Self::new(key.to_string())
    }
}

impl fmt::Display for AssetReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.runtime_key)
    }
}

/// Anything that can be turned into a validated [`AssetKey`].
///
/// Every cache entry point accepts a `RuntimeKey`, so an invalid key is
/// rejected with [`AssetError::InvalidKey`] before any cache state is touched.
pub trait RuntimeKey {
    /// Validates and returns the logical key.
    fn runtime_key(&self) -> Result<AssetKey, AssetError>;
}

impl RuntimeKey for AssetKey {
    fn runtime_key(&self) -> Result<AssetKey, AssetError> {
        Ok(*self)
    }
}

impl RuntimeKey for AssetReference {
    fn runtime_key(&self) -> Result<AssetKey, AssetError> {
        AssetKey::parse(&self.runtime_key)
    }
}

impl RuntimeKey for str {
    fn runtime_key(&self) -> Result<AssetKey, AssetError> {
        AssetKey::parse(self)
    }
}

impl RuntimeKey for String {
    fn runtime_key(&self) -> Result<AssetKey, AssetError> {
        AssetKey::parse(self)
    }
}
