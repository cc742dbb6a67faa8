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

//! Defines the hierarchy of error types for the asset cache.
//!
//! Only hard failures are represented here. Soft failures (unloading an unknown
//! key, destroying instances of a key that has none, a label that matches
//! nothing) are logged by the cache and reported through neutral return values.

use crate::asset::AssetKey;
use thiserror::Error;

/// A loaded value could not be viewed as the requested type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Cannot convert asset of type '{found}' to '{expected}'")]
pub struct ConversionError {
    /// The type the caller asked for.
    pub expected: &'static str,
    /// The type actually stored.
    pub found: &'static str,
}

/// A failure reported by the resource engine for one load.
///
/// Cloned to every caller awaiting the same load.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// The engine has no resource for the key.
    #[error("No resource found for key '{key}'")]
    NotFound {
        /// The engine key that was requested.
        key: String,
    },
    /// The engine found the resource but failed to load it.
    #[error("Engine failed to load '{key}': {message}")]
    Engine {
        /// The engine key that was requested.
        key: String,
        /// Engine-provided details.
        message: String,
    },
    /// The load was dropped before delivering a result.
    #[error("Load of '{key}' was abandoned before completing")]
    Abandoned {
        /// The engine key that was requested.
        key: String,
    },
}

/// The engine could not resolve a label to resource locations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Cannot resolve locations for label '{label}': {message}")]
pub struct LocateError {
    /// The label that was queried.
    pub label: String,
    /// Engine-provided details.
    pub message: String,
}

/// Errors surfaced by asset cache operations.
#[derive(Debug, Clone, Error)]
pub enum AssetError {
    /// The supplied key is not a well-formed runtime key.
    #[error("Runtime key '{key}' is not valid")]
    InvalidKey {
        /// The raw key text.
        key: String,
    },
    /// A loaded value is not of the requested type and no fallback applies.
    #[error(transparent)]
    Conversion(#[from] ConversionError),
    /// The instance substrate returned no instance.
    #[error("Instantiating asset '{key}' produced no instance")]
    SpawnFailed {
        /// The key of the asset being instantiated.
        key: AssetKey,
    },
    /// The awaited load failed.
    #[error(transparent)]
    Load(#[from] LoadError),
    /// The key was unloaded while a spawn request was waiting on it.
    #[error("Asset '{key}' was unloaded before it could be instantiated")]
    Untracked {
        /// The key of the asset being instantiated.
        key: AssetKey,
    },
    /// The cache was constructed outside of a Tokio runtime.
    #[error("The asset cache requires a Tokio runtime to drive engine loads")]
    NoRuntime,
}
