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


//! Contracts for the external resource-loading engine.
//!
//! The cache never reads files or decodes data itself. It asks a
//! [`ResourceEngine`] to turn a key into a value and tells it when a load is no
//! longer needed. Label queries and key enumeration go through the engine's
//! [`ResourceLocator`]s.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    asset::{AssetType, ErasedAsset, LoadHandle, TypeFilter},
    error::{LoadError, LocateError},
};

/// One physical storage address known to a locator.
///
/// Several logical keys may resolve to the same `internal_id`; loading that
/// location once serves all of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLocation {
    /// The locator's identifier for the physical storage address.
    pub internal_id: String,
    /// The key the engine should be asked to load for this location.
    pub primary_key: String,
    /// The type of value a load of this location produces.
    pub asset_type: AssetType,
}

impl ResourceLocation {
    /// Creates a location description.
    pub fn new(
        internal_id: impl Into<String>,
        primary_key: impl Into<String>,
        asset_type: AssetType,
    ) -> Self {
        Self {
            internal_id: internal_id.into(),
            primary_key: primary_key.into(),
            asset_type,
        }
    }
}

/// Maps keys to the physical locations that back them.
pub trait ResourceLocator: Send + Sync {
    /// Every key this locator knows about, in any textual form.
    ///
    /// Keys that are not valid runtime keys (addresses, labels) may be included;
    /// callers skip them.
    fn keys(&self) -> Vec<String>;

    /// The locations backing `key` whose type passes `filter`.
    fn locate(&self, key: &str, filter: TypeFilter) -> Vec<ResourceLocation>;

    /// The location backing `key`, if there is exactly one.
    ///
    /// Keys that resolve to zero or several locations are ambiguous and yield `None`.
    fn locate_single(&self, key: &str, filter: TypeFilter) -> Option<ResourceLocation> {
        let mut locations = self.locate(key, filter);
        if locations.len() == 1 {
            locations.pop()
        } else {
            None
        }
    }
}

/// The external system that performs the actual loads.
///
/// Implementations are supplied by the host application. The cache guarantees
/// that it issues at most one `load` per logical key at a time, and that it
/// calls `release` at most once per [`LoadHandle`].
#[async_trait]
pub trait ResourceEngine: Send + Sync {
    /// Loads the resource registered under `key`.
    ///
    /// # Arguments
    ///
    /// * `key`: The engine key. For per-key loads this is the hyphenated
    ///   [`AssetKey`](crate::asset::AssetKey); for label batches it is a location's primary key.
    /// * `filter`: Restricts the load to one value type, when the caller asked for one.
    ///
    /// # Returns
    ///
    /// The loaded value, or the reason the load failed.
    async fn load(&self, key: &str, filter: TypeFilter) -> Result<ErasedAsset, LoadError>;

    /// Releases the engine-side resources held for a completed or discarded load.
    fn release(&self, handle: &LoadHandle);

    /// Resolves `label` to the locations tagged with it.
    ///
    /// # Arguments
    ///
    /// * `label`: A non-blank label.
    /// * `filter`: Only locations whose type passes the filter are returned.
    async fn locations_for_label(
        &self,
        label: &str,
        filter: TypeFilter,
    ) -> Result<Vec<ResourceLocation>, LocateError>;

    /// The locators the engine consults, used to enumerate and locate keys.
    fn locators(&self) -> Vec<Arc<dyn ResourceLocator>>;
}
