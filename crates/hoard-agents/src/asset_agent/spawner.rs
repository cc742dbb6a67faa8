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


//! Spawning instances of loaded assets and tracking them by key.

use hoard_core::{
    asset::{AssetKey, ErasedAsset, RuntimeKey, TypeFilter},
    instance::{InstanceId, Placement},
    AssetError,
};

use super::cache::{AssetCache, Resolve};

/// Spawns instances through the cache's substrate and keeps them grouped by key.
///
/// Every instance is registered in its key's group and tagged with a tracker,
/// so it leaves the group however it is destroyed: by
/// [`destroy_all_instances`](Self::destroy_all_instances), by an unload of its
/// key, or by the host tearing it down.
#[derive(Debug, Clone)]
pub struct InstanceSpawner {
    cache: AssetCache,
}

impl InstanceSpawner {
    /// Creates a spawner sharing `cache`'s state and substrate.
    pub fn new(cache: AssetCache) -> Self {
        Self { cache }
    }

    /// The cache this spawner feeds.
    pub fn cache(&self) -> &AssetCache {
        &self.cache
    }

    /// Spawns one instance of an already loaded `asset` and files it under `key`.
    ///
    /// # Errors
    ///
    /// [`AssetError::SpawnFailed`] if the substrate produced nothing; no group
    /// is created in that case.
    pub fn spawn(
        &self,
        key: &(impl RuntimeKey + ?Sized),
        asset: &ErasedAsset,
        placement: &Placement,
    ) -> Result<InstanceId, AssetError> {
        let key = key.runtime_key()?;
        self.cache.shared().spawn_instance(key, asset, placement)
    }

    /// Resolves `key` and spawns one instance of it.
    pub async fn instantiate(
        &self,
        key: &(impl RuntimeKey + ?Sized),
        placement: &Placement,
    ) -> Result<InstanceId, AssetError> {
        let key = key.runtime_key()?;
        let asset = self.resolve_for_spawn(key).await?;
        self.cache.shared().spawn_instance(key, &asset, placement)
    }

    /// Resolves `key` once and spawns `count` instances of it.
    ///
    /// At most one engine load is issued, none if the key is already loaded.
    /// If a spawn fails, the instances spawned before it stay registered.
    pub async fn instantiate_multi(
        &self,
        key: &(impl RuntimeKey + ?Sized),
        count: usize,
        placement: &Placement,
    ) -> Result<Vec<InstanceId>, AssetError> {
        let key = key.runtime_key()?;
        if count == 0 {
            return Ok(Vec::new());
        }
        let asset = self.resolve_for_spawn(key).await?;
        self.spawn_many(key, &asset, count, placement)
    }

    /// Spawns one instance if `key` is already loaded; `Ok(None)` otherwise.
    pub fn try_instantiate_sync(
        &self,
        key: &(impl RuntimeKey + ?Sized),
        placement: &Placement,
    ) -> Result<Option<InstanceId>, AssetError> {
        let key = key.runtime_key()?;
        match self.cache.resolve_sync(&key)? {
            Some(asset) => self
                .cache
                .shared()
                .spawn_instance(key, &asset, placement)
                .map(Some),
            None => Ok(None),
        }
    }

    /// Spawns `count` instances if `key` is already loaded; `Ok(None)` otherwise.
    pub fn try_instantiate_multi_sync(
        &self,
        key: &(impl RuntimeKey + ?Sized),
        count: usize,
        placement: &Placement,
    ) -> Result<Option<Vec<InstanceId>>, AssetError> {
        let key = key.runtime_key()?;
        match self.cache.resolve_sync(&key)? {
            Some(asset) => self.spawn_many(key, &asset, count, placement).map(Some),
            None => Ok(None),
        }
    }

    /// Destroys every live instance of `key`. See [`AssetCache::destroy_all_instances`].
    pub fn destroy_all_instances(
        &self,
        key: &(impl RuntimeKey + ?Sized),
    ) -> Result<usize, AssetError> {
        self.cache.destroy_all_instances(key)
    }

    fn spawn_many(
        &self,
        key: AssetKey,
        asset: &ErasedAsset,
        count: usize,
        placement: &Placement,
    ) -> Result<Vec<InstanceId>, AssetError> {
        let shared = self.cache.shared();
        (0..count)
            .map(|_| shared.spawn_instance(key, asset, placement))
            .collect()
    }

    async fn resolve_for_spawn(&self, key: AssetKey) -> Result<ErasedAsset, AssetError> {
        match self.cache.resolve_key(key, TypeFilter::any()) {
            Resolve::Resolved(asset) => Ok(asset),
            Resolve::Attached(handle) | Resolve::Started(handle) => {
                let asset = handle.wait().await?;
                // Unloaded while we were waiting.
                if !self.cache.shared().is_tracked(&key) {
                    log::warn!("'{key}' was unloaded before it could be instantiated.");
                    return Err(AssetError::Untracked { key });
                }
                Ok(asset)
            }
        }
    }
}
