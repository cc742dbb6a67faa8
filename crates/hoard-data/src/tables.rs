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


//! Key to load-handle tables for loads in flight and loads completed.

use hoard_core::asset::{AssetKey, LoadHandle, LoadId};
use std::collections::{hash_map, HashMap};

/// Keys whose engine load has been issued but has not completed.
///
/// Every caller that asks for one of these keys attaches to the stored handle
/// instead of issuing another load.
#[derive(Debug, Default)]
pub struct PendingRequestTable {
    entries: HashMap<AssetKey, LoadHandle>,
}

impl PendingRequestTable {
    /// Creates an empty table with room for `capacity` keys.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
        }
    }

    /// The in-flight load for `key`, if any.
    pub fn get(&self, key: &AssetKey) -> Option<&LoadHandle> {
        self.entries.get(key)
    }

    /// Checks if `key` has a load in flight.
    pub fn contains(&self, key: &AssetKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of keys loading.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is loading.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the keys and their in-flight loads.
    pub fn iter(&self) -> hash_map::Iter<'_, AssetKey, LoadHandle> {
        self.entries.iter()
    }

    fn insert(&mut self, key: AssetKey, handle: LoadHandle) {
        self.entries.insert(key, handle);
    }

    fn remove(&mut self, key: &AssetKey) -> Option<LoadHandle> {
        self.entries.remove(key)
    }

    fn is_load(&self, key: &AssetKey, load: LoadId) -> bool {
        self.entries.get(key).is_some_and(|h| h.id() == load)
    }
}

/// Keys whose load completed successfully and has not been unloaded.
#[derive(Debug, Default)]
pub struct ResolvedAssetTable {
    entries: HashMap<AssetKey, LoadHandle>,
}

impl ResolvedAssetTable {
    /// Creates an empty table with room for `capacity` keys.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
        }
    }

    /// The completed load for `key`, if any.
    pub fn get(&self, key: &AssetKey) -> Option<&LoadHandle> {
        self.entries.get(key)
    }

    /// Checks if `key` is loaded.
    pub fn contains(&self, key: &AssetKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of keys loaded.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is loaded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the keys and their completed loads.
    pub fn iter(&self) -> hash_map::Iter<'_, AssetKey, LoadHandle> {
        self.entries.iter()
    }

    fn insert(&mut self, key: AssetKey, handle: LoadHandle) {
        self.entries.insert(key, handle);
    }

    fn remove(&mut self, key: &AssetKey) -> Option<LoadHandle> {
        self.entries.remove(key)
    }
}

/// Where a key currently stands.
#[derive(Debug, Clone)]
pub enum EntryState {
    /// The key has a load in flight.
    Loading(LoadHandle),
    /// The key is loaded.
    Loaded(LoadHandle),
}

impl EntryState {
    /// The handle backing the key, in either state.
    pub fn handle(&self) -> &LoadHandle {
        match self {
            EntryState::Loading(handle) | EntryState::Loaded(handle) => handle,
        }
    }
}

/// An entry removed by [`AssetTables::remove`].
#[derive(Debug, Clone)]
pub enum Removed {
    /// The key was still loading.
    Pending(LoadHandle),
    /// The key was loaded.
    Resolved(LoadHandle),
}

impl Removed {
    /// The handle that backed the removed entry.
    pub fn handle(&self) -> &LoadHandle {
        match self {
            Removed::Pending(handle) | Removed::Resolved(handle) => handle,
        }
    }

    /// Consumes the entry, returning its handle.
    pub fn into_handle(self) -> LoadHandle {
        match self {
            Removed::Pending(handle) | Removed::Resolved(handle) => handle,
        }
    }
}

/// The pending and resolved tables, kept mutually exclusive.
///
/// A key is in at most one of the two tables at any time; every mutation goes
/// through this type so the invariant cannot be broken from outside.
#[derive(Debug, Default)]
pub struct AssetTables {
    pending: PendingRequestTable,
    resolved: ResolvedAssetTable,
    /// Number of entries, across both tables, backed by each load.
    refs: HashMap<LoadId, usize>,
}

impl AssetTables {
    /// Creates empty tables with the given initial capacities.
    pub fn with_capacity(loading: usize, loaded: usize) -> Self {
        Self {
            pending: PendingRequestTable::with_capacity(loading),
            resolved: ResolvedAssetTable::with_capacity(loaded),
            refs: HashMap::with_capacity(loading + loaded),
        }
    }

    /// The pending request table.
    pub fn pending(&self) -> &PendingRequestTable {
        &self.pending
    }

    /// The resolved asset table.
    pub fn resolved(&self) -> &ResolvedAssetTable {
        &self.resolved
    }

    /// Where `key` stands, resolved first.
    pub fn state_of(&self, key: &AssetKey) -> Option<EntryState> {
        if let Some(handle) = self.resolved.get(key) {
            return Some(EntryState::Loaded(handle.clone()));
        }
        self.pending
            .get(key)
            .map(|handle| EntryState::Loading(handle.clone()))
    }

    /// Records a freshly issued load for `key`.
    ///
    /// Refuses (returns `false`) if the key is already loading or loaded.
    pub fn begin_load(&mut self, key: AssetKey, handle: LoadHandle) -> bool {
        if self.contains(&key) {
            return false;
        }
        log::trace!("'{key}' is now loading as {}.", handle.id());
        self.retain(handle.id());
        self.pending.insert(key, handle);
        true
    }

    /// Attaches `key` to a load issued for another key sharing its location.
    ///
    /// Same contract as [`begin_load`](Self::begin_load); the distinction only
    /// shows up in the logs.
    pub fn attach_pending(&mut self, key: AssetKey, handle: LoadHandle) -> bool {
        if self.contains(&key) {
            return false;
        }
        log::trace!("'{key}' attached to shared {}.", handle.id());
        self.retain(handle.id());
        self.pending.insert(key, handle);
        true
    }

    /// Moves `key` from pending to resolved, if its pending entry is `load`.
    ///
    /// Returns `false` when the entry was unloaded or replaced in the meantime.
    pub fn promote(&mut self, key: &AssetKey, load: LoadId) -> bool {
        if !self.pending.is_load(key, load) {
            return false;
        }
        match self.pending.remove(key) {
            Some(handle) => {
                self.resolved.insert(*key, handle);
                true
            }
            None => false,
        }
    }

    /// Drops the pending entry of `key`, if it is `load`.
    pub fn abandon(&mut self, key: &AssetKey, load: LoadId) -> bool {
        if !self.pending.is_load(key, load) {
            return false;
        }
        match self.pending.remove(key) {
            Some(handle) => {
                self.release(handle.id());
                true
            }
            None => false,
        }
    }

    /// Removes `key` from whichever table holds it, pending first.
    pub fn remove(&mut self, key: &AssetKey) -> Option<Removed> {
        let removed = match self.pending.remove(key) {
            Some(handle) => Removed::Pending(handle),
            None => Removed::Resolved(self.resolved.remove(key)?),
        };
        self.release(removed.handle().id());
        Some(removed)
    }

    /// Returns `true` if any entry in either table is backed by `load`.
    pub fn references(&self, load: LoadId) -> bool {
        self.refs.contains_key(&load)
    }

    /// Number of entries, across both tables, backed by `load`.
    pub fn reference_count(&self, load: LoadId) -> usize {
        self.refs.get(&load).copied().unwrap_or(0)
    }

    fn retain(&mut self, load: LoadId) {
        *self.refs.entry(load).or_insert(0) += 1;
    }

    fn release(&mut self, load: LoadId) {
        if let hash_map::Entry::Occupied(mut count) = self.refs.entry(load) {
            *count.get_mut() -= 1;
            if *count.get() == 0 {
                count.remove();
            }
        }
    }

    /// Checks if `key` is loading or loaded.
    pub fn contains(&self, key: &AssetKey) -> bool {
        self.pending.contains(key) || self.resolved.contains(key)
    }

    /// Checks if `key` is loaded.
    pub fn is_loaded(&self, key: &AssetKey) -> bool {
        self.resolved.contains(key)
    }

    /// Checks if `key` is loading.
    pub fn is_loading(&self, key: &AssetKey) -> bool {
        self.pending.contains(key)
    }

    /// Number of loaded keys.
    pub fn loaded_count(&self) -> usize {
        self.resolved.len()
    }

    /// Number of loading keys.
    pub fn loading_count(&self) -> usize {
        self.pending.len()
    }

    /// Snapshot of every loaded key and its handle.
    pub fn loaded_handles(&self) -> Vec<(AssetKey, LoadHandle)> {
        self.resolved
            .iter()
            .map(|(key, handle)| (*key, handle.clone()))
            .collect()
    }
}
