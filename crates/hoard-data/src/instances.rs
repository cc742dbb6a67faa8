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


//! Per-key groups of spawned instances.

use hoard_core::{asset::AssetKey, instance::InstanceId};
use std::collections::HashMap;

/// Tracks which live instances were spawned from which key.
///
/// Groups are created on the first registration for a key and removed as soon
/// as they become empty, so `contains(key)` means "has at least one instance".
/// Instances keep their registration order.
#[derive(Debug, Default)]
pub struct InstanceRegistry {
    groups: HashMap<AssetKey, Vec<InstanceId>>,
    instances_per_group: usize,
}

impl InstanceRegistry {
    /// Creates an empty registry.
    ///
    /// # Arguments
    /// * `groups` - Initial number of groups to reserve room for.
    /// * `instances_per_group` - Initial capacity of each new group.
    pub fn with_capacity(groups: usize, instances_per_group: usize) -> Self {
        Self {
            groups: HashMap::with_capacity(groups),
            instances_per_group,
        }
    }

    /// Appends `instance` to the group of `key`, creating the group if needed.
    pub fn register(&mut self, key: AssetKey, instance: InstanceId) {
        let capacity = self.instances_per_group;
        self.groups
            .entry(key)
            .or_insert_with(|| Vec::with_capacity(capacity))
            .push(instance);
    }

    /// Removes `instance` from the group of `key`.
    ///
    /// Returns `false` if the group or the instance is not there, which happens
    /// when the group was already detached for a bulk destroy.
    pub fn deregister(&mut self, key: &AssetKey, instance: InstanceId) -> bool {
        let Some(group) = self.groups.get_mut(key) else {
            return false;
        };
        let Some(index) = group.iter().position(|id| *id == instance) else {
            return false;
        };
        group.remove(index);
        if group.is_empty() {
            self.groups.remove(key);
        }
        true
    }

    /// Detaches the whole group of `key`, in registration order.
    pub fn take_group(&mut self, key: &AssetKey) -> Option<Vec<InstanceId>> {
        self.groups.remove(key)
    }

    /// Checks if `key` has at least one live instance.
    pub fn contains(&self, key: &AssetKey) -> bool {
        self.groups.contains_key(key)
    }

    /// Number of live instances of `key`.
    pub fn count(&self, key: &AssetKey) -> usize {
        self.groups.get(key).map_or(0, Vec::len)
    }

    /// Number of live instances across all keys.
    pub fn total(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// Number of keys with at least one live instance.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// The instances of `key`, in registration order.
    pub fn instances(&self, key: &AssetKey) -> &[InstanceId] {
        self.groups.get(key).map(Vec::as_slice).unwrap_or(&[])
    }
}
