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


//! Contracts for the substrate that hosts spawned asset instances.
//!
//! The cache knows nothing about scenes or transforms. It asks an
//! [`InstanceSubstrate`] to spawn and destroy instances, and attaches an
//! [`InstanceTracker`] to each one so that the substrate can report
//! destructions the cache did not initiate.

use std::{
    fmt,
    sync::{Arc, Weak},
};

use crate::asset::{AssetKey, ErasedAsset};

/// Identifies one live instance inside the substrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub u64);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "instance#{}", self.0)
    }
}

/// Where a new instance is placed. Opaque to the cache.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// World or parent-relative position.
    pub position: [f32; 3],
    /// Rotation quaternion, `[x, y, z, w]`.
    pub rotation: [f32; 4],
    /// Optional parent instance.
    pub parent: Option<InstanceId>,
}

impl Placement {
    /// The identity placement with no parent.
    pub const IDENTITY: Self = Self {
        position: [0.0; 3],
        rotation: [0.0, 0.0, 0.0, 1.0],
        parent: None,
    };

    /// An unparented placement at `position` with no rotation.
    pub fn at(position: [f32; 3]) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    /// Returns the same placement attached to `parent`.
    pub fn with_parent(mut self, parent: InstanceId) -> Self {
        self.parent = Some(parent);
        self
    }
}

impl Default for Placement {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Receives destruction notifications from trackers.
pub trait InstanceObserver: Send + Sync {
    /// Called once when `instance`, spawned for `key`, is destroyed.
    fn on_instance_destroyed(&self, key: AssetKey, instance: InstanceId);
}

/// Tags a spawned instance with the key it was created from.
///
/// The substrate stores the tracker alongside the instance and calls
/// [`InstanceTracker::notify_destroyed`] when the instance goes away, whoever
/// destroyed it. The tracker only holds a weak reference to its observer, so
/// instances outliving the cache are harmless.
#[derive(Clone)]
pub struct InstanceTracker {
    key: AssetKey,
    instance: InstanceId,
    observer: Weak<dyn InstanceObserver>,
}

impl InstanceTracker {
    /// Creates a tracker reporting to `observer`.
    pub fn new(key: AssetKey, instance: InstanceId, observer: &Arc<dyn InstanceObserver>) -> Self {
        Self {
            key,
            instance,
            observer: Arc::downgrade(observer),
        }
    }

    /// The key the instance was spawned from.
    pub fn key(&self) -> AssetKey {
        self.key
    }

    /// The tracked instance.
    pub fn instance(&self) -> InstanceId {
        self.instance
    }

    /// Reports the destruction of the tracked instance.
    pub fn notify_destroyed(&self) {
        match self.observer.upgrade() {
            Some(observer) => observer.on_instance_destroyed(self.key, self.instance),
            None => log::trace!(
                "Instance {} of '{}' destroyed after its cache was dropped.",
                self.instance,
                self.key
            ),
        }
    }
}

impl fmt::Debug for InstanceTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceTracker")
            .field("key", &self.key)
            .field("instance", &self.instance)
            .finish_non_exhaustive()
    }
}

/// The host-side system that owns spawned instances.
///
/// All methods are called without any cache lock held; `destroy` may call back
/// into the cache synchronously through the instance's tracker.
pub trait InstanceSubstrate: Send + Sync {
    /// Creates one instance of `asset`. Returns `None` if the asset cannot be instantiated.
    fn spawn(&self, asset: &ErasedAsset, placement: &Placement) -> Option<InstanceId>;

    /// Stores `tracker` with its instance so the destruction can be reported later.
    fn attach_tracker(&self, tracker: InstanceTracker);

    /// Destroys `instance`, firing its tracker if one is attached.
    fn destroy(&self, instance: InstanceId);
}
