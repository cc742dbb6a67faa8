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


//! In-memory engine and substrate used by the integration tests.

#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use hoard_agents::AssetCache;
use hoard_core::{
    asset::{Asset, AssetType, ErasedAsset, LoadHandle, LoadId, TypeFilter},
    engine::{ResourceEngine, ResourceLocation, ResourceLocator},
    instance::{InstanceId, InstanceSubstrate, InstanceTracker, Placement},
    CacheConfig, LoadError, LocateError,
};
use tokio::sync::Semaphore;

#[derive(Debug, PartialEq)]
pub struct Prefab {
    pub name: &'static str,
}
impl Asset for Prefab {}

#[derive(Debug, PartialEq)]
pub struct Texture {
    pub width: u32,
}
impl Asset for Texture {}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Polls `condition` until it holds or a second has passed.
pub async fn eventually(condition: impl Fn() -> bool) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}

#[derive(Default)]
pub struct FakeLocator {
    entries: Mutex<Vec<(String, ResourceLocation)>>,
}

impl FakeLocator {
    pub fn map(&self, key: impl Into<String>, location: ResourceLocation) {
        self.entries.lock().unwrap().push((key.into(), location));
    }
}

impl ResourceLocator for FakeLocator {
    fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = Vec::new();
        for (key, _) in self.entries.lock().unwrap().iter() {
            if !keys.contains(key) {
                keys.push(key.clone());
            }
        }
        keys
    }

    fn locate(&self, key: &str, filter: TypeFilter) -> Vec<ResourceLocation> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, loc)| k == key && filter.accepts(&loc.asset_type))
            .map(|(_, loc)| loc.clone())
            .collect()
    }
}

/// A resource engine serving values from memory.
///
/// Loads of a gated key block until [`FakeEngine::open`] is called for it.
#[derive(Default)]
pub struct FakeEngine {
    values: Mutex<HashMap<String, ErasedAsset>>,
    gates: Mutex<HashMap<String, Arc<Semaphore>>>,
    labels: Mutex<HashMap<String, Vec<ResourceLocation>>>,
    broken_labels: Mutex<HashSet<String>>,
    loads: Mutex<Vec<String>>,
    releases: Mutex<Vec<LoadId>>,
    pub locator: Arc<FakeLocator>,
}

impl FakeEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn insert<T: Asset>(&self, engine_key: impl Into<String>, value: T) {
        self.values
            .lock()
            .unwrap()
            .insert(engine_key.into(), ErasedAsset::new(value));
    }

    pub fn gate(&self, engine_key: impl Into<String>) {
        self.gates
            .lock()
            .unwrap()
            .insert(engine_key.into(), Arc::new(Semaphore::new(0)));
    }

    pub fn open(&self, engine_key: &str) {
        if let Some(gate) = self.gates.lock().unwrap().get(engine_key) {
            gate.add_permits(1024);
        }
    }

    /// Tags a location with `label`. Each call lists the location once more.
    pub fn tag(&self, label: &str, location: ResourceLocation) {
        self.labels
            .lock()
            .unwrap()
            .entry(label.to_string())
            .or_default()
            .push(location);
    }

    pub fn break_label(&self, label: &str) {
        self.broken_labels.lock().unwrap().insert(label.to_string());
    }

    pub fn loads(&self) -> Vec<String> {
        self.loads.lock().unwrap().clone()
    }

    pub fn load_count(&self) -> usize {
        self.loads.lock().unwrap().len()
    }

    pub fn releases(&self) -> Vec<LoadId> {
        self.releases.lock().unwrap().clone()
    }

    pub fn release_count(&self) -> usize {
        self.releases.lock().unwrap().len()
    }
}

#[async_trait]
impl ResourceEngine for FakeEngine {
    async fn load(&self, key: &str, filter: TypeFilter) -> Result<ErasedAsset, LoadError> {
        self.loads.lock().unwrap().push(key.to_string());

        let gate = self.gates.lock().unwrap().get(key).cloned();
        if let Some(gate) = gate {
            let _permit = gate.acquire().await.map_err(|e| LoadError::Engine {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        }

        let value = self.values.lock().unwrap().get(key).cloned();
        match value {
            Some(asset) if filter.accepts(&asset.asset_type()) => Ok(asset),
            _ => Err(LoadError::NotFound {
                key: key.to_string(),
            }),
        }
    }

    fn release(&self, handle: &LoadHandle) {
        self.releases.lock().unwrap().push(handle.id());
    }

    async fn locations_for_label(
        &self,
        label: &str,
        filter: TypeFilter,
    ) -> Result<Vec<ResourceLocation>, LocateError> {
        if self.broken_labels.lock().unwrap().contains(label) {
            return Err(LocateError {
                label: label.to_string(),
                message: "catalog unavailable".to_string(),
            });
        }
        Ok(self
            .labels
            .lock()
            .unwrap()
            .get(label)
            .map(|locations| {
                locations
                    .iter()
                    .filter(|loc| filter.accepts(&loc.asset_type))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn locators(&self) -> Vec<Arc<dyn ResourceLocator>> {
        vec![self.locator.clone() as Arc<dyn ResourceLocator>]
    }
}

/// A substrate that keeps instances in a list and fires trackers synchronously.
#[derive(Default)]
pub struct FakeSubstrate {
    next_id: AtomicU64,
    live: Mutex<Vec<InstanceId>>,
    trackers: Mutex<HashMap<InstanceId, InstanceTracker>>,
    destroyed: Mutex<Vec<InstanceId>>,
    refuse: AtomicBool,
}

impl FakeSubstrate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn refuse_spawns(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }

    pub fn live(&self) -> Vec<InstanceId> {
        self.live.lock().unwrap().clone()
    }

    pub fn destroyed(&self) -> Vec<InstanceId> {
        self.destroyed.lock().unwrap().clone()
    }
}

impl InstanceSubstrate for FakeSubstrate {
    fn spawn(&self, _asset: &ErasedAsset, _placement: &Placement) -> Option<InstanceId> {
        if self.refuse.load(Ordering::SeqCst) {
            return None;
        }
        let id = InstanceId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.live.lock().unwrap().push(id);
        Some(id)
    }

    fn attach_tracker(&self, tracker: InstanceTracker) {
        self.trackers
            .lock()
            .unwrap()
            .insert(tracker.instance(), tracker);
    }

    fn destroy(&self, instance: InstanceId) {
        self.live.lock().unwrap().retain(|id| *id != instance);
        self.destroyed.lock().unwrap().push(instance);
        let tracker = self.trackers.lock().unwrap().remove(&instance);
        if let Some(tracker) = tracker {
            tracker.notify_destroyed();
        }
    }
}

pub struct Harness {
    pub engine: Arc<FakeEngine>,
    pub substrate: Arc<FakeSubstrate>,
    pub cache: AssetCache,
}

/// Builds a cache over fresh fakes. Must run inside a Tokio runtime.
pub fn harness() -> Harness {
    init_logging();
    let engine = FakeEngine::new();
    let substrate = FakeSubstrate::new();
    let cache = AssetCache::new(engine.clone(), substrate.clone(), CacheConfig::default())
        .expect("a runtime is available");
    Harness {
        engine,
        substrate,
        cache,
    }
}

pub fn location<T: Asset>(internal_id: &str, primary_key: &str) -> ResourceLocation {
    ResourceLocation::new(internal_id, primary_key, AssetType::of::<T>())
}
