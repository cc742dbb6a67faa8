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


//! The asset cache: request coalescing, load completion and unloading.

use std::{
    collections::HashSet,
    future::Future,
    marker::PhantomData,
    path::Path,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
};

use anyhow::Context;
use hoard_core::{
    asset::{
        Asset, AssetHandle, AssetKey, Converted, ErasedAsset, LoadHandle, LoadId, RuntimeKey,
        TypeFilter,
    },
    engine::ResourceEngine,
    event::{AssetEvent, EventBus},
    instance::{InstanceId, InstanceObserver, InstanceSubstrate, InstanceTracker, Placement},
    AssetError, CacheConfig, LoadError,
};
use hoard_data::{AssetTables, EntryState, InstanceRegistry};
use tokio::{runtime::Handle, task::JoinHandle};

use super::label::{unique_locations, LabelBatch, LabelBatchLoader};

/// The outcome of [`AssetCache::resolve`].
#[derive(Debug, Clone)]
pub enum Resolve {
    /// The key was already loaded.
    Resolved(ErasedAsset),
    /// A load for the key was already in flight; the caller shares it.
    Attached(LoadHandle),
    /// No load existed; this call issued one.
    Started(LoadHandle),
}

impl Resolve {
    /// Returns `true` if this call issued a new engine load.
    pub fn started_load(&self) -> bool {
        matches!(self, Resolve::Started(_))
    }

    /// The load handle, unless the key was already loaded.
    pub fn handle(&self) -> Option<&LoadHandle> {
        match self {
            Resolve::Resolved(_) => None,
            Resolve::Attached(handle) | Resolve::Started(handle) => Some(handle),
        }
    }

    /// Waits for the value, whichever way it was resolved.
    pub async fn wait(self) -> Result<ErasedAsset, LoadError> {
        match self {
            Resolve::Resolved(asset) => Ok(asset),
            Resolve::Attached(handle) | Resolve::Started(handle) => handle.wait().await,
        }
    }
}

/// A load whose value will be viewed as `T` once it completes.
///
/// Every caller attached to the same load shares the engine result; the
/// conversion is applied per caller, so callers asking for different types do
/// not interfere with each other.
pub struct PendingAsset<T: Asset> {
    handle: LoadHandle,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Asset> PendingAsset<T> {
    fn new(handle: LoadHandle) -> Self {
        Self {
            handle,
            _marker: PhantomData,
        }
    }

    /// The underlying load.
    pub fn handle(&self) -> &LoadHandle {
        &self.handle
    }

    /// Waits for the load and converts its value, falling back to the raw value on mismatch.
    pub async fn wait(&self) -> Result<Converted<T>, LoadError> {
        self.handle.wait().await.map(Converted::from_erased)
    }
}

impl<T: Asset> Clone for PendingAsset<T> {
    fn clone(&self) -> Self {
        Self::new(self.handle.clone())
    }
}

impl<T: Asset> std::fmt::Debug for PendingAsset<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingAsset")
            .field("type", &std::any::type_name::<T>())
            .field("handle", &self.handle)
            .finish()
    }
}

/// The outcome of [`AssetCache::resolve_as`].
#[derive(Debug)]
pub enum Resolution<T: Asset> {
    /// The key was already loaded.
    Resolved(Converted<T>),
    /// A load for the key was already in flight; the caller shares it.
    Attached(PendingAsset<T>),
    /// No load existed; this call issued one.
    Started(PendingAsset<T>),
}

impl<T: Asset> Resolution<T> {
    /// Returns `true` if this call issued a new engine load.
    pub fn started_load(&self) -> bool {
        matches!(self, Resolution::Started(_))
    }

    /// Waits for the converted value, whichever way it was resolved.
    pub async fn wait(self) -> Result<Converted<T>, LoadError> {
        match self {
            Resolution::Resolved(converted) => Ok(converted),
            Resolution::Attached(pending) | Resolution::Started(pending) => pending.wait().await,
        }
    }
}

pub(crate) struct CacheState {
    pub(crate) tables: AssetTables,
    pub(crate) instances: InstanceRegistry,
}

/// State shared by every clone of an [`AssetCache`] and by the load tasks it spawns.
pub(crate) struct CacheShared {
    pub(crate) engine: Arc<dyn ResourceEngine>,
    substrate: Arc<dyn InstanceSubstrate>,
    state: Mutex<CacheState>,
    events: EventBus<AssetEvent>,
    next_load_id: AtomicU64,
    config: CacheConfig,
    runtime: Handle,
}

impl CacheShared {
    pub(crate) fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn allocate(&self, engine_key: impl Into<String>) -> LoadHandle {
        let id = LoadId(self.next_load_id.fetch_add(1, Ordering::Relaxed));
        LoadHandle::new(id, engine_key)
    }

    pub(crate) fn publish(&self, event: AssetEvent) {
        self.events.publish(event);
    }

    /// Runs the engine load for `handle` on the cache's runtime.
    ///
    /// With a key, the result is folded into the tables; without one the
    /// handle is only completed and the caller owns the bookkeeping.
    pub(crate) fn spawn_load(
        self: &Arc<Self>,
        key: Option<AssetKey>,
        handle: LoadHandle,
        filter: TypeFilter,
    ) {
        let in_flight = InFlight {
            shared: Arc::clone(self),
            key,
            handle,
            done: false,
        };
        self.runtime.spawn(async move {
            let result = in_flight
                .shared
                .engine
                .load(in_flight.handle.key(), filter)
                .await;
            in_flight.finish(result);
        });
    }

    /// Runs bookkeeping that must finish even if its caller is dropped.
    pub(crate) fn spawn_task<F>(&self, task: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.runtime.spawn(task)
    }

    /// Folds a finished per-key load back into the tables.
    ///
    /// The handle is completed under the lock, so a waiter that wakes up
    /// already sees the promoted entry.
    fn finish_load(
        &self,
        key: AssetKey,
        handle: &LoadHandle,
        result: Result<ErasedAsset, LoadError>,
    ) {
        let mut state = self.lock();
        match result {
            Ok(asset) => {
                handle.complete(Ok(asset));
                if state.tables.promote(&key, handle.id()) {
                    log::debug!("Loaded '{key}' ({}).", handle.id());
                    self.publish(AssetEvent::Loaded {
                        key,
                        handle: handle.clone(),
                    });
                    return;
                }
                log::debug!(
                    "Discarding late completion of {} for '{key}'; the key was unloaded.",
                    handle.id()
                );
            }
            Err(err) => {
                log::warn!("Failed to load '{key}': {err}");
                state.tables.abandon(&key, handle.id());
                handle.complete(Err(err));
            }
        }
        let orphaned = !state.tables.references(handle.id());
        drop(state);
        if orphaned {
            self.release(handle);
        }
    }

    /// Asks the engine to release `handle`, once.
    pub(crate) fn release(&self, handle: &LoadHandle) {
        if handle.mark_released() {
            log::debug!("Releasing {} ('{}').", handle.id(), handle.key());
            self.engine.release(handle);
        }
    }

    /// Removes `key` and everything spawned from it. Returns `false` for unknown keys.
    pub(crate) fn unload_key(&self, key: AssetKey) -> bool {
        let (removed, group, orphaned) = {
            let mut state = self.lock();
            let Some(removed) = state.tables.remove(&key) else {
                drop(state);
                if self.config.warn_on_unknown_unload {
                    log::warn!("Cannot unload '{key}': it is neither loaded nor loading.");
                }
                return false;
            };
            let group = state.instances.take_group(&key);
            let orphaned = !state.tables.references(removed.handle().id());
            (removed, group, orphaned)
        };

        if let Some(group) = group {
            let destroyed = self.destroy_group(group);
            log::debug!("Destroyed {destroyed} instance(s) of '{key}' during unload.");
        }
        if orphaned {
            self.release(removed.handle());
        }
        log::debug!("Unloaded '{key}'.");
        self.publish(AssetEvent::Unloaded { key });
        true
    }

    /// Destroys a detached group, newest instance first.
    ///
    /// Must be called without the state lock: the substrate reports each
    /// destruction back through the instance's tracker.
    fn destroy_group(&self, group: Vec<InstanceId>) -> usize {
        let count = group.len();
        for instance in group.into_iter().rev() {
            self.substrate.destroy(instance);
        }
        count
    }

    pub(crate) fn destroy_instances_of(&self, key: AssetKey) -> usize {
        let group = self.lock().instances.take_group(&key);
        match group {
            Some(group) => self.destroy_group(group),
            None => {
                if self.config.warn_on_unknown_unload {
                    log::warn!("No instances of '{key}' to destroy.");
                }
                0
            }
        }
    }

    pub(crate) fn spawn_instance(
        self: &Arc<Self>,
        key: AssetKey,
        asset: &ErasedAsset,
        placement: &Placement,
    ) -> Result<InstanceId, AssetError> {
        let Some(instance) = self.substrate.spawn(asset, placement) else {
            log::error!("Substrate produced no instance for '{key}'.");
            return Err(AssetError::SpawnFailed { key });
        };

        self.lock().instances.register(key, instance);
        let observer: Arc<dyn InstanceObserver> = Arc::clone(self) as Arc<dyn InstanceObserver>;
        self.substrate
            .attach_tracker(InstanceTracker::new(key, instance, &observer));
        log::trace!("Spawned {instance} from '{key}'.");
        Ok(instance)
    }

    pub(crate) fn is_tracked(&self, key: &AssetKey) -> bool {
        self.lock().tables.contains(key)
    }
}

impl InstanceObserver for CacheShared {
    fn on_instance_destroyed(&self, key: AssetKey, instance: InstanceId) {
        if !self.lock().instances.deregister(&key, instance) {
            log::trace!("{instance} of '{key}' was already untracked.");
        }
    }
}

/// Owns one running engine load.
///
/// If the task is dropped before the engine answers (runtime shutdown), the
/// load is finished as abandoned so that nobody waits on it forever.
struct InFlight {
    shared: Arc<CacheShared>,
    key: Option<AssetKey>,
    handle: LoadHandle,
    done: bool,
}

impl InFlight {
    fn finish(mut self, result: Result<ErasedAsset, LoadError>) {
        self.done = true;
        self.complete(result);
    }

    fn complete(&self, result: Result<ErasedAsset, LoadError>) {
        match self.key {
            Some(key) => self.shared.finish_load(key, &self.handle, result),
            None => {
                self.handle.complete(result);
            }
        }
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if !self.done {
            let key = self.handle.key().to_string();
            self.complete(Err(LoadError::Abandoned { key }));
        }
    }
}

/// Resolves asset keys to loaded values and tracks what has been spawned from them.
///
/// The cache is the single source of truth for which keys are loading and
/// which are loaded. For any number of overlapping requests on a key that is
/// not loaded, exactly one engine load is issued; every caller observes its
/// result.
///
/// `AssetCache` is cheap to clone. Clones share the same tables, event channel
/// and collaborators.
#[derive(Clone)]
pub struct AssetCache {
    shared: Arc<CacheShared>,
}

impl AssetCache {
    /// Creates a cache driving `engine` and spawning into `substrate`.
    ///
    /// Must be called from within a Tokio runtime; engine loads are spawned on it.
    pub fn new(
        engine: Arc<dyn ResourceEngine>,
        substrate: Arc<dyn InstanceSubstrate>,
        config: CacheConfig,
    ) -> Result<Self, AssetError> {
        let runtime = Handle::try_current().map_err(|_| AssetError::NoRuntime)?;
        let state = CacheState {
            tables: AssetTables::with_capacity(config.loading_capacity, config.loaded_capacity),
            instances: InstanceRegistry::with_capacity(
                config.instance_group_capacity,
                config.instances_per_group,
            ),
        };
        log::info!("Asset cache initialized.");
        Ok(Self {
            shared: Arc::new(CacheShared {
                engine,
                substrate,
                state: Mutex::new(state),
                events: EventBus::new(),
                next_load_id: AtomicU64::new(1),
                config,
                runtime,
            }),
        })
    }

    /// Creates a cache configured from the TOML file at `path`, or with defaults if it is missing.
    pub fn from_config_file(
        engine: Arc<dyn ResourceEngine>,
        substrate: Arc<dyn InstanceSubstrate>,
        path: impl AsRef<Path>,
    ) -> anyhow::Result<Self> {
        let config = CacheConfig::load(path)?;
        Self::new(engine, substrate, config).context("Failed to create the asset cache")
    }

    pub(crate) fn shared(&self) -> &Arc<CacheShared> {
        &self.shared
    }

    /// The configuration the cache was built with.
    pub fn config(&self) -> &CacheConfig {
        &self.shared.config
    }

    /// The channel on which `Loaded` and `Unloaded` events are published.
    pub fn events(&self) -> &flume::Receiver<AssetEvent> {
        self.shared.events.receiver()
    }

    /// Removes and returns every queued event.
    pub fn drain_events(&self) -> Vec<AssetEvent> {
        self.shared.events.drain()
    }

    /// Resolves `key` to its loaded value, attaching to or issuing a load as needed.
    ///
    /// # Errors
    ///
    /// Returns [`AssetError::InvalidKey`] if the key is malformed. Load failures
    /// surface when the returned handle is awaited.
    pub fn resolve(&self, key: &(impl RuntimeKey + ?Sized)) -> Result<Resolve, AssetError> {
        let key = key.runtime_key()?;
        Ok(self.resolve_key(key, TypeFilter::any()))
    }

    /// Resolves `key` and views the value as a `T`.
    ///
    /// A value of another type is never an error here: it is handed back as
    /// [`Converted::Raw`]. A load issued by this call asks the engine for a `T`.
    pub fn resolve_as<T: Asset>(
        &self,
        key: &(impl RuntimeKey + ?Sized),
    ) -> Result<Resolution<T>, AssetError> {
        let key = key.runtime_key()?;
        Ok(match self.resolve_key(key, TypeFilter::of::<T>()) {
            Resolve::Resolved(asset) => Resolution::Resolved(Converted::from_erased(asset)),
            Resolve::Attached(handle) => Resolution::Attached(PendingAsset::new(handle)),
            Resolve::Started(handle) => Resolution::Started(PendingAsset::new(handle)),
        })
    }

    pub(crate) fn resolve_key(&self, key: AssetKey, filter: TypeFilter) -> Resolve {
        let handle = {
            let mut state = self.shared.lock();
            match state.tables.state_of(&key) {
                Some(EntryState::Loaded(handle)) => {
                    return match handle.result() {
                        Some(Ok(asset)) => Resolve::Resolved(asset),
                        _ => Resolve::Attached(handle),
                    };
                }
                Some(EntryState::Loading(handle)) => return Resolve::Attached(handle),
                None => {
                    let handle = self.shared.allocate(key.to_string());
                    state.tables.begin_load(key, handle.clone());
                    handle
                }
            }
        };

        log::debug!("Issuing {} for '{key}'.", handle.id());
        self.shared.spawn_load(Some(key), handle.clone(), filter);
        Resolve::Started(handle)
    }

    /// Returns the value of `key` if it is already loaded. Never loads, never waits.
    pub fn resolve_sync(
        &self,
        key: &(impl RuntimeKey + ?Sized),
    ) -> Result<Option<ErasedAsset>, AssetError> {
        let key = key.runtime_key()?;
        let state = self.shared.lock();
        Ok(state
            .tables
            .resolved()
            .get(&key)
            .and_then(LoadHandle::result)
            .and_then(Result::ok))
    }

    /// Returns the value of `key` as a `T` if it is already loaded.
    ///
    /// Unlike [`resolve_as`](Self::resolve_as), a value of another type is an error.
    pub fn get_sync<T: Asset>(
        &self,
        key: &(impl RuntimeKey + ?Sized),
    ) -> Result<Option<AssetHandle<T>>, AssetError> {
        match self.resolve_sync(key)? {
            Some(asset) => Ok(Some(asset.downcast::<T>()?)),
            None => Ok(None),
        }
    }

    /// Unloads `key`, destroying every instance spawned from it.
    ///
    /// Returns `Ok(false)` if the key was neither loaded nor loading. Unloading
    /// a key whose load is still in flight is allowed; the load's eventual
    /// result is discarded.
    pub fn unload(&self, key: &(impl RuntimeKey + ?Sized)) -> Result<bool, AssetError> {
        let key = key.runtime_key()?;
        Ok(self.shared.unload_key(key))
    }

    /// Unloads every loaded or loading key whose single location is tagged with `label`.
    ///
    /// Returns the number of keys unloaded. A blank label or a failed label
    /// query is logged and unloads nothing.
    pub async fn unload_by_label(&self, label: &str) -> usize {
        if label.trim().is_empty() {
            log::error!("Cannot unload by a blank label.");
            return 0;
        }
        let filter = TypeFilter::any();
        let locations = match self.shared.engine.locations_for_label(label, filter).await {
            Ok(locations) => locations,
            Err(err) => {
                log::error!("{err}");
                return 0;
            }
        };
        let tagged: HashSet<String> = locations
            .into_iter()
            .map(|location| location.internal_id)
            .collect();

        let mut unloaded = 0;
        for (key, location) in unique_locations(self.shared.engine.as_ref(), filter) {
            if !tagged.contains(&location.internal_id) {
                continue;
            }
            if self.shared.is_tracked(&key) && self.shared.unload_key(key) {
                unloaded += 1;
            }
        }
        log::info!("Unloaded {unloaded} asset(s) labelled '{label}'.");
        unloaded
    }

    /// Loads every asset tagged with `label`. See [`LabelBatchLoader::load`].
    pub async fn load_by_label(&self, label: &str) -> LabelBatch {
        LabelBatchLoader::new(self.clone()).load(label).await
    }

    /// Loads every asset of type `T` tagged with `label`. See [`LabelBatchLoader::load_typed`].
    pub async fn load_by_label_typed<T: Asset>(&self, label: &str) -> LabelBatch {
        LabelBatchLoader::new(self.clone()).load_typed::<T>(label).await
    }

    /// Destroys every live instance spawned from `key`, newest first.
    ///
    /// Returns the number of instances destroyed; `0` (with a warning) if there were none.
    pub fn destroy_all_instances(
        &self,
        key: &(impl RuntimeKey + ?Sized),
    ) -> Result<usize, AssetError> {
        let key = key.runtime_key()?;
        Ok(self.shared.destroy_instances_of(key))
    }

    /// Number of loaded keys.
    pub fn loaded_count(&self) -> usize {
        self.shared.lock().tables.loaded_count()
    }

    /// Number of keys with a load in flight.
    pub fn loading_count(&self) -> usize {
        self.shared.lock().tables.loading_count()
    }

    /// Number of live instances across all keys.
    pub fn instantiated_total(&self) -> usize {
        self.shared.lock().instances.total()
    }

    /// Checks if `key` is loaded. Malformed keys are never loaded.
    pub fn is_loaded(&self, key: &(impl RuntimeKey + ?Sized)) -> bool {
        key.runtime_key()
            .is_ok_and(|key| self.shared.lock().tables.is_loaded(&key))
    }

    /// Checks if `key` has a load in flight.
    pub fn is_loading(&self, key: &(impl RuntimeKey + ?Sized)) -> bool {
        key.runtime_key()
            .is_ok_and(|key| self.shared.lock().tables.is_loading(&key))
    }

    /// Checks if `key` has at least one live instance.
    pub fn is_instantiated(&self, key: &(impl RuntimeKey + ?Sized)) -> bool {
        key.runtime_key()
            .is_ok_and(|key| self.shared.lock().instances.contains(&key))
    }

    /// Number of live instances spawned from `key`.
    pub fn instantiated_count(&self, key: &(impl RuntimeKey + ?Sized)) -> usize {
        key.runtime_key()
            .map_or(0, |key| self.shared.lock().instances.count(&key))
    }

    /// Every loaded value, in no particular order.
    pub fn loaded_assets(&self) -> Vec<ErasedAsset> {
        let handles = self.shared.lock().tables.loaded_handles();
        handles
            .into_iter()
            .filter_map(|(_, handle)| handle.result().and_then(Result::ok))
            .collect()
    }

    /// Every loaded key, in no particular order.
    pub fn loaded_keys(&self) -> Vec<AssetKey> {
        self.shared
            .lock()
            .tables
            .resolved()
            .iter()
            .map(|(key, _)| *key)
            .collect()
    }
}

impl std::fmt::Debug for AssetCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.lock();
        f.debug_struct("AssetCache")
            .field("loading", &state.tables.loading_count())
            .field("loaded", &state.tables.loaded_count())
            .field("instances", &state.instances.total())
            .finish()
    }
}
