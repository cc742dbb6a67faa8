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


//! Bulk loading of every asset tagged with a label.
//!
//! The unit of loading is the physical location, not the key: when several
//! keys alias one location, that location is loaded once and every aliasing
//! key is attached to the same load in the cache's tables.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use hoard_core::{
    asset::{Asset, AssetKey, ErasedAsset, LoadHandle, TypeFilter},
    engine::{ResourceEngine, ResourceLocation},
    event::AssetEvent,
    LoadError,
};

use super::cache::{AssetCache, CacheShared};

/// The result of a label batch.
///
/// A batch that ran always reports success; individual locations that failed
/// to load are visible on their own handles.
#[derive(Debug, Clone)]
pub struct LabelBatch {
    label: String,
    handles: Vec<LoadHandle>,
    succeeded: bool,
}

impl LabelBatch {
    fn completed(label: &str, handles: Vec<LoadHandle>) -> Self {
        Self {
            label: label.to_string(),
            handles,
            succeeded: true,
        }
    }

    fn rejected(label: &str) -> Self {
        Self {
            label: label.to_string(),
            handles: Vec::new(),
            succeeded: false,
        }
    }

    /// The label that was loaded.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// One handle per distinct location, in the order the engine listed them.
    pub fn handles(&self) -> &[LoadHandle] {
        &self.handles
    }

    /// `false` only if the label was blank or could not be resolved to locations.
    pub fn succeeded(&self) -> bool {
        self.succeeded
    }

    /// Number of locations loaded.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Returns `true` if the label matched no locations.
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// The values of the locations that loaded.
    pub fn assets(&self) -> Vec<ErasedAsset> {
        self.handles
            .iter()
            .filter_map(|h| h.result().and_then(Result::ok))
            .collect()
    }

    /// The locations that failed, with their errors.
    pub fn failures(&self) -> Vec<(&LoadHandle, LoadError)> {
        self.handles
            .iter()
            .filter_map(|h| match h.result() {
                Some(Err(err)) => Some((h, err)),
                _ => None,
            })
            .collect()
    }
}

/// Loads everything tagged with a label into an [`AssetCache`].
///
/// Keys loaded this way are regular cache entries afterwards: `resolve`,
/// `unload` and the queries see them like any other key.
#[derive(Debug, Clone)]
pub struct LabelBatchLoader {
    cache: AssetCache,
}

impl LabelBatchLoader {
    /// Creates a loader feeding `cache`.
    pub fn new(cache: AssetCache) -> Self {
        Self { cache }
    }

    /// Loads every location tagged with `label`, whatever its type.
    pub async fn load(&self, label: &str) -> LabelBatch {
        self.load_filtered(label, TypeFilter::any()).await
    }

    /// Loads the locations tagged with `label` that produce a `T`.
    ///
    /// Keys are matched with the same restriction, so a key whose only `T`
    /// location is tagged gets attached even if it has locations of other types.
    pub async fn load_typed<T: Asset>(&self, label: &str) -> LabelBatch {
        self.load_filtered(label, TypeFilter::of::<T>()).await
    }

    async fn load_filtered(&self, label: &str, filter: TypeFilter) -> LabelBatch {
        if label.trim().is_empty() {
            log::error!("Cannot load assets for a blank label.");
            return LabelBatch::rejected(label);
        }

        let shared = self.cache.shared();
        let locations = match shared.engine.locations_for_label(label, filter).await {
            Ok(locations) => locations,
            Err(err) => {
                log::error!("{err}");
                return LabelBatch::rejected(label);
            }
        };

        // One load per physical location.
        let mut loads: HashMap<String, LoadHandle> = HashMap::with_capacity(locations.len());
        let mut handles = Vec::with_capacity(locations.len());
        for location in locations {
            if loads.contains_key(&location.internal_id) {
                continue;
            }
            let handle = shared.allocate(location.primary_key);
            shared.spawn_load(None, handle.clone(), filter);
            handles.push(handle.clone());
            loads.insert(location.internal_id, handle);
        }
        if handles.is_empty() {
            log::info!("Label '{label}' matched no locations.");
            return LabelBatch::completed(label, handles);
        }
        log::debug!("Loading {} location(s) for label '{label}'.", handles.len());

        let aliases = attached_keys(shared.engine.as_ref(), &loads, filter);
        {
            let mut state = shared.lock();
            for (key, handle) in aliases {
                state.tables.attach_pending(key, handle);
            }
        }

        // Aliases are now pending in the shared tables. Settling them runs on
        // the cache's runtime so that dropping this future cannot strand them.
        let settle = shared.spawn_task(settle(
            Arc::clone(shared),
            label.to_string(),
            loads,
            handles.clone(),
            filter,
        ));
        if let Err(err) = settle.await {
            log::error!("Settling label '{label}' did not finish: {err}");
        }
        LabelBatch::completed(label, handles)
    }
}

/// Waits for a batch's loads, then folds them into the tables.
///
/// Only keys whose pending entry is still the batch's load are promoted or
/// dropped; keys unloaded or re-requested in the meantime are left alone.
async fn settle(
    shared: Arc<CacheShared>,
    label: String,
    loads: HashMap<String, LoadHandle>,
    handles: Vec<LoadHandle>,
    filter: TypeFilter,
) {
    for handle in &handles {
        if let Err(err) = handle.wait().await {
            log::warn!("Location '{}' of label '{label}' failed: {err}", handle.key());
        }
    }

    let matched = attached_keys(shared.engine.as_ref(), &loads, filter);
    let orphaned: Vec<LoadHandle> = {
        let mut state = shared.lock();
        for (key, handle) in matched {
            if handle.succeeded() {
                if state.tables.promote(&key, handle.id()) {
                    shared.publish(AssetEvent::Loaded { key, handle });
                }
            } else {
                state.tables.abandon(&key, handle.id());
            }
        }
        handles
            .iter()
            .filter(|h| !state.tables.references(h.id()))
            .cloned()
            .collect()
    };
    for handle in &orphaned {
        shared.release(handle);
    }

    log::info!(
        "Label '{label}' loaded: {} location(s), {} unreferenced.",
        handles.len(),
        orphaned.len()
    );
}

/// The keys whose single location is one of the batch's loads, with that load.
fn attached_keys(
    engine: &dyn ResourceEngine,
    loads: &HashMap<String, LoadHandle>,
    filter: TypeFilter,
) -> Vec<(AssetKey, LoadHandle)> {
    unique_locations(engine, filter)
        .into_iter()
        .filter_map(|(key, location)| {
            loads
                .get(&location.internal_id)
                .map(|handle| (key, handle.clone()))
        })
        .collect()
}

/// Every valid key, across all locators, paired with its single location.
///
/// Keys that do not parse, or that resolve to zero or several locations, are
/// skipped. A key listed by several locators is reported once, with the first
/// location found for it.
pub(crate) fn unique_locations(
    engine: &dyn ResourceEngine,
    filter: TypeFilter,
) -> Vec<(AssetKey, ResourceLocation)> {
    let mut seen = HashSet::new();
    let mut located = Vec::new();
    for locator in engine.locators() {
        for raw in locator.keys() {
            let Ok(key) = AssetKey::parse(&raw) else {
                continue;
            };
            if seen.contains(&key) {
                continue;
            }
            if let Some(location) = locator.locate_single(&raw, filter) {
                seen.insert(key);
                located.push((key, location));
            }
        }
    }
    located
}
