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


mod common;

use common::{eventually, harness, Prefab};
use hoard_agents::InstanceSpawner;
use hoard_core::{
    asset::{AssetKey, ErasedAsset},
    event::AssetEvent,
    instance::{InstanceSubstrate, Placement},
    AssetError, LoadError,
};

fn prefab_key(h: &common::Harness, name: &'static str) -> AssetKey {
    let key = AssetKey::new_v5(name);
    h.engine.insert(key.to_string(), Prefab { name });
    key
}

#[tokio::test]
async fn test_unload_destroys_every_instance() {
    let h = harness();
    let spawner = InstanceSpawner::new(h.cache.clone());
    let key = prefab_key(&h, "crate");

    let spawned = spawner
        .instantiate_multi(&key, 3, &Placement::default())
        .await
        .unwrap();
    assert_eq!(h.cache.instantiated_count(&key), 3);

    assert!(h.cache.unload(&key).unwrap());

    let mut newest_first = spawned.clone();
    newest_first.reverse();
    assert_eq!(h.substrate.destroyed(), newest_first);
    assert!(h.substrate.live().is_empty());
    assert!(!h.cache.is_instantiated(&key));
    assert_eq!(h.cache.instantiated_count(&key), 0);
    assert_eq!(h.cache.instantiated_total(), 0);
}

#[tokio::test]
async fn test_external_destroy_deregisters() {
    let h = harness();
    let spawner = InstanceSpawner::new(h.cache.clone());
    let key = prefab_key(&h, "barrel");

    let first = spawner.instantiate(&key, &Placement::default()).await.unwrap();
    let second = spawner
        .instantiate(&key, &Placement::at([1.0, 0.0, 0.0]))
        .await
        .unwrap();

    h.substrate.destroy(first);
    assert_eq!(h.cache.instantiated_count(&key), 1);

    assert_eq!(spawner.destroy_all_instances(&key).unwrap(), 1);
    assert_eq!(h.substrate.destroyed(), vec![first, second]);
    assert!(!h.cache.is_instantiated(&key));

    // The asset itself stays loaded.
    assert!(h.cache.is_loaded(&key));
}

#[tokio::test]
async fn test_multi_spawn_resolves_once() {
    let h = harness();
    let spawner = InstanceSpawner::new(h.cache.clone());
    let key = prefab_key(&h, "tree");

    let spawned = spawner
        .instantiate_multi(&key, 5, &Placement::default())
        .await
        .unwrap();
    assert_eq!(spawned.len(), 5);
    assert_eq!(h.engine.load_count(), 1);
    assert_eq!(h.cache.instantiated_count(&key), 5);

    spawner
        .instantiate_multi(&key, 2, &Placement::default())
        .await
        .unwrap();
    assert_eq!(h.engine.load_count(), 1);
    assert_eq!(h.cache.instantiated_count(&key), 7);
}

#[tokio::test]
async fn test_spawn_failure_creates_no_group() {
    let h = harness();
    let spawner = InstanceSpawner::new(h.cache.clone());
    let key = prefab_key(&h, "ghost");
    h.substrate.refuse_spawns(true);

    let err = spawner
        .instantiate(&key, &Placement::default())
        .await
        .unwrap_err();

    assert!(matches!(err, AssetError::SpawnFailed { key: k } if k == key));
    assert!(!h.cache.is_instantiated(&key));
    assert!(h.cache.is_loaded(&key));
}

#[tokio::test]
async fn test_spawn_from_an_explicit_asset() {
    let h = harness();
    let spawner = InstanceSpawner::new(h.cache.clone());
    let key = AssetKey::new();
    let asset = ErasedAsset::new(Prefab { name: "marker" });

    let parent = spawner.spawn(&key, &asset, &Placement::default()).unwrap();
    let child = spawner
        .spawn(&key, &asset, &Placement::default().with_parent(parent))
        .unwrap();

    assert_eq!(h.substrate.live(), vec![parent, child]);
    assert_eq!(h.cache.instantiated_count(&key), 2);
    assert_eq!(h.engine.load_count(), 0);
}

#[tokio::test]
async fn test_destroy_all_without_group_is_a_no_op() {
    let h = harness();

    assert_eq!(h.cache.destroy_all_instances(&AssetKey::new()).unwrap(), 0);
    assert!(h.substrate.destroyed().is_empty());
}

#[tokio::test]
async fn test_sync_instantiation_requires_a_loaded_key() {
    let h = harness();
    let spawner = InstanceSpawner::new(h.cache.clone());
    let key = prefab_key(&h, "lamp");

    assert_eq!(
        spawner
            .try_instantiate_sync(&key, &Placement::default())
            .unwrap(),
        None
    );
    assert_eq!(h.engine.load_count(), 0);

    h.cache.resolve(&key).unwrap().wait().await.unwrap();

    assert!(spawner
        .try_instantiate_sync(&key, &Placement::default())
        .unwrap()
        .is_some());
    let more = spawner
        .try_instantiate_multi_sync(&key, 3, &Placement::default())
        .unwrap()
        .unwrap();
    assert_eq!(more.len(), 3);
    assert_eq!(h.cache.instantiated_count(&key), 4);
}

#[tokio::test]
async fn test_unload_while_instantiating_reports_untracked() {
    let h = harness();
    let spawner = InstanceSpawner::new(h.cache.clone());
    let key = prefab_key(&h, "bridge");
    h.engine.gate(key.to_string());

    let pending = {
        let spawner = spawner.clone();
        tokio::spawn(async move { spawner.instantiate(&key, &Placement::default()).await })
    };
    assert!(eventually(|| h.engine.load_count() == 1).await);

    h.cache.unload(&key).unwrap();
    h.engine.open(&key.to_string());

    let err = pending.await.unwrap().unwrap_err();
    assert!(matches!(err, AssetError::Untracked { key: k } if k == key));
    assert!(!h.cache.is_instantiated(&key));
    assert!(h.substrate.live().is_empty());
}

#[tokio::test]
async fn test_failed_load_fails_instantiation() {
    let h = harness();
    let spawner = InstanceSpawner::new(h.cache.clone());
    let key = AssetKey::new();

    let err = spawner
        .instantiate_multi(&key, 2, &Placement::default())
        .await
        .unwrap_err();

    assert!(matches!(err, AssetError::Load(LoadError::NotFound { .. })));
    assert_eq!(h.cache.instantiated_total(), 0);
}

#[tokio::test]
async fn test_unload_of_pending_key_still_destroys_its_instances() {
    let h = harness();
    let spawner = InstanceSpawner::new(h.cache.clone());
    let key = prefab_key(&h, "door");
    h.engine.gate(key.to_string());

    // Instances filed under the key before its load completes.
    let stand_in = ErasedAsset::new(Prefab { name: "placeholder" });
    spawner.spawn(&key, &stand_in, &Placement::default()).unwrap();
    assert!(h.cache.resolve(&key).unwrap().started_load());

    assert!(h.cache.unload(&key).unwrap());
    assert_eq!(h.substrate.destroyed().len(), 1);
    assert!(!h.cache.is_instantiated(&key));

    let events = h.cache.drain_events();
    assert!(matches!(events.as_slice(), [AssetEvent::Unloaded { .. }]));
}
