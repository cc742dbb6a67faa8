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


//! Acts as the agent for the asset subsystem.
//!
//! This module is the public-facing API for requesting assets, querying their
//! state and spawning instances of them. The actual loading is delegated to the
//! host's [`ResourceEngine`](hoard_core::engine::ResourceEngine); the tables it
//! mutates live in `hoard-data`.
//!
//! One [`AssetCache`] is constructed at startup and cloned into every
//! collaborator that needs it. Clones share the same state.

mod cache;
mod label;
mod spawner;

pub use cache::{AssetCache, PendingAsset, Resolution, Resolve};
pub use label::{LabelBatch, LabelBatchLoader};
pub use spawner::InstanceSpawner;
