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


//! # Hoard Agents
//!
//! The orchestration layer of the asset cache.
//!
//! - [`AssetCache`] resolves keys to loaded values, coalescing concurrent
//!   requests into a single engine load, and owns every table.
//! - [`LabelBatchLoader`] loads everything tagged with a label, loading each
//!   physical location once however many keys alias it.
//! - [`InstanceSpawner`] spawns instances from loaded values and keeps them
//!   grouped by key so an unload can tear them all down.

#![warn(missing_docs)]

pub mod asset_agent;

pub use asset_agent::{
    AssetCache, InstanceSpawner, LabelBatch, LabelBatchLoader, PendingAsset, Resolution, Resolve,
};
