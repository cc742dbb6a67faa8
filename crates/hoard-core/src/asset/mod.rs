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

//! Provides the foundational traits and primitive types for Hoard's asset cache.
//!
//! This module defines the "common language" for all asset-related operations.
//! It contains the core contracts other crates build on, but it has no knowledge
//! of how assets are loaded or stored.
//!
//! The key components are:
//! - The [`Asset`] trait: A marker for all types that can be treated as assets.
//! - [`AssetKey`]: the stable, GUID-based logical key used by every cache operation.
//! - [`ErasedAsset`] and [`AssetHandle`]: the untyped and typed views of a loaded value.
//! - [`LoadHandle`]: the shared handle of one outstanding or completed engine load.

mod erased;
mod handle;
mod key;
mod load;

pub use erased::*;
pub use handle::*;
pub use key::*;
pub use load::*;

/// A marker trait for types that can be managed by the asset cache.
///
/// The supertraits enforce the guarantees the cache relies on:
/// - `Send` + `Sync`: loaded values are shared between the loading task and
///   every caller that resolves the same key.
/// - `'static`: values are type-erased and stored for as long as their key stays loaded.
///
/// # Examples
///
/// ```
/// use hoard_core::asset::Asset;
///
/// struct Prefab {
///     name: String,
/// }
///
/// impl Asset for Prefab {}
/// ```
pub trait Asset: Send + Sync + 'static {}
