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

//! # Hoard Core
//!
//! Foundational crate containing the keys, handles, collaborator contracts and
//! event types shared by the Hoard asset cache.
//!
//! Nothing in here knows how an asset is actually loaded or how a spawned
//! instance lives in a scene. Those are the jobs of the [`engine::ResourceEngine`]
//! and [`instance::InstanceSubstrate`] implementations supplied by the host.

#![warn(missing_docs)]

pub mod asset;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod instance;

pub use config::CacheConfig;
pub use error::{AssetError, ConversionError, LoadError, LocateError};
