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


//! # Hoard Data
//!
//! The plain data structures behind the asset cache: which keys are loading,
//! which are loaded, and which instances were spawned from each key.
//!
//! Nothing in this crate is synchronized. The owning cache keeps an
//! [`AssetTables`] and an [`InstanceRegistry`] behind a single lock and is
//! the only code that mutates them.

#![warn(missing_docs)]

pub mod instances;
pub mod tables;

pub use instances::InstanceRegistry;
pub use tables::{AssetTables, EntryState, PendingRequestTable, Removed, ResolvedAssetTable};
