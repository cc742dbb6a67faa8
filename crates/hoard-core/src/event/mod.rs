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


//! Event plumbing for the asset cache.
//!
//! [`EventBus`] is a generic, thread-safe channel; [`AssetEvent`] is the only
//! event type the cache publishes on it. Events are sent synchronously from
//! the cache operation that caused them, so a consumer draining the receiver
//! sees them in the order the table mutations happened.

mod bus;

pub use self::bus::EventBus;

use crate::asset::{AssetKey, LoadHandle};

/// A change in the set of loaded assets.
#[derive(Debug, Clone)]
pub enum AssetEvent {
    /// A load completed successfully and `key` moved to the resolved table.
    ///
    /// Published once per key. Keys aliasing one batch load each get their own event.
    Loaded {
        /// The logical key that became loaded.
        key: AssetKey,
        /// The completed load now backing `key`.
        handle: LoadHandle,
    },
    /// `key` was removed from the cache by an explicit unload.
    Unloaded {
        /// The logical key that was removed.
        key: AssetKey,
    },
}

impl AssetEvent {
    /// The key this event is about.
    pub fn key(&self) -> AssetKey {
        match self {
            AssetEvent::Loaded { key, .. } | AssetEvent::Unloaded { key } => *key,
        }
    }
}
