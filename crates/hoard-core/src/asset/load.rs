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

//! Shared handles for outstanding and completed engine loads.

use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use tokio::sync::watch;

use super::ErasedAsset;
use crate::error::LoadError;

/// Identifies one engine load. Unique for the lifetime of the cache that allocated it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadId(pub u64);

impl fmt::Display for LoadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "load#{}", self.0)
    }
}

/// Progress of one engine load.
///
/// State flow: `Pending -> Succeeded` or `Pending -> Failed`. A completed load
/// never goes back to `Pending`.
#[derive(Debug, Clone)]
pub enum LoadStatus {
    /// The engine has not delivered a result yet.
    Pending,
    /// The engine delivered a value.
    Succeeded(ErasedAsset),
    /// The engine reported a failure.
    Failed(LoadError),
}

impl LoadStatus {
    /// Returns `true` while the load is in flight.
    pub fn is_pending(&self) -> bool {
        matches!(self, LoadStatus::Pending)
    }

    fn to_result(&self) -> Option<Result<ErasedAsset, LoadError>> {
        match self {
            LoadStatus::Pending => None,
            LoadStatus::Succeeded(asset) => Some(Ok(asset.clone())),
            LoadStatus::Failed(err) => Some(Err(err.clone())),
        }
    }
}

struct LoadInner {
    id: LoadId,
    key: String,
    status: watch::Sender<LoadStatus>,
    released: AtomicBool,
}

/// A cheap-to-clone handle to one engine load.
///
/// Any number of callers may hold and await the same handle; they all observe
/// the same result. The handle also records whether the engine has been asked
/// to release the load, so that release happens at most once.
#[derive(Clone)]
pub struct LoadHandle {
    inner: Arc<LoadInner>,
}

impl LoadHandle {
    /// Creates a pending handle for an engine load of `key`.
    pub fn new(id: LoadId, key: impl Into<String>) -> Self {
        let (status, _) = watch::channel(LoadStatus::Pending);
        Self {
            inner: Arc::new(LoadInner {
                id,
                key: key.into(),
                status,
                released: AtomicBool::new(false),
            }),
        }
    }

    /// Creates an already completed handle around `asset`.
    pub fn completed(id: LoadId, key: impl Into<String>, asset: ErasedAsset) -> Self {
        let handle = Self::new(id, key);
        handle.complete(Ok(asset));
        handle
    }

    /// The identifier of this load.
    pub fn id(&self) -> LoadId {
        self.inner.id
    }

    /// The engine key this load was issued for.
    pub fn key(&self) -> &str {
        &self.inner.key
    }

    /// A snapshot of the current status.
    pub fn status(&self) -> LoadStatus {
        self.inner.status.borrow().clone()
    }

    /// Returns `true` once the engine delivered a value or a failure.
    pub fn is_done(&self) -> bool {
        !self.inner.status.borrow().is_pending()
    }

    /// Returns `true` if the load completed with a value.
    pub fn succeeded(&self) -> bool {
        matches!(*self.inner.status.borrow(), LoadStatus::Succeeded(_))
    }

    /// The result, if the load has completed. Never blocks.
    pub fn result(&self) -> Option<Result<ErasedAsset, LoadError>> {
        self.inner.status.borrow().to_result()
    }

    /// Records the engine's result. Only the first completion is kept.
    ///
    /// Returns `true` if this call completed the handle.
    pub fn complete(&self, result: Result<ErasedAsset, LoadError>) -> bool {
        let next = match result {
            Ok(asset) => LoadStatus::Succeeded(asset),
            Err(err) => LoadStatus::Failed(err),
        };
        let mut next = Some(next);
        self.inner.status.send_if_modified(|status| {
            if status.is_pending() {
                if let Some(next) = next.take() {
                    *status = next;
                }
                true
            } else {
                false
            }
        })
    }

    /// Waits until the load completes and returns its result.
    pub async fn wait(&self) -> Result<ErasedAsset, LoadError> {
        let mut receiver = self.inner.status.subscribe();
        // The sender lives inside `self`, so the channel cannot close while we wait.
        let status = receiver
            .wait_for(|status| !status.is_pending())
            .await
            .map_err(|_| LoadError::Abandoned {
                key: self.inner.key.clone(),
            })?;
        match &*status {
            LoadStatus::Succeeded(asset) => Ok(asset.clone()),
            LoadStatus::Failed(err) => Err(err.clone()),
            LoadStatus::Pending => Err(LoadError::Abandoned {
                key: self.inner.key.clone(),
            }),
        }
    }

    /// Marks the handle as released.
    ///
    /// Returns `true` only for the first call; callers use this to guarantee the
    /// engine's release is invoked once per load.
    pub fn mark_released(&self) -> bool {
        !self.inner.released.swap(true, Ordering::AcqRel)
    }

    /// Returns `true` once the engine has been asked to release this load.
    pub fn is_released(&self) -> bool {
        self.inner.released.load(Ordering::Acquire)
    }

    /// Returns `true` if both handles refer to the same load.
    pub fn same_load(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for LoadHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match &*self.inner.status.borrow() {
            LoadStatus::Pending => "pending",
            LoadStatus::Succeeded(_) => "succeeded",
            LoadStatus::Failed(_) => "failed",
        };
        f.debug_struct("LoadHandle")
            .field("id", &self.inner.id)
            .field("key", &self.inner.key)
            .field("status", &status)
            .field("released", &self.is_released())
            .finish()
    }
}
