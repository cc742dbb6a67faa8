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

//! Type-erased loaded values and the type descriptors used to filter loads.

use std::{
    any::{Any, TypeId},
    fmt,
    sync::Arc,
};

use super::{Asset, AssetHandle};
use crate::error::ConversionError;

/// Describes the concrete Rust type an engine location produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AssetType {
    id: TypeId,
    name: &'static str,
}

impl AssetType {
    /// Returns the descriptor of `T`.
    pub fn of<T: Asset>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The `TypeId` of the described type.
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The full type name, for diagnostics only.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Restricts engine loads and locator lookups to one asset type, or to none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TypeFilter(Option<AssetType>);

impl TypeFilter {
    /// Accepts every asset type.
    pub const fn any() -> Self {
        Self(None)
    }

    /// Accepts only `T`.
    pub fn of<T: Asset>() -> Self {
        Self(Some(AssetType::of::<T>()))
    }

    /// Returns the restricted type, if any.
    pub fn asset_type(&self) -> Option<AssetType> {
        self.0
    }

    /// Returns `true` if a value of `ty` passes this filter.
    pub fn accepts(&self, ty: &AssetType) -> bool {
        match self.0 {
            Some(expected) => expected.id == ty.id,
            None => true,
        }
    }
}

/// A loaded value with its concrete type erased.
///
/// This is what the engine hands back and what the cache stores. Typed views
/// are obtained with [`ErasedAsset::downcast`] and share the same allocation.
#[derive(Clone)]
pub struct ErasedAsset {
    value: Arc<dyn Any + Send + Sync>,
    ty: AssetType,
}

impl ErasedAsset {
    /// Erases a freshly loaded value.
    pub fn new<T: Asset>(value: T) -> Self {
        Self {
            value: Arc::new(value),
            ty: AssetType::of::<T>(),
        }
    }

    /// Erases an already shared value.
    pub fn from_arc<T: Asset>(value: Arc<T>) -> Self {
        Self {
            value,
            ty: AssetType::of::<T>(),
        }
    }

    /// The concrete type of the stored value.
    pub fn asset_type(&self) -> AssetType {
        self.ty
    }

    /// Returns `true` if the stored value is a `T`.
    pub fn is<T: Asset>(&self) -> bool {
        self.ty.id == TypeId::of::<T>()
    }

    /// Views the stored value as a `T` without re-issuing a load.
    pub fn downcast<T: Asset>(&self) -> Result<AssetHandle<T>, ConversionError> {
        Arc::clone(&self.value)
            .downcast::<T>()
            .map(AssetHandle::from_arc)
            .map_err(|_| ConversionError {
                expected: std::any::type_name::<T>(),
                found: self.ty.name,
            })
    }

    /// Returns `true` if both values share one allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

impl fmt::Debug for ErasedAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErasedAsset")
            .field("type", &self.ty.name)
            .finish_non_exhaustive()
    }
}

/// The result of viewing a loaded value as a requested type.
///
/// Resolve paths never fail on a type mismatch: they keep the raw value in
/// [`Converted::Raw`] and leave the decision to the caller.
#[derive(Debug)]
pub enum Converted<T: Asset> {
    /// The value is a `T`.
    Typed(AssetHandle<T>),
    /// The value is not a `T`; the untyped value is kept as-is.
    Raw(ErasedAsset),
}

impl<T: Asset> Converted<T> {
    /// Converts `asset`, degrading to [`Converted::Raw`] on mismatch.
    pub fn from_erased(asset: ErasedAsset) -> Self {
        match asset.downcast::<T>() {
            Ok(handle) => Converted::Typed(handle),
            Err(err) => {
                log::debug!("Keeping raw asset value: {err}");
                Converted::Raw(asset)
            }
        }
    }

    /// Returns the typed handle, if the conversion succeeded.
    pub fn typed(&self) -> Option<&AssetHandle<T>> {
        match self {
            Converted::Typed(handle) => Some(handle),
            Converted::Raw(_) => None,
        }
    }

    /// Consumes the view, returning the typed handle if there is one.
    pub fn into_typed(self) -> Option<AssetHandle<T>> {
        match self {
            Converted::Typed(handle) => Some(handle),
            Converted::Raw(_) => None,
        }
    }

    /// Returns `true` if the conversion fell back to the raw value.
    pub fn is_raw(&self) -> bool {
        matches!(self, Converted::Raw(_))
    }
}

impl<T: Asset> Clone for Converted<T> {
    fn clone(&self) -> Self {
        match self {
            Converted::Typed(handle) => Converted::Typed(handle.clone()),
            Converted::Raw(asset) => Converted::Raw(asset.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Mesh(u32);
    impl Asset for Mesh {}

    #[derive(Debug)]
    struct Texture;
    impl Asset for Texture {}

    #[test]
    fn test_downcast_shares_allocation() {
        let erased = ErasedAsset::new(Mesh(7));
        let a = erased.downcast::<Mesh>().unwrap();
        let b = erased.downcast::<Mesh>().unwrap();

        assert_eq!(*a, Mesh(7));
        assert!(a.ptr_eq(&b));
    }

    #[test]
    fn test_downcast_mismatch_reports_both_types() {
        let erased = ErasedAsset::new(Mesh(1));
        let err = erased.downcast::<Texture>().unwrap_err();

        assert!(err.expected.ends_with("Texture"));
        assert!(err.found.ends_with("Mesh"));
    }

    #[test]
    fn test_converted_falls_back_to_raw() {
        let erased = ErasedAsset::new(Mesh(3));

        let as_texture = Converted::<Texture>::from_erased(erased.clone());
        assert!(as_texture.is_raw());

        let as_mesh = Converted::<Mesh>::from_erased(erased);
        assert_eq!(as_mesh.typed().map(|m| m.0), Some(3));
    }

    #[test]
    fn test_type_filter() {
        let any = TypeFilter::any();
        let meshes = TypeFilter::of::<Mesh>();

        assert!(any.accepts(&AssetType::of::<Texture>()));
        assert!(meshes.accepts(&AssetType::of::<Mesh>()));
        assert!(!meshes.accepts(&AssetType::of::<Texture>()));
    }
}
