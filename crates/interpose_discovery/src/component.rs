//! Exported types and the components that group them.
//!
//! `#[intercept]` contributes one [`ExportedType`] per marked type to
//! [`EXPORTED_TYPES`] at link time. Discovery walks [`Component`]s, either
//! built by hand or grouped from that slice with [`Component::linked`].

use core::fmt;

use indexmap::IndexMap;
use interpose_container::TypeKey;

use crate::marker::Marker;

/// A type made visible to discovery, with its declared contracts and markers.
pub struct ExportedType {
    name: &'static str,
    module_path: &'static str,
    key: fn() -> TypeKey,
    interfaces: &'static [fn() -> TypeKey],
    markers: &'static [Marker],
}

impl ExportedType {
    /// Describes an exported type.
    ///
    /// `interfaces` are in declaration order; the first one is the contract
    /// discovery registers.
    #[must_use]
    pub const fn new(
        name: &'static str,
        module_path: &'static str,
        key: fn() -> TypeKey,
        interfaces: &'static [fn() -> TypeKey],
        markers: &'static [Marker],
    ) -> Self {
        Self {
            name,
            module_path,
            key,
            interfaces,
            markers,
        }
    }

    /// The type's short name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The module the type was declared in.
    #[must_use]
    pub fn module_path(&self) -> &'static str {
        self.module_path
    }

    /// The crate the type was declared in.
    #[must_use]
    pub fn crate_name(&self) -> &'static str {
        self.module_path
            .split_once("::")
            .map_or(self.module_path, |(krate, _)| krate)
    }

    /// The type's key.
    #[must_use]
    pub fn key(&self) -> TypeKey {
        (self.key)()
    }

    /// Declared contracts, in declaration order.
    pub fn interfaces(&self) -> impl Iterator<Item = TypeKey> + '_ {
        self.interfaces.iter().map(|interface| interface())
    }

    /// The contract discovery registers: the first declared interface, else
    /// the type itself.
    #[must_use]
    pub fn contract(&self) -> TypeKey {
        self.interfaces().next().unwrap_or_else(|| self.key())
    }

    /// Interception markers, in declaration order.
    #[must_use]
    pub fn markers(&self) -> &'static [Marker] {
        self.markers
    }
}

impl fmt::Debug for ExportedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportedType")
            .field("name", &self.name)
            .field("module_path", &self.module_path)
            .field("interfaces", &self.interfaces().collect::<Vec<_>>())
            .field("markers", &self.markers)
            .finish()
    }
}

/// Types contributed at link time by `#[intercept]`.
#[linkme::distributed_slice]
pub static EXPORTED_TYPES: [&'static ExportedType] = [..];

/// Implemented by `#[intercept]` for each marked type.
pub trait Exported: 'static {
    /// The type's export record.
    fn exported() -> &'static ExportedType;
}

/// A named group of exported types, scanned together.
///
/// # Example
///
/// ```
/// use interpose_container::{Lifetime, TypeKey};
/// use interpose_discovery::{Component, ExportedType, Marker};
///
/// struct Audit;
/// struct Ledger;
///
/// static LEDGER: ExportedType = ExportedType::new(
///     "Ledger",
///     module_path!(),
///     TypeKey::of::<Ledger>,
///     &[],
///     &[Marker::new(TypeKey::of::<Audit>, Lifetime::Scoped)],
/// );
///
/// let component = Component::new("billing").with_export(&LEDGER);
/// assert_eq!(component.types().len(), 1);
/// assert_eq!(component.types()[0].contract(), TypeKey::of::<Ledger>());
/// ```
#[derive(Debug, Clone)]
pub struct Component {
    name: String,
    types: Vec<&'static ExportedType>,
}

impl Component {
    /// Creates an empty component.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            types: Vec::new(),
        }
    }

    /// Adds an `#[intercept]`-marked type.
    #[must_use]
    pub fn with<T: Exported>(self) -> Self {
        self.with_export(T::exported())
    }

    /// Adds an export record.
    #[must_use]
    pub fn with_export(mut self, exported: &'static ExportedType) -> Self {
        self.types.push(exported);
        self
    }

    /// Groups every type contributed at link time by declaring crate.
    ///
    /// Components and their types are ordered by crate and type name, so
    /// the result does not depend on link order.
    #[must_use]
    pub fn linked() -> Vec<Self> {
        let mut groups: IndexMap<&'static str, Vec<&'static ExportedType>> = IndexMap::new();
        for exported in EXPORTED_TYPES {
            groups.entry(exported.crate_name()).or_default().push(*exported);
        }
        groups.sort_unstable_keys();

        groups
            .into_iter()
            .map(|(name, mut types)| {
                types.sort_by_key(|exported| (exported.module_path(), exported.name()));
                Self {
                    name: name.to_string(),
                    types,
                }
            })
            .collect()
    }

    /// The component's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The component's exported types.
    #[must_use]
    pub fn types(&self) -> &[&'static ExportedType] {
        &self.types
    }
}
