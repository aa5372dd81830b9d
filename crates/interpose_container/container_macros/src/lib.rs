//! Procedural macros for the `interpose_container` crate.
//!
//! This crate provides `#[derive(Injectable)]`, which describes a struct's
//! fields as its primary constructor.

mod injectable;

use proc_macro::TokenStream;

/// Derive macro for the `Injectable` trait.
///
/// Every field becomes a constructor parameter, in declaration order. Fields
/// must be `Arc<T>` (any [`Dependency`]); fields marked `#[inject(default)]`
/// are filled with `Default::default()` instead.
///
/// Non-generic types are also added to the link-time constructor catalog,
/// so `Constructors::linked()` can build them recursively.
///
/// [`Dependency`]: https://docs.rs/interpose_container/latest/interpose_container/trait.Dependency.html
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use interpose_container::Injectable;
///
/// #[derive(Injectable)]
/// struct ReportService {
///     store: Arc<dyn Store>,
///     #[inject(default)]
///     generated: AtomicU64,
/// }
/// ```
#[proc_macro_derive(Injectable, attributes(inject))]
pub fn derive_injectable(input: TokenStream) -> TokenStream {
    injectable::derive_injectable(input)
}
