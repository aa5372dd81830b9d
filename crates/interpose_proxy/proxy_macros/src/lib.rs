//! Procedural macros for the Interpose proxy framework.
//!
//! Provides `#[contract]` for proxyable traits and types, `#[implements]`
//! and `#[interceptor]` for link-time registration, and `#[intercept]` for
//! marking types that discovery should register behind a proxy.

mod common;
mod contract;
mod implements;
mod interceptor;

use proc_macro::TokenStream;

/// Declares a contract and generates its proxy type.
///
/// On a trait, the contract is `dyn Trait` and the proxy is `TraitProxy`.
/// The trait must have `Send + Sync` supertraits and every method must take
/// `&self`. Async methods return `BoxFuture<'static, T>`.
///
/// On an inherent impl block, the type is its own contract and every `pub`
/// method taking `&self` is forwarded; `async fn` is supported there.
///
/// Every proxy method returns `Option<Value>`: `None` for calls that
/// completed (or are still pending), or the value supplied by the
/// interceptor's `on_exception`.
///
/// # Example
///
/// ```ignore
/// use interpose_proxy::{contract, BoxFuture};
///
/// #[contract]
/// pub trait Calculator: Send + Sync {
///     fn add(&self, a: i32, b: i32) -> i32;
///     fn notify(&self, message: String) -> BoxFuture<'static, ()>;
/// }
/// ```
#[proc_macro_attribute]
pub fn contract(attr: TokenStream, item: TokenStream) -> TokenStream {
    if !attr.is_empty() {
        return syn::Error::new(
            proc_macro2::Span::call_site(),
            "#[contract] takes no arguments",
        )
        .to_compile_error()
        .into();
    }
    match syn::parse_macro_input!(item as syn::Item) {
        syn::Item::Trait(input) => contract::generate_trait_contract(&input).into(),
        syn::Item::Impl(input) => contract::generate_inherent_contract(&input).into(),
        other => syn::Error::new_spanned(other, "#[contract] applies to traits and impl blocks")
            .to_compile_error()
            .into(),
    }
}

/// Records that a type implements trait-object contracts.
///
/// Generates `Implements<dyn Contract>` for the type and adds the upcast to
/// the link-time registry, so proxies can be created by type key.
///
/// # Example
///
/// ```ignore
/// #[derive(Injectable)]
/// #[implements(dyn Calculator)]
/// struct BasicCalculator;
/// ```
#[proc_macro_attribute]
pub fn implements(attr: TokenStream, item: TokenStream) -> TokenStream {
    implements::generate_implements(attr.into(), item.into()).into()
}

/// Registers an `Interceptor` impl at link time.
///
/// The interceptor type must also be `Injectable` to be constructed by type.
///
/// # Example
///
/// ```ignore
/// #[interceptor]
/// impl Interceptor for Logging {
///     fn on_exception(&self, failure: Failure, _: &MethodDescriptor) -> Option<Value> {
///         None
///     }
/// }
/// ```
#[proc_macro_attribute]
pub fn interceptor(attr: TokenStream, item: TokenStream) -> TokenStream {
    if !attr.is_empty() {
        return syn::Error::new(
            proc_macro2::Span::call_site(),
            "#[interceptor] takes no arguments",
        )
        .to_compile_error()
        .into();
    }
    let input = syn::parse_macro_input!(item as syn::ItemImpl);
    interceptor::generate_interceptor(&input).into()
}

/// Marks a type for discovery behind an interceptor.
///
/// - `with = Interceptor` - the interceptor type (required)
/// - `lifetime = Singleton | Scoped | Transient` - the registration
///   lifetime (required)
/// - `implements(dyn A, dyn B)` - contracts the type implements; discovery
///   registers the first one, or the type itself if none are listed
///
/// The attribute may be repeated; each occurrence adds one marker. Requires
/// `interpose_discovery`.
///
/// # Example
///
/// ```ignore
/// #[derive(Injectable)]
/// #[intercept(with = Logging, lifetime = Scoped, implements(dyn Calculator))]
/// struct BasicCalculator;
/// ```
#[proc_macro_attribute]
pub fn intercept(attr: TokenStream, item: TokenStream) -> TokenStream {
    implements::generate_intercept(attr.into(), item.into()).into()
}
