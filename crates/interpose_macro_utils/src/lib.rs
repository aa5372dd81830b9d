//! Shared utilities for Interpose procedural macro crates.
//!
//! Generated code names Interpose items by absolute path, which differs
//! between a direct dependency on `interpose_proxy` and the `interpose`
//! umbrella. [`resolve_crate_path`] picks the right one. [`linked_entry`]
//! builds the link-time registration statics every macro emits.

use proc_macro_crate::{FoundCrate, crate_name};
use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::Ident;

/// An Interpose crate that macro-generated code may reference.
pub enum InterposeCrate {
    /// `interpose_container`
    Container,
    /// `interpose_proxy`
    Proxy,
    /// `interpose_discovery`
    Discovery,
}

impl InterposeCrate {
    /// Package name in `Cargo.toml`.
    fn package(&self) -> &'static str {
        match self {
            Self::Container => "interpose_container",
            Self::Proxy => "interpose_proxy",
            Self::Discovery => "interpose_discovery",
        }
    }
}

/// Returns a [`TokenStream`] path for the given Interpose crate.
///
/// Resolution order:
/// 1. The crate itself, or a direct (possibly renamed) dependency.
/// 2. `interpose::<name>` through the umbrella crate.
/// 3. The bare package name, so a missing dependency surfaces as an
///    unresolved path at the call site.
pub fn resolve_crate_path(krate: InterposeCrate) -> TokenStream {
    let name = krate.package();

    let package = Ident::new(name, Span::call_site());

    match crate_name(name) {
        Ok(FoundCrate::Itself) => quote!(#package),
        Ok(FoundCrate::Name(renamed)) => {
            let renamed = Ident::new(&renamed, Span::call_site());
            quote!(#renamed)
        }
        Err(_) => match crate_name("interpose") {
            Ok(FoundCrate::Name(umbrella)) => {
                let umbrella = Ident::new(&umbrella, Span::call_site());
                quote!(#umbrella::#package)
            }
            _ => quote!(#package),
        },
    }
}

/// Emits a static contributing `value` to the link-time slice `slice` of
/// the crate at `krate`.
///
/// The crate must re-export `linkme` and the slice from `__private`.
pub fn linked_entry(
    krate: &TokenStream,
    slice: &str,
    name: &Ident,
    ty: TokenStream,
    value: TokenStream,
) -> TokenStream {
    let slice = Ident::new(slice, Span::call_site());
    quote! {
        #[doc(hidden)]
        #[#krate::__private::linkme::distributed_slice(#krate::__private::#slice)]
        #[linkme(crate = #krate::__private::linkme)]
        static #name: #ty = #value;
    }
}

/// Builds a unique, screaming-case static name from a prefix and a type
/// or item name.
pub fn static_ident(prefix: &str, parts: &[&str]) -> Ident {
    let mut name = format!("__INTERPOSE_{prefix}");
    for part in parts {
        name.push('_');
        name.push_str(&sanitize(part).to_uppercase());
    }
    Ident::new(&name, Span::call_site())
}

/// Keeps identifier characters and turns everything else into `_`.
fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_names_are_identifiers() {
        let ident = static_ident("IMPLEMENTS", &["Calculator", "dyn calc :: Math"]);
        assert_eq!(
            ident.to_string(),
            "__INTERPOSE_IMPLEMENTS_CALCULATOR_DYN_CALC____MATH"
        );
    }
}
