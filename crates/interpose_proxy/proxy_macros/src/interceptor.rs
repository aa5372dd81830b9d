//! Code generation for `#[interceptor]`.

use interpose_macro_utils::{InterposeCrate, linked_entry, resolve_crate_path, static_ident};
use proc_macro2::TokenStream;
use quote::quote;
use syn::ItemImpl;

pub(crate) fn generate_interceptor(input: &ItemImpl) -> TokenStream {
    let Some((_, path, _)) = &input.trait_ else {
        return syn::Error::new_spanned(
            &input.self_ty,
            "#[interceptor] applies to `impl Interceptor for T` blocks",
        )
        .to_compile_error();
    };
    if !path
        .segments
        .last()
        .is_some_and(|segment| segment.ident == "Interceptor")
    {
        return syn::Error::new_spanned(path, "#[interceptor] expects an `Interceptor` impl")
            .to_compile_error();
    }
    if !input.generics.params.is_empty() {
        return syn::Error::new_spanned(&input.generics, "#[interceptor] types cannot be generic")
            .to_compile_error();
    }

    let ip = resolve_crate_path(InterposeCrate::Proxy);
    let self_ty = &input.self_ty;
    let name = quote!(#self_ty).to_string();
    let entry = linked_entry(
        &ip,
        "INTERCEPTORS",
        &static_ident("INTERCEPTOR", &[&name]),
        quote!(#ip::InterceptorEntry),
        quote!(#ip::InterceptorEntry::of::<#self_ty>()),
    );

    quote! {
        #input

        #entry
    }
}
