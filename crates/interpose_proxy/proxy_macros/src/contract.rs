//! Code generation for `#[contract]` on traits and inherent impl blocks.

use interpose_macro_utils::{InterposeCrate, resolve_crate_path};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{ImplItem, ItemImpl, ItemTrait, TraitItem, TypeParamBound, Visibility};

use crate::common::{contract_items, forwarding_method, method_descriptor, validate_method};

/// Generates the proxy for a trait contract (`dyn Trait`).
pub(crate) fn generate_trait_contract(input: &ItemTrait) -> TokenStream {
    if !input.generics.params.is_empty() {
        return syn::Error::new_spanned(&input.generics, "#[contract] traits cannot be generic")
            .to_compile_error();
    }

    let has_bound = |name: &str| {
        input.supertraits.iter().any(|bound| match bound {
            TypeParamBound::Trait(bound) => bound
                .path
                .segments
                .last()
                .is_some_and(|segment| segment.ident == name),
            _ => false,
        })
    };
    if !has_bound("Send") || !has_bound("Sync") {
        return syn::Error::new_spanned(
            &input.ident,
            "#[contract] traits must have `Send + Sync` supertraits",
        )
        .to_compile_error();
    }

    let ip = resolve_crate_path(InterposeCrate::Proxy);
    let trait_name = &input.ident;
    let contract_name = trait_name.to_string();
    let proxy = format_ident!("{}Proxy", trait_name);
    let vis = &input.vis;

    let mut descriptors = Vec::new();
    let mut statics = Vec::new();
    let mut methods = Vec::new();

    for item in &input.items {
        let TraitItem::Fn(method) = item else {
            continue;
        };

        if let Some(asyncness) = &method.sig.asyncness {
            return syn::Error::new_spanned(
                asyncness,
                "#[contract] trait methods cannot be `async fn`; \
                 return `BoxFuture<'static, T>` instead",
            )
            .to_compile_error();
        }
        if let Some(err) = validate_method(&method.sig) {
            return err;
        }

        let (descriptor, tokens) = method_descriptor(&ip, &contract_name, &method.sig);
        methods.push(forwarding_method(
            &ip,
            &method.attrs,
            vis,
            &method.sig,
            &descriptor,
        ));
        statics.push(tokens);
        descriptors.push(descriptor);
    }

    let contract_ty = quote!(dyn #trait_name);
    let items = contract_items(&ip, &contract_ty, &contract_name, &proxy, &descriptors);
    let proxy_doc = format!("Intercepting proxy for [`{contract_name}`].");

    quote! {
        #input

        #[doc = #proxy_doc]
        #vis struct #proxy {
            dispatcher: #ip::Dispatcher<dyn #trait_name>,
        }

        impl #proxy {
            #(#methods)*
        }

        #(#statics)*

        #items
    }
}

/// Generates the proxy for an inherent impl block; the type is its own
/// contract. Only `pub` methods taking `&self` are forwarded.
pub(crate) fn generate_inherent_contract(input: &ItemImpl) -> TokenStream {
    if let Some((_, path, _)) = &input.trait_ {
        return syn::Error::new_spanned(
            path,
            "#[contract] on a trait impl is not supported; \
             put #[contract] on the trait definition instead",
        )
        .to_compile_error();
    }
    if !input.generics.params.is_empty() {
        return syn::Error::new_spanned(&input.generics, "#[contract] types cannot be generic")
            .to_compile_error();
    }

    let syn::Type::Path(type_path) = input.self_ty.as_ref() else {
        return syn::Error::new_spanned(&input.self_ty, "#[contract] requires a named type")
            .to_compile_error();
    };
    let Some(last) = type_path.path.segments.last() else {
        return syn::Error::new_spanned(&input.self_ty, "#[contract] requires a named type")
            .to_compile_error();
    };

    let ip = resolve_crate_path(InterposeCrate::Proxy);
    let self_ty = &input.self_ty;
    let contract_name = last.ident.to_string();
    let proxy = format_ident!("{}Proxy", last.ident);
    let public = Visibility::Public(Default::default());

    let mut descriptors = Vec::new();
    let mut statics = Vec::new();
    let mut methods = Vec::new();

    for item in &input.items {
        let ImplItem::Fn(method) = item else {
            continue;
        };
        // Associated functions such as constructors are not part of the surface.
        if !matches!(method.vis, Visibility::Public(_))
            || !matches!(method.sig.inputs.first(), Some(syn::FnArg::Receiver(_)))
        {
            continue;
        }
        if let Some(err) = validate_method(&method.sig) {
            return err;
        }

        let (descriptor, tokens) = method_descriptor(&ip, &contract_name, &method.sig);
        methods.push(forwarding_method(
            &ip,
            &method.attrs,
            &public,
            &method.sig,
            &descriptor,
        ));
        statics.push(tokens);
        descriptors.push(descriptor);
    }

    let contract_ty = quote!(#self_ty);
    let items = contract_items(&ip, &contract_ty, &contract_name, &proxy, &descriptors);
    let proxy_doc = format!("Intercepting proxy for [`{contract_name}`].");

    quote! {
        #input

        #[doc = #proxy_doc]
        pub struct #proxy {
            dispatcher: #ip::Dispatcher<#self_ty>,
        }

        impl #proxy {
            #(#methods)*
        }

        #(#statics)*

        #items
    }
}
