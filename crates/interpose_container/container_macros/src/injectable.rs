//! Derive macro for the `Injectable` trait.

use darling::ast::{Data, Style};
use darling::{FromDeriveInput, FromField};
use interpose_macro_utils::{InterposeCrate, linked_entry, resolve_crate_path, static_ident};
use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{DeriveInput, Ident, Type, parse_macro_input};

/// Parsed attributes for the macro.
#[derive(FromDeriveInput)]
#[darling(attributes(inject), supports(struct_any))]
struct InjectableArgs {
    ident: Ident,
    generics: syn::Generics,
    data: Data<(), InjectField>,
}

/// A single field and its `#[inject(...)]` options.
#[derive(FromField)]
#[darling(attributes(inject))]
struct InjectField {
    ident: Option<Ident>,
    ty: Type,

    /// Fill the field with `Default::default()` instead of resolving it.
    #[darling(default)]
    default: bool,
}

/// Implementation of the `#[derive(Injectable)]` macro.
pub(crate) fn derive_injectable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let args = match InjectableArgs::from_derive_input(&input) {
        Ok(args) => args,
        Err(err) => return err.write_errors().into(),
    };

    let Data::Struct(fields) = args.data else {
        return syn::Error::new_spanned(&input.ident, "Injectable can only be derived for structs")
            .to_compile_error()
            .into();
    };

    let ic = resolve_crate_path(InterposeCrate::Container);
    let name = &args.ident;
    let (impl_generics, ty_generics, where_clause) = args.generics.split_for_impl();

    let mut dependency_types = Vec::new();
    let mut bindings = Vec::new();
    let mut values = Vec::new();

    for (index, field) in fields.fields.iter().enumerate() {
        if field.default {
            values.push(quote!(::core::default::Default::default()));
            continue;
        }

        let binding = format_ident!("__dep{}", index);
        let ty = &field.ty;
        dependency_types.push(quote!(#ty));
        values.push(quote!(#binding));
        bindings.push(binding);
    }

    let body = match fields.style {
        Style::Struct => {
            let names = fields.fields.iter().filter_map(|field| field.ident.as_ref());
            quote!(Self { #(#names: #values),* })
        }
        Style::Tuple => quote!(Self(#(#values),*)),
        Style::Unit => quote!(Self),
    };

    // Generic types cannot be named in a static, so only concrete types link.
    let entry = if args.generics.params.is_empty() {
        let static_name = static_ident("CONSTRUCTOR", &[&name.to_string()]);
        linked_entry(
            &ic,
            "CONSTRUCTORS",
            &static_name,
            quote!(#ic::ConstructorEntry),
            quote!(#ic::ConstructorEntry::of::<#name>()),
        )
    } else {
        quote! {}
    };

    let expanded = quote! {
        impl #impl_generics #ic::Injectable for #name #ty_generics #where_clause {
            type Dependencies = (#(#dependency_types,)*);

            fn construct(
                (#(#bindings,)*): Self::Dependencies,
            ) -> Self {
                #body
            }
        }

        #entry
    };

    expanded.into()
}
