//! Code generation for `#[implements]` and `#[intercept]`.

use interpose_macro_utils::{InterposeCrate, linked_entry, resolve_crate_path, static_ident};
use proc_macro2::TokenStream;
use quote::quote;
use syn::parse::{Parse, Parser};
use syn::punctuated::Punctuated;
use syn::{Attribute, Ident, Item, Path, Token, Type};

use crate::common::{implements_items, validate_contract_types};

/// The annotated type's name, rejecting generic and unsupported items.
fn target_ident(item: &Item, attribute: &str) -> Result<Ident, syn::Error> {
    let (ident, generics) = match item {
        Item::Struct(item) => (&item.ident, &item.generics),
        Item::Enum(item) => (&item.ident, &item.generics),
        other => {
            return Err(syn::Error::new_spanned(
                other,
                format!("#[{attribute}] applies to structs and enums"),
            ));
        }
    };
    if !generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            generics,
            format!("#[{attribute}] types cannot be generic"),
        ));
    }
    Ok(ident.clone())
}

/// Generates `#[implements(dyn A, ..)]`.
pub(crate) fn generate_implements(attr: TokenStream, item: TokenStream) -> TokenStream {
    let item: Item = match syn::parse2(item) {
        Ok(item) => item,
        Err(err) => return err.to_compile_error(),
    };
    let contracts = match Punctuated::<Type, Token![,]>::parse_terminated.parse2(attr) {
        Ok(contracts) => contracts.into_iter().collect::<Vec<_>>(),
        Err(err) => return err.to_compile_error(),
    };
    if contracts.is_empty() {
        return syn::Error::new(
            proc_macro2::Span::call_site(),
            "#[implements] requires at least one contract, e.g. #[implements(dyn Calculator)]",
        )
        .to_compile_error();
    }
    if let Some(err) = validate_contract_types(&contracts) {
        return err;
    }
    let ident = match target_ident(&item, "implements") {
        Ok(ident) => ident,
        Err(err) => return err.to_compile_error(),
    };

    let ip = resolve_crate_path(InterposeCrate::Proxy);
    let items = implements_items(
        &ip,
        &quote!(#ip::Implements),
        &quote!(#ip::ImplementationEntry),
        &ident,
        &contracts,
    );

    quote! {
        #item

        #items
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// #[intercept]
// ─────────────────────────────────────────────────────────────────────────────

/// One parsed `#[intercept(..)]` occurrence.
struct InterceptArgs {
    with: Path,
    lifetime: Ident,
    implements: Vec<Type>,
}

impl InterceptArgs {
    fn parse(tokens: TokenStream) -> Result<Self, syn::Error> {
        let mut with = None;
        let mut lifetime = None;
        let mut implements = Vec::new();

        let parser = syn::meta::parser(|meta| {
            if meta.path.is_ident("with") {
                with = Some(meta.value()?.parse::<Path>()?);
                Ok(())
            } else if meta.path.is_ident("lifetime") {
                let value = meta.value()?.parse::<Ident>()?;
                if !matches!(
                    value.to_string().as_str(),
                    "Singleton" | "Scoped" | "Transient"
                ) {
                    return Err(syn::Error::new_spanned(
                        &value,
                        "expected `Singleton`, `Scoped` or `Transient`",
                    ));
                }
                lifetime = Some(value);
                Ok(())
            } else if meta.path.is_ident("implements") {
                let content;
                syn::parenthesized!(content in meta.input);
                let contracts = content.parse_terminated(Type::parse, Token![,])?;
                implements.extend(contracts);
                Ok(())
            } else {
                Err(meta.error("expected `with`, `lifetime` or `implements`"))
            }
        });
        parser.parse2(tokens)?;

        let span = proc_macro2::Span::call_site();
        Ok(Self {
            with: with.ok_or_else(|| {
                syn::Error::new(span, "#[intercept] requires `with = InterceptorType`")
            })?,
            lifetime: lifetime.ok_or_else(|| {
                syn::Error::new(
                    span,
                    "#[intercept] requires `lifetime = Singleton | Scoped | Transient`",
                )
            })?,
            implements,
        })
    }
}

fn is_intercept(attr: &Attribute) -> bool {
    attr.path()
        .segments
        .last()
        .is_some_and(|segment| segment.ident == "intercept")
}

/// Removes further `#[intercept]` attributes from the item and returns them.
fn take_intercepts(item: &mut Item) -> Vec<Attribute> {
    let attrs = match item {
        Item::Struct(item) => &mut item.attrs,
        Item::Enum(item) => &mut item.attrs,
        _ => return Vec::new(),
    };
    let (taken, kept): (Vec<_>, Vec<_>) = attrs.drain(..).partition(is_intercept);
    *attrs = kept;
    taken
}

/// Generates `#[intercept(..)]`, folding repeated occurrences into one
/// exported type.
pub(crate) fn generate_intercept(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut item: Item = match syn::parse2(item) {
        Ok(item) => item,
        Err(err) => return err.to_compile_error(),
    };
    let ident = match target_ident(&item, "intercept") {
        Ok(ident) => ident,
        Err(err) => return err.to_compile_error(),
    };

    let mut occurrences = vec![attr];
    for extra in take_intercepts(&mut item) {
        match extra.meta.require_list() {
            Ok(list) => occurrences.push(list.tokens.clone()),
            Err(err) => return err.to_compile_error(),
        }
    }

    let mut markers = Vec::new();
    let mut contracts: Vec<Type> = Vec::new();
    for tokens in occurrences {
        let args = match InterceptArgs::parse(tokens) {
            Ok(args) => args,
            Err(err) => return err.to_compile_error(),
        };
        for contract in args.implements {
            if !contracts.contains(&contract) {
                contracts.push(contract);
            }
        }
        markers.push((args.with, args.lifetime));
    }
    if let Some(err) = validate_contract_types(&contracts) {
        return err;
    }

    let dp = resolve_crate_path(InterposeCrate::Discovery);
    let private = quote!(#dp::__private);
    let implements = implements_items(
        &dp,
        &quote!(#private::Implements),
        &quote!(#private::ImplementationEntry),
        &ident,
        &contracts,
    );

    let name = ident.to_string();
    let marker_values = markers.iter().map(|(with, lifetime)| {
        quote!(#private::Marker::new(#private::TypeKey::of::<#with>, #private::Lifetime::#lifetime))
    });
    let exported = static_ident("EXPORT", &[&name]);
    let entry = linked_entry(
        &dp,
        "EXPORTED_TYPES",
        &static_ident("EXPORT_ENTRY", &[&name]),
        quote!(&'static #private::ExportedType),
        quote!(&#exported),
    );

    quote! {
        #item

        #implements

        #[doc(hidden)]
        static #exported: #private::ExportedType = #private::ExportedType::new(
            #name,
            ::core::module_path!(),
            #private::TypeKey::of::<#ident>,
            &[#(#private::TypeKey::of::<#contracts>),*],
            &[#(#marker_values),*],
        );

        #entry

        impl #private::Exported for #ident {
            fn exported() -> &'static #private::ExportedType {
                &#exported
            }
        }
    }
}
