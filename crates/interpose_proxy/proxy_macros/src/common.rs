//! Shared utilities for proxy macro code generation.

use interpose_macro_utils::{linked_entry, static_ident};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{
    FnArg, GenericArgument, Ident, Pat, PathArguments, ReturnType, Signature, Type, TypeParamBound,
};

/// What a method's output is, once settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OutputKind {
    /// `()` or no return type.
    Unit,
    /// `Result<T, E>`.
    Result,
    /// Any other value.
    Value,
}

/// How a method returns its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Delivery {
    /// Returned directly.
    Sync,
    /// Returned as a boxed future (`BoxFuture<'static, T>` or
    /// `Pin<Box<dyn Future<Output = T> + Send>>`).
    Future,
    /// An `async fn` on an inherent impl.
    AsyncFn,
}

/// Classified return shape of a contract method.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Shape {
    pub delivery: Delivery,
    pub output: OutputKind,
}

impl Shape {
    /// The runtime `ReturnShape` variant.
    pub(crate) fn return_shape(&self, ip: &TokenStream) -> TokenStream {
        match self.delivery {
            Delivery::Sync => quote!(#ip::ReturnShape::Sync),
            Delivery::Future | Delivery::AsyncFn => quote!(#ip::ReturnShape::Async),
        }
    }
}

/// Classifies a method's return shape from its signature.
pub(crate) fn classify(sig: &Signature) -> Shape {
    let ty = match &sig.output {
        ReturnType::Default => None,
        ReturnType::Type(_, ty) => Some(ty.as_ref()),
    };

    if sig.asyncness.is_some() {
        return Shape {
            delivery: Delivery::AsyncFn,
            output: ty.map_or(OutputKind::Unit, output_kind),
        };
    }

    match ty {
        None => Shape {
            delivery: Delivery::Sync,
            output: OutputKind::Unit,
        },
        Some(ty) => match future_output(ty) {
            Some(output) => Shape {
                delivery: Delivery::Future,
                output: output_kind(output),
            },
            None => Shape {
                delivery: Delivery::Sync,
                output: output_kind(ty),
            },
        },
    }
}

/// Classifies a settled output type.
fn output_kind(ty: &Type) -> OutputKind {
    match ty {
        Type::Tuple(tuple) if tuple.elems.is_empty() => OutputKind::Unit,
        Type::Paren(inner) => output_kind(&inner.elem),
        Type::Path(type_path)
            if type_path
                .path
                .segments
                .last()
                .is_some_and(|segment| segment.ident == "Result") =>
        {
            OutputKind::Result
        }
        _ => OutputKind::Value,
    }
}

/// Extracts `T` from `BoxFuture<'_, T>` or `Pin<Box<dyn Future<Output = T>>>`.
fn future_output(ty: &Type) -> Option<&Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };

    if segment.ident == "BoxFuture" {
        return args.args.iter().find_map(|arg| match arg {
            GenericArgument::Type(output) => Some(output),
            _ => None,
        });
    }

    if segment.ident == "Pin"
        && let Some(GenericArgument::Type(Type::Path(boxed))) = args.args.first()
        && let Some(boxed) = boxed.path.segments.last()
        && boxed.ident == "Box"
        && let PathArguments::AngleBracketed(boxed_args) = &boxed.arguments
        && let Some(GenericArgument::Type(Type::TraitObject(object))) = boxed_args.args.first()
    {
        return object.bounds.iter().find_map(|bound| {
            let TypeParamBound::Trait(bound) = bound else {
                return None;
            };
            let future = bound.path.segments.last()?;
            if future.ident != "Future" {
                return None;
            }
            let PathArguments::AngleBracketed(future_args) = &future.arguments else {
                return None;
            };
            future_args.args.iter().find_map(|arg| match arg {
                GenericArgument::AssocType(assoc) if assoc.ident == "Output" => Some(&assoc.ty),
                _ => None,
            })
        });
    }

    None
}

/// A method parameter after the receiver.
pub(crate) struct Param {
    /// Binding used in generated code.
    pub ident: Ident,
    /// Name reported to hooks.
    pub name: String,
    /// Declared type.
    pub ty: Type,
}

/// Collects typed parameters, naming non-identifier patterns `__argN`.
pub(crate) fn params(sig: &Signature) -> Vec<Param> {
    sig.inputs
        .iter()
        .filter_map(|arg| match arg {
            FnArg::Typed(pat_type) => Some(pat_type),
            FnArg::Receiver(_) => None,
        })
        .enumerate()
        .map(|(index, pat_type)| match &*pat_type.pat {
            Pat::Ident(pat_ident) => Param {
                ident: pat_ident.ident.clone(),
                name: pat_ident.ident.to_string(),
                ty: (*pat_type.ty).clone(),
            },
            _ => Param {
                ident: format_ident!("__arg{}", index),
                name: format!("arg{index}"),
                ty: (*pat_type.ty).clone(),
            },
        })
        .collect()
}

/// Validates that a contract method takes `&self` and is not generic.
pub(crate) fn validate_method(sig: &Signature) -> Option<TokenStream> {
    match sig.inputs.first() {
        Some(FnArg::Receiver(receiver))
            if receiver.reference.is_some() && receiver.mutability.is_none() => {}
        Some(FnArg::Receiver(receiver)) => {
            return Some(
                syn::Error::new_spanned(
                    receiver,
                    "#[contract] methods must take `&self`; proxies share their target",
                )
                .to_compile_error(),
            );
        }
        _ => {
            return Some(
                syn::Error::new_spanned(
                    sig.fn_token,
                    "#[contract] methods must take `&self` as the first parameter",
                )
                .to_compile_error(),
            );
        }
    }

    if !sig.generics.params.is_empty() {
        return Some(
            syn::Error::new_spanned(
                &sig.generics,
                "#[contract] methods cannot have generic parameters",
            )
            .to_compile_error(),
        );
    }

    None
}

/// Generates the invoke closure body calling `method` on `__target`.
pub(crate) fn invoke_body(ip: &TokenStream, method: &Ident, params: &[Param], shape: Shape) -> TokenStream {
    let args = params.iter().map(|param| &param.ident);
    let call = quote!(__target.#method(#(#args),*));

    let settle = |value: TokenStream| match shape.output {
        OutputKind::Unit => quote! {{
            #value;
            #ip::Outcome::unit()
        }},
        OutputKind::Result => quote!(#ip::Outcome::from_result(#value)),
        OutputKind::Value => quote!(#ip::Outcome::from_value(#value)),
    };

    match shape.delivery {
        Delivery::Sync => {
            let outcome = settle(call);
            quote!(#ip::Invoked::ready(#outcome))
        }
        Delivery::Future => {
            let outcome = settle(quote!(__future.await));
            quote! {
                let __future = #call;
                #ip::Invoked::pending(async move { #outcome })
            }
        }
        Delivery::AsyncFn => {
            let outcome = settle(quote!(#call.await));
            quote! {
                let __target = ::std::sync::Arc::clone(__target);
                #ip::Invoked::pending(async move { #outcome })
            }
        }
    }
}

/// Generates one forwarding method on a proxy struct.
pub(crate) fn forwarding_method(
    ip: &TokenStream,
    attrs: &[syn::Attribute],
    vis: &syn::Visibility,
    sig: &Signature,
    descriptor: &Ident,
) -> TokenStream {
    let method = &sig.ident;
    let params = params(sig);
    let shape = classify(sig);
    let docs = attrs.iter().filter(|attr| attr.path().is_ident("doc"));
    let idents: Vec<_> = params.iter().map(|param| &param.ident).collect();
    let types = params.iter().map(|param| &param.ty);
    let body = invoke_body(ip, method, &params, shape);

    quote! {
        #(#docs)*
        #vis fn #method(&self, #(#idents: #types),*) -> ::core::option::Option<#ip::Value> {
            self.dispatcher.dispatch(
                &#descriptor,
                (#(#idents,)*),
                |__target, (#(#idents,)*)| { #body },
            )
        }
    }
}

/// Generates the static descriptor of one method.
pub(crate) fn method_descriptor(
    ip: &TokenStream,
    contract: &str,
    sig: &Signature,
) -> (Ident, TokenStream) {
    let name = sig.ident.to_string();
    let ident = static_ident("METHOD", &[contract, &name]);
    let param_names = params(sig).into_iter().map(|param| param.name);
    let shape = classify(sig).return_shape(ip);
    let tokens = quote! {
        #[doc(hidden)]
        static #ident: #ip::MethodDescriptor =
            #ip::MethodDescriptor::new(#contract, #name, &[#(#param_names),*], #shape);
    };
    (ident, tokens)
}

/// Generates the contract descriptor, `Contract` impl and link-time entry.
pub(crate) fn contract_items(
    ip: &TokenStream,
    contract_ty: &TokenStream,
    contract_name: &str,
    proxy: &Ident,
    descriptors: &[Ident],
) -> TokenStream {
    let methods = static_ident("METHODS", &[contract_name]);
    let descriptor = static_ident("CONTRACT", &[contract_name]);
    let count = descriptors.len();
    let entry = linked_entry(
        ip,
        "CONTRACTS",
        &static_ident("CONTRACT_ENTRY", &[contract_name]),
        quote!(#ip::ContractEntry),
        quote!(#ip::ContractEntry::of::<#contract_ty>()),
    );

    quote! {
        #[doc(hidden)]
        static #methods: [&#ip::MethodDescriptor; #count] = [#(&#descriptors),*];

        #[doc(hidden)]
        static #descriptor: #ip::ContractDescriptor =
            #ip::ContractDescriptor::new(#contract_name, &#methods);

        impl #ip::Contract for #contract_ty {
            type Proxy = #proxy;

            fn descriptor() -> &'static #ip::ContractDescriptor {
                &#descriptor
            }

            fn synthesize(dispatcher: #ip::Dispatcher<Self>) -> Self::Proxy {
                #proxy { dispatcher }
            }
        }

        #entry
    }
}

/// Generates `Implements` impls and link-time entries for each contract.
///
/// `krate` must re-export `linkme` and the `IMPLEMENTATIONS` slice from
/// `__private`.
pub(crate) fn implements_items(
    krate: &TokenStream,
    implements: &TokenStream,
    entry: &TokenStream,
    implementation: &Ident,
    contracts: &[Type],
) -> TokenStream {
    let items = contracts.iter().map(|contract| {
        let contract_name = quote!(#contract).to_string();
        let static_name =
            static_ident("IMPLEMENTS", &[&implementation.to_string(), &contract_name]);
        let linked = linked_entry(
            krate,
            "IMPLEMENTATIONS",
            &static_name,
            quote!(#entry),
            quote!(#entry::of::<#implementation, #contract>()),
        );
        quote! {
            impl #implements<#contract> for #implementation {
                fn upcast(self: ::std::sync::Arc<Self>) -> ::std::sync::Arc<#contract> {
                    self
                }
            }

            #linked
        }
    });
    quote!(#(#items)*)
}

/// Rejects contract types that are not trait objects.
pub(crate) fn validate_contract_types(contracts: &[Type]) -> Option<TokenStream> {
    contracts.iter().find_map(|contract| match contract {
        Type::TraitObject(_) => None,
        other => Some(
            syn::Error::new_spanned(
                other,
                "expected a trait object contract such as `dyn Calculator`; \
                 a type is always its own contract",
            )
            .to_compile_error(),
        ),
    })
}
