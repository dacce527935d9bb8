//! Utility functions shared by the derive macros.

use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{GenericArgument, Generics, Ident, PathArguments};

/// Clones `generics`, bounding every type parameter by `FromReflect + Typed`.
pub fn bounded_generics(generics: &Generics) -> Generics {
    let mut generics = generics.clone();
    for param in generics.type_params_mut() {
        param
            .bounds
            .push(syn::parse_quote!(::dictum::reflect::FromReflect));
        param.bounds.push(syn::parse_quote!(::dictum::types::Typed));
    }
    generics
}

pub fn type_param_names(generics: &Generics) -> Vec<Ident> {
    generics.type_params().map(|p| p.ident.clone()).collect()
}

/// Emits the `Typed` impl of a derived type. `setup` holds the extra
/// `ClassBuilder` calls.
pub fn typed_impl(name: &Ident, generics: &Generics, setup: &TokenStream2) -> TokenStream2 {
    let bounded = bounded_generics(generics);
    let (impl_generics, ty_generics, where_clause) = bounded.split_for_impl();
    let params = type_param_names(generics);

    let class = if params.is_empty() {
        quote! {
            static CELL: ::dictum::types::NonGenericClassCell = ::dictum::types::NonGenericClassCell::new();
            CELL.get_or_init(|| {
                ::dictum::types::Class::builder::<Self>()
                    #setup
                    .build()
            })
        }
    } else {
        let param_names = params.iter().map(Ident::to_string);
        quote! {
            static CELL: ::dictum::types::GenericClassCell = ::dictum::types::GenericClassCell::new();
            CELL.get_or_insert::<Self>(|| {
                ::dictum::types::Class::builder::<Self>()
                    .type_params(&[#(#param_names),*])
                    #setup
                    .build()
            })
        }
    };

    let descriptor = if params.is_empty() {
        quote!()
    } else {
        quote! {
            fn type_descriptor() -> ::dictum::types::Type {
                ::dictum::types::Type::parameterized(
                    <Self as ::dictum::types::Typed>::class(),
                    ::std::vec![#(<#params as ::dictum::types::Typed>::type_descriptor()),*],
                )
            }
        }
    };

    quote! {
        impl #impl_generics ::dictum::types::Typed for #name #ty_generics #where_clause {
            fn class() -> ::dictum::types::Class {
                #class
            }

            #descriptor
        }
    }
}

/// Emits the `Reflect` and `FromReflect` impls. `items` holds overrides of
/// the provided `Reflect` methods.
pub fn reflect_impl(name: &Ident, generics: &Generics, items: &TokenStream2) -> TokenStream2 {
    let bounded = bounded_generics(generics);
    let (impl_generics, ty_generics, where_clause) = bounded.split_for_impl();
    quote! {
        impl #impl_generics ::dictum::reflect::Reflect for #name #ty_generics #where_clause {
            ::dictum::impl_reflect_boilerplate! {
                #items
            }
        }

        impl #impl_generics ::dictum::reflect::FromReflect for #name #ty_generics #where_clause {}
    }
}

/// The inner type of an `Option<T>`.
pub fn option_inner(ty: &syn::Type) -> Option<&syn::Type> {
    single_argument(ty, "Option")
}

/// Builds the declared type descriptor of a field whose type mentions a
/// type parameter of the container, so that it resolves per instantiation.
/// Returns `None` for fully concrete types.
pub fn generic_descriptor(ty: &syn::Type, params: &[Ident]) -> Option<TokenStream2> {
    if !mentions_param(ty, params) {
        return None;
    }
    if let syn::Type::Path(path) = ty {
        if path.qself.is_none() {
            if let Some(ident) = path.path.get_ident() {
                if params.contains(ident) {
                    let name = ident.to_string();
                    return Some(quote!(::dictum::types::Type::variable(#name)));
                }
            }
        }
    }
    if let Some(element) = single_argument(ty, "Vec") {
        let element = generic_descriptor(element, params)?;
        return Some(quote!(::dictum::types::Type::array(#element)));
    }
    let syn::Type::Path(path) = ty else {
        return None;
    };
    let last = path.path.segments.last()?;
    let PathArguments::AngleBracketed(args) = &last.arguments else {
        return None;
    };
    let args = args.args.iter().filter_map(|arg| match arg {
        GenericArgument::Type(arg) => Some(
            generic_descriptor(arg, params)
                .unwrap_or_else(|| quote!(<#arg as ::dictum::types::Typed>::type_descriptor())),
        ),
        _ => None,
    });
    Some(quote! {
        ::dictum::types::Type::parameterized(
            <#ty as ::dictum::types::Typed>::class(),
            ::std::vec![#(#args),*],
        )
    })
}

fn single_argument<'a>(ty: &'a syn::Type, wrapper: &str) -> Option<&'a syn::Type> {
    let syn::Type::Path(path) = ty else {
        return None;
    };
    let last = path.path.segments.last()?;
    if last.ident != wrapper {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &last.arguments else {
        return None;
    };
    match args.args.first() {
        Some(GenericArgument::Type(inner)) if args.args.len() == 1 => Some(inner),
        _ => None,
    }
}

fn mentions_param(ty: &syn::Type, params: &[Ident]) -> bool {
    if params.is_empty() {
        return false;
    }
    let tokens = quote!(#ty).to_string();
    tokens
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .any(|word| params.iter().any(|p| p == word))
}
