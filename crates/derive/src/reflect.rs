//! Code generation for `#[derive(Reflect)]`.
//!
//! Unit-only enums become enumerations mapped by variant name. Any other
//! type becomes an opaque class that only custom adapters can convert.

use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Data, DataEnum, DeriveInput, Fields};

use crate::{
    attr::{ContainerAttrs, VariantAttrs},
    util::{reflect_impl, typed_impl},
};

pub fn derive_reflect(input: &DeriveInput) -> syn::Result<TokenStream2> {
    match &input.data {
        Data::Enum(data) => derive_enum(input, data),
        Data::Struct(_) | Data::Union(_) => derive_opaque(input),
    }
}

fn derive_enum(input: &DeriveInput, data: &DataEnum) -> syn::Result<TokenStream2> {
    if input.generics.type_params().next().is_some() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Reflect cannot be derived for generic enums",
        ));
    }

    let mut names = Vec::new();
    let mut variants = Vec::new();
    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "Reflect can only be derived for enums with unit variants",
            ));
        }
        let attrs = VariantAttrs::from_ast(&variant.attrs)?;
        names.push(attrs.name.unwrap_or_else(|| variant.ident.to_string()));
        variants.push(&variant.ident);
    }

    let name = &input.ident;
    let setup = quote! {
        .extends(::dictum::types::Class::enumeration())
        .variants(&[#(#names),*], |name| match name {
            #(#names => ::core::option::Option::Some(
                ::std::boxed::Box::new(Self::#variants) as ::std::boxed::Box<dyn ::dictum::reflect::Reflect>
            ),)*
            _ => ::core::option::Option::None,
        })
    };
    let items = quote! {
        fn reflect_ref(&self) -> ::dictum::reflect::ReflectRef<'_> {
            ::dictum::reflect::ReflectRef::Enum(match self {
                #(Self::#variants => #names,)*
            })
        }
    };

    let typed = typed_impl(name, &input.generics, &setup);
    let reflect = reflect_impl(name, &input.generics, &items);
    Ok(quote! {
        #typed
        #reflect
    })
}

fn derive_opaque(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let container = ContainerAttrs::from_ast(&input.attrs)?;
    let setup = match &container.constructor {
        Some(path) => quote!(.constructor(|| ::std::boxed::Box::new(#path()))),
        None => quote!(),
    };
    let typed = typed_impl(&input.ident, &input.generics, &setup);
    let reflect = reflect_impl(&input.ident, &input.generics, &quote!());
    Ok(quote! {
        #typed
        #reflect
    })
}
