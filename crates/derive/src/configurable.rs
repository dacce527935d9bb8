//! Code generation for `#[derive(Configurable)]`.

use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Ident};

use crate::{
    attr::{ContainerAttrs, DenormalizeStrategy, Distinct, FieldAttrs, NormalizeStrategy},
    util::{bounded_generics, generic_descriptor, option_inner, reflect_impl, type_param_names, typed_impl},
};

pub fn derive_configurable(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "Configurable can only be derived for structs with named fields",
        ));
    };
    let Fields::Named(fields) = &data.fields else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "Configurable can only be derived for structs with named fields",
        ));
    };

    let name = &input.ident;
    let container = ContainerAttrs::from_ast(&input.attrs)?;
    let params = type_param_names(&input.generics);

    let mut members = Vec::new();
    for field in &fields.named {
        let attrs = FieldAttrs::from_ast(&field.attrs)?;
        if attrs.exclude {
            continue;
        }
        let Some(ident) = &field.ident else {
            continue;
        };
        members.push(member_tokens(ident, &field.ty, &attrs, &params));
    }

    let naming = container.naming.map(|naming| {
        let variant = Ident::new(naming.variant(), proc_macro2::Span::call_site());
        quote!(.naming(::dictum::schema::NamingPolicy::#variant))
    });
    let hooks = &container.post_construct;
    let construct = match &container.constructor {
        Some(path) => quote!(#path()),
        None => quote!(<Self as ::core::default::Default>::default()),
    };

    // generic types without a constructor need `Default` on every impl,
    // since the class constructor goes through `Configurable::construct`
    let mut generics = input.generics.clone();
    if container.constructor.is_none() && !params.is_empty() {
        generics
            .make_where_clause()
            .predicates
            .push(syn::parse_quote!(Self: ::core::default::Default));
    }

    let setup = quote! {
        .declaration(<Self as ::dictum::schema::Configurable>::declaration)
        .constructor(|| ::std::boxed::Box::new(<Self as ::dictum::schema::Configurable>::construct()))
    };
    let typed = typed_impl(name, &generics, &setup);
    let reflect = reflect_impl(name, &generics, &quote!());

    let bounded = bounded_generics(&generics);
    let (impl_generics, ty_generics, where_clause) = bounded.split_for_impl();

    Ok(quote! {
        #typed

        #reflect

        impl #impl_generics ::dictum::schema::Configurable for #name #ty_generics #where_clause {
            fn declaration() -> ::dictum::schema::Declaration {
                ::dictum::schema::Declaration::new()
                    #naming
                    #(.member(#members))*
                    #(.post_construct(#hooks))*
            }

            fn construct() -> Self {
                #construct
            }
        }
    })
}

fn member_tokens(ident: &Ident, ty: &syn::Type, attrs: &FieldAttrs, params: &[Ident]) -> TokenStream2 {
    let field = ident.to_string();
    let inner = option_inner(ty);
    let constructor = if inner.is_some() {
        quote!(nullable_field)
    } else {
        quote!(field)
    };
    let with_type = generic_descriptor(inner.unwrap_or(ty), params).map(|descriptor| quote!(.with_type(#descriptor)));

    let names = &attrs.names;
    let aliases = &attrs.aliases;
    let describe = &attrs.describe;
    let validate = attrs.validate.as_ref().map(|expression| quote!(.validate(#expression)));
    let silent = attrs.silent.then(|| quote!(.silent()));
    let optional = attrs.optional.then(|| quote!(.optional()));
    let transient = attrs.transient.then(|| quote!(.transient()));
    let constant = attrs.constant.then(|| quote!(.constant()));
    let fallback = attrs.fallback.map(|distinct| match distinct {
        Distinct::Name => quote!(.fallback(::dictum::schema::Distinct::Name)),
        Distinct::Property => quote!(.fallback(::dictum::schema::Distinct::Property)),
    });
    let normalize = attrs.normalize_with.as_ref().map(|path| match attrs.normalize_strategy {
        NormalizeStrategy::Replace => {
            quote!(.normalize_with(::dictum::schema::NormalizeProcessor::replace(#path)))
        }
        NormalizeStrategy::Before => {
            quote!(.normalize_with(::dictum::schema::NormalizeProcessor::before(#path)))
        }
    });
    let denormalize = attrs.denormalize_with.as_ref().map(|path| match attrs.denormalize_strategy {
        DenormalizeStrategy::Replace => {
            quote!(.denormalize_with(::dictum::schema::DenormalizeProcessor::replace(#path)))
        }
        DenormalizeStrategy::After => {
            quote!(.denormalize_with(::dictum::schema::DenormalizeProcessor::after(#path)))
        }
    });
    let dictionary_schema = attrs
        .dictionary_schema
        .as_ref()
        .map(|path| quote!(.dictionary_schema(#path)));

    quote! {
        ::dictum::schema::Member::#constructor(
            #field,
            |owner: &Self| &owner.#ident,
            |owner: &mut Self| &mut owner.#ident,
        )
        #with_type
        #(.name(#names))*
        #(.alias(#aliases))*
        #(.describe(#describe))*
        #validate
        #silent
        #optional
        #transient
        #constant
        #fallback
        #normalize
        #denormalize
        #dictionary_schema
    }
}
