//! Derive macros for the dictum mapping engine.
//!
//! - `#[derive(Configurable)]` - declares the member table of a struct with
//!   named fields, making it mappable to and from a dictionary
//! - `#[derive(Reflect)]` - makes a unit-only enum mappable by variant name,
//!   or any other type known to the engine as an opaque class
//!
//! Both derives share the `#[config(...)]` attribute namespace.
//!
//! # Example
//!
//! ```ignore
//! use dictum::{Configurable, Reflect};
//!
//! #[derive(Debug, Default, Configurable)]
//! #[config(naming = "kebab-case")]
//! struct Pool {
//!     /// Upper bound of open connections
//!     #[config(validate = "range=1|")]
//!     max_size: u32,
//!     #[config(optional)]
//!     mode: Mode,
//! }
//!
//! #[derive(Debug, Default, Reflect)]
//! enum Mode {
//!     #[default]
//!     Lazy,
//!     Eager,
//! }
//! ```
//!
//! # Container Attributes
//!
//! - `#[config(naming = "kebab-case")]` - naming policy for this type
//!   (`default`, `PascalCase`, `camelCase`, `snake_case`, `kebab-case`)
//! - `#[config(post_construct = path)]` - run a hook once all properties
//!   are set (repeatable, runs in declaration order)
//! - `#[config(constructor = path)]` - create instances with `path()`
//!   instead of `Default::default()`
//!
//! # Field Attributes
//!
//! - `#[config(name = "...")]` - setting name, repeat to add aliases
//! - `#[config(alias = "...")]` - extra name accepted when reading
//! - `#[config(describe = "...")]` - description line; defaults to the doc
//!   comment
//! - `#[config(validate = "...")]` - validation expression, e.g.
//!   `not-blank & size=1|64`
//! - `#[config(silent)]` - skip invalid settings instead of failing
//! - `#[config(optional)]` - keep the field value when the setting is absent
//! - `#[config(transient)]` - read but never written
//! - `#[config(constant)]` - written but never read
//! - `#[config(fallback)]` - collect unclaimed keys, optionally with
//!   `fallback(distinct = "property")`
//! - `#[config(exclude)]` - leave the field out of the mapping
//! - `#[config(normalize_with = path, normalize_strategy = "before")]`
//! - `#[config(denormalize_with = path, denormalize_strategy = "after")]`
//! - `#[config(dictionary_schema = path)]` - project settings through a
//!   dictionary schema
//!
//! # Variant Attributes
//!
//! - `#[config(name = "...")]` - the setting a variant is written as

mod attr;
mod configurable;
mod reflect;
mod util;

use proc_macro::TokenStream;
use syn::parse_macro_input;

/// Derive macro declaring the member table of a struct.
///
/// Implements `Typed`, `Reflect`, `FromReflect` and `Configurable`. Fields of
/// type `Option<T>` are nullable; type parameters must themselves be mappable.
#[proc_macro_derive(Configurable, attributes(config))]
pub fn derive_configurable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as syn::DeriveInput);

    match configurable::derive_configurable(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Derive macro making a type known to the engine.
///
/// Unit-only enums map to and from their variant names. Other types are
/// opaque: they need a custom adapter to be converted.
#[proc_macro_derive(Reflect, attributes(config))]
pub fn derive_reflect(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as syn::DeriveInput);

    match reflect::derive_reflect(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
