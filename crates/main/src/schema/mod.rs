//! Compiled property metadata.
//!
//! A [`ClassSchema`] is what the normalizer and denormalizer walk. It is
//! produced once per type by the [`SchemaScanner`] from the type's member
//! [`Declaration`] and is immutable afterwards.
//!
//! Hand-built schemas for plain dictionaries live in [`DictionarySchema`].
//!
//! # Naming
//!
//! Every property has a primary name and any number of aliases, all unique
//! within the schema. The primary name is chosen as follows:
//!
//! - the [`NamingPolicy`] maps each field identifier to a default name;
//! - the first declared name (`#[config(name = "...")]`) that is non-blank
//!   and not claimed by another property replaces the default;
//! - the remaining declared names, then the declared aliases, become
//!   aliases under the same rule.

use alloc::{string::String, sync::Arc, vec::Vec};
use std::collections::HashMap;

mod dictionary;
mod member;
mod naming;
mod processor;
mod scanner;

pub use dictionary::{
    DictionaryProperty, DictionaryPropertyBuilder, DictionarySchema, DictionarySchemaBuilder,
};
pub use member::{
    Access, Accessor, Configurable, Declaration, HookMarker, HookOutput, IntoPostHook, Member,
    Nullable, PostHook, Required,
};
pub use naming::{NamingPolicy, split_words};
pub use processor::{DenormalizeProcessor, DenormalizeStrategy, NormalizeProcessor, NormalizeStrategy};
pub use scanner::SchemaScanner;

use crate::{types::{Class, Type}, validate::Validator};

// GRCOV_EXCL_START
bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        /// A null setting keeps the field's current value.
        const OPTIONAL = 0x1;
        /// The property is never written by the normalizer.
        const TRANSIENT = 0x2;
        /// The property is never read by the denormalizer.
        const CONSTANT = 0x4;
        /// The property collects every setting no other property claims.
        const FALLBACK = 0x8;
    }
}
// GRCOV_EXCL_STOP

/// Which keys a fallback property leaves alone.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Distinct {
    /// Only the key each other property actually matched, so the unused
    /// aliases of a present property are captured.
    #[default]
    Name,
    /// Every primary name and alias of the other properties.
    Property,
}

/// A resolved property of a [`ClassSchema`].
#[derive(Debug)]
pub struct Property {
    pub(crate) name: String,
    pub(crate) aliases: Vec<String>,
    pub(crate) field: &'static str,
    pub(crate) ty: Type,
    pub(crate) modifiers: Modifiers,
    pub(crate) distinct: Distinct,
    pub(crate) description: Vec<String>,
    pub(crate) validator: Arc<dyn Validator>,
    pub(crate) normalizer: Option<NormalizeProcessor>,
    pub(crate) denormalizer: Option<DenormalizeProcessor>,
    pub(crate) accessor: Accessor,
    pub(crate) dictionary_schema: Option<Arc<DictionarySchema>>,
}

impl Property {
    /// The primary setting name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// The primary name followed by the aliases.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        core::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    /// The identifier of the field backing this property.
    #[must_use]
    pub fn field(&self) -> &'static str {
        self.field
    }

    /// The declared type of the field.
    #[must_use]
    pub fn ty(&self) -> &Type {
        &self.ty
    }

    #[must_use]
    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.modifiers.contains(Modifiers::OPTIONAL)
    }

    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.modifiers.contains(Modifiers::TRANSIENT)
    }

    #[must_use]
    pub fn is_constant(&self) -> bool {
        self.modifiers.contains(Modifiers::CONSTANT)
    }

    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.modifiers.contains(Modifiers::FALLBACK)
    }

    #[must_use]
    pub fn distinct(&self) -> Distinct {
        self.distinct
    }

    #[must_use]
    pub fn description(&self) -> &[String] {
        &self.description
    }

    #[must_use]
    pub fn validator(&self) -> &Arc<dyn Validator> {
        &self.validator
    }

    #[must_use]
    pub fn normalizer(&self) -> Option<&NormalizeProcessor> {
        self.normalizer.as_ref()
    }

    #[must_use]
    pub fn denormalizer(&self) -> Option<&DenormalizeProcessor> {
        self.denormalizer.as_ref()
    }

    #[must_use]
    pub fn accessor(&self) -> &Accessor {
        &self.accessor
    }

    /// The schema a [`Dictionary`](crate::Dictionary) field is bound to.
    #[must_use]
    pub fn dictionary_schema(&self) -> Option<&Arc<DictionarySchema>> {
        self.dictionary_schema.as_ref()
    }
}

/// The schema of a type.
#[derive(Debug)]
pub struct ClassSchema {
    class: Class,
    properties: Vec<Arc<Property>>,
    lookup: HashMap<String, usize>,
    post_construct: Vec<PostHook>,
}

impl ClassSchema {
    pub(crate) fn new(class: Class, properties: Vec<Arc<Property>>, post_construct: Vec<PostHook>) -> Self {
        let mut lookup = HashMap::new();
        for (i, property) in properties.iter().enumerate() {
            for name in property.names() {
                lookup.insert(name.into(), i);
            }
        }
        Self {
            class,
            properties,
            lookup,
            post_construct,
        }
    }

    #[must_use]
    pub fn class(&self) -> &Class {
        &self.class
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.class.name()
    }

    /// Properties in declaration order, with the fallback property last.
    #[must_use]
    pub fn properties(&self) -> &[Arc<Property>] {
        &self.properties
    }

    /// Looks a property up by primary name or alias.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Arc<Property>> {
        self.lookup.get(name).map(|&i| &self.properties[i])
    }

    /// Every primary name and alias.
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.lookup.keys().map(String::as_str)
    }

    #[must_use]
    pub fn fallback(&self) -> Option<&Arc<Property>> {
        self.properties.last().filter(|p| p.is_fallback())
    }

    #[must_use]
    pub fn post_construct(&self) -> &[PostHook] {
        &self.post_construct
    }
}
