//! Per-class converters between values and simple values.
//!
//! A [`TypeAdapter`] is registered against a [`Class`] and applies to that
//! class and, through the hierarchy walk of the [`AdapterProvider`], to
//! every class inheriting from or implementing it. The exact class always
//! wins over inherited registrations.

use alloc::{boxed::Box, sync::Arc};
use core::fmt;

mod defaults;
mod provider;

pub use defaults::{
    BoolAdapter, CharAdapter, DictionaryAdapter, EnumAdapter, FloatAdapter, IntegerAdapter,
    IterableAdapter, MapAdapter, StringAdapter, UrlAdapter, UuidAdapter, ValueAdapter,
    default_adapters,
};
pub use provider::{AdapterProvider, CacheableAdapterProvider, IndexedAdapterProvider, SimpleAdapterProvider};

use crate::{Result, Value, context::Context, reflect::Reflect, types::{Class, Type}};

/// Which directions an adapter takes part in.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum AdapterRole {
    /// Both directions.
    #[default]
    Adapter,
    /// Denormalization only. Used for types whose values are already
    /// simple.
    Annotator,
    /// Normalization only.
    Inferencer,
}

impl AdapterRole {
    #[must_use]
    pub fn simplifies(self) -> bool {
        self != AdapterRole::Annotator
    }

    #[must_use]
    pub fn complexifies(self) -> bool {
        self != AdapterRole::Inferencer
    }
}

/// Converts values of one class hierarchy.
///
/// Both directions may return `None` to signal "not applicable": the
/// normalizer then falls back to the value's own simple form, while the
/// denormalizer treats the property as absent.
#[allow(unused_variables)]
pub trait TypeAdapter: Send + Sync {
    /// Converts `value`, declared as `declared`, into a simple value.
    fn simplify(&self, ctx: &mut Context<'_>, declared: &Type, value: &dyn Reflect) -> Result<Option<Value>> {
        Ok(None)
    }

    /// Converts a simple value into an instance of `target`.
    fn complexify(&self, ctx: &mut Context<'_>, value: &Value, target: &Type) -> Result<Option<Box<dyn Reflect>>> {
        Ok(None)
    }

    fn role(&self) -> AdapterRole {
        AdapterRole::Adapter
    }
}

impl fmt::Debug for dyn TypeAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeAdapter({:?})", self.role())
    }
}

/// Adapters in registration order.
pub type AdapterMap = indexmap::IndexMap<Class, Arc<dyn TypeAdapter>>;
