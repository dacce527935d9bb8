//! Static storage for [`Class`] values, used to implement [`Typed`](super::Typed).
//!
//! Non-generic types keep their class in a [`NonGenericClassCell`], which is
//! a plain [`OnceLock`]. A `static` inside a generic function is shared by
//! every instantiation of that function, so generic types use a
//! [`GenericClassCell`], keyed by [`TypeId`].

use alloc::collections::BTreeMap;
use core::any::{Any, TypeId};
use std::sync::OnceLock;

use parking_lot::RwLock;

use super::Class;

pub struct NonGenericClassCell(OnceLock<Class>);

impl NonGenericClassCell {
    #[must_use]
    pub const fn new() -> Self {
        Self(OnceLock::new())
    }

    pub fn get_or_init(&self, f: impl FnOnce() -> Class) -> Class {
        self.0.get_or_init(f).clone()
    }
}

impl Default for NonGenericClassCell {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-instantiation class storage for generic types.
///
/// # Example
///
/// ```
/// use dictum::types::{Class, GenericClassCell, Typed};
///
/// struct Wrapper<T>(T);
///
/// impl<T: 'static> Typed for Wrapper<T> {
///     fn class() -> Class {
///         static CELL: GenericClassCell = GenericClassCell::new();
///         CELL.get_or_insert::<Self>(|| Class::builder::<Self>().build())
///     }
/// }
///
/// assert_eq!(Wrapper::<u8>::class().name(), "Wrapper<u8>");
/// assert_ne!(Wrapper::<u8>::class(), Wrapper::<i8>::class());
/// ```
pub struct GenericClassCell(RwLock<BTreeMap<TypeId, Class>>);

impl GenericClassCell {
    #[must_use]
    pub const fn new() -> Self {
        Self(RwLock::new(BTreeMap::new()))
    }

    pub fn get_or_insert<G: Any + ?Sized>(&self, f: impl FnOnce() -> Class) -> Class {
        let type_id = TypeId::of::<G>();
        if let Some(class) = self.0.read().get(&type_id) {
            return class.clone();
        }
        // built outside the lock: `f` may need classes stored in this cell
        let class = f();
        self.0.write().entry(type_id).or_insert(class).clone()
    }
}

impl Default for GenericClassCell {
    fn default() -> Self {
        Self::new()
    }
}
