//! Dynamic access to mapped values.
//!
//! [`Reflect`] is implemented by every type the engine can walk: the simple
//! scalars, [`Value`] and [`Dictionary`](crate::Dictionary), the standard
//! collections, and types deriving `Configurable` or `Reflect`.
//!
//! Structural access goes through [`ReflectRef`] and [`ReflectMut`]. Field
//! access on schema-bearing types goes through the accessors of their
//! [`Declaration`](crate::schema::Declaration), never through reflection.

use alloc::{boxed::Box, string::String};
use core::{any::Any, fmt};

mod collections;
mod dynamic;
mod impls;

pub use dynamic::{DynamicList, DynamicMap};

use crate::{
    Value,
    types::{Class, Type},
};

/// A value the engine can inspect at runtime.
pub trait Reflect: Any + Send + Sync {
    /// The runtime class of this value.
    fn reflect_class(&self) -> Class;

    /// The full runtime type, including generic arguments.
    fn reflect_type(&self) -> Type {
        Type::Class(self.reflect_class())
    }

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    fn as_reflect(&self) -> &dyn Reflect;

    fn as_reflect_mut(&mut self) -> &mut dyn Reflect;

    /// Returns the value as a simple value, if it is one.
    fn to_simple(&self) -> Option<Value> {
        None
    }

    fn reflect_ref(&self) -> ReflectRef<'_> {
        ReflectRef::Opaque
    }

    fn reflect_mut(&mut self) -> ReflectMut<'_> {
        ReflectMut::Opaque
    }

    fn debug(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reflect_class().name())
    }
}

impl fmt::Debug for dyn Reflect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.debug(f)
    }
}

impl dyn Reflect {
    #[must_use]
    pub fn is<T: Reflect>(&self) -> bool {
        self.as_any().is::<T>()
    }

    #[must_use]
    pub fn downcast_ref<T: Reflect>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Reflect>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }

    /// Moves the value out of the box if it is a `T`; otherwise hands the
    /// box back untouched.
    pub fn take<T: Reflect>(self: Box<Self>) -> Result<T, Box<dyn Reflect>> {
        if self.is::<T>() {
            match self.into_any().downcast::<T>() {
                Ok(value) => Ok(*value),
                // unreachable: the type was checked above
                Err(_) => Err(Box::new(Value::Null)),
            }
        } else {
            Err(self)
        }
    }
}

/// An immutable structural view of a reflected value.
pub enum ReflectRef<'a> {
    /// An ordered sequence: `Vec`, `VecDeque`, sets, [`DynamicList`].
    List(&'a dyn ReflectList),
    /// A string-keyed map: `HashMap`, `BTreeMap`, `IndexMap`, [`DynamicMap`].
    Map(&'a dyn ReflectMap),
    /// An enum, by variant name.
    Enum(&'a str),
    /// Anything else.
    Opaque,
}

/// A mutable structural view of a reflected value.
pub enum ReflectMut<'a> {
    List(&'a mut dyn ReflectList),
    Map(&'a mut dyn ReflectMap),
    Opaque,
}

pub trait ReflectList {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn iter(&self) -> Box<dyn Iterator<Item = &dyn Reflect> + '_>;
}

pub trait ReflectMap {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates over entries with their keys rendered as strings.
    fn iter(&self) -> Box<dyn Iterator<Item = (String, &dyn Reflect)> + '_>;

    fn iter_mut(&mut self) -> Box<dyn Iterator<Item = (String, &mut dyn Reflect)> + '_>;
}

/// Rebuilds a concrete value from a reflected one.
pub trait FromReflect: Reflect + Sized {
    /// Takes ownership of `value`, converting dynamic containers where
    /// needed. On failure the offending value is handed back.
    fn take_from_reflect(value: Box<dyn Reflect>) -> Result<Self, Box<dyn Reflect>> {
        value.take::<Self>()
    }
}

/// Types usable as map keys. Keys are exchanged as strings.
pub trait MapKey: Sized {
    fn to_key(&self) -> String;

    fn from_key(key: &str) -> Option<Self>;
}

/// Implements [`Reflect`] for a type by delegating to itself.
///
/// The type must implement [`Typed`](crate::types::Typed). Extra items
/// (such as `to_simple` or `reflect_ref`) may follow the type.
#[macro_export]
macro_rules! impl_reflect_boilerplate {
    ($($item:item)*) => {
        fn reflect_class(&self) -> $crate::types::Class {
            <Self as $crate::types::Typed>::class()
        }

        fn reflect_type(&self) -> $crate::types::Type {
            <Self as $crate::types::Typed>::type_descriptor()
        }

        fn as_any(&self) -> &dyn ::core::any::Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn ::core::any::Any {
            self
        }

        fn into_any(self: ::std::boxed::Box<Self>) -> ::std::boxed::Box<dyn ::core::any::Any> {
            self
        }

        fn as_reflect(&self) -> &dyn $crate::reflect::Reflect {
            self
        }

        fn as_reflect_mut(&mut self) -> &mut dyn $crate::reflect::Reflect {
            self
        }

        $($item)*
    };
}
