//! Untyped containers produced when a declared type gives no concrete
//! collection to build.

use alloc::{boxed::Box, string::String, vec::Vec};
use core::fmt;

use indexmap::IndexMap;

use super::{Reflect, ReflectList, ReflectMap, ReflectMut, ReflectRef, FromReflect};
use crate::{
    Value,
    types::{Class, ClassKind, NonGenericClassCell, Typed},
};

/// A list of reflected values of any type.
#[derive(Default)]
pub struct DynamicList {
    items: Vec<Box<dyn Reflect>>,
}

impl DynamicList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_items(items: Vec<Box<dyn Reflect>>) -> Self {
        Self { items }
    }

    pub fn push(&mut self, item: Box<dyn Reflect>) {
        self.items.push(item);
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&dyn Reflect> {
        self.items.get(index).map(AsRef::as_ref)
    }

    #[must_use]
    pub fn into_items(self) -> Vec<Box<dyn Reflect>> {
        self.items
    }
}

impl Typed for DynamicList {
    fn class() -> Class {
        static CELL: NonGenericClassCell = NonGenericClassCell::new();
        CELL.get_or_init(|| {
            Class::builder::<DynamicList>()
                .implements(Class::list())
                .type_params(&["T"])
                .constructor(|| Box::new(DynamicList::new()))
                .build()
        })
    }
}

impl Reflect for DynamicList {
    crate::impl_reflect_boilerplate! {
        fn to_simple(&self) -> Option<Value> {
            self.items
                .iter()
                .map(|item| item.to_simple())
                .collect::<Option<Vec<Value>>>()
                .map(Value::array)
        }

        fn reflect_ref(&self) -> ReflectRef<'_> {
            ReflectRef::List(self)
        }

        fn reflect_mut(&mut self) -> ReflectMut<'_> {
            ReflectMut::List(self)
        }

        fn debug(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            fmt::Debug::fmt(self, f)
        }
    }
}

impl FromReflect for DynamicList {}

impl ReflectList for DynamicList {
    fn len(&self) -> usize {
        self.items.len()
    }

    fn iter(&self) -> Box<dyn Iterator<Item = &dyn Reflect> + '_> {
        Box::new(self.items.iter().map(AsRef::as_ref))
    }
}

impl fmt::Debug for DynamicList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.items).finish()
    }
}

/// A string-keyed map of reflected values of any type, in insertion order.
#[derive(Default)]
pub struct DynamicMap {
    entries: IndexMap<String, Box<dyn Reflect>>,
}

impl DynamicMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entry, returning the value it replaced.
    pub fn insert(&mut self, key: String, value: Box<dyn Reflect>) -> Option<Box<dyn Reflect>> {
        self.entries.insert(key, value)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&dyn Reflect> {
        self.entries.get(key).map(AsRef::as_ref)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut dyn Reflect> {
        self.entries.get_mut(key).map(AsMut::as_mut)
    }

    #[must_use]
    pub fn into_entries(self) -> IndexMap<String, Box<dyn Reflect>> {
        self.entries
    }
}

impl Typed for DynamicMap {
    fn class() -> Class {
        static CELL: NonGenericClassCell = NonGenericClassCell::new();
        CELL.get_or_init(|| {
            Class::builder::<DynamicMap>()
                .implements(Class::map())
                .type_params(&["K", "V"])
                .constructor(|| Box::new(DynamicMap::new()))
                .build()
        })
    }
}

impl Reflect for DynamicMap {
    crate::impl_reflect_boilerplate! {
        fn reflect_ref(&self) -> ReflectRef<'_> {
            ReflectRef::Map(self)
        }

        fn reflect_mut(&mut self) -> ReflectMut<'_> {
            ReflectMut::Map(self)
        }

        fn debug(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            fmt::Debug::fmt(self, f)
        }
    }
}

impl FromReflect for DynamicMap {}

impl ReflectMap for DynamicMap {
    fn len(&self) -> usize {
        self.entries.len()
    }

    fn iter(&self) -> Box<dyn Iterator<Item = (String, &dyn Reflect)> + '_> {
        Box::new(self.entries.iter().map(|(k, v)| (k.clone(), v.as_ref())))
    }

    fn iter_mut(&mut self) -> Box<dyn Iterator<Item = (String, &mut dyn Reflect)> + '_> {
        Box::new(self.entries.iter_mut().map(|(k, v)| (k.clone(), v.as_mut())))
    }
}

impl fmt::Debug for DynamicMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(&self.entries).finish()
    }
}
