//! [`Reflect`] for standard collections.
//!
//! `Vec<T>` is described as an array type. Every other collection is a
//! parameterized type over a raw class shared by all its instantiations,
//! so the adapter registry sees `HashSet` or `BTreeMap` the same way
//! regardless of element type.

use alloc::{
    boxed::Box,
    collections::{BTreeMap, BTreeSet, VecDeque},
    string::String,
    vec::Vec,
};
use core::hash::Hash;
use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use super::{DynamicList, DynamicMap, FromReflect, MapKey, Reflect, ReflectList, ReflectMap, ReflectMut, ReflectRef};
use crate::{
    Value,
    types::{Class, ClassKind, NonGenericClassCell, Type, Typed},
};

/// Converts `value` into a collection, accepting either the collection
/// itself or a [`DynamicList`] of convertible elements.
fn take_list<C, T>(value: Box<dyn Reflect>) -> Result<C, Box<dyn Reflect>>
where
    C: Reflect + FromIterator<T>,
    T: FromReflect,
{
    let value = match value.take::<C>() {
        Ok(collection) => return Ok(collection),
        Err(value) => value,
    };
    let list = value.take::<DynamicList>()?;
    list.into_items()
        .into_iter()
        .map(T::take_from_reflect)
        .collect()
}

/// Converts `value` into a map, accepting either the map itself or a
/// [`DynamicMap`] whose keys parse as `K`.
fn take_map<C, K, V>(value: Box<dyn Reflect>) -> Result<C, Box<dyn Reflect>>
where
    C: Reflect + FromIterator<(K, V)>,
    K: MapKey,
    V: FromReflect,
{
    let value = match value.take::<C>() {
        Ok(map) => return Ok(map),
        Err(value) => value,
    };
    let map = value.take::<DynamicMap>()?;
    map.into_entries()
        .into_iter()
        .map(|(key, value)| {
            let key = K::from_key(&key).ok_or_else(|| Box::new(key) as Box<dyn Reflect>)?;
            Ok((key, V::take_from_reflect(value)?))
        })
        .collect()
}

fn simple_items<'a>(items: impl Iterator<Item = &'a dyn Reflect>) -> Option<Value> {
    items
        .map(Reflect::to_simple)
        .collect::<Option<Vec<Value>>>()
        .map(Value::array)
}

impl<T: Reflect + Typed> Typed for Vec<T> {
    fn class() -> Class {
        static CELL: NonGenericClassCell = NonGenericClassCell::new();
        CELL.get_or_init(|| {
            Class::named("Vec", ClassKind::Concrete)
                .implements(Class::list())
                .type_params(&["T"])
                .build()
        })
    }

    fn type_descriptor() -> Type {
        Type::array(T::type_descriptor())
    }
}

impl<T: Reflect + Typed> Reflect for Vec<T> {
    crate::impl_reflect_boilerplate! {
        fn to_simple(&self) -> Option<Value> {
            simple_items(self.iter().map(|item| item as &dyn Reflect))
        }

        fn reflect_ref(&self) -> ReflectRef<'_> {
            ReflectRef::List(self)
        }

        fn reflect_mut(&mut self) -> ReflectMut<'_> {
            ReflectMut::List(self)
        }
    }
}

impl<T: Reflect> ReflectList for Vec<T> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn iter(&self) -> Box<dyn Iterator<Item = &dyn Reflect> + '_> {
        Box::new(self.as_slice().iter().map(|item| item as &dyn Reflect))
    }
}

impl<T: FromReflect + Typed> FromReflect for Vec<T> {
    fn take_from_reflect(value: Box<dyn Reflect>) -> Result<Self, Box<dyn Reflect>> {
        take_list::<Self, T>(value)
    }
}

macro_rules! impl_reflect_list {
    ($name:literal, $ty:ident<T $(: $($bound:path),+)?>, $iface:expr) => {
        impl<T: Reflect + Typed $($(+ $bound)+)?> Typed for $ty<T> {
            fn class() -> Class {
                static CELL: NonGenericClassCell = NonGenericClassCell::new();
                CELL.get_or_init(|| {
                    Class::named($name, ClassKind::Concrete)
                        .implements($iface)
                        .type_params(&["T"])
                        .build()
                })
            }

            fn type_descriptor() -> Type {
                Type::parameterized(Self::class(), vec![T::type_descriptor()])
            }
        }

        impl<T: Reflect + Typed $($(+ $bound)+)?> Reflect for $ty<T> {
            crate::impl_reflect_boilerplate! {
                fn reflect_ref(&self) -> ReflectRef<'_> {
                    ReflectRef::List(self)
                }

                fn reflect_mut(&mut self) -> ReflectMut<'_> {
                    ReflectMut::List(self)
                }
            }
        }

        impl<T: Reflect $($(+ $bound)+)?> ReflectList for $ty<T> {
            fn len(&self) -> usize {
                $ty::len(self)
            }

            fn iter(&self) -> Box<dyn Iterator<Item = &dyn Reflect> + '_> {
                Box::new($ty::iter(self).map(|item| item as &dyn Reflect))
            }
        }

        impl<T: FromReflect + Typed $($(+ $bound)+)?> FromReflect for $ty<T> {
            fn take_from_reflect(value: Box<dyn Reflect>) -> Result<Self, Box<dyn Reflect>> {
                take_list::<Self, T>(value)
            }
        }
    };
}

impl_reflect_list!("VecDeque", VecDeque<T>, Class::list());
impl_reflect_list!("HashSet", HashSet<T: Eq, Hash>, Class::set());
impl_reflect_list!("BTreeSet", BTreeSet<T: Ord>, Class::set());

macro_rules! impl_reflect_map {
    ($name:literal, $ty:ident<K: $($bound:path),+>) => {
        impl<K, V> Typed for $ty<K, V>
        where
            K: MapKey + Typed + Reflect $(+ $bound)+,
            V: Reflect + Typed,
        {
            fn class() -> Class {
                static CELL: NonGenericClassCell = NonGenericClassCell::new();
                CELL.get_or_init(|| {
                    Class::named($name, ClassKind::Concrete)
                        .implements(Class::map())
                        .type_params(&["K", "V"])
                        .build()
                })
            }

            fn type_descriptor() -> Type {
                Type::parameterized(
                    Self::class(),
                    vec![K::type_descriptor(), V::type_descriptor()],
                )
            }
        }

        impl<K, V> Reflect for $ty<K, V>
        where
            K: MapKey + Typed + Reflect $(+ $bound)+,
            V: Reflect + Typed,
        {
            crate::impl_reflect_boilerplate! {
                fn reflect_ref(&self) -> ReflectRef<'_> {
                    ReflectRef::Map(self)
                }

                fn reflect_mut(&mut self) -> ReflectMut<'_> {
                    ReflectMut::Map(self)
                }
            }
        }

        impl<K, V> ReflectMap for $ty<K, V>
        where
            K: MapKey $(+ $bound)+,
            V: Reflect,
        {
            fn len(&self) -> usize {
                $ty::len(self)
            }

            fn iter(&self) -> Box<dyn Iterator<Item = (String, &dyn Reflect)> + '_> {
                Box::new($ty::iter(self).map(|(k, v)| (k.to_key(), v as &dyn Reflect)))
            }

            fn iter_mut(&mut self) -> Box<dyn Iterator<Item = (String, &mut dyn Reflect)> + '_> {
                Box::new($ty::iter_mut(self).map(|(k, v)| (k.to_key(), v as &mut dyn Reflect)))
            }
        }

        impl<K, V> FromReflect for $ty<K, V>
        where
            K: MapKey + Typed + Reflect $(+ $bound)+,
            V: FromReflect + Typed,
        {
            fn take_from_reflect(value: Box<dyn Reflect>) -> Result<Self, Box<dyn Reflect>> {
                take_map::<Self, K, V>(value)
            }
        }
    };
}

impl_reflect_map!("HashMap", HashMap<K: Eq, Hash>);
impl_reflect_map!("BTreeMap", BTreeMap<K: Ord>);
impl_reflect_map!("IndexMap", IndexMap<K: Eq, Hash>);

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;

    #[test]
    fn test_vec_descriptor() {
        assert_eq!(Type::of::<Vec<Vec<u8>>>().describe(), "u8[][]");
        assert!(Type::of::<Vec<String>>().is_simple());
        assert_eq!(
            Type::of::<HashMap<String, Vec<i32>>>().describe(),
            "HashMap<String, i32[]>"
        );
        assert!(Type::of::<BTreeMap<u8, bool>>().is_map_compatible());
        assert_eq!(
            Type::of::<HashMap<String, Vec<i32>>>().map_value_type(),
            Type::of::<Vec<i32>>()
        );
    }

    #[test]
    fn test_vec_to_simple() {
        assert_eq!(vec![1, 2].to_simple(), Some(Value::array([1, 2])));
        let nested: Vec<Vec<uuid::Uuid>> = vec![vec![uuid::Uuid::nil()]];
        assert_eq!(nested.to_simple(), None);
    }

    #[test]
    fn test_take_from_dynamic() {
        let list = DynamicList::from_items(vec![
            Box::new(1_u8) as Box<dyn Reflect>,
            Box::new(2_u8),
            Box::new(1_u8),
        ]);
        let set = BTreeSet::<u8>::take_from_reflect(Box::new(list)).unwrap();
        assert_eq!(set.into_iter().collect::<Vec<_>>(), vec![1, 2]);

        let mut map = DynamicMap::new();
        map.insert("3".to_string(), Box::new("three".to_string()));
        let map = HashMap::<u32, String>::take_from_reflect(Box::new(map)).unwrap();
        assert_eq!(map.get(&3).map(String::as_str), Some("three"));
    }

    #[test]
    fn test_take_rejects_bad_elements() {
        let list = DynamicList::from_items(vec![Box::new(1_u8) as Box<dyn Reflect>, Box::new(true)]);
        let err = Vec::<u8>::take_from_reflect(Box::new(list)).unwrap_err();
        assert!(err.is::<bool>());

        let mut map = DynamicMap::new();
        map.insert("x".to_string(), Box::new(1_u8));
        let err = HashMap::<u8, u8>::take_from_reflect(Box::new(map)).unwrap_err();
        assert_eq!(err.downcast_ref::<String>().map(String::as_str), Some("x"));
    }
}
