//! [`Reflect`] for scalars and other opaque types.

use alloc::string::{String, ToString};
use core::fmt;

use url::Url;
use uuid::Uuid;

use super::{FromReflect, MapKey, Reflect};
use crate::{
    Dictionary, Value,
    types::{Class, NonGenericClassCell, Typed},
};

macro_rules! impl_simple {
    ($($ty:ty => [$($iface:expr),*] $(extends $super:expr)?),* $(,)?) => {
        $(
            impl Typed for $ty {
                fn class() -> Class {
                    static CELL: NonGenericClassCell = NonGenericClassCell::new();
                    CELL.get_or_init(|| {
                        Class::builder::<$ty>()
                            $(.extends($super))?
                            $(.implements($iface))*
                            .simple()
                            .build()
                    })
                }
            }

            impl Reflect for $ty {
                crate::impl_reflect_boilerplate! {
                    fn to_simple(&self) -> Option<Value> {
                        Some(Value::from(self.clone()))
                    }

                    fn debug(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                        fmt::Debug::fmt(self, f)
                    }
                }
            }

            impl FromReflect for $ty {}
        )*
    };
}

impl_simple! {
    bool => [Class::comparable()],
    char => [Class::comparable()],
    String => [Class::char_sequence(), Class::comparable()],
    i8 => [] extends Class::number(),
    i16 => [] extends Class::number(),
    i32 => [] extends Class::number(),
    i64 => [] extends Class::number(),
    u8 => [] extends Class::number(),
    u16 => [] extends Class::number(),
    u32 => [] extends Class::number(),
    u64 => [] extends Class::number(),
    f32 => [] extends Class::number(),
    f64 => [] extends Class::number(),
    Dictionary => [],
    Value => [],
}

macro_rules! impl_opaque {
    ($($ty:ty => [$($iface:expr),*] $(extends $super:expr)?),* $(,)?) => {
        $(
            impl Typed for $ty {
                fn class() -> Class {
                    static CELL: NonGenericClassCell = NonGenericClassCell::new();
                    CELL.get_or_init(|| {
                        Class::builder::<$ty>()
                            $(.extends($super))?
                            $(.implements($iface))*
                            .build()
                    })
                }
            }

            impl Reflect for $ty {
                crate::impl_reflect_boilerplate! {
                    fn debug(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                        fmt::Debug::fmt(self, f)
                    }
                }
            }

            impl FromReflect for $ty {}
        )*
    };
}

// Word-sized integers are not simple values; they go through the number
// adapters like any other non-simple scalar.
impl_opaque! {
    isize => [] extends Class::number(),
    usize => [] extends Class::number(),
    Uuid => [Class::comparable()],
    Url => [Class::comparable()],
}

impl MapKey for String {
    fn to_key(&self) -> String {
        self.clone()
    }

    fn from_key(key: &str) -> Option<Self> {
        Some(key.to_string())
    }
}

macro_rules! impl_map_key_parse {
    ($($ty:ty),* $(,)?) => {
        $(
            impl MapKey for $ty {
                fn to_key(&self) -> String {
                    self.to_string()
                }

                fn from_key(key: &str) -> Option<Self> {
                    key.trim().parse().ok()
                }
            }
        )*
    };
}

impl_map_key_parse!(bool, char, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, Uuid);
