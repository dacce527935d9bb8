use alloc::{boxed::Box, string::String, sync::Arc, vec::Vec};
use core::fmt;

use super::{Dictionary, NumberKind, Value};

/// The declared shape of a simple value, used by constrained dictionaries.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// Any simple value.
    Any,
    Bool,
    Char,
    String,
    /// Any numeric width.
    AnyNumber,
    Number(NumberKind),
    Dictionary,
    Array(Box<ValueType>),
}

impl ValueType {
    #[must_use]
    pub fn of<T: SimpleType>() -> Self {
        T::value_type()
    }

    #[must_use]
    pub fn array_of(element: ValueType) -> Self {
        ValueType::Array(Box::new(element))
    }

    /// Whether values of this type may carry a nested dictionary schema.
    #[must_use]
    pub fn holds_dictionaries(&self) -> bool {
        match self {
            ValueType::Dictionary => true,
            ValueType::Array(inner) => inner.holds_dictionaries(),
            _ => false,
        }
    }

    /// Whether `value` fits this type. `null` always fits, and numbers fit
    /// any numeric type they can be widened to without loss.
    #[must_use]
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) | (ValueType::Any, _) => true,
            (ValueType::Bool, Value::Bool(_))
            | (ValueType::Char, Value::Char(_))
            | (ValueType::String, Value::String(_))
            | (ValueType::AnyNumber, Value::Number(_))
            | (ValueType::Dictionary, Value::Dictionary(_)) => true,
            (ValueType::Number(target), Value::Number(n)) => n.kind().widens_to(*target),
            (ValueType::Array(inner), Value::Array(items)) => {
                items.iter().all(|item| inner.accepts(item))
            }
            _ => false,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Any => f.write_str("any"),
            ValueType::Bool => f.write_str("bool"),
            ValueType::Char => f.write_str("char"),
            ValueType::String => f.write_str("String"),
            ValueType::AnyNumber => f.write_str("number"),
            ValueType::Number(kind) => write!(f, "{kind}"),
            ValueType::Dictionary => f.write_str("Dictionary"),
            ValueType::Array(inner) => write!(f, "{inner}[]"),
        }
    }
}

/// Rust types whose values are simple values.
pub trait SimpleType {
    fn value_type() -> ValueType;
}

macro_rules! simple_number {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl SimpleType for $ty {
                fn value_type() -> ValueType {
                    ValueType::Number(NumberKind::$kind)
                }
            }
        )*
    };
}

simple_number! {
    i8 => I8, i16 => I16, i32 => I32, i64 => I64,
    u8 => U8, u16 => U16, u32 => U32, u64 => U64,
    f32 => F32, f64 => F64,
}

impl SimpleType for bool {
    fn value_type() -> ValueType {
        ValueType::Bool
    }
}

impl SimpleType for char {
    fn value_type() -> ValueType {
        ValueType::Char
    }
}

impl SimpleType for String {
    fn value_type() -> ValueType {
        ValueType::String
    }
}

impl SimpleType for Dictionary {
    fn value_type() -> ValueType {
        ValueType::Dictionary
    }
}

impl SimpleType for Value {
    fn value_type() -> ValueType {
        ValueType::Any
    }
}

impl<T: SimpleType> SimpleType for Vec<T> {
    fn value_type() -> ValueType {
        ValueType::array_of(T::value_type())
    }
}

impl<T: SimpleType> SimpleType for Arc<[T]> {
    fn value_type() -> ValueType {
        ValueType::array_of(T::value_type())
    }
}
