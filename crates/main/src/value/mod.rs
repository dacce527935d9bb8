//! Simple values: the canonical intermediate form exchanged with format codecs.
//!
//! A [`Value`] is one of `null`, a boolean, a character, a [`Number`], a
//! string, a [`Dictionary`] or a homogeneous array of simple values. Every
//! value reachable from a dictionary satisfies this grammar; see
//! [`Value::check`].

use alloc::{borrow::Cow, string::String, sync::Arc, vec::Vec};
use core::fmt::{self, Display, Formatter};

mod dictionary;
mod number;
#[cfg(feature = "serde")]
mod serde_impl;
mod simple;

pub use dictionary::{Dictionary, DictionaryAccess, ImmutableDictionary};
pub use number::{F32, F64, Number, NumberKind};
pub use simple::{SimpleType, ValueType};

use crate::{Error, Result};

/// A simple value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Char(char),
    Number(Number),
    String(String),
    Dictionary(Dictionary),
    /// Arrays are shared; a shallow [`Dictionary::duplicate`] keeps pointing
    /// at the same elements.
    Array(Arc<[Value]>),
}

/// The discriminant of a [`Value`]. All numeric widths share one kind.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    Char,
    Number,
    String,
    Dictionary,
    Array,
}

impl ValueKind {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "boolean",
            ValueKind::Char => "character",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::Dictionary => "dictionary",
            ValueKind::Array => "array",
        }
    }
}

impl Display for ValueKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Value {
    /// Builds an array value.
    pub fn array(items: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }

    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Char(_) => ValueKind::Char,
            Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::Dictionary(_) => ValueKind::Dictionary,
            Value::Array(_) => ValueKind::Array,
        }
    }

    /// A short description used in diagnostics, e.g. `number (i32)`.
    #[must_use]
    pub fn type_name(&self) -> Cow<'static, str> {
        match self {
            Value::Number(n) => Cow::Owned(format!("number ({})", n.kind())),
            other => Cow::Borrowed(other.kind().name()),
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_char(&self) -> Option<char> {
        match self {
            Value::Char(c) => Some(*c),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_dictionary(&self) -> Option<&Dictionary> {
        match self {
            Value::Dictionary(d) => Some(d),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Whether this is a numeric zero or `false`.
    #[must_use]
    pub fn is_default(&self) -> bool {
        match self {
            Value::Number(n) => n.is_zero(),
            Value::Bool(b) => !*b,
            _ => false,
        }
    }

    /// Checks the array homogeneity rule, recursively.
    ///
    /// Scalars and dictionaries always pass: a dictionary validates its
    /// entries on insertion. An array passes when every non-null element has
    /// the same [`ValueKind`] and every nested array passes too.
    pub fn check(&self) -> Result<()> {
        let Value::Array(items) = self else {
            return Ok(());
        };
        let mut kind = None;
        for (idx, item) in items.iter().enumerate() {
            if item.is_null() {
                continue;
            }
            match kind {
                None => kind = Some(item.kind()),
                Some(k) if k != item.kind() => {
                    return Err(Error::InvalidValue(format!(
                        "array is not homogeneous: element {idx} is a {} but previous elements are {}",
                        item.kind(),
                        k
                    )));
                }
                Some(_) => {}
            }
            item.check()?;
        }
        Ok(())
    }

    /// Returns a copy that shares nothing with `self`.
    #[must_use]
    pub fn deep_clone(&self) -> Value {
        match self {
            Value::Dictionary(d) => Value::Dictionary(d.duplicate(true)),
            Value::Array(items) => Value::Array(items.iter().map(Value::deep_clone).collect()),
            other => other.clone(),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Char(c) => write!(f, "'{c}'"),
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Dictionary(d) => write!(f, "{d}"),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<char> for Value {
    fn from(value: char) -> Self {
        Self::Char(value)
    }
}

impl<T: Into<Number>> From<T> for Value {
    fn from(value: T) -> Self {
        Self::Number(value.into())
    }
}

impl<'a> From<&'a str> for Value {
    fn from(value: &'a str) -> Self {
        Self::String(String::from(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Dictionary> for Value {
    fn from(value: Dictionary) -> Self {
        Self::Dictionary(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::array(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}
