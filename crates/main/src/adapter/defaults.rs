//! The adapters every factory starts with.

use alloc::{boxed::Box, string::{String, ToString}, sync::Arc};
use core::{marker::PhantomData, str::FromStr};

use url::Url;
use uuid::Uuid;

use super::{AdapterMap, AdapterRole, TypeAdapter};
use crate::{
    Dictionary, Error, Result, Value,
    context::Context,
    denormalizer::denormalize_elements,
    normalizer::normalize_elements,
    reflect::{DynamicMap, Reflect, ReflectRef},
    settings::DenormalizerSettings,
    types::{Class, Type, Typed},
    value::Number,
};

fn strict(ctx: &Context<'_>) -> bool {
    ctx.factory()
        .denormalizer()
        .settings()
        .contains(DenormalizerSettings::STRICT_NUMBER_PARSING)
}

fn deep_clone(ctx: &Context<'_>) -> bool {
    ctx.factory()
        .denormalizer()
        .settings()
        .contains(DenormalizerSettings::DEEP_CLONE)
}

fn boxed<T: Reflect>(value: Option<T>) -> Option<Box<dyn Reflect>> {
    value.map(|v| Box::new(v) as Box<dyn Reflect>)
}

/// Integer targets of [`IntegerAdapter`].
pub trait Integer: Reflect + Copy + TryFrom<i128> {
    const NAME: &'static str;

    /// Lenient conversion: wraps like an `as` cast.
    fn wrapping(value: i128) -> Self;

    /// Lenient conversion: truncates and saturates like an `as` cast.
    fn truncating(value: f64) -> Self;

    fn to_number(self) -> Option<Number>;
}

macro_rules! impl_integer {
    ($($ty:ty => $wide:ty),* $(,)?) => {
        $(
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_possible_wrap)]
            impl Integer for $ty {
                const NAME: &'static str = stringify!($ty);

                fn wrapping(value: i128) -> Self {
                    value as $ty
                }

                fn truncating(value: f64) -> Self {
                    value as $ty
                }

                fn to_number(self) -> Option<Number> {
                    <$wide>::try_from(self).ok().map(Number::from)
                }
            }
        )*
    };
}

impl_integer! {
    i8 => i8, i16 => i16, i32 => i32, i64 => i64, isize => i64,
    u8 => u8, u16 => u16, u32 => u32, u64 => u64, usize => u64,
}

/// Coerces a simple value into an integer.
///
/// Numbers, trimmed numeric strings, booleans (`1`/`0`) and characters
/// (their code point) are accepted; dictionaries and arrays give `None`.
/// Strict parsing rejects fractional and out-of-range input. Lenient
/// parsing truncates, wraps numbers and saturates strings.
pub fn coerce_integer<T: Integer>(value: &Value, strict: bool) -> Result<Option<T>> {
    let whole = match value {
        Value::Null => return Ok(None),
        Value::Number(n) => match n.as_i128() {
            Some(whole) => whole,
            None => {
                let float = n.into_f64();
                if !strict {
                    return Ok(Some(T::truncating(float)));
                }
                if !float.is_finite() || float.fract().abs() > 0.0 {
                    return Err(Error::parse(value.to_string(), T::NAME));
                }
                #[allow(clippy::cast_possible_truncation)]
                let whole = float as i128;
                whole
            }
        },
        Value::String(s) => {
            let s = s.trim();
            match s.parse::<i128>() {
                Ok(whole) if strict => whole,
                #[allow(clippy::cast_precision_loss)]
                Ok(whole) => {
                    // text out of range saturates rather than wrapping
                    return Ok(Some(T::try_from(whole).unwrap_or_else(|_| T::truncating(whole as f64))));
                }
                Err(_) => match s.parse::<f64>() {
                    Ok(float) if !strict && float.is_finite() => return Ok(Some(T::truncating(float))),
                    _ => return Err(Error::parse(s, T::NAME)),
                },
            }
        }
        Value::Bool(b) => i128::from(*b),
        Value::Char(c) => i128::from(u32::from(*c)),
        _ => return Ok(None),
    };
    if strict {
        T::try_from(whole)
            .map(Some)
            .map_err(|_| Error::parse(value.to_string(), T::NAME))
    } else {
        Ok(Some(T::wrapping(whole)))
    }
}

/// Integers of width `T`.
pub struct IntegerAdapter<T>(PhantomData<fn() -> T>);

impl<T> Default for IntegerAdapter<T> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

impl<T: Integer> TypeAdapter for IntegerAdapter<T> {
    fn simplify(&self, _: &mut Context<'_>, _: &Type, value: &dyn Reflect) -> Result<Option<Value>> {
        Ok(value
            .downcast_ref::<T>()
            .and_then(|v| v.to_number())
            .map(Value::Number))
    }

    fn complexify(&self, ctx: &mut Context<'_>, value: &Value, _: &Type) -> Result<Option<Box<dyn Reflect>>> {
        Ok(boxed(coerce_integer::<T>(value, strict(ctx))?))
    }
}

/// Float targets of [`FloatAdapter`].
pub trait Float: Reflect + Copy + FromStr + Into<Number> {
    const NAME: &'static str;

    fn from_f64(value: f64) -> Self;
}

impl Float for f32 {
    const NAME: &'static str = "f32";

    #[allow(clippy::cast_possible_truncation)]
    fn from_f64(value: f64) -> Self {
        value as f32
    }
}

impl Float for f64 {
    const NAME: &'static str = "f64";

    fn from_f64(value: f64) -> Self {
        value
    }
}

/// Floats of width `T`. Accepts the same input as [`IntegerAdapter`].
pub struct FloatAdapter<T>(PhantomData<fn() -> T>);

impl<T> Default for FloatAdapter<T> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

impl<T: Float> TypeAdapter for FloatAdapter<T> {
    fn simplify(&self, _: &mut Context<'_>, _: &Type, value: &dyn Reflect) -> Result<Option<Value>> {
        Ok(value.downcast_ref::<T>().map(|v| Value::Number((*v).into())))
    }

    fn complexify(&self, _: &mut Context<'_>, value: &Value, _: &Type) -> Result<Option<Box<dyn Reflect>>> {
        let float = match value {
            Value::Null => return Ok(None),
            Value::Number(n) => T::from_f64(n.into_f64()),
            Value::String(s) => s
                .trim()
                .parse::<T>()
                .map_err(|_| Error::parse(s.trim(), T::NAME))?,
            Value::Bool(b) => T::from_f64(f64::from(u8::from(*b))),
            Value::Char(c) => T::from_f64(f64::from(u32::from(*c))),
            _ => return Ok(None),
        };
        Ok(Some(Box::new(float)))
    }
}

/// `bool`: numbers above zero, `"true"`/`"false"`/`"1"`/`"0"` in any case,
/// and `'1'`/`'0'`.
#[derive(Debug, Default)]
pub struct BoolAdapter;

impl TypeAdapter for BoolAdapter {
    fn complexify(&self, _: &mut Context<'_>, value: &Value, _: &Type) -> Result<Option<Box<dyn Reflect>>> {
        let b = match value {
            Value::Null => return Ok(None),
            Value::Bool(b) => *b,
            Value::Number(n) => n.into_f64() > 0.0,
            Value::String(s) => {
                let s = s.trim();
                if s.eq_ignore_ascii_case("true") || s == "1" {
                    true
                } else if s.eq_ignore_ascii_case("false") || s == "0" {
                    false
                } else {
                    return Err(Error::parse(s, "bool"));
                }
            }
            Value::Char('1') => true,
            Value::Char('0') => false,
            Value::Char(c) => return Err(Error::parse(c.to_string(), "bool")),
            _ => return Ok(None),
        };
        Ok(Some(Box::new(b)))
    }

    fn role(&self) -> AdapterRole {
        AdapterRole::Annotator
    }
}

/// `char`: numbers as code points, the first character of a string (NUL
/// for an empty one), and booleans as `'1'`/`'0'`.
#[derive(Debug, Default)]
pub struct CharAdapter;

impl TypeAdapter for CharAdapter {
    fn complexify(&self, _: &mut Context<'_>, value: &Value, _: &Type) -> Result<Option<Box<dyn Reflect>>> {
        let c = match value {
            Value::Null => return Ok(None),
            Value::Char(c) => *c,
            Value::Number(n) => {
                #[allow(clippy::cast_possible_truncation)]
                let code = n.as_i128().unwrap_or_else(|| n.into_f64() as i128);
                u32::try_from(code)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| Error::parse(n.to_string(), "char"))?
            }
            Value::String(s) => s.chars().next().unwrap_or('\0'),
            Value::Bool(b) => {
                if *b {
                    '1'
                } else {
                    '0'
                }
            }
            _ => return Ok(None),
        };
        Ok(Some(Box::new(c)))
    }

    fn role(&self) -> AdapterRole {
        AdapterRole::Annotator
    }
}

/// `String`: any scalar in its display form.
#[derive(Debug, Default)]
pub struct StringAdapter;

impl TypeAdapter for StringAdapter {
    fn complexify(&self, _: &mut Context<'_>, value: &Value, _: &Type) -> Result<Option<Box<dyn Reflect>>> {
        let s = match value {
            Value::Null => return Ok(None),
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Char(c) => c.to_string(),
            _ => return Ok(None),
        };
        Ok(Some(Box::new(s)))
    }

    fn role(&self) -> AdapterRole {
        AdapterRole::Annotator
    }
}

/// Enums, by variant name: written in lowercase, read back ignoring case.
#[derive(Debug, Default)]
pub struct EnumAdapter;

impl TypeAdapter for EnumAdapter {
    fn simplify(&self, _: &mut Context<'_>, _: &Type, value: &dyn Reflect) -> Result<Option<Value>> {
        Ok(match value.reflect_ref() {
            ReflectRef::Enum(variant) => Some(Value::String(variant.to_lowercase())),
            _ => None,
        })
    }

    fn complexify(&self, _: &mut Context<'_>, value: &Value, target: &Type) -> Result<Option<Box<dyn Reflect>>> {
        let class = target
            .raw_class()
            .filter(Class::is_enum)
            .ok_or_else(|| Error::IllegalType(format!("{target} is not an enum")))?;
        let name = match value {
            Value::Null => return Ok(None),
            Value::String(s) => s.trim(),
            _ => return Ok(None),
        };
        class
            .variants()
            .iter()
            .find(|variant| variant.eq_ignore_ascii_case(name))
            .and_then(|variant| class.variant(variant))
            .map(Some)
            .ok_or_else(|| Error::parse(name, class.name()))
    }
}

/// Lists and sets, as arrays of their normalized elements.
#[derive(Debug, Default)]
pub struct IterableAdapter;

impl TypeAdapter for IterableAdapter {
    fn simplify(&self, ctx: &mut Context<'_>, declared: &Type, value: &dyn Reflect) -> Result<Option<Value>> {
        let ReflectRef::List(list) = value.reflect_ref() else {
            return Ok(None);
        };
        normalize_elements(ctx, &declared.element_type(), list.iter()).map(Some)
    }

    fn complexify(&self, ctx: &mut Context<'_>, value: &Value, target: &Type) -> Result<Option<Box<dyn Reflect>>> {
        if value.is_null() {
            return Ok(None);
        }
        let list = denormalize_elements(ctx, value, &target.element_type())?;
        Ok(Some(Box::new(list)))
    }
}

/// Maps, as dictionaries keyed by the string form of their keys.
///
/// Entries normalizing to null are left out, and an empty map normalizes
/// to nothing.
#[derive(Debug, Default)]
pub struct MapAdapter;

impl TypeAdapter for MapAdapter {
    fn simplify(&self, ctx: &mut Context<'_>, declared: &Type, value: &dyn Reflect) -> Result<Option<Value>> {
        let ReflectRef::Map(map) = value.reflect_ref() else {
            return Ok(None);
        };
        let value_type = declared.map_value_type();
        let mut dictionary = Dictionary::new();
        for (key, entry) in map.iter() {
            if let Some(simple) = ctx.simplify(&value_type, entry)? {
                dictionary.put(key, simple)?;
            }
        }
        Ok((!dictionary.is_empty()).then_some(Value::Dictionary(dictionary)))
    }

    fn complexify(&self, ctx: &mut Context<'_>, value: &Value, target: &Type) -> Result<Option<Box<dyn Reflect>>> {
        let dictionary = match value {
            Value::Null => return Ok(None),
            Value::Dictionary(dictionary) => dictionary,
            _ => return Ok(None),
        };
        let value_type = target.map_value_type();
        let mut map = DynamicMap::new();
        for (key, entry) in dictionary {
            if let Some(complex) = ctx.complexify(entry, &value_type)? {
                map.insert(key.clone(), complex);
            }
        }
        Ok(Some(Box::new(map)))
    }
}

/// [`Dictionary`] fields, copied deeply under
/// [`DenormalizerSettings::DEEP_CLONE`].
#[derive(Debug, Default)]
pub struct DictionaryAdapter;

impl TypeAdapter for DictionaryAdapter {
    fn complexify(&self, ctx: &mut Context<'_>, value: &Value, _: &Type) -> Result<Option<Box<dyn Reflect>>> {
        match value {
            Value::Null => Ok(None),
            Value::Dictionary(dictionary) => Ok(Some(Box::new(dictionary.duplicate(deep_clone(ctx))))),
            _ => Ok(None),
        }
    }

    fn role(&self) -> AdapterRole {
        AdapterRole::Annotator
    }
}

/// [`Value`] fields, which take any simple value as is.
#[derive(Debug, Default)]
pub struct ValueAdapter;

impl TypeAdapter for ValueAdapter {
    fn complexify(&self, ctx: &mut Context<'_>, value: &Value, _: &Type) -> Result<Option<Box<dyn Reflect>>> {
        if value.is_null() {
            return Ok(None);
        }
        let value = if deep_clone(ctx) {
            value.deep_clone()
        } else {
            value.clone()
        };
        Ok(Some(Box::new(value)))
    }

    fn role(&self) -> AdapterRole {
        AdapterRole::Annotator
    }
}

/// [`Uuid`] in its hyphenated string form.
#[derive(Debug, Default)]
pub struct UuidAdapter;

impl TypeAdapter for UuidAdapter {
    fn simplify(&self, _: &mut Context<'_>, _: &Type, value: &dyn Reflect) -> Result<Option<Value>> {
        Ok(value.downcast_ref::<Uuid>().map(|id| Value::String(id.to_string())))
    }

    fn complexify(&self, _: &mut Context<'_>, value: &Value, _: &Type) -> Result<Option<Box<dyn Reflect>>> {
        match value {
            Value::Null => Ok(None),
            Value::String(s) => Uuid::parse_str(s.trim())
                .map(|id| Some(Box::new(id) as Box<dyn Reflect>))
                .map_err(|_| Error::parse(s.as_str(), "Uuid")),
            _ => Ok(None),
        }
    }
}

/// [`Url`] in its serialized form.
#[derive(Debug, Default)]
pub struct UrlAdapter;

impl TypeAdapter for UrlAdapter {
    fn simplify(&self, _: &mut Context<'_>, _: &Type, value: &dyn Reflect) -> Result<Option<Value>> {
        Ok(value.downcast_ref::<Url>().map(|url| Value::String(url.as_str().into())))
    }

    fn complexify(&self, _: &mut Context<'_>, value: &Value, _: &Type) -> Result<Option<Box<dyn Reflect>>> {
        match value {
            Value::Null => Ok(None),
            Value::String(s) => Url::parse(s.trim())
                .map(|url| Some(Box::new(url) as Box<dyn Reflect>))
                .map_err(|_| Error::parse(s.as_str(), "Url")),
            _ => Ok(None),
        }
    }
}

fn register<T: Typed>(adapters: &mut AdapterMap, adapter: impl TypeAdapter + 'static) {
    adapters.insert(T::class(), Arc::new(adapter));
}

/// The default registrations, in the order they are tried when several
/// apply at the same level of a hierarchy.
#[must_use]
pub fn default_adapters() -> AdapterMap {
    let mut adapters = AdapterMap::new();
    register::<i8>(&mut adapters, IntegerAdapter::<i8>::default());
    register::<i16>(&mut adapters, IntegerAdapter::<i16>::default());
    register::<i32>(&mut adapters, IntegerAdapter::<i32>::default());
    register::<i64>(&mut adapters, IntegerAdapter::<i64>::default());
    register::<isize>(&mut adapters, IntegerAdapter::<isize>::default());
    register::<u8>(&mut adapters, IntegerAdapter::<u8>::default());
    register::<u16>(&mut adapters, IntegerAdapter::<u16>::default());
    register::<u32>(&mut adapters, IntegerAdapter::<u32>::default());
    register::<u64>(&mut adapters, IntegerAdapter::<u64>::default());
    register::<usize>(&mut adapters, IntegerAdapter::<usize>::default());
    register::<f32>(&mut adapters, FloatAdapter::<f32>::default());
    register::<f64>(&mut adapters, FloatAdapter::<f64>::default());
    register::<bool>(&mut adapters, BoolAdapter);
    register::<char>(&mut adapters, CharAdapter);
    register::<String>(&mut adapters, StringAdapter);
    register::<Dictionary>(&mut adapters, DictionaryAdapter);
    register::<Value>(&mut adapters, ValueAdapter);
    register::<Uuid>(&mut adapters, UuidAdapter);
    register::<Url>(&mut adapters, UrlAdapter);
    adapters.insert(Class::enumeration(), Arc::new(EnumAdapter));
    adapters.insert(Class::iterable(), Arc::new(IterableAdapter));
    adapters.insert(Class::map(), Arc::new(MapAdapter));
    adapters
}
