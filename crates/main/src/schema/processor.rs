//! Per-property conversion hooks that take over from the adapters.

use alloc::{boxed::Box, sync::Arc};
use core::{any::type_name, fmt};

use crate::{
    Error, Result, Value,
    context::Context,
    reflect::{FromReflect, Reflect},
    types::short_type_name,
};

type BeforeFn = dyn Fn(&dyn Reflect, &Context<'_>) -> Result<Box<dyn Reflect>> + Send + Sync;
type ReplaceNormalizeFn = dyn Fn(&dyn Reflect, &Context<'_>) -> Result<Value> + Send + Sync;
type ReplaceDenormalizeFn = dyn Fn(&Value, &Context<'_>) -> Result<Option<Box<dyn Reflect>>> + Send + Sync;
type AfterFn =
    dyn Fn(Option<Box<dyn Reflect>>, &Context<'_>) -> Result<Option<Box<dyn Reflect>>> + Send + Sync;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum NormalizeStrategy {
    /// The processor produces the simple value itself.
    #[default]
    Replace,
    /// The processor produces a substitute which is then normalized as usual.
    Before,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum DenormalizeStrategy {
    /// The processor converts the raw simple value itself.
    #[default]
    Replace,
    /// The processor transforms the result of the usual conversion.
    After,
}

/// Produces the setting of a property from the instance that owns it.
#[derive(Clone)]
pub enum NormalizeProcessor {
    Replace(Arc<ReplaceNormalizeFn>),
    Before(Arc<BeforeFn>),
}

impl NormalizeProcessor {
    /// A processor returning the final simple value. Returning
    /// [`Value::Null`] leaves the setting out.
    pub fn replace<O, F>(f: F) -> Self
    where
        O: Reflect,
        F: Fn(&O, &Context<'_>) -> Result<Value> + Send + Sync + 'static,
    {
        NormalizeProcessor::Replace(Arc::new(move |owner: &dyn Reflect, ctx: &Context<'_>| {
            f(downcast::<O>(owner)?, ctx)
        }))
    }

    /// A processor returning a substitute value to be normalized in place
    /// of the field.
    pub fn before<O, U, F>(f: F) -> Self
    where
        O: Reflect,
        U: Reflect,
        F: Fn(&O, &Context<'_>) -> Result<U> + Send + Sync + 'static,
    {
        NormalizeProcessor::Before(Arc::new(move |owner: &dyn Reflect, ctx: &Context<'_>| {
            Ok(Box::new(f(downcast::<O>(owner)?, ctx)?) as Box<dyn Reflect>)
        }))
    }

    #[must_use]
    pub fn strategy(&self) -> NormalizeStrategy {
        match self {
            NormalizeProcessor::Replace(_) => NormalizeStrategy::Replace,
            NormalizeProcessor::Before(_) => NormalizeStrategy::Before,
        }
    }
}

impl fmt::Debug for NormalizeProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NormalizeProcessor({:?})", self.strategy())
    }
}

/// Produces the field value of a property from its setting.
#[derive(Clone)]
pub enum DenormalizeProcessor {
    Replace(Arc<ReplaceDenormalizeFn>),
    After(Arc<AfterFn>),
}

impl DenormalizeProcessor {
    /// A processor converting the raw setting, which is [`Value::Null`]
    /// when absent. No adapter runs.
    pub fn replace<T, F>(f: F) -> Self
    where
        T: Reflect,
        F: Fn(&Value, &Context<'_>) -> Result<Option<T>> + Send + Sync + 'static,
    {
        DenormalizeProcessor::Replace(Arc::new(move |value: &Value, ctx: &Context<'_>| {
            Ok(f(value, ctx)?.map(|v| Box::new(v) as Box<dyn Reflect>))
        }))
    }

    /// A processor receiving the result of the usual conversion.
    pub fn after<T, F>(f: F) -> Self
    where
        T: FromReflect,
        F: Fn(Option<T>, &Context<'_>) -> Result<Option<T>> + Send + Sync + 'static,
    {
        DenormalizeProcessor::After(Arc::new(
            move |value: Option<Box<dyn Reflect>>, ctx: &Context<'_>| {
                let value = value
                    .map(|v| T::take_from_reflect(v).map_err(|v| mismatch::<T>(&*v)))
                    .transpose()?;
                Ok(f(value, ctx)?.map(|v| Box::new(v) as Box<dyn Reflect>))
            },
        ))
    }

    #[must_use]
    pub fn strategy(&self) -> DenormalizeStrategy {
        match self {
            DenormalizeProcessor::Replace(_) => DenormalizeStrategy::Replace,
            DenormalizeProcessor::After(_) => DenormalizeStrategy::After,
        }
    }
}

impl fmt::Debug for DenormalizeProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DenormalizeProcessor({:?})", self.strategy())
    }
}

pub(crate) fn downcast<T: Reflect>(value: &dyn Reflect) -> Result<&T> {
    value.downcast_ref::<T>().ok_or_else(|| mismatch::<T>(value))
}

pub(crate) fn downcast_mut<T: Reflect>(value: &mut dyn Reflect) -> Result<&mut T> {
    let found = value.reflect_class();
    value
        .downcast_mut::<T>()
        .ok_or_else(|| Error::type_mismatch(expected::<T>(), found.name()))
}

pub(crate) fn mismatch<T: ?Sized>(found: &dyn Reflect) -> Error {
    Error::type_mismatch(expected::<T>(), found.reflect_class().name())
}

fn expected<T: ?Sized>() -> alloc::string::String {
    short_type_name(type_name::<T>())
}
