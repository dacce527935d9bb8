//! Conversion of typed values into simple values.
//!
//! A value is normalized by the first applicable rule:
//!
//! 1. a value that already is a simple value is returned as is (or deeply
//!    copied under [`NormalizerSettings::DEEP_CLONE`]);
//! 2. a value declared as an array is normalized element by element;
//! 3. a schema-bearing value becomes a [`Dictionary`] of its properties;
//! 4. otherwise the [`TypeAdapter`](crate::adapter::TypeAdapter) resolved
//!    for its class converts it.

use alloc::{sync::Arc, vec::Vec};

use crate::{
    Dictionary, Error, Result, Value,
    context::{Context, Scope, Slot},
    reflect::{Reflect, ReflectRef},
    schema::{ClassSchema, NormalizeProcessor, Property},
    settings::NormalizerSettings,
    types::{Type, TypeResolver},
};

#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    settings: NormalizerSettings,
}

impl Normalizer {
    #[must_use]
    pub fn new(settings: NormalizerSettings) -> Self {
        Self { settings }
    }

    #[must_use]
    pub fn settings(&self) -> NormalizerSettings {
        self.settings
    }

    /// Normalizes `value`, declared as `declared`. Returns `None` when the
    /// value has no simple form, e.g. an empty map.
    pub fn normalize(&self, ctx: &mut Context<'_>, declared: &Type, value: &dyn Reflect) -> Result<Option<Value>> {
        if let Some(simple) = value.to_simple() {
            if simple.is_null() {
                return Ok(None);
            }
            if self.settings.contains(NormalizerSettings::DEEP_CLONE) {
                return Ok(Some(simple.deep_clone()));
            }
            return Ok(Some(simple));
        }

        let declared = if declared.is_object() {
            value.reflect_type()
        } else {
            declared.clone()
        };
        if declared.is_array() {
            if let ReflectRef::List(list) = value.reflect_ref() {
                return normalize_elements(ctx, &declared.element_type(), list.iter()).map(Some);
            }
        }

        let class = value.reflect_class();
        if class.has_schema() {
            let schema = ctx.factory().schema(&class)?;
            let mut container = Dictionary::new();
            self.write_properties(ctx, &declared, &schema, value, &mut container)?;
            return Ok(Some(Value::Dictionary(container)));
        }

        let adapter = ctx
            .factory()
            .adapter(&class)
            .filter(|adapter| adapter.role().simplifies())
            .ok_or_else(|| Error::IllegalType(format!("no adapter can normalize {class}")))?;
        let simple = adapter.simplify(ctx, &declared, value)?;
        if let Some(simple) = &simple {
            simple
                .check()
                .map_err(|_| Error::type_mismatch("simple value", simple.type_name()))?;
        }
        Ok(simple.filter(|simple| !simple.is_null()))
    }

    /// Writes the properties of a schema-bearing `value` into `container`.
    ///
    /// A [`Dictionary`] is merged into `container` instead.
    pub fn normalize_to_dictionary(
        &self,
        ctx: &mut Context<'_>,
        value: &dyn Reflect,
        container: &mut Dictionary,
    ) -> Result<()> {
        if let Some(dictionary) = value.downcast_ref::<Dictionary>() {
            let deep = self.settings.contains(NormalizerSettings::DEEP_CLONE);
            for (key, entry) in dictionary {
                let entry = if deep { entry.deep_clone() } else { entry.clone() };
                container.put(key.as_str(), entry)?;
            }
            return Ok(());
        }
        let class = value.reflect_class();
        if !class.has_schema() {
            return Err(Error::IllegalType(format!(
                "{class} cannot be normalized into a dictionary"
            )));
        }
        let schema = ctx.factory().schema(&class)?;
        self.write_properties(ctx, &value.reflect_type(), &schema, value, container)
    }

    fn write_properties(
        &self,
        ctx: &mut Context<'_>,
        declared: &Type,
        schema: &ClassSchema,
        owner: &dyn Reflect,
        container: &mut Dictionary,
    ) -> Result<()> {
        let resolver = TypeResolver::from_type(declared);
        for property in schema.properties() {
            if property.is_transient() {
                continue;
            }
            ctx.enter_scope(
                Scope::property(property, Some(property.name())),
                Slot::Container(&mut *container),
            )?;
            let result = self
                .write_property(ctx, &resolver, property, owner, container)
                .map_err(|e| e.at(ctx.error_path()));
            let exited = ctx.exit_scope(Slot::Container(&mut *container));
            result?;
            exited?;
        }
        Ok(())
    }

    fn write_property(
        &self,
        ctx: &mut Context<'_>,
        resolver: &TypeResolver,
        property: &Arc<Property>,
        owner: &dyn Reflect,
        container: &mut Dictionary,
    ) -> Result<()> {
        let value = match property.normalizer() {
            Some(NormalizeProcessor::Replace(process)) => Some(process(owner, &*ctx)?),
            Some(NormalizeProcessor::Before(process)) => {
                let substitute = process(owner, &*ctx)?;
                ctx.simplify(&substitute.reflect_type(), &*substitute)?
            }
            None => match property.accessor().get(owner)? {
                Some(field) => ctx.simplify(&property.ty().resolve(resolver), field)?,
                None => None,
            },
        };
        let Some(value) = value.filter(|value| !self.is_ignored(value)) else {
            return Ok(());
        };

        if property.is_fallback() {
            // the captured entries go back to the top level
            if let Value::Dictionary(captured) = value {
                for (key, entry) in &captured {
                    if !container.contains_key(key) {
                        container.put(key.as_str(), entry.clone())?;
                    }
                }
            }
            return Ok(());
        }

        ctx.enter_scope(Scope::Value, Slot::Container(&mut *container))?;
        let written = container.put(property.name(), value);
        let exited = ctx.exit_scope(Slot::Container(&mut *container));
        written?;
        exited?;
        Ok(())
    }

    fn is_ignored(&self, value: &Value) -> bool {
        match value {
            Value::Null => true,
            Value::Number(_) | Value::Bool(_) => {
                self.settings.contains(NormalizerSettings::IGNORE_DEFAULT_VALUES) && value.is_default()
            }
            Value::Array(items) => {
                self.settings.contains(NormalizerSettings::IGNORE_EMPTY_ARRAYS) && items.is_empty()
            }
            Value::Dictionary(dictionary) => {
                self.settings.contains(NormalizerSettings::IGNORE_EMPTY_DICTIONARIES)
                    && dictionary.is_empty()
            }
            Value::Char(_) | Value::String(_) => false,
        }
    }
}

/// Normalizes `items` into an array, each within its element scope.
/// Elements without a simple form become nulls.
pub(crate) fn normalize_elements<'a>(
    ctx: &mut Context<'_>,
    element: &Type,
    items: impl Iterator<Item = &'a dyn Reflect>,
) -> Result<Value> {
    let mut out = Vec::new();
    for (index, item) in items.enumerate() {
        let simple = ctx.scoped(Scope::Element(index), |ctx| ctx.simplify(element, item))?;
        out.push(simple.unwrap_or_default());
    }
    let array = Value::Array(out.into());
    array
        .check()
        .map_err(|_| Error::type_mismatch("homogeneous array", array.type_name()))?;
    Ok(array)
}
