//! Conversion of simple values back into typed values.
//!
//! A value is denormalized against a target [`Type`] by the first
//! applicable rule:
//!
//! 1. `null` produces nothing;
//! 2. an array target is filled element by element, wrapping a lone value
//!    into a one-element array;
//! 3. the unconstrained target keeps the simple value itself;
//! 4. a schema-bearing target is instantiated and populated from a
//!    [`Dictionary`];
//! 5. otherwise the [`TypeAdapter`](crate::adapter::TypeAdapter) resolved
//!    for the target class converts it.

use alloc::{boxed::Box, sync::Arc, vec::Vec};
use core::fmt;
use std::collections::HashSet;

use crate::{
    Dictionary, Error, Result, Value,
    context::{Context, Scope, Slot},
    reflect::{DynamicList, Reflect},
    schema::{ClassSchema, DenormalizeProcessor, Distinct, Property},
    settings::DenormalizerSettings,
    types::{Class, Type, TypeResolver},
};

/// Rewrites the raw setting of a property before it is validated.
pub type Middleware =
    Arc<dyn Fn(&Context<'_>, &Property, Option<Value>) -> Result<Option<Value>> + Send + Sync>;

/// Runs once on every fully populated schema-bearing instance.
pub type Completion = Arc<dyn Fn(&Context<'_>, &mut dyn Reflect) + Send + Sync>;

#[derive(Clone, Default)]
pub struct Denormalizer {
    settings: DenormalizerSettings,
    middleware: Vec<Middleware>,
    completion: Option<Completion>,
}

impl Denormalizer {
    #[must_use]
    pub fn new(settings: DenormalizerSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_middleware(mut self, middleware: Vec<Middleware>) -> Self {
        self.middleware = middleware;
        self
    }

    #[must_use]
    pub fn with_completion(mut self, completion: Option<Completion>) -> Self {
        self.completion = completion;
        self
    }

    #[must_use]
    pub fn settings(&self) -> DenormalizerSettings {
        self.settings
    }

    /// Denormalizes `value` into an instance of `target`.
    pub fn denormalize(
        &self,
        ctx: &mut Context<'_>,
        value: &Value,
        target: &Type,
    ) -> Result<Option<Box<dyn Reflect>>> {
        if value.is_null() {
            return Ok(None);
        }
        if target.is_array() {
            let list = denormalize_elements(ctx, value, &target.element_type())?;
            return Ok(Some(Box::new(list)));
        }

        let class = target.raw_class().unwrap_or_else(Class::object);
        if class == Class::object() {
            let value = if self.settings.contains(DenormalizerSettings::DEEP_CLONE) {
                value.deep_clone()
            } else {
                value.clone()
            };
            return Ok(Some(Box::new(value)));
        }

        if class.has_schema() {
            let Value::Dictionary(dictionary) = value else {
                return Err(Error::type_mismatch(class.name(), value.type_name()));
            };
            let mut instance = ctx.factory().instances().create(&class)?;
            let schema = ctx.factory().schema(&class)?;
            self.populate(ctx, target, &schema, dictionary, instance.as_mut())?;
            return Ok(Some(instance));
        }

        let adapter = ctx
            .factory()
            .adapter(&class)
            .filter(|adapter| adapter.role().complexifies())
            .ok_or_else(|| Error::IllegalType(format!("no adapter can denormalize {target}")))?;
        adapter.complexify(ctx, value, target)
    }

    /// Populates an existing schema-bearing instance from `dictionary`.
    pub fn denormalize_to_instance(
        &self,
        ctx: &mut Context<'_>,
        dictionary: &Dictionary,
        instance: &mut dyn Reflect,
    ) -> Result<()> {
        let class = instance.reflect_class();
        if !class.has_schema() {
            return Err(Error::IllegalType(format!(
                "{class} cannot be populated from a dictionary"
            )));
        }
        let schema = ctx.factory().schema(&class)?;
        self.populate(ctx, &instance.reflect_type(), &schema, dictionary, instance)
    }

    fn populate(
        &self,
        ctx: &mut Context<'_>,
        declared: &Type,
        schema: &ClassSchema,
        dictionary: &Dictionary,
        owner: &mut dyn Reflect,
    ) -> Result<()> {
        let resolver = TypeResolver::from_type(declared);
        let mut matched = HashSet::new();
        for property in schema.properties() {
            if property.is_fallback() {
                continue;
            }
            let found = dictionary.search(property.name(), property.aliases());
            if let Some((key, _)) = found {
                matched.insert(key);
            }
            if property.is_constant() {
                continue;
            }
            self.read_property(ctx, &resolver, property, found, owner)?;
        }

        if let Some(fallback) = schema.fallback().filter(|p| !p.is_constant()) {
            // under `Name` an unused alias of a present property stays unclaimed
            let claimed: HashSet<&str> = match fallback.distinct() {
                Distinct::Name => matched,
                Distinct::Property => schema
                    .properties()
                    .iter()
                    .filter(|p| !Arc::ptr_eq(p, fallback))
                    .flat_map(|p| p.names())
                    .collect(),
            };
            let mut captured = Dictionary::new();
            for (key, value) in dictionary {
                if !claimed.contains(key.as_str()) {
                    captured.put(key.as_str(), value.clone())?;
                }
            }
            let captured = Value::Dictionary(captured);
            let found = match &captured {
                Value::Dictionary(entries) if !entries.is_empty() => Some((fallback.name(), &captured)),
                _ => None,
            };
            self.read_property(ctx, &resolver, fallback, found, owner)?;
        }

        for hook in schema.post_construct() {
            if let Err(e) = hook.call(owner, ctx, schema, dictionary) {
                tracing::warn!(class = schema.name(), error = %e, "post-construct hook failed");
            }
        }
        if let Some(completion) = &self.completion {
            completion(ctx, owner);
        }
        Ok(())
    }

    fn read_property(
        &self,
        ctx: &mut Context<'_>,
        resolver: &TypeResolver,
        property: &Arc<Property>,
        found: Option<(&str, &Value)>,
        owner: &mut dyn Reflect,
    ) -> Result<()> {
        let (setting, raw) = found.unzip();
        ctx.enter_scope(Scope::property(property, setting), Slot::Empty)?;
        let result = self
            .read_value(ctx, resolver, property, raw.cloned(), owner)
            .map_err(|e| e.at(ctx.error_path()));
        let exited = ctx.exit_scope(Slot::Empty);
        result?;
        exited?;
        Ok(())
    }

    fn read_value(
        &self,
        ctx: &mut Context<'_>,
        resolver: &TypeResolver,
        property: &Property,
        mut raw: Option<Value>,
        owner: &mut dyn Reflect,
    ) -> Result<()> {
        for middleware in &self.middleware {
            raw = middleware(ctx, property, raw)?;
        }
        let raw = raw.filter(|value| !value.is_null());

        if !self.settings.contains(DenormalizerSettings::DISABLE_VALIDATION) {
            if let Err(message) = property.validator().check(raw.as_ref()) {
                if property.validator().is_silent() {
                    tracing::debug!(path = %ctx.path(), %message, "skipping invalid setting");
                    return Ok(());
                }
                return Err(Error::Validation {
                    path: ctx.error_path(),
                    message,
                });
            }
        }

        let ty = property.ty().resolve(resolver);
        let value = match property.denormalizer() {
            Some(DenormalizeProcessor::Replace(process)) => {
                process(raw.as_ref().unwrap_or(&Value::Null), &*ctx)?
            }
            Some(DenormalizeProcessor::After(process)) => {
                let converted = convert(ctx, raw.as_ref(), &ty)?;
                process(converted, &*ctx)?
            }
            None => convert(ctx, raw.as_ref(), &ty)?,
        };
        let value = match (value, property.dictionary_schema()) {
            (Some(value), Some(schema)) => match value.take::<Dictionary>() {
                Ok(dictionary) => Some(Box::new(dictionary.project(Arc::clone(schema))?) as Box<dyn Reflect>),
                Err(value) => Some(value),
            },
            (value, _) => value,
        };

        let Some(mut value) = value else {
            if property.is_optional() {
                return Ok(());
            }
            return property.accessor().set(owner, None);
        };
        ctx.enter_scope(Scope::Value, Slot::Value(value.as_mut()))?;
        ctx.exit_scope(Slot::Value(value.as_mut()))?;
        property.accessor().set(owner, Some(value))
    }
}

fn convert(ctx: &mut Context<'_>, raw: Option<&Value>, ty: &Type) -> Result<Option<Box<dyn Reflect>>> {
    match raw {
        Some(value) => ctx.complexify(value, ty),
        None => Ok(None),
    }
}

impl fmt::Debug for Denormalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Denormalizer")
            .field("settings", &self.settings)
            .field("middleware", &self.middleware.len())
            .field("completion", &self.completion.is_some())
            .finish()
    }
}

/// Denormalizes the elements of an array value, each within its element
/// scope. A value that is not an array is treated as a one-element array,
/// and elements producing nothing are dropped.
pub(crate) fn denormalize_elements(ctx: &mut Context<'_>, value: &Value, element: &Type) -> Result<DynamicList> {
    let items = match value {
        Value::Array(items) => items,
        other => core::slice::from_ref(other),
    };
    let mut list = DynamicList::new();
    for (index, item) in items.iter().enumerate() {
        if let Some(complex) = ctx.scoped(Scope::Element(index), |ctx| ctx.complexify(item, element))? {
            list.push(complex);
        }
    }
    Ok(list)
}
