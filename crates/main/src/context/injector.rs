use alloc::{boxed::Box, string::String, vec::Vec};

use super::{Context, Scope, Slot, injection_error};
use crate::{
    Result, Value,
    reflect::{Reflect, ReflectMut},
};

/// Hooks run around every scope transition of an injectable [`Context`].
///
/// `slot` lends the data the scope belongs to: the dictionary being
/// written while normalizing, the value just produced while
/// denormalizing.
#[allow(unused_variables)]
pub trait Injector: Send + Sync {
    fn before_enter_scope(&self, ctx: &Context<'_>, scope: &Scope, slot: &mut Slot<'_>) -> Result<()> {
        Ok(())
    }

    fn after_enter_scope(&self, ctx: &Context<'_>, scope: &Scope, slot: &mut Slot<'_>) -> Result<()> {
        Ok(())
    }

    fn before_exit_scope(&self, ctx: &Context<'_>, scope: &Scope, slot: &mut Slot<'_>) -> Result<()> {
        Ok(())
    }

    fn after_exit_scope(&self, ctx: &Context<'_>, scope: &Scope, slot: &mut Slot<'_>) -> Result<()> {
        Ok(())
    }
}

/// Copies map keys into the values of a map of schema-bearing types.
///
/// After a map property is denormalized, the key of every entry is written
/// into the property named by the injection point (`id` by default) of the
/// entry's value:
///
/// ```text
/// items:
///   sword: { damage: 5 }    // items["sword"].id == "sword"
/// ```
#[derive(Clone, Debug)]
pub struct EntryKeyInjector {
    injection_point: String,
}

impl EntryKeyInjector {
    #[must_use]
    pub fn new(injection_point: impl Into<String>) -> Self {
        Self {
            injection_point: injection_point.into(),
        }
    }
}

impl Default for EntryKeyInjector {
    fn default() -> Self {
        Self::new("id")
    }
}

impl Injector for EntryKeyInjector {
    fn after_exit_scope(&self, ctx: &Context<'_>, scope: &Scope, slot: &mut Slot<'_>) -> Result<()> {
        let (Scope::Value, Slot::Value(value)) = (scope, slot) else {
            return Ok(());
        };
        let ReflectMut::Map(map) = value.reflect_mut() else {
            return Ok(());
        };
        for (key, entry) in map.iter_mut() {
            let class = entry.reflect_class();
            if !class.has_schema() {
                continue;
            }
            let schema = ctx.factory().schema(&class)?;
            let Some(property) = schema.property(&self.injection_point) else {
                continue;
            };
            property
                .accessor()
                .set(entry, Some(Box::new(key) as Box<dyn Reflect>))
                .map_err(|e| {
                    injection_error(
                        ctx,
                        format!("cannot write entry key into '{}': {e}", self.injection_point),
                    )
                })?;
        }
        Ok(())
    }
}

/// Writes the description of each property next to its value.
///
/// The description is stored under `<prefix><name>`, as a string for a
/// single line and as an array of strings otherwise. Only meaningful while
/// normalizing.
#[derive(Clone, Debug)]
pub struct PropertyDescriptionInjector {
    prefix: String,
}

impl PropertyDescriptionInjector {
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for PropertyDescriptionInjector {
    fn default() -> Self {
        Self::new("#")
    }
}

impl Injector for PropertyDescriptionInjector {
    fn before_enter_scope(&self, ctx: &Context<'_>, scope: &Scope, slot: &mut Slot<'_>) -> Result<()> {
        let (Scope::Value, Slot::Container(container)) = (scope, slot) else {
            return Ok(());
        };
        let Some(Scope::Property { property, .. }) = ctx.scope(0) else {
            return Ok(());
        };
        let value = match property.description() {
            [] => return Ok(()),
            [line] => Value::from(line.as_str()),
            lines => Value::array(lines.iter().map(String::as_str).collect::<Vec<_>>()),
        };
        container
            .put(format!("{}{}", self.prefix, property.name()), value)
            .map_err(|e| injection_error(ctx, e))?;
        Ok(())
    }
}
