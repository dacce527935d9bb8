use alloc::{string::String, sync::Arc, vec::Vec};
use std::collections::HashMap;

use crate::{
    Error, Result, Value,
    validate::{DisabledValidator, ValidationRegistry, Validator},
    value::ValueType,
};

/// A schema for a [`Dictionary`](crate::Dictionary) built by hand rather
/// than derived from a type.
///
/// # Example
///
/// ```
/// use dictum::{Dictionary, schema::DictionarySchema, value::ValueType};
/// use std::sync::Arc;
///
/// let schema = DictionarySchema::create()
///     .add_property("name", |p| p.with_type(ValueType::String).with_aliases(["title"]))
///     .add_property("level", |p| p.with_type(ValueType::of::<i32>()))
///     .build()
///     .unwrap();
///
/// let mut dict = Dictionary::constrained(Arc::new(schema));
/// dict.put("level", 3).unwrap();
/// assert!(dict.put("level", "three").is_err());
/// ```
#[derive(Debug)]
pub struct DictionarySchema {
    name: Option<String>,
    properties: Vec<DictionaryProperty>,
    lookup: HashMap<String, usize>,
}

impl DictionarySchema {
    #[must_use]
    pub fn create() -> DictionarySchemaBuilder {
        DictionarySchemaBuilder::default()
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Looks a property up by primary name or alias.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&DictionaryProperty> {
        self.lookup.get(name).map(|&i| &self.properties[i])
    }

    #[must_use]
    pub fn properties(&self) -> &[DictionaryProperty] {
        &self.properties
    }

    /// Every primary name and alias.
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.lookup.keys().map(String::as_str)
    }
}

/// Schemas compare by identity.
impl PartialEq for DictionarySchema {
    fn eq(&self, other: &Self) -> bool {
        core::ptr::eq(self, other)
    }
}

#[derive(Default)]
pub struct DictionarySchemaBuilder {
    name: Option<String>,
    properties: Vec<DictionaryPropertyBuilder>,
}

impl DictionarySchemaBuilder {
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn add_property(
        mut self,
        name: impl Into<String>,
        build: impl FnOnce(DictionaryPropertyBuilder) -> DictionaryPropertyBuilder,
    ) -> Self {
        self.properties.push(build(DictionaryProperty::create(name)));
        self
    }

    /// Builds the schema.
    ///
    /// Fails if two properties share a primary name or a property is
    /// malformed. An alias that collides with an earlier name is dropped.
    pub fn build(self) -> Result<DictionarySchema> {
        let name = self.name.unwrap_or_default();
        let properties = self
            .properties
            .into_iter()
            .map(DictionaryPropertyBuilder::build)
            .collect::<Result<Vec<_>>>()
            .map_err(|e| match e {
                Error::InvalidValue(message) => Error::schema(&name, message),
                other => other,
            })?;

        let mut lookup = HashMap::new();
        for (i, property) in properties.iter().enumerate() {
            if lookup.insert(property.name.clone(), i).is_some() {
                return Err(Error::schema(
                    &name,
                    format!("duplicate property name '{}'", property.name),
                ));
            }
        }
        for (i, property) in properties.iter().enumerate() {
            for alias in &property.aliases {
                lookup.entry(alias.clone()).or_insert(i);
            }
        }

        Ok(DictionarySchema {
            name: (!name.is_empty()).then_some(name),
            properties,
            lookup,
        })
    }
}

/// One property of a [`DictionarySchema`].
#[derive(Debug)]
pub struct DictionaryProperty {
    name: String,
    aliases: Vec<String>,
    description: Vec<String>,
    validator: Arc<dyn Validator>,
    value_type: ValueType,
    schema: Option<Arc<DictionarySchema>>,
}

impl DictionaryProperty {
    #[must_use]
    pub fn create(name: impl Into<String>) -> DictionaryPropertyBuilder {
        DictionaryPropertyBuilder {
            name: name.into(),
            aliases: Vec::new(),
            description: Vec::new(),
            validator: None,
            value_type: ValueType::Any,
            schema: None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    #[must_use]
    pub fn description(&self) -> &[String] {
        &self.description
    }

    #[must_use]
    pub fn validator(&self) -> &Arc<dyn Validator> {
        &self.validator
    }

    #[must_use]
    pub fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    /// The schema nested dictionaries must satisfy.
    #[must_use]
    pub fn schema(&self) -> Option<&Arc<DictionarySchema>> {
        self.schema.as_ref()
    }

    /// Whether `value` fits this property.
    #[must_use]
    pub fn is_compatible(&self, value: &Value) -> bool {
        self.value_type.accepts(value) && self.nested_compatible(value)
    }

    /// Checks `value` stored under `key`, failing with
    /// [`Error::InvalidValue`].
    pub fn check(&self, key: &str, value: &Value) -> Result<()> {
        if !self.value_type.accepts(value) {
            return Err(Error::InvalidValue(format!(
                "property '{key}' is not of type {}",
                self.value_type
            )));
        }
        if !self.nested_compatible(value) {
            return Err(Error::InvalidValue(format!(
                "property '{key}' does not match its nested schema"
            )));
        }
        Ok(())
    }

    fn nested_compatible(&self, value: &Value) -> bool {
        fn walk(schema: &DictionarySchema, value: &Value) -> bool {
            match value {
                Value::Dictionary(dict) => dict.is_compatible_with(Some(schema)),
                Value::Array(items) => items.iter().all(|item| walk(schema, item)),
                _ => true,
            }
        }
        self.schema.as_deref().is_none_or(|schema| walk(schema, value))
    }
}

pub struct DictionaryPropertyBuilder {
    name: String,
    aliases: Vec<String>,
    description: Vec<String>,
    validator: Option<Result<Arc<dyn Validator>>>,
    value_type: ValueType,
    schema: Option<Arc<DictionarySchema>>,
}

impl DictionaryPropertyBuilder {
    /// Replaces the primary name with the first of `names`; the rest become
    /// aliases.
    #[must_use]
    pub fn with_names<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        let mut names = names.into_iter().map(Into::into);
        if let Some(primary) = names.next() {
            self.name = primary;
            self.aliases = names.collect();
        }
        self
    }

    #[must_use]
    pub fn with_aliases<S: Into<String>>(mut self, aliases: impl IntoIterator<Item = S>) -> Self {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_description<S: Into<String>>(mut self, lines: impl IntoIterator<Item = S>) -> Self {
        self.description = lines.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.validator = Some(Ok(validator));
        self
    }

    /// Compiles `expression` against the default validation registry.
    #[must_use]
    pub fn with_validation(mut self, expression: &str) -> Self {
        self.validator = Some(
            ValidationRegistry::default()
                .parse(expression, false)
                .map(|v| Arc::new(v) as Arc<dyn Validator>),
        );
        self
    }

    #[must_use]
    pub fn with_type(mut self, value_type: ValueType) -> Self {
        self.value_type = value_type;
        self
    }

    #[must_use]
    pub fn with_schema(mut self, schema: impl Into<Arc<DictionarySchema>>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Declares a nested dictionary constrained by `schema`.
    #[must_use]
    pub fn dictionary(self, schema: impl Into<Arc<DictionarySchema>>) -> Self {
        self.with_type(ValueType::Dictionary).with_schema(schema)
    }

    /// Declares an array of dictionaries constrained by `schema`.
    #[must_use]
    pub fn dictionary_array(self, schema: impl Into<Arc<DictionarySchema>>) -> Self {
        self.with_type(ValueType::array_of(ValueType::Dictionary))
            .with_schema(schema)
    }

    pub fn build(self) -> Result<DictionaryProperty> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidValue("property name cannot be blank".into()));
        }
        if let Some(alias) = self.aliases.iter().find(|a| a.trim().is_empty()) {
            return Err(Error::InvalidValue(format!(
                "alias {alias:?} of property '{}' is blank",
                self.name
            )));
        }
        if self.schema.is_some() && !self.value_type.holds_dictionaries() {
            return Err(Error::InvalidValue(format!(
                "property '{}' has a nested schema but its type is {}",
                self.name, self.value_type
            )));
        }
        let validator = match self.validator {
            Some(validator) => validator?,
            None => Arc::new(DisabledValidator),
        };
        let mut aliases = self.aliases;
        let name = self.name;
        aliases.retain(|alias| *alias != name);
        aliases.dedup();
        Ok(DictionaryProperty {
            name,
            aliases,
            description: self.description,
            validator,
            value_type: self.value_type,
            schema: self.schema,
        })
    }
}
