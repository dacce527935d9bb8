//! Declarative property validation.
//!
//! Validators are compiled from short expressions such as
//! `"not-null, range=1|65535"` by a [`ValidationRegistry`]. Each comma
//! separated item names a validation and an optional `=argument`.

use alloc::{string::String, sync::Arc, vec::Vec};
use core::fmt;
use std::collections::HashMap;

mod check;

pub use check::{NotBlank, NotEmpty, NotNull, Range, Size, Validation};

use crate::{Error, Result, Value};

/// Checks a raw value before it is converted into a property.
pub trait Validator: fmt::Debug + Send + Sync {
    /// Returns the message of the first failed validation.
    fn check(&self, value: Option<&Value>) -> core::result::Result<(), String>;

    /// A silent validator causes the property to be skipped on failure
    /// instead of aborting the whole call.
    fn is_silent(&self) -> bool;

    fn validations(&self) -> &[Arc<dyn Validation>];
}

/// Runs a list of validations in order, stopping at the first failure.
#[derive(Debug, Clone)]
pub struct AggregatedValidator {
    validations: Vec<Arc<dyn Validation>>,
    silent: bool,
}

impl AggregatedValidator {
    #[must_use]
    pub fn new(validations: Vec<Arc<dyn Validation>>, silent: bool) -> Self {
        Self {
            validations,
            silent,
        }
    }
}

impl Validator for AggregatedValidator {
    fn check(&self, value: Option<&Value>) -> core::result::Result<(), String> {
        match self.validations.iter().find(|v| !v.check(value)) {
            Some(failed) => Err(failed.message()),
            None => Ok(()),
        }
    }

    fn is_silent(&self) -> bool {
        self.silent
    }

    fn validations(&self) -> &[Arc<dyn Validation>] {
        &self.validations
    }
}

/// A validator that accepts everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledValidator;

impl Validator for DisabledValidator {
    fn check(&self, _value: Option<&Value>) -> core::result::Result<(), String> {
        Ok(())
    }

    fn is_silent(&self) -> bool {
        true
    }

    fn validations(&self) -> &[Arc<dyn Validation>] {
        &[]
    }
}

/// Builds a validation from the text after `=` (empty when absent).
pub type ValidationConstructor = Arc<dyn Fn(&str) -> Result<Arc<dyn Validation>> + Send + Sync>;

/// Maps validation names to their constructors.
#[derive(Clone)]
pub struct ValidationRegistry {
    constructors: HashMap<String, ValidationConstructor>,
}

impl ValidationRegistry {
    #[must_use]
    pub fn builder() -> ValidationRegistryBuilder {
        ValidationRegistryBuilder {
            constructors: HashMap::new(),
        }
    }

    /// Merges registries; later ones override earlier names.
    #[must_use]
    pub fn composite(registries: &[&ValidationRegistry]) -> Self {
        let mut constructors = HashMap::new();
        for registry in registries {
            constructors.extend(
                registry
                    .constructors
                    .iter()
                    .map(|(k, v)| (k.clone(), Arc::clone(v))),
            );
        }
        Self { constructors }
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Compiles an expression into a validator.
    ///
    /// # Example
    ///
    /// ```
    /// use dictum::{Value, validate::{ValidationRegistry, Validator}};
    ///
    /// let validator = ValidationRegistry::default().parse("not-null, size=|3", false).unwrap();
    /// assert!(validator.check(Some(&Value::from("abc"))).is_ok());
    /// assert_eq!(
    ///     validator.check(Some(&Value::from("abcd"))),
    ///     Err("must be at most 3".to_string())
    /// );
    /// ```
    pub fn parse(&self, expression: &str, silent: bool) -> Result<AggregatedValidator> {
        let mut validations = Vec::new();
        for item in expression.split(',').map(str::trim) {
            if item.is_empty() {
                continue;
            }
            let args: Vec<&str> = item.split('=').map(str::trim).collect();
            if args.len() > 2 {
                return Err(Error::ValidationParse(format!(
                    "invalid validation syntax at parameter '{item}'"
                )));
            }
            let constructor = self.constructors.get(args[0]).ok_or_else(|| {
                Error::ValidationParse(format!("validation type '{}' not found", args[0]))
            })?;
            validations.push(constructor(args.get(1).copied().unwrap_or_default())?);
        }
        Ok(AggregatedValidator::new(validations, silent))
    }
}

impl Default for ValidationRegistry {
    /// The registry with the built-in validations: `not-null`, `not-empty`,
    /// `not-blank` (each also spelled `notNull`, `non-null` and `nonNull`),
    /// `range=min|max` and `size=min|max`.
    fn default() -> Self {
        fn names(kebab: &str) -> [String; 4] {
            let rest = &kebab["not-".len()..];
            let mut camel = String::from(rest);
            if let Some(first) = camel.get_mut(0..1) {
                first.make_ascii_uppercase();
            }
            [
                format!("not-{rest}"),
                format!("not{camel}"),
                format!("non-{rest}"),
                format!("non{camel}"),
            ]
        }

        Self::builder()
            .add_all(names("not-null"), |_| Ok(Arc::new(NotNull)))
            .add_all(names("not-empty"), |_| Ok(Arc::new(NotEmpty)))
            .add_all(names("not-blank"), |_| Ok(Arc::new(NotBlank)))
            .add("range", |arg| Ok(Arc::new(Range::parse(arg)?)))
            .add("size", |arg| Ok(Arc::new(Size::parse(arg)?)))
            .build()
    }
}

impl fmt::Debug for ValidationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.constructors.keys().collect();
        names.sort();
        f.debug_struct("ValidationRegistry")
            .field("validations", &names)
            .finish()
    }
}

pub struct ValidationRegistryBuilder {
    constructors: HashMap<String, ValidationConstructor>,
}

impl ValidationRegistryBuilder {
    #[must_use]
    pub fn add<F>(mut self, name: impl Into<String>, constructor: F) -> Self
    where
        F: Fn(&str) -> Result<Arc<dyn Validation>> + Send + Sync + 'static,
    {
        self.constructors.insert(name.into(), Arc::new(constructor));
        self
    }

    #[must_use]
    pub fn add_all<F, I>(mut self, names: I, constructor: F) -> Self
    where
        F: Fn(&str) -> Result<Arc<dyn Validation>> + Send + Sync + 'static,
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let constructor: ValidationConstructor = Arc::new(constructor);
        for name in names {
            self.constructors.insert(name.into(), Arc::clone(&constructor));
        }
        self
    }

    #[must_use]
    pub fn build(self) -> ValidationRegistry {
        ValidationRegistry {
            constructors: self.constructors,
        }
    }
}
