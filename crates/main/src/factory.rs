//! The entry point tying schemas, adapters and converters together.
//!
//! A [`ConfigFactory`] owns every cache of the engine. Factories are
//! independent of each other, `Send + Sync`, and meant to be built once and
//! shared.
//!
//! ```
//! use dictum::{Dictionary, Value, factory::ConfigFactory, settings::NormalizerSettings};
//!
//! let factory = ConfigFactory::builder()
//!     .normalizer_settings(NormalizerSettings::IGNORE_EMPTY_ARRAYS)
//!     .build();
//! let value = factory.normalize(&vec![1_u8, 2, 3]).unwrap();
//! assert_eq!(value, Some(Value::array([1_u8, 2, 3])));
//!
//! let back: Option<Vec<u8>> = factory.denormalize(&value.unwrap()).unwrap();
//! assert_eq!(back, Some(vec![1, 2, 3]));
//! ```

use alloc::{boxed::Box, sync::Arc, vec::Vec};
use core::fmt;

use indexmap::IndexMap;

use crate::{
    Dictionary, Error, Result, Value,
    adapter::{
        AdapterMap, AdapterProvider, CacheableAdapterProvider, IndexedAdapterProvider,
        SimpleAdapterProvider, TypeAdapter, default_adapters,
    },
    context::{Context, ContextProvider, DefaultContextProvider},
    denormalizer::{Completion, Denormalizer, Middleware},
    instance::{InstanceAssembler, InstanceFactory},
    normalizer::Normalizer,
    reflect::{FromReflect, Reflect},
    schema::{ClassSchema, NamingPolicy, Property, SchemaScanner},
    settings::{DenormalizerSettings, NormalizerSettings},
    types::{Class, Typed},
    util::{BoundedCache, CACHE_CAPACITY},
    validate::ValidationRegistry,
};

pub struct ConfigFactory {
    naming: NamingPolicy,
    registry: ValidationRegistry,
    adapters: Box<dyn AdapterProvider>,
    normalizer: Normalizer,
    denormalizer: Denormalizer,
    instances: InstanceFactory,
    context_provider: Arc<dyn ContextProvider>,
    schemas: BoundedCache<Class, Arc<ClassSchema>>,
}

impl ConfigFactory {
    #[must_use]
    pub fn builder() -> ConfigFactoryBuilder {
        ConfigFactoryBuilder::default()
    }

    /// Returns the schema of a schema-bearing class, scanning it on first
    /// use.
    pub fn schema(&self, class: &Class) -> Result<Arc<ClassSchema>> {
        if let Some(schema) = self.schemas.get(class) {
            tracing::trace!(class = class.name(), "schema cache hit");
            return Ok(schema);
        }
        tracing::trace!(class = class.name(), "schema cache miss");
        self.schemas.get_or_try_insert_with(class, || {
            SchemaScanner::new(&self.naming, &self.registry)
                .scan(class)
                .map(Arc::new)
        })
    }

    /// The adapter responsible for `class`, if any.
    #[must_use]
    pub fn adapter(&self, class: &Class) -> Option<Arc<dyn TypeAdapter>> {
        self.adapters.adapter(class)
    }

    #[must_use]
    pub fn naming(&self) -> &NamingPolicy {
        &self.naming
    }

    #[must_use]
    pub fn validation_registry(&self) -> &ValidationRegistry {
        &self.registry
    }

    #[must_use]
    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    #[must_use]
    pub fn denormalizer(&self) -> &Denormalizer {
        &self.denormalizer
    }

    #[must_use]
    pub fn instances(&self) -> &InstanceFactory {
        &self.instances
    }

    /// A fresh context for a top-level call, as chosen by the configured
    /// [`ContextProvider`].
    #[must_use]
    pub fn create_context(&self) -> Context<'_> {
        self.context_provider.provide(self)
    }

    /// Normalizes `value` against its own runtime type.
    pub fn normalize<T: Reflect>(&self, value: &T) -> Result<Option<Value>> {
        let mut ctx = self.create_context();
        self.normalizer.normalize(&mut ctx, &value.reflect_type(), value)
    }

    /// Writes the properties of a schema-bearing `value` into `container`.
    pub fn normalize_to_dictionary<T: Reflect>(&self, value: &T, container: &mut Dictionary) -> Result<()> {
        let mut ctx = self.create_context();
        self.normalizer.normalize_to_dictionary(&mut ctx, value, container)
    }

    /// Denormalizes `value` into a new `T`.
    pub fn denormalize<T: FromReflect + Typed>(&self, value: &Value) -> Result<Option<T>> {
        let mut ctx = self.create_context();
        let Some(instance) = self.denormalizer.denormalize(&mut ctx, value, &T::type_descriptor())? else {
            return Ok(None);
        };
        T::take_from_reflect(instance)
            .map(Some)
            .map_err(|other| Error::type_mismatch(T::class().name(), other.reflect_class().name()))
    }

    /// Populates an existing schema-bearing `instance` from `dictionary`.
    pub fn denormalize_to_instance<T: Reflect>(&self, dictionary: &Dictionary, instance: &mut T) -> Result<()> {
        let mut ctx = self.create_context();
        self.denormalizer.denormalize_to_instance(&mut ctx, dictionary, instance)
    }
}

impl Default for ConfigFactory {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl fmt::Debug for ConfigFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigFactory")
            .field("naming", &self.naming)
            .field("normalizer", &self.normalizer)
            .field("denormalizer", &self.denormalizer)
            .field("instances", &self.instances)
            .field("schemas", &self.schemas.len())
            .finish_non_exhaustive()
    }
}

/// Configures a [`ConfigFactory`].
pub struct ConfigFactoryBuilder {
    adapters: AdapterMap,
    naming: NamingPolicy,
    registry: ValidationRegistry,
    normalizer_settings: NormalizerSettings,
    denormalizer_settings: DenormalizerSettings,
    middleware: Vec<Middleware>,
    completion: Option<Completion>,
    context_provider: Arc<dyn ContextProvider>,
    assemblers: IndexMap<Class, Arc<dyn InstanceAssembler>>,
    call_super_adapter: bool,
    indexed: bool,
    cacheable: bool,
}

impl Default for ConfigFactoryBuilder {
    fn default() -> Self {
        Self {
            adapters: default_adapters(),
            naming: NamingPolicy::default(),
            registry: ValidationRegistry::default(),
            normalizer_settings: NormalizerSettings::default(),
            denormalizer_settings: DenormalizerSettings::default(),
            middleware: Vec::new(),
            completion: None,
            context_provider: Arc::new(DefaultContextProvider),
            assemblers: IndexMap::new(),
            call_super_adapter: true,
            indexed: true,
            cacheable: true,
        }
    }
}

impl ConfigFactoryBuilder {
    /// Registers `adapter` for `class`, replacing any earlier registration.
    #[must_use]
    pub fn adapter(mut self, class: Class, adapter: impl TypeAdapter + 'static) -> Self {
        self.adapters.insert(class, Arc::new(adapter));
        self
    }

    /// Registers `adapter` for the class of `T`.
    #[must_use]
    pub fn adapter_for<T: Typed>(self, adapter: impl TypeAdapter + 'static) -> Self {
        self.adapter(T::class(), adapter)
    }

    /// Replaces all adapters, including the built-in ones.
    #[must_use]
    pub fn adapters(mut self, adapters: AdapterMap) -> Self {
        self.adapters = adapters;
        self
    }

    /// The naming policy of classes that do not declare their own.
    #[must_use]
    pub fn naming(mut self, naming: NamingPolicy) -> Self {
        self.naming = naming;
        self
    }

    #[must_use]
    pub fn validation_registry(mut self, registry: ValidationRegistry) -> Self {
        self.registry = registry;
        self
    }

    #[must_use]
    pub fn normalizer_settings(mut self, settings: NormalizerSettings) -> Self {
        self.normalizer_settings = settings;
        self
    }

    #[must_use]
    pub fn denormalizer_settings(mut self, settings: DenormalizerSettings) -> Self {
        self.denormalizer_settings = settings;
        self
    }

    /// Adds a step run on every raw setting before it is validated.
    /// Steps run in the order they were added.
    #[must_use]
    pub fn middleware<F>(mut self, middleware: F) -> Self
    where
        F: Fn(&Context<'_>, &Property, Option<Value>) -> Result<Option<Value>> + Send + Sync + 'static,
    {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Sets the callback run on every fully denormalized schema-bearing
    /// instance.
    #[must_use]
    pub fn on_complete<F>(mut self, completion: F) -> Self
    where
        F: Fn(&Context<'_>, &mut dyn Reflect) + Send + Sync + 'static,
    {
        self.completion = Some(Arc::new(completion));
        self
    }

    #[must_use]
    pub fn context_provider(mut self, provider: impl ContextProvider + 'static) -> Self {
        self.context_provider = Arc::new(provider);
        self
    }

    /// Pins the assembler used to instantiate `class`.
    #[must_use]
    pub fn assembler(mut self, class: Class, assembler: impl InstanceAssembler + 'static) -> Self {
        self.assemblers.insert(class, Arc::new(assembler));
        self
    }

    /// Whether adapters registered on supertypes apply to subtypes.
    #[must_use]
    pub fn call_super_adapter(mut self, enabled: bool) -> Self {
        self.call_super_adapter = enabled;
        self
    }

    /// Whether the adapter hierarchy is indexed up front rather than
    /// walked on every lookup.
    #[must_use]
    pub fn indexed(mut self, enabled: bool) -> Self {
        self.indexed = enabled;
        self
    }

    /// Whether adapter lookups are memoized.
    #[must_use]
    pub fn cacheable(mut self, enabled: bool) -> Self {
        self.cacheable = enabled;
        self
    }

    #[must_use]
    pub fn build(self) -> ConfigFactory {
        let adapters: Box<dyn AdapterProvider> = match (self.indexed, self.cacheable) {
            (true, true) => Box::new(CacheableAdapterProvider::new(IndexedAdapterProvider::new(
                self.adapters,
                self.call_super_adapter,
            ))),
            (true, false) => Box::new(IndexedAdapterProvider::new(self.adapters, self.call_super_adapter)),
            (false, true) => Box::new(CacheableAdapterProvider::new(SimpleAdapterProvider::new(
                self.adapters,
                self.call_super_adapter,
            ))),
            (false, false) => Box::new(SimpleAdapterProvider::new(self.adapters, self.call_super_adapter)),
        };
        ConfigFactory {
            naming: self.naming,
            registry: self.registry,
            adapters,
            normalizer: Normalizer::new(self.normalizer_settings),
            denormalizer: Denormalizer::new(self.denormalizer_settings)
                .with_middleware(self.middleware)
                .with_completion(self.completion),
            instances: InstanceFactory::new(self.assemblers),
            context_provider: self.context_provider,
            schemas: BoundedCache::new(CACHE_CAPACITY),
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::{String, ToString};

    use super::*;
    use crate::{
        adapter::AdapterRole,
        context::PropertyDescriptionInjector,
        schema::{Configurable, Declaration, Member},
        types::{NonGenericClassCell, Type},
    };

    #[derive(Debug, Default, PartialEq)]
    struct Limits {
        max_connections: u32,
        label: String,
    }

    impl Typed for Limits {
        fn class() -> Class {
            static CELL: NonGenericClassCell = NonGenericClassCell::new();
            CELL.get_or_init(|| {
                Class::builder::<Limits>()
                    .declaration(<Limits as Configurable>::declaration)
                    .constructor(|| Box::new(Limits::construct()))
                    .build()
            })
        }
    }

    impl Reflect for Limits {
        crate::impl_reflect_boilerplate! {}
    }

    impl FromReflect for Limits {}

    impl Configurable for Limits {
        fn declaration() -> Declaration {
            Declaration::new()
                .member(
                    Member::field(
                        "max_connections",
                        |l: &Limits| &l.max_connections,
                        |l| &mut l.max_connections,
                    )
                    .describe("Upper bound of open connections"),
                )
                .member(Member::field("label", |l: &Limits| &l.label, |l| &mut l.label))
        }

        fn construct() -> Self {
            Self {
                max_connections: 16,
                label: String::new(),
            }
        }
    }

    #[test]
    fn test_schema_is_cached() {
        let factory = ConfigFactory::default();
        let first = factory.schema(&Limits::class()).unwrap();
        let second = factory.schema(&Limits::class()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.property_names().collect::<Vec<_>>(), ["max_connections", "label"]);

        let err = factory.schema(&i32::class()).unwrap_err();
        assert_eq!(err.to_string(), "invalid schema for 'i32': type has no member declaration");
    }

    #[test]
    fn test_naming() {
        let factory = ConfigFactory::builder().naming(NamingPolicy::KebabCase).build();
        let value = factory
            .normalize(&Limits {
                max_connections: 4,
                label: "edge".into(),
            })
            .unwrap();
        let Some(Value::Dictionary(dict)) = value else {
            panic!("expected a dictionary");
        };
        assert_eq!(dict.keys().collect::<Vec<_>>(), ["max-connections", "label"]);

        let limits: Limits = factory.denormalize(&Value::Dictionary(dict)).unwrap().unwrap();
        assert_eq!(limits.max_connections, 4);
    }

    #[test]
    fn test_custom_adapter_overrides_builtin() {
        struct Halving;

        impl TypeAdapter for Halving {
            fn complexify(&self, _: &mut Context<'_>, value: &Value, _: &Type) -> Result<Option<Box<dyn Reflect>>> {
                let half = value.as_number().and_then(|n| n.as_i128()).map(|n| n / 2);
                Ok(half.and_then(|n| u32::try_from(n).ok()).map(|n| Box::new(n) as Box<dyn Reflect>))
            }

            fn role(&self) -> AdapterRole {
                AdapterRole::Annotator
            }
        }

        for (indexed, cacheable) in [(true, true), (true, false), (false, true), (false, false)] {
            let factory = ConfigFactory::builder()
                .adapter_for::<u32>(Halving)
                .indexed(indexed)
                .cacheable(cacheable)
                .build();
            // simple values are written as they are
            assert_eq!(factory.normalize(&42_u32).unwrap(), Some(Value::from(42_u32)));
            assert_eq!(factory.denormalize::<u32>(&Value::from(42)).unwrap(), Some(21));
            assert_eq!(factory.denormalize::<u64>(&Value::from(42)).unwrap(), Some(42));
        }
    }

    fn described(factory: &ConfigFactory) -> Context<'_> {
        Context::new(factory).inject(PropertyDescriptionInjector::new("#"))
    }

    #[test]
    fn test_context_provider_and_assembler() {
        let factory = ConfigFactory::builder()
            .context_provider(described)
            .assembler(Limits::class(), || {
                Box::new(Limits {
                    max_connections: 99,
                    label: "pinned".into(),
                }) as Box<dyn Reflect>
            })
            .build();

        let mut dict = Dictionary::new();
        factory
            .normalize_to_dictionary(&Limits::construct(), &mut dict)
            .unwrap();
        assert_eq!(
            dict.get("#max_connections"),
            Some(&Value::from("Upper bound of open connections"))
        );

        let limits: Limits = factory
            .denormalize(&Value::Dictionary(Dictionary::new()))
            .unwrap()
            .unwrap();
        assert_eq!(limits.label, "pinned");
    }
}
