//! Per-call traversal state.
//!
//! A [`Context`] is created for every top-level normalize or denormalize
//! call and tracks where the traversal currently is as a stack of
//! [`Scope`]s. The stack renders to a path such as `servers.primary[2]`,
//! which is attached to every error raised below it.
//!
//! A context may carry [`Injector`]s, which observe every scope as it is
//! entered and exited and may act on the data the scope belongs to.

use alloc::{boxed::Box, string::String, sync::Arc, vec::Vec};
use core::fmt;

mod injector;

pub use injector::{EntryKeyInjector, Injector, PropertyDescriptionInjector};

use crate::{
    Dictionary, Error, Result, Value,
    error::{Path, PathSegment},
    factory::ConfigFactory,
    reflect::Reflect,
    schema::Property,
    types::Type,
};

/// How [`Context::build_path`] names property scopes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PathType {
    /// The identifier of the backing field.
    Field,
    /// The primary setting name.
    Primary,
    /// The setting name actually used, which may be an alias.
    Setting,
}

/// One level of a traversal.
#[derive(Clone, Debug)]
pub enum Scope {
    /// A property of a schema-bearing type. `setting` is the key the value
    /// is read from or written to, absent when the dictionary has none.
    Property {
        property: Arc<Property>,
        setting: Option<String>,
    },
    /// An array element.
    Element(usize),
    /// A value about to be written, or just produced.
    Value,
}

impl Scope {
    #[must_use]
    pub fn property(property: &Arc<Property>, setting: Option<&str>) -> Self {
        Scope::Property {
            property: Arc::clone(property),
            setting: setting.map(String::from),
        }
    }
}

/// The data a scope belongs to, lent to injectors.
pub enum Slot<'a> {
    Empty,
    /// The dictionary being written during normalization.
    Container(&'a mut Dictionary),
    /// The value produced for a property during denormalization.
    Value(&'a mut dyn Reflect),
}

/// Traversal state of one normalize or denormalize call.
pub struct Context<'f> {
    factory: &'f ConfigFactory,
    scopes: Vec<Scope>,
    injectors: Vec<Arc<dyn Injector>>,
}

impl<'f> Context<'f> {
    /// A context without injectors. Prefer [`ConfigFactory::create_context`],
    /// which respects the factory's [`ContextProvider`].
    #[must_use]
    pub fn new(factory: &'f ConfigFactory) -> Self {
        Self {
            factory,
            scopes: Vec::new(),
            injectors: Vec::new(),
        }
    }

    /// Adds an injector. Injectors run in the order they were added.
    #[must_use]
    pub fn inject(mut self, injector: impl Injector + 'static) -> Self {
        self.injectors.push(Arc::new(injector));
        self
    }

    #[must_use]
    pub fn factory(&self) -> &'f ConfigFactory {
        self.factory
    }

    #[must_use]
    pub fn is_injectable(&self) -> bool {
        !self.injectors.is_empty()
    }

    /// Enters `scope`. If an injector fails, the stack is left as it was.
    pub fn enter_scope(&mut self, scope: Scope, mut slot: Slot<'_>) -> Result<()> {
        for injector in &self.injectors {
            injector.before_enter_scope(self, &scope, &mut slot)?;
        }
        self.scopes.push(scope);
        let entered = match self.scopes.last() {
            Some(scope) => self
                .injectors
                .iter()
                .try_for_each(|injector| injector.after_enter_scope(self, scope, &mut slot)),
            None => Ok(()),
        };
        if entered.is_err() {
            self.scopes.pop();
        }
        entered
    }

    /// Leaves the innermost scope and returns it, or `None` at the top
    /// level. The scope is popped even when an injector fails.
    pub fn exit_scope(&mut self, mut slot: Slot<'_>) -> Result<Option<Scope>> {
        let exiting = match self.scopes.last() {
            Some(current) => self
                .injectors
                .iter()
                .try_for_each(|injector| injector.before_exit_scope(self, current, &mut slot)),
            None => return Ok(None),
        };
        let Some(scope) = self.scopes.pop() else {
            return Ok(None);
        };
        exiting?;
        for injector in &self.injectors {
            injector.after_exit_scope(self, &scope, &mut slot)?;
        }
        Ok(Some(scope))
    }

    /// Runs `f` inside `scope`. The scope is left on every path out of
    /// `f`, and errors raised inside carry the path of the scope.
    pub fn scoped<R>(&mut self, scope: Scope, f: impl FnOnce(&mut Self) -> Result<R>) -> Result<R> {
        self.enter_scope(scope, Slot::Empty)?;
        let result = f(self).map_err(|e| e.at(self.error_path()));
        let exited = self.exit_scope(Slot::Empty);
        let value = result?;
        exited?;
        Ok(value)
    }

    /// The scope `backward` levels up from the innermost one.
    #[must_use]
    pub fn scope(&self, backward: usize) -> Option<&Scope> {
        self.scopes.iter().rev().nth(backward)
    }

    #[must_use]
    pub fn scopes(&self) -> &[Scope] {
        &self.scopes
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// The path of field identifiers, e.g. `foo.qux.bar[0][3]`.
    #[must_use]
    pub fn path(&self) -> String {
        self.build_path(PathType::Field, ".")
    }

    #[must_use]
    pub fn build_path(&self, kind: PathType, separator: &str) -> String {
        self.path_segments(kind).join(separator)
    }

    pub(crate) fn error_path(&self) -> Path {
        self.path_segments(PathType::Field)
    }

    fn path_segments(&self, kind: PathType) -> Path {
        self.scopes
            .iter()
            .filter_map(|scope| match scope {
                Scope::Property { property, setting } => {
                    let name = match kind {
                        PathType::Field => property.field(),
                        PathType::Primary => property.name(),
                        PathType::Setting => setting.as_deref().unwrap_or_default(),
                    };
                    Some(PathSegment::Field(name.into()))
                }
                Scope::Element(index) => Some(PathSegment::Element(*index)),
                Scope::Value => None,
            })
            .collect()
    }

    /// Normalizes `value` against `declared` within this context.
    pub fn simplify(&mut self, declared: &Type, value: &dyn Reflect) -> Result<Option<Value>> {
        let factory = self.factory;
        factory.normalizer().normalize(self, declared, value)
    }

    /// Denormalizes `value` into `target` within this context.
    pub fn complexify(&mut self, value: &Value, target: &Type) -> Result<Option<Box<dyn Reflect>>> {
        let factory = self.factory;
        factory.denormalizer().denormalize(self, value, target)
    }
}

impl fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("path", &self.path())
            .field("depth", &self.depth())
            .field("injectors", &self.injectors.len())
            .finish_non_exhaustive()
    }
}

/// Chooses the context each top-level call runs in.
pub trait ContextProvider: Send + Sync {
    fn provide<'f>(&self, factory: &'f ConfigFactory) -> Context<'f>;
}

impl<F> ContextProvider for F
where
    F: Fn(&ConfigFactory) -> Context<'_> + Send + Sync,
{
    fn provide<'f>(&self, factory: &'f ConfigFactory) -> Context<'f> {
        self(factory)
    }
}

/// Provides plain contexts without injectors.
#[derive(Copy, Clone, Debug, Default)]
pub struct DefaultContextProvider;

impl ContextProvider for DefaultContextProvider {
    fn provide<'f>(&self, factory: &'f ConfigFactory) -> Context<'f> {
        Context::new(factory)
    }
}

pub(crate) fn injection_error(context: &Context<'_>, message: impl fmt::Display) -> Error {
    Error::Injection(message.to_string()).at(context.error_path())
}
