//! Creation of fresh instances for denormalization.

use alloc::{boxed::Box, format, sync::Arc};
use core::fmt;

use indexmap::IndexMap;

use crate::{
    Error, Result,
    reflect::Reflect,
    types::{Class, ClassKind},
    util::{BoundedCache, CACHE_CAPACITY},
};

/// Produces a new, default-initialized instance of one class.
pub trait InstanceAssembler: Send + Sync {
    fn assemble(&self) -> Result<Box<dyn Reflect>>;
}

impl<F> InstanceAssembler for F
where
    F: Fn() -> Box<dyn Reflect> + Send + Sync,
{
    fn assemble(&self) -> Result<Box<dyn Reflect>> {
        Ok(self())
    }
}

/// Resolves and caches the assembler of each class.
///
/// Assemblers registered up front are pinned and never evicted. All other
/// classes use their declared constructor, looked up once per class.
pub struct InstanceFactory {
    pinned: IndexMap<Class, Arc<dyn InstanceAssembler>>,
    cache: BoundedCache<Class, Arc<dyn InstanceAssembler>>,
}

impl InstanceFactory {
    #[must_use]
    pub fn new(pinned: IndexMap<Class, Arc<dyn InstanceAssembler>>) -> Self {
        Self {
            pinned,
            cache: BoundedCache::new(CACHE_CAPACITY),
        }
    }

    /// Creates a new instance of `class`.
    ///
    /// # Errors
    ///
    /// Abstract classes and interfaces are rejected before any assembler
    /// is looked up, as are classes without a constructor.
    pub fn create(&self, class: &Class) -> Result<Box<dyn Reflect>> {
        if class.kind() != ClassKind::Concrete {
            return Err(Error::Instantiation {
                class: class.name().into(),
                reason: format!("{:?} classes cannot be instantiated", class.kind()).to_lowercase(),
            });
        }
        if let Some(assembler) = self.pinned.get(class) {
            return assembler.assemble();
        }
        let assembler = self.cache.get_or_try_insert_with(class, || {
            tracing::trace!(class = class.name(), "resolving instance assembler");
            class
                .constructor()
                .map(|constructor| Arc::new(constructor) as Arc<dyn InstanceAssembler>)
                .ok_or_else(|| Error::Instantiation {
                    class: class.name().into(),
                    reason: "no constructor declared".into(),
                })
        })?;
        assembler.assemble()
    }
}

impl Default for InstanceFactory {
    fn default() -> Self {
        Self::new(IndexMap::new())
    }
}

impl fmt::Debug for InstanceFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceFactory")
            .field("pinned", &self.pinned.len())
            .field("cached", &self.cache.len())
            .finish()
    }
}
