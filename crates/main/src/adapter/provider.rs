use alloc::{sync::Arc, vec::Vec};
use std::collections::HashSet;

use indexmap::{IndexMap, IndexSet};

use super::{AdapterMap, TypeAdapter};
use crate::{
    types::Class,
    util::{BoundedCache, CACHE_CAPACITY},
};

/// Finds the adapter responsible for a class.
pub trait AdapterProvider: Send + Sync {
    fn adapter(&self, class: &Class) -> Option<Arc<dyn TypeAdapter>>;
}

/// Walks the hierarchy on every lookup: the class itself, then each of
/// its interfaces, then the same for its superclass, up to the root.
///
/// Registrations on [`Class::any`] are never inherited.
pub struct SimpleAdapterProvider {
    adapters: AdapterMap,
    call_super_adapter: bool,
}

impl SimpleAdapterProvider {
    /// With `call_super_adapter` disabled only exact registrations apply.
    #[must_use]
    pub fn new(adapters: AdapterMap, call_super_adapter: bool) -> Self {
        Self {
            adapters,
            call_super_adapter,
        }
    }
}

impl AdapterProvider for SimpleAdapterProvider {
    fn adapter(&self, class: &Class) -> Option<Arc<dyn TypeAdapter>> {
        if let Some(adapter) = self.adapters.get(class) {
            return Some(Arc::clone(adapter));
        }
        if !self.call_super_adapter {
            return None;
        }
        let any = Class::any();
        let mut current = Some(class);
        while let Some(class) = current {
            if let Some(adapter) = self.adapters.get(class) {
                return Some(Arc::clone(adapter));
            }
            let inherited = class
                .interfaces()
                .iter()
                .filter(|i| **i != any)
                .find_map(|i| self.adapters.get(i));
            if let Some(adapter) = inherited {
                return Some(Arc::clone(adapter));
            }
            current = class.super_class();
        }
        None
    }
}

/// Resolves the whole registered hierarchy up front.
///
/// Every class reachable from a registered class through superclasses and
/// interfaces becomes a node of an inheritance graph. The graph is filled
/// from its roots down: each node without an explicit registration takes
/// the adapter of the nearest registered ancestor. Classes outside the
/// graph fall back to a hierarchy walk over the filled index.
pub struct IndexedAdapterProvider {
    index: SimpleAdapterProvider,
}

impl IndexedAdapterProvider {
    #[must_use]
    pub fn new(adapters: AdapterMap, call_super_adapter: bool) -> Self {
        let index = if call_super_adapter {
            let mut graph = ClassGraph::default();
            for (class, adapter) in adapters {
                graph.decorate(class, adapter);
            }
            graph.fill();
            graph.decoration.shift_remove(&Class::any());
            tracing::debug!(classes = graph.decoration.len(), "indexed adapter hierarchy");
            graph.decoration
        } else {
            adapters
        };
        Self {
            index: SimpleAdapterProvider::new(index, call_super_adapter),
        }
    }
}

impl AdapterProvider for IndexedAdapterProvider {
    fn adapter(&self, class: &Class) -> Option<Arc<dyn TypeAdapter>> {
        self.index.adapter(class)
    }
}

#[derive(Default)]
struct ClassGraph {
    roots: IndexSet<Class>,
    decoration: AdapterMap,
    children: IndexMap<Class, IndexSet<Class>>,
}

impl ClassGraph {
    fn decorate(&mut self, node: Class, adapter: Arc<dyn TypeAdapter>) {
        self.decoration.insert(node.clone(), adapter);
        self.discover(&node, &mut HashSet::new());
    }

    fn discover(&mut self, node: &Class, visited: &mut HashSet<Class>) {
        if !visited.insert(node.clone()) {
            return;
        }
        let parents: Vec<Class> = node
            .super_class()
            .into_iter()
            .chain(node.interfaces())
            .cloned()
            .collect();
        if parents.is_empty() {
            self.roots.insert(node.clone());
        }
        for parent in parents {
            self.children
                .entry(parent.clone())
                .or_default()
                .insert(node.clone());
            self.discover(&parent, visited);
        }
    }

    fn fill(&mut self) {
        let any = Class::any();
        let roots: Vec<Class> = self.roots.iter().cloned().collect();
        for root in roots {
            let adapter = if root == any {
                None
            } else {
                self.decoration.get(&root).cloned()
            };
            self.fill_from(&root, adapter.as_ref(), &mut HashSet::new());
        }
    }

    fn fill_from(
        &mut self,
        parent: &Class,
        adapter: Option<&Arc<dyn TypeAdapter>>,
        visited: &mut HashSet<Class>,
    ) {
        if !visited.insert(parent.clone()) {
            return;
        }
        let Some(children) = self.children.get(parent).cloned() else {
            return;
        };
        for child in children {
            if let Some(local) = self.decoration.get(&child).cloned() {
                self.fill_from(&child, Some(&local), visited);
            } else if let Some(adapter) = adapter {
                self.decoration.insert(child.clone(), Arc::clone(adapter));
                self.fill_from(&child, Some(adapter), visited);
            } else {
                self.fill_from(&child, None, visited);
            }
        }
    }
}

/// Memoizes the lookups of another provider, including misses.
pub struct CacheableAdapterProvider<P> {
    inner: P,
    cache: BoundedCache<Class, Option<Arc<dyn TypeAdapter>>>,
}

impl<P: AdapterProvider> CacheableAdapterProvider<P> {
    #[must_use]
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            cache: BoundedCache::new(CACHE_CAPACITY),
        }
    }
}

impl<P: AdapterProvider> AdapterProvider for CacheableAdapterProvider<P> {
    fn adapter(&self, class: &Class) -> Option<Arc<dyn TypeAdapter>> {
        if let Some(hit) = self.cache.get(class) {
            tracing::trace!(class = class.name(), "adapter cache hit");
            return hit;
        }
        tracing::trace!(class = class.name(), "adapter cache miss");
        let found: Result<_, core::convert::Infallible> =
            self.cache.get_or_try_insert_with(class, || Ok(self.inner.adapter(class)));
        match found {
            Ok(adapter) => adapter,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        adapter::AdapterRole,
        types::{ClassKind, Typed},
    };

    struct Tagged(AdapterRole);

    impl TypeAdapter for Tagged {
        fn role(&self) -> AdapterRole {
            self.0
        }
    }

    fn adapter(role: AdapterRole) -> Arc<dyn TypeAdapter> {
        Arc::new(Tagged(role))
    }

    fn role_of(provider: &dyn AdapterProvider, class: &Class) -> Option<AdapterRole> {
        provider.adapter(class).map(|a| a.role())
    }

    fn hierarchy() -> (Class, Class, Class) {
        struct Base;
        struct Leaf;
        let shape = Class::named("Shape", ClassKind::Interface).build();
        let base = Class::builder::<Base>()
            .kind(ClassKind::Abstract)
            .implements(shape.clone())
            .build();
        let leaf = Class::builder::<Leaf>().extends(base.clone()).build();
        (shape, base, leaf)
    }

    fn providers(adapters: &AdapterMap) -> Vec<Box<dyn AdapterProvider>> {
        vec![
            Box::new(SimpleAdapterProvider::new(adapters.clone(), true)),
            Box::new(IndexedAdapterProvider::new(adapters.clone(), true)),
            Box::new(CacheableAdapterProvider::new(IndexedAdapterProvider::new(
                adapters.clone(),
                true,
            ))),
        ]
    }

    #[test]
    fn test_exact_class_wins() {
        let (shape, _, leaf) = hierarchy();
        let mut adapters = AdapterMap::new();
        adapters.insert(shape, adapter(AdapterRole::Annotator));
        adapters.insert(leaf.clone(), adapter(AdapterRole::Inferencer));
        for provider in providers(&adapters) {
            assert_eq!(role_of(&*provider, &leaf), Some(AdapterRole::Inferencer));
        }
    }

    #[test]
    fn test_inherited_through_superclass_interface() {
        let (shape, base, leaf) = hierarchy();
        let mut adapters = AdapterMap::new();
        adapters.insert(shape, adapter(AdapterRole::Annotator));
        for provider in providers(&adapters) {
            assert_eq!(role_of(&*provider, &base), Some(AdapterRole::Annotator));
            assert_eq!(role_of(&*provider, &leaf), Some(AdapterRole::Annotator));
            assert_eq!(role_of(&*provider, &i32::class()), None);
        }
    }

    #[test]
    fn test_any_is_not_inherited() {
        let (_, _, leaf) = hierarchy();
        let mut adapters = AdapterMap::new();
        adapters.insert(Class::any(), adapter(AdapterRole::Adapter));
        for provider in providers(&adapters) {
            assert_eq!(role_of(&*provider, &leaf), None);
        }
    }

    #[test]
    fn test_without_super_adapter() {
        let (shape, _, leaf) = hierarchy();
        let mut adapters = AdapterMap::new();
        adapters.insert(shape.clone(), adapter(AdapterRole::Adapter));
        let provider = IndexedAdapterProvider::new(adapters, false);
        assert_eq!(role_of(&provider, &leaf), None);
        assert_eq!(role_of(&provider, &shape), Some(AdapterRole::Adapter));
    }

    #[test]
    fn test_number_hierarchy() {
        let mut adapters = AdapterMap::new();
        adapters.insert(Class::number(), adapter(AdapterRole::Annotator));
        adapters.insert(i64::class(), adapter(AdapterRole::Inferencer));
        let provider = CacheableAdapterProvider::new(IndexedAdapterProvider::new(adapters, true));
        assert_eq!(role_of(&provider, &i64::class()), Some(AdapterRole::Inferencer));
        assert_eq!(role_of(&provider, &u8::class()), Some(AdapterRole::Annotator));
        assert_eq!(role_of(&provider, &u8::class()), Some(AdapterRole::Annotator));
        assert_eq!(role_of(&provider, &String::class()), None);
    }

    #[test]
    fn test_misses_are_cached() {
        use core::sync::atomic::{AtomicUsize, Ordering};

        struct Counting(AtomicUsize);

        impl AdapterProvider for Counting {
            fn adapter(&self, _: &Class) -> Option<Arc<dyn TypeAdapter>> {
                self.0.fetch_add(1, Ordering::Relaxed);
                None
            }
        }

        let provider = CacheableAdapterProvider::new(Counting(AtomicUsize::new(0)));
        for _ in 0..3 {
            assert_eq!(role_of(&provider, &String::class()), None);
        }
        assert_eq!(provider.inner.0.load(Ordering::Relaxed), 1);
        assert_eq!(provider.cache.len(), 1);
    }
}
