use alloc::{borrow::Cow, boxed::Box, string::String, sync::Arc, vec::Vec};
use core::{
    any::TypeId,
    fmt,
    hash::{Hash, Hasher},
};
use std::sync::OnceLock;

use crate::{reflect::Reflect, schema::Declaration};

/// Identity of a [`Class`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ClassId {
    /// A concrete Rust type.
    Type(TypeId),
    /// An abstract class or interface with no Rust type of its own.
    Named(&'static str),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ClassKind {
    Concrete,
    Abstract,
    Interface,
}

/// Creates a fresh, default-initialized instance.
pub type Constructor = fn() -> Box<dyn Reflect>;

/// Creates an enum instance from a variant name.
pub type VariantConstructor = fn(&str) -> Option<Box<dyn Reflect>>;

/// Runtime description of a type: the stand-in for a class hierarchy.
///
/// A class knows its superclass and the interfaces it implements, which is
/// all adapter resolution needs. Schema-bearing classes also carry a member
/// [`Declaration`]; instantiable classes carry a constructor.
///
/// Classes compare by identity and are cheap to clone.
#[derive(Clone)]
pub struct Class(Arc<ClassInfo>);

struct ClassInfo {
    id: ClassId,
    name: Cow<'static, str>,
    kind: ClassKind,
    super_class: Option<Class>,
    interfaces: Vec<Class>,
    type_params: Vec<&'static str>,
    constructor: Option<Constructor>,
    declaration: Option<fn() -> Declaration>,
    variants: &'static [&'static str],
    from_variant: Option<VariantConstructor>,
    simple: bool,
}

impl Class {
    /// Starts building the class of the Rust type `T`.
    #[must_use]
    pub fn builder<T: ?Sized + 'static>() -> ClassBuilder {
        ClassBuilder::new(
            ClassId::Type(TypeId::of::<T>()),
            Cow::Owned(short_type_name(core::any::type_name::<T>())),
            ClassKind::Concrete,
        )
    }

    /// Starts building an abstract class or interface identified by name.
    #[must_use]
    pub fn named(name: &'static str, kind: ClassKind) -> ClassBuilder {
        ClassBuilder::new(ClassId::Named(name), Cow::Borrowed(name), kind)
    }

    #[must_use]
    pub fn id(&self) -> ClassId {
        self.0.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    #[must_use]
    pub fn kind(&self) -> ClassKind {
        self.0.kind
    }

    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.0.kind == ClassKind::Interface
    }

    #[must_use]
    pub fn super_class(&self) -> Option<&Class> {
        self.0.super_class.as_ref()
    }

    #[must_use]
    pub fn interfaces(&self) -> &[Class] {
        &self.0.interfaces
    }

    /// Names of the declared generic parameters, in order.
    #[must_use]
    pub fn type_params(&self) -> &[&'static str] {
        &self.0.type_params
    }

    #[must_use]
    pub fn constructor(&self) -> Option<Constructor> {
        self.0.constructor
    }

    /// The member declaration of a schema-bearing class.
    #[must_use]
    pub fn declaration(&self) -> Option<Declaration> {
        self.0.declaration.map(|declare| declare())
    }

    /// Whether the class carries a schema.
    #[must_use]
    pub fn has_schema(&self) -> bool {
        self.0.declaration.is_some()
    }

    /// Whether values of this class are simple values.
    #[must_use]
    pub fn is_simple(&self) -> bool {
        self.0.simple
    }

    #[must_use]
    pub fn is_enum(&self) -> bool {
        self.0.from_variant.is_some()
    }

    #[must_use]
    pub fn variants(&self) -> &'static [&'static str] {
        self.0.variants
    }

    /// Builds an instance of an enum class from the exact variant name.
    #[must_use]
    pub fn variant(&self, name: &str) -> Option<Box<dyn Reflect>> {
        self.0.from_variant.and_then(|build| build(name))
    }

    /// Whether `self` is `other`, or inherits from or implements it.
    #[must_use]
    pub fn is_subclass_of(&self, other: &Class) -> bool {
        if self == other {
            return true;
        }
        self.interfaces().iter().any(|i| i.is_subclass_of(other))
            || self.super_class().is_some_and(|s| s.is_subclass_of(other))
    }

    /// The root of every class hierarchy.
    #[must_use]
    pub fn object() -> Class {
        static CELL: OnceLock<Class> = OnceLock::new();
        CELL.get_or_init(|| Class::named("Object", ClassKind::Abstract).root().build())
            .clone()
    }

    /// Marker interface implemented by every reflected type. Adapter
    /// registrations on it are never inherited.
    #[must_use]
    pub fn any() -> Class {
        static CELL: OnceLock<Class> = OnceLock::new();
        CELL.get_or_init(|| Class::named("Any", ClassKind::Interface).root().build())
            .clone()
    }

    #[must_use]
    pub fn number() -> Class {
        static CELL: OnceLock<Class> = OnceLock::new();
        CELL.get_or_init(|| {
            Class::named("Number", ClassKind::Abstract)
                .implements(Class::comparable())
                .build()
        })
        .clone()
    }

    #[must_use]
    pub fn char_sequence() -> Class {
        static CELL: OnceLock<Class> = OnceLock::new();
        CELL.get_or_init(|| Class::named("CharSequence", ClassKind::Interface).build())
            .clone()
    }

    #[must_use]
    pub fn comparable() -> Class {
        static CELL: OnceLock<Class> = OnceLock::new();
        CELL.get_or_init(|| Class::named("Comparable", ClassKind::Interface).build())
            .clone()
    }

    #[must_use]
    pub fn iterable() -> Class {
        static CELL: OnceLock<Class> = OnceLock::new();
        CELL.get_or_init(|| {
            Class::named("Iterable", ClassKind::Interface)
                .type_params(&["T"])
                .build()
        })
        .clone()
    }

    #[must_use]
    pub fn collection() -> Class {
        static CELL: OnceLock<Class> = OnceLock::new();
        CELL.get_or_init(|| {
            Class::named("Collection", ClassKind::Interface)
                .implements(Class::iterable())
                .type_params(&["T"])
                .build()
        })
        .clone()
    }

    #[must_use]
    pub fn list() -> Class {
        static CELL: OnceLock<Class> = OnceLock::new();
        CELL.get_or_init(|| {
            Class::named("List", ClassKind::Interface)
                .implements(Class::collection())
                .type_params(&["T"])
                .build()
        })
        .clone()
    }

    #[must_use]
    pub fn set() -> Class {
        static CELL: OnceLock<Class> = OnceLock::new();
        CELL.get_or_init(|| {
            Class::named("Set", ClassKind::Interface)
                .implements(Class::collection())
                .type_params(&["T"])
                .build()
        })
        .clone()
    }

    #[must_use]
    pub fn map() -> Class {
        static CELL: OnceLock<Class> = OnceLock::new();
        CELL.get_or_init(|| {
            Class::named("Map", ClassKind::Interface)
                .type_params(&["K", "V"])
                .build()
        })
        .clone()
    }

    #[must_use]
    pub fn enumeration() -> Class {
        static CELL: OnceLock<Class> = OnceLock::new();
        CELL.get_or_init(|| {
            Class::named("Enum", ClassKind::Abstract)
                .implements(Class::comparable())
                .build()
        })
        .clone()
    }
}

impl PartialEq for Class {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for Class {}

impl Hash for Class {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Class({})", self.0.name)
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.name)
    }
}

pub struct ClassBuilder {
    info: ClassInfo,
    root: bool,
}

impl ClassBuilder {
    fn new(id: ClassId, name: Cow<'static, str>, kind: ClassKind) -> Self {
        Self {
            info: ClassInfo {
                id,
                name,
                kind,
                super_class: None,
                interfaces: Vec::new(),
                type_params: Vec::new(),
                constructor: None,
                declaration: None,
                variants: &[],
                from_variant: None,
                simple: false,
            },
            root: false,
        }
    }

    fn root(mut self) -> Self {
        self.root = true;
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.info.name = name.into();
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: ClassKind) -> Self {
        self.info.kind = kind;
        self
    }

    /// Sets the superclass. Defaults to [`Class::object`].
    #[must_use]
    pub fn extends(mut self, super_class: Class) -> Self {
        self.info.super_class = Some(super_class);
        self
    }

    #[must_use]
    pub fn implements(mut self, interface: Class) -> Self {
        self.info.interfaces.push(interface);
        self
    }

    #[must_use]
    pub fn type_params(mut self, params: &[&'static str]) -> Self {
        self.info.type_params = params.to_vec();
        self
    }

    #[must_use]
    pub fn constructor(mut self, constructor: Constructor) -> Self {
        self.info.constructor = Some(constructor);
        self
    }

    #[must_use]
    pub fn declaration(mut self, declaration: fn() -> Declaration) -> Self {
        self.info.declaration = Some(declaration);
        self
    }

    #[must_use]
    pub fn variants(
        mut self,
        variants: &'static [&'static str],
        from_variant: VariantConstructor,
    ) -> Self {
        self.info.variants = variants;
        self.info.from_variant = Some(from_variant);
        self
    }

    #[must_use]
    pub fn simple(mut self) -> Self {
        self.info.simple = true;
        self
    }

    #[must_use]
    pub fn build(mut self) -> Class {
        if !self.root {
            if self.info.super_class.is_none() && self.info.kind != ClassKind::Interface {
                self.info.super_class = Some(Class::object());
            }
            if self.info.kind != ClassKind::Interface || self.info.interfaces.is_empty() {
                self.info.interfaces.push(Class::any());
            }
        }
        Class(Arc::new(self.info))
    }
}

/// Strips module paths from a Rust type name, keeping generic arguments:
/// `alloc::vec::Vec<alloc::string::String>` becomes `Vec<String>`.
#[must_use]
pub fn short_type_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut segment_start = 0;
    let bytes = full.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b':' if bytes.get(i + 1) == Some(&b':') => {
                i += 2;
                segment_start = i;
                continue;
            }
            b'<' | b'>' | b',' | b' ' | b'[' | b']' | b';' | b'(' | b')' | b'&' => {
                out.push_str(&full[segment_start..i]);
                out.push(char::from(bytes[i]));
                segment_start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    out.push_str(&full[segment_start..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("alloc::string::String"), "String");
        assert_eq!(
            short_type_name("std::collections::hash::map::HashMap<alloc::string::String, i32>"),
            "HashMap<String, i32>"
        );
        assert_eq!(short_type_name("[core::option::Option<u8>; 4]"), "[Option<u8>; 4]");
        assert_eq!(short_type_name("u32"), "u32");
    }

    #[test]
    fn test_builtin_hierarchy() {
        assert!(Class::list().is_subclass_of(&Class::iterable()));
        assert!(Class::set().is_subclass_of(&Class::collection()));
        assert!(!Class::map().is_subclass_of(&Class::iterable()));
        assert!(Class::number().is_subclass_of(&Class::object()));
        assert!(Class::object().super_class().is_none());
        assert!(Class::list().super_class().is_none());
    }

    #[test]
    fn test_identity() {
        struct Local;
        let a = Class::builder::<Local>().build();
        let b = Class::builder::<Local>().name("Other").build();
        assert_eq!(a, b);
        assert_eq!(a.name(), "Local");
        assert_ne!(a, Class::object());
        assert_eq!(a.super_class(), Some(&Class::object()));
        assert!(a.interfaces().contains(&Class::any()));
    }
}
