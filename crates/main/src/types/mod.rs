//! Type descriptors.
//!
//! A [`Type`] describes the declared type of a property, including generic
//! arguments, independently of any runtime value. Descriptors are built by
//! [`Typed::type_descriptor`] and by the schema declaration of a type;
//! nothing is recovered by introspection.

use alloc::{borrow::Cow, boxed::Box, string::String, sync::Arc, vec::Vec};
use core::fmt;

mod cell;
mod class;

pub use cell::{GenericClassCell, NonGenericClassCell};
pub use class::{Class, ClassBuilder, ClassId, ClassKind, Constructor, VariantConstructor, short_type_name};

/// A type with a static [`Class`] and [`Type`] descriptor.
pub trait Typed: 'static {
    fn class() -> Class;

    /// The full descriptor, including generic arguments.
    fn type_descriptor() -> Type {
        Type::Class(Self::class())
    }
}

/// A type descriptor.
#[derive(Clone, PartialEq, Eq)]
pub enum Type {
    /// A plain class.
    Class(Class),
    /// An array (a `Vec`, slice or fixed-size array) of the component type.
    Array(Box<Type>),
    /// A generic class applied to arguments, e.g. `HashMap<String, i32>`.
    Parameterized {
        raw: Class,
        args: Vec<Type>,
        owner: Option<Box<Type>>,
    },
    /// A bounded wildcard.
    Wildcard { upper: Vec<Type>, lower: Vec<Type> },
    /// A generic parameter of the enclosing type, e.g. `T`.
    Variable(Cow<'static, str>),
    /// A type whose variables are bound by `resolver`.
    Resolved {
        ty: Box<Type>,
        resolver: TypeResolver,
    },
}

impl Type {
    /// Captures the full descriptor of `T`.
    #[must_use]
    pub fn of<T: Typed + ?Sized>() -> Type {
        T::type_descriptor()
    }

    /// The unconstrained type.
    #[must_use]
    pub fn object() -> Type {
        Type::Class(Class::object())
    }

    #[must_use]
    pub fn array(component: Type) -> Type {
        Type::Array(Box::new(component))
    }

    #[must_use]
    pub fn parameterized(raw: Class, args: Vec<Type>) -> Type {
        Type::Parameterized {
            raw,
            args,
            owner: None,
        }
    }

    #[must_use]
    pub fn variable(name: &'static str) -> Type {
        Type::Variable(Cow::Borrowed(name))
    }

    #[must_use]
    pub fn wildcard(upper: Vec<Type>, lower: Vec<Type>) -> Type {
        Type::Wildcard { upper, lower }
    }

    #[must_use]
    pub fn resolved(ty: Type, resolver: TypeResolver) -> Type {
        Type::Resolved {
            ty: Box::new(ty),
            resolver,
        }
    }

    #[must_use]
    pub fn is_array(&self) -> bool {
        match self {
            Type::Array(_) => true,
            Type::Resolved { ty, .. } => ty.is_array(),
            _ => false,
        }
    }

    /// The component type of an array, with variables resolved when the
    /// array sits behind a resolver.
    #[must_use]
    pub fn component_type(&self) -> Option<Type> {
        match self {
            Type::Array(component) => Some(Type::clone(component)),
            Type::Resolved { ty, resolver } => ty.component_type().map(|c| c.resolve(resolver)),
            _ => None,
        }
    }

    /// Reduces the descriptor to its runtime equivalent: a class, or an
    /// array of erasures.
    #[must_use]
    pub fn erasure(&self) -> Type {
        match self {
            Type::Class(class) => Type::Class(class.clone()),
            Type::Array(component) => Type::array(component.erasure()),
            Type::Parameterized { raw, .. } => Type::Class(raw.clone()),
            Type::Wildcard { upper, .. } => upper.first().map_or_else(Type::object, Type::erasure),
            Type::Variable(_) => Type::object(),
            Type::Resolved { ty, resolver } => ty.resolve(resolver).erasure(),
        }
    }

    /// The runtime class of this descriptor. Arrays have none.
    #[must_use]
    pub fn raw_class(&self) -> Option<Class> {
        match self.erasure() {
            Type::Class(class) => Some(class),
            _ => None,
        }
    }

    /// Whether the descriptor erases to the unconstrained type.
    #[must_use]
    pub fn is_object(&self) -> bool {
        self.raw_class().is_some_and(|c| c == Class::object())
    }

    /// Whether values of this type are simple values.
    #[must_use]
    pub fn is_simple(&self) -> bool {
        match self.erasure() {
            Type::Class(class) => class.is_simple(),
            Type::Array(component) => component.is_simple(),
            _ => false,
        }
    }

    /// Whether the type erases to a subclass of [`Class::map`].
    #[must_use]
    pub fn is_map_compatible(&self) -> bool {
        self.raw_class().is_some_and(|c| c.is_subclass_of(&Class::map()))
    }

    /// The generic arguments after resolution. Non-parameterized types
    /// have none.
    #[must_use]
    pub fn type_args(&self) -> Vec<Type> {
        match self {
            Type::Parameterized { args, .. } => args.clone(),
            Type::Resolved { ty, resolver } => ty.resolve(resolver).type_args(),
            _ => Vec::new(),
        }
    }

    /// The value type of a map type (its second argument), or the
    /// unconstrained type when unknown.
    #[must_use]
    pub fn map_value_type(&self) -> Type {
        self.type_args().into_iter().nth(1).unwrap_or_else(Type::object)
    }

    /// The element type of a collection type (its first argument), or the
    /// unconstrained type when unknown.
    #[must_use]
    pub fn element_type(&self) -> Type {
        self.component_type()
            .or_else(|| self.type_args().into_iter().next())
            .unwrap_or_else(Type::object)
    }

    /// Substitutes type variables bound by `resolver`. Unbound variables
    /// become the unconstrained type.
    #[must_use]
    pub fn resolve(&self, resolver: &TypeResolver) -> Type {
        match self {
            Type::Class(_) => self.clone(),
            Type::Array(component) => Type::array(component.resolve(resolver)),
            Type::Parameterized { raw, args, owner } => Type::Parameterized {
                raw: raw.clone(),
                args: args.iter().map(|a| a.resolve(resolver)).collect(),
                owner: owner.as_ref().map(|o| Box::new(o.resolve(resolver))),
            },
            Type::Wildcard { upper, lower } => Type::Wildcard {
                upper: upper.iter().map(|t| t.resolve(resolver)).collect(),
                lower: lower.iter().map(|t| t.resolve(resolver)).collect(),
            },
            Type::Variable(name) => resolver.get(name).cloned().unwrap_or_else(Type::object),
            Type::Resolved { ty, resolver: inner } => ty.resolve(inner).resolve(resolver),
        }
    }

    /// Canonical diagnostic form, e.g. `HashMap<String, Vec<i32>>` or
    /// `i32[]`. Not meant to be parsed back.
    #[must_use]
    pub fn describe(&self) -> String {
        let mut out = String::new();
        self.describe_to(&mut out);
        out
    }

    fn describe_to(&self, out: &mut String) {
        fn list(types: &[Type], separator: &str, out: &mut String) {
            for (i, ty) in types.iter().enumerate() {
                if i > 0 {
                    out.push_str(separator);
                }
                ty.describe_to(out);
            }
        }

        match self {
            Type::Class(class) => out.push_str(class.name()),
            Type::Array(component) => {
                component.describe_to(out);
                out.push_str("[]");
            }
            Type::Parameterized { raw, args, owner } => {
                if let Some(owner) = owner {
                    owner.describe_to(out);
                    out.push_str("::");
                }
                out.push_str(raw.name());
                if !args.is_empty() {
                    out.push('<');
                    list(args, ", ", out);
                    out.push('>');
                }
            }
            Type::Wildcard { upper, lower } => {
                out.push('?');
                if !lower.is_empty() {
                    out.push_str(" super ");
                    list(lower, " & ", out);
                } else if !upper.is_empty() && !upper.iter().all(Type::is_object) {
                    out.push_str(" extends ");
                    list(upper, " & ", out);
                }
            }
            Type::Variable(name) => out.push_str(name),
            Type::Resolved { ty, resolver } => ty.resolve(resolver).describe_to(out),
        }
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Type({})", self.describe())
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

impl From<Class> for Type {
    fn from(class: Class) -> Self {
        Type::Class(class)
    }
}

/// Bindings from type-variable names to descriptors.
///
/// A resolver is captured by zipping the declared parameters of a generic
/// class against one concrete parameterization of it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeResolver {
    bindings: Arc<Vec<(Cow<'static, str>, Type)>>,
}

impl TypeResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds the parameters of `ty`'s raw class to its arguments. Returns
    /// an empty resolver for non-parameterized types.
    #[must_use]
    pub fn from_type(ty: &Type) -> Self {
        match ty {
            Type::Parameterized { raw, args, .. } => Self {
                bindings: Arc::new(
                    raw.type_params()
                        .iter()
                        .zip(args)
                        .map(|(name, arg)| (Cow::Borrowed(*name), arg.clone()))
                        .collect(),
                ),
            },
            Type::Resolved { ty, resolver } => {
                Self::from_type(&ty.resolve(resolver)).with_parent(resolver)
            }
            _ => Self::default(),
        }
    }

    /// Adds the bindings of `parent` that `self` does not already define.
    #[must_use]
    pub fn with_parent(self, parent: &TypeResolver) -> Self {
        if parent.is_empty() {
            return self;
        }
        let mut bindings = Vec::clone(&self.bindings);
        for (name, ty) in parent.bindings.iter() {
            if self.get(name).is_none() {
                bindings.push((name.clone(), ty.clone()));
            }
        }
        Self {
            bindings: Arc::new(bindings),
        }
    }

    #[must_use]
    pub fn bind(mut self, name: &'static str, ty: Type) -> Self {
        let bindings = Arc::make_mut(&mut self.bindings);
        bindings.retain(|(n, _)| n != name);
        bindings.push((Cow::Borrowed(name), ty));
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Type> {
        self.bindings
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, ty)| ty)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair_class() -> Class {
        struct Pair;
        Class::builder::<Pair>().type_params(&["A", "B"]).build()
    }

    fn int() -> Type {
        Type::of::<i32>()
    }

    fn string() -> Type {
        Type::of::<String>()
    }

    #[test]
    fn test_describe() {
        let ty = Type::parameterized(pair_class(), vec![string(), Type::array(int())]);
        assert_eq!(ty.describe(), "Pair<String, i32[]>");
        assert_eq!(Type::wildcard(vec![Type::object()], vec![]).describe(), "?");
        assert_eq!(
            Type::wildcard(vec![], vec![int()]).describe(),
            "? super i32"
        );
        assert_eq!(
            Type::wildcard(vec![string()], vec![]).describe(),
            "? extends String"
        );
        assert_eq!(Type::variable("T").describe(), "T");
    }

    #[test]
    fn test_erasure() {
        let pair = pair_class();
        let ty = Type::parameterized(pair.clone(), vec![string(), int()]);
        assert_eq!(ty.erasure(), Type::Class(pair));
        assert_eq!(
            Type::array(Type::variable("T")).erasure(),
            Type::array(Type::object())
        );
        assert_eq!(Type::wildcard(vec![int()], vec![]).erasure(), int());
        assert_eq!(Type::wildcard(vec![], vec![int()]).erasure(), Type::object());
    }

    #[test]
    fn test_resolve() {
        let declared = Type::parameterized(pair_class(), vec![string(), int()]);
        let resolver = TypeResolver::from_type(&declared);
        assert_eq!(resolver.get("A"), Some(&string()));
        assert_eq!(resolver.get("B"), Some(&int()));

        let field = Type::array(Type::parameterized(
            pair_class(),
            vec![Type::variable("B"), Type::variable("C")],
        ));
        let resolved = field.resolve(&resolver);
        assert_eq!(resolved.describe(), "Pair<i32, Object>[]");

        let indirect = Type::resolved(Type::variable("A"), resolver);
        assert_eq!(indirect.erasure(), string());
        assert_eq!(indirect.describe(), "String");
    }

    #[test]
    fn test_resolver_parent() {
        let parent = TypeResolver::new().bind("T", int()).bind("U", string());
        let child = TypeResolver::new().bind("T", string()).with_parent(&parent);
        assert_eq!(child.get("T"), Some(&string()));
        assert_eq!(child.get("U"), Some(&string()));
        assert_eq!(child.get("V"), None);
    }
}
