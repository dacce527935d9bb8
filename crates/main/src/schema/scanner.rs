use alloc::{string::String, sync::Arc, vec::Vec};
use std::collections::HashSet;

use super::{ClassSchema, Member, NamingPolicy, Property};
use crate::{
    Error, Result,
    types::Class,
    validate::{DisabledValidator, ValidationRegistry, Validator},
};

/// Builds [`ClassSchema`]s from member declarations.
#[derive(Debug, Clone, Copy)]
pub struct SchemaScanner<'a> {
    naming: &'a NamingPolicy,
    registry: &'a ValidationRegistry,
}

impl<'a> SchemaScanner<'a> {
    #[must_use]
    pub fn new(naming: &'a NamingPolicy, registry: &'a ValidationRegistry) -> Self {
        Self { naming, registry }
    }

    /// Scans the declaration of `class`.
    ///
    /// Fails if the class has no declaration, if the naming policy maps two
    /// fields to the same name, or if a property is malformed.
    pub fn scan(&self, class: &Class) -> Result<ClassSchema> {
        let Some(declaration) = class.declaration() else {
            return Err(Error::schema(class.name(), "type has no member declaration"));
        };
        let naming = declaration.naming.as_ref().unwrap_or(self.naming);
        let members: Vec<&Member> = declaration.members.iter().filter(|m| !m.excluded).collect();

        let mut defaults = Vec::with_capacity(members.len());
        let mut claimed = HashSet::new();
        for member in &members {
            let name = naming.apply(member.ident);
            if name.trim().is_empty() {
                return Err(Error::schema(
                    class.name(),
                    format!("naming policy maps field '{}' to a blank name", member.ident),
                ));
            }
            if !claimed.insert(name.clone()) {
                return Err(Error::schema(
                    class.name(),
                    format!("naming policy maps more than one field to '{name}'"),
                ));
            }
            defaults.push(name);
        }

        let mut properties = Vec::with_capacity(members.len());
        let mut fallback = None;
        for (member, default) in members.into_iter().zip(defaults) {
            let property = self.resolve(class, member, default, &mut claimed)?;
            if property.is_fallback() {
                if fallback.is_some() {
                    return Err(Error::schema(
                        class.name(),
                        format!("field '{}' is a second fallback property", member.ident),
                    ));
                }
                if !property.ty.is_map_compatible() {
                    return Err(Error::schema(
                        class.name(),
                        format!(
                            "fallback field '{}' must be a map, found {}",
                            member.ident, property.ty
                        ),
                    ));
                }
                fallback = Some(Arc::new(property));
            } else {
                properties.push(Arc::new(property));
            }
        }
        properties.extend(fallback);

        tracing::debug!(class = class.name(), properties = properties.len(), "scanned schema");
        Ok(ClassSchema::new(
            class.clone(),
            properties,
            declaration.post_construct.clone(),
        ))
    }

    fn resolve(
        &self,
        class: &Class,
        member: &Member,
        default: String,
        claimed: &mut HashSet<String>,
    ) -> Result<Property> {
        let usable = |name: &str, claimed: &HashSet<String>| !name.is_empty() && !claimed.contains(name);

        let declared: Vec<&str> = member.names.iter().map(|n| n.trim()).collect();
        let primary_at = declared
            .iter()
            .position(|&n| n == default || usable(n, claimed));
        let name = match primary_at {
            Some(i) => {
                let name = String::from(declared[i]);
                if name != default {
                    claimed.remove(&default);
                    claimed.insert(name.clone());
                }
                name
            }
            None => default,
        };

        let mut aliases = Vec::new();
        let remaining = declared
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != primary_at)
            .map(|(_, &n)| n)
            .chain(member.aliases.iter().map(|a| a.trim()));
        for alias in remaining {
            if usable(alias, claimed) {
                claimed.insert(alias.into());
                aliases.push(String::from(alias));
            }
        }

        let validator: Arc<dyn Validator> = match &member.validation {
            Some(expression) => Arc::new(
                self.registry
                    .parse(expression, member.silent)
                    .map_err(|e| Error::schema(class.name(), format!("field '{}': {e}", member.ident)))?,
            ),
            None => Arc::new(DisabledValidator),
        };

        let dictionary_schema = member
            .dictionary_schema
            .map(|build| build().map(Arc::new))
            .transpose()
            .map_err(|e| Error::schema(class.name(), format!("field '{}': {e}", member.ident)))?;

        Ok(Property {
            name,
            aliases,
            field: member.ident,
            ty: member.ty.clone(),
            modifiers: member.modifiers,
            distinct: member.distinct,
            description: member.description.clone(),
            validator,
            normalizer: member.normalizer.clone(),
            denormalizer: member.denormalizer.clone(),
            accessor: member.accessor.clone(),
            dictionary_schema,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::{
        reflect::FromReflect,
        schema::{Configurable, Declaration, Distinct},
        types::{Class, NonGenericClassCell, Typed},
    };

    #[derive(Default)]
    struct Container {
        upper: Vec<i32>,
        lower: Vec<i32>,
        backup: Vec<i32>,
        cold: Vec<i32>,
    }

    impl Typed for Container {
        fn class() -> Class {
            static CELL: NonGenericClassCell = NonGenericClassCell::new();
            CELL.get_or_init(|| {
                Class::builder::<Container>()
                    .declaration(<Container as Configurable>::declaration)
                    .build()
            })
        }
    }

    impl crate::reflect::Reflect for Container {
        crate::impl_reflect_boilerplate! {}
    }

    impl FromReflect for Container {}

    impl Configurable for Container {
        fn declaration() -> Declaration {
            Declaration::new()
                .member(
                    Member::field("upperStorage", |c: &Container| &c.upper, |c| &mut c.upper)
                        .alias("")
                        .alias("up")
                        .alias(" up ")
                        .alias("upper"),
                )
                .member(
                    Member::field("lowerStorage", |c: &Container| &c.lower, |c| &mut c.lower)
                        .alias("lo")
                        .alias("up")
                        .alias("lower"),
                )
                .member(
                    Member::field("backupStorage", |c: &Container| &c.backup, |c| &mut c.backup)
                        .name("  lowerStorage")
                        .name("  backup ")
                        .name("cold")
                        .alias(" ")
                        .alias("lo")
                        .alias("  backup"),
                )
                .member(
                    Member::field("coldStorage", |c: &Container| &c.cold, |c| &mut c.cold)
                        .name("cold"),
                )
        }

        fn construct() -> Self {
            Self::default()
        }
    }

    fn owners(schema: &ClassSchema) -> HashMap<&str, &str> {
        schema
            .property_names()
            .filter_map(|n| schema.property(n).map(|p| (n, p.field())))
            .collect()
    }

    #[test]
    fn test_default_policy_resolution() {
        let registry = ValidationRegistry::default();
        let naming = NamingPolicy::Default;
        let schema = SchemaScanner::new(&naming, &registry)
            .scan(&Container::class())
            .unwrap();
        let expected = HashMap::from([
            ("upperStorage", "upperStorage"),
            ("up", "upperStorage"),
            ("upper", "upperStorage"),
            ("lowerStorage", "lowerStorage"),
            ("lo", "lowerStorage"),
            ("lower", "lowerStorage"),
            ("backup", "backupStorage"),
            ("cold", "backupStorage"),
            ("coldStorage", "coldStorage"),
        ]);
        assert_eq!(owners(&schema), expected);
        assert_eq!(schema.properties()[2].name(), "backup");
        assert_eq!(schema.properties()[2].aliases(), ["cold"]);
    }

    #[test]
    fn test_custom_policy_resolution() {
        let registry = ValidationRegistry::default();
        let naming = NamingPolicy::custom(|s| s.chars().take(2).collect());
        let schema = SchemaScanner::new(&naming, &registry)
            .scan(&Container::class())
            .unwrap();
        let expected = HashMap::from([
            ("up", "upperStorage"),
            ("upper", "upperStorage"),
            ("lo", "lowerStorage"),
            ("lower", "lowerStorage"),
            ("lowerStorage", "backupStorage"),
            ("backup", "backupStorage"),
            ("cold", "backupStorage"),
            ("co", "coldStorage"),
        ]);
        assert_eq!(owners(&schema), expected);
    }

    #[test]
    fn test_conflicting_policy() {
        let registry = ValidationRegistry::default();
        let naming = NamingPolicy::custom(|s| s.len().to_string());
        let err = SchemaScanner::new(&naming, &registry)
            .scan(&Container::class())
            .unwrap_err();
        assert!(matches!(err, Error::Schema { .. }));
    }

    #[test]
    fn test_not_configurable() {
        let registry = ValidationRegistry::default();
        let naming = NamingPolicy::Default;
        let err = SchemaScanner::new(&naming, &registry)
            .scan(&i32::class())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid schema for 'i32': type has no member declaration"
        );
    }

    #[derive(Default)]
    struct Extras {
        name: String,
        rest: HashMap<String, String>,
        other: HashMap<String, String>,
    }

    impl Typed for Extras {
        fn class() -> Class {
            static CELL: NonGenericClassCell = NonGenericClassCell::new();
            CELL.get_or_init(|| Class::builder::<Extras>().build())
        }
    }

    impl crate::reflect::Reflect for Extras {
        crate::impl_reflect_boilerplate! {}
    }

    fn extras(second_fallback: bool, validation: &str) -> Declaration {
        let mut declaration = Declaration::new()
            .member(
                Member::field("rest", |e: &Extras| &e.rest, |e| &mut e.rest)
                    .fallback(Distinct::Property),
            )
            .member(
                Member::field("name", |e: &Extras| &e.name, |e| &mut e.name).validate(validation),
            );
        if second_fallback {
            declaration = declaration.member(
                Member::field("other", |e: &Extras| &e.other, |e| &mut e.other)
                    .fallback(Distinct::Name),
            );
        }
        declaration
    }

    fn scan_declaration(declaration: fn() -> Declaration) -> Result<ClassSchema> {
        let registry = ValidationRegistry::default();
        let naming = NamingPolicy::Default;
        let class = Class::named("Extras", crate::types::ClassKind::Concrete)
            .declaration(declaration)
            .build();
        SchemaScanner::new(&naming, &registry).scan(&class)
    }

    #[test]
    fn test_fallback_is_last() {
        let schema = scan_declaration(|| extras(false, "not-blank")).unwrap();
        let names: Vec<&str> = schema.properties().iter().map(|p| p.name()).collect();
        assert_eq!(names, ["name", "rest"]);
        assert_eq!(schema.fallback().map(|p| p.field()), Some("rest"));
        assert_eq!(schema.fallback().map(|p| p.distinct()), Some(Distinct::Property));
    }

    #[test]
    fn test_second_fallback_rejected() {
        let err = scan_declaration(|| extras(true, "")).unwrap_err();
        assert!(err.to_string().contains("second fallback"));
    }

    #[test]
    fn test_bad_validation_rejected() {
        let err = scan_declaration(|| extras(false, "positive")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid schema for 'Extras': field 'name': invalid validation expression: \
             validation type 'positive' not found"
        );
    }
}
