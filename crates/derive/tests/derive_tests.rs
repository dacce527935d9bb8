//! Tests for the `Configurable` and `Reflect` derive macros.

use std::collections::HashMap;

use dictum::{
    Configurable, ConfigFactory, Dictionary, Reflect, Result, Type, Typed, Value,
    context::Context,
    schema::{Distinct, NamingPolicy},
};

/// Connection pool settings.
#[derive(Debug, Default, PartialEq, Configurable)]
#[config(naming = "kebab-case")]
struct Pool {
    /// Upper bound of open connections
    /// Zero disables pooling
    #[config(validate = "range=0|1024")]
    max_size: u32,
    #[config(name = "idle", alias = "idle-timeout", describe = "Seconds before an idle connection closes")]
    idle_seconds: Option<u64>,
    #[config(optional)]
    mode: Mode,
    #[config(transient)]
    opened: u32,
    #[config(exclude)]
    scratch: Vec<u8>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Reflect)]
enum Mode {
    #[default]
    Lazy,
    #[config(name = "Warm")]
    Eager,
}

#[test]
fn test_declared_schema() {
    let factory = ConfigFactory::default();
    let schema = factory.schema(&Pool::class()).unwrap();

    let names: Vec<&str> = schema.properties().iter().map(|p| p.name()).collect();
    assert_eq!(names, ["max-size", "idle", "mode", "opened"]);

    let max_size = schema.property("max-size").unwrap();
    assert_eq!(max_size.field(), "max_size");
    assert_eq!(
        max_size.description(),
        ["Upper bound of open connections", "Zero disables pooling"]
    );

    let idle = schema.property("idle").unwrap();
    assert_eq!(idle.aliases(), ["idle-timeout"]);
    assert_eq!(idle.description(), ["Seconds before an idle connection closes"]);
    assert!(idle.accessor().is_nullable());

    assert!(schema.property("mode").unwrap().is_optional());
    assert!(schema.property("opened").unwrap().is_transient());
}

#[test]
fn test_round_trip() {
    let factory = ConfigFactory::default();
    let pool = Pool {
        max_size: 16,
        idle_seconds: Some(30),
        mode: Mode::Eager,
        opened: 3,
        scratch: vec![1, 2],
    };

    let Some(Value::Dictionary(dictionary)) = factory.normalize(&pool).unwrap() else {
        panic!("expected a dictionary");
    };
    assert_eq!(dictionary.keys().collect::<Vec<_>>(), ["max-size", "idle", "mode"]);
    assert_eq!(dictionary.get("mode"), Some(&Value::from("warm")));

    let back: Pool = factory
        .denormalize(&Value::Dictionary(dictionary))
        .unwrap()
        .unwrap();
    assert_eq!(
        back,
        Pool {
            opened: 0,
            scratch: vec![],
            ..pool
        }
    );
}

#[test]
fn test_enum_names_ignore_case() {
    let factory = ConfigFactory::default();
    assert_eq!(factory.denormalize::<Mode>(&Value::from("LAZY")).unwrap(), Some(Mode::Lazy));
    assert_eq!(factory.denormalize::<Mode>(&Value::from("warm")).unwrap(), Some(Mode::Eager));

    let err = factory.denormalize::<Mode>(&Value::from("Eager")).unwrap_err();
    assert_eq!(err.to_string(), "cannot parse \"Eager\" as Mode");
    assert_eq!(Mode::class().variants(), ["Lazy", "Warm"]);
}

#[derive(Debug, Default, PartialEq, Configurable)]
struct Labelled<T> {
    label: String,
    value: T,
    history: Vec<T>,
    previous: Option<T>,
}

#[test]
fn test_generic_fields_resolve_per_instantiation() {
    let factory = ConfigFactory::default();
    let schema = factory.schema(&Labelled::<u8>::class()).unwrap();
    assert_eq!(schema.property("value").unwrap().ty(), &Type::variable("T"));
    assert_eq!(
        Labelled::<u8>::type_descriptor(),
        Type::parameterized(Labelled::<u8>::class(), vec![u8::type_descriptor()])
    );

    let dictionary = Dictionary::from_entries([
        ("label", Value::from("retries")),
        ("value", Value::from("3")),
        ("history", Value::array([1_u64, 2])),
        ("previous", Value::from(2_u64)),
    ])
    .unwrap();
    let labelled: Labelled<u8> = factory
        .denormalize(&Value::Dictionary(dictionary))
        .unwrap()
        .unwrap();
    assert_eq!(
        labelled,
        Labelled {
            label: "retries".into(),
            value: 3,
            history: vec![1, 2],
            previous: Some(2),
        }
    );

    let text: Labelled<String> = factory
        .denormalize(&Value::Dictionary(
            Dictionary::from_entries([("value", "three")]).unwrap(),
        ))
        .unwrap()
        .unwrap();
    assert_eq!(text.value, "three");
    assert!(Labelled::<u8>::class() != Labelled::<String>::class());
}

#[derive(Debug, Default, Configurable)]
#[config(constructor = Registry::seeded, post_construct = Registry::count)]
struct Registry {
    name: String,
    #[config(fallback(distinct = "property"))]
    entries: HashMap<String, i32>,
    #[config(constant)]
    version: u32,
    #[config(exclude)]
    total: i32,
}

impl Registry {
    fn seeded() -> Self {
        Self {
            version: 2,
            ..Self::default()
        }
    }

    fn count(&mut self) {
        self.total = self.entries.values().sum();
    }
}

#[test]
fn test_constructor_hooks_and_fallback() {
    let factory = ConfigFactory::default();
    let schema = factory.schema(&Registry::class()).unwrap();
    let fallback = schema.fallback().unwrap();
    assert_eq!(fallback.name(), "entries");
    assert_eq!(fallback.distinct(), Distinct::Property);

    let dictionary = Dictionary::from_entries([
        ("name", Value::from("scores")),
        ("version", Value::from(9_u64)),
        ("alice", Value::from(4_u64)),
        ("bob", Value::from(5_u64)),
    ])
    .unwrap();
    let registry: Registry = factory
        .denormalize(&Value::Dictionary(dictionary))
        .unwrap()
        .unwrap();

    assert_eq!(registry.name, "scores");
    assert_eq!(registry.version, 2);
    assert_eq!(registry.entries.len(), 2);
    assert_eq!(registry.total, 9);

    let Some(Value::Dictionary(written)) = factory.normalize(&registry).unwrap() else {
        panic!("expected a dictionary");
    };
    assert_eq!(written.get("version"), Some(&Value::from(2_u32)));
    assert_eq!(written.get("alice"), Some(&Value::from(4_i32)));
}

fn shout(owner: &Greeting, _: &Context<'_>) -> Result<Value> {
    Ok(Value::from(owner.text.to_uppercase()))
}

fn trimmed(value: Option<String>, _: &Context<'_>) -> Result<Option<String>> {
    Ok(value.map(|v| v.trim().to_string()))
}

#[derive(Debug, Default, Configurable)]
#[config(naming = "PascalCase")]
struct Greeting {
    #[config(normalize_with = shout, denormalize_with = trimmed, denormalize_strategy = "after")]
    text: String,
}

#[test]
fn test_processors() {
    let factory = ConfigFactory::default();
    let greeting = Greeting { text: "hello".into() };
    let Some(Value::Dictionary(written)) = factory.normalize(&greeting).unwrap() else {
        panic!("expected a dictionary");
    };
    assert_eq!(written.get("Text"), Some(&Value::from("HELLO")));

    let read: Greeting = factory
        .denormalize(&Value::Dictionary(
            Dictionary::from_entries([("Text", "  hi  ")]).unwrap(),
        ))
        .unwrap()
        .unwrap();
    assert_eq!(read.text, "hi");
}

#[test]
fn test_container_naming_overrides_factory() {
    let factory = ConfigFactory::builder().naming(NamingPolicy::SnakeCase).build();
    let schema = factory.schema(&Greeting::class()).unwrap();
    assert!(schema.property("Text").is_some());

    let schema = factory.schema(&Pool::class()).unwrap();
    assert!(schema.property("max-size").is_some());
}

fn sorted(owner: &Roster, _: &Context<'_>) -> Result<Vec<String>> {
    let mut members = owner.members.clone();
    members.sort();
    Ok(members)
}

#[derive(Debug, Default, Configurable)]
struct Roster {
    #[config(normalize_with = sorted, normalize_strategy = "before")]
    members: Vec<String>,
}

#[test]
fn test_before_processor_substitutes_the_value() {
    let factory = ConfigFactory::default();
    let roster = Roster {
        members: vec!["carol".into(), "alice".into(), "bob".into()],
    };
    let Some(Value::Dictionary(written)) = factory.normalize(&roster).unwrap() else {
        panic!("expected a dictionary");
    };
    assert_eq!(
        written.get("members"),
        Some(&Value::from(vec!["alice", "bob", "carol"]))
    );
    assert_eq!(roster.members[0], "carol");
}
