//! End-to-end mapping tests: typed values to dictionaries and back.

use std::collections::HashMap;

use dictum::{
    Configurable, ConfigFactory, Dictionary, Error, Reflect, Result, Value,
    context::Context,
    settings::{DenormalizerSettings, NormalizerSettings},
};
use uuid::Uuid;

const TRANSACTION_ID: &str = "2733991b-4d3c-4a34-9f1a-6c0c8f0e3d21";

#[derive(Debug, PartialEq, Configurable)]
#[config(constructor = Transaction::fresh)]
struct Transaction {
    id: Uuid,
    #[config(optional)]
    items: Vec<String>,
    worth: f64,
}

impl Transaction {
    fn fresh() -> Self {
        Self {
            id: Uuid::nil(),
            items: vec!["pending".into()],
            worth: 1.5,
        }
    }
}

#[test]
fn test_ignored_defaults_and_optional_reads() {
    let factory = ConfigFactory::builder()
        .normalizer_settings(
            NormalizerSettings::IGNORE_DEFAULT_VALUES | NormalizerSettings::IGNORE_EMPTY_ARRAYS,
        )
        .build();
    let transaction = Transaction {
        id: Uuid::parse_str(TRANSACTION_ID).unwrap(),
        items: vec![],
        worth: 0.0,
    };

    let Some(Value::Dictionary(written)) = factory.normalize(&transaction).unwrap() else {
        panic!("expected a dictionary");
    };
    assert_eq!(written.len(), 1);
    assert_eq!(written.get("id"), Some(&Value::from(TRANSACTION_ID)));

    let read: Transaction = factory
        .denormalize(&Value::Dictionary(Dictionary::new()))
        .unwrap()
        .unwrap();
    assert_eq!(read.items, ["pending"]);
    assert_eq!(read.id, Uuid::nil());

    let mut existing = Transaction::fresh();
    existing.items.push("queued".into());
    factory
        .denormalize_to_instance(&written, &mut existing)
        .unwrap();
    assert_eq!(existing.id.to_string(), TRANSACTION_ID);
    assert_eq!(existing.items, ["pending", "queued"]);
}

#[derive(Debug, Default, Clone, PartialEq, Configurable)]
struct Upstream {
    #[config(validate = "not-blank")]
    host: String,
    #[config(validate = "range=1|65535")]
    port: u32,
    #[config(optional)]
    weight: Option<f32>,
}

#[derive(Debug, Default, Clone, PartialEq, Configurable)]
#[config(naming = "kebab-case")]
struct Proxy {
    listen_address: String,
    upstreams: Vec<Upstream>,
    #[config(optional)]
    headers: HashMap<String, String>,
    #[config(transient)]
    connections: u64,
}

fn proxy() -> Proxy {
    Proxy {
        listen_address: "0.0.0.0:8080".into(),
        upstreams: vec![
            Upstream {
                host: "alpha".into(),
                port: 9000,
                weight: Some(0.5),
            },
            Upstream {
                host: "beta".into(),
                port: 9001,
                weight: None,
            },
        ],
        headers: HashMap::from([("x-proxy".into(), "dictum".into())]),
        connections: 12,
    }
}

#[test]
fn test_nested_round_trip() {
    let factory = ConfigFactory::default();
    let original = proxy();

    let normalized = factory.normalize(&original).unwrap().unwrap();
    let Value::Dictionary(dictionary) = &normalized else {
        panic!("expected a dictionary");
    };
    assert_eq!(
        dictionary.keys().collect::<Vec<_>>(),
        ["listen-address", "upstreams", "headers"]
    );
    let upstreams = dictionary.get("upstreams").unwrap().as_array().unwrap();
    assert_eq!(upstreams.len(), 2);
    assert!(!upstreams[1].as_dictionary().unwrap().contains_key("weight"));

    let back: Proxy = factory.denormalize(&normalized).unwrap().unwrap();
    assert_eq!(
        back,
        Proxy {
            connections: 0,
            ..original
        }
    );
}

#[test]
fn test_errors_carry_field_paths() {
    let factory = ConfigFactory::default();
    let Some(Value::Dictionary(mut dictionary)) = factory.normalize(&proxy()).unwrap() else {
        panic!("expected a dictionary");
    };

    let mut upstreams = dictionary.get("upstreams").unwrap().as_array().unwrap().to_vec();
    let Value::Dictionary(mut second) = upstreams[1].clone() else {
        panic!("expected a dictionary");
    };
    second.put("port", 70000_u32).unwrap();
    upstreams[1] = Value::Dictionary(second.clone());
    dictionary.put("upstreams", upstreams.clone()).unwrap();

    let err = factory
        .denormalize::<Proxy>(&Value::Dictionary(dictionary.clone()))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "field 'upstreams[1].port' must be between 1 and 65535"
    );

    second.put("port", "ninety").unwrap();
    upstreams[1] = Value::Dictionary(second);
    dictionary.put("upstreams", upstreams).unwrap();
    let err = factory
        .denormalize::<Proxy>(&Value::Dictionary(dictionary))
        .unwrap_err();
    assert!(matches!(err.root(), Error::Parse { .. }));
    assert_eq!(err.path().unwrap().to_string(), "upstreams[1].port");
}

#[test]
fn test_strict_number_parsing() {
    let lenient = ConfigFactory::default();
    let strict = ConfigFactory::builder()
        .denormalizer_settings(DenormalizerSettings::STRICT_NUMBER_PARSING)
        .build();
    let dictionary = Dictionary::from_entries([
        ("host", Value::from("alpha")),
        ("port", Value::from(8080.75_f64)),
    ])
    .unwrap();

    let upstream: Upstream = lenient
        .denormalize(&Value::Dictionary(dictionary.clone()))
        .unwrap()
        .unwrap();
    assert_eq!(upstream.port, 8080);

    let err = strict
        .denormalize::<Upstream>(&Value::Dictionary(dictionary))
        .unwrap_err();
    assert_eq!(err.path().unwrap().to_string(), "port");
}

#[derive(Debug, PartialEq, Configurable)]
#[config(constructor = Listener::standard)]
struct Listener {
    port: u16,
    secure: bool,
    #[config(optional)]
    banner: Option<String>,
}

impl Listener {
    fn standard() -> Self {
        Self {
            port: 80,
            secure: true,
            banner: Some("hello".into()),
        }
    }
}

#[test]
fn test_misshapen_settings_keep_current_values() {
    let factory = ConfigFactory::default();
    let dictionary = Dictionary::from_entries([
        ("port", Value::Dictionary(Dictionary::new())),
        ("secure", Value::array([true])),
        ("banner", Value::Dictionary(Dictionary::new())),
    ])
    .unwrap();

    let listener: Listener = factory
        .denormalize(&Value::Dictionary(dictionary))
        .unwrap()
        .unwrap();
    assert_eq!(listener, Listener::standard());
}

#[derive(Debug, Default, Configurable)]
struct Quota {
    limits: Dictionary,
    #[config(optional)]
    extras: Dictionary,
}

fn written_dictionary(value: Option<Value>) -> Dictionary {
    match value {
        Some(Value::Dictionary(dictionary)) => dictionary,
        other => panic!("expected a dictionary, got {other:?}"),
    }
}

#[test]
fn test_deep_clone_detaches_written_dictionaries() {
    let quota = Quota {
        limits: Dictionary::from_entries([("burst", 10_i32)]).unwrap(),
        extras: Dictionary::new(),
    };

    let shared = written_dictionary(ConfigFactory::default().normalize(&quota).unwrap());
    let Some(Value::Dictionary(limits)) = shared.get("limits") else {
        panic!("limits missing");
    };
    assert!(limits.ptr_eq(&quota.limits));

    let factory = ConfigFactory::builder()
        .normalizer_settings(NormalizerSettings::DEEP_CLONE)
        .build();
    let detached = written_dictionary(factory.normalize(&quota).unwrap());
    let Some(Value::Dictionary(limits)) = detached.get("limits") else {
        panic!("limits missing");
    };
    assert!(!limits.ptr_eq(&quota.limits));
    assert_eq!(limits, &quota.limits);
}

#[test]
fn test_deep_clone_detaches_read_dictionaries() {
    let nested = Dictionary::from_entries([("depth", 3_i32)]).unwrap();
    let limits = Dictionary::from_entries([("nested", Value::Dictionary(nested.clone()))]).unwrap();
    let input = Value::Dictionary(Dictionary::from_entries([("limits", limits)]).unwrap());

    let read: Quota = ConfigFactory::default().denormalize(&input).unwrap().unwrap();
    let Some(Value::Dictionary(inner)) = read.limits.get("nested") else {
        panic!("nested missing");
    };
    assert!(inner.ptr_eq(&nested));

    let factory = ConfigFactory::builder()
        .denormalizer_settings(DenormalizerSettings::DEEP_CLONE)
        .build();
    let read: Quota = factory.denormalize(&input).unwrap().unwrap();
    let Some(Value::Dictionary(inner)) = read.limits.get("nested") else {
        panic!("nested missing");
    };
    assert!(!inner.ptr_eq(&nested));
    assert_eq!(inner, &nested);
}

#[test]
fn test_empty_dictionaries_can_be_ignored() {
    let quota = Quota {
        limits: Dictionary::from_entries([("burst", 10_i32)]).unwrap(),
        extras: Dictionary::new(),
    };

    let written = written_dictionary(ConfigFactory::default().normalize(&quota).unwrap());
    assert_eq!(written.get("extras"), Some(&Value::Dictionary(Dictionary::new())));

    let factory = ConfigFactory::builder()
        .normalizer_settings(NormalizerSettings::IGNORE_EMPTY_DICTIONARIES)
        .build();
    let written = written_dictionary(factory.normalize(&quota).unwrap());
    assert!(!written.contains_key("extras"));
    assert!(written.contains_key("limits"));
}

#[derive(Debug, Default, Configurable)]
struct Plugin {
    #[config(alias = "title")]
    name: String,
    #[config(fallback)]
    options: HashMap<String, Value>,
}

#[derive(Debug, Default, Configurable)]
struct StrictPlugin {
    #[config(alias = "title")]
    name: String,
    #[config(fallback(distinct = "property"))]
    options: HashMap<String, Value>,
}

fn plugin_settings() -> Dictionary {
    Dictionary::from_entries([
        ("name", Value::from("cache")),
        ("title", Value::from("Cache")),
        ("ttl", Value::from(60_u32)),
        ("tiers", Value::array(["memory", "disk"])),
        (
            "backend",
            Value::Dictionary(Dictionary::from_entries([("kind", "redis")]).unwrap()),
        ),
    ])
    .unwrap()
}

#[test]
fn test_fallback_captures_unclaimed_keys() {
    let factory = ConfigFactory::default();

    let plugin: Plugin = factory
        .denormalize(&Value::Dictionary(plugin_settings()))
        .unwrap()
        .unwrap();
    assert_eq!(plugin.name, "cache");
    let mut keys: Vec<&str> = plugin.options.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, ["backend", "tiers", "title", "ttl"]);
    assert_eq!(plugin.options["tiers"], Value::array(["memory", "disk"]));
    assert_eq!(plugin.options["title"], Value::from("Cache"));

    let strict: StrictPlugin = factory
        .denormalize(&Value::Dictionary(plugin_settings()))
        .unwrap()
        .unwrap();
    let mut keys: Vec<&str> = strict.options.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, ["backend", "tiers", "ttl"]);

    let Some(Value::Dictionary(written)) = factory.normalize(&plugin).unwrap() else {
        panic!("expected a dictionary");
    };
    assert_eq!(written.get("name"), Some(&Value::from("cache")));
    assert_eq!(written.get("ttl"), Some(&Value::from(60_u32)));
    assert!(!written.contains_key("options"));
}

#[derive(Debug, Default, Configurable)]
struct Credentials {
    #[config(validate = "not-null", silent)]
    token: Option<String>,
}

#[derive(Debug, Default, Configurable)]
struct StrictCredentials {
    #[config(validate = "not-null")]
    token: Option<String>,
}

#[test]
fn test_silent_validation_skips() {
    let factory = ConfigFactory::default();
    let empty = Value::Dictionary(Dictionary::new());

    let credentials: Credentials = factory.denormalize(&empty).unwrap().unwrap();
    assert_eq!(credentials.token, None);

    let err = factory.denormalize::<StrictCredentials>(&empty).unwrap_err();
    assert!(matches!(err, Error::Validation { .. }));
    assert_eq!(err.to_string(), "field 'token' must be not-null");

    let disabled = ConfigFactory::builder()
        .denormalizer_settings(DenormalizerSettings::DISABLE_VALIDATION)
        .build();
    assert!(disabled.denormalize::<StrictCredentials>(&empty).is_ok());
}

#[derive(Debug, Default, Configurable)]
#[config(post_construct = Counter::fail, post_construct = Counter::finish)]
struct Counter {
    start: i64,
    finished: bool,
}

impl Counter {
    fn fail(&mut self, _: &Context<'_>) -> Result<()> {
        Err(Error::custom("counter hook failed"))
    }

    fn finish(&mut self) {
        self.finished = true;
    }
}

#[test]
fn test_hook_failures_are_logged_not_raised() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::WARN)
        .try_init();

    let factory = ConfigFactory::default();
    let counter: Counter = factory
        .denormalize(&Value::Dictionary(
            Dictionary::from_entries([("start", 4_i64)]).unwrap(),
        ))
        .unwrap()
        .unwrap();
    assert_eq!(counter.start, 4);
    assert!(counter.finished);
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Reflect)]
enum Level {
    #[default]
    Info,
    Debug,
}

#[derive(Debug, Default, Configurable)]
struct Logging {
    level: Level,
    targets: Vec<Vec<u8>>,
}

#[test]
fn test_enums_and_nested_arrays() {
    let factory = ConfigFactory::default();
    let dictionary = Dictionary::from_entries([
        ("level", Value::from("DEBUG")),
        (
            "targets",
            Value::array([Value::array([1_u8, 2]), Value::array([3_u8])]),
        ),
    ])
    .unwrap();

    let logging: Logging = factory
        .denormalize(&Value::Dictionary(dictionary))
        .unwrap()
        .unwrap();
    assert_eq!(logging.level, Level::Debug);
    assert_eq!(logging.targets, [vec![1, 2], vec![3]]);

    let Some(Value::Dictionary(written)) = factory.normalize(&logging).unwrap() else {
        panic!("expected a dictionary");
    };
    assert_eq!(written.get("level"), Some(&Value::from("debug")));
}
