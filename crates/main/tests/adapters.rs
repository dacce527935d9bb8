//! Custom adapters and their resolution through the class hierarchy.

use std::sync::OnceLock;

use dictum::{
    Class, Configurable, ConfigFactory, Dictionary, Error, FromReflect, Reflect, Result, Type, Typed, Value,
    adapter::{AdapterRole, TypeAdapter},
    context::Context,
    types::{ClassKind, NonGenericClassCell},
};

fn measure() -> Class {
    static CELL: OnceLock<Class> = OnceLock::new();
    CELL.get_or_init(|| Class::named("Measure", ClassKind::Interface).build())
        .clone()
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct Meters(f64);

#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct Feet(f64);

macro_rules! measure_type {
    ($ty:ident) => {
        impl Typed for $ty {
            fn class() -> Class {
                static CELL: NonGenericClassCell = NonGenericClassCell::new();
                CELL.get_or_init(|| Class::builder::<$ty>().implements(measure()).build())
            }
        }

        impl Reflect for $ty {
            dictum::impl_reflect_boilerplate! {}
        }

        impl FromReflect for $ty {}
    };
}

measure_type!(Meters);
measure_type!(Feet);

/// Writes any measure as a suffixed string.
struct MeasureAdapter;

impl TypeAdapter for MeasureAdapter {
    fn simplify(&self, _: &mut Context<'_>, _: &Type, value: &dyn Reflect) -> Result<Option<Value>> {
        if let Some(Meters(m)) = value.downcast_ref::<Meters>() {
            return Ok(Some(Value::from(format!("{m}m"))));
        }
        if let Some(Feet(ft)) = value.downcast_ref::<Feet>() {
            return Ok(Some(Value::from(format!("{ft}ft"))));
        }
        Ok(None)
    }

    fn complexify(&self, _: &mut Context<'_>, value: &Value, target: &Type) -> Result<Option<Box<dyn Reflect>>> {
        let text = value
            .as_str()
            .ok_or_else(|| Error::type_mismatch("measure", value.type_name()))?;
        let parse = |digits: &str| {
            digits
                .trim()
                .parse::<f64>()
                .map_err(|_| Error::parse(text, target.to_string()))
        };
        if let Some(digits) = text.strip_suffix("ft") {
            return Ok(Some(Box::new(Feet(parse(digits)?))));
        }
        if let Some(digits) = text.strip_suffix('m') {
            return Ok(Some(Box::new(Meters(parse(digits)?))));
        }
        Err(Error::parse(text, target.to_string()))
    }
}

/// Writes feet as a bare number.
struct FeetAdapter;

impl TypeAdapter for FeetAdapter {
    fn simplify(&self, _: &mut Context<'_>, _: &Type, value: &dyn Reflect) -> Result<Option<Value>> {
        Ok(value.downcast_ref::<Feet>().map(|Feet(ft)| Value::from(*ft)))
    }

    fn complexify(&self, _: &mut Context<'_>, value: &Value, _: &Type) -> Result<Option<Box<dyn Reflect>>> {
        Ok(value
            .as_number()
            .map(|n| Box::new(Feet(n.into_f64())) as Box<dyn Reflect>))
    }
}

#[derive(Debug, Default, PartialEq, Configurable)]
struct Route {
    length: Meters,
    clearance: Feet,
}

fn factories(configure: impl Fn(dictum::ConfigFactoryBuilder) -> dictum::ConfigFactoryBuilder) -> Vec<ConfigFactory> {
    [(false, false), (false, true), (true, false), (true, true)]
        .into_iter()
        .map(|(indexed, cacheable)| {
            configure(ConfigFactory::builder().indexed(indexed).cacheable(cacheable)).build()
        })
        .collect()
}

#[test]
fn test_exact_adapter_wins_over_interface() {
    let route = Route {
        length: Meters(120.5),
        clearance: Feet(14.0),
    };
    for factory in factories(|builder| {
        builder
            .adapter(measure(), MeasureAdapter)
            .adapter_for::<Feet>(FeetAdapter)
    }) {
        let Some(Value::Dictionary(written)) = factory.normalize(&route).unwrap() else {
            panic!("expected a dictionary");
        };
        assert_eq!(written.get("length"), Some(&Value::from("120.5m")));
        assert_eq!(written.get("clearance"), Some(&Value::from(14.0_f64)));

        let back: Route = factory
            .denormalize(&Value::Dictionary(written))
            .unwrap()
            .unwrap();
        assert_eq!(back, route);
    }
}

#[test]
fn test_interface_adapter_is_inherited() {
    for factory in factories(|builder| builder.adapter(measure(), MeasureAdapter)) {
        assert!(factory.adapter(&Meters::class()).is_some());
        let Some(written) = factory.normalize(&Feet(3.0)).unwrap() else {
            panic!("expected a value");
        };
        assert_eq!(written, Value::from("3ft"));
    }
}

#[test]
fn test_super_adapters_can_be_disabled() {
    let factory = ConfigFactory::builder()
        .adapter(measure(), MeasureAdapter)
        .call_super_adapter(false)
        .build();
    assert!(factory.adapter(&Meters::class()).is_none());
    assert!(factory.adapter(&measure()).is_some());

    let err = factory.normalize(&Meters(1.0)).unwrap_err();
    assert_eq!(err.to_string(), "illegal type: no adapter can normalize Meters");

    let err = factory.denormalize::<Meters>(&Value::from("1m")).unwrap_err();
    assert!(matches!(err, Error::IllegalType(_)));
}

/// Rounds floats down when reading, leaving writing to the defaults.
struct Floor;

impl TypeAdapter for Floor {
    fn complexify(&self, _: &mut Context<'_>, value: &Value, _: &Type) -> Result<Option<Box<dyn Reflect>>> {
        Ok(value
            .as_number()
            .map(|n| Box::new(n.into_f64().floor()) as Box<dyn Reflect>))
    }

    fn role(&self) -> AdapterRole {
        AdapterRole::Annotator
    }
}

#[derive(Debug, Default, Configurable)]
struct Reading {
    celsius: f64,
}

#[test]
fn test_annotators_only_read() {
    let factory = ConfigFactory::builder().adapter_for::<f64>(Floor).build();
    let reading: Reading = factory
        .denormalize(&Value::Dictionary(
            Dictionary::from_entries([("celsius", 21.7_f64)]).unwrap(),
        ))
        .unwrap()
        .unwrap();
    assert_eq!(reading.celsius, 21.0);

    let Some(Value::Dictionary(written)) = factory.normalize(&Reading { celsius: 21.7 }).unwrap() else {
        panic!("expected a dictionary");
    };
    assert_eq!(written.get("celsius"), Some(&Value::from(21.7_f64)));
}
