//! dictum - schema-driven mapping between typed values and dictionaries
//!
//! This crate converts typed Rust values into a small universe of simple
//! values (`null`, booleans, characters, numbers, strings, ordered
//! [`Dictionary`]s and homogeneous arrays) and back. The mapping of a
//! struct is described by a declarative schema generated with
//! `#[derive(Configurable)]`; scalars and collections go through pluggable
//! [`TypeAdapter`](adapter::TypeAdapter)s.
//!
//! Reading and writing a text format is left to a codec. With the `serde`
//! feature any serde format crate can play that role.
//!
//! # Example
//!
//! ```
//! use dictum::{Configurable, Reflect, Value, factory::ConfigFactory};
//!
//! #[derive(Debug, Default, PartialEq, Configurable)]
//! #[config(naming = "kebab-case")]
//! struct Server {
//!     #[config(alias = "address", validate = "not-blank")]
//!     host: String,
//!     #[config(validate = "range=1|65535")]
//!     listen_port: u16,
//!     #[config(optional)]
//!     tags: Vec<String>,
//! }
//!
//! let factory = ConfigFactory::default();
//! let server = Server { host: "localhost".into(), listen_port: 8080, tags: vec![] };
//!
//! let Some(Value::Dictionary(dict)) = factory.normalize(&server).unwrap() else {
//!     unreachable!()
//! };
//! assert_eq!(dict.get("listen-port"), Some(&Value::from(8080_u16)));
//!
//! let back: Server = factory.denormalize(&Value::Dictionary(dict)).unwrap().unwrap();
//! assert_eq!(back, server);
//! ```

#![deny(clippy::correctness)]
#![deny(clippy::suspicious)]
#![deny(clippy::complexity)]
#![deny(clippy::perf)]
#![deny(clippy::style)]
#![warn(clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::panic))]
#![warn(clippy::todo)]
#![deny(clippy::unimplemented)]
#![deny(clippy::unreachable)]
#![deny(unsafe_code)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
#![warn(clippy::alloc_instead_of_core)]
#![warn(clippy::std_instead_of_alloc)]
#![warn(clippy::std_instead_of_core)]

extern crate std;

extern crate alloc;
extern crate self as dictum;

pub mod adapter;
pub mod context;
pub mod denormalizer;
pub mod error;
pub mod factory;
pub mod instance;
pub mod normalizer;
pub mod reflect;
pub mod schema;
pub mod settings;
pub mod types;
mod util;
pub mod validate;
pub mod value;

pub use dictum_derive::{Configurable, Reflect};

pub use crate::{
    error::{Error, Path, PathSegment, Result},
    factory::{ConfigFactory, ConfigFactoryBuilder},
    reflect::{FromReflect, Reflect},
    schema::Configurable,
    types::{Class, Type, Typed},
    value::{Dictionary, Number, Value},
};
