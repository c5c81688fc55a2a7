//! Schema-driven extraction and coercion of untyped JSON.
//!
//! Build a [`Schema`] once with the [`types`] builders, then apply it to any
//! number of `serde_json::Value` inputs:
//!
//! ```
//! use serde_json::json;
//! use typeparse::{types as t, TypeParse};
//!
//! let tp = TypeParse::new(t::object([
//!     ("id", t::number()),
//!     ("phone", t::number().path("contact.phones.[-1]")),
//!     ("nick", t::string().optional()),
//! ]));
//!
//! let out = tp.parse(&json!({ "id": "42", "contact": { "phones": ["1", "555"] } })).unwrap();
//! assert_eq!(out, Some(json!({ "id": 42, "phone": 555 })));
//! ```
pub mod engine;
pub mod error;
pub mod parser;
pub mod path;
pub mod path_de;
pub mod schema;
pub mod types;

pub use error::{Error, ErrorKind, ExpectedType, Key, ParseError, ValueType};
pub use parser::{ParseOptions, SafeResult, TypeParse};
pub use schema::{Schema, Transform};
