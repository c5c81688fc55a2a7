//! Builders for schema nodes.
//!
//! ```
//! use typeparse::types as t;
//!
//! let schema = t::object([
//!     ("id", t::number()),
//!     ("name", t::string().path("user.public.name")),
//!     ("tags", t::array(t::string()).optional()),
//! ]);
//! # let _ = schema;
//! ```
use indexmap::IndexMap;
use serde_json::Value;

use crate::schema::{Schema, Transform};

pub fn string() -> Schema {
    Schema::String {
        path: None,
        default: None,
        optional: false,
    }
}

pub fn number() -> Schema {
    Schema::Number {
        path: None,
        default: None,
        optional: false,
    }
}

/// Strict unless `.strict(false)` is applied.
pub fn boolean() -> Schema {
    Schema::Boolean {
        path: None,
        default: None,
        strict: true,
        optional: false,
    }
}

pub fn any() -> Schema {
    Schema::Any {
        path: None,
        default: None,
    }
}

pub fn array(element: Schema) -> Schema {
    Schema::Array {
        path: None,
        optional: false,
        element: Box::new(element),
    }
}

pub fn object<I, K>(fields: I) -> Schema
where
    I: IntoIterator<Item = (K, Schema)>,
    K: Into<String>,
{
    let fields: IndexMap<String, Schema> = fields.into_iter().map(|(k, v)| (k.into(), v)).collect();
    Schema::Object {
        path: None,
        optional: false,
        fields,
    }
}

pub fn union(alternatives: impl IntoIterator<Item = Schema>) -> Schema {
    Schema::Union {
        optional: false,
        alternatives: alternatives.into_iter().collect(),
    }
}

pub fn custom<F>(transform: F) -> Schema
where
    F: Fn(Option<&Value>) -> anyhow::Result<Value> + Send + Sync + 'static,
{
    Schema::Custom {
        path: None,
        optional: false,
        transform: Transform::new(transform),
    }
}
