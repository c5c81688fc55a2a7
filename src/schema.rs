//! Declarative schema nodes.
//!
//! A `Schema` is plain immutable data: built once through [`crate::types`],
//! then walked by [`crate::engine`] for every parse. Configuration methods
//! consume the node and hand back a new one, so a base node can be cloned into
//! several trees with different settings.
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::warn;

use crate::engine::coerce;
use crate::error::ExpectedType;

/// User-supplied conversion for [`Schema::Custom`]. Receives the raw candidate
/// (`None` when the address is absent); any error it returns is reported as
/// UNABLE_TO_PARSE.
#[derive(Clone)]
pub struct Transform(Arc<dyn Fn(Option<&Value>) -> anyhow::Result<Value> + Send + Sync>);

impl Transform {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Option<&Value>) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn apply(&self, value: Option<&Value>) -> anyhow::Result<Value> {
        (self.0)(value)
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Transform(..)")
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// One node of the declarative shape description.
///
/// `path`, when set, is resolved against the current input (the document, or
/// the array element being parsed). When unset, the node uses the address its
/// parent `Object` accumulated for it.
#[derive(Debug, Clone)]
pub enum Schema {
    String {
        path: Option<String>,
        default: Option<Value>,
        optional: bool,
    },
    Number {
        path: Option<String>,
        default: Option<Value>,
        optional: bool,
    },
    Boolean {
        path: Option<String>,
        default: Option<Value>,
        strict: bool,
        optional: bool,
    },
    /// Escape hatch: accepts whatever is found.
    Any {
        path: Option<String>,
        default: Option<Value>,
    },
    Custom {
        path: Option<String>,
        optional: bool,
        transform: Transform,
    },
    Array {
        path: Option<String>,
        optional: bool,
        element: Box<Schema>,
    },
    Object {
        path: Option<String>,
        optional: bool,
        fields: IndexMap<String, Schema>,
    },
    /// Ordered alternatives, first match wins.
    Union {
        optional: bool,
        alternatives: Vec<Schema>,
    },
}

// ————————————————————————————————————————————————————————————————————————————
// CONFIGURATION
// ————————————————————————————————————————————————————————————————————————————

impl Schema {
    /// Set the source address. Union has no address of its own and is returned unchanged.
    pub fn path(mut self, source: impl Into<String>) -> Self {
        match &mut self {
            Schema::String { path, .. }
            | Schema::Number { path, .. }
            | Schema::Boolean { path, .. }
            | Schema::Any { path, .. }
            | Schema::Custom { path, .. }
            | Schema::Array { path, .. }
            | Schema::Object { path, .. } => *path = Some(source.into()),
            Schema::Union { .. } => {}
        }
        self
    }

    /// Value returned when nothing usable is found. Only String, Number,
    /// Boolean and Any carry defaults; other kinds are returned unchanged.
    ///
    /// The default goes through the node's own coercion (booleans strictly),
    /// so `string().default_value(5)` yields `"5"`. A value the kind cannot
    /// hold is ignored with a warning.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        let value = value.into();
        match &mut self {
            Schema::String { default, .. } => {
                let coerced = coerce::to_string(&value);
                set_default(default, ExpectedType::String, &value, coerced)
            }
            Schema::Number { default, .. } => {
                let coerced = coerce::to_number(&value);
                set_default(default, ExpectedType::Number, &value, coerced)
            }
            Schema::Boolean { default, .. } => {
                let coerced = coerce::to_boolean(&value, true);
                set_default(default, ExpectedType::Boolean, &value, coerced)
            }
            Schema::Any { default, .. } => *default = Some(value),
            Schema::Custom { .. }
            | Schema::Array { .. }
            | Schema::Object { .. }
            | Schema::Union { .. } => {}
        }
        self
    }

    /// Boolean only: `false` enables truthiness coercion.
    pub fn strict(mut self, value: bool) -> Self {
        if let Schema::Boolean { strict, .. } = &mut self {
            *strict = value;
        }
        self
    }

    /// A copy of this node that yields `None` instead of failing.
    ///
    /// `Any` never fails, so its copy is identical.
    pub fn optional(&self) -> Self {
        let mut out = self.clone();
        match &mut out {
            Schema::String { optional, .. }
            | Schema::Number { optional, .. }
            | Schema::Boolean { optional, .. }
            | Schema::Custom { optional, .. }
            | Schema::Array { optional, .. }
            | Schema::Object { optional, .. }
            | Schema::Union { optional, .. } => *optional = true,
            Schema::Any { .. } => {}
        }
        out
    }

    // ————————————————————————————————————————————————————————————————————————
    // ACCESSORS
    // ————————————————————————————————————————————————————————————————————————

    /// `Any` never fails and always reports `true`.
    pub fn is_optional(&self) -> bool {
        match self {
            Schema::String { optional, .. }
            | Schema::Number { optional, .. }
            | Schema::Boolean { optional, .. }
            | Schema::Custom { optional, .. }
            | Schema::Array { optional, .. }
            | Schema::Object { optional, .. }
            | Schema::Union { optional, .. } => *optional,
            Schema::Any { .. } => true,
        }
    }

    pub fn source_path(&self) -> Option<&str> {
        match self {
            Schema::String { path, .. }
            | Schema::Number { path, .. }
            | Schema::Boolean { path, .. }
            | Schema::Any { path, .. }
            | Schema::Custom { path, .. }
            | Schema::Array { path, .. }
            | Schema::Object { path, .. } => path.as_deref(),
            Schema::Union { .. } => None,
        }
    }

    pub fn expected_type(&self) -> ExpectedType {
        match self {
            Schema::String { .. } => ExpectedType::String,
            Schema::Number { .. } => ExpectedType::Number,
            Schema::Boolean { .. } => ExpectedType::Boolean,
            Schema::Any { .. } => ExpectedType::Any,
            Schema::Custom { .. } => ExpectedType::Custom,
            Schema::Array { .. } => ExpectedType::Array,
            Schema::Object { .. } => ExpectedType::Object,
            Schema::Union { .. } => ExpectedType::Union,
        }
    }
}

fn set_default(
    slot: &mut Option<Value>,
    expected: ExpectedType,
    value: &Value,
    coerced: Option<Value>,
) {
    match coerced {
        Some(coerced) => *slot = Some(coerced),
        None => warn!(%expected, %value, "default value does not fit the node kind; ignored"),
    }
}
