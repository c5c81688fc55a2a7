//! Structured parse failures.
use std::fmt;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Failure taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// The address resolved to nothing and no default/optional fallback applied.
    NotFound,
    /// A container node (array, object, union) received the wrong shape.
    InvalidType,
    /// A value was found but could not be coerced, or a custom transform failed.
    UnableToParse,
}

/// The kind a schema node was trying to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpectedType {
    String,
    Number,
    Boolean,
    Any,
    Custom,
    Array,
    Object,
    Union,
}

/// Runtime type of a candidate value; `Undefined` stands for "absent".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Undefined,
    Null,
    Boolean,
    Number,
    String,
    Array,
    Object,
}

impl ValueType {
    pub fn of(value: Option<&Value>) -> Self {
        match value {
            None => ValueType::Undefined,
            Some(Value::Null) => ValueType::Null,
            Some(Value::Bool(_)) => ValueType::Boolean,
            Some(Value::Number(_)) => ValueType::Number,
            Some(Value::String(_)) => ValueType::String,
            Some(Value::Array(_)) => ValueType::Array,
            Some(Value::Object(_)) => ValueType::Object,
        }
    }
}

/// Where a failure was looked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Key {
    Path(String),
    /// One address per union alternative.
    Paths(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseError {
    pub kind: ErrorKind,
    pub expected: ExpectedType,
    pub found: ValueType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<Key>,
    /// Message raised by a custom transform.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

// ————————————————————————————————————————————————————————————————————————————
// CONSTRUCTORS
// ————————————————————————————————————————————————————————————————————————————

impl ParseError {
    /// Failure of a primitive kind: absent candidates are NOT_FOUND, anything
    /// else that could not be coerced is UNABLE_TO_PARSE.
    pub(crate) fn coercion(expected: ExpectedType, found: Option<&Value>, address: &str) -> Self {
        let found = ValueType::of(found);
        let kind = match found {
            ValueType::Undefined => ErrorKind::NotFound,
            _ => ErrorKind::UnableToParse,
        };
        Self {
            kind,
            expected,
            found,
            key: key_of(address),
            detail: None,
        }
    }

    /// Failure of a container kind: absent candidates are NOT_FOUND, present
    /// ones of the wrong shape are INVALID_TYPE.
    pub(crate) fn shape(expected: ExpectedType, found: Option<&Value>, address: &str) -> Self {
        let found = ValueType::of(found);
        let kind = match found {
            ValueType::Undefined => ErrorKind::NotFound,
            _ => ErrorKind::InvalidType,
        };
        Self {
            kind,
            expected,
            found,
            key: key_of(address),
            detail: None,
        }
    }

    pub(crate) fn transform(found: Option<&Value>, address: &str, error: &anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::UnableToParse,
            expected: ExpectedType::Custom,
            found: ValueType::of(found),
            key: key_of(address),
            detail: Some(format!("{error:#}")),
        }
    }

    /// Every union alternative failed. Classified like a container failure.
    pub(crate) fn no_alternative(found: Option<&Value>, tried: Vec<String>) -> Self {
        Self {
            key: Some(Key::Paths(tried)),
            ..Self::shape(ExpectedType::Union, found, "")
        }
    }
}

fn key_of(address: &str) -> Option<Key> {
    if address.is_empty() {
        None
    } else {
        Some(Key::Path(address.to_string()))
    }
}

// ————————————————————————————————————————————————————————————————————————————
// DISPLAY
// ————————————————————————————————————————————————————————————————————————————

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Undefined => "undefined",
            ValueType::Null => "null",
            ValueType::Boolean => "boolean",
            ValueType::Number => "number",
            ValueType::String => "string",
            ValueType::Array => "array",
            ValueType::Object => "object",
        };
        f.write_str(name)
    }
}

impl fmt::Display for ExpectedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExpectedType::String => "string",
            ExpectedType::Number => "number",
            ExpectedType::Boolean => "boolean",
            ExpectedType::Any => "any",
            ExpectedType::Custom => "custom",
            ExpectedType::Array => "array",
            ExpectedType::Object => "object",
            ExpectedType::Union => "union",
        };
        f.write_str(name)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Path(path) => f.write_str(path),
            Key::Paths(paths) => f.write_str(&paths.join(", ")),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            kind,
            expected,
            found,
            key,
            detail,
        } = self;
        match (kind, expected) {
            (_, ExpectedType::Custom) => {
                write!(
                    f,
                    "Custom transform failed: {}",
                    detail.as_deref().unwrap_or("unknown error")
                )
            }
            (_, ExpectedType::Union) => write!(f, "No union alternative matched [{found}]"),
            (ErrorKind::NotFound, _) => match key {
                Some(key) => write!(f, "Unable to find a valid [{expected}] value at [{key}]"),
                None => write!(f, "Invalid type, expected [{expected}] but found [{found}]"),
            },
            (ErrorKind::InvalidType, _) => {
                write!(f, "Invalid type, expected [{expected}] but found [{found}]")
            }
            (ErrorKind::UnableToParse, _) => {
                write!(f, "Unable to convert [{found}] to [{expected}]")
            }
        }
    }
}

impl std::error::Error for ParseError {}

// ————————————————————————————————————————————————————————————————————————————
// CRATE ERROR
// ————————————————————————————————————————————————————————————————————————————

/// Errors surfaced by the typed entry points.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The coerced tree did not deserialize into the requested Rust type.
    #[error("at JSON path {path} → {message}")]
    Deserialize { path: String, message: String },
}
