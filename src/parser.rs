//! Calling conventions around the engine.
//!
//! `TypeParse::parse` propagates failures as `Err`; `safe_parse` folds them
//! into a tagged [`SafeResult`]. Neither changes what gets evaluated.
use serde::de::DeserializeOwned;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

use crate::engine;
use crate::error::{Error, ParseError};
use crate::path_de;
use crate::schema::Schema;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Return failures as `SafeResult::Failure` instead of `Err`.
    pub safe_parse: bool,
}

/// Tagged outcome of a safe parse. Serializes as
/// `{"success": true, "data": ...}` or `{"success": false, "error": "..."}`.
#[derive(Debug, Clone, PartialEq)]
pub enum SafeResult {
    Success(Option<Value>),
    Failure(String),
}

impl SafeResult {
    pub fn is_success(&self) -> bool {
        matches!(self, SafeResult::Success(_))
    }
}

impl Serialize for SafeResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SafeResult::Success(data) => {
                let mut map = serializer.serialize_map(None)?;
                map.serialize_entry("success", &true)?;
                if let Some(data) = data {
                    map.serialize_entry("data", data)?;
                }
                map.end()
            }
            SafeResult::Failure(error) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("success", &false)?;
                map.serialize_entry("error", error)?;
                map.end()
            }
        }
    }
}

/// A schema ready to be applied to any number of inputs.
///
/// Holds no per-parse state, so one instance can be shared across threads.
#[derive(Debug, Clone)]
pub struct TypeParse {
    schema: Schema,
}

impl TypeParse {
    pub fn new(schema: Schema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// `Ok(None)` only when the root node is optional (or `Any`) and nothing usable was found.
    pub fn parse(&self, input: &Value) -> Result<Option<Value>, ParseError> {
        engine::evaluate(&self.schema, input)
    }

    pub fn safe_parse(&self, input: &Value) -> SafeResult {
        match self.parse(input) {
            Ok(data) => SafeResult::Success(data),
            Err(error) => SafeResult::Failure(format!("TypeParse error: {error}")),
        }
    }

    /// Options-driven entry point: with `safe_parse` set this never returns `Err`.
    pub fn parse_with(
        &self,
        input: &Value,
        options: ParseOptions,
    ) -> Result<SafeResult, ParseError> {
        if options.safe_parse {
            return Ok(self.safe_parse(input));
        }
        self.parse(input).map(SafeResult::Success)
    }

    /// Parse, then deserialize the coerced tree into `T`.
    ///
    /// An undefined result deserializes from `null`, so `Option<_>` targets work.
    pub fn parse_into<T: DeserializeOwned>(&self, input: &Value) -> Result<T, Error> {
        let value = self.parse(input)?.unwrap_or(Value::Null);
        path_de::from_value_with_path(value)
    }
}

impl From<Schema> for TypeParse {
    fn from(schema: Schema) -> Self {
        Self::new(schema)
    }
}
