use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::Error;

/// Deserialize a coerced tree with JSON-path context in error messages.
pub fn from_value_with_path<T: DeserializeOwned>(value: Value) -> Result<T, Error> {
    serde_path_to_error::deserialize::<_, T>(value).map_err(|err| Error::Deserialize {
        path: err.path().to_string(),
        message: err.into_inner().to_string(),
    })
}
