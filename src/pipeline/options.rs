//! Option list protocol.
//!
//! A pipeline is described by an ordered list of `(key, value)` options. The
//! key selects a [`ConfigHandler`](super::traits::ConfigHandler); the value
//! is an untyped JSON payload that only the matching handler knows how to
//! read. Handlers decode it with [`PipelineOption::decode`], which turns a
//! shape mismatch into an `option_type_mismatch` error for that option.
//!
//! # JSON shape
//!
//! ```json
//! [
//!   { "key": "tokeniser", "value": "basic" },
//!   { "key": "lower_case", "value": true },
//!   { "key": "unigrams", "value": true }
//! ]
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::errors::ConfigError;

/// A single configuration instruction for pipeline assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOption {
    /// Handler key this option is addressed to.
    pub key: String,
    /// Handler-specific payload; validated only when the handler runs.
    #[serde(default)]
    pub value: serde_json::Value,
}

impl PipelineOption {
    /// Create an option from anything convertible to a JSON value.
    pub fn new(key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Decode the value into the type a handler expects.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, ConfigError> {
        decode_value(&self.key, &self.value)
    }

    /// Decode the value as a boolean flag.
    ///
    /// Accepts JSON booleans and the strings `"true"`/`"false"` in any
    /// capitalisation.
    pub fn flag(&self) -> Result<bool, ConfigError> {
        decode_flag(&self.key, &self.value)
    }
}

/// Decode an option value into `T`, reporting a type mismatch on failure.
pub fn decode_value<T: DeserializeOwned>(
    key: &str,
    value: &serde_json::Value,
) -> Result<T, ConfigError> {
    T::deserialize(value).map_err(|e| ConfigError::type_mismatch(key, value).with_hint(e.to_string()))
}

/// Decode a tolerant boolean flag.
pub fn decode_flag(key: &str, value: &serde_json::Value) -> Result<bool, ConfigError> {
    match value {
        serde_json::Value::Bool(b) => Ok(*b),
        serde_json::Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(true),
        serde_json::Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(false),
        _ => Err(ConfigError::type_mismatch(key, value).with_hint("Expected true or false")),
    }
}

/// Find the first option with the given key.
///
/// Handlers use this to consult sibling options they depend on.
pub fn find_option<'a>(options: &'a [PipelineOption], key: &str) -> Option<&'a PipelineOption> {
    options.iter().find(|o| o.key == key)
}

/// True if a sibling option with `key` is present and its flag is set.
///
/// A sibling whose value is not a valid flag counts as unset; its own
/// handler reports the mismatch when it runs.
pub fn sibling_flag(options: &[PipelineOption], key: &str) -> bool {
    find_option(options, key)
        .and_then(|o| o.flag().ok())
        .unwrap_or(false)
}

/// Parse a JSON option list.
pub fn parse_options(json: &str) -> Result<Vec<PipelineOption>, ConfigError> {
    Ok(serde_json::from_str(json)?)
}
