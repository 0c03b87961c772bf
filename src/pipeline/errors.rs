//! Configuration error type for registry construction and pipeline builds.
//!
//! Every failure carries a stable [`ErrorCode`] for programmatic matching, a
//! JSON pointer `path` locating the offending option, a human-readable
//! `message`, and an optional `hint` suggesting a fix.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::error_code::ErrorCode;

/// A failure while building a handler registry or assembling a pipeline.
///
/// # Display format
///
/// ```text
/// [unrecognised_option] /options/2/key: Unrecognised option: 'stemming'
/// ```
///
/// # JSON format
///
/// ```json
/// {
///   "code": "unrecognised_option",
///   "path": "/options/2/key",
///   "message": "Unrecognised option: 'stemming'",
///   "hint": "Known options: bigrams, filter_punctuation, ..."
/// }
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("[{code}] {path}: {message}")]
pub struct ConfigError {
    /// Stable error code for programmatic matching.
    pub code: ErrorCode,

    /// JSON pointer into the option list, e.g. `"/options/0/value"`.
    ///
    /// Registry errors and `missing_tokenizer` use `""` (root).
    pub path: String,

    /// Human-readable description of the problem.
    pub message: String,

    /// Optional suggestion for how to fix the problem.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ConfigError {
    /// Create a new config error.
    pub fn new(code: ErrorCode, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            path: path.into(),
            message: message.into(),
            hint: None,
        }
    }

    /// Attach a hint suggesting how to fix the problem.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Two handlers declared the same key.
    pub fn duplicate_key(key: &str) -> Self {
        Self::new(
            ErrorCode::DuplicateHandlerKey,
            "",
            format!("A handler has been defined with a duplicate key: '{key}'"),
        )
        .with_hint("Give each handler a unique key")
    }

    /// A handler factory failed.
    pub fn instantiation_failed(reason: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::HandlerInstantiationFailed,
            "",
            format!("Could not instantiate handler: {}", reason.into()),
        )
    }

    /// No handler exists for the option at `index`.
    pub fn unrecognised_option(index: usize, key: &str) -> Self {
        Self::new(
            ErrorCode::UnrecognisedOption,
            format!("/options/{index}/key"),
            format!("Unrecognised option: '{key}'"),
        )
    }

    /// An option value had the wrong shape for its handler.
    ///
    /// The path stays empty until the builder places it with `at_option`.
    pub fn type_mismatch(key: &str, value: &serde_json::Value) -> Self {
        Self::new(
            ErrorCode::OptionTypeMismatch,
            "",
            format!("Option value ({value}) is incorrect type for option key ({key})"),
        )
    }

    /// No option assigned a tokenizer.
    pub fn missing_tokenizer() -> Self {
        Self::new(
            ErrorCode::MissingTokenizer,
            "",
            "No tokeniser assigned to pipeline",
        )
        .with_hint("Add a 'tokeniser' option, e.g. {\"key\": \"tokeniser\", \"value\": \"basic\"}")
    }

    /// The option list could not be parsed.
    pub fn invalid_option_list(reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidOptionList, "", reason)
            .with_hint("Supply a JSON array of {\"key\": ..., \"value\": ...} objects")
    }

    /// Point this error at option `index` if it has no location yet.
    ///
    /// Handlers report value problems without knowing their position in the
    /// list; the builder fills it in.
    pub(crate) fn at_option(mut self, index: usize) -> Self {
        if self.path.is_empty() {
            self.path = format!("/options/{index}/value");
        }
        self
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::invalid_option_list(err.to_string())
    }
}
