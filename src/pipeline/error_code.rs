//! Stable error codes for pipeline configuration failures.
//!
//! Codes serialize as snake_case strings and never change meaning once
//! published, so callers can match on them programmatically.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Machine-readable classification of a [`ConfigError`](super::errors::ConfigError).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Two registered handlers declared the same key.
    DuplicateHandlerKey,
    /// A handler factory failed to produce a handler.
    HandlerInstantiationFailed,
    /// An option key has no registered handler.
    UnrecognisedOption,
    /// An option value could not be decoded into the handler's expected type.
    OptionTypeMismatch,
    /// No option assigned a tokenizer to the pipeline.
    MissingTokenizer,
    /// The option list itself was malformed.
    InvalidOptionList,
}

impl ErrorCode {
    /// The snake_case name used in JSON and display output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DuplicateHandlerKey => "duplicate_handler_key",
            Self::HandlerInstantiationFailed => "handler_instantiation_failed",
            Self::UnrecognisedOption => "unrecognised_option",
            Self::OptionTypeMismatch => "option_type_mismatch",
            Self::MissingTokenizer => "missing_tokenizer",
            Self::InvalidOptionList => "invalid_option_list",
        }
    }

    /// Registry errors happen once at startup; the rest are per-build.
    pub fn is_registry_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicateHandlerKey | Self::HandlerInstantiationFailed
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
