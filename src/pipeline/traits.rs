//! Trait definitions for pipeline stages and config handlers.
//!
//! Stages are held as trait objects so that handlers can attach any
//! implementation at runtime. All traits require `Send + Sync`: a finished
//! pipeline and its registry may be shared across threads.

use crate::types::{AnnotatedToken, Document, Instance};

use super::errors::ConfigError;
use super::extraction::FeatureExtractionPipeline;
use super::options::PipelineOption;

// ============================================================================
// Tokenize: raw instance to token sequence
// ============================================================================

/// Splits a raw [`Instance`] into a [`Document`] of annotated tokens.
///
/// Exactly one tokenizer is assigned per pipeline; a pipeline without one
/// cannot be built.
pub trait Tokenize: Send + Sync {
    /// Tokenize the instance.
    fn tokenize(&self, instance: &Instance) -> Document;
}

// ============================================================================
// TokenNormaliser: per-token rewrite
// ============================================================================

/// Rewrites a single token in place.
///
/// # Contract
///
/// - **Input**: one token, already produced by the tokenizer and any earlier
///   normalisers.
/// - **Idempotent**: normalising twice gives the same result as once.
pub trait TokenNormaliser: Send + Sync {
    /// Normalise the token in place.
    fn normalise(&self, token: &mut AnnotatedToken);
}

// ============================================================================
// FeatureInferrer: document to feature strings
// ============================================================================

/// Derives feature strings from a normalised document.
///
/// Inferrers append to `features`; they never remove what earlier inferrers
/// produced.
pub trait FeatureInferrer: Send + Sync {
    /// Append the features inferred from `document`.
    fn infer(&self, document: &Document, features: &mut Vec<String>);
}

// ============================================================================
// ConfigHandler: interprets one option key
// ============================================================================

/// A uniquely keyed unit of logic that interprets one option and mutates the
/// pipeline under construction.
///
/// Handlers are created once when the registry is built and must keep no
/// mutable state between calls.
pub trait ConfigHandler: Send + Sync {
    /// The option key this handler answers to. Must be unique registry-wide.
    fn key(&self) -> &str;

    /// Apply `value` to `pipeline`.
    ///
    /// `options` is the full option list, so a handler may look at sibling
    /// options it depends on. It must not rely on their order.
    fn handle(
        &self,
        pipeline: &mut FeatureExtractionPipeline,
        value: &serde_json::Value,
        options: &[PipelineOption],
    ) -> Result<(), ConfigError>;

    /// One-line description for help output.
    fn description(&self) -> &str {
        ""
    }
}
