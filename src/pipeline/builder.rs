//! Option-driven pipeline builder: maps an ordered option list to a
//! configured [`FeatureExtractionPipeline`].
//!
//! # Usage
//!
//! ```ignore
//! let builder = PipelineBuilder::new()?;
//! let pipeline = builder.build(&[
//!     PipelineOption::new("tokeniser", "basic"),
//!     PipelineOption::new("lower_case", true),
//!     PipelineOption::new("unigrams", true),
//! ])?;
//! ```
//!
//! Options run strictly in list order, so the order of stages in the
//! resulting pipeline follows the order of the options that added them.
//! Building is all-or-nothing: on any error the partially configured
//! pipeline is dropped and only the error is returned.

use std::sync::Arc;

use super::errors::ConfigError;
use super::extraction::FeatureExtractionPipeline;
use super::options::{parse_options, PipelineOption};
use super::registry::HandlerRegistry;

/// Builds pipelines against a shared, immutable [`HandlerRegistry`].
#[derive(Debug, Clone)]
pub struct PipelineBuilder {
    registry: Arc<HandlerRegistry>,
}

impl PipelineBuilder {
    /// Create a builder over the built-in handlers.
    pub fn new() -> Result<Self, ConfigError> {
        Ok(Self::with_registry(Arc::new(HandlerRegistry::with_defaults()?)))
    }

    /// Create a builder over an existing registry.
    pub fn with_registry(registry: Arc<HandlerRegistry>) -> Self {
        Self { registry }
    }

    /// Every option key the builder understands, sorted.
    pub fn config_keys(&self) -> Vec<&str> {
        self.registry.keys()
    }

    /// Build a pipeline from `options`.
    ///
    /// Fails with `unrecognised_option` at the first unknown key (later
    /// options are not processed), with `option_type_mismatch` if a handler
    /// rejects its value, and with `missing_tokenizer` if no option assigned
    /// a tokenizer.
    pub fn build(&self, options: &[PipelineOption]) -> Result<FeatureExtractionPipeline, ConfigError> {
        let mut pipeline = FeatureExtractionPipeline::new();

        for (index, option) in options.iter().enumerate() {
            let handler = self.registry.get(&option.key).ok_or_else(|| {
                ConfigError::unrecognised_option(index, &option.key)
                    .with_hint(format!("Known options: {}", self.config_keys().join(", ")))
            })?;

            handler
                .handle(&mut pipeline, &option.value, options)
                .map_err(|e| e.at_option(index))?;

            #[cfg(feature = "tracing")]
            tracing::debug!(index, key = %option.key, stages = pipeline.stage_count(), "applied option");
        }

        if !pipeline.tokenizer_assigned() {
            return Err(ConfigError::missing_tokenizer());
        }

        Ok(pipeline)
    }

    /// Parse a JSON option list and build a pipeline from it.
    pub fn build_from_json(&self, json: &str) -> Result<FeatureExtractionPipeline, ConfigError> {
        let options = parse_options(json)?;
        self.build(&options)
    }
}
