//! Pipeline assembly from declarative option lists.
//!
//! ## Submodules
//!
//! - [`options`]: the `(key, value)` option protocol and typed decoding
//! - [`traits`]: stage and config-handler traits
//! - [`registry`]: key → handler table, built once and shared
//! - [`handlers`]: built-in handlers and the stages they attach
//! - [`extraction`]: the pipeline that handlers configure
//! - [`builder`]: runs an option list against a registry

pub mod builder;
pub mod error_code;
pub mod errors;
pub mod extraction;
pub mod handlers;
pub mod options;
pub mod registry;
pub mod traits;

pub use builder::PipelineBuilder;
pub use error_code::ErrorCode;
pub use errors::ConfigError;
pub use extraction::{FeatureExtractionPipeline, NamedStage, Stage};
pub use handlers::{
    default_factories, BigramInferrer, LowerCaseNormaliser, RegexReplaceNormaliser,
    UnigramInferrer,
};
pub use options::{find_option, PipelineOption};
pub use registry::{HandlerFactory, HandlerRegistry, HandlerRegistryBuilder};
pub use traits::{ConfigHandler, FeatureInferrer, TokenNormaliser, Tokenize};
