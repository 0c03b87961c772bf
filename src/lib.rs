//! # rapid_featurize
//!
//! Text feature extraction pipelines assembled from declarative option
//! lists, and statistical ranking of the features that characterise each
//! cluster of a clustered document collection.
//!
//! ## Features
//!
//! - **Declarative pipelines**: an ordered `(key, value)` option list is
//!   resolved against a registry of config handlers, each of which attaches
//!   stages to the pipeline
//! - **Extensible**: new handlers are plain factory functions registered at
//!   startup; no handler knows about any other
//! - **Parallel counting**: per-cluster and prior feature counts are a rayon
//!   reduction over the document collection
//! - **Top-K ranking**: PMI-style and related orderings with bounded
//!   selection and a deterministic tie-break

pub mod clusters;
pub mod errors;
pub mod nlp;
pub mod pipeline;
pub mod types;

// Re-export commonly used types
pub use errors::{AnalysisError, Result};
pub use types::{
    AnnotatedToken, ClusteredProcessedInstance, Document, FeatureId, FeatureLookup,
    FeatureVocabulary, Instance, ProcessedInstance,
};

// Re-export main functionality
pub use clusters::{
    AnalysisConfig, ClusterFeatureAnalysis, ClusterMembershipTest, CountingMethod,
    FeatureClusterJointCounter, MembershipMethod, OrderingMethod, PruneThresholds,
};
pub use nlp::tokenizer::Tokenizer;
pub use pipeline::{
    ConfigError, ConfigHandler, ErrorCode, FeatureExtractionPipeline, HandlerRegistry,
    PipelineBuilder, PipelineOption,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
