//! Error types for cluster feature analysis
//!
//! Pipeline configuration failures live in [`crate::pipeline::errors`];
//! this module covers everything that can go wrong while counting and
//! ranking features over clustered documents.

use thiserror::Error;

use crate::types::FeatureId;

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Main error type for the analysis side of the crate
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// No documents were supplied, so the number of clusters is unknown
    #[error("Empty document collection: {message}")]
    EmptyDocumentCollection { message: String },

    /// An ordering method name did not match any known method
    #[error("Unknown ordering method: '{method}'")]
    UnknownOrderingMethod { method: String },

    /// A query referenced a cluster that does not exist
    #[error("Cluster index {index} out of range (analysis has {clusters} clusters)")]
    ClusterIndexOutOfRange { index: usize, clusters: usize },

    /// A document's cluster vector disagrees with the first document's length
    #[error("Document {document} has a cluster vector of length {found}, expected {expected}")]
    MembershipDimensionMismatch {
        expected: usize,
        found: usize,
        document: usize,
    },

    /// A ranked feature id has no string in the supplied lookup
    #[error("Feature {feature} is not known to the feature lookup")]
    UnknownFeature { feature: FeatureId },

    /// Configuration validation failed
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl AnalysisError {
    /// Create an empty document collection error
    pub fn empty_documents(message: impl Into<String>) -> Self {
        Self::EmptyDocumentCollection {
            message: message.into(),
        }
    }

    /// Create an unknown ordering method error
    pub fn unknown_ordering(method: impl Into<String>) -> Self {
        Self::UnknownOrderingMethod {
            method: method.into(),
        }
    }

    /// Create a cluster index error
    pub fn cluster_out_of_range(index: usize, clusters: usize) -> Self {
        Self::ClusterIndexOutOfRange { index, clusters }
    }

    /// Create a membership dimension error
    pub fn dimension_mismatch(expected: usize, found: usize, document: usize) -> Self {
        Self::MembershipDimensionMismatch {
            expected,
            found,
            document,
        }
    }

    /// Create an unknown feature error
    pub fn unknown_feature(feature: FeatureId) -> Self {
        Self::UnknownFeature { feature }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Check if this error was caused by the shape of the input documents
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyDocumentCollection { .. } | Self::MembershipDimensionMismatch { .. }
        )
    }
}

impl From<serde_json::Error> for AnalysisError {
    fn from(err: serde_json::Error) -> Self {
        Self::invalid_config(err.to_string())
    }
}
