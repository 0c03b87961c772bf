//! Core types for rapid_featurize
//!
//! This module defines the data structures shared by the pipeline and the
//! cluster analysis: feature interning, annotated tokens, documents, and
//! processed (optionally clustered) instances.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Integer identifier of an extracted feature.
pub type FeatureId = u32;

// ============================================================================
// Feature interning
// ============================================================================

/// Maps feature ids back to human-readable strings.
///
/// The cluster analysis only ever sees integer ids; anything that wants to
/// present results to a person goes through this lookup.
pub trait FeatureLookup {
    /// Get the string for a feature id, if the id is known.
    fn feature_string(&self, feature: FeatureId) -> Option<&str>;
}

/// A vocabulary that interns feature strings as dense integer ids.
///
/// Each unique string is stored once; ids are assigned in first-seen order
/// starting at zero.
#[derive(Debug, Default, Clone)]
pub struct FeatureVocabulary {
    /// Maps strings to their interned IDs
    string_to_id: FxHashMap<Arc<str>, FeatureId>,
    /// Maps IDs back to strings
    id_to_string: Vec<Arc<str>>,
}

impl FeatureVocabulary {
    /// Create a new empty vocabulary
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a feature string, returning its ID
    pub fn intern(&mut self, s: &str) -> FeatureId {
        if let Some(&id) = self.string_to_id.get(s) {
            return id;
        }

        let id = self.id_to_string.len() as FeatureId;
        let arc: Arc<str> = s.into();
        self.string_to_id.insert(arc.clone(), id);
        self.id_to_string.push(arc);
        id
    }

    /// Look up the id of an already-interned string
    pub fn id_of(&self, s: &str) -> Option<FeatureId> {
        self.string_to_id.get(s).copied()
    }

    /// Get a string by its ID
    pub fn get(&self, id: FeatureId) -> Option<&str> {
        self.id_to_string.get(id as usize).map(|s| s.as_ref())
    }

    /// Get the number of unique features in the vocabulary
    pub fn len(&self) -> usize {
        self.id_to_string.len()
    }

    /// Check if the vocabulary is empty
    pub fn is_empty(&self) -> bool {
        self.id_to_string.is_empty()
    }
}

impl FeatureLookup for FeatureVocabulary {
    fn feature_string(&self, feature: FeatureId) -> Option<&str> {
        self.get(feature)
    }
}

// ============================================================================
// Tokens and documents
// ============================================================================

/// A token produced by a tokenizer, carrying its surface form and offsets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedToken {
    /// Current surface form (normalisers rewrite this in place)
    pub form: String,
    /// Start byte offset in the source text
    pub start: usize,
    /// End byte offset in the source text
    pub end: usize,
    /// True if the token has no alphanumeric characters
    pub is_punctuation: bool,
    /// Per-token annotations added by pipeline stages
    #[serde(default)]
    pub attributes: FxHashMap<String, serde_json::Value>,
}

impl AnnotatedToken {
    /// Create a new token
    pub fn new(form: impl Into<String>, start: usize, end: usize) -> Self {
        let form = form.into();
        let is_punctuation = !form.chars().any(|c| c.is_alphanumeric());
        Self {
            form,
            start,
            end,
            is_punctuation,
            attributes: FxHashMap::default(),
        }
    }
}

/// A raw input document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    /// Caller-assigned identifier
    pub id: String,
    /// The document text
    pub text: String,
}

impl Instance {
    /// Create a new instance
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// A document during feature extraction: a token sequence plus
/// document-level attributes that do not map onto single tokens.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    /// Tokens in document order
    pub tokens: Vec<AnnotatedToken>,
    /// Document-level annotations (attribute name → value)
    attributes: FxHashMap<String, serde_json::Value>,
    /// The instance this document was made from
    pub source: Option<Instance>,
}

impl Document {
    /// Create an empty document for the given source
    pub fn new(source: Option<Instance>) -> Self {
        Self {
            tokens: Vec::new(),
            attributes: FxHashMap::default(),
            source,
        }
    }

    /// Create a document from tokens
    pub fn from_tokens(tokens: Vec<AnnotatedToken>, source: Option<Instance>) -> Self {
        Self {
            tokens,
            attributes: FxHashMap::default(),
            source,
        }
    }

    /// New empty document sharing this document's source.
    pub fn clone_empty(&self) -> Self {
        Self::new(self.source.clone())
    }

    /// Get a document-level attribute
    pub fn attribute(&self, name: &str) -> Option<&serde_json::Value> {
        self.attributes.get(name)
    }

    /// Set a document-level attribute, replacing any previous value
    pub fn put_attribute(&mut self, name: impl Into<String>, value: serde_json::Value) {
        self.attributes.insert(name.into(), value);
    }

    /// Number of tokens
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Check if the document has no tokens
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Iterate over the tokens
    pub fn iter(&self) -> std::slice::Iter<'_, AnnotatedToken> {
        self.tokens.iter()
    }
}

// ============================================================================
// Processed instances
// ============================================================================

/// A document reduced to its extracted feature ids.
///
/// Features may repeat; counting policies decide what repetition means.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessedInstance {
    /// Extracted features in extraction order
    pub features: Vec<FeatureId>,
    /// The instance these features came from
    #[serde(default)]
    pub source: Option<Instance>,
}

impl ProcessedInstance {
    /// Create a processed instance without a source
    pub fn new(features: Vec<FeatureId>) -> Self {
        Self {
            features,
            source: None,
        }
    }
}

/// A processed instance together with its cluster-membership vector.
///
/// The vector has one entry per cluster; entries are usually probabilities
/// but need not sum to one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusteredProcessedInstance {
    pub instance: ProcessedInstance,
    pub cluster_vector: Vec<f64>,
}

impl ClusteredProcessedInstance {
    /// Create a clustered instance
    pub fn new(instance: ProcessedInstance, cluster_vector: Vec<f64>) -> Self {
        Self {
            instance,
            cluster_vector,
        }
    }

    /// Shorthand for a clustered instance built straight from feature ids
    pub fn from_features(features: Vec<FeatureId>, cluster_vector: Vec<f64>) -> Self {
        Self::new(ProcessedInstance::new(features), cluster_vector)
    }

    /// The document's features
    pub fn features(&self) -> &[FeatureId] {
        &self.instance.features
    }

    /// Number of clusters this vector describes
    pub fn num_clusters(&self) -> usize {
        self.cluster_vector.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vocabulary_intern() {
        let mut vocab = FeatureVocabulary::new();
        let a = vocab.intern("hello");
        let b = vocab.intern("world");
        let c = vocab.intern("hello");

        assert_eq!(a, 0);
        assert_eq!(b, 1);
        assert_eq!(a, c);
        assert_eq!(vocab.len(), 2);
        assert_eq!(vocab.get(b), Some("world"));
        assert_eq!(vocab.id_of("hello"), Some(0));
        assert_eq!(vocab.feature_string(9), None);
    }

    #[test]
    fn test_token_punctuation_flag() {
        assert!(AnnotatedToken::new("!!", 0, 2).is_punctuation);
        assert!(!AnnotatedToken::new("a1", 0, 2).is_punctuation);
    }

    #[test]
    fn test_document_attributes_and_clone_empty() {
        let source = Instance::new("d1", "Hello there");
        let mut doc = Document::from_tokens(
            vec![AnnotatedToken::new("Hello", 0, 5)],
            Some(source.clone()),
        );
        doc.put_attribute("lang", serde_json::json!("en"));

        assert_eq!(doc.attribute("lang"), Some(&serde_json::json!("en")));
        assert_eq!(doc.len(), 1);

        let empty = doc.clone_empty();
        assert!(empty.is_empty());
        assert_eq!(empty.source, Some(source));
        assert!(empty.attribute("lang").is_none());
    }

    #[test]
    fn test_clustered_instance_accessors() {
        let doc = ClusteredProcessedInstance::from_features(vec![1, 2, 2], vec![0.2, 0.8]);
        assert_eq!(doc.features(), &[1, 2, 2]);
        assert_eq!(doc.num_clusters(), 2);
    }
}
