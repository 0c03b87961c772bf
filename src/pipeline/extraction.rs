//! The feature extraction pipeline assembled from config options.
//!
//! A [`FeatureExtractionPipeline`] is a tokenizer followed by an ordered list
//! of named stages. Normaliser stages rewrite tokens; inferrer stages turn the
//! normalised document into feature strings, which are interned into the
//! pipeline's [`FeatureVocabulary`].

use crate::types::{Document, FeatureId, FeatureLookup, FeatureVocabulary, Instance, ProcessedInstance};

use super::traits::{FeatureInferrer, TokenNormaliser, Tokenize};

/// Enter a tracing span for a pipeline stage (when the `tracing` feature is
/// enabled). When disabled, this is a no-op and the compiler eliminates it.
macro_rules! trace_stage {
    ($name:expr) => {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("pipeline_stage", stage = $name).entered();
    };
}

/// One processing stage.
pub enum Stage {
    Normaliser(Box<dyn TokenNormaliser>),
    Inferrer(Box<dyn FeatureInferrer>),
}

impl Stage {
    /// Short kind name for introspection.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Normaliser(_) => "normaliser",
            Self::Inferrer(_) => "inferrer",
        }
    }
}

/// A stage together with the name it was added under.
pub struct NamedStage {
    pub name: String,
    pub stage: Stage,
}

/// Mutable build target for config handlers, and the finished pipeline.
#[derive(Default)]
pub struct FeatureExtractionPipeline {
    tokenizer: Option<Box<dyn Tokenize>>,
    stages: Vec<NamedStage>,
    vocabulary: FeatureVocabulary,
}

impl std::fmt::Debug for FeatureExtractionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureExtractionPipeline")
            .field("tokenizer_assigned", &self.tokenizer_assigned())
            .field("stages", &self.stage_names())
            .field("vocabulary_size", &self.vocabulary.len())
            .finish()
    }
}

impl FeatureExtractionPipeline {
    /// Create an empty pipeline with no tokenizer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign the tokenizer, replacing any earlier one.
    pub fn set_tokenizer(&mut self, tokenizer: Box<dyn Tokenize>) {
        self.tokenizer = Some(tokenizer);
    }

    /// Whether a tokenizer has been assigned.
    pub fn tokenizer_assigned(&self) -> bool {
        self.tokenizer.is_some()
    }

    /// Append a token normaliser stage.
    pub fn add_normaliser(&mut self, name: impl Into<String>, normaliser: Box<dyn TokenNormaliser>) {
        self.stages.push(NamedStage {
            name: name.into(),
            stage: Stage::Normaliser(normaliser),
        });
    }

    /// Append a feature inferrer stage.
    pub fn add_inferrer(&mut self, name: impl Into<String>, inferrer: Box<dyn FeatureInferrer>) {
        self.stages.push(NamedStage {
            name: name.into(),
            stage: Stage::Inferrer(inferrer),
        });
    }

    /// Stage names in the order they run.
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name.as_str()).collect()
    }

    /// Stages in the order they run.
    pub fn stages(&self) -> &[NamedStage] {
        &self.stages
    }

    /// Number of stages.
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// The interned features seen so far.
    pub fn vocabulary(&self) -> &FeatureVocabulary {
        &self.vocabulary
    }

    /// Tokenize and normalise an instance.
    ///
    /// Returns an empty document if no tokenizer is assigned; the builder
    /// never hands out such a pipeline.
    pub fn process_document(&self, instance: &Instance) -> Document {
        let mut document = {
            trace_stage!("tokenize");
            match &self.tokenizer {
                Some(tokenizer) => tokenizer.tokenize(instance),
                None => Document::new(Some(instance.clone())),
            }
        };

        for named in &self.stages {
            if let Stage::Normaliser(normaliser) = &named.stage {
                trace_stage!(named.name.as_str());
                for token in document.tokens.iter_mut() {
                    normaliser.normalise(token);
                }
            }
        }

        document
    }

    /// Feature strings for a normalised document, in inferrer order.
    pub fn infer_features(&self, document: &Document) -> Vec<String> {
        let mut features = Vec::new();
        for named in &self.stages {
            if let Stage::Inferrer(inferrer) = &named.stage {
                trace_stage!(named.name.as_str());
                inferrer.infer(document, &mut features);
            }
        }
        features
    }

    /// Run the full pipeline, interning features into the vocabulary.
    pub fn extract_features(&mut self, instance: &Instance) -> ProcessedInstance {
        let document = self.process_document(instance);
        let strings = self.infer_features(&document);
        let features = strings.iter().map(|f| self.vocabulary.intern(f)).collect();
        ProcessedInstance {
            features,
            source: Some(instance.clone()),
        }
    }

    /// Extract features for many instances.
    pub fn extract_all<'a>(
        &mut self,
        instances: impl IntoIterator<Item = &'a Instance>,
    ) -> Vec<ProcessedInstance> {
        instances
            .into_iter()
            .map(|i| self.extract_features(i))
            .collect()
    }

    /// Human-readable string for a feature id.
    pub fn feature_string(&self, feature: FeatureId) -> Option<&str> {
        self.vocabulary.get(feature)
    }
}

impl FeatureLookup for FeatureExtractionPipeline {
    fn feature_string(&self, feature: FeatureId) -> Option<&str> {
        self.vocabulary.get(feature)
    }
}
