//! Built-in config handlers and the stages they attach.
//!
//! Each handler owns one option key. Keys are the stable wire format of the
//! option list: new handlers may add keys, existing keys keep their meaning.
//!
//! | key | value | effect |
//! |---|---|---|
//! | `tokeniser` | `"basic"` or `{"type": "basic", "min_length": n}` | assigns the tokenizer |
//! | `lower_case` | bool | lower-cases every token |
//! | `normalise_repeated_qe_marks` | bool | `"!!!"` → `"!!"`, `"???"` → `"??"` |
//! | `normalise_urls` | bool | URLs → `"HTTPLINK"` |
//! | `filter_punctuation` | bool | n-gram inferrers skip punctuation tokens |
//! | `unigrams` | bool | one feature per token |
//! | `bigrams` | bool | one feature per adjacent token pair |

use regex::Regex;
use serde::Deserialize;

use crate::nlp::tokenizer::Tokenizer;
use crate::types::{AnnotatedToken, Document};

use super::errors::ConfigError;
use super::extraction::FeatureExtractionPipeline;
use super::options::{decode_flag, decode_value, sibling_flag, PipelineOption};
use super::registry::HandlerFactory;
use super::traits::{ConfigHandler, FeatureInferrer, TokenNormaliser};

/// Replacement form for normalised URLs.
pub const URL_TOKEN: &str = "HTTPLINK";

/// Factories for every built-in handler.
pub fn default_factories() -> Vec<HandlerFactory> {
    vec![
        tokeniser_handler as HandlerFactory,
        lower_case_handler,
        repeated_qe_marks_handler,
        urls_handler,
        filter_punctuation_handler,
        unigrams_handler,
        bigrams_handler,
    ]
}

fn tokeniser_handler() -> Result<Box<dyn ConfigHandler>, String> {
    Ok(Box::new(TokeniserHandler))
}

fn lower_case_handler() -> Result<Box<dyn ConfigHandler>, String> {
    Ok(Box::new(LowerCaseHandler))
}

fn repeated_qe_marks_handler() -> Result<Box<dyn ConfigHandler>, String> {
    Ok(Box::new(RepeatedQeMarksHandler {
        exclamations: compile("!!+")?,
        questions: compile(r"\?\?+")?,
    }))
}

fn urls_handler() -> Result<Box<dyn ConfigHandler>, String> {
    Ok(Box::new(UrlsHandler {
        pattern: compile(r"(?i)^(?:https?://|www\.)\S+$")?,
    }))
}

fn filter_punctuation_handler() -> Result<Box<dyn ConfigHandler>, String> {
    Ok(Box::new(FilterPunctuationHandler))
}

fn unigrams_handler() -> Result<Box<dyn ConfigHandler>, String> {
    Ok(Box::new(UnigramsHandler))
}

fn bigrams_handler() -> Result<Box<dyn ConfigHandler>, String> {
    Ok(Box::new(BigramsHandler))
}

fn compile(pattern: &str) -> Result<Regex, String> {
    Regex::new(pattern).map_err(|e| format!("invalid pattern '{pattern}': {e}"))
}

// ============================================================================
// Stages
// ============================================================================

/// Lower-cases the token form.
#[derive(Debug, Clone, Copy, Default)]
pub struct LowerCaseNormaliser;

impl TokenNormaliser for LowerCaseNormaliser {
    fn normalise(&self, token: &mut AnnotatedToken) {
        if token.form.chars().any(char::is_uppercase) {
            token.form = token.form.to_lowercase();
        }
    }
}

/// Replaces every match of a regex in the token form.
#[derive(Debug, Clone)]
pub struct RegexReplaceNormaliser {
    pattern: Regex,
    replacement: String,
}

impl RegexReplaceNormaliser {
    pub fn new(pattern: Regex, replacement: impl Into<String>) -> Self {
        Self {
            pattern,
            replacement: replacement.into(),
        }
    }
}

impl TokenNormaliser for RegexReplaceNormaliser {
    fn normalise(&self, token: &mut AnnotatedToken) {
        if self.pattern.is_match(&token.form) {
            token.form = self
                .pattern
                .replace_all(&token.form, self.replacement.as_str())
                .into_owned();
        }
    }
}

/// One feature per token form.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnigramInferrer {
    pub filter_punctuation: bool,
}

impl FeatureInferrer for UnigramInferrer {
    fn infer(&self, document: &Document, features: &mut Vec<String>) {
        features.extend(
            document
                .iter()
                .filter(|t| !(self.filter_punctuation && t.is_punctuation))
                .map(|t| t.form.clone()),
        );
    }
}

/// One feature per adjacent pair of kept tokens, joined by a space.
#[derive(Debug, Clone, Copy, Default)]
pub struct BigramInferrer {
    pub filter_punctuation: bool,
}

impl FeatureInferrer for BigramInferrer {
    fn infer(&self, document: &Document, features: &mut Vec<String>) {
        let kept: Vec<&AnnotatedToken> = document
            .iter()
            .filter(|t| !(self.filter_punctuation && t.is_punctuation))
            .collect();
        features.extend(kept.windows(2).map(|w| format!("{} {}", w[0].form, w[1].form)));
    }
}

// ============================================================================
// Handlers
// ============================================================================

#[derive(Deserialize)]
#[serde(untagged)]
enum TokeniserValue {
    Name(String),
    Spec {
        #[serde(rename = "type")]
        kind: String,
        #[serde(default)]
        min_length: Option<usize>,
    },
}

struct TokeniserHandler;

impl ConfigHandler for TokeniserHandler {
    fn key(&self) -> &str {
        "tokeniser"
    }

    fn handle(
        &self,
        pipeline: &mut FeatureExtractionPipeline,
        value: &serde_json::Value,
        _options: &[PipelineOption],
    ) -> Result<(), ConfigError> {
        let (kind, min_length) = match decode_value::<TokeniserValue>(self.key(), value)? {
            TokeniserValue::Name(kind) => (kind, None),
            TokeniserValue::Spec { kind, min_length } => (kind, min_length),
        };

        match kind.as_str() {
            "basic" => {
                let mut tokenizer = Tokenizer::new();
                if let Some(n) = min_length {
                    tokenizer = tokenizer.with_min_length(n);
                }
                pipeline.set_tokenizer(Box::new(tokenizer));
                Ok(())
            }
            other => Err(ConfigError::type_mismatch(self.key(), value)
                .with_hint(format!("Unknown tokeniser type '{other}'; known tokenisers: basic"))),
        }
    }

    fn description(&self) -> &str {
        "Assign the tokenizer (\"basic\")"
    }
}

struct LowerCaseHandler;

impl ConfigHandler for LowerCaseHandler {
    fn key(&self) -> &str {
        "lower_case"
    }

    fn handle(
        &self,
        pipeline: &mut FeatureExtractionPipeline,
        value: &serde_json::Value,
        _options: &[PipelineOption],
    ) -> Result<(), ConfigError> {
        if decode_flag(self.key(), value)? {
            pipeline.add_normaliser("lower_case", Box::new(LowerCaseNormaliser));
        }
        Ok(())
    }

    fn description(&self) -> &str {
        "Lower-case every token"
    }
}

struct RepeatedQeMarksHandler {
    exclamations: Regex,
    questions: Regex,
}

impl ConfigHandler for RepeatedQeMarksHandler {
    fn key(&self) -> &str {
        "normalise_repeated_qe_marks"
    }

    fn handle(
        &self,
        pipeline: &mut FeatureExtractionPipeline,
        value: &serde_json::Value,
        _options: &[PipelineOption],
    ) -> Result<(), ConfigError> {
        if decode_flag(self.key(), value)? {
            pipeline.add_normaliser(
                "normalise_repeated_e_marks",
                Box::new(RegexReplaceNormaliser::new(self.exclamations.clone(), "!!")),
            );
            pipeline.add_normaliser(
                "normalise_repeated_q_marks",
                Box::new(RegexReplaceNormaliser::new(self.questions.clone(), "??")),
            );
        }
        Ok(())
    }

    fn description(&self) -> &str {
        "Collapse runs of 2+ exclamation or question marks to \"!!\" and \"??\""
    }
}

struct UrlsHandler {
    pattern: Regex,
}

impl ConfigHandler for UrlsHandler {
    fn key(&self) -> &str {
        "normalise_urls"
    }

    fn handle(
        &self,
        pipeline: &mut FeatureExtractionPipeline,
        value: &serde_json::Value,
        _options: &[PipelineOption],
    ) -> Result<(), ConfigError> {
        if decode_flag(self.key(), value)? {
            pipeline.add_normaliser(
                "normalise_urls",
                Box::new(RegexReplaceNormaliser::new(self.pattern.clone(), URL_TOKEN)),
            );
        }
        Ok(())
    }

    fn description(&self) -> &str {
        "Replace URLs with a single placeholder token"
    }
}

/// Consumed by the n-gram handlers through the option list.
struct FilterPunctuationHandler;

impl ConfigHandler for FilterPunctuationHandler {
    fn key(&self) -> &str {
        "filter_punctuation"
    }

    fn handle(
        &self,
        _pipeline: &mut FeatureExtractionPipeline,
        value: &serde_json::Value,
        _options: &[PipelineOption],
    ) -> Result<(), ConfigError> {
        decode_flag(self.key(), value).map(|_| ())
    }

    fn description(&self) -> &str {
        "Exclude punctuation tokens from unigram and bigram features"
    }
}

struct UnigramsHandler;

impl ConfigHandler for UnigramsHandler {
    fn key(&self) -> &str {
        "unigrams"
    }

    fn handle(
        &self,
        pipeline: &mut FeatureExtractionPipeline,
        value: &serde_json::Value,
        options: &[PipelineOption],
    ) -> Result<(), ConfigError> {
        if decode_flag(self.key(), value)? {
            let inferrer = UnigramInferrer {
                filter_punctuation: sibling_flag(options, "filter_punctuation"),
            };
            pipeline.add_inferrer("unigrams", Box::new(inferrer));
        }
        Ok(())
    }

    fn description(&self) -> &str {
        "Add one feature per token"
    }
}

struct BigramsHandler;

impl ConfigHandler for BigramsHandler {
    fn key(&self) -> &str {
        "bigrams"
    }

    fn handle(
        &self,
        pipeline: &mut FeatureExtractionPipeline,
        value: &serde_json::Value,
        options: &[PipelineOption],
    ) -> Result<(), ConfigError> {
        if decode_flag(self.key(), value)? {
            let inferrer = BigramInferrer {
                filter_punctuation: sibling_flag(options, "filter_punctuation"),
            };
            pipeline.add_inferrer("bigrams", Box::new(inferrer));
        }
        Ok(())
    }

    fn description(&self) -> &str {
        "Add one feature per adjacent token pair"
    }
}
