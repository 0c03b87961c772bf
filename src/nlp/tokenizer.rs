//! Unicode-aware tokenization
//!
//! This module provides UAX #29 word segmentation tuned for short social-media
//! style text: URLs stay whole, and runs of the same punctuation character
//! (`"!!!"`, `"???"`) become a single token so normalisers can see them.

use unicode_segmentation::UnicodeSegmentation;

use crate::pipeline::traits::Tokenize;
use crate::types::{AnnotatedToken, Document, Instance};

/// A Unicode-aware tokenizer following UAX #29
#[derive(Debug, Clone)]
pub struct Tokenizer {
    /// Minimum token length (in chars) to keep
    min_token_length: usize,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer {
    /// Create a new tokenizer with default settings
    pub fn new() -> Self {
        Self {
            min_token_length: 1,
        }
    }

    /// Set minimum token length
    pub fn with_min_length(mut self, min_length: usize) -> Self {
        self.min_token_length = min_length.max(1);
        self
    }

    /// Minimum token length in chars
    /// Tokenize text into annotated tokens with byte offsets
    pub fn tokenize_text(&self, text: &str) -> Vec<AnnotatedToken> {
        let mut tokens = Vec::new();

        for (chunk_start, chunk) in whitespace_chunks(text) {
            // Word bounds would split a URL apart.
            if Self::is_url(chunk) {
                self.push(&mut tokens, chunk, chunk_start);
                continue;
            }

            let mut run: Option<(usize, usize, char)> = None;
            for (offset, segment) in chunk.split_word_bound_indices() {
                let start = chunk_start + offset;
                let single_punct = single_punctuation_char(segment);

                match (run, single_punct) {
                    (Some((run_start, run_end, c)), Some(p)) if c == p && run_end == start => {
                        run = Some((run_start, start + segment.len(), c));
                    }
                    _ => {
                        if let Some((run_start, run_end, _)) = run.take() {
                            self.push(&mut tokens, &text[run_start..run_end], run_start);
                        }
                        match single_punct {
                            Some(p) => run = Some((start, start + segment.len(), p)),
                            None => self.push(&mut tokens, segment, start),
                        }
                    }
                }
            }
            if let Some((run_start, run_end, _)) = run {
                self.push(&mut tokens, &text[run_start..run_end], run_start);
            }
        }

        tokens
    }

    fn push(&self, tokens: &mut Vec<AnnotatedToken>, form: &str, start: usize) {
        if form.chars().count() < self.min_token_length {
            return;
        }
        tokens.push(AnnotatedToken::new(form, start, start + form.len()));
    }

    /// Check if a whitespace-delimited chunk looks like a URL
    pub fn is_url(chunk: &str) -> bool {
        let lower = chunk.to_lowercase();
        (lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("www."))
            && chunk.len() > 7
    }
}

impl Tokenize for Tokenizer {
    fn tokenize(&self, instance: &Instance) -> Document {
        Document::from_tokens(self.tokenize_text(&instance.text), Some(instance.clone()))
    }
}

/// Split text on whitespace, keeping the byte offset of each chunk.
fn whitespace_chunks(text: &str) -> impl Iterator<Item = (usize, &str)> + '_ {
    let mut chars = text.char_indices().peekable();
    std::iter::from_fn(move || {
        while chars.next_if(|&(_, c)| c.is_whitespace()).is_some() {}
        let &(start, _) = chars.peek()?;
        while chars.next_if(|&(_, c)| !c.is_whitespace()).is_some() {}
        let end = chars.peek().map_or(text.len(), |&(i, _)| i);
        Some((start, &text[start..end]))
    })
}

/// The character of a one-char, non-alphanumeric, non-space segment.
fn single_punctuation_char(segment: &str) -> Option<char> {
    let mut chars = segment.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if !c.is_alphanumeric() && !c.is_whitespace() => Some(c),
        _ => None,
    }
}
