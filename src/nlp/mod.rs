//! Text processing used by the built-in pipeline stages.

pub mod tokenizer;
