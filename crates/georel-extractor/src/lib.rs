//! georel Extractor - Located-in relation extraction
//!
//! Resolves overlapping entity and noun-chunk spans, merges them into single
//! tokens and matches dependency patterns that tie a geopolitical entity to
//! the phrase it locates.

use georel_core::{PipelineConfig, Result};

pub mod doc;
pub mod model;
pub mod relation;
pub mod spans;

pub use doc::{Doc, Lefts, TokenData, TokenRef};
pub use model::AnnotatedModel;
pub use relation::{extract_location_relations, extract_relations, merge_entities_and_chunks};
pub use spans::dedup_spans;

/// Trait for annotation pipelines (tokenizer, parser, entity recognizer)
pub trait Pipeline: Send + Sync {
    /// Name of the loaded model
    fn name(&self) -> &str;

    /// Annotate a text. An empty text yields an empty document.
    fn process(&self, text: &str) -> Result<Doc>;
}

/// Load the pipeline named by `config`
pub fn load(config: &PipelineConfig) -> Result<Box<dyn Pipeline>> {
    Ok(Box::new(AnnotatedModel::load(config)?))
}
