//! Annotation models
//!
//! A model is a JSON file of pre-annotated documents named `<model>.json`
//! inside the configured model directory. Loading validates every document,
//! and processing a text looks its annotation up.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use georel_core::{GeorelError, PipelineConfig, Result, Span};

use crate::doc::{Doc, TokenData};
use crate::Pipeline;

/// On-disk layout of a model file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelFile {
    /// Model name; defaults to the file stem when omitted
    #[serde(default)]
    pub name: Option<String>,

    pub documents: Vec<AnnotatedDocument>,
}

/// One annotated text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotatedDocument {
    pub text: String,
    pub tokens: Vec<TokenData>,
    #[serde(default)]
    pub ents: Vec<Span>,
    #[serde(default)]
    pub noun_chunks: Vec<Span>,
}

/// Pipeline backed by a file of pre-annotated documents
#[derive(Debug, Clone)]
pub struct AnnotatedModel {
    name: String,
    documents: HashMap<String, Doc>,
}

impl AnnotatedModel {
    /// Load the model named in `config` from its model directory
    pub fn load(config: &PipelineConfig) -> Result<Self> {
        let path = config.model_path();
        if !path.is_file() {
            return Err(GeorelError::ModelNotFound {
                name: config.model.clone(),
                path,
            });
        }

        let model = Self::from_path(&config.model, &path)?;
        tracing::info!(
            model = %model.name,
            path = %path.display(),
            documents = model.len(),
            "loaded annotation model"
        );
        Ok(model)
    }

    fn from_path(name: &str, path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| GeorelError::InvalidModel {
            name: name.to_string(),
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let file: ModelFile =
            serde_json::from_str(&content).map_err(|e| GeorelError::InvalidModel {
                name: name.to_string(),
                reason: e.to_string(),
            })?;

        Self::from_model_file(name, file)
    }

    /// Build a model from an already parsed model file
    pub fn from_model_file(name: &str, file: ModelFile) -> Result<Self> {
        let model_name = file.name.unwrap_or_else(|| name.to_string());

        let mut documents = HashMap::with_capacity(file.documents.len());
        for (i, annotated) in file.documents.into_iter().enumerate() {
            let key = annotated.text.trim().to_string();
            let doc = Doc::new(
                annotated.text,
                annotated.tokens,
                annotated.ents,
                annotated.noun_chunks,
            )
            .map_err(|e| GeorelError::InvalidModel {
                name: model_name.clone(),
                reason: format!("document {}: {}", i, e),
            })?;

            if documents.insert(key, doc).is_some() {
                tracing::warn!(model = %model_name, document = i, "duplicate annotation replaced");
            }
        }

        Ok(Self {
            name: model_name,
            documents,
        })
    }

    /// Number of annotated documents the model holds
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl Pipeline for AnnotatedModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&self, text: &str) -> Result<Doc> {
        let key = text.trim();
        if key.is_empty() {
            return Ok(Doc::empty(text));
        }

        let doc = self
            .documents
            .get(key)
            .cloned()
            .ok_or_else(|| GeorelError::UnannotatedText {
                model: self.name.clone(),
                text: text.to_string(),
            })?;

        tracing::debug!(
            text = doc.text(),
            tokens = doc.len(),
            ents = doc.ents().len(),
            "processed text"
        );
        Ok(doc)
    }
}
