//! georel Core - Domain types, traits, and shared errors
//!
//! This crate defines the abstractions shared by the extraction pipeline:
//! - Token spans and the `TokenRange` accessor trait
//! - The `DependencyToken` view over an annotated token
//! - Located-in relations and their rendered form
//! - Common error types
//! - Configuration management

pub mod config;

pub use config::{AppConfig, ConfigError, LogFormat, LoggingConfig, PipelineConfig};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for georel operations
#[derive(Error, Debug)]
pub enum GeorelError {
    #[error("Model '{name}' not found at {path}")]
    ModelNotFound { name: String, path: PathBuf },

    #[error("Invalid model '{name}': {reason}")]
    InvalidModel { name: String, reason: String },

    #[error("Invalid annotation: {0}")]
    InvalidAnnotation(String),

    #[error("Model '{model}' has no annotation for text: {text:?}")]
    UnannotatedText { model: String, text: String },

    #[error("Retokenization failed: {0}")]
    Retokenize(String),
}

pub type Result<T> = std::result::Result<T, GeorelError>;

// ============================================================================
// Labels
// ============================================================================

/// Entity label for geopolitical entities (countries, cities, states)
pub const GPE: &str = "GPE";

/// Dependency relation labels consulted by the relation patterns
pub mod dep {
    /// Attribute
    pub const ATTR: &str = "attr";
    /// Direct object
    pub const DOBJ: &str = "dobj";
    /// Nominal subject
    pub const NSUBJ: &str = "nsubj";
    /// Object of a preposition
    pub const POBJ: &str = "pobj";
    /// Preposition
    pub const PREP: &str = "prep";
}

// ============================================================================
// Spans
// ============================================================================

/// Anything that covers a half-open `[start, end)` range of token indices
pub trait TokenRange {
    fn start(&self) -> usize;
    fn end(&self) -> usize;

    /// Number of tokens covered
    fn len(&self) -> usize {
        self.end().saturating_sub(self.start())
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether two ranges share at least one token index
    fn overlaps<R: TokenRange + ?Sized>(&self, other: &R) -> bool {
        self.start() < other.end() && other.start() < self.end()
    }
}

/// Contiguous range of tokens, such as an entity or a noun chunk
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,

    /// Entity label; `None` for unlabelled spans such as noun chunks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Span {
    /// Create an unlabelled span
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            label: None,
        }
    }

    /// Create a span carrying an entity label
    pub fn labeled(start: usize, end: usize, label: impl Into<String>) -> Self {
        Self {
            start,
            end,
            label: Some(label.into()),
        }
    }
}

impl TokenRange for Span {
    fn start(&self) -> usize {
        self.start
    }

    fn end(&self) -> usize {
        self.end
    }
}

impl<R: TokenRange + ?Sized> TokenRange for &R {
    fn start(&self) -> usize {
        (**self).start()
    }

    fn end(&self) -> usize {
        (**self).end()
    }
}

// ============================================================================
// Tokens
// ============================================================================

/// Read-only view of one annotated token in a dependency parse.
///
/// Implementors are cheap handles into a document owned elsewhere, so `head`
/// and `lefts` hand out new handles rather than references. The root of a
/// sentence is its own head.
pub trait DependencyToken: Sized {
    /// Iterator over the token's syntactic left-dependents
    type Lefts: Iterator<Item = Self>;

    fn text(&self) -> &str;

    /// Entity label, empty when the token is not part of an entity
    fn entity_type(&self) -> &str;

    /// Dependency label relative to `head()`
    fn dependency_relation(&self) -> &str;

    fn head(&self) -> Self;

    /// Left-dependents in document order. Each call starts a fresh iteration.
    fn lefts(&self) -> Self::Lefts;
}

// ============================================================================
// Relations
// ============================================================================

/// A located-in pair: `anchor` is a subject or the head of a prepositional
/// phrase, `location` is a GPE-labelled token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relation<T> {
    pub anchor: T,
    pub location: T,
}

impl<T: DependencyToken> Relation<T> {
    pub fn new(anchor: T, location: T) -> Self {
        Self { anchor, location }
    }

    /// Detach the relation from the token handles it borrows from
    pub fn to_located_in(&self) -> LocatedIn {
        LocatedIn {
            anchor: self.anchor.text().to_string(),
            label: self.location.entity_type().to_string(),
            location: self.location.text().to_string(),
        }
    }
}

/// Owned, printable form of a [`Relation`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatedIn {
    pub anchor: String,
    pub label: String,
    pub location: String,
}

impl std::fmt::Display for LocatedIn {
    /// `<anchor left-aligned in 10 columns>\t<label>\t<location>`
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:<10}\t{}\t{}", self.anchor, self.label, self.location)
    }
}
