//! Annotated documents
//!
//! A [`Doc`] owns the tokens of one processed text together with its entity
//! and noun-chunk spans. Heads are stored as indices into the token arena;
//! [`TokenRef`] is the borrowed handle that exposes a token through the
//! [`DependencyToken`] trait.

use serde::{Deserialize, Serialize};

use georel_core::{DependencyToken, GeorelError, Result, Span, TokenRange};

// ============================================================================
// Token storage
// ============================================================================

/// One token as stored in a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenData {
    pub text: String,

    /// Whitespace following the token in the original text
    #[serde(default = "default_whitespace")]
    pub whitespace: String,

    /// Dependency label relative to `head`
    pub dep: String,

    /// Index of the syntactic head; a root points at itself
    pub head: usize,

    /// Entity label, empty outside entities
    #[serde(default)]
    pub ent_type: String,
}

fn default_whitespace() -> String {
    " ".to_string()
}

impl TokenData {
    pub fn new(text: impl Into<String>, dep: impl Into<String>, head: usize) -> Self {
        Self {
            text: text.into(),
            whitespace: default_whitespace(),
            dep: dep.into(),
            head,
            ent_type: String::new(),
        }
    }

    pub fn with_ent_type(mut self, ent_type: impl Into<String>) -> Self {
        self.ent_type = ent_type.into();
        self
    }

    pub fn with_whitespace(mut self, whitespace: impl Into<String>) -> Self {
        self.whitespace = whitespace.into();
        self
    }
}

// ============================================================================
// Doc
// ============================================================================

/// A processed text: tokens with their dependency parse, entities and noun
/// chunks
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Doc {
    text: String,
    tokens: Vec<TokenData>,
    ents: Vec<Span>,
    noun_chunks: Vec<Span>,
}

impl Doc {
    /// Build a document, checking that every head and span points inside it
    pub fn new(
        text: impl Into<String>,
        tokens: Vec<TokenData>,
        ents: Vec<Span>,
        noun_chunks: Vec<Span>,
    ) -> Result<Self> {
        let n = tokens.len();

        for (i, token) in tokens.iter().enumerate() {
            if token.head >= n {
                return Err(GeorelError::InvalidAnnotation(format!(
                    "token {} ({:?}) has head {} outside a document of {} tokens",
                    i, token.text, token.head, n
                )));
            }
        }

        for (kind, spans) in [("entity", &ents), ("noun chunk", &noun_chunks)] {
            if let Some(span) = spans.iter().find(|s| s.start >= s.end || s.end > n) {
                return Err(GeorelError::InvalidAnnotation(format!(
                    "{} span [{}, {}) is empty or outside a document of {} tokens",
                    kind, span.start, span.end, n
                )));
            }
        }

        Ok(Self {
            text: text.into(),
            tokens,
            ents,
            noun_chunks,
        })
    }

    /// Document with no tokens
    pub fn empty(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// The text this document was produced from
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn token(&self, i: usize) -> Option<TokenRef<'_>> {
        (i < self.tokens.len()).then_some(TokenRef { doc: self, i })
    }

    /// All tokens in document order
    pub fn tokens(&self) -> impl Iterator<Item = TokenRef<'_>> + '_ {
        (0..self.tokens.len()).map(move |i| TokenRef { doc: self, i })
    }

    /// Entity spans
    pub fn ents(&self) -> &[Span] {
        &self.ents
    }

    /// Noun-chunk spans
    pub fn noun_chunks(&self) -> &[Span] {
        &self.noun_chunks
    }

    /// Number of head hops from token `i` up to its sentence root.
    /// Malformed head cycles are cut off after one pass over the document.
    fn depth(&self, i: usize) -> usize {
        let mut current = i;
        let mut depth = 0;
        while self.tokens[current].head != current && depth < self.tokens.len() {
            current = self.tokens[current].head;
            depth += 1;
        }
        depth
    }

    /// Return a copy of this document in which every span is merged into a
    /// single token.
    ///
    /// Spans must lie inside the document and must not overlap each other;
    /// their order does not matter. The merged token takes its dependency
    /// label, head and entity label from the span root: the member closest
    /// to the sentence root, the earliest one on ties.
    pub fn retokenize<S: TokenRange>(&self, spans: &[S]) -> Result<Doc> {
        let n = self.tokens.len();

        let mut merges: Vec<(usize, usize)> = spans.iter().map(|s| (s.start(), s.end())).collect();
        merges.sort_unstable();

        for &(start, end) in &merges {
            if start >= end || end > n {
                return Err(GeorelError::Retokenize(format!(
                    "span [{}, {}) is empty or outside a document of {} tokens",
                    start, end, n
                )));
            }
        }
        if let Some(pair) = merges.windows(2).find(|pair| pair[1].0 < pair[0].1) {
            return Err(GeorelError::Retokenize(format!(
                "spans [{}, {}) and [{}, {}) overlap",
                pair[0].0, pair[0].1, pair[1].0, pair[1].1
            )));
        }

        // Old index -> new index. Every member of a merged span maps to the
        // position of the merged token.
        let mut new_index = vec![0usize; n];
        let mut span_of = vec![None; n];
        let mut next = 0;
        let mut pending = merges.iter().peekable();
        let mut i = 0;
        while i < n {
            match pending.peek() {
                Some(&&(start, end)) if start == i => {
                    new_index[start..end].fill(next);
                    span_of[start..end].fill(Some((start, end)));
                    pending.next();
                    i = end;
                }
                _ => {
                    new_index[i] = next;
                    i += 1;
                }
            }
            next += 1;
        }

        let mut tokens = Vec::with_capacity(next);
        let mut i = 0;
        while i < n {
            match span_of[i] {
                Some((start, end)) => {
                    let members = &self.tokens[start..end];
                    let root = (start..end)
                        .min_by_key(|&j| self.depth(j))
                        .unwrap_or(start);
                    let root_token = &self.tokens[root];

                    tracing::trace!(start, end, root, "merging span");
                    tokens.push(TokenData {
                        text: join_tokens(members),
                        whitespace: members
                            .last()
                            .map(|t| t.whitespace.clone())
                            .unwrap_or_default(),
                        dep: root_token.dep.clone(),
                        head: new_index[root_token.head],
                        ent_type: root_token.ent_type.clone(),
                    });
                    i = end;
                }
                None => {
                    let token = &self.tokens[i];
                    tokens.push(TokenData {
                        head: new_index[token.head],
                        ..token.clone()
                    });
                    i += 1;
                }
            }
        }

        let remap = |span: &Span| Span {
            start: new_index[span.start],
            end: new_index[span.end - 1] + 1,
            label: span.label.clone(),
        };

        Ok(Doc {
            text: self.text.clone(),
            tokens,
            ents: self.ents.iter().map(remap).collect(),
            noun_chunks: self.noun_chunks.iter().map(remap).collect(),
        })
    }
}

/// Concatenate tokens with their inner whitespace, dropping the trailing one
fn join_tokens(tokens: &[TokenData]) -> String {
    let mut text = String::new();
    for (k, token) in tokens.iter().enumerate() {
        text.push_str(&token.text);
        if k + 1 < tokens.len() {
            text.push_str(&token.whitespace);
        }
    }
    text
}

// ============================================================================
// Token handles
// ============================================================================

/// Borrowed handle to one token of a [`Doc`]
#[derive(Clone, Copy)]
pub struct TokenRef<'doc> {
    doc: &'doc Doc,
    i: usize,
}

impl<'doc> TokenRef<'doc> {
    fn data(&self) -> &'doc TokenData {
        &self.doc.tokens[self.i]
    }
}

impl PartialEq for TokenRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.doc, other.doc) && self.i == other.i
    }
}

impl Eq for TokenRef<'_> {}

impl std::fmt::Debug for TokenRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenRef")
            .field("i", &self.i)
            .field("text", &self.data().text)
            .field("dep", &self.data().dep)
            .field("ent_type", &self.data().ent_type)
            .finish()
    }
}

impl std::fmt::Display for TokenRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.data().text)
    }
}

impl<'doc> DependencyToken for TokenRef<'doc> {
    type Lefts = Lefts<'doc>;

    fn text(&self) -> &str {
        &self.data().text
    }

    fn entity_type(&self) -> &str {
        &self.data().ent_type
    }

    fn dependency_relation(&self) -> &str {
        &self.data().dep
    }

    fn head(&self) -> Self {
        TokenRef {
            doc: self.doc,
            i: self.data().head,
        }
    }

    fn lefts(&self) -> Lefts<'doc> {
        Lefts {
            doc: self.doc,
            head: self.i,
            next: 0,
        }
    }
}

/// Lazy iterator over the left-dependents of a token
#[derive(Debug, Clone)]
pub struct Lefts<'doc> {
    doc: &'doc Doc,
    head: usize,
    next: usize,
}

impl<'doc> Iterator for Lefts<'doc> {
    type Item = TokenRef<'doc>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.next < self.head {
            let i = self.next;
            self.next += 1;
            if self.doc.tokens[i].head == self.head {
                return Some(TokenRef { doc: self.doc, i });
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// "Sales offices and research lab in Springfield, MO"
    fn springfield() -> Doc {
        let tokens = vec![
            TokenData::new("Sales", "compound", 1),
            TokenData::new("offices", "ROOT", 1),
            TokenData::new("and", "cc", 1),
            TokenData::new("research", "compound", 4),
            TokenData::new("lab", "conj", 1),
            TokenData::new("in", "prep", 4),
            TokenData::new("Springfield", "pobj", 5)
                .with_ent_type("GPE")
                .with_whitespace(""),
            TokenData::new(",", "punct", 6).with_ent_type("GPE"),
            TokenData::new("MO", "appos", 6)
                .with_ent_type("GPE")
                .with_whitespace(""),
        ];
        Doc::new(
            "Sales offices and research lab in Springfield, MO",
            tokens,
            vec![Span::labeled(6, 9, "GPE")],
            vec![Span::new(0, 2), Span::new(3, 5), Span::new(6, 7), Span::new(8, 9)],
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_dangling_head() {
        let tokens = vec![TokenData::new("a", "ROOT", 0), TokenData::new("b", "dep", 7)];
        let err = Doc::new("a b", tokens, vec![], vec![]).unwrap_err();
        assert!(matches!(err, GeorelError::InvalidAnnotation(_)));
    }

    #[test]
    fn test_new_rejects_bad_span() {
        let tokens = vec![TokenData::new("a", "ROOT", 0)];
        let err = Doc::new("a", tokens.clone(), vec![Span::new(0, 2)], vec![]).unwrap_err();
        assert!(matches!(err, GeorelError::InvalidAnnotation(_)));

        let err = Doc::new("a", tokens, vec![], vec![Span::new(1, 1)]).unwrap_err();
        assert!(matches!(err, GeorelError::InvalidAnnotation(_)));
    }

    #[test]
    fn test_head_and_lefts() {
        let doc = springfield();
        let lab = doc.token(4).unwrap();
        assert_eq!(lab.head().text(), "offices");
        assert_eq!(lab.head().head().i, 1);

        let lefts: Vec<&str> = lab.lefts().map(|t| t.data().text.as_str()).collect();
        assert_eq!(lefts, vec!["research"]);

        let offices = doc.token(1).unwrap();
        let lefts: Vec<usize> = offices.lefts().map(|t| t.i).collect();
        assert_eq!(lefts, vec![0]);
    }

    #[test]
    fn test_lefts_is_restartable() {
        let doc = springfield();
        let offices = doc.token(1).unwrap();
        assert_eq!(offices.lefts().count(), 1);
        assert_eq!(offices.lefts().count(), 1);
    }

    #[test]
    fn test_retokenize_merges_spans() {
        let doc = springfield();
        let merged = doc
            .retokenize(&[Span::new(0, 2), Span::new(3, 5), Span::new(6, 9)])
            .unwrap();

        let texts: Vec<String> = merged.tokens().map(|t| t.to_string()).collect();
        assert_eq!(
            texts,
            vec!["Sales offices", "and", "research lab", "in", "Springfield, MO"]
        );

        let place = merged.token(4).unwrap();
        assert_eq!(place.entity_type(), "GPE");
        assert_eq!(place.dependency_relation(), "pobj");
        assert_eq!(place.head().text(), "in");
        assert_eq!(place.head().head().text(), "research lab");
        assert_eq!(place.data().whitespace, "");

        let lab = merged.token(2).unwrap();
        assert_eq!(lab.dependency_relation(), "conj");
        assert_eq!(lab.head().i, 0);
        let offices = merged.token(0).unwrap();
        assert_eq!(offices.head().i, offices.i);
    }

    #[test]
    fn test_retokenize_root_is_shallowest_member() {
        // x -> z -> R and y -> R: merging "x y" must take y as the root
        let tokens = vec![
            TokenData::new("x", "amod", 2),
            TokenData::new("y", "nsubj", 3),
            TokenData::new("z", "npadvmod", 3),
            TokenData::new("R", "ROOT", 3),
        ];
        let doc = Doc::new("x y z R", tokens, vec![], vec![]).unwrap();

        let merged = doc.retokenize(&[Span::new(0, 2)]).unwrap();
        let xy = merged.token(0).unwrap();
        assert_eq!(xy.text(), "x y");
        assert_eq!(xy.dependency_relation(), "nsubj");
        assert_eq!(xy.head().text(), "R");
        assert_eq!(merged.token(1).unwrap().head().text(), "R");
    }

    #[test]
    fn test_retokenize_tolerates_head_cycle() {
        let tokens = vec![
            TokenData::new("a", "dep", 1),
            TokenData::new("b", "dep", 0),
            TokenData::new("c", "ROOT", 2),
        ];
        let doc = Doc::new("a b c", tokens, vec![], vec![]).unwrap();

        let merged = doc.retokenize(&[Span::new(0, 2)]).unwrap();
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.token(0).unwrap().text(), "a b");
    }

    #[test]
    fn test_retokenize_remaps_spans() {
        let doc = springfield();
        let merged = doc.retokenize(&[Span::new(6, 9), Span::new(0, 2)]).unwrap();

        assert_eq!(merged.len(), 6);
        assert_eq!(merged.ents(), &[Span::labeled(5, 6, "GPE")]);
        assert_eq!(
            merged.noun_chunks(),
            &[Span::new(0, 1), Span::new(2, 4), Span::new(5, 6), Span::new(5, 6)]
        );
        assert_eq!(merged.text(), doc.text());
    }

    #[test]
    fn test_retokenize_leaves_source_untouched() {
        let doc = springfield();
        let before = doc.clone();
        let _ = doc.retokenize(&[Span::new(6, 9)]).unwrap();
        assert_eq!(doc, before);
    }

    #[test]
    fn test_retokenize_rejects_overlap() {
        let doc = springfield();
        let err = doc.retokenize(&[Span::new(0, 3), Span::new(2, 4)]).unwrap_err();
        assert!(matches!(err, GeorelError::Retokenize(_)));
    }

    #[test]
    fn test_retokenize_rejects_out_of_bounds() {
        let doc = springfield();
        let err = doc.retokenize(&[Span::new(8, 10)]).unwrap_err();
        assert!(matches!(err, GeorelError::Retokenize(_)));
    }

    #[test]
    fn test_retokenize_without_spans_is_identity() {
        let doc = springfield();
        let spans: [Span; 0] = [];
        assert_eq!(doc.retokenize(&spans).unwrap(), doc);
    }

    #[test]
    fn test_empty_doc() {
        let doc = Doc::empty("");
        assert!(doc.is_empty());
        assert_eq!(doc.tokens().count(), 0);
        assert!(doc.token(0).is_none());
    }
}
