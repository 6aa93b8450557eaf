//! Relation Extraction (RE) module
//!
//! Pairs geopolitical entities with the phrase they locate, using two
//! dependency patterns:
//! - attribute / direct object: `<nsubj> ... <verb> ... <GPE:attr|dobj>`
//! - prepositional object: `<head> <prep> <GPE:pobj>`

use georel_core::{dep, DependencyToken, LocatedIn, Relation, Result, GPE};

use crate::doc::Doc;
use crate::spans::dedup_spans;

/// Scan tokens in document order and emit every located-in relation.
///
/// Tokens are expected to be retokenized already, so that a multi-word place
/// or noun phrase is a single token.
pub fn extract_relations<T, I>(tokens: I) -> Vec<Relation<T>>
where
    T: DependencyToken,
    I: IntoIterator<Item = T>,
{
    tokens
        .into_iter()
        .filter(|token| token.entity_type() == GPE)
        .filter_map(match_location)
        .collect()
}

fn match_location<T: DependencyToken>(location: T) -> Option<Relation<T>> {
    let relation = location.dependency_relation();

    if relation == dep::ATTR || relation == dep::DOBJ {
        // First subject among the verb's left-dependents
        let subject = location
            .head()
            .lefts()
            .find(|w| w.dependency_relation() == dep::NSUBJ)?;
        return Some(Relation::new(subject, location));
    }

    if relation == dep::POBJ {
        let prep = location.head();
        if prep.dependency_relation() == dep::PREP {
            return Some(Relation::new(prep.head(), location));
        }
    }

    None
}

/// Merge entities and noun chunks of `doc` into single tokens.
///
/// Overlapping spans are resolved with [`dedup_spans`] first.
pub fn merge_entities_and_chunks(doc: &Doc) -> Result<Doc> {
    let candidates = doc.ents().iter().chain(doc.noun_chunks());
    let spans = dedup_spans(candidates);
    tracing::debug!(
        ents = doc.ents().len(),
        noun_chunks = doc.noun_chunks().len(),
        merged = spans.len(),
        "resolved spans for retokenization"
    );
    doc.retokenize(&spans)
}

/// Retokenize `doc` and extract its located-in relations as owned records
pub fn extract_location_relations(doc: &Doc) -> Result<Vec<LocatedIn>> {
    let merged = merge_entities_and_chunks(doc)?;
    let relations: Vec<LocatedIn> = extract_relations(merged.tokens())
        .iter()
        .map(Relation::to_located_in)
        .collect();

    tracing::debug!(
        tokens = merged.len(),
        relations = relations.len(),
        "extracted location relations"
    );
    Ok(relations)
}

// ============================================================================
// Tests
// ============================================================================
