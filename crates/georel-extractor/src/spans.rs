//! Span deduplication
//!
//! Entity and noun-chunk detectors produce spans that overlap freely. Before
//! they can be merged into single tokens they must be reduced to a set in
//! which no two spans share a token.

use std::cmp::Reverse;
use std::collections::HashSet;

use georel_core::TokenRange;

/// Filter spans so that none of the survivors overlap.
///
/// Longer spans win; among spans of equal length the one starting first
/// wins, and identical ranges keep the one that came first in `spans`. The
/// result is ordered by `start`.
///
/// A span is rejected when its first or last token is already claimed. For
/// contiguous ranges visited longest-first that is enough to rule out any
/// interior overlap, so the interior is not inspected.
pub fn dedup_spans<S: TokenRange>(spans: impl IntoIterator<Item = S>) -> Vec<S> {
    let mut sorted: Vec<S> = spans.into_iter().collect();
    sorted.sort_by_key(|span| (Reverse(span.len()), span.start()));

    let mut claimed: HashSet<usize> = HashSet::new();
    let mut result = Vec::with_capacity(sorted.len());

    for span in sorted {
        // end is exclusive, so the last covered token is end - 1
        let last = span.end().saturating_sub(1);
        if claimed.contains(&span.start()) || claimed.contains(&last) {
            continue;
        }
        claimed.extend(span.start()..span.end());
        result.push(span);
    }

    result.sort_by_key(|span| span.start());
    result
}
