
use tracing::debug;

use crate::config::ChunkingConfig;

/// How far back from the nominal end the boundary search begins
const BOUNDARY_LOOKBEHIND: usize = 100;
/// How far past the nominal end a sentence boundary may be to snap to it
const SENTENCE_MARGIN: usize = 100;

/// Split a document body into overlapping chunks for embedding.
///
/// Chunks are sliced on a character budget, with the cut point nudged forward
/// to the nearest paragraph break or sentence end when one is close, so a
/// sentence is not severed mid-thought. Consecutive chunks share `overlap`
/// characters; concatenated, the chunks cover the full input with no gaps.
/// Deterministic for identical input.
#[inline]
pub fn split_into_chunks(text: &str, config: &ChunkingConfig) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    if text.len() <= config.chunk_size {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let nominal_end = floor_char_boundary(text, start + config.chunk_size);
        let end = if nominal_end < text.len() {
            adjust_to_natural_boundary(text, nominal_end, config.boundary_margin)
        } else {
            text.len()
        };

        if let Some(chunk) = text.get(start..end) {
            chunks.push(chunk.to_string());
        }

        if end >= text.len() {
            break;
        }

        // Advance past the overlap; the guard keeps progress monotone even
        // with degenerate configurations
        let next = end.saturating_sub(config.overlap).max(start + 1);
        start = ceil_char_boundary(text, next);
    }

    debug!(
        "Split {} chars into {} chunks (size {}, overlap {})",
        text.len(),
        chunks.len(),
        config.chunk_size,
        config.overlap
    );

    chunks
}

/// Nudge a cut point forward onto a paragraph break or sentence end.
///
/// A paragraph break (`\n\n`) within `margin` past the nominal end wins;
/// otherwise a sentence end (`. `) within a smaller window. Both searches
/// start a little before the nominal end, so a boundary just short of the
/// budget is preferred over a hard cut.
fn adjust_to_natural_boundary(text: &str, nominal_end: usize, margin: usize) -> usize {
    let search_from = floor_char_boundary(text, nominal_end.saturating_sub(BOUNDARY_LOOKBEHIND));
    let window = text.get(search_from..).unwrap_or_default();

    if let Some(pos) = window.find("\n\n") {
        let boundary = search_from + pos;
        if boundary > 0 && boundary < nominal_end + margin {
            return (boundary + 2).min(text.len());
        }
    }

    if let Some(pos) = window.find(". ") {
        let boundary = search_from + pos;
        if boundary > 0 && boundary < nominal_end + SENTENCE_MARGIN {
            return (boundary + 2).min(text.len());
        }
    }

    nominal_end
}

/// Largest char boundary at or below `index`
fn floor_char_boundary(text: &str, index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    let mut index = index;
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Smallest char boundary at or above `index`
fn ceil_char_boundary(text: &str, index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    let mut index = index;
    while !text.is_char_boundary(index) {
        index += 1;
    }
    index
}
