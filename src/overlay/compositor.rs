//! Text Overlay Compositor: interleaves source text with annotated spans.
//!
//! All pieces from all entities are merged into one left-to-right stream of
//! segments. A cursor walks the text; pieces that overlap an already claimed
//! range, or whose offsets do not resolve, are skipped individually and
//! reported, never allowed to abort the whole composition.

use serde::{Deserialize, Serialize};

use crate::model::SoftwareEntity;
use crate::overlay::normalizer::{normalize, Piece, PieceSubtype, TextSpan};

/// One output segment: literal text, or text carrying an annotation
/// identity for the UI layer to style and bind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Segment {
    Plain {
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    Annotated {
        text: String,
        entity_index: usize,
        piece_index: usize,
        subtype: PieceSubtype,
    },
}

/// Why a single piece was dropped from the composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Starts before the cursor: overlaps a span already claimed.
    /// First-claimed-wins is the sole overlap policy.
    Overlap,
    /// end < start, or either offset negative.
    ReversedRange,
    /// Offset past the end of the source text.
    OutOfRange,
    /// Offset lands inside a surrogate pair: the server counted offsets
    /// over a different encoding than the client holds.
    SplitSurrogate,
}

/// Record of one dropped piece, for the binding layer to log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedPiece {
    pub entity_index: usize,
    pub piece_index: usize,
    pub reason: SkipReason,
}

/// Composition statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ComposeStats {
    pub total_us: u64,
    pub text_utf16_len: usize,
    pub piece_count: usize,
    pub annotated_count: usize,
    pub skipped_count: usize,
}

/// Ordered segment stream plus skip diagnostics. Line breaks inside plain
/// segments become paragraph boundaries at render time; no paragraph logic
/// lives here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ComposedText {
    pub segments: Vec<Segment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedPiece>,
    pub stats: ComposeStats,
}

/// Maps UTF-16 code-unit positions (the wire offset space) to byte
/// positions into the UTF-8 source text.
///
/// A position addressing the low half of a surrogate pair maps to `None`:
/// such an offset cannot come from a consistent UTF-16 view of this text.
pub struct OffsetMap {
    byte_at: Vec<Option<usize>>,
}

impl OffsetMap {
    pub fn new(text: &str) -> Self {
        let mut byte_at = Vec::with_capacity(text.len() + 1);
        for (byte_idx, ch) in text.char_indices() {
            byte_at.push(Some(byte_idx));
            if ch.len_utf16() == 2 {
                byte_at.push(None);
            }
        }
        byte_at.push(Some(text.len()));
        OffsetMap { byte_at }
    }

    /// Length of the text in UTF-16 code units.
    pub fn utf16_len(&self) -> usize {
        self.byte_at.len() - 1
    }

    /// Byte index for a UTF-16 position, or `None` when the position is out
    /// of range or splits a surrogate pair.
    pub fn byte_index(&self, utf16_pos: usize) -> Option<usize> {
        self.byte_at.get(utf16_pos).copied().flatten()
    }
}

fn resolve(span: TextSpan, map: &OffsetMap) -> Result<(usize, usize, usize, usize), SkipReason> {
    if span.start < 0 || span.end < span.start {
        return Err(SkipReason::ReversedRange);
    }
    let (start, end) = (span.start as usize, span.end as usize);
    if end > map.utf16_len() {
        return Err(SkipReason::OutOfRange);
    }
    match (map.byte_index(start), map.byte_index(end)) {
        (Some(sb), Some(eb)) => Ok((start, end, sb, eb)),
        _ => Err(SkipReason::SplitSurrogate),
    }
}

/// Compose the annotated reconstruction of `source_text`.
///
/// Pieces are sorted ascending by start offset; the sort is stable, so ties
/// keep discovery order (entity index, then piece index within the entity).
pub fn compose(source_text: &str, entities: &[SoftwareEntity]) -> ComposedText {
    let started = instant::Instant::now();
    let map = OffsetMap::new(source_text);

    let pieces: Vec<Piece> = entities
        .iter()
        .enumerate()
        .flat_map(|(i, e)| normalize(e, i))
        .collect();
    let piece_count = pieces.len();

    // Pieces without a text anchor (reference callouts whose record has no
    // offsets) only feed detail views and PDF placement.
    let mut anchored: Vec<&Piece> = pieces.iter().filter(|p| p.span.is_some()).collect();
    anchored.sort_by_key(|p| p.span.map(|s| s.start).unwrap_or(i64::MAX));

    let mut segments = Vec::new();
    let mut skipped = Vec::new();
    let mut pos_utf16 = 0usize;
    let mut pos_byte = 0usize;

    for piece in anchored {
        let span = match piece.span {
            Some(span) => span,
            None => continue,
        };
        let (start, end, start_byte, end_byte) = match resolve(span, &map) {
            Ok(resolved) => resolved,
            Err(reason) => {
                skipped.push(SkippedPiece {
                    entity_index: piece.entity_index,
                    piece_index: piece.piece_index,
                    reason,
                });
                continue;
            }
        };

        if start < pos_utf16 {
            // the server should never produce this; first claim wins
            skipped.push(SkippedPiece {
                entity_index: piece.entity_index,
                piece_index: piece.piece_index,
                reason: SkipReason::Overlap,
            });
            continue;
        }

        if start > pos_utf16 {
            segments.push(Segment::Plain {
                text: source_text[pos_byte..start_byte].to_string(),
            });
        }
        segments.push(Segment::Annotated {
            text: source_text[start_byte..end_byte].to_string(),
            entity_index: piece.entity_index,
            piece_index: piece.piece_index,
            subtype: piece.subtype,
        });
        pos_utf16 = end;
        pos_byte = end_byte;
    }

    if pos_byte < source_text.len() {
        segments.push(Segment::Plain {
            text: source_text[pos_byte..].to_string(),
        });
    }

    let annotated_count = segments
        .iter()
        .filter(|s| matches!(s, Segment::Annotated { .. }))
        .count();

    ComposedText {
        stats: ComposeStats {
            total_us: started.elapsed().as_micros() as u64,
            text_utf16_len: map.utf16_len(),
            piece_count,
            annotated_count,
            skipped_count: skipped.len(),
        },
        segments,
        skipped,
    }
}
