//! Span Normalizer: flattens one entity into subtype-tagged pieces.
//!
//! A `Piece` is derived fresh per render pass; it is never persisted. The
//! (entity_index, piece_index) pair is the stable identity the UI layer uses
//! for element ids and click binding.

use serde::{Deserialize, Serialize};

use crate::model::{BoundingBox, SoftwareEntity, SubSpan};

/// Which sub-attribute of the entity a piece was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceSubtype {
    Software,
    Version,
    Url,
    Publisher,
    Language,
    Reference,
}

impl PieceSubtype {
    /// CSS class used by the host page to color the overlay.
    pub fn css_class(&self) -> &'static str {
        match self {
            PieceSubtype::Software => "software",
            PieceSubtype::Version => "version",
            PieceSubtype::Url => "url",
            PieceSubtype::Publisher => "publisher",
            PieceSubtype::Language => "language",
            PieceSubtype::Reference => "reference",
        }
    }
}

/// Text anchor of a piece, in UTF-16 code units of the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSpan {
    pub start: i64,
    pub end: i64,
}

/// A normalized, subtype-tagged span derived from one entity sub-attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Piece {
    pub subtype: PieceSubtype,
    pub raw_form: String,
    /// Absent for reference callouts whose record carries no text offsets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<TextSpan>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bounding_boxes: Vec<BoundingBox>,
    pub entity_index: usize,
    pub piece_index: usize,
}

fn span_piece(
    sub: &SubSpan,
    subtype: PieceSubtype,
    entity_index: usize,
    piece_index: usize,
) -> Piece {
    Piece {
        subtype,
        raw_form: sub.raw_form.clone(),
        span: Some(TextSpan {
            start: sub.offset_start,
            end: sub.offset_end,
        }),
        bounding_boxes: sub.bounding_boxes.clone(),
        entity_index,
        piece_index,
    }
}

/// Flatten one entity into its ordered piece list.
///
/// The primary name span always comes first, then the optional attribute
/// spans in fixed discovery order, then one piece per reference callout.
/// No offset ordering is imposed here; that is the compositor's job.
pub fn normalize(entity: &SoftwareEntity, entity_index: usize) -> Vec<Piece> {
    let mut pieces = Vec::new();

    pieces.push(span_piece(
        &entity.software_name,
        PieceSubtype::Software,
        entity_index,
        0,
    ));

    let attributes = [
        (&entity.version, PieceSubtype::Version),
        (&entity.url, PieceSubtype::Url),
        (&entity.publisher, PieceSubtype::Publisher),
        (&entity.language, PieceSubtype::Language),
    ];
    for (sub, subtype) in attributes {
        if let Some(sub) = sub {
            let idx = pieces.len();
            pieces.push(span_piece(sub, subtype, entity_index, idx));
        }
    }

    for reference in &entity.references {
        let idx = pieces.len();
        let span = match (reference.offset_start, reference.offset_end) {
            (Some(start), Some(end)) => Some(TextSpan { start, end }),
            _ => None,
        };
        pieces.push(Piece {
            subtype: PieceSubtype::Reference,
            raw_form: reference.display_form(),
            span,
            bounding_boxes: reference.bounding_boxes.clone(),
            entity_index,
            piece_index: idx,
        });
    }

    pieces
}
