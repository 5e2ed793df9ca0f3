//! Wire data model for software-mention entities.
//!
//! Field names follow the annotation service's JSON (camelCase, with the
//! primary name span under `software-name`). Every optional key is modeled
//! as an explicit `Option` rather than probed dynamically.

use serde::{Deserialize, Serialize};

/// A rectangle locating a mention occurrence on a PDF page.
///
/// PDF coordinate space: units are points (1/72 inch), origin per the
/// producing service, `p` is the 1-based page number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub p: u32,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

/// One annotated sub-span of a mention: the software name itself, or an
/// attached attribute (version, url, publisher, language).
///
/// `offset_start`/`offset_end` are UTF-16 code-unit positions into the
/// source text the entity list was derived from. They are kept signed so a
/// malformed (negative) offset deserializes and is rejected downstream
/// instead of failing the whole response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubSpan {
    #[serde(default)]
    pub raw_form: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalized_form: Option<String>,
    pub offset_start: i64,
    pub offset_end: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bounding_boxes: Vec<BoundingBox>,
}

/// A bibliographic reference callout attached to a mention, e.g. "[12]".
///
/// When the callout itself appears in the text, it carries offsets and
/// bounding boxes like any other sub-span; the bibliographic record behind
/// it is resolved against the response's top-level reference list via
/// `ref_key`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MentionReference {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub ref_key: Option<i64>,
    #[serde(default)]
    pub raw_form: Option<String>,
    #[serde(default)]
    pub offset_start: Option<i64>,
    #[serde(default)]
    pub offset_end: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bounding_boxes: Vec<BoundingBox>,
}

impl MentionReference {
    /// The form to display: `raw_form`, falling back to `label`, falling
    /// back to the empty string when both are absent (a data error that
    /// must not fail the render).
    pub fn display_form(&self) -> String {
        self.raw_form
            .clone()
            .or_else(|| self.label.clone())
            .unwrap_or_default()
    }
}

/// A single classified usage attribute with its classifier score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContextAttribute {
    pub value: bool,
    pub score: f64,
}

/// Usage context classification (used / created / shared), at either
/// mention or document scope.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ContextAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used: Option<ContextAttribute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<ContextAttribute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared: Option<ContextAttribute>,
}

/// One detected software mention with its attached sub-spans and
/// enrichment keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoftwareEntity {
    /// The primary name span. Always present.
    #[serde(rename = "software-name", alias = "softwareName", alias = "rawName")]
    pub software_name: SubSpan,
    /// Mention type as emitted by the service (software, environment,
    /// component, implicit). Left open: new types must not break parsing.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub software_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<SubSpan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<SubSpan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<SubSpan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<SubSpan>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<MentionReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mention_context_attributes: Option<ContextAttributes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_context_attributes: Option<ContextAttributes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wikipedia_external_ref: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wikidata_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}
