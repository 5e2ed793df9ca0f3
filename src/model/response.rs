//! Annotation service response envelope.
//!
//! The full envelope is modeled so a verbatim service response parses; the
//! engine itself only consumes `mentions`, `pages`, `references` and `lang`.

use serde::{Deserialize, Serialize};

use super::entity::SoftwareEntity;

/// Physical dimensions of one PDF page, in points.
///
/// `pages[i]` corresponds to `BoundingBox.p == i + 1`. Field names are
/// snake_case on the wire, unlike the rest of the response.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub page_height: f64,
    pub page_width: f64,
}

/// One entry of the response's top-level bibliography: a serialized TEI
/// `biblStruct`, carried verbatim. Rendering it is the host page's job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BiblioReference {
    pub ref_key: i64,
    #[serde(default)]
    pub tei: String,
}

/// The complete annotation response for one text or PDF submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AnnotationResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub md5: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(default)]
    pub mentions: Vec<SoftwareEntity>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pages: Vec<PageSize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<BiblioReference>,
}

impl AnnotationResponse {
    /// Page dimensions for a 1-based page number, when the response carries
    /// page information (PDF mode only).
    pub fn page_size(&self, page: u32) -> Option<PageSize> {
        if page == 0 {
            return None;
        }
        self.pages.get(page as usize - 1).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_parsing() {
        let json = r#"{
            "application": "software-mentions",
            "version": "0.8.1",
            "runtime": 1874,
            "md5": "0C9F0A6D4E",
            "lang": "en",
            "mentions": [
                {"software-name": {"rawForm": "SPSS", "offsetStart": 10, "offsetEnd": 14}}
            ],
            "pages": [
                {"page_height": 792.0, "page_width": 612.0},
                {"page_height": 792.0, "page_width": 612.0}
            ],
            "references": [
                {"refKey": 12, "tei": "<biblStruct xml:id=\"b12\"/>"}
            ]
        }"#;
        let response: AnnotationResponse = serde_json::from_str(json).unwrap();

        assert_eq!(response.mentions.len(), 1);
        assert_eq!(response.pages.len(), 2);
        assert_eq!(response.references[0].ref_key, 12);
        assert_eq!(response.lang.as_deref(), Some("en"));
        assert_eq!(response.runtime, Some(1874.0));
    }

    #[test]
    fn test_response_defaults_when_fields_absent() {
        let response: AnnotationResponse = serde_json::from_str(r#"{"mentions": []}"#).unwrap();
        assert!(response.mentions.is_empty());
        assert!(response.pages.is_empty());
        assert!(response.references.is_empty());
    }

    #[test]
    fn test_page_size_lookup_is_one_based() {
        let response = AnnotationResponse {
            pages: vec![
                PageSize {
                    page_height: 792.0,
                    page_width: 612.0,
                },
                PageSize {
                    page_height: 842.0,
                    page_width: 595.0,
                },
            ],
            ..Default::default()
        };

        assert_eq!(response.page_size(2).unwrap().page_height, 842.0);
        assert!(response.page_size(0).is_none());
        assert!(response.page_size(3).is_none());
    }
}
