//! Knowledge-base concept enrichment records.
//!
//! One record per external identifier (Wikipedia page id), fetched lazily by
//! the host and merged into the session's concept map whenever it arrives.

use serde::{Deserialize, Serialize};

/// A glossary definition attached to a concept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConceptDefinition {
    #[serde(default)]
    pub definition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

/// One Wikidata-style statement (property/value pair) on a concept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConceptStatement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concept_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_name: Option<String>,
    /// Raw statement value; shape varies by property type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

/// Enrichment record from the knowledge base for one concept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConceptInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wikipedia_external_ref: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wikidata_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_term: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub definitions: Vec<ConceptDefinition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub statements: Vec<ConceptStatement>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub domains: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concept_parsing() {
        let json = r#"{
            "wikipediaExternalRef": 21772,
            "wikidataId": "Q285404",
            "preferredTerm": "MUSCLE",
            "definitions": [
                {"definition": "Multiple sequence alignment software", "source": "wikipedia-en", "lang": "en"}
            ],
            "statements": [
                {"conceptId": "Q285404", "propertyId": "P31", "propertyName": "instance of", "valueName": "software"}
            ],
            "domains": ["Biology"]
        }"#;
        let concept: ConceptInfo = serde_json::from_str(json).unwrap();

        assert_eq!(concept.preferred_term.as_deref(), Some("MUSCLE"));
        assert_eq!(concept.definitions.len(), 1);
        assert_eq!(concept.statements[0].property_id.as_deref(), Some("P31"));
        assert_eq!(concept.domains, vec!["Biology"]);
    }

    #[test]
    fn test_concept_parsing_sparse() {
        let concept: ConceptInfo =
            serde_json::from_str(r#"{"wikipediaExternalRef": 9531}"#).unwrap();
        assert_eq!(concept.wikipedia_external_ref, Some(9531));
        assert!(concept.definitions.is_empty());
        assert!(concept.statements.is_empty());
    }
}
