//! Detail view assembly: the structured record behind the detail panel.
//!
//! This is the collaborator contract: the core exposes one fully resolved
//! record per entity; turning it into HTML stays in the host page.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::{ConceptInfo, ContextAttributes, SoftwareEntity};

/// A reference citation with its bibliographic record resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailReference {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_key: Option<i64>,
    pub raw_form: String,
    /// Serialized TEI biblStruct from the response's bibliography, when the
    /// refKey resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tei: Option<String>,
}

/// Knowledge-base link block: the entity's own identifiers merged with the
/// lazily fetched concept enrichment, when it has arrived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeBaseLinks {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wikipedia_external_ref: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wikidata_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concept: Option<ConceptInfo>,
}

/// Everything the detail panel shows for one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailView {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub software_type: Option<String>,
    pub raw_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized_form: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mention_context_attributes: Option<ContextAttributes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_context_attributes: Option<ContextAttributes>,
    pub references: Vec<DetailReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub knowledge_base: Option<KnowledgeBaseLinks>,
}

/// Build the detail record for one entity.
///
/// `reference_map` is the session's refKey → TEI map; `concept` the
/// enrichment for the entity's Wikipedia id, if it has been fetched.
pub fn build_detail(
    entity: &SoftwareEntity,
    reference_map: &HashMap<i64, String>,
    concept: Option<&ConceptInfo>,
) -> DetailView {
    let references = entity
        .references
        .iter()
        .map(|r| DetailReference {
            label: r.label.clone().unwrap_or_default(),
            ref_key: r.ref_key,
            raw_form: r.display_form(),
            tei: r.ref_key.and_then(|key| reference_map.get(&key).cloned()),
        })
        .collect();

    let knowledge_base = if entity.wikipedia_external_ref.is_some()
        || entity.wikidata_id.is_some()
        || concept.is_some()
    {
        Some(KnowledgeBaseLinks {
            wikipedia_external_ref: entity.wikipedia_external_ref,
            wikidata_id: entity.wikidata_id.clone(),
            concept: concept.cloned(),
        })
    } else {
        None
    };

    DetailView {
        software_type: entity.software_type.clone(),
        raw_name: entity.software_name.raw_form.clone(),
        normalized_form: entity.software_name.normalized_form.clone(),
        version: entity.version.as_ref().map(|s| s.raw_form.clone()),
        url: entity.url.as_ref().map(|s| s.raw_form.clone()),
        publisher: entity.publisher.as_ref().map(|s| s.raw_form.clone()),
        language: entity.language.as_ref().map(|s| s.raw_form.clone()),
        lang: entity.lang.clone(),
        confidence: entity.confidence,
        mention_context_attributes: entity.mention_context_attributes,
        document_context_attributes: entity.document_context_attributes,
        references,
        knowledge_base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MentionReference, SubSpan};

    fn sub(raw: &str, start: i64, end: i64) -> SubSpan {
        SubSpan {
            raw_form: raw.to_string(),
            normalized_form: None,
            offset_start: start,
            offset_end: end,
            bounding_boxes: vec![],
        }
    }

    fn entity(name: &str) -> SoftwareEntity {
        SoftwareEntity {
            software_name: sub(name, 0, name.len() as i64),
            software_type: Some("software".into()),
            version: None,
            url: None,
            publisher: None,
            language: None,
            references: vec![],
            mention_context_attributes: None,
            document_context_attributes: None,
            wikipedia_external_ref: None,
            wikidata_id: None,
            lang: None,
            confidence: Some(0.92),
        }
    }

    #[test]
    fn test_detail_resolves_references_against_bibliography() {
        let mut e = entity("SPSS");
        e.references = vec![
            MentionReference {
                label: Some("[12]".into()),
                ref_key: Some(12),
                ..Default::default()
            },
            MentionReference {
                label: Some("[99]".into()),
                ref_key: Some(99),
                ..Default::default()
            },
        ];
        let mut refs = HashMap::new();
        refs.insert(12, "<biblStruct xml:id=\"b12\"/>".to_string());

        let view = build_detail(&e, &refs, None);

        assert_eq!(view.references.len(), 2);
        assert_eq!(view.references[0].raw_form, "[12]");
        assert!(view.references[0].tei.is_some());
        // unresolvable refKey: citation kept, record absent
        assert!(view.references[1].tei.is_none());
    }

    #[test]
    fn test_detail_merges_concept_enrichment() {
        let mut e = entity("MUSCLE");
        e.wikipedia_external_ref = Some(21772);
        e.wikidata_id = Some("Q285404".into());
        let concept = ConceptInfo {
            preferred_term: Some("MUSCLE".into()),
            ..Default::default()
        };

        let view = build_detail(&e, &HashMap::new(), Some(&concept));

        let kb = view.knowledge_base.unwrap();
        assert_eq!(kb.wikipedia_external_ref, Some(21772));
        assert_eq!(
            kb.concept.unwrap().preferred_term.as_deref(),
            Some("MUSCLE")
        );
    }

    #[test]
    fn test_detail_without_enrichment_omits_kb_block() {
        let view = build_detail(&entity("R"), &HashMap::new(), None);
        assert!(view.knowledge_base.is_none());
        assert_eq!(view.raw_name, "R");
        assert_eq!(view.confidence, Some(0.92));
    }

    #[test]
    fn test_detail_carries_attribute_raw_forms() {
        let mut e = entity("Stata");
        e.version = Some(sub("15", 10, 12));
        e.publisher = Some(sub("StataCorp", 20, 29));

        let view = build_detail(&e, &HashMap::new(), None);

        assert_eq!(view.version.as_deref(), Some("15"));
        assert_eq!(view.publisher.as_deref(), Some("StataCorp"));
        assert!(view.url.is_none());
    }
}
