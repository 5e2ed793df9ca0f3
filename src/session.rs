//! AnnotationSession: per-submission state and the JS-facing API.
//!
//! One session object owns everything a submission builds up: the entity
//! list, page dimensions, the concept map and the reference map. All of it
//! is rebuilt from scratch at each new submission; there is no cross-request
//! caching beyond the in-session concept-fetch dedup.
//!
//! Async responses from a superseded submission are the one race in this
//! single-threaded model. Every write-back carries the generation it was
//! issued under and is discarded when the session has moved on.

use std::collections::{HashMap, HashSet};

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::detail::{build_detail, DetailView};
use crate::model::{AnnotationResponse, ConceptInfo, PageSize, SoftwareEntity};
use crate::overlay::compositor::{compose, ComposedText};
use crate::overlay::dom::run_placements;
use crate::overlay::normalizer::normalize;
use crate::overlay::scheduler::{GenerationHandle, PlacementRequest};

/// Session state for one annotation front end instance.
#[wasm_bindgen]
pub struct AnnotationSession {
    active: GenerationHandle,
    source_text: String,
    lang: Option<String>,
    entities: Vec<SoftwareEntity>,
    pages: Vec<PageSize>,
    concept_map: HashMap<String, ConceptInfo>,
    requested_concepts: HashSet<String>,
    reference_map: HashMap<i64, String>,
}

impl Default for AnnotationSession {
    fn default() -> Self {
        Self::new()
    }
}

// Native API
impl AnnotationSession {
    /// Start a new submission: bump the generation and drop every map and
    /// list built for the previous one. Must run before any new request is
    /// issued. Returns the new generation, to be attached to the
    /// submission's async callbacks.
    pub fn begin_submission(&mut self, source_text: &str) -> u32 {
        let generation = self.active.advance();
        self.source_text = source_text.to_string();
        self.lang = None;
        self.entities.clear();
        self.pages.clear();
        self.concept_map.clear();
        self.requested_concepts.clear();
        self.reference_map.clear();
        generation
    }

    /// A clone of the session's generation counter, for loops that outlive
    /// the current call and must notice a later submission.
    pub fn generation_handle(&self) -> GenerationHandle {
        self.active.clone()
    }

    /// Install an annotation response. Returns false (and changes nothing)
    /// when the response belongs to a superseded submission.
    pub fn ingest_response(&mut self, generation: u32, response: AnnotationResponse) -> bool {
        if !self.active.is_current(generation) {
            return false;
        }
        self.lang = response.lang;
        self.entities = response.mentions;
        self.pages = response.pages;
        self.reference_map = response
            .references
            .into_iter()
            .map(|r| (r.ref_key, r.tei))
            .collect();
        true
    }

    /// Annotated reconstruction of the submitted text (text mode).
    pub fn compose(&self) -> ComposedText {
        compose(&self.source_text, &self.entities)
    }

    /// One placement request per (entity, piece, bounding box) triple
    /// (PDF mode).
    pub fn placement_requests(&self) -> Vec<PlacementRequest> {
        let mut requests = Vec::new();
        for (entity_index, entity) in self.entities.iter().enumerate() {
            for piece in normalize(entity, entity_index) {
                for (box_index, bbox) in piece.bounding_boxes.iter().enumerate() {
                    requests.push(PlacementRequest {
                        entity_index,
                        piece_index: piece.piece_index,
                        box_index,
                        subtype: piece.subtype,
                        bbox: *bbox,
                        page_size: self.page_size(bbox.p),
                    });
                }
            }
        }
        requests
    }

    /// Whether the host should fetch the concept for this identifier:
    /// true at most once per identifier per session.
    pub fn should_fetch_concept(&mut self, concept_id: &str) -> bool {
        if self.concept_map.contains_key(concept_id) {
            return false;
        }
        self.requested_concepts.insert(concept_id.to_string())
    }

    /// Merge a fetched concept record. Stale-generation results are
    /// discarded silently; that is an expected race, not an error.
    pub fn record_concept(&mut self, generation: u32, concept_id: &str, info: ConceptInfo) -> bool {
        if !self.active.is_current(generation) {
            return false;
        }
        self.concept_map.insert(concept_id.to_string(), info);
        true
    }

    pub fn concept(&self, concept_id: &str) -> Option<&ConceptInfo> {
        self.concept_map.get(concept_id)
    }

    /// Detail record for one entity, with references and any fetched
    /// enrichment resolved.
    pub fn detail(&self, entity_index: usize) -> Option<DetailView> {
        let entity = self.entities.get(entity_index)?;
        let concept = entity
            .wikipedia_external_ref
            .and_then(|id| self.concept_map.get(&id.to_string()));
        Some(build_detail(entity, &self.reference_map, concept))
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn page_size(&self, page: u32) -> Option<PageSize> {
        if page == 0 {
            return None;
        }
        self.pages.get(page as usize - 1).copied()
    }

    pub fn reference_tei(&self, ref_key: i64) -> Option<&str> {
        self.reference_map.get(&ref_key).map(String::as_str)
    }
}

#[wasm_bindgen]
impl AnnotationSession {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        AnnotationSession {
            active: GenerationHandle::new(),
            source_text: String::new(),
            lang: None,
            entities: Vec::new(),
            pages: Vec::new(),
            concept_map: HashMap::new(),
            requested_concepts: HashSet::new(),
            reference_map: HashMap::new(),
        }
    }

    #[wasm_bindgen(js_name = beginSubmission)]
    pub fn js_begin_submission(&mut self, source_text: &str) -> u32 {
        self.begin_submission(source_text)
    }

    #[wasm_bindgen(js_name = generation)]
    pub fn js_generation(&self) -> u32 {
        self.active.current()
    }

    /// Install the annotation response JSON for the given generation.
    #[wasm_bindgen(js_name = ingestResponse)]
    pub fn js_ingest_response(&mut self, generation: u32, response: JsValue) -> Result<bool, JsValue> {
        let response: AnnotationResponse = serde_wasm_bindgen::from_value(response)
            .map_err(|e| JsValue::from_str(&format!("Invalid annotation response: {}", e)))?;
        Ok(self.ingest_response(generation, response))
    }

    /// Compose the annotated text and return the segment stream. Skipped
    /// pieces are reported on the console.
    #[wasm_bindgen(js_name = compose)]
    pub fn js_compose(&self) -> Result<JsValue, JsValue> {
        let composed = self.compose();
        for skip in &composed.skipped {
            web_sys::console::warn_1(
                &format!(
                    "[mentioncore] dropped piece {} of entity {}: {:?}",
                    skip.piece_index, skip.entity_index, skip.reason
                )
                .into(),
            );
        }
        serde_wasm_bindgen::to_value(&composed)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Place all PDF overlays, waiting for each target page to render.
    ///
    /// The spawned loop is pinned to the current generation: once a new
    /// submission starts, it stops without attaching anything further.
    /// `on_select(entityIndex, pieceIndex)` fires when an overlay is
    /// clicked; `on_event` receives each placed/abandoned lifecycle event.
    #[wasm_bindgen(js_name = placePdfAnnotations)]
    pub fn js_place_pdf_annotations(&self, on_select: JsValue, on_event: JsValue) {
        let on_select = on_select.dyn_into::<js_sys::Function>().ok();
        let on_event = on_event.dyn_into::<js_sys::Function>().ok();
        run_placements(
            self.placement_requests(),
            self.active.current(),
            self.active.clone(),
            on_select,
            on_event,
        );
    }

    #[wasm_bindgen(js_name = shouldFetchConcept)]
    pub fn js_should_fetch_concept(&mut self, concept_id: &str) -> bool {
        self.should_fetch_concept(concept_id)
    }

    /// Merge a knowledge-base concept response for the given generation.
    #[wasm_bindgen(js_name = recordConcept)]
    pub fn js_record_concept(
        &mut self,
        generation: u32,
        concept_id: &str,
        info: JsValue,
    ) -> Result<bool, JsValue> {
        let info: ConceptInfo = serde_wasm_bindgen::from_value(info)
            .map_err(|e| JsValue::from_str(&format!("Invalid concept response: {}", e)))?;
        Ok(self.record_concept(generation, concept_id, info))
    }

    #[wasm_bindgen(js_name = concept)]
    pub fn js_concept(&self, concept_id: &str) -> Result<JsValue, JsValue> {
        match self.concept_map.get(concept_id) {
            Some(info) => serde_wasm_bindgen::to_value(info)
                .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e))),
            None => Ok(JsValue::NULL),
        }
    }

    #[wasm_bindgen(js_name = detail)]
    pub fn js_detail(&self, entity_index: usize) -> Result<JsValue, JsValue> {
        match self.detail(entity_index) {
            Some(view) => serde_wasm_bindgen::to_value(&view)
                .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e))),
            None => Ok(JsValue::NULL),
        }
    }

    #[wasm_bindgen(js_name = entityCount)]
    pub fn js_entity_count(&self) -> usize {
        self.entities.len()
    }
}
