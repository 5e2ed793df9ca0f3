//! MentionCore: Software-Mention Annotation Overlay Engine
//!
//! A Rust/WASM implementation of the browser-side overlay pipeline for a
//! software-mention annotation service.
//!
//! # Architecture
//!
//! ## Overlay Components
//! - `overlay/normalizer.rs` - Span Normalizer: entity → subtype-tagged pieces
//! - `overlay/compositor.rs` - Text Overlay Compositor: merged, gap-filling segment stream
//! - `overlay/geometry.rs` - PDF Coordinate Mapper: page points → canvas pixels
//! - `overlay/scheduler.rs` - Render-Readiness Scheduler: bounded-retry placement
//! - `overlay/dom.rs` - browser driver attaching the overlay elements
//!
//! ## Session & Data
//! - `model/` - annotation response, entity and concept wire types
//! - `session.rs` - per-submission state, generation-checked async merges
//! - `detail.rs` - structured detail-panel records
//!
//! # Usage (WASM)
//! ```javascript,ignore
//! import init, { AnnotationSession } from 'mentioncore';
//!
//! await init();
//!
//! const session = new AnnotationSession();
//! const generation = session.beginSubmission(inputText);
//!
//! // annotation fetch resolves later; stale generations are discarded
//! session.ingestResponse(generation, responseJson);
//!
//! // text mode: ordered plain/annotated segments to render
//! const { segments } = session.compose();
//!
//! // PDF mode: overlays appear as their pages finish rendering
//! session.placePdfAnnotations(
//!   (entityIndex, pieceIndex) => showDetail(session.detail(entityIndex)),
//!   (event) => console.debug(event)
//! );
//! ```

pub mod detail;
pub mod model;
pub mod overlay;
pub mod session;

pub use detail::*;
pub use model::*;
pub use overlay::*;
pub use session::*;

use wasm_bindgen::prelude::*;

// When the `wee_alloc` feature is enabled, use `wee_alloc` as the global
// allocator for smaller WASM bundle size.
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

/// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Get version information
#[wasm_bindgen]
pub fn version() -> String {
    format!("mentioncore v{}", env!("CARGO_PKG_VERSION"))
}
