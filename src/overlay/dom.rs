//! Browser overlay driver: runs the placement scheduler against the live
//! DOM and attaches the overlay elements.
//!
//! Page layout contract with the host page (unchanged from the original
//! front end): each rendered page lives in a `#page-N` container div whose
//! first `<canvas>` child is the rendered page surface. Overlays are
//! absolutely positioned children of that container.

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::overlay::geometry::CanvasMetrics;
use crate::overlay::scheduler::{
    GenerationHandle, PageView, Placement, PlacementEvent, PlacementRequest, RenderScheduler,
    RETRY_DELAY_MS,
};

/// `PageView` over the live document.
pub struct DomPageView;

impl PageView for DomPageView {
    fn canvas_metrics(&self, page: u32) -> Option<CanvasMetrics> {
        let document = web_sys::window()?.document()?;
        let container = document.get_element_by_id(&format!("page-{}", page))?;
        let canvas = container.query_selector("canvas").ok()??;
        let width = canvas.client_width();
        let height = canvas.client_height();
        // canvas exists but has no layout yet
        if width <= 0 || height <= 0 {
            return None;
        }
        Some(CanvasMetrics {
            width_px: width as f64,
            height_px: height as f64,
        })
    }
}

async fn sleep(ms: i32) {
    let promise = js_sys::Promise::new(&mut |resolve, _reject| {
        if let Some(window) = web_sys::window() {
            let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms);
        }
    });
    let _ = wasm_bindgen_futures::JsFuture::from(promise).await;
}

/// Outcome of one polling round: the loop either made progress under its
/// own generation, or found itself superseded and must stop.
pub(crate) enum PollOutcome {
    Cancelled,
    Progress(Vec<Placement>),
}

/// One generation-checked round of the placement loop.
///
/// The check runs before the tick, so a loop that wakes up after a new
/// submission has started never computes placements against containers the
/// new submission rebuilt.
pub(crate) fn poll_round(
    scheduler: &mut RenderScheduler,
    view: &dyn PageView,
    generation: u32,
    handle: &GenerationHandle,
) -> PollOutcome {
    if !handle.is_current(generation) {
        return PollOutcome::Cancelled;
    }
    PollOutcome::Progress(scheduler.tick(view))
}

/// Drive all placement requests to a terminal state.
///
/// Polls the DOM every `RETRY_DELAY_MS` until every request is placed or
/// abandoned, or until `handle` reports that `generation` has been
/// superseded; a superseded loop stops without attaching anything.
/// `on_select(entityIndex, pieceIndex)` is invoked when an overlay is
/// clicked; `on_event` receives each lifecycle event.
pub fn run_placements(
    requests: Vec<PlacementRequest>,
    generation: u32,
    handle: GenerationHandle,
    on_select: Option<js_sys::Function>,
    on_event: Option<js_sys::Function>,
) {
    wasm_bindgen_futures::spawn_local(async move {
        let mut scheduler = RenderScheduler::new();
        for request in requests {
            scheduler.enqueue(request);
        }

        let view = DomPageView;
        loop {
            let placements = match poll_round(&mut scheduler, &view, generation, &handle) {
                PollOutcome::Cancelled => break,
                PollOutcome::Progress(placements) => placements,
            };
            for placement in placements {
                if let Err(e) = attach_overlay(&placement, on_select.as_ref()) {
                    web_sys::console::warn_1(
                        &format!("[mentioncore] overlay attach failed: {:?}", e).into(),
                    );
                }
            }
            forward_events(&mut scheduler, on_event.as_ref());
            if scheduler.is_idle() {
                break;
            }
            sleep(RETRY_DELAY_MS as i32).await;
        }
    });
}

fn forward_events(scheduler: &mut RenderScheduler, on_event: Option<&js_sys::Function>) {
    for event in scheduler.drain_events() {
        if let PlacementEvent::Abandoned {
            entity_index,
            piece_index,
        } = &event
        {
            // logged only; one unrendered page must not surface as an error
            web_sys::console::log_1(
                &format!(
                    "[mentioncore] abandoned placement for entity {} piece {}: page never rendered",
                    entity_index, piece_index
                )
                .into(),
            );
        }
        if let Some(callback) = on_event {
            if let Ok(value) = serde_wasm_bindgen::to_value(&event) {
                let _ = callback.call1(&JsValue::NULL, &value);
            }
        }
    }
}

fn attach_overlay(
    placement: &Placement,
    on_select: Option<&js_sys::Function>,
) -> Result<(), JsValue> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let container = document
        .get_element_by_id(&format!("page-{}", placement.page))
        .ok_or_else(|| JsValue::from_str("page container disappeared"))?;

    let element = document.create_element("a")?;
    element.set_id(&format!(
        "annot-{}-{}-{}",
        placement.entity_index, placement.piece_index, placement.box_index
    ));
    element.set_class_name(&format!("annot {}", placement.subtype.css_class()));
    let rect = &placement.rect;
    element.set_attribute(
        "style",
        &format!(
            "display:block; position:absolute; left:{}px; top:{}px; width:{}px; height:{}px;",
            rect.x, rect.y, rect.width, rect.height
        ),
    )?;

    if let Some(callback) = on_select {
        let callback = callback.clone();
        let entity_index = placement.entity_index as f64;
        let piece_index = placement.piece_index as f64;
        let closure = Closure::<dyn FnMut()>::new(move || {
            let _ = callback.call2(
                &JsValue::NULL,
                &JsValue::from_f64(entity_index),
                &JsValue::from_f64(piece_index),
            );
        });
        if let Some(html) = element.dyn_ref::<web_sys::HtmlElement>() {
            html.set_onclick(Some(closure.as_ref().unchecked_ref()));
        }
        // overlay handlers live for the whole session
        closure.forget();
    }

    container.append_child(&element)?;
    Ok(())
}
