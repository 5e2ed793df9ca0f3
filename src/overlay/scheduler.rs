//! Render-Readiness Scheduler: bounded-retry placement of PDF overlays.
//!
//! PDF pages render asynchronously and may complete in any order relative
//! to the annotation fetch, and render completion is not otherwise
//! observable to placement code, so placement polls for the target canvas
//! on a fixed schedule instead of waiting on a completion signal.
//!
//! The scheduler itself is DOM-free: it sees the rendering subsystem only
//! through the `PageView` trait and is driven by explicit `tick()` calls,
//! which keeps the retry state machine testable without a browser.

use std::cell::Cell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::model::{BoundingBox, PageSize};
use crate::overlay::geometry::{map_to_pixels, CanvasMetrics, PixelRect};
use crate::overlay::normalizer::PieceSubtype;

/// Delay between polling rounds, in milliseconds.
pub const RETRY_DELAY_MS: u32 = 100;
/// Polling rounds before a placement is abandoned (~5s at 100ms).
pub const MAX_ATTEMPTS: u32 = 50;

/// Window through which the scheduler observes page rendering. Returns the
/// canvas dimensions once the page's canvas exists and has been laid out.
pub trait PageView {
    fn canvas_metrics(&self, page: u32) -> Option<CanvasMetrics>;
}

/// Shared view of the session's active generation.
///
/// The placement driver runs across await points, so a new submission can
/// start while a polling loop is parked. Each loop captures the generation
/// it was started under and a clone of this handle; once the session has
/// advanced, `is_current` turns false and the loop stops before touching
/// the rebuilt page containers. Single-threaded (wasm), hence `Rc<Cell>`.
#[derive(Debug, Clone, Default)]
pub struct GenerationHandle {
    active: Rc<Cell<u32>>,
}

impl GenerationHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> u32 {
        self.active.get()
    }

    /// Bump the active generation, invalidating every loop started under an
    /// earlier one. Returns the new generation.
    pub fn advance(&self) -> u32 {
        let next = self.active.get() + 1;
        self.active.set(next);
        next
    }

    pub fn is_current(&self, generation: u32) -> bool {
        self.active.get() == generation
    }
}

/// Lifecycle of one placement request. `Placed` and `Abandoned` are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementState {
    Pending,
    Placed,
    Abandoned,
}

/// One overlay to place: a single bounding box of a single piece.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementRequest {
    pub entity_index: usize,
    pub piece_index: usize,
    /// Index of this box within the piece's box list; part of the DOM id.
    pub box_index: usize,
    pub subtype: PieceSubtype,
    pub bbox: BoundingBox,
    /// Dimensions of the target page, when the response carried them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<PageSize>,
}

/// A successfully computed placement, ready for the driver to attach.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub entity_index: usize,
    pub piece_index: usize,
    pub box_index: usize,
    pub subtype: PieceSubtype,
    pub page: u32,
    pub rect: PixelRect,
}

/// Lifecycle event emitted when a request reaches a terminal state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PlacementEvent {
    #[serde(rename_all = "camelCase")]
    Placed {
        entity_index: usize,
        piece_index: usize,
        page: u32,
    },
    #[serde(rename_all = "camelCase")]
    Abandoned {
        entity_index: usize,
        piece_index: usize,
    },
}

struct Tracked {
    request: PlacementRequest,
    attempts: u32,
    state: PlacementState,
}

/// Cooperative placement scheduler. Many requests may be pending at once;
/// each only touches its own page, so one slow page never blocks
/// annotations on pages that already rendered.
pub struct RenderScheduler {
    tracked: Vec<Tracked>,
    events: Vec<PlacementEvent>,
    max_attempts: u32,
}

impl Default for RenderScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderScheduler {
    pub fn new() -> Self {
        RenderScheduler {
            tracked: Vec::new(),
            events: Vec::new(),
            max_attempts: MAX_ATTEMPTS,
        }
    }

    pub fn enqueue(&mut self, request: PlacementRequest) {
        self.tracked.push(Tracked {
            request,
            attempts: 0,
            state: PlacementState::Pending,
        });
    }

    pub fn pending_count(&self) -> usize {
        self.tracked
            .iter()
            .filter(|t| t.state == PlacementState::Pending)
            .count()
    }

    /// True once every request has reached a terminal state.
    pub fn is_idle(&self) -> bool {
        self.pending_count() == 0
    }

    /// State of one request, addressed by its identity triple.
    pub fn state(
        &self,
        entity_index: usize,
        piece_index: usize,
        box_index: usize,
    ) -> Option<PlacementState> {
        self.tracked
            .iter()
            .find(|t| {
                t.request.entity_index == entity_index
                    && t.request.piece_index == piece_index
                    && t.request.box_index == box_index
            })
            .map(|t| t.state)
    }

    /// Take the accumulated lifecycle events.
    pub fn drain_events(&mut self) -> Vec<PlacementEvent> {
        std::mem::take(&mut self.events)
    }

    /// One polling round over all pending requests. Returns the placements
    /// computed this round, for the driver to attach.
    ///
    /// A pending request whose page canvas exists is resolved immediately:
    /// `Placed` with a pixel rect, or `Abandoned` when the rect is
    /// unmappable (missing or degenerate page dimensions cannot heal by
    /// waiting). A request whose canvas is still absent consumes one
    /// attempt, and `Abandoned` once the attempt bound is exhausted.
    pub fn tick(&mut self, view: &dyn PageView) -> Vec<Placement> {
        let mut placed = Vec::new();

        for tracked in &mut self.tracked {
            if tracked.state != PlacementState::Pending {
                continue;
            }
            let request = &tracked.request;

            match view.canvas_metrics(request.bbox.p) {
                Some(canvas) => {
                    let rect = request
                        .page_size
                        .as_ref()
                        .and_then(|page| map_to_pixels(&request.bbox, page, &canvas));
                    match rect {
                        Some(rect) => {
                            tracked.state = PlacementState::Placed;
                            self.events.push(PlacementEvent::Placed {
                                entity_index: request.entity_index,
                                piece_index: request.piece_index,
                                page: request.bbox.p,
                            });
                            placed.push(Placement {
                                entity_index: request.entity_index,
                                piece_index: request.piece_index,
                                box_index: request.box_index,
                                subtype: request.subtype,
                                page: request.bbox.p,
                                rect,
                            });
                        }
                        None => {
                            tracked.state = PlacementState::Abandoned;
                            self.events.push(PlacementEvent::Abandoned {
                                entity_index: request.entity_index,
                                piece_index: request.piece_index,
                            });
                        }
                    }
                }
                None => {
                    tracked.attempts += 1;
                    if tracked.attempts >= self.max_attempts {
                        tracked.state = PlacementState::Abandoned;
                        self.events.push(PlacementEvent::Abandoned {
                            entity_index: request.entity_index,
                            piece_index: request.piece_index,
                        });
                    }
                }
            }
        }

        placed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct NeverRenders;
    impl PageView for NeverRenders {
        fn canvas_metrics(&self, _page: u32) -> Option<CanvasMetrics> {
            None
        }
    }

    /// Pages appear after a per-page number of ticks.
    struct RendersAfter {
        ready_after: HashMap<u32, u32>,
        ticks_seen: std::cell::Cell<u32>,
    }

    impl RendersAfter {
        fn new(ready_after: &[(u32, u32)]) -> Self {
            RendersAfter {
                ready_after: ready_after.iter().copied().collect(),
                ticks_seen: std::cell::Cell::new(0),
            }
        }
        fn advance(&self) {
            self.ticks_seen.set(self.ticks_seen.get() + 1);
        }
    }

    impl PageView for RendersAfter {
        fn canvas_metrics(&self, page: u32) -> Option<CanvasMetrics> {
            let ready = *self.ready_after.get(&page)?;
            if self.ticks_seen.get() >= ready {
                Some(CanvasMetrics {
                    width_px: 612.0,
                    height_px: 792.0,
                })
            } else {
                None
            }
        }
    }

    fn request(entity: usize, piece: usize, page: u32) -> PlacementRequest {
        PlacementRequest {
            entity_index: entity,
            piece_index: piece,
            box_index: 0,
            subtype: PieceSubtype::Software,
            bbox: BoundingBox {
                p: page,
                x: 100.0,
                y: 200.0,
                w: 50.0,
                h: 10.0,
            },
            page_size: Some(PageSize {
                page_height: 792.0,
                page_width: 612.0,
            }),
        }
    }

    #[test]
    fn test_generation_handle_clones_share_the_counter() {
        let handle = GenerationHandle::new();
        let captured = handle.clone();
        let generation = handle.advance();

        assert!(captured.is_current(generation));
        assert_eq!(captured.current(), generation);

        handle.advance();
        assert!(!captured.is_current(generation));
    }

    #[test]
    fn test_places_on_first_tick_when_page_exists() {
        let mut scheduler = RenderScheduler::new();
        scheduler.enqueue(request(0, 0, 1));

        let view = RendersAfter::new(&[(1, 0)]);
        let placed = scheduler.tick(&view);

        assert_eq!(placed.len(), 1);
        assert_eq!(placed[0].page, 1);
        // identity scale, pad applied
        assert_eq!(placed[0].rect.x, 99.0);
        assert!(scheduler.is_idle());
        assert_eq!(
            scheduler.state(0, 0, 0),
            Some(PlacementState::Placed)
        );
    }

    #[test]
    fn test_abandons_after_exactly_the_retry_bound() {
        let mut scheduler = RenderScheduler::new();
        scheduler.enqueue(request(2, 1, 7));

        let view = NeverRenders;
        for tick in 1..=MAX_ATTEMPTS {
            assert!(scheduler.tick(&view).is_empty());
            if tick < MAX_ATTEMPTS {
                assert_eq!(scheduler.state(2, 1, 0), Some(PlacementState::Pending));
            }
        }

        assert_eq!(scheduler.state(2, 1, 0), Some(PlacementState::Abandoned));
        assert!(scheduler.is_idle());
        assert_eq!(
            scheduler.drain_events(),
            vec![PlacementEvent::Abandoned {
                entity_index: 2,
                piece_index: 1,
            }]
        );
        // terminal: further ticks change nothing
        assert!(scheduler.tick(&view).is_empty());
        assert_eq!(scheduler.state(2, 1, 0), Some(PlacementState::Abandoned));
    }

    #[test]
    fn test_out_of_order_pages_resolve_independently() {
        let mut scheduler = RenderScheduler::new();
        scheduler.enqueue(request(0, 0, 1)); // page 1 renders late
        scheduler.enqueue(request(1, 0, 2)); // page 2 renders first

        let view = RendersAfter::new(&[(1, 3), (2, 1)]);

        view.advance();
        let placed = scheduler.tick(&view);
        assert_eq!(placed.len(), 1);
        assert_eq!(placed[0].page, 2);
        assert_eq!(scheduler.state(0, 0, 0), Some(PlacementState::Pending));

        view.advance();
        assert!(scheduler.tick(&view).is_empty());

        view.advance();
        let placed = scheduler.tick(&view);
        assert_eq!(placed.len(), 1);
        assert_eq!(placed[0].page, 1);
        assert!(scheduler.is_idle());
    }

    #[test]
    fn test_missing_page_size_abandons_once_canvas_exists() {
        let mut scheduler = RenderScheduler::new();
        let mut req = request(0, 0, 1);
        req.page_size = None;
        scheduler.enqueue(req);

        let view = RendersAfter::new(&[(1, 0)]);
        let placed = scheduler.tick(&view);

        assert!(placed.is_empty());
        assert_eq!(scheduler.state(0, 0, 0), Some(PlacementState::Abandoned));
        assert_eq!(
            scheduler.drain_events(),
            vec![PlacementEvent::Abandoned {
                entity_index: 0,
                piece_index: 0,
            }]
        );
    }

    #[test]
    fn test_placed_event_emitted() {
        let mut scheduler = RenderScheduler::new();
        scheduler.enqueue(request(4, 2, 3));

        let view = RendersAfter::new(&[(3, 0)]);
        scheduler.tick(&view);

        assert_eq!(
            scheduler.drain_events(),
            vec![PlacementEvent::Placed {
                entity_index: 4,
                piece_index: 2,
                page: 3,
            }]
        );
        // drained: a second drain is empty
        assert!(scheduler.drain_events().is_empty());
    }
}
