//! Pointer-driven window geometry: bounded drag/resize math, the per-window
//! [`GeometryController`] state machine, and the trailing [`Debouncer`] that throttles
//! registry writes while the pointer is moving.

use serde::{Deserialize, Serialize};

use crate::model::{
    PointerPosition, ResizeEdge, Viewport, WindowRect, BOTTOM_RESERVE, MIN_TOP_MARGIN,
    MIN_WINDOW_HEIGHT, MIN_WINDOW_WIDTH,
};

/// Limits every drag/resize result is clamped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryBounds {
    pub min_width: i32,
    pub min_height: i32,
    pub min_top_margin: i32,
    pub bottom_reserve: i32,
}

impl Default for GeometryBounds {
    fn default() -> Self {
        Self {
            min_width: MIN_WINDOW_WIDTH,
            min_height: MIN_WINDOW_HEIGHT,
            min_top_margin: MIN_TOP_MARGIN,
            bottom_reserve: BOTTOM_RESERVE,
        }
    }
}

// The lower bound wins when the range is empty, so the title bar never leaves the top edge.
fn clamp_axis(value: i32, lo: i32, hi: i32) -> i32 {
    value.min(hi).max(lo)
}

/// Clamps a rect's position so the whole window (and in particular its title bar) stays inside
/// `[0, vw - w] x [min_top, vh - h - bottom_reserve]`. Size is left untouched.
pub fn clamp_position(rect: WindowRect, viewport: Viewport, bounds: GeometryBounds) -> WindowRect {
    WindowRect {
        x: clamp_axis(rect.x, 0, viewport.width - rect.w),
        y: clamp_axis(
            rect.y,
            bounds.min_top_margin,
            viewport.height - rect.h - bounds.bottom_reserve,
        ),
        ..rect
    }
}

/// Position of a dragged window after a pointer delta, clamped to the viewport.
pub fn drag_rect(
    start: WindowRect,
    dx: i32,
    dy: i32,
    viewport: Viewport,
    bounds: GeometryBounds,
) -> WindowRect {
    clamp_position(start.offset(dx, dy), viewport, bounds)
}

/// Applies a resize delta for `edge`.
///
/// Sizes are clamped against the viewport first and the minimum size last, so the minimum always
/// wins. Handles that move the left/top edge derive the new position from the size change, which
/// keeps the opposite edge anchored.
pub fn resize_rect(
    start: WindowRect,
    edge: ResizeEdge,
    dx: i32,
    dy: i32,
    viewport: Viewport,
    bounds: GeometryBounds,
) -> WindowRect {
    let w = if edge.resizes_width() {
        let (raw, max) = if edge.moves_left() {
            (start.w - dx, start.right())
        } else {
            (start.w + dx, viewport.width - start.x)
        };
        raw.min(max).max(bounds.min_width)
    } else {
        start.w
    };

    let h = if edge.resizes_height() {
        let (raw, max) = if edge.moves_top() {
            (start.h - dy, start.bottom() - bounds.min_top_margin)
        } else {
            (
                start.h + dy,
                viewport.height - bounds.bottom_reserve - start.y,
            )
        };
        raw.min(max).max(bounds.min_height)
    } else {
        start.h
    };

    WindowRect {
        x: if edge.moves_left() {
            start.x + (start.w - w)
        } else {
            start.x
        },
        y: if edge.moves_top() {
            start.y + (start.h - h)
        } else {
            start.y
        },
        w,
        h,
    }
}

/// Shrinks and repositions a rect that no longer fits after the viewport changed size.
pub fn reconcile_to_viewport(
    rect: WindowRect,
    viewport: Viewport,
    bounds: GeometryBounds,
) -> WindowRect {
    let usable_height = viewport.height - bounds.min_top_margin - bounds.bottom_reserve;
    let fitted = WindowRect {
        w: rect.w.min(viewport.width).max(bounds.min_width),
        h: rect.h.min(usable_height).max(bounds.min_height),
        ..rect
    };
    clamp_position(fitted, viewport, bounds)
}

/// Rect a maximized window occupies: full width, between the top margin and the bottom reserve.
pub fn maximized_rect(viewport: Viewport, bounds: GeometryBounds) -> WindowRect {
    WindowRect {
        x: 0,
        y: bounds.min_top_margin,
        w: viewport.width.max(bounds.min_width),
        h: (viewport.height - bounds.min_top_margin - bounds.bottom_reserve)
            .max(bounds.min_height),
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Pending<T> {
    value: T,
    due_ms: u64,
}

/// Trailing-edge debounce with a single pending slot.
///
/// Every [`push`](Self::push) replaces the pending value and reschedules its deadline, so only the
/// last value of a burst is delivered. [`flush`](Self::flush) delivers immediately.
#[derive(Debug, Clone, PartialEq)]
pub struct Debouncer<T> {
    delay_ms: u64,
    pending: Option<Pending<T>>,
}

impl<T> Debouncer<T> {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            pending: None,
        }
    }

    pub fn delay_ms(&self) -> u64 {
        self.delay_ms
    }

    pub fn set_delay_ms(&mut self, delay_ms: u64) {
        self.delay_ms = delay_ms;
    }

    pub fn push(&mut self, value: T, now_ms: u64) {
        self.pending = Some(Pending {
            value,
            due_ms: now_ms.saturating_add(self.delay_ms),
        });
    }

    /// Takes the pending value once its quiet interval has elapsed.
    pub fn poll(&mut self, now_ms: u64) -> Option<T> {
        if self.due_ms()? <= now_ms {
            self.flush()
        } else {
            None
        }
    }

    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|pending| pending.value)
    }

    /// Drops the pending value. Returns whether anything was pending.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    pub fn due_ms(&self) -> Option<u64> {
        self.pending.as_ref().map(|pending| pending.due_ms)
    }

    pub fn pending_value(&self) -> Option<&T> {
        self.pending.as_ref().map(|pending| &pending.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragSession {
    pub pointer_start: PointerPosition,
    pub rect_start: WindowRect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeSession {
    pub edge: ResizeEdge,
    pub pointer_start: PointerPosition,
    pub rect_start: WindowRect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GeometryMode {
    #[default]
    Idle,
    Dragging(DragSession),
    Resizing(ResizeSession),
}

/// Drag/resize state machine for a single window.
///
/// The controller keeps the rect the window should be drawn at right now (`live_rect`) separate
/// from the rect the registry holds. Live updates happen on every pointer move; registry writes
/// go through the debouncer and are flushed on pointer-up.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryController {
    mode: GeometryMode,
    bounds: GeometryBounds,
    live: Option<WindowRect>,
    debounce: Debouncer<WindowRect>,
}

impl GeometryController {
    pub fn new(bounds: GeometryBounds, debounce_ms: u64) -> Self {
        Self {
            mode: GeometryMode::Idle,
            bounds,
            live: None,
            debounce: Debouncer::new(debounce_ms),
        }
    }

    pub fn mode(&self) -> GeometryMode {
        self.mode
    }

    pub fn is_idle(&self) -> bool {
        self.mode == GeometryMode::Idle
    }

    pub fn bounds(&self) -> GeometryBounds {
        self.bounds
    }

    pub fn set_bounds(&mut self, bounds: GeometryBounds) {
        self.bounds = bounds;
    }

    pub fn set_debounce_ms(&mut self, debounce_ms: u64) {
        self.debounce.set_delay_ms(debounce_ms);
    }

    /// Rect to draw while it differs from the registry's copy.
    pub fn live_rect(&self) -> Option<WindowRect> {
        self.live
    }

    /// Enters `Dragging`. `rect` is the window's current on-screen rect.
    pub fn begin_drag(&mut self, pointer: PointerPosition, rect: WindowRect) {
        self.mode = GeometryMode::Dragging(DragSession {
            pointer_start: pointer,
            rect_start: rect,
        });
        self.live = Some(rect);
    }

    /// Enters `Resizing(edge)`. `rect` is the window's current on-screen rect.
    pub fn begin_resize(&mut self, edge: ResizeEdge, pointer: PointerPosition, rect: WindowRect) {
        self.mode = GeometryMode::Resizing(ResizeSession {
            edge,
            pointer_start: pointer,
            rect_start: rect,
        });
        self.live = Some(rect);
    }

    /// Applies a pointer move and returns the new on-screen rect, or `None` when idle.
    pub fn pointer_move(
        &mut self,
        pointer: PointerPosition,
        viewport: Viewport,
        now_ms: u64,
    ) -> Option<WindowRect> {
        let rect = match self.mode {
            GeometryMode::Idle => return None,
            GeometryMode::Dragging(session) => drag_rect(
                session.rect_start,
                pointer.x - session.pointer_start.x,
                pointer.y - session.pointer_start.y,
                viewport,
                self.bounds,
            ),
            GeometryMode::Resizing(session) => resize_rect(
                session.rect_start,
                session.edge,
                pointer.x - session.pointer_start.x,
                pointer.y - session.pointer_start.y,
                viewport,
                self.bounds,
            ),
        };
        self.live = Some(rect);
        self.debounce.push(rect, now_ms);
        Some(rect)
    }

    /// Leaves the active gesture and returns the final rect that still has to reach the registry.
    pub fn pointer_up(&mut self) -> Option<WindowRect> {
        self.mode = GeometryMode::Idle;
        self.live = None;
        self.debounce.flush()
    }

    /// Re-fits the window after a viewport resize. Returns the corrected rect when it changed.
    pub fn viewport_changed(
        &mut self,
        current: WindowRect,
        viewport: Viewport,
        now_ms: u64,
    ) -> Option<WindowRect> {
        let base = self.live.unwrap_or(current);
        let fitted = reconcile_to_viewport(base, viewport, self.bounds);
        if fitted == base {
            return None;
        }
        self.live = Some(fitted);
        self.debounce.push(fitted, now_ms);
        Some(fitted)
    }

    /// Delivers a debounced rect whose quiet interval has elapsed.
    pub fn poll(&mut self, now_ms: u64) -> Option<WindowRect> {
        let rect = self.debounce.poll(now_ms)?;
        if self.is_idle() {
            self.live = None;
        }
        Some(rect)
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.debounce.due_ms()
    }

    /// Drops the gesture and any pending write without delivering it.
    pub fn cancel(&mut self) {
        self.mode = GeometryMode::Idle;
        self.live = None;
        self.debounce.cancel();
    }
}
