//! Authoritative store of window records.
//!
//! The registry owns the window list, the zIndex counter, and the focus pointer. It is a plain
//! data structure: no timers, no rendering, no animation. Every operation on an unknown id is a
//! silent no-op that reports `false`/`None`, because stale callbacks (a timer firing after its
//! window was closed by another path) are expected.
//!
//! Invariants maintained by every operation:
//! - `focused_window_id()` is `None` or names a non-minimized window.
//! - zIndex values are handed out from a counter that only grows, so no two windows share one
//!   and a newly raised window is always strictly on top.
//! - `minimized` and `maximized` are never both set on a record.

use platform_host::next_monotonic_timestamp_ms;

use crate::{
    config::WindowManagerConfig,
    geometry::{clamp_position, maximized_rect, GeometryBounds},
    model::{AppId, Point, Viewport, WindowId, WindowRect, WindowRecord, CASCADE_ORIGIN},
};

#[derive(Debug, Clone, PartialEq)]
pub struct WindowRegistry<C> {
    windows: Vec<WindowRecord<C>>,
    focused: Option<WindowId>,
    next_window_id: u64,
    max_z_index: u32,
    viewport: Viewport,
    bounds: GeometryBounds,
    cascade_offset: i32,
    default_size: (i32, i32),
}

impl<C> Default for WindowRegistry<C> {
    fn default() -> Self {
        Self::new(&WindowManagerConfig::default(), Viewport::default())
    }
}

impl<C> WindowRegistry<C> {
    pub fn new(config: &WindowManagerConfig, viewport: Viewport) -> Self {
        Self {
            windows: Vec::new(),
            focused: None,
            next_window_id: 1,
            max_z_index: config.base_z_index.saturating_sub(1),
            viewport,
            bounds: config.bounds,
            cascade_offset: config.cascade_offset,
            default_size: (config.default_width, config.default_height),
        }
    }

    /// Adopts new limits and placement defaults. The zIndex counter never moves backwards.
    pub fn apply_config(&mut self, config: &WindowManagerConfig) {
        self.bounds = config.bounds;
        self.cascade_offset = config.cascade_offset;
        self.default_size = (config.default_width, config.default_height);
        self.max_z_index = self
            .max_z_index
            .max(config.base_z_index.saturating_sub(1));
    }

    // ---- read accessors -------------------------------------------------------------------

    /// Windows in creation order.
    pub fn windows(&self) -> &[WindowRecord<C>] {
        &self.windows
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn focused_window_id(&self) -> Option<WindowId> {
        self.focused
    }

    pub fn is_focused(&self, window_id: WindowId) -> bool {
        self.focused == Some(window_id)
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn get_window_by_id(&self, window_id: WindowId) -> Option<&WindowRecord<C>> {
        self.windows.iter().find(|w| w.id == window_id)
    }

    /// The app's most recently raised window.
    pub fn get_window_for_app(&self, app_id: &AppId) -> Option<&WindowRecord<C>> {
        self.windows
            .iter()
            .filter(|w| w.belongs_to(app_id))
            .max_by_key(|w| w.z_index)
    }

    /// All of the app's windows, in creation order.
    pub fn get_all_windows_for_app(&self, app_id: &AppId) -> Vec<&WindowRecord<C>> {
        self.windows.iter().filter(|w| w.belongs_to(app_id)).collect()
    }

    /// Highest zIndex handed out so far (`base - 1` before the first window).
    pub fn current_max_z_index(&self) -> u32 {
        self.max_z_index
    }

    /// Windows sorted bottom to top.
    pub fn stacking_order(&self) -> Vec<&WindowRecord<C>> {
        let mut ordered: Vec<_> = self.windows.iter().collect();
        ordered.sort_by_key(|w| w.z_index);
        ordered
    }

    // ---- lifecycle ------------------------------------------------------------------------

    /// Focuses the app's existing window (restoring it if minimized) or creates the first one.
    ///
    /// The existing window keeps its content and is always raised to a fresh zIndex.
    pub fn open_or_focus_app(
        &mut self,
        app_id: impl Into<AppId>,
        title: impl Into<String>,
        content: C,
    ) -> WindowId {
        let app_id = app_id.into();
        if let Some(window_id) = self.get_window_for_app(&app_id).map(|w| w.id) {
            self.raise(window_id);
            return window_id;
        }
        self.open_window(Some(app_id), title, content)
    }

    /// Creates another window for `app_id` even when one already exists.
    pub fn create_new_window_for_app(
        &mut self,
        app_id: impl Into<AppId>,
        title: impl Into<String>,
        content: C,
    ) -> WindowId {
        self.open_window(Some(app_id.into()), title, content)
    }

    /// Creates a window, places it on the cascade, and focuses it.
    ///
    /// Placement reads the window count inside this call, so back-to-back opens in one tick
    /// still land on distinct cascade slots.
    pub fn open_window(
        &mut self,
        app_id: Option<AppId>,
        title: impl Into<String>,
        content: C,
    ) -> WindowId {
        let id = WindowId(self.next_window_id);
        self.next_window_id = self.next_window_id.saturating_add(1);
        let rect = self.cascade_rect();
        let z_index = self.allocate_z_index();
        self.windows.push(WindowRecord {
            id,
            app_id,
            title: title.into(),
            content,
            rect,
            restore_rect: None,
            z_index,
            minimized: false,
            maximized: false,
            resume_maximized: false,
            dock_target: None,
            last_focused_ms: next_monotonic_timestamp_ms(),
        });
        self.focused = Some(id);
        id
    }

    /// Removes a window. Closing the focused window hands focus to the top visible window.
    pub fn close_window(&mut self, window_id: WindowId) -> bool {
        let before = self.windows.len();
        self.windows.retain(|w| w.id != window_id);
        if self.windows.len() == before {
            return false;
        }
        if self.focused == Some(window_id) {
            self.elect_focus();
        }
        true
    }

    /// Removes every window and returns their ids.
    pub fn close_all(&mut self) -> Vec<WindowId> {
        self.focused = None;
        self.windows.drain(..).map(|w| w.id).collect()
    }

    /// Marks a window minimized, remembering the dock point it collapsed into.
    ///
    /// zIndex is unchanged. A maximized window drops the flag and re-maximizes on restore.
    pub fn minimize_window(&mut self, window_id: WindowId, dock_target: Option<Point>) -> bool {
        let Some(window) = self.find_mut(window_id) else {
            return false;
        };
        if window.minimized {
            return false;
        }
        window.minimized = true;
        if window.maximized {
            window.maximized = false;
            window.resume_maximized = true;
        }
        if dock_target.is_some() {
            window.dock_target = dock_target;
        }
        if self.focused == Some(window_id) {
            self.elect_focus();
        }
        true
    }

    /// Un-minimizes (if needed) and raises the window.
    pub fn restore_window(&mut self, window_id: WindowId) -> bool {
        if self.get_window_by_id(window_id).is_none() {
            return false;
        }
        self.raise(window_id);
        true
    }

    /// Focuses and raises a window. No-op when it is already the focused top window.
    pub fn focus_window(&mut self, window_id: WindowId) -> bool {
        let Some(window) = self.get_window_by_id(window_id) else {
            return false;
        };
        let already_top = self.focused == Some(window_id)
            && !window.minimized
            && window.z_index == self.max_z_index;
        if !already_top {
            self.raise(window_id);
        }
        true
    }

    pub fn maximize_window(&mut self, window_id: WindowId) -> bool {
        let target = maximized_rect(self.viewport, self.bounds);
        let Some(window) = self.find_mut(window_id) else {
            return false;
        };
        if window.minimized || window.maximized {
            return false;
        }
        window.restore_rect = Some(window.rect);
        window.rect = target;
        window.maximized = true;
        self.focus_window(window_id);
        true
    }

    pub fn unmaximize_window(&mut self, window_id: WindowId) -> bool {
        let viewport = self.viewport;
        let bounds = self.bounds;
        let Some(window) = self.find_mut(window_id) else {
            return false;
        };
        if !window.maximized {
            return false;
        }
        if let Some(restore_rect) = window.restore_rect.take() {
            window.rect = clamp_position(restore_rect, viewport, bounds);
        }
        window.maximized = false;
        true
    }

    pub fn toggle_maximize(&mut self, window_id: WindowId) -> bool {
        match self.get_window_by_id(window_id) {
            Some(window) if window.maximized => self.unmaximize_window(window_id),
            Some(_) => self.maximize_window(window_id),
            None => false,
        }
    }

    /// Overwrites a window's geometry.
    ///
    /// Callers bounds-check through the geometry controller; the registry only enforces the
    /// minimum size so a bad caller cannot produce a degenerate window.
    pub fn update_window_geometry(
        &mut self,
        window_id: WindowId,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    ) -> bool {
        self.update_window_rect(window_id, WindowRect::new(x, y, width, height))
    }

    pub fn update_window_rect(&mut self, window_id: WindowId, rect: WindowRect) -> bool {
        let bounds = self.bounds;
        let Some(window) = self.find_mut(window_id) else {
            return false;
        };
        window.rect = rect.clamped_min(bounds.min_width, bounds.min_height);
        true
    }

    /// Records a new viewport size. Maximized windows are re-fitted immediately; everything
    /// else is reconciled by the geometry controllers.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        let target = maximized_rect(viewport, self.bounds);
        for window in self.windows.iter_mut().filter(|w| w.maximized) {
            window.rect = target;
        }
    }

    // ---- internals ------------------------------------------------------------------------

    fn find_mut(&mut self, window_id: WindowId) -> Option<&mut WindowRecord<C>> {
        self.windows.iter_mut().find(|w| w.id == window_id)
    }

    fn allocate_z_index(&mut self) -> u32 {
        self.max_z_index = self.max_z_index.saturating_add(1);
        self.max_z_index
    }

    /// Unconditionally moves a window to a fresh top zIndex and focuses it.
    fn raise(&mut self, window_id: WindowId) {
        let z_index = self.allocate_z_index();
        let target = maximized_rect(self.viewport, self.bounds);
        let Some(window) = self.find_mut(window_id) else {
            return;
        };
        if window.minimized {
            window.minimized = false;
            if window.resume_maximized {
                window.resume_maximized = false;
                window.maximized = true;
                window.rect = target;
            }
        }
        window.z_index = z_index;
        window.last_focused_ms = next_monotonic_timestamp_ms();
        self.focused = Some(window_id);
    }

    /// Hands focus to the visible window with the highest zIndex, without re-stacking.
    fn elect_focus(&mut self) {
        self.focused = self
            .windows
            .iter()
            .filter(|w| w.is_visible())
            .max_by_key(|w| w.z_index)
            .map(|w| w.id);
    }

    fn cascade_rect(&self) -> WindowRect {
        let bounds = self.bounds;
        let viewport = self.viewport;
        let (default_w, default_h) = self.default_size;
        let usable_height = viewport.height - bounds.min_top_margin - bounds.bottom_reserve;
        let w = default_w.min(viewport.width).max(bounds.min_width);
        let h = default_h.min(usable_height).max(bounds.min_height);

        let step = self.cascade_offset.max(1);
        let room_x = (viewport.width - CASCADE_ORIGIN.x - w).max(0) / step;
        let room_y = (viewport.height - bounds.bottom_reserve - CASCADE_ORIGIN.y - h).max(0) / step;
        let slots = usize::try_from(room_x.min(room_y)).unwrap_or(0) + 1;
        let slot = i32::try_from(self.windows.len() % slots).unwrap_or(0);

        clamp_position(
            WindowRect {
                x: CASCADE_ORIGIN.x + slot * step,
                y: CASCADE_ORIGIN.y + slot * step,
                w,
                h,
            },
            viewport,
            bounds,
        )
    }
}
