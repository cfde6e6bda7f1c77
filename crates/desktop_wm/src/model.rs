use std::fmt;

use serde::{Deserialize, Serialize};

/// Minimum window width after any resize.
pub const MIN_WINDOW_WIDTH: i32 = 300;
/// Minimum window height after any resize.
pub const MIN_WINDOW_HEIGHT: i32 = 200;
/// Smallest allowed distance between the viewport top and a window's title bar.
pub const MIN_TOP_MARGIN: i32 = 8;
/// Strip at the bottom of the viewport that windows may not cover (dock reveal area).
pub const BOTTOM_RESERVE: i32 = 26;
/// zIndex handed to the first window of a session.
pub const BASE_Z_INDEX: u32 = 100;
/// Per-window cascade step for initial placement.
pub const CASCADE_OFFSET: i32 = 30;
pub const DEFAULT_WINDOW_WIDTH: i32 = 640;
pub const DEFAULT_WINDOW_HEIGHT: i32 = 420;
/// Top-left corner of the first cascaded window.
pub const CASCADE_ORIGIN: PointerPosition = PointerPosition { x: 80, y: 48 };
pub const ANIMATION_DURATION_MS: u64 = 300;
pub const GEOMETRY_DEBOUNCE_MS: u64 = 100;
/// Scale a window shrinks to when it collapses into the dock.
pub const MINIMIZED_SCALE: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WindowId(pub u64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "window-{}", self.0)
    }
}

/// Identifier of the application that owns a window (`"notes"`, `"terminal"`, ...).
///
/// App ids are opaque strings; the window manager compares them but never interprets them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppId(pub String);

impl AppId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AppId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for AppId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowRect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl WindowRect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self
        }
    }

    pub fn clamped_min(self, min_w: i32, min_h: i32) -> Self {
        Self {
            w: self.w.max(min_w),
            h: self.h.max(min_h),
            ..self
        }
    }

    pub fn right(self) -> i32 {
        self.x + self.w
    }

    pub fn bottom(self) -> i32 {
        self.y + self.h
    }

    pub fn center(self) -> Point {
        Point {
            x: f64::from(self.x) + f64::from(self.w) / 2.0,
            y: f64::from(self.y) + f64::from(self.h) / 2.0,
        }
    }
}

impl Default for WindowRect {
    fn default() -> Self {
        Self {
            x: CASCADE_ORIGIN.x,
            y: CASCADE_ORIGIN.y,
            w: DEFAULT_WINDOW_WIDTH,
            h: DEFAULT_WINDOW_HEIGHT,
        }
    }
}

/// Screen-space point in CSS pixels, used for dock targets and animation anchors.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerPosition {
    pub x: i32,
    pub y: i32,
}

impl PointerPosition {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Size of the browser viewport the desktop is rendered into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: i32,
    pub height: i32,
}

impl Viewport {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub fn bottom_center(self) -> Point {
        Point {
            x: f64::from(self.width) / 2.0,
            y: f64::from(self.height),
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 800,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResizeEdge {
    North,
    South,
    East,
    West,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl ResizeEdge {
    pub const ALL: [ResizeEdge; 8] = [
        Self::North,
        Self::South,
        Self::East,
        Self::West,
        Self::NorthEast,
        Self::NorthWest,
        Self::SouthEast,
        Self::SouthWest,
    ];

    /// Short handle name (`"n"`, `"se"`, ...), also used as the handle's CSS class suffix.
    pub fn handle(self) -> &'static str {
        match self {
            Self::North => "n",
            Self::South => "s",
            Self::East => "e",
            Self::West => "w",
            Self::NorthEast => "ne",
            Self::NorthWest => "nw",
            Self::SouthEast => "se",
            Self::SouthWest => "sw",
        }
    }

    pub fn from_handle(handle: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|edge| edge.handle() == handle)
    }

    /// Whether dragging this handle moves the window's left edge.
    pub fn moves_left(self) -> bool {
        matches!(self, Self::West | Self::NorthWest | Self::SouthWest)
    }

    /// Whether dragging this handle moves the window's top edge.
    pub fn moves_top(self) -> bool {
        matches!(self, Self::North | Self::NorthWest | Self::NorthEast)
    }

    pub fn resizes_width(self) -> bool {
        !matches!(self, Self::North | Self::South)
    }

    pub fn resizes_height(self) -> bool {
        !matches!(self, Self::East | Self::West)
    }
}

/// One open window.
///
/// `C` is the caller's renderable payload. The window manager stores and hands it back but never
/// looks inside it.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowRecord<C> {
    pub id: WindowId,
    pub app_id: Option<AppId>,
    pub title: String,
    pub content: C,
    pub rect: WindowRect,
    pub restore_rect: Option<WindowRect>,
    pub z_index: u32,
    pub minimized: bool,
    pub maximized: bool,
    /// Re-maximize when restored from the dock (set when a maximized window is minimized).
    pub resume_maximized: bool,
    /// Dock point the window collapsed into, replayed by the restore animation.
    pub dock_target: Option<Point>,
    /// Recency stamp, advisory only.
    pub last_focused_ms: u64,
}

impl<C> WindowRecord<C> {
    pub fn is_visible(&self) -> bool {
        !self.minimized
    }

    pub fn belongs_to(&self, app_id: &AppId) -> bool {
        self.app_id.as_ref() == Some(app_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_edges_round_trip_through_handle_names() {
        for edge in ResizeEdge::ALL {
            assert_eq!(ResizeEdge::from_handle(edge.handle()), Some(edge));
        }
        assert_eq!(ResizeEdge::from_handle("middle"), None);
    }

    #[test]
    fn edge_axes_match_handle_geometry() {
        assert!(ResizeEdge::NorthWest.moves_left() && ResizeEdge::NorthWest.moves_top());
        assert!(!ResizeEdge::SouthEast.moves_left() && !ResizeEdge::SouthEast.moves_top());
        assert!(!ResizeEdge::North.resizes_width() && ResizeEdge::North.resizes_height());
        assert!(ResizeEdge::East.resizes_width() && !ResizeEdge::East.resizes_height());
    }

    #[test]
    fn app_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&AppId::from("notes")).expect("serialize");
        assert_eq!(json, "\"notes\"");
        assert_eq!(WindowId(7).to_string(), "window-7");
    }

    #[test]
    fn rect_center_is_midpoint() {
        let rect = WindowRect::new(100, 50, 300, 200);
        assert_eq!(rect.center(), Point::new(250.0, 150.0));
        assert_eq!((rect.right(), rect.bottom()), (400, 250));
    }
}
