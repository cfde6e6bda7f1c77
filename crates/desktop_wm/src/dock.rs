//! Dock icon geometry, used as the target of minimize/restore animations.

use serde::{Deserialize, Serialize};

use crate::model::{AppId, Point, Viewport, WindowRect};

/// Resolves the on-screen center of an app's dock icon.
///
/// Implementations must be side-effect free; the window manager treats them as an oracle and
/// falls back to [`fallback_dock_point`] when they return `None`.
pub trait DockPositionResolver {
    fn icon_center(&self, app_id: &AppId) -> Option<Point>;
}

/// Fixed dock layout measurements in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DockMetrics {
    /// Distance from the dock's left edge to the first app icon (padding plus launcher icon).
    pub leading_offset: f64,
    pub icon_size: f64,
    pub icon_margin: f64,
}

impl Default for DockMetrics {
    fn default() -> Self {
        Self {
            leading_offset: 8.0 + 48.0 + 8.0,
            icon_size: 48.0,
            icon_margin: 8.0,
        }
    }
}

/// Snapshot of the dock: its bounding box (when rendered) and the apps it shows, in order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DockLayout {
    pub bounds: Option<WindowRect>,
    pub apps: Vec<AppId>,
    pub metrics: DockMetrics,
}

impl DockLayout {
    pub fn new(apps: Vec<AppId>, metrics: DockMetrics) -> Self {
        Self {
            bounds: None,
            apps,
            metrics,
        }
    }

    pub fn index_of(&self, app_id: &AppId) -> Option<usize> {
        self.apps.iter().position(|app| app == app_id)
    }
}

impl DockPositionResolver for DockLayout {
    fn icon_center(&self, app_id: &AppId) -> Option<Point> {
        let bounds = self.bounds?;
        let index = self.index_of(app_id)? as f64;
        let m = self.metrics;
        Some(Point {
            x: f64::from(bounds.x)
                + m.leading_offset
                + index * (m.icon_size + m.icon_margin)
                + m.icon_size / 2.0,
            y: f64::from(bounds.y) + f64::from(bounds.h) / 2.0,
        })
    }
}

/// Point windows collapse into when no dock icon can be located.
pub fn fallback_dock_point(viewport: Viewport) -> Point {
    viewport.bottom_center()
}

/// Dock target for a window of `app_id`, falling back to the viewport's bottom center.
pub fn resolve_dock_target(
    resolver: &dyn DockPositionResolver,
    app_id: Option<&AppId>,
    viewport: Viewport,
) -> Point {
    app_id
        .and_then(|app_id| resolver.icon_center(app_id))
        .unwrap_or_else(|| fallback_dock_point(viewport))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn layout() -> DockLayout {
        DockLayout {
            bounds: Some(WindowRect::new(400, 730, 480, 64)),
            apps: vec![
                AppId::from("notes"),
                AppId::from("terminal"),
                AppId::from("settings"),
            ],
            metrics: DockMetrics::default(),
        }
    }

    #[test]
    fn icon_center_follows_dock_order() {
        let dock = layout();
        assert_eq!(
            dock.icon_center(&AppId::from("notes")),
            Some(Point::new(400.0 + 64.0 + 24.0, 762.0))
        );
        assert_eq!(
            dock.icon_center(&AppId::from("settings")),
            Some(Point::new(400.0 + 64.0 + 2.0 * 56.0 + 24.0, 762.0))
        );
    }

    #[test]
    fn unknown_app_or_unrendered_dock_falls_back_to_bottom_center() {
        let viewport = Viewport::new(1280, 800);
        let dock = layout();
        assert_eq!(
            resolve_dock_target(&dock, Some(&AppId::from("playground")), viewport),
            Point::new(640.0, 800.0)
        );
        assert_eq!(
            resolve_dock_target(&dock, None, viewport),
            Point::new(640.0, 800.0)
        );

        let hidden = DockLayout {
            bounds: None,
            ..layout()
        };
        assert_eq!(
            resolve_dock_target(&hidden, Some(&AppId::from("notes")), viewport),
            Point::new(640.0, 800.0)
        );
    }
}
