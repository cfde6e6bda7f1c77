//! Window-manager tuning and persisted user preferences.

use serde::{Deserialize, Serialize};

use crate::{
    dock::DockMetrics,
    geometry::GeometryBounds,
    model::{
        AppId, ANIMATION_DURATION_MS, BASE_Z_INDEX, CASCADE_OFFSET, DEFAULT_WINDOW_HEIGHT,
        DEFAULT_WINDOW_WIDTH, GEOMETRY_DEBOUNCE_MS, MINIMIZED_SCALE,
    },
};

/// Schema version written alongside persisted preferences.
pub const WM_PREFERENCES_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowManagerConfig {
    pub schema_version: u32,
    pub bounds: GeometryBounds,
    pub base_z_index: u32,
    pub cascade_offset: i32,
    pub default_width: i32,
    pub default_height: i32,
    pub animation_ms: u64,
    pub debounce_ms: u64,
    pub minimized_scale: f64,
    pub dock: DockMetrics,
    /// Apps that never get a second window, even through a force-new launch.
    pub single_instance_only: Vec<AppId>,
    /// Skip window animations; deferred close/minimize commit on the same tick.
    pub reduced_motion: bool,
    /// Log every window lifecycle transition.
    pub dev_mode: bool,
}

impl Default for WindowManagerConfig {
    fn default() -> Self {
        Self {
            schema_version: WM_PREFERENCES_SCHEMA_VERSION,
            bounds: GeometryBounds::default(),
            base_z_index: BASE_Z_INDEX,
            cascade_offset: CASCADE_OFFSET,
            default_width: DEFAULT_WINDOW_WIDTH,
            default_height: DEFAULT_WINDOW_HEIGHT,
            animation_ms: ANIMATION_DURATION_MS,
            debounce_ms: GEOMETRY_DEBOUNCE_MS,
            minimized_scale: MINIMIZED_SCALE,
            dock: DockMetrics::default(),
            single_instance_only: vec![AppId::from("launcher")],
            reduced_motion: false,
            dev_mode: false,
        }
    }
}

impl WindowManagerConfig {
    /// Animation length after applying the reduced-motion preference.
    pub fn effective_animation_ms(&self) -> u64 {
        if self.reduced_motion {
            0
        } else {
            self.animation_ms
        }
    }

    /// Whether a force-new launch may create another window for `app_id`.
    pub fn allows_multiple_instances(&self, app_id: &AppId) -> bool {
        !self.single_instance_only.contains(app_id)
    }

    /// Returns a copy with nonsensical values replaced by defaults.
    ///
    /// Preferences come from browser storage and may have been edited by hand.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if self.bounds.min_width <= 0 || self.bounds.min_height <= 0 {
            self.bounds = defaults.bounds;
        }
        self.bounds.min_top_margin = self.bounds.min_top_margin.max(0);
        self.bounds.bottom_reserve = self.bounds.bottom_reserve.max(0);
        if self.cascade_offset <= 0 {
            self.cascade_offset = defaults.cascade_offset;
        }
        self.default_width = self.default_width.max(self.bounds.min_width);
        self.default_height = self.default_height.max(self.bounds.min_height);
        if !(self.minimized_scale > 0.0 && self.minimized_scale <= 1.0) {
            self.minimized_scale = defaults.minimized_scale;
        }
        self.schema_version = WM_PREFERENCES_SCHEMA_VERSION;
        self
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn partial_preferences_fill_in_defaults() {
        let config: WindowManagerConfig =
            serde_json::from_str(r#"{"reduced_motion":true}"#).expect("parse");
        assert!(config.reduced_motion);
        assert_eq!(config.effective_animation_ms(), 0);
        assert_eq!(config.bounds, GeometryBounds::default());
        assert_eq!(config.base_z_index, 100);
    }

    #[test]
    fn launcher_is_single_instance_by_default() {
        let config = WindowManagerConfig::default();
        assert!(!config.allows_multiple_instances(&AppId::from("launcher")));
        assert!(config.allows_multiple_instances(&AppId::from("notes")));
    }

    #[test]
    fn sanitize_repairs_hand_edited_values() {
        let mut config = WindowManagerConfig::default();
        config.bounds.min_width = -5;
        config.cascade_offset = 0;
        config.default_width = 10;
        config.minimized_scale = 4.0;

        let fixed = config.sanitized();
        assert_eq!(fixed.bounds, GeometryBounds::default());
        assert_eq!(fixed.cascade_offset, 30);
        assert_eq!(fixed.default_width, 300);
        assert_eq!(fixed.minimized_scale, 0.05);
    }
}
