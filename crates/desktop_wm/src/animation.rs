//! Window open/close/minimize/restore transitions.
//!
//! An animation is a value: start transform, end transform, duration. Renderers either feed the
//! pair to CSS through [`AnimationSpec::css_declarations`] (the static [`WINDOW_TRANSITION_CSS`]
//! rules read the custom properties) or interpolate with [`AnimationSpec::sample`]. Nothing is
//! injected per animation, so a finished animation leaves nothing behind but `None`.

use serde::{Deserialize, Serialize};

use crate::model::{Point, WindowRect};

/// Scale used for the subtle grow/shrink on open and close.
const OPEN_CLOSE_SCALE: f64 = 0.92;
/// Keyframes rules driven by the custom properties. Consecutive animations alternate between the
/// two so a superseding animation restarts even though the rule body is identical.
pub const KEYFRAMES_NAMES: [&str; 2] = ["wm-window-transition-even", "wm-window-transition-odd"];

/// Stylesheet defining both [`KEYFRAMES_NAMES`] rules. Rendered once by the window layer.
pub const WINDOW_TRANSITION_CSS: &str = "\
@keyframes wm-window-transition-even{\
from{transform:var(--wm-from-transform);opacity:var(--wm-from-opacity)}\
to{transform:var(--wm-to-transform);opacity:var(--wm-to-opacity)}}\
@keyframes wm-window-transition-odd{\
from{transform:var(--wm-from-transform);opacity:var(--wm-from-opacity)}\
to{transform:var(--wm-to-transform);opacity:var(--wm-to-opacity)}}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimationKind {
    Opening,
    Closing,
    Minimizing,
    Restoring,
}

impl AnimationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Opening => "opening",
            Self::Closing => "closing",
            Self::Minimizing => "minimizing",
            Self::Restoring => "restoring",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowTransform {
    pub translate_x: f64,
    pub translate_y: f64,
    pub scale: f64,
    pub opacity: f64,
}

impl WindowTransform {
    pub const IDENTITY: Self = Self {
        translate_x: 0.0,
        translate_y: 0.0,
        scale: 1.0,
        opacity: 1.0,
    };

    /// Transform that puts a window of `rect` at `point`, shrunk to `scale` and fully transparent.
    pub fn collapsed_at(rect: WindowRect, point: Point, scale: f64) -> Self {
        let center = rect.center();
        Self {
            translate_x: point.x - center.x,
            translate_y: point.y - center.y,
            scale,
            opacity: 0.0,
        }
    }

    fn faded(scale: f64) -> Self {
        Self {
            scale,
            opacity: 0.0,
            ..Self::IDENTITY
        }
    }

    pub fn lerp(self, to: Self, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: f64, b: f64| a + (b - a) * t;
        Self {
            translate_x: mix(self.translate_x, to.translate_x),
            translate_y: mix(self.translate_y, to.translate_y),
            scale: mix(self.scale, to.scale),
            opacity: mix(self.opacity, to.opacity),
        }
    }

    pub fn css_transform(self) -> String {
        format!(
            "translate({:.2}px, {:.2}px) scale({:.4})",
            self.translate_x, self.translate_y, self.scale
        )
    }
}

impl Default for WindowTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

fn ease_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationSpec {
    /// Unique per sequencer; lets renderers restart an animation whose values did not change.
    pub id: u64,
    pub kind: AnimationKind,
    pub from: WindowTransform,
    pub to: WindowTransform,
    pub duration_ms: u64,
}

impl AnimationSpec {
    pub fn sample(&self, elapsed_ms: u64) -> WindowTransform {
        if self.duration_ms == 0 || elapsed_ms >= self.duration_ms {
            return self.to;
        }
        let t = elapsed_ms as f64 / self.duration_ms as f64;
        self.from.lerp(self.to, ease_in_out(t))
    }

    pub fn keyframes_name(&self) -> &'static str {
        KEYFRAMES_NAMES[(self.id % 2) as usize]
    }

    /// Inline style declarations consumed by the static keyframes rules.
    pub fn css_declarations(&self) -> String {
        format!(
            "--wm-from-transform:{};--wm-to-transform:{};--wm-from-opacity:{:.3};--wm-to-opacity:{:.3};animation:{} {}ms ease-in-out forwards;",
            self.from.css_transform(),
            self.to.css_transform(),
            self.from.opacity,
            self.to.opacity,
            self.keyframes_name(),
            self.duration_ms,
        )
    }
}

/// Registry change to apply once an exit animation has finished.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeferredCommit {
    Close,
    Minimize { target: Point },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActiveAnimation {
    pub spec: AnimationSpec,
    pub started_at_ms: u64,
    pub commit: Option<DeferredCommit>,
}

impl ActiveAnimation {
    pub fn due_ms(&self) -> u64 {
        self.started_at_ms.saturating_add(self.spec.duration_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationCompletion {
    pub kind: AnimationKind,
    pub commit: Option<DeferredCommit>,
}

/// Transient visual state of one window. At most one animation runs at a time.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowAnimationSequencer {
    duration_ms: u64,
    minimized_scale: f64,
    active: Option<ActiveAnimation>,
    next_id: u64,
}

impl WindowAnimationSequencer {
    pub fn new(duration_ms: u64, minimized_scale: f64) -> Self {
        Self {
            duration_ms,
            minimized_scale,
            active: None,
            next_id: 1,
        }
    }

    pub fn set_timing(&mut self, duration_ms: u64, minimized_scale: f64) {
        self.duration_ms = duration_ms;
        self.minimized_scale = minimized_scale;
    }

    pub fn active(&self) -> Option<&ActiveAnimation> {
        self.active.as_ref()
    }

    pub fn kind(&self) -> Option<AnimationKind> {
        self.active.as_ref().map(|active| active.spec.kind)
    }

    pub fn is_closing(&self) -> bool {
        self.kind() == Some(AnimationKind::Closing)
    }

    pub fn is_minimizing(&self) -> bool {
        self.kind() == Some(AnimationKind::Minimizing)
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.active.as_ref().map(ActiveAnimation::due_ms)
    }

    /// Transform the window should be drawn with at `now_ms`.
    pub fn transform_at(&self, now_ms: u64) -> WindowTransform {
        match &self.active {
            Some(active) => active
                .spec
                .sample(now_ms.saturating_sub(active.started_at_ms)),
            None => WindowTransform::IDENTITY,
        }
    }

    fn start(
        &mut self,
        kind: AnimationKind,
        from: WindowTransform,
        to: WindowTransform,
        commit: Option<DeferredCommit>,
        now_ms: u64,
    ) {
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);
        self.active = Some(ActiveAnimation {
            spec: AnimationSpec {
                id,
                kind,
                from,
                to,
                duration_ms: self.duration_ms,
            },
            started_at_ms: now_ms,
            commit,
        });
    }

    pub fn begin_open(&mut self, now_ms: u64) {
        self.start(
            AnimationKind::Opening,
            WindowTransform::faded(OPEN_CLOSE_SCALE),
            WindowTransform::IDENTITY,
            None,
            now_ms,
        );
    }

    /// Starts the exit animation. Supersedes any other animation, including a pending minimize.
    ///
    /// Returns `false` when the window is already closing.
    pub fn begin_close(&mut self, now_ms: u64) -> bool {
        if self.is_closing() {
            return false;
        }
        let from = self.transform_at(now_ms);
        self.start(
            AnimationKind::Closing,
            from,
            WindowTransform::faded(OPEN_CLOSE_SCALE),
            Some(DeferredCommit::Close),
            now_ms,
        );
        true
    }

    /// Starts collapsing `rect` into `target`.
    ///
    /// Returns `false` when the window is already closing or minimizing.
    pub fn begin_minimize(&mut self, rect: WindowRect, target: Point, now_ms: u64) -> bool {
        if self.is_closing() || self.is_minimizing() {
            return false;
        }
        let from = self.transform_at(now_ms);
        self.start(
            AnimationKind::Minimizing,
            from,
            WindowTransform::collapsed_at(rect, target, self.minimized_scale),
            Some(DeferredCommit::Minimize { target }),
            now_ms,
        );
        true
    }

    /// Starts growing `rect` back out of `source`. Purely cosmetic: the registry has already
    /// marked the window visible.
    pub fn begin_restore(&mut self, rect: WindowRect, source: Point, now_ms: u64) {
        self.start(
            AnimationKind::Restoring,
            WindowTransform::collapsed_at(rect, source, self.minimized_scale),
            WindowTransform::IDENTITY,
            None,
            now_ms,
        );
    }

    /// Finishes the running animation once its duration has elapsed.
    pub fn poll(&mut self, now_ms: u64) -> Option<AnimationCompletion> {
        if self.next_deadline()? > now_ms {
            return None;
        }
        self.active.take().map(|active| AnimationCompletion {
            kind: active.spec.kind,
            commit: active.commit,
        })
    }

    /// Drops the running animation without reporting a completion.
    pub fn cancel(&mut self) {
        self.active = None;
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn sequencer() -> WindowAnimationSequencer {
        WindowAnimationSequencer::new(300, 0.05)
    }

    #[test]
    fn open_returns_to_steady_state_after_duration() {
        let mut seq = sequencer();
        seq.begin_open(1_000);
        assert_eq!(seq.kind(), Some(AnimationKind::Opening));
        assert_eq!(seq.poll(1_299), None);
        assert_eq!(
            seq.poll(1_300),
            Some(AnimationCompletion {
                kind: AnimationKind::Opening,
                commit: None
            })
        );
        assert_eq!(seq.kind(), None);
        assert_eq!(seq.transform_at(1_400), WindowTransform::IDENTITY);
    }

    #[test]
    fn minimize_collapses_window_center_onto_dock_point() {
        let mut seq = sequencer();
        let rect = WindowRect::new(100, 100, 400, 300);
        let target = Point::new(640.0, 780.0);
        assert!(seq.begin_minimize(rect, target, 0));

        let spec = &seq.active().expect("active").spec;
        assert_eq!(spec.from, WindowTransform::IDENTITY);
        assert_eq!(spec.to.translate_x, 640.0 - 300.0);
        assert_eq!(spec.to.translate_y, 780.0 - 250.0);
        assert_eq!(spec.to.scale, 0.05);
        assert_eq!(spec.to.opacity, 0.0);

        let done = seq.poll(300).expect("completed");
        assert_eq!(done.commit, Some(DeferredCommit::Minimize { target }));
    }

    #[test]
    fn restore_mirrors_minimize() {
        let mut seq = sequencer();
        let rect = WindowRect::new(100, 100, 400, 300);
        let point = Point::new(640.0, 780.0);
        seq.begin_restore(rect, point, 0);
        let spec = seq.active().expect("active").spec.clone();
        assert_eq!(spec.from, WindowTransform::collapsed_at(rect, point, 0.05));
        assert_eq!(spec.to, WindowTransform::IDENTITY);
        assert_eq!(seq.poll(300).expect("done").commit, None);
    }

    #[test]
    fn close_supersedes_minimize_and_is_not_restarted() {
        let mut seq = sequencer();
        let rect = WindowRect::new(0, 8, 400, 300);
        seq.begin_minimize(rect, Point::new(10.0, 10.0), 0);
        assert!(seq.begin_close(150));
        assert!(!seq.begin_close(200));
        assert!(!seq.begin_minimize(rect, Point::new(10.0, 10.0), 200));
        assert_eq!(seq.next_deadline(), Some(450));

        let from = seq.active().expect("active").spec.from;
        assert!(from.scale < 1.0 && from.scale > 0.05);

        let done = seq.poll(450).expect("done");
        assert_eq!(done.kind, AnimationKind::Closing);
        assert_eq!(done.commit, Some(DeferredCommit::Close));
    }

    #[test]
    fn sampling_interpolates_and_ends_at_target() {
        let spec = AnimationSpec {
            id: 1,
            kind: AnimationKind::Restoring,
            from: WindowTransform {
                translate_x: 100.0,
                translate_y: 0.0,
                scale: 0.0,
                opacity: 0.0,
            },
            to: WindowTransform::IDENTITY,
            duration_ms: 300,
        };
        assert_eq!(spec.sample(0), spec.from);
        let mid = spec.sample(150);
        assert_eq!(mid.translate_x, 50.0);
        assert_eq!(mid.scale, 0.5);
        assert_eq!(spec.sample(300), WindowTransform::IDENTITY);
        assert_eq!(spec.sample(10_000), WindowTransform::IDENTITY);
    }

    #[test]
    fn css_declarations_carry_both_keyframes() {
        let mut seq = sequencer();
        seq.begin_minimize(WindowRect::new(0, 0, 200, 200), Point::new(100.0, 600.0), 0);
        let css = seq.active().expect("active").spec.css_declarations();
        assert!(css.contains("--wm-from-transform:translate(0.00px, 0.00px) scale(1.0000);"));
        assert!(css.contains("--wm-to-transform:translate(0.00px, 500.00px) scale(0.0500);"));
        assert!(css.contains("--wm-to-opacity:0.000;"));
        assert!(css.ends_with("animation:wm-window-transition-odd 300ms ease-in-out forwards;"));
    }

    #[test]
    fn superseding_animation_switches_keyframes_rule() {
        let mut seq = sequencer();
        let rect = WindowRect::new(0, 8, 400, 300);
        seq.begin_minimize(rect, Point::new(10.0, 10.0), 0);
        let first = seq.active().expect("active").spec.keyframes_name();
        seq.begin_close(100);
        let second = seq.active().expect("active").spec.keyframes_name();
        assert_ne!(first, second);
        assert!(WINDOW_TRANSITION_CSS.contains(first) && WINDOW_TRANSITION_CSS.contains(second));
    }

    #[test]
    fn zero_duration_completes_immediately() {
        let mut seq = WindowAnimationSequencer::new(0, 0.05);
        seq.begin_close(42);
        assert_eq!(
            seq.poll(42).map(|done| done.commit),
            Some(Some(DeferredCommit::Close))
        );
    }

    #[test]
    fn repeated_cycles_leave_nothing_behind() {
        let mut seq = sequencer();
        let rect = WindowRect::new(0, 8, 400, 300);
        let dock = Point::new(300.0, 790.0);
        let mut now = 0;
        let mut ids = Vec::new();
        for _ in 0..50 {
            seq.begin_minimize(rect, dock, now);
            ids.push(seq.active().expect("active").spec.id);
            now += 300;
            assert!(seq.poll(now).is_some());
            seq.begin_restore(rect, dock, now);
            ids.push(seq.active().expect("active").spec.id);
            now += 300;
            assert!(seq.poll(now).is_some());
            assert!(seq.active().is_none());
        }
        let mut unique = ids.clone();
        unique.dedup();
        assert_eq!(unique.len(), ids.len());
    }
}
