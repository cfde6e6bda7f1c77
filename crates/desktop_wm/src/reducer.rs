//! Reducer actions, side-effect intents, and transition logic for the window manager.
//!
//! [`DesktopState`] pairs the [`WindowRegistry`] with one [`WindowSession`] per window. Sessions
//! hold everything time-based (debounced geometry writes, running animations) as deadlines; the
//! reducer settles whatever is due on every dispatch and asks the host for a single follow-up
//! [`RuntimeEffect::ScheduleTick`].

use std::collections::BTreeMap;

use leptos::logging;
use thiserror::Error;

use crate::{
    animation::{ActiveAnimation, AnimationKind, DeferredCommit, WindowAnimationSequencer},
    config::WindowManagerConfig,
    dock::{resolve_dock_target, DockLayout},
    geometry::{reconcile_to_viewport, GeometryController},
    model::{AppId, Point, PointerPosition, ResizeEdge, Viewport, WindowId, WindowRect},
    registry::WindowRegistry,
};

/// Transient per-window state that must die with the window.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSession {
    pub geometry: GeometryController,
    pub animation: WindowAnimationSequencer,
}

impl WindowSession {
    pub fn new(config: &WindowManagerConfig) -> Self {
        Self {
            geometry: GeometryController::new(config.bounds, config.debounce_ms),
            animation: WindowAnimationSequencer::new(
                config.effective_animation_ms(),
                config.minimized_scale,
            ),
        }
    }

    fn apply_config(&mut self, config: &WindowManagerConfig) {
        self.geometry.set_bounds(config.bounds);
        self.geometry.set_debounce_ms(config.debounce_ms);
        self.animation
            .set_timing(config.effective_animation_ms(), config.minimized_scale);
    }

    pub fn next_deadline(&self) -> Option<u64> {
        match (self.geometry.next_deadline(), self.animation.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}

/// What a window looks like to the renderer right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPhase {
    Opening,
    Open,
    Restoring,
    Minimizing,
    Closing,
    Minimized,
}

impl WindowPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Opening => "opening",
            Self::Open => "open",
            Self::Restoring => "restoring",
            Self::Minimizing => "minimizing",
            Self::Closing => "closing",
            Self::Minimized => "minimized",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
/// Window-manager state mutated by [`reduce_desktop`].
pub struct DesktopState<C> {
    registry: WindowRegistry<C>,
    sessions: BTreeMap<WindowId, WindowSession>,
    dock: DockLayout,
    config: WindowManagerConfig,
}

impl<C> Default for DesktopState<C> {
    fn default() -> Self {
        Self::new(WindowManagerConfig::default(), Viewport::default())
    }
}

impl<C> DesktopState<C> {
    pub fn new(config: WindowManagerConfig, viewport: Viewport) -> Self {
        let config = config.sanitized();
        Self {
            registry: WindowRegistry::new(&config, viewport),
            sessions: BTreeMap::new(),
            dock: DockLayout::new(Vec::new(), config.dock),
            config,
        }
    }

    pub fn registry(&self) -> &WindowRegistry<C> {
        &self.registry
    }

    pub fn config(&self) -> &WindowManagerConfig {
        &self.config
    }

    pub fn dock(&self) -> &DockLayout {
        &self.dock
    }

    pub fn viewport(&self) -> Viewport {
        self.registry.viewport()
    }

    pub fn session(&self, window_id: WindowId) -> Option<&WindowSession> {
        self.sessions.get(&window_id)
    }

    /// Rect the window is drawn at: the live drag/resize rect when one is active, otherwise the
    /// registry's copy.
    pub fn display_rect(&self, window_id: WindowId) -> Option<WindowRect> {
        let record = self.registry.get_window_by_id(window_id)?;
        Some(
            self.sessions
                .get(&window_id)
                .and_then(|session| session.geometry.live_rect())
                .unwrap_or(record.rect),
        )
    }

    pub fn animation(&self, window_id: WindowId) -> Option<&ActiveAnimation> {
        self.sessions.get(&window_id)?.animation.active()
    }

    pub fn window_phase(&self, window_id: WindowId) -> Option<WindowPhase> {
        let record = self.registry.get_window_by_id(window_id)?;
        if record.minimized {
            return Some(WindowPhase::Minimized);
        }
        let kind = self
            .sessions
            .get(&window_id)
            .and_then(|session| session.animation.kind());
        Some(match kind {
            Some(AnimationKind::Opening) => WindowPhase::Opening,
            Some(AnimationKind::Restoring) => WindowPhase::Restoring,
            Some(AnimationKind::Minimizing) => WindowPhase::Minimizing,
            Some(AnimationKind::Closing) => WindowPhase::Closing,
            None => WindowPhase::Open,
        })
    }

    fn is_closing(&self, window_id: WindowId) -> bool {
        self.sessions
            .get(&window_id)
            .is_some_and(|session| session.animation.is_closing())
    }

    /// Earliest pending debounce or animation deadline across all windows.
    pub fn next_deadline(&self) -> Option<u64> {
        self.sessions
            .values()
            .filter_map(WindowSession::next_deadline)
            .min()
    }

    /// The app's top window, ignoring windows that are already on their way out.
    fn live_window_for_app(&self, app_id: &AppId) -> Option<WindowId> {
        self.registry
            .get_all_windows_for_app(app_id)
            .into_iter()
            .filter(|w| !self.is_closing(w.id))
            .max_by_key(|w| w.z_index)
            .map(|w| w.id)
    }

    fn dock_target_for(&self, app_id: Option<&AppId>) -> Point {
        resolve_dock_target(&self.dock, app_id, self.registry.viewport())
    }

    /// Window with a drag or resize in progress.
    pub fn active_gesture(&self) -> Option<WindowId> {
        self.sessions
            .iter()
            .find(|(_, session)| !session.geometry.is_idle())
            .map(|(id, _)| *id)
    }

    fn trace(&self, message: impl FnOnce() -> String) {
        if self.config.dev_mode {
            logging::log!("[wm] {}", message());
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
/// Actions accepted by [`reduce_desktop`].
pub enum DesktopAction<C> {
    /// Focus the app's window (restoring it if minimized) or open its first one.
    OpenOrFocusApp {
        app_id: AppId,
        title: String,
        content: C,
    },
    /// Open another window for the app even when one exists.
    CreateNewWindowForApp {
        app_id: AppId,
        title: String,
        content: C,
    },
    /// Launcher entry point; `force_new` is ignored for single-instance apps.
    LaunchApp {
        app_id: AppId,
        title: String,
        content: C,
        force_new: bool,
    },
    /// Open a window that belongs to no app.
    OpenWindow {
        app_id: Option<AppId>,
        title: String,
        content: C,
    },
    /// Dock icon click: restore a minimized window, otherwise open or focus.
    ActivateFromDock {
        app_id: AppId,
        title: String,
        content: C,
    },
    /// Start the close animation; the record goes away once it finishes.
    RequestClose { window_id: WindowId },
    /// Remove the window now.
    CloseWindow { window_id: WindowId },
    CloseAll,
    /// Start collapsing into the dock; the record is marked minimized once it finishes.
    RequestMinimize { window_id: WindowId },
    /// Mark the window minimized now.
    MinimizeWindow { window_id: WindowId },
    RestoreWindow { window_id: WindowId },
    FocusWindow { window_id: WindowId },
    ToggleMaximize { window_id: WindowId },
    BeginMove {
        window_id: WindowId,
        pointer: PointerPosition,
    },
    BeginResize {
        window_id: WindowId,
        edge: ResizeEdge,
        pointer: PointerPosition,
    },
    /// Global pointer move, routed to whichever window has an active gesture.
    PointerMoved { pointer: PointerPosition },
    PointerReleased,
    ViewportResized { viewport: Viewport },
    SetDockApps { apps: Vec<AppId> },
    /// Measured dock box, or `None` when the dock is not rendered.
    SetDockBounds { bounds: Option<WindowRect> },
    HydratePreferences { config: WindowManagerConfig },
    SetReducedMotion { enabled: bool },
    /// Host timer fired; settles whatever is due.
    Tick,
}

#[derive(Debug, Clone, PartialEq)]
/// Side-effect intents emitted by [`reduce_desktop`] for the host to execute.
pub enum RuntimeEffect {
    /// A window's geometry reached the registry.
    PositionUpdated {
        window_id: WindowId,
        rect: WindowRect,
    },
    /// Replace the pending tick timer with one that fires after `delay_ms`.
    ScheduleTick { delay_ms: u64 },
    /// Move keyboard focus into the window's content.
    FocusWindowInput(WindowId),
    PersistPreferences,
    PersistDockApps,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Reducer errors for actions that cannot be applied.
pub enum ReducerError {
    #[error("viewport must have a positive size, got {width}x{height}")]
    InvalidViewport { width: i32, height: i32 },
}

fn stale(action: &str, window_id: WindowId) {
    logging::debug_warn!("{action} ignored: {window_id} is not open");
}

/// Applies a [`DesktopAction`] at time `now_ms` and collects resulting side effects.
///
/// Actions naming a window that no longer exists are ignored. After the action, every debounced
/// geometry write and animation whose deadline has passed is committed, so a zero-length
/// animation finishes within the same dispatch.
///
/// # Errors
///
/// Returns [`ReducerError::InvalidViewport`] for a viewport with a non-positive dimension.
pub fn reduce_desktop<C>(
    state: &mut DesktopState<C>,
    action: DesktopAction<C>,
    now_ms: u64,
) -> Result<Vec<RuntimeEffect>, ReducerError> {
    let mut effects = Vec::new();
    match action {
        DesktopAction::OpenOrFocusApp {
            app_id,
            title,
            content,
        } => open_or_focus(state, app_id, title, content, now_ms, &mut effects),
        DesktopAction::CreateNewWindowForApp {
            app_id,
            title,
            content,
        } => {
            let window_id = state
                .registry
                .create_new_window_for_app(app_id, title, content);
            attach_session(state, window_id, now_ms, &mut effects);
        }
        DesktopAction::LaunchApp {
            app_id,
            title,
            content,
            force_new,
        } => {
            if force_new && state.config.allows_multiple_instances(&app_id) {
                let window_id = state
                    .registry
                    .create_new_window_for_app(app_id, title, content);
                attach_session(state, window_id, now_ms, &mut effects);
            } else {
                open_or_focus(state, app_id, title, content, now_ms, &mut effects);
            }
        }
        DesktopAction::OpenWindow {
            app_id,
            title,
            content,
        } => {
            let window_id = state.registry.open_window(app_id, title, content);
            attach_session(state, window_id, now_ms, &mut effects);
        }
        DesktopAction::ActivateFromDock {
            app_id,
            title,
            content,
        } => {
            let windows = state.registry.get_all_windows_for_app(&app_id);
            let top_visible = windows
                .iter()
                .filter(|w| w.is_visible() && !state.is_closing(w.id))
                .max_by_key(|w| w.z_index)
                .map(|w| w.id);
            let top_minimized = windows
                .iter()
                .filter(|w| w.minimized)
                .max_by_key(|w| w.z_index)
                .map(|w| w.id);
            match top_visible.or(top_minimized) {
                Some(window_id) => activate_existing(state, window_id, now_ms, &mut effects),
                None => open_or_focus(state, app_id, title, content, now_ms, &mut effects),
            }
        }
        DesktopAction::RequestClose { window_id } => {
            request_close(state, window_id, now_ms);
        }
        DesktopAction::CloseWindow { window_id } => {
            if !commit_close(state, window_id, &mut effects) {
                stale("close", window_id);
            }
        }
        DesktopAction::CloseAll => {
            let closed = state.registry.close_all();
            state.sessions.clear();
            state.trace(|| format!("closed all windows ({})", closed.len()));
        }
        DesktopAction::RequestMinimize { window_id } => {
            request_minimize(state, window_id, now_ms, &mut effects);
        }
        DesktopAction::MinimizeWindow { window_id } => {
            let target = state
                .registry
                .get_window_by_id(window_id)
                .map(|w| state.dock_target_for(w.app_id.as_ref()));
            match target {
                Some(target) => commit_minimize(state, window_id, target, &mut effects),
                None => stale("minimize", window_id),
            }
        }
        DesktopAction::RestoreWindow { window_id } => {
            if state.registry.get_window_by_id(window_id).is_some() {
                activate_existing(state, window_id, now_ms, &mut effects);
            } else {
                stale("restore", window_id);
            }
        }
        DesktopAction::FocusWindow { window_id } => focus(state, window_id, now_ms, &mut effects),
        DesktopAction::ToggleMaximize { window_id } => {
            toggle_maximize(state, window_id, &mut effects);
        }
        DesktopAction::BeginMove { window_id, pointer } => {
            if let Some(rect) = begin_gesture(state, window_id, now_ms, &mut effects) {
                if let Some(session) = state.sessions.get_mut(&window_id) {
                    session.geometry.begin_drag(pointer, rect);
                }
            }
        }
        DesktopAction::BeginResize {
            window_id,
            edge,
            pointer,
        } => {
            if let Some(rect) = begin_gesture(state, window_id, now_ms, &mut effects) {
                if let Some(session) = state.sessions.get_mut(&window_id) {
                    session.geometry.begin_resize(edge, pointer, rect);
                }
            }
        }
        DesktopAction::PointerMoved { pointer } => {
            let viewport = state.registry.viewport();
            if let Some(window_id) = state.active_gesture() {
                if let Some(session) = state.sessions.get_mut(&window_id) {
                    session.geometry.pointer_move(pointer, viewport, now_ms);
                }
            }
        }
        DesktopAction::PointerReleased => {
            if let Some(window_id) = state.active_gesture() {
                flush_geometry(state, window_id, &mut effects);
            }
        }
        DesktopAction::ViewportResized { viewport } => {
            if viewport.width <= 0 || viewport.height <= 0 {
                return Err(ReducerError::InvalidViewport {
                    width: viewport.width,
                    height: viewport.height,
                });
            }
            resize_viewport(state, viewport, now_ms, &mut effects);
        }
        DesktopAction::SetDockApps { apps } => {
            if state.dock.apps != apps {
                state.dock.apps = apps;
                effects.push(RuntimeEffect::PersistDockApps);
            }
        }
        DesktopAction::SetDockBounds { bounds } => {
            state.dock.bounds = bounds;
        }
        DesktopAction::HydratePreferences { config } => apply_config(state, config.sanitized()),
        DesktopAction::SetReducedMotion { enabled } => {
            if state.config.reduced_motion != enabled {
                let mut config = state.config.clone();
                config.reduced_motion = enabled;
                apply_config(state, config);
                effects.push(RuntimeEffect::PersistPreferences);
            }
        }
        DesktopAction::Tick => {}
    }

    settle(state, now_ms, &mut effects);
    if let Some(deadline) = state.next_deadline() {
        effects.push(RuntimeEffect::ScheduleTick {
            delay_ms: deadline.saturating_sub(now_ms),
        });
    }
    Ok(effects)
}

fn attach_session<C>(
    state: &mut DesktopState<C>,
    window_id: WindowId,
    now_ms: u64,
    effects: &mut Vec<RuntimeEffect>,
) {
    let mut session = WindowSession::new(&state.config);
    session.animation.begin_open(now_ms);
    state.sessions.insert(window_id, session);
    effects.push(RuntimeEffect::FocusWindowInput(window_id));
    state.trace(|| format!("opened {window_id}"));
}

fn open_or_focus<C>(
    state: &mut DesktopState<C>,
    app_id: AppId,
    title: String,
    content: C,
    now_ms: u64,
    effects: &mut Vec<RuntimeEffect>,
) {
    if let Some(window_id) = state.live_window_for_app(&app_id) {
        activate_existing(state, window_id, now_ms, effects);
        return;
    }
    match state.registry.get_window_for_app(&app_id).map(|w| w.id) {
        Some(window_id) => {
            if let Some(session) = state.sessions.get_mut(&window_id) {
                session.animation.cancel();
                session.animation.begin_open(now_ms);
            }
            state.trace(|| format!("reopened closing {window_id}"));
            activate_existing(state, window_id, now_ms, effects);
        }
        None => {
            let window_id = state.registry.open_window(Some(app_id), title, content);
            attach_session(state, window_id, now_ms, effects);
        }
    }
}

/// Restores (if needed) and raises an existing window, replaying the dock animation when it was
/// minimized. A minimize still in flight is abandoned.
fn activate_existing<C>(
    state: &mut DesktopState<C>,
    window_id: WindowId,
    now_ms: u64,
    effects: &mut Vec<RuntimeEffect>,
) {
    if state.is_closing(window_id) {
        return;
    }
    let was_minimized = state
        .registry
        .get_window_by_id(window_id)
        .is_some_and(|w| w.minimized);
    if let Some(session) = state.sessions.get_mut(&window_id) {
        if session.animation.is_minimizing() {
            session.animation.cancel();
        }
    }
    if !state.registry.restore_window(window_id) {
        return;
    }
    if was_minimized {
        refit_restored(state, window_id, effects);
        begin_restore_animation(state, window_id, now_ms);
    }
    effects.push(RuntimeEffect::FocusWindowInput(window_id));
    state.trace(|| format!("activated {window_id}"));
}

fn focus<C>(
    state: &mut DesktopState<C>,
    window_id: WindowId,
    now_ms: u64,
    effects: &mut Vec<RuntimeEffect>,
) {
    let Some(was_minimized) = state
        .registry
        .get_window_by_id(window_id)
        .map(|w| w.minimized)
    else {
        stale("focus", window_id);
        return;
    };
    if state.is_closing(window_id) {
        return;
    }
    if let Some(session) = state.sessions.get_mut(&window_id) {
        if session.animation.is_minimizing() {
            session.animation.cancel();
        }
    }
    state.registry.focus_window(window_id);
    if was_minimized {
        refit_restored(state, window_id, effects);
        begin_restore_animation(state, window_id, now_ms);
    }
    effects.push(RuntimeEffect::FocusWindowInput(window_id));
}

/// Brings a window that was hidden back inside the current viewport.
fn refit_restored<C>(
    state: &mut DesktopState<C>,
    window_id: WindowId,
    effects: &mut Vec<RuntimeEffect>,
) {
    let Some(record) = state.registry.get_window_by_id(window_id) else {
        return;
    };
    if record.maximized {
        return;
    }
    let viewport = state.registry.viewport();
    let fitted = reconcile_to_viewport(record.rect, viewport, state.config.bounds);
    if fitted != record.rect {
        commit_rect(state, window_id, fitted, effects);
    }
}

fn begin_restore_animation<C>(state: &mut DesktopState<C>, window_id: WindowId, now_ms: u64) {
    let Some(record) = state.registry.get_window_by_id(window_id) else {
        return;
    };
    let rect = record.rect;
    let source = record
        .dock_target
        .unwrap_or_else(|| state.dock_target_for(record.app_id.as_ref()));
    if let Some(session) = state.sessions.get_mut(&window_id) {
        session.animation.begin_restore(rect, source, now_ms);
    }
}

fn request_close<C>(state: &mut DesktopState<C>, window_id: WindowId, now_ms: u64) {
    if state.registry.get_window_by_id(window_id).is_none() {
        stale("close", window_id);
        return;
    }
    let started = state.sessions.get_mut(&window_id).is_some_and(|session| {
        session.geometry.cancel();
        session.animation.begin_close(now_ms)
    });
    if started {
        state.trace(|| format!("closing {window_id}"));
    }
}

/// Removes the record and its session. Returns `false` when the window was already gone.
fn commit_close<C>(
    state: &mut DesktopState<C>,
    window_id: WindowId,
    effects: &mut Vec<RuntimeEffect>,
) -> bool {
    state.sessions.remove(&window_id);
    let was_focused = state.registry.is_focused(window_id);
    if !state.registry.close_window(window_id) {
        return false;
    }
    if was_focused {
        if let Some(next) = state.registry.focused_window_id() {
            effects.push(RuntimeEffect::FocusWindowInput(next));
        }
    }
    state.trace(|| format!("closed {window_id}"));
    true
}

fn request_minimize<C>(
    state: &mut DesktopState<C>,
    window_id: WindowId,
    now_ms: u64,
    effects: &mut Vec<RuntimeEffect>,
) {
    let Some(record) = state.registry.get_window_by_id(window_id) else {
        stale("minimize", window_id);
        return;
    };
    if record.minimized {
        return;
    }
    let target = state.dock_target_for(record.app_id.as_ref());
    flush_geometry(state, window_id, effects);
    let Some(rect) = state.display_rect(window_id) else {
        return;
    };
    let started = state
        .sessions
        .get_mut(&window_id)
        .is_some_and(|session| session.animation.begin_minimize(rect, target, now_ms));
    if started {
        state.trace(|| format!("minimizing {window_id}"));
    }
}

fn commit_minimize<C>(
    state: &mut DesktopState<C>,
    window_id: WindowId,
    target: Point,
    effects: &mut Vec<RuntimeEffect>,
) {
    flush_geometry(state, window_id, effects);
    if let Some(session) = state.sessions.get_mut(&window_id) {
        session.animation.cancel();
    }
    let was_focused = state.registry.is_focused(window_id);
    if !state.registry.minimize_window(window_id, Some(target)) {
        return;
    }
    if was_focused {
        if let Some(next) = state.registry.focused_window_id() {
            effects.push(RuntimeEffect::FocusWindowInput(next));
        }
    }
    state.trace(|| format!("minimized {window_id}"));
}

fn toggle_maximize<C>(
    state: &mut DesktopState<C>,
    window_id: WindowId,
    effects: &mut Vec<RuntimeEffect>,
) {
    let Some(record) = state.registry.get_window_by_id(window_id) else {
        stale("toggle maximize", window_id);
        return;
    };
    if record.minimized || state.is_closing(window_id) {
        return;
    }
    flush_geometry(state, window_id, effects);
    if state.registry.toggle_maximize(window_id) {
        push_position(state, window_id, effects);
    }
}

/// Focuses the window and ends any other gesture. Returns the rect the new gesture starts from.
fn begin_gesture<C>(
    state: &mut DesktopState<C>,
    window_id: WindowId,
    now_ms: u64,
    effects: &mut Vec<RuntimeEffect>,
) -> Option<WindowRect> {
    let record = state.registry.get_window_by_id(window_id);
    let Some(record) = record else {
        stale("pointer gesture", window_id);
        return None;
    };
    if record.minimized || record.maximized || state.is_closing(window_id) {
        return None;
    }
    if let Some(other) = state.active_gesture() {
        flush_geometry(state, other, effects);
    }
    focus(state, window_id, now_ms, effects);
    state.display_rect(window_id)
}

/// Ends the window's gesture and writes any pending rect through to the registry.
fn flush_geometry<C>(
    state: &mut DesktopState<C>,
    window_id: WindowId,
    effects: &mut Vec<RuntimeEffect>,
) {
    let pending = state
        .sessions
        .get_mut(&window_id)
        .and_then(|session| session.geometry.pointer_up());
    if let Some(rect) = pending {
        commit_rect(state, window_id, rect, effects);
    }
}

fn commit_rect<C>(
    state: &mut DesktopState<C>,
    window_id: WindowId,
    rect: WindowRect,
    effects: &mut Vec<RuntimeEffect>,
) {
    if state.registry.update_window_rect(window_id, rect) {
        push_position(state, window_id, effects);
    }
}

fn push_position<C>(state: &DesktopState<C>, window_id: WindowId, effects: &mut Vec<RuntimeEffect>) {
    if let Some(record) = state.registry.get_window_by_id(window_id) {
        effects.push(RuntimeEffect::PositionUpdated {
            window_id,
            rect: record.rect,
        });
    }
}

fn resize_viewport<C>(
    state: &mut DesktopState<C>,
    viewport: Viewport,
    now_ms: u64,
    effects: &mut Vec<RuntimeEffect>,
) {
    state.registry.set_viewport(viewport);
    let windows: Vec<_> = state
        .registry
        .windows()
        .iter()
        .map(|w| (w.id, w.rect, w.maximized))
        .collect();
    for (window_id, rect, maximized) in windows {
        if maximized {
            push_position(state, window_id, effects);
            continue;
        }
        if let Some(session) = state.sessions.get_mut(&window_id) {
            session.geometry.viewport_changed(rect, viewport, now_ms);
        }
    }
    state.trace(|| format!("viewport {}x{}", viewport.width, viewport.height));
}

fn apply_config<C>(state: &mut DesktopState<C>, config: WindowManagerConfig) {
    state.registry.apply_config(&config);
    for session in state.sessions.values_mut() {
        session.apply_config(&config);
    }
    state.dock.metrics = config.dock;
    state.config = config;
}

/// Commits every debounced rect and finished animation whose deadline is at or before `now_ms`.
fn settle<C>(state: &mut DesktopState<C>, now_ms: u64, effects: &mut Vec<RuntimeEffect>) {
    let window_ids: Vec<WindowId> = state.sessions.keys().copied().collect();
    for window_id in window_ids {
        let Some(session) = state.sessions.get_mut(&window_id) else {
            continue;
        };
        let rect = session.geometry.poll(now_ms);
        let completion = session.animation.poll(now_ms);

        if let Some(rect) = rect {
            commit_rect(state, window_id, rect, effects);
        }
        match completion.and_then(|done| done.commit) {
            Some(DeferredCommit::Close) => {
                commit_close(state, window_id, effects);
            }
            Some(DeferredCommit::Minimize { target }) => {
                commit_minimize(state, window_id, target, effects);
            }
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    type State = DesktopState<&'static str>;

    fn open(state: &mut State, app: &str, now_ms: u64) -> WindowId {
        reduce_desktop(
            state,
            DesktopAction::OpenOrFocusApp {
                app_id: AppId::from(app),
                title: app.to_string(),
                content: "body",
            },
            now_ms,
        )
        .expect("open");
        state
            .registry()
            .get_window_for_app(&AppId::from(app))
            .expect("window")
            .id
    }

    fn dispatch(state: &mut State, action: DesktopAction<&'static str>, now_ms: u64) -> Vec<RuntimeEffect> {
        reduce_desktop(state, action, now_ms).expect("reduce")
    }

    #[test]
    fn opening_animates_and_schedules_a_tick() {
        let mut state = State::default();
        let effects = dispatch(
            &mut state,
            DesktopAction::OpenOrFocusApp {
                app_id: AppId::from("notes"),
                title: "Notes".to_string(),
                content: "body",
            },
            0,
        );
        let window_id = state.registry().focused_window_id().expect("focused");
        assert_eq!(
            effects,
            vec![
                RuntimeEffect::FocusWindowInput(window_id),
                RuntimeEffect::ScheduleTick { delay_ms: 300 },
            ]
        );
        assert_eq!(state.window_phase(window_id), Some(WindowPhase::Opening));

        assert_eq!(dispatch(&mut state, DesktopAction::Tick, 300), Vec::new());
        assert_eq!(state.window_phase(window_id), Some(WindowPhase::Open));
    }

    #[test]
    fn close_request_keeps_record_until_animation_finishes() {
        let mut state = State::default();
        let first = open(&mut state, "notes", 0);
        let second = open(&mut state, "settings", 0);

        let effects = dispatch(&mut state, DesktopAction::RequestClose { window_id: second }, 1_000);
        assert_eq!(effects, vec![RuntimeEffect::ScheduleTick { delay_ms: 300 }]);
        assert_eq!(state.window_phase(second), Some(WindowPhase::Closing));

        dispatch(&mut state, DesktopAction::Tick, 1_299);
        assert!(state.registry().get_window_by_id(second).is_some());

        let effects = dispatch(&mut state, DesktopAction::Tick, 1_300);
        assert!(state.registry().get_window_by_id(second).is_none());
        assert!(state.session(second).is_none());
        assert_eq!(state.registry().focused_window_id(), Some(first));
        assert_eq!(effects, vec![RuntimeEffect::FocusWindowInput(first)]);
    }

    #[test]
    fn reduced_motion_commits_minimize_in_the_same_dispatch() {
        let mut state = State::default();
        let window_id = open(&mut state, "notes", 0);
        let effects = dispatch(&mut state, DesktopAction::SetReducedMotion { enabled: true }, 10);
        assert!(effects.contains(&RuntimeEffect::PersistPreferences));

        dispatch(&mut state, DesktopAction::RequestMinimize { window_id }, 20);
        let record = state.registry().get_window_by_id(window_id).expect("record");
        assert!(record.minimized);
        assert_eq!(state.registry().focused_window_id(), None);
        assert_eq!(state.window_phase(window_id), Some(WindowPhase::Minimized));
    }

    #[test]
    fn drag_updates_display_immediately_and_registry_after_debounce() {
        let mut state = State::default();
        let window_id = open(&mut state, "notes", 0);
        let original = state.registry().get_window_by_id(window_id).expect("w").rect;
        assert_eq!(original, WindowRect::new(80, 48, 640, 420));

        dispatch(
            &mut state,
            DesktopAction::BeginMove {
                window_id,
                pointer: PointerPosition::new(100, 100),
            },
            5,
        );
        let effects = dispatch(
            &mut state,
            DesktopAction::PointerMoved {
                pointer: PointerPosition::new(150, 130),
            },
            10,
        );
        let moved = WindowRect::new(130, 78, 640, 420);
        assert_eq!(state.display_rect(window_id), Some(moved));
        assert_eq!(
            state.registry().get_window_by_id(window_id).expect("w").rect,
            original
        );
        assert_eq!(effects, vec![RuntimeEffect::ScheduleTick { delay_ms: 100 }]);

        let effects = dispatch(&mut state, DesktopAction::Tick, 110);
        assert_eq!(
            effects,
            vec![
                RuntimeEffect::PositionUpdated {
                    window_id,
                    rect: moved
                },
                RuntimeEffect::ScheduleTick { delay_ms: 190 },
            ]
        );
        assert_eq!(
            state.registry().get_window_by_id(window_id).expect("w").rect,
            moved
        );
    }

    #[test]
    fn pointer_release_flushes_pending_geometry() {
        let mut state = State::default();
        let window_id = open(&mut state, "notes", 0);
        dispatch(&mut state, DesktopAction::Tick, 300);
        dispatch(
            &mut state,
            DesktopAction::BeginResize {
                window_id,
                edge: ResizeEdge::SouthEast,
                pointer: PointerPosition::new(0, 0),
            },
            400,
        );
        dispatch(
            &mut state,
            DesktopAction::PointerMoved {
                pointer: PointerPosition::new(-500, -500),
            },
            410,
        );
        let effects = dispatch(&mut state, DesktopAction::PointerReleased, 420);
        assert_eq!(
            effects,
            vec![RuntimeEffect::PositionUpdated {
                window_id,
                rect: WindowRect::new(80, 48, 300, 200)
            }]
        );
        assert!(state.session(window_id).expect("session").geometry.is_idle());
    }

    #[test]
    fn stale_ids_are_ignored() {
        let mut state = State::default();
        let missing = WindowId(99);
        for action in [
            DesktopAction::FocusWindow { window_id: missing },
            DesktopAction::RequestClose { window_id: missing },
            DesktopAction::CloseWindow { window_id: missing },
            DesktopAction::RequestMinimize { window_id: missing },
            DesktopAction::RestoreWindow { window_id: missing },
            DesktopAction::ToggleMaximize { window_id: missing },
        ] {
            assert_eq!(dispatch(&mut state, action, 0), Vec::new());
        }
        assert_eq!(state, State::default());
    }

    #[test]
    fn non_positive_viewport_is_rejected() {
        let mut state = State::default();
        let err = reduce_desktop(
            &mut state,
            DesktopAction::ViewportResized {
                viewport: Viewport::new(0, 600),
            },
            0,
        )
        .expect_err("invalid viewport");
        assert_eq!(
            err,
            ReducerError::InvalidViewport {
                width: 0,
                height: 600
            }
        );
    }

    #[test]
    fn force_new_respects_single_instance_apps() {
        let mut state = State::default();
        for app in ["launcher", "launcher", "terminal", "terminal"] {
            dispatch(
                &mut state,
                DesktopAction::LaunchApp {
                    app_id: AppId::from(app),
                    title: app.to_string(),
                    content: "",
                    force_new: true,
                },
                0,
            );
        }
        let registry = state.registry();
        assert_eq!(registry.get_all_windows_for_app(&AppId::from("launcher")).len(), 1);
        assert_eq!(registry.get_all_windows_for_app(&AppId::from("terminal")).len(), 2);
    }

    #[test]
    fn close_supersedes_in_flight_minimize() {
        let mut state = State::default();
        let window_id = open(&mut state, "notes", 0);
        dispatch(&mut state, DesktopAction::RequestMinimize { window_id }, 500);
        dispatch(&mut state, DesktopAction::RequestClose { window_id }, 600);
        dispatch(&mut state, DesktopAction::Tick, 800);
        assert!(!state.registry().get_window_by_id(window_id).expect("w").minimized);
        dispatch(&mut state, DesktopAction::Tick, 900);
        assert!(state.registry().is_empty());
    }

    #[test]
    fn minimize_targets_the_dock_icon_and_restore_replays_it() {
        let mut state = State::default();
        dispatch(
            &mut state,
            DesktopAction::SetDockApps {
                apps: vec![AppId::from("terminal"), AppId::from("notes")],
            },
            0,
        );
        dispatch(
            &mut state,
            DesktopAction::SetDockBounds {
                bounds: Some(WindowRect::new(400, 730, 480, 64)),
            },
            0,
        );
        let window_id = open(&mut state, "notes", 0);
        dispatch(&mut state, DesktopAction::RequestMinimize { window_id }, 1_000);
        dispatch(&mut state, DesktopAction::Tick, 1_300);

        let icon = Point::new(400.0 + 64.0 + 56.0 + 24.0, 762.0);
        let record = state.registry().get_window_by_id(window_id).expect("w");
        assert!(record.minimized);
        assert_eq!(record.dock_target, Some(icon));

        let effects = dispatch(
            &mut state,
            DesktopAction::ActivateFromDock {
                app_id: AppId::from("notes"),
                title: "Notes".to_string(),
                content: "other",
            },
            2_000,
        );
        assert_eq!(state.window_phase(window_id), Some(WindowPhase::Restoring));
        assert_eq!(state.registry().len(), 1);
        assert!(effects.contains(&RuntimeEffect::FocusWindowInput(window_id)));
        let spec = &state.animation(window_id).expect("restore").spec;
        let rect = state.registry().get_window_by_id(window_id).expect("w").rect;
        assert_eq!(spec.from.translate_x, icon.x - rect.center().x);
    }

    #[test]
    fn viewport_shrink_reconciles_windows_through_the_debouncer() {
        let mut state = State::default();
        let window_id = open(&mut state, "notes", 0);
        dispatch(&mut state, DesktopAction::Tick, 300);
        dispatch(
            &mut state,
            DesktopAction::ViewportResized {
                viewport: Viewport::new(600, 400),
            },
            1_000,
        );
        let fitted = WindowRect::new(0, 8, 600, 366);
        assert_eq!(state.display_rect(window_id), Some(fitted));

        let effects = dispatch(&mut state, DesktopAction::Tick, 1_100);
        assert_eq!(
            effects,
            vec![RuntimeEffect::PositionUpdated {
                window_id,
                rect: fitted
            }]
        );
    }

    #[test]
    fn focusing_a_minimized_window_restores_it() {
        let mut state = State::default();
        let notes = open(&mut state, "notes", 0);
        let terminal = open(&mut state, "terminal", 0);
        dispatch(&mut state, DesktopAction::MinimizeWindow { window_id: notes }, 10);
        assert_eq!(state.registry().focused_window_id(), Some(terminal));

        dispatch(&mut state, DesktopAction::FocusWindow { window_id: notes }, 20);
        let record = state.registry().get_window_by_id(notes).expect("w");
        assert!(!record.minimized);
        assert_eq!(record.z_index, state.registry().current_max_z_index());
        assert_eq!(state.window_phase(notes), Some(WindowPhase::Restoring));
    }

    #[test]
    fn minimize_commit_keeps_a_pending_viewport_fit() {
        let mut state = State::default();
        let window_id = open(&mut state, "notes", 0);
        dispatch(&mut state, DesktopAction::Tick, 300);
        dispatch(&mut state, DesktopAction::RequestMinimize { window_id }, 1_000);
        dispatch(
            &mut state,
            DesktopAction::ViewportResized {
                viewport: Viewport::new(600, 400),
            },
            1_250,
        );

        let fitted = WindowRect::new(0, 8, 600, 366);
        let effects = dispatch(&mut state, DesktopAction::Tick, 1_300);
        assert!(effects.contains(&RuntimeEffect::PositionUpdated {
            window_id,
            rect: fitted
        }));
        let record = state.registry().get_window_by_id(window_id).expect("w");
        assert!(record.minimized);
        assert_eq!(record.rect, fitted);

        dispatch(&mut state, DesktopAction::RestoreWindow { window_id }, 1_400);
        let record = state.registry().get_window_by_id(window_id).expect("w");
        assert!(!record.minimized);
        assert_eq!(record.rect, fitted);
    }

    #[test]
    fn direct_minimize_writes_the_pending_viewport_fit() {
        let mut state = State::default();
        let window_id = open(&mut state, "notes", 0);
        dispatch(&mut state, DesktopAction::Tick, 300);
        dispatch(
            &mut state,
            DesktopAction::ViewportResized {
                viewport: Viewport::new(600, 400),
            },
            1_000,
        );
        dispatch(&mut state, DesktopAction::MinimizeWindow { window_id }, 1_050);
        dispatch(&mut state, DesktopAction::Tick, 1_200);

        let record = state.registry().get_window_by_id(window_id).expect("w");
        assert!(record.minimized);
        assert_eq!(record.rect, WindowRect::new(0, 8, 600, 366));
        assert_eq!(state.next_deadline(), None);
    }

    #[test]
    fn reopening_an_app_mid_close_keeps_its_window() {
        let mut state = State::default();
        let window_id = open(&mut state, "notes", 0);
        dispatch(&mut state, DesktopAction::Tick, 300);
        dispatch(&mut state, DesktopAction::RequestClose { window_id }, 1_000);
        assert_eq!(state.window_phase(window_id), Some(WindowPhase::Closing));

        let reopened = open(&mut state, "notes", 1_100);
        assert_eq!(reopened, window_id);
        assert_eq!(state.registry().len(), 1);
        assert_eq!(state.registry().focused_window_id(), Some(window_id));
        assert_eq!(state.window_phase(window_id), Some(WindowPhase::Opening));

        dispatch(&mut state, DesktopAction::Tick, 1_400);
        assert!(state.registry().get_window_by_id(window_id).is_some());
        assert_eq!(state.window_phase(window_id), Some(WindowPhase::Open));
    }
}
