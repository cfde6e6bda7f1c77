//! Runtime provider and context wiring for the window manager.
//!
//! This module owns the long-lived reducer container, the runtime effect queue, and host
//! bootstrap wiring. UI composition stays in [`crate::components`].

use leptos::*;

use crate::{
    config::WindowManagerConfig,
    content::WindowContent,
    effect_executor,
    host::DesktopHostContext,
    model::{AppId, WindowId, WindowRect},
    persistence::DesktopIconPosition,
    reducer::{reduce_desktop, DesktopAction, DesktopState, RuntimeEffect},
};

/// Window-manager state as rendered by the Leptos shell.
pub type ShellState = DesktopState<WindowContent>;

#[derive(Clone, Copy)]
/// Leptos context for reading window-manager state and dispatching [`DesktopAction`] values.
pub struct DesktopRuntimeContext {
    /// Host service bundle for executing runtime side effects and environment queries.
    pub host: StoredValue<DesktopHostContext>,
    /// Reactive window-manager state signal.
    pub state: RwSignal<ShellState>,
    /// Queue of runtime effects emitted by the reducer and drained by the effect executor.
    pub effects: RwSignal<Vec<RuntimeEffect>>,
    /// Desktop icon positions loaded at boot, owned by the desktop icon grid.
    pub icon_positions: RwSignal<Vec<DesktopIconPosition>>,
    /// Reducer dispatch callback.
    pub dispatch: Callback<DesktopAction<WindowContent>>,
    /// Receives every committed window geometry change.
    pub on_position_update: Option<Callback<(WindowId, WindowRect)>>,
}

impl DesktopRuntimeContext {
    /// Dispatches a reducer action through the runtime context callback.
    pub fn dispatch_action(&self, action: DesktopAction<WindowContent>) {
        self.dispatch.call(action);
    }

    /// Focuses the app's window or opens its first one.
    pub fn open_or_focus_app(
        &self,
        app_id: impl Into<AppId>,
        title: impl Into<String>,
        content: WindowContent,
    ) {
        self.dispatch_action(DesktopAction::OpenOrFocusApp {
            app_id: app_id.into(),
            title: title.into(),
            content,
        });
    }

    /// Opens an additional window for the app.
    pub fn create_new_window_for_app(
        &self,
        app_id: impl Into<AppId>,
        title: impl Into<String>,
        content: WindowContent,
    ) {
        self.dispatch_action(DesktopAction::CreateNewWindowForApp {
            app_id: app_id.into(),
            title: title.into(),
            content,
        });
    }

    /// Handles a dock icon click for `app_id`.
    pub fn activate_from_dock(
        &self,
        app_id: impl Into<AppId>,
        title: impl Into<String>,
        content: WindowContent,
    ) {
        self.sync_dock_bounds();
        self.dispatch_action(DesktopAction::ActivateFromDock {
            app_id: app_id.into(),
            title: title.into(),
            content,
        });
    }

    /// Animates the window closed.
    pub fn close_window(&self, window_id: WindowId) {
        self.dispatch_action(DesktopAction::RequestClose { window_id });
    }

    /// Animates the window into its dock icon, measuring the dock first.
    pub fn minimize_window(&self, window_id: WindowId) {
        self.sync_dock_bounds();
        self.dispatch_action(DesktopAction::RequestMinimize { window_id });
    }

    /// Re-measures the dock so minimize/restore animations target its current layout.
    pub fn sync_dock_bounds(&self) {
        let bounds = self.host.with_value(DesktopHostContext::dock_bounds);
        let current = self.state.with_untracked(|state| state.dock().bounds);
        if bounds != current {
            self.dispatch_action(DesktopAction::SetDockBounds { bounds });
        }
    }

    /// Replaces the desktop icon positions and persists them.
    pub fn set_icon_positions(&self, positions: Vec<DesktopIconPosition>) {
        self.host
            .with_value(|host| host.persist_icon_positions(positions.clone()));
        self.icon_positions.set(positions);
    }
}

fn install_runtime_orchestration(runtime: DesktopRuntimeContext) {
    effect_executor::install(runtime);
    runtime.host.get_value().install_boot_hydration(runtime);
}

#[component]
/// Provides [`DesktopRuntimeContext`] to descendant components and boots persisted preferences.
pub fn DesktopProvider(
    /// Starting configuration; persisted preferences loaded at boot replace it.
    #[prop(optional)]
    config: Option<WindowManagerConfig>,
    /// Host services; defaults to browser storage and the system clock.
    #[prop(optional)]
    host: Option<DesktopHostContext>,
    /// Called with every committed window geometry change.
    #[prop(optional)]
    on_position_update: Option<Callback<(WindowId, WindowRect)>>,
    children: Children,
) -> impl IntoView {
    let host = store_value(host.unwrap_or_default());
    let viewport = host.with_value(DesktopHostContext::viewport);
    let state = create_rw_signal(DesktopState::new(config.unwrap_or_default(), viewport));
    let effects = create_rw_signal(Vec::<RuntimeEffect>::new());
    let icon_positions = create_rw_signal(Vec::<DesktopIconPosition>::new());

    let dispatch = Callback::new(move |action: DesktopAction<WindowContent>| {
        let now_ms = host.with_value(DesktopHostContext::now_ms);
        let mut desktop = state.get_untracked();
        let previous = desktop.clone();

        match reduce_desktop(&mut desktop, action, now_ms) {
            Ok(new_effects) => {
                if desktop != previous {
                    state.set(desktop);
                }
                if !new_effects.is_empty() {
                    effects.update(|queue| queue.extend(new_effects));
                }
            }
            Err(err) => logging::warn!("window manager reducer error: {err}"),
        }
    });

    let runtime = DesktopRuntimeContext {
        host,
        state,
        effects,
        icon_positions,
        dispatch,
        on_position_update,
    };

    provide_context(runtime);
    install_runtime_orchestration(runtime);

    on_cleanup(move || host.with_value(DesktopHostContext::cancel_tick));

    children().into_view()
}

/// Returns the current [`DesktopRuntimeContext`].
///
/// # Panics
///
/// Panics if called outside [`DesktopProvider`].
pub fn use_desktop_runtime() -> DesktopRuntimeContext {
    use_context::<DesktopRuntimeContext>().expect("DesktopRuntimeContext not provided")
}
