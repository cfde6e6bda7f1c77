//! Host-side runtime helpers for executing reducer effects and querying browser environment state.
//!
//! The reducer is pure; everything that touches timers, the DOM, or storage goes through
//! [`DesktopHostContext`] so tests can swap the clock and the preference store.

mod boot;
mod browser;
mod persistence_effects;

use std::{cell::Cell, rc::Rc, time::Duration};

use leptos::{
    leptos_dom::helpers::TimeoutHandle, logging, set_timeout_with_handle, Callable, Callback,
    SignalWithUntracked,
};
use platform_host::{Clock, PrefsStore, SystemClock};
use platform_host_web::{host_strategy_name, prefs_store};

use crate::{
    content::WindowContent,
    model::{Viewport, WindowId, WindowRect},
    persistence::DesktopIconPosition,
    reducer::{DesktopAction, RuntimeEffect},
    runtime_context::DesktopRuntimeContext,
};

pub use browser::{window_primary_input_dom_id, DOCK_ELEMENT_ID};

#[derive(Clone)]
/// Host service bundle for window-manager side effects.
pub struct DesktopHostContext {
    prefs: Rc<dyn PrefsStore>,
    clock: Rc<dyn Clock>,
    tick_timer: Rc<Cell<Option<TimeoutHandle>>>,
    host_strategy_name: &'static str,
}

impl Default for DesktopHostContext {
    fn default() -> Self {
        Self::new(Rc::new(prefs_store()), Rc::new(SystemClock))
    }
}

impl DesktopHostContext {
    pub fn new(prefs: Rc<dyn PrefsStore>, clock: Rc<dyn Clock>) -> Self {
        Self {
            prefs,
            clock,
            tick_timer: Rc::new(Cell::new(None)),
            host_strategy_name: host_strategy_name(),
        }
    }

    /// Returns the configured lightweight preference service.
    pub fn prefs_store(&self) -> Rc<dyn PrefsStore> {
        self.prefs.clone()
    }

    /// Timestamp passed to the reducer with every dispatch.
    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Returns the stable name of the selected host strategy.
    pub fn host_strategy_name(&self) -> &'static str {
        self.host_strategy_name
    }

    /// Installs the initial viewport/dock measurement and asynchronous preference hydration.
    pub fn install_boot_hydration(&self, runtime: DesktopRuntimeContext) {
        boot::install_boot_hydration(self.clone(), runtime);
    }

    /// Executes a single [`RuntimeEffect`] emitted by the reducer.
    pub fn run_runtime_effect(&self, runtime: DesktopRuntimeContext, effect: RuntimeEffect) {
        match effect {
            RuntimeEffect::PositionUpdated { window_id, rect } => {
                if let Some(on_position_update) = runtime.on_position_update {
                    on_position_update.call((window_id, rect));
                }
            }
            RuntimeEffect::ScheduleTick { delay_ms } => self.schedule_tick(runtime.dispatch, delay_ms),
            RuntimeEffect::FocusWindowInput(window_id) => self.focus_window_input(window_id),
            RuntimeEffect::PersistPreferences => {
                let config = runtime.state.with_untracked(|state| state.config().clone());
                persistence_effects::persist_preferences(self.clone(), config);
            }
            RuntimeEffect::PersistDockApps => {
                let apps = runtime.state.with_untracked(|state| state.dock().apps.clone());
                persistence_effects::persist_dock_apps(self.clone(), apps);
            }
        }
    }

    /// Replaces the pending tick timer. Only one timer is ever outstanding.
    pub fn schedule_tick(&self, dispatch: Callback<DesktopAction<WindowContent>>, delay_ms: u64) {
        self.cancel_tick();
        let timer = self.tick_timer.clone();
        let scheduled = set_timeout_with_handle(
            move || {
                timer.set(None);
                dispatch.call(DesktopAction::Tick);
            },
            Duration::from_millis(delay_ms),
        );
        match scheduled {
            Ok(handle) => self.tick_timer.set(Some(handle)),
            Err(err) => logging::warn!("schedule window-manager tick failed: {err:?}"),
        }
    }

    /// Clears the pending tick timer, if any.
    pub fn cancel_tick(&self) {
        if let Some(handle) = self.tick_timer.take() {
            handle.clear();
        }
    }

    pub fn has_pending_tick(&self) -> bool {
        self.tick_timer.get().is_some()
    }

    /// Moves keyboard focus into the window's primary input, when the content renders one with
    /// [`window_primary_input_dom_id`].
    pub fn focus_window_input(&self, window_id: WindowId) {
        browser::focus_window_input(window_id);
    }

    /// Current size of the browser viewport.
    pub fn viewport(&self) -> Viewport {
        browser::viewport()
    }

    /// Bounding box of the element with id [`DOCK_ELEMENT_ID`], or `None` when it is not
    /// rendered.
    pub fn dock_bounds(&self) -> Option<WindowRect> {
        browser::dock_bounds()
    }

    /// Persists desktop icon positions on behalf of the desktop icon grid.
    pub fn persist_icon_positions(&self, positions: Vec<DesktopIconPosition>) {
        persistence_effects::persist_icon_positions(self.clone(), positions);
    }
}
