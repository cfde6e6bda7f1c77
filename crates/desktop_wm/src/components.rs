//! Window layer UI composition and pointer plumbing.

mod window;

use leptos::*;

use self::window::DesktopWindow;

use crate::{
    animation::WINDOW_TRANSITION_CSS,
    host::DesktopHostContext,
    model::{PointerPosition, WindowId},
    reducer::DesktopAction,
};

pub use crate::runtime_context::{use_desktop_runtime, DesktopProvider, DesktopRuntimeContext};

#[component]
/// Renders every window record and owns the global pointer and viewport listeners.
///
/// Pointer moves are observed on `window` rather than on the window element so a fast drag that
/// outruns the title bar keeps tracking.
pub fn DesktopWindowLayer() -> impl IntoView {
    let runtime = use_desktop_runtime();

    let pointer_move = window_event_listener(ev::pointermove, move |ev| {
        if runtime
            .state
            .with_untracked(|state| state.active_gesture().is_none())
        {
            return;
        }
        runtime.dispatch_action(DesktopAction::PointerMoved {
            pointer: pointer_from_pointer_event(&ev),
        });
    });
    let pointer_up = window_event_listener(ev::pointerup, move |_| end_active_gesture(runtime));
    let pointer_cancel =
        window_event_listener(ev::pointercancel, move |_| end_active_gesture(runtime));
    let resize = window_event_listener(ev::resize, move |_| {
        let viewport = runtime.host.with_value(DesktopHostContext::viewport);
        runtime.dispatch_action(DesktopAction::ViewportResized { viewport });
        runtime.sync_dock_bounds();
    });
    on_cleanup(move || {
        pointer_move.remove();
        pointer_up.remove();
        pointer_cancel.remove();
        resize.remove();
    });

    let window_ids = move || {
        runtime.state.with(|state| {
            state
                .registry()
                .windows()
                .iter()
                .map(|window| window.id)
                .collect::<Vec<WindowId>>()
        })
    };

    view! {
        <div
            class="ui-window-layer"
            data-ui-primitive="true"
            data-ui-kind="desktop-window-layer"
            data-reduced-motion=move || {
                runtime.state.with(|state| state.config().reduced_motion.to_string())
            }
        >
            <style>{WINDOW_TRANSITION_CSS}</style>
            <For each=window_ids key=|window_id| window_id.0 let:window_id>
                <DesktopWindow window_id=window_id />
            </For>
        </div>
    }
}

fn end_active_gesture(runtime: DesktopRuntimeContext) {
    if runtime
        .state
        .with_untracked(|state| state.active_gesture().is_some())
    {
        runtime.dispatch_action(DesktopAction::PointerReleased);
    }
}

fn stop_mouse_event(ev: &web_sys::MouseEvent) {
    ev.prevent_default();
    ev.stop_propagation();
}

fn pointer_from_pointer_event(ev: &web_sys::PointerEvent) -> PointerPosition {
    PointerPosition {
        x: ev.client_x(),
        y: ev.client_y(),
    }
}
