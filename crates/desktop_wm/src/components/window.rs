use super::*;
use crate::{
    model::ResizeEdge,
    reducer::WindowPhase,
    runtime_context::ShellState,
};
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsCast;

#[cfg(target_arch = "wasm32")]
fn try_set_pointer_capture(ev: &web_sys::PointerEvent) {
    if let Some(target) = ev.current_target() {
        if let Ok(element) = target.dyn_into::<web_sys::Element>() {
            let _ = element.set_pointer_capture(ev.pointer_id());
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn try_set_pointer_capture(_: &web_sys::PointerEvent) {}

fn is_primary_press(ev: &web_sys::PointerEvent) -> bool {
    if ev.pointer_type() == "mouse" {
        ev.button() == 0
    } else {
        ev.is_primary()
    }
}

/// Inline style for a window: position, stacking, and the running animation if any.
fn window_style(state: &ShellState, window_id: WindowId) -> String {
    let (Some(record), Some(rect)) = (
        state.registry().get_window_by_id(window_id),
        state.display_rect(window_id),
    ) else {
        return "display:none;".to_string();
    };
    let mut style = format!(
        "left:{}px;top:{}px;width:{}px;height:{}px;z-index:{};",
        rect.x, rect.y, rect.w, rect.h, record.z_index
    );
    match state.window_phase(window_id) {
        Some(WindowPhase::Minimized) => style.push_str("display:none;"),
        Some(phase) => {
            if phase == WindowPhase::Closing {
                style.push_str("pointer-events:none;");
            }
            if let Some(active) = state.animation(window_id) {
                style.push_str(&active.spec.css_declarations());
            }
        }
        None => {}
    }
    style
}

#[component]
pub(super) fn DesktopWindow(window_id: WindowId) -> impl IntoView {
    let runtime = use_desktop_runtime();
    let state = runtime.state;

    let title = move || {
        state.with(|s| {
            s.registry()
                .get_window_by_id(window_id)
                .map(|w| w.title.clone())
                .unwrap_or_default()
        })
    };
    let focused = move || state.with(|s| s.registry().is_focused(window_id));
    let maximized = move || {
        state.with(|s| {
            s.registry()
                .get_window_by_id(window_id)
                .is_some_and(|w| w.maximized)
        })
    };
    let phase = move || {
        state.with(|s| {
            s.window_phase(window_id)
                .map(WindowPhase::as_str)
                .unwrap_or("closed")
        })
    };
    let style = move || state.with(|s| window_style(s, window_id));
    let content = state.with_untracked(|s| {
        s.registry()
            .get_window_by_id(window_id)
            .map(|w| w.content.clone())
    });

    let focus = move |_: web_sys::PointerEvent| {
        let already_top = state.with_untracked(|s| {
            let registry = s.registry();
            registry.is_focused(window_id)
                && registry
                    .get_window_by_id(window_id)
                    .is_some_and(|w| w.z_index == registry.current_max_z_index())
        });
        if !already_top {
            runtime.dispatch_action(DesktopAction::FocusWindow { window_id });
        }
    };
    let begin_move = move |ev: web_sys::PointerEvent| {
        if !is_primary_press(&ev) {
            return;
        }
        try_set_pointer_capture(&ev);
        ev.prevent_default();
        ev.stop_propagation();
        runtime.dispatch_action(DesktopAction::BeginMove {
            window_id,
            pointer: pointer_from_pointer_event(&ev),
        });
    };
    let titlebar_double_click = move |ev: web_sys::MouseEvent| {
        stop_mouse_event(&ev);
        runtime.dispatch_action(DesktopAction::ToggleMaximize { window_id });
    };

    view! {
        <section
            class="desktop-window"
            class:focused=focused
            class:maximized=maximized
            data-ui-kind="window-frame"
            data-window-id=window_id.0
            data-phase=phase
            style=style
            role="dialog"
            aria-label=title
            on:pointerdown=focus
        >
            <header
                class="titlebar"
                data-ui-kind="window-titlebar"
                on:pointerdown=begin_move
                on:dblclick=titlebar_double_click
            >
                <span class="titlebar-title">{title}</span>
                <div class="titlebar-controls">
                    <button
                        aria-label="Minimize window"
                        on:pointerdown=move |ev: web_sys::PointerEvent| ev.stop_propagation()
                        on:click=move |ev| {
                            stop_mouse_event(&ev);
                            runtime.minimize_window(window_id);
                        }
                    >
                        "_"
                    </button>
                    <button
                        aria-label=move || {
                            if maximized() { "Restore window" } else { "Maximize window" }
                        }
                        on:pointerdown=move |ev: web_sys::PointerEvent| ev.stop_propagation()
                        on:click=move |ev| {
                            stop_mouse_event(&ev);
                            runtime.dispatch_action(DesktopAction::ToggleMaximize { window_id });
                        }
                    >
                        {move || if maximized() { "❐" } else { "□" }}
                    </button>
                    <button
                        aria-label="Close window"
                        on:pointerdown=move |ev: web_sys::PointerEvent| ev.stop_propagation()
                        on:click=move |ev| {
                            stop_mouse_event(&ev);
                            runtime.close_window(window_id);
                        }
                    >
                        "×"
                    </button>
                </div>
            </header>
            <div class="window-body">
                {content.map(|content| content.render())}
            </div>
            <Show when=move || !maximized() fallback=|| ()>
                {ResizeEdge::ALL
                    .into_iter()
                    .map(|edge| view! { <WindowResizeHandle window_id=window_id edge=edge /> })
                    .collect_view()}
            </Show>
        </section>
    }
}

#[component]
fn WindowResizeHandle(window_id: WindowId, edge: ResizeEdge) -> impl IntoView {
    let runtime = use_desktop_runtime();
    let class_name = format!("window-resize-handle edge-{}", edge.handle());

    let on_pointerdown = move |ev: web_sys::PointerEvent| {
        if !is_primary_press(&ev) {
            return;
        }
        try_set_pointer_capture(&ev);
        ev.prevent_default();
        ev.stop_propagation();
        runtime.dispatch_action(DesktopAction::BeginResize {
            window_id,
            edge,
            pointer: pointer_from_pointer_event(&ev),
        });
    };

    view! {
        <div
            class=class_name
            data-ui-kind="resize-handle"
            data-ui-slot=edge.handle()
            aria-hidden="true"
            on:pointerdown=on_pointerdown
        />
    }
}
