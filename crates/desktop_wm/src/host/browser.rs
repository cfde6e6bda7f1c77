#[cfg(target_arch = "wasm32")]
use wasm_bindgen::{closure::Closure, JsCast};

use crate::model::{Viewport, WindowId, WindowRect};

/// DOM id the dock collaborator renders on its root element.
pub const DOCK_ELEMENT_ID: &str = "desktop-dock";

/// DOM id window content gives its primary input so it receives focus when the window does.
pub fn window_primary_input_dom_id(window_id: WindowId) -> String {
    format!("{window_id}-primary-input")
}

pub(super) fn focus_window_input(window_id: WindowId) {
    #[cfg(target_arch = "wasm32")]
    {
        let Some(window) = web_sys::window() else {
            return;
        };
        let Some(document) = window.document() else {
            return;
        };
        let Some(element) = document.get_element_by_id(&window_primary_input_dom_id(window_id))
        else {
            return;
        };
        let Ok(element) = element.dyn_into::<web_sys::HtmlElement>() else {
            return;
        };
        let callback = Closure::once_into_js(move || {
            let _ = element.focus();
        });
        let _ = window
            .set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), 0);
    }
    #[cfg(not(target_arch = "wasm32"))]
    let _ = window_id;
}

pub(super) fn viewport() -> Viewport {
    #[cfg(target_arch = "wasm32")]
    {
        if let Some(window) = web_sys::window() {
            let default = Viewport::default();
            let width = window
                .inner_width()
                .ok()
                .and_then(|value| value.as_f64())
                .map(|value| value as i32)
                .unwrap_or(default.width);
            let height = window
                .inner_height()
                .ok()
                .and_then(|value| value.as_f64())
                .map(|value| value as i32)
                .unwrap_or(default.height);

            return Viewport::new(width.max(1), height.max(1));
        }
    }

    Viewport::default()
}

#[cfg(target_arch = "wasm32")]
pub(super) fn dock_bounds() -> Option<WindowRect> {
    let element = web_sys::window()?
        .document()?
        .get_element_by_id(DOCK_ELEMENT_ID)?;
    let rect = element.get_bounding_client_rect();
    if rect.width() <= 0.0 || rect.height() <= 0.0 {
        return None;
    }
    Some(WindowRect::new(
        rect.left().round() as i32,
        rect.top().round() as i32,
        rect.width().round() as i32,
        rect.height().round() as i32,
    ))
}

#[cfg(not(target_arch = "wasm32"))]
pub(super) fn dock_bounds() -> Option<WindowRect> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_input_id_is_scoped_to_the_window() {
        assert_eq!(window_primary_input_dom_id(WindowId(4)), "window-4-primary-input");
    }
}
