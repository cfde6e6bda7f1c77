//! Opaque renderable payload carried by each window record.

use std::{fmt, rc::Rc};

use leptos::{IntoView, View};

/// Shared view factory for a window's body.
///
/// The window manager never inspects it; the window component calls [`render`](Self::render)
/// once when the window mounts. Equality is identity, so cloning a record does not make the
/// runtime think the content changed.
#[derive(Clone)]
pub struct WindowContent(Rc<dyn Fn() -> View>);

impl WindowContent {
    pub fn new<F, V>(render: F) -> Self
    where
        F: Fn() -> V + 'static,
        V: IntoView,
    {
        Self(Rc::new(move || render().into_view()))
    }

    /// Content that is just a line of text.
    pub fn text(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::new(move || text.clone())
    }

    pub fn render(&self) -> View {
        (self.0)()
    }
}

impl fmt::Debug for WindowContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WindowContent(..)")
    }
}

impl PartialEq for WindowContent {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_identity() {
        let a = WindowContent::text("hello");
        let b = WindowContent::text("hello");
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_eq!(format!("{a:?}"), "WindowContent(..)");
    }
}
