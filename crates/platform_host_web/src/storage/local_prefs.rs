//! `localStorage`-backed preference store implementation.
//!
//! The browser API is synchronous; [`WebPrefsStore`] exposes both the synchronous helpers and
//! the async [`platform_host::PrefsStore`] contract the desktop runtime consumes.

use platform_host::{PrefsError, PrefsStore, PrefsStoreFuture};

#[derive(Debug, Clone, Copy, Default)]
/// Browser preference store backed by `window.localStorage`.
pub struct WebPrefsStore;

#[cfg(target_arch = "wasm32")]
fn local_storage() -> Result<web_sys::Storage, PrefsError> {
    web_sys::window()
        .and_then(|w| w.local_storage().ok().flatten())
        .ok_or(PrefsError::Unavailable)
}

impl WebPrefsStore {
    /// Loads a raw JSON string for a preference key.
    pub fn load_json(self, key: &str) -> Result<Option<String>, PrefsError> {
        #[cfg(target_arch = "wasm32")]
        {
            local_storage()?
                .get_item(key)
                .map_err(|e| PrefsError::Backend {
                    key: key.to_string(),
                    message: format!("localStorage get_item failed: {e:?}"),
                })
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = key;
            Ok(None)
        }
    }

    /// Saves a raw JSON string for a preference key.
    ///
    /// # Errors
    ///
    /// Returns an error when localStorage is unavailable or the write fails (for example when the
    /// quota is exhausted).
    pub fn save_json(self, key: &str, raw_json: &str) -> Result<(), PrefsError> {
        #[cfg(target_arch = "wasm32")]
        {
            local_storage()?
                .set_item(key, raw_json)
                .map_err(|e| PrefsError::Backend {
                    key: key.to_string(),
                    message: format!("localStorage set_item failed: {e:?}"),
                })
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = (key, raw_json);
            Ok(())
        }
    }

    /// Deletes a preference key from localStorage.
    ///
    /// # Errors
    ///
    /// Returns an error when localStorage is unavailable or the delete fails.
    pub fn delete_json(self, key: &str) -> Result<(), PrefsError> {
        #[cfg(target_arch = "wasm32")]
        {
            local_storage()?
                .remove_item(key)
                .map_err(|e| PrefsError::Backend {
                    key: key.to_string(),
                    message: format!("localStorage remove_item failed: {e:?}"),
                })
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = key;
            Ok(())
        }
    }
}

impl PrefsStore for WebPrefsStore {
    fn load_pref<'a>(
        &'a self,
        key: &'a str,
    ) -> PrefsStoreFuture<'a, Result<Option<String>, PrefsError>> {
        let store = *self;
        Box::pin(async move { store.load_json(key) })
    }

    fn save_pref<'a>(
        &'a self,
        key: &'a str,
        raw_json: &'a str,
    ) -> PrefsStoreFuture<'a, Result<(), PrefsError>> {
        let store = *self;
        Box::pin(async move { store.save_json(key, raw_json) })
    }

    fn delete_pref<'a>(&'a self, key: &'a str) -> PrefsStoreFuture<'a, Result<(), PrefsError>> {
        let store = *self;
        Box::pin(async move { store.delete_json(key) })
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use futures::executor::block_on;
    use platform_host::{load_pref_with, save_pref_with};

    use super::*;

    #[test]
    fn native_build_degrades_to_empty_store() {
        let store = WebPrefsStore;
        assert_eq!(store.load_json("desktop.dock_apps.v1").expect("load"), None);
        block_on(save_pref_with(&store, "desktop.dock_apps.v1", &vec!["notes"])).expect("save");
        assert_eq!(
            block_on(load_pref_with::<_, Vec<String>>(&store, "desktop.dock_apps.v1"))
                .expect("typed load"),
            None
        );
        assert_eq!(
            block_on(store.load_pref("desktop.dock_apps.v1")).expect("async load"),
            None
        );
    }
}
