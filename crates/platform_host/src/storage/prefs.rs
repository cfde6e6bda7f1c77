//! Lightweight preference storage contracts and adapters.
//!
//! Preferences are JSON text stored per key. The desktop shell keeps its collaborator-owned
//! layout (desktop icon positions, dock membership) and window-manager preferences here.

use std::{cell::RefCell, collections::HashMap, future::Future, pin::Pin, rc::Rc};

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Object-safe boxed future used by [`PrefsStore`] async methods.
pub type PrefsStoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

#[derive(Debug, Error)]
/// Failures raised by preference stores and the typed helpers.
pub enum PrefsError {
    /// The backing store is not available in this environment.
    #[error("preference storage unavailable")]
    Unavailable,
    /// The backing store rejected the operation.
    #[error("preference store operation failed for `{key}`: {message}")]
    Backend {
        /// Preference key being accessed.
        key: String,
        /// Host-provided failure description.
        message: String,
    },
    /// A stored or outgoing value could not be (de)serialized.
    #[error("preference `{key}` is not valid JSON for the requested type: {source}")]
    Serde {
        /// Preference key being accessed.
        key: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

/// Host service for lightweight preference values (JSON stored as text per key).
pub trait PrefsStore {
    /// Loads a raw JSON string for a preference key.
    fn load_pref<'a>(
        &'a self,
        key: &'a str,
    ) -> PrefsStoreFuture<'a, Result<Option<String>, PrefsError>>;

    /// Saves a raw JSON string for a preference key.
    fn save_pref<'a>(
        &'a self,
        key: &'a str,
        raw_json: &'a str,
    ) -> PrefsStoreFuture<'a, Result<(), PrefsError>>;

    /// Deletes a preference key.
    fn delete_pref<'a>(&'a self, key: &'a str) -> PrefsStoreFuture<'a, Result<(), PrefsError>>;
}

#[derive(Debug, Clone, Copy, Default)]
/// No-op preference store for unsupported targets and baseline tests.
pub struct NoopPrefsStore;

impl PrefsStore for NoopPrefsStore {
    fn load_pref<'a>(
        &'a self,
        _key: &'a str,
    ) -> PrefsStoreFuture<'a, Result<Option<String>, PrefsError>> {
        Box::pin(async { Ok(None) })
    }

    fn save_pref<'a>(
        &'a self,
        _key: &'a str,
        _raw_json: &'a str,
    ) -> PrefsStoreFuture<'a, Result<(), PrefsError>> {
        Box::pin(async { Ok(()) })
    }

    fn delete_pref<'a>(&'a self, _key: &'a str) -> PrefsStoreFuture<'a, Result<(), PrefsError>> {
        Box::pin(async { Ok(()) })
    }
}

#[derive(Debug, Clone, Default)]
/// In-memory preference store keyed by string.
///
/// Clones share the same backing map, so a test can hand one clone to the runtime and inspect
/// writes through another.
pub struct MemoryPrefsStore {
    inner: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryPrefsStore {
    /// Returns the raw JSON currently stored under `key`.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.inner.borrow().get(key).cloned()
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    /// Returns `true` when nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }
}

impl PrefsStore for MemoryPrefsStore {
    fn load_pref<'a>(
        &'a self,
        key: &'a str,
    ) -> PrefsStoreFuture<'a, Result<Option<String>, PrefsError>> {
        Box::pin(async move { Ok(self.raw(key)) })
    }

    fn save_pref<'a>(
        &'a self,
        key: &'a str,
        raw_json: &'a str,
    ) -> PrefsStoreFuture<'a, Result<(), PrefsError>> {
        Box::pin(async move {
            self.inner
                .borrow_mut()
                .insert(key.to_string(), raw_json.to_string());
            Ok(())
        })
    }

    fn delete_pref<'a>(&'a self, key: &'a str) -> PrefsStoreFuture<'a, Result<(), PrefsError>> {
        Box::pin(async move {
            self.inner.borrow_mut().remove(key);
            Ok(())
        })
    }
}

/// Loads and deserializes a typed preference value through a [`PrefsStore`] implementation.
///
/// # Errors
///
/// Returns an error when the store fails or the stored JSON does not match `T`.
pub async fn load_pref_with<S: PrefsStore + ?Sized, T: DeserializeOwned>(
    store: &S,
    key: &str,
) -> Result<Option<T>, PrefsError> {
    let Some(raw) = store.load_pref(key).await? else {
        return Ok(None);
    };
    let value = serde_json::from_str(&raw).map_err(|source| PrefsError::Serde {
        key: key.to_string(),
        source,
    })?;
    Ok(Some(value))
}

/// Serializes and saves a typed preference value through a [`PrefsStore`] implementation.
///
/// # Errors
///
/// Returns an error when serialization or the store save fails.
pub async fn save_pref_with<S: PrefsStore + ?Sized, T: Serialize>(
    store: &S,
    key: &str,
    value: &T,
) -> Result<(), PrefsError> {
    let raw = serde_json::to_string(value).map_err(|source| PrefsError::Serde {
        key: key.to_string(),
        source,
    })?;
    store.save_pref(key, &raw).await
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct DockEntry {
        app_id: String,
    }

    #[test]
    fn memory_prefs_store_shares_state_between_clones() {
        let store = MemoryPrefsStore::default();
        let observer = store.clone();
        let store_obj: &dyn PrefsStore = &store;

        block_on(store_obj.save_pref("desktop.dock", "[]")).expect("save");
        assert_eq!(observer.raw("desktop.dock"), Some("[]".to_string()));
        assert_eq!(observer.len(), 1);

        block_on(store_obj.delete_pref("desktop.dock")).expect("delete");
        assert!(observer.is_empty());
        assert_eq!(
            block_on(store_obj.load_pref("desktop.dock")).expect("load"),
            None
        );
    }

    #[test]
    fn typed_pref_helpers_round_trip() {
        let store = MemoryPrefsStore::default();
        block_on(save_pref_with(
            &store,
            "dock",
            &vec![DockEntry {
                app_id: "notes".to_string(),
            }],
        ))
        .expect("save typed pref");

        let loaded: Option<Vec<DockEntry>> =
            block_on(load_pref_with(&store, "dock")).expect("load typed pref");
        assert_eq!(
            loaded,
            Some(vec![DockEntry {
                app_id: "notes".to_string()
            }])
        );
    }

    #[test]
    fn malformed_json_reports_the_key() {
        let store = MemoryPrefsStore::default();
        block_on(store.save_pref("dock", "{not json")).expect("save raw");

        let err = block_on(load_pref_with::<_, Vec<DockEntry>>(&store, "dock"))
            .expect_err("malformed payload should fail");
        assert!(matches!(err, PrefsError::Serde { ref key, .. } if key == "dock"));
        assert!(err.to_string().contains("`dock`"));
    }

    #[test]
    fn noop_prefs_store_is_empty_and_successful() {
        let store = NoopPrefsStore;
        let store_obj: &dyn PrefsStore = &store;
        assert_eq!(block_on(store_obj.load_pref("k")).expect("load"), None);
        block_on(store_obj.save_pref("k", "{}")).expect("save");
        block_on(store_obj.delete_pref("k")).expect("delete");
    }
}
