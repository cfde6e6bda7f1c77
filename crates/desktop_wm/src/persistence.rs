//! Preference persistence for the window manager and its collaborators.
//!
//! Window layout is ephemeral and never written. What survives a reload is collaborator-owned
//! state (desktop icon positions, dock membership) and the window-manager preferences, all stored
//! as JSON through a [`PrefsStore`].

use platform_host::{load_pref_with, save_pref_with, PrefsError, PrefsStore};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    config::{WindowManagerConfig, WM_PREFERENCES_SCHEMA_VERSION},
    model::AppId,
};

pub const ICON_POSITIONS_KEY: &str = "desktop.icon_positions.v1";
pub const DOCK_APPS_KEY: &str = "desktop.dock_apps.v1";
pub const WM_PREFERENCES_KEY: &str = "desktop.wm.preferences.v1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Saved position of one desktop icon.
pub struct DesktopIconPosition {
    pub app_id: AppId,
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// One app pinned to the dock, in dock order.
pub struct DockEntry {
    pub app_id: AppId,
}

#[derive(Debug, Error)]
/// Failures loading or saving persisted desktop preferences.
pub enum PersistenceError {
    #[error(transparent)]
    Store(#[from] PrefsError),
    #[error("preferences schema v{found} is newer than supported v{supported}")]
    UnsupportedSchema { found: u32, supported: u32 },
}

/// Loads saved desktop icon positions. Missing data yields an empty list.
///
/// # Errors
///
/// Returns an error when the store fails or the stored JSON is malformed.
pub async fn load_icon_positions(
    store: &dyn PrefsStore,
) -> Result<Vec<DesktopIconPosition>, PersistenceError> {
    Ok(load_pref_with(store, ICON_POSITIONS_KEY)
        .await?
        .unwrap_or_default())
}

/// Persists desktop icon positions.
///
/// # Errors
///
/// Returns an error when the store rejects the write.
pub async fn save_icon_positions(
    store: &dyn PrefsStore,
    positions: &[DesktopIconPosition],
) -> Result<(), PersistenceError> {
    save_pref_with(store, ICON_POSITIONS_KEY, &positions).await?;
    Ok(())
}

/// Loads dock membership in display order, or `None` when nothing was saved yet.
///
/// # Errors
///
/// Returns an error when the store fails or the stored JSON is malformed.
pub async fn load_dock_apps(store: &dyn PrefsStore) -> Result<Option<Vec<AppId>>, PersistenceError> {
    let entries: Option<Vec<DockEntry>> = load_pref_with(store, DOCK_APPS_KEY).await?;
    Ok(entries.map(|entries| entries.into_iter().map(|entry| entry.app_id).collect()))
}

/// Persists dock membership in display order.
///
/// # Errors
///
/// Returns an error when the store rejects the write.
pub async fn save_dock_apps(store: &dyn PrefsStore, apps: &[AppId]) -> Result<(), PersistenceError> {
    let entries: Vec<DockEntry> = apps
        .iter()
        .map(|app_id| DockEntry {
            app_id: app_id.clone(),
        })
        .collect();
    save_pref_with(store, DOCK_APPS_KEY, &entries).await?;
    Ok(())
}

/// Loads window-manager preferences, filling missing fields with defaults and repairing
/// out-of-range values.
///
/// # Errors
///
/// Returns an error when the store fails, the JSON is malformed, or the schema version is newer
/// than this build understands.
pub async fn load_wm_preferences(
    store: &dyn PrefsStore,
) -> Result<Option<WindowManagerConfig>, PersistenceError> {
    let Some(config) = load_pref_with::<_, WindowManagerConfig>(store, WM_PREFERENCES_KEY).await?
    else {
        return Ok(None);
    };
    if config.schema_version > WM_PREFERENCES_SCHEMA_VERSION {
        return Err(PersistenceError::UnsupportedSchema {
            found: config.schema_version,
            supported: WM_PREFERENCES_SCHEMA_VERSION,
        });
    }
    Ok(Some(config.sanitized()))
}

/// Persists window-manager preferences.
///
/// # Errors
///
/// Returns an error when the store rejects the write.
pub async fn save_wm_preferences(
    store: &dyn PrefsStore,
    config: &WindowManagerConfig,
) -> Result<(), PersistenceError> {
    save_pref_with(store, WM_PREFERENCES_KEY, config).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use platform_host::MemoryPrefsStore;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn icon_positions_use_camel_case_app_id() {
        let store = MemoryPrefsStore::default();
        let positions = vec![DesktopIconPosition {
            app_id: AppId::from("notes"),
            x: 24,
            y: 96,
        }];
        block_on(save_icon_positions(&store, &positions)).expect("save");
        assert_eq!(
            store.raw(ICON_POSITIONS_KEY).as_deref(),
            Some(r#"[{"appId":"notes","x":24,"y":96}]"#)
        );
        assert_eq!(block_on(load_icon_positions(&store)).expect("load"), positions);
    }

    #[test]
    fn missing_icon_positions_load_as_empty() {
        let store = MemoryPrefsStore::default();
        assert_eq!(block_on(load_icon_positions(&store)).expect("load"), Vec::new());
    }

    #[test]
    fn dock_apps_keep_their_order() {
        let store = MemoryPrefsStore::default();
        assert_eq!(block_on(load_dock_apps(&store)).expect("empty"), None);

        let apps = vec![AppId::from("terminal"), AppId::from("notes")];
        block_on(save_dock_apps(&store, &apps)).expect("save");
        assert_eq!(
            store.raw(DOCK_APPS_KEY).as_deref(),
            Some(r#"[{"appId":"terminal"},{"appId":"notes"}]"#)
        );
        assert_eq!(block_on(load_dock_apps(&store)).expect("load"), Some(apps));
    }

    #[test]
    fn malformed_dock_data_is_an_error() {
        let store = MemoryPrefsStore::default();
        block_on(store.save_pref(DOCK_APPS_KEY, "{\"appId\":")).expect("raw save");
        let err = block_on(load_dock_apps(&store)).expect_err("malformed");
        assert!(matches!(err, PersistenceError::Store(PrefsError::Serde { .. })));
    }

    #[test]
    fn wm_preferences_are_sanitized_and_versioned() {
        let store = MemoryPrefsStore::default();
        block_on(store.save_pref(
            WM_PREFERENCES_KEY,
            r#"{"schema_version":1,"reduced_motion":true,"cascade_offset":-4}"#,
        ))
        .expect("raw save");
        let config = block_on(load_wm_preferences(&store))
            .expect("load")
            .expect("present");
        assert!(config.reduced_motion);
        assert_eq!(config.cascade_offset, 30);

        block_on(store.save_pref(WM_PREFERENCES_KEY, r#"{"schema_version":9}"#)).expect("raw save");
        let err = block_on(load_wm_preferences(&store)).expect_err("future schema");
        assert!(matches!(
            err,
            PersistenceError::UnsupportedSchema {
                found: 9,
                supported: 1
            }
        ));
    }

    #[test]
    fn wm_preferences_round_trip() {
        let store = MemoryPrefsStore::default();
        let config = WindowManagerConfig {
            dev_mode: true,
            ..WindowManagerConfig::default()
        };
        block_on(save_wm_preferences(&store, &config)).expect("save");
        assert_eq!(
            block_on(load_wm_preferences(&store)).expect("load"),
            Some(config)
        );
    }
}
