use leptos::{logging, spawn_local};

use crate::{
    config::WindowManagerConfig,
    host::DesktopHostContext,
    model::AppId,
    persistence::{self, DesktopIconPosition},
};

pub(super) fn persist_preferences(host: DesktopHostContext, config: WindowManagerConfig) {
    spawn_local(async move {
        let prefs = host.prefs_store();
        if let Err(err) = persistence::save_wm_preferences(prefs.as_ref(), &config).await {
            logging::warn!("persist window-manager preferences failed: {err}");
        }
    });
}

pub(super) fn persist_dock_apps(host: DesktopHostContext, apps: Vec<AppId>) {
    spawn_local(async move {
        let prefs = host.prefs_store();
        if let Err(err) = persistence::save_dock_apps(prefs.as_ref(), &apps).await {
            logging::warn!("persist dock apps failed: {err}");
        }
    });
}

pub(super) fn persist_icon_positions(host: DesktopHostContext, positions: Vec<DesktopIconPosition>) {
    spawn_local(async move {
        let prefs = host.prefs_store();
        if let Err(err) = persistence::save_icon_positions(prefs.as_ref(), &positions).await {
            logging::warn!("persist desktop icon positions failed: {err}");
        }
    });
}
