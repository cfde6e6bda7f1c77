use leptos::{create_effect, logging, spawn_local, SignalSet};

use crate::{
    host::DesktopHostContext,
    persistence,
    reducer::DesktopAction,
    runtime_context::DesktopRuntimeContext,
};

pub(super) fn install_boot_hydration(host: DesktopHostContext, runtime: DesktopRuntimeContext) {
    create_effect(move |_| {
        runtime.dispatch_action(DesktopAction::ViewportResized {
            viewport: host.viewport(),
        });
        runtime.sync_dock_bounds();

        let host = host.clone();
        spawn_local(async move {
            let prefs = host.prefs_store();
            let (config, dock_apps, icon_positions) = futures::join!(
                persistence::load_wm_preferences(prefs.as_ref()),
                persistence::load_dock_apps(prefs.as_ref()),
                persistence::load_icon_positions(prefs.as_ref()),
            );

            match config {
                Ok(Some(config)) => {
                    runtime.dispatch_action(DesktopAction::HydratePreferences { config });
                }
                Ok(None) => {}
                Err(err) => logging::warn!("window-manager preferences load failed: {err}"),
            }

            match dock_apps {
                Ok(Some(apps)) => runtime.dispatch_action(DesktopAction::SetDockApps { apps }),
                Ok(None) => {}
                Err(err) => logging::warn!("dock apps load failed: {err}"),
            }

            match icon_positions {
                Ok(positions) => runtime.icon_positions.set(positions),
                Err(err) => logging::warn!("desktop icon positions load failed: {err}"),
            }
        });
    });
}
