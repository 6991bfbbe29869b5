mod config;
mod error;
mod focus_core;
mod models;
mod services;
mod shell;

use std::sync::Arc;
use tauri::{Emitter, Manager};

use crate::config::Settings;
use crate::focus_core::credentials::KeyringCredentials;
use crate::focus_core::FocusCore;
use crate::services::Services;
use crate::shell::{commands, FocusHub, RENDER_EVENT};

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    let settings = Settings::load();
    let core = Arc::new(FocusCore::new(Arc::new(KeyringCredentials), &settings));

    tauri::Builder::default()
        .plugin(
            tauri_plugin_log::Builder::default()
                .level(settings.log_level())
                .build(),
        )
        .plugin(tauri_plugin_store::Builder::new().build())
        .plugin(focus_core::init(core))
        .setup(move |app| {
            let services = Services::detect(app.handle(), &settings);
            let handle = app.handle().clone();
            let hub = FocusHub::new(services, &settings).with_listener(move |render| {
                if let Err(e) = handle.emit(RENDER_EVENT, render) {
                    log::error!("Failed to emit {RENDER_EVENT}: {e}");
                }
            });
            app.manage(hub.clone());

            tauri::async_runtime::spawn(async move {
                if let Err(e) = hub.init().await {
                    log::error!("Failed to initialize Focus Hub: {e}");
                }
            });
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::shell_render,
            commands::navigate_to,
            commands::toggle_watch,
            commands::open_watchlist,
            commands::close_watchlist,
            commands::search_watchlist,
            commands::open_settings,
            commands::close_settings,
            commands::edit_settings,
            commands::save_settings,
            commands::projects_select_repo,
            commands::projects_select_issue,
            commands::projects_close_issue,
            commands::projects_edit_instructions,
            commands::projects_dispatch,
            commands::knowledge_select_repo,
            commands::knowledge_select_file,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
