use inkboard_backend::{InkboardBackend, SettingsLocation, SettingsStore, resolve_settings_path};
use std::sync::Arc;
use tauri::{Manager, RunEvent};
use tracing::info;

mod commands;
mod dialog;
mod event_emitter;
mod hotkeys;
mod logging;
mod state;
mod window;

use dialog::TauriFileDialog;
use event_emitter::TauriEventEmitter;
use hotkeys::TauriHotkeys;
use state::AppState;

// =====================================
// Main Application Entry Point
// =====================================

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    logging::init();

    let app = tauri::Builder::default()
        .plugin(tauri_plugin_dialog::init())
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_global_shortcut::Builder::new().build())
        .setup(|app| {
            let handle = app.handle().clone();

            let settings_path = resolve_settings_path(&SettingsLocation::User)?;
            info!(path = %settings_path.display(), "Using settings file");
            let settings = Arc::new(SettingsStore::json_file(settings_path));

            let runtime = tauri::async_runtime::handle();
            let backend = tauri::async_runtime::block_on(InkboardBackend::new(
                TauriEventEmitter::new(handle.clone()),
                settings,
                Arc::new(TauriHotkeys::new(handle.clone())),
                Arc::new(TauriFileDialog::new(handle)),
                runtime.inner(),
            ));

            app.manage(AppState {
                backend: Arc::new(backend),
            });
            window::open_main_window(app.handle())?;
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![commands::bridge])
        .build(tauri::generate_context!())
        .expect("error while building tauri application");

    app.run(|app_handle, event| match event {
        // On macOS the app outlives its last window, as native apps do.
        #[cfg(target_os = "macos")]
        RunEvent::ExitRequested { code: None, api, .. } => api.prevent_exit(),
        #[cfg(target_os = "macos")]
        RunEvent::Reopen {
            has_visible_windows: false,
            ..
        } => {
            if let Err(e) = window::open_main_window(app_handle) {
                tracing::error!(error = %e, "Failed to reopen main window");
            }
        }
        RunEvent::Exit => {
            if let Some(state) = app_handle.try_state::<AppState>() {
                tauri::async_runtime::block_on(state.backend.shutdown());
            }
        }
        _ => {}
    });
}
