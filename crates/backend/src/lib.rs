pub mod bridge;
pub mod config;
pub mod events;
pub mod files;
pub mod settings;
pub mod shortcuts;
pub mod theme;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::runtime::Handle;
use tracing::{error, info, warn};

pub use bridge::{BridgeRequest, BridgeResponse};
pub use config::{SettingsLocation, resolve_settings_path};
pub use events::{EventEmitter, PushEvent};
pub use files::{FileDialog, OpenDialogOptions, OpenDialogResult, ReadFileResult};
pub use settings::{JsonFileBackend, SettingsBackend, SettingsMap, SettingsStore};
pub use shortcuts::{Accelerator, GlobalHotkeys, ShortcutCallback, ShortcutInfo, ShortcutRegistry};
pub use theme::{Theme, ThemeService};
pub use types::{BackendError, BackendResult};

/// Host-side core: theme, global shortcuts, settings and file services,
/// independent of the desktop framework that embeds it.
pub struct InkboardBackend<E: EventEmitter> {
    emitter: E,
    settings: Arc<SettingsStore>,
    theme: Arc<ThemeService<E>>,
    shortcuts: ShortcutRegistry,
    dialog: Arc<dyn FileDialog>,
    shut_down: AtomicBool,
}

impl<E: EventEmitter + 'static> InkboardBackend<E> {
    /// Load settings, restore the persisted theme and install the
    /// theme-switcher shortcut. `runtime` runs background persistence.
    pub async fn new(
        emitter: E,
        settings: Arc<SettingsStore>,
        hotkeys: Arc<dyn GlobalHotkeys>,
        dialog: Arc<dyn FileDialog>,
        runtime: &Handle,
    ) -> Self {
        settings.initialize().await;
        let theme = Arc::new(ThemeService::restore(emitter.clone(), settings.clone(), runtime).await);

        let shortcuts = ShortcutRegistry::new(hotkeys);
        let switcher = theme.clone();
        if !shortcuts.register_theme_switcher(Arc::new(move || {
            switcher.cycle();
        })) {
            warn!("Theme switcher shortcut is unavailable");
        }

        info!("Backend ready");
        Self {
            emitter,
            settings,
            theme,
            shortcuts,
            dialog,
            shut_down: AtomicBool::new(false),
        }
    }

    pub fn settings(&self) -> &Arc<SettingsStore> {
        &self.settings
    }

    pub fn shortcuts(&self) -> &ShortcutRegistry {
        &self.shortcuts
    }

    // =====================================
    // Theme
    // =====================================

    pub fn current_theme(&self) -> Theme {
        self.theme.current()
    }

    pub fn set_theme(&self, theme: Theme) -> Theme {
        self.theme.set(theme)
    }

    // =====================================
    // Global shortcuts
    // =====================================

    pub fn registered_shortcuts(&self) -> Vec<ShortcutInfo> {
        self.shortcuts.list()
    }

    /// Bind a shortcut on behalf of the UI. Each press broadcasts
    /// `shortcut-triggered` with `id` to every window.
    pub fn register_shortcut(&self, id: &str, accelerator: &str, description: Option<String>) -> bool {
        let emitter = self.emitter.clone();
        let trigger_id = id.to_string();
        let callback: ShortcutCallback = Arc::new(move || {
            if let Err(e) = PushEvent::ShortcutTriggered(trigger_id.clone()).send(&emitter) {
                warn!(id = %trigger_id, error = %e, "Failed to broadcast shortcut trigger");
            }
        });
        self.shortcuts.register(id, accelerator, callback, description)
    }

    pub fn unregister_shortcut(&self, id: &str) -> bool {
        self.shortcuts.unregister(id)
    }

    pub fn is_shortcut_bound(&self, accelerator: &str) -> bool {
        self.shortcuts.is_bound(accelerator)
    }

    // =====================================
    // Files
    // =====================================

    /// A dialog that cannot be shown reads as canceled.
    pub async fn show_open_dialog(&self, options: OpenDialogOptions) -> OpenDialogResult {
        match self.dialog.show_open_dialog(options).await {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "Failed to show open dialog");
                OpenDialogResult::canceled()
            }
        }
    }

    pub async fn read_file(&self, path: &str) -> ReadFileResult {
        files::read_file(path).await
    }

    // =====================================
    // Lifecycle
    // =====================================

    /// Release every global shortcut and write out a theme change the
    /// background writer has not stored yet. Only the first call has any effect.
    pub async fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("Shutting down backend");
        self.shortcuts.unregister_all();
        self.theme.flush().await;
    }
}
