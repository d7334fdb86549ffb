use inkboard_backend::{Accelerator, BackendError, BackendResult, GlobalHotkeys, ShortcutCallback};
use tauri::AppHandle;
use tauri_plugin_global_shortcut::{GlobalShortcutExt, Shortcut, ShortcutState};

/// OS-level shortcuts through the global-shortcut plugin.
pub struct TauriHotkeys {
    app_handle: AppHandle,
}

impl TauriHotkeys {
    pub const fn new(app_handle: AppHandle) -> Self {
        Self { app_handle }
    }
}

fn to_shortcut(accelerator: &Accelerator) -> BackendResult<Shortcut> {
    accelerator
        .to_string()
        .parse::<Shortcut>()
        .map_err(|e| BackendError::InvalidAccelerator(format!("{accelerator}: {e}")))
}

impl GlobalHotkeys for TauriHotkeys {
    fn register(&self, accelerator: &Accelerator, callback: ShortcutCallback) -> BackendResult<()> {
        let shortcut = to_shortcut(accelerator)?;
        let global_shortcut = self.app_handle.global_shortcut();
        if global_shortcut.is_registered(shortcut) {
            return Err(BackendError::ShortcutUnavailable(accelerator.to_string()));
        }

        global_shortcut
            .on_shortcut(shortcut, move |_app, _shortcut, event| {
                if event.state == ShortcutState::Pressed {
                    callback();
                }
            })
            .map_err(|e| {
                let message = e.to_string();
                if message.to_ascii_lowercase().contains("already") {
                    BackendError::ShortcutUnavailable(accelerator.to_string())
                } else {
                    BackendError::HotkeyBackend(message)
                }
            })
    }

    fn unregister(&self, accelerator: &Accelerator) -> BackendResult<()> {
        let shortcut = to_shortcut(accelerator)?;
        self.app_handle
            .global_shortcut()
            .unregister(shortcut)
            .map_err(|e| BackendError::HotkeyBackend(e.to_string()))
    }

    fn unregister_all(&self) -> BackendResult<()> {
        self.app_handle
            .global_shortcut()
            .unregister_all()
            .map_err(|e| BackendError::HotkeyBackend(e.to_string()))
    }

    fn is_registered(&self, accelerator: &Accelerator) -> bool {
        to_shortcut(accelerator)
            .is_ok_and(|shortcut| self.app_handle.global_shortcut().is_registered(shortcut))
    }
}
