//! Request/response catalog between the UI process and the host.
//!
//! Every request resolves to a value. Failures are reported in-band as
//! `false`, `null`, an empty mapping or a negative result object.

use crate::events::EventEmitter;
use crate::files::{OpenDialogOptions, OpenDialogResult, ReadFileResult};
use crate::settings::SettingsMap;
use crate::shortcuts::ShortcutInfo;
use crate::theme::Theme;
use crate::types::BackendResult;
use crate::InkboardBackend;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum BridgeRequest {
    GetCurrentTheme,
    SetTheme {
        theme: Theme,
    },
    GetRegisteredShortcuts,
    RegisterShortcut {
        id: String,
        accelerator: String,
        #[serde(default)]
        description: Option<String>,
    },
    UnregisterShortcut {
        id: String,
    },
    StorageGet {
        key: String,
    },
    StorageSet {
        key: String,
        value: Value,
    },
    StorageRemove {
        key: String,
    },
    StorageClear,
    StorageHas {
        key: String,
    },
    StorageGetAll,
    StorageSetMultiple {
        entries: SettingsMap,
    },
    StorageRemoveMultiple {
        keys: Vec<String>,
    },
    ShowOpenDialog {
        #[serde(default)]
        options: OpenDialogOptions,
    },
    ReadFile {
        path: String,
    },
}

impl BridgeRequest {
    pub fn op(&self) -> &'static str {
        match self {
            Self::GetCurrentTheme => "get-current-theme",
            Self::SetTheme { .. } => "set-theme",
            Self::GetRegisteredShortcuts => "get-registered-shortcuts",
            Self::RegisterShortcut { .. } => "register-shortcut",
            Self::UnregisterShortcut { .. } => "unregister-shortcut",
            Self::StorageGet { .. } => "storage-get",
            Self::StorageSet { .. } => "storage-set",
            Self::StorageRemove { .. } => "storage-remove",
            Self::StorageClear => "storage-clear",
            Self::StorageHas { .. } => "storage-has",
            Self::StorageGetAll => "storage-get-all",
            Self::StorageSetMultiple { .. } => "storage-set-multiple",
            Self::StorageRemoveMultiple { .. } => "storage-remove-multiple",
            Self::ShowOpenDialog { .. } => "show-open-dialog",
            Self::ReadFile { .. } => "read-file",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BridgeResponse {
    Theme(Theme),
    Shortcuts(Vec<ShortcutInfo>),
    Flag(bool),
    /// `null` when the key is absent.
    Value(Option<Value>),
    Entries(SettingsMap),
    Dialog(OpenDialogResult),
    File(ReadFileResult),
}

/// Storage writes acknowledge with whether the flush reached disk.
fn ack(op: &str, result: BackendResult<()>) -> BridgeResponse {
    match result {
        Ok(()) => BridgeResponse::Flag(true),
        Err(e) => {
            warn!(op, error = %e, "Storage write not persisted");
            BridgeResponse::Flag(false)
        }
    }
}

impl<E: EventEmitter + 'static> InkboardBackend<E> {
    pub async fn dispatch(&self, request: BridgeRequest) -> BridgeResponse {
        let op = request.op();
        debug!(op, "Bridge request");
        let settings = self.settings();

        match request {
            BridgeRequest::GetCurrentTheme => BridgeResponse::Theme(self.current_theme()),
            BridgeRequest::SetTheme { theme } => BridgeResponse::Theme(self.set_theme(theme)),
            BridgeRequest::GetRegisteredShortcuts => {
                BridgeResponse::Shortcuts(self.registered_shortcuts())
            }
            BridgeRequest::RegisterShortcut {
                id,
                accelerator,
                description,
            } => BridgeResponse::Flag(self.register_shortcut(&id, &accelerator, description)),
            BridgeRequest::UnregisterShortcut { id } => {
                BridgeResponse::Flag(self.unregister_shortcut(&id))
            }
            BridgeRequest::StorageGet { key } => BridgeResponse::Value(settings.get(&key).await),
            BridgeRequest::StorageSet { key, value } => ack(op, settings.set(&key, value).await),
            BridgeRequest::StorageRemove { key } => ack(op, settings.remove(&key).await),
            BridgeRequest::StorageClear => ack(op, settings.clear().await),
            BridgeRequest::StorageHas { key } => BridgeResponse::Flag(settings.has(&key).await),
            BridgeRequest::StorageGetAll => BridgeResponse::Entries(settings.get_all().await),
            BridgeRequest::StorageSetMultiple { entries } => {
                ack(op, settings.set_multiple(entries).await)
            }
            BridgeRequest::StorageRemoveMultiple { keys } => {
                ack(op, settings.remove_multiple(keys.as_slice()).await)
            }
            BridgeRequest::ShowOpenDialog { options } => {
                BridgeResponse::Dialog(self.show_open_dialog(options).await)
            }
            BridgeRequest::ReadFile { path } => BridgeResponse::File(self.read_file(&path).await),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SettingsStore;
    use crate::test_utils::{CountingBackend, FakeHotkeys, RecordingEmitter, StubDialog, TestDirManager};
    use serde_json::json;
    use std::sync::Arc;
    use tokio::runtime::Handle;

    async fn backend_with(
        settings: CountingBackend,
        dialog: StubDialog,
    ) -> InkboardBackend<RecordingEmitter> {
        InkboardBackend::new(
            RecordingEmitter::new(),
            Arc::new(SettingsStore::new(settings)),
            Arc::new(FakeHotkeys::new()),
            Arc::new(dialog),
            &Handle::current(),
        )
        .await
    }

    async fn backend() -> InkboardBackend<RecordingEmitter> {
        backend_with(CountingBackend::new(), StubDialog::canceled()).await
    }

    async fn call(backend: &InkboardBackend<RecordingEmitter>, request: Value) -> Value {
        let request: BridgeRequest = serde_json::from_value(request).unwrap();
        serde_json::to_value(backend.dispatch(request).await).unwrap()
    }

    #[test]
    fn test_request_names_round_trip_through_op() {
        let requests = [
            json!({ "op": "get-current-theme" }),
            json!({ "op": "set-theme", "theme": "dark" }),
            json!({ "op": "get-registered-shortcuts" }),
            json!({ "op": "register-shortcut", "id": "a", "accelerator": "Alt+A" }),
            json!({ "op": "unregister-shortcut", "id": "a" }),
            json!({ "op": "storage-get", "key": "k" }),
            json!({ "op": "storage-set", "key": "k", "value": [1, 2] }),
            json!({ "op": "storage-remove", "key": "k" }),
            json!({ "op": "storage-clear" }),
            json!({ "op": "storage-has", "key": "k" }),
            json!({ "op": "storage-get-all" }),
            json!({ "op": "storage-set-multiple", "entries": { "a": 1 } }),
            json!({ "op": "storage-remove-multiple", "keys": ["a"] }),
            json!({ "op": "show-open-dialog" }),
            json!({ "op": "read-file", "path": "/tmp/x.png" }),
        ];
        for raw in requests {
            let op = raw["op"].clone();
            let request: BridgeRequest = serde_json::from_value(raw).unwrap();
            assert_eq!(json!(request.op()), op);
        }
    }

    #[test]
    fn test_unknown_or_malformed_requests_are_rejected() {
        assert!(serde_json::from_value::<BridgeRequest>(json!({ "op": "run-script" })).is_err());
        assert!(serde_json::from_value::<BridgeRequest>(json!({ "op": "set-theme", "theme": "sepia" })).is_err());
        assert!(serde_json::from_value::<BridgeRequest>(json!({ "op": "storage-get" })).is_err());
    }

    #[tokio::test]
    async fn test_theme_operations() {
        let backend = backend().await;

        assert_eq!(call(&backend, json!({ "op": "get-current-theme" })).await, json!("system"));
        assert_eq!(
            call(&backend, json!({ "op": "set-theme", "theme": "light" })).await,
            json!("light")
        );
        assert_eq!(call(&backend, json!({ "op": "get-current-theme" })).await, json!("light"));
    }

    #[tokio::test]
    async fn test_shortcut_operations() {
        let backend = backend().await;

        let registered = call(
            &backend,
            json!({ "op": "register-shortcut", "id": "save", "accelerator": "CmdOrCtrl+S", "description": "Save" }),
        )
        .await;
        assert_eq!(registered, json!(true));

        let conflict = call(
            &backend,
            json!({ "op": "register-shortcut", "id": "other", "accelerator": "CommandOrControl+S" }),
        )
        .await;
        assert_eq!(conflict, json!(false));

        let list = call(&backend, json!({ "op": "get-registered-shortcuts" })).await;
        assert_eq!(
            list,
            json!([
                {
                    "id": "theme-switcher",
                    "binding": {
                        "accelerator": "CommandOrControl+Shift+S",
                        "description": "Toggle theme between light, dark, and system"
                    }
                },
                {
                    "id": "save",
                    "binding": { "accelerator": "CommandOrControl+S", "description": "Save" }
                }
            ])
        );

        assert_eq!(
            call(&backend, json!({ "op": "unregister-shortcut", "id": "save" })).await,
            json!(true)
        );
        assert_eq!(
            call(&backend, json!({ "op": "unregister-shortcut", "id": "save" })).await,
            json!(false)
        );
    }

    #[tokio::test]
    async fn test_storage_operations() {
        let backend = backend().await;

        assert_eq!(call(&backend, json!({ "op": "storage-get", "key": "zoom" })).await, Value::Null);
        assert_eq!(
            call(&backend, json!({ "op": "storage-set", "key": "zoom", "value": 0.75 })).await,
            json!(true)
        );
        assert_eq!(call(&backend, json!({ "op": "storage-get", "key": "zoom" })).await, json!(0.75));
        assert_eq!(call(&backend, json!({ "op": "storage-has", "key": "zoom" })).await, json!(true));

        call(
            &backend,
            json!({ "op": "storage-set-multiple", "entries": { "a": 1, "b": { "nested": true } } }),
        )
        .await;
        assert_eq!(
            call(&backend, json!({ "op": "storage-get-all" })).await,
            json!({ "zoom": 0.75, "a": 1, "b": { "nested": true } })
        );

        call(&backend, json!({ "op": "storage-remove-multiple", "keys": ["a", "missing"] })).await;
        assert_eq!(
            call(&backend, json!({ "op": "storage-remove", "key": "zoom" })).await,
            json!(true)
        );
        assert_eq!(
            call(&backend, json!({ "op": "storage-get-all" })).await,
            json!({ "b": { "nested": true } })
        );

        assert_eq!(call(&backend, json!({ "op": "storage-clear" })).await, json!(true));
        assert_eq!(call(&backend, json!({ "op": "storage-get-all" })).await, json!({}));
    }

    #[tokio::test]
    async fn test_storage_write_failure_is_false_but_visible() {
        let settings = CountingBackend::new();
        let backend = backend_with(settings.clone(), StubDialog::canceled()).await;
        settings.fail_saves(true);

        assert_eq!(
            call(&backend, json!({ "op": "storage-set", "key": "k", "value": "v" })).await,
            json!(false)
        );
        assert_eq!(call(&backend, json!({ "op": "storage-get", "key": "k" })).await, json!("v"));
    }

    #[tokio::test]
    async fn test_show_open_dialog_forwards_options() {
        let dialog = Arc::new(StubDialog::answering(OpenDialogResult::selected(vec![
            "/art/panel-1.png".to_string(),
        ])));
        let backend = InkboardBackend::new(
            RecordingEmitter::new(),
            Arc::new(SettingsStore::new(CountingBackend::new())),
            Arc::new(FakeHotkeys::new()),
            dialog.clone(),
            &Handle::current(),
        )
        .await;

        let result = call(
            &backend,
            json!({
                "op": "show-open-dialog",
                "options": {
                    "title": "Select Image",
                    "filters": [{ "name": "Images", "extensions": ["png"] }],
                    "properties": ["openFile"]
                }
            }),
        )
        .await;

        assert_eq!(result, json!({ "canceled": false, "filePaths": ["/art/panel-1.png"] }));
        assert_eq!(dialog.last_options().unwrap().title.as_deref(), Some("Select Image"));
    }

    #[tokio::test]
    async fn test_read_file_operation() {
        let backend = backend().await;
        let manager = TestDirManager::new().unwrap();
        let path = manager.write_file("ref.gif", b"GIF89a").unwrap();
        let path = path.to_string_lossy().to_string();

        let loaded = call(&backend, json!({ "op": "read-file", "path": path })).await;
        assert_eq!(loaded["success"], json!(true));
        assert_eq!(loaded["path"], json!(path));
        assert!(loaded["data"].as_str().unwrap().starts_with("data:image/gif;base64,"));

        let missing = call(&backend, json!({ "op": "read-file", "path": "/definitely/not/here.png" })).await;
        assert_eq!(missing["success"], json!(false));
        assert!(missing["error"].is_string());
    }
}
