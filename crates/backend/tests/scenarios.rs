//! End-to-end scenarios across the settings file, the shortcut registry and
//! the bridge, using the shared fakes.

use inkboard_backend::test_utils::{
    CountingBackend, FakeHotkeys, RecordingEmitter, StubDialog, TestDirManager, eventually,
};
use inkboard_backend::{BridgeRequest, BridgeResponse, InkboardBackend, SettingsStore, Theme};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

async fn backend_on(store: Arc<SettingsStore>, hotkeys: Arc<FakeHotkeys>) -> InkboardBackend<RecordingEmitter> {
    InkboardBackend::new(
        RecordingEmitter::new(),
        store,
        hotkeys,
        Arc::new(StubDialog::canceled()),
        &Handle::current(),
    )
    .await
}

#[tokio::test]
async fn theme_setting_survives_restart() {
    init_tracing();
    let manager = TestDirManager::new().unwrap();
    let path = manager.settings_path().unwrap();
    assert!(!path.exists());

    {
        let store = SettingsStore::json_file(&path);
        assert_eq!(store.get("theme").await, None);
        store.set("theme", json!("dark")).await.unwrap();
        assert_eq!(store.get("theme").await, Some(json!("dark")));
    }

    let restarted = SettingsStore::json_file(&path);
    assert_eq!(restarted.get("theme").await, Some(json!("dark")));
}

#[tokio::test]
async fn theme_chosen_in_one_session_is_restored_in_the_next() {
    init_tracing();
    let manager = TestDirManager::new().unwrap();
    let path = manager.settings_path().unwrap();

    {
        let store = Arc::new(SettingsStore::json_file(&path));
        let backend = backend_on(store.clone(), Arc::new(FakeHotkeys::new())).await;
        backend.set_theme(Theme::Light);
        eventually(|| std::fs::read_to_string(&path).is_ok_and(|s| s.contains("light"))).await;
        backend.shutdown().await;
    }

    let store = Arc::new(SettingsStore::json_file(&path));
    let backend = backend_on(store, Arc::new(FakeHotkeys::new())).await;
    assert_eq!(backend.current_theme(), Theme::Light);
}

#[tokio::test(flavor = "current_thread")]
async fn theme_set_right_before_exit_reaches_the_file() {
    init_tracing();
    let manager = TestDirManager::new().unwrap();
    let path = manager.settings_path().unwrap();

    {
        let store = Arc::new(SettingsStore::json_file(&path));
        let backend = backend_on(store, Arc::new(FakeHotkeys::new())).await;
        backend.set_theme(Theme::Dark);
        backend.shutdown().await;
    }

    let on_disk: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(on_disk["theme"], json!("dark"));
}

#[tokio::test]
async fn conflicting_accelerator_is_freed_by_reregistration() {
    init_tracing();
    let backend = backend_on(
        Arc::new(SettingsStore::new(CountingBackend::new())),
        Arc::new(FakeHotkeys::new()),
    )
    .await;
    let shortcuts = backend.shortcuts();
    let cb1: inkboard_backend::ShortcutCallback = Arc::new(|| {});
    let cb2: inkboard_backend::ShortcutCallback = Arc::new(|| {});

    assert!(shortcuts.register("a", "CommandOrControl+1", cb1.clone(), None));
    assert!(!shortcuts.register("b", "CommandOrControl+1", cb2.clone(), None));
    assert!(shortcuts.register("a", "CommandOrControl+2", cb1, None));
    assert!(shortcuts.register("b", "CommandOrControl+1", cb2, None));

    let ids: Vec<_> = shortcuts.list().into_iter().map(|info| info.id).collect();
    assert_eq!(ids, vec!["theme-switcher", "a", "b"]);
}

#[tokio::test]
async fn batch_write_over_the_bridge_flushes_once() {
    let settings = CountingBackend::new();
    let backend = backend_on(
        Arc::new(SettingsStore::new(settings.clone())),
        Arc::new(FakeHotkeys::new()),
    )
    .await;

    let request: BridgeRequest = serde_json::from_value(json!({
        "op": "storage-set-multiple",
        "entries": { "a": 1, "b": 2 }
    }))
    .unwrap();
    assert_eq!(backend.dispatch(request).await, BridgeResponse::Flag(true));
    assert_eq!(settings.save_count(), 1);

    let BridgeResponse::Entries(all) = backend.dispatch(BridgeRequest::StorageGetAll).await else {
        panic!("expected entries");
    };
    assert_eq!(all.get("a"), Some(&json!(1)));
    assert_eq!(all.get("b"), Some(&json!(2)));
}

#[tokio::test]
async fn read_file_infers_mime_from_extension() {
    let backend = backend_on(
        Arc::new(SettingsStore::new(CountingBackend::new())),
        Arc::new(FakeHotkeys::new()),
    )
    .await;
    let manager = TestDirManager::new().unwrap();

    for (name, prefix) in [
        ("cover.png", "data:image/png;base64,"),
        ("script.fountain", "data:application/octet-stream;base64,"),
    ] {
        let path = manager.write_file(name, b"bytes").unwrap();
        let response = backend
            .dispatch(BridgeRequest::ReadFile {
                path: path.to_string_lossy().to_string(),
            })
            .await;
        let json: Value = serde_json::to_value(response).unwrap();
        assert_eq!(json["success"], json!(true), "{name}");
        assert!(json["data"].as_str().unwrap().starts_with(prefix), "{name}");
    }
}
