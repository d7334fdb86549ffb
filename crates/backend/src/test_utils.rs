//! Test utilities shared by unit and integration tests
//!
//! - Safe environment variable management
//! - Isolated temporary directories
//! - In-memory fakes for the OS, settings file, dialog and event seams

use crate::events::EventEmitter;
use crate::files::{FileDialog, OpenDialogOptions, OpenDialogResult};
use crate::settings::{SettingsBackend, SettingsMap};
use crate::shortcuts::{Accelerator, GlobalHotkeys, ShortcutCallback};
use crate::types::{BackendError, BackendResult};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use uuid::Uuid;

/// Environment variable guard that restores original values on drop
///
/// Tests that touch the environment should also be `#[serial]`.
pub struct EnvGuard {
    original_values: HashMap<String, Option<OsString>>,
}

impl EnvGuard {
    pub fn new() -> Self {
        Self {
            original_values: HashMap::new(),
        }
    }

    /// Set an environment variable, storing the original value for restoration
    pub fn set<K: AsRef<str>, V: AsRef<str>>(&mut self, key: K, value: V) {
        let key_str = key.as_ref().to_string();
        self.remember(&key_str);
        unsafe {
            env::set_var(&key_str, value.as_ref());
        }
    }

    /// Remove an environment variable, storing the original value for restoration
    pub fn remove<K: AsRef<str>>(&mut self, key: K) {
        let key_str = key.as_ref().to_string();
        self.remember(&key_str);
        unsafe {
            env::remove_var(&key_str);
        }
    }

    fn remember(&mut self, key: &str) {
        if !self.original_values.contains_key(key) {
            self.original_values.insert(key.to_string(), env::var_os(key));
        }
    }
}

impl Default for EnvGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, original_value) in &self.original_values {
            unsafe {
                match original_value {
                    Some(value) => env::set_var(key, value),
                    None => env::remove_var(key),
                }
            }
        }
    }
}

/// Unique temporary directories so tests never share a settings file
pub struct TestDirManager {
    temp_dir: TempDir,
    unique_id: String,
}

impl TestDirManager {
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {
            temp_dir: TempDir::new()?,
            unique_id: Uuid::new_v4().to_string(),
        })
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn create_unique_subdir(&self, name: &str) -> std::io::Result<PathBuf> {
        let subdir = self
            .temp_dir
            .path()
            .join(format!("{}_{}", name, self.unique_id));
        std::fs::create_dir_all(&subdir)?;
        Ok(subdir)
    }

    /// Path of a settings document inside a fresh subdirectory; the file
    /// itself is not created.
    pub fn settings_path(&self) -> std::io::Result<PathBuf> {
        Ok(self.create_unique_subdir("settings")?.join("app-settings.json"))
    }

    /// Write `bytes` to `name` in the root directory and return its path.
    pub fn write_file(&self, name: &str, bytes: &[u8]) -> std::io::Result<PathBuf> {
        let path = self.temp_dir.path().join(name);
        std::fs::write(&path, bytes)?;
        Ok(path)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Emitter that records every broadcast as `(channel, json payload)`.
#[derive(Clone, Default)]
pub struct RecordingEmitter {
    events: Arc<Mutex<Vec<(String, Value)>>>,
}

impl RecordingEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<(String, Value)> {
        lock(&self.events).clone()
    }

    pub fn events_on(&self, channel: &str) -> Vec<Value> {
        lock(&self.events)
            .iter()
            .filter(|(event, _)| event == channel)
            .map(|(_, payload)| payload.clone())
            .collect()
    }
}

impl EventEmitter for RecordingEmitter {
    fn emit<S: Serialize + Clone>(&self, event: &str, payload: S) -> BackendResult<()> {
        let payload = serde_json::to_value(payload)?;
        lock(&self.events).push((event.to_string(), payload));
        Ok(())
    }
}

/// In-process stand-in for the OS hotkey service.
#[derive(Default)]
pub struct FakeHotkeys {
    claimed: Mutex<HashMap<String, ShortcutCallback>>,
    foreign: Mutex<HashSet<String>>,
    broken: Mutex<HashSet<String>>,
    before_claim: Mutex<Option<Arc<dyn Fn() + Send + Sync>>>,
}

impl FakeHotkeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an accelerator as held by another application.
    pub fn claim_externally(&self, accelerator: &str) {
        lock(&self.foreign).insert(canonical(accelerator));
    }

    /// Make registering this accelerator fail with an unexpected OS error.
    pub fn fail_with_error(&self, accelerator: &str) {
        lock(&self.broken).insert(canonical(accelerator));
    }

    /// Simulate a key press. Any spelling of the accelerator works.
    /// Returns `false` when nothing in this process claimed it.
    pub fn fire(&self, accelerator: &str) -> bool {
        let callback = lock(&self.claimed).get(&canonical(accelerator)).cloned();
        match callback {
            Some(callback) => {
                callback();
                true
            }
            None => false,
        }
    }

    pub fn claimed_count(&self) -> usize {
        lock(&self.claimed).len()
    }

    /// Run `hook` at the start of every `register`, with none of the fake's
    /// own locks held, to stand in for a slow OS round trip.
    pub fn before_claim(&self, hook: impl Fn() + Send + Sync + 'static) {
        *lock(&self.before_claim) = Some(Arc::new(hook));
    }
}

fn canonical(accelerator: &str) -> String {
    accelerator
        .parse::<Accelerator>()
        .map(|accel| accel.to_string())
        .unwrap_or_else(|_| accelerator.to_string())
}

impl GlobalHotkeys for FakeHotkeys {
    fn register(&self, accelerator: &Accelerator, callback: ShortcutCallback) -> BackendResult<()> {
        let hook = lock(&self.before_claim).clone();
        if let Some(hook) = hook {
            hook();
        }
        let key = accelerator.to_string();
        if lock(&self.broken).contains(&key) {
            return Err(BackendError::HotkeyBackend(format!("{key}: simulated OS failure")));
        }
        if lock(&self.foreign).contains(&key) {
            return Err(BackendError::ShortcutUnavailable(key));
        }
        let mut claimed = lock(&self.claimed);
        if claimed.contains_key(&key) {
            return Err(BackendError::ShortcutUnavailable(key));
        }
        claimed.insert(key, callback);
        Ok(())
    }

    fn unregister(&self, accelerator: &Accelerator) -> BackendResult<()> {
        lock(&self.claimed).remove(&accelerator.to_string());
        Ok(())
    }

    fn unregister_all(&self) -> BackendResult<()> {
        lock(&self.claimed).clear();
        Ok(())
    }

    fn is_registered(&self, accelerator: &Accelerator) -> bool {
        let key = accelerator.to_string();
        lock(&self.claimed).contains_key(&key) || lock(&self.foreign).contains(&key)
    }
}

#[derive(Default)]
struct CountingState {
    saved: Mutex<SettingsMap>,
    saves: AtomicUsize,
    loads: AtomicUsize,
    fail_saves: AtomicBool,
    fail_loads: AtomicBool,
}

/// Settings backend kept in memory that counts loads and flushes.
/// Clones share state, so a test can keep one handle after moving
/// another into a store.
#[derive(Clone, Default)]
pub struct CountingBackend {
    state: Arc<CountingState>,
}

impl CountingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: SettingsMap) -> Self {
        let backend = Self::new();
        *lock(&backend.state.saved) = entries;
        backend
    }

    /// Last document successfully saved (or the seeded one).
    pub fn saved(&self) -> SettingsMap {
        lock(&self.state.saved).clone()
    }

    pub fn save_count(&self) -> usize {
        self.state.saves.load(Ordering::SeqCst)
    }

    pub fn load_count(&self) -> usize {
        self.state.loads.load(Ordering::SeqCst)
    }

    pub fn fail_saves(&self, fail: bool) {
        self.state.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub fn fail_loads(&self, fail: bool) {
        self.state.fail_loads.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl SettingsBackend for CountingBackend {
    async fn load(&self) -> BackendResult<SettingsMap> {
        self.state.loads.fetch_add(1, Ordering::SeqCst);
        // Widen the window for concurrent first-use races.
        tokio::task::yield_now().await;
        if self.state.fail_loads.load(Ordering::SeqCst) {
            return Err(BackendError::Storage("simulated load failure".to_string()));
        }
        Ok(self.saved())
    }

    async fn save(&self, entries: &SettingsMap) -> BackendResult<()> {
        if self.state.fail_saves.load(Ordering::SeqCst) {
            return Err(BackendError::Storage("simulated save failure".to_string()));
        }
        *lock(&self.state.saved) = entries.clone();
        self.state.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

/// Dialog that answers with a preset result and remembers what it was asked.
#[derive(Default)]
pub struct StubDialog {
    result: Mutex<OpenDialogResult>,
    last_options: Mutex<Option<OpenDialogOptions>>,
    fail: AtomicBool,
}

impl StubDialog {
    /// A dialog the user dismisses.
    pub fn canceled() -> Self {
        Self::answering(OpenDialogResult::canceled())
    }

    pub fn answering(result: OpenDialogResult) -> Self {
        Self {
            result: Mutex::new(result),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        let dialog = Self::canceled();
        dialog.fail.store(true, Ordering::SeqCst);
        dialog
    }

    pub fn last_options(&self) -> Option<OpenDialogOptions> {
        lock(&self.last_options).clone()
    }
}

#[async_trait]
impl FileDialog for StubDialog {
    async fn show_open_dialog(&self, options: OpenDialogOptions) -> BackendResult<OpenDialogResult> {
        *lock(&self.last_options) = Some(options);
        if self.fail.load(Ordering::SeqCst) {
            return Err(BackendError::Dialog("no window to attach to".to_string()));
        }
        Ok(lock(&self.result).clone())
    }
}

/// Poll `condition` until it holds, panicking after two seconds.
pub async fn eventually(condition: impl Fn() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not met within 2s");
}
