use crate::events::{EventEmitter, PushEvent};
use crate::settings::{SettingsStore, THEME_KEY};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{Mutex, watch};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    /// Follow the OS preference
    #[default]
    System,
}

impl Theme {
    /// system -> light -> dark -> system
    pub fn next(self) -> Self {
        match self {
            Self::System => Self::Light,
            Self::Light => Self::Dark,
            Self::Dark => Self::System,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::System => "system",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current theme, broadcast to every window on change and mirrored into the
/// settings store by a background writer that always persists the latest value.
pub struct ThemeService<E: EventEmitter> {
    state: watch::Sender<Theme>,
    settings: Arc<SettingsStore>,
    // Held by whoever is writing the theme to settings, so a flush can never
    // be overtaken by an older value from the background writer.
    persisting: Arc<Mutex<()>>,
    emitter: E,
}

async fn persist(settings: &SettingsStore, theme: Theme) {
    if let Err(e) = settings.set_as(THEME_KEY, &theme).await {
        error!(theme = %theme, error = %e, "Failed to persist theme");
    }
}

impl<E: EventEmitter + 'static> ThemeService<E> {
    /// Start from the persisted theme, or `system` when none is stored.
    pub async fn restore(emitter: E, settings: Arc<SettingsStore>, runtime: &Handle) -> Self {
        let current = settings.get_as::<Theme>(THEME_KEY).await.unwrap_or_default();
        info!(theme = %current, "Theme restored");

        let (state, mut changes) = watch::channel(current);
        let persisting = Arc::new(Mutex::new(()));
        let writer_settings = settings.clone();
        let writer_lock = persisting.clone();
        runtime.spawn(async move {
            while changes.changed().await.is_ok() {
                let _writing = writer_lock.lock().await;
                let theme = *changes.borrow_and_update();
                persist(&writer_settings, theme).await;
            }
        });

        Self {
            state,
            settings,
            persisting,
            emitter,
        }
    }

    /// Write the current theme to settings now unless it is already stored.
    /// Waits for any write the background writer has in progress.
    pub async fn flush(&self) {
        let _writing = self.persisting.lock().await;
        let theme = self.current();
        let stored = self.settings.get_as::<Theme>(THEME_KEY).await.unwrap_or_default();
        if stored == theme {
            return;
        }
        debug!(theme = %theme, "Flushing pending theme");
        persist(&self.settings, theme).await;
    }

    pub fn current(&self) -> Theme {
        *self.state.borrow()
    }

    /// Set the theme; an unchanged value is neither broadcast nor persisted.
    pub fn set(&self, theme: Theme) -> Theme {
        let changed = self.state.send_if_modified(|current| {
            if *current == theme {
                return false;
            }
            *current = theme;
            true
        });
        if changed {
            info!(theme = %theme, "Theme set");
            self.broadcast(theme);
        }
        theme
    }

    /// Advance to the next theme. Safe to call from threads outside the
    /// async runtime, such as the OS hotkey callback.
    pub fn cycle(&self) -> Theme {
        let mut theme = Theme::default();
        self.state.send_modify(|current| {
            *current = current.next();
            theme = *current;
        });
        info!(theme = %theme, "Theme switched");
        self.broadcast(theme);
        theme
    }

    fn broadcast(&self, theme: Theme) {
        if let Err(e) = PushEvent::ThemeChanged(theme).send(&self.emitter) {
            warn!(theme = %theme, error = %e, "Failed to broadcast theme change");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::THEME_CHANGED;
    use crate::test_utils::{CountingBackend, RecordingEmitter, eventually};
    use serde_json::json;

    async fn service(backend: CountingBackend) -> (RecordingEmitter, ThemeService<RecordingEmitter>) {
        let emitter = RecordingEmitter::new();
        let settings = Arc::new(SettingsStore::new(backend));
        let service = ThemeService::restore(emitter.clone(), settings, &Handle::current()).await;
        (emitter, service)
    }

    #[test]
    fn test_theme_cycle_order() {
        assert_eq!(Theme::System.next(), Theme::Light);
        assert_eq!(Theme::Light.next(), Theme::Dark);
        assert_eq!(Theme::Dark.next(), Theme::System);
    }

    #[test]
    fn test_theme_serialization() {
        assert_eq!(serde_json::to_value(Theme::Dark).unwrap(), json!("dark"));
        assert_eq!(serde_json::from_value::<Theme>(json!("system")).unwrap(), Theme::System);
        assert!(serde_json::from_value::<Theme>(json!("sepia")).is_err());
    }

    #[tokio::test]
    async fn test_defaults_to_system_without_persisted_value() {
        let (_, service) = service(CountingBackend::new()).await;
        assert_eq!(service.current(), Theme::System);
    }

    #[tokio::test]
    async fn test_restores_persisted_theme() {
        let mut entries = serde_json::Map::new();
        entries.insert(THEME_KEY.to_string(), json!("dark"));
        let (_, service) = service(CountingBackend::with_entries(entries)).await;
        assert_eq!(service.current(), Theme::Dark);
    }

    #[tokio::test]
    async fn test_set_broadcasts_and_persists() {
        let backend = CountingBackend::new();
        let (emitter, service) = service(backend.clone()).await;

        assert_eq!(service.set(Theme::Dark), Theme::Dark);

        assert_eq!(service.current(), Theme::Dark);
        assert_eq!(emitter.events_on(THEME_CHANGED), vec![json!("dark")]);
        eventually(|| backend.saved().get(THEME_KEY) == Some(&json!("dark"))).await;
    }

    #[tokio::test]
    async fn test_set_same_theme_is_silent() {
        let backend = CountingBackend::new();
        let (emitter, service) = service(backend.clone()).await;

        service.set(Theme::System);
        tokio::task::yield_now().await;

        assert!(emitter.events().is_empty());
        assert_eq!(backend.save_count(), 0);
    }

    #[tokio::test]
    async fn test_cycle_broadcasts_every_step_and_persists_latest() {
        let backend = CountingBackend::new();
        let (emitter, service) = service(backend.clone()).await;

        assert_eq!(service.cycle(), Theme::Light);
        assert_eq!(service.cycle(), Theme::Dark);
        assert_eq!(service.cycle(), Theme::System);
        assert_eq!(service.cycle(), Theme::Light);

        assert_eq!(
            emitter.events_on(THEME_CHANGED),
            vec![json!("light"), json!("dark"), json!("system"), json!("light")]
        );
        eventually(|| backend.saved().get(THEME_KEY) == Some(&json!("light"))).await;
    }

    #[test]
    fn test_cycle_from_non_runtime_thread() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let backend = CountingBackend::new();
        let emitter = RecordingEmitter::new();
        let settings = Arc::new(SettingsStore::new(backend.clone()));
        let service = runtime.block_on(ThemeService::restore(
            emitter.clone(),
            settings,
            runtime.handle(),
        ));

        let theme = std::thread::spawn(move || service.cycle()).join().unwrap();

        assert_eq!(theme, Theme::Light);
        runtime.block_on(eventually(|| {
            backend.saved().get(THEME_KEY) == Some(&json!("light"))
        }));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_flush_persists_change_before_writer_runs() {
        let backend = CountingBackend::new();
        let (_, service) = service(backend.clone()).await;

        service.set(Theme::Dark);
        service.flush().await;

        assert_eq!(backend.saved().get(THEME_KEY), Some(&json!("dark")));
    }

    #[tokio::test]
    async fn test_flush_without_changes_writes_nothing() {
        let backend = CountingBackend::new();
        let (_, service) = service(backend.clone()).await;

        service.flush().await;

        assert_eq!(backend.save_count(), 0);
    }
}
