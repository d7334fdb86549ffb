use crate::theme::Theme;
use crate::types::BackendResult;
use serde::Serialize;

pub const THEME_CHANGED: &str = "theme-changed";
pub const SHORTCUT_TRIGGERED: &str = "shortcut-triggered";

/// Push-event sink supplied by the desktop shell.
///
/// Implementations broadcast to every open window, not just the focused one.
pub trait EventEmitter: Send + Sync + Clone {
    fn emit<S: Serialize + Clone>(&self, event: &str, payload: S) -> BackendResult<()>;
}

/// Host-to-UI notifications that are pushed without a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushEvent {
    ThemeChanged(Theme),
    ShortcutTriggered(String),
}

impl PushEvent {
    pub fn channel(&self) -> &'static str {
        match self {
            Self::ThemeChanged(_) => THEME_CHANGED,
            Self::ShortcutTriggered(_) => SHORTCUT_TRIGGERED,
        }
    }

    pub fn send<E: EventEmitter>(self, emitter: &E) -> BackendResult<()> {
        let channel = self.channel();
        match self {
            Self::ThemeChanged(theme) => emitter.emit(channel, theme),
            Self::ShortcutTriggered(id) => emitter.emit(channel, id),
        }
    }
}
