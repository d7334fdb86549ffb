use thiserror::Error;

pub type BackendResult<T> = Result<T, BackendError>;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Invalid accelerator: {0}")]
    InvalidAccelerator(String),

    #[error("Shortcut already claimed: {0}")]
    ShortcutUnavailable(String),

    #[error("Global hotkey error: {0}")]
    HotkeyBackend(String),

    #[error("Settings storage error: {0}")]
    Storage(String),

    #[error("File dialog error: {0}")]
    Dialog(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Event delivery failed: {0}")]
    EventDelivery(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}
