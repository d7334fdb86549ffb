//! Where the settings document lives on disk.

use crate::types::{BackendError, BackendResult};
use std::path::PathBuf;
use tracing::debug;

pub const APP_IDENTIFIER: &str = "com.inkboard.app";
pub const SETTINGS_FILE_NAME: &str = "app-settings.json";
/// Overrides every [`SettingsLocation`] when set to a non-empty directory.
pub const DATA_DIR_ENV: &str = "INKBOARD_DATA_DIR";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SettingsLocation {
    /// Per-user application data directory.
    #[default]
    User,
    /// Next to the working directory, for installs carried on removable media.
    Portable,
    Custom(PathBuf),
}

impl SettingsLocation {
    fn directory(&self) -> BackendResult<PathBuf> {
        match self {
            Self::User => dirs::data_dir()
                .map(|dir| dir.join(APP_IDENTIFIER))
                .ok_or_else(|| {
                    BackendError::ConfigError("could not determine the user data directory".to_string())
                }),
            Self::Portable => Ok(std::env::current_dir()?),
            Self::Custom(dir) => Ok(dir.clone()),
        }
    }
}

pub fn resolve_settings_path(location: &SettingsLocation) -> BackendResult<PathBuf> {
    let dir = match std::env::var_os(DATA_DIR_ENV) {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => location.directory()?,
    };
    let path = dir.join(SETTINGS_FILE_NAME);
    debug!(path = %path.display(), "Resolved settings path");
    Ok(path)
}
