use crate::types::{BackendError, BackendResult};
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use tokio::fs;

pub type SettingsMap = serde_json::Map<String, Value>;

/// Durable home of the settings document.
///
/// `save` always receives the complete mapping and replaces whatever was
/// stored before.
#[async_trait]
pub trait SettingsBackend: Send + Sync {
    async fn load(&self) -> BackendResult<SettingsMap>;
    async fn save(&self, entries: &SettingsMap) -> BackendResult<()>;
    fn location(&self) -> String;
}

/// Settings persisted as one pretty-printed JSON object on disk.
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SettingsBackend for JsonFileBackend {
    async fn load(&self) -> BackendResult<SettingsMap> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        if !fs::try_exists(&self.path).await? {
            self.save(&SettingsMap::new()).await?;
        }

        let content = fs::read_to_string(&self.path).await?;
        match serde_json::from_str::<Value>(&content)? {
            Value::Object(entries) => Ok(entries),
            Value::Null => Ok(SettingsMap::new()),
            other => Err(BackendError::Storage(format!(
                "expected a JSON object in {}, found {}",
                self.path.display(),
                json_kind(&other)
            ))),
        }
    }

    async fn save(&self, entries: &SettingsMap) -> BackendResult<()> {
        let content = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, content).await?;
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
