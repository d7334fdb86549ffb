//! File-open dialog contract and image loading for input nodes.

use crate::types::BackendResult;
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFilter {
    pub name: String,
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DialogProperty {
    OpenFile,
    OpenDirectory,
    MultiSelections,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenDialogOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_path: Option<String>,
    #[serde(default)]
    pub filters: Vec<FileFilter>,
    #[serde(default)]
    pub properties: Vec<DialogProperty>,
}

impl OpenDialogOptions {
    pub fn wants_directory(&self) -> bool {
        self.properties.contains(&DialogProperty::OpenDirectory)
    }

    pub fn wants_multiple(&self) -> bool {
        self.properties.contains(&DialogProperty::MultiSelections)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenDialogResult {
    pub canceled: bool,
    pub file_paths: Vec<String>,
}

impl OpenDialogResult {
    pub fn canceled() -> Self {
        Self {
            canceled: true,
            file_paths: Vec::new(),
        }
    }

    pub fn selected(file_paths: Vec<String>) -> Self {
        if file_paths.is_empty() {
            return Self::canceled();
        }
        Self {
            canceled: false,
            file_paths,
        }
    }
}

/// Native file picker owned by the desktop shell.
#[async_trait]
pub trait FileDialog: Send + Sync {
    async fn show_open_dialog(&self, options: OpenDialogOptions) -> BackendResult<OpenDialogResult>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadFileResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReadFileResult {
    pub fn loaded(data: String, path: String) -> Self {
        Self {
            success: true,
            data: Some(data),
            path: Some(path),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            path: None,
            error: Some(error.into()),
        }
    }
}

/// MIME type from the text after the last dot of the file name. A leading-dot
/// name such as `.png` counts as a `png` file.
pub fn mime_for_path(path: &Path) -> &'static str {
    let extension = path
        .file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

pub fn data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Read a file into a base64 data URI. Failures come back as a negative
/// result carrying the error text.
pub async fn read_file(path: &str) -> ReadFileResult {
    match tokio::fs::read(path).await {
        Ok(bytes) => {
            let mime = mime_for_path(Path::new(path));
            debug!(path, mime, bytes = bytes.len(), "File read");
            ReadFileResult::loaded(data_uri(mime, &bytes), path.to_string())
        }
        Err(e) => {
            warn!(path, error = %e, "Failed to read file");
            ReadFileResult::failed(e.to_string())
        }
    }
}
