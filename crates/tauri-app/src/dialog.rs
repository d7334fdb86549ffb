use async_trait::async_trait;
use inkboard_backend::{BackendError, BackendResult, FileDialog, OpenDialogOptions, OpenDialogResult};
use tauri::AppHandle;
use tauri_plugin_dialog::{DialogExt, FilePath};
use tokio::sync::oneshot;

pub struct TauriFileDialog {
    app_handle: AppHandle,
}

impl TauriFileDialog {
    pub const fn new(app_handle: AppHandle) -> Self {
        Self { app_handle }
    }
}

fn into_paths(picked: Option<Vec<FilePath>>) -> Vec<String> {
    picked
        .unwrap_or_default()
        .iter()
        .map(ToString::to_string)
        .collect()
}

#[async_trait]
impl FileDialog for TauriFileDialog {
    async fn show_open_dialog(&self, options: OpenDialogOptions) -> BackendResult<OpenDialogResult> {
        let mut builder = self.app_handle.dialog().file();
        if let Some(title) = &options.title {
            builder = builder.set_title(title);
        }
        if let Some(directory) = &options.default_path {
            builder = builder.set_directory(directory);
        }
        for filter in &options.filters {
            let extensions: Vec<&str> = filter.extensions.iter().map(String::as_str).collect();
            builder = builder.add_filter(&filter.name, &extensions);
        }

        let (tx, rx) = oneshot::channel();
        match (options.wants_directory(), options.wants_multiple()) {
            (true, true) => builder.pick_folders(move |picked| {
                let _ = tx.send(into_paths(picked));
            }),
            (true, false) => builder.pick_folder(move |picked| {
                let _ = tx.send(into_paths(picked.map(|path| vec![path])));
            }),
            (false, true) => builder.pick_files(move |picked| {
                let _ = tx.send(into_paths(picked));
            }),
            (false, false) => builder.pick_file(move |picked| {
                let _ = tx.send(into_paths(picked.map(|path| vec![path])));
            }),
        }

        let paths = rx
            .await
            .map_err(|_| BackendError::Dialog("dialog closed without a response".to_string()))?;
        Ok(OpenDialogResult::selected(paths))
    }
}
