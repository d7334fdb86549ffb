use tauri::webview::PageLoadEvent;
use tauri::{AppHandle, LogicalSize, Manager, Url, WebviewUrl, WebviewWindowBuilder};
use tauri_plugin_opener::OpenerExt;
use tracing::{debug, warn};

pub const MAIN_WINDOW: &str = "main";
const FALLBACK_SIZE: LogicalSize<f64> = LogicalSize {
    width: 1280.0,
    height: 800.0,
};

// Hosts that serve the bundled frontend (or the dev server).
const APP_HOSTS: &[&str] = &["tauri.localhost", "localhost", "127.0.0.1"];

/// Open the editor window, filling the primary display. It stays hidden
/// until the first page load finishes, so no blank frame is shown.
pub fn open_main_window(app: &AppHandle) -> tauri::Result<()> {
    if let Some(window) = app.get_webview_window(MAIN_WINDOW) {
        window.show()?;
        return window.set_focus();
    }

    let size = app
        .primary_monitor()?
        .map_or(FALLBACK_SIZE, |monitor| {
            monitor.size().to_logical(monitor.scale_factor())
        });

    let opener = app.clone();
    WebviewWindowBuilder::new(app, MAIN_WINDOW, WebviewUrl::default())
        .title("Inkboard")
        .inner_size(size.width, size.height)
        .visible(false)
        .on_page_load(|window, payload| {
            if matches!(payload.event(), PageLoadEvent::Finished) {
                if let Err(e) = window.show() {
                    warn!(error = %e, "Failed to show main window");
                }
            }
        })
        .on_navigation(move |url| {
            if !is_external(url) {
                return true;
            }
            debug!(url = %url, "Opening external link in the default browser");
            if let Err(e) = opener.opener().open_url(url.as_str(), None::<&str>) {
                warn!(url = %url, error = %e, "Failed to open external link");
            }
            false
        })
        .build()?;
    Ok(())
}

/// Web links that leave the app belong in the user's browser.
fn is_external(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
        && url.host_str().is_some_and(|host| !APP_HOSTS.contains(&host))
}
