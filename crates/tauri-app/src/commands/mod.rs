use crate::state::AppState;
use inkboard_backend::{BridgeRequest, BridgeResponse};
use tauri::State;

/// Single entry point for the whole request catalog. Failures are encoded in
/// the response, so the error arm is never taken.
#[tauri::command]
pub async fn bridge(
    request: BridgeRequest,
    state: State<'_, AppState>,
) -> Result<BridgeResponse, String> {
    Ok(state.backend.dispatch(request).await)
}
