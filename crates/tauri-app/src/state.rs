use crate::event_emitter::TauriEventEmitter;
use inkboard_backend::InkboardBackend;
use std::sync::Arc;

pub struct AppState {
    pub backend: Arc<InkboardBackend<TauriEventEmitter>>,
}
