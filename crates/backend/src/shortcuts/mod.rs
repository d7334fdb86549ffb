//! Global (system-wide) keyboard shortcut registry.
//!
//! The registry keeps one binding per caller-chosen id and routes OS-level
//! accelerator presses to the bound callback, whichever window has focus.

pub mod accelerator;

use crate::types::{BackendError, BackendResult};
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{error, info, warn};

pub use accelerator::{Accelerator, Modifier};

pub const THEME_SWITCHER_ID: &str = "theme-switcher";
pub const THEME_SWITCHER_ACCELERATOR: &str = "CommandOrControl+Shift+S";
pub const THEME_SWITCHER_DESCRIPTION: &str = "Toggle theme between light, dark, and system";

pub type ShortcutCallback = Arc<dyn Fn() + Send + Sync>;

/// OS-level accelerator interception.
///
/// Implementations refuse an accelerator that is already claimed by this or
/// another process with [`BackendError::ShortcutUnavailable`].
pub trait GlobalHotkeys: Send + Sync {
    fn register(&self, accelerator: &Accelerator, callback: ShortcutCallback) -> BackendResult<()>;
    fn unregister(&self, accelerator: &Accelerator) -> BackendResult<()>;
    fn unregister_all(&self) -> BackendResult<()>;
    fn is_registered(&self, accelerator: &Accelerator) -> bool;
}

#[derive(Clone)]
pub struct ShortcutBinding {
    pub accelerator: Accelerator,
    pub callback: ShortcutCallback,
    pub description: Option<String>,
}

impl fmt::Debug for ShortcutBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShortcutBinding")
            .field("accelerator", &self.accelerator)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Wire view of a binding, without its callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BindingView {
    pub accelerator: Accelerator,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShortcutInfo {
    pub id: String,
    pub binding: BindingView,
}

pub struct ShortcutRegistry {
    hotkeys: Arc<dyn GlobalHotkeys>,
    // Insertion order; re-registration moves an id to the end. Never held
    // across a call into `hotkeys`.
    bindings: Mutex<Vec<(String, ShortcutBinding)>>,
    // Serializes register/unregister so an id's release and re-claim pair up.
    claims: Mutex<()>,
}

impl ShortcutRegistry {
    pub fn new(hotkeys: Arc<dyn GlobalHotkeys>) -> Self {
        Self {
            hotkeys,
            bindings: Mutex::new(Vec::new()),
            claims: Mutex::new(()),
        }
    }

    /// Bind `accelerator` to `callback` under `id`.
    ///
    /// Returns `false` when the id is empty, the accelerator does not parse,
    /// or the OS refuses it. On failure the previous binding for `id`, if
    /// any, is left in place.
    pub fn register(
        &self,
        id: &str,
        accelerator: &str,
        callback: ShortcutCallback,
        description: Option<String>,
    ) -> bool {
        if id.is_empty() {
            warn!("Refusing to register shortcut with empty id");
            return false;
        }
        let accelerator: Accelerator = match accelerator.parse() {
            Ok(accel) => accel,
            Err(e) => {
                warn!(id, error = %e, "Failed to register global shortcut");
                return false;
            }
        };

        let _claiming = self.lock_claims();
        let previous = take_binding(&mut self.lock_bindings(), id);
        if let Some(old) = &previous {
            self.release(id, &old.accelerator);
        }

        match self.hotkeys.register(&accelerator, callback.clone()) {
            Ok(()) => {
                info!(id, accelerator = %accelerator, "Global shortcut registered");
                self.lock_bindings().push((
                    id.to_string(),
                    ShortcutBinding {
                        accelerator,
                        callback,
                        description,
                    },
                ));
                true
            }
            Err(e) => {
                match &e {
                    BackendError::ShortcutUnavailable(_) | BackendError::InvalidAccelerator(_) => {
                        warn!(id, accelerator = %accelerator, error = %e, "Failed to register global shortcut");
                    }
                    _ => {
                        error!(id, accelerator = %accelerator, error = %e, "Error registering global shortcut");
                    }
                }
                if let Some(old) = previous {
                    self.restore(id, old);
                }
                false
            }
        }
    }

    /// Returns `false` when `id` was not bound.
    pub fn unregister(&self, id: &str) -> bool {
        let _claiming = self.lock_claims();
        let taken = take_binding(&mut self.lock_bindings(), id);
        match taken {
            Some(binding) => {
                self.release(id, &binding.accelerator);
                info!(id, accelerator = %binding.accelerator, "Global shortcut unregistered");
                true
            }
            None => false,
        }
    }

    /// Drops every binding and asks the OS to release all claims. Does not
    /// wait for a registration in flight, so it is safe to call from the
    /// thread that the OS layer itself runs on.
    pub fn unregister_all(&self) {
        self.lock_bindings().clear();
        if let Err(e) = self.hotkeys.unregister_all() {
            error!(error = %e, "Failed to release global shortcuts");
        }
        info!("All global shortcuts unregistered");
    }

    pub fn list(&self) -> Vec<ShortcutInfo> {
        self.lock_bindings()
            .iter()
            .map(|(id, binding)| ShortcutInfo {
                id: id.clone(),
                binding: BindingView {
                    accelerator: binding.accelerator.clone(),
                    description: binding.description.clone(),
                },
            })
            .collect()
    }

    /// Asks the OS layer directly, so claims held elsewhere are reported too.
    pub fn is_bound(&self, accelerator: &str) -> bool {
        accelerator
            .parse::<Accelerator>()
            .is_ok_and(|accel| self.hotkeys.is_registered(&accel))
    }

    pub fn binding(&self, id: &str) -> Option<ShortcutBinding> {
        self.lock_bindings()
            .iter()
            .find(|(bound_id, _)| bound_id == id)
            .map(|(_, binding)| binding.clone())
    }

    /// Install the built-in theme switcher binding.
    pub fn register_theme_switcher(&self, on_cycle: ShortcutCallback) -> bool {
        self.register(
            THEME_SWITCHER_ID,
            THEME_SWITCHER_ACCELERATOR,
            on_cycle,
            Some(THEME_SWITCHER_DESCRIPTION.to_string()),
        )
    }

    fn release(&self, id: &str, accelerator: &Accelerator) {
        if let Err(e) = self.hotkeys.unregister(accelerator) {
            error!(id, accelerator = %accelerator, error = %e, "Failed to release global shortcut");
        }
    }

    fn restore(&self, id: &str, old: ShortcutBinding) {
        match self.hotkeys.register(&old.accelerator, old.callback.clone()) {
            Ok(()) => self.lock_bindings().push((id.to_string(), old)),
            Err(e) => {
                error!(id, accelerator = %old.accelerator, error = %e, "Could not restore previous global shortcut");
            }
        }
    }

    fn lock_bindings(&self) -> MutexGuard<'_, Vec<(String, ShortcutBinding)>> {
        self.bindings.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_claims(&self) -> MutexGuard<'_, ()> {
        self.claims.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn take_binding(bindings: &mut Vec<(String, ShortcutBinding)>, id: &str) -> Option<ShortcutBinding> {
    let index = bindings.iter().position(|(bound_id, _)| bound_id == id)?;
    Some(bindings.remove(index).1)
}
