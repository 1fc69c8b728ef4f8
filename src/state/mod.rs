use crate::api::ApiClient;
use leptos::prelude::*;

#[derive(Clone)]
pub(crate) struct AppState {
    pub api_client: RwSignal<ApiClient>,
    pub toasts: ToastController,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            api_client: RwSignal::new(ApiClient::from_env()),
            toasts: ToastController::new(),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub(crate) struct AppContext(pub AppState);

/// Workspace-level dialog openers, exposed to the tree rows through context
/// (rename/delete live in per-row submenus but the dialogs are owned by the
/// page).
#[derive(Clone)]
pub(crate) struct TreeUiActions {
    /// (node id, current name)
    pub open_rename: Callback<(String, String)>,
    /// (node id, node name)
    pub open_delete: Callback<(String, String)>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub(crate) enum ToastKind {
    Info,
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Toast {
    pub id: u64,
    pub message: String,
    pub kind: ToastKind,
}

/// Non-blocking notifications. Swallowed workflow errors surface here
/// instead of propagating (the tree UI never crashes on a failed request).
#[derive(Clone, Copy)]
pub(crate) struct ToastController {
    toasts: RwSignal<Vec<Toast>>,
    next_id: RwSignal<u64>,
}

impl ToastController {
    pub fn new() -> Self {
        Self {
            toasts: RwSignal::new(vec![]),
            next_id: RwSignal::new(0),
        }
    }

    pub fn toasts(&self) -> RwSignal<Vec<Toast>> {
        self.toasts
    }

    pub fn show(&self, message: impl Into<String>, kind: ToastKind) {
        self.show_for(message, kind, 4000);
    }

    pub fn show_for(&self, message: impl Into<String>, kind: ToastKind, duration_ms: i32) {
        let id = self.next_id.get_untracked();
        self.next_id.set(id + 1);

        self.toasts.update(|xs| {
            xs.push(Toast {
                id,
                message: message.into(),
                kind,
            })
        });

        // The auto-dismiss timer only exists in the browser; under native
        // tests toasts stay until dismissed.
        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;

            let Some(win) = web_sys::window() else {
                return;
            };

            let toasts = self.toasts;
            let cb = wasm_bindgen::closure::Closure::once_into_js(move || {
                toasts.update(|xs| xs.retain(|t| t.id != id));
            });
            let _ = win.set_timeout_with_callback_and_timeout_and_arguments_0(
                cb.as_ref().unchecked_ref(),
                duration_ms,
            );
        }
        #[cfg(not(target_arch = "wasm32"))]
        let _ = duration_ms;
    }

    pub fn dismiss(&self, id: u64) {
        self.toasts.update(|xs| xs.retain(|t| t.id != id));
    }
}
