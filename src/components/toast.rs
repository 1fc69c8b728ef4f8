use icons::X;
use leptos::prelude::*;

use crate::state::{AppContext, Toast, ToastKind};

fn toast_classes(kind: ToastKind) -> &'static str {
    match kind {
        ToastKind::Info => "border-border bg-background text-foreground",
        ToastKind::Success => "border-green-500/40 bg-background text-green-700",
        ToastKind::Error => "border-destructive/40 bg-background text-destructive",
    }
}

/// Fixed-position stack of non-blocking notifications. Each toast dismisses
/// itself after its timeout; the X dismisses early.
#[component]
pub fn ToastHost() -> impl IntoView {
    let app = expect_context::<AppContext>();
    let toasts = app.0.toasts.toasts();
    let controller = app.0.toasts;

    view! {
        <div class="fixed bottom-4 right-4 z-[60] flex w-80 flex-col gap-2">
            <For
                each=move || toasts.get()
                key=|t: &Toast| t.id
                children=move |t: Toast| {
                    let id = t.id;
                    view! {
                        <div class=format!(
                            "flex items-start justify-between gap-2 rounded-md border px-3 py-2 text-sm shadow-lg {}",
                            toast_classes(t.kind),
                        )>
                            <span class="min-w-0 break-words">{t.message.clone()}</span>
                            <button
                                class="shrink-0 rounded-sm p-0.5 text-muted-foreground hover:text-foreground [&_svg:not([class*='size-'])]:size-3.5"
                                aria-label="Dismiss"
                                on:click=move |_| controller.dismiss(id)
                            >
                                <X />
                            </button>
                        </div>
                    }
                }
            />
        </div>
    }
}
