//! Signal-driven overlay dialogs. The page owns the open/value/error signals
//! and the submit handlers; these components only render.

use leptos::prelude::*;

use crate::components::ui::{Alert, AlertDescription, Button, ButtonSize, ButtonVariant, Input, Label};

/// One-field prompt used for create and rename flows. Enter submits, Escape
/// is handled by the page-level key listener.
#[component]
pub fn InputDialog(
    open: RwSignal<bool>,
    #[prop(into)] title: Signal<String>,
    #[prop(into)] label: String,
    #[prop(into, optional)] placeholder: String,
    value: RwSignal<String>,
    error: RwSignal<Option<String>>,
    #[prop(into)] submit_label: String,
    #[prop(into)] on_submit: Callback<()>,
) -> impl IntoView {
    let label = StoredValue::new(label);
    let placeholder = StoredValue::new(placeholder);
    let submit_label = StoredValue::new(submit_label);
    view! {
        <Show when=move || open.get() fallback=|| ().into_view()>
            <div class="fixed inset-0 z-50 flex items-center justify-center bg-black/30 px-4">
                <div class="w-full max-w-sm rounded-md border border-border bg-background p-4 shadow-lg">
                    <div class="mb-3 space-y-1">
                        <div class="text-sm font-medium">{move || title.get()}</div>
                    </div>

                    <div class="space-y-2">
                        <div class="space-y-1">
                            <Label class="text-xs">{label.get_value()}</Label>
                            <Input
                                bind_value=value
                                class="h-8 text-sm"
                                placeholder=placeholder.get_value()
                                on:keydown=move |ev: web_sys::KeyboardEvent| {
                                    if ev.key() == "Enter" {
                                        ev.prevent_default();
                                        on_submit.run(());
                                    }
                                }
                            />
                        </div>

                        <Show when=move || error.get().is_some() fallback=|| ().into_view()>
                            {move || error.get().map(|e| view! {
                                <Alert class="border-destructive/30">
                                    <AlertDescription class="text-destructive text-xs">{e}</AlertDescription>
                                </Alert>
                            })}
                        </Show>

                        <div class="flex items-center justify-end gap-2 pt-2">
                            <Button
                                variant=ButtonVariant::Outline
                                size=ButtonSize::Sm
                                on:click=move |_| open.set(false)
                            >
                                "Cancel"
                            </Button>
                            <Button
                                size=ButtonSize::Sm
                                on:click=move |_| on_submit.run(())
                            >
                                {submit_label.get_value()}
                            </Button>
                        </div>
                    </div>
                </div>
            </div>
        </Show>
    }
}

/// Destructive confirmation (single delete and bulk delete share it).
#[component]
pub fn ConfirmDialog(
    open: RwSignal<bool>,
    #[prop(into)] title: Signal<String>,
    #[prop(into)] message: Signal<String>,
    #[prop(into)] confirm_label: String,
    #[prop(into)] on_confirm: Callback<()>,
) -> impl IntoView {
    let confirm_label = StoredValue::new(confirm_label);
    view! {
        <Show when=move || open.get() fallback=|| ().into_view()>
            <div class="fixed inset-0 z-50 flex items-center justify-center bg-black/30 px-4">
                <div class="w-full max-w-sm rounded-md border border-border bg-background p-4 shadow-lg">
                    <div class="mb-3 space-y-1">
                        <div class="text-sm font-medium text-destructive">{move || title.get()}</div>
                        <div class="text-xs text-muted-foreground">{move || message.get()}</div>
                    </div>

                    <div class="flex items-center justify-end gap-2 pt-2">
                        <Button
                            variant=ButtonVariant::Outline
                            size=ButtonSize::Sm
                            on:click=move |_| open.set(false)
                        >
                            "Cancel"
                        </Button>
                        <Button
                            variant=ButtonVariant::Destructive
                            size=ButtonSize::Sm
                            on:click=move |_| {
                                open.set(false);
                                on_confirm.run(());
                            }
                        >
                            {confirm_label.get_value()}
                        </Button>
                    </div>
                </div>
            </div>
        </Show>
    }
}
