use leptos::ev;
use leptos::prelude::*;
use leptos_dom::helpers::window_event_listener;

use crate::components::dialogs::{ConfirmDialog, InputDialog};
use crate::components::toast::ToastHost;
use crate::components::tree_view::TreeView;
use crate::components::ui::{
    Alert, AlertDescription, Button, ButtonSize, ButtonVariant, Input, Spinner,
};
use crate::models::{NewNode, NodeContent, NodeKind, NodeUpdate};
use crate::state::{AppContext, TreeUiActions};
use crate::tree::controller::TreeController;
use crate::tree::find_node;

/// The single page: toolbar, tree, detail pane and the dialogs/toasts that
/// the tree rows reach through context.
#[component]
pub fn WorkspacePage() -> impl IntoView {
    let app = expect_context::<AppContext>();
    let ctl = TreeController::new(app.clone());
    provide_context(ctl.clone());
    let ctl_sv = StoredValue::new(ctl.clone());

    // Last known forest first, authoritative fetch on top.
    ctl.hydrate_from_snapshot();
    ctl.load_from_backend();

    // Create dialog.
    let create_open: RwSignal<bool> = RwSignal::new(false);
    let create_kind: RwSignal<NodeKind> = RwSignal::new(NodeKind::Note);
    let create_name: RwSignal<String> = RwSignal::new(String::new());
    let create_error: RwSignal<Option<String>> = RwSignal::new(None);

    // Rename dialog.
    let rename_open: RwSignal<bool> = RwSignal::new(false);
    let rename_id: RwSignal<Option<String>> = RwSignal::new(None);
    let rename_value: RwSignal<String> = RwSignal::new(String::new());
    let rename_error: RwSignal<Option<String>> = RwSignal::new(None);

    // Delete confirmations (single and bulk).
    let delete_open: RwSignal<bool> = RwSignal::new(false);
    let delete_id: RwSignal<Option<String>> = RwSignal::new(None);
    let delete_name: RwSignal<String> = RwSignal::new(String::new());
    let bulk_open: RwSignal<bool> = RwSignal::new(false);

    provide_context(TreeUiActions {
        open_rename: Callback::new(move |(id, name): (String, String)| {
            rename_id.set(Some(id));
            rename_value.set(name);
            rename_error.set(None);
            rename_open.set(true);
        }),
        open_delete: Callback::new(move |(id, name): (String, String)| {
            delete_id.set(Some(id));
            delete_name.set(name);
            delete_open.set(true);
        }),
    });

    let on_submit_create = Callback::new(move |_: ()| {
        let name = create_name.get_untracked().trim().to_string();
        if name.is_empty() {
            create_error.set(Some("Name cannot be empty".to_string()));
            return;
        }
        let ctl = ctl_sv.get_value();
        // New items land inside the selected folder, if any; otherwise at
        // the root.
        let parent = ctl
            .selected_node
            .get_untracked()
            .and_then(|id| ctl.find(&id))
            .filter(|n| n.kind.is_folder())
            .map(|n| n.id);
        let _ = ctl.add_node(
            NewNode {
                name,
                kind: create_kind.get_untracked(),
                content: None,
            },
            parent,
        );
        create_name.set(String::new());
        create_error.set(None);
        create_open.set(false);
    });

    let on_submit_rename = Callback::new(move |_: ()| {
        let name = rename_value.get_untracked().trim().to_string();
        if name.is_empty() {
            rename_error.set(Some("Name cannot be empty".to_string()));
            return;
        }
        let Some(id) = rename_id.get_untracked() else {
            rename_open.set(false);
            return;
        };
        ctl_sv.get_value().update_node(
            id,
            NodeUpdate {
                name: Some(name),
                ..Default::default()
            },
        );
        rename_open.set(false);
    });

    let on_confirm_delete = Callback::new(move |_: ()| {
        if let Some(id) = delete_id.get_untracked() {
            ctl_sv.get_value().remove_node(id);
        }
    });

    let on_confirm_bulk = Callback::new(move |_: ()| {
        ctl_sv.get_value().delete_selected();
    });

    let open_create = move |kind: NodeKind| {
        create_kind.set(kind);
        create_name.set(String::new());
        create_error.set(None);
        create_open.set(true);
    };

    // Escape closes whatever overlay is open.
    let esc_handle = window_event_listener(ev::keydown, move |ev: web_sys::KeyboardEvent| {
        if ev.key() == "Escape" {
            create_open.set(false);
            rename_open.set(false);
            delete_open.set(false);
            bulk_open.set(false);
            ctl_sv.get_value().active_submenu.set(None);
        }
    });
    on_cleanup(move || esc_handle.remove());

    let selected_count = move || ctl_sv.get_value().selected_items.get().len();

    view! {
        <div class="mx-auto flex h-screen max-w-5xl flex-col gap-3 p-4">
            <header class="flex flex-wrap items-center justify-between gap-2">
                <h1 class="text-lg font-semibold">"Branchpad"</h1>

                <div class="flex items-center gap-1.5">
                    <Show when=move || ctl_sv.get_value().loading.get() fallback=|| ().into_view()>
                        <Spinner class="text-muted-foreground" />
                    </Show>
                    <Button
                        variant=ButtonVariant::Outline
                        size=ButtonSize::Sm
                        on:click=move |_| open_create(NodeKind::Folder)
                    >
                        "New folder"
                    </Button>
                    <Button
                        variant=ButtonVariant::Outline
                        size=ButtonSize::Sm
                        on:click=move |_| open_create(NodeKind::Note)
                    >
                        "New note"
                    </Button>
                    <Button
                        variant=ButtonVariant::Outline
                        size=ButtonSize::Sm
                        on:click=move |_| open_create(NodeKind::Chat)
                    >
                        "New chat"
                    </Button>
                </div>
            </header>

            <div class="flex flex-wrap items-center gap-2">
                <Input
                    bind_value=ctl.search_query
                    class="h-8 max-w-64 text-sm"
                    placeholder="Search..."
                />

                <Button
                    variant=ButtonVariant::Ghost
                    size=ButtonSize::Sm
                    on:click=move |_| ctl_sv.get_value().toggle_edit_mode()
                >
                    {move || if ctl_sv.get_value().edit_mode.get() { "Done" } else { "Select" }}
                </Button>

                <Show
                    when=move || ctl_sv.get_value().edit_mode.get()
                    fallback=|| ().into_view()
                >
                    <Button
                        variant=ButtonVariant::Ghost
                        size=ButtonSize::Sm
                        on:click=move |_| ctl_sv.get_value().toggle_select_all()
                    >
                        "Select all"
                    </Button>
                    <Button
                        variant=ButtonVariant::Destructive
                        size=ButtonSize::Sm
                        attr:disabled=move || selected_count() == 0
                        on:click=move |_| bulk_open.set(true)
                    >
                        {move || format!("Delete ({})", selected_count())}
                    </Button>
                </Show>
            </div>

            <Show
                when=move || ctl_sv.get_value().load_error.get().is_some()
                fallback=|| ().into_view()
            >
                <Alert class="border-destructive/30">
                    <AlertDescription class="flex items-center justify-between gap-2 text-destructive text-xs">
                        <span>
                            {move || {
                                ctl_sv
                                    .get_value()
                                    .load_error
                                    .get()
                                    .map(|e| format!("Could not load the workspace: {e}"))
                            }}
                        </span>
                        <Button
                            variant=ButtonVariant::Outline
                            size=ButtonSize::Sm
                            on:click=move |_| ctl_sv.get_value().load_from_backend()
                        >
                            "Retry"
                        </Button>
                    </AlertDescription>
                </Alert>
            </Show>

            <div class="flex min-h-0 flex-1 gap-3">
                <div class="w-80 shrink-0">
                    <TreeView />
                </div>

                <div class="min-w-0 flex-1 rounded-md border border-border p-4">
                    {move || {
                        let ctl = ctl_sv.get_value();
                        let selected = ctl
                            .selected_node
                            .get()
                            .and_then(|id| ctl.nodes.with(|ns| find_node(ns, &id).cloned()));
                        match selected {
                            None => view! {
                                <div class="text-sm text-muted-foreground">
                                    "Select an item to see its details."
                                </div>
                            }
                            .into_any(),
                            Some(node) => {
                                let summary = match &node.content {
                                    NodeContent::Note { blocks } => {
                                        format!("{} block(s)", blocks.len())
                                    }
                                    NodeContent::Chat { messages } => {
                                        format!("{} message(s)", messages.len())
                                    }
                                    NodeContent::Empty => "No content".to_string(),
                                };
                                view! {
                                    <div class="space-y-2">
                                        <div class="flex items-center gap-2">
                                            <h2 class="text-base font-medium">{node.name.clone()}</h2>
                                            <span class="rounded bg-muted px-1.5 py-0.5 text-[10px] text-muted-foreground">
                                                {node.kind.to_string()}
                                            </span>
                                        </div>
                                        <div class="font-mono text-xs text-muted-foreground">
                                            {node.id.clone()}
                                        </div>
                                        <Show
                                            when={
                                                let is_folder = node.kind.is_folder();
                                                move || !is_folder
                                            }
                                            fallback=|| ().into_view()
                                        >
                                            <div class="text-sm text-muted-foreground">{summary.clone()}</div>
                                        </Show>
                                    </div>
                                }
                                .into_any()
                            }
                        }
                    }}
                </div>
            </div>

            <InputDialog
                open=create_open
                title=Signal::derive(move || format!("New {}", create_kind.get()))
                label="Name"
                placeholder="Untitled"
                value=create_name
                error=create_error
                submit_label="Create"
                on_submit=on_submit_create
            />

            <InputDialog
                open=rename_open
                title="Rename item".to_string()
                label="New name"
                value=rename_value
                error=rename_error
                submit_label="Save"
                on_submit=on_submit_rename
            />

            <ConfirmDialog
                open=delete_open
                title="Delete item".to_string()
                message=Signal::derive(move || {
                    format!("\"{}\" and everything inside it will be deleted.", delete_name.get())
                })
                confirm_label="Delete"
                on_confirm=on_confirm_delete
            />

            <ConfirmDialog
                open=bulk_open
                title="Delete selected items".to_string()
                message=Signal::derive(move || {
                    format!("{} selected item(s) will be deleted.", selected_count())
                })
                confirm_label="Delete all"
                on_confirm=on_confirm_bulk
            />

            <ToastHost />
        </div>
    }
}
