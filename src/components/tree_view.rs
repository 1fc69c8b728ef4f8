use icons::{ChevronDown, ChevronRight};
use leptos::ev;
use leptos::prelude::*;
use leptos_dom::helpers::window_event_listener;

use crate::models::{Node, NodeKind};
use crate::state::TreeUiActions;
use crate::tree::controller::TreeController;

fn dragged_node_id(ev: &web_sys::DragEvent) -> Option<String> {
    let dt = ev.data_transfer()?;
    let id = dt.get_data("text/plain").ok()?;
    (!id.trim().is_empty()).then_some(id)
}

/// The workspace forest. Renders from a snapshot of the visible forest
/// (filtered while a search query is active) and re-renders wholesale on any
/// change; the tree is small enough that keyed diffing buys nothing here.
///
/// The container doubles as the root drop target: dropping a row outside any
/// folder moves it to the top level.
#[component]
pub fn TreeView() -> impl IntoView {
    let ctl = StoredValue::new(expect_context::<TreeController>());

    // Clicks that bubble up to the window close the open row submenu; the
    // submenu trigger stops propagation so it can toggle itself.
    let handle = window_event_listener(ev::click, move |_| {
        let ctl = ctl.get_value();
        if ctl.active_submenu.get_untracked().is_some() {
            ctl.active_submenu.set(None);
        }
    });
    on_cleanup(move || handle.remove());

    view! {
        <div
            data-name="TreeView"
            class="h-full min-h-40 overflow-y-auto rounded-md border border-border p-2"
            on:dragover=move |ev: web_sys::DragEvent| ev.prevent_default()
            on:drop=move |ev: web_sys::DragEvent| {
                ev.prevent_default();
                if let Some(id) = dragged_node_id(&ev) {
                    let _ = ctl.get_value().move_node(id, None);
                }
            }
        >
            <ul class="space-y-0.5">
                {move || {
                    let ctl = ctl.get_value();
                    let forest = ctl.visible_nodes();
                    if forest.is_empty() {
                        let text = if ctl.is_search_active() {
                            "No items match the search"
                        } else {
                            "Nothing here yet"
                        };
                        view! { <li class="px-2 py-1 text-xs text-muted-foreground">{text}</li> }
                            .into_any()
                    } else {
                        forest
                            .into_iter()
                            .map(|node| view! { <TreeNodeRow node=node /> }.into_any())
                            .collect_view()
                            .into_any()
                    }
                }}
            </ul>
        </div>
    }
}

/// One row plus, for expanded folders, its children (recursive).
#[component]
pub fn TreeNodeRow(node: Node) -> impl IntoView {
    let ctl = StoredValue::new(expect_context::<TreeController>());
    let ui = StoredValue::new(expect_context::<TreeUiActions>());

    let id = StoredValue::new(node.id.clone());
    let name = StoredValue::new(node.name.clone());
    let kind = node.kind;
    let is_folder = kind.is_folder();
    let collapsed = node.collapsed;
    let matched = node.matched;
    let icon_glyph = node
        .customization
        .as_ref()
        .and_then(|c| c.icon.clone())
        .unwrap_or_else(|| "•".to_string());
    let name_style = node
        .customization
        .as_ref()
        .and_then(|c| c.color.clone())
        .map(|c| format!("color: {c}"))
        .unwrap_or_default();
    let children = node.children;
    let has_children = !children.is_empty();

    let on_row_click = move |ev: web_sys::MouseEvent| {
        ev.stop_propagation();
        let ctl = ctl.get_value();
        if is_folder {
            ctl.toggle_collapsed(&id.get_value());
        }
        let _ = ctl.select_node(id.get_value());
    };

    let name_class = if matched {
        "truncate rounded bg-yellow-100 px-0.5"
    } else {
        "truncate"
    };

    let children_view = (is_folder && !collapsed && has_children).then(|| {
        view! {
            <ul class="ml-4 mt-0.5 space-y-0.5 border-l border-border/60 pl-2">
                {children
                    .into_iter()
                    .map(|child| view! { <TreeNodeRow node=child /> }.into_any())
                    .collect_view()}
            </ul>
        }
    });

    view! {
        <li>
            <div
                class="group relative flex items-center gap-1.5 rounded-md px-2 py-1 text-sm hover:bg-accent/60 cursor-pointer"
                class=("bg-accent", move || {
                    ctl.get_value().selected_node.get().as_deref() == Some(id.get_value().as_str())
                })
                draggable=move || {
                    if ctl.get_value().edit_mode.get() { "false" } else { "true" }
                }
                on:click=on_row_click
                on:dragstart=move |ev: web_sys::DragEvent| {
                    if let Some(dt) = ev.data_transfer() {
                        let _ = dt.set_data("text/plain", &id.get_value());
                    }
                }
                on:dragover=move |ev: web_sys::DragEvent| {
                    if is_folder {
                        ev.prevent_default();
                    }
                }
                on:drop=move |ev: web_sys::DragEvent| {
                    if !is_folder {
                        return;
                    }
                    ev.prevent_default();
                    ev.stop_propagation();
                    if let Some(src) = dragged_node_id(&ev) {
                        let _ = ctl.get_value().move_node(src, Some(id.get_value()));
                    }
                }
            >
                // Multi-select checkbox, leaves only.
                <Show
                    when=move || ctl.get_value().edit_mode.get() && !is_folder
                    fallback=|| ().into_view()
                >
                    <input
                        type="checkbox"
                        class="size-3.5 accent-primary"
                        prop:checked=move || {
                            ctl.get_value().selected_items.get().contains(&id.get_value())
                        }
                        on:click=move |ev: web_sys::MouseEvent| ev.stop_propagation()
                        on:change=move |_| ctl.get_value().toggle_item_selection(id.get_value())
                    />
                </Show>

                {if is_folder {
                    view! {
                        <span class="shrink-0 text-muted-foreground [&_svg:not([class*='size-'])]:size-3.5">
                            {if collapsed {
                                view! { <ChevronRight /> }.into_any()
                            } else {
                                view! { <ChevronDown /> }.into_any()
                            }}
                        </span>
                    }
                    .into_any()
                } else {
                    view! {
                        <span class="w-3.5 shrink-0 text-center text-muted-foreground">
                            {icon_glyph}
                        </span>
                    }
                    .into_any()
                }}

                <span class=name_class style=name_style>{name.get_value()}</span>

                {(kind == NodeKind::Chat)
                    .then(|| view! {
                        <span class="rounded bg-muted px-1 text-[10px] text-muted-foreground">"chat"</span>
                    })}

                // Per-row actions, hidden until hover.
                <button
                    class="ml-auto hidden shrink-0 rounded px-1 text-muted-foreground hover:text-foreground group-hover:block"
                    aria-label="Node actions"
                    on:click=move |ev: web_sys::MouseEvent| {
                        ev.stop_propagation();
                        let my_id = id.get_value();
                        ctl.get_value().active_submenu.update(|cur| {
                            if cur.as_deref() == Some(my_id.as_str()) {
                                *cur = None;
                            } else {
                                *cur = Some(my_id);
                            }
                        });
                    }
                >
                    "⋯"
                </button>

                <Show
                    when=move || {
                        ctl.get_value().active_submenu.get().as_deref()
                            == Some(id.get_value().as_str())
                    }
                    fallback=|| ().into_view()
                >
                    <div class="absolute right-1 top-7 z-40 w-28 rounded-md border border-border bg-background p-1 shadow-md">
                        <button
                            class="block w-full rounded px-2 py-1 text-left text-xs hover:bg-accent"
                            on:click=move |ev: web_sys::MouseEvent| {
                                ev.stop_propagation();
                                ctl.get_value().active_submenu.set(None);
                                ui.get_value().open_rename.run((id.get_value(), name.get_value()));
                            }
                        >
                            "Rename"
                        </button>
                        <button
                            class="block w-full rounded px-2 py-1 text-left text-xs text-destructive hover:bg-destructive/10"
                            on:click=move |ev: web_sys::MouseEvent| {
                                ev.stop_propagation();
                                ctl.get_value().active_submenu.set(None);
                                ui.get_value().open_delete.run((id.get_value(), name.get_value()));
                            }
                        >
                            "Delete"
                        </button>
                    </div>
                </Show>
            </div>

            {children_view}
        </li>
    }
}
