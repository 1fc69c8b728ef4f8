mod api;
mod components;
mod models;
mod pages;
mod state;
mod storage;
mod tree;
mod util;

use leptos::prelude::*;
use leptos_router::components::{Route, Router, Routes};
use leptos_router::path;

use crate::pages::WorkspacePage;
use crate::state::{AppContext, AppState};

// Needed for `#[wasm_bindgen(start)]` on the wasm entrypoint.
#[cfg(all(target_arch = "wasm32", not(test)))]
use wasm_bindgen::prelude::wasm_bindgen;

#[component]
pub fn App() -> impl IntoView {
    provide_context(AppContext(AppState::new()));

    // CSR build: the `csr` feature on `leptos` is required, and router hooks
    // need a <Router> context even for a single route.
    view! {
        <Router>
            <Routes fallback=|| view! { <div class="px-4 py-8 text-xs text-muted-foreground">"Not found"</div> }>
                <Route path=path!("") view=WorkspacePage />
            </Routes>
        </Router>
    }
}

// WASM-only tests (run with `cargo test --target wasm32-unknown-unknown` + wasm-bindgen-test-runner)
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use crate::models::{Node, NodeContent, NodeKind};
    use crate::storage::{
        load_string_from_storage, remove_from_storage, save_string_to_storage, TREE_SNAPSHOT_KEY,
    };
    use crate::tree::{parse_forest, serialize_forest};
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_tree_snapshot_storage_roundtrip() {
        remove_from_storage(TREE_SNAPSHOT_KEY);
        assert!(load_string_from_storage(TREE_SNAPSHOT_KEY).is_none());

        let mut folder = Node::new(
            "f1".to_string(),
            "Recipes".to_string(),
            NodeKind::Folder,
            NodeContent::Empty,
        );
        let mut note = Node::new(
            "n1".to_string(),
            "Pasta".to_string(),
            NodeKind::Note,
            NodeContent::default_for(NodeKind::Note),
        );
        note.parent_id = Some("f1".to_string());
        folder.children.push(note);
        let forest = vec![folder];

        save_string_to_storage(TREE_SNAPSHOT_KEY, &serialize_forest(&forest));

        let raw = load_string_from_storage(TREE_SNAPSHOT_KEY)
            .expect("snapshot should survive the roundtrip");
        let restored = parse_forest(&raw).expect("snapshot should parse");
        assert_eq!(restored.len(), 1);
        assert_eq!(restored[0].children[0].id, "n1");

        remove_from_storage(TREE_SNAPSHOT_KEY);
        assert!(load_string_from_storage(TREE_SNAPSHOT_KEY).is_none());
    }

    #[wasm_bindgen_test]
    fn test_storage_overwrite_keeps_latest() {
        save_string_to_storage("branchpad_test_key", "one");
        save_string_to_storage("branchpad_test_key", "two");
        assert_eq!(
            load_string_from_storage("branchpad_test_key").as_deref(),
            Some("two")
        );
        remove_from_storage("branchpad_test_key");
    }
}

// Only register the WASM start function for normal builds (not for tests),
// otherwise wasm-bindgen-test will end up with multiple entry symbols.
#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn main() {
    console_error_panic_hook::set_once();
    mount_to_body(App);
}
