use crate::api::{ApiResult, CreateNodeRequest, UpdateNodeRequest};
use crate::models::{NewNode, Node, NodeContent, NodeUpdate};
use crate::state::{AppContext, ToastKind};
use crate::storage::{
    load_string_from_storage, remove_from_storage, save_string_to_storage, TREE_SNAPSHOT_KEY,
};
use crate::tree::{
    attach_node, detach_node, filter_forest, find_node, find_node_mut, is_within_subtree,
    normalize_forest, parse_forest, selectable_ids, serialize_forest, subtree_ids,
    toggled_select_all,
};
use crate::util::next_node_id;
use leptos::logging::warn;
use leptos::prelude::*;
use leptos::task::spawn_local;
use std::collections::HashSet;

/// DOM event dispatched on `document` for every user-initiated selection,
/// consumed by tab/content managers outside the tree.
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
pub(crate) const NODE_SELECTED_EVENT: &str = "branchpad:node-selected";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TreeOp {
    Create,
    Update,
    Delete,
    Move,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SyncPolicy {
    /// Apply the local mutation first, then tell the backend. Failures are
    /// logged and toasted but never rolled back.
    Optimistic,
    /// Wait for backend confirmation before touching local state.
    Pessimistic,
}

/// Per-operation synchronization policy.
///
/// Creates are optimistic (instant feedback, the id is client-generated
/// anyway); renames, deletes and moves are pessimistic so a failed request
/// can never leave deleted data resurrectable on reload or desync a rename.
/// The asymmetry is a deliberate UX tradeoff, kept explicit here instead of
/// being implied by code flow.
pub(crate) fn sync_policy(op: TreeOp) -> SyncPolicy {
    match op {
        TreeOp::Create => SyncPolicy::Optimistic,
        TreeOp::Update | TreeOp::Delete | TreeOp::Move => SyncPolicy::Pessimistic,
    }
}

/// Owns the workspace forest and keeps it synchronized with the backend.
///
/// All external interaction goes through these methods; no other component
/// mutates `nodes` directly. Everything runs on the single browser event
/// loop: bulk operations await each request before issuing the next, and
/// in-flight requests cannot be cancelled (last response wins).
#[derive(Clone)]
pub(crate) struct TreeController {
    app: AppContext,

    pub nodes: RwSignal<Vec<Node>>,

    /// Single selection (outside edit mode).
    pub selected_node: RwSignal<Option<String>>,

    /// Multi-selection (edit mode only).
    pub selected_items: RwSignal<HashSet<String>>,
    pub edit_mode: RwSignal<bool>,

    pub search_query: RwSignal<String>,

    /// The one submenu popover that may be open, keyed by node id.
    /// Instance-scoped; the document-level close listener lives with the
    /// TreeView component lifecycle.
    pub active_submenu: RwSignal<Option<String>>,

    pub loading: RwSignal<bool>,
    pub load_error: RwSignal<Option<String>>,
}

impl TreeController {
    pub fn new(app: AppContext) -> Self {
        Self {
            app,
            nodes: RwSignal::new(vec![]),
            selected_node: RwSignal::new(None),
            selected_items: RwSignal::new(HashSet::new()),
            edit_mode: RwSignal::new(false),
            search_query: RwSignal::new(String::new()),
            active_submenu: RwSignal::new(None),
            loading: RwSignal::new(false),
            load_error: RwSignal::new(None),
        }
    }

    /// The forest the renderer should show: the search result forest while a
    /// query is active, the full forest otherwise.
    pub fn visible_nodes(&self) -> Vec<Node> {
        let query = self.search_query.get();
        let nodes = self.nodes.get();
        if query.trim().is_empty() {
            nodes
        } else {
            filter_forest(&nodes, &query)
        }
    }

    pub fn is_search_active(&self) -> bool {
        !self.search_query.get().trim().is_empty()
    }

    pub fn find(&self, id: &str) -> Option<Node> {
        self.nodes.with_untracked(|ns| find_node(ns, id).cloned())
    }

    // ----- persistence -------------------------------------------------

    /// Serializes the full forest to its transportable form.
    pub fn save(&self) -> String {
        self.nodes.with_untracked(|ns| serialize_forest(ns))
    }

    /// Replaces the forest from a serialized snapshot. Invalid or empty
    /// input clears the tree and reports failure instead of throwing; on
    /// success all folders come back collapsed.
    pub fn load(&self, input: &str) -> bool {
        match parse_forest(input) {
            Ok(mut forest) => {
                normalize_forest(&mut forest);
                self.nodes.set(forest);
                self.clear_selection();
                true
            }
            Err(e) => {
                warn!("tree load failed, resetting to empty: {e}");
                self.nodes.set(vec![]);
                self.clear_selection();
                remove_from_storage(TREE_SNAPSHOT_KEY);
                false
            }
        }
    }

    fn persist_snapshot(&self) {
        save_string_to_storage(TREE_SNAPSHOT_KEY, &self.save());
    }

    /// Startup path: show the last known forest immediately while the
    /// backend fetch is in flight.
    pub fn hydrate_from_snapshot(&self) {
        if let Some(snapshot) = load_string_from_storage(TREE_SNAPSHOT_KEY) {
            let _ = self.load(&snapshot);
        }
    }

    /// Fetches the authoritative forest. A stale snapshot hydrated earlier
    /// is replaced wholesale when the response lands.
    pub fn load_from_backend(&self) {
        if self.loading.get_untracked() {
            return;
        }
        self.loading.set(true);
        self.load_error.set(None);

        let s2 = self.clone();
        spawn_local(async move {
            let api = s2.app.0.api_client.get_untracked();
            match api.fetch_tree().await {
                Ok(mut forest) => {
                    normalize_forest(&mut forest);
                    s2.nodes.set(forest);
                    s2.clear_selection();
                    s2.persist_snapshot();
                }
                Err(e) => {
                    warn!("tree fetch failed: {e}");
                    s2.load_error.set(Some(e.to_string()));
                }
            }
            s2.loading.set(false);
        });
    }

    // ----- mutations ----------------------------------------------------

    /// Creates a node and returns its id synchronously (ids are generated
    /// client-side). Under the optimistic create policy the node renders
    /// before the backend confirms; a failed create leaves it client-side
    /// only.
    ///
    /// An unresolvable or non-folder parent falls back to a root insert
    /// (with a warning) rather than dropping the node into the void.
    pub fn add_node(&self, input: NewNode, parent_id: Option<String>) -> String {
        let id = next_node_id();
        let content = input
            .content
            .unwrap_or_else(|| NodeContent::default_for(input.kind));
        let node = Node::new(id.clone(), input.name, input.kind, content);

        let parent_id = self.nodes.with_untracked(|ns| match parent_id.as_deref() {
            None => None,
            Some(pid) => match find_node(ns, pid) {
                Some(p) if p.kind.is_folder() => Some(pid.to_string()),
                _ => {
                    warn!("add_node: parent {pid:?} missing or not a folder, inserting at root");
                    None
                }
            },
        });

        let req = CreateNodeRequest {
            id: id.clone(),
            name: node.name.clone(),
            kind: node.kind,
            parent_id: parent_id.clone(),
            customization: node.customization.clone(),
        };

        let s2 = self.clone();
        match sync_policy(TreeOp::Create) {
            SyncPolicy::Optimistic => {
                self.insert_local(node, parent_id.as_deref());
                spawn_local(async move {
                    let api = s2.app.0.api_client.get_untracked();
                    if let Err(e) = api.create_node(req).await {
                        warn!("create not persisted (node kept locally): {e}");
                        s2.app
                            .0
                            .toasts
                            .show("Created locally, but the server could not be reached", ToastKind::Error);
                    }
                });
            }
            SyncPolicy::Pessimistic => {
                spawn_local(async move {
                    let api = s2.app.0.api_client.get_untracked();
                    match api.create_node(req).await {
                        Ok(()) => s2.insert_local(node, parent_id.as_deref()),
                        Err(e) => {
                            warn!("create failed: {e}");
                            s2.app.0.toasts.show("Could not create the item", ToastKind::Error);
                        }
                    }
                });
            }
        }

        id
    }

    fn insert_local(&self, node: Node, parent_id: Option<&str>) {
        self.nodes.update(|ns| attach_or_root(ns, node, parent_id));
        self.persist_snapshot();
    }

    /// Deletes a node (and, for folders, its whole subtree — the backend
    /// cascades too). No optimistic splice: on failure the node stays put.
    pub fn remove_node(&self, id: String) {
        let s2 = self.clone();
        spawn_local(async move {
            s2.remove_node_inner(&id).await;
        });
    }

    async fn remove_node_inner(&self, id: &str) {
        let api = self.app.0.api_client.get_untracked();
        match sync_policy(TreeOp::Delete) {
            SyncPolicy::Optimistic => {
                self.splice_local(id);
                if let Err(e) = api.delete_node(id).await {
                    warn!("delete not persisted: {e}");
                }
            }
            SyncPolicy::Pessimistic => {
                let outcome = api.delete_node(id).await;
                self.settle_delete(id, outcome);
            }
        }
    }

    /// Pessimistic apply: the subtree is spliced only when the backend
    /// confirmed the delete; a failure leaves the forest untouched.
    fn settle_delete(&self, id: &str, outcome: ApiResult<()>) {
        match outcome {
            Ok(()) => self.splice_local(id),
            Err(e) => {
                warn!("delete failed, node kept: {e}");
                self.app
                    .0
                    .toasts
                    .show("Could not delete the item", ToastKind::Error);
            }
        }
    }

    fn splice_local(&self, id: &str) {
        let mut removed_ids = vec![];
        self.nodes.update(|ns| {
            if let Some(node) = detach_node(ns, id) {
                removed_ids = subtree_ids(&node);
            }
        });
        if removed_ids.is_empty() {
            return;
        }
        self.purge_removed(&removed_ids);
        self.persist_snapshot();
    }

    /// Drops bookkeeping that referenced removed nodes (multi-selection,
    /// single selection, open submenu).
    fn purge_removed(&self, removed_ids: &[String]) {
        self.selected_items.update(|set| {
            for rid in removed_ids {
                set.remove(rid);
            }
        });
        if let Some(sel) = self.selected_node.get_untracked() {
            if removed_ids.iter().any(|rid| *rid == sel) {
                self.selected_node.set(None);
            }
        }
        if let Some(open) = self.active_submenu.get_untracked() {
            if removed_ids.iter().any(|rid| *rid == open) {
                self.active_submenu.set(None);
            }
        }
    }

    /// Partial update: only the provided fields change, and only after the
    /// backend confirms.
    pub fn update_node(&self, id: String, update: NodeUpdate) {
        let s2 = self.clone();
        spawn_local(async move {
            let api = s2.app.0.api_client.get_untracked();
            let req = UpdateNodeRequest {
                name: update.name.clone(),
                content: update.content.clone(),
                customization: update.customization.clone(),
            };

            match sync_policy(TreeOp::Update) {
                SyncPolicy::Optimistic => {
                    s2.apply_update(&id, &update);
                    if let Err(e) = api.update_node(&id, req).await {
                        warn!("update not persisted: {e}");
                    }
                }
                SyncPolicy::Pessimistic => match api.update_node(&id, req).await {
                    Ok(()) => s2.apply_update(&id, &update),
                    Err(e) => {
                        warn!("update failed, local state unchanged: {e}");
                        s2.app
                            .0
                            .toasts
                            .show("Could not save the change", ToastKind::Error);
                    }
                },
            }
        });
    }

    fn apply_update(&self, id: &str, update: &NodeUpdate) {
        self.nodes.update(|ns| {
            let Some(node) = find_node_mut(ns, id) else {
                return;
            };
            if let Some(name) = update.name.as_ref().filter(|n| !n.trim().is_empty()) {
                node.name = name.clone();
            }
            if let Some(content) = &update.content {
                node.content = content.clone();
            }
            if let Some(customization) = &update.customization {
                node.customization = Some(customization.clone());
            }
        });
        self.persist_snapshot();
    }

    /// Reparents a node. Invalid targets (missing node, non-folder parent,
    /// the node itself or one of its descendants) are rejected client-side
    /// before any backend call and return `false`; otherwise the request is
    /// issued fire-and-forget and `true` is returned immediately, with
    /// failures surfaced as toasts.
    pub fn move_node(&self, id: String, new_parent: Option<String>) -> bool {
        let valid = self
            .nodes
            .with_untracked(|ns| move_target_is_valid(ns, &id, new_parent.as_deref()));
        if !valid {
            self.app
                .0
                .toasts
                .show("That item cannot be moved there", ToastKind::Info);
            return false;
        }

        let s2 = self.clone();
        spawn_local(async move {
            let api = s2.app.0.api_client.get_untracked();
            match sync_policy(TreeOp::Move) {
                SyncPolicy::Optimistic => {
                    s2.apply_move(&id, new_parent.as_deref());
                    if let Err(e) = api.move_node(&id, new_parent.as_deref()).await {
                        warn!("move not persisted: {e}");
                    }
                }
                SyncPolicy::Pessimistic => {
                    match api.move_node(&id, new_parent.as_deref()).await {
                        Ok(()) => s2.apply_move(&id, new_parent.as_deref()),
                        Err(e) => {
                            warn!("move failed, local state unchanged: {e}");
                            s2.app
                                .0
                                .toasts
                                .show("Could not move the item", ToastKind::Error);
                        }
                    }
                }
            }
        });
        true
    }

    fn apply_move(&self, id: &str, parent_id: Option<&str>) {
        self.nodes.update(|ns| {
            if let Some(node) = detach_node(ns, id) {
                attach_or_root(ns, node, parent_id);
            }
        });
        self.persist_snapshot();
    }

    // ----- selection ----------------------------------------------------

    /// Single selection. Returns the node's data when found; dispatches
    /// exactly one node-selected notification per call that resolves a
    /// node. An empty id clears the selection; a lookup miss leaves it
    /// unchanged.
    pub fn select_node(&self, id: String) -> Option<Node> {
        if id.trim().is_empty() {
            self.selected_node.set(None);
            return None;
        }

        let found = self.find(&id);
        if let Some(node) = &found {
            self.selected_node.set(Some(id));
            emit_node_selected(node);
        }
        found
    }

    pub fn toggle_collapsed(&self, id: &str) {
        self.nodes.update(|ns| {
            if let Some(node) = find_node_mut(ns, id) {
                if node.kind.is_folder() {
                    node.collapsed = !node.collapsed;
                }
            }
        });
    }

    // ----- edit mode (multi-select bulk delete) --------------------------

    pub fn toggle_edit_mode(&self) {
        let next = !self.edit_mode.get_untracked();
        self.edit_mode.set(next);
        if !next {
            self.selected_items.set(HashSet::new());
        }
        self.active_submenu.set(None);
    }

    pub fn toggle_item_selection(&self, id: String) {
        self.selected_items.update(|set| {
            if !set.remove(&id) {
                set.insert(id);
            }
        });
    }

    pub fn toggle_select_all(&self) {
        let next = self
            .nodes
            .with_untracked(|ns| toggled_select_all(ns, &self.selected_items.get_untracked()));
        self.selected_items.set(next);
    }

    /// Bulk delete. Confirmation is the caller's job (workspace dialog);
    /// deletes run sequentially so backend-visible ordering matches the UI.
    /// Confirmed ids are collected during the loop and applied to the live
    /// forest in a single commit afterwards, so nodes created while the
    /// requests were in flight survive.
    pub fn delete_selected(&self) {
        let s2 = self.clone();
        spawn_local(async move {
            s2.delete_selected_inner().await;
        });
    }

    async fn delete_selected_inner(&self) {
        let selected = self.selected_items.get_untracked();
        let ids: Vec<String> = self.nodes.with_untracked(|ns| {
            selectable_ids(ns)
                .into_iter()
                .filter(|id| selected.contains(id))
                .collect()
        });
        if ids.is_empty() {
            return;
        }

        let api = self.app.0.api_client.get_untracked();
        let mut confirmed: Vec<String> = Vec::with_capacity(ids.len());
        let mut failed = 0usize;

        for id in &ids {
            match api.delete_node(id).await {
                Ok(()) => confirmed.push(id.clone()),
                Err(e) => {
                    failed += 1;
                    warn!("bulk delete: {id} failed: {e}");
                }
            }
        }

        let removed = confirmed.len();
        let mut removed_ids = vec![];
        self.nodes
            .update(|ns| removed_ids = detach_confirmed(ns, &confirmed));
        self.purge_removed(&removed_ids);
        self.selected_items.set(HashSet::new());
        self.persist_snapshot();

        if failed == 0 {
            self.app
                .0
                .toasts
                .show(format!("Deleted {removed} item(s)"), ToastKind::Success);
        } else {
            self.app.0.toasts.show(
                format!("Deleted {removed} item(s), {failed} failed"),
                ToastKind::Error,
            );
        }
    }

    fn clear_selection(&self) {
        self.selected_node.set(None);
        self.selected_items.set(HashSet::new());
        self.active_submenu.set(None);
    }
}

/// Reparent precondition, checked before any backend call: the node must
/// exist, and the target must be the root or an existing folder outside the
/// node's own subtree.
fn move_target_is_valid(nodes: &[Node], id: &str, new_parent: Option<&str>) -> bool {
    if find_node(nodes, id).is_none() {
        return false;
    }
    match new_parent {
        None => true,
        Some(pid) => match find_node(nodes, pid) {
            Some(p) if p.kind.is_folder() => !is_within_subtree(nodes, id, pid),
            _ => false,
        },
    }
}

/// Detaches every confirmed id in order, returning all removed ids
/// (subtrees included). Ids that already vanished are skipped.
fn detach_confirmed(nodes: &mut Vec<Node>, ids: &[String]) -> Vec<String> {
    let mut removed = vec![];
    for id in ids {
        if let Some(node) = detach_node(nodes, id) {
            removed.extend(subtree_ids(&node));
        }
    }
    removed
}

/// Attach under the requested parent, falling back to the root when the
/// parent vanished between validation and apply (single-threaded, but the
/// await point makes this possible for moves).
fn attach_or_root(nodes: &mut Vec<Node>, node: Node, parent_id: Option<&str>) {
    let fallback = node.clone();
    if !attach_node(nodes, node, parent_id) {
        warn!(
            "parent {parent_id:?} no longer accepts children, inserting '{}' at root",
            fallback.name
        );
        let _ = attach_node(nodes, fallback, None);
    }
}

// The document-level notification only exists in the browser.
#[cfg(not(target_arch = "wasm32"))]
fn emit_node_selected(_node: &Node) {}

#[cfg(target_arch = "wasm32")]
fn emit_node_selected(node: &Node) {
    let Some(doc) = web_sys::window().and_then(|w| w.document()) else {
        return;
    };

    let detail = js_sys::Object::new();
    let _ = js_sys::Reflect::set(&detail, &"nodeId".into(), &node.id.as_str().into());
    let _ = js_sys::Reflect::set(&detail, &"nodeType".into(), &node.kind.to_string().into());
    let _ = js_sys::Reflect::set(&detail, &"nodeName".into(), &node.name.as_str().into());

    let init = web_sys::CustomEventInit::new();
    init.set_detail(detail.as_ref());
    if let Ok(ev) = web_sys::CustomEvent::new_with_event_init_dict(NODE_SELECTED_EVENT, &init) {
        let _ = doc.dispatch_event(&ev);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiClient, ApiError, ApiErrorKind};
    use crate::models::NodeKind;
    use crate::state::{AppState, ToastController};

    #[test]
    fn test_sync_policy_table() {
        // Create is the only optimistic operation; the asymmetry is a
        // preserved design decision, not an accident.
        assert_eq!(sync_policy(TreeOp::Create), SyncPolicy::Optimistic);
        assert_eq!(sync_policy(TreeOp::Update), SyncPolicy::Pessimistic);
        assert_eq!(sync_policy(TreeOp::Delete), SyncPolicy::Pessimistic);
        assert_eq!(sync_policy(TreeOp::Move), SyncPolicy::Pessimistic);
    }

    fn node(id: &str, kind: NodeKind) -> Node {
        Node::new(
            id.to_string(),
            id.to_string(),
            kind,
            NodeContent::default_for(kind),
        )
    }

    fn forest() -> Vec<Node> {
        // outer/
        //   inner/
        //   pasta (note)
        // inbox (note)
        let mut f = vec![];
        assert!(attach_node(&mut f, node("outer", NodeKind::Folder), None));
        assert!(attach_node(&mut f, node("inner", NodeKind::Folder), Some("outer")));
        assert!(attach_node(&mut f, node("pasta", NodeKind::Note), Some("outer")));
        assert!(attach_node(&mut f, node("inbox", NodeKind::Note), None));
        f
    }

    #[test]
    fn test_move_validation_accepts_root_and_folders() {
        let f = forest();
        assert!(move_target_is_valid(&f, "pasta", None));
        assert!(move_target_is_valid(&f, "pasta", Some("inner")));
        assert!(move_target_is_valid(&f, "outer", None));
        assert!(move_target_is_valid(&f, "inbox", Some("outer")));
    }

    #[test]
    fn test_move_validation_rejects_invalid_targets() {
        let f = forest();
        // Missing node or target.
        assert!(!move_target_is_valid(&f, "ghost", None));
        assert!(!move_target_is_valid(&f, "pasta", Some("ghost")));
        // Leaves cannot contain children.
        assert!(!move_target_is_valid(&f, "pasta", Some("inbox")));
        // No cycles: not into itself, not into a descendant.
        assert!(!move_target_is_valid(&f, "outer", Some("outer")));
        assert!(!move_target_is_valid(&f, "outer", Some("inner")));
    }

    fn test_controller() -> TreeController {
        let state = AppState {
            api_client: RwSignal::new(ApiClient::new("http://localhost:5000".to_string())),
            toasts: ToastController::new(),
        };
        let ctl = TreeController::new(AppContext(state));
        ctl.nodes.set(forest());
        ctl
    }

    #[test]
    fn test_failed_delete_keeps_node_findable() {
        let ctl = test_controller();
        ctl.selected_node.set(Some("pasta".to_string()));

        ctl.settle_delete(
            "pasta",
            Err(ApiError {
                kind: ApiErrorKind::Http,
                message: "delete rejected".to_string(),
            }),
        );

        // The forest and the selection are untouched; the failure surfaced
        // as a toast.
        assert!(ctl.find("pasta").is_some());
        assert_eq!(ctl.selected_node.get_untracked().as_deref(), Some("pasta"));
        let toasts = ctl.app.0.toasts.toasts().get_untracked();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].kind, ToastKind::Error);

        // A confirmed delete splices the node and purges the selection.
        ctl.settle_delete("pasta", Ok(()));
        assert!(ctl.find("pasta").is_none());
        assert!(ctl.selected_node.get_untracked().is_none());
    }

    #[test]
    fn test_bulk_commit_keeps_nodes_added_mid_flight() {
        let mut f = forest();
        // A node created while the delete requests were still awaiting
        // confirmation.
        assert!(attach_node(&mut f, node("fresh", NodeKind::Note), Some("outer")));

        let confirmed = vec!["pasta".to_string(), "inbox".to_string()];
        let removed = detach_confirmed(&mut f, &confirmed);

        assert_eq!(removed, vec!["pasta".to_string(), "inbox".to_string()]);
        assert!(find_node(&f, "pasta").is_none());
        assert!(find_node(&f, "inbox").is_none());
        assert!(find_node(&f, "fresh").is_some());

        // Ids that already vanished are skipped without touching the rest.
        assert!(detach_confirmed(&mut f, &["ghost".to_string()]).is_empty());
        assert!(find_node(&f, "fresh").is_some());
    }

    #[test]
    fn test_select_node_ignores_unresolved_ids() {
        let ctl = test_controller();

        let found = ctl.select_node("pasta".to_string());
        assert_eq!(found.map(|n| n.id), Some("pasta".to_string()));
        assert_eq!(ctl.selected_node.get_untracked().as_deref(), Some("pasta"));

        // A miss returns None and leaves the selection where it was.
        assert!(ctl.select_node("ghost".to_string()).is_none());
        assert_eq!(ctl.selected_node.get_untracked().as_deref(), Some("pasta"));

        // A blank id clears it.
        assert!(ctl.select_node("  ".to_string()).is_none());
        assert!(ctl.selected_node.get_untracked().is_none());
    }
}
