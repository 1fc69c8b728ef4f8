//! Pure forest operations for the workspace tree.
//!
//! Everything here is synchronous and DOM/network-free: the reactive
//! controller (`tree::controller`) composes these helpers with the backend
//! workflows. All mutation helpers preserve the containment invariant
//! documented on [`Node`]: `parent_id` always matches the container a node
//! lives in, and the forest stays a strict forest.

pub(crate) mod controller;

use crate::models::{Node, NodeKind};
use std::collections::HashSet;

/// Depth-first search over any subtree. Lookup misses are `None`, never an
/// error.
pub(crate) fn find_node<'a>(nodes: &'a [Node], id: &str) -> Option<&'a Node> {
    for node in nodes {
        if node.id == id {
            return Some(node);
        }
        if let Some(found) = find_node(&node.children, id) {
            return Some(found);
        }
    }
    None
}

pub(crate) fn find_node_mut<'a>(nodes: &'a mut [Node], id: &str) -> Option<&'a mut Node> {
    for node in nodes {
        if node.id == id {
            return Some(node);
        }
        if let Some(found) = find_node_mut(&mut node.children, id) {
            return Some(found);
        }
    }
    None
}

/// Removes the node (with its whole subtree) from whichever container holds
/// it and returns it. The detached node keeps its children; its `parent_id`
/// is cleared until it is re-attached.
pub(crate) fn detach_node(nodes: &mut Vec<Node>, id: &str) -> Option<Node> {
    if let Some(idx) = nodes.iter().position(|n| n.id == id) {
        let mut node = nodes.remove(idx);
        node.parent_id = None;
        return Some(node);
    }

    for node in nodes.iter_mut() {
        if let Some(found) = detach_node(&mut node.children, id) {
            return Some(found);
        }
    }
    None
}

/// Inserts `node` at the root (`parent_id == None`) or into an existing
/// folder's children. Returns `false` without touching the forest when the
/// parent is missing or not a folder; the caller decides the fallback.
pub(crate) fn attach_node(nodes: &mut Vec<Node>, mut node: Node, parent_id: Option<&str>) -> bool {
    match parent_id {
        None => {
            node.parent_id = None;
            nodes.push(node);
            true
        }
        Some(pid) => {
            let Some(parent) = find_node_mut(nodes, pid) else {
                return false;
            };
            if !parent.kind.is_folder() {
                return false;
            }
            node.parent_id = Some(pid.to_string());
            parent.children.push(node);
            true
        }
    }
}

/// True when `candidate_id` lives inside the subtree rooted at
/// `ancestor_id` (the node itself counts). Used as the reparent cycle guard.
pub(crate) fn is_within_subtree(nodes: &[Node], ancestor_id: &str, candidate_id: &str) -> bool {
    let Some(ancestor) = find_node(nodes, ancestor_id) else {
        return false;
    };
    find_node(std::slice::from_ref(ancestor), candidate_id).is_some()
}

/// Ids of a node and all of its descendants, depth-first.
pub(crate) fn subtree_ids(node: &Node) -> Vec<String> {
    let mut out = vec![node.id.clone()];
    for child in &node.children {
        out.extend(subtree_ids(child));
    }
    out
}

/// The multi-select candidate set: every non-folder node reachable from the
/// forest, in traversal order.
pub(crate) fn selectable_ids(nodes: &[Node]) -> Vec<String> {
    let mut out = vec![];
    for node in nodes {
        if !node.kind.is_folder() {
            out.push(node.id.clone());
        }
        out.extend(selectable_ids(&node.children));
    }
    out
}

/// Select-all toggle: everything when the current selection is incomplete,
/// nothing when it already covers every selectable node.
pub(crate) fn toggled_select_all(nodes: &[Node], current: &HashSet<String>) -> HashSet<String> {
    let all: HashSet<String> = selectable_ids(nodes).into_iter().collect();
    if !all.is_empty() && all.iter().all(|id| current.contains(id)) {
        HashSet::new()
    } else {
        all
    }
}

/// Case-insensitive substring filter. Folders are kept when they match
/// directly or contain any matching descendant; leaves are kept only on a
/// direct match. Matching nodes are tagged (`matched`) for highlight
/// styling, and surviving folders come back expanded.
pub(crate) fn filter_forest(nodes: &[Node], query: &str) -> Vec<Node> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return nodes.to_vec();
    }
    filter_with_needle(nodes, &needle)
}

fn filter_with_needle(nodes: &[Node], needle: &str) -> Vec<Node> {
    let mut out = vec![];
    for node in nodes {
        let self_match = node.name.to_lowercase().contains(needle);
        let kept_children = filter_with_needle(&node.children, needle);

        let keep = if node.kind.is_folder() {
            self_match || !kept_children.is_empty()
        } else {
            self_match
        };
        if !keep {
            continue;
        }

        let mut kept = node.clone();
        kept.children = kept_children;
        kept.matched = self_match;
        if kept.kind.is_folder() {
            kept.collapsed = false;
        }
        out.push(kept);
    }
    out
}

/// Serializes the forest to its transportable JSON form.
pub(crate) fn serialize_forest(nodes: &[Node]) -> String {
    serde_json::to_string(nodes).unwrap_or_else(|_| "[]".to_string())
}

/// Parses a serialized forest. Callers are expected to run
/// [`normalize_forest`] on the result before committing it.
pub(crate) fn parse_forest(input: &str) -> Result<Vec<Node>, serde_json::Error> {
    serde_json::from_str(input)
}

/// Post-load normalization: containment is authoritative, so every
/// `parent_id` is rewritten from the structure, and all folders start
/// collapsed (default-collapsed-on-load policy).
pub(crate) fn normalize_forest(nodes: &mut [Node]) {
    normalize_level(nodes, None);
}

fn normalize_level(nodes: &mut [Node], parent_id: Option<&str>) {
    for node in nodes {
        node.parent_id = parent_id.map(|s| s.to_string());
        node.matched = false;
        if node.kind.is_folder() {
            node.collapsed = true;
        }
        let id = node.id.clone();
        normalize_level(&mut node.children, Some(&id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NodeContent;

    fn node(id: &str, name: &str, kind: NodeKind) -> Node {
        Node::new(
            id.to_string(),
            name.to_string(),
            kind,
            NodeContent::default_for(kind),
        )
    }

    fn sample_forest() -> Vec<Node> {
        // recipes/
        //   pasta (note)
        //   drafts/
        //     soup-chat (chat)
        // inbox (note)
        let mut forest = vec![];
        assert!(attach_node(&mut forest, node("f1", "Recipes", NodeKind::Folder), None));
        assert!(attach_node(&mut forest, node("n1", "Pasta", NodeKind::Note), Some("f1")));
        assert!(attach_node(&mut forest, node("f2", "Drafts", NodeKind::Folder), Some("f1")));
        assert!(attach_node(&mut forest, node("c1", "Soup chat", NodeKind::Chat), Some("f2")));
        assert!(attach_node(&mut forest, node("n2", "Inbox", NodeKind::Note), None));
        forest
    }

    /// Walks the forest asserting the containment invariant: parent_id
    /// matches the holding container and no id appears twice.
    fn assert_forest_invariant(nodes: &[Node]) {
        fn walk(nodes: &[Node], parent: Option<&str>, seen: &mut HashSet<String>) {
            for n in nodes {
                assert_eq!(
                    n.parent_id.as_deref(),
                    parent,
                    "node {} has parent_id {:?} but lives under {:?}",
                    n.id,
                    n.parent_id,
                    parent
                );
                assert!(seen.insert(n.id.clone()), "node {} appears twice", n.id);
                walk(&n.children, Some(&n.id), seen);
            }
        }
        walk(nodes, None, &mut HashSet::new());
    }

    #[test]
    fn test_find_node_dfs() {
        let forest = sample_forest();
        assert_eq!(find_node(&forest, "c1").map(|n| n.name.as_str()), Some("Soup chat"));
        assert_eq!(find_node(&forest, "n2").map(|n| n.kind), Some(NodeKind::Note));
        assert!(find_node(&forest, "missing").is_none());
    }

    #[test]
    fn test_attach_sets_parent_and_preserves_invariant() {
        let forest = sample_forest();
        assert_forest_invariant(&forest);
        assert_eq!(
            find_node(&forest, "n1").and_then(|n| n.parent_id.clone()),
            Some("f1".to_string())
        );
    }

    #[test]
    fn test_attach_rejects_missing_or_leaf_parent() {
        let mut forest = sample_forest();
        let before = serialize_forest(&forest);

        assert!(!attach_node(&mut forest, node("x", "X", NodeKind::Note), Some("nope")));
        // Notes cannot contain children.
        assert!(!attach_node(&mut forest, node("y", "Y", NodeKind::Note), Some("n1")));
        assert_eq!(serialize_forest(&forest), before);
    }

    #[test]
    fn test_detach_returns_whole_subtree() {
        let mut forest = sample_forest();
        let folder = detach_node(&mut forest, "f1").expect("f1 should detach");
        assert!(folder.parent_id.is_none());
        assert_eq!(subtree_ids(&folder), vec!["f1", "n1", "f2", "c1"]);

        // Cascading removal: descendants are gone from the forest.
        assert!(find_node(&forest, "n1").is_none());
        assert!(find_node(&forest, "c1").is_none());
        assert_eq!(find_node(&forest, "n2").map(|n| n.id.as_str()), Some("n2"));
        assert_forest_invariant(&forest);
    }

    #[test]
    fn test_move_preserves_invariant_and_forbids_cycles() {
        let mut forest = sample_forest();

        // Reparent n2 under f2.
        let n2 = detach_node(&mut forest, "n2").expect("detach n2");
        assert!(attach_node(&mut forest, n2, Some("f2")));
        assert_forest_invariant(&forest);
        assert_eq!(
            find_node(&forest, "n2").and_then(|n| n.parent_id.clone()),
            Some("f2".to_string())
        );

        // The cycle guard reports f2 inside f1 (and every node inside itself).
        assert!(is_within_subtree(&forest, "f1", "f2"));
        assert!(is_within_subtree(&forest, "f1", "f1"));
        assert!(!is_within_subtree(&forest, "f2", "f1"));
    }

    #[test]
    fn test_selectable_ids_excludes_folders() {
        let forest = sample_forest();
        assert_eq!(selectable_ids(&forest), vec!["n1", "c1", "n2"]);
    }

    #[test]
    fn test_toggle_select_all_round_trip() {
        let forest = sample_forest();

        let none = HashSet::new();
        let all = toggled_select_all(&forest, &none);
        assert_eq!(all.len(), 3);
        assert!(all.contains("c1"));

        // Second toggle from a full selection returns to none.
        assert!(toggled_select_all(&forest, &all).is_empty());

        // A partial selection completes rather than clearing.
        let partial: HashSet<String> = ["n1".to_string()].into_iter().collect();
        assert_eq!(toggled_select_all(&forest, &partial).len(), 3);
    }

    #[test]
    fn test_filter_keeps_folders_with_matching_descendants() {
        let forest = sample_forest();

        let filtered = filter_forest(&forest, "soup");
        // Both ancestor folders survive, untagged; the chat is tagged.
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "f1");
        assert!(!filtered[0].matched);
        let drafts = &filtered[0].children[0];
        assert_eq!(drafts.id, "f2");
        assert!(!drafts.collapsed);
        assert!(drafts.children[0].matched);

        // Leaves are kept only on a direct match: Pasta is filtered out.
        assert!(find_node(&filtered, "n1").is_none());
    }

    #[test]
    fn test_filter_is_case_insensitive_substring() {
        let forest = sample_forest();
        let filtered = filter_forest(&forest, "PAST");
        assert!(find_node(&filtered, "n1").is_some());
        assert!(find_node(&filtered, "n2").is_none());

        // Empty/whitespace query returns everything untouched.
        let all = filter_forest(&forest, "   ");
        assert_eq!(all.len(), forest.len());
    }

    #[test]
    fn test_filter_folder_direct_match_without_matching_children() {
        let forest = sample_forest();
        let filtered = filter_forest(&forest, "drafts");
        let drafts = find_node(&filtered, "f2").expect("Drafts folder kept");
        assert!(drafts.matched);
        // Its non-matching leaf children are not included.
        assert!(drafts.children.is_empty());
    }

    #[test]
    fn test_serialize_parse_round_trip() {
        let forest = sample_forest();
        let mut parsed = parse_forest(&serialize_forest(&forest)).expect("round trip parses");
        normalize_forest(&mut parsed);

        assert_forest_invariant(&parsed);
        assert_eq!(subtree_ids(&parsed[0]), subtree_ids(&forest[0]));
        assert_eq!(
            find_node(&parsed, "c1").map(|n| (n.name.clone(), n.kind)),
            Some(("Soup chat".to_string(), NodeKind::Chat))
        );
    }

    #[test]
    fn test_normalize_forces_folders_collapsed_and_reindexes_parents() {
        let json = r#"[{
            "id": "f1", "name": "Recipes", "type": "folder", "collapsed": false,
            "children": [
                {"id": "n1", "name": "Pasta", "type": "note", "parentId": "stale"}
            ]
        }]"#;
        let mut forest = parse_forest(json).expect("forest parses");
        normalize_forest(&mut forest);

        assert!(forest[0].collapsed);
        assert_eq!(forest[0].children[0].parent_id.as_deref(), Some("f1"));
        assert_forest_invariant(&forest);
    }

    #[test]
    fn test_parse_rejects_non_array_input() {
        assert!(parse_forest("").is_err());
        assert!(parse_forest("{\"nodes\": []}").is_err());
        assert!(parse_forest("not json").is_err());
    }
}
