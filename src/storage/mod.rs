/// Serialized forest snapshot, refreshed after every successful local
/// mutation and used to hydrate the tree before the backend answers.
pub(crate) const TREE_SNAPSHOT_KEY: &str = "branchpad_tree_snapshot";

// localStorage only exists in the browser; native builds (unit tests)
// compile these to no-ops, mirroring the cfg split in `util::now_ms`.

pub(crate) fn load_string_from_storage(key: &str) -> Option<String> {
    #[cfg(target_arch = "wasm32")]
    {
        web_sys::window()
            .and_then(|w| w.local_storage().ok().flatten())
            .and_then(|s| s.get_item(key).ok().flatten())
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = key;
        None
    }
}

pub(crate) fn save_string_to_storage(key: &str, value: &str) {
    #[cfg(target_arch = "wasm32")]
    if let Some(storage) = web_sys::window().and_then(|w| w.local_storage().ok().flatten()) {
        let _ = storage.set_item(key, value);
    }

    #[cfg(not(target_arch = "wasm32"))]
    let _ = (key, value);
}

pub(crate) fn remove_from_storage(key: &str) {
    #[cfg(target_arch = "wasm32")]
    if let Some(storage) = web_sys::window().and_then(|w| w.local_storage().ok().flatten()) {
        let _ = storage.remove_item(key);
    }

    #[cfg(not(target_arch = "wasm32"))]
    let _ = key;
}
