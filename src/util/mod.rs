use std::sync::atomic::{AtomicU32, Ordering};

pub(crate) fn now_ms() -> i64 {
    #[cfg(target_arch = "wasm32")]
    {
        js_sys::Date::now().round() as i64
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }
}

/// Monotonic per-session counter so ids created within the same millisecond
/// stay distinct.
static NODE_ID_SEQ: AtomicU32 = AtomicU32::new(0);

/// Client-generated node id: time-derived, authoritative once persisted.
pub(crate) fn next_node_id() -> String {
    let seq = NODE_ID_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("{}-{}", now_ms(), seq)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_next_node_id_unique_in_quick_succession() {
        let ids: Vec<String> = (0..200).map(|_| next_node_id()).collect();
        let distinct: HashSet<&String> = ids.iter().collect();
        assert_eq!(distinct.len(), ids.len());
    }

    #[test]
    fn test_next_node_id_starts_with_timestamp() {
        let before = now_ms();
        let id = next_node_id();
        let after = now_ms();

        let ts: i64 = id
            .split('-')
            .next()
            .and_then(|s| s.parse().ok())
            .expect("id should start with a millisecond timestamp");
        assert!(ts >= before && ts <= after);
    }
}
