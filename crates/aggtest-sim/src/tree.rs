//! JSON tree primitives backing the simulated targets.

use serde_json::{Map, Value};

/// Returns the node at `segs`, treating `null` as absent.
pub(crate) fn lookup<'a>(root: &'a Value, segs: &[&str]) -> Option<&'a Value> {
    let mut node = root;
    for seg in segs {
        node = node.as_object()?.get(*seg)?;
    }
    if node.is_null() {
        None
    } else {
        Some(node)
    }
}

/// Returns the node at `segs`, creating empty objects along the way.
fn node_mut<'a>(root: &'a mut Value, segs: &[&str]) -> &'a mut Value {
    let mut node = root;
    for seg in segs {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        node = match node {
            Value::Object(map) => map
                .entry(seg.to_string())
                .or_insert_with(|| Value::Object(Map::new())),
            _ => unreachable!("node was just made an object"),
        };
    }
    node
}

/// Replaces the subtree at `segs` with `value`.
pub(crate) fn replace(root: &mut Value, segs: &[&str], value: Value) {
    *node_mut(root, segs) = value;
}

/// Deep-merges `value` into the subtree at `segs`.
pub(crate) fn update(root: &mut Value, segs: &[&str], value: Value) {
    merge(node_mut(root, segs), value);
}

/// Removes the subtree at `segs`. Absent paths are a no-op.
pub(crate) fn delete(root: &mut Value, segs: &[&str]) {
    let Some((last, parents)) = segs.split_last() else {
        *root = Value::Object(Map::new());
        return;
    };
    let mut node = root;
    for seg in parents {
        match node.as_object_mut().and_then(|m| m.get_mut(*seg)) {
            Some(next) => node = next,
            None => return,
        }
    }
    if let Some(map) = node.as_object_mut() {
        map.remove(*last);
    }
}

/// Merges `patch` into `target`: objects merge key by key, anything else
/// replaces.
pub(crate) fn merge(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Object(dst), Value::Object(src)) => {
            for (key, value) in src {
                match dst.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        dst.insert(key, value);
                    }
                }
            }
        }
        (dst, src) => *dst = src,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_replace_creates_parents() {
        let mut root = json!({});
        replace(&mut root, &["interfaces", "interface", "Agg1"], json!({"name": "Agg1"}));
        assert_eq!(
            lookup(&root, &["interfaces", "interface", "Agg1", "name"]),
            Some(&json!("Agg1"))
        );
    }

    #[test]
    fn test_replace_drops_unlisted_leaves() {
        let mut root = json!({"a": {"x": 1, "y": 2}});
        replace(&mut root, &["a"], json!({"x": 3}));
        assert_eq!(root, json!({"a": {"x": 3}}));
    }

    #[test]
    fn test_update_merges() {
        let mut root = json!({"a": {"x": 1, "y": {"z": 2}}});
        update(&mut root, &["a"], json!({"y": {"w": 4}, "v": 5}));
        assert_eq!(root, json!({"a": {"x": 1, "y": {"z": 2, "w": 4}, "v": 5}}));
    }

    #[test]
    fn test_delete_absent_is_noop() {
        let mut root = json!({"a": {"x": 1}});
        delete(&mut root, &["b", "c"]);
        delete(&mut root, &["a", "x"]);
        assert_eq!(root, json!({"a": {}}));
    }

    #[test]
    fn test_lookup_treats_null_as_absent() {
        let root = json!({"a": null});
        assert_eq!(lookup(&root, &["a"]), None);
        assert_eq!(lookup(&root, &[]), Some(&root));
    }
}
