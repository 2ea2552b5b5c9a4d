//! Rendering tree contents for people and for JSON.
//!
//! The line formats are the ones the command interpreter prints:
//!
//! ```text
//! /files/etc/hosts/1/ipaddr = 127.0.0.1      get, match
//! /files/etc/hosts/1/alias (o)               get on a value-less node
//! /files/etc/hosts/9/ipaddr (none)           get without a match
//! /files/etc/hosts/1/ipaddr = "127.0.0.1"    print
//! ```
//!
//! Snapshots are the JSON form of a subtree. A node without a value has no
//! `value` key, which keeps it distinct from a node holding `""`:
//!
//! ```
//! use cfgtree::output::{from_json, to_json, NodeSnapshot};
//!
//! let snap = from_json(r#"{"label": "hosts", "children": [{"label": "1", "value": ""}]}"#).unwrap();
//! assert_eq!(snap.value, None);
//! assert_eq!(snap.children[0].value.as_deref(), Some(""));
//! assert!(to_json(&snap).unwrap().contains("\"value\": \"\""));
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::tree::{escape_label, NodeId, NodeStore};

/// Deepest subtree a snapshot may hold, counted in node levels.
///
/// Each level nests an object and a `children` array, so this keeps dumps
/// loadable under serde_json's recursion limit of 128.
pub const MAX_SNAPSHOT_DEPTH: usize = 60;

/// A listed node: its canonical path, label and value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub path: String,
    pub label: String,
    pub value: Option<String>,
    /// Number of children
    pub children: usize,
}

pub fn entry(store: &NodeStore, id: NodeId) -> Entry {
    entry_at(store, id, store.canonical_path(id))
}

fn entry_at(store: &NodeStore, id: NodeId, path: String) -> Entry {
    Entry {
        path,
        label: store.label(id).unwrap_or_default().to_string(),
        value: store.value(id).map(str::to_string),
        children: store.children(id).len(),
    }
}

/// Entries for the subtree below `id` in document order, `id` included
/// unless it is the root.
///
/// Paths are extended one step at a time instead of being rebuilt from the
/// root for every node.
pub fn subtree_entries(store: &NodeStore, id: NodeId) -> Vec<Entry> {
    let mut out = vec![];
    let mut stack = vec![(id, store.canonical_path(id))];
    while let Some((node, path)) = stack.pop() {
        let children = store.children(node);

        let mut totals: HashMap<&str, usize> = HashMap::new();
        for &c in children {
            *totals.entry(store.label(c).unwrap_or_default()).or_default() += 1;
        }
        let mut seen: HashMap<&str, usize> = HashMap::new();
        let base = path.trim_end_matches('/');
        let mut paths = Vec::with_capacity(children.len());
        for &c in children {
            let label = store.label(c).unwrap_or_default();
            let pos = seen.entry(label).or_default();
            *pos += 1;
            let child_path = if totals.get(label).copied().unwrap_or(0) > 1 {
                format!("{}/{}[{}]", base, escape_label(label), pos)
            } else {
                format!("{}/{}", base, escape_label(label))
            };
            paths.push((c, child_path));
        }
        stack.extend(paths.into_iter().rev());

        if node != store.root() {
            out.push(entry_at(store, node, path));
        }
    }
    out
}

/// Number of node levels in the subtree below `id`, `id` included.
pub fn subtree_depth(store: &NodeStore, id: NodeId) -> usize {
    let mut deepest = 0;
    let mut stack = vec![(id, 1)];
    while let Some((node, depth)) = stack.pop() {
        deepest = deepest.max(depth);
        stack.extend(store.children(node).iter().map(|&c| (c, depth + 1)));
    }
    deepest
}

/// Serializable copy of a subtree.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NodeSnapshot {
    /// Empty for the root
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSnapshot>,
}

/// Copy a subtree. Callers bound its depth with [`subtree_depth`].
pub fn snapshot(store: &NodeStore, id: NodeId) -> NodeSnapshot {
    NodeSnapshot {
        label: store.label(id).unwrap_or_default().to_string(),
        value: store.value(id).map(str::to_string),
        children: store
            .children(id)
            .iter()
            .map(|&c| snapshot(store, c))
            .collect(),
    }
}

/// First label below the snapshot's top that could not be addressed.
pub fn first_bad_label(snap: &NodeSnapshot) -> Option<&str> {
    let mut stack: Vec<&NodeSnapshot> = snap.children.iter().rev().collect();
    while let Some(child) = stack.pop() {
        if child.label.is_empty() || child.label.contains('/') {
            return Some(child.label.as_str());
        }
        stack.extend(child.children.iter().rev());
    }
    None
}

/// Append copies of the snapshot's children below `parent`.
///
/// Returns the number of nodes created.
pub fn graft(store: &mut NodeStore, parent: NodeId, snap: &NodeSnapshot) -> usize {
    let mut created = 0;
    let mut stack = vec![(parent, snap)];
    while let Some((parent, snap)) = stack.pop() {
        for child in &snap.children {
            if let Some(id) = store.append_child(parent, child.label.as_str()) {
                store.set_value(id, child.value.clone());
                created += 1;
                stack.push((id, child));
            }
        }
    }
    created
}

pub fn to_json(snap: &NodeSnapshot) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(snap)
}

pub fn from_json(text: &str) -> Result<NodeSnapshot, serde_json::Error> {
    serde_json::from_str(text)
}

/// `get` output for `path`; `found` is `None` when nothing matched.
pub fn format_get(path: &str, found: Option<Option<&str>>) -> String {
    match found {
        Some(Some(value)) => format!("{} = {}\n", path, value),
        Some(None) => format!("{} (o)\n", path),
        None => format!("{} (none)\n", path),
    }
}

pub fn format_match(entry: &Entry) -> String {
    match &entry.value {
        Some(value) => format!("{} = {}\n", entry.path, value),
        None => format!("{}\n", entry.path),
    }
}

pub fn format_ls(entry: &Entry) -> String {
    match &entry.value {
        _ if entry.children > 0 => format!("{}/\n", entry.label),
        Some(value) => format!("{} = {}\n", entry.label, value),
        None => format!("{}\n", entry.label),
    }
}

pub fn format_print(entry: &Entry) -> String {
    match &entry.value {
        Some(value) => format!("{} = \"{}\"\n", entry.path, escape_value(value)),
        None => format!("{}\n", entry.path),
    }
}

fn escape_value(value: &str) -> String {
    value
        .chars()
        .flat_map(|c| match c {
            '"' => vec!['\\', '"'],
            '\\' => vec!['\\', '\\'],
            '\n' => vec!['\\', 'n'],
            '\t' => vec!['\\', 't'],
            c => vec![c],
        })
        .collect()
}
