//! Arena-backed storage for the configuration tree.
//!
//! Nodes live in a slot vector and refer to each other through [`NodeId`]s.
//! Children are owned through the parent's ordered child list; the parent
//! link is only used to walk upwards. Each slot carries a generation counter
//! so an id kept across a removal can never alias a node created later.

use std::fmt::Write;

/// Stable handle to a node in a [`NodeStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

#[derive(Debug, Clone)]
pub struct Node {
    label: Option<String>,
    value: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    /// The node's label; `None` only for the root
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

#[derive(Debug)]
pub struct NodeStore {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
}

impl Default for NodeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeStore {
    /// Create a store holding only the root node.
    pub fn new() -> Self {
        let mut store = NodeStore {
            slots: vec![],
            free: vec![],
            root: NodeId {
                index: 0,
                generation: 0,
            },
        };
        store.root = store.alloc(Node {
            label: None,
            value: None,
            parent: None,
            children: vec![],
        });
        store
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.node = Some(node);
                NodeId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(node),
                });
                NodeId {
                    index,
                    generation: 0,
                }
            }
        }
    }

    fn release(&mut self, id: NodeId) {
        if let Some(slot) = self.slots.get_mut(id.index as usize)
            && slot.generation == id.generation
            && slot.node.take().is_some()
        {
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(id.index);
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes, root included
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    pub fn label(&self, id: NodeId) -> Option<&str> {
        self.node(id).and_then(Node::label)
    }

    pub fn value(&self, id: NodeId) -> Option<&str> {
        self.node(id).and_then(Node::value)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(Node::parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(Node::children).unwrap_or(&[])
    }

    /// Replace a node's value. Returns false for a stale id.
    pub fn set_value(&mut self, id: NodeId, value: Option<String>) -> bool {
        match self.node_mut(id) {
            Some(node) => {
                node.value = value;
                true
            }
            None => false,
        }
    }

    /// Relabel a non-root node. Returns false for the root or a stale id.
    pub fn set_label(&mut self, id: NodeId, label: impl Into<String>) -> bool {
        if id == self.root {
            return false;
        }
        match self.node_mut(id) {
            Some(node) => {
                node.label = Some(label.into());
                true
            }
            None => false,
        }
    }

    /// Create a value-less child at `index` in `parent`'s child list.
    ///
    /// `index` is clamped to the number of children.
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        index: usize,
        label: impl Into<String>,
    ) -> Option<NodeId> {
        if !self.contains(parent) {
            return None;
        }
        let id = self.alloc(Node {
            label: Some(label.into()),
            value: None,
            parent: Some(parent),
            children: vec![],
        });
        let children = &mut self.node_mut(parent)?.children;
        let index = index.min(children.len());
        children.insert(index, id);
        Some(id)
    }

    /// Create a value-less child at the end of `parent`'s children.
    pub fn append_child(&mut self, parent: NodeId, label: impl Into<String>) -> Option<NodeId> {
        self.insert_child(parent, usize::MAX, label)
    }

    /// Create a child right after the last child labelled `label`, or at the
    /// end when there is none.
    pub fn append_after_label(&mut self, parent: NodeId, label: &str) -> Option<NodeId> {
        let index = self
            .children(parent)
            .iter()
            .rposition(|&c| self.label(c) == Some(label))
            .map(|i| i + 1)
            .unwrap_or(usize::MAX);
        self.insert_child(parent, index, label)
    }

    /// Index of a node within its parent's child list
    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    /// 1-based position of a node among its siblings sharing its label.
    pub fn position(&self, id: NodeId) -> usize {
        let (Some(parent), Some(label)) = (self.parent(id), self.label(id)) else {
            return 1;
        };
        let mut pos = 0;
        for &sibling in self.children(parent) {
            if self.label(sibling) == Some(label) {
                pos += 1;
            }
            if sibling == id {
                break;
            }
        }
        pos
    }

    /// Number of siblings (the node included) sharing the node's label.
    pub fn same_label_count(&self, id: NodeId) -> usize {
        let (Some(parent), Some(label)) = (self.parent(id), self.label(id)) else {
            return 1;
        };
        self.count_children_labelled(parent, label)
    }

    pub fn count_children_labelled(&self, parent: NodeId, label: &str) -> usize {
        self.children(parent)
            .iter()
            .filter(|&&c| self.label(c) == Some(label))
            .count()
    }

    /// Whether `node` is `ancestor` or lies below it
    pub fn is_within(&self, node: NodeId, ancestor: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Every node of the subtree in document order, `id` first.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = vec![];
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if !self.contains(current) {
                continue;
            }
            out.push(current);
            stack.extend(self.children(current).iter().rev());
        }
        out
    }

    pub fn subtree_size(&self, id: NodeId) -> usize {
        self.descendants(id).len()
    }

    /// Unlink a non-root node from its parent, keeping its subtree alive.
    ///
    /// Returns the former parent and index.
    pub fn detach(&mut self, id: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        self.node_mut(parent)?.children.remove(index);
        self.node_mut(id)?.parent = None;
        Some((parent, index))
    }

    /// Link a detached node into `parent` at `index` (clamped).
    ///
    /// Refuses nodes that still have a parent and attachments that would
    /// create a cycle.
    pub fn attach(&mut self, id: NodeId, parent: NodeId, index: usize) -> bool {
        if id == self.root
            || self.parent(id).is_some()
            || !self.contains(id)
            || self.is_within(parent, id)
        {
            return false;
        }
        let Some(parent_node) = self.node_mut(parent) else {
            return false;
        };
        let index = index.min(parent_node.children.len());
        parent_node.children.insert(index, id);
        if let Some(node) = self.node_mut(id) {
            node.parent = Some(parent);
        }
        true
    }

    /// Delete a node and its whole subtree.
    ///
    /// Returns the number of nodes deleted, the node itself included. The
    /// root is never deleted and yields 0.
    pub fn remove(&mut self, id: NodeId) -> usize {
        if id == self.root || !self.contains(id) {
            return 0;
        }
        self.detach(id);
        let doomed = self.descendants(id);
        for &node in &doomed {
            self.release(node);
        }
        doomed.len()
    }

    /// Address of a node that compiles back to exactly that node.
    ///
    /// Labels are escaped and `[n]` is added when siblings share the label.
    pub fn canonical_path(&self, id: NodeId) -> String {
        if id == self.root {
            return "/".to_string();
        }
        let mut chain = vec![];
        let mut current = Some(id);
        while let Some(node) = current {
            if node == self.root {
                break;
            }
            chain.push(node);
            current = self.parent(node);
        }

        let mut path = String::new();
        for &node in chain.iter().rev() {
            path.push('/');
            path.push_str(&escape_label(self.label(node).unwrap_or_default()));
            if self.same_label_count(node) > 1 {
                let _ = write!(path, "[{}]", self.position(node));
            }
        }
        path
    }
}

/// Escape a label so it lexes back as a single step label.
///
/// Inner whitespace is left alone; the lexer only drops it at the ends.
pub fn escape_label(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    if label == "." || label == ".." {
        out.push('\\');
    }
    let last = label.chars().count().saturating_sub(1);
    for (i, ch) in label.chars().enumerate() {
        let edge_space = ch.is_whitespace() && (i == 0 || i == last);
        if matches!(ch, '/' | '[' | ']' | '*' | '\\') || edge_space {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
