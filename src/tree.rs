//! Slot arena holding the nodes of one document.
//!
//! Every node lives in a slot owned by the arena. A parent lists its children
//! by [`NodeId`]; a child records its parent as a plain index, so the upward
//! link never owns anything. Destroying a subtree frees its slots and bumps
//! their generation, which makes handles to destroyed nodes detectable.

use std::fmt;

/// Handle to a node in a document.
///
/// Handles are cheap to copy and stay valid until the node is destroyed
/// (removed, cleared away with its parent, or discarded by a reload).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({}v{})", self.index, self.generation)
    }
}

#[derive(Clone, Debug)]
struct Slot<T> {
    generation: u32,
    node: Option<Node<T>>,
}

#[derive(Clone, Debug)]
struct Node<T> {
    data: T,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Clone, Debug)]
pub(crate) struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Arena {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }
}

impl<T> Arena<T> {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Allocates a detached node.
    pub(crate) fn alloc(&mut self, data: T) -> NodeId {
        let node = Node {
            data,
            parent: None,
            children: Vec::new(),
        };
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            NodeId {
                index,
                generation: slot.generation,
            }
        } else {
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

    pub(crate) fn contains(&self, id: NodeId) -> bool {
        self.slots
            .get(id.index as usize)
            .is_some_and(|slot| slot.generation == id.generation && slot.node.is_some())
    }

    /// Number of live nodes.
    pub(crate) fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    fn node(&self, id: NodeId) -> &Node<T> {
        match self.slots.get(id.index as usize) {
            Some(Slot {
                generation,
                node: Some(node),
            }) if *generation == id.generation => node,
            _ => panic!("stale node handle {:?}", id),
        }
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node<T> {
        match self.slots.get_mut(id.index as usize) {
            Some(Slot {
                generation,
                node: Some(node),
            }) if *generation == id.generation => node,
            _ => panic!("stale node handle {:?}", id),
        }
    }

    pub(crate) fn get(&self, id: NodeId) -> &T {
        &self.node(id).data
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut T {
        &mut self.node_mut(id).data
    }

    pub(crate) fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub(crate) fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub(crate) fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    /// `true` if `ancestor` is `id` itself or one of its ancestors.
    pub(crate) fn is_ancestor_or_self(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// Topmost ancestor of `id`.
    pub(crate) fn root_of(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current
    }

    /// Attaches a detached node as the last child of `parent`.
    pub(crate) fn append(&mut self, parent: NodeId, child: NodeId) {
        self.insert(parent, usize::MAX, child);
    }

    /// Attaches a detached node at `index` (clamped to the child count).
    pub(crate) fn insert(&mut self, parent: NodeId, index: usize, child: NodeId) {
        debug_assert!(self.parent(child).is_none(), "node already has a parent");
        self.node_mut(child).parent = Some(parent);
        let children = &mut self.node_mut(parent).children;
        let index = index.min(children.len());
        children.insert(index, child);
    }

    /// Removes `id` from its parent's child list; the subtree stays alive.
    pub(crate) fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.node_mut(id).parent.take() {
            self.node_mut(parent).children.retain(|&c| c != id);
        }
    }

    /// Moves `id` to `index` among its siblings.
    pub(crate) fn reorder(&mut self, id: NodeId, index: usize) -> bool {
        let Some(parent) = self.parent(id) else {
            return false;
        };
        let children = &mut self.node_mut(parent).children;
        let Some(from) = children.iter().position(|&c| c == id) else {
            return false;
        };
        let to = index.min(children.len() - 1);
        if from == to {
            return false;
        }
        let node = children.remove(from);
        children.insert(to, node);
        true
    }

    /// Detaches `id` and frees it together with all of its descendants.
    pub(crate) fn remove(&mut self, id: NodeId) {
        self.detach(id);
        self.free_subtree(id);
    }

    /// Frees every child subtree of `id`.
    pub(crate) fn clear_children(&mut self, id: NodeId) {
        let children = std::mem::take(&mut self.node_mut(id).children);
        for child in children {
            self.node_mut(child).parent = None;
            self.free_subtree(child);
        }
    }

    /// Frees every node except `keep`, which is left detached and childless.
    pub(crate) fn retain_only(&mut self, keep: NodeId) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if index as u32 == keep.index {
                continue;
            }
            if slot.node.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
            }
        }
        let node = self.node_mut(keep);
        node.parent = None;
        node.children.clear();
    }

    /// Stable sort of the children of `id` by a key computed from their payload.
    pub(crate) fn sort_children_by_key<K, F>(&mut self, id: NodeId, mut key: F)
    where
        K: Ord,
        F: FnMut(&T) -> K,
    {
        let mut children = std::mem::take(&mut self.node_mut(id).children);
        children.sort_by_cached_key(|&child| key(self.get(child)));
        self.node_mut(id).children = children;
    }

    fn free_subtree(&mut self, id: NodeId) {
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            let slot = &mut self.slots[current.index as usize];
            if let Some(node) = slot.node.take() {
                pending.extend(node.children);
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(current.index);
            }
        }
    }

    /// Depth-first, document-order walk of the subtree below `id` (excluding `id`).
    pub(crate) fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut pending: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(current) = pending.pop() {
            out.push(current);
            pending.extend(self.children(current).iter().rev().copied());
        }
        out
    }
}

/// Steps of a multi-level name path; whitespace and `.` both separate steps.
pub(crate) fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split(|c: char| c.is_whitespace() || c == '.')
        .filter(|step| !step.is_empty())
}
