//! The scene tree: ordered root nodes, each owning its children.
//!
//! Every mutation addressed by id is a silent no-op when the id is unknown;
//! methods report whether anything changed through their return value.

use crate::geometry::{Layout, absolute_position};
use crate::shapes::{Node, NodeId, NodeType};
use crate::units::px;
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Reverse lookup from a node to its parent.
///
/// [`Scene`] answers by scanning the tree. An index-backed tree can implement
/// this trait without changing callers.
pub trait ParentLookup {
    /// Find a node anywhere in the tree.
    fn node(&self, id: &NodeId) -> Option<&Node>;

    /// The node that directly contains `id`, or `None` for roots and unknown ids.
    fn parent_of(&self, id: &NodeId) -> Option<&Node>;

    /// Ids of all ancestors, nearest first.
    fn ancestors(&self, id: &NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = id.clone();
        while let Some(parent) = self.parent_of(&current) {
            out.push(parent.id.clone());
            current = parent.id.clone();
        }
        out
    }
}

/// The scene tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scene {
    nodes: Vec<Node>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Root nodes in z-order (last is topmost).
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn into_nodes(self) -> Vec<Node> {
        self.nodes
    }

    /// Replace the whole tree.
    pub fn replace(&mut self, nodes: Vec<Node>) {
        self.nodes = nodes;
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of root nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Number of nodes at every depth.
    pub fn node_count(&self) -> usize {
        self.nodes.iter().map(Node::subtree_len).sum()
    }

    /// Depth-first search for a node.
    pub fn find(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find_map(|n| n.find(id))
    }

    pub fn find_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find_map(|n| n.find_mut(id))
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.find(id).is_some()
    }

    /// Every node in pre-order (parents before children, back to front).
    pub fn iter(&self) -> Vec<&Node> {
        fn walk<'a>(nodes: &'a [Node], out: &mut Vec<&'a Node>) {
            for node in nodes {
                out.push(node);
                walk(&node.children, out);
            }
        }
        let mut out = Vec::new();
        walk(&self.nodes, &mut out);
        out
    }

    /// Chain of nodes from a root down to `id`, inclusive.
    pub fn path_to(&self, id: &NodeId) -> Option<Vec<&Node>> {
        fn search<'a>(nodes: &'a [Node], id: &NodeId, path: &mut Vec<&'a Node>) -> bool {
            for node in nodes {
                path.push(node);
                if &node.id == id || search(&node.children, id, path) {
                    return true;
                }
                path.pop();
            }
            false
        }
        let mut path = Vec::new();
        search(&self.nodes, id, &mut path).then_some(path)
    }

    /// Parent id and index of `id` within its sibling list.
    pub fn position_of(&self, id: &NodeId) -> Option<(Option<NodeId>, usize)> {
        let parent = self.parent_of(id).map(|p| p.id.clone());
        let index = self.siblings(parent.as_ref())?
            .iter()
            .position(|n| &n.id == id)?;
        Some((parent, index))
    }

    /// Children of `parent`, or the roots for `None`.
    pub fn siblings(&self, parent: Option<&NodeId>) -> Option<&[Node]> {
        match parent {
            None => Some(&self.nodes),
            Some(pid) => self.find(pid).map(|p| p.children.as_slice()),
        }
    }

    fn siblings_mut(&mut self, parent: Option<&NodeId>) -> Option<&mut Vec<Node>> {
        match parent {
            None => Some(&mut self.nodes),
            Some(pid) => self.find_mut(pid).map(|p| &mut p.children),
        }
    }

    /// Attach `node` as the last child of `parent` (or as a root).
    ///
    /// Returns `false` and drops nothing into the tree when the parent is
    /// unknown or the id is already present.
    pub fn insert(&mut self, node: Node, parent: Option<&NodeId>) -> bool {
        if self.contains(&node.id) {
            return false;
        }
        match self.siblings_mut(parent) {
            Some(list) => {
                list.push(node);
                true
            }
            None => false,
        }
    }

    /// Attach `node` at `index` (clamped) among the children of `parent`.
    pub fn insert_at(&mut self, node: Node, parent: Option<&NodeId>, index: usize) -> bool {
        if self.contains(&node.id) {
            return false;
        }
        match self.siblings_mut(parent) {
            Some(list) => {
                let index = index.min(list.len());
                list.insert(index, node);
                true
            }
            None => false,
        }
    }

    /// Detach a node together with its subtree.
    pub fn remove(&mut self, id: &NodeId) -> Option<Node> {
        fn take(nodes: &mut Vec<Node>, id: &NodeId) -> Option<Node> {
            if let Some(index) = nodes.iter().position(|n| &n.id == id) {
                return Some(nodes.remove(index));
            }
            nodes.iter_mut().find_map(|n| take(&mut n.children, id))
        }
        take(&mut self.nodes, id)
    }

    /// Move `id` under `new_parent` (or to the root) keeping its absolute position.
    ///
    /// Refuses to move a node into itself or one of its descendants.
    pub fn reparent(&mut self, id: &NodeId, new_parent: Option<&NodeId>) -> bool {
        let Some(node) = self.find(id) else {
            return false;
        };
        if let Some(pid) = new_parent {
            if node.contains(pid) || !self.contains(pid) {
                return false;
            }
        }
        let current_parent = self.parent_of(id).map(|p| p.id.clone());
        if current_parent.as_ref() == new_parent {
            return false;
        }

        let Some(before) = absolute_position(&*self, id) else {
            return false;
        };
        let target_origin = match new_parent {
            Some(pid) => absolute_position(&*self, pid).unwrap_or(Point::ZERO),
            None => Point::ZERO,
        };
        let Some(mut node) = self.remove(id) else {
            return false;
        };
        node.x = before.x - target_origin.x;
        node.y = before.y - target_origin.y;
        log::debug!("Reparented {} under {:?}", node.id, new_parent);
        self.insert(node, new_parent)
    }

    /// Wrap sibling nodes in a new group sized to their bounding box.
    ///
    /// Needs at least two existing nodes sharing one parent. Members keep
    /// their relative order and are re-expressed in the group's frame.
    pub fn group(&mut self, ids: &[NodeId], layout: &Layout) -> Option<NodeId> {
        let first = ids.first()?;
        let parent = self.parent_of(first).map(|p| p.id.clone());
        let siblings = self.siblings(parent.as_ref())?;
        let index = siblings.iter().position(|n| ids.contains(&n.id))?;
        let members: Vec<NodeId> = siblings
            .iter()
            .filter(|n| ids.contains(&n.id))
            .map(|n| n.id.clone())
            .collect();
        if members.len() < 2 || members.len() != dedup_len(ids) {
            return None;
        }

        let parent_size = match &parent {
            Some(pid) => layout.resolved_size(self, pid)?,
            None => layout.surface,
        };
        let bounds = members
            .iter()
            .filter_map(|id| self.find(id))
            .map(|n| Rect::from_origin_size(n.position(), layout.resolve_size(n, parent_size)))
            .reduce(|a, b| a.union(b))?;

        let mut group = Node::create(NodeType::Group, bounds.origin());
        group.width = px(bounds.width());
        group.height = px(bounds.height());
        group.styles.width = group.width.clone();
        group.styles.height = group.height.clone();
        for id in &members {
            if let Some(mut member) = self.remove(id) {
                member.x -= bounds.x0;
                member.y -= bounds.y0;
                group.children.push(member);
            }
        }
        let group_id = group.id.clone();
        self.insert_at(group, parent.as_ref(), index);
        log::debug!("Grouped {} nodes into {}", members.len(), group_id);
        Some(group_id)
    }

    /// Dissolve a group, lifting its members into the group's parent.
    pub fn ungroup(&mut self, id: &NodeId) -> Option<Vec<NodeId>> {
        if self.find(id)?.node_type() != NodeType::Group {
            return None;
        }
        let (parent, index) = self.position_of(id)?;
        let group = self.remove(id)?;
        let mut lifted = Vec::with_capacity(group.children.len());
        for (offset, mut child) in group.children.into_iter().enumerate() {
            child.x += group.x;
            child.y += group.y;
            lifted.push(child.id.clone());
            self.insert_at(child, parent.as_ref(), index + offset);
        }
        Some(lifted)
    }

    /// Move a node to the top of its sibling list.
    pub fn bring_to_front(&mut self, id: &NodeId) -> bool {
        self.reorder(id, |_, len| len - 1)
    }

    /// Move a node to the bottom of its sibling list.
    pub fn send_to_back(&mut self, id: &NodeId) -> bool {
        self.reorder(id, |_, _| 0)
    }

    pub fn bring_forward(&mut self, id: &NodeId) -> bool {
        self.reorder(id, |i, len| (i + 1).min(len - 1))
    }

    pub fn send_backward(&mut self, id: &NodeId) -> bool {
        self.reorder(id, |i, _| i.saturating_sub(1))
    }

    fn reorder(&mut self, id: &NodeId, target: impl Fn(usize, usize) -> usize) -> bool {
        let Some((parent, index)) = self.position_of(id) else {
            return false;
        };
        let Some(list) = self.siblings_mut(parent.as_ref()) else {
            return false;
        };
        let to = target(index, list.len());
        if to == index {
            return false;
        }
        let node = list.remove(index);
        list.insert(to, node);
        true
    }

    /// Center every direct child inside the node's resolved box.
    pub fn center_children(&mut self, id: &NodeId, layout: &Layout) -> bool {
        let Some(size) = layout.resolved_size(self, id) else {
            return false;
        };
        let Some(node) = self.find_mut(id) else {
            return false;
        };
        if node.children.is_empty() {
            return false;
        }
        for child in &mut node.children {
            let child_size = layout.resolve_size(child, size);
            child.x = (size.width - child_size.width) / 2.0;
            child.y = (size.height - child_size.height) / 2.0;
        }
        true
    }

    /// Clamp every descendant of `id` inside its parent's box.
    pub fn constrain_children(&mut self, id: &NodeId, layout: &Layout) {
        fn clamp(node: &mut Node, size: kurbo::Size, layout: &Layout) {
            for child in &mut node.children {
                let child_size = layout.resolve_size(child, size);
                child.x = child.x.min(size.width - child_size.width).max(0.0);
                child.y = child.y.min(size.height - child_size.height).max(0.0);
                clamp(child, child_size, layout);
            }
        }
        let Some(size) = layout.resolved_size(self, id) else {
            return;
        };
        if let Some(node) = self.find_mut(id) {
            clamp(node, size, layout);
        }
    }

    /// Ids of nodes tagged with the given component reference.
    pub fn nodes_with_component(&self, component: &str) -> Vec<NodeId> {
        self.iter()
            .into_iter()
            .filter(|n| n.component.as_deref() == Some(component))
            .map(|n| n.id.clone())
            .collect()
    }
}

impl ParentLookup for Scene {
    fn node(&self, id: &NodeId) -> Option<&Node> {
        self.find(id)
    }

    fn parent_of(&self, id: &NodeId) -> Option<&Node> {
        fn search<'a>(parent: &'a Node, id: &NodeId) -> Option<&'a Node> {
            if parent.children.iter().any(|c| &c.id == id) {
                return Some(parent);
            }
            parent.children.iter().find_map(|c| search(c, id))
        }
        self.nodes.iter().find_map(|n| search(n, id))
    }
}

fn dedup_len(ids: &[NodeId]) -> usize {
    let mut unique: Vec<&NodeId> = ids.iter().collect();
    unique.sort();
    unique.dedup();
    unique.len()
}
