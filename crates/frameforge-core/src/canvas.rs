//! Canvas document and editing state.

use crate::actions::ActionRegistry;
use crate::animation::{Animator, Keyframe};
use crate::camera::Camera;
use crate::config::CanvasConfig;
use crate::geometry::{Layout, absolute_position};
use crate::history::HistoryManager;
use crate::import::{ImportResult, parse_nodes};
use crate::interaction::InteractionState;
use crate::scene::{ParentLookup, Scene};
use crate::shapes::{Node, NodeId, NodeKind, NodeType, ScrollDirection};
use crate::snap::Guide;
use crate::storage::Storage;
use crate::tools::{ToolKind, ToolManager};
use crate::units::px;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Offset applied to pasted nodes, cumulative over repeated pastes.
pub const PASTE_OFFSET: f64 = 20.0;

/// Properties that stay on the addressed node instead of propagating to
/// every node sharing its component tag.
const LOCAL_PROPERTIES: [&str; 2] = ["x", "y"];

/// The editing surface: scene, view, history and the state around them.
#[derive(Debug)]
pub struct Canvas {
    /// The node tree being edited.
    pub scene: Scene,
    /// Camera for view transform.
    pub camera: Camera,
    /// Undo/redo log.
    pub history: HistoryManager,
    /// Tool manager.
    pub tool_manager: ToolManager,
    /// Currently selected node ids, in selection order.
    pub selection: Vec<NodeId>,
    /// Keyframe playback.
    pub animator: Animator,
    /// Host callbacks for click actions.
    pub actions: ActionRegistry,
    pub config: CanvasConfig,
    /// Alignment guides of the current drag.
    pub guides: Vec<Guide>,
    pub(crate) interaction: InteractionState,
    clipboard: Vec<Node>,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new()
    }
}

impl Canvas {
    /// Create an empty canvas with default settings.
    pub fn new() -> Self {
        Self::with_config(CanvasConfig::default())
    }

    pub fn with_config(config: CanvasConfig) -> Self {
        Self {
            scene: Scene::new(),
            camera: Camera::new(),
            history: HistoryManager::new(&[], config.history_capacity),
            tool_manager: ToolManager::new(),
            selection: Vec::new(),
            animator: Animator::new(),
            actions: ActionRegistry::new(),
            config,
            guides: Vec::new(),
            interaction: InteractionState::Idle,
            clipboard: Vec::new(),
        }
    }

    /// Persist history to `storage` after every commit.
    pub fn with_storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.history = std::mem::take(&mut self.history).with_storage(storage);
        self
    }

    /// Replace the scene with the newest persisted snapshot, if any.
    pub fn restore(&mut self) -> bool {
        match self.history.load() {
            Some(nodes) => {
                self.scene.replace(nodes);
                self.selection.clear();
                self.animator.stop_all();
                true
            }
            None => false,
        }
    }

    /// Geometry context for the current settings.
    pub fn layout(&self) -> Layout {
        Layout::new(self.config.surface(), self.config.resolver())
    }

    /// Record the current scene in history.
    pub fn commit(&mut self, label: &str) {
        self.history.commit(self.scene.nodes(), label);
    }

    // --- Selection ---

    /// Select a node (clears previous selection).
    pub fn select(&mut self, id: NodeId) {
        self.selection.clear();
        self.add_to_selection(id);
    }

    pub fn add_to_selection(&mut self, id: NodeId) {
        if self.scene.contains(&id) && !self.selection.contains(&id) {
            self.selection.push(id);
        }
    }

    /// Add `id` to the selection, or remove it if already selected.
    pub fn toggle_selection(&mut self, id: NodeId) {
        if let Some(index) = self.selection.iter().position(|s| s == &id) {
            self.selection.remove(index);
        } else {
            self.add_to_selection(id);
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Select every root node.
    pub fn select_all(&mut self) {
        self.selection = self.scene.nodes().iter().map(|n| n.id.clone()).collect();
    }

    pub fn is_selected(&self, id: &NodeId) -> bool {
        self.selection.contains(id)
    }

    /// Selected ids that still exist and have no selected ancestor.
    pub fn selected_roots(&self) -> Vec<NodeId> {
        self.selection
            .iter()
            .filter(|id| self.scene.contains(id))
            .filter(|id| {
                !self
                    .scene
                    .ancestors(id)
                    .iter()
                    .any(|a| self.selection.contains(a))
            })
            .cloned()
            .collect()
    }

    fn prune_selection(&mut self) {
        let scene = &self.scene;
        self.selection.retain(|id| scene.contains(id));
    }

    /// Set the current tool.
    pub fn set_tool(&mut self, tool: ToolKind) {
        self.tool_manager.set_tool(tool);
    }

    // --- Structure ---

    /// Insert a node under `parent` (or at the root). Returns its id.
    pub fn add_node(&mut self, node: Node, parent: Option<&NodeId>) -> Option<NodeId> {
        let id = node.id.clone();
        if !self.scene.insert(node, parent) {
            return None;
        }
        self.commit("Add Shape");
        Some(id)
    }

    /// Create a catalog node of `node_type` at `at` on the root.
    pub fn create_node(&mut self, node_type: NodeType, at: kurbo::Point) -> Option<NodeId> {
        self.add_node(Node::create(node_type, at), None)
    }

    /// Remove a node and its subtree.
    pub fn remove_node(&mut self, id: &NodeId) -> Option<Node> {
        let removed = self.detach(id)?;
        self.commit("Delete Shape");
        Some(removed)
    }

    fn detach(&mut self, id: &NodeId) -> Option<Node> {
        let removed = self.scene.remove(id)?;
        for node in std::iter::once(&removed).chain(descendants(&removed)) {
            self.animator.stop(&node.id);
        }
        self.prune_selection();
        Some(removed)
    }

    /// Delete every selected node. Returns how many subtrees were removed.
    pub fn delete_selected(&mut self) -> usize {
        let roots = self.selected_roots();
        let removed = roots.iter().filter(|id| self.detach(id).is_some()).count();
        self.selection.clear();
        if removed > 0 {
            self.commit("Delete Shape");
        }
        removed
    }

    /// Remove every node.
    pub fn clear(&mut self) {
        self.scene.clear();
        self.selection.clear();
        self.animator.stop_all();
        self.commit("Clear Canvas");
        log::info!("Canvas cleared");
    }

    /// Group the selected siblings. The new group becomes the selection.
    pub fn group_selected(&mut self) -> Option<NodeId> {
        let layout = self.layout();
        let ids = self.selected_roots();
        let group_id = self.scene.group(&ids, &layout)?;
        self.selection = vec![group_id.clone()];
        self.commit("Group Shapes");
        Some(group_id)
    }

    /// Dissolve a group. Its members become the selection.
    pub fn ungroup(&mut self, id: &NodeId) -> Option<Vec<NodeId>> {
        let members = self.scene.ungroup(id)?;
        self.selection = members.clone();
        self.commit("Ungroup Shapes");
        Some(members)
    }

    /// Dissolve every selected group.
    pub fn ungroup_selected(&mut self) -> Vec<NodeId> {
        let groups: Vec<NodeId> = self
            .selection
            .iter()
            .filter(|id| {
                self.scene
                    .find(id)
                    .is_some_and(|n| n.node_type() == NodeType::Group)
            })
            .cloned()
            .collect();
        let mut members = Vec::new();
        for group in groups {
            members.extend(self.scene.ungroup(&group).unwrap_or_default());
        }
        if !members.is_empty() {
            self.selection = members.clone();
            self.commit("Ungroup Shapes");
        }
        members
    }

    /// Move `child` into the container `parent`, keeping its absolute position.
    pub fn nest(&mut self, parent: &NodeId, child: &NodeId) -> bool {
        let is_container = self.scene.find(parent).is_some_and(Node::is_container);
        if !is_container || !self.scene.reparent(child, Some(parent)) {
            return false;
        }
        self.commit("Nest Shape");
        true
    }

    /// Lift `child` to the root, keeping its absolute position.
    pub fn unnest(&mut self, child: &NodeId) -> bool {
        if !self.scene.reparent(child, None) {
            return false;
        }
        self.commit("Unnest Shape");
        true
    }

    pub fn bring_to_front(&mut self, id: &NodeId) -> bool {
        self.scene.bring_to_front(id) && self.committed("Bring to Front")
    }

    pub fn send_to_back(&mut self, id: &NodeId) -> bool {
        self.scene.send_to_back(id) && self.committed("Send to Back")
    }

    pub fn bring_forward(&mut self, id: &NodeId) -> bool {
        self.scene.bring_forward(id) && self.committed("Bring Forward")
    }

    pub fn send_backward(&mut self, id: &NodeId) -> bool {
        self.scene.send_backward(id) && self.committed("Send Backward")
    }

    fn committed(&mut self, label: &str) -> bool {
        self.commit(label);
        true
    }

    /// Center every child of `id` inside it.
    pub fn center_children(&mut self, id: &NodeId) -> bool {
        let layout = self.layout();
        self.scene.center_children(id, &layout) && self.committed("Center Children")
    }

    // --- Clipboard ---

    /// Copy the selected subtrees. Returns how many were copied.
    pub fn copy_selected(&mut self) -> usize {
        let copies: Vec<Node> = self
            .selected_roots()
            .iter()
            .filter_map(|id| {
                let mut node = self.scene.find(id)?.clone();
                let origin = absolute_position(&self.scene, id)?;
                node.set_position(origin);
                Some(node)
            })
            .collect();
        if !copies.is_empty() {
            self.clipboard = copies;
        }
        self.clipboard.len()
    }

    /// Paste the clipboard onto the root with fresh ids, offset from the
    /// previous paste. The pasted nodes become the selection.
    pub fn paste(&mut self) -> Vec<NodeId> {
        if self.clipboard.is_empty() {
            return Vec::new();
        }
        let mut pasted = Vec::with_capacity(self.clipboard.len());
        for template in &mut self.clipboard {
            template.x += PASTE_OFFSET;
            template.y += PASTE_OFFSET;
            let mut node = template.clone();
            node.regenerate_ids();
            pasted.push(node.id.clone());
            self.scene.insert(node, None);
        }
        self.selection = pasted.clone();
        self.commit("Paste");
        pasted
    }

    pub fn has_clipboard(&self) -> bool {
        !self.clipboard.is_empty()
    }

    // --- Properties ---

    /// Set a property by name.
    ///
    /// Geometry and payload fields are addressed by their serialized names,
    /// anything else is a camelCase style key. Unknown keys and mistyped
    /// values are no-ops. Nodes tagged with a component pass the change on
    /// to every node with the same tag, except for position.
    pub fn update_property(&mut self, id: &NodeId, key: &str, value: Value) -> bool {
        let Some(node) = self.scene.find(id) else {
            return false;
        };
        let targets = match &node.component {
            Some(tag) if !LOCAL_PROPERTIES.contains(&key) => self.scene.nodes_with_component(tag),
            _ => vec![id.clone()],
        };
        let mut changed = false;
        for target in &targets {
            if let Some(node) = self.scene.find_mut(target) {
                changed |= apply_property(node, key, &value);
            }
        }
        if changed {
            self.commit("Update Property");
        }
        changed
    }

    // --- Serialization ---

    /// Replace the scene with a validated JSON tree.
    ///
    /// On error nothing changes.
    pub fn load_json(&mut self, json: &str) -> ImportResult<()> {
        let nodes = parse_nodes(json)?;
        log::info!("Loaded {} root nodes", nodes.len());
        self.animator.stop_all();
        self.scene.replace(nodes);
        self.selection.clear();
        self.commit("Load JSON");
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.scene)
    }

    // --- History ---

    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(nodes) => {
                self.restore_snapshot(nodes);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(nodes) => {
                self.restore_snapshot(nodes);
                true
            }
            None => false,
        }
    }

    fn restore_snapshot(&mut self, nodes: Vec<Node>) {
        self.scene.replace(nodes);
        self.prune_selection();
        self.guides.clear();
    }

    // --- Animation ---

    pub fn play(&mut self, id: &NodeId) -> bool {
        self.animator.play(&self.scene, id)
    }

    pub fn pause(&mut self, id: &NodeId) -> bool {
        self.animator.pause(id)
    }

    pub fn stop(&mut self, id: &NodeId) -> bool {
        self.animator.stop(id)
    }

    /// Advance animations. Returns `true` if the scene needs a redraw.
    pub fn tick(&mut self, dt: Duration) -> bool {
        self.animator.tick(&mut self.scene, dt)
    }
}

fn descendants(node: &Node) -> Vec<&Node> {
    let mut out = Vec::new();
    let mut stack: Vec<&Node> = node.children.iter().collect();
    while let Some(n) = stack.pop() {
        stack.extend(n.children.iter());
        out.push(n);
    }
    out
}

/// A length value: strings are kept, numbers become pixels.
fn length_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => n.as_f64().map(px),
        _ => None,
    }
}

fn set<T>(slot: &mut T, value: Option<T>) -> bool {
    match value {
        Some(v) => {
            *slot = v;
            true
        }
        None => false,
    }
}

fn apply_property(node: &mut Node, key: &str, value: &Value) -> bool {
    match key {
        "x" => return set(&mut node.x, value.as_f64()),
        "y" => return set(&mut node.y, value.as_f64()),
        "width" => return set(&mut node.width, length_value(value)),
        "height" => return set(&mut node.height, length_value(value)),
        "rotation" => {
            let Some(degrees) = value.as_f64() else {
                return false;
            };
            node.set_rotation(degrees);
            return true;
        }
        "frames" => {
            let frames = serde_json::from_value::<Vec<Keyframe>>(value.clone()).ok();
            return set(&mut node.frames, frames);
        }
        "text" => {
            return value
                .as_str()
                .is_some_and(|t| node.kind.set_text(t.to_string()));
        }
        _ => {}
    }

    match (key, &mut node.kind) {
        ("radius", NodeKind::Circle { radius }) => set(radius, value.as_f64()),
        ("checked", NodeKind::Checkbox { checked }) => set(checked, value.as_bool()),
        ("options", NodeKind::Selector { options, selected_option }) => {
            let Ok(new_options) = serde_json::from_value::<Vec<String>>(value.clone()) else {
                return false;
            };
            if *selected_option >= new_options.len() {
                *selected_option = 0;
            }
            *options = new_options;
            true
        }
        ("selectedOption", NodeKind::Selector { options, selected_option }) => {
            let index = value.as_u64().map(|i| i as usize);
            set(selected_option, index.filter(|i| *i < options.len()))
        }
        ("tableData", NodeKind::Table { table_data }) => {
            set(table_data, serde_json::from_value(value.clone()).ok())
        }
        ("src", NodeKind::Image { src } | NodeKind::Video { src }) => {
            set(src, value.as_str().map(String::from))
        }
        ("scrollDirection", NodeKind::Scroll { scroll_direction, .. }) => set(
            scroll_direction,
            serde_json::from_value::<ScrollDirection>(value.clone()).ok(),
        ),
        ("scrollOffset", NodeKind::Scroll { scroll_offset, .. }) => {
            set(scroll_offset, value.as_f64().map(|v| v.max(0.0)))
        }
        ("d", NodeKind::Path { d }) => set(d, value.as_str().map(String::from)),
        _ => node.styles.set_property(key, value.clone()),
    }
}
