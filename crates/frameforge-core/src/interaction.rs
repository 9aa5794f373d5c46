//! Pointer and keyboard handling for the canvas.
//!
//! Every gesture that edits the scene runs inside a history scope, so a
//! drag of any length leaves a single undo entry.

use crate::actions::CLICK_EVENT;
use crate::canvas::Canvas;
use crate::geometry::Layout;
use crate::input::{KeyEvent, Modifiers, MouseButton, PointerEvent, Shortcut};
use crate::scene::ParentLookup;
use crate::selection::{HandleKind, ManipulationState, MultiMoveState, apply_rotation, handle_at};
use crate::shapes::{Node, NodeId, NodeKind, NodeType};
use crate::snap::{align_to_siblings, clamp_to_bounds, snap_to_grid};
use crate::tools::ToolKind;
use crate::units::px;
use kurbo::{Point, Rect, Vec2};
use std::collections::HashMap;

/// Scroll distance of one wheel event over a scroll container.
pub const SCROLL_STEP: f64 = 20.0;

/// Label of the history entry left by a pointer gesture.
pub const FINISH_INTERACTION: &str = "Finish Interaction";

/// What the pointer is currently doing.
#[derive(Debug, Clone, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    /// Spawning a node with a draw tool.
    Drawing { node_id: NodeId },
    /// Moving the selected nodes.
    Dragging {
        moves: MultiMoveState,
        /// Node under the pointer when the drag started.
        pressed: NodeId,
        /// Displayed box of `pressed` when the drag started.
        pressed_rect: Rect,
    },
    /// Dragging a resize handle. `original` is the node before the drag.
    Resizing {
        state: ManipulationState,
        original: Box<Node>,
    },
    Rotating(ManipulationState),
    Panning { last_screen: Point },
}

impl InteractionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, InteractionState::Idle)
    }

    fn name(&self) -> &'static str {
        match self {
            InteractionState::Idle => "idle",
            InteractionState::Drawing { .. } => "drawing",
            InteractionState::Dragging { .. } => "dragging",
            InteractionState::Resizing { .. } => "resizing",
            InteractionState::Rotating(_) => "rotating",
            InteractionState::Panning { .. } => "panning",
        }
    }
}

impl Canvas {
    pub fn interaction(&self) -> &InteractionState {
        &self.interaction
    }

    fn enter(&mut self, state: InteractionState) {
        log::debug!("Interaction {} -> {}", self.interaction.name(), state.name());
        self.interaction = state;
    }

    /// Feed a pointer event in screen coordinates.
    pub fn handle_pointer(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Down {
                position,
                button,
                modifiers,
            } => self.pointer_down(position, button, modifiers),
            PointerEvent::Move {
                position,
                modifiers,
            } => self.pointer_move(position, modifiers),
            PointerEvent::Up { position, .. } => self.pointer_up(position),
            PointerEvent::Wheel {
                position, delta, ..
            } => self.wheel(position, delta),
        }
    }

    fn pointer_down(&mut self, screen: Point, button: MouseButton, modifiers: Modifiers) {
        if !self.interaction.is_idle() {
            return;
        }
        if button == MouseButton::Middle || self.tool_manager.current_tool == ToolKind::Pan {
            self.enter(InteractionState::Panning {
                last_screen: screen,
            });
            return;
        }
        if button != MouseButton::Left {
            return;
        }

        let point = self.camera.screen_to_world(screen);
        let layout = self.layout();

        if let Some((id, handle, rect, rotation)) = self.handle_under(point) {
            self.history.begin_scope();
            let state = ManipulationState::new(
                id.clone(),
                handle,
                point,
                layout.local_rect(&self.scene, &id).unwrap_or(rect),
                rotation,
                rect.center(),
            );
            if handle == HandleKind::Rotate {
                self.enter(InteractionState::Rotating(state));
            } else if let Some(node) = self.scene.find(&id) {
                let original = Box::new(node.clone());
                self.enter(InteractionState::Resizing { state, original });
            }
            return;
        }

        let Some(id) = layout.hit_test(&self.scene, point) else {
            if self.tool_manager.current_tool.spawns().is_none() {
                self.clear_selection();
            } else if let Some(node) = self.tool_manager.begin(point) {
                let node_id = node.id.clone();
                self.history.begin_scope();
                self.scene.insert(node, None);
                self.commit("Add Shape");
                self.select(node_id.clone());
                self.enter(InteractionState::Drawing { node_id });
            }
            return;
        };
        if modifiers.extends_selection() {
            if self.is_selected(&id) {
                self.toggle_selection(id);
                return;
            }
            self.add_to_selection(id.clone());
        } else if !self.is_selected(&id) {
            self.select(id.clone());
        }
        self.begin_drag(id, point);
    }

    /// Topmost handle of a selected node under `point`.
    fn handle_under(&self, point: Point) -> Option<(NodeId, HandleKind, Rect, f64)> {
        let layout = self.layout();
        let metrics = self.config.handle_metrics();
        self.selection.iter().rev().find_map(|id| {
            let node = self.scene.find(id)?;
            let (frame, size) = layout.parent_frame(&self.scene, id)?;
            let local = Rect::from_origin_size(node.position(), size);
            let handle = handle_at(frame.inverse() * point, local, node.rotation(), metrics)?;
            let rect = layout.display_rect(&self.scene, id)?;
            Some((id.clone(), handle, rect, node.rotation()))
        })
    }

    fn begin_drag(&mut self, pressed: NodeId, point: Point) {
        let layout = self.layout();
        let Some(pressed_rect) = layout.display_rect(&self.scene, &pressed) else {
            return;
        };
        let mut positions = HashMap::new();
        let mut sizes = HashMap::new();
        for id in self.selected_roots() {
            if let (Some(node), Some(size)) =
                (self.scene.find(&id), layout.resolved_size(&self.scene, &id))
            {
                positions.insert(id.clone(), node.position());
                sizes.insert(id, size);
            }
        }
        self.history.begin_scope();
        self.enter(InteractionState::Dragging {
            moves: MultiMoveState::new(point, positions, sizes),
            pressed,
            pressed_rect,
        });
    }

    fn pointer_move(&mut self, screen: Point, modifiers: Modifiers) {
        let point = self.camera.screen_to_world(screen);
        match std::mem::take(&mut self.interaction) {
            InteractionState::Idle => {}
            InteractionState::Panning { last_screen } => {
                self.camera.pan(screen - last_screen);
                self.interaction = InteractionState::Panning {
                    last_screen: screen,
                };
            }
            InteractionState::Drawing { node_id } => {
                self.tool_manager.update(point);
                if let Some(node) = self.scene.find_mut(&node_id) {
                    self.tool_manager.apply_to(node);
                    self.commit("Add Shape");
                }
                self.interaction = InteractionState::Drawing { node_id };
            }
            InteractionState::Dragging {
                mut moves,
                pressed,
                pressed_rect,
            } => {
                moves.current_point = point;
                self.drag_to(&moves, &pressed, pressed_rect);
                self.interaction = InteractionState::Dragging {
                    moves,
                    pressed,
                    pressed_rect,
                };
            }
            InteractionState::Resizing {
                mut state,
                original,
            } => {
                state.current_point = point;
                self.resize_to(&state, &original);
                self.interaction = InteractionState::Resizing { state, original };
            }
            InteractionState::Rotating(mut state) => {
                state.current_point = point;
                if let Some(node) = self.scene.find_mut(&state.node_id) {
                    apply_rotation(node, state.center, point, modifiers.shift);
                    self.commit("Rotate Shape");
                }
                self.interaction = InteractionState::Rotating(state);
            }
        }
    }

    /// Move the dragged nodes, snapping the pressed node's box.
    fn drag_to(&mut self, moves: &MultiMoveState, pressed: &NodeId, pressed_rect: Rect) {
        let layout = self.layout();
        let mode = self.config.snap_mode;
        let mut origin = pressed_rect.origin() + moves.delta();

        if mode.snaps_to_grid() {
            origin = snap_to_grid(origin, self.config.grid_size);
        }
        origin = clamp_to_bounds(origin, pressed_rect.size(), layout.surface);

        self.guides.clear();
        if mode.snaps_to_shapes() {
            let moving = moves.node_ids();
            let parent = self.scene.parent_of(pressed).map(|p| p.id.clone());
            let siblings: Vec<Rect> = self
                .scene
                .siblings(parent.as_ref())
                .unwrap_or_default()
                .iter()
                .filter(|n| !moving.contains(&n.id) && !n.styles.is_hidden())
                .filter_map(|n| layout.display_rect(&self.scene, &n.id))
                .collect();
            let rect = Rect::from_origin_size(origin, pressed_rect.size());
            let alignment = align_to_siblings(rect, &siblings, self.config.snap_threshold);
            origin += alignment.offset;
            self.guides = alignment.guides;
        }

        let delta = origin - pressed_rect.origin();
        for (id, start) in &moves.original_positions {
            if let Some(node) = self.scene.find_mut(id) {
                node.set_position(*start + delta);
            }
        }
        self.commit("Move Shape");
    }

    fn resize_to(&mut self, state: &ManipulationState, original: &Node) {
        let rect = state.resized(self.config.min_size);
        let before = state.original_rect;
        let Some(node) = self.scene.find_mut(&state.node_id) else {
            return;
        };
        let mut resized = original.clone();
        resized.x = original.x + (rect.x0 - before.x0);
        resized.y = original.y + (rect.y0 - before.y0);
        resized.width = px(rect.width());
        resized.height = px(rect.height());
        let sx = if before.width() > 0.0 { rect.width() / before.width() } else { 1.0 };
        let sy = if before.height() > 0.0 { rect.height() / before.height() } else { 1.0 };
        resized.scale_payload(sx, sy, rect.width(), rect.height());
        *node = resized;
        self.commit("Resize Shape");
    }

    fn pointer_up(&mut self, screen: Point) {
        let point = self.camera.screen_to_world(screen);
        let state = std::mem::take(&mut self.interaction);
        log::debug!("Interaction {} -> idle", state.name());
        match state {
            InteractionState::Idle | InteractionState::Panning { .. } => {}
            InteractionState::Drawing { .. } => {
                self.tool_manager.end();
                self.history.end_scope("Add Shape");
            }
            InteractionState::Dragging { moves, pressed, .. } => {
                if moves.has_moved() {
                    let ids = moves.node_ids();
                    self.drop_into_container(&ids, point);
                    let layout = self.layout();
                    for id in &ids {
                        self.constrain_around(id, &layout);
                    }
                    self.commit("Move Shape");
                    self.history.end_scope(FINISH_INTERACTION);
                } else {
                    self.history.cancel_scope();
                    self.click(&pressed);
                }
            }
            InteractionState::Resizing { state, .. } if state.delta() == Vec2::ZERO => {
                self.history.cancel_scope();
            }
            InteractionState::Resizing { state, .. } => {
                let layout = self.layout();
                self.constrain_around(&state.node_id, &layout);
                self.commit("Resize Shape");
                self.history.end_scope(FINISH_INTERACTION);
            }
            InteractionState::Rotating(_) => {
                self.history.end_scope(FINISH_INTERACTION);
            }
        }
        self.guides.clear();
    }

    /// Reparent dragged nodes to the container under `point`, or to the
    /// root when released outside every container.
    fn drop_into_container(&mut self, ids: &[NodeId], point: Point) {
        let layout = self.layout();
        let target = layout.container_at(&self.scene, point, &self.selection);
        for id in ids {
            let current = self.scene.parent_of(id).map(|p| (p.id.clone(), p.node_type()));
            if let Some((_, NodeType::Group)) = current {
                continue;
            }
            let current = current.map(|(parent, _)| parent);
            if current != target && self.scene.reparent(id, target.as_ref()) {
                log::debug!("Reparented {} under {:?}", id, target);
            }
        }
    }

    /// Clamp `id` into its parent and its children into `id`.
    fn constrain_around(&mut self, id: &NodeId, layout: &Layout) {
        if let Some(parent) = self.scene.parent_of(id).map(|p| p.id.clone()) {
            self.scene.constrain_children(&parent, layout);
        }
        self.scene.constrain_children(id, layout);
    }

    fn wheel(&mut self, screen: Point, delta: Vec2) {
        let point = self.camera.screen_to_world(screen);
        let layout = self.layout();
        if let Some(target) = layout.scroll_target(&self.scene, point) {
            let metrics = self.scene.find(&target).and_then(|node| {
                let size = layout.resolved_size(&self.scene, &target)?;
                layout.scroll_metrics(node, size)
            });
            if let Some(metrics) = metrics {
                let step = if delta.y > 0.0 { SCROLL_STEP } else { -SCROLL_STEP };
                let offset = metrics.scrolled_by(step);
                if let Some(NodeKind::Scroll { scroll_offset, .. }) =
                    self.scene.find_mut(&target).map(|n| &mut n.kind)
                {
                    *scroll_offset = offset;
                }
            }
            return;
        }
        if !self.config.disable_zoom {
            self.camera.wheel_zoom(screen, delta.y);
        }
    }

    /// Run a click on `id`: toggle widgets, then dispatch bound actions.
    ///
    /// Returns how many action callbacks ran.
    pub fn click(&mut self, id: &NodeId) -> usize {
        let Some(node) = self.scene.find_mut(id) else {
            return 0;
        };
        let label = match &mut node.kind {
            NodeKind::Checkbox { checked } => {
                *checked = !*checked;
                Some("Toggle Checkbox")
            }
            NodeKind::Selector {
                options,
                selected_option,
            } if !options.is_empty() => {
                *selected_option = (*selected_option + 1) % options.len();
                Some("Select Option")
            }
            _ => None,
        };
        if let Some(label) = label {
            self.commit(label);
        }
        match self.scene.find(id) {
            Some(node) => self.actions.dispatch(node, CLICK_EVENT),
            None => 0,
        }
    }

    /// Feed a key press. Returns `true` if it triggered a command.
    pub fn handle_key(&mut self, event: &KeyEvent) -> bool {
        let Some(shortcut) = event.shortcut() else {
            return false;
        };
        if !self.interaction.is_idle() && shortcut != Shortcut::Cancel {
            return false;
        }
        log::debug!("Shortcut: {}", shortcut.description());
        match shortcut {
            Shortcut::Undo => self.undo(),
            Shortcut::Redo => self.redo(),
            Shortcut::Copy => self.copy_selected() > 0,
            Shortcut::Paste => !self.paste().is_empty(),
            Shortcut::Group => self.group_selected().is_some(),
            Shortcut::Ungroup => !self.ungroup_selected().is_empty(),
            Shortcut::SelectAll => {
                self.select_all();
                true
            }
            Shortcut::Delete => self.delete_selected() > 0,
            Shortcut::Cancel => self.cancel_interaction(),
        }
    }

    /// Abort the current gesture and roll the scene back to the last entry.
    ///
    /// With no gesture running this clears the selection instead.
    pub fn cancel_interaction(&mut self) -> bool {
        let state = std::mem::take(&mut self.interaction);
        self.guides.clear();
        self.tool_manager.cancel();
        match state {
            InteractionState::Idle => {
                let had_selection = !self.selection.is_empty();
                self.clear_selection();
                had_selection
            }
            InteractionState::Panning { .. } => true,
            _ => {
                log::debug!("Interaction {} cancelled", state.name());
                self.history.cancel_scope();
                if let Some(entry) = self.history.current() {
                    let nodes = entry.nodes.clone();
                    self.scene.replace(nodes);
                }
                let scene = &self.scene;
                self.selection.retain(|id| scene.contains(id));
                true
            }
        }
    }
}
