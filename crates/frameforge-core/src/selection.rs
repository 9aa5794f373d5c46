//! Selection and manipulation handle system.

use crate::geometry::unrotate_point;
use crate::shapes::{Node, NodeId};
use crate::snap::{ANGLE_SNAP_INCREMENT, snap_angle};
use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Handle box side length in scene units.
pub const HANDLE_SIZE: f64 = 10.0;

/// Distance from the top edge to the rotation handle.
pub const ROTATE_HANDLE_OFFSET: f64 = 25.0;

/// Smallest width or height a resize may produce.
pub const MIN_SIZE: f64 = 10.0;

/// Type of selection handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleKind {
    /// Corner handle, moves two edges.
    Corner(Corner),
    /// Edge midpoint handle, moves one edge.
    Edge(Edge),
    /// Rotation handle above the top edge.
    Rotate,
}

/// Corner positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Edge positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

/// Handle geometry, usually taken from the canvas config.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandleMetrics {
    pub size: f64,
    pub rotate_offset: f64,
}

impl Default for HandleMetrics {
    fn default() -> Self {
        Self {
            size: HANDLE_SIZE,
            rotate_offset: ROTATE_HANDLE_OFFSET,
        }
    }
}

/// A selection handle with its box in the node's unrotated frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    pub kind: HandleKind,
    pub rect: Rect,
}

impl Handle {
    fn centered(kind: HandleKind, anchor: Point, size: f64) -> Self {
        let half = size / 2.0;
        Self {
            kind,
            rect: Rect::from_origin_size((anchor.x - half, anchor.y - half), (size, size)),
        }
    }

    /// Check if an unrotated point hits this handle.
    pub fn hit_test(&self, point: Point) -> bool {
        point.x >= self.rect.x0
            && point.x <= self.rect.x1
            && point.y >= self.rect.y0
            && point.y <= self.rect.y1
    }
}

/// Handles of a node box, in hit-test order.
///
/// Rotate comes first so it wins over any resize box it overlaps.
pub fn handles(rect: Rect, metrics: HandleMetrics) -> Vec<Handle> {
    let half = metrics.size / 2.0;
    let mid_x = rect.center().x;
    let mid_y = rect.center().y;
    let rotate = Handle {
        kind: HandleKind::Rotate,
        rect: Rect::from_origin_size(
            (mid_x - half, rect.y0 - metrics.rotate_offset),
            (metrics.size, metrics.size),
        ),
    };
    let s = metrics.size;
    vec![
        rotate,
        Handle::centered(HandleKind::Corner(Corner::BottomRight), Point::new(rect.x1, rect.y1), s),
        Handle::centered(HandleKind::Corner(Corner::BottomLeft), Point::new(rect.x0, rect.y1), s),
        Handle::centered(HandleKind::Corner(Corner::TopRight), Point::new(rect.x1, rect.y0), s),
        Handle::centered(HandleKind::Corner(Corner::TopLeft), Point::new(rect.x0, rect.y0), s),
        Handle::centered(HandleKind::Edge(Edge::Top), Point::new(mid_x, rect.y0), s),
        Handle::centered(HandleKind::Edge(Edge::Bottom), Point::new(mid_x, rect.y1), s),
        Handle::centered(HandleKind::Edge(Edge::Right), Point::new(rect.x1, mid_y), s),
        Handle::centered(HandleKind::Edge(Edge::Left), Point::new(rect.x0, mid_y), s),
    ]
}

/// Find which handle of a (possibly rotated) node box is under `point`.
///
/// The point is un-rotated around the box centre first, so handles follow
/// the node's rotation.
pub fn handle_at(
    point: Point,
    rect: Rect,
    rotation: f64,
    metrics: HandleMetrics,
) -> Option<HandleKind> {
    let local = unrotate_point(point, rect.center(), rotation);
    handles(rect, metrics)
        .into_iter()
        .find(|h| h.hit_test(local))
        .map(|h| h.kind)
}

/// Rotate a vector by `-degrees`, bringing a screen-space drag into the
/// node's unrotated frame.
pub fn unrotate_vector(delta: Vec2, degrees: f64) -> Vec2 {
    unrotate_point(delta.to_point(), Point::ZERO, degrees).to_vec2()
}

/// Apply a resize handle drag to the box it started from.
///
/// The edges opposite the handle stay fixed, and the minimum size floor
/// pushes the moving edge back rather than the fixed one.
pub fn apply_resize(original: Rect, handle: HandleKind, delta: Vec2, min_size: f64) -> Rect {
    let (left, right, top, bottom) = match handle {
        HandleKind::Corner(Corner::TopLeft) => (true, false, true, false),
        HandleKind::Corner(Corner::TopRight) => (false, true, true, false),
        HandleKind::Corner(Corner::BottomLeft) => (true, false, false, true),
        HandleKind::Corner(Corner::BottomRight) => (false, true, false, true),
        HandleKind::Edge(Edge::Top) => (false, false, true, false),
        HandleKind::Edge(Edge::Bottom) => (false, false, false, true),
        HandleKind::Edge(Edge::Left) => (true, false, false, false),
        HandleKind::Edge(Edge::Right) => (false, true, false, false),
        HandleKind::Rotate => return original,
    };
    let mut rect = original;
    if left {
        rect.x0 = (original.x0 + delta.x).min(original.x1 - min_size);
    }
    if right {
        rect.x1 = (original.x1 + delta.x).max(original.x0 + min_size);
    }
    if top {
        rect.y0 = (original.y0 + delta.y).min(original.y1 - min_size);
    }
    if bottom {
        rect.y1 = (original.y1 + delta.y).max(original.y0 + min_size);
    }
    rect
}

/// Rotate a node so its top points at `cursor_point`.
///
/// `snap_to_15deg`: if true, snap rotation to 15° increments.
/// Returns the new rotation in degrees.
pub fn apply_rotation(
    node: &mut Node,
    center: Point,
    cursor_point: Point,
    snap_to_15deg: bool,
) -> f64 {
    let dx = cursor_point.x - center.x;
    let dy = cursor_point.y - center.y;
    let mut angle = dy.atan2(dx).to_degrees() + 90.0;
    if snap_to_15deg {
        angle = snap_angle(angle, ANGLE_SNAP_INCREMENT);
    }
    node.set_rotation(angle);
    angle
}

/// State of an active manipulation operation (single node with handle).
#[derive(Debug, Clone)]
pub struct ManipulationState {
    /// The node being manipulated.
    pub node_id: NodeId,
    /// The handle being dragged.
    pub handle: HandleKind,
    /// Starting point of the drag.
    pub start_point: Point,
    /// Current point of the drag.
    pub current_point: Point,
    /// Box in the parent frame when the drag started.
    pub original_rect: Rect,
    /// Rotation in degrees when the drag started.
    pub original_rotation: f64,
    /// Box centre in scene space, for rotation.
    pub center: Point,
}

impl ManipulationState {
    pub fn new(
        node_id: NodeId,
        handle: HandleKind,
        start_point: Point,
        original_rect: Rect,
        original_rotation: f64,
        center: Point,
    ) -> Self {
        Self {
            node_id,
            handle,
            start_point,
            current_point: start_point,
            original_rect,
            original_rotation,
            center,
        }
    }

    /// Get the drag delta.
    pub fn delta(&self) -> Vec2 {
        self.current_point - self.start_point
    }

    /// Resized box for the current pointer position.
    pub fn resized(&self, min_size: f64) -> Rect {
        let local = unrotate_vector(self.delta(), self.original_rotation);
        apply_resize(self.original_rect, self.handle, local, min_size)
    }
}

/// State for moving several nodes at once.
#[derive(Debug, Clone)]
pub struct MultiMoveState {
    /// Starting point of the drag.
    pub start_point: Point,
    /// Current point of the drag.
    pub current_point: Point,
    /// Local positions before the drag, keyed by node.
    pub original_positions: HashMap<NodeId, Point>,
    /// Resolved sizes before the drag, used for clamping and alignment.
    pub sizes: HashMap<NodeId, Size>,
}

impl MultiMoveState {
    pub fn new(
        start_point: Point,
        original_positions: HashMap<NodeId, Point>,
        sizes: HashMap<NodeId, Size>,
    ) -> Self {
        Self {
            start_point,
            current_point: start_point,
            original_positions,
            sizes,
        }
    }

    /// Get the drag delta.
    pub fn delta(&self) -> Vec2 {
        self.current_point - self.start_point
    }

    /// Whether the pointer has moved since the drag started.
    pub fn has_moved(&self) -> bool {
        self.delta().hypot2() > 0.0
    }

    /// Get the node ids being moved.
    pub fn node_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.original_positions.keys().cloned().collect();
        ids.sort();
        ids
    }
}
