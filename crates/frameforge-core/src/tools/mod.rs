//! Drawing tools: which one is armed and how a drag shapes the node it spawns.

use crate::shapes::{Node, NodeKind, NodeType};
use crate::units::px;
use kurbo::{BezPath, Point, Rect};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ToolKind {
    #[default]
    Select,
    Pan,
    /// Draw one node of the given type, then fall back to `Select`.
    Draw(NodeType),
    /// Record a freehand path.
    Freehand,
}

impl ToolKind {
    /// Type of node this tool spawns, if any.
    pub fn spawns(&self) -> Option<NodeType> {
        match self {
            ToolKind::Draw(node_type) => Some(*node_type),
            ToolKind::Freehand => Some(NodeType::Path),
            ToolKind::Select | ToolKind::Pan => None,
        }
    }
}

/// Whether a press is in progress, and where it started.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum ToolState {
    #[default]
    Idle,
    Active { start: Point, current: Point },
}

/// The armed tool plus the press it is handling.
#[derive(Debug, Clone, Default)]
pub struct ToolManager {
    pub current_tool: ToolKind,
    pub state: ToolState,
    /// Pointer trail of a freehand stroke, in scene coordinates.
    trail: Vec<Point>,
}

impl ToolManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm `tool`, abandoning any press in progress.
    pub fn set_tool(&mut self, tool: ToolKind) {
        self.current_tool = tool;
        self.cancel();
    }

    /// Start a press at `point` and return the node the armed tool spawns.
    ///
    /// Returns `None` for tools that do not draw.
    pub fn begin(&mut self, point: Point) -> Option<Node> {
        self.trail.clear();
        self.state = ToolState::Active {
            start: point,
            current: point,
        };
        let node_type = self.current_tool.spawns()?;
        if self.current_tool == ToolKind::Freehand {
            self.trail.push(point);
        }
        let mut node = Node::create(node_type, point);
        if node_type == NodeType::Path {
            node.width = px(0.0);
            node.height = px(0.0);
        }
        Some(node)
    }

    pub fn update(&mut self, point: Point) {
        let ToolState::Active { current, .. } = &mut self.state else {
            return;
        };
        *current = point;
        if self.current_tool == ToolKind::Freehand {
            self.trail.push(point);
        }
    }

    /// Reshape a node spawned by [`ToolManager::begin`] to the current drag.
    pub fn apply_to(&self, node: &mut Node) {
        let ToolState::Active { start, current } = self.state else {
            return;
        };
        if self.current_tool == ToolKind::Freehand {
            apply_freehand(node, &self.trail);
        } else {
            apply_draw(node, start, current);
        }
    }

    /// Finish the press. Drawing tools disarm back to `Select`.
    pub fn end(&mut self) {
        if self.current_tool.spawns().is_some() && self.is_active() {
            self.current_tool = ToolKind::Select;
        }
        self.cancel();
    }

    /// Drop the press without disarming the tool.
    pub fn cancel(&mut self) {
        self.state = ToolState::Idle;
        self.trail.clear();
    }

    pub fn is_active(&self) -> bool {
        self.state != ToolState::Idle
    }

    pub fn freehand_points(&self) -> &[Point] {
        &self.trail
    }
}

/// Reshape a freshly drawn node to span the drag from `start` to `current`.
///
/// The node's origin moves to the top-left of the dragged box. Circles keep
/// a square box whose side is the larger drag extent, lines keep their
/// endpoints relative to the box.
pub fn apply_draw(node: &mut Node, start: Point, current: Point) {
    let bounds = Rect::from_points(start, current);
    match &mut node.kind {
        NodeKind::Circle { radius } => {
            let side = bounds.width().max(bounds.height());
            let x = if current.x < start.x { start.x - side } else { start.x };
            let y = if current.y < start.y { start.y - side } else { start.y };
            *radius = side / 2.0;
            node.x = x;
            node.y = y;
            node.width = px(side);
            node.height = px(side);
            return;
        }
        NodeKind::Line { from, to } => {
            *from = start - bounds.origin().to_vec2();
            *to = current - bounds.origin().to_vec2();
        }
        NodeKind::Triangle { points } => {
            *points = [
                Point::new(0.0, bounds.height()),
                Point::new(bounds.width(), bounds.height()),
                Point::new(bounds.width() / 2.0, 0.0),
            ];
        }
        _ => {}
    }
    node.x = bounds.x0;
    node.y = bounds.y0;
    node.width = px(bounds.width());
    node.height = px(bounds.height());
}

/// Fit a path node around the recorded freehand points.
pub fn apply_freehand(node: &mut Node, points: &[Point]) {
    let Some((first, rest)) = points.split_first() else {
        return;
    };
    let bounds = rest
        .iter()
        .fold(Rect::from_points(*first, *first), |r, p| r.union_pt(*p));
    let origin = bounds.origin().to_vec2();
    let mut path = BezPath::new();
    path.move_to(*first - origin);
    for p in rest {
        path.line_to(*p - origin);
    }
    if let NodeKind::Path { d } = &mut node.kind {
        *d = path.to_svg();
    }
    node.x = bounds.x0;
    node.y = bounds.y0;
    node.width = px(bounds.width());
    node.height = px(bounds.height());
}
