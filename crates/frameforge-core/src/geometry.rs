//! Resolved geometry: absolute positions, sizes and rotation-aware hit testing.

use crate::scene::{ParentLookup, Scene};
use crate::shapes::{Node, NodeId, NodeKind, NodeType, ScrollDirection};
use crate::units::UnitResolver;
use kurbo::{Affine, Point, Rect, Size, Vec2};

/// Rotate `point` around `center` by `-degrees`.
///
/// This is the inverse of the render rotation, so a point in screen space
/// lands in the node's unrotated local space.
pub fn unrotate_point(point: Point, center: Point, degrees: f64) -> Point {
    let radians = degrees.to_radians();
    let (sin, cos) = radians.sin_cos();
    let dx = point.x - center.x;
    let dy = point.y - center.y;
    Point::new(cos * dx + sin * dy + center.x, cos * dy - sin * dx + center.y)
}

/// Placement of a node inside its parent's frame: its offset, then its
/// rotation about the centre of its resolved box.
pub fn placement(node: &Node, size: Size) -> Affine {
    let center = Point::new(size.width / 2.0, size.height / 2.0);
    Affine::translate(node.position().to_vec2())
        * Affine::rotate_about(node.rotation().to_radians(), center)
}

fn in_box(size: Size, local: Point) -> bool {
    local.x >= 0.0 && local.y >= 0.0 && local.x <= size.width && local.y <= size.height
}

/// Sum of the node's own offset and every ancestor's own offset.
///
/// Walks the ancestor chain on every call; nothing is cached because any
/// ancestor may have moved since the last query.
pub fn absolute_position<L: ParentLookup + ?Sized>(tree: &L, id: &NodeId) -> Option<Point> {
    let node = tree.node(id)?;
    let mut pos = node.position();
    let mut current = node;
    while let Some(parent) = tree.parent_of(&current.id) {
        pos.x += parent.x;
        pos.y += parent.y;
        current = parent;
    }
    Some(pos)
}

/// Offset applied to children of a scroll container.
pub fn scroll_shift(node: &Node) -> Vec2 {
    match &node.kind {
        NodeKind::Scroll {
            scroll_direction: ScrollDirection::Column,
            scroll_offset,
        } => Vec2::new(0.0, -scroll_offset),
        NodeKind::Scroll {
            scroll_direction: ScrollDirection::Row,
            scroll_offset,
        } => Vec2::new(-scroll_offset, 0.0),
        _ => Vec2::ZERO,
    }
}

/// Scroll state of a scroll container along its axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    pub direction: ScrollDirection,
    pub offset: f64,
    /// Visible length of the container.
    pub extent: f64,
    /// Furthest child edge along the axis.
    pub content: f64,
}

impl ScrollMetrics {
    pub fn max_offset(&self) -> f64 {
        (self.content - self.extent).max(0.0)
    }

    pub fn overflows(&self) -> bool {
        self.content > self.extent
    }

    /// Offset after one wheel step of `step`, clamped to the content.
    pub fn scrolled_by(&self, step: f64) -> f64 {
        (self.offset + step).min(self.max_offset()).max(0.0)
    }

    /// Scrollbar thumb as `(start, length)` along the axis, relative to the
    /// container's edge.
    pub fn thumb(&self) -> Option<(f64, f64)> {
        if !self.overflows() {
            return None;
        }
        let length = self.extent / self.content * self.extent;
        let start = self.offset / self.content * self.extent;
        Some((start, length))
    }
}

/// Resolution context: the drawing surface plus the unit resolver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub surface: Size,
    pub resolver: UnitResolver,
}

impl Layout {
    pub fn new(surface: Size, resolver: UnitResolver) -> Self {
        Self { surface, resolver }
    }

    /// Resolve a node's size against its parent's resolved size.
    ///
    /// Viewport-height units use the surface height.
    pub fn resolve_size(&self, node: &Node, parent: Size) -> Size {
        Size::new(
            self.resolver
                .resolve(&node.width, parent.width, self.surface.height),
            self.resolver
                .resolve(&node.height, parent.height, self.surface.height),
        )
    }

    /// Resolved size of a node, resolving every ancestor on the way down.
    pub fn resolved_size(&self, scene: &Scene, id: &NodeId) -> Option<Size> {
        let path = scene.path_to(id)?;
        Some(
            path.iter()
                .fold(self.surface, |parent, node| self.resolve_size(node, parent)),
        )
    }

    /// Resolved size of the node's parent, or the surface for root nodes.
    pub fn parent_size(&self, scene: &Scene, id: &NodeId) -> Size {
        scene
            .parent_of(id)
            .and_then(|p| self.resolved_size(scene, &p.id))
            .unwrap_or(self.surface)
    }

    /// Box in the parent's coordinate frame.
    pub fn local_rect(&self, scene: &Scene, id: &NodeId) -> Option<Rect> {
        let node = scene.node(id)?;
        let size = self.resolved_size(scene, id)?;
        Some(Rect::from_origin_size(node.position(), size))
    }

    /// Box in scene coordinates, ignoring scroll offsets.
    pub fn absolute_rect(&self, scene: &Scene, id: &NodeId) -> Option<Rect> {
        let origin = absolute_position(scene, id)?;
        let size = self.resolved_size(scene, id)?;
        Some(Rect::from_origin_size(origin, size))
    }

    /// Frame the node's `x`/`y` live in, mapped to scene space, plus the
    /// node's resolved size.
    ///
    /// Every ancestor contributes its placement and scroll shift, composed
    /// the same way the renderer places children.
    pub fn parent_frame(&self, scene: &Scene, id: &NodeId) -> Option<(Affine, Size)> {
        let path = scene.path_to(id)?;
        let (node, ancestors) = path.split_last()?;
        let mut frame = Affine::IDENTITY;
        let mut size = self.surface;
        for ancestor in ancestors {
            size = self.resolve_size(ancestor, size);
            frame = frame * placement(ancestor, size) * Affine::translate(scroll_shift(ancestor));
        }
        Some((frame, self.resolve_size(node, size)))
    }

    /// Node-local to scene transform, plus the node's resolved size.
    pub fn node_transform(&self, scene: &Scene, id: &NodeId) -> Option<(Affine, Size)> {
        let node = scene.node(id)?;
        let (frame, size) = self.parent_frame(scene, id)?;
        Some((frame * placement(node, size), size))
    }

    /// Scene-space bounds of the node's unrotated box, including ancestor
    /// scroll offsets and rotations.
    pub fn display_rect(&self, scene: &Scene, id: &NodeId) -> Option<Rect> {
        let node = scene.node(id)?;
        let (frame, size) = self.parent_frame(scene, id)?;
        Some(frame.transform_rect_bbox(Rect::from_origin_size(node.position(), size)))
    }

    /// Whether `point` (scene space) lies inside the displayed node.
    pub fn point_in_node(&self, scene: &Scene, id: &NodeId, point: Point) -> bool {
        self.node_transform(scene, id)
            .is_some_and(|(transform, size)| in_box(size, transform.inverse() * point))
    }

    /// Scroll metrics of a scroll container whose resolved size is `size`.
    ///
    /// Returns `None` for any other node type.
    pub fn scroll_metrics(&self, node: &Node, size: Size) -> Option<ScrollMetrics> {
        let NodeKind::Scroll {
            scroll_direction,
            scroll_offset,
        } = &node.kind
        else {
            return None;
        };
        let (extent, content) = match scroll_direction {
            ScrollDirection::Column => (
                size.height,
                node.children
                    .iter()
                    .map(|c| c.y + self.resolve_size(c, size).height)
                    .fold(0.0, f64::max),
            ),
            ScrollDirection::Row => (
                size.width,
                node.children
                    .iter()
                    .map(|c| c.x + self.resolve_size(c, size).width)
                    .fold(0.0, f64::max),
            ),
        };
        Some(ScrollMetrics {
            direction: *scroll_direction,
            offset: *scroll_offset,
            extent,
            content,
        })
    }

    /// Nearest scroll container at or above the topmost node under `point`.
    pub fn scroll_target(&self, scene: &Scene, point: Point) -> Option<NodeId> {
        let hit = self.hit_test(scene, point)?;
        std::iter::once(hit.clone())
            .chain(scene.ancestors(&hit))
            .find(|id| {
                scene
                    .find(id)
                    .is_some_and(|n| n.node_type() == NodeType::Scroll)
            })
    }

    /// Topmost node under `point`.
    ///
    /// Later siblings win over earlier ones and children win over their
    /// parent, except inside a group, which is picked as a unit.
    pub fn hit_test(&self, scene: &Scene, point: Point) -> Option<NodeId> {
        self.hit_in(scene.nodes(), Affine::IDENTITY, self.surface, point)
            .cloned()
    }

    fn hit_in<'a>(
        &self,
        nodes: &'a [Node],
        frame: Affine,
        parent: Size,
        point: Point,
    ) -> Option<&'a NodeId> {
        for node in nodes.iter().rev() {
            if node.styles.is_hidden() {
                continue;
            }
            let size = self.resolve_size(node, parent);
            let transform = frame * placement(node, size);
            let inside = in_box(size, transform.inverse() * point);
            let descend = node.node_type() != NodeType::Group
                && !node.children.is_empty()
                && (inside || !node.styles.clips());
            if descend {
                let inner = transform * Affine::translate(scroll_shift(node));
                if let Some(hit) = self.hit_in(&node.children, inner, size, point) {
                    return Some(hit);
                }
            }
            if inside {
                return Some(&node.id);
            }
        }
        None
    }

    /// Deepest container under `point`, skipping the subtrees of `exclude`.
    pub fn container_at(&self, scene: &Scene, point: Point, exclude: &[NodeId]) -> Option<NodeId> {
        self.container_in(scene.nodes(), Affine::IDENTITY, self.surface, point, exclude)
            .cloned()
    }

    fn container_in<'a>(
        &self,
        nodes: &'a [Node],
        frame: Affine,
        parent: Size,
        point: Point,
        exclude: &[NodeId],
    ) -> Option<&'a NodeId> {
        for node in nodes.iter().rev() {
            if node.styles.is_hidden() || exclude.contains(&node.id) {
                continue;
            }
            let size = self.resolve_size(node, parent);
            let transform = frame * placement(node, size);
            let inside = in_box(size, transform.inverse() * point);
            if inside || !node.styles.clips() {
                let inner = transform * Affine::translate(scroll_shift(node));
                if let Some(hit) = self.container_in(&node.children, inner, size, point, exclude)
                {
                    return Some(hit);
                }
            }
            if inside && node.is_container() {
                return Some(&node.id);
            }
        }
        None
    }
}
