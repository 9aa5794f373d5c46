//! Scene node definitions.

mod catalog;
mod style;

pub use catalog::{CatalogEntry, accepted_types};
pub use style::{CssValue, Style};

use crate::actions::ActionBinding;
use crate::animation::Keyframe;
use kurbo::{Affine, BezPath, Point};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    /// Generate a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// The closed set of node type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Rectangle,
    Circle,
    Line,
    Triangle,
    Text,
    Group,
    Input,
    Checkbox,
    Selector,
    Table,
    Button,
    Icon,
    Image,
    Video,
    Div,
    Scroll,
    Board,
    Path,
}

impl NodeType {
    pub const ALL: [NodeType; 18] = [
        NodeType::Rectangle,
        NodeType::Circle,
        NodeType::Line,
        NodeType::Triangle,
        NodeType::Text,
        NodeType::Group,
        NodeType::Input,
        NodeType::Checkbox,
        NodeType::Selector,
        NodeType::Table,
        NodeType::Button,
        NodeType::Icon,
        NodeType::Image,
        NodeType::Video,
        NodeType::Div,
        NodeType::Scroll,
        NodeType::Board,
        NodeType::Path,
    ];

    /// The serialized type tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Rectangle => "rectangle",
            NodeType::Circle => "circle",
            NodeType::Line => "line",
            NodeType::Triangle => "triangle",
            NodeType::Text => "text",
            NodeType::Group => "group",
            NodeType::Input => "input",
            NodeType::Checkbox => "checkbox",
            NodeType::Selector => "selector",
            NodeType::Table => "table",
            NodeType::Button => "button",
            NodeType::Icon => "icon",
            NodeType::Image => "image",
            NodeType::Video => "video",
            NodeType::Div => "div",
            NodeType::Scroll => "scroll",
            NodeType::Board => "board",
            NodeType::Path => "path",
        }
    }

    /// Look up a type by its tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == tag)
    }

    /// Types that other nodes can be dropped into.
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            NodeType::Group | NodeType::Div | NodeType::Scroll | NodeType::Board
        )
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scroll axis of a scroll container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollDirection {
    Row,
    #[default]
    Column,
}

/// Type-specific payload, tagged by `type` in serialized form.
///
/// Points stored here are local to the owning node's origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeKind {
    Rectangle,
    Circle {
        #[serde(default)]
        radius: f64,
    },
    Line {
        #[serde(default)]
        from: Point,
        #[serde(default)]
        to: Point,
    },
    Triangle {
        #[serde(default = "default_triangle")]
        points: [Point; 3],
    },
    Text {
        #[serde(default)]
        text: String,
    },
    Group,
    Input {
        #[serde(default)]
        text: String,
    },
    Checkbox {
        #[serde(default)]
        checked: bool,
    },
    Selector {
        #[serde(default)]
        options: Vec<String>,
        #[serde(default, rename = "selectedOption")]
        selected_option: usize,
    },
    Table {
        #[serde(default, rename = "tableData")]
        table_data: Vec<Vec<String>>,
    },
    Button {
        #[serde(default)]
        text: String,
    },
    Icon {
        #[serde(default)]
        text: String,
    },
    Image {
        #[serde(default)]
        src: String,
    },
    Video {
        #[serde(default)]
        src: String,
    },
    Div,
    Scroll {
        #[serde(default, rename = "scrollDirection")]
        scroll_direction: ScrollDirection,
        #[serde(default, rename = "scrollOffset")]
        scroll_offset: f64,
    },
    Board,
    Path {
        #[serde(default)]
        d: String,
    },
}

fn default_triangle() -> [Point; 3] {
    [
        Point::new(0.0, 200.0),
        Point::new(200.0, 200.0),
        Point::new(100.0, 0.0),
    ]
}

impl NodeKind {
    pub fn node_type(&self) -> NodeType {
        match self {
            NodeKind::Rectangle => NodeType::Rectangle,
            NodeKind::Circle { .. } => NodeType::Circle,
            NodeKind::Line { .. } => NodeType::Line,
            NodeKind::Triangle { .. } => NodeType::Triangle,
            NodeKind::Text { .. } => NodeType::Text,
            NodeKind::Group => NodeType::Group,
            NodeKind::Input { .. } => NodeType::Input,
            NodeKind::Checkbox { .. } => NodeType::Checkbox,
            NodeKind::Selector { .. } => NodeType::Selector,
            NodeKind::Table { .. } => NodeType::Table,
            NodeKind::Button { .. } => NodeType::Button,
            NodeKind::Icon { .. } => NodeType::Icon,
            NodeKind::Image { .. } => NodeType::Image,
            NodeKind::Video { .. } => NodeType::Video,
            NodeKind::Div => NodeType::Div,
            NodeKind::Scroll { .. } => NodeType::Scroll,
            NodeKind::Board => NodeType::Board,
            NodeKind::Path { .. } => NodeType::Path,
        }
    }

    /// Text content for kinds that carry one.
    pub fn text(&self) -> Option<&str> {
        match self {
            NodeKind::Text { text }
            | NodeKind::Input { text }
            | NodeKind::Button { text }
            | NodeKind::Icon { text } => Some(text),
            _ => None,
        }
    }

    /// Replace the text content. Returns `false` for kinds without text.
    pub fn set_text(&mut self, value: String) -> bool {
        match self {
            NodeKind::Text { text }
            | NodeKind::Input { text }
            | NodeKind::Button { text }
            | NodeKind::Icon { text } => {
                *text = value;
                true
            }
            _ => false,
        }
    }
}

/// A node in the scene tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    #[serde(flatten)]
    pub kind: NodeKind,
    /// Position in the parent's coordinate frame.
    pub x: f64,
    pub y: f64,
    /// Relative-length expressions, e.g. `"200px"` or `"50%"`.
    pub width: String,
    pub height: String,
    #[serde(default)]
    pub styles: Style,
    #[serde(default)]
    pub children: Vec<Node>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub frames: Vec<Keyframe>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<ActionBinding>,
    /// Component reference shared by clones of the same component.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
}

impl Node {
    /// Create a node with default style and a fresh id.
    pub fn new(
        kind: NodeKind,
        x: f64,
        y: f64,
        width: impl Into<String>,
        height: impl Into<String>,
    ) -> Self {
        Self {
            id: NodeId::new(),
            kind,
            x,
            y,
            width: width.into(),
            height: height.into(),
            styles: Style::default(),
            children: Vec::new(),
            frames: Vec::new(),
            actions: Vec::new(),
            component: None,
        }
    }

    /// Builder-style id override.
    pub fn with_id(mut self, id: impl Into<NodeId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    pub fn node_type(&self) -> NodeType {
        self.kind.node_type()
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn set_position(&mut self, p: Point) {
        self.x = p.x;
        self.y = p.y;
    }

    /// Rotation in degrees.
    pub fn rotation(&self) -> f64 {
        self.styles.rotation()
    }

    pub fn set_rotation(&mut self, degrees: f64) {
        self.styles.set_rotation(degrees);
    }

    pub fn is_container(&self) -> bool {
        self.node_type().is_container()
    }

    /// Depth-first search in this subtree, including `self`.
    pub fn find(&self, id: &NodeId) -> Option<&Node> {
        if &self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }

    pub fn find_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        if &self.id == id {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_mut(id))
    }

    /// Whether `id` is this node or one of its descendants.
    pub fn contains(&self, id: &NodeId) -> bool {
        self.find(id).is_some()
    }

    /// Assign fresh ids to this node and every descendant.
    pub fn regenerate_ids(&mut self) {
        self.id = NodeId::new();
        for child in &mut self.children {
            child.regenerate_ids();
        }
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(Node::subtree_len).sum::<usize>()
    }

    /// Scale point-based payloads after the box changed size.
    ///
    /// Circles track the box instead: their radius becomes half the smaller
    /// side.
    pub fn scale_payload(&mut self, sx: f64, sy: f64, new_width: f64, new_height: f64) {
        let scale = Affine::scale_non_uniform(sx, sy);
        match &mut self.kind {
            NodeKind::Circle { radius } => *radius = new_width.min(new_height) / 2.0,
            NodeKind::Line { from, to } => {
                *from = scale * *from;
                *to = scale * *to;
            }
            NodeKind::Triangle { points } => {
                for p in points.iter_mut() {
                    *p = scale * *p;
                }
            }
            NodeKind::Path { d } => {
                if let Ok(mut path) = BezPath::from_svg(d) {
                    path.apply_affine(scale);
                    *d = path.to_svg();
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_serializes_type_tag() {
        let node = Node::new(NodeKind::Circle { radius: 50.0 }, 1.0, 2.0, "100px", "100px")
            .with_id("c1");
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "circle");
        assert_eq!(json["radius"], 50.0);
        assert_eq!(json["id"], "c1");
        assert_eq!(json["styles"]["fontFamily"], "Arial");
    }

    #[test]
    fn test_node_deserializes_with_partial_style() {
        let json = r##"{
            "id": "s1", "type": "selector", "x": 5, "y": 6,
            "width": "150px", "height": "30px",
            "styles": {"color": "#ff0000"},
            "children": [],
            "options": ["a", "b"], "selectedOption": 1
        }"##;
        let node: Node = serde_json::from_str(json).unwrap();
        assert_eq!(node.node_type(), NodeType::Selector);
        assert_eq!(node.styles.color, "#ff0000");
        assert_eq!(node.styles.display, "block");
        match node.kind {
            NodeKind::Selector { options, selected_option } => {
                assert_eq!(options, vec!["a", "b"]);
                assert_eq!(selected_option, 1);
            }
            other => panic!("unexpected kind {:?}", other),
        }
    }

    #[test]
    fn test_type_tags_round_trip_through_lookup() {
        for ty in NodeType::ALL {
            assert_eq!(NodeType::from_tag(ty.as_str()), Some(ty));
        }
        assert_eq!(NodeType::from_tag("html"), None);
    }

    #[test]
    fn test_find_nested() {
        let child = Node::new(NodeKind::Rectangle, 0.0, 0.0, "10px", "10px").with_id("child");
        let parent = Node::new(NodeKind::Div, 0.0, 0.0, "100px", "100px")
            .with_id("parent")
            .with_children(vec![child]);
        assert!(parent.find(&"child".into()).is_some());
        assert!(parent.contains(&"parent".into()));
        assert!(!parent.contains(&"missing".into()));
        assert_eq!(parent.subtree_len(), 2);
    }

    #[test]
    fn test_regenerate_ids_touches_descendants() {
        let child = Node::new(NodeKind::Rectangle, 0.0, 0.0, "10px", "10px").with_id("child");
        let mut parent = Node::new(NodeKind::Group, 0.0, 0.0, "100px", "100px")
            .with_id("parent")
            .with_children(vec![child]);
        parent.regenerate_ids();
        assert_ne!(parent.id.as_str(), "parent");
        assert_ne!(parent.children[0].id.as_str(), "child");
    }

    #[test]
    fn test_scale_payload() {
        let mut line = Node::new(
            NodeKind::Line { from: Point::ZERO, to: Point::new(10.0, 20.0) },
            0.0,
            0.0,
            "10px",
            "20px",
        );
        line.scale_payload(2.0, 0.5, 20.0, 10.0);
        match line.kind {
            NodeKind::Line { to, .. } => {
                assert!((to.x - 20.0).abs() < f64::EPSILON);
                assert!((to.y - 10.0).abs() < f64::EPSILON);
            }
            _ => unreachable!(),
        }

        let mut circle = Node::new(NodeKind::Circle { radius: 100.0 }, 0.0, 0.0, "200px", "200px");
        circle.scale_payload(0.5, 1.0, 100.0, 200.0);
        let NodeKind::Circle { radius } = circle.kind else {
            panic!("expected a circle");
        };
        assert!((radius - 50.0).abs() < f64::EPSILON);
    }
}
