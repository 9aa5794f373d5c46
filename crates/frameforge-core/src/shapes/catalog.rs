//! Accepted node types and their creation defaults.

use super::{Node, NodeKind, NodeType, ScrollDirection};
use kurbo::{Point, Size};
use serde::Serialize;

/// One palette entry for the host UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogEntry {
    pub node_type: NodeType,
    pub label: &'static str,
    pub default_size: Size,
}

/// The fixed set of types the host can offer in a shape palette.
pub fn accepted_types() -> Vec<CatalogEntry> {
    NodeType::ALL
        .into_iter()
        .filter(|t| !matches!(t, NodeType::Group | NodeType::Path))
        .map(|node_type| CatalogEntry {
            node_type,
            label: label(node_type),
            default_size: default_size(node_type),
        })
        .collect()
}

fn label(node_type: NodeType) -> &'static str {
    match node_type {
        NodeType::Rectangle => "Rectangle",
        NodeType::Circle => "Circle",
        NodeType::Line => "Line",
        NodeType::Triangle => "Triangle",
        NodeType::Text => "Text",
        NodeType::Group => "Group",
        NodeType::Input => "Input",
        NodeType::Checkbox => "Checkbox",
        NodeType::Selector => "Selector",
        NodeType::Table => "Table",
        NodeType::Button => "Button",
        NodeType::Icon => "Icon",
        NodeType::Image => "Image",
        NodeType::Video => "Video",
        NodeType::Div => "Div",
        NodeType::Scroll => "Scroll",
        NodeType::Board => "Board",
        NodeType::Path => "Path",
    }
}

/// Default box size for newly created nodes of a type.
pub fn default_size(node_type: NodeType) -> Size {
    match node_type {
        NodeType::Line | NodeType::Path | NodeType::Group => Size::ZERO,
        NodeType::Text => Size::new(200.0, 40.0),
        NodeType::Input => Size::new(200.0, 30.0),
        NodeType::Checkbox => Size::new(20.0, 20.0),
        NodeType::Selector => Size::new(150.0, 30.0),
        NodeType::Table => Size::new(200.0, 100.0),
        NodeType::Button => Size::new(100.0, 40.0),
        NodeType::Icon => Size::new(30.0, 30.0),
        NodeType::Video => Size::new(300.0, 200.0),
        NodeType::Board => Size::new(800.0, 600.0),
        NodeType::Rectangle
        | NodeType::Circle
        | NodeType::Triangle
        | NodeType::Image
        | NodeType::Div
        | NodeType::Scroll => Size::new(200.0, 200.0),
    }
}

impl Node {
    /// Create a node of `node_type` at `at` with its catalog defaults.
    pub fn create(node_type: NodeType, at: Point) -> Node {
        let size = default_size(node_type);
        let kind = match node_type {
            NodeType::Rectangle => NodeKind::Rectangle,
            NodeType::Circle => NodeKind::Circle {
                radius: size.width.min(size.height) / 2.0,
            },
            NodeType::Line => NodeKind::Line {
                from: Point::ZERO,
                to: Point::ZERO,
            },
            NodeType::Triangle => NodeKind::Triangle {
                points: [
                    Point::new(0.0, size.height),
                    Point::new(size.width, size.height),
                    Point::new(size.width / 2.0, 0.0),
                ],
            },
            NodeType::Text => NodeKind::Text {
                text: "Double click to edit".into(),
            },
            NodeType::Group => NodeKind::Group,
            NodeType::Input => NodeKind::Input {
                text: "Input".into(),
            },
            NodeType::Checkbox => NodeKind::Checkbox { checked: false },
            NodeType::Selector => NodeKind::Selector {
                options: vec!["Option 1".into(), "Option 2".into(), "Option 3".into()],
                selected_option: 0,
            },
            NodeType::Table => NodeKind::Table {
                table_data: vec![
                    vec!["Cell 1".into(), "Cell 2".into()],
                    vec!["Cell 3".into(), "Cell 4".into()],
                ],
            },
            NodeType::Button => NodeKind::Button {
                text: "Button".into(),
            },
            NodeType::Icon => NodeKind::Icon { text: "★".into() },
            NodeType::Image => NodeKind::Image { src: String::new() },
            NodeType::Video => NodeKind::Video { src: String::new() },
            NodeType::Div => NodeKind::Div,
            NodeType::Scroll => NodeKind::Scroll {
                scroll_direction: ScrollDirection::Column,
                scroll_offset: 0.0,
            },
            NodeType::Board => NodeKind::Board,
            NodeType::Path => NodeKind::Path { d: String::new() },
        };

        let mut node = Node::new(
            kind,
            at.x,
            at.y,
            crate::units::px(size.width),
            crate::units::px(size.height),
        );
        let styles = &mut node.styles;
        match node_type {
            NodeType::Line | NodeType::Path => {
                styles.stroke = Some("#aabbcc".into());
                styles.stroke_width = Some("2px".into());
            }
            NodeType::Text => {
                styles.font_size = "16px".into();
                styles.color = "#000000".into();
            }
            NodeType::Button => {
                styles.background_color = "#4CAF50".into();
                styles.color = "#fff".into();
            }
            NodeType::Icon => styles.font_size = "24px".into(),
            NodeType::Scroll => styles.overflow = "auto".into(),
            NodeType::Group => styles.overflow = "visible".into(),
            _ => {}
        }
        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_lists_palette_types() {
        let types = accepted_types();
        assert_eq!(types.len(), 16);
        let button = types
            .iter()
            .find(|e| e.node_type == NodeType::Button)
            .unwrap();
        assert_eq!(button.default_size, Size::new(100.0, 40.0));
        assert!(types.iter().all(|e| e.node_type != NodeType::Group));
    }

    #[test]
    fn test_create_rectangle_defaults() {
        let node = Node::create(NodeType::Rectangle, Point::new(5.0, 6.0));
        assert_eq!(node.width, "200px");
        assert_eq!(node.height, "200px");
        assert!((node.x - 5.0).abs() < f64::EPSILON);
        assert!(node.children.is_empty());
    }

    #[test]
    fn test_create_widgets() {
        let text = Node::create(NodeType::Text, Point::ZERO);
        assert_eq!(text.kind.text(), Some("Double click to edit"));
        assert_eq!(text.height, "40px");

        let selector = Node::create(NodeType::Selector, Point::ZERO);
        assert!(matches!(
            selector.kind,
            NodeKind::Selector { ref options, selected_option: 0 } if options.len() == 3
        ));

        let icon = Node::create(NodeType::Icon, Point::ZERO);
        assert_eq!(icon.styles.font_size, "24px");

        let line = Node::create(NodeType::Line, Point::ZERO);
        assert_eq!(line.width, "0px");
        assert_eq!(line.styles.stroke.as_deref(), Some("#aabbcc"));
    }
}
