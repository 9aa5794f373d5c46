//! Strict import of a serialized node tree.
//!
//! Unlike geometry, which degrades bad values to zero, import validates every
//! node and rejects the whole batch on the first problem.

use crate::shapes::{Node, NodeType};
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;

/// Fields every serialized node must carry.
pub const REQUIRED_PROPERTIES: [&str; 8] = [
    "id", "type", "x", "y", "width", "height", "styles", "children",
];

/// Errors raised while importing a tree.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Invalid JSON string provided: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("Input must be an array of shapes")]
    NotAnArray,

    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Result type for import operations.
pub type ImportResult<T> = Result<T, ImportError>;

/// Parse and validate a JSON array of nodes.
pub fn parse_nodes(json: &str) -> ImportResult<Vec<Node>> {
    let value: Value = serde_json::from_str(json).map_err(ImportError::InvalidJson)?;
    nodes_from_value(value)
}

/// Validate an already-parsed JSON value and convert it into nodes.
pub fn nodes_from_value(value: Value) -> ImportResult<Vec<Node>> {
    let Value::Array(items) = &value else {
        return Err(ImportError::NotAnArray);
    };
    let mut ids = HashSet::new();
    for (index, item) in items.iter().enumerate() {
        validate_node(item, index, &mut ids).map_err(ImportError::Validation)?;
    }
    serde_json::from_value(value).map_err(|e| ImportError::Validation(e.to_string()))
}

/// Check one node and its subtree. Root nodes report their index as the
/// level, children report their parent's level plus one. Ids must be unique
/// across the whole batch.
fn validate_node<'a>(
    node: &'a Value,
    level: usize,
    ids: &mut HashSet<&'a str>,
) -> Result<(), String> {
    let Value::Object(fields) = node else {
        return Err(format!("Shape at level {} is not an object", level));
    };
    for prop in REQUIRED_PROPERTIES {
        if !fields.contains_key(prop) {
            return Err(format!(
                "Shape at level {} is missing required property: {}",
                level, prop
            ));
        }
    }

    let tag = fields.get("type").and_then(Value::as_str).unwrap_or_default();
    if NodeType::from_tag(tag).is_none() {
        return Err(format!(
            "Shape at level {} has invalid type: {}",
            level, fields["type"]
        ));
    }

    let numbers = fields["x"].is_number() && fields["y"].is_number();
    let lengths = fields["width"].is_string() && fields["height"].is_string();
    if !numbers || !lengths {
        return Err(format!("Shape at level {} has invalid properties", level));
    }
    if !fields["styles"].is_object() {
        return Err(format!("Shape at level {} has invalid styles", level));
    }
    let Value::Array(children) = &fields["children"] else {
        return Err(format!("Shape at level {} has invalid children array", level));
    };
    let Some(id) = fields["id"].as_str() else {
        return Err(format!("Shape at level {} has invalid id", level));
    };
    if !ids.insert(id) {
        return Err(format!("duplicate id {} at level {}", id, level));
    }

    children
        .iter()
        .try_for_each(|child| validate_node(child, level + 1, ids))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::NodeKind;

    const VALID: &str = r##"[
        {
            "id": "board", "type": "board", "x": 0, "y": 0,
            "width": "800px", "height": "600px", "styles": {},
            "children": [
                {
                    "id": "c", "type": "circle", "x": 10, "y": 20,
                    "width": "50%", "height": "50%", "styles": {"opacity": "0.5"},
                    "children": [], "radius": 40
                }
            ]
        }
    ]"##;

    #[test]
    fn test_parse_valid_tree() {
        let nodes = parse_nodes(VALID).unwrap();
        assert_eq!(nodes.len(), 1);
        let child = &nodes[0].children[0];
        assert_eq!(child.id.as_str(), "c");
        assert!(matches!(child.kind, NodeKind::Circle { radius } if radius == 40.0));
        assert!((child.styles.opacity() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rejects_non_array() {
        let err = parse_nodes(r#"{"id": "x"}"#).unwrap_err();
        assert!(matches!(err, ImportError::NotAnArray));
        assert!(matches!(parse_nodes("not json"), Err(ImportError::InvalidJson(_))));
    }

    #[test]
    fn test_missing_property_names_level() {
        let json = r#"[
            {"id": "p", "type": "div", "x": 0, "y": 0, "width": "1px", "height": "1px",
             "styles": {}, "children": [
                {"id": "c", "type": "text", "x": 0, "y": 0, "width": "1px",
                 "styles": {}, "children": []}
             ]}
        ]"#;
        let err = parse_nodes(json).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation failed: Shape at level 1 is missing required property: height"
        );
    }

    #[test]
    fn test_rejects_unknown_type_and_bad_fields() {
        let unknown = r#"[{"id": "a", "type": "blob", "x": 0, "y": 0, "width": "1px",
            "height": "1px", "styles": {}, "children": []}]"#;
        let err = parse_nodes(unknown).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation failed: Shape at level 0 has invalid type: \"blob\""
        );

        let numeric_width = r#"[{"id": "a", "type": "div", "x": 0, "y": 0, "width": 10,
            "height": "1px", "styles": {}, "children": []}]"#;
        assert!(parse_nodes(numeric_width)
            .unwrap_err()
            .to_string()
            .ends_with("has invalid properties"));

        let bad_children = r#"[{"id": "a", "type": "div", "x": 0, "y": 0, "width": "1px",
            "height": "1px", "styles": {}, "children": {}}]"#;
        assert!(parse_nodes(bad_children)
            .unwrap_err()
            .to_string()
            .ends_with("has invalid children array"));
    }

    #[test]
    fn test_whole_batch_rejected() {
        let json = r#"[
            {"id": "ok", "type": "div", "x": 0, "y": 0, "width": "1px", "height": "1px",
             "styles": {}, "children": []},
            {"id": "bad", "type": "div", "x": "0", "y": 0, "width": "1px", "height": "1px",
             "styles": {}, "children": []}
        ]"#;
        let err = parse_nodes(json).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation failed: Shape at level 1 has invalid properties"
        );
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let nested = r#"[
            {"id": "a", "type": "div", "x": 0, "y": 0, "width": "1px", "height": "1px",
             "styles": {}, "children": [
                {"id": "a", "type": "text", "x": 0, "y": 0, "width": "1px",
                 "height": "1px", "styles": {}, "children": []}
             ]}
        ]"#;
        let err = parse_nodes(nested).unwrap_err();
        assert_eq!(err.to_string(), "Validation failed: duplicate id a at level 1");

        let siblings = r#"[
            {"id": "b", "type": "div", "x": 0, "y": 0, "width": "1px", "height": "1px",
             "styles": {}, "children": []},
            {"id": "b", "type": "div", "x": 5, "y": 0, "width": "1px", "height": "1px",
             "styles": {}, "children": []}
        ]"#;
        assert!(matches!(parse_nodes(siblings), Err(ImportError::Validation(_))));
    }
}
