//! Presentation attributes attached to every node.

use crate::units::leading_float;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A CSS value that may be written either as a number or as a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CssValue {
    Number(f64),
    Text(String),
}

impl CssValue {
    /// Numeric interpretation, using the leading number of a string value.
    pub fn as_f64(&self) -> f64 {
        match self {
            CssValue::Number(n) => *n,
            CssValue::Text(s) => leading_float(s),
        }
    }
}

impl Default for CssValue {
    fn default() -> Self {
        CssValue::Number(0.0)
    }
}

impl From<f64> for CssValue {
    fn from(value: f64) -> Self {
        CssValue::Number(value)
    }
}

impl From<&str> for CssValue {
    fn from(value: &str) -> Self {
        CssValue::Text(value.to_string())
    }
}

/// Full style record for a node.
///
/// Deserialization fills every missing field from [`Style::default`], so a
/// partially specified style object is never observable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Style {
    pub display: String,
    pub position: String,
    pub top: CssValue,
    pub right: CssValue,
    pub bottom: CssValue,
    pub left: CssValue,
    pub float: String,
    pub clear: String,
    pub z_index: i32,
    pub width: String,
    pub height: String,
    pub max_width: String,
    pub max_height: String,
    pub min_width: String,
    pub min_height: String,
    pub box_sizing: String,
    pub margin: CssValue,
    pub margin_top: CssValue,
    pub margin_right: CssValue,
    pub margin_bottom: CssValue,
    pub margin_left: CssValue,
    pub padding: CssValue,
    pub padding_top: CssValue,
    pub padding_right: CssValue,
    pub padding_bottom: CssValue,
    pub padding_left: CssValue,
    pub border: String,
    pub border_width: String,
    pub border_style: String,
    pub border_color: String,
    pub border_radius: CssValue,
    pub background_color: String,
    pub background_image: String,
    pub background_size: String,
    pub background_position: String,
    pub background_repeat: String,
    pub color: String,
    pub font_family: String,
    pub font_size: String,
    pub font_weight: String,
    pub font_style: String,
    pub line_height: String,
    pub letter_spacing: String,
    pub text_align: String,
    pub opacity: CssValue,
    pub box_shadow: String,
    /// Rotation lives here as `rotate(Ndeg)`.
    pub transform: String,
    pub flex_direction: String,
    pub flex_wrap: String,
    pub justify_content: String,
    pub align_items: String,
    pub grid_template_columns: String,
    pub grid_template_rows: String,
    pub gap: String,
    pub overflow: String,
    pub overflow_x: String,
    pub overflow_y: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<String>,
}

impl Default for Style {
    fn default() -> Self {
        let zero = CssValue::Number(0.0);
        Self {
            display: "block".into(),
            position: "absolute".into(),
            top: zero.clone(),
            right: zero.clone(),
            bottom: zero.clone(),
            left: zero.clone(),
            float: "none".into(),
            clear: "none".into(),
            z_index: 0,
            width: "50px".into(),
            height: "50px".into(),
            max_width: "none".into(),
            max_height: "none".into(),
            min_width: "10px".into(),
            min_height: "10px".into(),
            box_sizing: "border-box".into(),
            margin: zero.clone(),
            margin_top: zero.clone(),
            margin_right: zero.clone(),
            margin_bottom: zero.clone(),
            margin_left: zero.clone(),
            padding: zero.clone(),
            padding_top: zero.clone(),
            padding_right: zero.clone(),
            padding_bottom: zero.clone(),
            padding_left: zero.clone(),
            border: "1px solid #000".into(),
            border_width: "1px".into(),
            border_style: "solid".into(),
            border_color: "#000".into(),
            border_radius: zero,
            background_color: "#aabbcc".into(),
            background_image: "none".into(),
            background_size: "cover".into(),
            background_position: "center".into(),
            background_repeat: "no-repeat".into(),
            color: "#000000".into(),
            font_family: "Arial".into(),
            font_size: "16px".into(),
            font_weight: "normal".into(),
            font_style: "normal".into(),
            line_height: "normal".into(),
            letter_spacing: "normal".into(),
            text_align: "left".into(),
            opacity: CssValue::Number(1.0),
            box_shadow: "2px 2px 4px rgba(0,0,0,0.2)".into(),
            transform: "none".into(),
            flex_direction: "row".into(),
            flex_wrap: "nowrap".into(),
            justify_content: "flex-start".into(),
            align_items: "flex-start".into(),
            grid_template_columns: "auto".into(),
            grid_template_rows: "auto".into(),
            gap: "0px".into(),
            overflow: "hidden".into(),
            overflow_x: "hidden".into(),
            overflow_y: "hidden".into(),
            stroke: None,
            stroke_width: None,
        }
    }
}

impl Style {
    /// Rotation in degrees parsed from the transform string.
    ///
    /// Anything other than `rotate(...)` yields zero.
    pub fn rotation(&self) -> f64 {
        let Some(start) = self.transform.find("rotate(") else {
            return 0.0;
        };
        let rest = &self.transform[start + "rotate(".len()..];
        match rest.find(')') {
            Some(end) => leading_float(&rest[..end]),
            None => 0.0,
        }
    }

    /// Store a rotation in degrees.
    pub fn set_rotation(&mut self, degrees: f64) {
        self.transform = format!("rotate({}deg)", degrees);
    }

    /// Opacity clamped to `0.0..=1.0`.
    pub fn opacity(&self) -> f64 {
        self.opacity.as_f64().clamp(0.0, 1.0)
    }

    pub fn is_hidden(&self) -> bool {
        self.display == "none"
    }

    /// Whether descendants are clipped to this node's box.
    pub fn clips(&self) -> bool {
        self.overflow != "visible"
    }

    /// Set a single property by its camelCase name.
    ///
    /// Returns `false` (leaving the style untouched) when the key is unknown
    /// or the value has the wrong shape.
    pub fn set_property(&mut self, key: &str, value: Value) -> bool {
        let Ok(Value::Object(mut map)) = serde_json::to_value(&*self) else {
            return false;
        };
        let known = map.contains_key(key) || key == "stroke" || key == "strokeWidth";
        if !known {
            return false;
        }
        map.insert(key.to_string(), value);
        match serde_json::from_value::<Style>(Value::Object(map)) {
            Ok(style) => {
                *self = style;
                true
            }
            Err(_) => false,
        }
    }
}
