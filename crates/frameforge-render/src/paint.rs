//! CSS paint values: colors, lengths and border shorthands.

use frameforge_core::shapes::Style;
use frameforge_core::units::leading_float;
use peniko::Color;
use peniko::color::{Srgb, parse_color};

use crate::renderer::{RenderResult, RendererError};

/// Scrollbar thumb color, `rgba(0,0,0,0.3)`.
pub const SCROLLBAR_COLOR: Color = Color::from_rgba8(0, 0, 0, 77);

/// Scrollbar thickness in scene units.
pub const SCROLLBAR_THICKNESS: f64 = 10.0;

/// Parse a CSS color string.
pub fn parse_css_color(value: &str) -> RenderResult<Color> {
    parse_color(value.trim())
        .map(|c| c.to_alpha_color::<Srgb>())
        .map_err(|e| RendererError::InvalidColor {
            value: value.to_string(),
            reason: e.to_string(),
        })
}

/// Parse a paint value. Empty strings and `none` mean "don't paint".
///
/// Unparsable colors are skipped rather than failing the frame.
pub fn css_color(value: &str) -> Option<Color> {
    let value = value.trim();
    if value.is_empty() || value == "none" {
        return None;
    }
    match parse_css_color(value) {
        Ok(color) => Some(color),
        Err(e) => {
            log::debug!("{}", e);
            None
        }
    }
}

pub(crate) fn css_color_or(value: &str, fallback: Color) -> Color {
    parse_css_color(value).unwrap_or_else(|e| {
        log::warn!("{}, using fallback", e);
        fallback
    })
}

/// Numeric part of a CSS length such as `"2px"`.
pub fn css_length(value: &str) -> f64 {
    leading_float(value)
}

/// A resolved border: stroke width and color.
#[derive(Debug, Clone, Copy)]
pub struct Border {
    pub width: f64,
    pub color: Color,
}

/// Border of a style, from the `border` shorthand (`"1px solid #000"`)
/// with the longhand fields filling any gaps.
///
/// `None` when the border is zero width, `none`/`hidden`, or has no
/// usable color.
pub fn border(style: &Style) -> Option<Border> {
    let mut parts = style.border.trim().splitn(3, char::is_whitespace);
    let width = parts
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(style.border_width.as_str());
    let line = parts.next().unwrap_or(style.border_style.as_str());
    let color = parts.next().unwrap_or(style.border_color.as_str());

    if matches!(width, "none" | "hidden") || matches!(line.trim(), "none" | "hidden") {
        return None;
    }
    let width = css_length(width);
    if width <= 0.0 {
        return None;
    }
    Some(Border {
        width,
        color: css_color(color)?,
    })
}

/// Stroke for line-like nodes: `stroke`/`strokeWidth` when set, otherwise
/// the text color at one pixel.
pub fn line_paint(style: &Style) -> Option<Border> {
    let width = style.stroke_width.as_deref().map(css_length).unwrap_or(1.0);
    let color = match style.stroke.as_deref() {
        Some(stroke) => css_color(stroke)?,
        None => css_color(&style.color)?,
    };
    (width > 0.0).then_some(Border { width, color })
}
