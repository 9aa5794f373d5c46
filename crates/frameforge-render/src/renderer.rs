//! The drawing seam between a canvas frame and the host backend.

use frameforge_core::canvas::Canvas;
use kurbo::{Affine, BezPath, Point, Rect, Size, Stroke};
use peniko::Color;
use thiserror::Error;

use crate::paint::css_color_or;

#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Invalid color '{value}': {reason}")]
    InvalidColor { value: String, reason: String },
}

pub type RenderResult<T> = Result<T, RendererError>;

/// Horizontal text alignment inside a node's box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl TextAlign {
    /// Parse a CSS `text-align` value. Unknown values align left.
    pub fn from_css(value: &str) -> Self {
        match value.trim() {
            "center" => TextAlign::Center,
            "right" | "end" => TextAlign::Right,
            _ => TextAlign::Left,
        }
    }
}

/// A single line of text laid out inside `bounds`.
#[derive(Debug, Clone)]
pub struct TextRun {
    pub text: String,
    /// Box in the node's local frame.
    pub bounds: Rect,
    pub font_size: f64,
    pub font_family: String,
    pub color: Color,
    pub align: TextAlign,
}

/// Drawing backend the dispatcher writes into.
///
/// Paths and rects are in the coordinate frame given by `transform`.
pub trait Surface {
    /// Drop everything drawn so far.
    fn reset(&mut self);

    fn fill(&mut self, transform: Affine, color: Color, path: &BezPath);

    fn stroke(&mut self, style: &Stroke, transform: Affine, color: Color, path: &BezPath);

    fn draw_text(&mut self, transform: Affine, run: &TextRun);

    /// Draw the image at `src` scaled into `bounds`.
    fn draw_image(&mut self, transform: Affine, bounds: Rect, src: &str);

    /// Clip subsequent drawing to `clip` until the matching [`Surface::pop_clip`].
    fn push_clip(&mut self, transform: Affine, clip: Rect);

    fn pop_clip(&mut self);
}

/// Everything one frame needs besides the surface.
pub struct RenderContext<'a> {
    pub canvas: &'a Canvas,
    /// Host viewport in screen pixels.
    pub viewport_size: Size,
    /// Page fill behind the root nodes.
    pub background_color: Color,
    /// Outline and handle color of the selection overlay.
    pub selection_color: Color,
    pub guide_color: Color,
    /// Draw selection handles and guides on top of the scene.
    pub show_overlay: bool,
}

impl<'a> RenderContext<'a> {
    /// Background and overlay settings come from the canvas config.
    pub fn new(canvas: &'a Canvas, viewport_size: Size) -> Self {
        Self {
            canvas,
            viewport_size,
            background_color: css_color_or(&canvas.config.background_color, Color::WHITE),
            selection_color: Color::from_rgb8(59, 130, 246),
            guide_color: Color::from_rgba8(236, 72, 153, 180),
            show_overlay: canvas.config.show_overlay,
        }
    }

    pub fn with_background(mut self, color: Color) -> Self {
        self.background_color = color;
        self
    }

    pub fn with_selection_color(mut self, color: Color) -> Self {
        self.selection_color = color;
        self
    }

    pub fn with_overlay(mut self, show: bool) -> Self {
        self.show_overlay = show;
        self
    }

    /// Visible part of the scene, in scene coordinates.
    pub fn visible_rect(&self) -> Rect {
        let inverse = self.canvas.camera.inverse_transform();
        let top_left = inverse * Point::ZERO;
        let bottom_right =
            inverse * Point::new(self.viewport_size.width, self.viewport_size.height);
        Rect::from_points(top_left, bottom_right)
    }
}

/// Turns a [`RenderContext`] into one complete frame.
pub trait Renderer {
    /// Redraw the whole frame from scratch.
    fn build_scene(&mut self, ctx: &RenderContext);

    /// Color the host should clear the viewport with.
    fn background_color(&self, ctx: &RenderContext) -> Color {
        ctx.background_color
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_follows_config() {
        let mut canvas = Canvas::new();
        canvas.config.background_color = "#ff0000".into();
        canvas.config.show_overlay = false;
        let ctx = RenderContext::new(&canvas, Size::new(800.0, 600.0));
        assert_eq!(ctx.background_color.to_rgba8().r, 255);
        assert_eq!(ctx.background_color.to_rgba8().g, 0);
        assert!(!ctx.show_overlay);
        assert!(ctx.with_overlay(true).show_overlay);
    }

    #[test]
    fn test_bad_background_falls_back_to_white() {
        let mut canvas = Canvas::new();
        canvas.config.background_color = "not a color".into();
        let ctx = RenderContext::new(&canvas, Size::new(10.0, 10.0));
        let rgba = ctx.background_color.to_rgba8();
        assert_eq!((rgba.r, rgba.g, rgba.b, rgba.a), (255, 255, 255, 255));
    }

    #[test]
    fn test_visible_rect_follows_camera() {
        let mut canvas = Canvas::new();
        canvas.camera.pan(kurbo::Vec2::new(100.0, 50.0));
        let ctx = RenderContext::new(&canvas, Size::new(800.0, 600.0));
        assert_eq!(ctx.visible_rect(), Rect::new(-100.0, -50.0, 700.0, 550.0));
    }

    #[test]
    fn test_text_align_parse() {
        assert_eq!(TextAlign::from_css("center"), TextAlign::Center);
        assert_eq!(TextAlign::from_css("right"), TextAlign::Right);
        assert_eq!(TextAlign::from_css("justify"), TextAlign::Left);
    }
}
