//! Scene traversal: turns the node tree into surface draw calls.
//!
//! Nodes are drawn pre-order, so later siblings paint over earlier ones and
//! children paint over their parent. Each node is drawn in its own local
//! frame: the parent transform, then the node's position, then its rotation
//! about its own centre.

use frameforge_core::canvas::Canvas;
use frameforge_core::geometry::{Layout, ScrollMetrics, placement, scroll_shift};
use frameforge_core::selection::{HandleKind, handles};
use frameforge_core::shapes::{Node, NodeKind, ScrollDirection, Style};
use frameforge_core::snap::GuideAxis;
use kurbo::{Affine, BezPath, Circle, Line, Point, Rect, RoundedRect, Shape, Size, Stroke};
use peniko::Color;

use crate::paint::{SCROLLBAR_COLOR, SCROLLBAR_THICKNESS, border, css_color, css_length, line_paint};
use crate::renderer::{RenderContext, Renderer, Surface, TextAlign, TextRun};

const TOLERANCE: f64 = 0.1;
const TEXT_INSET: f64 = 5.0;
const SELECTOR_ARROW: f64 = 10.0;

/// Renders a canvas into any [`Surface`].
pub struct SceneRenderer<S> {
    surface: S,
    zoom: f64,
}

impl<S: Surface> SceneRenderer<S> {
    pub fn new(surface: S) -> Self {
        Self { surface, zoom: 1.0 }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    fn render_node(
        &mut self,
        layout: &Layout,
        node: &Node,
        parent: Affine,
        parent_size: Size,
        parent_alpha: f32,
    ) {
        if node.styles.is_hidden() {
            return;
        }
        let size = layout.resolve_size(node, parent_size);
        let bounds = Rect::from_origin_size(Point::ZERO, size);
        let transform = parent * placement(node, size);
        let alpha = parent_alpha * node.styles.opacity() as f32;

        self.draw_kind(node, bounds, transform, alpha);

        if node.children.is_empty() && !matches!(node.kind, NodeKind::Scroll { .. }) {
            return;
        }
        let clip = match node.kind {
            NodeKind::Scroll { .. } | NodeKind::Board => true,
            NodeKind::Div => node.styles.clips(),
            _ => false,
        };
        if clip {
            self.surface.push_clip(transform, bounds);
        }
        let inner = transform * Affine::translate(scroll_shift(node));
        for child in &node.children {
            self.render_node(layout, child, inner, size, alpha);
        }
        if clip {
            self.surface.pop_clip();
        }
        if let Some(metrics) = layout.scroll_metrics(node, size) {
            self.draw_scrollbar(&metrics, size, transform, alpha);
        }
    }

    fn draw_kind(&mut self, node: &Node, bounds: Rect, transform: Affine, alpha: f32) {
        let style = &node.styles;
        match &node.kind {
            NodeKind::Group => {}
            NodeKind::Circle { radius } => {
                let path = Circle::new(bounds.center(), *radius).to_path(TOLERANCE);
                self.fill_and_outline(&path, style, transform, alpha);
            }
            NodeKind::Line { from, to } => {
                let path = Line::new(*from, *to).to_path(TOLERANCE);
                self.stroke_line(&path, style, transform, alpha);
            }
            NodeKind::Triangle { points } => {
                let mut path = BezPath::new();
                path.move_to(points[0]);
                path.line_to(points[1]);
                path.line_to(points[2]);
                path.close_path();
                self.fill_and_outline(&path, style, transform, alpha);
            }
            NodeKind::Path { d } => {
                if d.trim().is_empty() {
                    return;
                }
                match BezPath::from_svg(d) {
                    Ok(path) => self.stroke_line(&path, style, transform, alpha),
                    Err(e) => log::debug!("Skipping path node {}: {}", node.id, e),
                }
            }
            NodeKind::Text { text } => {
                self.draw_box(style, bounds, transform, alpha);
                let align = TextAlign::from_css(&style.text_align);
                self.draw_label(text, bounds, style, align, transform, alpha);
            }
            NodeKind::Icon { text } | NodeKind::Button { text } => {
                self.draw_box(style, bounds, transform, alpha);
                self.draw_label(text, bounds, style, TextAlign::Center, transform, alpha);
            }
            NodeKind::Input { text } => {
                self.draw_box(style, bounds, transform, alpha);
                let inner = bounds.inset(-TEXT_INSET);
                self.draw_label(text, inner, style, TextAlign::Left, transform, alpha);
            }
            NodeKind::Checkbox { checked } => {
                self.draw_box(style, bounds, transform, alpha);
                if *checked {
                    self.draw_check_mark(bounds, style, transform, alpha);
                }
            }
            NodeKind::Selector {
                options,
                selected_option,
            } => {
                self.draw_box(style, bounds, transform, alpha);
                if let Some(option) = options.get(*selected_option) {
                    let inner = Rect::new(
                        bounds.x0 + TEXT_INSET,
                        bounds.y0,
                        (bounds.x1 - SELECTOR_ARROW - 2.0 * TEXT_INSET).max(bounds.x0 + TEXT_INSET),
                        bounds.y1,
                    );
                    self.draw_label(option, inner, style, TextAlign::Left, transform, alpha);
                }
                self.draw_selector_arrow(bounds, style, transform, alpha);
            }
            NodeKind::Table { table_data } => {
                self.draw_box(style, bounds, transform, alpha);
                self.draw_table(table_data, bounds, style, transform, alpha);
            }
            NodeKind::Image { src } | NodeKind::Video { src } => {
                self.draw_box(style, bounds, transform, alpha);
                if !src.is_empty() {
                    self.surface.draw_image(transform, bounds, src);
                }
            }
            NodeKind::Rectangle | NodeKind::Div | NodeKind::Scroll { .. } | NodeKind::Board => {
                self.draw_box(style, bounds, transform, alpha);
            }
        }
    }

    /// Background plus border, rounded when the style has a radius.
    fn draw_box(&mut self, style: &Style, bounds: Rect, transform: Affine, alpha: f32) {
        let radius = style.border_radius.as_f64();
        let path = if radius > 0.0 {
            RoundedRect::from_rect(bounds, radius).to_path(TOLERANCE)
        } else {
            bounds.to_path(TOLERANCE)
        };
        self.fill_and_outline(&path, style, transform, alpha);
    }

    fn fill_and_outline(&mut self, path: &BezPath, style: &Style, transform: Affine, alpha: f32) {
        if let Some(color) = css_color(&style.background_color) {
            self.surface.fill(transform, color.multiply_alpha(alpha), path);
        }
        if let Some(b) = border(style) {
            self.surface
                .stroke(&Stroke::new(b.width), transform, b.color.multiply_alpha(alpha), path);
        }
    }

    fn stroke_line(&mut self, path: &BezPath, style: &Style, transform: Affine, alpha: f32) {
        if let Some(paint) = line_paint(style) {
            let stroke = Stroke::new(paint.width).with_caps(kurbo::Cap::Round);
            self.surface
                .stroke(&stroke, transform, paint.color.multiply_alpha(alpha), path);
        }
    }

    fn draw_label(
        &mut self,
        text: &str,
        bounds: Rect,
        style: &Style,
        align: TextAlign,
        transform: Affine,
        alpha: f32,
    ) {
        if text.is_empty() {
            return;
        }
        let Some(color) = css_color(&style.color) else {
            return;
        };
        let run = TextRun {
            text: text.to_string(),
            bounds,
            font_size: css_length(&style.font_size),
            font_family: style.font_family.clone(),
            color: color.multiply_alpha(alpha),
            align,
        };
        self.surface.draw_text(transform, &run);
    }

    fn draw_check_mark(&mut self, bounds: Rect, style: &Style, transform: Affine, alpha: f32) {
        let Some(color) = css_color(&style.color) else {
            return;
        };
        let (w, h) = (bounds.width(), bounds.height());
        let mut mark = BezPath::new();
        mark.move_to((w * 0.2, h * 0.5));
        mark.line_to((w * 0.4, h * 0.75));
        mark.line_to((w * 0.8, h * 0.25));
        let stroke = Stroke::new(2.0)
            .with_caps(kurbo::Cap::Round)
            .with_join(kurbo::Join::Round);
        self.surface
            .stroke(&stroke, transform, color.multiply_alpha(alpha), &mark);
    }

    fn draw_selector_arrow(&mut self, bounds: Rect, style: &Style, transform: Affine, alpha: f32) {
        let Some(color) = css_color(&style.color) else {
            return;
        };
        let right = bounds.x1 - TEXT_INSET;
        let mid = bounds.center().y;
        let half = SELECTOR_ARROW / 2.0;
        let mut arrow = BezPath::new();
        arrow.move_to((right - SELECTOR_ARROW, mid - half / 2.0));
        arrow.line_to((right, mid - half / 2.0));
        arrow.line_to((right - half, mid + half / 2.0));
        arrow.close_path();
        self.surface.fill(transform, color.multiply_alpha(alpha), &arrow);
    }

    /// Even grid of cells, one text run per non-empty cell.
    fn draw_table(
        &mut self,
        data: &[Vec<String>],
        bounds: Rect,
        style: &Style,
        transform: Affine,
        alpha: f32,
    ) {
        let rows = data.len();
        let cols = data.iter().map(Vec::len).max().unwrap_or(0);
        if rows == 0 || cols == 0 {
            return;
        }
        let cell_w = bounds.width() / cols as f64;
        let cell_h = bounds.height() / rows as f64;
        let grid = border(style);
        for (r, row) in data.iter().enumerate() {
            for c in 0..cols {
                let cell = Rect::from_origin_size(
                    (bounds.x0 + c as f64 * cell_w, bounds.y0 + r as f64 * cell_h),
                    (cell_w, cell_h),
                );
                if let Some(b) = grid {
                    self.surface.stroke(
                        &Stroke::new(b.width),
                        transform,
                        b.color.multiply_alpha(alpha),
                        &cell.to_path(TOLERANCE),
                    );
                }
                if let Some(text) = row.get(c) {
                    let inner = cell.inset(-TEXT_INSET.min(cell_w / 2.0));
                    self.draw_label(text, inner, style, TextAlign::Left, transform, alpha);
                }
            }
        }
    }

    fn draw_scrollbar(
        &mut self,
        metrics: &ScrollMetrics,
        size: Size,
        transform: Affine,
        alpha: f32,
    ) {
        let Some((start, length)) = metrics.thumb() else {
            return;
        };
        let thumb = match metrics.direction {
            ScrollDirection::Column => Rect::new(
                size.width - SCROLLBAR_THICKNESS,
                start,
                size.width,
                start + length,
            ),
            ScrollDirection::Row => Rect::new(
                start,
                size.height - SCROLLBAR_THICKNESS,
                start + length,
                size.height,
            ),
        };
        self.surface.fill(
            transform,
            SCROLLBAR_COLOR.multiply_alpha(alpha),
            &thumb.to_path(TOLERANCE),
        );
    }

    /// Selection outlines, handles and alignment guides.
    fn render_overlay(&mut self, ctx: &RenderContext, layout: &Layout, camera: Affine) {
        let canvas = ctx.canvas;
        let metrics = canvas.config.handle_metrics();
        let stroke_width = 1.0 / self.zoom;
        let dash = 4.0 / self.zoom;

        for id in &canvas.selection {
            let Some(node) = canvas.scene.find(id) else {
                continue;
            };
            let Some((frame, size)) = layout.parent_frame(&canvas.scene, id) else {
                continue;
            };
            let rect = Rect::from_origin_size(node.position(), size);
            let rotation = Affine::rotate_about(node.rotation().to_radians(), rect.center());
            let transform = camera * frame * rotation;
            let outline = Stroke::new(stroke_width).with_dashes(0.0, [dash, dash]);
            self.surface
                .stroke(&outline, transform, ctx.selection_color, &rect.to_path(TOLERANCE));

            for handle in handles(rect, metrics) {
                let path = match handle.kind {
                    HandleKind::Rotate => {
                        let radius = handle.rect.width() / 2.0;
                        Circle::new(handle.rect.center(), radius).to_path(TOLERANCE)
                    }
                    _ => handle.rect.to_path(TOLERANCE),
                };
                self.surface.fill(transform, Color::WHITE, &path);
                self.surface
                    .stroke(&Stroke::new(stroke_width), transform, ctx.selection_color, &path);
            }
        }

        let visible = ctx.visible_rect();
        for guide in &canvas.guides {
            let line = match guide.axis {
                GuideAxis::Vertical => Line::new(
                    (guide.position, visible.y0),
                    (guide.position, visible.y1),
                ),
                GuideAxis::Horizontal => Line::new(
                    (visible.x0, guide.position),
                    (visible.x1, guide.position),
                ),
            };
            self.surface.stroke(
                &Stroke::new(stroke_width),
                camera,
                ctx.guide_color,
                &line.to_path(TOLERANCE),
            );
        }
    }
}

impl<S: Surface> Renderer for SceneRenderer<S> {
    fn build_scene(&mut self, ctx: &RenderContext) {
        self.surface.reset();
        let canvas: &Canvas = ctx.canvas;
        self.zoom = canvas.camera.zoom;
        let camera = canvas.camera.transform();
        let layout = canvas.layout();

        let page = Rect::from_origin_size(Point::ZERO, layout.surface);
        let background = self.background_color(ctx);
        self.surface.fill(camera, background, &page.to_path(TOLERANCE));

        self.surface.push_clip(camera, page);
        for node in canvas.scene.nodes() {
            self.render_node(&layout, node, camera, layout.surface, 1.0);
        }
        self.surface.pop_clip();

        if ctx.show_overlay {
            self.render_overlay(ctx, &layout, camera);
        }
        log::trace!("Built frame for {} root nodes", canvas.scene.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{DrawCommand, RecordingSurface};
    use frameforge_core::shapes::NodeId;
    use frameforge_core::snap::Guide;
    use frameforge_core::units::px;

    fn render(canvas: &Canvas) -> RecordingSurface {
        let ctx = RenderContext::new(canvas, Size::new(800.0, 600.0));
        let mut renderer = SceneRenderer::new(RecordingSurface::new());
        renderer.build_scene(&ctx);
        renderer.into_surface()
    }

    fn canvas_with(nodes: Vec<Node>) -> Canvas {
        let mut canvas = Canvas::new();
        for node in nodes {
            canvas.add_node(node, None);
        }
        canvas
    }

    fn fills(surface: &RecordingSurface) -> Vec<(Affine, Color, Rect)> {
        surface
            .commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Fill {
                    transform,
                    color,
                    path,
                } => Some((*transform, *color, path.bounding_box())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_empty_canvas_draws_page_only() {
        let surface = render(&Canvas::new());
        assert_eq!(surface.len(), 3);
        assert!(matches!(surface.commands()[0], DrawCommand::Fill { .. }));
        assert!(matches!(surface.commands()[1], DrawCommand::PushClip { .. }));
        assert!(matches!(surface.commands()[2], DrawCommand::PopClip));
    }

    #[test]
    fn test_hidden_nodes_are_skipped() {
        let mut node = Node::new(NodeKind::Rectangle, 10.0, 10.0, px(50.0), px(50.0));
        node.styles.display = "none".into();
        let surface = render(&canvas_with(vec![node]));
        assert_eq!(surface.len(), 3);
    }

    #[test]
    fn test_rectangle_fill_and_border() {
        let node = Node::new(NodeKind::Rectangle, 10.0, 20.0, px(100.0), px(50.0));
        let surface = render(&canvas_with(vec![node]));
        let fills = fills(&surface);
        assert_eq!(fills.len(), 2);
        let (transform, color, bbox) = fills[1];
        assert_eq!(color.to_rgba8().r, 0xaa);
        assert_eq!(bbox, Rect::new(0.0, 0.0, 100.0, 50.0));
        assert_eq!(transform * Point::ZERO, Point::new(10.0, 20.0));
        assert!(
            surface
                .commands()
                .iter()
                .any(|c| matches!(c, DrawCommand::Stroke { .. }))
        );
    }

    #[test]
    fn test_rotation_turns_about_node_center() {
        let mut node = Node::new(NodeKind::Rectangle, 10.0, 20.0, px(100.0), px(50.0));
        node.set_rotation(90.0);
        let surface = render(&canvas_with(vec![node]));
        let (transform, _, _) = fills(&surface)[1];
        let corner = transform * Point::ZERO;
        assert!((corner.x - 85.0).abs() < 1e-9);
        assert!((corner.y - -5.0).abs() < 1e-9);
    }

    #[test]
    fn test_opacity_multiplies_down_the_tree() {
        let child = Node::new(NodeKind::Rectangle, 0.0, 0.0, px(10.0), px(10.0));
        let mut board = Node::new(NodeKind::Board, 0.0, 0.0, px(100.0), px(100.0))
            .with_children(vec![child]);
        board.styles.opacity = 0.5.into();
        board.children[0].styles.opacity = 0.5.into();
        let surface = render(&canvas_with(vec![board]));
        let fills = fills(&surface);
        assert!((fills[1].1.components[3] - 0.5).abs() < 1e-6);
        assert!((fills[2].1.components[3] - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_board_clips_children() {
        let child = Node::new(NodeKind::Rectangle, 5.0, 5.0, px(10.0), px(10.0));
        let board = Node::new(NodeKind::Board, 0.0, 0.0, px(300.0), px(200.0))
            .with_children(vec![child]);
        let surface = render(&canvas_with(vec![board]));
        let clips: Vec<Rect> = surface
            .commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::PushClip { clip, .. } => Some(*clip),
                _ => None,
            })
            .collect();
        assert_eq!(
            clips,
            vec![Rect::new(0.0, 0.0, 800.0, 600.0), Rect::new(0.0, 0.0, 300.0, 200.0)]
        );
        assert_eq!(surface.clip_depth(), 0);
    }

    #[test]
    fn test_group_draws_only_children() {
        let child = Node::new(NodeKind::Rectangle, 0.0, 0.0, px(10.0), px(10.0));
        let group = Node::new(NodeKind::Group, 0.0, 0.0, px(10.0), px(10.0))
            .with_children(vec![child]);
        let surface = render(&canvas_with(vec![group]));
        assert_eq!(fills(&surface).len(), 2);
        assert_eq!(surface.clip_depth(), 0);
    }

    #[test]
    fn test_scroll_container_shifts_children_and_draws_thumb() {
        let rows: Vec<Node> = (0..5)
            .map(|i| Node::new(NodeKind::Rectangle, 0.0, i as f64 * 100.0, px(180.0), px(100.0)))
            .collect();
        let scroll = Node::new(
            NodeKind::Scroll {
                scroll_direction: ScrollDirection::Column,
                scroll_offset: 0.0,
            },
            0.0,
            0.0,
            px(200.0),
            px(200.0),
        )
        .with_children(rows);
        let mut canvas = canvas_with(vec![scroll]);
        let surface = render(&canvas);
        let thumb = fills(&surface)
            .into_iter()
            .find(|(_, color, _)| color.to_rgba8().a == 77)
            .unwrap();
        assert_eq!(thumb.2, Rect::new(190.0, 0.0, 200.0, 80.0));

        let id = canvas.scene.nodes()[0].id.clone();
        let kind = canvas.scene.find_mut(&id).map(|n| &mut n.kind);
        if let Some(NodeKind::Scroll { scroll_offset, .. }) = kind {
            *scroll_offset = 100.0;
        }
        let surface = render(&canvas);
        let fills = fills(&surface);
        let first_row = fills[2];
        assert_eq!(first_row.0 * Point::ZERO, Point::new(0.0, -100.0));
        let thumb = fills.iter().find(|(_, color, _)| color.to_rgba8().a == 77).unwrap();
        assert_eq!(thumb.2, Rect::new(190.0, 40.0, 200.0, 120.0));
    }

    #[test]
    fn test_text_content_is_drawn() {
        let text = Node::new(
            NodeKind::Text {
                text: "Hello".into(),
            },
            0.0,
            0.0,
            px(200.0),
            px(40.0),
        );
        let table = Node::new(
            NodeKind::Table {
                table_data: vec![vec!["a".into(), "b".into()], vec!["c".into(), "d".into()]],
            },
            0.0,
            100.0,
            px(200.0),
            px(100.0),
        );
        let selector = Node::new(
            NodeKind::Selector {
                options: vec!["One".into(), "Two".into()],
                selected_option: 1,
            },
            0.0,
            300.0,
            px(150.0),
            px(30.0),
        );
        let surface = render(&canvas_with(vec![text, table, selector]));
        assert_eq!(surface.texts(), vec!["Hello", "a", "b", "c", "d", "Two"]);
    }

    #[test]
    fn test_checkbox_mark_follows_state() {
        let strokes = |checked: bool| {
            let node = Node::new(NodeKind::Checkbox { checked }, 0.0, 0.0, px(20.0), px(20.0));
            render(&canvas_with(vec![node]))
                .commands()
                .iter()
                .filter(|c| matches!(c, DrawCommand::Stroke { .. }))
                .count()
        };
        assert_eq!(strokes(true), strokes(false) + 1);
    }

    #[test]
    fn test_invalid_path_is_skipped() {
        let path = |d: &str| Node::new(NodeKind::Path { d: d.into() }, 0.0, 0.0, px(0.0), px(0.0));
        let surface = render(&canvas_with(vec![path("M 0 0 L 10 10"), path("not a path")]));
        let strokes = surface
            .commands()
            .iter()
            .filter(|c| matches!(c, DrawCommand::Stroke { .. }))
            .count();
        assert_eq!(strokes, 1);
    }

    #[test]
    fn test_selection_overlay() {
        let node = Node::new(NodeKind::Rectangle, 10.0, 10.0, px(100.0), px(100.0)).with_id("n");
        let mut canvas = canvas_with(vec![node]);
        canvas.config.background_color = "#eeeeee".into();
        canvas.select(NodeId::from("n"));

        let white = |surface: &RecordingSurface| {
            fills(surface)
                .iter()
                .filter(|(_, color, _)| {
                    let c = color.to_rgba8();
                    (c.r, c.g, c.b, c.a) == (255, 255, 255, 255)
                })
                .count()
        };
        assert_eq!(white(&render(&canvas)), 9);

        canvas.config.show_overlay = false;
        assert_eq!(white(&render(&canvas)), 0);
    }

    #[test]
    fn test_guides_span_visible_area() {
        let mut canvas = Canvas::new();
        canvas.guides = vec![Guide::vertical(100.0), Guide::horizontal(50.0)];
        let surface = render(&canvas);
        let guides: Vec<Rect> = surface
            .commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Stroke { color, path, .. } if color.to_rgba8().a == 180 => {
                    Some(path.bounding_box())
                }
                _ => None,
            })
            .collect();
        assert_eq!(
            guides,
            vec![Rect::new(100.0, 0.0, 100.0, 600.0), Rect::new(0.0, 50.0, 800.0, 50.0)]
        );
    }
}
