//! A surface that records draw commands instead of rasterizing them.
//!
//! Useful for headless hosts that replay commands into their own backend,
//! and for inspecting a frame in tests.

use kurbo::{Affine, BezPath, Rect, Stroke};
use peniko::Color;

use crate::renderer::{Surface, TextRun};

/// One recorded drawing operation.
#[derive(Debug, Clone)]
pub enum DrawCommand {
    Fill {
        transform: Affine,
        color: Color,
        path: BezPath,
    },
    Stroke {
        style: Stroke,
        transform: Affine,
        color: Color,
        path: BezPath,
    },
    Text {
        transform: Affine,
        run: TextRun,
    },
    Image {
        transform: Affine,
        bounds: Rect,
        src: String,
    },
    PushClip {
        transform: Affine,
        clip: Rect,
    },
    PopClip,
}

/// Records every command in order.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    commands: Vec<DrawCommand>,
    clip_depth: usize,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Number of clips currently pushed.
    pub fn clip_depth(&self) -> usize {
        self.clip_depth
    }

    /// Text of every recorded text run, in draw order.
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { run, .. } => Some(run.text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Surface for RecordingSurface {
    fn reset(&mut self) {
        self.commands.clear();
        self.clip_depth = 0;
    }

    fn fill(&mut self, transform: Affine, color: Color, path: &BezPath) {
        self.commands.push(DrawCommand::Fill {
            transform,
            color,
            path: path.clone(),
        });
    }

    fn stroke(&mut self, style: &Stroke, transform: Affine, color: Color, path: &BezPath) {
        self.commands.push(DrawCommand::Stroke {
            style: style.clone(),
            transform,
            color,
            path: path.clone(),
        });
    }

    fn draw_text(&mut self, transform: Affine, run: &TextRun) {
        self.commands.push(DrawCommand::Text {
            transform,
            run: run.clone(),
        });
    }

    fn draw_image(&mut self, transform: Affine, bounds: Rect, src: &str) {
        self.commands.push(DrawCommand::Image {
            transform,
            bounds,
            src: src.to_string(),
        });
    }

    fn push_clip(&mut self, transform: Affine, clip: Rect) {
        self.clip_depth += 1;
        self.commands.push(DrawCommand::PushClip { transform, clip });
    }

    fn pop_clip(&mut self) {
        if self.clip_depth == 0 {
            log::warn!("pop_clip without a matching push_clip");
            return;
        }
        self.clip_depth -= 1;
        self.commands.push(DrawCommand::PopClip);
    }
}
