//! FrameForge Render Library
//!
//! Turns a [`frameforge_core::Canvas`] into draw calls on a [`Surface`].
//! Hosts plug in their own rasterizer by implementing [`Surface`];
//! [`RecordingSurface`] keeps the calls as a command list.

mod dispatch;
pub mod paint;
mod recording;
mod renderer;

pub use dispatch::SceneRenderer;
pub use paint::{Border, border, css_color, css_length, line_paint, parse_css_color};
pub use recording::{DrawCommand, RecordingSurface};
pub use renderer::{
    RenderContext, RenderResult, Renderer, RendererError, Surface, TextAlign, TextRun,
};
