//! View transform between the host's screen and scene coordinates.
//!
//! Panning and zooming never touch node coordinates.

use kurbo::{Affine, Point, Vec2};
use serde::{Deserialize, Serialize};

pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 5.0;

/// Factor of one wheel step towards the scene.
pub const WHEEL_ZOOM_IN: f64 = 1.1;
/// Factor of one wheel step away from the scene.
pub const WHEEL_ZOOM_OUT: f64 = 0.9;

/// Screen position of the scene origin plus a uniform scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// Screen-space position of the scene origin.
    pub offset: Vec2,
    pub zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scene to screen.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset).pre_scale(self.zoom)
    }

    /// Screen to scene.
    pub fn inverse_transform(&self) -> Affine {
        self.transform().inverse()
    }

    pub fn screen_to_world(&self, screen: Point) -> Point {
        Point::new(
            (screen.x - self.offset.x) / self.zoom,
            (screen.y - self.offset.y) / self.zoom,
        )
    }

    pub fn world_to_screen(&self, world: Point) -> Point {
        Point::new(
            world.x * self.zoom + self.offset.x,
            world.y * self.zoom + self.offset.y,
        )
    }

    /// Move the view by a screen-space delta.
    pub fn pan(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    /// Multiply the zoom by `factor`, clamped to [`MIN_ZOOM`]..[`MAX_ZOOM`],
    /// keeping the scene point under `anchor` in place.
    pub fn zoom_at(&mut self, anchor: Point, factor: f64) {
        let zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        if zoom == self.zoom {
            return;
        }
        let world = self.screen_to_world(anchor);
        self.zoom = zoom;
        self.offset = anchor.to_vec2() - world.to_vec2() * zoom;
    }

    /// Apply one wheel step at `anchor`. Scrolling down zooms out.
    pub fn wheel_zoom(&mut self, anchor: Point, delta_y: f64) {
        let factor = if delta_y > 0.0 { WHEEL_ZOOM_OUT } else { WHEEL_ZOOM_IN };
        self.zoom_at(anchor, factor);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Point, b: Point) -> bool {
        (a - b).hypot() < 1e-9
    }

    #[test]
    fn test_identity_by_default() {
        let camera = Camera::new();
        let p = Point::new(12.0, -4.0);
        assert_eq!(camera.screen_to_world(p), p);
        assert_eq!(camera.transform(), Affine::IDENTITY);
    }

    #[test]
    fn test_mapping_with_offset_and_zoom() {
        let camera = Camera {
            offset: Vec2::new(50.0, 100.0),
            zoom: 2.0,
        };
        let world = camera.screen_to_world(Point::new(150.0, 300.0));
        assert_eq!(world, Point::new(50.0, 100.0));
        assert!(close(camera.transform() * world, Point::new(150.0, 300.0)));
        assert!(close(camera.inverse_transform() * Point::new(150.0, 300.0), world));
        assert_eq!(camera.world_to_screen(world), Point::new(150.0, 300.0));
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut camera = Camera::new();
        camera.zoom_at(Point::ZERO, 0.001);
        assert_eq!(camera.zoom, MIN_ZOOM);
        camera.zoom_at(Point::ZERO, 1000.0);
        assert_eq!(camera.zoom, MAX_ZOOM);
    }

    #[test]
    fn test_wheel_zoom_keeps_anchor() {
        let mut camera = Camera::new();
        let anchor = Point::new(200.0, 150.0);
        let before = camera.screen_to_world(anchor);
        camera.wheel_zoom(anchor, -1.0);
        assert!((camera.zoom - 1.1).abs() < 1e-12);
        assert!(close(camera.screen_to_world(anchor), before));

        camera.wheel_zoom(anchor, 3.0);
        assert!((camera.zoom - 0.99).abs() < 1e-12);
        assert!(close(camera.screen_to_world(anchor), before));
    }

    #[test]
    fn test_pan_then_reset() {
        let mut camera = Camera::new();
        camera.pan(Vec2::new(10.0, 20.0));
        assert_eq!(camera.offset, Vec2::new(10.0, 20.0));
        camera.zoom = 3.0;
        camera.reset();
        assert_eq!(camera, Camera::default());
    }
}
