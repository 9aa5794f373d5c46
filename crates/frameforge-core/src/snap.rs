//! Grid snapping and sibling alignment for dragged nodes.

use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

pub const GRID_SIZE: f64 = 20.0;

/// Distance within which an edge or centre aligns to a sibling.
pub const ALIGN_THRESHOLD: f64 = 5.0;

/// Rotation steps in degrees while rotating with snapping.
pub const ANGLE_SNAP_INCREMENT: f64 = 15.0;

/// Which snapping passes run while a node is dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapMode {
    None,
    Grid,
    /// Sibling alignment only.
    #[default]
    Shapes,
    /// Grid, then siblings.
    All,
}

impl SnapMode {
    pub fn snaps_to_grid(self) -> bool {
        matches!(self, SnapMode::Grid | SnapMode::All)
    }

    pub fn snaps_to_shapes(self) -> bool {
        matches!(self, SnapMode::Shapes | SnapMode::All)
    }
}

/// Round `point` to the nearest multiple of `step` on both axes.
///
/// A non-positive step leaves the point alone.
pub fn snap_to_grid(point: Point, step: f64) -> Point {
    if step <= 0.0 {
        return point;
    }
    let round = |v: f64| (v / step).round() * step;
    Point::new(round(point.x), round(point.y))
}

/// Round an angle in degrees to `step`, normalized into `0..360`.
pub fn snap_angle(degrees: f64, step: f64) -> f64 {
    ((degrees / step).round() * step).rem_euclid(360.0)
}

/// Keep a box of `size` with origin `origin` inside `0..bounds`.
///
/// A box larger than the bounds is pinned to the top-left.
pub fn clamp_to_bounds(origin: Point, size: Size, bounds: Size) -> Point {
    Point::new(
        origin.x.min(bounds.width - size.width).max(0.0),
        origin.y.min(bounds.height - size.height).max(0.0),
    )
}

/// Orientation of an alignment guide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GuideAxis {
    /// A vertical line at a fixed x.
    Vertical,
    /// A horizontal line at a fixed y.
    Horizontal,
}

/// A transient alignment line shown while dragging.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Guide {
    pub axis: GuideAxis,
    pub position: f64,
}

impl Guide {
    pub fn vertical(x: f64) -> Self {
        Self {
            axis: GuideAxis::Vertical,
            position: x,
        }
    }

    pub fn horizontal(y: f64) -> Self {
        Self {
            axis: GuideAxis::Horizontal,
            position: y,
        }
    }

    /// The same guide in a frame translated by `offset`.
    pub fn translate(self, offset: Vec2) -> Self {
        let shift = match self.axis {
            GuideAxis::Vertical => offset.x,
            GuideAxis::Horizontal => offset.y,
        };
        Self {
            axis: self.axis,
            position: self.position + shift,
        }
    }
}

/// Outcome of aligning a box against its siblings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Alignment {
    /// Correction to add to the box origin.
    pub offset: Vec2,
    /// Guides for the axes that aligned.
    pub guides: Vec<Guide>,
}

fn best_match(candidates: [f64; 3], targets: &[f64], threshold: f64) -> Option<(f64, f64)> {
    let mut best: Option<(f64, f64)> = None;
    for &c in &candidates {
        for &t in targets {
            let diff = t - c;
            if diff.abs() < threshold && best.is_none_or(|(d, _)| diff.abs() < d.abs()) {
                best = Some((diff, t));
            }
        }
    }
    best
}

/// Align the left/centre/right and top/middle/bottom lines of `rect` with the
/// same lines of `siblings`, independently per axis.
///
/// All rects share one coordinate frame; guide positions are in that frame.
pub fn align_to_siblings(rect: Rect, siblings: &[Rect], threshold: f64) -> Alignment {
    let xs: Vec<f64> = siblings
        .iter()
        .flat_map(|r| [r.x0, r.center().x, r.x1])
        .collect();
    let ys: Vec<f64> = siblings
        .iter()
        .flat_map(|r| [r.y0, r.center().y, r.y1])
        .collect();

    let mut alignment = Alignment::default();
    if let Some((dx, x)) = best_match([rect.x0, rect.center().x, rect.x1], &xs, threshold) {
        alignment.offset.x = dx;
        alignment.guides.push(Guide::vertical(x));
    }
    if let Some((dy, y)) = best_match([rect.y0, rect.center().y, rect.y1], &ys, threshold) {
        alignment.offset.y = dy;
        alignment.guides.push(Guide::horizontal(y));
    }
    alignment
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_rounds_to_nearest() {
        assert_eq!(snap_to_grid(Point::new(23.0, 47.0), 20.0), Point::new(20.0, 40.0));
        assert_eq!(snap_to_grid(Point::new(31.0, 51.0), 20.0), Point::new(40.0, 60.0));
        assert_eq!(snap_to_grid(Point::new(-9.0, 11.0), 10.0), Point::new(-10.0, 10.0));
    }

    #[test]
    fn test_grid_step_zero_is_identity() {
        let p = Point::new(31.0, 51.0);
        assert_eq!(snap_to_grid(p, 0.0), p);
    }

    #[test]
    fn test_mode_passes() {
        let passes: Vec<_> = [SnapMode::None, SnapMode::Grid, SnapMode::Shapes, SnapMode::All]
            .iter()
            .map(|m| (m.snaps_to_grid(), m.snaps_to_shapes()))
            .collect();
        assert_eq!(passes, vec![(false, false), (true, false), (false, true), (true, true)]);
        assert_eq!(SnapMode::default(), SnapMode::Shapes);
    }

    #[test]
    fn test_angle_wraps() {
        assert_eq!(snap_angle(7.0, 15.0), 0.0);
        assert_eq!(snap_angle(8.0, 15.0), 15.0);
        assert_eq!(snap_angle(-10.0, 15.0), 345.0);
        assert_eq!(snap_angle(359.0, 15.0), 0.0);
        assert_eq!(snap_angle(100.0, 45.0), 90.0);
    }

    #[test]
    fn test_clamp_to_bounds() {
        let bounds = Size::new(800.0, 600.0);
        let size = Size::new(100.0, 100.0);
        assert_eq!(
            clamp_to_bounds(Point::new(-20.0, 550.0), size, bounds),
            Point::new(0.0, 500.0)
        );
        assert_eq!(
            clamp_to_bounds(Point::new(50.0, 50.0), Size::new(900.0, 10.0), bounds),
            Point::new(0.0, 50.0)
        );
    }

    #[test]
    fn test_align_left_edges() {
        let sibling = Rect::new(100.0, 300.0, 200.0, 400.0);
        let moving = Rect::new(103.0, 0.0, 153.0, 50.0);
        let alignment = align_to_siblings(moving, &[sibling], ALIGN_THRESHOLD);
        assert!((alignment.offset.x + 3.0).abs() < f64::EPSILON);
        assert!(alignment.offset.y.abs() < f64::EPSILON);
        assert_eq!(alignment.guides, vec![Guide::vertical(100.0)]);
    }

    #[test]
    fn test_align_centres_both_axes() {
        let sibling = Rect::new(0.0, 0.0, 100.0, 100.0);
        let moving = Rect::new(27.0, 21.0, 77.0, 81.0);
        let alignment = align_to_siblings(moving, &[sibling], ALIGN_THRESHOLD);
        assert!((alignment.offset.x + 2.0).abs() < f64::EPSILON);
        assert!((alignment.offset.y + 1.0).abs() < f64::EPSILON);
        assert_eq!(alignment.guides.len(), 2);
        assert_eq!(alignment.guides[1], Guide::horizontal(50.0));
    }

    #[test]
    fn test_no_alignment_outside_threshold() {
        let sibling = Rect::new(0.0, 0.0, 100.0, 100.0);
        let moving = Rect::new(130.0, 230.0, 170.0, 270.0);
        let alignment = align_to_siblings(moving, &[sibling], ALIGN_THRESHOLD);
        assert_eq!(alignment, Alignment::default());
    }

    #[test]
    fn test_guide_translate() {
        let guide = Guide::vertical(10.0).translate(Vec2::new(5.0, 100.0));
        assert_eq!(guide, Guide::vertical(15.0));
    }
}
