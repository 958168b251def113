//! Canvas-space geometry shared by hit testing, resizing, and the viewport.
//!
//! All coordinates are canvas units (`f32`). Screen space only exists at
//! the `Viewport` boundary.

use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in canvas space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Normalize a box spanned by two arbitrary corners.
    pub fn from_corners(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            x: x1.min(x2),
            y: y1.min(y2),
            width: (x2 - x1).abs(),
            height: (y2 - y1).abs(),
        }
    }

    /// Bounding box of a flat `[x0, y0, x1, y1, ...]` coordinate list.
    /// Returns `None` for fewer than one full pair.
    pub fn from_points(points: &[f32]) -> Option<Self> {
        if points.len() < 2 {
            return None;
        }
        let mut min_x = f32::INFINITY;
        let mut min_y = f32::INFINITY;
        let mut max_x = f32::NEG_INFINITY;
        let mut max_y = f32::NEG_INFINITY;
        for pair in points.chunks_exact(2) {
            min_x = min_x.min(pair[0]);
            min_y = min_y.min(pair[1]);
            max_x = max_x.max(pair[0]);
            max_y = max_y.max(pair[1]);
        }
        Some(Self::from_corners(min_x, min_y, max_x, max_y))
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Inclusive containment: points on the edge are inside.
    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px <= self.right() && py >= self.y && py <= self.bottom()
    }

    /// Inclusive overlap test; touching edges count as intersecting.
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.x <= other.right()
            && other.x <= self.right()
            && self.y <= other.bottom()
            && other.y <= self.bottom()
    }

    /// Grow the box by `pad` on every side.
    pub fn expand(&self, pad: f32) -> Self {
        Self {
            x: self.x - pad,
            y: self.y - pad,
            width: self.width + pad * 2.0,
            height: self.height + pad * 2.0,
        }
    }
}

/// Euclidean distance from `(px, py)` to the segment `a`–`b`.
///
/// Projects the point onto the segment, clamps the projection parameter to
/// `[0, 1]`, and measures to the clamped point. Degenerate segments fall
/// back to point distance.
pub fn distance_to_segment(px: f32, py: f32, ax: f32, ay: f32, bx: f32, by: f32) -> f32 {
    let dx = bx - ax;
    let dy = by - ay;
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return ((px - ax).powi(2) + (py - ay).powi(2)).sqrt();
    }
    let t = (((px - ax) * dx + (py - ay) * dy) / len_sq).clamp(0.0, 1.0);
    let cx = ax + t * dx;
    let cy = ay + t * dy;
    ((px - cx).powi(2) + (py - cy).powi(2)).sqrt()
}

/// Minimum distance from a point to a polyline given as flat coordinates.
/// A single-point polyline measures to that point; empty lists are infinitely far.
pub fn distance_to_polyline(px: f32, py: f32, points: &[f32]) -> f32 {
    match points.len() {
        0 | 1 => f32::INFINITY,
        2 | 3 => distance_to_segment(px, py, points[0], points[1], points[0], points[1]),
        _ => points
            .windows(4)
            .step_by(2)
            .map(|w| distance_to_segment(px, py, w[0], w[1], w[2], w[3]))
            .fold(f32::INFINITY, f32::min),
    }
}

// ─── Viewport ────────────────────────────────────────────────────────────

/// Pan/zoom state mapping screen pixels to canvas units.
///
/// `screen = canvas * scale + offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scale: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Viewport {
    pub const IDENTITY: Viewport = Viewport {
        scale: 1.0,
        offset_x: 0.0,
        offset_y: 0.0,
    };

    pub fn screen_to_canvas(&self, sx: f32, sy: f32) -> (f32, f32) {
        (
            (sx - self.offset_x) / self.scale,
            (sy - self.offset_y) / self.scale,
        )
    }

    pub fn canvas_to_screen(&self, cx: f32, cy: f32) -> (f32, f32) {
        (
            cx * self.scale + self.offset_x,
            cy * self.scale + self.offset_y,
        )
    }

    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.offset_x += dx;
        self.offset_y += dy;
    }

    /// Zoom by `factor` keeping the canvas point under `(sx, sy)` fixed.
    /// The resulting scale is clamped to `[min_scale, max_scale]`. A factor
    /// that is not a positive finite number leaves the viewport unchanged.
    pub fn zoom_at(&mut self, sx: f32, sy: f32, factor: f32, min_scale: f32, max_scale: f32) {
        if !(factor.is_finite() && factor > 0.0) {
            log::debug!("zoom_at: rejected factor {factor}");
            return;
        }
        let (cx, cy) = self.screen_to_canvas(sx, sy);
        self.scale = (self.scale * factor).clamp(min_scale, max_scale);
        self.offset_x = sx - cx * self.scale;
        self.offset_y = sy - cy * self.scale;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_contains_is_inclusive() {
        let b = Bounds::new(0.0, 0.0, 10.0, 10.0);
        assert!(b.contains(0.0, 0.0));
        assert!(b.contains(10.0, 10.0));
        assert!(b.contains(10.0, 5.0));
        assert!(!b.contains(11.0, 5.0));
        assert!(!b.contains(5.0, -1.0));
    }

    #[test]
    fn bounds_from_corners_normalizes() {
        let b = Bounds::from_corners(20.0, 30.0, 5.0, 10.0);
        assert_eq!(b, Bounds::new(5.0, 10.0, 15.0, 20.0));
    }

    #[test]
    fn bounds_from_points() {
        let b = Bounds::from_points(&[10.0, 10.0, 20.0, 5.0, 15.0, 30.0]).unwrap();
        assert_eq!(b, Bounds::new(10.0, 5.0, 10.0, 25.0));
        assert!(Bounds::from_points(&[1.0]).is_none());
    }

    #[test]
    fn intersects_touching_edges() {
        let a = Bounds::new(0.0, 0.0, 10.0, 10.0);
        assert!(a.intersects(&Bounds::new(10.0, 10.0, 5.0, 5.0)));
        assert!(!a.intersects(&Bounds::new(10.5, 0.0, 5.0, 5.0)));
    }

    #[test]
    fn segment_distance_clamps_to_endpoints() {
        // Perpendicular foot inside the segment
        assert_eq!(distance_to_segment(5.0, 3.0, 0.0, 0.0, 10.0, 0.0), 3.0);
        // Beyond the end: measured to the endpoint
        assert_eq!(distance_to_segment(13.0, 4.0, 0.0, 0.0, 10.0, 0.0), 5.0);
        // Degenerate segment
        assert_eq!(distance_to_segment(3.0, 4.0, 0.0, 0.0, 0.0, 0.0), 5.0);
    }

    #[test]
    fn polyline_distance_takes_minimum() {
        let pts = [0.0, 0.0, 10.0, 0.0, 10.0, 10.0];
        assert_eq!(distance_to_polyline(12.0, 5.0, &pts), 2.0);
        assert_eq!(distance_to_polyline(3.0, 4.0, &[0.0, 0.0]), 5.0);
        assert!(distance_to_polyline(0.0, 0.0, &[]).is_infinite());
    }

    #[test]
    fn viewport_roundtrip_and_zoom_anchor() {
        let mut vp = Viewport {
            scale: 2.0,
            offset_x: 100.0,
            offset_y: 50.0,
        };
        assert_eq!(vp.screen_to_canvas(300.0, 250.0), (100.0, 100.0));
        assert_eq!(vp.canvas_to_screen(100.0, 100.0), (300.0, 250.0));

        // The canvas point under the cursor stays put while zooming
        let before = vp.screen_to_canvas(300.0, 250.0);
        vp.zoom_at(300.0, 250.0, 2.0, 0.1, 10.0);
        assert_eq!(vp.scale, 4.0);
        assert_eq!(vp.screen_to_canvas(300.0, 250.0), before);

        vp.zoom_at(0.0, 0.0, 100.0, 0.1, 10.0);
        assert_eq!(vp.scale, 10.0);
    }

    #[test]
    fn zoom_ignores_non_finite_factor() {
        let mut vp = Viewport::IDENTITY;
        vp.zoom_at(10.0, 10.0, f32::NAN, 0.1, 10.0);
        vp.zoom_at(10.0, 10.0, f32::INFINITY, 0.1, 10.0);
        vp.zoom_at(10.0, 10.0, 0.0, 0.1, 10.0);
        assert_eq!(vp, Viewport::IDENTITY);
    }
}
