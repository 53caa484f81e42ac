//! Math type re-exports and screen-space geometry helpers.
//!
//! Layer geometry is 2D: rectangles in display coordinates and affine
//! transforms built from the compositor's `dsdx/dtdx/dsdy/dtdy` matrix.

pub use glam::{Affine2, Mat2, Vec2};

use std::fmt;

/// Axis-aligned rectangle in screen coordinates (left/top inclusive).
#[derive(Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    /// Empty rectangle at the origin.
    pub const EMPTY: Self = Self { left: 0.0, top: 0.0, right: 0.0, bottom: 0.0 };

    /// Create a rectangle from its edges.
    #[inline]
    pub const fn from_ltrb(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self { left, top, right, bottom }
    }

    /// Create a rectangle from origin and size.
    #[inline]
    pub fn from_xywh(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { left: x, top: y, right: x + w, bottom: y + h }
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    /// True when the rectangle covers no area.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    /// True when `other` lies entirely inside this rectangle.
    pub fn contains_rect(&self, other: &Self) -> bool {
        !self.is_empty()
            && self.left <= other.left
            && self.top <= other.top
            && self.right >= other.right
            && self.bottom >= other.bottom
    }

    /// True when the two rectangles share some area.
    pub fn intersects(&self, other: &Self) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.left < other.right
            && other.left < self.right
            && self.top < other.bottom
            && other.top < self.bottom
    }

    /// Bounding rectangle of this rectangle mapped through `transform`.
    pub fn transformed(&self, transform: &Affine2) -> Self {
        let corners = [
            Vec2::new(self.left, self.top),
            Vec2::new(self.right, self.top),
            Vec2::new(self.left, self.bottom),
            Vec2::new(self.right, self.bottom),
        ];
        let mut min = Vec2::splat(f32::INFINITY);
        let mut max = Vec2::splat(f32::NEG_INFINITY);
        for corner in corners {
            let p = transform.transform_point2(corner);
            min = min.min(p);
            max = max.max(p);
        }
        Self::from_ltrb(min.x, min.y, max.x, max.y)
    }
}

impl fmt::Debug for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rect(({}, {}) - ({}, {}))", self.left, self.top, self.right, self.bottom)
    }
}

/// Build an affine transform from the compositor matrix layout.
///
/// The wire format stores the 2x2 part as `dsdx, dtdx, dsdy, dtdy`
/// and the translation separately (layer position).
pub fn affine_from_matrix(dsdx: f32, dtdx: f32, dsdy: f32, dtdy: f32, tx: f32, ty: f32) -> Affine2 {
    Affine2::from_mat2_translation(
        Mat2::from_cols(Vec2::new(dsdx, dtdx), Vec2::new(dsdy, dtdy)),
        Vec2::new(tx, ty),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_contains_and_intersects() {
        let outer = Rect::from_ltrb(0.0, 0.0, 100.0, 100.0);
        let inner = Rect::from_ltrb(10.0, 10.0, 50.0, 50.0);
        let apart = Rect::from_ltrb(200.0, 200.0, 300.0, 300.0);

        assert!(outer.contains_rect(&inner));
        assert!(!inner.contains_rect(&outer));
        assert!(outer.intersects(&inner));
        assert!(!outer.intersects(&apart));
        assert!(Rect::EMPTY.is_empty());
    }

    #[test]
    fn test_rect_transformed() {
        let r = Rect::from_xywh(0.0, 0.0, 10.0, 20.0);
        let t = affine_from_matrix(2.0, 0.0, 0.0, 2.0, 5.0, 5.0);
        let out = r.transformed(&t);
        assert_eq!(out, Rect::from_ltrb(5.0, 5.0, 25.0, 45.0));
    }
}
