#![forbid(unsafe_code)]

//! Geometric primitives in pixel space.
//!
//! Coordinates are host pixels (origin at top-left). Rectangles are
//! half-open: the left/top edges are inclusive, right/bottom exclusive.

use serde::{Deserialize, Serialize};

/// A pointer position.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// One of the four borders of a rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

impl Side {
    /// All sides in hit-test order.
    pub const ALL: [Side; 4] = [Side::Top, Side::Right, Side::Bottom, Side::Left];

    /// Returns the opposite side.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Top => Self::Bottom,
            Self::Bottom => Self::Top,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// A rectangle for pane bounds, drop zones, and hit testing.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge (inclusive).
    pub x: f32,
    /// Top edge (inclusive).
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle from origin with given size.
    #[inline]
    #[must_use]
    pub const fn from_size(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// Right edge (exclusive).
    #[inline]
    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge (exclusive).
    #[inline]
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Area in square pixels.
    #[inline]
    #[must_use]
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Check if the rectangle has zero area (or is not a finite rectangle).
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0) || !self.x.is_finite() || !self.y.is_finite()
    }

    /// Check if a point is inside the rectangle.
    #[inline]
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    /// The band of `thickness` pixels along one side, clamped to the rectangle.
    #[must_use]
    pub fn edge_band(&self, side: Side, thickness: f32) -> Rect {
        let thickness = thickness.max(0.0);
        match side {
            Side::Top => Rect::new(self.x, self.y, self.width, thickness.min(self.height)),
            Side::Bottom => {
                let h = thickness.min(self.height);
                Rect::new(self.x, self.bottom() - h, self.width, h)
            }
            Side::Left => Rect::new(self.x, self.y, thickness.min(self.width), self.height),
            Side::Right => {
                let w = thickness.min(self.width);
                Rect::new(self.right() - w, self.y, w, self.height)
            }
        }
    }

    /// Split along the horizontal axis at `first_width` pixels.
    #[must_use]
    pub fn split_columns(&self, first_width: f32) -> (Rect, Rect) {
        let first_width = first_width.clamp(0.0, self.width);
        (
            Rect::new(self.x, self.y, first_width, self.height),
            Rect::new(
                self.x + first_width,
                self.y,
                self.width - first_width,
                self.height,
            ),
        )
    }

    /// Split along the vertical axis at `first_height` pixels.
    #[must_use]
    pub fn split_rows(&self, first_height: f32) -> (Rect, Rect) {
        let first_height = first_height.clamp(0.0, self.height);
        (
            Rect::new(self.x, self.y, self.width, first_height),
            Rect::new(
                self.x,
                self.y + first_height,
                self.width,
                self.height - first_height,
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_is_half_open() {
        let r = Rect::new(10.0, 10.0, 100.0, 50.0);
        assert!(r.contains(Point::new(10.0, 10.0)));
        assert!(r.contains(Point::new(109.9, 59.9)));
        assert!(!r.contains(Point::new(110.0, 20.0)));
        assert!(!r.contains(Point::new(20.0, 60.0)));
        assert!(!r.contains(Point::new(9.9, 20.0)));
    }

    #[test]
    fn edge_bands_hug_each_side() {
        let r = Rect::new(0.0, 0.0, 200.0, 100.0);
        assert_eq!(r.edge_band(Side::Top, 20.0), Rect::new(0.0, 0.0, 200.0, 20.0));
        assert_eq!(r.edge_band(Side::Bottom, 20.0), Rect::new(0.0, 80.0, 200.0, 20.0));
        assert_eq!(r.edge_band(Side::Left, 20.0), Rect::new(0.0, 0.0, 20.0, 100.0));
        assert_eq!(r.edge_band(Side::Right, 20.0), Rect::new(180.0, 0.0, 20.0, 100.0));
    }

    #[test]
    fn edge_band_is_clamped_to_rect() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(r.edge_band(Side::Right, 50.0), r);
    }

    #[test]
    fn empty_rects() {
        assert!(Rect::default().is_empty());
        assert!(Rect::new(0.0, 0.0, f32::NAN, 4.0).is_empty());
        assert!(!Rect::from_size(1.0, 1.0).is_empty());
    }

    #[test]
    fn split_preserves_extent() {
        let r = Rect::new(5.0, 5.0, 100.0, 40.0);
        let (a, b) = r.split_columns(30.0);
        assert_eq!(a.width + b.width, r.width);
        assert_eq!(b.x, 35.0);
        let (top, bottom) = r.split_rows(10.0);
        assert_eq!(top.height + bottom.height, r.height);
        assert_eq!(bottom.y, 15.0);
    }

    #[test]
    fn opposite_side() {
        for side in Side::ALL {
            assert_eq!(side.opposite().opposite(), side);
        }
    }
}
