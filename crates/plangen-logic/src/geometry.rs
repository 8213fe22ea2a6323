//! Axis-aligned rectangle primitives for floor plans.
//!
//! All layout geometry is expressed in feet with the origin at the top-left
//! corner of a floor plate, x growing right and y growing down. Rectangles are
//! half-open in spirit: two rooms that share an edge touch but do not overlap.

use serde::{Deserialize, Serialize};

/// Float noise allowance for coordinate comparisons, in feet.
///
/// Split edges are computed by subtraction, so `a.x + a.width` and the next
/// room's `x` can differ in the last bit.
pub const EPSILON: f64 = 1e-6;

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// True if `other` lies entirely inside `self` (edges may coincide).
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x - EPSILON
            && other.y >= self.y - EPSILON
            && other.right() <= self.right() + EPSILON
            && other.bottom() <= self.bottom() + EPSILON
    }

    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.x - EPSILON
            && x <= self.right() + EPSILON
            && y >= self.y - EPSILON
            && y <= self.bottom() + EPSILON
    }

    /// Positive-area intersection test. Touching edges do not overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right() - EPSILON
            && other.x < self.right() - EPSILON
            && self.y < other.bottom() - EPSILON
            && other.y < self.bottom() - EPSILON
    }

    /// Intersection rectangle, or `None` when the overlap has no area.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        if !self.overlaps(other) {
            return None;
        }
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        Some(Rect::new(x, y, right - x, bottom - y))
    }

    /// Length of the shared x-extent of two rectangles (0 when disjoint).
    pub fn x_overlap(&self, other: &Rect) -> f64 {
        (self.right().min(other.right()) - self.x.max(other.x)).max(0.0)
    }

    /// Smallest rectangle covering every input, or `None` for an empty input.
    pub fn bounding<'a>(rects: impl IntoIterator<Item = &'a Rect>) -> Option<Rect> {
        let mut iter = rects.into_iter();
        let first = *iter.next()?;
        let (mut min_x, mut min_y) = (first.x, first.y);
        let (mut max_x, mut max_y) = (first.right(), first.bottom());
        for r in iter {
            min_x = min_x.min(r.x);
            min_y = min_y.min(r.y);
            max_x = max_x.max(r.right());
            max_y = max_y.max(r.bottom());
        }
        Some(Rect::new(min_x, min_y, max_x - min_x, max_y - min_y))
    }
}

/// Uniform scale followed by a translation: `p' = p × scale + offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform2 {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Transform2 {
    pub fn new(scale: f64, offset_x: f64, offset_y: f64) -> Self {
        Self {
            scale,
            offset_x,
            offset_y,
        }
    }

    pub fn point(&self, x: f64, y: f64) -> (f64, f64) {
        (x * self.scale + self.offset_x, y * self.scale + self.offset_y)
    }

    pub fn length(&self, len: f64) -> f64 {
        len * self.scale
    }

    pub fn rect(&self, r: &Rect) -> Rect {
        let (x, y) = self.point(r.x, r.y);
        Rect::new(x, y, r.width * self.scale, r.height * self.scale)
    }
}

/// Round to one decimal place (tenths of a foot).
pub fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Approximate equality within [`EPSILON`].
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= EPSILON
}
