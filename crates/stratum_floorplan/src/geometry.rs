//! Integer geometry primitives: points and axis-aligned rectangles.
//!
//! All coordinates are integer database units so that decode and encode are
//! exact inverses. Rectangles are half-open in both axes: two rectangles that
//! only share an edge do not overlap.

use serde::{Deserialize, Serialize};

/// A coordinate in database units.
pub type Coord = i64;

/// A horizontal or vertical axis.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// The x axis.
    X,
    /// The y axis.
    Y,
}

/// A point in the die plane.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: Coord,
    /// Vertical coordinate.
    pub y: Coord,
}

impl Point {
    /// Creates a point.
    pub fn new(x: Coord, y: Coord) -> Self {
        Self { x, y }
    }

    /// Returns the coordinate along `axis`.
    pub fn along(self, axis: Axis) -> Coord {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }
}

/// An axis-aligned rectangle given by its lower-left and upper-right corners.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Lower-left corner.
    pub ll: Point,
    /// Upper-right corner.
    pub ur: Point,
}

impl Rect {
    /// Creates a rectangle from its lower-left corner and its size.
    pub fn new(x: Coord, y: Coord, width: Coord, height: Coord) -> Self {
        Self {
            ll: Point::new(x, y),
            ur: Point::new(x + width, y + height),
        }
    }

    /// Creates a rectangle from two corners.
    pub fn from_corners(ll: Point, ur: Point) -> Self {
        Self { ll, ur }
    }

    /// Returns the horizontal extent.
    pub fn width(&self) -> Coord {
        self.ur.x - self.ll.x
    }

    /// Returns the vertical extent.
    pub fn height(&self) -> Coord {
        self.ur.y - self.ll.y
    }

    /// Returns the extent along `axis`.
    pub fn extent(&self, axis: Axis) -> Coord {
        match axis {
            Axis::X => self.width(),
            Axis::Y => self.height(),
        }
    }

    /// Returns the area as a float, which cannot overflow for large outlines.
    pub fn area(&self) -> f64 {
        self.width() as f64 * self.height() as f64
    }

    /// Returns width divided by height.
    pub fn aspect_ratio(&self) -> f64 {
        self.width() as f64 / self.height() as f64
    }

    /// Returns the half-perimeter (width plus height).
    pub fn half_perimeter(&self) -> Coord {
        self.width() + self.height()
    }

    /// Returns the centre point as floats.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.ll.x + self.ur.x) as f64 / 2.0,
            (self.ll.y + self.ur.y) as f64 / 2.0,
        )
    }

    /// Returns the centre coordinate along `axis`.
    pub fn center_along(&self, axis: Axis) -> f64 {
        let (x, y) = self.center();
        match axis {
            Axis::X => x,
            Axis::Y => y,
        }
    }

    /// Returns `true` if the x-intervals share a positive-length stretch.
    pub fn overlaps_x(&self, other: &Rect) -> bool {
        self.ll.x < other.ur.x && other.ll.x < self.ur.x
    }

    /// Returns `true` if the y-intervals share a positive-length stretch.
    pub fn overlaps_y(&self, other: &Rect) -> bool {
        self.ll.y < other.ur.y && other.ll.y < self.ur.y
    }

    /// Returns `true` if the two rectangles share a positive-area region.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.overlaps_x(other) && self.overlaps_y(other)
    }

    /// Returns `true` if `self` lies entirely to the left of `other`.
    pub fn is_left_of(&self, other: &Rect) -> bool {
        self.ur.x <= other.ll.x
    }

    /// Returns `true` if `self` lies entirely below `other`.
    pub fn is_below(&self, other: &Rect) -> bool {
        self.ur.y <= other.ll.y
    }

    /// Returns the shared region, or `None` if there is no positive-area overlap.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        if !self.overlaps(other) {
            return None;
        }
        Some(Rect::from_corners(
            Point::new(self.ll.x.max(other.ll.x), self.ll.y.max(other.ll.y)),
            Point::new(self.ur.x.min(other.ur.x), self.ur.y.min(other.ur.y)),
        ))
    }

    /// Returns the signed overlap along `axis`: positive when the projections
    /// intersect, negative (minus the gap) when they are disjoint.
    pub fn overlap_along(&self, other: &Rect, axis: Axis) -> Coord {
        let lo = self.ll.along(axis).max(other.ll.along(axis));
        let hi = self.ur.along(axis).min(other.ur.along(axis));
        hi - lo
    }

    /// Returns the smallest rectangle containing both.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect::from_corners(
            Point::new(self.ll.x.min(other.ll.x), self.ll.y.min(other.ll.y)),
            Point::new(self.ur.x.max(other.ur.x), self.ur.y.max(other.ur.y)),
        )
    }

    /// Returns the smallest rectangle containing all of `rects`, or `None` if empty.
    pub fn bounding_box<'a>(rects: impl IntoIterator<Item = &'a Rect>) -> Option<Rect> {
        rects.into_iter().copied().reduce(|acc, r| acc.union(&r))
    }

    /// Returns the rectangle moved by `(dx, dy)`.
    pub fn translate(&self, dx: Coord, dy: Coord) -> Rect {
        Rect::from_corners(
            Point::new(self.ll.x + dx, self.ll.y + dy),
            Point::new(self.ur.x + dx, self.ur.y + dy),
        )
    }

    /// Returns the rectangle rotated by 90 degrees about its lower-left corner,
    /// i.e. with width and height exchanged.
    pub fn rotated(&self) -> Rect {
        Rect::new(self.ll.x, self.ll.y, self.height(), self.width())
    }
}
