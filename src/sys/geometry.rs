use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self { Self { x, y } }

    /// Component-wise multiplication.
    pub fn scaled(self, scale: Scale) -> Point { Point::new(self.x * scale.x, self.y * scale.y) }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point { Point::new(self.x + rhs.x, self.y + rhs.y) }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point { Point::new(self.x - rhs.x, self.y - rhs.y) }
}

impl Neg for Point {
    type Output = Point;

    fn neg(self) -> Point { Point::new(-self.x, -self.y) }
}

impl Mul<f64> for Point {
    type Output = Point;

    fn mul(self, rhs: f64) -> Point { Point::new(self.x * rhs, self.y * rhs) }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const ZERO: Size = Size { width: 0.0, height: 0.0 };

    pub const fn new(width: f64, height: f64) -> Self { Self { width, height } }

    pub fn is_empty(&self) -> bool { self.width <= 0.0 || self.height <= 0.0 }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub const fn new(origin: Point, size: Size) -> Self { Self { origin, size } }

    pub const fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(Point::new(x, y), Size::new(width, height))
    }

    pub fn min(&self) -> Point { self.origin }

    pub fn max(&self) -> Point {
        Point::new(self.origin.x + self.size.width, self.origin.y + self.size.height)
    }

    pub fn mid(&self) -> Point {
        Point::new(
            self.origin.x + self.size.width / 2.0,
            self.origin.y + self.size.height / 2.0,
        )
    }

    pub fn contains(&self, point: Point) -> bool {
        let max = self.max();
        point.x >= self.origin.x && point.x < max.x && point.y >= self.origin.y && point.y < max.y
    }

    /// True when the interiors overlap; rects that only share an edge do not.
    pub fn intersects(&self, other: &Rect) -> bool {
        let (a, b) = (self.max(), other.max());
        self.origin.x < b.x && other.origin.x < a.x && self.origin.y < b.y && other.origin.y < a.y
    }
}

/// Per-axis scale factor.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    pub x: f64,
    pub y: f64,
}

impl Default for Scale {
    fn default() -> Self { Scale::ONE }
}

impl Scale {
    pub const ONE: Scale = Scale { x: 1.0, y: 1.0 };

    pub const fn new(x: f64, y: f64) -> Self { Self { x, y } }

    pub const fn uniform(k: f64) -> Self { Self { x: k, y: k } }

    pub fn recip(self) -> Scale { Scale::new(1.0 / self.x, 1.0 / self.y) }

    pub fn compose(self, inner: Scale) -> Scale { Scale::new(self.x * inner.x, self.y * inner.y) }
}

pub trait Round {
    fn round(&self) -> Self;
}

impl Round for Point {
    fn round(&self) -> Self { Point::new(self.x.round(), self.y.round()) }
}

impl Round for Rect {
    fn round(&self) -> Self {
        let min = self.min().round();
        let max = self.max().round();
        Rect::from_xywh(min.x, min.y, max.x - min.x, max.y - min.y)
    }
}

/// Approximate equality for geometry that went through float arithmetic.
pub trait SameAs {
    fn same_as(&self, other: Self) -> bool;
}

const SAME_AS_EPSILON: f64 = 1e-6;

impl SameAs for f64 {
    fn same_as(&self, other: Self) -> bool { (self - other).abs() < SAME_AS_EPSILON }
}

impl SameAs for Point {
    fn same_as(&self, other: Self) -> bool { self.x.same_as(other.x) && self.y.same_as(other.y) }
}

impl SameAs for Scale {
    fn same_as(&self, other: Self) -> bool { self.x.same_as(other.x) && self.y.same_as(other.y) }
}

impl SameAs for Rect {
    fn same_as(&self, other: Self) -> bool {
        self.origin.same_as(other.origin)
            && self.size.width.same_as(other.size.width)
            && self.size.height.same_as(other.size.height)
    }
}
