//! Geometric primitives: Point, Size, Rect, EdgeInsets

use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

/// A 2D point or vector. The coordinate space (screen pixels or content
/// pixels) is implied by the field that stores it.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    /// Euclidean length when the point is used as a vector.
    pub fn length(&self) -> f32 {
        self.x.hypot(self.y)
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Point {
    fn add_assign(&mut self, rhs: Point) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Point {
    fn sub_assign(&mut self, rhs: Point) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Neg for Point {
    type Output = Point;

    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

impl Mul<f32> for Point {
    type Output = Point;

    fn mul(self, rhs: f32) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f32> for Point {
    type Output = Point;

    fn div(self, rhs: f32) -> Point {
        Point::new(self.x / rhs, self.y / rhs)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub const ZERO: Size = Size {
        width: 0.0,
        height: 0.0,
    };

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

impl Mul<f32> for Size {
    type Output = Size;

    fn mul(self, rhs: f32) -> Size {
        Size::new(self.width * rhs, self.height * rhs)
    }
}

impl Div<f32> for Size {
    type Output = Size;

    fn div(self, rhs: f32) -> Size {
        Size::new(self.width / rhs, self.height / rhs)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_origin_size(origin: Point, size: Size) -> Self {
        Self {
            x: origin.x,
            y: origin.y,
            width: size.width,
            height: size.height,
        }
    }

    pub fn from_size(size: Size) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: size.width,
            height: size.height,
        }
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn x_most(&self) -> f32 {
        self.x + self.width
    }

    pub fn y_most(&self) -> f32 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }

    pub fn translate(&self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            width: self.width,
            height: self.height,
        }
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && y >= self.y && x <= self.x + self.width && y <= self.y + self.height
    }

    /// True when `other` lies entirely inside this rect. Empty rects are
    /// contained by everything.
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.is_empty()
            || (other.x >= self.x
                && other.y >= self.y
                && other.x_most() <= self.x_most()
                && other.y_most() <= self.y_most())
    }

    /// Overlapping region, or an empty rect at the origin when disjoint.
    pub fn intersect(&self, other: &Rect) -> Rect {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let x_most = self.x_most().min(other.x_most());
        let y_most = self.y_most().min(other.y_most());
        if x_most <= x || y_most <= y {
            return Rect::default();
        }
        Rect::new(x, y, x_most - x, y_most - y)
    }

    /// Moves this rect so it lies inside `bounds`, shrinking it along any
    /// axis where it is larger than `bounds`.
    pub fn force_inside(&self, bounds: &Rect) -> Rect {
        let width = self.width.min(bounds.width);
        let height = self.height.min(bounds.height);
        let x = self.x.max(bounds.x).min(bounds.x_most() - width);
        let y = self.y.max(bounds.y).min(bounds.y_most() - height);
        Rect::new(x, y, width, height)
    }
}

impl Add<Point> for Rect {
    type Output = Rect;

    fn add(self, rhs: Point) -> Rect {
        self.translate(rhs.x, rhs.y)
    }
}

impl Sub<Point> for Rect {
    type Output = Rect;

    fn sub(self, rhs: Point) -> Rect {
        self.translate(-rhs.x, -rhs.y)
    }
}

impl Div<f32> for Rect {
    type Output = Rect;

    fn div(self, rhs: f32) -> Rect {
        Rect::new(self.x / rhs, self.y / rhs, self.width / rhs, self.height / rhs)
    }
}

/// Per-edge amounts, used for display-port margins around the visible rect.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EdgeInsets {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl EdgeInsets {
    pub fn uniform(all: f32) -> Self {
        Self {
            left: all,
            top: all,
            right: all,
            bottom: all,
        }
    }

    pub fn from_components(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.left == 0.0 && self.top == 0.0 && self.right == 0.0 && self.bottom == 0.0
    }

    /// True when every edge differs from `other` by less than `epsilon`.
    pub fn fuzzy_eq(&self, other: &EdgeInsets, epsilon: f32) -> bool {
        (self.left - other.left).abs() < epsilon
            && (self.top - other.top).abs() < epsilon
            && (self.right - other.right).abs() < epsilon
            && (self.bottom - other.bottom).abs() < epsilon
    }
}

impl Mul<f32> for EdgeInsets {
    type Output = EdgeInsets;

    fn mul(self, rhs: f32) -> EdgeInsets {
        EdgeInsets::from_components(
            self.left * rhs,
            self.top * rhs,
            self.right * rhs,
            self.bottom * rhs,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersect_of_disjoint_rects_is_empty() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(20.0, 20.0, 5.0, 5.0);
        assert!(a.intersect(&b).is_empty());
    }

    #[test]
    fn intersect_clips_to_overlap() {
        let a = Rect::new(0.0, 0.0, 100.0, 50.0);
        let b = Rect::new(50.0, 25.0, 100.0, 100.0);
        assert_eq!(a.intersect(&b), Rect::new(50.0, 25.0, 50.0, 25.0));
    }

    #[test]
    fn force_inside_pulls_rect_back_into_bounds() {
        let bounds = Rect::new(0.0, 0.0, 100.0, 100.0);
        let rect = Rect::new(80.0, -10.0, 40.0, 40.0);
        assert_eq!(rect.force_inside(&bounds), Rect::new(60.0, 0.0, 40.0, 40.0));
    }

    #[test]
    fn force_inside_shrinks_oversized_rect() {
        let bounds = Rect::new(0.0, 0.0, 100.0, 100.0);
        let rect = Rect::new(30.0, 10.0, 300.0, 20.0);
        assert_eq!(rect.force_inside(&bounds), Rect::new(0.0, 10.0, 100.0, 20.0));
    }

    #[test]
    fn contains_rect_accepts_empty() {
        let bounds = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(bounds.contains_rect(&Rect::new(500.0, 500.0, 0.0, 0.0)));
        assert!(!bounds.contains_rect(&Rect::new(5.0, 5.0, 10.0, 1.0)));
    }

    #[test]
    fn point_arithmetic() {
        let p = Point::new(3.0, 4.0);
        assert_eq!(p.length(), 5.0);
        assert_eq!(p * 2.0 - Point::new(1.0, 1.0), Point::new(5.0, 7.0));
        assert_eq!(-p / 2.0, Point::new(-1.5, -2.0));
    }
}
