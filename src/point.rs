use std::{cmp::Ordering, fmt};

use rand::{distributions::{Distribution, Uniform}, Rng};

use crate::KdPoint;

/// Which coordinate a KD tree node splits its region on.
/// The root is vertical (splits by x) and orientation alternates with depth.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    Vertical,
    Horizontal
}

impl Orientation {
    pub fn at_depth(layer: usize) -> Self {
        if layer%2 == 0 { Self::Vertical } else { Self::Horizontal }
    }
}

/// A rendering sink.  The tour and points only ever call into it.
pub trait Canvas {
    fn point(&mut self, p: &Point);
    fn line(&mut self, a: &Point, b: &Point);
}

/// An immutable point in the plane.
/// Two points are equal when both coordinates compare equal as f64, with no tolerance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    x: f64,
    y: f64
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self{x, y}
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    /// The coordinate a node with the given orientation compares on
    pub fn coord(&self, orientation: Orientation) -> f64 {
        match orientation {
            Orientation::Vertical => self.x,
            Orientation::Horizontal => self.y
        }
    }

    pub fn distance_squared_to(&self, other: &Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx*dx + dy*dy
    }

    pub fn distance_to(&self, other: &Self) -> f64 {
        self.distance_squared_to(other).sqrt()
    }

    pub fn draw(&self, canvas: &mut impl Canvas) {
        canvas.point(self)
    }

    pub fn draw_to(&self, other: &Self, canvas: &mut impl Canvas) {
        canvas.line(self, other)
    }
}

impl KdPoint for Point {
    type Distance = f64;

    fn sqdist(&self, other: &Self) -> f64 {
        self.distance_squared_to(other)
    }

    fn cmp(&self, other: &Self, layer: usize) -> Ordering {
        let orientation = Orientation::at_depth(layer);
        // both sides are finite by the time the tree compares them
        self.coord(orientation).partial_cmp(&other.coord(orientation)).unwrap_or(Ordering::Equal)
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:?}, {:?})", self.x, self.y)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

impl Distribution<Point> for Uniform<f64> {
    fn sample<R>(&self, rng: &mut R) -> Point where R: Rng + ?Sized {
        let x = Distribution::<f64>::sample(self, rng);
        let y = Distribution::<f64>::sample(self, rng);
        Point::new(x, y)
    }
}

#[cfg(test)]
mod tests {
    use rand::distributions::{Distribution, Uniform};

    use super::*;

    #[derive(Default)]
    struct Recorder {
        points: Vec<Point>,
        lines: Vec<(Point, Point)>
    }

    impl Canvas for Recorder {
        fn point(&mut self, p: &Point) {
            self.points.push(*p)
        }
        fn line(&mut self, a: &Point, b: &Point) {
            self.lines.push((*a, *b))
        }
    }

    #[test]
    fn distances() {
        let a = Point::new(1.0, 1.0);
        let b = Point::new(4.0, 5.0);
        assert_eq!(a.distance_squared_to(&b), 25.0);
        assert_eq!(a.distance_to(&b), 5.0);
        assert_eq!(b.distance_to(&a), 5.0);
        assert_eq!(a.distance_to(&a), 0.0);
    }

    #[test]
    fn exact_equality() {
        assert_eq!(Point::new(0.1 + 0.2, 1.0), Point::new(0.1 + 0.2, 1.0));
        assert_ne!(Point::new(0.1 + 0.2, 1.0), Point::new(0.3, 1.0));
        // IEEE equality, so the sign of zero does not matter here
        assert_eq!(Point::new(0.0, -0.0), Point::new(-0.0, 0.0));
    }

    #[test]
    fn layer_comparison() {
        let a = Point::new(1.0, 9.0);
        let b = Point::new(2.0, 3.0);
        assert_eq!(KdPoint::cmp(&a, &b, 0), Ordering::Less);
        assert_eq!(KdPoint::cmp(&a, &b, 1), Ordering::Greater);
        assert_eq!(KdPoint::cmp(&a, &b, 2), Ordering::Less);
        assert_eq!(Orientation::at_depth(3), Orientation::Horizontal);
        assert_eq!(Orientation::at_depth(0), Orientation::Vertical);
    }

    #[test]
    fn finiteness() {
        assert!(Point::new(-3.5, 1e300).is_finite());
        assert!(!Point::new(f64::NAN, 0.0).is_finite());
        assert!(!Point::new(0.0, f64::NEG_INFINITY).is_finite());
    }

    #[test]
    fn display_and_draw() {
        let a = Point::new(1.0, 2.5);
        let b = Point::new(-3.0, 0.0);
        assert_eq!(a.to_string(), "(1.0, 2.5)");
        let mut canvas = Recorder::default();
        a.draw(&mut canvas);
        a.draw_to(&b, &mut canvas);
        assert_eq!(canvas.points, vec![a]);
        assert_eq!(canvas.lines, vec![(a, b)]);
    }

    #[test]
    fn uniform_sampling() {
        let mut rng = rand::thread_rng();
        let dist = Uniform::new_inclusive(-10.0, 10.0);
        for _ in 0..100 {
            let p: Point = dist.sample(&mut rng);
            if !(-10.0..=10.0).contains(&p.x()) || !(-10.0..=10.0).contains(&p.y()) {
                panic!("Sampled point {} outside of [-10, 10]^2!", p)
            }
        }
    }
}
