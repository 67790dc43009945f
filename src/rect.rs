use std::fmt;

use crate::{point::Orientation, Error, KdRegion, Point, Result};

/// An axis aligned rectangle, possibly unbounded or degenerate (zero width or height).
/// Used as the region of a KD tree node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    xmin: f64,
    ymin: f64,
    xmax: f64,
    ymax: f64
}

impl Rect {
    /// The whole plane
    pub const EVERYTHING: Self = Self{
        xmin: f64::NEG_INFINITY, ymin: f64::NEG_INFINITY,
        xmax: f64::INFINITY, ymax: f64::INFINITY
    };

    /// Fails with `Error::InvalidRange` if any bound is NaN or a minimum exceeds its maximum
    pub fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Result<Self> {
        // written so NaN fails too
        if !(xmin <= xmax) || !(ymin <= ymax) {
            return Err(Error::invalid_range(format!(
                "[{xmin:?}, {xmax:?}] x [{ymin:?}, {ymax:?}] is not a valid rectangle")))
        }
        Ok(Self{xmin, ymin, xmax, ymax})
    }

    pub fn xmin(&self) -> f64 { self.xmin }
    pub fn ymin(&self) -> f64 { self.ymin }
    pub fn xmax(&self) -> f64 { self.xmax }
    pub fn ymax(&self) -> f64 { self.ymax }

    /// True if `p` is inside or on the boundary
    pub fn contains(&self, p: &Point) -> bool {
        self.xmin <= p.x() && p.x() <= self.xmax && self.ymin <= p.y() && p.y() <= self.ymax
    }

    /// Squared distance from `p` to the closest point of the rectangle, 0 if `p` is inside it
    pub fn distance_squared_to(&self, p: &Point) -> f64 {
        let dx = axis_gap(p.x(), self.xmin, self.xmax);
        let dy = axis_gap(p.y(), self.ymin, self.ymax);
        dx*dx + dy*dy
    }

    /// Split along the line through `p` perpendicular to the orientation's axis.
    /// Both halves keep the split line, so a point on it lies in both.
    pub fn halves(&self, p: &Point, orientation: Orientation) -> (Self, Self) {
        let mut lb = *self;
        let mut rt = *self;
        match orientation {
            Orientation::Vertical => {
                let x = p.x().clamp(self.xmin, self.xmax);
                lb.xmax = x;
                rt.xmin = x;
            }
            Orientation::Horizontal => {
                let y = p.y().clamp(self.ymin, self.ymax);
                lb.ymax = y;
                rt.ymin = y;
            }
        }
        (lb, rt)
    }
}

fn axis_gap(v: f64, lo: f64, hi: f64) -> f64 {
    if v < lo {
        lo - v
    } else if hi < v {
        v - hi
    } else {
        0.0
    }
}

impl KdRegion for Rect {
    type Point = Point;

    fn split(&self, point: &Point, layer: usize) -> (Self, Self) {
        self.halves(point, Orientation::at_depth(layer))
    }

    fn min_sqdist(&self, point: &Point) -> f64 {
        self.distance_squared_to(point)
    }
}

impl Default for Rect {
    fn default() -> Self {
        Self::EVERYTHING
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}, {:?}] x [{:?}, {:?}]", self.xmin, self.xmax, self.ymin, self.ymax)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction() {
        assert!(Rect::new(0.0, 0.0, 1.0, 1.0).is_ok());
        assert!(Rect::new(2.0, 3.0, 2.0, 3.0).is_ok(), "degenerate rectangles are legal");
        assert!(Rect::new(f64::NEG_INFINITY, 0.0, f64::INFINITY, 0.0).is_ok());
        for (xmin, ymin, xmax, ymax) in [(1.0, 0.0, 0.0, 1.0), (0.0, 1.0, 1.0, 0.0), (f64::NAN, 0.0, 1.0, 1.0), (0.0, 0.0, 1.0, f64::NAN)] {
            match Rect::new(xmin, ymin, xmax, ymax) {
                Err(Error::InvalidRange(_)) => (),
                other => panic!("Expected InvalidRange for {:?}, got {:?}", (xmin, ymin, xmax, ymax), other)
            }
        }
    }

    #[test]
    fn squared_distance() {
        let r = Rect::new(0.0, 0.0, 2.0, 1.0).unwrap();
        assert_eq!(r.distance_squared_to(&Point::new(1.0, 0.5)), 0.0);
        assert_eq!(r.distance_squared_to(&Point::new(2.0, 1.0)), 0.0, "boundary counts as inside");
        assert_eq!(r.distance_squared_to(&Point::new(5.0, 0.5)), 9.0);
        assert_eq!(r.distance_squared_to(&Point::new(-3.0, 5.0)), 25.0);
        assert_eq!(r.distance_squared_to(&Point::new(5.0, 5.0)), 25.0);
        assert_eq!(Rect::EVERYTHING.distance_squared_to(&Point::new(-1e300, 1e300)), 0.0);
    }

    #[test]
    fn split_halves() {
        let p = Point::new(3.0, 7.0);
        let (lb, rt) = Rect::EVERYTHING.split(&p, 0);
        assert_eq!(lb.xmax(), 3.0);
        assert_eq!(rt.xmin(), 3.0);
        assert_eq!(lb.ymin(), f64::NEG_INFINITY);
        let (below, above) = rt.split(&p, 1);
        assert_eq!(below, Rect::new(3.0, f64::NEG_INFINITY, f64::INFINITY, 7.0).unwrap());
        assert_eq!(above, Rect::new(3.0, 7.0, f64::INFINITY, f64::INFINITY).unwrap());
        assert!(below.contains(&p) && above.contains(&p));
    }
}
