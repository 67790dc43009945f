pub mod error;
pub mod point;
pub mod rect;
pub mod kdtree;
pub mod tour;

use std::{cmp::Ordering, fmt::Debug};

use num_traits::Zero;

pub use error::{Error, Result};
pub use kdtree::KdTree;
pub use point::{Canvas, Orientation, Point};
pub use rect::Rect;
pub use tour::{InsertMode, Tour, TourConfig};



pub trait KdPoint: Sized + Clone + PartialEq + Debug {
    type Distance: PartialOrd + Zero + Copy + Debug;
    fn sqdist(&self, other: &Self) -> Self::Distance;
    /// Compare the coordinate that nodes at depth `layer` split on
    fn cmp(&self, other: &Self, layer: usize) -> Ordering;
    /// Points that fail this can't be ordered or measured and are rejected by the tree
    fn is_finite(&self) -> bool;
}

pub trait KdRegion: Sized + Clone + PartialEq + Debug {
    type Point: KdPoint;
    /// Cut the region along the split line through `point` for a node at depth `layer`.
    /// The first half receives points that compare Less, the second everything else.
    fn split(&self, point: &Self::Point, layer: usize) -> (Self, Self);
    fn min_sqdist(&self, point: &Self::Point) -> <Self::Point as KdPoint>::Distance;
}



pub enum WalkDecision {
    Continue,
    SkipChildren,
    Stop
}
