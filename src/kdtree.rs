use std::cmp::Ordering;

use num_traits::Zero;

use crate::{Error, KdPoint, KdRegion, Point, Rect, Result, WalkDecision};

#[derive(Clone, Debug)]
struct Node<R: KdRegion> {
    point: R::Point,
    /// The part of the tree's bounds this node's subtree is responsible for
    region: R,
    /// Depth in the tree, which decides the split axis
    layer: usize,
    /// Child holding points that compare Less on this node's axis
    lb: Option<usize>,
    /// Child holding points that compare Equal or Greater
    rt: Option<usize>
}

/// A KD tree represents a dynamic collection of points in space, with the ability to answer:
/// - Is a given point in the tree?  (Exact coordinate match)
/// - Which point in the tree is closest to a given point?  (A nearest neighbor query)
///
/// Unlike a tree built from a known set of points, this one grows one point at a time: each insert
/// walks down from the root and hangs a new leaf off the first empty slot it reaches.
/// The tree is never rebalanced, so depth depends on insertion order and sorted input degrades it
/// to a path as long as the number of points.  Every traversal is a loop over an explicit stack,
/// so that is slow but never overflows.
///
/// Nodes live in one buffer in insertion order and refer to their children by index.
/// Every node records the region (rectangle, for `Rect`) its subtree covers, which lets
/// nearest neighbor queries skip subtrees that can't beat the best point found so far.
#[derive(Clone, Debug)]
pub struct KdTree<R: KdRegion = Rect> {
    bounds: R,
    nodes: Vec<Node<R>>
}

impl KdTree<Rect> {
    /// Create an empty tree covering the whole plane
    pub fn new() -> Self {
        Self::with_bounds(Rect::EVERYTHING)
    }

    /// Build a tree covering the whole plane by inserting points in iteration order.
    /// Fails on the first point `insert` would reject.
    pub fn try_from_points(points: impl IntoIterator<Item = Point>) -> Result<Self> {
        let mut res = Self::new();
        for point in points {
            res.insert(point)?;
        }
        Ok(res)
    }
}

impl Default for KdTree<Rect> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: KdRegion> KdTree<R> {
    /// Create an empty tree whose root region is `bounds`.
    /// Points outside of `bounds` will be rejected by `insert`.
    pub fn with_bounds(bounds: R) -> Self {
        Self{bounds, nodes: Vec::new()}
    }

    /// Get the number of distinct points in the tree
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn bounds(&self) -> &R {
        &self.bounds
    }

    /// Number of nodes on the longest path from the root to a leaf, 0 for an empty tree
    pub fn height(&self) -> usize {
        self.nodes.iter().map(|n|n.layer + 1).max().unwrap_or(0)
    }

    /// Add a point to the tree.
    /// Returns Ok(true) if the point was added, or Ok(false) if an equal point was already present,
    /// in which case the tree is unchanged.
    /// Fails with `Error::InvalidArgument` without touching the tree if the point is not finite
    /// or lies outside the tree's bounds.
    pub fn insert(&mut self, point: R::Point) -> Result<bool> {
        self.check_point(&point, "insert")?;
        if !self.bounds.min_sqdist(&point).is_zero() {
            return Err(Error::invalid_argument(format!(
                "kdtree.insert: point {:?} lies outside of the tree bounds {:?}", point, self.bounds)))
        }
        let Some(mut idx) = self.root() else {
            log::trace!("kdtree.insert: root point={point:?}");
            let region = self.bounds.clone();
            self.nodes.push(Node{point, region, layer: 0, lb: None, rt: None});
            return Ok(true)
        };
        loop {
            let node = &self.nodes[idx];
            if node.point == point {
                log::debug!("kdtree.insert: duplicate point={point:?} ignored");
                return Ok(false)
            }
            let goes_lb = KdPoint::cmp(&point, &node.point, node.layer) == Ordering::Less;
            let next = if goes_lb { node.lb } else { node.rt };
            match next {
                Some(child) => idx = child,
                None => {
                    let (lb, rt) = node.region.split(&node.point, node.layer);
                    let layer = node.layer + 1;
                    let child = self.nodes.len();
                    log::trace!("kdtree.insert: point={point:?} layer={layer} parent={idx}");
                    self.nodes.push(Node{point, region: if goes_lb { lb } else { rt }, layer, lb: None, rt: None});
                    let parent = &mut self.nodes[idx];
                    if goes_lb {
                        parent.lb = Some(child)
                    } else {
                        parent.rt = Some(child)
                    }
                    return Ok(true)
                }
            }
        }
    }

    /// Return true if a point equal to `point` is in the tree.
    /// Only the path `insert` would have taken for `point` is searched.
    pub fn contains(&self, point: &R::Point) -> Result<bool> {
        self.check_point(point, "contains")?;
        Ok(self.find(point).is_some())
    }

    /// Return the point in the tree with the smallest squared distance to `query`,
    /// or None if the tree is empty.  Ties are broken in favor of the point found first.
    /// The query itself may lie outside of the tree's bounds.
    pub fn nearest(&self, query: &R::Point) -> Result<Option<&R::Point>> {
        self.check_point(query, "nearest")?;
        let Some(root) = self.root() else { return Ok(None) };
        let mut champion = &self.nodes[root].point;
        let mut best = query.sqdist(champion);
        let mut visited = 0usize;
        let mut todo = vec![root];
        while let Some(idx) = todo.pop() {
            let node = &self.nodes[idx];
            // nothing in this subtree can be closer than the closest point of its region
            if best <= node.region.min_sqdist(query) {
                continue
            }
            visited += 1;
            let d = query.sqdist(&node.point);
            if d < best {
                champion = &node.point;
                best = d;
            }
            let lb_first = match (self.region_sqdist(node.lb, query), self.region_sqdist(node.rt, query)) {
                (Some(l), Some(r)) if l < r => true,
                (Some(l), Some(r)) if r < l => false,
                _ => KdPoint::cmp(query, &node.point, node.layer) == Ordering::Less
            };
            let (first, second) = if lb_first { (node.lb, node.rt) } else { (node.rt, node.lb) };
            // stack, so the closer child is pushed last to be searched first
            todo.extend(second);
            todo.extend(first);
        }
        log::trace!("kdtree.nearest: query={query:?} champion={champion:?} visited={visited} n={}", self.len());
        Ok(Some(champion))
    }

	/// Iterate over all points in the tree in depth first order (lb before rt),
	/// calling a visitor function on each point.  The visitor function
	/// is also given the region of the subtree rooted at the point,
	/// and may return a WalkDecision to instruct the traversal to skip the
	/// subtree or to stop the traversal entirely.
    pub fn walk<'a>(&'a self, visitor: &mut impl FnMut(&'a R, &'a R::Point) -> WalkDecision) {
        let mut todo: Vec<usize> = self.root().into_iter().collect();
        while let Some(idx) = todo.pop() {
            let node = &self.nodes[idx];
            match visitor(&node.region, &node.point) {
                WalkDecision::Stop => return,
                WalkDecision::SkipChildren => continue,
                WalkDecision::Continue => ()
            }
            todo.extend(node.rt);
            todo.extend(node.lb);
        }
    }

    /// Borrowing iterator over the points, in the order they were first inserted
    pub fn iter_points(&self) -> impl Iterator<Item=&R::Point> + '_ {
        self.nodes.iter().map(|n|&n.point)
    }

    fn root(&self) -> Option<usize> {
        if self.nodes.is_empty() { None } else { Some(0) }
    }

    fn region_sqdist(&self, idx: Option<usize>, point: &R::Point) -> Option<<R::Point as KdPoint>::Distance> {
        idx.map(|i|self.nodes[i].region.min_sqdist(point))
    }

    fn find(&self, point: &R::Point) -> Option<usize> {
        let mut next = self.root();
        while let Some(idx) = next {
            let node = &self.nodes[idx];
            if node.point == *point {
                return Some(idx)
            }
            next = match KdPoint::cmp(point, &node.point, node.layer) {
                Ordering::Less => node.lb,
                _ => node.rt
            };
        }
        None
    }

    fn check_point(&self, point: &R::Point, op: &str) -> Result<()> {
        if !point.is_finite() {
            return Err(Error::invalid_argument(format!("kdtree.{op}: point {point:?} is not finite")))
        }
        Ok(())
    }

    #[cfg(test)]
    fn subtree_points(&self, idx: usize) -> Vec<&R::Point> {
        let mut res = Vec::new();
        let mut todo = vec![idx];
        while let Some(i) = todo.pop() {
            let node = &self.nodes[i];
            res.push(&node.point);
            todo.extend(node.lb);
            todo.extend(node.rt);
        }
        res
    }

    #[cfg(test)]
    pub(crate) fn check_tree(&self) -> bool {
        if self.root().is_some_and(|r|self.subtree_points(r).len() != self.len()) {
            return false
        }
        for node in &self.nodes {
            if !node.region.min_sqdist(&node.point).is_zero() {
                return false
            }
            let (lb, rt) = node.region.split(&node.point, node.layer);
            for (child, half, is_lb) in [(node.lb, lb, true), (node.rt, rt, false)] {
                let Some(c) = child else { continue };
                let c_node = &self.nodes[c];
                if c_node.layer != node.layer + 1 || c_node.region != half {
                    return false
                }
                if self.subtree_points(c).into_iter().any(
                    |p|(KdPoint::cmp(p, &node.point, node.layer) == Ordering::Less) != is_lb
                ) {
                    return false
                }
            }
        }
        true
    }

    #[cfg(test)]
    pub(crate) fn nearest_naive(&self, query: &R::Point) -> Option<&R::Point> {
        self.iter_points().min_by(|a, b|query.sqdist(a).partial_cmp(&query.sqdist(b)).unwrap_or(Ordering::Equal))
    }
}
