use std::{collections::HashMap, fmt};

use crate::{Canvas, Error, KdPoint, KdTree, Point, Rect, Result};

/// How `Tour::insert_nearest` picks the edge a new point goes into
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InsertMode {
    /// Scan every edge of the tour and take the one with the smallest length increase
    #[default]
    BruteForce,
    /// Find the closest point already in the tour with a KD tree and only consider the two
    /// edges touching it.  Much faster, but can produce a different (usually similar,
    /// sometimes longer) tour than `BruteForce`.
    Indexed
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TourConfig {
    pub mode: InsertMode,
    /// Root region of the KD tree in `InsertMode::Indexed`, ignored otherwise
    pub bounds: Rect
}

impl Default for TourConfig {
    fn default() -> Self {
        Self{mode: InsertMode::BruteForce, bounds: Rect::EVERYTHING}
    }
}

impl TourConfig {
    pub fn indexed() -> Self {
        Self::default().with_mode(InsertMode::Indexed)
    }

    pub fn with_mode(mut self, mode: InsertMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_bounds(mut self, bounds: Rect) -> Self {
        self.bounds = bounds;
        self
    }
}

/// Exact bit patterns of a point's coordinates.
/// 0.0 and -0.0 get different keys even though the points compare equal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct PointKey(u64, u64);

impl From<&Point> for PointKey {
    fn from(p: &Point) -> Self {
        Self(p.x().to_bits(), p.y().to_bits())
    }
}

#[derive(Clone, Copy, Debug)]
struct Node {
    point: Point,
    next: usize,
    prev: usize
}

/// Circular doubly linked list stored in a buffer, links are indices into it.
/// Nodes are never removed, so indices stay valid for the life of the ring.
#[derive(Clone, Debug, Default)]
struct Ring {
    nodes: Vec<Node>,
    /// Where traversals begin and end.  Any node would do.
    start: Option<usize>
}

/// Length added by routing a-b through p instead
fn insertion_cost(a: &Point, p: &Point, b: &Point) -> f64 {
    a.distance_to(p) + p.distance_to(b) - a.distance_to(b)
}

impl Ring {
    fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Link p in right after `at`, returning the new node's index
    fn splice_after(&mut self, at: usize, point: Point) -> usize {
        let idx = self.nodes.len();
        let next = self.nodes[at].next;
        self.nodes.push(Node{point, next, prev: at});
        self.nodes[at].next = idx;
        self.nodes[next].prev = idx;
        idx
    }

    /// Returns the index of the node holding `point`
    fn insert_cheapest(&mut self, point: Point) -> usize {
        let Some(start) = self.start else {
            return self.push_first(point)
        };
        let mut best = start;
        let mut min_increase = f64::INFINITY;
        let mut current = start;
        loop {
            let next = self.nodes[current].next;
            let increase = insertion_cost(&self.nodes[current].point, &point, &self.nodes[next].point);
            // strict, so the first edge seen wins ties
            if increase < min_increase {
                min_increase = increase;
                best = current;
            }
            current = next;
            if current == start { break }
        }
        self.splice_after(best, point)
    }

    /// Insert `point` on whichever side of `anchor` adds less length, preferring before it on a tie
    fn insert_beside(&mut self, anchor: usize, point: Point) -> usize {
        let Node{point: a, next, prev} = self.nodes[anchor];
        let cost_before = insertion_cost(&self.nodes[prev].point, &point, &a);
        let cost_after = insertion_cost(&a, &point, &self.nodes[next].point);
        if cost_before <= cost_after {
            self.splice_after(prev, point)
        } else {
            self.splice_after(anchor, point)
        }
    }

    fn push_first(&mut self, point: Point) -> usize {
        let idx = self.nodes.len();
        self.nodes.push(Node{point, next: idx, prev: idx});
        self.start = Some(idx);
        idx
    }

    /// Linear scan for a node holding a point equal to `point`
    fn position(&self, point: &Point) -> Option<usize> {
        let start = self.start?;
        let mut current = start;
        loop {
            if self.nodes[current].point == *point {
                return Some(current)
            }
            current = self.nodes[current].next;
            if current == start { return None }
        }
    }

    fn iter(&self, forward: bool) -> Iter<'_> {
        Iter{ring: self, current: self.start, remaining: self.len(), forward}
    }
}

#[derive(Clone, Debug)]
struct Accelerator {
    tree: KdTree<Rect>,
    /// Tour node of every inserted point
    nodes_by_point: HashMap<PointKey, usize>
}

impl Accelerator {
    fn new(bounds: Rect) -> Self {
        Self{tree: KdTree::with_bounds(bounds), nodes_by_point: HashMap::new()}
    }

    /// Tour node holding `point`, from the lookup table or else a scan of the tour.
    /// A node found by scanning is recorded so the next lookup hits.
    fn anchor_of(&mut self, ring: &Ring, point: &Point) -> Option<usize> {
        let key = PointKey::from(point);
        if let Some(&idx) = self.nodes_by_point.get(&key) {
            return Some(idx)
        }
        log::debug!("tour.insert: no lookup entry for {point}, scanning the tour");
        let idx = ring.position(point)?;
        self.nodes_by_point.insert(key, idx);
        Some(idx)
    }

    fn insert(&mut self, ring: &mut Ring, point: Point) -> Result<()> {
        if !self.tree.bounds().contains(&point) {
            return Err(Error::invalid_argument(format!(
                "tour.insert: point {} lies outside of the index bounds {}", point, self.tree.bounds())))
        }
        let nearest = self.tree.nearest(&point)?.copied();
        // the tree is updated before the ring so a rejected point leaves both untouched
        self.tree.insert(point)?;
        let idx = match nearest {
            None => ring.insert_cheapest(point),
            Some(nearest) => match self.anchor_of(ring, &nearest) {
                Some(anchor) => ring.insert_beside(anchor, point),
                None => {
                    log::debug!("tour.insert: {nearest} is not in the tour, falling back to a full edge scan");
                    ring.insert_cheapest(point)
                }
            }
        };
        self.nodes_by_point.insert(PointKey::from(&point), idx);
        Ok(())
    }
}

/// A closed tour through a sequence of points, built by cheapest insertion:
/// each new point is spliced into the edge whose length grows the least.
/// The tour is a circular doubly linked list, and in `InsertMode::Indexed` it also keeps a
/// KD tree of its points plus a table from point to list node, so the edge search starts at
/// the closest existing point instead of scanning the whole tour.
#[derive(Clone, Debug)]
pub struct Tour {
    ring: Ring,
    accel: Option<Accelerator>
}

impl Tour {
    /// Create an empty tour using `InsertMode::BruteForce`
    pub fn new() -> Self {
        Self::with_config(TourConfig::default())
    }

    /// Create an empty tour using `InsertMode::Indexed` over the whole plane
    pub fn indexed() -> Self {
        Self::with_config(TourConfig::indexed())
    }

    pub fn with_config(config: TourConfig) -> Self {
        let accel = match config.mode {
            InsertMode::BruteForce => None,
            InsertMode::Indexed => Some(Accelerator::new(config.bounds))
        };
        Self{ring: Ring::default(), accel}
    }

    /// Build a tour by inserting `points` in order
    pub fn from_points(config: TourConfig, points: impl IntoIterator<Item = Point>) -> Result<Self> {
        let mut res = Self::with_config(config);
        res.insert_all(points)?;
        Ok(res)
    }

    pub fn mode(&self) -> InsertMode {
        if self.accel.is_some() { InsertMode::Indexed } else { InsertMode::BruteForce }
    }

    /// Number of points in the tour, duplicates included
    pub fn size(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.start.is_none()
    }

    /// Total length of the closed tour, 0 if there are fewer than 2 points
    pub fn length(&self) -> f64 {
        let Some(start) = self.ring.start else { return 0.0 };
        let mut total = 0.0;
        let mut current = start;
        loop {
            let node = &self.ring.nodes[current];
            total += node.point.distance_to(&self.ring.nodes[node.next].point);
            current = node.next;
            if current == start { break }
        }
        total
    }

    /// Add `point` to the tour at the cheapest place the configured mode can find.
    /// Fails with `Error::InvalidArgument`, leaving the tour untouched, if the point is not finite,
    /// or is outside of the configured bounds in `InsertMode::Indexed`.
    pub fn insert_nearest(&mut self, point: Point) -> Result<()> {
        if !point.is_finite() {
            return Err(Error::invalid_argument(format!("tour.insert: point {point} is not finite")))
        }
        log::trace!("tour.insert: mode={:?} n={} point={point}", self.mode(), self.size());
        match &mut self.accel {
            Some(accel) => accel.insert(&mut self.ring, point),
            None => {
                self.ring.insert_cheapest(point);
                Ok(())
            }
        }
    }

    /// Insert every point in order, stopping at the first one that is rejected.
    /// Points before it stay in the tour.
    pub fn insert_all(&mut self, points: impl IntoIterator<Item = Point>) -> Result<()> {
        for point in points {
            self.insert_nearest(point)?;
        }
        Ok(())
    }

    /// Points in tour order, following next links from the start of the tour
    pub fn iter(&self) -> Iter<'_> {
        self.ring.iter(true)
    }

    /// Points in reverse tour order, following prev links from the start of the tour
    pub fn iter_rev(&self) -> Iter<'_> {
        self.ring.iter(false)
    }

    /// Draw every edge of the tour, or the lone point of a one point tour
    pub fn draw(&self, canvas: &mut impl Canvas) {
        let Some(start) = self.ring.start else { return };
        let first = &self.ring.nodes[start];
        if first.next == start {
            first.point.draw(canvas);
            return
        }
        let mut current = start;
        loop {
            let node = &self.ring.nodes[current];
            node.point.draw_to(&self.ring.nodes[node.next].point, canvas);
            current = node.next;
            if current == start { break }
        }
    }

    #[cfg(test)]
    fn check_links(&self) -> bool {
        let nodes = &self.ring.nodes;
        for (i, node) in nodes.iter().enumerate() {
            if nodes[node.next].prev != i || nodes[node.prev].next != i {
                return false
            }
        }
        let Some(start) = self.ring.start else { return nodes.is_empty() };
        let mut seen = vec![false; nodes.len()];
        let mut current = start;
        for _ in 0..nodes.len() {
            if seen[current] {
                return false
            }
            seen[current] = true;
            current = nodes[current].next;
        }
        if current != start {
            return false
        }
        match &self.accel {
            None => true,
            Some(accel) => nodes.iter().all(|node|accel.nodes_by_point.get(&PointKey::from(&node.point))
                .is_some_and(|&i|nodes[i].point == node.point))
        }
    }
}

impl Default for Tour {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Tour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "(empty tour)")
        }
        for point in self.iter() {
            writeln!(f, "{point}")?;
        }
        Ok(())
    }
}

/// Iterator over the points of a tour, visiting each node exactly once
pub struct Iter<'a> {
    ring: &'a Ring,
    current: Option<usize>,
    remaining: usize,
    forward: bool
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Point;
    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None
        }
        let node = &self.ring.nodes[self.current?];
        self.remaining -= 1;
        self.current = Some(if self.forward { node.next } else { node.prev });
        Some(&node.point)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl<'a> IntoIterator for &'a Tour {
    type Item = &'a Point;
    type IntoIter = Iter<'a>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
