//! Quadtree spatial index over level object bounding boxes
//!
//! The tree is a point-in-time snapshot: it stores a copy of each bounding
//! box next to the object's handle and is rebuilt whenever objects move.
//!
//! An object that does not fit entirely inside one quadrant stays at the node
//! where it was inserted, so a query on either side of a quadrant boundary
//! still reaches it. Objects outside the root bounds are kept at the root.

use super::rect::Rect;
use crate::consts::INDEX_MAX_DEPTH;

#[derive(Debug, Clone)]
struct Node<T> {
    bounds: Rect,
    depth: u32,
    items: Vec<(Rect, T)>,
    /// NW, NE, SW, SE - created on the first overflow
    children: Option<Box<[Node<T>; 4]>>,
}

impl<T: Copy> Node<T> {
    fn new(bounds: Rect, depth: u32) -> Self {
        Self {
            bounds,
            depth,
            items: Vec::new(),
            children: None,
        }
    }

    fn insert(&mut self, rect: Rect, item: T, capacity: usize) {
        if self.children.is_none() {
            if self.items.len() < capacity || self.depth >= INDEX_MAX_DEPTH {
                self.items.push((rect, item));
                return;
            }
            self.subdivide(capacity);
        }

        if let Some(children) = self.children.as_mut() {
            if let Some(child) = children.iter_mut().find(|c| c.bounds.contains(&rect)) {
                child.insert(rect, item, capacity);
                return;
            }
        }
        // Straddles a quadrant boundary (or lies outside the node)
        self.items.push((rect, item));
    }

    /// Split into quadrants and push down every item that fits one
    fn subdivide(&mut self, capacity: usize) {
        let depth = self.depth + 1;
        let [nw, ne, sw, se] = self.bounds.quadrants();
        let mut children = Box::new([
            Node::new(nw, depth),
            Node::new(ne, depth),
            Node::new(sw, depth),
            Node::new(se, depth),
        ]);
        for (rect, item) in std::mem::take(&mut self.items) {
            match children.iter_mut().find(|c| c.bounds.contains(&rect)) {
                Some(child) => child.insert(rect, item, capacity),
                None => self.items.push((rect, item)),
            }
        }
        self.children = Some(children);
    }

    fn query_into(&self, range: &Rect, out: &mut Vec<T>) {
        out.extend(
            self.items
                .iter()
                .filter(|(rect, _)| rect.intersects(range))
                .map(|&(_, item)| item),
        );
        if let Some(children) = &self.children {
            for child in children.iter() {
                if child.bounds.intersects(range) {
                    child.query_into(range, out);
                }
            }
        }
    }

    fn node_count(&self) -> usize {
        1 + self
            .children
            .as_ref()
            .map_or(0, |c| c.iter().map(Node::node_count).sum())
    }

    fn max_depth(&self) -> u32 {
        self.children
            .as_ref()
            .map_or(self.depth, |c| c.iter().map(Node::max_depth).max().unwrap_or(self.depth))
    }
}

/// Hierarchical rectangle index returning every entry whose bounds
/// intersect a query range.
#[derive(Debug, Clone)]
pub struct QuadTree<T> {
    root: Node<T>,
    capacity: usize,
    len: usize,
}

impl<T: Copy> QuadTree<T> {
    pub fn new(bounds: Rect, capacity: usize) -> Self {
        Self {
            root: Node::new(bounds, 0),
            capacity: capacity.max(1),
            len: 0,
        }
    }

    /// Build a fresh tree from `(bounds, handle)` pairs
    pub fn build(bounds: Rect, capacity: usize, items: impl IntoIterator<Item = (Rect, T)>) -> Self {
        let mut tree = Self::new(bounds, capacity);
        for (rect, item) in items {
            tree.insert(rect, item);
        }
        tree
    }

    pub fn insert(&mut self, rect: Rect, item: T) {
        self.root.insert(rect, item, self.capacity);
        self.len += 1;
    }

    /// All entries whose bounds strictly intersect `range` (order unspecified)
    pub fn query(&self, range: &Rect) -> Vec<T> {
        let mut out = Vec::new();
        self.query_into(range, &mut out);
        out
    }

    /// Like [`QuadTree::query`] but appends into a reusable buffer
    pub fn query_into(&self, range: &Rect, out: &mut Vec<T>) {
        if range.is_degenerate() {
            return;
        }
        self.root.query_into(range, out);
    }

    pub fn bounds(&self) -> Rect {
        self.root.bounds
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn node_count(&self) -> usize {
        self.root.node_count()
    }

    pub fn depth(&self) -> u32 {
        self.root.max_depth()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn world() -> Rect {
        Rect::new(0.0, 0.0, 1000.0, 1000.0)
    }

    #[test]
    fn test_subdivides_once_when_full() {
        let mut tree = QuadTree::new(world(), 2);
        tree.insert(Rect::new(10.0, 10.0, 5.0, 5.0), 0u32);
        tree.insert(Rect::new(20.0, 10.0, 5.0, 5.0), 1);
        assert_eq!(tree.node_count(), 1);
        tree.insert(Rect::new(600.0, 600.0, 5.0, 5.0), 2);
        assert_eq!(tree.node_count(), 5);
        assert_eq!(tree.len(), 3);
        // Earlier entries moved down into the NW quadrant
        assert_eq!(tree.query(&Rect::new(0.0, 0.0, 50.0, 50.0)).len(), 2);
    }

    #[test]
    fn test_straddling_object_found_from_both_sides() {
        let mut tree = QuadTree::new(world(), 1);
        tree.insert(Rect::new(100.0, 100.0, 10.0, 10.0), 0u32);
        // Crosses the vertical split at x = 500
        tree.insert(Rect::new(490.0, 100.0, 20.0, 20.0), 1);

        let west = tree.query(&Rect::new(480.0, 90.0, 15.0, 40.0));
        let east = tree.query(&Rect::new(505.0, 90.0, 15.0, 40.0));
        assert!(west.contains(&1));
        assert!(east.contains(&1));
    }

    #[test]
    fn test_degenerate_range_returns_empty() {
        let tree = QuadTree::build(world(), 4, [(Rect::new(0.0, 0.0, 100.0, 100.0), 7u32)]);
        assert!(tree.query(&Rect::new(50.0, 50.0, 0.0, 10.0)).is_empty());
        assert!(tree.query(&Rect::new(50.0, 50.0, 10.0, -1.0)).is_empty());
    }

    #[test]
    fn test_object_outside_root_bounds_still_found() {
        let tree = QuadTree::build(world(), 1, [
            (Rect::new(10.0, 10.0, 5.0, 5.0), 0u32),
            (Rect::new(1500.0, 10.0, 5.0, 5.0), 1),
        ]);
        assert_eq!(tree.query(&Rect::new(1490.0, 0.0, 30.0, 30.0)), vec![1]);
    }

    #[test]
    fn test_many_objects_build_deep_tree() {
        let items = (0..2000u32).map(|i| {
            let x = (i % 100) as f32 * 10.0;
            let y = (i / 100) as f32 * 50.0;
            (Rect::new(x + 1.0, y + 1.0, 8.0, 8.0), i)
        });
        let tree = QuadTree::build(world(), 8, items);
        assert_eq!(tree.len(), 2000);
        assert!(tree.depth() >= 3);

        let hits = tree.query(&Rect::new(0.0, 0.0, 20.0, 20.0));
        assert_eq!(hits.len(), 2);
    }

    fn rect_in_world() -> impl Strategy<Value = Rect> {
        (0.0f32..990.0, 0.0f32..990.0, 1.0f32..200.0, 1.0f32..200.0).prop_map(|(x, y, w, h)| {
            Rect::new(x, y, w.min(1000.0 - x), h.min(1000.0 - y))
        })
    }

    proptest! {
        #[test]
        fn prop_containment(
            rects in prop::collection::vec(rect_in_world(), 1..200),
            capacity in 1usize..8,
            pick in any::<prop::sample::Index>(),
            (fx, fy) in (0.0f32..1.0, 0.0f32..1.0),
            (qw, qh) in (0.5f32..50.0, 0.5f32..50.0),
        ) {
            let tree = QuadTree::build(
                world(),
                capacity,
                rects.iter().enumerate().map(|(i, r)| (*r, i)),
            );
            let target_idx = pick.index(rects.len());
            let target = rects[target_idx];

            // A query anchored at a point strictly inside the target overlaps it
            let px = target.x + target.w * (0.05 + fx * 0.9);
            let py = target.y + target.h * (0.05 + fy * 0.9);
            let query = Rect::new(px - qw / 2.0, py - qh / 2.0, qw, qh);
            prop_assert!(query.intersects(&target));

            let hits = tree.query(&query);
            prop_assert!(hits.contains(&target_idx));
            // And nothing that does not overlap is returned
            for idx in hits {
                prop_assert!(rects[idx].intersects(&query));
            }
        }
    }
}
