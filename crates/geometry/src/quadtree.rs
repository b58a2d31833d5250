//! Region quadtree over bounding boxes.
//!
//! Built wholesale from a snapshot of items; there is no incremental
//! rebalancing. Items that straddle a split line stay in the parent node.

use crate::bounds::BoundingBox;
use crate::vector::Vec2;

pub const DEFAULT_MAX_DEPTH: usize = 6;
pub const DEFAULT_MAX_ITEMS: usize = 8;

#[derive(Debug, Clone)]
struct QuadNode<K> {
    bounds: BoundingBox,
    depth: usize,
    items: Vec<(K, BoundingBox)>,
    children: Option<Box<[QuadNode<K>; 4]>>,
}

impl<K: Clone> QuadNode<K> {
    fn new(bounds: BoundingBox, depth: usize) -> Self {
        Self {
            bounds,
            depth,
            items: Vec::new(),
            children: None,
        }
    }

    fn split(&mut self) {
        let c = self.bounds.center();
        let (min, max) = (self.bounds.min, self.bounds.max);
        let depth = self.depth + 1;
        self.children = Some(Box::new([
            QuadNode::new(BoundingBox::new(min, c), depth),
            QuadNode::new(BoundingBox::new(Vec2::new(c.x, min.y), Vec2::new(max.x, c.y)), depth),
            QuadNode::new(BoundingBox::new(Vec2::new(min.x, c.y), Vec2::new(c.x, max.y)), depth),
            QuadNode::new(BoundingBox::new(c, max), depth),
        ]));
    }

    fn child_for(&mut self, bounds: &BoundingBox) -> Option<&mut QuadNode<K>> {
        self.children
            .as_mut()?
            .iter_mut()
            .find(|child| child.bounds.contains(bounds))
    }

    fn insert(&mut self, id: K, bounds: BoundingBox, max_depth: usize, max_items: usize) {
        if let Some(child) = self.child_for(&bounds) {
            child.insert(id, bounds, max_depth, max_items);
            return;
        }

        self.items.push((id, bounds));
        if self.children.is_some() || self.items.len() <= max_items || self.depth >= max_depth {
            return;
        }

        self.split();
        let items = std::mem::take(&mut self.items);
        for (id, b) in items {
            match self.child_for(&b) {
                Some(child) => child.insert(id, b, max_depth, max_items),
                None => self.items.push((id, b)),
            }
        }
    }

    fn query(&self, region: &BoundingBox, out: &mut Vec<K>) {
        if !self.bounds.overlaps_inclusive(region) {
            return;
        }
        for (id, b) in &self.items {
            if b.overlaps_inclusive(region) {
                out.push(id.clone());
            }
        }
        if let Some(children) = &self.children {
            for child in children.iter() {
                child.query(region, out);
            }
        }
    }

    fn node_count(&self) -> usize {
        1 + self
            .children
            .as_ref()
            .map_or(0, |c| c.iter().map(QuadNode::node_count).sum())
    }
}

#[derive(Debug, Clone)]
pub struct QuadTree<K> {
    root: QuadNode<K>,
    max_depth: usize,
    max_items: usize,
    len: usize,
}

impl<K: Clone> QuadTree<K> {
    pub fn new(bounds: BoundingBox) -> Self {
        Self::with_limits(bounds, DEFAULT_MAX_DEPTH, DEFAULT_MAX_ITEMS)
    }

    pub fn with_limits(bounds: BoundingBox, max_depth: usize, max_items: usize) -> Self {
        Self {
            root: QuadNode::new(bounds, 0),
            max_depth,
            max_items: max_items.max(1),
            len: 0,
        }
    }

    /// Build a tree covering every item. The root bounds are the union of the
    /// item boxes (or `fallback` when there are none), padded by one unit so
    /// edge-aligned items fit.
    pub fn build(
        items: impl IntoIterator<Item = (K, BoundingBox)>,
        fallback: BoundingBox,
    ) -> Self {
        let items: Vec<(K, BoundingBox)> = items.into_iter().collect();
        let bounds = BoundingBox::union_all(items.iter().map(|(_, b)| *b))
            .unwrap_or(fallback)
            .expand(1.0);
        let mut tree = Self::new(bounds);
        for (id, b) in items {
            tree.insert(id, b);
        }
        tree
    }

    /// Insert an item. Items outside the root bounds are kept at the root.
    pub fn insert(&mut self, id: K, bounds: BoundingBox) {
        self.root.insert(id, bounds, self.max_depth, self.max_items);
        self.len += 1;
    }

    pub fn query(&self, region: &BoundingBox) -> Vec<K> {
        let mut out = Vec::new();
        // root items outside the root bounds must still be visited
        for (id, b) in &self.root.items {
            if !self.root.bounds.overlaps_inclusive(region) && b.overlaps_inclusive(region) {
                out.push(id.clone());
            }
        }
        self.root.query(region, &mut out);
        out
    }

    /// Items overlapping the square of half-extent `radius` around `center`.
    pub fn query_radius(&self, center: Vec2, radius: f64) -> Vec<K> {
        let region = BoundingBox::new(
            Vec2::new(center.x - radius, center.y - radius),
            Vec2::new(center.x + radius, center.y + radius),
        );
        let mut out = Vec::new();
        self.root.query(&region, &mut out);
        // the root walk is bounded by the root box; catch outliers too
        if !self.root.bounds.overlaps_inclusive(&region) {
            out.extend(
                self.root
                    .items
                    .iter()
                    .filter(|(_, b)| b.overlaps_inclusive(&region))
                    .map(|(id, _)| id.clone()),
            );
        }
        out
    }

    pub fn bounds(&self) -> BoundingBox {
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

    pub fn clear(&mut self) {
        self.root = QuadNode::new(self.root.bounds, 0);
        self.len = 0;
    }
}
