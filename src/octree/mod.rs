mod iter;
mod node;

pub use iter::NodeIterator;
pub use node::{MassDistribution, Node};

use rayon::prelude::*;

use crate::{
    bounds::{Bounds, OCTANTS},
    error::OctreeError,
    settings::{OctreeSettings, OutOfBoundsPolicy},
    shared::{Float, Item, PointMass, to_f64},
    stats::{QueryStats, TreeStats},
};

/// A root node together with the settings it was built with and the
/// counters gathered while inserting into it.
#[derive(Debug, Clone)]
pub struct Octree<F: Float, P: PointMass<F> = Item<F>> {
    root: Node<F, P>,
    settings: OctreeSettings,
    stats: TreeStats,
    len: usize,
}

impl<F: Float, P: PointMass<F>> Octree<F, P> {
    pub fn new(bounds: Bounds<F>, settings: OctreeSettings) -> Result<Self, OctreeError> {
        settings.validate()?;
        let root = Node::new_root(bounds)?;
        let mut stats = TreeStats::default();
        stats.record_node(root.depth());
        Ok(Self {
            root,
            settings,
            stats,
            len: 0,
        })
    }

    pub fn root(&self) -> &Node<F, P> {
        &self.root
    }

    pub fn bounds(&self) -> &Bounds<F> {
        self.root.bounds()
    }

    pub fn settings(&self) -> &OctreeSettings {
        &self.settings
    }

    pub fn stats(&self) -> &TreeStats {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn check(&self, item: &P) -> Result<(), OctreeError> {
        let position = item.position();
        match self.settings.out_of_bounds {
            OutOfBoundsPolicy::Accept => Ok(()),
            OutOfBoundsPolicy::Reject if self.bounds().contains(position) => Ok(()),
            OutOfBoundsPolicy::Reject => Err(OctreeError::OutOfBounds {
                x: to_f64(position.x),
                y: to_f64(position.y),
                z: to_f64(position.z),
            }),
        }
    }

    pub fn add(&mut self, item: P) -> Result<(), OctreeError> {
        self.check(&item)?;
        self.root.add(item, &self.settings, &mut self.stats);
        self.len += 1;
        Ok(())
    }

    /// Inserts a batch. Every item is checked before any is inserted, so on
    /// error the tree is left untouched.
    pub fn extend<I>(&mut self, items: I) -> Result<(), OctreeError>
    where
        I: IntoIterator<Item = P>,
    {
        let items: Vec<P> = items.into_iter().collect();
        for item in &items {
            self.check(item)?;
        }
        self.len += items.len();
        self.root.add_all(items, &self.settings, &mut self.stats);
        Ok(())
    }

    pub fn query(&self, bounds: &Bounds<F>) -> Vec<&P> {
        self.root.query(bounds)
    }

    pub fn query_with_stats(&self, bounds: &Bounds<F>, stats: &mut QueryStats) -> Vec<&P> {
        self.root.query_with_stats(bounds, stats)
    }

    pub fn calculate_mass_distribution(&mut self) -> MassDistribution<F> {
        self.root.calculate_mass_distribution()
    }
}

impl<F: Float, P: PointMass<F> + Send> Octree<F, P> {
    /// Builds a tree from `items` with the eight root octants filled in
    /// parallel. Items keep their relative order inside each octant, so the
    /// result is the same tree sequential insertion would produce.
    pub fn par_build(
        bounds: Bounds<F>,
        settings: OctreeSettings,
        items: Vec<P>,
    ) -> Result<Self, OctreeError> {
        let mut tree = Self::new(bounds, settings)?;
        for item in &items {
            tree.check(item)?;
        }
        tree.len = items.len();

        let Octree {
            root,
            settings,
            stats,
            ..
        } = &mut tree;
        let settings = &*settings;

        if items.len() <= settings.max_items || root.depth() >= settings.max_depth {
            root.add_all(items, settings, stats);
            return Ok(tree);
        }

        let root_bounds = *root.bounds();
        let mut buckets: Vec<Vec<P>> = (0..OCTANTS).map(|_| Vec::new()).collect();
        for item in items {
            buckets[root_bounds.sub_octant_index(item.position())].push(item);
        }

        root.subdivide(settings, stats);
        if let Some(children) = root.children_mut() {
            let built = children
                .par_iter_mut()
                .zip(buckets.into_par_iter())
                .map(|(child, bucket)| {
                    let mut child_stats = TreeStats::default();
                    child.add_all(bucket, settings, &mut child_stats);
                    child_stats
                })
                .reduce(TreeStats::default, TreeStats::merge);
            *stats = stats.merge(built);
        }

        log::debug!(
            "parallel build placed {} items in {} nodes",
            tree.len,
            tree.stats.nodes
        );
        Ok(tree)
    }
}
