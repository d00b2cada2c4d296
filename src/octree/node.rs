use nalgebra::Vector3;

use crate::{
    bounds::{Bounds, OCTANTS},
    error::OctreeError,
    settings::OctreeSettings,
    shared::{Float, Item, PointMass},
    stats::{QueryStats, TreeStats},
};

use super::iter::NodeIterator;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MassDistribution<F: Float> {
    pub center: Vector3<F>,
    pub mass: F,
}

impl<F: Float> MassDistribution<F> {
    pub fn zero() -> Self {
        Self {
            center: Vector3::zeros(),
            mass: F::zero(),
        }
    }

    /// Folds one weighted position into the running average. Steps that would
    /// leave a non-positive total are skipped so the division stays defined.
    pub fn accumulate(&mut self, position: &Vector3<F>, mass: F) {
        let total_mass = self.mass + mass;
        if total_mass > F::zero() {
            self.center = (self.center.scale(self.mass) + position.scale(mass)) / total_mass;
            self.mass = total_mass;
        }
    }
}

impl<F: Float> Default for MassDistribution<F> {
    fn default() -> Self {
        Self::zero()
    }
}

#[derive(Debug, Clone)]
enum Contents<F: Float, P: PointMass<F>> {
    Leaf(Vec<P>),
    Internal(Box<[Node<F, P>; OCTANTS]>),
}

/// One octant of space: either a leaf holding items, or eight children that
/// exactly tile its bounds.
#[derive(Debug, Clone)]
pub struct Node<F: Float, P: PointMass<F> = Item<F>> {
    bounds: Bounds<F>,
    depth: usize,
    contents: Contents<F, P>,
    mass: MassDistribution<F>,
}

impl<F: Float, P: PointMass<F>> Node<F, P> {
    fn new(bounds: Bounds<F>, depth: usize) -> Self {
        Self {
            bounds,
            depth,
            contents: Contents::Leaf(Vec::new()),
            mass: MassDistribution::zero(),
        }
    }

    pub fn new_root(bounds: Bounds<F>) -> Result<Self, OctreeError> {
        bounds.validate()?;
        Ok(Self::new(bounds, 1))
    }

    pub fn bounds(&self) -> &Bounds<F> {
        &self.bounds
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.contents, Contents::Leaf(_))
    }

    /// Items held directly. Always empty for internal nodes.
    pub fn items(&self) -> &[P] {
        match &self.contents {
            Contents::Leaf(items) => items,
            Contents::Internal(_) => &[],
        }
    }

    pub fn children(&self) -> Option<&[Node<F, P>; OCTANTS]> {
        match &self.contents {
            Contents::Leaf(_) => None,
            Contents::Internal(children) => Some(&**children),
        }
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut [Node<F, P>; OCTANTS]> {
        match &mut self.contents {
            Contents::Leaf(_) => None,
            Contents::Internal(children) => Some(&mut **children),
        }
    }

    /// Result of the last [`Node::calculate_mass_distribution`] pass.
    pub fn mass(&self) -> &MassDistribution<F> {
        &self.mass
    }

    pub fn len(&self) -> usize {
        match &self.contents {
            Contents::Leaf(items) => items.len(),
            Contents::Internal(children) => children.iter().map(Node::len).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> NodeIterator<'_, F, P> {
        self.into_iter()
    }

    /// Inserts `item`, subdividing the leaf it lands in once that leaf holds
    /// more than `settings.max_items` items and sits above `settings.max_depth`.
    ///
    /// No bounds check happens here: an item outside this node is routed by
    /// midpoint comparisons like any other.
    pub fn add(&mut self, item: P, settings: &OctreeSettings, stats: &mut TreeStats) {
        let held = match &mut self.contents {
            Contents::Internal(children) => {
                let octant = self.bounds.sub_octant_index(item.position());
                children[octant].add(item, settings, stats);
                return;
            }
            Contents::Leaf(items) => {
                items.push(item);
                items.len()
            }
        };

        if held > settings.max_items {
            if self.depth < settings.max_depth {
                self.subdivide(settings, stats);
            } else if held == settings.max_items + 1 {
                stats.overfull_leaves += 1;
                log::debug!(
                    "leaf at max depth {} exceeded {} items",
                    self.depth,
                    settings.max_items
                );
            }
        }
    }

    pub fn add_all<I>(&mut self, items: I, settings: &OctreeSettings, stats: &mut TreeStats)
    where
        I: IntoIterator<Item = P>,
    {
        for item in items {
            self.add(item, settings, stats);
        }
    }

    pub(crate) fn subdivide(&mut self, settings: &OctreeSettings, stats: &mut TreeStats) {
        let items = match &mut self.contents {
            Contents::Leaf(items) => std::mem::take(items),
            Contents::Internal(_) => return,
        };

        let child_depth = self.depth + 1;
        let children = self.bounds.octants().map(|b| Node::new(b, child_depth));
        self.contents = Contents::Internal(Box::new(children));
        stats.record_subdivision(child_depth);
        log::trace!(
            "subdivided node at depth {} with {} items",
            self.depth,
            items.len()
        );

        for item in items {
            self.add(item, settings, stats);
        }
    }

    pub fn query(&self, bounds: &Bounds<F>) -> Vec<&P> {
        let mut stats = QueryStats::default();
        self.query_with_stats(bounds, &mut stats)
    }

    pub fn query_with_stats(&self, bounds: &Bounds<F>, stats: &mut QueryStats) -> Vec<&P> {
        let mut results = Vec::new();
        self.collect_within(bounds, &mut results, stats);
        results
    }

    fn collect_within<'a>(
        &'a self,
        bounds: &Bounds<F>,
        results: &mut Vec<&'a P>,
        stats: &mut QueryStats,
    ) {
        stats.nodes_visited += 1;
        match &self.contents {
            Contents::Leaf(items) => {
                stats.leaves_scanned += 1;
                stats.items_tested += items.len();
                results.extend(items.iter().filter(|item| bounds.contains(item.position())));
            }
            Contents::Internal(children) => {
                for child in children.iter() {
                    if child.bounds.overlaps(bounds) {
                        child.collect_within(bounds, results, stats);
                    }
                }
            }
        }
    }

    /// Recomputes the mass distribution of this node and every descendant,
    /// children first in octant order. Returns this node's result.
    pub fn calculate_mass_distribution(&mut self) -> MassDistribution<F> {
        let mut mass = MassDistribution::zero();
        match &mut self.contents {
            Contents::Leaf(items) => {
                for item in items.iter() {
                    mass.accumulate(item.position(), item.mass());
                }
            }
            Contents::Internal(children) => {
                for child in children.iter_mut() {
                    let child_mass = child.calculate_mass_distribution();
                    mass.accumulate(&child_mass.center, child_mass.mass);
                }
            }
        }
        self.mass = mass;
        mass
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    #[derive(Debug, Clone)]
    struct Tagged {
        id: usize,
        position: Vector3<f64>,
        mass: f64,
    }

    impl PointMass<f64> for Tagged {
        fn position(&self) -> &Vector3<f64> {
            &self.position
        }

        fn mass(&self) -> f64 {
            self.mass
        }
    }

    fn domain() -> Bounds<f64> {
        Bounds::cube(Vector3::zeros(), 100.0)
    }

    fn settings(max_items: usize, max_depth: usize) -> OctreeSettings {
        OctreeSettings {
            max_items,
            max_depth,
            ..Default::default()
        }
    }

    fn random_tagged(rng: &mut StdRng, count: usize) -> Vec<Tagged> {
        (0..count)
            .map(|id| Tagged {
                id,
                position: Vector3::new(
                    rng.random_range(-100.0..=100.0),
                    rng.random_range(-100.0..=100.0),
                    rng.random_range(-100.0..=100.0),
                ),
                mass: rng.random_range(0.0..2.0),
            })
            .collect()
    }

    fn build(items: Vec<Tagged>, settings: &OctreeSettings) -> (Node<f64, Tagged>, TreeStats) {
        let mut root = Node::new_root(domain()).unwrap();
        let mut stats = TreeStats::default();
        root.add_all(items, settings, &mut stats);
        (root, stats)
    }

    fn ids(found: Vec<&Tagged>) -> Vec<usize> {
        let mut ids: Vec<usize> = found.iter().map(|t| t.id).collect();
        ids.sort_unstable();
        ids
    }

    #[test]
    fn new_root_is_empty_leaf() {
        let root: Node<f64> = Node::new_root(domain()).unwrap();
        assert!(root.is_leaf());
        assert_eq!(root.depth(), 1);
        assert!(root.is_empty());
        assert!(root.children().is_none());
        assert_eq!(*root.mass(), MassDistribution::zero());
    }

    #[test]
    fn new_root_rejects_inverted_bounds() {
        let bounds = Bounds::new(Vector3::repeat(1.0), Vector3::repeat(-1.0));
        assert!(Node::<f64>::new_root(bounds).is_err());
    }

    #[test]
    fn second_item_subdivides_leaf() {
        let mut root: Node<f64> = Node::new_root(domain()).unwrap();
        let mut stats = TreeStats::default();
        let settings = settings(1, 32);

        root.add(Item::at(-10.0, -10.0, -10.0, 1.0), &settings, &mut stats);
        assert!(root.is_leaf());
        assert_eq!(root.items().len(), 1);

        root.add(Item::at(10.0, 10.0, 10.0, 1.0), &settings, &mut stats);
        assert!(!root.is_leaf());
        assert!(root.items().is_empty());

        let children = root.children().unwrap();
        assert_eq!(children[0].items().len(), 1);
        assert_eq!(children[7].items().len(), 1);
        for child in children.iter() {
            assert!(child.is_leaf());
            assert_eq!(child.depth(), 2);
        }
        assert_eq!(stats.subdivisions, 1);
        assert_eq!(stats.nodes, 8);
        assert_eq!(root.len(), 2);
    }

    #[test]
    fn children_partition_parent() {
        let mut root: Node<f64> = Node::new_root(domain()).unwrap();
        let settings = settings(1, 32);
        let mut stats = TreeStats::default();
        root.add_all(
            [Item::at(1.0, 1.0, 1.0, 1.0), Item::at(-1.0, -1.0, -1.0, 1.0)],
            &settings,
            &mut stats,
        );

        let children = root.children().unwrap();
        let center = root.bounds().center();
        for (i, child) in children.iter().enumerate() {
            assert_eq!(*child.bounds(), root.bounds().sub_octant_bounds(i));
            // the shared corner of all eight octants is the parent's center
            assert!(child.bounds().contains(&center));
        }
    }

    #[test]
    fn max_depth_caps_coincident_points() {
        let settings = settings(1, 4);
        let items = (0..50)
            .map(|id| Tagged {
                id,
                position: Vector3::new(3.0, 3.0, 3.0),
                mass: 1.0,
            })
            .collect();
        let (root, stats) = build(items, &settings);

        assert!(root.iter().all(|n| n.depth() <= 4));
        let full_leaf = root.iter().find(|n| !n.items().is_empty()).unwrap();
        assert_eq!(full_leaf.depth(), 4);
        assert_eq!(full_leaf.items().len(), 50);
        assert_eq!(stats.deepest, 4);
        assert_eq!(stats.overfull_leaves, 1);
    }

    #[test]
    fn max_depth_one_never_subdivides() {
        let settings = settings(1, 1);
        let mut rng = StdRng::seed_from_u64(3);
        let (root, stats) = build(random_tagged(&mut rng, 20), &settings);
        assert!(root.is_leaf());
        assert_eq!(root.items().len(), 20);
        assert_eq!(stats.subdivisions, 0);
    }

    #[test]
    fn depth_bound_holds_for_random_inserts() {
        let settings = settings(2, 6);
        let mut rng = StdRng::seed_from_u64(11);
        let (root, stats) = build(random_tagged(&mut rng, 2_000), &settings);

        assert_eq!(root.len(), 2_000);
        for node in root.iter() {
            assert!(node.depth() <= 6);
            if node.is_leaf() && node.depth() < 6 {
                assert!(node.items().len() <= 2);
            }
            if !node.is_leaf() {
                assert!(node.items().is_empty());
            }
        }
        assert_eq!(stats.nodes, root.iter().count() - 1);
    }

    #[test]
    fn items_land_in_leaves_that_contain_them() {
        let settings = settings(3, 10);
        let mut rng = StdRng::seed_from_u64(5);
        let (root, _) = build(random_tagged(&mut rng, 500), &settings);
        for node in root.iter() {
            for item in node.items() {
                assert!(node.bounds().contains(item.position()));
            }
        }
    }

    #[test]
    fn query_returns_only_items_in_range() {
        let mut root: Node<f64> = Node::new_root(domain()).unwrap();
        let mut stats = TreeStats::default();
        let settings = settings(1, 32);
        root.add(Item::at(0.0, 0.0, 0.0, 1.0), &settings, &mut stats);
        root.add(Item::at(10.0, 0.0, 0.0, 1.0), &settings, &mut stats);

        let found = root.query(&Bounds::cube(Vector3::zeros(), 1.0));
        assert_eq!(found.len(), 1);
        assert_eq!(*found[0].position(), Vector3::zeros());
    }

    #[test]
    fn query_matches_brute_force() {
        let mut rng = StdRng::seed_from_u64(42);
        let items = random_tagged(&mut rng, 3_000);
        let (root, _) = build(items.clone(), &settings(4, 12));

        for _ in 0..50 {
            let a = Vector3::new(
                rng.random_range(-120.0..120.0),
                rng.random_range(-120.0..120.0),
                rng.random_range(-120.0..120.0),
            );
            let b = Vector3::new(
                rng.random_range(-120.0..120.0),
                rng.random_range(-120.0..120.0),
                rng.random_range(-120.0..120.0),
            );
            let query = Bounds::new(a.inf(&b), a.sup(&b));

            let mut expected: Vec<usize> = items
                .iter()
                .filter(|t| query.contains(&t.position))
                .map(|t| t.id)
                .collect();
            expected.sort_unstable();

            let first = ids(root.query(&query));
            assert_eq!(first, expected);
            assert_eq!(ids(root.query(&query)), first);
        }
    }

    #[test]
    fn query_includes_items_on_faces() {
        let settings = settings(1, 32);
        let items = vec![
            Tagged {
                id: 0,
                position: Vector3::new(5.0, 5.0, 5.0),
                mass: 1.0,
            },
            Tagged {
                id: 1,
                position: Vector3::new(-5.0, 0.0, 0.0),
                mass: 1.0,
            },
            Tagged {
                id: 2,
                position: Vector3::new(5.000001, 0.0, 0.0),
                mass: 1.0,
            },
        ];
        let (root, _) = build(items, &settings);
        let found = root.query(&Bounds::cube(Vector3::zeros(), 5.0));
        assert_eq!(ids(found), vec![0, 1]);
    }

    #[test]
    fn query_prunes_disjoint_octants() {
        let mut rng = StdRng::seed_from_u64(9);
        let (root, _) = build(random_tagged(&mut rng, 1_000), &settings(1, 32));
        let total_nodes = root.iter().count();

        let mut stats = QueryStats::default();
        let found = root.query_with_stats(
            &Bounds::new(Vector3::repeat(90.0), Vector3::repeat(100.0)),
            &mut stats,
        );
        assert!(stats.nodes_visited < total_nodes / 4);
        assert!(stats.items_tested >= found.len());
    }

    #[test]
    fn query_on_empty_tree_is_empty() {
        let root: Node<f64> = Node::new_root(domain()).unwrap();
        assert!(root.query(&domain()).is_empty());
    }

    #[test]
    fn mass_of_two_items() {
        let mut root: Node<f64> = Node::new_root(domain()).unwrap();
        let mut stats = TreeStats::default();
        let settings = settings(1, 32);
        root.add(Item::at(0.0, 0.0, 0.0, 1.0), &settings, &mut stats);
        root.add(Item::at(10.0, 0.0, 0.0, 1.0), &settings, &mut stats);

        let mass = root.calculate_mass_distribution();
        assert_eq!(mass.mass, 2.0);
        assert!((mass.center - Vector3::new(5.0, 0.0, 0.0)).norm() < 1e-12);
        assert_eq!(*root.mass(), mass);
    }

    #[test]
    fn mass_is_conserved_and_idempotent() {
        let mut rng = StdRng::seed_from_u64(77);
        let items = random_tagged(&mut rng, 1_500);
        let total: f64 = items.iter().map(|t| t.mass).sum();
        let weighted = items
            .iter()
            .fold(Vector3::<f64>::zeros(), |acc, t| acc + t.position * t.mass)
            / total;
        let (mut root, _) = build(items, &settings(2, 16));

        let first = root.calculate_mass_distribution();
        assert!((first.mass - total).abs() < 1e-9 * total);
        assert!((first.center - weighted).norm() < 1e-9);

        let second = root.calculate_mass_distribution();
        assert!((second.mass - first.mass).abs() < 1e-12);
        assert!((second.center - first.center).norm() < 1e-12);
    }

    #[test]
    fn internal_mass_matches_children() {
        let mut rng = StdRng::seed_from_u64(21);
        let (mut root, _) = build(random_tagged(&mut rng, 200), &settings(1, 32));
        root.calculate_mass_distribution();

        for node in root.iter() {
            if let Some(children) = node.children() {
                let sum: f64 = children.iter().map(|c| c.mass().mass).sum();
                assert!((node.mass().mass - sum).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn zero_mass_items_do_not_move_center() {
        let mut leaf: Node<f64> = Node::new_root(domain()).unwrap();
        let mut stats = TreeStats::default();
        let settings = settings(8, 32);
        leaf.add(Item::at(50.0, 50.0, 50.0, 0.0), &settings, &mut stats);
        leaf.add(Item::at(-20.0, 4.0, 1.0, 0.0), &settings, &mut stats);

        let mass = leaf.calculate_mass_distribution();
        assert_eq!(mass, MassDistribution::zero());

        leaf.add(Item::at(2.0, 2.0, 2.0, 3.0), &settings, &mut stats);
        let mass = leaf.calculate_mass_distribution();
        assert_eq!(mass.mass, 3.0);
        assert_eq!(mass.center, Vector3::new(2.0, 2.0, 2.0));
    }

    #[test]
    fn non_positive_running_total_is_skipped() {
        let mut acc = MassDistribution::zero();
        acc.accumulate(&Vector3::new(1.0, 0.0, 0.0), -1.0);
        assert_eq!(acc, MassDistribution::zero());

        acc.accumulate(&Vector3::new(4.0, 0.0, 0.0), 2.0);
        acc.accumulate(&Vector3::new(0.0, 8.0, 0.0), -1.0);
        assert_eq!(acc.mass, 1.0);
        assert_eq!(acc.center, Vector3::new(8.0, -8.0, 0.0));
    }
}
