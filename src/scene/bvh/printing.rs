use std::fmt::Display;

use crate::util::Stats;

use super::{Bvh, NodeIdx, NodeKind};

#[derive(Clone, Debug)]
pub struct BvhStatistics {
    pub node_count: usize,
    pub leaf_count: usize,
    /// Depth of leaves, root alone has depth 1
    pub depth: Stats,
    /// Number of primitives per leaf
    pub leaf_size: Stats,
}

impl Bvh {
    pub fn statistics(&self) -> BvhStatistics {
        let mut leaf_size = Stats::default();
        leaf_size.add_samples(self.nodes.iter().filter_map(|node| match &node.kind {
            NodeKind::Leaf { primitives } => Some(primitives.len()),
            NodeKind::Inner { .. } => None,
        }));

        BvhStatistics {
            node_count: self.nodes.len(),
            leaf_count: leaf_size.count,
            depth: self.depth_statistics(),
            leaf_size,
        }
    }

    /// Walks the tree with an explicit stack, degenerate trees can be very deep.
    fn depth_statistics(&self) -> Stats {
        let mut stats = Stats::default();
        if self.nodes.is_empty() {
            return stats;
        }

        let mut stack = vec![(NodeIdx::ROOT, 1)];
        while let Some((index, depth)) = stack.pop() {
            match &self.nodes[index].kind {
                NodeKind::Leaf { .. } => stats.add_sample(depth),
                NodeKind::Inner { children, .. } => {
                    stack.extend(children.iter().map(|child| (*child, depth + 1)));
                }
            }
        }

        stats
    }
}

impl Display for BvhStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Nodes: {} ({} leaves)", self.node_count, self.leaf_count)?;
        writeln!(f, "Depth: {}", self.depth)?;
        write!(f, "Leaf size: {}", self.leaf_size)
    }
}

#[cfg(test)]
mod test {
    use std::num::NonZeroUsize;

    use super::*;
    use crate::{
        geometry::{FloatType, WorldPoint},
        scene::{MaterialIdx, Primitive, primitives::Sphere},
    };
    use assert2::assert;

    fn spheres(count: usize) -> Vec<Box<dyn Primitive>> {
        (0..count)
            .map(|i| {
                Box::new(Sphere::new(
                    WorldPoint::new(i as FloatType, 0.0, 0.0),
                    0.25,
                    MaterialIdx::new(0),
                )) as Box<dyn Primitive>
            })
            .collect()
    }

    #[test]
    fn balanced_tree() {
        let bvh = Bvh::build(spheres(8), NonZeroUsize::new(1).unwrap());
        let stats = bvh.statistics();

        assert!(stats.node_count == 15);
        assert!(stats.leaf_count == 8);
        assert!(stats.depth.min == 4);
        assert!(stats.depth.max == 4);
        assert!(stats.leaf_size.max == 1);
    }

    #[test]
    fn single_leaf() {
        let bvh = Bvh::build(spheres(3), NonZeroUsize::new(4).unwrap());
        let stats = bvh.statistics();

        assert!(stats.node_count == 1);
        assert!(stats.depth == Stats::new_single(1));
        assert!(stats.leaf_size == Stats::new_single(3));
    }

    #[test]
    fn empty_tree_has_one_empty_leaf() {
        let bvh = Bvh::build(Vec::new(), NonZeroUsize::new(4).unwrap());
        let stats = bvh.statistics();

        assert!(stats.leaf_count == 1);
        assert!(stats.leaf_size == Stats::new_single(0));
    }

    #[test]
    fn display_lists_all_parts() {
        let bvh = Bvh::build(spheres(8), NonZeroUsize::new(2).unwrap());
        let output = bvh.statistics().to_string();

        assert!(output.contains("Nodes: 7 (4 leaves)"));
        assert!(output.contains("Depth: 3 - 3"));
        assert!(output.contains("Leaf size: 2 - 2"));
    }
}
