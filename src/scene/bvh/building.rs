use std::{num::NonZeroUsize, sync::atomic::AtomicU64};

use index_vec::IndexVec;

use crate::{
    geometry::{FloatType, WorldBox, WorldPoint},
    scene::Primitive,
};

use super::{Bvh, Node, NodeIdx, NodeKind, PrimitiveRange};

/// Primitive data needed for splitting, moved around instead of the primitives themselves.
#[derive(Clone, Debug)]
struct BuildItem {
    /// Index into the input primitive vector
    index: usize,
    bounding_box: WorldBox,
    centroid: WorldPoint,
}

impl Bvh {
    /// Builds the hierarchy by recursive splitting at the mean centroid.
    ///
    /// Primitives are reordered so that every node refers to a contiguous range.
    #[tracing::instrument(skip_all, fields(primitive_count = primitives.len(), max_leaf_size = max_leaf_size.get()))]
    pub fn build(primitives: Vec<Box<dyn Primitive>>, max_leaf_size: NonZeroUsize) -> Bvh {
        let mut items: Vec<BuildItem> = primitives
            .iter()
            .enumerate()
            .map(|(index, primitive)| {
                let bounding_box = primitive.bounding_box();
                BuildItem {
                    index,
                    centroid: bounding_box.centroid(),
                    bounding_box,
                }
            })
            .collect();

        let mut bvh = Bvh {
            nodes: IndexVec::new(),
            primitives: IndexVec::new(),
            max_leaf_size,
            intersection_tests: AtomicU64::new(0),
        };

        let root = bvh.build_recursive(&mut items, 0);
        assert2::debug_assert!(root == NodeIdx::ROOT);

        bvh.primitives = reorder(primitives, &items);

        tracing::debug!(node_count = bvh.nodes.len(), "BVH built");
        bvh
    }

    fn build_recursive(&mut self, items: &mut [BuildItem], offset: usize) -> NodeIdx {
        let bounding_box = items.iter().fold(WorldBox::empty(), |mut b, item| {
            b.expand_box(&item.bounding_box);
            b
        });

        // Leaf node for now, gets replaced by an inner node if we split
        let node_index = self.nodes.push(Node {
            bounding_box,
            kind: NodeKind::Leaf {
                primitives: PrimitiveRange::new(offset, items.len()),
            },
        });

        if items.len() <= self.max_leaf_size.get() {
            return node_index;
        }

        let (split, split_axis) = split_items(items, &bounding_box);
        let (below, above) = items.split_at_mut(split);
        let children = [
            self.build_recursive(below, offset),
            self.build_recursive(above, offset + split),
        ];

        self.nodes[node_index].kind = NodeKind::Inner {
            children,
            split_axis,
        };

        node_index
    }
}

/// Partitions items around the mean centroid along the axis where centroids are spread the most.
/// Returns the number of items in the lower half and the split axis.
/// Both halves are always non-empty, items.len() must be at least 2.
fn split_items(items: &mut [BuildItem], node_box: &WorldBox) -> (usize, usize) {
    let centroid_box = WorldBox::from_points(items.iter().map(|item| &item.centroid));
    let axis = if centroid_box.is_empty() {
        node_box.longest_axis()
    } else {
        centroid_box.longest_axis()
    };

    let mean = items.iter().map(|item| item.centroid[axis]).sum::<FloatType>()
        / items.len() as FloatType;

    let split = itertools::partition(items.iter_mut(), |item| item.centroid[axis] < mean);

    // All centroids on one side of the mean (coincident centroids, NaNs),
    // move a single item over to guarantee progress.
    let split = if split == 0 {
        1
    } else if split == items.len() {
        items.len() - 1
    } else {
        split
    };

    (split, axis)
}

/// Puts primitives into the order in which the build items ended up.
fn reorder(
    primitives: Vec<Box<dyn Primitive>>,
    items: &[BuildItem],
) -> IndexVec<super::PrimitiveIdx, Box<dyn Primitive>> {
    let mut new_positions = vec![0; items.len()];
    for (position, item) in items.iter().enumerate() {
        new_positions[item.index] = position;
    }

    let mut positioned: Vec<_> = new_positions.into_iter().zip(primitives).collect();
    positioned.sort_unstable_by_key(|(position, _)| *position);
    positioned.into_iter().map(|(_, primitive)| primitive).collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geometry::WorldVector;
    use assert2::assert;

    fn item(index: usize, x: FloatType) -> BuildItem {
        let centroid = WorldPoint::new(x, 0.0, 0.0);
        BuildItem {
            index,
            bounding_box: WorldBox::new(centroid, centroid + WorldVector::repeat(0.1)),
            centroid,
        }
    }

    #[test]
    fn split_at_mean() {
        let mut items = vec![item(0, 10.0), item(1, 0.0), item(2, 1.0), item(3, 9.0)];
        let node_box = WorldBox::new(WorldPoint::origin(), WorldPoint::new(10.1, 0.1, 0.1));

        let (split, axis) = split_items(&mut items, &node_box);

        assert!(axis == 0);
        assert!(split == 2);
        assert!(items[..2].iter().all(|item| item.centroid.x < 5.0));
        assert!(items[2..].iter().all(|item| item.centroid.x >= 5.0));
    }

    #[test]
    fn degenerate_split_moves_one_item() {
        let mut items = vec![item(0, 3.0), item(1, 3.0), item(2, 3.0)];
        let node_box = WorldBox::new(WorldPoint::new(3.0, 0.0, 0.0), WorldPoint::new(3.1, 0.1, 0.1));

        let (split, _) = split_items(&mut items, &node_box);
        assert!(split == 1);
    }

    #[test]
    fn axis_follows_centroid_spread() {
        // Node box is widest along x, but centroids only differ along z
        let mut items: Vec<_> = (0..4)
            .map(|i| {
                let centroid = WorldPoint::new(0.0, 0.0, i as FloatType);
                BuildItem {
                    index: i,
                    bounding_box: WorldBox::new(
                        centroid - WorldVector::new(50.0, 0.1, 0.1),
                        centroid + WorldVector::new(50.0, 0.1, 0.1),
                    ),
                    centroid,
                }
            })
            .collect();
        let node_box = WorldBox::new(WorldPoint::new(-50.0, -0.1, -0.1), WorldPoint::new(50.0, 0.1, 3.1));

        let (split, axis) = split_items(&mut items, &node_box);
        assert!(axis == 2);
        assert!(split == 2);
    }
}
