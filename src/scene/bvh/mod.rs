mod building;
mod printing;
mod ray_bvh_intersection;

use std::{
    num::NonZeroUsize,
    sync::atomic::{AtomicU64, Ordering},
};

use index_vec::IndexVec;

use crate::geometry::WorldBox;

use super::{Primitive, PrimitiveIdx};

pub use printing::BvhStatistics;

/// Binary bounding volume hierarchy over boxed primitives.
///
/// Nodes live in an arena, the root is always the first node. Every node
/// covers a contiguous range of the (reordered) primitive array.
pub struct Bvh {
    nodes: IndexVec<NodeIdx, Node>,
    primitives: IndexVec<PrimitiveIdx, Box<dyn Primitive>>,
    max_leaf_size: NonZeroUsize,

    /// Number of ray-primitive tests done by all queries so far
    intersection_tests: AtomicU64,
}

#[derive(Clone, Debug)]
struct Node {
    bounding_box: WorldBox,
    kind: NodeKind,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum NodeKind {
    Leaf {
        primitives: PrimitiveRange,
    },
    Inner {
        /// Children below and at-or-above the split point
        children: [NodeIdx; 2],
        split_axis: usize,
    },
}

index_vec::define_index_type! {
    struct NodeIdx = u32;
}

impl NodeIdx {
    const ROOT: NodeIdx = NodeIdx::from_raw_unchecked(0);
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct PrimitiveRange {
    first: PrimitiveIdx,
    end: PrimitiveIdx,
}

impl PrimitiveRange {
    fn new(first: usize, count: usize) -> PrimitiveRange {
        PrimitiveRange {
            first: PrimitiveIdx::new(first),
            end: PrimitiveIdx::new(first + count),
        }
    }

    fn len(&self) -> usize {
        self.end.index() - self.first.index()
    }

    fn iter(self) -> impl Iterator<Item = PrimitiveIdx> {
        (self.first.index()..self.end.index()).map(PrimitiveIdx::new)
    }
}

impl Bvh {
    pub fn primitive_count(&self) -> usize {
        self.primitives.len()
    }

    pub fn primitive(&self, index: PrimitiveIdx) -> &dyn Primitive {
        self.primitives[index].as_ref()
    }

    /// Total number of ray-primitive tests since construction.
    /// Only meant for diagnostics, the count is updated with relaxed ordering.
    pub fn intersection_test_count(&self) -> u64 {
        self.intersection_tests.load(Ordering::Relaxed)
    }

    fn count_intersection_test(&self) {
        self.intersection_tests.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        geometry::{
            FloatType, Ray, RayInterval, Triangle, WorldPoint, WorldVector,
            test::{RayWrapper, world_point},
        },
        scene::{
            HitRecord, MaterialIdx, Object,
            primitives::{MeshTriangle, Sphere},
        },
    };
    use assert2::{assert, let_assert};
    use proptest::prelude::*;
    use test_case::test_case;
    use test_strategy::proptest;

    fn leaf_size(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    fn random_primitive() -> impl Strategy<Value = Box<dyn Primitive>> {
        prop_oneof![
            (world_point(), 0.1f32..3.0).prop_map(|(center, radius)| {
                Box::new(Sphere::new(center, radius, MaterialIdx::new(0))) as Box<dyn Primitive>
            }),
            (world_point(), world_point(), world_point()).prop_map(|(a, b, c)| {
                Box::new(MeshTriangle::new(
                    Triangle::new(a, b, c),
                    None,
                    MaterialIdx::new(1),
                )) as Box<dyn Primitive>
            }),
        ]
    }

    fn brute_force_closest(
        primitives: &[Box<dyn Primitive>],
        ray: &Ray,
    ) -> Option<HitRecord> {
        let mut interval = RayInterval::default();
        let mut best = None;
        for p in primitives {
            if let Some(hit) = p.intersect(ray, &mut interval) {
                best = Some(hit);
            }
        }
        best
    }

    #[proptest(cases = 64)]
    fn matches_brute_force(
        #[strategy(proptest::collection::vec(random_primitive(), 0..40))] primitives: Vec<
            Box<dyn Primitive>,
        >,
        #[strategy(1usize..6)] max_leaf_size: usize,
        #[strategy(proptest::collection::vec(any::<RayWrapper>(), 8))] rays: Vec<RayWrapper>,
    ) {
        let bvh = Bvh::build(primitives, leaf_size(max_leaf_size));
        // Reordering during the build keeps every primitive, so scanning the arena is a full scan
        let reference = &bvh.primitives.raw;

        for ray in rays.iter() {
            let expected = brute_force_closest(reference, ray);
            let actual = bvh.intersect(ray, &mut RayInterval::default());

            match (expected, actual) {
                (None, None) => {}
                (Some(e), Some(a)) => {
                    assert!((e.t - a.t).abs() <= 1e-4 * e.t.max(1.0));
                    assert!(a.primitive != PrimitiveIdx::default());
                }
                (e, a) => panic!("brute force {e:?}, bvh {a:?}"),
            }
        }
    }

    #[proptest(cases = 64)]
    fn existence_agrees_with_closest_hit(
        #[strategy(proptest::collection::vec(random_primitive(), 0..30))] primitives: Vec<
            Box<dyn Primitive>,
        >,
        ray: RayWrapper,
    ) {
        let bvh = Bvh::build(primitives, leaf_size(2));

        let mut closest_interval = RayInterval::default();
        let closest = bvh.intersect(&ray, &mut closest_interval);

        let mut any_interval = RayInterval::default();
        let any = bvh.has_intersection(&ray, &mut any_interval);

        assert!(any == closest.is_some());
        if let Some(hit) = closest {
            assert!(closest_interval.max_t == hit.t);
            assert!(any_interval.max_t >= hit.t);
            let primitive = bvh.primitive(hit.primitive);
            assert!(primitive.material() == hit.material);
        }
    }

    #[proptest(cases = 32)]
    fn leaves_respect_size_limit(
        #[strategy(proptest::collection::vec(random_primitive(), 1..100))] primitives: Vec<
            Box<dyn Primitive>,
        >,
        #[strategy(1usize..8)] max_leaf_size: usize,
    ) {
        let count = primitives.len();
        let bvh = Bvh::build(primitives, leaf_size(max_leaf_size));
        let stats = bvh.statistics();

        assert!(stats.leaf_size.max <= max_leaf_size);
        assert!(stats.leaf_size.count == stats.leaf_count);
        assert!((stats.leaf_size.avg * stats.leaf_count as f32 - count as f32).abs() < 1e-2);
        assert!(bvh.primitive_count() == count);
    }

    #[test_case(1)]
    #[test_case(3)]
    #[test_case(8)]
    fn coincident_centroids_terminate(max_leaf_size: usize) {
        let primitives = (0..100)
            .map(|i| {
                Box::new(Sphere::new(
                    WorldPoint::new(1.0, 2.0, 3.0),
                    0.5 + i as FloatType * 0.01,
                    MaterialIdx::new(0),
                )) as Box<dyn Primitive>
            })
            .collect();
        let bvh = Bvh::build(primitives, leaf_size(max_leaf_size));
        let stats = bvh.statistics();

        assert!(stats.leaf_size.max <= max_leaf_size);
        assert!(bvh.primitive_count() == 100);

        let ray = Ray::new(WorldPoint::new(1.0, 2.0, -10.0), WorldVector::z());
        let_assert!(Some(hit) = bvh.intersect(&ray, &mut RayInterval::default()));
        // The largest sphere is hit first
        assert!((hit.t - (13.0 - 1.49)).abs() < 1e-4);
    }

    #[test]
    fn empty_bvh_never_hits() {
        let bvh = Bvh::build(Vec::new(), leaf_size(4));
        let ray = Ray::new(WorldPoint::origin(), WorldVector::new(1.0, 1.0, 1.0));

        assert!(bvh.bounding_box().is_empty());
        assert!(bvh.intersect(&ray, &mut RayInterval::default()).is_none());
        assert!(!bvh.has_intersection(&ray, &mut RayInterval::default()));
        assert!(bvh.intersection_test_count() == 0);
    }

    #[test]
    fn counter_tracks_primitive_tests() {
        let primitives = (0..4)
            .map(|i| {
                Box::new(Sphere::new(
                    WorldPoint::new(i as FloatType * 10.0, 0.0, 0.0),
                    1.0,
                    MaterialIdx::new(0),
                )) as Box<dyn Primitive>
            })
            .collect();
        let bvh = Bvh::build(primitives, leaf_size(1));

        let ray = Ray::new(WorldPoint::new(0.0, 0.0, -5.0), WorldVector::z());
        assert!(bvh.intersect(&ray, &mut RayInterval::default()).is_some());

        // Only the leaf containing the first sphere should be visited
        assert!(bvh.intersection_test_count() == 1);
    }

    #[test]
    fn hit_reports_reordered_primitive() {
        let primitives = (0..10)
            .map(|i| {
                Box::new(Sphere::new(
                    WorldPoint::new(0.0, 0.0, i as FloatType * 3.0),
                    1.0,
                    MaterialIdx::new(i),
                )) as Box<dyn Primitive>
            })
            .collect();
        let bvh = Bvh::build(primitives, leaf_size(2));

        let ray = Ray::new(WorldPoint::new(0.0, 0.0, 100.0), -WorldVector::z());
        let_assert!(Some(hit) = bvh.intersect(&ray, &mut RayInterval::default()));
        assert!(hit.material == MaterialIdx::new(9));
        assert!(bvh.primitive(hit.primitive).material() == MaterialIdx::new(9));
        assert!((hit.t - 72.0).abs() < 1e-4);
    }
}
