use crate::{
    geometry::{FloatType, Ray, RayInterval, WorldBox},
    scene::{HitRecord, Object},
};

use super::{Bvh, NodeIdx, NodeKind};

impl Object for Bvh {
    fn bounding_box(&self) -> WorldBox {
        self.nodes
            .first()
            .map_or_else(WorldBox::empty, |root| root.bounding_box)
    }

    fn has_intersection(&self, ray: &Ray, interval: &mut RayInterval) -> bool {
        let mut stack = Vec::new();
        self.push_if_hit(&mut stack, NodeIdx::ROOT, ray, interval);

        while let Some((index, _)) = stack.pop() {
            match &self.nodes[index].kind {
                NodeKind::Leaf { primitives } => {
                    let hit = primitives.iter().any(|i| {
                        self.count_intersection_test();
                        self.primitives[i].has_intersection(ray, interval)
                    });
                    if hit {
                        return true;
                    }
                }
                NodeKind::Inner {
                    children,
                    split_axis,
                } => self.push_children(&mut stack, children, *split_axis, ray, interval),
            }
        }

        false
    }

    fn intersect(&self, ray: &Ray, interval: &mut RayInterval) -> Option<HitRecord> {
        let mut stack = Vec::new();
        self.push_if_hit(&mut stack, NodeIdx::ROOT, ray, interval);

        let mut best = None;
        while let Some((index, entry_t)) = stack.pop() {
            if entry_t > interval.max_t {
                // Something closer than the whole node was found since it was pushed
                continue;
            }

            match &self.nodes[index].kind {
                NodeKind::Leaf { primitives } => {
                    for i in primitives.iter() {
                        self.count_intersection_test();
                        // Every hit shrinks the interval, so a later hit is always closer
                        if let Some(hit) = self.primitives[i].intersect(ray, interval) {
                            best = Some(HitRecord {
                                primitive: i,
                                ..hit
                            });
                        }
                    }
                }
                NodeKind::Inner {
                    children,
                    split_axis,
                } => self.push_children(&mut stack, children, *split_axis, ray, interval),
            }
        }

        best
    }
}

impl Bvh {
    fn push_if_hit(
        &self,
        stack: &mut Vec<(NodeIdx, FloatType)>,
        index: NodeIdx,
        ray: &Ray,
        interval: &RayInterval,
    ) {
        let Some(node) = self.nodes.get(index) else {
            return;
        };
        if let Some(overlap) = node.bounding_box.intersect(ray, interval) {
            stack.push((index, overlap.min_t));
        }
    }

    /// Pushes children so that the one closer along the ray direction is popped first.
    fn push_children(
        &self,
        stack: &mut Vec<(NodeIdx, FloatType)>,
        children: &[NodeIdx; 2],
        split_axis: usize,
        ray: &Ray,
        interval: &RayInterval,
    ) {
        let [below, above] = *children;
        let (near, far) = if ray.direction[split_axis] < 0.0 {
            (above, below)
        } else {
            (below, above)
        };
        self.push_if_hit(stack, far, ray, interval);
        self.push_if_hit(stack, near, ray, interval);
    }
}
