use crate::geometry::{Ray, RayInterval, WorldBox};

impl WorldBox {
    /// Slab test of the ray against the box, restricted to `interval`.
    ///
    /// Returns the part of `interval` that lies inside the box, or None if it is empty.
    /// Rays parallel to a slab miss unless their origin is inside that slab, in which
    /// case the slab doesn't restrict the interval at all.
    pub fn intersect(&self, ray: &Ray, interval: &RayInterval) -> Option<RayInterval> {
        if self.is_empty() {
            return None;
        }

        let mut t0 = interval.min_t;
        let mut t1 = interval.max_t;

        for axis in 0..3 {
            let origin = ray.origin[axis];
            let slab_min = self.min[axis];
            let slab_max = self.max[axis];

            if ray.direction[axis] == 0.0 {
                if origin < slab_min || origin > slab_max {
                    return None;
                }
                continue;
            }

            let inv_direction = ray.inv_direction[axis];
            let to_min = (slab_min - origin) * inv_direction;
            let to_max = (slab_max - origin) * inv_direction;
            let (near, far) = if to_min <= to_max {
                (to_min, to_max)
            } else {
                (to_max, to_min)
            };

            t0 = t0.max(near);
            t1 = t1.min(far);

            if t0 > t1 {
                return None;
            }
        }

        Some(RayInterval { min_t: t0, max_t: t1 })
    }
}

#[cfg(test)]
pub mod test {
    use assert2::{assert, let_assert};
    use test_case::{test_case, test_matrix};

    use super::*;

    use crate::geometry::{FloatType, WorldPoint, WorldVector};

    fn everywhere() -> RayInterval {
        RayInterval::new(FloatType::NEG_INFINITY, FloatType::INFINITY)
    }

    fn test_box() -> WorldBox {
        WorldBox::new([5.0, 5.0, 5.0].into(), [10.0, 10.0, 10.0].into())
    }

    /// Checks cases when the ray hits the box, including some corner cases.
    #[test_matrix(
        [5.0, 7.0, 10.0],
        [5.0, 7.0, 10.0],
        [5.0, 7.0, 10.0],
        [-1.0, 0.0, 2.0],
        [-1.0, 0.0, 2.0],
        [-1.0, 0.0, 2.0],
        [-10.0, -1.0, 0.0, 2.0, 5.0, 20.0]
    )]
    fn hit(px: f32, py: f32, pz: f32, dx: f32, dy: f32, dz: f32, origin_pos: f32) {
        if dx == 0.0 && dy == 0.0 && dz == 0.0 {
            return;
        }

        let b = test_box();
        if line_overlap_length(&b, [px, py, pz], [dx, dy, dz]) < 1e-3 {
            // The line only touches the box in a single point, rounding decides these.
            return;
        }

        let p = WorldPoint::new(px, py, pz);
        let d = WorldVector::new(dx, dy, dz);
        let temp_r = Ray::new(p, d);
        let origin = temp_r.point_at(origin_pos);
        let r = Ray::new(origin, d);

        let result = b.intersect(&r, &everywhere());

        let_assert!(
            Some(RayInterval { min_t: t1, max_t: t2 }) = result,
            "The ray passes through {p:?}, we should always have an intersection"
        );
        assert!(t1 <= t2);

        let p1 = r.point_at(t1);
        let p2 = r.point_at(t2);

        assert!(point_is_on_box_surface(&p1, &b), "{p1:?} must be in {b:?}");
        assert!(point_is_on_box_surface(&p2, &b), "{p2:?} must be in {b:?}");
    }

    /// Just a manual example of ray grazing along an edge.
    #[test]
    fn hit_along_edge() {
        let r = Ray::new(
            WorldPoint::new(5.0, 5.0, 0.0),
            WorldVector::new(0.0, 0.0, 1.0),
        );

        let result = test_box().intersect(&r, &everywhere());

        assert!(result == Some(RayInterval::new(5.0, 10.0)));
    }

    /// Rays that lie parallel to one axis and start outside the corresponding slab
    /// must miss, even if they move toward the box on other axes or remain unchanged.
    #[test_case( 0.0,  7.0,  7.0,   0.0, 1.0, 0.0 ; "low_x_parallel_miss")]
    #[test_case(12.0,  7.0,  7.0,   0.0, 1.0, 0.0 ; "high_x_parallel_miss")]
    #[test_case( 7.0,  0.0,  7.0,   1.0, 0.0, 0.0 ; "low_y_parallel_miss")]
    #[test_case( 7.0, 12.0,  7.0,   1.0, 0.0, 0.0 ; "high_y_parallel_miss")]
    #[test_case( 7.0,  7.0,  0.0,   1.0, 0.0, 0.0 ; "low_z_parallel_miss")]
    #[test_case( 7.0,  7.0, 12.0,   1.0, 0.0, 0.0 ; "high_z_parallel_miss")]
    #[test_case( 0.0,  5.0,  7.0,   1.0, 0.0, 1.0 ; "corner_miss")]
    #[test_case( 0.0,  0.0,  0.0,  -1.0, 1.0, 1.0 ; "corner_miss2")]
    #[test_case( 0.0,  7.0,  7.0,  -1.0, 0.0, 0.0 ; "pointing_away")]
    fn only_misses(px: f32, py: f32, pz: f32, dx: f32, dy: f32, dz: f32) {
        let r = Ray::new(WorldPoint::new(px, py, pz), WorldVector::new(dx, dy, dz));

        let result = test_box().intersect(&r, &RayInterval::default());

        assert!(result == None);
    }

    #[test]
    fn box_beyond_current_interval_is_pruned() {
        let r = Ray::new(
            WorldPoint::new(7.0, 7.0, 0.0),
            WorldVector::new(0.0, 0.0, 1.0),
        );

        assert!(test_box().intersect(&r, &RayInterval::new(0.0, 4.9)) == None);

        let_assert!(Some(narrowed) = test_box().intersect(&r, &RayInterval::new(0.0, 6.0)));
        assert!(narrowed == RayInterval::new(5.0, 6.0));
    }

    #[test]
    fn origin_inside_box() {
        let r = Ray::new(
            WorldPoint::new(7.0, 7.0, 7.0),
            WorldVector::new(1.0, 0.0, 0.0),
        );

        let_assert!(Some(interval) = test_box().intersect(&r, &RayInterval::default()));
        assert!(interval.min_t == 0.0);
        assert!((interval.max_t - 3.0).abs() < 1e-6);
    }

    #[test]
    fn empty_box_never_intersects() {
        let r = Ray::new(WorldPoint::origin(), WorldVector::new(1.0, 1.0, 1.0));
        assert!(WorldBox::empty().intersect(&r, &everywhere()) == None);
    }

    #[test]
    fn flat_box_is_hit() {
        let b = WorldBox::new([0.0, 0.0, 0.0].into(), [1.0, 1.0, 0.0].into());
        let r = Ray::new(
            WorldPoint::new(0.5, 0.5, -1.0),
            WorldVector::new(0.0, 0.0, 1.0),
        );

        assert!(b.intersect(&r, &RayInterval::default()) == Some(RayInterval::new(1.0, 1.0)));
    }

    /// Length of the overlap between the box and the line `p + s * d`, in units of `s`,
    /// calculated in f64.
    fn line_overlap_length(b: &WorldBox, p: [f32; 3], d: [f32; 3]) -> f64 {
        let mut s0 = f64::NEG_INFINITY;
        let mut s1 = f64::INFINITY;
        for axis in 0..3 {
            if d[axis] == 0.0 {
                continue;
            }
            let a = (b.min[axis] as f64 - p[axis] as f64) / d[axis] as f64;
            let c = (b.max[axis] as f64 - p[axis] as f64) / d[axis] as f64;
            s0 = s0.max(a.min(c));
            s1 = s1.min(a.max(c));
        }
        s1 - s0
    }

    fn point_is_on_box_surface(p: &WorldPoint, b: &WorldBox) -> bool {
        const TOLERANCE: f32 = 1e-3;

        // Check if point is within the box's bounds (inclusive, with tolerance)
        let inside_x = p.x >= b.min.x - TOLERANCE && p.x <= b.max.x + TOLERANCE;
        let inside_y = p.y >= b.min.y - TOLERANCE && p.y <= b.max.y + TOLERANCE;
        let inside_z = p.z >= b.min.z - TOLERANCE && p.z <= b.max.z + TOLERANCE;

        if !(inside_x && inside_y && inside_z) {
            return false; // outside the box entirely
        }

        let on_x_face = (p.x - b.min.x).abs() <= TOLERANCE || (p.x - b.max.x).abs() <= TOLERANCE;
        let on_y_face = (p.y - b.min.y).abs() <= TOLERANCE || (p.y - b.max.y).abs() <= TOLERANCE;
        let on_z_face = (p.z - b.min.z).abs() <= TOLERANCE || (p.z - b.max.z).abs() <= TOLERANCE;

        on_x_face || on_y_face || on_z_face
    }
}
