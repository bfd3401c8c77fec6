use super::{BarycentricCoordinates, FloatType, Ray, Triangle, WorldPoint};

/// Determinants smaller than this (relative to the edge lengths) are treated as
/// a ray parallel with the triangle.
const PARALLEL_EPSILON: FloatType = 1e-6;

impl Triangle<WorldPoint> {
    /// Calculates ray intersection with the (two sided) triangle.
    /// Returns distance along ray and barycentric uv coordinates of the hit, without checking
    /// the distance against any interval.
    /// Rays parallel to the triangle plane and degenerate triangles never intersect.
    /// Adapted from https://en.wikipedia.org/wiki/M%C3%B6ller%E2%80%93Trumbore_intersection_algorithm#Rust_implementation
    pub fn intersect(&self, ray: &Ray) -> Option<(FloatType, BarycentricCoordinates<FloatType>)> {
        let [e1, e2] = self.edges();

        let ray_cross_e2 = ray.direction.cross(&e2);
        let det = e1.dot(&ray_cross_e2);

        // Negated comparison to also reject NaN
        if !(det.abs() > PARALLEL_EPSILON * e1.norm() * ray_cross_e2.norm()) {
            return None;
        }

        let inv_det = 1.0 / det;
        let s = ray.origin - self[0];
        let u = inv_det * s.dot(&ray_cross_e2);

        let s_cross_e1 = s.cross(&e1);
        let v = inv_det * ray.direction.dot(&s_cross_e1);
        let t = inv_det * e2.dot(&s_cross_e1);

        let inside = u >= 0.0 && v >= 0.0 && u + v <= 1.0;
        (inside && t.is_finite()).then_some((t, BarycentricCoordinates { u, v }))
    }
}
