mod aabb;
mod frame;
mod ray_box_intersection;
mod ray_triangle_intersection;
mod triangle;

use nalgebra::{Point2, Point3, Vector2, Vector3};

pub use aabb::AABB;
pub use frame::ShadingFrame;
pub use triangle::{BarycentricCoordinates, Triangle};

pub type FloatType = f32;

/// Offset used for secondary rays and for validating unit vectors.
pub const EPSILON: FloatType = 1e-4;

pub type ScreenPoint = Point2<u32>;
pub type ScreenSize = Vector2<u32>;
pub type ScreenBlock = AABB<ScreenPoint>;

pub type WorldPoint = Point3<FloatType>;
pub type WorldVector = Vector3<FloatType>;
pub type WorldBox = AABB<WorldPoint>;

#[derive(Copy, Clone, Debug)]
pub struct Ray {
    pub origin: WorldPoint,
    /// Normalized direction of the ray
    pub direction: WorldVector,

    /// Componentwise inverse of the ray direction
    /// Zeros in direction get turned into positive infinity regardless of the sign of the zero
    pub inv_direction: WorldVector,
}

impl Ray {
    pub fn new(origin: WorldPoint, direction: WorldVector) -> Ray {
        let direction = direction.normalize();
        let inv_direction = direction.map(|x| if x == 0.0 { FloatType::INFINITY } else { 1.0 / x });

        Ray {
            origin,
            direction,
            inv_direction,
        }
    }

    pub fn point_at(&self, distance: FloatType) -> WorldPoint {
        self.origin + self.direction * distance
    }
}

/// Range of valid distances along a ray.
///
/// Queries take the ray immutably and this interval mutably. A successful hit
/// shrinks `max_t` to the hit distance, so everything farther away gets
/// pruned by later tests.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RayInterval {
    pub min_t: FloatType,
    pub max_t: FloatType,
}

impl RayInterval {
    pub fn new(min_t: FloatType, max_t: FloatType) -> RayInterval {
        assert2::debug_assert!(min_t <= max_t);
        RayInterval { min_t, max_t }
    }

    /// Interval for rays leaving a surface, starting at `EPSILON` so that the
    /// surface itself is not hit again.
    pub fn secondary() -> RayInterval {
        RayInterval::new(EPSILON, FloatType::INFINITY)
    }

    /// Returns true if `t` lies in the closed interval. NaN is never contained.
    pub fn contains(&self, t: FloatType) -> bool {
        t >= self.min_t && t <= self.max_t
    }

    /// Record a hit at distance `t`, which must be inside the interval.
    pub fn shrink_to(&mut self, t: FloatType) {
        assert2::debug_assert!(self.contains(t), "{t} outside {self:?}");
        self.max_t = t;
    }
}

impl Default for RayInterval {
    fn default() -> Self {
        RayInterval::new(0.0, FloatType::INFINITY)
    }
}
