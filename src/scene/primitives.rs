use nalgebra::Unit;

use crate::geometry::{
    BarycentricCoordinates, FloatType, Ray, RayInterval, Triangle, WorldBox, WorldPoint,
    WorldVector,
};

use super::{HitRecord, MaterialIdx, Object, Primitive, PrimitiveIdx};

#[derive(Clone, Debug)]
pub struct Sphere {
    pub center: WorldPoint,
    pub radius: FloatType,
    pub material: MaterialIdx,
}

impl Sphere {
    pub fn new(center: WorldPoint, radius: FloatType, material: MaterialIdx) -> Sphere {
        Sphere {
            center,
            radius,
            material,
        }
    }

    /// Distance to the first surface crossing inside the interval.
    /// The near root is preferred, the far one is used when the ray starts inside.
    fn nearest_hit(&self, ray: &Ray, interval: &RayInterval) -> Option<FloatType> {
        // Negated to also catch NaN
        if !(self.radius > 0.0) {
            return None;
        }

        let oc = ray.origin - self.center;
        let b = oc.dot(&ray.direction);
        let c = oc.dot(&oc) - self.radius * self.radius;
        let discriminant = b * b - c;

        if discriminant < 0.0 {
            return None;
        }

        let sqrt_disc = discriminant.sqrt();
        let t1 = -b - sqrt_disc;
        let t2 = -b + sqrt_disc;

        [t1, t2].into_iter().find(|t| interval.contains(*t))
    }
}

impl Object for Sphere {
    fn bounding_box(&self) -> WorldBox {
        let r_vec = WorldVector::repeat(self.radius.max(0.0));
        WorldBox {
            min: self.center - r_vec,
            max: self.center + r_vec,
        }
    }

    fn has_intersection(&self, ray: &Ray, interval: &mut RayInterval) -> bool {
        match self.nearest_hit(ray, interval) {
            Some(t) => {
                interval.shrink_to(t);
                true
            }
            None => false,
        }
    }

    fn intersect(&self, ray: &Ray, interval: &mut RayInterval) -> Option<HitRecord> {
        let t = self.nearest_hit(ray, interval)?;
        interval.shrink_to(t);

        let point = ray.point_at(t);
        Some(HitRecord {
            t,
            point,
            normal: Unit::new_normalize(point - self.center),
            material: self.material,
            primitive: PrimitiveIdx::default(),
        })
    }
}

impl Primitive for Sphere {
    fn material(&self) -> MaterialIdx {
        self.material
    }
}

/// Triangle with optional per vertex normals.
#[derive(Clone, Debug)]
pub struct MeshTriangle {
    positions: Triangle<WorldPoint>,
    /// None means flat shading with the geometric normal
    normals: Option<Triangle<WorldVector>>,
    material: MaterialIdx,
}

impl MeshTriangle {
    /// Zero length vertex normals switch the triangle to flat shading.
    pub fn new(
        positions: Triangle<WorldPoint>,
        normals: Option<Triangle<WorldVector>>,
        material: MaterialIdx,
    ) -> MeshTriangle {
        let normals = normals.filter(|n| n.iter().all(|v| v.norm_squared() > 0.0));
        MeshTriangle {
            positions,
            normals,
            material,
        }
    }

    pub fn is_flat_shaded(&self) -> bool {
        self.normals.is_none()
    }

    fn hit_distance(
        &self,
        ray: &Ray,
        interval: &RayInterval,
    ) -> Option<(FloatType, BarycentricCoordinates<FloatType>)> {
        let (t, uv) = self.positions.intersect(ray)?;
        interval.contains(t).then_some((t, uv))
    }
}

impl Object for MeshTriangle {
    fn bounding_box(&self) -> WorldBox {
        WorldBox::from_points(self.positions.iter())
    }

    fn has_intersection(&self, ray: &Ray, interval: &mut RayInterval) -> bool {
        match self.hit_distance(ray, interval) {
            Some((t, _)) => {
                interval.shrink_to(t);
                true
            }
            None => false,
        }
    }

    fn intersect(&self, ray: &Ray, interval: &mut RayInterval) -> Option<HitRecord> {
        let (t, uv) = self.hit_distance(ray, interval)?;
        interval.shrink_to(t);

        let geometric_normal = self.positions.normal();
        let normal = match &self.normals {
            Some(normals) => {
                let interpolated = uv.interpolate_triangle(normals);
                // Opposing vertex normals can cancel out
                Unit::try_new(interpolated, FloatType::EPSILON)
                    .unwrap_or_else(|| Unit::new_normalize(geometric_normal))
            }
            None => Unit::new_normalize(geometric_normal),
        };

        Some(HitRecord {
            t,
            point: ray.point_at(t),
            normal,
            material: self.material,
            primitive: PrimitiveIdx::default(),
        })
    }
}

impl Primitive for MeshTriangle {
    fn material(&self) -> MaterialIdx {
        self.material
    }
}
