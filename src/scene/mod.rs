pub mod bvh;
pub mod demo;
pub mod lights;
pub mod materials;
pub mod primitives;

use std::num::NonZeroUsize;

use index_vec::IndexVec;
use nalgebra::Unit;
use thiserror::Error;

use crate::{
    geometry::{FloatType, Ray, RayInterval, WorldBox, WorldPoint, WorldVector},
    util::Color,
};

use bvh::Bvh;
use lights::Light;
use materials::Bsdf;

index_vec::define_index_type! {
    pub struct MaterialIdx = usize;
}

index_vec::define_index_type! {
    /// Position of a primitive in the arena of the structure that owns it.
    pub struct PrimitiveIdx = usize;
    MAX_INDEX = usize::MAX - 1;
    DEFAULT = PrimitiveIdx::from_raw_unchecked(usize::MAX);
}

#[derive(Clone, Debug)]
pub struct HitRecord {
    pub t: FloatType,
    pub point: WorldPoint,
    pub normal: Unit<WorldVector>,
    pub material: MaterialIdx,
    /// Filled in by the acceleration structure, `PrimitiveIdx::default()` before that.
    pub primitive: PrimitiveIdx,
}

/// Anything that can be hit by a ray.
///
/// Both queries take the valid distance range of the ray as a mutable cell.
/// A successful query shrinks `interval.max_t` to the distance of the hit,
/// a failed one leaves it untouched.
pub trait Object: Send + Sync {
    fn bounding_box(&self) -> WorldBox;

    /// Returns true if the ray hits anything inside the interval.
    /// The hit that shrinks the interval is not necessarily the closest one.
    fn has_intersection(&self, ray: &Ray, interval: &mut RayInterval) -> bool;

    /// Finds the closest hit inside the interval.
    fn intersect(&self, ray: &Ray, interval: &mut RayInterval) -> Option<HitRecord>;
}

/// Single surface with a material, the building block of a scene.
pub trait Primitive: Object + std::fmt::Debug {
    fn material(&self) -> MaterialIdx;
}

pub struct Scene<O: Object = Bvh> {
    pub object: O,
    pub materials: IndexVec<MaterialIdx, Box<dyn Bsdf>>,
    pub lights: Vec<Box<dyn Light>>,
    /// Radiance of rays that escape the scene. Black if None.
    pub environment: Option<Color>,
}

impl<O: Object> Scene<O> {
    pub fn material(&self, index: MaterialIdx) -> &dyn Bsdf {
        self.materials[index].as_ref()
    }

    pub fn environment_radiance(&self) -> Color {
        self.environment.unwrap_or_else(Color::zeros)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SceneError {
    #[error("Primitive {primitive} refers to material {material}, which doesn't exist")]
    UnknownMaterial { primitive: usize, material: usize },
    #[error("Primitive {primitive} has non-finite coordinates")]
    NonFiniteGeometry { primitive: usize },
}

/// Collects primitives, materials and lights, then validates them and builds the BVH.
#[derive(Default)]
pub struct SceneBuilder {
    primitives: Vec<Box<dyn Primitive>>,
    materials: IndexVec<MaterialIdx, Box<dyn Bsdf>>,
    lights: Vec<Box<dyn Light>>,
    environment: Option<Color>,
}

impl SceneBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_material(&mut self, material: impl Bsdf + 'static) -> MaterialIdx {
        self.materials.push(Box::new(material))
    }

    pub fn add_primitive(&mut self, primitive: impl Primitive + 'static) -> &mut Self {
        self.primitives.push(Box::new(primitive));
        self
    }

    pub fn add_light(&mut self, light: impl Light + 'static) -> &mut Self {
        self.lights.push(Box::new(light));
        self
    }

    pub fn environment(&mut self, radiance: Color) -> &mut Self {
        self.environment = Some(radiance);
        self
    }

    pub fn primitive_count(&self) -> usize {
        self.primitives.len()
    }

    pub fn build(self, max_leaf_size: NonZeroUsize) -> Result<Scene<Bvh>, SceneError> {
        for (i, primitive) in self.primitives.iter().enumerate() {
            let material = primitive.material();
            if material.index() >= self.materials.len() {
                return Err(SceneError::UnknownMaterial {
                    primitive: i,
                    material: material.index(),
                });
            }

            let bounding_box = primitive.bounding_box();
            let finite = bounding_box
                .min
                .iter()
                .chain(bounding_box.max.iter())
                .all(|x| x.is_finite());
            if !finite {
                return Err(SceneError::NonFiniteGeometry { primitive: i });
            }
        }

        Ok(Scene {
            object: Bvh::build(self.primitives, max_leaf_size),
            materials: self.materials,
            lights: self.lights,
            environment: self.environment,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{geometry::Triangle, scene::primitives::MeshTriangle};
    use assert2::{assert, let_assert};
    use materials::Diffuse;
    use primitives::Sphere;

    fn leaf_size() -> NonZeroUsize {
        NonZeroUsize::new(4).unwrap()
    }

    #[test]
    fn unknown_material_is_rejected() {
        let mut builder = SceneBuilder::new();
        let material = builder.add_material(Diffuse::new(Color::repeat(0.5)));
        builder.add_primitive(Sphere::new(WorldPoint::origin(), 1.0, material));
        builder.add_primitive(Sphere::new(WorldPoint::origin(), 1.0, MaterialIdx::new(7)));

        let_assert!(Err(error) = builder.build(leaf_size()));
        assert!(
            error
                == SceneError::UnknownMaterial {
                    primitive: 1,
                    material: 7
                }
        );
        assert!(error.to_string().contains("material 7"));
    }

    #[test]
    fn non_finite_geometry_is_rejected() {
        let mut builder = SceneBuilder::new();
        let material = builder.add_material(Diffuse::new(Color::repeat(0.5)));
        builder.add_primitive(MeshTriangle::new(
            Triangle::new(
                WorldPoint::origin(),
                WorldPoint::new(FloatType::NAN, 0.0, 0.0),
                WorldPoint::new(0.0, 1.0, 0.0),
            ),
            None,
            material,
        ));

        let_assert!(Err(SceneError::NonFiniteGeometry { primitive: 0 }) = builder.build(leaf_size()));
    }

    #[test]
    fn valid_scene_builds() {
        let mut builder = SceneBuilder::new();
        let material = builder.add_material(Diffuse::new(Color::repeat(0.5)));
        builder
            .add_primitive(Sphere::new(WorldPoint::origin(), 1.0, material))
            .environment(Color::repeat(0.1));

        let_assert!(Ok(scene) = builder.build(leaf_size()));
        assert!(scene.object.primitive_count() == 1);
        assert!(scene.environment_radiance() == Color::repeat(0.1));
        assert!(scene.lights.is_empty());
    }
}
