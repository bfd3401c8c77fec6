use nalgebra::Unit;
use rand::{Rng as _, RngCore};

use crate::{
    geometry::{FloatType, WorldPoint, WorldVector},
    util::Color,
};

/// How samples from a light get accumulated.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LightKind {
    /// Zero angular extent, a single sample is exact.
    Delta,
    /// Finite extent, needs to be averaged over multiple samples.
    Area,
}

/// Incident illumination at a point, sampled from a light.
#[derive(Clone, Debug)]
pub struct LightSample {
    /// Radiance arriving along `direction`
    pub radiance: Color,
    /// Direction from the shaded point toward the light
    pub direction: Unit<WorldVector>,
    /// Distance to the sampled point on the light, infinite for directional lights
    pub distance: FloatType,
    /// Solid angle density of the sample, 1 for delta lights
    pub pdf: FloatType,
}

pub trait Light: Send + Sync {
    fn kind(&self) -> LightKind;

    /// Samples light arriving at `point`.
    /// None if the light can't illuminate the point at all.
    fn sample(&self, point: &WorldPoint, rng: &mut dyn RngCore) -> Option<LightSample>;
}

/// Isotropic point light with inverse square falloff.
#[derive(Clone, Debug)]
pub struct PointLight {
    pub position: WorldPoint,
    pub intensity: Color,
}

impl PointLight {
    pub fn new(position: WorldPoint, intensity: Color) -> PointLight {
        PointLight {
            position,
            intensity,
        }
    }
}

impl Light for PointLight {
    fn kind(&self) -> LightKind {
        LightKind::Delta
    }

    fn sample(&self, point: &WorldPoint, _rng: &mut dyn RngCore) -> Option<LightSample> {
        let (direction, distance) = Unit::try_new_and_get(self.position - point, 0.0)?;
        Some(LightSample {
            radiance: self.intensity / (distance * distance),
            direction,
            distance,
            pdf: 1.0,
        })
    }
}

/// Light from infinitely far away, like the sun.
#[derive(Clone, Debug)]
pub struct DirectionalLight {
    /// Direction in which the light travels
    pub direction: Unit<WorldVector>,
    pub radiance: Color,
}

impl DirectionalLight {
    pub fn new(direction: Unit<WorldVector>, radiance: Color) -> DirectionalLight {
        DirectionalLight {
            direction,
            radiance,
        }
    }
}

impl Light for DirectionalLight {
    fn kind(&self) -> LightKind {
        LightKind::Delta
    }

    fn sample(&self, _point: &WorldPoint, _rng: &mut dyn RngCore) -> Option<LightSample> {
        Some(LightSample {
            radiance: self.radiance,
            direction: -self.direction,
            distance: FloatType::INFINITY,
            pdf: 1.0,
        })
    }
}

/// One sided rectangular emitter.
///
/// The rectangle is centered at `center` and spanned by `dim_x` and `dim_y`,
/// it emits toward the `normal` side only.
#[derive(Clone, Debug)]
pub struct AreaLight {
    pub center: WorldPoint,
    pub dim_x: WorldVector,
    pub dim_y: WorldVector,
    pub normal: Unit<WorldVector>,
    pub radiance: Color,
}

impl AreaLight {
    pub fn new(
        center: WorldPoint,
        dim_x: WorldVector,
        dim_y: WorldVector,
        normal: Unit<WorldVector>,
        radiance: Color,
    ) -> AreaLight {
        AreaLight {
            center,
            dim_x,
            dim_y,
            normal,
            radiance,
        }
    }

    pub fn area(&self) -> FloatType {
        self.dim_x.cross(&self.dim_y).norm()
    }
}

impl Light for AreaLight {
    fn kind(&self) -> LightKind {
        LightKind::Area
    }

    fn sample(&self, point: &WorldPoint, rng: &mut dyn RngCore) -> Option<LightSample> {
        let u = rng.random::<FloatType>() - 0.5;
        let v = rng.random::<FloatType>() - 0.5;
        let light_point = self.center + self.dim_x * u + self.dim_y * v;

        let (direction, distance) = Unit::try_new_and_get(light_point - point, 0.0)?;
        let cos_light = -direction.dot(&self.normal);
        if cos_light <= 0.0 {
            return None;
        }

        Some(LightSample {
            radiance: self.radiance,
            direction,
            distance,
            pdf: distance * distance / (self.area() * cos_light),
        })
    }
}
