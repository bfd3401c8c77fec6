//! Surface reflectance responses.
//!
//! Directions passed to a [`Bsdf`] are in the local shading frame of the hit,
//! with the surface normal along +Z. `wo` points toward the viewer, `wi` toward
//! the incoming light.

use std::f32::consts::FRAC_1_PI;

use rand::RngCore;

use crate::{
    geometry::{FloatType, WorldVector},
    sampling,
    util::Color,
};

/// Direction sampled from a [`Bsdf`] along with its value and density.
#[derive(Clone, Debug)]
pub struct BsdfSample {
    pub f: Color,
    pub wi: WorldVector,
    pub pdf: FloatType,
}

pub trait Bsdf: Send + Sync {
    /// Fraction of radiance arriving from `wi` that is scattered toward `wo`.
    fn f(&self, wo: &WorldVector, wi: &WorldVector) -> Color;

    /// Picks an incoming direction for continuing a path.
    /// None if the material doesn't scatter light.
    fn sample_f(&self, wo: &WorldVector, rng: &mut dyn RngCore) -> Option<BsdfSample>;

    fn emission(&self) -> Color {
        Color::zeros()
    }
}

/// Lambertian reflector.
#[derive(Clone, Debug)]
pub struct Diffuse {
    reflectance: Color,
}

impl Diffuse {
    pub fn new(reflectance: Color) -> Diffuse {
        Diffuse { reflectance }
    }
}

impl Bsdf for Diffuse {
    fn f(&self, _wo: &WorldVector, _wi: &WorldVector) -> Color {
        self.reflectance * FRAC_1_PI
    }

    fn sample_f(&self, wo: &WorldVector, rng: &mut dyn RngCore) -> Option<BsdfSample> {
        let wi = sampling::cosine_hemisphere(rng);
        let pdf = sampling::cosine_hemisphere_pdf(&wi);
        (pdf > 0.0).then(|| BsdfSample {
            f: self.f(wo, &wi),
            wi,
            pdf,
        })
    }
}

/// Light emitting surface that doesn't reflect anything.
#[derive(Clone, Debug)]
pub struct Emitter {
    radiance: Color,
}

impl Emitter {
    pub fn new(radiance: Color) -> Emitter {
        Emitter { radiance }
    }
}

impl Bsdf for Emitter {
    fn f(&self, _wo: &WorldVector, _wi: &WorldVector) -> Color {
        Color::zeros()
    }

    fn sample_f(&self, _wo: &WorldVector, _rng: &mut dyn RngCore) -> Option<BsdfSample> {
        None
    }

    fn emission(&self) -> Color {
        self.radiance
    }
}
