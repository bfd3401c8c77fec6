//! Direction sampling on the unit hemisphere around +Z.
//!
//! All directions are in a local shading frame (see [`crate::geometry::ShadingFrame`]),
//! so `z` is the cosine of the angle to the surface normal.

use std::f32::consts::{FRAC_1_PI, PI};

use rand::Rng;
use rand_distr::{Distribution as _, UnitDisc};

use crate::geometry::{FloatType, WorldVector};

/// Probability density of [`uniform_hemisphere`], per steradian.
pub const UNIFORM_HEMISPHERE_PDF: FloatType = 0.5 * FRAC_1_PI;

/// Uniformly distributed direction on the hemisphere.
pub fn uniform_hemisphere<R: Rng + ?Sized>(rng: &mut R) -> WorldVector {
    let z: FloatType = rng.random();
    let phi = 2.0 * PI * rng.random::<FloatType>();
    let r = (1.0 - z * z).max(0.0).sqrt();
    WorldVector::new(r * phi.cos(), r * phi.sin(), z)
}

/// Cosine weighted direction on the hemisphere (Malley's method).
/// The density is `z / pi`.
pub fn cosine_hemisphere<R: Rng + ?Sized>(rng: &mut R) -> WorldVector {
    let [x, y]: [FloatType; 2] = UnitDisc.sample(rng);
    let z = (1.0 - x * x - y * y).max(0.0).sqrt();
    WorldVector::new(x, y, z)
}

pub fn cosine_hemisphere_pdf(direction: &WorldVector) -> FloatType {
    direction.z.max(0.0) * FRAC_1_PI
}
