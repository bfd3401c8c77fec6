use nalgebra::{Matrix3, Unit};

use super::{FloatType, WorldVector};

/// Orthonormal coordinate system around a surface normal.
/// In local coordinates the normal is the +Z axis, so `cos(theta)` of a local direction is its z.
#[derive(Copy, Clone, Debug)]
pub struct ShadingFrame {
    to_world: Matrix3<FloatType>,
}

impl ShadingFrame {
    /// Builds the frame without branching on the normal orientation.
    /// Duff et al., "Building an Orthonormal Basis, Revisited", JCGT 2017.
    pub fn from_normal(normal: &Unit<WorldVector>) -> ShadingFrame {
        let n = normal.as_ref();
        let sign = (1.0 as FloatType).copysign(n.z);
        let a = -1.0 / (sign + n.z);
        let b = n.x * n.y * a;

        let tangent = WorldVector::new(1.0 + sign * n.x * n.x * a, sign * b, -sign * n.x);
        let bitangent = WorldVector::new(b, sign + n.y * n.y * a, -n.y);

        ShadingFrame {
            to_world: Matrix3::from_columns(&[tangent, bitangent, *n]),
        }
    }

    pub fn to_local(&self, v: &WorldVector) -> WorldVector {
        self.to_world.tr_mul(v)
    }

    pub fn to_world(&self, v: &WorldVector) -> WorldVector {
        self.to_world * v
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geometry::test::NonzeroWorldVectorWrapper;
    use assert2::assert;
    use test_case::test_case;
    use test_strategy::proptest;

    #[proptest]
    fn frame_is_orthonormal(normal: NonzeroWorldVectorWrapper) {
        let frame = ShadingFrame::from_normal(&Unit::new_normalize(*normal));
        let product = frame.to_world.tr_mul(&frame.to_world);
        assert!((product - Matrix3::identity()).amax() < 1e-4);
    }

    #[test_case(0.0, 0.0, 1.0)]
    #[test_case(0.0, 0.0, -1.0)]
    #[test_case(1.0, 2.0, -3.0)]
    #[test_case(0.0, 1.0, 0.0)]
    fn normal_maps_to_z(x: FloatType, y: FloatType, z: FloatType) {
        let normal = Unit::new_normalize(WorldVector::new(x, y, z));
        let frame = ShadingFrame::from_normal(&normal);

        let local = frame.to_local(&normal);
        assert!((local - WorldVector::z()).norm() < 1e-5);

        let back = frame.to_world(&WorldVector::z());
        assert!((back - normal.into_inner()).norm() < 1e-5);
    }
}
