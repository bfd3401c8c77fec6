//! Procedurally built scenes, so that the renderer can be run without any assets.

use std::num::NonZeroUsize;

use crate::{
    camera::Camera,
    geometry::{FloatType, ScreenSize, Triangle, WorldPoint, WorldVector},
    util::Color,
};

use super::{
    MaterialIdx, Scene, SceneBuilder, SceneError,
    lights::AreaLight,
    materials::{Diffuse, Emitter},
    primitives::{MeshTriangle, Sphere},
};

const LIGHT_RADIANCE: FloatType = 12.0;
const LIGHT_HALF_SIZE: FloatType = 0.25;
/// Keeps the emitter geometry just below the ceiling
const LIGHT_GAP: FloatType = 1e-3;

/// Cornell box with two diffuse spheres, lit by a square area light in the ceiling.
///
/// The box spans [-1, 1] along x and z and [0, 2] along y, its open side faces +z.
pub fn cornell_box(max_leaf_size: NonZeroUsize) -> Result<Scene, SceneError> {
    let mut builder = SceneBuilder::new();

    let white = builder.add_material(Diffuse::new(Color::new(0.73, 0.73, 0.73)));
    let red = builder.add_material(Diffuse::new(Color::new(0.65, 0.05, 0.05)));
    let green = builder.add_material(Diffuse::new(Color::new(0.12, 0.45, 0.15)));
    let light = builder.add_material(Emitter::new(Color::repeat(LIGHT_RADIANCE)));

    let p = WorldPoint::new;
    let x = WorldVector::x() * 2.0;
    let y = WorldVector::y() * 2.0;
    let z = WorldVector::z() * 2.0;

    // Floor, ceiling, back wall
    quad(&mut builder, p(-1.0, 0.0, -1.0), z, x, white);
    quad(&mut builder, p(-1.0, 2.0, -1.0), x, z, white);
    quad(&mut builder, p(-1.0, 0.0, -1.0), x, y, white);
    // Left and right walls
    quad(&mut builder, p(-1.0, 0.0, -1.0), y, z, red);
    quad(&mut builder, p(1.0, 0.0, -1.0), z, y, green);

    let light_y = 2.0 - LIGHT_GAP;
    let light_x = WorldVector::x() * (2.0 * LIGHT_HALF_SIZE);
    let light_z = WorldVector::z() * (2.0 * LIGHT_HALF_SIZE);
    quad(
        &mut builder,
        p(-LIGHT_HALF_SIZE, light_y, -LIGHT_HALF_SIZE),
        light_x,
        light_z,
        light,
    );
    builder.add_light(AreaLight::new(
        p(0.0, light_y, 0.0),
        light_x,
        light_z,
        -WorldVector::y_axis(),
        Color::repeat(LIGHT_RADIANCE),
    ));

    builder
        .add_primitive(Sphere::new(p(-0.45, 0.35, -0.35), 0.35, white))
        .add_primitive(Sphere::new(p(0.45, 0.3, 0.3), 0.3, white));

    builder.build(max_leaf_size)
}

/// Pinhole camera looking into the open side of [`cornell_box`].
pub fn cornell_box_camera(resolution: ScreenSize) -> Camera {
    cornell_box_camera_with_aperture(resolution, FloatType::INFINITY)
}

/// Same view as [`cornell_box_camera`], with depth of field focused at the center of the box.
pub fn cornell_box_camera_with_aperture(resolution: ScreenSize, f_number: FloatType) -> Camera {
    Camera::builder()
        .center(WorldPoint::new(0.0, 1.0, 3.9))
        .forward(-WorldVector::z())
        .up(WorldVector::y())
        .resolution(resolution)
        .film_width(36e-3)
        .focal_length(40e-3)
        .f_number(f_number)
        .focus_distance(3.9)
        .build()
}

/// Adds a parallelogram with corner `origin` and edges `a` and `b` as two flat triangles.
/// The front side (with normal `a x b`) is the one facing the inside of the box.
fn quad(
    builder: &mut SceneBuilder,
    origin: WorldPoint,
    a: WorldVector,
    b: WorldVector,
    material: MaterialIdx,
) {
    builder
        .add_primitive(MeshTriangle::new(
            Triangle::new(origin, origin + a, origin + a + b),
            None,
            material,
        ))
        .add_primitive(MeshTriangle::new(
            Triangle::new(origin, origin + a + b, origin + b),
            None,
            material,
        ));
}
