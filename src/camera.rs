use assert2::assert;
use bon::bon;
use nalgebra::Unit;
use rand::Rng;
use rand_distr::Distribution as _;

use crate::geometry::{EPSILON, FloatType, Ray, ScreenSize, WorldPoint, WorldVector};

/// Thin lens camera.
///
/// Rays are generated for normalized film coordinates, (0, 0) is the top left
/// corner of the image and (1, 1) the bottom right one.
#[derive(Copy, Clone, Debug)]
pub struct Camera {
    center: WorldPoint,

    resolution: ScreenSize,

    forward: Unit<WorldVector>,
    up: Unit<WorldVector>,
    right: Unit<WorldVector>,

    /// Film size in meters
    film_width: FloatType,
    film_height: FloatType,

    focal_length: FloatType,

    /// Lens radius in meters
    lens_radius: FloatType,
    focus_distance: FloatType,
    lens_weight: FloatType,
}

#[bon]
impl Camera {
    #[builder]
    pub fn new(
        center: WorldPoint,
        forward: WorldVector,
        up: WorldVector,
        resolution: ScreenSize,
        film_width: FloatType,
        focal_length: FloatType,
        f_number: FloatType,
        focus_distance: FloatType,
    ) -> Self {
        let forward = Unit::try_new(forward, EPSILON).expect("Forward vector must be non-zero");
        let up = Unit::try_new(up, EPSILON).expect("Up vector must be no-zero");
        let right = Unit::try_new(forward.cross(&up), EPSILON)
            .expect("`up` and `forward` must be linearly independent");
        let up = Unit::new_normalize(right.cross(&forward));

        assert!(resolution.x > 0);
        assert!(resolution.y > 0);
        assert!(film_width > 0.0);
        assert!(focal_length > 0.0);
        assert!(f_number > 0.0);
        assert!(focus_distance > 0.0);

        let film_height = film_width * resolution.y as FloatType / resolution.x as FloatType;

        Camera {
            center,

            resolution,

            forward,
            up,
            right,

            film_width,
            film_height,

            focal_length,

            lens_radius: focal_length / (2.0 * f_number),
            focus_distance,
            lens_weight: focal_length / focus_distance,
        }
    }
}

impl Camera {
    pub fn get_resolution(&self) -> ScreenSize {
        self.resolution
    }

    pub fn center(&self) -> WorldPoint {
        self.center
    }

    pub fn forward(&self) -> Unit<WorldVector> {
        self.forward
    }

    pub fn focus_distance(&self) -> FloatType {
        self.focus_distance
    }

    /// Moves the plane in focus. Infinity is allowed and focuses on the background.
    pub fn set_focus_distance(&mut self, focus_distance: FloatType) {
        assert!(focus_distance > 0.0);
        self.focus_distance = focus_distance;
        self.lens_weight = self.focal_length / focus_distance;
    }

    /// Samples a ray through a random point on the lens for the given film position.
    pub fn generate_ray<R: Rng + ?Sized>(&self, nx: FloatType, ny: FloatType, rng: &mut R) -> Ray {
        let film_point_offset = self.film_point_offset(nx, ny);

        let lens_uv: [FloatType; 2] = rand_distr::UnitDisc.sample(rng);
        let lens_vector = self.right.as_ref() * (self.lens_radius * lens_uv[0])
            + self.up.as_ref() * (self.lens_radius * lens_uv[1]);

        // All rays from one film point meet again at the focus distance
        let direction = -film_point_offset - lens_vector * self.lens_weight;

        Ray::new(self.center + lens_vector, direction)
    }

    /// Ray through the center of the lens, ignoring depth of field.
    pub fn generate_pinhole_ray(&self, nx: FloatType, ny: FloatType) -> Ray {
        Ray::new(self.center, -self.film_point_offset(nx, ny))
    }

    /// Position on the film relative to the lens center.
    /// The image on the film is flipped, so left of the image is right of the camera.
    fn film_point_offset(&self, nx: FloatType, ny: FloatType) -> WorldVector {
        -self.forward.as_ref() * self.focal_length
            + self.right.as_ref() * ((0.5 - nx) * self.film_width)
            + self.up.as_ref() * ((ny - 0.5) * self.film_height)
    }
}
