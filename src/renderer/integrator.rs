use nalgebra::Unit;
use rand::{Rng as _, RngCore};

use crate::{
    camera::Camera,
    geometry::{EPSILON, FloatType, Ray, RayInterval, ScreenPoint, ShadingFrame, WorldPoint, WorldVector},
    sampling,
    scene::{
        HitRecord, Object, Scene,
        lights::{Light, LightKind},
        materials::Bsdf,
    },
    util::Color,
};

use super::{DirectLighting, RenderSettings};

/// Probability that a path continues after each bounce.
pub const RUSSIAN_ROULETTE_CONTINUE: FloatType = 0.7;

/// Radiance estimate of a single pixel.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelEstimate {
    pub radiance: Color,
    pub sample_count: u32,
}

/// Hit point prepared for shading.
struct SurfaceInteraction<'a> {
    point: WorldPoint,
    /// Frame around the normal flipped toward the incoming ray
    frame: ShadingFrame,
    /// Direction toward the ray origin, in the shading frame
    w_out: WorldVector,
    bsdf: &'a dyn Bsdf,
}

/// Monte Carlo path tracing integrator.
#[derive(Clone, Debug)]
pub struct PathTracer {
    settings: RenderSettings,
}

impl PathTracer {
    pub fn new(settings: RenderSettings) -> PathTracer {
        PathTracer { settings }
    }

    /// Averages `sample_count` jittered camera rays through the pixel.
    pub fn raytrace_pixel<O: Object>(
        &self,
        scene: &Scene<O>,
        camera: &Camera,
        pixel: ScreenPoint,
        rng: &mut dyn RngCore,
    ) -> PixelEstimate {
        let resolution = camera.get_resolution().cast::<FloatType>();
        let sample_count = self.settings.sample_count.get();

        let mut sum = Color::zeros();
        for _ in 0..sample_count {
            let nx = (pixel.x as FloatType + rng.random::<FloatType>()) / resolution.x;
            let ny = (pixel.y as FloatType + rng.random::<FloatType>()) / resolution.y;
            let ray = camera.generate_ray(nx, ny, rng);
            sum += self.est_radiance_global_illumination(scene, &ray, rng);
        }

        PixelEstimate {
            radiance: sum / sample_count as FloatType,
            sample_count,
        }
    }

    /// Radiance arriving at the ray origin from along the ray.
    pub fn est_radiance_global_illumination<O: Object>(
        &self,
        scene: &Scene<O>,
        ray: &Ray,
        rng: &mut dyn RngCore,
    ) -> Color {
        let Some(hit) = scene.object.intersect(ray, &mut RayInterval::default()) else {
            return scene.environment_radiance();
        };
        let interaction = Self::interaction(scene, ray, &hit);

        let emitted = self.zero_bounce_radiance(&interaction);
        match self.settings.max_ray_depth {
            0 => emitted,
            1 => emitted + self.one_bounce_radiance(scene, &interaction, rng),
            _ => emitted + self.at_least_one_bounce_radiance(scene, &interaction, 1, rng),
        }
    }

    /// Light emitted by the surface itself.
    fn zero_bounce_radiance(&self, interaction: &SurfaceInteraction) -> Color {
        interaction.bsdf.emission()
    }

    /// Light arriving directly from emitters and reflected toward the viewer.
    fn one_bounce_radiance<O: Object>(
        &self,
        scene: &Scene<O>,
        interaction: &SurfaceInteraction,
        rng: &mut dyn RngCore,
    ) -> Color {
        match self.settings.direct_lighting {
            DirectLighting::Hemisphere => {
                self.estimate_direct_lighting_hemisphere(scene, interaction, rng)
            }
            DirectLighting::Importance => {
                self.estimate_direct_lighting_importance(scene, interaction, rng)
            }
        }
    }

    /// Direct lighting from uniformly sampled directions.
    /// Only emissive geometry contributes, lights without geometry are invisible to this estimator.
    fn estimate_direct_lighting_hemisphere<O: Object>(
        &self,
        scene: &Scene<O>,
        interaction: &SurfaceInteraction,
        rng: &mut dyn RngCore,
    ) -> Color {
        let total = scene.lights.len() * self.settings.light_sample_count.get() as usize;
        if total == 0 {
            return Color::zeros();
        }

        let mut l_out = Color::zeros();
        for _ in 0..total {
            let w_in = sampling::uniform_hemisphere(rng);
            let cos_theta = w_in.z;
            if cos_theta <= 0.0 {
                continue;
            }

            let ray = Ray::new(interaction.point, interaction.frame.to_world(&w_in));
            if let Some(hit) = scene.object.intersect(&ray, &mut RayInterval::secondary()) {
                let emission = scene.material(hit.material).emission();
                l_out += emission.component_mul(&interaction.bsdf.f(&interaction.w_out, &w_in))
                    * cos_theta;
            }
        }

        l_out / (total as FloatType * sampling::UNIFORM_HEMISPHERE_PDF)
    }

    /// Direct lighting from samples taken toward the lights.
    fn estimate_direct_lighting_importance<O: Object>(
        &self,
        scene: &Scene<O>,
        interaction: &SurfaceInteraction,
        rng: &mut dyn RngCore,
    ) -> Color {
        let area_sample_count = self.settings.light_sample_count.get();

        let mut l_out = Color::zeros();
        for light in scene.lights.iter() {
            match light.kind() {
                LightKind::Delta => {
                    l_out += self.light_sample_contribution(scene, light.as_ref(), interaction, rng);
                }
                LightKind::Area => {
                    let mut sum = Color::zeros();
                    for _ in 0..area_sample_count {
                        sum += self.light_sample_contribution(scene, light.as_ref(), interaction, rng);
                    }
                    l_out += sum / area_sample_count as FloatType;
                }
            }
        }

        l_out
    }

    /// Single sample estimate of light reflected toward the viewer from one light.
    fn light_sample_contribution<O: Object>(
        &self,
        scene: &Scene<O>,
        light: &dyn Light,
        interaction: &SurfaceInteraction,
        rng: &mut dyn RngCore,
    ) -> Color {
        let Some(sample) = light.sample(&interaction.point, rng) else {
            return Color::zeros();
        };
        if !(sample.pdf > 0.0 && sample.pdf.is_finite()) {
            return Color::zeros();
        }

        let w_in = interaction.frame.to_local(&sample.direction);
        let cos_theta = w_in.z;
        if cos_theta <= 0.0 {
            return Color::zeros();
        }

        if self.is_occluded(scene, &interaction.point, &sample.direction, sample.distance) {
            return Color::zeros();
        }

        sample
            .radiance
            .component_mul(&interaction.bsdf.f(&interaction.w_out, &w_in))
            * (cos_theta / sample.pdf)
    }

    /// Checks if anything blocks the segment toward a light, excluding both endpoints.
    fn is_occluded<O: Object>(
        &self,
        scene: &Scene<O>,
        point: &WorldPoint,
        direction: &Unit<WorldVector>,
        distance: FloatType,
    ) -> bool {
        let max_t = distance - EPSILON;
        if !(max_t > EPSILON) {
            // Light is right at the surface, nothing can get in between
            return false;
        }

        let ray = Ray::new(*point, direction.into_inner());
        scene
            .object
            .has_intersection(&ray, &mut RayInterval::new(EPSILON, max_t))
    }

    /// Direct lighting plus light from further bounces, with Russian roulette termination.
    /// `depth` is the number of bounces so far, 1 at the first hit.
    fn at_least_one_bounce_radiance<O: Object>(
        &self,
        scene: &Scene<O>,
        interaction: &SurfaceInteraction,
        depth: u32,
        rng: &mut dyn RngCore,
    ) -> Color {
        let mut l_out = self.one_bounce_radiance(scene, interaction, rng);

        if depth >= self.settings.max_ray_depth {
            return l_out;
        }
        if rng.random::<FloatType>() >= RUSSIAN_ROULETTE_CONTINUE {
            return l_out;
        }

        let Some(sample) = interaction.bsdf.sample_f(&interaction.w_out, rng) else {
            return l_out;
        };
        let cos_theta = sample.wi.z;
        if cos_theta <= 0.0 || !(sample.pdf > 0.0 && sample.pdf.is_finite()) {
            return l_out;
        }

        let ray = Ray::new(interaction.point, interaction.frame.to_world(&sample.wi));
        let incoming = match scene.object.intersect(&ray, &mut RayInterval::secondary()) {
            Some(hit) => {
                let next = Self::interaction(scene, &ray, &hit);
                // Emission of the next hit is already counted as direct light here
                self.at_least_one_bounce_radiance(scene, &next, depth + 1, rng)
            }
            None => scene.environment_radiance(),
        };
        l_out += sample.f.component_mul(&incoming)
            * (cos_theta / (sample.pdf * RUSSIAN_ROULETTE_CONTINUE));

        l_out
    }

    /// Focuses the camera on whatever is visible at the given pixel.
    /// Returns the new focus distance, or None if the pixel shows only background,
    /// in which case the camera gets focused at infinity.
    ///
    /// Focus distance is the depth of the focal plane along the camera's forward
    /// direction, not the length of the ray to the hit.
    pub fn autofocus<O: Object>(
        &self,
        scene: &Scene<O>,
        camera: &mut Camera,
        screen_point: ScreenPoint,
    ) -> Option<FloatType> {
        let resolution = camera.get_resolution().cast::<FloatType>();
        let ray = camera.generate_pinhole_ray(
            (screen_point.x as FloatType + 0.5) / resolution.x,
            (screen_point.y as FloatType + 0.5) / resolution.y,
        );

        let distance = scene
            .object
            .intersect(&ray, &mut RayInterval::secondary())
            .map(|hit| hit.t * ray.direction.dot(&camera.forward().into_inner()));

        camera.set_focus_distance(distance.unwrap_or(FloatType::INFINITY));
        tracing::debug!(?distance, "autofocus");

        distance
    }

    fn interaction<'a, O: Object>(
        scene: &'a Scene<O>,
        ray: &Ray,
        hit: &HitRecord,
    ) -> SurfaceInteraction<'a> {
        // Surfaces are two sided, shade the side facing the ray
        let normal = if hit.normal.dot(&ray.direction) > 0.0 {
            Unit::new_unchecked(-hit.normal.into_inner())
        } else {
            hit.normal
        };
        let frame = ShadingFrame::from_normal(&normal);

        SurfaceInteraction {
            point: hit.point,
            w_out: frame.to_local(&-ray.direction),
            frame,
            bsdf: scene.material(hit.material),
        }
    }
}
