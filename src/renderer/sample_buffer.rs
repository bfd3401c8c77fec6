use std::path::Path;

use anyhow::Context as _;
use image::RgbaImage;

use crate::{
    geometry::{ScreenPoint, ScreenSize},
    util::{Color, Rgba, color_to_rgba},
};

/// Accumulated radiance estimates and the number of samples behind each of them.
#[derive(Clone, Debug)]
pub struct SampleBuffer {
    size: ScreenSize,
    radiance: Vec<Color>,
    sample_counts: Vec<u32>,
}

impl SampleBuffer {
    pub fn new(size: ScreenSize) -> SampleBuffer {
        let len = size.x as usize * size.y as usize;
        SampleBuffer {
            size,
            radiance: vec![Color::zeros(); len],
            sample_counts: vec![0; len],
        }
    }

    pub fn size(&self) -> ScreenSize {
        self.size
    }

    /// Changes the size, discarding all content.
    pub fn resize(&mut self, size: ScreenSize) {
        *self = SampleBuffer::new(size);
    }

    pub fn clear(&mut self) {
        self.radiance.fill(Color::zeros());
        self.sample_counts.fill(0);
    }

    pub fn update_pixel(&mut self, radiance: Color, point: ScreenPoint, sample_count: u32) {
        let index = self.index(point);
        self.radiance[index] = radiance;
        self.sample_counts[index] = sample_count;
    }

    pub fn pixel(&self, point: ScreenPoint) -> Color {
        self.radiance[self.index(point)]
    }

    pub fn sample_count(&self, point: ScreenPoint) -> u32 {
        self.sample_counts[self.index(point)]
    }

    /// Converts to 8 bit sRGB-ish pixels, clamping and gamma correcting the radiance.
    pub fn to_image(&self) -> RgbaImage {
        RgbaImage::from_fn(self.size.x, self.size.y, |x, y| {
            color_to_image(color_to_rgba(&self.pixel(ScreenPoint::new(x, y))))
        })
    }

    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        self.to_image()
            .save(path)
            .with_context(|| format!("Failed to save image to {}", path.display()))
    }

    fn index(&self, point: ScreenPoint) -> usize {
        assert2::assert!(point.x < self.size.x && point.y < self.size.y);
        point.y as usize * self.size.x as usize + point.x as usize
    }
}

/// Maps a 0-1 f32 rgba pixel to pixel type compatible with module image.
pub fn color_to_image(color: Rgba) -> image::Rgba<u8> {
    image::Rgba([
        (color.r * 255.0).round().clamp(0.0, 255.0) as u8,
        (color.g * 255.0).round().clamp(0.0, 255.0) as u8,
        (color.b * 255.0).round().clamp(0.0, 255.0) as u8,
        (color.a * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}
