use std::{
    num::{NonZeroU32, NonZeroUsize},
    path::PathBuf,
};

use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use lumentrace::{
    DirectLighting, PathTracer, RenderSettings,
    geometry::{ScreenPoint, ScreenSize},
    render,
    scene::demo,
};
use tracing_subscriber::EnvFilter;

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Lighting {
    /// Uniform hemisphere sampling
    Hemisphere,
    /// Sampling toward the light sources
    Importance,
}

impl From<Lighting> for DirectLighting {
    fn from(value: Lighting) -> Self {
        match value {
            Lighting::Hemisphere => DirectLighting::Hemisphere,
            Lighting::Importance => DirectLighting::Importance,
        }
    }
}

/// Renders the built-in Cornell box scene to an image file.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    #[arg(long, default_value_t = 512)]
    width: u32,
    #[arg(long, default_value_t = 512)]
    height: u32,
    /// Camera rays per pixel
    #[arg(long, default_value_t = NonZeroU32::new(16).unwrap())]
    samples: NonZeroU32,
    /// Samples per area light for each shading point
    #[arg(long, default_value_t = NonZeroU32::new(4).unwrap())]
    light_samples: NonZeroU32,
    #[arg(long, value_enum, default_value_t = Lighting::Importance)]
    lighting: Lighting,
    /// 0 shows only light sources, 1 adds direct lighting, higher values add bounces
    #[arg(long, default_value_t = 5)]
    max_ray_depth: u32,
    #[arg(long, default_value_t = NonZeroUsize::new(4).unwrap())]
    max_leaf_size: NonZeroUsize,
    #[arg(long, default_value_t = NonZeroU32::new(32).unwrap())]
    tile_size: NonZeroU32,
    /// Focus the camera on whatever is visible at this pixel, given as X,Y
    #[arg(long, value_parser = parse_point)]
    autofocus: Option<ScreenPoint>,
    /// Depth of field f-number, defaults to a pinhole camera
    #[arg(long)]
    f_number: Option<f32>,
    #[arg(short, long, default_value = "render.png")]
    output: PathBuf,
}

fn parse_point(s: &str) -> Result<ScreenPoint, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got {s:?}"))?;
    let parse = |v: &str| v.trim().parse::<u32>().map_err(|e| e.to_string());
    Ok(ScreenPoint::new(parse(x)?, parse(y)?))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    anyhow::ensure!(
        args.width > 0 && args.height > 0,
        "image size must be positive, got {}x{}",
        args.width,
        args.height
    );

    let settings = RenderSettings {
        tile_size: args.tile_size,
        sample_count: args.samples,
        light_sample_count: args.light_samples,
        direct_lighting: args.lighting.into(),
        max_ray_depth: args.max_ray_depth,
    };

    let scene = demo::cornell_box(args.max_leaf_size)?;
    tracing::info!("BVH statistics:\n{}", scene.object.statistics());

    let resolution = ScreenSize::new(args.width, args.height);
    let mut camera = match args.f_number {
        Some(f_number) => {
            anyhow::ensure!(f_number > 0.0, "f-number must be positive, got {f_number}");
            demo::cornell_box_camera_with_aperture(resolution, f_number)
        }
        None => demo::cornell_box_camera(resolution),
    };
    if let Some(point) = args.autofocus {
        anyhow::ensure!(
            point.x < args.width && point.y < args.height,
            "autofocus point {point} is outside of the image"
        );
        PathTracer::new(settings).autofocus(&scene, &mut camera, point);
    }

    let bar = ProgressBar::no_length().with_style(ProgressStyle::with_template(
        "{wide_bar} {pos}/{len} tiles, {elapsed} elapsed, ETA {eta}",
    )?);
    let mut render_progress = render(scene, camera, settings, |_| {}, {
        let bar = bar.clone();
        move |_, progress| {
            bar.update(|ps| {
                ps.set_len(progress.total as u64);
                ps.set_pos(progress.finished as u64)
            })
        }
    })?;
    bar.set_length(render_progress.progress().total as u64);

    render_progress.wait()?;
    bar.finish();

    tracing::info!(
        intersection_tests = render_progress.scene().object.intersection_test_count(),
        "render finished"
    );

    render_progress.buffer().save(&args.output)?;
    tracing::info!(output = %args.output.display(), "image saved");

    Ok(())
}
