//! Command-line demonstration of point-and-plane locomotion.
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use glam::DVec3;
use log::info;
use pointplane::{
    find_on_segment_displacement, init_logging, location_of, Driver, InAir, MeshArena,
    OnSegment, PhysicsSettings, RegionId, SlidingHandler, State, Triangle,
};

/// Drops a point onto a two-triangle floor and slides it across the seam
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
    /// JSON file with physics settings
    #[arg(short, long)]
    settings: Option<PathBuf>,
    /// Height the point is dropped from
    #[arg(long, default_value_t = 2.0)]
    height: f64,
}

fn load_settings(path: Option<&PathBuf>) -> Result<PhysicsSettings> {
    let Some(path) = path else {
        return Ok(PhysicsSettings::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read settings from {}", path.display()))?;
    PhysicsSettings::from_json_str(&text)
        .with_context(|| format!("invalid settings in {}", path.display()))
}

fn build_floor(arena: &mut MeshArena, settings: &PhysicsSettings) -> Result<()> {
    let tolerance = settings.tolerance();
    let corners = [
        DVec3::ZERO,
        DVec3::new(1.0, 0.0, 0.0),
        DVec3::new(1.0, 1.0, 0.0),
        DVec3::new(0.0, 1.0, 0.0),
    ];
    let [a, b, c, d] = corners;
    let lower = Triangle::with_tolerance(a, b, c, tolerance).context("lower floor triangle")?;
    let upper = Triangle::with_tolerance(a, c, d, tolerance).context("upper floor triangle")?;
    let region = RegionId(0);
    let handles = [arena.insert(region, lower), arena.insert(region, upper)];
    let attached = arena.stitch(&handles);
    info!("floor built with {attached} attached sides");
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    let settings = load_settings(args.settings.as_ref())?;

    let mut arena = MeshArena::new();
    build_floor(&mut arena, &settings)?;
    let mut driver = Driver::new(settings);
    for (handle, _) in arena.iter() {
        driver.add_link(handle);
    }
    driver.update(&arena);

    let dropped = State::InAir(InAir {
        location: DVec3::new(0.75, 0.25, args.height),
        displacement: DVec3::new(0.0, 0.0, -2.0 * args.height.abs() - 1.0),
    });
    let landed = driver.resolve(&arena, dropped, &SlidingHandler)?;
    info!("landed at {} as {landed:?}", location_of(&landed, &arena)?);

    let State::OnSegment(on_segment) = landed else {
        info!("the point missed the floor");
        return Ok(());
    };
    let across = OnSegment {
        displacement: find_on_segment_displacement(
            &on_segment,
            DVec3::new(-0.5, 0.5, 0.0),
            &arena,
        )?,
        ..on_segment
    };
    let slid = driver.resolve(&arena, State::OnSegment(across), &SlidingHandler)?;
    info!("slid to {} as {slid:?}", location_of(&slid, &arena)?);
    Ok(())
}
