use anyhow::Context;
use locsim::adapters::inbound::{parse_route, route_to_geojson};
use locsim::domains::geo::{densify_with, path_length, DensifyOptions, DEFAULT_STEP_DISTANCE_M};
use tracing::info;

/// Reads a GeoJSON route and prints the densified LineString to stdout.
///
/// Usage: densify_route <route.geojson> [step_distance_m]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let mut args = std::env::args().skip(1);
    let input = args
        .next()
        .context("usage: densify_route <route.geojson> [step_distance_m]")?;
    let step = match args.next() {
        Some(raw) => raw.parse::<f64>().with_context(|| format!("invalid step distance {:?}", raw))?,
        None => DEFAULT_STEP_DISTANCE_M,
    };
    if !(step.is_finite() && step > 0.0) {
        anyhow::bail!("step distance must be positive, got {}", step);
    }

    let raw = tokio::fs::read_to_string(&input)
        .await
        .with_context(|| format!("reading {}", input))?;
    let waypoints = parse_route(&raw)?;

    let densified = densify_with(&waypoints, &DensifyOptions::with_step(step));
    info!(
        waypoints = waypoints.len(),
        points = densified.points.len(),
        length_m = path_length(&densified.points),
        capped_segments = densified.capped_segments,
        "route densified"
    );

    println!("{}", route_to_geojson(&densified.points));
    Ok(())
}
