//! Route densification.
//!
//! Sparse waypoints (typically the step boundaries of a directions response) are
//! turned into a path whose consecutive points sit a fixed real-world distance
//! apart, so a marker animated over it moves at a steady pace.

use super::geodesy::{destination_unwrapped, haversine_distance, initial_bearing, normalize_longitude};
use super::point::GeoPoint;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const DEFAULT_STEP_DISTANCE_M: f64 = 2.0;
pub const DEFAULT_MAX_POINTS_PER_SEGMENT: usize = 1_000_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DensifyOptions {
    pub step_distance_m: f64,
    pub max_points_per_segment: usize,
}

impl Default for DensifyOptions {
    fn default() -> Self {
        Self {
            step_distance_m: DEFAULT_STEP_DISTANCE_M,
            max_points_per_segment: DEFAULT_MAX_POINTS_PER_SEGMENT,
        }
    }
}

impl DensifyOptions {
    pub fn with_step(step_distance_m: f64) -> Self {
        Self {
            step_distance_m,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct Densified {
    pub points: Vec<GeoPoint>,
    /// Segments whose interpolation stopped at `max_points_per_segment`.
    pub capped_segments: usize,
}

/// Direction a coordinate must keep moving in for a projected point to count
/// as progress toward the segment end.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Progress {
    Increasing,
    Decreasing,
    /// Start and end share the coordinate; the axis does not constrain the loop.
    Level,
}

impl Progress {
    fn between(start: f64, end: f64) -> Self {
        if start < end {
            Progress::Increasing
        } else if start > end {
            Progress::Decreasing
        } else {
            Progress::Level
        }
    }

    fn still_before(self, value: f64, end: f64) -> bool {
        match self {
            Progress::Increasing => value < end,
            Progress::Decreasing => value > end,
            Progress::Level => true,
        }
    }
}

/// Densify with the default per-segment cap.
pub fn densify(waypoints: &[GeoPoint], step_distance_m: f64) -> Vec<GeoPoint> {
    densify_with(waypoints, &DensifyOptions::with_step(step_distance_m)).points
}

pub fn densify_with(waypoints: &[GeoPoint], options: &DensifyOptions) -> Densified {
    let step = options.step_distance_m;
    if waypoints.len() < 2 || !step.is_finite() || step <= 0.0 {
        return Densified {
            points: waypoints.to_vec(),
            capped_segments: 0,
        };
    }

    let mut points = Vec::with_capacity(waypoints.len());
    let mut capped_segments = 0;

    points.push(waypoints[0]);
    for pair in waypoints.windows(2) {
        if densify_segment(&pair[0], &pair[1], step, options.max_points_per_segment, &mut points) {
            capped_segments += 1;
        }
        points.push(pair[1]);
    }

    debug!(
        waypoints = waypoints.len(),
        points = points.len(),
        step_m = step,
        "densified route"
    );

    Densified {
        points,
        capped_segments,
    }
}

/// Push the interpolated points strictly between `a` and `b` onto `out`.
/// Returns true when the per-segment cap was reached.
fn densify_segment(a: &GeoPoint, b: &GeoPoint, step: f64, cap: usize, out: &mut Vec<GeoPoint>) -> bool {
    let length = haversine_distance(a, b);
    if length <= step {
        return false;
    }

    let bearing = initial_bearing(a, b);
    // Longitudes are compared unwrapped so a segment crossing the antimeridian
    // keeps a monotonic direction.
    let mut d_lng = b.lng - a.lng;
    if d_lng > 180.0 {
        d_lng -= 360.0;
    } else if d_lng < -180.0 {
        d_lng += 360.0;
    }
    let end_lng = a.lng + d_lng;

    // An axis only guards the loop while it is monotonic along the segment.
    let lat_progress = if passes_vertex(a, b) {
        Progress::Level
    } else {
        Progress::between(a.lat, b.lat)
    };
    let lng_progress = if passes_pole(a, bearing) {
        Progress::Level
    } else {
        Progress::between(a.lng, end_lng)
    };

    let mut inserted = 0usize;
    loop {
        let travelled = (inserted + 1) as f64 * step;
        if travelled >= length {
            return false;
        }

        let (lat, lng) = destination_unwrapped(a, bearing, travelled);
        if !lat_progress.still_before(lat, b.lat) || !lng_progress.still_before(lng, end_lng) {
            return false;
        }

        if inserted == cap {
            warn!(from = %a, to = %b, cap, "segment interpolation capped");
            return true;
        }
        out.push(GeoPoint::new_unchecked(lat, normalize_longitude(lng)));
        inserted += 1;
    }
}

/// True when latitude turns around between `a` and `b`, i.e. the segment runs
/// through the northern or southern vertex of its great circle.
fn passes_vertex(a: &GeoPoint, b: &GeoPoint) -> bool {
    let heading_out = initial_bearing(a, b).cos();
    // final bearing at b is the reverse of the initial bearing from b to a
    let heading_in = -initial_bearing(b, a).cos();
    heading_out * heading_in < 0.0
}

/// True when the great circle through `a` along `bearing` is a meridian, so the
/// segment can pass over a pole where longitude jumps by 180 degrees.
fn passes_pole(a: &GeoPoint, bearing: f64) -> bool {
    // Clairaut's constant is zero only for meridians
    (a.lat.to_radians().cos() * bearing.sin()).abs() < 1e-12
}
