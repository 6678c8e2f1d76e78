use crate::common::{DomainError, DomainResult};
use crate::domains::geo::{destination_point, haversine_distance, initial_bearing, GeoPoint};
use crate::domains::simulation::WaypointSource;
use geojson::{Feature, GeoJson, Geometry, Value};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::hash_map::DefaultHasher;
use std::env;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

/// Routes stored as GeoJSON files under a data directory.
pub struct GeoJsonWaypointSource {
    base: PathBuf,
}

impl GeoJsonWaypointSource {
    /// Base directory precedence: explicit path, `LOCSIM_DATA_DIR`,
    /// `./resources/routes`, `/usr/share/locsim/routes`.
    pub fn new(base: Option<PathBuf>) -> Self {
        let base = base.unwrap_or_else(|| {
            if let Ok(v) = env::var("LOCSIM_DATA_DIR") {
                PathBuf::from(v)
            } else {
                let cwd_default = Path::new("resources/routes");
                if cwd_default.exists() {
                    cwd_default.to_path_buf()
                } else {
                    PathBuf::from("/usr/share/locsim/routes")
                }
            }
        });
        Self { base }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }
}

impl WaypointSource for GeoJsonWaypointSource {
    fn load_waypoints(&self, name: &str) -> DomainResult<Vec<GeoPoint>> {
        let mut path = self.base.join(name);
        if path.extension().is_none() {
            path.set_extension("geojson");
        }
        let raw = fs::read_to_string(&path)
            .map_err(|e| DomainError::InfrastructureError(format!("{}: {}", path.display(), e)))?;
        parse_route(&raw)
    }
}

/// Extract an ordered route from GeoJSON.
///
/// Accepts a LineString or MultiLineString (parts concatenated) as a bare
/// geometry, a feature, or the first such feature of a collection. A collection
/// without lines is read as an ordered list of Point features.
pub fn parse_route(raw: &str) -> DomainResult<Vec<GeoPoint>> {
    let geojson: GeoJson = raw
        .parse()
        .map_err(|e| DomainError::InvalidCommand {
            reason: format!("Invalid GeoJSON route: {}", e),
        })?;

    let points = match geojson {
        GeoJson::Geometry(geometry) => line_points(&geometry.value)?,
        GeoJson::Feature(feature) => feature_line(&feature)?.unwrap_or_default(),
        GeoJson::FeatureCollection(collection) => {
            let mut line = None;
            for feature in &collection.features {
                if let Some(points) = feature_line(feature)? {
                    line = Some(points);
                    break;
                }
            }
            match line {
                Some(points) => points,
                None => collection
                    .features
                    .iter()
                    .filter_map(|f| f.geometry.as_ref())
                    .filter_map(|g| match &g.value {
                        Value::Point(position) => Some(GeoPoint::from_position(position)),
                        _ => None,
                    })
                    .collect::<DomainResult<Vec<_>>>()?,
            }
        }
    };

    if points.is_empty() {
        return Err(DomainError::InvalidCommand {
            reason: "GeoJSON route contains no usable coordinates".to_string(),
        });
    }
    Ok(points)
}

fn feature_line(feature: &Feature) -> DomainResult<Option<Vec<GeoPoint>>> {
    match feature.geometry.as_ref().map(|g| &g.value) {
        Some(value @ (Value::LineString(_) | Value::MultiLineString(_))) => line_points(value).map(Some),
        _ => Ok(None),
    }
}

fn line_points(value: &Value) -> DomainResult<Vec<GeoPoint>> {
    match value {
        Value::LineString(positions) => positions.iter().map(|p| GeoPoint::from_position(p)).collect(),
        Value::MultiLineString(lines) => lines
            .iter()
            .flatten()
            .map(|p| GeoPoint::from_position(p))
            .collect(),
        Value::Point(position) => Ok(vec![GeoPoint::from_position(position)?]),
        _ => Err(DomainError::InvalidCommand {
            reason: "Route geometry must be a LineString, MultiLineString or Point".to_string(),
        }),
    }
}

/// Serialize a path as a GeoJSON LineString feature.
pub fn route_to_geojson(points: &[GeoPoint]) -> String {
    let geometry = Geometry::new(Value::LineString(points.iter().map(GeoPoint::to_position).collect()));
    GeoJson::Feature(Feature::from(geometry)).to_string()
}

/// Straight routes with jittered intermediate waypoints, for demos without a
/// directions service. The same route name always yields the same route.
pub struct SyntheticWaypointSource {
    origin: GeoPoint,
    destination: GeoPoint,
    intermediate: usize,
    jitter_m: f64,
}

impl SyntheticWaypointSource {
    pub fn new(origin: GeoPoint, destination: GeoPoint, intermediate: usize, jitter_m: f64) -> Self {
        Self {
            origin,
            destination,
            intermediate,
            jitter_m: jitter_m.max(0.0),
        }
    }
}

impl WaypointSource for SyntheticWaypointSource {
    fn load_waypoints(&self, name: &str) -> DomainResult<Vec<GeoPoint>> {
        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        let mut rng = StdRng::seed_from_u64(hasher.finish());

        let bearing = initial_bearing(&self.origin, &self.destination);
        let length = haversine_distance(&self.origin, &self.destination);
        let sections = (self.intermediate + 1) as f64;

        let mut waypoints = Vec::with_capacity(self.intermediate + 2);
        waypoints.push(self.origin);
        for i in 1..=self.intermediate {
            let on_line = destination_point(&self.origin, bearing, length * i as f64 / sections);
            let offset = if self.jitter_m > 0.0 {
                rng.gen_range(-self.jitter_m..=self.jitter_m)
            } else {
                0.0
            };
            let side = bearing + std::f64::consts::FRAC_PI_2;
            waypoints.push(destination_point(&on_line, side, offset));
        }
        waypoints.push(self.destination);
        Ok(waypoints)
    }
}
