use super::geodesy::{haversine_distance, EARTH_RADIUS_M};
use super::point::GeoPoint;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RegionShape {
    Circle { center: GeoPoint, radius_m: f64 },
    /// `south_west.lng > north_east.lng` describes a box crossing the antimeridian.
    Rectangle { south_west: GeoPoint, north_east: GeoPoint },
    Polygon { vertices: Vec<GeoPoint> },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Region {
    pub id: String,
    pub name: String,
    pub shape: RegionShape,
}

impl RegionShape {
    pub fn contains(&self, point: &GeoPoint) -> bool {
        match self {
            RegionShape::Circle { center, radius_m } => haversine_distance(center, point) <= *radius_m,
            RegionShape::Rectangle { south_west, north_east } => {
                if point.lat < south_west.lat || point.lat > north_east.lat {
                    return false;
                }
                if south_west.lng <= north_east.lng {
                    point.lng >= south_west.lng && point.lng <= north_east.lng
                } else {
                    point.lng >= south_west.lng || point.lng <= north_east.lng
                }
            }
            RegionShape::Polygon { vertices } => polygon_contains(vertices, point),
        }
    }

    /// `(south_west, north_east)` corners enclosing the shape.
    pub fn bounding_box(&self) -> (GeoPoint, GeoPoint) {
        match self {
            RegionShape::Circle { center, radius_m } => {
                let d_lat = (radius_m / EARTH_RADIUS_M).to_degrees();
                let cos_lat = center.lat.to_radians().cos();
                let d_lng = if cos_lat.abs() < 1e-12 {
                    180.0
                } else {
                    (d_lat / cos_lat).min(180.0)
                };
                (
                    GeoPoint::new_unchecked((center.lat - d_lat).max(-90.0), (center.lng - d_lng).max(-180.0)),
                    GeoPoint::new_unchecked((center.lat + d_lat).min(90.0), (center.lng + d_lng).min(180.0)),
                )
            }
            RegionShape::Rectangle { south_west, north_east } => (*south_west, *north_east),
            RegionShape::Polygon { vertices } => {
                let mut sw = GeoPoint::new_unchecked(f64::INFINITY, f64::INFINITY);
                let mut ne = GeoPoint::new_unchecked(f64::NEG_INFINITY, f64::NEG_INFINITY);
                for v in vertices {
                    sw.lat = sw.lat.min(v.lat);
                    sw.lng = sw.lng.min(v.lng);
                    ne.lat = ne.lat.max(v.lat);
                    ne.lng = ne.lng.max(v.lng);
                }
                (sw, ne)
            }
        }
    }
}

impl Region {
    pub fn contains(&self, point: &GeoPoint) -> bool {
        self.shape.contains(point)
    }
}

// Even-odd ray casting in lat/lng space; fine for city-scale regions.
fn polygon_contains(vertices: &[GeoPoint], point: &GeoPoint) -> bool {
    if vertices.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = vertices.len() - 1;
    for i in 0..vertices.len() {
        let (vi, vj) = (&vertices[i], &vertices[j]);
        if (vi.lat > point.lat) != (vj.lat > point.lat) {
            let cross_lng = vj.lng + (point.lat - vj.lat) / (vi.lat - vj.lat) * (vi.lng - vj.lng);
            if point.lng < cross_lng {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}
