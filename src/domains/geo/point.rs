use crate::common::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};

/// Latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    /// Validated constructor. Latitude must lie in [-90, 90] and longitude in [-180, 180].
    pub fn new(lat: f64, lng: f64) -> DomainResult<Self> {
        let point = Self { lat, lng };
        if !point.is_valid() {
            return Err(DomainError::InvalidCoordinate { lat, lng });
        }
        Ok(point)
    }

    /// Constructor for coordinates already known to be in range, e.g. geodesy output.
    pub const fn new_unchecked(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// (lat, lng) in radians.
    pub fn to_radians(&self) -> (f64, f64) {
        (self.lat.to_radians(), self.lng.to_radians())
    }

    /// GeoJSON position order: `[lng, lat]`.
    pub fn to_position(&self) -> Vec<f64> {
        vec![self.lng, self.lat]
    }

    pub fn from_position(position: &[f64]) -> DomainResult<Self> {
        match position {
            [lng, lat, ..] => Self::new(*lat, *lng),
            _ => Err(DomainError::InvalidCommand {
                reason: format!("GeoJSON position needs two values, got {}", position.len()),
            }),
        }
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lng)
    }
}
