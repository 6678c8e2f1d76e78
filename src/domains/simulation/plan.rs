use super::clock::SimulationClock;
use crate::common::{DomainError, DomainResult};
use crate::domains::geo::{densify_with, path_length, DensifyOptions, GeoPoint};
use std::time::Duration;

/// Everything a runner needs to play one agent's route.
#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub agent_id: String,
    pub path: Vec<GeoPoint>,
    pub path_length_m: f64,
    pub total_duration: Duration,
    pub interval: Duration,
}

impl SimulationPlan {
    /// Densify `waypoints` and derive the tick interval from `speed_mps`.
    pub fn build(
        agent_id: impl Into<String>,
        waypoints: &[GeoPoint],
        options: &DensifyOptions,
        speed_mps: f64,
    ) -> DomainResult<Self> {
        if waypoints.is_empty() {
            return Err(DomainError::InvalidCommand {
                reason: "Route has no waypoints".to_string(),
            });
        }
        if let Some(bad) = waypoints.iter().find(|p| !p.is_valid()) {
            return Err(DomainError::InvalidCoordinate { lat: bad.lat, lng: bad.lng });
        }

        let densified = densify_with(waypoints, options);
        let path_length_m = path_length(&densified.points);
        let (total_duration, interval) =
            SimulationClock::interval_for(path_length_m, speed_mps, densified.points.len())?;

        Ok(Self {
            agent_id: agent_id.into(),
            path: densified.points,
            path_length_m,
            total_duration,
            interval,
        })
    }

    pub fn clock(&self) -> DomainResult<SimulationClock> {
        SimulationClock::new(self.path.clone(), self.total_duration)
    }
}
