use crate::common::DomainResult;
use crate::domains::geo::GeoPoint;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocationAck {
    pub agent_id: String,
    pub accepted_at: DateTime<Utc>,
}

/// Remote sink for simulated positions (the platform's location service).
/// Callers fire one attempt per update and never retry.
#[async_trait]
pub trait LocationUpdater: Send + Sync {
    async fn update_location(&self, agent_id: &str, point: GeoPoint) -> DomainResult<LocationAck>;
}

/// Supplier of sparse routes, e.g. a directions service or stored routes.
pub trait WaypointSource: Send + Sync {
    fn load_waypoints(&self, name: &str) -> DomainResult<Vec<GeoPoint>>;
}
