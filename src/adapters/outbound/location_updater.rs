use crate::common::DomainResult;
use crate::domains::geo::GeoPoint;
use crate::domains::simulation::{LocationAck, LocationUpdater};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Writes every update to `tracing`. Stands in for the platform's location
/// service when running the simulator standalone.
#[derive(Debug, Default)]
pub struct LoggingLocationUpdater;

#[async_trait]
impl LocationUpdater for LoggingLocationUpdater {
    async fn update_location(&self, agent_id: &str, point: GeoPoint) -> DomainResult<LocationAck> {
        tracing::debug!(agent_id, lat = point.lat, lng = point.lng, "location update");
        Ok(LocationAck {
            agent_id: agent_id.to_string(),
            accepted_at: Utc::now(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedUpdate {
    pub point: GeoPoint,
    pub received_at: DateTime<Utc>,
}

/// Keeps every update in memory, per agent.
#[derive(Debug, Default)]
pub struct RecordingLocationUpdater {
    updates: RwLock<HashMap<String, Vec<RecordedUpdate>>>,
}

impl RecordingLocationUpdater {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn updates_for(&self, agent_id: &str) -> Vec<RecordedUpdate> {
        self.updates
            .read()
            .await
            .get(agent_id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn last_location(&self, agent_id: &str) -> Option<GeoPoint> {
        self.updates
            .read()
            .await
            .get(agent_id)
            .and_then(|u| u.last())
            .map(|u| u.point)
    }

    pub async fn total_updates(&self) -> usize {
        self.updates.read().await.values().map(Vec::len).sum()
    }
}

#[async_trait]
impl LocationUpdater for RecordingLocationUpdater {
    async fn update_location(&self, agent_id: &str, point: GeoPoint) -> DomainResult<LocationAck> {
        let received_at = Utc::now();
        self.updates
            .write()
            .await
            .entry(agent_id.to_string())
            .or_default()
            .push(RecordedUpdate { point, received_at });
        Ok(LocationAck {
            agent_id: agent_id.to_string(),
            accepted_at: received_at,
        })
    }
}
