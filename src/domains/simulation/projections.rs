use super::aggregate::RunStatus;
use super::events::SimulationEvent;
use crate::domains::geo::GeoPoint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentProgress {
    pub agent_id: String,
    pub run_id: String,
    pub status: RunStatus,
    pub index: usize,
    pub total_points: usize,
    pub position: GeoPoint,
    pub eta_ms: u64,
    pub regions_inside: Vec<String>,
    pub last_updated: DateTime<Utc>,
}

/// Latest known progress per agent, built from the runner's event stream.
#[derive(Debug, Default)]
pub struct FleetProjection {
    pub agents: HashMap<String, AgentProgress>,
}

impl FleetProjection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply_event(&mut self, event: &SimulationEvent) {
        match event {
            SimulationEvent::Started {
                run_id,
                agent_id,
                start,
                total_points,
                total_duration_ms,
                timestamp,
            } => {
                self.agents.insert(
                    agent_id.clone(),
                    AgentProgress {
                        agent_id: agent_id.clone(),
                        run_id: run_id.clone(),
                        status: RunStatus::Running,
                        index: 0,
                        total_points: *total_points,
                        position: *start,
                        eta_ms: *total_duration_ms,
                        regions_inside: Vec::new(),
                        last_updated: *timestamp,
                    },
                );
            }
            SimulationEvent::PositionAdvanced { agent_id, index, point, eta_ms, timestamp, .. } => {
                if let Some(progress) = self.agents.get_mut(agent_id) {
                    progress.index = *index;
                    progress.position = *point;
                    progress.eta_ms = *eta_ms;
                    progress.last_updated = *timestamp;
                }
            }
            SimulationEvent::Paused { agent_id, index, timestamp, .. } => {
                self.set_status(agent_id, RunStatus::Paused, *index, *timestamp);
            }
            SimulationEvent::Resumed { agent_id, index, timestamp, .. } => {
                self.set_status(agent_id, RunStatus::Running, *index, *timestamp);
            }
            SimulationEvent::RegionEntered { agent_id, region_id, timestamp, .. } => {
                if let Some(progress) = self.agents.get_mut(agent_id) {
                    if !progress.regions_inside.contains(region_id) {
                        progress.regions_inside.push(region_id.clone());
                    }
                    progress.last_updated = *timestamp;
                }
            }
            SimulationEvent::RegionExited { agent_id, region_id, timestamp, .. } => {
                if let Some(progress) = self.agents.get_mut(agent_id) {
                    progress.regions_inside.retain(|r| r != region_id);
                    progress.last_updated = *timestamp;
                }
            }
            SimulationEvent::Completed { agent_id, index, final_position, timestamp, .. } => {
                if let Some(progress) = self.agents.get_mut(agent_id) {
                    progress.status = RunStatus::Completed;
                    progress.index = *index;
                    progress.position = *final_position;
                    progress.eta_ms = 0;
                    progress.last_updated = *timestamp;
                }
            }
            SimulationEvent::Canceled { agent_id, index, timestamp, .. } => {
                self.set_status(agent_id, RunStatus::Canceled, *index, *timestamp);
            }
        }
    }

    fn set_status(&mut self, agent_id: &str, status: RunStatus, index: usize, at: DateTime<Utc>) {
        if let Some(progress) = self.agents.get_mut(agent_id) {
            progress.status = status;
            progress.index = index;
            progress.last_updated = at;
        }
    }
}

/// Drains simulation events into a shared [`FleetProjection`].
pub struct FleetProjectionActor {
    projection: Arc<RwLock<FleetProjection>>,
    event_receiver: mpsc::Receiver<SimulationEvent>,
}

impl FleetProjectionActor {
    pub fn new(projection: Arc<RwLock<FleetProjection>>, event_receiver: mpsc::Receiver<SimulationEvent>) -> Self {
        Self {
            projection,
            event_receiver,
        }
    }

    pub async fn run(mut self) {
        while let Some(event) = self.event_receiver.recv().await {
            if event.is_terminal() {
                tracing::debug!(agent_id = event.agent_id(), "terminal simulation event");
            }
            self.projection.write().await.apply_event(&event);
        }
    }
}
