use super::events::SimulationEvent;
use crate::common::{AggregateRoot, DomainError, DomainResult};
use crate::domains::geo::GeoPoint;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RunStatus {
    NotStarted,
    Running,
    Paused,
    Completed,
    Canceled,
}

/// Lifecycle record of one simulation run. Per-tick positions are not kept
/// here; only lifecycle changes and region transitions are journaled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationRun {
    pub id: String,
    pub agent_id: String,
    pub status: RunStatus,
    pub total_points: usize,
    pub last_index: usize,
    pub last_position: Option<GeoPoint>,
    pub regions_visited: Vec<String>,
    pub version: u64,
    #[serde(skip)]
    uncommitted_events: Vec<SimulationEvent>,
}

impl SimulationRun {
    /// Empty aggregate, the starting point for replaying history.
    pub fn empty(id: String) -> Self {
        Self {
            id,
            agent_id: String::new(),
            status: RunStatus::NotStarted,
            total_points: 0,
            last_index: 0,
            last_position: None,
            regions_visited: Vec::new(),
            version: 0,
            uncommitted_events: Vec::new(),
        }
    }

    pub fn start(
        id: String,
        agent_id: String,
        start: GeoPoint,
        total_points: usize,
        total_duration: Duration,
    ) -> DomainResult<Self> {
        let mut run = Self::empty(id.clone());
        run.record(SimulationEvent::Started {
            run_id: id,
            agent_id,
            start,
            total_points,
            total_duration_ms: total_duration.as_millis() as u64,
            timestamp: Utc::now(),
        })?;
        Ok(run)
    }

    pub fn pause(&mut self, index: usize) -> DomainResult<()> {
        self.ensure_status(RunStatus::Running, "pause")?;
        self.record(SimulationEvent::Paused {
            run_id: self.id.clone(),
            agent_id: self.agent_id.clone(),
            index,
            timestamp: Utc::now(),
        })
    }

    pub fn resume(&mut self, index: usize) -> DomainResult<()> {
        self.ensure_status(RunStatus::Paused, "resume")?;
        self.record(SimulationEvent::Resumed {
            run_id: self.id.clone(),
            agent_id: self.agent_id.clone(),
            index,
            timestamp: Utc::now(),
        })
    }

    pub fn enter_region(&mut self, region_id: String, point: GeoPoint) -> DomainResult<()> {
        self.ensure_active("enter region")?;
        self.record(SimulationEvent::RegionEntered {
            run_id: self.id.clone(),
            agent_id: self.agent_id.clone(),
            region_id,
            point,
            timestamp: Utc::now(),
        })
    }

    pub fn exit_region(&mut self, region_id: String, point: GeoPoint) -> DomainResult<()> {
        self.ensure_active("exit region")?;
        self.record(SimulationEvent::RegionExited {
            run_id: self.id.clone(),
            agent_id: self.agent_id.clone(),
            region_id,
            point,
            timestamp: Utc::now(),
        })
    }

    pub fn complete(&mut self, index: usize, final_position: GeoPoint) -> DomainResult<()> {
        self.ensure_active("complete")?;
        self.record(SimulationEvent::Completed {
            run_id: self.id.clone(),
            agent_id: self.agent_id.clone(),
            index,
            final_position,
            timestamp: Utc::now(),
        })
    }

    pub fn cancel(&mut self, index: usize) -> DomainResult<()> {
        self.ensure_active("cancel")?;
        self.record(SimulationEvent::Canceled {
            run_id: self.id.clone(),
            agent_id: self.agent_id.clone(),
            index,
            timestamp: Utc::now(),
        })
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.status, RunStatus::Completed | RunStatus::Canceled)
    }

    fn record(&mut self, event: SimulationEvent) -> DomainResult<()> {
        self.apply(&event)?;
        self.add_event(event);
        Ok(())
    }

    fn ensure_status(&self, expected: RunStatus, action: &str) -> DomainResult<()> {
        if self.status != expected {
            return Err(DomainError::InvalidCommand {
                reason: format!("Cannot {} run {} while {:?}", action, self.id, self.status),
            });
        }
        Ok(())
    }

    fn ensure_active(&self, action: &str) -> DomainResult<()> {
        match self.status {
            RunStatus::Running | RunStatus::Paused => Ok(()),
            status => Err(DomainError::InvalidCommand {
                reason: format!("Cannot {} run {} while {:?}", action, self.id, status),
            }),
        }
    }
}

impl AggregateRoot for SimulationRun {
    type Event = SimulationEvent;

    fn aggregate_id(&self) -> &str {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn apply(&mut self, event: &Self::Event) -> DomainResult<()> {
        match event {
            SimulationEvent::Started { run_id, agent_id, start, total_points, .. } => {
                self.id = run_id.clone();
                self.agent_id = agent_id.clone();
                self.total_points = *total_points;
                self.last_index = 0;
                self.last_position = Some(*start);
                self.status = RunStatus::Running;
            }
            SimulationEvent::PositionAdvanced { index, point, .. } => {
                self.last_index = *index;
                self.last_position = Some(*point);
            }
            SimulationEvent::Paused { index, .. } => {
                self.last_index = *index;
                self.status = RunStatus::Paused;
            }
            SimulationEvent::Resumed { index, .. } => {
                self.last_index = *index;
                self.status = RunStatus::Running;
            }
            SimulationEvent::RegionEntered { region_id, point, .. } => {
                if !self.regions_visited.contains(region_id) {
                    self.regions_visited.push(region_id.clone());
                }
                self.last_position = Some(*point);
            }
            SimulationEvent::RegionExited { point, .. } => {
                self.last_position = Some(*point);
            }
            SimulationEvent::Completed { index, final_position, .. } => {
                self.last_index = *index;
                self.last_position = Some(*final_position);
                self.status = RunStatus::Completed;
            }
            SimulationEvent::Canceled { index, .. } => {
                self.last_index = *index;
                self.status = RunStatus::Canceled;
            }
        }
        self.version += 1;
        Ok(())
    }

    fn uncommitted_events(&self) -> &[Self::Event] {
        &self.uncommitted_events
    }

    fn mark_events_as_committed(&mut self) {
        self.uncommitted_events.clear();
    }

    fn add_event(&mut self, event: Self::Event) {
        self.uncommitted_events.push(event);
    }
}
