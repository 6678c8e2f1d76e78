use crate::common::DomainEvent;
use crate::domains::geo::GeoPoint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum SimulationEvent {
    Started {
        run_id: String,
        agent_id: String,
        start: GeoPoint,
        total_points: usize,
        total_duration_ms: u64,
        timestamp: DateTime<Utc>,
    },
    PositionAdvanced {
        run_id: String,
        agent_id: String,
        index: usize,
        point: GeoPoint,
        eta_ms: u64,
        timestamp: DateTime<Utc>,
    },
    Paused {
        run_id: String,
        agent_id: String,
        index: usize,
        timestamp: DateTime<Utc>,
    },
    Resumed {
        run_id: String,
        agent_id: String,
        index: usize,
        timestamp: DateTime<Utc>,
    },
    RegionEntered {
        run_id: String,
        agent_id: String,
        region_id: String,
        point: GeoPoint,
        timestamp: DateTime<Utc>,
    },
    RegionExited {
        run_id: String,
        agent_id: String,
        region_id: String,
        point: GeoPoint,
        timestamp: DateTime<Utc>,
    },
    Completed {
        run_id: String,
        agent_id: String,
        index: usize,
        final_position: GeoPoint,
        timestamp: DateTime<Utc>,
    },
    Canceled {
        run_id: String,
        agent_id: String,
        index: usize,
        timestamp: DateTime<Utc>,
    },
}

impl SimulationEvent {
    pub fn agent_id(&self) -> &str {
        match self {
            SimulationEvent::Started { agent_id, .. }
            | SimulationEvent::PositionAdvanced { agent_id, .. }
            | SimulationEvent::Paused { agent_id, .. }
            | SimulationEvent::Resumed { agent_id, .. }
            | SimulationEvent::RegionEntered { agent_id, .. }
            | SimulationEvent::RegionExited { agent_id, .. }
            | SimulationEvent::Completed { agent_id, .. }
            | SimulationEvent::Canceled { agent_id, .. } => agent_id,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SimulationEvent::Completed { .. } | SimulationEvent::Canceled { .. })
    }
}

impl DomainEvent for SimulationEvent {
    fn event_type(&self) -> &'static str {
        match self {
            SimulationEvent::Started { .. } => "SimulationStarted",
            SimulationEvent::PositionAdvanced { .. } => "PositionAdvanced",
            SimulationEvent::Paused { .. } => "SimulationPaused",
            SimulationEvent::Resumed { .. } => "SimulationResumed",
            SimulationEvent::RegionEntered { .. } => "RegionEntered",
            SimulationEvent::RegionExited { .. } => "RegionExited",
            SimulationEvent::Completed { .. } => "SimulationCompleted",
            SimulationEvent::Canceled { .. } => "SimulationCanceled",
        }
    }

    fn aggregate_id(&self) -> &str {
        match self {
            SimulationEvent::Started { run_id, .. }
            | SimulationEvent::PositionAdvanced { run_id, .. }
            | SimulationEvent::Paused { run_id, .. }
            | SimulationEvent::Resumed { run_id, .. }
            | SimulationEvent::RegionEntered { run_id, .. }
            | SimulationEvent::RegionExited { run_id, .. }
            | SimulationEvent::Completed { run_id, .. }
            | SimulationEvent::Canceled { run_id, .. } => run_id,
        }
    }

    fn event_version(&self) -> u64 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            SimulationEvent::Started { timestamp, .. }
            | SimulationEvent::PositionAdvanced { timestamp, .. }
            | SimulationEvent::Paused { timestamp, .. }
            | SimulationEvent::Resumed { timestamp, .. }
            | SimulationEvent::RegionEntered { timestamp, .. }
            | SimulationEvent::RegionExited { timestamp, .. }
            | SimulationEvent::Completed { timestamp, .. }
            | SimulationEvent::Canceled { timestamp, .. } => *timestamp,
        }
    }
}
