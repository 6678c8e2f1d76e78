use crate::common::{load_from_history, ApplicationError, ApplicationResult, DomainError, EventStore};
use crate::config::Config;
use crate::domains::geo::{DensifyOptions, GeoPoint, Region};
use crate::domains::logger::DynLogger;
use crate::domains::simulation::{
    spawn_simulation, AgentProgress, FleetProjection, FleetProjectionActor, LocationUpdater, SimulationContext,
    SimulationControl, SimulationEvent, SimulationHandle, SimulationOutcome, SimulationPlan, SimulationRun, WaypointSource,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex, RwLock};

/// Prepares and controls independent simulations, one per agent id.
pub struct SimulationService {
    waypoints: Arc<dyn WaypointSource>,
    updater: Arc<dyn LocationUpdater>,
    logger: DynLogger,
    options: DensifyOptions,
    speed_mps: f64,
    heartbeat: Option<Duration>,
    regions: Vec<Region>,
    event_store: Option<Arc<dyn EventStore>>,
    events: mpsc::Sender<SimulationEvent>,
    projection: Arc<RwLock<FleetProjection>>,
    running: Mutex<HashMap<String, SimulationHandle>>,
}

impl SimulationService {
    /// Must be called inside a tokio runtime: the fleet projection runs as a task.
    pub fn new(
        config: &Config,
        waypoints: Arc<dyn WaypointSource>,
        updater: Arc<dyn LocationUpdater>,
        logger: DynLogger,
    ) -> Self {
        let projection = Arc::new(RwLock::new(FleetProjection::new()));
        let (events, receiver) = mpsc::channel(1024);
        tokio::spawn(FleetProjectionActor::new(projection.clone(), receiver).run());

        let heartbeat = match config.simulation.heartbeat_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        Self {
            waypoints,
            updater,
            logger,
            options: config.densify_options(),
            speed_mps: config.simulation.speed_mps,
            heartbeat,
            regions: config.regions.clone(),
            event_store: None,
            events,
            projection,
            running: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_event_store(mut self, event_store: Arc<dyn EventStore>) -> Self {
        self.event_store = Some(event_store);
        self
    }

    /// Load the named route and densify it for `agent_id`.
    pub fn prepare(&self, agent_id: &str, route_name: &str) -> ApplicationResult<SimulationPlan> {
        let waypoints = self.waypoints.load_waypoints(route_name)?;
        self.logger.info(&format!(
            "Loaded route {} with {} waypoints for {}",
            route_name,
            waypoints.len(),
            agent_id
        ));
        self.plan_from_waypoints(agent_id, &waypoints)
    }

    pub fn plan_from_waypoints(&self, agent_id: &str, waypoints: &[GeoPoint]) -> ApplicationResult<SimulationPlan> {
        let plan = SimulationPlan::build(agent_id, waypoints, &self.options, self.speed_mps)?;
        tracing::info!(
            agent_id,
            points = plan.path.len(),
            length_m = plan.path_length_m,
            duration_s = plan.total_duration.as_secs_f64(),
            "simulation planned"
        );
        Ok(plan)
    }

    /// Spawn playback of `plan`. Returns the run id.
    pub async fn start(&self, plan: SimulationPlan) -> ApplicationResult<String> {
        let mut running = self.running.lock().await;
        if let Some(existing) = running.get(&plan.agent_id) {
            if !existing.is_finished() {
                return Err(DomainError::InvalidCommand {
                    reason: format!("Agent {} already has a running simulation", plan.agent_id),
                }
                .into());
            }
        }

        let mut context = SimulationContext::new(self.updater.clone(), self.logger.clone())
            .with_events(self.events.clone())
            .with_regions(self.regions.clone());
        if let Some(heartbeat) = self.heartbeat {
            context = context.with_heartbeat(heartbeat);
        }
        if let Some(store) = &self.event_store {
            context = context.with_event_store(store.clone());
        }

        let agent_id = plan.agent_id.clone();
        let handle = spawn_simulation(plan, context)?;
        let run_id = handle.run_id().to_string();
        running.insert(agent_id, handle);
        Ok(run_id)
    }

    pub async fn pause(&self, agent_id: &str) -> ApplicationResult<()> {
        self.control(agent_id).await?.pause().await?;
        Ok(())
    }

    pub async fn resume(&self, agent_id: &str) -> ApplicationResult<()> {
        self.control(agent_id).await?.resume().await?;
        Ok(())
    }

    pub async fn cancel(&self, agent_id: &str) -> ApplicationResult<()> {
        self.control(agent_id).await?.cancel().await?;
        Ok(())
    }

    /// Cancel every simulation that is still running.
    pub async fn cancel_all(&self) {
        let controls: Vec<(String, SimulationControl)> = {
            let running = self.running.lock().await;
            let controls = running
                .iter()
                .filter(|(_, handle)| !handle.is_finished())
                .map(|(agent_id, handle)| (agent_id.clone(), handle.control()))
                .collect();
            controls
        };
        for (agent_id, control) in controls {
            if let Err(e) = control.cancel().await {
                self.logger.warn(&format!("Cancel for {} ignored: {}", agent_id, e));
            }
        }
    }

    /// Agents whose simulation task has not finished yet, sorted.
    pub async fn active_agents(&self) -> Vec<String> {
        let running = self.running.lock().await;
        let mut agents: Vec<String> = running
            .iter()
            .filter(|(_, handle)| !handle.is_finished())
            .map(|(agent_id, _)| agent_id.clone())
            .collect();
        agents.sort();
        agents
    }

    /// Wait for the agent's simulation to end and forget its handle.
    pub async fn wait(&self, agent_id: &str) -> ApplicationResult<SimulationOutcome> {
        let handle = self
            .running
            .lock()
            .await
            .remove(agent_id)
            .ok_or_else(|| DomainError::AggregateNotFound { id: agent_id.to_string() })?;
        Ok(handle.join().await?)
    }

    pub async fn progress(&self, agent_id: &str) -> Option<AgentProgress> {
        self.projection.read().await.agents.get(agent_id).cloned()
    }

    pub async fn fleet(&self) -> Vec<AgentProgress> {
        let projection = self.projection.read().await;
        let mut agents: Vec<AgentProgress> = projection.agents.values().cloned().collect();
        agents.sort_by(|a, b| a.agent_id.cmp(&b.agent_id));
        agents
    }

    /// Rebuild a finished run from the journal.
    pub async fn load_run(&self, run_id: &str) -> ApplicationResult<SimulationRun> {
        let store = self
            .event_store
            .as_ref()
            .ok_or_else(|| ApplicationError::EventStore("No journal configured".to_string()))?;
        let envelopes = store.load_events(run_id, 0).await.map_err(ApplicationError::EventStore)?;
        if envelopes.is_empty() {
            return Err(DomainError::AggregateNotFound { id: run_id.to_string() }.into());
        }
        let events = envelopes
            .iter()
            .map(|e| e.decode::<SimulationEvent>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(DomainError::from)?;
        Ok(load_from_history(SimulationRun::empty(run_id.to_string()), &events)?)
    }

    /// The `running` lock is released before any command is sent.
    async fn control(&self, agent_id: &str) -> ApplicationResult<SimulationControl> {
        self.running
            .lock()
            .await
            .get(agent_id)
            .map(SimulationHandle::control)
            .ok_or_else(|| DomainError::AggregateNotFound { id: agent_id.to_string() }.into())
    }
}
