use super::aggregate::{RunStatus, SimulationRun};
use super::clock::{Progress, SimulationClock, Tick};
use super::events::SimulationEvent;
use super::plan::SimulationPlan;
use super::ports::LocationUpdater;
use crate::common::{AggregateRoot, DomainError, DomainResult, EventEnvelope, EventMetadata, EventStore};
use crate::domains::geo::{GeoPoint, GeofenceTracker, Region, RegionTransition};
use crate::domains::logger::DynLogger;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use uuid::Uuid;

const MIN_TICK: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationCommand {
    Pause,
    Resume,
    Cancel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationOutcome {
    pub run_id: String,
    pub agent_id: String,
    pub status: RunStatus,
    pub final_index: usize,
    pub final_position: GeoPoint,
    /// Ticks that moved the marker.
    pub ticks: usize,
}

/// Collaborators of one running simulation.
#[derive(Clone)]
pub struct SimulationContext {
    pub updater: Arc<dyn LocationUpdater>,
    pub logger: DynLogger,
    pub events: Option<mpsc::Sender<SimulationEvent>>,
    pub regions: Vec<Region>,
    /// Secondary, slower interval that re-sends the current location.
    pub heartbeat: Option<Duration>,
    pub event_store: Option<Arc<dyn EventStore>>,
}

impl SimulationContext {
    pub fn new(updater: Arc<dyn LocationUpdater>, logger: DynLogger) -> Self {
        Self {
            updater,
            logger,
            events: None,
            regions: Vec::new(),
            heartbeat: None,
            event_store: None,
        }
    }

    pub fn with_events(mut self, events: mpsc::Sender<SimulationEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn with_regions(mut self, regions: Vec<Region>) -> Self {
        self.regions = regions;
        self
    }

    pub fn with_heartbeat(mut self, heartbeat: Duration) -> Self {
        self.heartbeat = Some(heartbeat);
        self
    }

    pub fn with_event_store(mut self, event_store: Arc<dyn EventStore>) -> Self {
        self.event_store = Some(event_store);
        self
    }
}

/// Cloneable command sender for one simulation, usable without holding its handle.
#[derive(Clone)]
pub struct SimulationControl {
    run_id: String,
    commands: mpsc::Sender<SimulationCommand>,
}

impl SimulationControl {
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub async fn pause(&self) -> DomainResult<()> {
        self.send(SimulationCommand::Pause).await
    }

    pub async fn resume(&self) -> DomainResult<()> {
        self.send(SimulationCommand::Resume).await
    }

    pub async fn cancel(&self) -> DomainResult<()> {
        self.send(SimulationCommand::Cancel).await
    }

    async fn send(&self, command: SimulationCommand) -> DomainResult<()> {
        self.commands.send(command).await.map_err(|_| DomainError::InvalidCommand {
            reason: format!("Simulation {} has already finished", self.run_id),
        })
    }
}

/// Control surface of a spawned simulation.
pub struct SimulationHandle {
    agent_id: String,
    control: SimulationControl,
    task: JoinHandle<SimulationOutcome>,
}

impl SimulationHandle {
    pub fn run_id(&self) -> &str {
        self.control.run_id()
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn control(&self) -> SimulationControl {
        self.control.clone()
    }

    pub async fn pause(&self) -> DomainResult<()> {
        self.control.pause().await
    }

    pub async fn resume(&self) -> DomainResult<()> {
        self.control.resume().await
    }

    pub async fn cancel(&self) -> DomainResult<()> {
        self.control.cancel().await
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub async fn join(self) -> DomainResult<SimulationOutcome> {
        self.task
            .await
            .map_err(|e| DomainError::InfrastructureError(format!("Simulation task failed: {}", e)))
    }
}

/// Spawn a timer-driven playback of `plan` on the current tokio runtime.
pub fn spawn_simulation(plan: SimulationPlan, context: SimulationContext) -> DomainResult<SimulationHandle> {
    let clock = plan.clock()?;
    let run_id = format!("sim-{}", Uuid::new_v4());
    let run = SimulationRun::start(
        run_id.clone(),
        plan.agent_id.clone(),
        clock.current_point(),
        clock.len(),
        plan.total_duration,
    )?;

    let (tx, rx) = mpsc::channel(16);
    let runner = SimulationRunner {
        agent_id: plan.agent_id.clone(),
        interval: plan.interval.max(MIN_TICK),
        geofence: GeofenceTracker::new(context.regions.clone()),
        clock,
        run,
        context,
        ticks: 0,
    };
    let task = tokio::spawn(runner.run(rx));

    Ok(SimulationHandle {
        agent_id: plan.agent_id,
        control: SimulationControl { run_id, commands: tx },
        task,
    })
}

struct SimulationRunner {
    agent_id: String,
    interval: Duration,
    clock: SimulationClock,
    run: SimulationRun,
    geofence: GeofenceTracker,
    context: SimulationContext,
    ticks: usize,
}

impl SimulationRunner {
    async fn run(mut self, mut commands: mpsc::Receiver<SimulationCommand>) -> SimulationOutcome {
        tracing::info!(
            run_id = %self.run.id,
            agent_id = %self.agent_id,
            points = self.clock.len(),
            interval_ms = self.interval.as_millis() as u64,
            "simulation started"
        );
        self.context.logger.info(&format!(
            "Simulation {} started for {} ({} points)",
            self.run.id,
            self.agent_id,
            self.clock.len()
        ));
        self.emit_latest().await;

        let start = self.clock.current_point();
        self.push_location(start);
        self.observe_regions(start).await;

        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the start location was just pushed; the first heartbeat waits a full period
        let mut heartbeat = self.context.heartbeat.map(|period| {
            let period = period.max(MIN_TICK);
            let mut hb = interval_at(Instant::now() + period, period);
            hb.set_missed_tick_behavior(MissedTickBehavior::Delay);
            hb
        });
        let mut commands_open = true;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.clock.tick() {
                        Tick::Advanced(progress) => {
                            self.ticks += 1;
                            self.on_position(&progress).await;
                        }
                        Tick::Completed(progress) => {
                            if progress.index > 0 {
                                self.ticks += 1;
                                self.on_position(&progress).await;
                            }
                            return self.finish(RunStatus::Completed).await;
                        }
                        Tick::Idle => {}
                    }
                }
                _ = next_heartbeat(&mut heartbeat), if heartbeat.is_some() => {
                    self.push_location(self.clock.current_point());
                }
                command = commands.recv(), if commands_open => {
                    match command {
                        Some(SimulationCommand::Pause) => self.pause().await,
                        Some(SimulationCommand::Resume) => {
                            if self.resume().await {
                                ticker.reset();
                            }
                        }
                        Some(SimulationCommand::Cancel) => {
                            if self.clock.cancel() {
                                return self.finish(RunStatus::Canceled).await;
                            }
                        }
                        None => commands_open = false,
                    }
                }
            }
        }
    }

    async fn on_position(&mut self, progress: &Progress) {
        tracing::trace!(agent_id = %self.agent_id, index = progress.index, "tick");
        if let Some(events) = &self.context.events {
            // Per-tick events are dropped when the consumer lags; lifecycle events are not.
            let _ = events.try_send(SimulationEvent::PositionAdvanced {
                run_id: self.run.id.clone(),
                agent_id: self.agent_id.clone(),
                index: progress.index,
                point: progress.point,
                eta_ms: progress.eta.as_millis() as u64,
                timestamp: chrono::Utc::now(),
            });
        }
        self.push_location(progress.point);
        self.observe_regions(progress.point).await;
    }

    async fn pause(&mut self) {
        if !self.clock.pause() {
            return;
        }
        let index = self.clock.index();
        match self.run.pause(index) {
            Ok(()) => self.emit_latest().await,
            Err(e) => self.context.logger.warn(&format!("Pause not recorded: {}", e)),
        }
    }

    async fn resume(&mut self) -> bool {
        if !self.clock.resume() {
            return false;
        }
        let index = self.clock.index();
        match self.run.resume(index) {
            Ok(()) => self.emit_latest().await,
            Err(e) => self.context.logger.warn(&format!("Resume not recorded: {}", e)),
        }
        true
    }

    async fn observe_regions(&mut self, point: GeoPoint) {
        if self.geofence.is_empty() {
            return;
        }
        for transition in self.geofence.observe(&point) {
            let recorded = match transition {
                RegionTransition::Entered(region_id) => self.run.enter_region(region_id, point),
                RegionTransition::Exited(region_id) => self.run.exit_region(region_id, point),
            };
            match recorded {
                Ok(()) => self.emit_latest().await,
                Err(e) => self.context.logger.warn(&format!("Region transition not recorded: {}", e)),
            }
        }
    }

    /// Fire-and-forget remote update; failures are logged and never stop playback.
    fn push_location(&self, point: GeoPoint) {
        let updater = self.context.updater.clone();
        let logger = self.context.logger.clone();
        let agent_id = self.agent_id.clone();
        tokio::spawn(async move {
            if let Err(e) = updater.update_location(&agent_id, point).await {
                logger.warn(&format!("Location update for {} failed: {}", agent_id, e));
            }
        });
    }

    /// Shared cleanup for natural completion and cancellation.
    async fn finish(mut self, status: RunStatus) -> SimulationOutcome {
        let progress = self.clock.progress();
        let recorded = match status {
            RunStatus::Canceled => self.run.cancel(progress.index),
            _ => self.run.complete(progress.index, progress.point),
        };
        match recorded {
            Ok(()) => self.emit_latest().await,
            Err(e) => self.context.logger.error(&format!("Terminal event not recorded: {}", e)),
        }

        if let Some(store) = self.context.event_store.clone() {
            if let Err(e) = self.persist(store.as_ref()).await {
                self.context.logger.error(&format!("Failed to journal {}: {}", self.run.id, e));
            }
        }

        tracing::info!(
            run_id = %self.run.id,
            agent_id = %self.agent_id,
            status = ?status,
            ticks = self.ticks,
            "simulation finished"
        );
        self.context.logger.info(&format!(
            "Simulation {} for {} finished: {:?} at index {}",
            self.run.id, self.agent_id, status, progress.index
        ));

        SimulationOutcome {
            run_id: self.run.id.clone(),
            agent_id: self.agent_id.clone(),
            status,
            final_index: progress.index,
            final_position: progress.point,
            ticks: self.ticks,
        }
    }

    async fn persist(&mut self, store: &dyn EventStore) -> Result<(), String> {
        let metadata = EventMetadata::for_agent(&self.agent_id, "SimulationRunner");
        let envelopes = self
            .run
            .uncommitted_events()
            .iter()
            .map(|event| EventEnvelope::new(event, "SimulationRun", metadata.clone()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| format!("Failed to create event envelope: {}", e))?;

        store.append_events(&self.run.id, 0, envelopes).await?;
        self.run.mark_events_as_committed();
        Ok(())
    }

    async fn emit_latest(&self) {
        let (Some(events), Some(event)) = (&self.context.events, self.run.uncommitted_events().last()) else {
            return;
        };
        let _ = events.send(event.clone()).await;
    }
}

async fn next_heartbeat(heartbeat: &mut Option<Interval>) {
    match heartbeat {
        Some(hb) => {
            hb.tick().await;
        }
        None => std::future::pending().await,
    }
}
