use async_trait::async_trait;
use locsim::adapters::inbound::InMemoryEventStore;
use locsim::adapters::outbound::{init_noop_logger, RecordingLocationUpdater};
use locsim::common::{DomainError, DomainResult, EventStore};
use locsim::domains::geo::*;
use locsim::domains::logger::DomainLogger;
use locsim::domains::simulation::*;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;

struct BridgeCapture {
    messages: Mutex<Vec<String>>,
}

impl DomainLogger for BridgeCapture {
    fn info(&self, msg: &str) { self.messages.lock().unwrap().push(format!("INFO:{}", msg)); }
    fn warn(&self, msg: &str) { self.messages.lock().unwrap().push(format!("WARN:{}", msg)); }
    fn error(&self, msg: &str) { self.messages.lock().unwrap().push(format!("ERR:{}", msg)); }
}

struct FailingUpdater;

#[async_trait]
impl LocationUpdater for FailingUpdater {
    async fn update_location(&self, _agent_id: &str, _point: GeoPoint) -> DomainResult<LocationAck> {
        Err(DomainError::InfrastructureError("location service unavailable".to_string()))
    }
}

/// ~111 m along the equator at 10 m steps: 13 points, 12 ticks.
fn short_plan(agent_id: &str) -> SimulationPlan {
    let route = [GeoPoint::new_unchecked(0.0, 0.0), GeoPoint::new_unchecked(0.0, 0.001)];
    SimulationPlan::build(agent_id, &route, &DensifyOptions::with_step(10.0), 10.0).unwrap()
}

fn long_plan(agent_id: &str) -> SimulationPlan {
    let route = [GeoPoint::new_unchecked(0.0, 0.0), GeoPoint::new_unchecked(0.0, 0.01)];
    SimulationPlan::build(agent_id, &route, &DensifyOptions::with_step(10.0), 10.0).unwrap()
}

fn drain(rx: &mut mpsc::Receiver<SimulationEvent>) -> Vec<SimulationEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn advanced_indices(events: &[SimulationEvent]) -> Vec<usize> {
    events
        .iter()
        .filter_map(|e| match e {
            SimulationEvent::PositionAdvanced { index, .. } => Some(*index),
            _ => None,
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_simulation_runs_to_completion() {
    let plan = short_plan("courier-1");
    assert_eq!(plan.path.len(), 13);
    let destination = *plan.path.last().unwrap();

    let updater = Arc::new(RecordingLocationUpdater::new());
    let (tx, mut rx) = mpsc::channel(256);
    let context = SimulationContext::new(updater.clone(), init_noop_logger()).with_events(tx);

    let handle = spawn_simulation(plan, context).unwrap();
    let outcome = handle.join().await.unwrap();
    sleep(Duration::from_millis(10)).await;

    assert_eq!(outcome.status, RunStatus::Completed);
    assert_eq!(outcome.ticks, 12);
    assert_eq!(outcome.final_index, 12);
    assert_eq!(outcome.final_position, destination);

    let events = drain(&mut rx);
    assert!(matches!(events.first(), Some(SimulationEvent::Started { total_points: 13, .. })));
    assert_eq!(events.iter().filter(|e| matches!(e, SimulationEvent::Completed { .. })).count(), 1);
    assert!(events.last().unwrap().is_terminal());
    assert_eq!(advanced_indices(&events), (1..=12).collect::<Vec<_>>());

    // start position plus one update per tick
    let updates = updater.updates_for("courier-1").await;
    assert_eq!(updates.len(), 13);
    assert!(updates.iter().any(|u| u.point == destination));
}

#[tokio::test(start_paused = true)]
async fn test_pause_and_resume_never_revisit_points() {
    let plan = short_plan("courier-2");
    let interval = plan.interval;
    let (tx, mut rx) = mpsc::channel(256);
    let context = SimulationContext::new(Arc::new(RecordingLocationUpdater::new()), init_noop_logger()).with_events(tx);

    let handle = spawn_simulation(plan, context).unwrap();
    sleep(interval * 3 + interval / 2).await;
    handle.pause().await.unwrap();
    sleep(interval * 20).await;
    handle.resume().await.unwrap();
    let outcome = handle.join().await.unwrap();

    assert_eq!(outcome.status, RunStatus::Completed);
    let events = drain(&mut rx);
    assert_eq!(advanced_indices(&events), (1..=12).collect::<Vec<_>>());

    let paused_at = events
        .iter()
        .position(|e| matches!(e, SimulationEvent::Paused { .. }))
        .expect("pause event");
    let resumed_at = events
        .iter()
        .position(|e| matches!(e, SimulationEvent::Resumed { .. }))
        .expect("resume event");
    assert!(paused_at < resumed_at);
    // nothing advanced while paused
    assert!(events[paused_at..resumed_at]
        .iter()
        .all(|e| !matches!(e, SimulationEvent::PositionAdvanced { .. })));

    let last_before_pause = advanced_indices(&events[..paused_at]).last().copied().unwrap();
    match &events[paused_at] {
        SimulationEvent::Paused { index, .. } => assert_eq!(*index, last_before_pause),
        _ => unreachable!(),
    }
    let first_after_resume = advanced_indices(&events[resumed_at..])[0];
    assert_eq!(first_after_resume, last_before_pause + 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_runs_cleanup_once() {
    let plan = long_plan("courier-3");
    let last_index = plan.path.len() - 1;
    let interval = plan.interval;
    let store = Arc::new(InMemoryEventStore::new());
    let (tx, mut rx) = mpsc::channel(256);
    let context = SimulationContext::new(Arc::new(RecordingLocationUpdater::new()), init_noop_logger())
        .with_events(tx)
        .with_event_store(store.clone());

    let handle = spawn_simulation(plan, context).unwrap();
    let run_id = handle.run_id().to_string();
    sleep(interval * 5 + interval / 2).await;
    handle.cancel().await.unwrap();
    let outcome = handle.join().await.unwrap();

    assert_eq!(outcome.status, RunStatus::Canceled);
    assert!(outcome.final_index < last_index);
    assert_eq!(outcome.final_index, 5);

    let events = drain(&mut rx);
    assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
    assert!(matches!(events.last(), Some(SimulationEvent::Canceled { index: 5, .. })));

    let journal = store.load_events(&run_id, 0).await.unwrap();
    let types: Vec<&str> = journal.iter().map(|e| e.event_type.as_str()).collect();
    assert_eq!(types, vec!["SimulationStarted", "SimulationCanceled"]);
}

#[tokio::test(start_paused = true)]
async fn test_failed_location_updates_do_not_stop_playback() {
    let capture = Arc::new(BridgeCapture { messages: Mutex::new(Vec::new()) });
    let logger = capture.clone() as Arc<dyn DomainLogger>;
    let context = SimulationContext::new(Arc::new(FailingUpdater), logger);

    let outcome = spawn_simulation(short_plan("courier-4"), context)
        .unwrap()
        .join()
        .await
        .unwrap();
    sleep(Duration::from_millis(10)).await;

    assert_eq!(outcome.status, RunStatus::Completed);
    let msgs = capture.messages.lock().unwrap();
    let failures = msgs
        .iter()
        .filter(|m| m.starts_with("WARN:") && m.contains("location service unavailable"))
        .count();
    assert_eq!(failures, 13);
    assert!(msgs.iter().any(|m| m.contains("finished: Completed")));
}

#[tokio::test(start_paused = true)]
async fn test_heartbeat_resends_current_location() {
    let plan = short_plan("courier-5");
    let heartbeat = plan.interval / 4;
    let updater = Arc::new(RecordingLocationUpdater::new());
    let context = SimulationContext::new(updater.clone(), init_noop_logger()).with_heartbeat(heartbeat);

    spawn_simulation(plan, context).unwrap().join().await.unwrap();
    sleep(Duration::from_millis(10)).await;

    assert!(updater.updates_for("courier-5").await.len() > 13 + 30);
}

#[tokio::test(start_paused = true)]
async fn test_heartbeat_waits_a_full_period_before_first_resend() {
    let plan = long_plan("courier-8");
    let interval = plan.interval;
    let start = plan.path[0];
    let updater = Arc::new(RecordingLocationUpdater::new());
    let context = SimulationContext::new(updater.clone(), init_noop_logger()).with_heartbeat(interval * 4);

    let handle = spawn_simulation(plan, context).unwrap();
    sleep(interval / 2).await;

    // only the initial push of the start location so far
    let updates = updater.updates_for("courier-8").await;
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].point, start);

    handle.cancel().await.unwrap();
    handle.join().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_region_transitions_are_emitted_and_journaled() {
    let plan = short_plan("courier-6");
    let store = Arc::new(InMemoryEventStore::new());
    let region = Region {
        id: "crossing".to_string(),
        name: "Crossing".to_string(),
        shape: RegionShape::Circle {
            center: GeoPoint::new_unchecked(0.0, 0.0005),
            radius_m: 25.0,
        },
    };
    let (tx, mut rx) = mpsc::channel(256);
    let context = SimulationContext::new(Arc::new(RecordingLocationUpdater::new()), init_noop_logger())
        .with_events(tx)
        .with_regions(vec![region])
        .with_event_store(store.clone());

    let handle = spawn_simulation(plan, context).unwrap();
    let run_id = handle.run_id().to_string();
    handle.join().await.unwrap();

    let events = drain(&mut rx);
    let entered = events
        .iter()
        .position(|e| matches!(e, SimulationEvent::RegionEntered { region_id, .. } if region_id == "crossing"))
        .expect("entered");
    let exited = events
        .iter()
        .position(|e| matches!(e, SimulationEvent::RegionExited { region_id, .. } if region_id == "crossing"))
        .expect("exited");
    assert!(entered < exited);

    let journal = store.load_events(&run_id, 0).await.unwrap();
    let types: Vec<&str> = journal.iter().map(|e| e.event_type.as_str()).collect();
    assert_eq!(
        types,
        vec!["SimulationStarted", "RegionEntered", "RegionExited", "SimulationCompleted"]
    );
}

#[tokio::test]
async fn test_commands_after_finish_are_rejected() {
    let route = [GeoPoint::new_unchecked(0.0, 0.0), GeoPoint::new_unchecked(0.0, 0.0001)];
    // 11 m at 1 km/s: a few milliseconds of wall time
    let plan = SimulationPlan::build("courier-7", &route, &DensifyOptions::with_step(2.0), 1_000.0).unwrap();
    let handle = spawn_simulation(plan, SimulationContext::new(Arc::new(RecordingLocationUpdater::new()), init_noop_logger())).unwrap();

    while !handle.is_finished() {
        sleep(Duration::from_millis(5)).await;
    }
    assert!(matches!(handle.pause().await, Err(DomainError::InvalidCommand { .. })));
    assert_eq!(handle.join().await.unwrap().status, RunStatus::Completed);
}
