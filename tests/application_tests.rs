use locsim::adapters::inbound::{InMemoryEventStore, SyntheticWaypointSource};
use locsim::adapters::outbound::{init_noop_logger, RecordingLocationUpdater};
use locsim::application::SimulationService;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use locsim::common::{ApplicationError, DomainError, EventEnvelope, EventStore};
use locsim::domains::geo::GeoPoint;
use locsim::domains::simulation::RunStatus;
use locsim::Config;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::{sleep, timeout};

/// Journal whose appends wait until permits are released.
struct GatedEventStore {
    gate: Semaphore,
}

#[async_trait]
impl EventStore for GatedEventStore {
    async fn append_events(&self, _aggregate_id: &str, _expected_version: u64, _events: Vec<EventEnvelope>) -> Result<(), String> {
        let _permit = self.gate.acquire().await.map_err(|e| e.to_string())?;
        Ok(())
    }

    async fn load_events(&self, _aggregate_id: &str, _from_version: u64) -> Result<Vec<EventEnvelope>, String> {
        Ok(Vec::new())
    }

    async fn load_events_by_type(
        &self,
        _event_type: &str,
        _from_timestamp: Option<DateTime<Utc>>,
    ) -> Result<Vec<EventEnvelope>, String> {
        Ok(Vec::new())
    }
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.simulation.step_distance_m = 10.0;
    config.simulation.speed_mps = 10.0;
    config.simulation.heartbeat_secs = 0;
    config
}

fn service(store: Option<Arc<InMemoryEventStore>>) -> (SimulationService, Arc<RecordingLocationUpdater>) {
    let source = SyntheticWaypointSource::new(
        GeoPoint::new_unchecked(0.0, 0.0),
        GeoPoint::new_unchecked(0.0, 0.002),
        1,
        0.0,
    );
    let updater = Arc::new(RecordingLocationUpdater::new());
    let mut service = SimulationService::new(&test_config(), Arc::new(source), updater.clone(), init_noop_logger());
    if let Some(store) = store {
        service = service.with_event_store(store);
    }
    (service, updater)
}

fn short_route() -> Vec<GeoPoint> {
    vec![GeoPoint::new_unchecked(0.0, 0.0), GeoPoint::new_unchecked(0.0, 0.001)]
}

#[tokio::test(start_paused = true)]
async fn test_prepare_densifies_named_route() {
    let (service, _) = service(None);
    let plan = service.prepare("courier-1", "downtown").unwrap();

    // ~222 m at 10 m steps, split by one midpoint
    assert_eq!(plan.path.first(), Some(&GeoPoint::new_unchecked(0.0, 0.0)));
    assert_eq!(plan.path.last(), Some(&GeoPoint::new_unchecked(0.0, 0.002)));
    assert!(plan.path.len() > 20);
    assert!((plan.total_duration.as_secs_f64() - plan.path_length_m / 10.0).abs() < 1e-6);
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_start_for_running_agent_is_rejected() {
    let (service, _) = service(None);
    let plan = service.plan_from_waypoints("courier-1", &short_route()).unwrap();
    service.start(plan.clone()).await.unwrap();

    let err = service.start(plan).await.unwrap_err();
    assert!(matches!(err, ApplicationError::Domain(DomainError::InvalidCommand { .. })));
    assert_eq!(service.active_agents().await, vec!["courier-1".to_string()]);

    service.cancel("courier-1").await.unwrap();
    let outcome = service.wait("courier-1").await.unwrap();
    assert_eq!(outcome.status, RunStatus::Canceled);
    assert!(service.active_agents().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_agents_run_independently() {
    let (service, updater) = service(None);
    let short = service.plan_from_waypoints("courier-1", &short_route()).unwrap();
    let long = service
        .plan_from_waypoints(
            "courier-2",
            &[GeoPoint::new_unchecked(1.0, 1.0), GeoPoint::new_unchecked(1.0, 1.002)],
        )
        .unwrap();
    service.start(short).await.unwrap();
    service.start(long).await.unwrap();

    sleep(Duration::from_secs(2)).await;
    service.pause("courier-2").await.unwrap();

    let first = service.wait("courier-1").await.unwrap();
    assert_eq!(first.status, RunStatus::Completed);
    sleep(Duration::from_millis(10)).await;

    let paused = service.progress("courier-2").await.unwrap();
    assert_eq!(paused.status, RunStatus::Paused);
    assert!(paused.index < paused.total_points - 1);

    service.resume("courier-2").await.unwrap();
    let second = service.wait("courier-2").await.unwrap();
    assert_eq!(second.status, RunStatus::Completed);
    sleep(Duration::from_millis(10)).await;

    let fleet = service.fleet().await;
    assert_eq!(fleet.len(), 2);
    assert!(fleet.iter().all(|p| p.status == RunStatus::Completed && p.eta_ms == 0));
    assert_eq!(updater.last_location("courier-1").await, Some(GeoPoint::new_unchecked(0.0, 0.001)));
}

#[tokio::test(start_paused = true)]
async fn test_unknown_agent_is_not_found() {
    let (service, _) = service(None);
    assert!(matches!(
        service.pause("nobody").await,
        Err(ApplicationError::Domain(DomainError::AggregateNotFound { .. }))
    ));
    assert!(service.wait("nobody").await.is_err());
    assert!(service.progress("nobody").await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_finished_run_is_rebuilt_from_journal() {
    let store = Arc::new(InMemoryEventStore::new());
    let (service, _) = service(Some(store.clone()));
    let plan = service.plan_from_waypoints("courier-1", &short_route()).unwrap();
    let total_points = plan.path.len();

    let run_id = service.start(plan).await.unwrap();
    service.wait("courier-1").await.unwrap();

    assert_eq!(store.run_ids().await, vec![run_id.clone()]);
    let run = service.load_run(&run_id).await.unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.agent_id, "courier-1");
    assert_eq!(run.total_points, total_points);
    assert_eq!(run.last_index, total_points - 1);

    assert!(service.load_run("sim-missing").await.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_cancel_all_stops_every_agent() {
    let (service, _) = service(None);
    for agent in ["a", "b", "c"] {
        let plan = service.plan_from_waypoints(agent, &short_route()).unwrap();
        service.start(plan).await.unwrap();
    }
    sleep(Duration::from_secs(1)).await;
    service.cancel_all().await;

    for agent in ["a", "b", "c"] {
        assert_eq!(service.wait(agent).await.unwrap().status, RunStatus::Canceled);
    }
}

#[tokio::test(start_paused = true)]
async fn test_stalled_runner_does_not_block_other_agents() {
    let store = Arc::new(GatedEventStore { gate: Semaphore::new(0) });
    let (service, _) = service(None);
    let service = Arc::new(service.with_event_store(store.clone()));

    let stalled = service.plan_from_waypoints("stalled", &short_route()).unwrap();
    let other = service
        .plan_from_waypoints(
            "other",
            &[GeoPoint::new_unchecked(1.0, 1.0), GeoPoint::new_unchecked(1.0, 1.01)],
        )
        .unwrap();
    service.start(stalled).await.unwrap();
    service.start(other).await.unwrap();

    // "stalled" reaches its destination and blocks while journaling, so it
    // stops reading commands and its command buffer fills up
    sleep(Duration::from_secs(12)).await;
    let flood = {
        let service = service.clone();
        tokio::spawn(async move {
            for _ in 0..64 {
                let _ = service.pause("stalled").await;
            }
        })
    };
    sleep(Duration::from_millis(1)).await;
    assert!(!flood.is_finished());

    let canceled = timeout(Duration::from_secs(1), service.cancel("other")).await;
    assert!(matches!(canceled, Ok(Ok(()))));

    store.gate.add_permits(16);
    flood.await.unwrap();
    assert_eq!(service.wait("other").await.unwrap().status, RunStatus::Canceled);
    assert_eq!(service.wait("stalled").await.unwrap().status, RunStatus::Completed);
}
