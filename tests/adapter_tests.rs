use locsim::adapters::inbound::{parse_route, route_to_geojson, GeoJsonWaypointSource, InMemoryEventStore, SyntheticWaypointSource};
use locsim::adapters::outbound::RecordingLocationUpdater;
use locsim::common::{EventEnvelope, EventMetadata, EventStore};
use locsim::domains::geo::{haversine_distance, GeoPoint};
use locsim::domains::simulation::{LocationUpdater, SimulationEvent, WaypointSource};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_geojson_source_loads_line_and_point_routes() {
    let dir = tempdir().unwrap();
    let base = dir.path().to_path_buf();
    let source = GeoJsonWaypointSource::new(Some(base.clone()));

    fs::write(
        base.join("line.geojson"),
        r#"{
    "type": "Feature",
    "properties": {"name": "line"},
    "geometry": { "type": "LineString", "coordinates": [[-73.60, 45.50], [-73.59, 45.51], [-73.58, 45.50]] }
}"#,
    )
    .unwrap();
    fs::write(
        base.join("stops.geojson"),
        r#"{
    "type": "FeatureCollection",
    "features": [
        { "type": "Feature", "properties": {"name": "A"}, "geometry": { "type": "Point", "coordinates": [0.0, 0.0] } },
        { "type": "Feature", "properties": {"name": "B"}, "geometry": { "type": "Point", "coordinates": [10.0, 0.0] } }
    ]
}"#,
    )
    .unwrap();

    // extension is optional
    let line = source.load_waypoints("line").unwrap();
    assert_eq!(line.len(), 3);
    assert_eq!(line[0], GeoPoint::new_unchecked(45.50, -73.60));

    let stops = source.load_waypoints("stops.geojson").unwrap();
    assert_eq!(stops, vec![GeoPoint::new_unchecked(0.0, 0.0), GeoPoint::new_unchecked(0.0, 10.0)]);

    assert!(source.load_waypoints("missing").is_err());
}

#[test]
fn test_parse_route_rejects_unusable_input() {
    assert!(parse_route("not json").is_err());
    assert!(parse_route(r#"{"type": "FeatureCollection", "features": []}"#).is_err());
    assert!(parse_route(r#"{"type": "LineString", "coordinates": [[0.0, 95.0], [1.0, 1.0]]}"#).is_err());
}

#[test]
fn test_route_geojson_output_parses_back() {
    let points = vec![GeoPoint::new_unchecked(1.0, 2.0), GeoPoint::new_unchecked(1.5, 2.5)];
    let raw = route_to_geojson(&points);
    assert!(raw.contains("LineString"));
    assert_eq!(parse_route(&raw).unwrap(), points);
}

#[test]
fn test_synthetic_source_is_deterministic_per_route_name() {
    let origin = GeoPoint::new_unchecked(45.50, -73.57);
    let destination = GeoPoint::new_unchecked(45.52, -73.55);
    let source = SyntheticWaypointSource::new(origin, destination, 4, 30.0);

    let first = source.load_waypoints("route-a").unwrap();
    let again = source.load_waypoints("route-a").unwrap();
    assert_eq!(first, again);
    assert_eq!(first.len(), 6);
    assert_eq!(first[0], origin);
    assert_eq!(first[5], destination);

    let straight = SyntheticWaypointSource::new(origin, destination, 4, 0.0)
        .load_waypoints("route-a")
        .unwrap();
    for (jittered, on_line) in first.iter().zip(&straight) {
        assert!(haversine_distance(jittered, on_line) <= 30.0 + 1e-6);
    }
}

#[tokio::test]
async fn test_recording_updater_keeps_updates_per_agent() {
    let updater = RecordingLocationUpdater::new();
    updater.update_location("a", GeoPoint::new_unchecked(1.0, 1.0)).await.unwrap();
    updater.update_location("a", GeoPoint::new_unchecked(2.0, 2.0)).await.unwrap();
    let ack = updater.update_location("b", GeoPoint::new_unchecked(3.0, 3.0)).await.unwrap();

    assert_eq!(ack.agent_id, "b");
    assert_eq!(updater.updates_for("a").await.len(), 2);
    assert_eq!(updater.last_location("a").await, Some(GeoPoint::new_unchecked(2.0, 2.0)));
    assert_eq!(updater.total_updates().await, 3);
    assert!(updater.updates_for("c").await.is_empty());
}

#[test]
fn test_in_memory_store_checks_expected_version() {
    let store = InMemoryEventStore::new();
    let event = SimulationEvent::Canceled {
        run_id: "sim-1".to_string(),
        agent_id: "a".to_string(),
        index: 4,
        timestamp: chrono::Utc::now(),
    };
    let envelope = EventEnvelope::new(&event, "SimulationRun", EventMetadata::for_agent("a", "test")).unwrap();

    tokio_test::block_on(async {
        store.append_events("sim-1", 0, vec![envelope.clone()]).await.unwrap();
        let err = store.append_events("sim-1", 0, vec![envelope.clone()]).await.unwrap_err();
        assert!(err.contains("Version mismatch"));

        let canceled = store.load_events_by_type("SimulationCanceled", None).await.unwrap();
        assert_eq!(canceled.len(), 1);
        assert_eq!(canceled[0].decode::<SimulationEvent>().unwrap(), event);
        assert_eq!(store.run_ids().await, vec!["sim-1".to_string()]);
    });
}
