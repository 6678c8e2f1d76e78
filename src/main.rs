use locsim::adapters::inbound::{FileEventStore, GeoJsonWaypointSource, SyntheticWaypointSource};
use locsim::adapters::outbound::{init_combined_logger, init_tracing, LoggingLocationUpdater};
use locsim::application::SimulationService;
use locsim::domains::geo::GeoPoint;
use locsim::domains::simulation::WaypointSource;
use locsim::Config;
use std::error::Error;
use std::sync::Arc;
use tracing::{error, info, warn};

const DEMO_ROUTE: &str = "demo";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    if let Err(e) = init_tracing("info") {
        eprintln!("{}", e);
    }

    info!("Starting locsim");

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.toml".to_string());
    let config = match Config::from_file(&config_path).await {
        Ok(config) => config,
        Err(e) => {
            warn!("Using default configuration ({:#})", e);
            Config::default()
        }
    };

    let logger = init_combined_logger(config.logging.file.as_deref());

    let (source, route): (Arc<dyn WaypointSource>, String) = match &config.data.route {
        Some(route) => (Arc::new(GeoJsonWaypointSource::new(config.data.dir.clone())), route.clone()),
        None => {
            info!("No route configured, using a synthetic demo route");
            let origin = GeoPoint::new(45.5017, -73.5673)?;
            let destination = GeoPoint::new(45.5088, -73.5540)?;
            (
                Arc::new(SyntheticWaypointSource::new(origin, destination, 6, 40.0)),
                DEMO_ROUTE.to_string(),
            )
        }
    };

    let mut service = SimulationService::new(&config, source, Arc::new(LoggingLocationUpdater), logger.clone());
    if let Some(dir) = &config.journal.dir {
        info!("Journaling simulation runs to {}", dir.display());
        service = service.with_event_store(Arc::new(FileEventStore::new(dir.clone())));
    }
    let service = Arc::new(service);

    for agent_id in &config.simulation.agents {
        let plan = service.prepare(agent_id, &route)?;
        let run_id = service.start(plan).await?;
        info!("Agent {} playing route {} as {}", agent_id, route, run_id);
    }

    let interrupt = {
        let service = service.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupted, canceling simulations");
                service.cancel_all().await;
            }
        })
    };

    for agent_id in &config.simulation.agents {
        match service.wait(agent_id).await {
            Ok(outcome) => info!(
                "Agent {} finished: {:?} at index {} after {} ticks",
                outcome.agent_id, outcome.status, outcome.final_index, outcome.ticks
            ),
            Err(e) => error!("Agent {}: {}", agent_id, e),
        }
    }
    interrupt.abort();

    info!("Shutting down locsim");
    Ok(())
}
