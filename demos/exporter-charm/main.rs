//! Example wiring of the reconciliation core into a minimal host. The real hosting framework
//! delivers lifecycle events and owns the relation/status transports; here they are stand-ins
//! that log what they would publish, and the event name is taken from the first argument.
use mongodb_exporter_operator::prelude::*;

struct LoggedIngress;
impl IngressPublisher for LoggedIngress {
    fn publish(&self, config: &IngressConfig) -> anyhow::Result<()> {
        log::info!("would publish ingress data: {:?}", config);
        Ok(())
    }
}

struct LoggedScrape;
impl ScrapePublisher for LoggedScrape {
    fn publish_jobs(&self, jobs: &[ScrapeJob]) -> anyhow::Result<()> {
        log::info!("would advertise scrape jobs: {:?}", jobs);
        Ok(())
    }
}

struct LoggedDashboards;
impl DashboardPublisher for LoggedDashboards {
    fn publish_dashboards(&self) -> anyhow::Result<()> {
        log::info!("would advertise the bundled dashboards");
        Ok(())
    }
}

struct LoggedStatus;
impl StatusSurface for LoggedStatus {
    fn set_status(&self, status: &UnitStatus) {
        log::info!("unit status: {}", status);
    }
}

fn parse_event(name: &str) -> Option<CharmEvent> {
    match name {
        "workload-ready" => Some(CharmEvent::WorkloadReady),
        "config-changed" => Some(CharmEvent::ConfigChanged),
        "periodic-check" => Some(CharmEvent::PeriodicCheck),
        "relation-data-available" => Some(CharmEvent::RelationDataAvailable),
        "relation-removed" => Some(CharmEvent::RelationRemoved),
        _ => None,
    }
}

fn main() {
    env_logger::init();

    let event_name = std::env::args().nth(1).unwrap_or_else(|| {
        eprintln!("usage: exporter-charm <event-name>");
        std::process::exit(1);
    });
    let event = parse_event(event_name.as_str()).unwrap_or_else(|| {
        eprintln!("unknown event: {}", event_name);
        std::process::exit(1);
    });

    let endpoint = std::env::var("CONTROL_ENDPOINT")
        .unwrap_or_else(|_| "http://localhost:4000".to_owned());
    let metrics = Metrics::new();
    let control = Client::new(ControlConfig::new(endpoint), metrics.client_metrics())
        .expect("failed to create control surface client");

    let mut controller = Controller::new(
        "mongodb-exporter",
        Box::new(control),
        Box::new(LoggedIngress),
        Box::new(LoggedScrape),
        Box::new(LoggedDashboards),
        Box::new(LoggedStatus),
        metrics,
    );

    // a real host would read these from its declared-config and relation surfaces
    let mut config = CharmConfig::default();
    if let Ok(uri) = std::env::var("MONGODB_URI") {
        config = config.with_mongodb_uri(uri);
    }
    let request = EventRequest {
        config,
        relation: None,
    };

    let status = controller.handle(event, &request);
    println!("{}", status);
}
