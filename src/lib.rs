//! A reconciliation core for a MongoDB metrics exporter that runs as a sidecar workload of an
//! application unit. On every lifecycle event the `Controller` re-derives a single desired
//! configuration from the declared charm config and the current datastore relation, converges the
//! managed exporter process onto it, and reports exactly one `UnitStatus`.
//!
//! The exporter binary, the ingress controller, and the metrics backend are all external systems.
//! This crate only decides _what_ the exporter service should look like and whether the unit is
//! `Active`, `Waiting`, or `Blocked`.
//!
//! Minimal wiring example:
//! ```no_run
//! use mongodb_exporter_operator::prelude::*;
//!
//! struct LoggedIngress;
//! impl IngressPublisher for LoggedIngress {
//!     fn publish(&self, config: &IngressConfig) -> anyhow::Result<()> {
//!         log::info!("ingress data: {:?}", config);
//!         Ok(())
//!     }
//! }
//!
//! struct LoggedScrape;
//! impl ScrapePublisher for LoggedScrape {
//!     fn publish_jobs(&self, jobs: &[ScrapeJob]) -> anyhow::Result<()> {
//!         log::info!("scrape jobs: {:?}", jobs);
//!         Ok(())
//!     }
//! }
//!
//! struct LoggedDashboards;
//! impl DashboardPublisher for LoggedDashboards {
//!     fn publish_dashboards(&self) -> anyhow::Result<()> {
//!         log::info!("advertising bundled dashboards");
//!         Ok(())
//!     }
//! }
//!
//! struct LoggedStatus;
//! impl StatusSurface for LoggedStatus {
//!     fn set_status(&self, status: &UnitStatus) {
//!         log::info!("unit status: {}", status);
//!     }
//! }
//!
//! let metrics = Metrics::new();
//! let control = Client::new(ControlConfig::new("http://localhost:4000"), metrics.client_metrics())
//!     .expect("failed to create control surface client");
//! let mut controller = Controller::new(
//!     "mongodb-exporter",
//!     Box::new(control),
//!     Box::new(LoggedIngress),
//!     Box::new(LoggedScrape),
//!     Box::new(LoggedDashboards),
//!     Box::new(LoggedStatus),
//!     metrics,
//! );
//!
//! // The hosting framework delivers one named lifecycle event at a time. Each event carries a
//! // snapshot of the declared configuration and the latest datastore relation data.
//! let request = EventRequest {
//!     config: CharmConfig::default().with_mongodb_uri("mongodb://mongodb:27017/"),
//!     relation: None,
//! };
//! let status = controller.handle(CharmEvent::ConfigChanged, &request);
//! assert!(status.is_active());
//! ```

#[macro_use]
extern crate serde_derive;

pub mod config;
pub mod error;
pub mod relation;
pub mod resolver;
pub mod runner;
pub mod service;
pub mod status;

pub use serde;
pub use serde_json;
pub use serde_yaml;

pub mod prelude {
    pub use crate::config::{CharmConfig, ControlConfig, LogLevel};
    pub use crate::error::Error;
    pub use crate::relation::{
        DashboardPublisher, DatastoreRequest, IngressConfig, IngressPublisher, RelationSnapshot,
        ScrapeJob, ScrapePublisher,
    };
    pub use crate::resolver::{DesiredState, ResolutionError};
    pub use crate::runner::client::Client;
    pub use crate::runner::metrics::Metrics;
    pub use crate::runner::{CharmEvent, Controller, ControlSurface, EventRequest, ServiceInfo};
    pub use crate::service::{ServiceDescriptor, EXPORTER_PORT, SERVICE_NAME};
    pub use crate::status::{StatusSurface, UnitStatus};
    pub use serde::{Deserialize, Serialize};
}
