//! The event controller: the single entry point for every lifecycle event. Each event runs to
//! completion on the calling thread; the only suspension-like behavior is a deferred convergence,
//! which hands control straight back to the host.
pub mod client;
pub mod control;
pub mod converge;
pub mod metrics;

#[cfg(feature = "testkit")]
pub mod testkit;

use crate::config::CharmConfig;
use crate::relation::{
    DashboardPublisher, DatastoreRequest, IngressConfig, IngressPublisher, RelationSnapshot,
    ScrapeJob, ScrapePublisher,
};
use crate::resolver::{self, DesiredState, ResolutionError};
use crate::service::SERVICE_NAME;
use crate::status::{StatusSurface, UnitStatus};

pub use self::control::{ControlSurface, ServiceInfo};
pub use self::converge::{converge, Outcome};
use self::metrics::Metrics;

use std::time::Instant;

/// The literal waiting reason assigned whenever convergence is deferred.
pub const WAITING_FOR_CONTROL_SURFACE: &str = "waiting for control surface";

/// The discrete lifecycle events the host delivers. The controller owns the mapping from event
/// kind to handling logic; there is no ambient observer registration.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CharmEvent {
    WorkloadReady,
    ConfigChanged,
    PeriodicCheck,
    RelationDataAvailable,
    RelationRemoved,
}

impl CharmEvent {
    pub fn name(&self) -> &'static str {
        match *self {
            CharmEvent::WorkloadReady => "workload-ready",
            CharmEvent::ConfigChanged => "config-changed",
            CharmEvent::PeriodicCheck => "periodic-check",
            CharmEvent::RelationDataAvailable => "relation-data-available",
            CharmEvent::RelationRemoved => "relation-removed",
        }
    }
}

/// The snapshot of the world that accompanies an event: the declared configuration and the latest
/// datastore relation data, if any. The core never mutates either.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EventRequest {
    pub config: CharmConfig,
    pub relation: Option<RelationSnapshot>,
}

/// Orchestrates resolver, convergence engine, and status derivation for every event, and pushes
/// derived hostname data to the ingress collaborator. Failures never cross this boundary; every
/// one becomes a status assignment.
pub struct Controller {
    app_name: String,
    control: Box<dyn ControlSurface>,
    ingress: Box<dyn IngressPublisher>,
    scrape: Box<dyn ScrapePublisher>,
    dashboards: Box<dyn DashboardPublisher>,
    status_surface: Box<dyn StatusSurface>,
    metrics: Metrics,
    current_status: UnitStatus,
}

impl Controller {
    pub fn new(
        app_name: impl Into<String>,
        control: Box<dyn ControlSurface>,
        ingress: Box<dyn IngressPublisher>,
        scrape: Box<dyn ScrapePublisher>,
        dashboards: Box<dyn DashboardPublisher>,
        status_surface: Box<dyn StatusSurface>,
        metrics: Metrics,
    ) -> Controller {
        Controller {
            app_name: app_name.into(),
            control,
            ingress,
            scrape,
            dashboards,
            status_surface,
            metrics,
            // nothing has been configured before the first event
            current_status: UnitStatus::waiting(WAITING_FOR_CONTROL_SURFACE),
        }
    }

    /// Handles one lifecycle event to completion and returns the resulting unit status. The
    /// status is always recomputed from the request snapshot; the first failure short-circuits
    /// the rest of the pipeline for this event.
    pub fn handle(&mut self, event: CharmEvent, request: &EventRequest) -> UnitStatus {
        let start_time = Instant::now();
        self.metrics.event_received(event);
        log::info!("Handling event: {}", event.name());

        let status = match event {
            CharmEvent::WorkloadReady => self.reconfigure(request, false),
            CharmEvent::ConfigChanged => self.on_config_changed(request),
            CharmEvent::PeriodicCheck => self.reconfigure(request, true),
            CharmEvent::RelationDataAvailable => self.reconfigure(request, false),
            CharmEvent::RelationRemoved => self.on_relation_removed(request),
        };

        self.metrics.event_handled(start_time.elapsed());
        log::info!(
            "Finished event: {} with status: {} in {}ms",
            event.name(),
            status,
            start_time.elapsed().as_millis()
        );
        status
    }

    /// The data this unit requests from the datastore when the relation is established. Exposed so
    /// the host can publish it on relation join.
    pub fn datastore_request(&self, config: &CharmConfig) -> DatastoreRequest {
        DatastoreRequest::new(self.app_name.as_str(), config.relation_admin_role)
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// The common pipeline: resolve, converge, push ingress data, derive status. When
    /// `verify_running` is set (the periodic check), additionally require that the supervisor
    /// reports the exporter service as running.
    fn reconfigure(&mut self, request: &EventRequest, verify_running: bool) -> UnitStatus {
        let desired = match resolver::resolve(&request.config, request.relation.as_ref()) {
            Ok(desired) => desired,
            Err(err) => {
                log::warn!("Resolution failed: {}", err);
                return self.assign_status(UnitStatus::blocked(err.to_string()));
            }
        };

        match converge(&desired, &*self.control) {
            Ok(Outcome::Deferred) => {
                self.metrics.converge_deferred();
                self.assign_status(UnitStatus::waiting(WAITING_FOR_CONTROL_SURFACE))
            }
            Ok(Outcome::Applied(_)) => {
                self.push_ingress(&desired);
                if verify_running {
                    match self.verify_service_running() {
                        Ok(()) => self.assign_status(UnitStatus::Active),
                        Err(status) => self.assign_status(status),
                    }
                } else {
                    self.assign_status(UnitStatus::Active)
                }
            }
            Err(err) => {
                // reachability changed between the check and the use; treat it like an
                // unreachable control surface and let the redelivered event try again
                log::error!("Failed to apply service descriptor: {}", err);
                self.assign_status(UnitStatus::waiting(WAITING_FOR_CONTROL_SURFACE))
            }
        }
    }

    fn on_config_changed(&mut self, request: &EventRequest) -> UnitStatus {
        // the scrape and dashboard advertisements are static, so config-changed is their only
        // refresh trigger
        let jobs = [ScrapeJob::static_target()];
        if let Err(err) = self.scrape.publish_jobs(&jobs) {
            log::warn!("Failed to refresh scrape jobs: {}", err);
        }
        if let Err(err) = self.dashboards.publish_dashboards() {
            log::warn!("Failed to refresh dashboards: {}", err);
        }
        self.reconfigure(request, false)
    }

    /// Relation teardown only re-validates that a connection-uri source remains. No descriptor
    /// update is attempted, and if a source is still configured the prior status stands.
    fn on_relation_removed(&mut self, request: &EventRequest) -> UnitStatus {
        if resolver::any_source_configured(&request.config, None) {
            log::debug!("Relation removed but a static uri remains configured");
            self.current_status.clone()
        } else {
            self.assign_status(UnitStatus::blocked(ResolutionError::MissingSource.to_string()))
        }
    }

    fn verify_service_running(&self) -> Result<(), UnitStatus> {
        match self.control.describe(SERVICE_NAME) {
            Ok(info) if info.running => Ok(()),
            Ok(_) => Err(UnitStatus::blocked(format!(
                "{} service is not running",
                SERVICE_NAME
            ))),
            Err(err) => {
                log::error!("Failed to describe service {}: {}", SERVICE_NAME, err);
                Err(UnitStatus::waiting(WAITING_FOR_CONTROL_SURFACE))
            }
        }
    }

    /// Best-effort push of the derived hostname data; never part of the status determination.
    fn push_ingress(&self, desired: &DesiredState) {
        let config = IngressConfig::new(self.app_name.as_str(), desired.external_hostname.clone());
        log::debug!("updating ingress config: {:?}", config);
        if let Err(err) = self.ingress.publish(&config) {
            log::warn!("Failed to publish ingress config: {}", err);
        }
    }

    fn assign_status(&mut self, status: UnitStatus) -> UnitStatus {
        self.metrics.status_assigned(&status);
        self.status_surface.set_status(&status);
        self.current_status = status.clone();
        status
    }
}
