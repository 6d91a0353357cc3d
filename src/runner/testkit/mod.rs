//! A self-contained harness for exercising the controller against an in-memory control surface
//! and recording collaborators. Only available when the `testkit` feature is enabled.
use crate::config::CharmConfig;
use crate::error::Error;
use crate::relation::{
    DashboardPublisher, IngressConfig, IngressPublisher, RelationSnapshot, ScrapeJob,
    ScrapePublisher,
};
use crate::runner::control::{ControlSurface, ServiceInfo};
use crate::runner::metrics::Metrics;
use crate::runner::{CharmEvent, Controller, EventRequest};
use crate::service::ServiceDescriptor;
use crate::status::{StatusSurface, UnitStatus};

use std::fmt::{self, Debug, Display};
use std::sync::{Arc, RwLock};

/// Drives lifecycle events through a real `Controller` wired to fakes, and provides assertion
/// helpers over everything the controller did: applied descriptors, published ingress data,
/// advertised scrape jobs, and the full sequence of assigned statuses.
pub struct TestKit {
    controller: Controller,
    control: FakeControlSurface,
    ingress: RecordingIngress,
    scrape: RecordingScrape,
    dashboards: RecordingDashboards,
    status: RecordingStatus,
    config: CharmConfig,
    relation: Option<RelationSnapshot>,
}

impl Debug for TestKit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("TestKit")
            .field("config", &self.config)
            .field("relation", &self.relation)
            .field("statuses", &self.status.recorded())
            .finish()
    }
}

impl Default for TestKit {
    fn default() -> TestKit {
        TestKit::new()
    }
}

impl TestKit {
    pub fn new() -> TestKit {
        TestKit::with_app_name("mongodb-exporter")
    }

    pub fn with_app_name(app_name: impl Into<String>) -> TestKit {
        let control = FakeControlSurface::new();
        let ingress = RecordingIngress::default();
        let scrape = RecordingScrape::default();
        let dashboards = RecordingDashboards::default();
        let status = RecordingStatus::default();
        let controller = Controller::new(
            app_name,
            Box::new(control.clone()),
            Box::new(ingress.clone()),
            Box::new(scrape.clone()),
            Box::new(dashboards.clone()),
            Box::new(status.clone()),
            Metrics::new(),
        );
        TestKit {
            controller,
            control,
            ingress,
            scrape,
            dashboards,
            status,
            config: CharmConfig::default(),
            relation: None,
        }
    }

    pub fn set_reachable(&mut self, reachable: bool) {
        self.control.set_reachable(reachable);
    }

    pub fn set_service_running(&mut self, running: bool) {
        self.control.set_service_running(running);
    }

    pub fn fail_next_apply(&mut self, message: impl Into<String>) {
        self.control.fail_next_apply(message);
    }

    /// Delivers a config-changed event with the given declared configuration.
    pub fn update_config(&mut self, config: CharmConfig) -> UnitStatus {
        self.config = config;
        self.handle(CharmEvent::ConfigChanged)
    }

    pub fn workload_ready(&mut self) -> UnitStatus {
        self.handle(CharmEvent::WorkloadReady)
    }

    pub fn periodic_check(&mut self) -> UnitStatus {
        self.handle(CharmEvent::PeriodicCheck)
    }

    /// Populates the datastore relation and delivers the data-available event.
    pub fn relate(&mut self, snapshot: RelationSnapshot) -> UnitStatus {
        self.relation = Some(snapshot);
        self.handle(CharmEvent::RelationDataAvailable)
    }

    /// Tears the datastore relation down and delivers the relation-removed event.
    pub fn remove_relation(&mut self) -> UnitStatus {
        self.relation = None;
        self.handle(CharmEvent::RelationRemoved)
    }

    pub fn handle(&mut self, event: CharmEvent) -> UnitStatus {
        let request = EventRequest {
            config: self.config.clone(),
            relation: self.relation.clone(),
        };
        self.controller.handle(event, &request)
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub fn last_applied(&self) -> Option<ServiceDescriptor> {
        self.control.last_applied()
    }

    pub fn applied_count(&self) -> usize {
        self.control.applied_count()
    }

    pub fn reconcile_count(&self) -> usize {
        self.control.reconcile_count()
    }

    pub fn last_ingress(&self) -> Option<IngressConfig> {
        self.ingress.last()
    }

    pub fn scrape_jobs(&self) -> Vec<ScrapeJob> {
        self.scrape.last().unwrap_or_default()
    }

    pub fn dashboard_refreshes(&self) -> usize {
        self.dashboards.refresh_count()
    }

    pub fn recorded_statuses(&self) -> Vec<UnitStatus> {
        self.status.recorded()
    }

    pub fn current_status(&self) -> Option<UnitStatus> {
        self.status.recorded().last().cloned()
    }

    pub fn assert_active(&self) {
        match self.current_status() {
            Some(UnitStatus::Active) => {}
            other => panic!("expected active status, got: {:?}", other),
        }
    }

    pub fn assert_waiting(&self, expected_reason: &str) {
        match self.current_status() {
            Some(UnitStatus::Waiting(ref reason)) if reason == expected_reason => {}
            other => panic!(
                "expected waiting status with reason: {:?}, got: {:?}",
                expected_reason, other
            ),
        }
    }

    pub fn assert_blocked_containing(&self, fragment: &str) {
        match self.current_status() {
            Some(UnitStatus::Blocked(ref reason)) if reason.contains(fragment) => {}
            other => panic!(
                "expected blocked status containing: {:?}, got: {:?}",
                fragment, other
            ),
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct TestKitError(pub String);

impl Display for TestKitError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Test Error: {}", self.0)
    }
}
impl std::error::Error for TestKitError {}

#[derive(Debug, Default)]
struct FakeControlState {
    reachable: bool,
    service_running: bool,
    fail_next_apply: Option<String>,
    applied: Vec<ServiceDescriptor>,
    reconcile_count: usize,
}

/// An in-memory control surface. Reachability and the reported service state are both explicit
/// so that tests control exactly what the supervisor claims, independent of which descriptors
/// were applied.
#[derive(Debug, Clone)]
pub struct FakeControlSurface(Arc<RwLock<FakeControlState>>);

impl FakeControlSurface {
    pub fn new() -> FakeControlSurface {
        FakeControlSurface(Arc::new(RwLock::new(FakeControlState::default())))
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.0.write().unwrap().reachable = reachable;
    }

    pub fn set_service_running(&self, running: bool) {
        self.0.write().unwrap().service_running = running;
    }

    pub fn fail_next_apply(&self, message: impl Into<String>) {
        self.0.write().unwrap().fail_next_apply = Some(message.into());
    }

    pub fn last_applied(&self) -> Option<ServiceDescriptor> {
        self.0.read().unwrap().applied.last().cloned()
    }

    pub fn applied_count(&self) -> usize {
        self.0.read().unwrap().applied.len()
    }

    pub fn reconcile_count(&self) -> usize {
        self.0.read().unwrap().reconcile_count
    }
}

impl Default for FakeControlSurface {
    fn default() -> FakeControlSurface {
        FakeControlSurface::new()
    }
}

impl ControlSurface for FakeControlSurface {
    fn reachable(&self) -> bool {
        self.0.read().unwrap().reachable
    }

    fn apply(&self, descriptor: &ServiceDescriptor) -> Result<(), Error> {
        let mut state = self.0.write().unwrap();
        if let Some(message) = state.fail_next_apply.take() {
            return Err(TestKitError(message).into());
        }
        state.applied.push(descriptor.clone());
        Ok(())
    }

    fn reconcile(&self) -> Result<(), Error> {
        self.0.write().unwrap().reconcile_count += 1;
        Ok(())
    }

    fn describe(&self, _service_name: &str) -> Result<ServiceInfo, Error> {
        let state = self.0.read().unwrap();
        Ok(ServiceInfo {
            running: state.service_running,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordingIngress(Arc<RwLock<Vec<IngressConfig>>>);

impl RecordingIngress {
    pub fn last(&self) -> Option<IngressConfig> {
        self.0.read().unwrap().last().cloned()
    }
}

impl IngressPublisher for RecordingIngress {
    fn publish(&self, config: &IngressConfig) -> anyhow::Result<()> {
        self.0.write().unwrap().push(config.clone());
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordingScrape(Arc<RwLock<Vec<Vec<ScrapeJob>>>>);

impl RecordingScrape {
    pub fn last(&self) -> Option<Vec<ScrapeJob>> {
        self.0.read().unwrap().last().cloned()
    }
}

impl ScrapePublisher for RecordingScrape {
    fn publish_jobs(&self, jobs: &[ScrapeJob]) -> anyhow::Result<()> {
        self.0.write().unwrap().push(jobs.to_vec());
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordingDashboards(Arc<RwLock<usize>>);

impl RecordingDashboards {
    pub fn refresh_count(&self) -> usize {
        *self.0.read().unwrap()
    }
}

impl DashboardPublisher for RecordingDashboards {
    fn publish_dashboards(&self) -> anyhow::Result<()> {
        *self.0.write().unwrap() += 1;
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordingStatus(Arc<RwLock<Vec<UnitStatus>>>);

impl RecordingStatus {
    pub fn recorded(&self) -> Vec<UnitStatus> {
        self.0.read().unwrap().clone()
    }
}

impl StatusSurface for RecordingStatus {
    fn set_status(&self, status: &UnitStatus) {
        self.0.write().unwrap().push(status.clone());
    }
}
