//! The administrative channel of the managed process. The controller's only discipline around it
//! is "check reachability before mutating"; no lock is held across calls, so reachability may
//! change between the check and the use. That race is tolerated and surfaces as a failure on the
//! next event.
use crate::error::Error;
use crate::service::ServiceDescriptor;

/// A snapshot of one supervised service as reported by the control surface.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServiceInfo {
    pub running: bool,
}

/// The operations the convergence engine and the controller consume. The production
/// implementation is `runner::client::Client`; tests supply an in-memory one.
pub trait ControlSurface: Send + 'static {
    /// Whether the administrative channel currently accepts requests.
    fn reachable(&self) -> bool;

    /// Pushes the full service descriptor, replacing any previously applied one.
    fn apply(&self, descriptor: &ServiceDescriptor) -> Result<(), Error>;

    /// Asks the process supervisor to reconcile running services against the applied descriptor.
    fn reconcile(&self) -> Result<(), Error>;

    /// Describes the named service as the supervisor currently sees it.
    fn describe(&self, service_name: &str) -> Result<ServiceInfo, Error>;
}
