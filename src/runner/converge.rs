//! Applies a resolved desired state to the managed process, or defers when the administrative
//! channel is not reachable yet. Deferral is a scheduling postponement, not a failure: the
//! triggering event is expected to be redelivered by the host.
use crate::error::Error;
use crate::resolver::DesiredState;
use crate::runner::control::ControlSurface;
use crate::service::ServiceDescriptor;

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The descriptor was pushed and the supervisor was asked to reconcile.
    Applied(ServiceDescriptor),
    /// The control surface was unreachable; nothing was mutated.
    Deferred,
}

/// One convergence pass. Always derives and pushes the complete descriptor (replace semantics,
/// not a patch), so applying the same desired state twice is an observable no-op apart from the
/// supervisor's own restart check.
pub fn converge(desired: &DesiredState, control: &dyn ControlSurface) -> Result<Outcome, Error> {
    if !control.reachable() {
        log::debug!("Control surface not reachable, deferring convergence");
        return Ok(Outcome::Deferred);
    }
    let descriptor = ServiceDescriptor::for_state(desired);
    control.apply(&descriptor)?;
    control.reconcile()?;
    log::debug!(
        "Applied service descriptor with command: {:?}",
        descriptor.command()
    );
    Ok(Outcome::Applied(descriptor))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::LogLevel;
    use crate::runner::control::ServiceInfo;

    use std::fmt::{self, Display};
    use std::sync::{Arc, Mutex};

    #[derive(Debug)]
    struct ApplyFailed;
    impl Display for ApplyFailed {
        fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("apply failed")
        }
    }
    impl std::error::Error for ApplyFailed {}

    #[derive(Clone, Default)]
    struct RecordingSurface {
        reachable: bool,
        fail_apply: bool,
        applied: Arc<Mutex<Vec<ServiceDescriptor>>>,
        reconciles: Arc<Mutex<usize>>,
    }

    impl ControlSurface for RecordingSurface {
        fn reachable(&self) -> bool {
            self.reachable
        }

        fn apply(&self, descriptor: &ServiceDescriptor) -> Result<(), Error> {
            if self.fail_apply {
                return Err(ApplyFailed.into());
            }
            self.applied.lock().unwrap().push(descriptor.clone());
            Ok(())
        }

        fn reconcile(&self) -> Result<(), Error> {
            *self.reconciles.lock().unwrap() += 1;
            Ok(())
        }

        fn describe(&self, _service_name: &str) -> Result<ServiceInfo, Error> {
            Ok(ServiceInfo { running: true })
        }
    }

    fn desired() -> DesiredState {
        DesiredState {
            connection_uri: "mongodb://mongodb:27017/".to_owned(),
            log_level: LogLevel::Info,
            external_hostname: None,
        }
    }

    #[test]
    fn unreachable_control_surface_defers_without_mutating() {
        let surface = RecordingSurface::default();
        let outcome = converge(&desired(), &surface).unwrap();
        assert_eq!(Outcome::Deferred, outcome);
        assert!(surface.applied.lock().unwrap().is_empty());
        assert_eq!(0, *surface.reconciles.lock().unwrap());
    }

    #[test]
    fn converging_twice_applies_byte_equal_descriptors() {
        let surface = RecordingSurface {
            reachable: true,
            ..RecordingSurface::default()
        };
        converge(&desired(), &surface).unwrap();
        converge(&desired(), &surface).unwrap();

        let applied = surface.applied.lock().unwrap();
        assert_eq!(2, applied.len());
        assert_eq!(applied[0], applied[1]);
        assert_eq!(applied[0].command(), applied[1].command());
        assert_eq!(applied[0].environment(), applied[1].environment());
        assert_eq!(2, *surface.reconciles.lock().unwrap());
    }

    #[test]
    fn apply_failure_propagates_to_the_caller() {
        let surface = RecordingSurface {
            reachable: true,
            fail_apply: true,
            ..RecordingSurface::default()
        };
        let err = converge(&desired(), &surface).unwrap_err();
        assert!(err.downcast_ref::<ApplyFailed>().is_some());
        assert_eq!("apply failed", err.to_string());
    }
}
