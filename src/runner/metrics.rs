use crate::runner::CharmEvent;
use crate::status::UnitStatus;

use prometheus::{
    exponential_buckets, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry,
};

use std::fmt::{self, Debug};
use std::time::Duration;

const EVENT: &[&str] = &["event"];
const STATUS: &[&str] = &["status"];

pub struct Metrics {
    registry: Registry,
    control_request_times: Histogram,
    event_handle_times: Histogram,
    events_received: IntCounterVec,
    status_results: IntCounterVec,
    converge_deferred: IntCounter,
}

impl Debug for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("Metrics")
    }
}

impl Metrics {
    pub fn new() -> Metrics {
        let registry = Registry::new();

        let request_time_opts = HistogramOpts::new(
            "control_request_time",
            "Total time from sending a control surface request to receiving the response headers",
        )
        .subsystem("client")
        .buckets(exponential_buckets(0.005, 2.0, 12).unwrap());
        let control_request_times = Histogram::with_opts(request_time_opts).unwrap();
        registry
            .register(Box::new(control_request_times.clone()))
            .unwrap();

        let handle_time_opts = HistogramOpts::new(
            "event_handle_time",
            "Total time spent handling one lifecycle event, from dispatch to status assignment",
        )
        .buckets(exponential_buckets(0.001, 2.0, 12).unwrap());
        let event_handle_times = Histogram::with_opts(handle_time_opts).unwrap();
        registry
            .register(Box::new(event_handle_times.clone()))
            .unwrap();

        let events_opts = Opts::new(
            "events_received",
            "total number of lifecycle events delivered to the controller, by event kind",
        )
        .variable_label("event");
        let events_received = IntCounterVec::new(events_opts, EVENT).unwrap();
        registry.register(Box::new(events_received.clone())).unwrap();

        let status_opts = Opts::new(
            "status_results",
            "the number of times each status variant was assigned after an event",
        )
        .variable_label("status");
        let status_results = IntCounterVec::new(status_opts, STATUS).unwrap();
        registry.register(Box::new(status_results.clone())).unwrap();

        let deferred_opts = Opts::new(
            "converge_deferred",
            "number of convergence passes deferred because the control surface was unreachable",
        );
        let converge_deferred = IntCounter::with_opts(deferred_opts).unwrap();
        registry
            .register(Box::new(converge_deferred.clone()))
            .unwrap();

        Metrics {
            registry,
            control_request_times,
            event_handle_times,
            events_received,
            status_results,
            converge_deferred,
        }
    }

    pub fn client_metrics(&self) -> ClientMetrics {
        ClientMetrics {
            control_request_times: self.control_request_times.clone(),
        }
    }

    pub fn event_received(&self, event: CharmEvent) {
        self.events_received
            .with_label_values(&[event.name()])
            .inc();
    }

    pub fn status_assigned(&self, status: &UnitStatus) {
        self.status_results
            .with_label_values(&[status.kind()])
            .inc();
    }

    pub fn converge_deferred(&self) {
        self.converge_deferred.inc();
    }

    pub fn event_handled(&self, duration: Duration) {
        self.event_handle_times.observe(duration.as_secs_f64());
    }

    pub fn encode_as_text(&self) -> Result<Vec<u8>, prometheus::Error> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::with_capacity(4096);
        encoder.encode(self.registry.gather().as_slice(), &mut buffer)?;
        Ok(buffer)
    }
}

pub struct ClientMetrics {
    control_request_times: Histogram,
}

impl Debug for ClientMetrics {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("ClientMetrics")
    }
}
impl ClientMetrics {
    pub fn request_started(&self) -> prometheus::HistogramTimer {
        self.control_request_times.start_timer()
    }
}
