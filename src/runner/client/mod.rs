//! The production `ControlSurface`: an http client for the managed process's local
//! administrative api. The admin endpoint is plain http on the loopback interface, which is why
//! there is no TLS machinery here.
//!
//! The controller is synchronous and handles one event at a time, so the client owns a
//! current-thread runtime and drives each request to completion with `block_on`.
mod request;

use crate::config::ControlConfig;
use crate::error;
use crate::runner::control::{ControlSurface, ServiceInfo};
use crate::runner::metrics::ClientMetrics;
use crate::service::ServiceDescriptor;

use http::{Request, Response};
use hyper::client::Client as HyperClient;
use hyper::client::HttpConnector;
use hyper::Body;
use serde::de::DeserializeOwned;
use tokio::runtime::Runtime;

use std::io;
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug)]
pub enum Error {
    Io(hyper::Error),
    Serde(serde_json::Error),
    Yaml(serde_yaml::Error),
    Request(http::Error),
    Http(http::StatusCode),
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e as &(dyn std::error::Error + 'static)),
            Error::Serde(e) => Some(e as &(dyn std::error::Error + 'static)),
            Error::Yaml(e) => Some(e as &(dyn std::error::Error + 'static)),
            Error::Request(e) => Some(e as &(dyn std::error::Error + 'static)),
            Error::Http(_) => None,
        }
    }
}

impl Error {
    pub fn http(status: http::StatusCode) -> Error {
        Error::Http(status)
    }

    pub fn is_http_status(&self, code: u16) -> bool {
        match self {
            Error::Http(ref status) => status.as_u16() == code,
            _ => false,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            Error::Io(ref e) => write!(f, "Io Error: {}", e),
            Error::Serde(ref e) => write!(f, "(De)Serialization error: {}", e),
            Error::Yaml(ref e) => write!(f, "Layer serialization error: {}", e),
            Error::Request(ref e) => write!(f, "Invalid request: {}", e),
            Error::Http(ref e) => write!(f, "Http Error: {}", e),
        }
    }
}

impl From<hyper::Error> for Error {
    fn from(e: hyper::Error) -> Error {
        Error::Io(e)
    }
}
impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Error {
        Error::Serde(e)
    }
}
impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Error {
        Error::Yaml(e)
    }
}
impl From<http::Error> for Error {
    fn from(e: http::Error) -> Error {
        Error::Request(e)
    }
}

/// The body shape of every admin api response: the payload is wrapped in a `result` field.
#[derive(Debug, Deserialize)]
struct ResponseEnvelope<T> {
    result: T,
}

#[derive(Debug, Deserialize)]
struct ServiceStatus {
    name: String,
    current: String,
}

#[derive(Debug)]
struct ClientInner {
    http_client: HyperClient<HttpConnector>,
    config: ControlConfig,
    metrics: ClientMetrics,
    runtime: Runtime,
}

#[derive(Debug, Clone)]
pub struct Client(Arc<ClientInner>);

impl Client {
    pub fn new(config: ControlConfig, metrics: ClientMetrics) -> Result<Client, io::Error> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let http_client = HyperClient::builder().build_http();

        let inner = ClientInner {
            http_client,
            config,
            metrics,
            runtime,
        };
        Ok(Client(Arc::new(inner)))
    }

    async fn system_info(&self) -> Result<(), Error> {
        let req = request::system_info_request(&self.0.config)?;
        self.execute_ensure_success(req).await
    }

    async fn add_layer(&self, descriptor: &ServiceDescriptor) -> Result<(), Error> {
        let req = request::add_layer_request(&self.0.config, descriptor)?;
        self.execute_ensure_success(req).await
    }

    async fn replan(&self) -> Result<(), Error> {
        let req = request::replan_request(&self.0.config)?;
        self.execute_ensure_success(req).await
    }

    async fn service_info(&self, service_name: &str) -> Result<ServiceInfo, Error> {
        let req = request::services_request(&self.0.config, service_name)?;
        let envelope: ResponseEnvelope<Vec<ServiceStatus>> = self.get_response_body(req).await?;
        let running = envelope
            .result
            .iter()
            .any(|service| service.name == service_name && service.current == "active");
        Ok(ServiceInfo { running })
    }

    async fn execute_ensure_success(&self, req: Request<Body>) -> Result<(), Error> {
        let response = self.get_response(req).await?;
        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let body = hyper::body::to_bytes(response.into_body()).await?;
            if let Ok(as_str) = std::str::from_utf8(body.as_ref()) {
                log::error!("Response status: {}, body: {}", status, as_str);
            } else {
                log::error!(
                    "Response status: {}, binary body with {} bytes",
                    status,
                    body.len()
                );
            }
            Err(Error::http(status))
        }
    }

    async fn get_response_body<T: DeserializeOwned>(&self, req: Request<Body>) -> Result<T, Error> {
        let response = self.get_response(req).await?;
        if !response.status().is_success() {
            return Err(Error::http(response.status()));
        }
        let body = hyper::body::to_bytes(response.into_body()).await?;
        if log::log_enabled!(log::Level::Trace) {
            let as_str = String::from_utf8_lossy(body.as_ref());
            log::trace!("Got response body: {}", as_str);
        }
        let deserialized = serde_json::from_slice(body.as_ref())?;
        Ok(deserialized)
    }

    async fn get_response(&self, req: Request<Body>) -> Result<Response<Body>, Error> {
        let method = req.method().to_string();
        let uri = req.uri().to_string();
        let start_time = Instant::now();
        log::debug!("Starting {} request to: {}", method, uri);

        let timer = self.0.metrics.request_started();
        let result = self.0.http_client.request(req).await;
        let duration = start_time.elapsed().as_millis();
        timer.observe_duration();
        match result {
            Ok(resp) => {
                log::debug!(
                    "Response status received for {} to: {}, status: {}, duration: {}ms",
                    method,
                    uri,
                    resp.status().as_u16(),
                    duration
                );
                Ok(resp)
            }
            Err(err) => {
                log::error!(
                    "Failed to execute {} request to: {}, err: {}",
                    method,
                    uri,
                    err
                );
                Err(err.into())
            }
        }
    }
}

impl ControlSurface for Client {
    fn reachable(&self) -> bool {
        match self.0.runtime.block_on(self.system_info()) {
            Ok(()) => true,
            Err(err) => {
                log::debug!("Control surface not reachable: {}", err);
                false
            }
        }
    }

    fn apply(&self, descriptor: &ServiceDescriptor) -> Result<(), error::Error> {
        self.0
            .runtime
            .block_on(self.add_layer(descriptor))
            .map_err(error::Error::from)
    }

    fn reconcile(&self) -> Result<(), error::Error> {
        self.0
            .runtime
            .block_on(self.replan())
            .map_err(error::Error::from)
    }

    fn describe(&self, service_name: &str) -> Result<ServiceInfo, error::Error> {
        self.0
            .runtime
            .block_on(self.service_info(service_name))
            .map_err(error::Error::from)
    }
}
