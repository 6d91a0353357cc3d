use crate::config::ControlConfig;
use crate::runner::client::Error;
use crate::service::{ServiceDescriptor, SERVICE_NAME};

use http::{header, Method, Request};
use hyper::Body;

pub fn system_info_request(config: &ControlConfig) -> Result<Request<Body>, Error> {
    let req = make_req(config, Method::GET, "/v1/system-info").body(Body::empty())?;
    Ok(req)
}

pub fn add_layer_request(
    config: &ControlConfig,
    descriptor: &ServiceDescriptor,
) -> Result<Request<Body>, Error> {
    let layer = descriptor.to_yaml()?;
    // the full layer always replaces the previous one under the same label
    let body = serde_json::json!({
        "action": "add",
        "combine": true,
        "label": SERVICE_NAME,
        "format": "yaml",
        "layer": layer,
    });
    let as_vec = serde_json::to_vec(&body)?;
    let req = make_req(config, Method::POST, "/v1/layers")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(as_vec))?;
    Ok(req)
}

pub fn replan_request(config: &ControlConfig) -> Result<Request<Body>, Error> {
    let body = serde_json::json!({ "action": "replan" });
    let as_vec = serde_json::to_vec(&body)?;
    let req = make_req(config, Method::POST, "/v1/services")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(as_vec))?;
    Ok(req)
}

pub fn services_request(config: &ControlConfig, service_name: &str) -> Result<Request<Body>, Error> {
    let path = format!("/v1/services?names={}", service_name);
    let req = make_req(config, Method::GET, path.as_str()).body(Body::empty())?;
    Ok(req)
}

fn make_req(config: &ControlConfig, method: Method, path: &str) -> http::request::Builder {
    let uri = format!("{}{}", config.endpoint, path);
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::USER_AGENT, config.user_agent.as_str())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::LogLevel;
    use crate::resolver::DesiredState;

    fn config() -> ControlConfig {
        ControlConfig::new("http://localhost:4000")
    }

    #[test]
    fn requests_target_the_configured_endpoint() {
        let req = system_info_request(&config()).unwrap();
        assert_eq!("http://localhost:4000/v1/system-info", req.uri().to_string());

        let req = services_request(&config(), SERVICE_NAME).unwrap();
        assert_eq!(
            "http://localhost:4000/v1/services?names=mongodb-exporter",
            req.uri().to_string()
        );
    }

    #[test]
    fn invalid_endpoint_becomes_a_request_error_instead_of_a_panic() {
        let config = ControlConfig::new("not a valid endpoint");
        let err = system_info_request(&config).unwrap_err();
        assert!(matches!(err, Error::Request(_)));

        let err = replan_request(&config).unwrap_err();
        assert!(matches!(err, Error::Request(_)));
    }

    #[test]
    fn layer_request_wraps_the_yaml_descriptor() {
        let desired = DesiredState {
            connection_uri: "mongodb://mongodb:27017/".to_owned(),
            log_level: LogLevel::Info,
            external_hostname: None,
        };
        let descriptor = ServiceDescriptor::for_state(&desired);
        let req = add_layer_request(&config(), &descriptor).unwrap();
        assert_eq!(Method::POST, req.method());
        assert_eq!("http://localhost:4000/v1/layers", req.uri().to_string());
    }
}
