//! The declarative description of the managed exporter process. The descriptor is re-derived from
//! the desired state on every convergence pass and applied with full-replace semantics, so
//! deriving it is deterministic: the same `DesiredState` always yields a byte-identical
//! descriptor.
use crate::resolver::DesiredState;

use std::collections::BTreeMap;

/// The fixed port the exporter serves metrics on. The readiness probe, the ingress data, and the
/// advertised scrape target all refer to it.
pub const EXPORTER_PORT: u16 = 9216;

/// The name the service is registered under with the process supervisor.
pub const SERVICE_NAME: &str = "mongodb-exporter";

const EXPORTER_BINARY: &str = "/bin/mongodb_exporter";
const READINESS_CHECK_NAME: &str = "online";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    pub summary: String,
    pub description: String,
    pub services: BTreeMap<String, ServiceSpec>,
    pub checks: BTreeMap<String, CheckSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceSpec {
    #[serde(rename = "override")]
    pub override_strategy: String,
    pub summary: String,
    pub command: String,
    pub startup: String,
    pub environment: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckSpec {
    #[serde(rename = "override")]
    pub override_strategy: String,
    pub level: String,
    pub tcp: TcpCheck,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TcpCheck {
    pub port: u16,
}

impl ServiceDescriptor {
    /// Builds the full descriptor for the given desired state. The resolved connection uri is
    /// embedded in both the command line and the `MONGODB_URI` environment variable, and the
    /// readiness check is a tcp probe on the fixed exporter port.
    pub fn for_state(desired: &DesiredState) -> ServiceDescriptor {
        let command = format!(
            "{} --mongodb.uri={}",
            EXPORTER_BINARY, desired.connection_uri
        );
        let mut environment = BTreeMap::new();
        environment.insert("MONGODB_URI".to_owned(), desired.connection_uri.clone());

        let mut services = BTreeMap::new();
        services.insert(
            SERVICE_NAME.to_owned(),
            ServiceSpec {
                override_strategy: "replace".to_owned(),
                summary: "mongodb-exporter service".to_owned(),
                command,
                startup: "enabled".to_owned(),
                environment,
            },
        );

        let mut checks = BTreeMap::new();
        checks.insert(
            READINESS_CHECK_NAME.to_owned(),
            CheckSpec {
                override_strategy: "replace".to_owned(),
                level: "ready".to_owned(),
                tcp: TcpCheck {
                    port: EXPORTER_PORT,
                },
            },
        );

        ServiceDescriptor {
            summary: "mongodb-exporter layer".to_owned(),
            description: "service layer for mongodb-exporter".to_owned(),
            services,
            checks,
        }
    }

    /// The command line of the exporter service, if present.
    pub fn command(&self) -> Option<&str> {
        self.services
            .get(SERVICE_NAME)
            .map(|service| service.command.as_str())
    }

    /// The environment of the exporter service, if present.
    pub fn environment(&self) -> Option<&BTreeMap<String, String>> {
        self.services
            .get(SERVICE_NAME)
            .map(|service| &service.environment)
    }

    /// Serializes the descriptor as a yaml layer, which is the payload format the control surface
    /// expects.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}
