//! Typed views of the data that flows over the unit's relations. The datastore relation is the
//! only one the core consumes data from; the ingress and metrics-endpoint relations are
//! publish-only collaborators behind small traits so that hosts and tests can supply their own
//! transport.
use crate::service::EXPORTER_PORT;

/// The credentials and connection info published by a related datastore unit. The relation
/// subsystem owns this record; the core only ever reads the latest snapshot. The username and
/// password are carried along for completeness but the core consumes only `uris`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationSnapshot {
    pub uris: String,
    pub username: String,
    pub password: String,
}

impl RelationSnapshot {
    pub fn uri(&self) -> &str {
        self.uris.as_str()
    }
}

/// What this unit asks of the datastore when the relation is established. Whether the relation
/// credentials carry the `admin` role is controlled by the `relation-admin-role` config flag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatastoreRequest {
    pub database_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_user_roles: Option<String>,
}

impl DatastoreRequest {
    pub fn new(database_name: impl Into<String>, admin_role: bool) -> DatastoreRequest {
        DatastoreRequest {
            database_name: database_name.into(),
            extra_user_roles: if admin_role {
                Some("admin".to_owned())
            } else {
                None
            },
        }
    }
}

/// The data published to the ingress collaborator after every successful convergence.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct IngressConfig {
    pub service_hostname: Option<String>,
    pub service_name: String,
    pub service_port: u16,
}

impl IngressConfig {
    pub fn new(service_name: impl Into<String>, hostname: Option<String>) -> IngressConfig {
        IngressConfig {
            service_hostname: hostname,
            service_name: service_name.into(),
            service_port: EXPORTER_PORT,
        }
    }
}

/// A scrape job advertised on the metrics-endpoint relation. The exporter always listens on the
/// same fixed port, so there is exactly one static job and no dynamic target logic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScrapeJob {
    pub static_configs: Vec<StaticConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StaticConfig {
    pub targets: Vec<String>,
}

impl ScrapeJob {
    pub fn static_target() -> ScrapeJob {
        ScrapeJob {
            static_configs: vec![StaticConfig {
                targets: vec![format!("*:{}", EXPORTER_PORT)],
            }],
        }
    }
}

/// Publishes ingress data for this unit. Publishing is best-effort: a failure is logged by the
/// controller but never influences the unit status.
pub trait IngressPublisher: Send + 'static {
    fn publish(&self, config: &IngressConfig) -> anyhow::Result<()>;
}

/// Publishes the advertised scrape jobs on the metrics-endpoint relation. Refreshed on
/// config-changed only.
pub trait ScrapePublisher: Send + 'static {
    fn publish_jobs(&self, jobs: &[ScrapeJob]) -> anyhow::Result<()>;
}

/// Publishes the dashboards bundled with this unit on the dashboard relation. The implementation
/// owns the dashboard content and its transport; the controller only triggers a refresh, on
/// config-changed, and never consumes data back.
pub trait DashboardPublisher: Send + 'static {
    fn publish_dashboards(&self) -> anyhow::Result<()>;
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn static_scrape_job_targets_the_exporter_port() {
        let job = ScrapeJob::static_target();
        assert_eq!(vec!["*:9216".to_owned()], job.static_configs[0].targets);
    }

    #[test]
    fn datastore_request_only_carries_roles_when_admin_is_requested() {
        let plain = DatastoreRequest::new("mongodb-exporter", false);
        assert_eq!(None, plain.extra_user_roles);

        let admin = DatastoreRequest::new("mongodb-exporter", true);
        assert_eq!(Some("admin".to_owned()), admin.extra_user_roles);
    }

    #[test]
    fn ingress_config_serializes_with_kebab_case_keys() {
        let config = IngressConfig::new("mongodb-exporter", Some("exporter.example.com".to_owned()));
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!("exporter.example.com", value["service-hostname"]);
        assert_eq!(9216, value["service-port"]);
    }
}
