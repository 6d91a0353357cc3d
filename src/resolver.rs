//! Merges the declared static configuration with the dynamic relation snapshot into one effective
//! desired state. Resolution is pure and synchronous: a failure is reported, never corrected.
use crate::config::{CharmConfig, LogLevel};
use crate::relation::RelationSnapshot;

use std::fmt::{self, Display};

/// The uri scheme that a statically configured connection uri must carry.
pub const MONGODB_URI_SCHEME: &str = "mongodb://";

/// The effective desired state of the managed exporter, produced fresh on every event and never
/// persisted. The connection uri always has exactly one source: the static config or the
/// relation, never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesiredState {
    pub connection_uri: String,
    pub log_level: LogLevel,
    pub external_hostname: Option<String>,
}

/// Resolution-time failures. All of these are operator-facing and map to a `Blocked` status with
/// the literal message from `Display`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    InvalidLogLevel(String),
    MalformedUri(String),
    DuplicateSource,
    MissingSource,
}

impl Display for ResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ResolutionError::InvalidLogLevel(raw) => {
                write!(f, "invalid log level: {}", raw.to_uppercase())
            }
            ResolutionError::MalformedUri(uri) => {
                write!(f, "mongodb-uri is not properly formed: {}", uri)
            }
            ResolutionError::DuplicateSource => {
                f.write_str("Mongodb cannot added via relation and via config at the same time")
            }
            ResolutionError::MissingSource => f.write_str(
                "No Mongodb uri added. Mongodb uri needs to be added via relation or via config",
            ),
        }
    }
}
impl std::error::Error for ResolutionError {}

/// Computes the desired state from the current world. The rules are evaluated in a fixed order so
/// that configuration mistakes are always reported, independent of the relation state:
///
/// 1. the declared log level must be one of the six recognized levels
/// 2. a statically configured uri must start with `mongodb://`
/// 3. a static uri and a relation at the same time is ambiguous and is surfaced to the operator
///    rather than silently resolved by precedence
/// 4. at least one source must be present
pub fn resolve(
    config: &CharmConfig,
    relation: Option<&RelationSnapshot>,
) -> Result<DesiredState, ResolutionError> {
    log::debug!("Validating config: {:?}", config);
    let log_level: LogLevel = config
        .log_level
        .parse()
        .map_err(|_| ResolutionError::InvalidLogLevel(config.log_level.clone()))?;

    let connection_uri = match (config.static_uri(), relation) {
        (Some(uri), _) if !uri.starts_with(MONGODB_URI_SCHEME) => {
            return Err(ResolutionError::MalformedUri(uri.to_owned()));
        }
        (Some(_), Some(_)) => return Err(ResolutionError::DuplicateSource),
        (Some(uri), None) => uri.to_owned(),
        (None, Some(snapshot)) => snapshot.uri().to_owned(),
        (None, None) => return Err(ResolutionError::MissingSource),
    };

    Ok(DesiredState {
        connection_uri,
        log_level,
        external_hostname: config.external_hostname.clone(),
    })
}

/// The reduced re-validation used on relation teardown: is any connection-uri source still
/// configured? Only rule 4 applies; no reconfiguration is attempted.
pub fn any_source_configured(config: &CharmConfig, relation: Option<&RelationSnapshot>) -> bool {
    config.static_uri().is_some() || relation.is_some()
}
