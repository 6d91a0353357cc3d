use std::fmt::{self, Display};
use std::str::FromStr;

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// The six log levels the exporter understands. Parsing is case-insensitive; anything else is a
/// configuration mistake that the resolver reports as `InvalidLogLevel`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match *self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Fatal => "fatal",
        }
    }
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct ParseLogLevelError(pub String);

impl Display for ParseLogLevelError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "invalid log level: {}", self.0.to_uppercase())
    }
}
impl std::error::Error for ParseLogLevelError {}

impl FromStr for LogLevel {
    type Err = ParseLogLevelError;

    fn from_str(s: &str) -> Result<LogLevel, ParseLogLevelError> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            "fatal" => Ok(LogLevel::Fatal),
            _ => Err(ParseLogLevelError(s.to_owned())),
        }
    }
}

/// The configuration declared for the unit, as last observed. The core never mutates it; a fresh
/// snapshot arrives with every lifecycle event. `log_level` is kept as the raw declared string
/// because validating it is the resolver's job, not the deserializer's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CharmConfig {
    pub mongodb_uri: Option<String>,
    pub log_level: String,
    pub external_hostname: Option<String>,
    /// Whether relation-derived credentials should request the `admin` datastore role. This is a
    /// deployment policy choice, so it is an explicit flag rather than a baked-in behavior.
    pub relation_admin_role: bool,
}

impl Default for CharmConfig {
    fn default() -> CharmConfig {
        CharmConfig {
            mongodb_uri: None,
            log_level: DEFAULT_LOG_LEVEL.to_owned(),
            external_hostname: None,
            relation_admin_role: false,
        }
    }
}

impl CharmConfig {
    pub fn with_mongodb_uri(mut self, uri: impl Into<String>) -> Self {
        self.mongodb_uri = Some(uri.into());
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    pub fn with_external_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.external_hostname = Some(hostname.into());
        self
    }

    pub fn with_relation_admin_role(mut self, admin: bool) -> Self {
        self.relation_admin_role = admin;
        self
    }

    /// Returns the statically configured connection uri, treating an empty string the same as an
    /// unset option. An empty value is what the declared-config surface reports for options that
    /// were set and later cleared.
    pub fn static_uri(&self) -> Option<&str> {
        self.mongodb_uri.as_deref().filter(|uri| !uri.is_empty())
    }
}

/// Connection details for the managed process's administrative endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlConfig {
    pub endpoint: String,
    pub user_agent: String,
}

impl ControlConfig {
    pub fn new(endpoint: impl Into<String>) -> ControlConfig {
        let mut endpoint = endpoint.into();
        while endpoint.ends_with('/') {
            endpoint.pop();
        }
        ControlConfig {
            endpoint,
            user_agent: concat!("mongodb-exporter-operator/", env!("CARGO_PKG_VERSION")).to_owned(),
        }
    }
}
