//! The externally visible outcome of every lifecycle event. A status is always recomputed from
//! scratch, never adjusted incrementally, and the controller assigns it at most once per event.
use std::fmt::{self, Display};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "message", rename_all = "lowercase")]
pub enum UnitStatus {
    Active,
    Waiting(String),
    Blocked(String),
}

impl UnitStatus {
    pub fn waiting(reason: impl Into<String>) -> UnitStatus {
        UnitStatus::Waiting(reason.into())
    }

    pub fn blocked(reason: impl Into<String>) -> UnitStatus {
        UnitStatus::Blocked(reason.into())
    }

    pub fn is_active(&self) -> bool {
        *self == UnitStatus::Active
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            UnitStatus::Active => None,
            UnitStatus::Waiting(reason) | UnitStatus::Blocked(reason) => Some(reason.as_str()),
        }
    }

    /// The bare variant name, used as a metrics label value.
    pub fn kind(&self) -> &'static str {
        match self {
            UnitStatus::Active => "active",
            UnitStatus::Waiting(_) => "waiting",
            UnitStatus::Blocked(_) => "blocked",
        }
    }
}

impl Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            UnitStatus::Active => f.write_str("active"),
            UnitStatus::Waiting(reason) => write!(f, "waiting: {}", reason),
            UnitStatus::Blocked(reason) => write!(f, "blocked: {}", reason),
        }
    }
}

/// The hosting framework's status surface. Implementations forward the value to whatever makes it
/// visible to the operator of the unit.
pub trait StatusSurface: Send + 'static {
    fn set_status(&self, status: &UnitStatus);
}
