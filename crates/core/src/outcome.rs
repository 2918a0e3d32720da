use std::fmt;

use crate::remote::RemoteError;

/// Why a best-effort stage produced nothing.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Absence {
    /// The caller did not ask for this stage.
    Skipped,
    /// Missing credentials or collaborator; nothing was attempted.
    Disabled { reason: String },
    Failed { reason: String },
}

impl Absence {
    pub fn disabled(reason: impl Into<String>) -> Self {
        Self::Disabled {
            reason: reason.into(),
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, Self::Disabled { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    pub fn reason(&self) -> &str {
        match self {
            Self::Skipped => "not requested",
            Self::Disabled { reason } | Self::Failed { reason } => reason,
        }
    }
}

impl fmt::Display for Absence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skipped => f.write_str("skipped"),
            Self::Disabled { reason } => write!(f, "disabled: {reason}"),
            Self::Failed { reason } => write!(f, "failed: {reason}"),
        }
    }
}

impl From<RemoteError> for Absence {
    fn from(error: RemoteError) -> Self {
        if error.is_not_configured() {
            Self::disabled(error.to_string())
        } else {
            Self::failed(error.to_string())
        }
    }
}

pub type Outcome<T> = Result<T, Absence>;
