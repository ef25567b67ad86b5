use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("snapshot failure: {0}")]
    Snapshot(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

impl ApplicationError {
    /// Stable machine-readable class for command outcomes
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Domain(_) => "invalid_snapshot",
            Self::Snapshot(_) => "snapshot_unreadable",
            Self::Configuration(_) => "config_validation",
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Configuration(_) => 2,
            Self::Domain(_) | Self::Snapshot(_) => 3,
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Domain(_) => "The usage snapshot failed validation. Check provider output.",
            Self::Snapshot(_) => "The usage snapshot could not be read. Check the input path.",
            Self::Configuration(_) => "Configuration is invalid. Run `strategist config`.",
        }
    }
}
