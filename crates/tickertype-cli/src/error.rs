use thiserror::Error;
use tickertype_core::{FetchError, ReconcileError, ServiceError, StoreError, ValidationError};

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Service(ServiceError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::NotFound(_) => 3,
            Self::Serialization(_) => 4,
            Self::Fetch(_) => 6,
            Self::Service(_) => 6,
            Self::Store(_) => 10,
            Self::Io(_) => 10,
        }
    }
}

impl From<ReconcileError> for CliError {
    fn from(error: ReconcileError) -> Self {
        match error {
            ReconcileError::Validation(error) => Self::Validation(error),
            ReconcileError::Store(error) => Self::Store(error),
            ReconcileError::Fetch(error) => Self::Fetch(error),
            error @ (ReconcileError::NotVisible { .. } | ReconcileError::NothingVisible) => {
                Self::NotFound(error.to_string())
            }
        }
    }
}

impl From<ServiceError> for CliError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::Reconcile(error) => error.into(),
            ServiceError::Fetch(error) => Self::Fetch(error),
            error @ (ServiceError::RefreshInProgress | ServiceError::Stopped) => {
                Self::Service(error)
            }
        }
    }
}
