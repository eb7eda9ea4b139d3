use crate::status::RequestStatus;
use testreq_types::{ActorId, RequestId};

/// Failures raised by a [`RequestStore`](crate::store::RequestStore) implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("test request {0} already exists")]
    Duplicate(RequestId),
    #[error("test request {id} rejected: {reason}")]
    Invalid { id: RequestId, reason: &'static str },
    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to read request file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to write request file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to serialize test request: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize test request {path}: {source}", path = path.display())]
    Deserialization {
        path: std::path::PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("store lock poisoned")]
    Poisoned,
}

/// Every way a workflow, query or access call can fail.
///
/// All variants are scoped to the single call that produced them.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("test request {0} not found")]
    NotFound(RequestId),

    #[error("test request {id} is {actual}, expected {expected}")]
    InvalidState {
        id: RequestId,
        expected: RequestStatus,
        actual: RequestStatus,
    },

    #[error("illegal transition {from} -> {to}")]
    IllegalTransition {
        from: RequestStatus,
        to: RequestStatus,
    },

    #[error("actor {actor} is not permitted: {reason}")]
    Permission { actor: ActorId, reason: String },

    #[error("invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("no authenticated actor")]
    Unauthenticated,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("store failure: {0}")]
    Store(#[from] StoreError),
}

impl WorkflowError {
    pub(crate) fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_owned(),
            message: message.into(),
        }
    }

    pub(crate) fn permission(actor: ActorId, reason: impl Into<String>) -> Self {
        Self::Permission {
            actor,
            reason: reason.into(),
        }
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
pub type WorkflowResult<T> = std::result::Result<T, WorkflowError>;
