//! # Test-request workflow core
//!
//! Business logic for the doctor consultation stage of test-request processing:
//! - the lifecycle status graph ([`status`])
//! - the workflow engine that claims and closes consultations ([`workflow`])
//! - read-only lookups ([`query`]) and intake of new requests ([`intake`])
//! - the request store contract with in-memory and JSON-file backends ([`store`])
//! - actors, roles and the token-based access gate ([`access`])
//!
//! **No transport concerns**: HTTP routing, JSON bodies and status codes belong in `api-shared`
//! and `api-rest`.

pub mod access;
pub mod config;
pub mod constants;
pub mod consultation;
pub mod consultations;
pub mod error;
pub mod intake;
pub mod query;
pub mod request;
pub mod status;
pub mod store;
pub mod workflow;

#[cfg(test)]
pub(crate) mod testing;

pub use access::{AccessGate, Actor, ActorDirectory, FixedAccessGate, Role, TokenAccessGate};
pub use config::CoreConfig;
pub use constants::DEFAULT_DATA_DIR;
pub use consultation::{ConsultationResult, CreateConsultationRequest, Outcome};
pub use consultations::ConsultationDesk;
pub use error::{StoreError, StoreResult, WorkflowError, WorkflowResult};
pub use intake::{ImportSummary, IntakeService};
pub use query::QueryService;
pub use request::{LabResult, PatientDetails, RequestFlow, TestRequest, TestResult};
pub use status::{is_valid_transition, RequestStatus};
pub use store::{InMemoryRequestStore, JsonFileRequestStore, RequestStore, UpdateOutcome};
pub use testreq_types::{ActorId, NonEmptyText, RequestId};
pub use workflow::WorkflowEngine;
