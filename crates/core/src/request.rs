//! The test-request record and the data it carries.

use crate::consultation::ConsultationResult;
use crate::error::{WorkflowError, WorkflowResult};
use crate::status::RequestStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use testreq_types::{ActorId, RequestId};

/// Descriptive patient data supplied at intake. The engine never changes it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientDetails {
    pub name: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub pin_code: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TestResult {
    Positive,
    Negative,
}

/// Lab measurements recorded before a request reaches `LAB_TEST_COMPLETED`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabResult {
    pub blood_pressure: String,
    pub heart_beat: String,
    pub temperature: String,
    pub oxygen_level: String,
    #[serde(default)]
    pub comments: Option<String>,
    pub result: TestResult,
}

/// One recorded lifecycle transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestFlow {
    pub from: RequestStatus,
    pub to: RequestStatus,
    pub changed_by: ActorId,
    pub happened_on: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRequest {
    pub id: RequestId,
    pub status: RequestStatus,
    pub patient: PatientDetails,
    #[serde(default)]
    pub assigned_doctor: Option<ActorId>,
    #[serde(default)]
    pub lab_result: Option<LabResult>,
    #[serde(default)]
    pub consultation: Option<ConsultationResult>,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    #[serde(default)]
    pub flows: Vec<RequestFlow>,
}

impl TestRequest {
    /// A freshly created request in `CREATED`.
    pub fn new(id: RequestId, patient: PatientDetails) -> Self {
        let now = Utc::now();
        Self {
            id,
            status: RequestStatus::Created,
            patient,
            assigned_doctor: None,
            lab_result: None,
            consultation: None,
            created_at: now,
            last_modified: now,
            flows: Vec::new(),
        }
    }

    pub fn is_assigned_to(&self, actor: ActorId) -> bool {
        self.assigned_doctor == Some(actor)
    }

    /// Move to `to`, stamping `last_modified` and appending a flow entry.
    ///
    /// Callers must have checked the edge with [`crate::status::ensure_transition`].
    pub(crate) fn advance(&mut self, to: RequestStatus, changed_by: ActorId, at: DateTime<Utc>) {
        self.flows.push(RequestFlow {
            from: self.status,
            to,
            changed_by,
            happened_on: at,
        });
        self.status = to;
        self.last_modified = at;
    }

    /// The first structural invariant this record breaks, if any.
    pub fn invariant_violation(&self) -> Option<&'static str> {
        if self.assigned_doctor.is_some() != self.status.carries_assignment() {
            return Some("assigned doctor must be set exactly when assigned or completed");
        }
        if self.consultation.is_some() != (self.status == RequestStatus::Completed) {
            return Some("consultation result must be set exactly when completed");
        }
        if let Some(consultation) = &self.consultation {
            if consultation.request_id != self.id {
                return Some("consultation result refers to another request");
            }
            if Some(consultation.doctor) != self.assigned_doctor {
                return Some("consultation written by a doctor other than the assignee");
            }
        }
        if self.status >= RequestStatus::LabTestCompleted && self.lab_result.is_none() {
            return Some("lab result missing after lab test completed");
        }
        if self.last_modified < self.created_at {
            return Some("last modified precedes creation");
        }
        None
    }

    /// Check the structural invariants tying status to the optional fields.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::InvalidInput`] describing the first violated invariant.
    pub fn check_invariants(&self) -> WorkflowResult<()> {
        match self.invariant_violation() {
            None => Ok(()),
            Some(reason) => Err(WorkflowError::InvalidInput(format!(
                "test request {}: {reason}",
                self.id
            ))),
        }
    }
}
