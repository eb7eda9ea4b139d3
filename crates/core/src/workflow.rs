//! Workflow engine: the only code that moves a test request through its lifecycle.
//!
//! Each operation is a single-record, single-transition step. Preconditions are evaluated
//! against a snapshot, then the change is committed with a compare-and-update on the status the
//! snapshot showed. If another caller moved the record in between, the commit reports a conflict
//! and the operation fails with [`WorkflowError::InvalidState`]. Nothing is retried here.
//!
//! Assignment retry policy: if the caller already holds the assignment and the request is still
//! `ASSIGNED_FOR_CONSULTATION`, the current record is returned unchanged. Every other repeated
//! attempt fails.

use crate::access::{Actor, Role};
use crate::consultation::{ConsultationResult, CreateConsultationRequest};
use crate::constants::DEFAULT_MAX_COMMENT_LEN;
use crate::error::{WorkflowError, WorkflowResult};
use crate::request::TestRequest;
use crate::status::{ensure_transition, RequestStatus};
use crate::store::{RequestStore, UpdateOutcome};
use chrono::Utc;
use std::sync::Arc;
use testreq_types::RequestId;

#[derive(Clone)]
pub struct WorkflowEngine {
    store: Arc<dyn RequestStore>,
    max_comment_len: usize,
}

impl WorkflowEngine {
    pub fn new(store: Arc<dyn RequestStore>) -> Self {
        Self {
            store,
            max_comment_len: DEFAULT_MAX_COMMENT_LEN,
        }
    }

    pub fn with_max_comment_len(mut self, max_comment_len: usize) -> Self {
        self.max_comment_len = max_comment_len;
        self
    }

    pub fn store(&self) -> &Arc<dyn RequestStore> {
        &self.store
    }

    fn load(&self, id: RequestId) -> WorkflowResult<TestRequest> {
        self.store.get(id)?.ok_or(WorkflowError::NotFound(id))
    }

    /// Claim a lab-completed request for consultation.
    ///
    /// # Errors
    ///
    /// - [`WorkflowError::Permission`] if `actor` is not a doctor, or if the record somehow
    ///   already names another doctor.
    /// - [`WorkflowError::NotFound`] if no such request exists.
    /// - [`WorkflowError::InvalidState`] if the request is not `LAB_TEST_COMPLETED`, or if a
    ///   concurrent call changed it first.
    pub fn assign_for_consultation(
        &self,
        id: RequestId,
        actor: &Actor,
    ) -> WorkflowResult<TestRequest> {
        actor.require(Role::Doctor)?;
        let current = self.load(id)?;

        if current.status == RequestStatus::AssignedForConsultation
            && current.is_assigned_to(actor.id)
        {
            tracing::debug!(request = %id, actor = %actor.id, "assignment retried by holder");
            return Ok(current);
        }

        let from = RequestStatus::LabTestCompleted;
        let to = RequestStatus::AssignedForConsultation;
        if current.status != from {
            tracing::warn!(
                request = %id,
                actor = %actor.id,
                status = %current.status,
                "assignment rejected: wrong status"
            );
            return Err(WorkflowError::InvalidState {
                id,
                expected: from,
                actual: current.status,
            });
        }
        if let Some(holder) = current.assigned_doctor {
            return Err(WorkflowError::permission(
                actor.id,
                format!("test request {id} is already assigned to {holder}"),
            ));
        }
        ensure_transition(from, to)?;

        let doctor = actor.id;
        let now = Utc::now();
        let outcome = self.store.compare_and_update(id, from, &mut |record| {
            record.assigned_doctor = Some(doctor);
            record.advance(to, doctor, now);
        })?;

        match outcome {
            UpdateOutcome::Applied(updated) => {
                tracing::info!(request = %id, doctor = %doctor, "{from} -> {to}");
                Ok(updated)
            }
            // Two submissions from the same doctor raced each other; the other one won.
            UpdateOutcome::Conflict(latest) if latest.status == to && latest.is_assigned_to(doctor) => {
                Ok(latest)
            }
            UpdateOutcome::Conflict(latest) => {
                tracing::warn!(request = %id, actor = %doctor, "assignment lost race");
                Err(WorkflowError::InvalidState {
                    id,
                    expected: from,
                    actual: latest.status,
                })
            }
            UpdateOutcome::Missing => Err(WorkflowError::NotFound(id)),
        }
    }

    /// Record the assigned doctor's consultation and complete the request.
    ///
    /// # Errors
    ///
    /// - [`WorkflowError::Permission`] if `actor` is not a doctor or is not the assignee.
    /// - [`WorkflowError::NotFound`] if no such request exists.
    /// - [`WorkflowError::InvalidState`] if the request is not `ASSIGNED_FOR_CONSULTATION`, or
    ///   if a concurrent call changed it first.
    /// - [`WorkflowError::Validation`] if the payload is malformed.
    pub fn update_consultation(
        &self,
        id: RequestId,
        payload: &CreateConsultationRequest,
        actor: &Actor,
    ) -> WorkflowResult<TestRequest> {
        actor.require(Role::Doctor)?;
        let current = self.load(id)?;

        let from = RequestStatus::AssignedForConsultation;
        let to = RequestStatus::Completed;
        if current.status != from {
            tracing::warn!(
                request = %id,
                actor = %actor.id,
                status = %current.status,
                "consultation rejected: wrong status"
            );
            return Err(WorkflowError::InvalidState {
                id,
                expected: from,
                actual: current.status,
            });
        }
        if !current.is_assigned_to(actor.id) {
            tracing::warn!(request = %id, actor = %actor.id, "consultation rejected: not the assignee");
            return Err(WorkflowError::permission(
                actor.id,
                format!("test request {id} is not assigned to this doctor"),
            ));
        }
        let valid = payload.validate(self.max_comment_len)?;
        ensure_transition(from, to)?;

        let now = Utc::now();
        let result = ConsultationResult {
            request_id: id,
            doctor: actor.id,
            comments: valid.comments,
            suggestion: valid.suggestion,
            recorded_at: now,
        };
        let doctor = actor.id;
        let outcome = self.store.compare_and_update(id, from, &mut |record| {
            record.consultation = Some(result.clone());
            record.advance(to, doctor, now);
        })?;

        match outcome {
            UpdateOutcome::Applied(updated) => {
                tracing::info!(
                    request = %id,
                    doctor = %doctor,
                    suggestion = %result.suggestion,
                    "{from} -> {to}"
                );
                Ok(updated)
            }
            UpdateOutcome::Conflict(latest) => Err(WorkflowError::InvalidState {
                id,
                expected: from,
                actual: latest.status,
            }),
            UpdateOutcome::Missing => Err(WorkflowError::NotFound(id)),
        }
    }
}
