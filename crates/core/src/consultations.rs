//! Doctor-facing consultation desk.
//!
//! Every entry point resolves the caller through an [`AccessGate`], requires the DOCTOR role and
//! then delegates to the [`QueryService`] or the [`WorkflowEngine`]. Transports (REST, CLI) talk to
//! this type and nothing else.

use crate::access::{AccessGate, Actor, Role};
use crate::consultation::CreateConsultationRequest;
use crate::error::WorkflowResult;
use crate::query::QueryService;
use crate::request::{RequestFlow, TestRequest};
use crate::status::RequestStatus;
use crate::store::RequestStore;
use crate::workflow::WorkflowEngine;
use std::sync::Arc;
use testreq_types::RequestId;

#[derive(Clone)]
pub struct ConsultationDesk {
    engine: WorkflowEngine,
    queries: QueryService,
}

impl ConsultationDesk {
    pub fn new(store: Arc<dyn RequestStore>, max_comment_len: usize) -> Self {
        Self {
            engine: WorkflowEngine::new(store.clone()).with_max_comment_len(max_comment_len),
            queries: QueryService::new(store),
        }
    }

    /// Resolve the caller and require the DOCTOR role.
    pub fn authenticate(gate: &dyn AccessGate) -> WorkflowResult<Actor> {
        let actor = gate.current_actor()?;
        actor.require(Role::Doctor)?;
        Ok(actor)
    }

    /// Requests waiting for a doctor.
    pub fn in_queue(&self, gate: &dyn AccessGate) -> WorkflowResult<Vec<TestRequest>> {
        Self::authenticate(gate)?;
        self.queries.find_by_status(RequestStatus::LabTestCompleted)
    }

    /// Requests assigned to the calling doctor, open and completed.
    pub fn mine(&self, gate: &dyn AccessGate) -> WorkflowResult<Vec<TestRequest>> {
        let actor = Self::authenticate(gate)?;
        self.queries.find_by_assigned_actor(actor.id)
    }

    pub fn show(&self, gate: &dyn AccessGate, id: RequestId) -> WorkflowResult<TestRequest> {
        Self::authenticate(gate)?;
        self.queries.find_by_id(id)
    }

    pub fn assign(&self, gate: &dyn AccessGate, id: RequestId) -> WorkflowResult<TestRequest> {
        let actor = Self::authenticate(gate)?;
        self.engine.assign_for_consultation(id, &actor)
    }

    pub fn update(
        &self,
        gate: &dyn AccessGate,
        id: RequestId,
        payload: &CreateConsultationRequest,
    ) -> WorkflowResult<TestRequest> {
        let actor = Self::authenticate(gate)?;
        self.engine.update_consultation(id, payload, &actor)
    }

    pub fn flow(&self, gate: &dyn AccessGate, id: RequestId) -> WorkflowResult<Vec<RequestFlow>> {
        Self::authenticate(gate)?;
        self.queries.flow_of(id)
    }
}
