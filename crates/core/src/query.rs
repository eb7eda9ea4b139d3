//! Read-only lookups over the request store.
//!
//! `find_by_assigned_actor` returns the actor's full history: every request whose assigned
//! doctor is the actor, whether the consultation is still open or already completed.

use crate::error::{WorkflowError, WorkflowResult};
use crate::request::{RequestFlow, TestRequest};
use crate::status::RequestStatus;
use crate::store::RequestStore;
use std::sync::Arc;
use testreq_types::{ActorId, RequestId};

#[derive(Clone)]
pub struct QueryService {
    store: Arc<dyn RequestStore>,
}

impl QueryService {
    pub fn new(store: Arc<dyn RequestStore>) -> Self {
        Self { store }
    }

    /// All requests currently in `status`, ascending by id. An empty result is not an error.
    pub fn find_by_status(&self, status: RequestStatus) -> WorkflowResult<Vec<TestRequest>> {
        Ok(self.store.query(&|r| r.status == status)?)
    }

    /// All requests ever assigned to `actor`, ascending by id.
    pub fn find_by_assigned_actor(&self, actor: ActorId) -> WorkflowResult<Vec<TestRequest>> {
        Ok(self.store.query(&|r| r.assigned_doctor == Some(actor))?)
    }

    pub fn find_by_id(&self, id: RequestId) -> WorkflowResult<TestRequest> {
        self.store.get(id)?.ok_or(WorkflowError::NotFound(id))
    }

    /// Transitions recorded for request `id`, oldest first.
    pub fn flow_of(&self, id: RequestId) -> WorkflowResult<Vec<RequestFlow>> {
        Ok(self.find_by_id(id)?.flows)
    }
}
