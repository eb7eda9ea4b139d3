//! Request store contract and implementations.
//!
//! The workflow engine needs three things from storage: a point read, a filtered scan and an
//! atomic compare-and-update keyed on the current status. Anything that can provide those can
//! back the engine.

use crate::error::{StoreError, StoreResult};
use crate::request::TestRequest;
use crate::status::RequestStatus;
use testreq_types::RequestId;

pub mod file;
pub mod memory;

pub use file::JsonFileRequestStore;
pub use memory::InMemoryRequestStore;

/// Result of [`RequestStore::compare_and_update`].
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// The record had the expected status; the mutation was applied and persisted.
    Applied(TestRequest),
    /// The record exists but its status differed. Nothing was written.
    Conflict(TestRequest),
    /// No record with that id.
    Missing,
}

/// Reject records that break a structural invariant.
pub(crate) fn ensure_insertable(request: &TestRequest) -> StoreResult<()> {
    match request.invariant_violation() {
        None => Ok(()),
        Some(reason) => Err(StoreError::Invalid {
            id: request.id,
            reason,
        }),
    }
}

/// Durable storage of test requests keyed by id.
///
/// Implementations must make `compare_and_update` atomic with respect to every other call on
/// the same store: the status check, the mutation and the write form one unit.
pub trait RequestStore: Send + Sync {
    fn get(&self, id: RequestId) -> StoreResult<Option<TestRequest>>;

    /// Add a new record. Fails with [`StoreError::Duplicate`](crate::StoreError::Duplicate) if
    /// the id is taken and [`StoreError::Invalid`](crate::StoreError::Invalid) if the record
    /// breaks [`TestRequest::invariant_violation`].
    fn insert(&self, request: TestRequest) -> StoreResult<()>;

    /// Apply `mutation` to record `id` only if its status is still `expected`.
    fn compare_and_update(
        &self,
        id: RequestId,
        expected: RequestStatus,
        mutation: &mut dyn FnMut(&mut TestRequest),
    ) -> StoreResult<UpdateOutcome>;

    /// All records matching `predicate`, in ascending id order.
    fn query(&self, predicate: &dyn Fn(&TestRequest) -> bool) -> StoreResult<Vec<TestRequest>>;
}
