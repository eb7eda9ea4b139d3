use super::{ensure_insertable, RequestStore, UpdateOutcome};
use crate::error::{StoreError, StoreResult};
use crate::request::TestRequest;
use crate::status::RequestStatus;
use std::collections::BTreeMap;
use std::sync::RwLock;
use testreq_types::RequestId;

/// Process-local store. Records live as long as the store does.
#[derive(Debug, Default)]
pub struct InMemoryRequestStore {
    records: RwLock<BTreeMap<RequestId, TestRequest>>,
}

impl InMemoryRequestStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = TestRequest>) -> StoreResult<Self> {
        let store = Self::new();
        for record in records {
            store.insert(record)?;
        }
        Ok(store)
    }
}

impl RequestStore for InMemoryRequestStore {
    fn get(&self, id: RequestId) -> StoreResult<Option<TestRequest>> {
        let records = self.records.read().map_err(|_| StoreError::Poisoned)?;
        Ok(records.get(&id).cloned())
    }

    fn insert(&self, request: TestRequest) -> StoreResult<()> {
        ensure_insertable(&request)?;
        let mut records = self.records.write().map_err(|_| StoreError::Poisoned)?;
        if records.contains_key(&request.id) {
            return Err(StoreError::Duplicate(request.id));
        }
        records.insert(request.id, request);
        Ok(())
    }

    fn compare_and_update(
        &self,
        id: RequestId,
        expected: RequestStatus,
        mutation: &mut dyn FnMut(&mut TestRequest),
    ) -> StoreResult<UpdateOutcome> {
        let mut records = self.records.write().map_err(|_| StoreError::Poisoned)?;
        let Some(current) = records.get(&id) else {
            return Ok(UpdateOutcome::Missing);
        };
        if current.status != expected {
            return Ok(UpdateOutcome::Conflict(current.clone()));
        }

        // Mutate a copy so a panicking mutation cannot leave a half-applied record behind.
        let mut updated = current.clone();
        mutation(&mut updated);
        records.insert(id, updated.clone());
        Ok(UpdateOutcome::Applied(updated))
    }

    fn query(&self, predicate: &dyn Fn(&TestRequest) -> bool) -> StoreResult<Vec<TestRequest>> {
        let records = self.records.read().map_err(|_| StoreError::Poisoned)?;
        Ok(records.values().filter(|r| predicate(r)).cloned().collect())
    }
}
