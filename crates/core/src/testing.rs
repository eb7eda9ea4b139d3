//! Fixtures shared by the unit tests in this crate.

use crate::access::{Actor, Role};
use crate::request::{LabResult, PatientDetails, TestRequest, TestResult};
use crate::status::RequestStatus;
use crate::store::{InMemoryRequestStore, RequestStore};
use std::sync::Arc;
use testreq_types::{ActorId, NonEmptyText, RequestId};

pub(crate) fn doctor(id: u64) -> Actor {
    Actor::new(
        ActorId::new(id),
        NonEmptyText::new(format!("Dr {id}")).unwrap(),
        [Role::Doctor],
    )
}

pub(crate) fn tester(id: u64) -> Actor {
    Actor::new(
        ActorId::new(id),
        NonEmptyText::new(format!("Tester {id}")).unwrap(),
        [Role::Tester],
    )
}

pub(crate) fn lab_result() -> LabResult {
    LabResult {
        blood_pressure: "120/80".into(),
        heart_beat: "72".into(),
        temperature: "98.6".into(),
        oxygen_level: "97".into(),
        comments: Some("within range".into()),
        result: TestResult::Negative,
    }
}

/// A request that has finished its lab test and is waiting for a doctor.
pub(crate) fn lab_completed(id: u64) -> TestRequest {
    let mut record = TestRequest::new(
        RequestId::new(id),
        PatientDetails {
            name: format!("Patient {id}"),
            age: Some(40),
            ..PatientDetails::default()
        },
    );
    record.status = RequestStatus::LabTestCompleted;
    record.lab_result = Some(lab_result());
    record
}

/// In-memory store holding `records` as given, without intake checks.
pub(crate) fn seeded_store(records: Vec<TestRequest>) -> Arc<dyn RequestStore> {
    let store = InMemoryRequestStore::new();
    for record in records {
        store.insert(record).unwrap();
    }
    Arc::new(store)
}
