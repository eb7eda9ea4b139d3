//! Intake of new test requests.
//!
//! Creating requests belongs to an upstream process; this module is the narrow door it uses.
//! Intake may place a request anywhere up to `LAB_TEST_COMPLETED`. Later statuses are reachable
//! only through the workflow engine.

use crate::error::{StoreError, WorkflowError, WorkflowResult};
use crate::request::{LabResult, PatientDetails, TestRequest};
use crate::status::RequestStatus;
use crate::store::RequestStore;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use testreq_types::RequestId;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SeedFile {
    requests: Vec<SeedEntry>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SeedEntry {
    id: RequestId,
    status: RequestStatus,
    patient: PatientDetails,
    #[serde(default)]
    lab_result: Option<LabResult>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

impl SeedEntry {
    fn into_request(self) -> TestRequest {
        let mut record = TestRequest::new(self.id, self.patient);
        record.status = self.status;
        record.lab_result = self.lab_result;
        if let Some(created_at) = self.created_at {
            record.created_at = created_at;
            record.last_modified = created_at;
        }
        record
    }
}

/// Counts reported by [`IntakeService::import_yaml`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

#[derive(Clone)]
pub struct IntakeService {
    store: Arc<dyn RequestStore>,
}

impl IntakeService {
    pub fn new(store: Arc<dyn RequestStore>) -> Self {
        Self { store }
    }

    /// Validate and store a new request.
    ///
    /// # Errors
    ///
    /// - [`WorkflowError::InvalidInput`] if the record breaks an invariant or is past
    ///   `LAB_TEST_COMPLETED`.
    /// - [`WorkflowError::Store`] if the id is taken or the store fails.
    pub fn admit(&self, request: TestRequest) -> WorkflowResult<()> {
        if request.status > RequestStatus::LabTestCompleted {
            return Err(WorkflowError::InvalidInput(format!(
                "test request {} cannot enter the system as {}",
                request.id, request.status
            )));
        }
        if !request.flows.is_empty() {
            return Err(WorkflowError::InvalidInput(format!(
                "test request {} arrived with recorded transitions",
                request.id
            )));
        }
        request.check_invariants()?;

        let id = request.id;
        let status = request.status;
        self.store.insert(request)?;
        tracing::info!(request = %id, status = %status, "test request admitted");
        Ok(())
    }

    /// Admit every request in a YAML seed document. Ids already present are skipped.
    ///
    /// ```yaml
    /// requests:
    ///   - id: 42
    ///     status: LAB_TEST_COMPLETED
    ///     patient: { name: Jane Doe, age: 34 }
    ///     lab_result:
    ///       blood_pressure: 120/80
    ///       heart_beat: "72"
    ///       temperature: "98.4"
    ///       oxygen_level: "97"
    ///       result: NEGATIVE
    /// ```
    pub fn import_yaml(&self, yaml_text: &str) -> WorkflowResult<ImportSummary> {
        let seed: SeedFile = serde_yaml::from_str(yaml_text)
            .map_err(|e| WorkflowError::InvalidInput(format!("seed file: {e}")))?;

        let mut summary = ImportSummary::default();
        for entry in seed.requests {
            let id = entry.id;
            match self.admit(entry.into_request()) {
                Ok(()) => summary.imported += 1,
                Err(WorkflowError::Store(StoreError::Duplicate(_))) => {
                    tracing::debug!(request = %id, "already present, skipped");
                    summary.skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(summary)
    }

    pub fn import_file(&self, path: &Path) -> WorkflowResult<ImportSummary> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            WorkflowError::InvalidInput(format!("cannot read seed file {}: {e}", path.display()))
        })?;
        self.import_yaml(&text)
    }
}
