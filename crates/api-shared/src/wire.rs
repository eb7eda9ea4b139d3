//! JSON request and response bodies.
//!
//! Statuses and timestamps are plain strings on the wire. Conversions from core types live next to each body.

use serde::{Deserialize, Serialize};
use testreq_core::{
    ConsultationResult, CreateConsultationRequest, LabResult, RequestFlow, TestRequest,
    TestResult, WorkflowError, WorkflowResult,
};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LabResultRes {
    pub blood_pressure: String,
    pub heart_beat: String,
    pub temperature: String,
    pub oxygen_level: String,
    pub comments: Option<String>,
    /// `POSITIVE` or `NEGATIVE`.
    pub result: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ConsultationRes {
    pub doctor_id: u64,
    pub comments: String,
    /// One of `NEGATIVE`, `NO_ISSUES`, `HOME_QUARANTINE`, `ADMIT`.
    pub suggestion: String,
    /// RFC 3339.
    pub recorded_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TestRequestRes {
    pub id: u64,
    /// Lifecycle status, e.g. `LAB_TEST_COMPLETED`.
    pub status: String,
    pub patient_name: String,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub pin_code: Option<String>,
    pub assigned_doctor_id: Option<u64>,
    pub lab_result: Option<LabResultRes>,
    pub consultation: Option<ConsultationRes>,
    /// RFC 3339.
    pub created_at: String,
    /// RFC 3339.
    pub last_modified: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ListTestRequestsRes {
    pub requests: Vec<TestRequestRes>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RequestFlowRes {
    pub from: String,
    pub to: String,
    pub changed_by: u64,
    /// RFC 3339.
    pub happened_on: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ListRequestFlowRes {
    pub request_id: u64,
    pub flows: Vec<RequestFlowRes>,
}

/// Body of `PUT /api/consultations/update/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UpdateConsultationReq {
    #[serde(default)]
    pub comments: Option<String>,
    /// One of `NEGATIVE`, `NO_ISSUES`, `HOME_QUARANTINE`, `ADMIT`.
    #[serde(default)]
    pub suggestion: Option<String>,
}

impl UpdateConsultationReq {
    /// Parse a JSON body.
    ///
    /// Uses `serde_path_to_error` so a wrongly typed field is reported by name
    /// (e.g. `comments`).
    ///
    /// # Errors
    ///
    /// - [`WorkflowError::Validation`] if the JSON is well formed but does not match the body
    ///   schema. `field` is the offending path, or `body` when the whole document is wrong.
    /// - [`WorkflowError::InvalidInput`] if the bytes are not a single JSON document.
    pub fn from_json(bytes: &[u8]) -> WorkflowResult<Self> {
        let mut deserializer = serde_json::Deserializer::from_slice(bytes);
        let req = match serde_path_to_error::deserialize::<_, Self>(&mut deserializer) {
            Ok(parsed) => parsed,
            Err(err) => {
                let path = err.path().to_string();
                let source = err.into_inner();
                if !source.is_data() {
                    return Err(WorkflowError::InvalidInput(format!(
                        "malformed JSON body: {source}"
                    )));
                }
                let field = if path.is_empty() || path == "." {
                    "body".to_string()
                } else {
                    path
                };
                return Err(WorkflowError::Validation {
                    field,
                    message: source.to_string(),
                });
            }
        };
        deserializer
            .end()
            .map_err(|e| WorkflowError::InvalidInput(format!("malformed JSON body: {e}")))?;
        Ok(req)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// HTTP status code.
    pub code: u16,
    /// One of `not_found`, `invalid_state`, `permission`, `validation`, `unauthenticated`,
    /// `invalid_input` or `internal`.
    pub kind: String,
    pub message: String,
    /// Offending field, for validation errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub error: ErrorBody,
}

fn test_result_str(result: TestResult) -> &'static str {
    match result {
        TestResult::Positive => "POSITIVE",
        TestResult::Negative => "NEGATIVE",
    }
}

impl From<&LabResult> for LabResultRes {
    fn from(lab: &LabResult) -> Self {
        Self {
            blood_pressure: lab.blood_pressure.clone(),
            heart_beat: lab.heart_beat.clone(),
            temperature: lab.temperature.clone(),
            oxygen_level: lab.oxygen_level.clone(),
            comments: lab.comments.clone(),
            result: test_result_str(lab.result).into(),
        }
    }
}

impl From<&ConsultationResult> for ConsultationRes {
    fn from(c: &ConsultationResult) -> Self {
        Self {
            doctor_id: c.doctor.get(),
            comments: c.comments.to_string(),
            suggestion: c.suggestion.to_string(),
            recorded_at: c.recorded_at.to_rfc3339(),
        }
    }
}

impl From<&TestRequest> for TestRequestRes {
    fn from(r: &TestRequest) -> Self {
        Self {
            id: r.id.get(),
            status: r.status.to_string(),
            patient_name: r.patient.name.clone(),
            age: r.patient.age,
            gender: r.patient.gender.clone(),
            email: r.patient.email.clone(),
            phone_number: r.patient.phone_number.clone(),
            pin_code: r.patient.pin_code.clone(),
            assigned_doctor_id: r.assigned_doctor.map(|d| d.get()),
            lab_result: r.lab_result.as_ref().map(LabResultRes::from),
            consultation: r.consultation.as_ref().map(ConsultationRes::from),
            created_at: r.created_at.to_rfc3339(),
            last_modified: r.last_modified.to_rfc3339(),
        }
    }
}

impl From<&RequestFlow> for RequestFlowRes {
    fn from(f: &RequestFlow) -> Self {
        Self {
            from: f.from.to_string(),
            to: f.to.to_string(),
            changed_by: f.changed_by.get(),
            happened_on: f.happened_on.to_rfc3339(),
        }
    }
}

impl From<&[TestRequest]> for ListTestRequestsRes {
    fn from(records: &[TestRequest]) -> Self {
        Self {
            requests: records.iter().map(TestRequestRes::from).collect(),
        }
    }
}

impl From<UpdateConsultationReq> for CreateConsultationRequest {
    fn from(req: UpdateConsultationReq) -> Self {
        Self {
            comments: req.comments,
            suggestion: req.suggestion,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use testreq_core::{PatientDetails, RequestId, RequestStatus};

    #[test]
    fn test_request_body_uses_wire_names() {
        let mut record = TestRequest::new(
            RequestId::new(42),
            PatientDetails {
                name: "Jane Doe".into(),
                age: Some(34),
                ..PatientDetails::default()
            },
        );
        record.status = RequestStatus::LabTestCompleted;
        record.lab_result = Some(LabResult {
            blood_pressure: "120/80".into(),
            heart_beat: "72".into(),
            temperature: "98.4".into(),
            oxygen_level: "97".into(),
            comments: None,
            result: TestResult::Negative,
        });

        let body = TestRequestRes::from(&record);
        assert_eq!(body.id, 42);
        assert_eq!(body.status, "LAB_TEST_COMPLETED");
        assert_eq!(body.assigned_doctor_id, None);
        assert_eq!(body.lab_result.unwrap().result, "NEGATIVE");

        let json = serde_json::to_value(TestRequestRes::from(&record)).unwrap();
        assert_eq!(json["patient_name"], "Jane Doe");
        assert!(json["consultation"].is_null());
    }

    #[test]
    fn update_body_tolerates_missing_fields() {
        let req: UpdateConsultationReq = serde_json::from_str("{\"comments\":\"ok\"}").unwrap();
        let core: CreateConsultationRequest = req.into();
        assert_eq!(core.comments.as_deref(), Some("ok"));
        assert_eq!(core.suggestion, None);
    }

    #[test]
    fn update_body_type_errors_name_the_field() {
        let err = UpdateConsultationReq::from_json(br#"{"comments": 5}"#).unwrap_err();
        assert!(matches!(err, WorkflowError::Validation { ref field, .. } if field == "comments"));

        let err = UpdateConsultationReq::from_json(br#""just text""#).unwrap_err();
        assert!(matches!(err, WorkflowError::Validation { ref field, .. } if field == "body"));
    }

    #[test]
    fn update_body_syntax_errors_are_invalid_input() {
        for body in [
            &b"not json"[..],
            &b""[..],
            &b"{\"comments\": \"ok\"} trailing"[..],
        ] {
            assert!(
                matches!(
                    UpdateConsultationReq::from_json(body),
                    Err(WorkflowError::InvalidInput(_))
                ),
                "{}",
                String::from_utf8_lossy(body)
            );
        }
        let ok = UpdateConsultationReq::from_json(br#"{"suggestion": "ADMIT"}"#).unwrap();
        assert_eq!(ok.suggestion.as_deref(), Some("ADMIT"));
    }

    #[test]
    fn error_body_omits_absent_field() {
        let res = ErrorRes {
            error: ErrorBody {
                code: 404,
                kind: "not_found".into(),
                message: "test request 1 not found".into(),
                field: None,
            },
        };
        let json = serde_json::to_value(res).unwrap();
        assert!(json["error"].get("field").is_none());
    }
}
