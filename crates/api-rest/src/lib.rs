//! # API REST
//!
//! REST API for the doctor consultation workflow.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI documentation (served as JSON)
//! - REST-specific concerns (bearer tokens, JSON bodies, status codes, CORS)
//!
//! Uses `api-shared` for wire types and `testreq-core` for everything else.

#![warn(rust_2018_idioms)]

pub mod error;

use api_shared::auth::{bearer_token, AUTHORIZATION_HEADER};
use api_shared::{
    ConsultationRes, ErrorBody, ErrorRes, HealthRes, HealthService, LabResultRes,
    ListRequestFlowRes, ListTestRequestsRes, RequestFlowRes, TestRequestRes,
    UpdateConsultationReq,
};
use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, PathRejection},
        Path as AxumPath, State,
    },
    http::{header::CONTENT_TYPE, HeaderMap},
    response::Json,
    routing::{get, put},
    Router,
};
use std::sync::Arc;
use testreq_core::{
    ActorDirectory, ConsultationDesk, CreateConsultationRequest, FixedAccessGate, RequestId,
    TokenAccessGate, WorkflowError,
};
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;

pub use error::ApiError;

/// Application state shared by all request handlers.
#[derive(Clone)]
pub struct AppState {
    desk: ConsultationDesk,
    directory: Arc<ActorDirectory>,
}

impl AppState {
    pub fn new(desk: ConsultationDesk, directory: Arc<ActorDirectory>) -> Self {
        Self { desk, directory }
    }

    fn gate(&self, headers: &HeaderMap) -> TokenAccessGate<'_> {
        let header = headers
            .get(AUTHORIZATION_HEADER)
            .and_then(|v| v.to_str().ok());
        self.directory.gate(bearer_token(header))
    }

    /// Authenticate the caller before anything in the request is parsed.
    fn caller(&self, headers: &HeaderMap) -> Result<FixedAccessGate, ApiError> {
        let actor = ConsultationDesk::authenticate(&self.gate(headers))?;
        Ok(FixedAccessGate(actor))
    }
}

fn request_id(path: Result<AxumPath<u64>, PathRejection>) -> Result<RequestId, ApiError> {
    let AxumPath(id) = path.map_err(|rejection| {
        WorkflowError::InvalidInput(format!("invalid test request id: {}", rejection.body_text()))
    })?;
    Ok(RequestId::new(id))
}

fn update_body(
    headers: &HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<UpdateConsultationReq, ApiError> {
    let content_type = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok());
    if let Some(content_type) = content_type {
        if !content_type.trim_start().starts_with("application/json") {
            return Err(WorkflowError::InvalidInput(format!(
                "expected an application/json body, got {content_type}"
            ))
            .into());
        }
    }
    let bytes = body.map_err(|rejection| {
        WorkflowError::InvalidInput(format!("unreadable body: {}", rejection.body_text()))
    })?;
    Ok(UpdateConsultationReq::from_json(&bytes)?)
}

#[derive(OpenApi)]
#[openapi(
    paths(health, in_queue, for_doctor, assign, update, flow),
    components(schemas(
        HealthRes,
        TestRequestRes,
        LabResultRes,
        ConsultationRes,
        ListTestRequestsRes,
        RequestFlowRes,
        ListRequestFlowRes,
        UpdateConsultationReq,
        ErrorRes,
        ErrorBody,
    ))
)]
pub struct ApiDoc;

/// Build the router with every endpoint and the OpenAPI document.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/consultations", get(for_doctor))
        .route("/api/consultations/in-queue", get(in_queue))
        .route("/api/consultations/assign/:id", put(assign))
        .route("/api/consultations/update/:id", put(update))
        .route("/api/consultations/:id/flow", get(flow))
        .route("/api-docs/openapi.json", get(openapi))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    get,
    path = "/api/consultations/in-queue",
    responses(
        (status = 200, description = "Requests with status LAB_TEST_COMPLETED", body = ListTestRequestsRes),
        (status = 401, description = "Missing or unknown bearer token", body = ErrorRes),
        (status = 403, description = "Caller is not a doctor", body = ErrorRes)
    )
)]
/// List test requests waiting for a doctor.
#[axum::debug_handler]
async fn in_queue(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ListTestRequestsRes>, ApiError> {
    let records = state.desk.in_queue(&state.caller(&headers)?)?;
    Ok(Json(ListTestRequestsRes::from(records.as_slice())))
}

#[utoipa::path(
    get,
    path = "/api/consultations",
    responses(
        (status = 200, description = "Requests assigned to the calling doctor, open and completed", body = ListTestRequestsRes),
        (status = 401, description = "Missing or unknown bearer token", body = ErrorRes),
        (status = 403, description = "Caller is not a doctor", body = ErrorRes)
    )
)]
/// List test requests assigned to the calling doctor.
#[axum::debug_handler]
async fn for_doctor(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ListTestRequestsRes>, ApiError> {
    let records = state.desk.mine(&state.caller(&headers)?)?;
    Ok(Json(ListTestRequestsRes::from(records.as_slice())))
}

#[utoipa::path(
    put,
    path = "/api/consultations/assign/{id}",
    params(("id" = u64, Path, description = "Test request id")),
    responses(
        (status = 200, description = "Request assigned to the caller", body = TestRequestRes),
        (status = 400, description = "Unparseable id", body = ErrorRes),
        (status = 401, description = "Missing or unknown bearer token", body = ErrorRes),
        (status = 403, description = "Caller is not a doctor, or another doctor holds the request", body = ErrorRes),
        (status = 404, description = "No such test request", body = ErrorRes),
        (status = 409, description = "Request is not waiting for consultation", body = ErrorRes)
    )
)]
/// Assign a test request to the calling doctor.
///
/// Retrying after a successful assignment returns the same record unchanged.
#[axum::debug_handler]
async fn assign(
    State(state): State<AppState>,
    path: Result<AxumPath<u64>, PathRejection>,
    headers: HeaderMap,
) -> Result<Json<TestRequestRes>, ApiError> {
    let caller = state.caller(&headers)?;
    let record = state.desk.assign(&caller, request_id(path)?)?;
    Ok(Json(TestRequestRes::from(&record)))
}

#[utoipa::path(
    put,
    path = "/api/consultations/update/{id}",
    params(("id" = u64, Path, description = "Test request id")),
    request_body = UpdateConsultationReq,
    responses(
        (status = 200, description = "Consultation recorded, request completed", body = TestRequestRes),
        (status = 400, description = "Unparseable id or body", body = ErrorRes),
        (status = 401, description = "Missing or unknown bearer token", body = ErrorRes),
        (status = 403, description = "Caller is not the assigned doctor", body = ErrorRes),
        (status = 404, description = "No such test request", body = ErrorRes),
        (status = 409, description = "Request is not assigned for consultation", body = ErrorRes),
        (status = 422, description = "Malformed consultation", body = ErrorRes)
    )
)]
/// Record the consultation result for a test request assigned to the calling doctor.
#[axum::debug_handler]
async fn update(
    State(state): State<AppState>,
    path: Result<AxumPath<u64>, PathRejection>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<TestRequestRes>, ApiError> {
    let caller = state.caller(&headers)?;
    let id = request_id(path)?;
    let payload = CreateConsultationRequest::from(update_body(&headers, body)?);
    let record = state.desk.update(&caller, id, &payload)?;
    Ok(Json(TestRequestRes::from(&record)))
}

#[utoipa::path(
    get,
    path = "/api/consultations/{id}/flow",
    params(("id" = u64, Path, description = "Test request id")),
    responses(
        (status = 200, description = "Recorded transitions, oldest first", body = ListRequestFlowRes),
        (status = 400, description = "Unparseable id", body = ErrorRes),
        (status = 401, description = "Missing or unknown bearer token", body = ErrorRes),
        (status = 403, description = "Caller is not a doctor", body = ErrorRes),
        (status = 404, description = "No such test request", body = ErrorRes)
    )
)]
/// Show the lifecycle transitions recorded for a test request.
#[axum::debug_handler]
async fn flow(
    State(state): State<AppState>,
    path: Result<AxumPath<u64>, PathRejection>,
    headers: HeaderMap,
) -> Result<Json<ListRequestFlowRes>, ApiError> {
    let caller = state.caller(&headers)?;
    let id = request_id(path)?;
    let flows = state.desk.flow(&caller, id)?;
    Ok(Json(ListRequestFlowRes {
        request_id: id.get(),
        flows: flows.iter().map(RequestFlowRes::from).collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use testreq_core::{InMemoryRequestStore, IntakeService, RequestStore};
    use tower::ServiceExt;

    const ACTORS: &str = r#"actors:
  - { id: 1, name: Dr One, token: d1, roles: [DOCTOR] }
  - { id: 2, name: Dr Two, token: d2, roles: [DOCTOR] }
  - { id: 9, name: Tess Tester, token: t9, roles: [TESTER] }
"#;

    const SEED: &str = r#"requests:
  - id: 42
    status: LAB_TEST_COMPLETED
    patient: { name: Jane Doe, age: 34 }
    lab_result: { blood_pressure: 120/80, heart_beat: "72", temperature: "98.4", oxygen_level: "97", result: NEGATIVE }
  - id: 43
    status: LAB_TEST_IN_PROGRESS
    patient: { name: John Roe }
"#;

    fn app() -> Router {
        let store: Arc<dyn RequestStore> = Arc::new(InMemoryRequestStore::new());
        IntakeService::new(store.clone()).import_yaml(SEED).unwrap();
        let directory = ActorDirectory::from_yaml_str(ACTORS).unwrap();
        router(AppState::new(
            ConsultationDesk::new(store, 200),
            Arc::new(directory),
        ))
    }

    async fn call(
        app: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        match body {
            Some(json) => {
                call_raw(app, method, uri, token, Some("application/json"), json.to_string()).await
            }
            None => call_raw(app, method, uri, token, None, String::new()).await,
        }
    }

    async fn call_raw(
        app: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        content_type: Option<&str>,
        body: String,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        if let Some(content_type) = content_type {
            builder = builder.header("content-type", content_type);
        }
        let body = Body::from(body);

        let response = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    #[tokio::test]
    async fn health_is_open() {
        let (status, body) = call(&app(), "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn queue_requires_a_doctor_token() {
        let app = app();

        let (status, body) = call(&app, "GET", "/api/consultations/in-queue", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["kind"], "unauthenticated");

        let (status, _) = call(&app, "GET", "/api/consultations/in-queue", Some("t9"), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) =
            call(&app, "GET", "/api/consultations/in-queue", Some("d1"), None).await;
        assert_eq!(status, StatusCode::OK);
        let requests = body["requests"].as_array().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0]["id"], 42);
        assert_eq!(requests[0]["status"], "LAB_TEST_COMPLETED");
    }

    #[tokio::test]
    async fn consultation_scenario_over_http() {
        let app = app();

        let (status, body) =
            call(&app, "PUT", "/api/consultations/assign/42", Some("d1"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ASSIGNED_FOR_CONSULTATION");
        assert_eq!(body["assigned_doctor_id"], 1);

        let result = json!({ "comments": "stable", "suggestion": "NEGATIVE" });
        let (status, body) = call(
            &app,
            "PUT",
            "/api/consultations/update/42",
            Some("d2"),
            Some(result.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["kind"], "permission");

        let (status, body) = call(
            &app,
            "PUT",
            "/api/consultations/update/42",
            Some("d1"),
            Some(result),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "COMPLETED");
        assert_eq!(body["consultation"]["comments"], "stable");
        assert_eq!(body["consultation"]["suggestion"], "NEGATIVE");

        let (status, body) = call(&app, "GET", "/api/consultations", Some("d1"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["requests"].as_array().unwrap().len(), 1);

        let (status, body) =
            call(&app, "GET", "/api/consultations/42/flow", Some("d2"), None).await;
        assert_eq!(status, StatusCode::OK);
        let flows = body["flows"].as_array().unwrap();
        assert_eq!(flows.len(), 2);
        assert_eq!(flows[1]["to"], "COMPLETED");
    }

    #[tokio::test]
    async fn assign_maps_state_and_lookup_failures() {
        let app = app();

        let (status, body) =
            call(&app, "PUT", "/api/consultations/assign/43", Some("d1"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["kind"], "invalid_state");

        let (status, _) =
            call(&app, "PUT", "/api/consultations/assign/999", Some("d1"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) =
            call(&app, "PUT", "/api/consultations/assign/42", Some("d1"), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) =
            call(&app, "PUT", "/api/consultations/assign/42", Some("d1"), None).await;
        assert_eq!(status, StatusCode::OK, "holder retry is tolerated");
        assert_eq!(body["assigned_doctor_id"], 1);

        let (status, _) =
            call(&app, "PUT", "/api/consultations/assign/42", Some("d2"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn blank_comments_are_a_validation_error() {
        let app = app();
        call(&app, "PUT", "/api/consultations/assign/42", Some("d1"), None).await;

        let (status, body) = call(
            &app,
            "PUT",
            "/api/consultations/update/42",
            Some("d1"),
            Some(json!({ "comments": "  ", "suggestion": "ADMIT" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["field"], "comments");
    }

    #[tokio::test]
    async fn openapi_document_lists_consultation_paths() {
        let (status, body) = call(&app(), "GET", "/api-docs/openapi.json", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"]
            .get("/api/consultations/assign/{id}")
            .is_some());
    }

    #[tokio::test]
    async fn bad_update_bodies_use_the_error_envelope() {
        let app = app();
        call(&app, "PUT", "/api/consultations/assign/42", Some("d1"), None).await;
        let uri = "/api/consultations/update/42";

        let (status, body) = call_raw(
            &app,
            "PUT",
            uri,
            Some("d1"),
            Some("application/json"),
            r#"{"comments": 5, "suggestion": "ADMIT"}"#.into(),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["kind"], "validation");
        assert_eq!(body["error"]["field"], "comments");

        let (status, body) = call_raw(
            &app,
            "PUT",
            uri,
            Some("d1"),
            Some("application/json"),
            "not json".into(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["kind"], "invalid_input");

        let (status, body) = call_raw(
            &app,
            "PUT",
            uri,
            Some("d1"),
            Some("text/plain"),
            r#"{"comments": "ok", "suggestion": "ADMIT"}"#.into(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], 400);

        let (status, body) = call(&app, "GET", "/api/consultations/42/flow", Some("d1"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["flows"].as_array().unwrap().len(), 1, "nothing was recorded");
    }

    #[tokio::test]
    async fn missing_token_wins_over_bad_input() {
        let app = app();

        let (status, body) = call_raw(
            &app,
            "PUT",
            "/api/consultations/update/42",
            None,
            Some("application/json"),
            r#"{"comments": 5}"#.into(),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["kind"], "unauthenticated");

        let (status, _) =
            call(&app, "PUT", "/api/consultations/assign/abc", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unparseable_id_is_invalid_input() {
        let app = app();
        for (method, uri) in [
            ("PUT", "/api/consultations/assign/abc"),
            ("GET", "/api/consultations/-1/flow"),
        ] {
            let (status, body) = call(&app, method, uri, Some("d1"), None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body["error"]["kind"], "invalid_input");
        }
    }
}
