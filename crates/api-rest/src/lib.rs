//! # API REST
//!
//! REST API implementation for MedChat.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, body limits)
//!
//! Uses `api-shared` for wire types and `medchat-core` for the question/answer flow.

#![warn(rust_2018_idioms)]

pub mod error;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    middleware,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use api_shared::{
    ChatReq, ChatRes, ChatWithDataReq, ChatWithDataRes, ErrorRes, FetchReq, FetchRes,
    HealthRes, HealthService, NotificationReq, NotificationRes, RecordCountsRes,
};
use medchat_core::validation::validate_question;
use medchat_core::{AssistantService, NonEmptyText, Notifier, PatientId};

pub use error::ApiError;

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Application state shared across REST API handlers.
#[derive(Clone)]
pub struct AppState {
    assistant: AssistantService,
    notifier: Option<Arc<dyn Notifier>>,
}

impl AppState {
    pub fn new(assistant: AssistantService) -> Self {
        Self {
            assistant,
            notifier: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(health, fetch, chat_with_data, chat, send_notification),
    components(schemas(
        HealthRes,
        ErrorRes,
        FetchReq,
        FetchRes,
        ChatWithDataReq,
        ChatWithDataRes,
        ChatReq,
        ChatRes,
        RecordCountsRes,
        NotificationReq,
        NotificationRes,
    ))
)]
pub struct ApiDoc;

/// Builds the REST application: routes, Swagger UI, CORS and the body limit.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/fetch", post(fetch))
        .route("/chat_with_data", post(chat_with_data))
        .route("/chat", post(chat))
        .route("/send-notification", post(send_notification))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(middleware::map_response(json_body_for_oversized_request))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// `RequestBodyLimitLayer` answers a declared oversized body with a plain-text 413 before any
/// handler runs; give it the same JSON error body as every other failure.
async fn json_body_for_oversized_request(response: Response) -> Response {
    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));
    if response.status() == StatusCode::PAYLOAD_TOO_LARGE && !is_json {
        return ApiError::PayloadTooLarge {
            limit: MAX_BODY_BYTES,
        }
        .into_response();
    }
    response
}

/// Non-blank text of an optional request field.
fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_patient_id(raw: &str) -> Result<PatientId, ApiError> {
    PatientId::parse(raw).map_err(|e| ApiError::BadRequest(format!("invalid patient_id: {e}")))
}

/// Validates the `patient_id` + `message` pair shared by both chat endpoints.
fn parse_question(
    patient_id: Option<&str>,
    message: Option<&str>,
) -> Result<(PatientId, NonEmptyText), ApiError> {
    let (Some(raw_id), Some(raw_message)) = (present(patient_id), present(message)) else {
        return Err(ApiError::BadRequest(
            "patient_id and message are required".into(),
        ));
    };
    let patient_id = parse_patient_id(raw_id)?;
    let question = validate_question(raw_message).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    Ok((patient_id, question))
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Static: neither the record store nor the generation service is contacted.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    post,
    path = "/fetch",
    request_body = FetchReq,
    responses(
        (status = 200, description = "Patient records", body = FetchRes),
        (status = 400, description = "Missing or invalid patient_id", body = ErrorRes),
        (status = 500, description = "Record store failure", body = ErrorRes)
    )
)]
/// Fetch every record kind for a patient
///
/// Diagnoses and prescriptions must be readable; the other kinds fall back to empty lists.
#[axum::debug_handler]
async fn fetch(
    State(state): State<AppState>,
    payload: Result<Json<FetchReq>, JsonRejection>,
) -> Result<Json<FetchRes>, ApiError> {
    let Json(req) = payload?;
    let raw_id = present(req.patient_id.as_deref())
        .ok_or_else(|| ApiError::BadRequest("patient_id is required".into()))?;
    let patient_id = parse_patient_id(raw_id)?;

    let records = state
        .assistant
        .fetch_records(&patient_id)
        .await
        .map_err(ApiError::Store)?;

    tracing::info!(%patient_id, counts = %records.counts(), "fetched patient records");
    Ok(Json(records.into()))
}

#[utoipa::path(
    post,
    path = "/chat_with_data",
    request_body = ChatWithDataReq,
    responses(
        (status = 200, description = "Generated answer, or the generation error text", body = ChatWithDataRes),
        (status = 400, description = "Missing patient_id or message", body = ErrorRes)
    )
)]
/// Answer a question over records supplied in the request
///
/// A generation failure is not an HTTP error: the error text is returned as `response`.
#[axum::debug_handler]
async fn chat_with_data(
    State(state): State<AppState>,
    payload: Result<Json<ChatWithDataReq>, JsonRejection>,
) -> Result<Json<ChatWithDataRes>, ApiError> {
    let Json(mut req) = payload?;
    let (patient_id, question) =
        parse_question(req.patient_id.as_deref(), req.message.as_deref())?;
    let records = req.take_records();

    let response = state
        .assistant
        .answer_with_records(&patient_id, &question, &records)
        .await;

    Ok(Json(ChatWithDataRes {
        success: true,
        response,
    }))
}

#[utoipa::path(
    post,
    path = "/chat",
    request_body = ChatReq,
    responses(
        (status = 200, description = "Generated answer with record counts", body = ChatRes),
        (status = 400, description = "Missing patient_id or message", body = ErrorRes),
        (status = 500, description = "Record store failure", body = ErrorRes)
    )
)]
/// Fetch a patient's records and answer a question over them
#[axum::debug_handler]
async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatReq>, JsonRejection>,
) -> Result<Json<ChatRes>, ApiError> {
    let Json(req) = payload?;
    let (patient_id, question) =
        parse_question(req.patient_id.as_deref(), req.message.as_deref())?;

    let answer = state
        .assistant
        .ask(&patient_id, &question)
        .await
        .map_err(ApiError::Store)?;

    Ok(Json(answer.into()))
}

#[utoipa::path(
    post,
    path = "/send-notification",
    request_body = NotificationReq,
    responses(
        (status = 200, description = "Notification delivered", body = NotificationRes),
        (status = 400, description = "Empty message", body = ErrorRes),
        (status = 502, description = "Delivery failed", body = ErrorRes),
        (status = 503, description = "Notifications not configured", body = ErrorRes)
    )
)]
/// Forward a notice to the configured notification channel
#[axum::debug_handler]
async fn send_notification(
    State(state): State<AppState>,
    payload: Result<Json<NotificationReq>, JsonRejection>,
) -> Result<Json<NotificationRes>, ApiError> {
    let Json(req) = payload?;
    let message = present(req.message.as_deref())
        .ok_or_else(|| ApiError::BadRequest("message is required".into()))?;
    let notifier = state.notifier.as_ref().ok_or(ApiError::NotifierUnavailable)?;

    notifier.notify(message).await.map_err(ApiError::Delivery)?;

    Ok(Json(NotificationRes { success: true }))
}
