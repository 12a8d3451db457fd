//! # API REST
//!
//! REST API implementation for Dr. Jira.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, status codes)
//!
//! Uses `api-shared` for DTOs and authentication, and `drjira-core` for every operation.

#![warn(rust_2018_idioms)]

use api_shared::{
    bearer_token, validate_api_key, AcceptedRes, AppConfigDto, ApplySuggestionReq,
    ApplySuggestionRes, ErrorRes, HealthRes, HealthService, ListSuggestionsRes, StorageEntryRes,
    StoragePageRes, StorageQuery, SuggestionRes, TestConnectionReq, TestConnectionRes,
    UsageStatsRes, WebhookRes,
};
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use drjira_core::{
    AppSettings, IssueKey, Score, Suggestion, SuggestionBody, SuggestionError, SuggestionService,
};
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Application state for the REST API server
///
/// Holds the suggestion service shared by every handler.
#[derive(Clone)]
pub struct AppState {
    service: Arc<SuggestionService>,
}

impl AppState {
    pub fn new(service: SuggestionService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

type ApiError = (StatusCode, Json<ErrorRes>);
type ApiResult<T> = Result<T, ApiError>;

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        webhook,
        issue_event,
        list_suggestions,
        apply_suggestion,
        usage_stats,
        get_config,
        save_config,
        test_connection,
        storage,
    ),
    components(schemas(
        HealthRes,
        ErrorRes,
        WebhookRes,
        AcceptedRes,
        SuggestionRes,
        ListSuggestionsRes,
        ApplySuggestionReq,
        ApplySuggestionRes,
        UsageStatsRes,
        AppConfigDto,
        TestConnectionReq,
        TestConnectionRes,
        StorageEntryRes,
        StoragePageRes,
    ))
)]
pub struct ApiDoc;

/// Builds the application router with Swagger UI and permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/webhook", post(webhook))
        .route("/events/issue", post(issue_event))
        .route("/issues/:key/suggestions", get(list_suggestions))
        .route("/issues/:key/suggestions/:id/apply", post(apply_suggestion))
        .route("/stats/models", get(usage_stats))
        .route("/config", get(get_config).put(save_config))
        .route("/config/test-connection", post(test_connection))
        .route("/storage", get(storage))
        .merge(
            SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Maps a core error to its HTTP status and JSON body.
fn api_error(e: SuggestionError) -> ApiError {
    let status = match &e {
        SuggestionError::InvalidInput(_)
        | SuggestionError::InvalidJson(_)
        | SuggestionError::MissingIssueKey
        | SuggestionError::MissingSuggestionContent
        | SuggestionError::InvalidIssueKey(_) => StatusCode::BAD_REQUEST,
        SuggestionError::NoSuggestions(_) | SuggestionError::SuggestionNotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        SuggestionError::IssueUpdateRejected { .. }
        | SuggestionError::Http(_)
        | SuggestionError::AutomationRejected { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        tracing::error!("request failed: {}", e);
    } else {
        tracing::warn!("request rejected: {}", e);
    }
    (status, Json(ErrorRes::new(e.to_string())))
}

fn parse_issue_key(key: &str) -> ApiResult<IssueKey> {
    IssueKey::new(key).map_err(|e| api_error(e.into()))
}

fn suggestion_res(s: Suggestion) -> SuggestionRes {
    SuggestionRes {
        id: s.id,
        title: s.title,
        summary: s.summary,
        description: s.description,
        original_description: s.original_description.map(|body| match body {
            SuggestionBody::RawText(text) => Value::String(text),
            SuggestionBody::Structured(map) => Value::Object(map),
        }),
        source_model: s.source_model,
        score: match s.score {
            Score::Number(n) => serde_json::Number::from_f64(n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Score::Text(text) => Value::String(text),
        },
    }
}

fn config_dto(s: AppSettings) -> AppConfigDto {
    AppConfigDto {
        min_score: s.min_score,
        model_name: s.model_name,
        n8n_url: s.n8n_url,
        n8n_api_key: s.n8n_api_key,
    }
}

fn settings_from_dto(dto: AppConfigDto) -> AppSettings {
    let defaults = AppSettings::default();
    AppSettings {
        min_score: dto.min_score,
        model_name: if dto.model_name.is_empty() {
            defaults.model_name
        } else {
            dto.model_name
        },
        n8n_url: dto.n8n_url,
        n8n_api_key: dto.n8n_api_key.filter(|key| !key.is_empty()),
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    post,
    path = "/webhook",
    request_body(content = String, description = "Suggestion payload, possibly wrapped or double-encoded", content_type = "application/json"),
    responses(
        (status = 200, description = "Suggestions stored", body = WebhookRes),
        (status = 400, description = "Malformed payload", body = ErrorRes),
        (status = 401, description = "Missing or invalid API key", body = ErrorRes),
        (status = 500, description = "Storage failure", body = ErrorRes)
    )
)]
/// Receive suggestions from the automation workflow
///
/// The body is read raw so that every framing the workflow uses (arrays, `output` strings,
/// nested `body` objects) can be unwrapped. When a webhook API key is configured it must be
/// sent as `x-api-key` or as a bearer token.
///
/// # Errors
/// Returns `401 Unauthorized` if the configured API key is not presented, `400 Bad Request` if
/// the body is not JSON or lacks an issue key or suggestions.
#[axum::debug_handler]
async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> ApiResult<Json<WebhookRes>> {
    if let Some(expected) = state.service.config().webhook_api_key() {
        let provided = headers
            .get("x-api-key")
            .and_then(|v| v.to_str().ok())
            .or_else(|| {
                headers
                    .get(axum::http::header::AUTHORIZATION)
                    .and_then(|v| v.to_str().ok())
                    .and_then(bearer_token)
            });
        if let Err(e) = validate_api_key(provided, expected) {
            tracing::warn!("webhook rejected: {}", e);
            return Err((StatusCode::UNAUTHORIZED, Json(ErrorRes::new(e.to_string()))));
        }
    }

    let ingested = state.service.ingest_webhook(&body).map_err(api_error)?;
    Ok(Json(WebhookRes {
        success: true,
        message: format!("Stored suggestion for issue {}", ingested.issue_key),
    }))
}

#[utoipa::path(
    post,
    path = "/events/issue",
    request_body(content = Object, description = "Issue created/updated event"),
    responses(
        (status = 202, description = "Event accepted", body = AcceptedRes)
    )
)]
/// Forward an issue event to the automation workflow
///
/// Always answers `202 Accepted` once the event is parsed; downstream failures are logged.
#[axum::debug_handler]
async fn issue_event(
    State(state): State<AppState>,
    Json(event): Json<Value>,
) -> (StatusCode, Json<AcceptedRes>) {
    let outcome = state.service.trigger().handle_issue_event(&event).await;
    tracing::debug!("issue event outcome: {:?}", outcome);
    (StatusCode::ACCEPTED, Json(AcceptedRes { accepted: true }))
}

#[utoipa::path(
    get,
    path = "/issues/{key}/suggestions",
    params(("key" = String, Path, description = "Issue key, e.g. GS-64")),
    responses(
        (status = 200, description = "Suggestions at or above the minimum score", body = ListSuggestionsRes),
        (status = 400, description = "Invalid issue key", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// List the suggestions stored for an issue
#[axum::debug_handler]
async fn list_suggestions(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<Json<ListSuggestionsRes>> {
    let key = parse_issue_key(&key)?;
    let suggestions = state.service.list_suggestions(&key).map_err(api_error)?;
    Ok(Json(ListSuggestionsRes {
        suggestions: suggestions.into_iter().map(suggestion_res).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/issues/{key}/suggestions/{id}/apply",
    params(
        ("key" = String, Path, description = "Issue key"),
        ("id" = String, Path, description = "Suggestion id")
    ),
    request_body(content = Option<ApplySuggestionReq>),
    responses(
        (status = 200, description = "Issue updated", body = ApplySuggestionRes),
        (status = 400, description = "issueId is not a numeric id or an issue key", body = ErrorRes),
        (status = 404, description = "No such suggestion", body = ErrorRes),
        (status = 502, description = "Issue tracker rejected the update", body = ErrorRes)
    )
)]
/// Apply a stored suggestion to its issue
///
/// # Errors
/// Returns `400 Bad Request` if `issueId` is neither a numeric id nor an issue key,
/// `404 Not Found` if the issue has no suggestions or none with this id, and
/// `502 Bad Gateway` if the issue tracker rejects the update. The suggestion remains stored and
/// the apply can be retried.
#[axum::debug_handler]
async fn apply_suggestion(
    State(state): State<AppState>,
    Path((key, id)): Path<(String, String)>,
    req: Option<Json<ApplySuggestionReq>>,
) -> ApiResult<Json<ApplySuggestionRes>> {
    let key = parse_issue_key(&key)?;
    let issue_id = req.and_then(|Json(req)| req.issue_id);
    state
        .service
        .apply_suggestion(&key, issue_id.as_deref(), &id)
        .await
        .map_err(api_error)?;
    Ok(Json(ApplySuggestionRes { success: true }))
}

#[utoipa::path(
    get,
    path = "/stats/models",
    responses(
        (status = 200, description = "Applied suggestions per model", body = UsageStatsRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// Usage report
#[axum::debug_handler]
async fn usage_stats(State(state): State<AppState>) -> ApiResult<Json<UsageStatsRes>> {
    let stats = state.service.usage_stats().map_err(api_error)?;
    Ok(Json(UsageStatsRes(stats.into_inner())))
}

#[utoipa::path(
    get,
    path = "/config",
    responses(
        (status = 200, description = "Current settings", body = AppConfigDto),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn get_config(State(state): State<AppState>) -> ApiResult<Json<AppConfigDto>> {
    let settings = state.service.settings().map_err(api_error)?;
    Ok(Json(config_dto(settings)))
}

#[utoipa::path(
    put,
    path = "/config",
    request_body = AppConfigDto,
    responses(
        (status = 200, description = "Settings saved", body = AppConfigDto),
        (status = 400, description = "Invalid settings", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn save_config(
    State(state): State<AppState>,
    Json(req): Json<AppConfigDto>,
) -> ApiResult<Json<AppConfigDto>> {
    let settings = settings_from_dto(req);
    state.service.save_settings(&settings).map_err(api_error)?;
    Ok(Json(config_dto(settings)))
}

#[utoipa::path(
    post,
    path = "/config/test-connection",
    request_body = TestConnectionReq,
    responses(
        (status = 200, description = "Probe result", body = TestConnectionRes),
        (status = 400, description = "Missing URL", body = ErrorRes),
        (status = 502, description = "Connection failed", body = ErrorRes)
    )
)]
/// Probe the automation webhook URL
#[axum::debug_handler]
async fn test_connection(
    State(state): State<AppState>,
    Json(req): Json<TestConnectionReq>,
) -> ApiResult<Json<TestConnectionRes>> {
    let result = state
        .service
        .test_connection(&req.url, req.api_key.as_deref())
        .await
        .map_err(api_error)?;
    Ok(Json(TestConnectionRes {
        success: result.success,
        status: result.status,
        status_text: result.status_text,
    }))
}

#[utoipa::path(
    get,
    path = "/storage",
    params(StorageQuery),
    responses(
        (status = 200, description = "One page of stored entries", body = StoragePageRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// Browse raw storage
#[axum::debug_handler]
async fn storage(
    State(state): State<AppState>,
    Query(query): Query<StorageQuery>,
) -> ApiResult<Json<StoragePageRes>> {
    let page = state
        .service
        .storage_page(query.cursor.as_deref(), query.limit)
        .map_err(api_error)?;
    Ok(Json(StoragePageRes {
        results: page
            .results
            .into_iter()
            .map(|entry| StorageEntryRes {
                key: entry.key,
                value: entry.value,
            })
            .collect(),
        next_cursor: page.next_cursor,
    }))
}
