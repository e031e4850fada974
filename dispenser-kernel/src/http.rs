/**
 * DISPENSER REST API - kernel HTTP server
 *
 * ROUTES:
 * - GET  /health, /system/health    open, liveness + counters
 * - POST /qr/classify               scanned text -> ParsedQr + next action
 * - POST /qr/diagnose               scanned text -> issues + format hints
 * - POST /alerts                    AlertEvent -> dispatch outcome
 * - POST /alerts/preview            AlertEvent -> request, nothing sent
 * - GET  /channels                  Android channel definitions
 *
 * SECURITY: x-api-key must equal DISPENSER_API_KEY except on the two
 * health routes.
 */

use crate::health::{HealthTracker, KernelHealth};
use crate::models::{AlertEvent, NotificationRequest};
use crate::notify::{table, DispatchError, DispatchOutcome, Dispatcher};
use crate::qr::{self, DeviceRegistration, FormatHints, ParsedQr, ProvisioningAction, QrIssue};
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

pub const API_KEY_ENV: &str = "DISPENSER_API_KEY";

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub health_tracker: HealthTracker,
    pub api_key: Option<String>,
}

impl AppState {
    pub fn new(dispatcher: Arc<Dispatcher>, health_tracker: HealthTracker) -> Self {
        Self {
            dispatcher,
            health_tracker,
            api_key: std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ScanBody {
    data: String,
}

#[derive(Debug, Serialize)]
struct ClassifyView {
    result: ParsedQr,
    action: Option<ProvisioningAction>,
    message: String,
    registration: Option<DeviceRegistration>,
}

#[derive(Debug, Serialize)]
struct DiagnoseView {
    issues: Vec<QrIssue>,
    messages: Vec<String>,
    formats: FormatHints,
    recommendation: &'static str,
}

async fn require_api_key(State(app): State<AppState>, req: Request, next: Next) -> Result<Response, StatusCode> {
    if matches!(req.uri().path(), "/health" | "/system/health") {
        return Ok(next.run(req).await);
    }

    let Some(expected) = app.api_key.as_deref() else {
        warn!("{API_KEY_ENV} not set - API access denied");
        return Err(StatusCode::UNAUTHORIZED);
    };

    let ok = req
        .headers()
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected);

    if !ok {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(next.run(req).await)
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/system/health", get(get_system_health))
        .route("/qr/classify", post(classify_scan))
        .route("/qr/diagnose", post(diagnose_scan))
        .route("/alerts", post(dispatch_alert))
        .route("/alerts/preview", post(preview_alert))
        .route("/channels", get(list_channels))
        .layer(middleware::from_fn_with_state(app_state.clone(), require_api_key))
        .with_state(app_state)
}

async fn get_system_health(State(app): State<AppState>) -> Json<KernelHealth> {
    Json(app.health_tracker.get_health())
}

async fn classify_scan(State(app): State<AppState>, Json(body): Json<ScanBody>) -> Json<ClassifyView> {
    let result = qr::classify(&body.data);
    app.health_tracker.record_scan();
    Json(ClassifyView {
        action: result.action(),
        message: result.summary(),
        registration: DeviceRegistration::from_parsed(&result),
        result,
    })
}

async fn diagnose_scan(Json(body): Json<ScanBody>) -> Json<DiagnoseView> {
    let issues = qr::diagnose(&body.data);
    let formats = qr::detect_formats(&body.data);
    Json(DiagnoseView {
        messages: issues.iter().map(|i| i.to_string()).collect(),
        issues,
        recommendation: formats.recommendation(),
        formats,
    })
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.to_string() });
        (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response()
    }
}

async fn dispatch_alert(
    State(app): State<AppState>,
    Json(event): Json<AlertEvent>,
) -> Result<Json<DispatchOutcome>, DispatchError> {
    let result = app.dispatcher.dispatch(&event).await;
    app.health_tracker.record_dispatch(&result);
    result.map(Json)
}

async fn preview_alert(
    State(app): State<AppState>,
    Json(event): Json<AlertEvent>,
) -> Result<Json<NotificationRequest>, DispatchError> {
    app.dispatcher.preview(&event).map(Json)
}

async fn list_channels() -> Json<&'static [table::ChannelSpec]> {
    Json(table::channels())
}
