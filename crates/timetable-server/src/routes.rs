//! HTTP routes.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};

use timetable_core::Import;
use timetable_protocol::{
    EventsResponse, HealthResponse, ImportRequest, ImportResponse, ManualEventRequest,
};

use crate::error::{ServerError, ServerResult};
use crate::service::ImportService;

pub fn router(service: ImportService) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        .route("/events", get(list_events))
        .route("/events/manual", post(add_manual_event))
        .route("/import/ical", post(import_ical))
        .route("/imports", get(list_imports))
        .with_state(service);

    Router::new().nest("/api", api)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

async fn list_events(State(service): State<ImportService>) -> ServerResult<Json<EventsResponse>> {
    let events = service.list_events().await?;
    Ok(Json(EventsResponse::new(events)))
}

async fn import_ical(
    State(service): State<ImportService>,
    body: Result<Json<ImportRequest>, JsonRejection>,
) -> ServerResult<Json<ImportResponse>> {
    let Json(request) = body.map_err(rejected)?;
    let outcome = service.import_feed(&request.url).await?;

    Ok(Json(ImportResponse::new(
        outcome.summary.import_id,
        outcome.summary.imported_count,
        outcome.events,
    )))
}

async fn add_manual_event(
    State(service): State<ImportService>,
    body: Result<Json<ManualEventRequest>, JsonRejection>,
) -> ServerResult<Json<EventsResponse>> {
    let Json(request) = body.map_err(rejected)?;
    let events = service.add_manual(request).await?;
    Ok(Json(EventsResponse::new(events)))
}

async fn list_imports(State(service): State<ImportService>) -> ServerResult<Json<Vec<Import>>> {
    Ok(Json(service.list_imports().await?))
}

fn rejected(rejection: JsonRejection) -> ServerError {
    ServerError::bad_request(rejection.body_text())
}
