use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::error_response;
use crate::errors::AppError;
use crate::models::{CreatedResponse, SubmitRequest, TitleResponse};
use crate::service::session_service::SessionService;

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET `/api/session` — conversations, selection and display state
pub async fn session_handler(State(svc): State<SessionService>) -> Response {
    snapshot_response(&svc).await
}

/// GET `/api/conversations` — stored conversations, newest first
pub async fn list_conversations_handler(State(svc): State<SessionService>) -> Response {
    match svc.conversations().await {
        Ok(conversations) => Json(conversations).into_response(),
        Err(e) => error_response(&e),
    }
}

/// POST `/api/conversations` — start an empty conversation and select it
pub async fn create_conversation_handler(State(svc): State<SessionService>) -> impl IntoResponse {
    let id = svc.create_conversation().await;
    (StatusCode::CREATED, Json(CreatedResponse { id }))
}

/// POST `/api/conversations/{id}/select`
pub async fn select_conversation_handler(
    Path(id): Path<String>,
    State(svc): State<SessionService>,
) -> Response {
    after(svc.select_conversation(&id).await, &svc).await
}

/// DELETE `/api/conversations/{id}`
pub async fn delete_conversation_handler(
    Path(id): Path<String>,
    State(svc): State<SessionService>,
) -> Response {
    after(svc.delete_conversation(&id).await, &svc).await
}

/// POST `/api/conversations/{id}/title` — regenerate the title now
pub async fn refresh_title_handler(
    Path(id): Path<String>,
    State(svc): State<SessionService>,
) -> Response {
    match svc.refresh_title(&id).await {
        Ok(title) => Json(TitleResponse { title }).into_response(),
        Err(e) => error_response(&e),
    }
}

/// POST `/api/session/messages` — one full exchange in the selected (or a new) conversation
pub async fn submit_handler(
    State(svc): State<SessionService>,
    Json(body): Json<SubmitRequest>,
) -> Response {
    match svc.submit(body.conversation_id, body.message).await {
        Ok(reply) => Json(reply).into_response(),
        Err(e) => error_response(&e),
    }
}

// ── Helper ────────────────────────────────────────────────────────────────────

async fn after(outcome: Result<(), AppError>, svc: &SessionService) -> Response {
    match outcome {
        Ok(()) => snapshot_response(svc).await,
        Err(e) => error_response(&e),
    }
}

async fn snapshot_response(svc: &SessionService) -> Response {
    match svc.snapshot().await {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(e) => error_response(&e),
    }
}
