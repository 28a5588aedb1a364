pub mod api_routes;
pub mod session_routes;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::errors::AppError;
use crate::models::ErrorBody;
use crate::service::session_service::SessionService;
use api_routes::{chat_handler, generate_title_handler, list_categories_handler, list_products_handler};
use session_routes::{
    create_conversation_handler, delete_conversation_handler, list_conversations_handler,
    refresh_title_handler, select_conversation_handler, session_handler, submit_handler,
};

pub fn build_router(svc: SessionService) -> Router {
    Router::new()
        // Stateless chat contract
        .route("/api/chat", post(chat_handler))
        .route("/api/generate-title", post(generate_title_handler))
        // Catalog
        .route("/api/products", get(list_products_handler))
        .route("/api/categories", get(list_categories_handler))
        // Session
        .route("/api/session", get(session_handler))
        .route("/api/session/messages", post(submit_handler))
        .route(
            "/api/conversations",
            get(list_conversations_handler).post(create_conversation_handler),
        )
        .route("/api/conversations/{id}", delete(delete_conversation_handler))
        .route("/api/conversations/{id}/select", post(select_conversation_handler))
        .route("/api/conversations/{id}/title", post(refresh_title_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(svc)
}

pub(crate) fn error_response(err: &AppError) -> Response {
    let status = if err.is_validation() {
        StatusCode::BAD_REQUEST
    } else if err.is_not_found() {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    (status, Json(ErrorBody { error: err.client_message() })).into_response()
}

#[cfg(test)]
pub(crate) mod testing {
    use axum::body::Body;
    use axum::http::{header, Method, Request};
    use axum::response::Response;
    use serde_json::Value;

    pub fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    pub async fn json_body(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }
}
