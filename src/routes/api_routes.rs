use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use uuid::Uuid;

use super::error_response;
use crate::catalog::ProductQuery;
use crate::models::{ChatReply, MessagesRequest, TitleResponse};
use crate::service::session_service::SessionService;

/// POST `/api/chat` — resolves the latest user turn locally or via the model
pub async fn chat_handler(
    State(svc): State<SessionService>,
    Json(body): Json<MessagesRequest>,
) -> Response {
    match svc.chat().respond(&body.messages).await {
        Ok(result) => Json(ChatReply::new(Uuid::new_v4().to_string(), result)).into_response(),
        Err(err) => error_response(&err),
    }
}

/// POST `/api/generate-title` — short title for a conversation
pub async fn generate_title_handler(
    State(svc): State<SessionService>,
    Json(body): Json<MessagesRequest>,
) -> Response {
    match svc.chat().generate_title(&body.messages).await {
        Ok(title) => Json(TitleResponse { title }).into_response(),
        Err(err) => error_response(&err),
    }
}

/// GET `/api/products` — catalog browsing with filters and sorting
pub async fn list_products_handler(
    State(svc): State<SessionService>,
    Query(query): Query<ProductQuery>,
) -> impl IntoResponse {
    Json(svc.chat().catalog().browse(&query))
}

/// GET `/api/categories` — distinct catalog categories with counts
pub async fn list_categories_handler(State(svc): State<SessionService>) -> impl IntoResponse {
    Json(svc.chat().catalog().categories())
}

#[cfg(test)]
mod tests {
    use crate::agent::testing::StubBackend;
    use crate::agent::{GeminiBackend, ShoppingAgent};
    use crate::db::LocalConversationStore;
    use crate::intent::IntentResolver;
    use crate::routes::build_router;
    use crate::routes::testing::{json_body, post_json};
    use crate::service::chat_service::testing::chat_service;
    use crate::service::chat_service::ChatService;
    use crate::service::session_service::SessionService;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app(backend: StubBackend) -> axum::Router {
        let svc = SessionService::new(
            Arc::new(LocalConversationStore::new()),
            chat_service(Arc::new(backend)),
        );
        build_router(svc)
    }

    fn unconfigured_app() -> axum::Router {
        let chat = ChatService::new(
            Arc::new(crate::service::chat_service::testing::catalog()),
            IntentResolver::standard(),
            ShoppingAgent::new(Arc::new(GeminiBackend::new(None))),
        );
        build_router(SessionService::new(Arc::new(LocalConversationStore::new()), chat))
    }

    #[tokio::test]
    async fn chat_returns_products_for_local_intent() {
        let response = app(StubBackend::default())
            .oneshot(post_json(
                "/api/chat",
                json!({"messages": [{"id": "1", "role": "user", "content": "Show me the widget"}]}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["role"], "assistant");
        assert_eq!(body["products"][0]["name"], "Widget");
        assert!(body.get("categories").is_none());
    }

    #[tokio::test]
    async fn chat_falls_back_to_model_text() {
        let response = app(StubBackend::replying(&["We only sell toys and gadgets."]))
            .oneshot(post_json(
                "/api/chat",
                json!({"messages": [{"role": "user", "content": "who won the game?"}]}),
            ))
            .await
            .unwrap();

        let body = json_body(response).await;
        assert_eq!(body["content"], "We only sell toys and gadgets.");
        assert!(body.get("products").is_none());
    }

    #[tokio::test]
    async fn missing_model_configuration_is_500_with_error_body() {
        for uri in ["/api/chat", "/api/generate-title"] {
            let response = unconfigured_app()
                .oneshot(post_json(
                    uri,
                    json!({"messages": [{"role": "user", "content": "tell me a joke"}]}),
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(json_body(response).await, json!({"error": "Gemini API URL or Key not set"}));
        }
    }

    #[tokio::test]
    async fn generate_title_returns_clean_title() {
        let response = app(StubBackend::replying(&["# Widget Questions"]))
            .oneshot(post_json(
                "/api/generate-title",
                json!({"messages": [{"role": "user", "content": "tell me about widgets"}]}),
            ))
            .await
            .unwrap();
        assert_eq!(json_body(response).await, json!({"title": "Widget Questions"}));
    }

    #[tokio::test]
    async fn products_endpoint_applies_query() {
        let request = Request::builder()
            .uri("/api/products?maxPrice=20&sort=price-high")
            .body(Body::empty())
            .unwrap();
        let response = app(StubBackend::default()).oneshot(request).await.unwrap();
        let body = json_body(response).await;
        assert_eq!(body.as_array().map(Vec::len), Some(1));
        assert_eq!(body[0]["name"], "Widget");
    }
}
