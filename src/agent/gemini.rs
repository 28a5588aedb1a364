use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error};

use super::{CompletionBackend, GenerateRequest, GenerateResponse};
use crate::errors::AppError;

/// Full `generateContent` URL plus the key sent as the `key` query parameter.
#[derive(Debug, Clone)]
pub struct GeminiEndpoint {
    pub url: String,
    pub api_key: String,
}

/// [`CompletionBackend`] speaking the Gemini REST protocol over reqwest.
/// Without an endpoint every call fails with a configuration error.
#[derive(Clone)]
pub struct GeminiBackend {
    client: Client,
    endpoint: Option<GeminiEndpoint>,
}

impl GeminiBackend {
    pub fn new(endpoint: Option<GeminiEndpoint>) -> Self {
        Self { client: Client::new(), endpoint }
    }
}

#[async_trait]
impl CompletionBackend for GeminiBackend {
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, AppError> {
        let endpoint = self.endpoint.as_ref().ok_or(AppError::ConfigurationMissing)?;

        debug!("Sending {} turns to model endpoint", request.contents.len());
        let response = self
            .client
            .post(&endpoint.url)
            .query(&[("key", endpoint.api_key.as_str())])
            .json(request)
            .send()
            .await
            .map_err(|e| {
                error!("Model endpoint request failed: {e}");
                AppError::UpstreamRequest(e)
            })?;

        let status = response.status();
        debug!("Model endpoint responded with {status}");
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Model endpoint returned {status}: {body}");
            return Err(AppError::UpstreamFailure { status: status.as_u16(), body });
        }

        response.json::<GenerateResponse>().await.map_err(|e| {
            error!("Failed to decode model response: {e}");
            AppError::UpstreamRequest(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{ShoppingAgent, FALLBACK_REPLY};
    use crate::models::{Message, StructuredResult};
    use serde_json::json;
    use std::sync::Arc;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn endpoint(server: &MockServer) -> GeminiEndpoint {
        GeminiEndpoint {
            url: format!("{}/v1beta/models/test:generateContent", server.uri()),
            api_key: "secret".to_string(),
        }
    }

    #[tokio::test]
    async fn missing_configuration_fails_before_network() {
        let agent = ShoppingAgent::new(Arc::new(GeminiBackend::new(None)));
        let err = agent.respond(&[Message::user("hello")]).await.unwrap_err();
        assert!(matches!(err, AppError::ConfigurationMissing));
    }

    #[tokio::test]
    async fn posts_contents_with_key_and_reads_first_candidate() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/test:generateContent"))
            .and(query_param("key", "secret"))
            .and(body_partial_json(json!({
                "contents": [
                    {"role": "model"},
                    {"role": "user", "parts": [{"text": "hello"}]}
                ],
                "generationConfig": {"temperature": 0.2}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "Hi there!"}]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let agent = ShoppingAgent::new(Arc::new(GeminiBackend::new(Some(endpoint(&server)))));
        let result = agent.respond(&[Message::user("hello")]).await.unwrap();
        assert_eq!(result, StructuredResult::Text { content: "Hi there!".into() });
    }

    #[tokio::test]
    async fn null_lists_in_success_body_become_apology() {
        for body in [
            json!({"candidates": null}),
            json!({"candidates": [{"content": {"parts": null}}]}),
        ] {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(200).set_body_json(body))
                .mount(&server)
                .await;

            let agent = ShoppingAgent::new(Arc::new(GeminiBackend::new(Some(endpoint(&server)))));
            let result = agent.respond(&[Message::user("hello")]).await.unwrap();
            assert_eq!(result, StructuredResult::Text { content: FALLBACK_REPLY.into() });
        }
    }

    #[tokio::test]
    async fn non_success_status_surfaces_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("API key not valid"))
            .mount(&server)
            .await;

        let backend = GeminiBackend::new(Some(endpoint(&server)));
        let err = ShoppingAgent::new(Arc::new(backend))
            .respond(&[Message::user("hello")])
            .await
            .unwrap_err();
        match err {
            AppError::UpstreamFailure { status, body } => {
                assert_eq!(status, 400);
                assert_eq!(body, "API key not valid");
            }
            other => panic!("expected upstream failure, got {other:?}"),
        }
    }
}
