use std::sync::Arc;

use tracing::{debug, info};

use crate::agent::ShoppingAgent;
use crate::catalog::Catalog;
use crate::errors::AppError;
use crate::intent::IntentResolver;
use crate::models::{Message, MessageRole, StructuredResult};

/// Answers a conversation turn: local intents first, remote model otherwise.
#[derive(Clone)]
pub struct ChatService {
    catalog: Arc<Catalog>,
    resolver: Arc<IntentResolver>,
    agent: ShoppingAgent,
}

impl ChatService {
    pub fn new(catalog: Arc<Catalog>, resolver: IntentResolver, agent: ShoppingAgent) -> Self {
        Self { catalog, resolver: Arc::new(resolver), agent }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub async fn respond(&self, messages: &[Message]) -> Result<StructuredResult, AppError> {
        let utterance = messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default();

        if let Some(result) = self.resolver.resolve(utterance, self.catalog.products()) {
            return Ok(result);
        }

        info!("No local intent matched, falling back to the model ({} messages)", messages.len());
        let result = self.agent.respond(messages).await?;
        debug!("Model replied with {} characters", result.content().len());
        Ok(result)
    }

    pub async fn generate_title(&self, messages: &[Message]) -> Result<String, AppError> {
        self.agent.generate_title(messages).await
    }
}
