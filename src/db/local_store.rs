use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use super::ConversationStore;
use crate::errors::AppError;
use crate::models::{Conversation, ConversationRecord};

/// In-process store keeping every conversation in one serialized JSON
/// document, the way a browser keeps them under a single local-storage key.
#[derive(Default)]
pub struct LocalConversationStore {
    document: Mutex<String>,
}

impl LocalConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn decode(document: &str) -> Result<Vec<ConversationRecord>, AppError> {
        if document.is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(document)?)
    }

    async fn modify(
        &self,
        apply: impl FnOnce(&mut Vec<ConversationRecord>),
    ) -> Result<(), AppError> {
        let mut document = self.document.lock().await;
        let mut records = Self::decode(&document)?;
        apply(&mut records);
        *document = serde_json::to_string(&records)?;
        debug!("Local store now holds {} conversations", records.len());
        Ok(())
    }
}

#[async_trait]
impl ConversationStore for LocalConversationStore {
    async fn list(&self) -> Result<Vec<Conversation>, AppError> {
        let records = Self::decode(&*self.document.lock().await)?;
        let mut conversations = records
            .into_iter()
            .map(ConversationRecord::into_conversation)
            .collect::<Result<Vec<_>, _>>()?;
        conversations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(conversations)
    }

    async fn create(&self, conversation: &Conversation) -> Result<(), AppError> {
        let record = conversation.to_record()?;
        self.modify(|records| records.insert(0, record)).await
    }

    async fn update(&self, conversation: &Conversation) -> Result<(), AppError> {
        let record = conversation.to_record()?;
        let mut missing = false;
        self.modify(|records| match records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record,
            None => missing = true,
        })
        .await?;
        if missing {
            return Err(AppError::ConversationNotFound { id: conversation.id.clone() });
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        self.modify(|records| records.retain(|r| r.id != id)).await
    }
}
