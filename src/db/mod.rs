pub mod conversation_repository;
pub mod local_store;

use async_trait::async_trait;

use crate::errors::AppError;
use crate::models::Conversation;

pub use conversation_repository::ConversationRepository;
pub use local_store::LocalConversationStore;

/// Persistence collaborator for conversations.
/// The session logic only talks to this trait, never to a concrete backing.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// All conversations, newest `created_at` first.
    async fn list(&self) -> Result<Vec<Conversation>, AppError>;
    async fn create(&self, conversation: &Conversation) -> Result<(), AppError>;
    async fn update(&self, conversation: &Conversation) -> Result<(), AppError>;
    async fn delete(&self, id: &str) -> Result<(), AppError>;
}
