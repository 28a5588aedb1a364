use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::db::ConversationStore;
use crate::errors::AppError;
use crate::models::{
    ChatReply, Conversation, ConversationRecord, DisplayType, Message, StructuredResult,
};
use crate::service::chat_service::ChatService;
use crate::state::{reduce, ChatEvent, ChatState, DEFAULT_TITLE};

const MAX_MESSAGE_LENGTH: usize = 8000;

/// What a client needs to render the chat screen.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub conversations: Vec<ConversationRecord>,
    pub current_conversation_id: Option<String>,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_type: Option<DisplayType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_data: Option<Value>,
}

impl SessionSnapshot {
    fn from_state(state: &ChatState) -> Result<Self, AppError> {
        let conversations = state
            .conversations
            .iter()
            .map(Conversation::to_record)
            .collect::<Result<Vec<_>, _>>()?;
        let (display_type, display_data) = match &state.display {
            Some(payload) => (Some(payload.display_type()), Some(payload.to_data()?)),
            None => (None, None),
        };
        Ok(Self {
            conversations,
            current_conversation_id: state.current_id.clone(),
            messages: state.messages.clone(),
            display_type,
            display_data,
        })
    }
}

/// Store write that follows a reduced event.
enum Persist {
    Create(Conversation),
    Update(Conversation),
    Delete(String),
}

/// Owns the conversation state: every change goes through [`reduce`], and the
/// touched conversation is then written to the store.
///
/// Store failures are logged and swallowed, so memory and store can drift
/// apart until the next successful write.
#[derive(Clone)]
pub struct SessionService {
    state: Arc<Mutex<ChatState>>,
    store: Arc<dyn ConversationStore>,
    chat: ChatService,
}

impl SessionService {
    pub fn new(store: Arc<dyn ConversationStore>, chat: ChatService) -> Self {
        Self { state: Arc::new(Mutex::new(ChatState::default())), store, chat }
    }

    pub fn chat(&self) -> &ChatService {
        &self.chat
    }

    /// Hydrates from the store; on failure the session starts empty.
    pub async fn load(&self) {
        match self.store.list().await {
            Ok(conversations) => {
                info!("Loaded {} stored conversations", conversations.len());
                self.dispatch(ChatEvent::ConversationsLoaded(conversations)).await;
            }
            Err(e) => error!("Failed to load conversations: {e}"),
        }
    }

    pub async fn state(&self) -> ChatState {
        self.state.lock().await.clone()
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, AppError> {
        SessionSnapshot::from_state(&self.state().await)
    }

    pub async fn conversations(&self) -> Result<Vec<ConversationRecord>, AppError> {
        let state = self.state.lock().await;
        state.conversations.iter().map(Conversation::to_record).collect()
    }

    pub async fn create_conversation(&self) -> String {
        let conversation = Conversation::new(Uuid::new_v4().to_string(), DEFAULT_TITLE);
        let id = conversation.id.clone();
        self.dispatch(ChatEvent::ConversationCreated(conversation.clone())).await;
        self.persist(Persist::Create(conversation)).await;
        id
    }

    pub async fn append_user_message(
        &self,
        conversation_id: &str,
        text: impl Into<String>,
    ) -> Result<Message, AppError> {
        let message = Message::user(text);
        let event = ChatEvent::UserSubmitted {
            conversation_id: conversation_id.to_string(),
            message: message.clone(),
        };
        let updated = self.dispatch_existing(conversation_id, event).await?;
        self.persist(Persist::Update(updated)).await;
        Ok(message)
    }

    pub async fn apply_assistant_result(
        &self,
        conversation_id: &str,
        result: &StructuredResult,
    ) -> Result<Message, AppError> {
        let message = Message::assistant(result.content());
        let event = ChatEvent::AssistantResolved {
            conversation_id: conversation_id.to_string(),
            message: message.clone(),
            display: result.display(),
        };
        let updated = self.dispatch_existing(conversation_id, event).await?;
        self.persist(Persist::Update(updated)).await;
        Ok(message)
    }

    pub async fn select_conversation(&self, id: &str) -> Result<(), AppError> {
        self.dispatch_existing(id, ChatEvent::ConversationSelected { id: id.to_string() })
            .await
            .map(|_| ())
    }

    pub async fn delete_conversation(&self, id: &str) -> Result<(), AppError> {
        self.dispatch_existing(id, ChatEvent::ConversationDeleted { id: id.to_string() })
            .await?;
        self.persist(Persist::Delete(id.to_string())).await;
        Ok(())
    }

    /// Asks the model for a fresh title and stores it, whatever the current title is.
    pub async fn refresh_title(&self, conversation_id: &str) -> Result<String, AppError> {
        let messages = {
            let state = self.state.lock().await;
            state
                .conversation(conversation_id)
                .map(|c| c.messages.clone())
                .ok_or_else(|| AppError::ConversationNotFound { id: conversation_id.to_string() })?
        };
        let title = self.chat.generate_title(&messages).await?;
        let event = ChatEvent::TitleRefreshed {
            conversation_id: conversation_id.to_string(),
            title: title.clone(),
        };
        // The conversation may have been deleted while the model was answering.
        match self.dispatch_existing(conversation_id, event).await {
            Ok(updated) => self.persist(Persist::Update(updated)).await,
            Err(e) => warn!("Dropping generated title: {e}"),
        }
        Ok(title)
    }

    /// Periodic tick body: retitles the current conversation if it has messages.
    pub async fn refresh_current_title(&self) -> Result<Option<String>, AppError> {
        let current = {
            let state = self.state.lock().await;
            state.current().filter(|c| !c.messages.is_empty()).map(|c| c.id.clone())
        };
        match current {
            Some(id) => self.refresh_title(&id).await.map(Some),
            None => Ok(None),
        }
    }

    /// One full exchange: create the conversation if needed, record the user
    /// turn, resolve locally or remotely, record the assistant turn.
    pub async fn submit(
        &self,
        conversation_id: Option<String>,
        text: String,
    ) -> Result<ChatReply, AppError> {
        if text.trim().is_empty() {
            return Err(AppError::EmptyField { field_name: "message".to_string() });
        }
        if text.len() > MAX_MESSAGE_LENGTH {
            return Err(AppError::FieldTooLong {
                field_name: "message".to_string(),
                max_length: MAX_MESSAGE_LENGTH,
                actual_length: text.len(),
            });
        }

        let current = self.state.lock().await.current_id.clone();
        let conversation_id = match conversation_id.or(current) {
            Some(id) => id,
            None => self.create_conversation().await,
        };

        self.append_user_message(&conversation_id, text).await?;
        let history = {
            let state = self.state.lock().await;
            state
                .conversation(&conversation_id)
                .map(|c| c.messages.clone())
                .unwrap_or_default()
        };

        let result = self.chat.respond(&history).await?;
        let message = self.apply_assistant_result(&conversation_id, &result).await?;
        Ok(ChatReply::new(message.id, result))
    }

    async fn dispatch(&self, event: ChatEvent) {
        let mut state = self.state.lock().await;
        *state = reduce(std::mem::take(&mut *state), event);
    }

    /// Reduces `event` if `id` exists and returns the conversation afterwards
    /// (its pre-event copy for deletions).
    async fn dispatch_existing(&self, id: &str, event: ChatEvent) -> Result<Conversation, AppError> {
        let mut state = self.state.lock().await;
        let before = state
            .conversation(id)
            .cloned()
            .ok_or_else(|| AppError::ConversationNotFound { id: id.to_string() })?;
        *state = reduce(std::mem::take(&mut *state), event);
        Ok(state.conversation(id).cloned().unwrap_or(before))
    }

    async fn persist(&self, op: Persist) {
        let outcome = match &op {
            Persist::Create(conv) => self.store.create(conv).await,
            Persist::Update(conv) => self.store.update(conv).await,
            Persist::Delete(id) => self.store.delete(id).await,
        };
        if let Err(e) = outcome {
            error!("Failed to persist conversation change: {e}");
        }
    }
}
