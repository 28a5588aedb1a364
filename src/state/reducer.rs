use crate::models::{Conversation, DisplayPayload, Message};

pub const DEFAULT_TITLE: &str = "New Chat";
const TITLE_MAX_CHARS: usize = 30;

/// Conversation collection plus what the client is currently looking at.
///
/// `messages` and `display` mirror the current conversation; they are
/// rehydrated whenever the selection changes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatState {
    /// Newest first.
    pub conversations: Vec<Conversation>,
    pub current_id: Option<String>,
    pub messages: Vec<Message>,
    pub display: Option<DisplayPayload>,
}

impl ChatState {
    pub fn conversation(&self, id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    pub fn current(&self) -> Option<&Conversation> {
        self.current_id.as_deref().and_then(|id| self.conversation(id))
    }

    fn conversation_mut(&mut self, id: &str) -> Option<&mut Conversation> {
        self.conversations.iter_mut().find(|c| c.id == id)
    }

    fn is_current(&self, id: &str) -> bool {
        self.current_id.as_deref() == Some(id)
    }

    /// Points the selection at `id` (or nothing) and copies its messages and display.
    fn hydrate(&mut self, id: Option<String>) {
        let selected = id.as_deref().and_then(|id| self.conversation(id)).cloned();
        match selected {
            Some(conv) => {
                self.current_id = Some(conv.id);
                self.messages = conv.messages;
                self.display = conv.display;
            }
            None => {
                self.current_id = None;
                self.messages.clear();
                self.display = None;
            }
        }
    }

    fn sync_current(&mut self, id: &str) {
        if self.is_current(id) {
            self.hydrate(Some(id.to_string()));
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    /// Store contents at start, newest first. The head becomes current.
    ConversationsLoaded(Vec<Conversation>),
    ConversationCreated(Conversation),
    UserSubmitted { conversation_id: String, message: Message },
    /// Assistant turn plus its payload; `None` clears the display.
    AssistantResolved {
        conversation_id: String,
        message: Message,
        display: Option<DisplayPayload>,
    },
    ConversationSelected { id: String },
    ConversationDeleted { id: String },
    /// Generated title; overwrites whatever is there.
    TitleRefreshed { conversation_id: String, title: String },
}

/// First 30 characters of `text`, with `"..."` appended only when it was longer.
pub fn truncate_title(text: &str) -> String {
    let mut title: String = text.chars().take(TITLE_MAX_CHARS).collect();
    if text.chars().count() > TITLE_MAX_CHARS {
        title.push_str("...");
    }
    title
}

/// Applies one event. Events naming an unknown conversation leave the state as is.
pub fn reduce(mut state: ChatState, event: ChatEvent) -> ChatState {
    match event {
        ChatEvent::ConversationsLoaded(conversations) => {
            let head = conversations.first().map(|c| c.id.clone());
            state.conversations = conversations;
            state.hydrate(head);
        }
        ChatEvent::ConversationCreated(conversation) => {
            let id = conversation.id.clone();
            state.conversations.insert(0, conversation);
            state.hydrate(Some(id));
        }
        ChatEvent::UserSubmitted { conversation_id, message } => {
            if let Some(conv) = state.conversation_mut(&conversation_id) {
                conv.messages.push(message);
                state.sync_current(&conversation_id);
            }
        }
        ChatEvent::AssistantResolved { conversation_id, message, display } => {
            if let Some(conv) = state.conversation_mut(&conversation_id) {
                conv.messages.push(message);
                conv.display = display;
                if conv.title == DEFAULT_TITLE {
                    let truncated = conv.first_user_message().map(|m| truncate_title(&m.content));
                    if let Some(title) = truncated {
                        conv.title = title;
                    }
                }
                state.sync_current(&conversation_id);
            }
        }
        ChatEvent::ConversationSelected { id } => {
            if state.conversation(&id).is_some() {
                state.hydrate(Some(id));
            }
        }
        ChatEvent::ConversationDeleted { id } => {
            state.conversations.retain(|c| c.id != id);
            if state.is_current(&id) {
                let head = state.conversations.first().map(|c| c.id.clone());
                state.hydrate(head);
            }
        }
        ChatEvent::TitleRefreshed { conversation_id, title } => {
            if let Some(conv) = state.conversation_mut(&conversation_id) {
                conv.title = title;
            }
        }
    }
    state
}
