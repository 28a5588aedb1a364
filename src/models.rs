use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::AppError;

// ── Catalog ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: u64,
    pub name: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<f64>,
    pub category: String,
    pub description: String,
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub name: String,
    pub count: u32,
}

impl CategorySummary {
    pub fn new(name: impl Into<String>, count: u32) -> Self {
        Self { name: name.into(), count }
    }
}

// ── Messages ──────────────────────────────────────────────────────────────────

/// Anything other than `user` on the wire is treated as an assistant turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for MessageRole {
    fn from(s: String) -> Self {
        if s.eq_ignore_ascii_case("user") {
            MessageRole::User
        } else {
            MessageRole::Assistant
        }
    }
}

fn new_message_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default = "new_message_id")]
    pub id: String,
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self { id: new_message_id(), role, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

// ── Resolution results ────────────────────────────────────────────────────────

/// Reply shape shared by local intent resolution and the remote fallback.
#[derive(Debug, Clone, PartialEq)]
pub enum StructuredResult {
    Products { content: String, products: Vec<Product> },
    Categories { content: String, categories: Vec<CategorySummary> },
    Comparison { content: String, products: Vec<Product> },
    Text { content: String },
}

impl StructuredResult {
    pub fn content(&self) -> &str {
        match self {
            StructuredResult::Products { content, .. }
            | StructuredResult::Categories { content, .. }
            | StructuredResult::Comparison { content, .. }
            | StructuredResult::Text { content } => content,
        }
    }

    /// Payload to attach to the assistant turn; `Text` carries none.
    pub fn display(&self) -> Option<DisplayPayload> {
        match self {
            StructuredResult::Products { products, .. } => {
                Some(DisplayPayload::Products(products.clone()))
            }
            StructuredResult::Categories { categories, .. } => {
                Some(DisplayPayload::Categories(categories.clone()))
            }
            StructuredResult::Comparison { products, .. } => {
                Some(DisplayPayload::Comparison(products.clone()))
            }
            StructuredResult::Text { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayType {
    Products,
    Categories,
    Comparison,
}

impl DisplayType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayType::Products => "products",
            DisplayType::Categories => "categories",
            DisplayType::Comparison => "comparison",
        }
    }
}

impl TryFrom<String> for DisplayType {
    type Error = String;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.as_str() {
            "products" => Ok(DisplayType::Products),
            "categories" => Ok(DisplayType::Categories),
            "comparison" => Ok(DisplayType::Comparison),
            other => Err(format!("Unknown display type: {other}")),
        }
    }
}

/// Products/categories/comparison data attached to the latest assistant turn.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayPayload {
    Products(Vec<Product>),
    Categories(Vec<CategorySummary>),
    Comparison(Vec<Product>),
}

impl DisplayPayload {
    pub fn display_type(&self) -> DisplayType {
        match self {
            DisplayPayload::Products(_) => DisplayType::Products,
            DisplayPayload::Categories(_) => DisplayType::Categories,
            DisplayPayload::Comparison(_) => DisplayType::Comparison,
        }
    }

    pub fn to_data(&self) -> Result<Value, serde_json::Error> {
        match self {
            DisplayPayload::Products(p) | DisplayPayload::Comparison(p) => serde_json::to_value(p),
            DisplayPayload::Categories(c) => serde_json::to_value(c),
        }
    }

    pub fn from_parts(kind: DisplayType, data: Value) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            DisplayType::Products => DisplayPayload::Products(serde_json::from_value(data)?),
            DisplayType::Categories => DisplayPayload::Categories(serde_json::from_value(data)?),
            DisplayType::Comparison => DisplayPayload::Comparison(serde_json::from_value(data)?),
        })
    }
}

// ── Conversations ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    pub id: String,
    pub title: String,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub display: Option<DisplayPayload>,
}

impl Conversation {
    pub fn new(id: String, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            messages: Vec::new(),
            created_at: Utc::now(),
            display: None,
        }
    }

    pub fn first_user_message(&self) -> Option<&Message> {
        self.messages.iter().find(|m| m.role == MessageRole::User)
    }

    pub fn to_record(&self) -> Result<ConversationRecord, AppError> {
        let (display_type, display_data) = match &self.display {
            Some(payload) => (Some(payload.display_type()), Some(payload.to_data()?)),
            None => (None, None),
        };
        Ok(ConversationRecord {
            id: self.id.clone(),
            title: self.title.clone(),
            messages: self.messages.clone(),
            created_at: self.created_at,
            display_type,
            display_data,
        })
    }
}

/// Flat persisted/wire form of a [`Conversation`], mirroring the table columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationRecord {
    pub id: String,
    pub title: String,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_type: Option<DisplayType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_data: Option<Value>,
}

impl ConversationRecord {
    pub fn into_conversation(self) -> Result<Conversation, AppError> {
        let display = match (self.display_type, self.display_data) {
            (Some(kind), Some(data)) => Some(DisplayPayload::from_parts(kind, data).map_err(|e| {
                AppError::CorruptRecord { id: self.id.clone(), reason: e.to_string() }
            })?),
            _ => None,
        };
        Ok(Conversation {
            id: self.id,
            title: self.title,
            messages: self.messages,
            created_at: self.created_at,
            display,
        })
    }
}

// ── HTTP bodies ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MessagesRequest {
    #[serde(default)]
    pub messages: Vec<Message>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    #[serde(default)]
    pub conversation_id: Option<String>,
    pub message: String,
}

/// Assistant reply body: `{id, role, content, products?|categories?|comparison?}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatReply {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub products: Option<Vec<Product>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<CategorySummary>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<Vec<Product>>,
}

impl ChatReply {
    pub fn new(id: String, result: StructuredResult) -> Self {
        let mut reply = Self {
            id,
            role: MessageRole::Assistant,
            content: result.content().to_string(),
            products: None,
            categories: None,
            comparison: None,
        };
        match result {
            StructuredResult::Products { products, .. } => reply.products = Some(products),
            StructuredResult::Categories { categories, .. } => reply.categories = Some(categories),
            StructuredResult::Comparison { products, .. } => reply.comparison = Some(products),
            StructuredResult::Text { .. } => {}
        }
        reply
    }
}

#[derive(Debug, Serialize)]
pub struct TitleResponse {
    pub title: String,
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}


#[cfg(test)]
mod tests {
    use super::fixtures::product;
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn non_user_roles_read_as_assistant() {
        let msgs: Vec<Message> = serde_json::from_value(json!([
            {"id": "1", "role": "user", "content": "hi"},
            {"id": "2", "role": "system", "content": "be nice"},
            {"role": "assistant", "content": "hello"}
        ]))
        .unwrap();
        assert_eq!(msgs[0].role, MessageRole::User);
        assert_eq!(msgs[1].role, MessageRole::Assistant);
        assert!(!msgs[2].id.is_empty());
    }

    #[test]
    fn chat_reply_carries_single_payload() {
        let reply = ChatReply::new(
            "r1".into(),
            StructuredResult::Categories {
                content: "cats".into(),
                categories: vec![CategorySummary::new("Jewelry", 87)],
            },
        );
        let body = serde_json::to_value(&reply).unwrap();
        assert_eq!(
            body,
            json!({
                "id": "r1",
                "role": "assistant",
                "content": "cats",
                "categories": [{"name": "Jewelry", "count": 87}]
            })
        );
    }

    #[test]
    fn record_round_trip_keeps_display_payload() {
        let mut conv = Conversation::new("c1".into(), "Lamps");
        conv.messages.push(Message::user("compare lamps"));
        conv.display = Some(DisplayPayload::Comparison(vec![
            product(1, "Desk Lamp", 30.0, "home"),
            product(2, "Floor Lamp", 80.5, "home"),
        ]));

        let record = conv.to_record().unwrap();
        assert_eq!(record.display_type, Some(DisplayType::Comparison));
        let text = serde_json::to_string(&record).unwrap();
        let back: ConversationRecord = serde_json::from_str(&text).unwrap();
        assert_eq!(back.into_conversation().unwrap(), conv);
    }

    #[test]
    fn mismatched_display_data_is_reported() {
        let record = ConversationRecord {
            id: "c9".into(),
            title: "t".into(),
            messages: vec![],
            created_at: Utc::now(),
            display_type: Some(DisplayType::Products),
            display_data: Some(json!([{"name": "Jewelry", "count": 87}])),
        };
        let err = record.into_conversation().unwrap_err();
        assert!(matches!(err, AppError::CorruptRecord { ref id, .. } if id == "c9"));
    }
}
