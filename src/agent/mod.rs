pub mod gemini;

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::{Message, MessageRole, StructuredResult};

pub use gemini::{GeminiBackend, GeminiEndpoint};

const TEMPERATURE: f64 = 0.2;

const SHOPPING_INSTRUCTION: &str = "You are a helpful shopping assistant for an e-commerce website. \
    ONLY answer questions about the products, categories, or features available on this website. \
    If a user asks about anything outside this website or unrelated to shopping here, politely \
    refuse and redirect them to ask about the site's products. Do not answer questions about the \
    outside world, general knowledge, or anything not related to this e-commerce site.";

const TITLE_INSTRUCTION: &str = "Given the following chat conversation, generate a short, \
    descriptive, and specific human-readable title (max 8 words) that summarizes the main topic \
    or purpose of the conversation. The title should be clear, specific, and reflect the user's \
    intent. Do NOT include generic words like \"Chat\" or \"Conversation\". Only return the title, \
    nothing else.";

pub const FALLBACK_REPLY: &str = "Sorry, I could not generate a response.";
pub const FALLBACK_TITLE: &str = "Chat";

static TITLE_NOISE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[*_`#>\\-]").expect("title noise pattern is valid"));
static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

// ── generateContent wire format ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

impl Content {
    fn text(role: &str, text: &str) -> Self {
        Self { role: role.to_string(), parts: vec![Part { text: text.to_string() }] }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationConfig {
    pub temperature: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

// Gemini may send `null` where a list is expected; both decode to `None`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Option<Vec<CandidatePart>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CandidatePart {
    #[serde(default)]
    pub text: Option<String>,
}

impl GenerateResponse {
    /// Text of the first part of the first candidate, if non-empty.
    pub fn first_text(&self) -> Option<&str> {
        self.candidates
            .as_deref()?
            .first()?
            .content
            .as_ref()?
            .parts
            .as_deref()?
            .first()?
            .text
            .as_deref()
            .filter(|t| !t.is_empty())
    }
}

/// Transport to a `generateContent`-style endpoint.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, AppError>;
}

/// Builds the request: instruction turn first, then history with
/// `user` mapped to a user turn and everything else to a model turn.
fn build_request(instruction: &str, history: &[Message]) -> GenerateRequest {
    let mut contents = Vec::with_capacity(history.len() + 1);
    contents.push(Content::text("model", instruction));
    contents.extend(history.iter().map(|m| {
        let role = match m.role {
            MessageRole::User => "user",
            MessageRole::Assistant => "model",
        };
        Content::text(role, &m.content)
    }));
    GenerateRequest { contents, generation_config: GenerationConfig { temperature: TEMPERATURE } }
}

/// Strips markdown emphasis/heading/bullet characters and collapses whitespace.
pub fn clean_title(raw: &str) -> String {
    let stripped = TITLE_NOISE.replace_all(raw.trim(), "");
    let collapsed = WHITESPACE_RUN.replace_all(&stripped, " ");
    let title = collapsed.trim();
    if title.is_empty() {
        FALLBACK_TITLE.to_string()
    } else {
        title.to_string()
    }
}

/// Remote fallback used when no local intent matches.
/// Every call replays the full history; nothing is kept between calls.
#[derive(Clone)]
pub struct ShoppingAgent {
    backend: Arc<dyn CompletionBackend>,
}

impl ShoppingAgent {
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self { backend }
    }

    pub async fn respond(&self, history: &[Message]) -> Result<StructuredResult, AppError> {
        let request = build_request(SHOPPING_INSTRUCTION, history);
        let response = self.backend.generate(&request).await?;
        let content = response.first_text().unwrap_or(FALLBACK_REPLY).to_string();
        Ok(StructuredResult::Text { content })
    }

    pub async fn generate_title(&self, history: &[Message]) -> Result<String, AppError> {
        let request = build_request(TITLE_INSTRUCTION, history);
        let response = self.backend.generate(&request).await?;
        Ok(clean_title(response.first_text().unwrap_or_default()))
    }
}
