use thiserror::Error;

/// Top-level application error.
/// All variants carry a human-readable message for display/logging.
#[derive(Debug, Error)]
pub enum AppError {
    // ── Configuration errors ─────────────────────────────────────────────────
    #[error("Gemini API URL or Key not set")]
    ConfigurationMissing,

    #[error("Failed to read catalog at '{path}'")]
    CatalogRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid catalog data: {0}")]
    CatalogParse(#[source] serde_json::Error),

    // ── Model endpoint errors ────────────────────────────────────────────────
    #[error("Model endpoint returned {status}: {body}")]
    UpstreamFailure { status: u16, body: String },

    #[error("Model endpoint request failed: {0}")]
    UpstreamRequest(#[source] reqwest::Error),

    // ── Database errors ──────────────────────────────────────────────────────
    #[error("Database query failed: {message}")]
    DatabaseQueryFailed {
        message: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Stored conversation '{id}' is malformed: {reason}")]
    CorruptRecord { id: String, reason: String },

    // ── Validation errors ────────────────────────────────────────────────────
    #[error("Field '{field_name}' cannot be empty")]
    EmptyField { field_name: String },

    #[error("Field '{field_name}' exceeds max length of {max_length} (actual: {actual_length})")]
    FieldTooLong { field_name: String, max_length: usize, actual_length: usize },

    // ── Conversation errors ──────────────────────────────────────────────────
    #[error("Conversation '{id}' not found")]
    ConversationNotFound { id: String },

    // ── System errors ────────────────────────────────────────────────────────
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AppError {
    pub fn db_query(message: impl Into<String>, source: sqlx::Error) -> Self {
        AppError::DatabaseQueryFailed { message: message.into(), source }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::ConversationNotFound { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::EmptyField { .. } | AppError::FieldTooLong { .. })
    }

    /// Text placed in the `{error}` body returned to clients.
    /// Upstream failures pass the model endpoint's body through untouched.
    pub fn client_message(&self) -> String {
        match self {
            AppError::UpstreamFailure { body, .. } => body.clone(),
            other => other.to_string(),
        }
    }
}
