use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use tracing::error;

use super::ConversationStore;
use crate::errors::AppError;
use crate::models::{Conversation, ConversationRecord, DisplayType, Message};

/// Postgres-backed [`ConversationStore`] over the `conversations` table.
#[derive(Clone)]
pub struct ConversationRepository {
    pool: PgPool,
}

impl ConversationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn from_row(row: PgRow) -> Result<Conversation, AppError> {
        let id: String = row
            .try_get("id")
            .map_err(|e| AppError::db_query("Failed to read id", e))?;
        let display_type = row
            .try_get::<Option<String>, _>("display_type")
            .map_err(|e| AppError::db_query("Failed to read display_type", e))?
            .map(DisplayType::try_from)
            .transpose()
            .map_err(|reason| AppError::CorruptRecord { id: id.clone(), reason })?;
        let Json(messages) = row
            .try_get::<Json<Vec<Message>>, _>("messages")
            .map_err(|e| AppError::db_query("Failed to read messages", e))?;

        ConversationRecord {
            title: row
                .try_get("title")
                .map_err(|e| AppError::db_query("Failed to read title", e))?,
            messages,
            created_at: row
                .try_get("created_at")
                .map_err(|e| AppError::db_query("Failed to read created_at", e))?,
            display_type,
            display_data: row
                .try_get::<Option<Value>, _>("display_data")
                .map_err(|e| AppError::db_query("Failed to read display_data", e))?,
            id,
        }
        .into_conversation()
    }
}

#[async_trait]
impl ConversationStore for ConversationRepository {
    async fn list(&self) -> Result<Vec<Conversation>, AppError> {
        let rows = sqlx::query(
            "SELECT id, title, messages, created_at, display_type, display_data
             FROM conversations
             ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to fetch all conversations: {e}");
            AppError::db_query("Failed to fetch conversations", e)
        })?;

        rows.into_iter().map(Self::from_row).collect()
    }

    async fn create(&self, conversation: &Conversation) -> Result<(), AppError> {
        let record = conversation.to_record()?;
        sqlx::query(
            "INSERT INTO conversations (id, title, messages, created_at, display_type, display_data)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&record.id)
        .bind(&record.title)
        .bind(Json(&record.messages))
        .bind(record.created_at)
        .bind(record.display_type.map(|t| t.as_str()))
        .bind(&record.display_data)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to save conversation {}: {e}", record.id);
            AppError::db_query("Failed to save conversation", e)
        })?;
        Ok(())
    }

    async fn update(&self, conversation: &Conversation) -> Result<(), AppError> {
        let record = conversation.to_record()?;
        let result = sqlx::query(
            "UPDATE conversations
             SET title = $2, messages = $3, display_type = $4, display_data = $5
             WHERE id = $1",
        )
        .bind(&record.id)
        .bind(&record.title)
        .bind(Json(&record.messages))
        .bind(record.display_type.map(|t| t.as_str()))
        .bind(&record.display_data)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to update conversation {}: {e}", record.id);
            AppError::db_query("Failed to update conversation", e)
        })?;
        if result.rows_affected() == 0 {
            return Err(AppError::ConversationNotFound { id: record.id });
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM conversations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to delete conversation {id}: {e}");
                AppError::db_query("Failed to delete conversation", e)
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::product;
    use crate::models::{CategorySummary, DisplayPayload};
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    // Postgres keeps microseconds, so fixtures use whole-second timestamps.
    fn conversation(id: &str, hour: u32, display: Option<DisplayPayload>) -> Conversation {
        let mut conv = Conversation::new(id.to_string(), "Gift ideas");
        conv.created_at = Utc.with_ymd_and_hms(2025, 6, 1, hour, 0, 0).unwrap();
        conv.messages = vec![Message::user("gift for mom"), Message::assistant("Try these")];
        conv.display = display;
        conv
    }

    #[sqlx::test]
    #[ignore = "needs DATABASE_URL pointing at a Postgres server"]
    async fn rows_round_trip_newest_first(pool: PgPool) {
        let repo = ConversationRepository::new(pool);
        let older = conversation(
            "older",
            9,
            Some(DisplayPayload::Categories(vec![CategorySummary::new("Jewelry", 87)])),
        );
        let newer = conversation(
            "newer",
            10,
            Some(DisplayPayload::Comparison(vec![product(1, "Widget", 10.0, "toys")])),
        );
        repo.create(&older).await.unwrap();
        repo.create(&newer).await.unwrap();

        let mut retitled = older.clone();
        retitled.title = "Presents".to_string();
        retitled.display = None;
        repo.update(&retitled).await.unwrap();

        assert_eq!(repo.list().await.unwrap(), vec![newer, retitled]);

        repo.delete("newer").await.unwrap();
        assert_eq!(repo.list().await.unwrap().len(), 1);
        assert!(repo.update(&conversation("gone", 8, None)).await.unwrap_err().is_not_found());
    }

    #[sqlx::test]
    #[ignore = "needs DATABASE_URL pointing at a Postgres server"]
    async fn unknown_display_type_is_corrupt_record(pool: PgPool) {
        sqlx::query(
            "INSERT INTO conversations (id, title, messages, created_at, display_type, display_data)
             VALUES ('bad', 'x', '[]', now(), 'banner', '[]')",
        )
        .execute(&pool)
        .await
        .unwrap();

        let err = ConversationRepository::new(pool).list().await.unwrap_err();
        assert!(matches!(err, AppError::CorruptRecord { ref id, .. } if id == "bad"));
    }
}
