// src/assistant/conversation.rs
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::chat::{ChatMessage, ChatSession};

#[derive(Error, Debug)]
pub enum ConversationError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
    #[error("Chat session not found")]
    SessionNotFound,
}

#[derive(Debug, Clone, Copy, PartialEq)]
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

/// Persistence for chat sessions and their messages. Appending a message and
/// advancing the session timestamp are two separate statements; a failure
/// between them leaves the timestamp behind the message, which the GREATEST
/// guard repairs on the next append.
#[derive(Clone)]
pub struct ConversationStore {
    db_pool: PgPool,
}

impl ConversationStore {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Create a session for the first message of a new conversation.
    pub async fn create_session(
        &self,
        user_id: i32,
        title: &str,
    ) -> Result<ChatSession, ConversationError> {
        let session = sqlx::query_as::<_, ChatSession>(
            "INSERT INTO chat_sessions (session_uuid, user_id, title, created_at, updated_at)
             VALUES ($1, $2, $3, NOW(), NOW())
             RETURNING id, session_uuid, user_id, title, created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(title)
        .fetch_one(&self.db_pool)
        .await?;

        tracing::info!("Created chat session {} for user {}", session.session_uuid, user_id);
        Ok(session)
    }

    /// Look up a session by its public uuid, enforcing ownership.
    pub async fn find_session(
        &self,
        user_id: i32,
        session_uuid: Uuid,
    ) -> Result<ChatSession, ConversationError> {
        sqlx::query_as::<_, ChatSession>(
            "SELECT id, session_uuid, user_id, title, created_at, updated_at
             FROM chat_sessions
             WHERE session_uuid = $1 AND user_id = $2",
        )
        .bind(session_uuid)
        .bind(user_id)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or(ConversationError::SessionNotFound)
    }

    /// Append one immutable message and advance the session's updated_at to
    /// the message timestamp. GREATEST keeps updated_at monotonic even if a
    /// concurrent append already moved it forward.
    pub async fn append_message(
        &self,
        session_id: i32,
        role: MessageRole,
        content: &str,
        sources: &[String],
    ) -> Result<ChatMessage, ConversationError> {
        let message = sqlx::query_as::<_, ChatMessage>(
            "INSERT INTO chat_messages (session_id, role, content, sources, created_at)
             VALUES ($1, $2, $3, $4, NOW())
             RETURNING id, session_id, role, content, sources, created_at",
        )
        .bind(session_id)
        .bind(role.as_str())
        .bind(content)
        .bind(sources)
        .fetch_one(&self.db_pool)
        .await?;

        sqlx::query(
            "UPDATE chat_sessions SET updated_at = GREATEST(updated_at, $1) WHERE id = $2",
        )
        .bind(message.created_at)
        .bind(session_id)
        .execute(&self.db_pool)
        .await?;

        Ok(message)
    }

    /// All of a user's sessions, most recently updated first.
    pub async fn list_sessions(
        &self,
        user_id: i32,
    ) -> Result<Vec<ChatSession>, ConversationError> {
        let sessions = sqlx::query_as::<_, ChatSession>(
            "SELECT id, session_uuid, user_id, title, created_at, updated_at
             FROM chat_sessions
             WHERE user_id = $1
             ORDER BY updated_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(sessions)
    }

    /// A session's messages by write timestamp ascending. The id tiebreak
    /// keeps repeated loads identical when timestamps collide.
    pub async fn get_history(
        &self,
        session_id: i32,
    ) -> Result<Vec<ChatMessage>, ConversationError> {
        let messages = sqlx::query_as::<_, ChatMessage>(
            "SELECT id, session_id, role, content, sources, created_at
             FROM chat_messages
             WHERE session_id = $1
             ORDER BY created_at ASC, id ASC",
        )
        .bind(session_id)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(messages)
    }

    /// Rename a session. Only the title changes; messages and created_at
    /// are left alone.
    pub async fn rename_session(
        &self,
        session_id: i32,
        title: &str,
    ) -> Result<(), ConversationError> {
        let result = sqlx::query("UPDATE chat_sessions SET title = $1 WHERE id = $2")
            .bind(title)
            .bind(session_id)
            .execute(&self.db_pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ConversationError::SessionNotFound);
        }
        Ok(())
    }

    /// Delete a session; the foreign key cascades to its messages so no
    /// orphans remain.
    pub async fn delete_session(&self, session_id: i32) -> Result<(), ConversationError> {
        let result = sqlx::query("DELETE FROM chat_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.db_pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ConversationError::SessionNotFound);
        }
        Ok(())
    }
}
