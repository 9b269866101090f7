use std::str::FromStr;

use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::chat::{ChatMessage, ChatSession, MessageSender, SessionStatus};
use crate::utils::misc::generate_uuid;
use crate::utils::time::current_timestamp;

const SESSION_COLUMNS: &str =
    "id, widget_id, visitor_id, visitor_name, status, started_at, ended_at";
const MESSAGE_COLUMNS: &str = "id, session_id, sender, content, created_at";

pub struct ChatService<'a> {
    db: &'a Database,
}

impl<'a> ChatService<'a> {
    pub fn new(db: &'a Database) -> Self {
        ChatService { db }
    }

    pub async fn create_session(
        &self,
        widget_id: &str,
        visitor_name: Option<&str>,
    ) -> AppResult<ChatSession> {
        let id = generate_uuid();
        let visitor_id = generate_uuid();
        let now = current_timestamp();

        sqlx::query(
            r#"
            INSERT INTO chat_session (id, widget_id, visitor_id, visitor_name, status, started_at)
            VALUES ($1, $2, $3, $4, 'active', $5)
            "#,
        )
        .bind(&id)
        .bind(widget_id)
        .bind(&visitor_id)
        .bind(visitor_name)
        .bind(now)
        .execute(&self.db.pool)
        .await?;

        self.get_session_by_id(&id)
            .await?
            .ok_or_else(|| AppError::InternalServerError("Failed to create session".to_string()))
    }

    pub async fn get_session_by_id(&self, id: &str) -> AppResult<Option<ChatSession>> {
        let session = sqlx::query_as::<_, ChatSession>(&format!(
            "SELECT {} FROM chat_session WHERE id = $1",
            SESSION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db.pool)
        .await?;

        Ok(session)
    }

    pub async fn get_sessions_by_widget_id(&self, widget_id: &str) -> AppResult<Vec<ChatSession>> {
        let sessions = sqlx::query_as::<_, ChatSession>(&format!(
            "SELECT {} FROM chat_session WHERE widget_id = $1 ORDER BY started_at DESC",
            SESSION_COLUMNS
        ))
        .bind(widget_id)
        .fetch_all(&self.db.pool)
        .await?;

        Ok(sessions)
    }

    /// All sessions on widgets the user owns.
    pub async fn get_sessions_for_user(&self, user_id: &str) -> AppResult<Vec<ChatSession>> {
        let sessions = sqlx::query_as::<_, ChatSession>(
            r#"
            SELECT s.id, s.widget_id, s.visitor_id, s.visitor_name, s.status, s.started_at, s.ended_at
            FROM chat_session s
            JOIN widget w ON w.id = s.widget_id
            WHERE w.user_id = $1
            ORDER BY s.started_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db.pool)
        .await?;

        Ok(sessions)
    }

    /// Apply a lifecycle transition. Sessions move one way only: `active`
    /// to a terminal state, after which the status is frozen.
    pub async fn update_session_status(
        &self,
        id: &str,
        next: SessionStatus,
    ) -> AppResult<ChatSession> {
        let session = self
            .get_session_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;

        let current = SessionStatus::from_str(&session.status).map_err(|_| {
            AppError::InternalServerError(format!("Corrupt session status: {}", session.status))
        })?;

        if !current.can_transition_to(next) {
            return Err(AppError::BadRequest(format!(
                "Cannot transition session from {} to {}",
                current.as_str(),
                next.as_str()
            )));
        }

        let now = current_timestamp();
        sqlx::query("UPDATE chat_session SET status = $1, ended_at = $2 WHERE id = $3")
            .bind(next.as_str())
            .bind(now)
            .bind(id)
            .execute(&self.db.pool)
            .await?;

        self.get_session_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Session not found".to_string()))
    }

    /// Persist a message. Only `active` sessions accept messages.
    pub async fn add_message(
        &self,
        session_id: &str,
        sender: MessageSender,
        content: &str,
    ) -> AppResult<ChatMessage> {
        let session = self
            .get_session_by_id(session_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;

        if SessionStatus::from_str(&session.status) != Ok(SessionStatus::Active) {
            return Err(AppError::BadRequest(
                "Session is no longer active".to_string(),
            ));
        }

        let id = generate_uuid();
        let now = current_timestamp();

        sqlx::query(
            r#"
            INSERT INTO chat_message (id, session_id, sender, content, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&id)
        .bind(session_id)
        .bind(sender.as_str())
        .bind(content)
        .bind(now)
        .execute(&self.db.pool)
        .await?;

        let message = sqlx::query_as::<_, ChatMessage>(&format!(
            "SELECT {} FROM chat_message WHERE id = $1",
            MESSAGE_COLUMNS
        ))
        .bind(&id)
        .fetch_one(&self.db.pool)
        .await?;

        Ok(message)
    }

    pub async fn get_messages_by_session_id(
        &self,
        session_id: &str,
    ) -> AppResult<Vec<ChatMessage>> {
        let messages = sqlx::query_as::<_, ChatMessage>(&format!(
            "SELECT {} FROM chat_message WHERE session_id = $1 ORDER BY created_at ASC",
            MESSAGE_COLUMNS
        ))
        .bind(session_id)
        .fetch_all(&self.db.pool)
        .await?;

        Ok(messages)
    }
}
