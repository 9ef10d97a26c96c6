use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use sqlx::sqlite::SqlitePool;
use tracing::{info, instrument};

use crate::database::{self, DEFAULT_HISTORY_LIMIT};
use crate::error::AppError;
use crate::models::{validate_chat_input, ChatTurn, Sender, SupplementRecord, UserProfile};
use crate::orchestrator::{ReplySource, ResponseOrchestrator};

#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub reply: String,
    pub source: ReplySource,
    pub timestamp: DateTime<Utc>,
}

/// Request-handling side of a chat exchange: validation, history and persistence
/// around the response engine, which itself never touches storage.
#[derive(Clone)]
pub struct ChatService {
    orchestrator: ResponseOrchestrator,
    pool: SqlitePool,
}

impl ChatService {
    pub fn new(orchestrator: ResponseOrchestrator, pool: SqlitePool) -> Self {
        Self { orchestrator, pool }
    }

    pub fn orchestrator(&self) -> &ResponseOrchestrator {
        &self.orchestrator
    }

    /// Answers `message` and stores the user turn followed by the reply.
    #[instrument(skip_all, fields(user_id = %user.id))]
    pub async fn handle_message(
        &self,
        user: &UserProfile,
        supplements: &[SupplementRecord],
        message: &str,
        now: DateTime<FixedOffset>,
    ) -> Result<ChatReply, AppError> {
        validate_chat_input(message, user, supplements)?;

        let history = database::get_chat_history(&self.pool, &user.id, DEFAULT_HISTORY_LIMIT).await?;

        let reply = self
            .orchestrator
            .respond_detailed(message, user, supplements, &history, now)
            .await;

        let timestamp = now.with_timezone(&Utc);
        let user_turn = ChatTurn {
            sender: Sender::User,
            text: message.to_string(),
            timestamp,
        };
        let assistant_turn = ChatTurn {
            sender: Sender::Assistant,
            text: reply.text.clone(),
            timestamp,
        };
        database::save_exchange(&self.pool, &user.id, &user_turn, &assistant_turn).await?;

        info!(history_len = history.len(), "Chat exchange stored");

        Ok(ChatReply {
            reply: reply.text,
            source: reply.source,
            timestamp,
        })
    }

    pub async fn history(&self, user_id: &str) -> Result<Vec<ChatTurn>, AppError> {
        database::get_chat_history(&self.pool, user_id, DEFAULT_HISTORY_LIMIT).await
    }

    pub async fn clear_history(&self, user_id: &str) -> Result<u64, AppError> {
        database::clear_chat_history(&self.pool, user_id).await
    }
}
