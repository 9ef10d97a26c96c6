use crate::error::AppError;
use crate::models::{ChatTurn, Sender};
use chrono::DateTime;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Executor, FromRow, Sqlite};
use std::str::FromStr;
use tracing::info;
use uuid::Uuid;

/// Number of turns returned when the caller does not ask for a specific amount.
pub const DEFAULT_HISTORY_LIMIT: i64 = 50;

/// A persisted chat turn.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChatMessageRecord {
    pub id: String,
    pub user_id: String,
    pub sender: String,
    pub message: String,
    pub created_at: i64,
}

impl ChatMessageRecord {
    pub fn into_turn(self) -> Result<ChatTurn, AppError> {
        let timestamp = DateTime::from_timestamp(self.created_at, 0).ok_or_else(|| {
            AppError::Internal(format!(
                "Invalid timestamp {} on message {}",
                self.created_at, self.id
            ))
        })?;
        Ok(ChatTurn {
            sender: Sender::from_str(&self.sender)?,
            text: self.message,
            timestamp,
        })
    }
}

pub async fn init_db(database_url: &str) -> Result<SqlitePool, AppError> {
    info!("Initializing database at: {}", database_url);

    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS chat_messages (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            sender TEXT NOT NULL CHECK (sender IN ('user', 'assistant')),
            message TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_chat_messages_user
            ON chat_messages (user_id, created_at);
        "#,
    )
    .execute(&pool)
    .await?;

    info!("Database initialized and migrations applied.");

    Ok(pool)
}

// --- Chat history ---

/// Inserts one turn. Accepts the pool or an open transaction.
pub async fn save_chat_turn<'e, E>(
    executor: E,
    user_id: &str,
    turn: &ChatTurn,
) -> Result<ChatMessageRecord, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let id = Uuid::new_v4().to_string();

    let record = sqlx::query_as::<_, ChatMessageRecord>(
        r#"
        INSERT INTO chat_messages (id, user_id, sender, message, created_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING id, user_id, sender, message, created_at
        "#,
    )
    .bind(&id)
    .bind(user_id)
    .bind(turn.sender.as_str())
    .bind(&turn.text)
    .bind(turn.timestamp.timestamp())
    .fetch_one(executor)
    .await?;

    Ok(record)
}

/// Stores a user turn and its reply together; neither is kept if either insert fails.
pub async fn save_exchange(
    pool: &SqlitePool,
    user_id: &str,
    user_turn: &ChatTurn,
    assistant_turn: &ChatTurn,
) -> Result<(ChatMessageRecord, ChatMessageRecord), AppError> {
    let mut tx = pool.begin().await?;

    let question = save_chat_turn(&mut *tx, user_id, user_turn).await?;
    let answer = save_chat_turn(&mut *tx, user_id, assistant_turn).await?;

    tx.commit().await?;
    Ok((question, answer))
}

/// The `limit` most recent turns for a user, oldest first.
pub async fn get_chat_history(
    pool: &SqlitePool,
    user_id: &str,
    limit: i64,
) -> Result<Vec<ChatTurn>, AppError> {
    let mut rows = sqlx::query_as::<_, ChatMessageRecord>(
        r#"
        SELECT id, user_id, sender, message, created_at
        FROM chat_messages
        WHERE user_id = ?
        ORDER BY created_at DESC, rowid DESC
        LIMIT ?
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.reverse();
    rows.into_iter().map(ChatMessageRecord::into_turn).collect()
}

/// Deletes a user's whole conversation and returns how many turns were removed.
pub async fn clear_chat_history(pool: &SqlitePool, user_id: &str) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM chat_messages WHERE user_id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;

    info!(user_id, deleted = result.rows_affected(), "Chat history cleared");
    Ok(result.rows_affected())
}
