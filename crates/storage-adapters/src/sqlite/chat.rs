use async_trait::async_trait;
use domains::chat::{ChatMessage, NewChatMessage};
use domains::errors::Result;
use domains::ports::ChatStore;
use domains::UserId;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::{SqliteStore, SqlxResultExt};

fn message_from_row(row: &SqliteRow) -> Result<ChatMessage> {
    Ok(ChatMessage {
        id: row.try_get("id").or_store("decode chat message")?,
        sender_id: row.try_get("sender_id").or_store("decode chat message")?,
        receiver_id: row.try_get("receiver_id").or_store("decode chat message")?,
        message: row.try_get("message").or_store("decode chat message")?,
        time: row.try_get("time").or_store("decode chat message")?,
    })
}

// Messages are independent rows, so each write autocommits on the pool.
#[async_trait]
impl ChatStore for SqliteStore {
    async fn save_message(&self, new: NewChatMessage) -> Result<ChatMessage> {
        let row = sqlx::query(
            "INSERT INTO chat_message (sender_id, receiver_id, message, time)
             VALUES (?, ?, ?, ?)
             RETURNING id, sender_id, receiver_id, message, time",
        )
        .bind(new.sender_id)
        .bind(new.receiver_id)
        .bind(new.message)
        .bind(new.time)
        .fetch_one(self.pool())
        .await
        .or_store("save chat message")?;
        message_from_row(&row)
    }

    async fn history(&self, a: UserId, b: UserId) -> Result<Vec<ChatMessage>> {
        let rows = sqlx::query(
            "SELECT id, sender_id, receiver_id, message, time FROM chat_message
             WHERE (sender_id = ?1 AND receiver_id = ?2) OR (sender_id = ?2 AND receiver_id = ?1)
             ORDER BY time ASC, id ASC",
        )
        .bind(a)
        .bind(b)
        .fetch_all(self.pool())
        .await
        .or_store("chat history")?;
        rows.iter().map(message_from_row).collect()
    }
}
