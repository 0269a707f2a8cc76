//! Chat message database operations

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteExecutor, SqlitePool};
use uuid::Uuid;

use super::models::{ChatMessage, NewMessage};
use crate::{time, uuid_utils, Result};

const MESSAGE_COLUMNS: &str = "id, session_id, role, content, timestamp, metadata";

fn message_from_row(row: &SqliteRow) -> Result<ChatMessage> {
    let id: String = row.get("id");
    let session_id: String = row.get("session_id");
    let role: String = row.get("role");
    let timestamp: String = row.get("timestamp");
    let metadata: String = row.get("metadata");

    Ok(ChatMessage {
        id: uuid_utils::parse_column("chat_messages.id", &id)?,
        session_id: uuid_utils::parse_column("chat_messages.session_id", &session_id)?,
        role: role.parse()?,
        content: row.get("content"),
        timestamp: time::parse(&timestamp)?,
        metadata: serde_json::from_str(&metadata)?,
    })
}

/// Append a message to a session
///
/// The caller is responsible for checking the session exists; a dangling
/// session id surfaces as a foreign key violation.
pub async fn insert_message<'e, E>(
    executor: E,
    session_id: Uuid,
    new: NewMessage,
) -> Result<ChatMessage>
where
    E: SqliteExecutor<'e>,
{
    new.validate()?;

    let message = ChatMessage {
        id: uuid_utils::generate(),
        session_id,
        role: new.role,
        content: new.content,
        timestamp: time::now(),
        metadata: new.metadata.unwrap_or_else(|| serde_json::json!({})),
    };

    sqlx::query(
        r#"
        INSERT INTO chat_messages (id, session_id, role, content, timestamp, metadata)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(message.id.to_string())
    .bind(session_id.to_string())
    .bind(message.role.as_str())
    .bind(&message.content)
    .bind(time::to_db_string(&message.timestamp))
    .bind(serde_json::to_string(&message.metadata)?)
    .execute(executor)
    .await?;

    Ok(message)
}

/// Load one message
pub async fn get_message(pool: &SqlitePool, id: Uuid) -> Result<Option<ChatMessage>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM chat_messages WHERE id = ?",
        MESSAGE_COLUMNS
    ))
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(message_from_row).transpose()
}

/// A session's conversation, oldest first
pub async fn list_messages(pool: &SqlitePool, session_id: Uuid) -> Result<Vec<ChatMessage>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM chat_messages WHERE session_id = ? ORDER BY timestamp ASC, rowid ASC",
        MESSAGE_COLUMNS
    ))
    .bind(session_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(message_from_row).collect()
}

/// Delete a message. Artifacts citing it keep existing with
/// `source_message` nulled (ON DELETE SET NULL).
pub async fn delete_message(pool: &SqlitePool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM chat_messages WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
