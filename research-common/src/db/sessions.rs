//! Research session database operations

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteExecutor, SqlitePool};
use uuid::Uuid;

use super::models::{
    validate_methodology, validate_title, NewSession, ResearchSession, SessionUpdate,
    DEFAULT_METHODOLOGY, DEFAULT_SESSION_TITLE,
};
use crate::{time, uuid_utils, Error, Result};

const SESSION_COLUMNS: &str =
    "id, title, research_question, methodology, created_by, created_at, updated_at, is_active";

fn session_from_row(row: &SqliteRow) -> Result<ResearchSession> {
    let id: String = row.get("id");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(ResearchSession {
        id: uuid_utils::parse_column("research_sessions.id", &id)?,
        title: row.get("title"),
        research_question: row.get("research_question"),
        methodology: row.get("methodology"),
        created_by: row.get("created_by"),
        created_at: time::parse(&created_at)?,
        updated_at: time::parse(&updated_at)?,
        is_active: row.get::<i64, _>("is_active") != 0,
    })
}

/// Create a session, applying defaults for absent fields
pub async fn create_session<'e, E>(executor: E, new: NewSession) -> Result<ResearchSession>
where
    E: SqliteExecutor<'e>,
{
    let title = match new.title {
        Some(title) => {
            validate_title(&title)?;
            title
        }
        None => DEFAULT_SESSION_TITLE.to_string(),
    };
    let methodology = match new.methodology {
        Some(methodology) => {
            validate_methodology(&methodology)?;
            methodology
        }
        None => DEFAULT_METHODOLOGY.to_string(),
    };

    let now = time::now();
    let session = ResearchSession {
        id: uuid_utils::generate(),
        title,
        research_question: new.research_question,
        methodology,
        created_by: new.created_by,
        created_at: now,
        updated_at: now,
        is_active: true,
    };

    sqlx::query(
        r#"
        INSERT INTO research_sessions (
            id, title, research_question, methodology, created_by,
            created_at, updated_at, is_active
        ) VALUES (?, ?, ?, ?, ?, ?, ?, 1)
        "#,
    )
    .bind(session.id.to_string())
    .bind(&session.title)
    .bind(&session.research_question)
    .bind(&session.methodology)
    .bind(&session.created_by)
    .bind(time::to_db_string(&session.created_at))
    .bind(time::to_db_string(&session.updated_at))
    .execute(executor)
    .await?;

    tracing::debug!(session_id = %session.id, "Created research session");

    Ok(session)
}

/// Load a session by id
pub async fn get_session(pool: &SqlitePool, id: Uuid) -> Result<Option<ResearchSession>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM research_sessions WHERE id = ?",
        SESSION_COLUMNS
    ))
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(session_from_row).transpose()
}

/// Load a session or fail with `Error::NotFound`
pub async fn require_session(pool: &SqlitePool, id: Uuid) -> Result<ResearchSession> {
    get_session(pool, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Research session {}", id)))
}

/// List sessions, most recently updated first
pub async fn list_sessions(pool: &SqlitePool, include_inactive: bool) -> Result<Vec<ResearchSession>> {
    let filter = if include_inactive { "" } else { "WHERE is_active = 1" };
    let rows = sqlx::query(&format!(
        "SELECT {} FROM research_sessions {} ORDER BY updated_at DESC, rowid DESC",
        SESSION_COLUMNS, filter
    ))
    .fetch_all(pool)
    .await?;

    rows.iter().map(session_from_row).collect()
}

/// Apply a partial update; refreshes `updated_at`
pub async fn update_session(
    pool: &SqlitePool,
    id: Uuid,
    update: SessionUpdate,
) -> Result<Option<ResearchSession>> {
    let Some(mut session) = get_session(pool, id).await? else {
        return Ok(None);
    };

    if let Some(title) = update.title {
        validate_title(&title)?;
        session.title = title;
    }
    if let Some(methodology) = update.methodology {
        validate_methodology(&methodology)?;
        session.methodology = methodology;
    }
    if let Some(question) = update.research_question {
        session.research_question = Some(question);
    }
    session.updated_at = next_update_time(&session);

    sqlx::query(
        r#"
        UPDATE research_sessions
        SET title = ?, research_question = ?, methodology = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&session.title)
    .bind(&session.research_question)
    .bind(&session.methodology)
    .bind(time::to_db_string(&session.updated_at))
    .bind(id.to_string())
    .execute(pool)
    .await?;

    Ok(Some(session))
}

/// Soft-deactivate a session; refreshes `updated_at`
pub async fn deactivate_session(pool: &SqlitePool, id: Uuid) -> Result<Option<ResearchSession>> {
    let Some(mut session) = get_session(pool, id).await? else {
        return Ok(None);
    };

    session.is_active = false;
    session.updated_at = next_update_time(&session);

    sqlx::query("UPDATE research_sessions SET is_active = 0, updated_at = ? WHERE id = ?")
        .bind(time::to_db_string(&session.updated_at))
        .bind(id.to_string())
        .execute(pool)
        .await?;

    tracing::info!(session_id = %id, "Deactivated research session");

    Ok(Some(session))
}

/// Hard-delete a session. Messages and artifacts go with it (ON DELETE CASCADE).
///
/// Returns false when no such session existed.
pub async fn delete_session(pool: &SqlitePool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM research_sessions WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Number of (messages, artifacts) attached to a session
pub async fn session_counts(pool: &SqlitePool, id: Uuid) -> Result<(i64, i64)> {
    let id = id.to_string();
    let messages: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chat_messages WHERE session_id = ?")
        .bind(&id)
        .fetch_one(pool)
        .await?;
    let artifacts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM artifacts WHERE session_id = ?")
        .bind(&id)
        .fetch_one(pool)
        .await?;
    Ok((messages, artifacts))
}

/// `updated_at` must strictly advance even when two mutations land within
/// one clock tick of the stored precision
fn next_update_time(session: &ResearchSession) -> chrono::DateTime<chrono::Utc> {
    let now = time::now();
    if now > session.updated_at {
        now
    } else {
        session.updated_at + chrono::Duration::microseconds(1)
    }
}
