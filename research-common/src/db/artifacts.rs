//! Research artifact database operations

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteExecutor, SqlitePool};
use uuid::Uuid;

use super::messages::get_message;
use super::models::{Artifact, ArtifactType, NewArtifact};
use crate::{time, uuid_utils, Error, Result};

const ARTIFACT_COLUMNS: &str = "id, session_id, artifact_type, title, content, \
     source_message_id, confidence_score, created_at, updated_at";

fn artifact_from_row(row: &SqliteRow) -> Result<Artifact> {
    let id: String = row.get("id");
    let session_id: String = row.get("session_id");
    let artifact_type: String = row.get("artifact_type");
    let source_message: Option<String> = row.get("source_message_id");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(Artifact {
        id: uuid_utils::parse_column("artifacts.id", &id)?,
        session_id: uuid_utils::parse_column("artifacts.session_id", &session_id)?,
        artifact_type: artifact_type.parse()?,
        title: row.get("title"),
        content: row.get("content"),
        source_message: source_message
            .map(|s| uuid_utils::parse_column("artifacts.source_message_id", &s))
            .transpose()?,
        confidence_score: row.get("confidence_score"),
        created_at: time::parse(&created_at)?,
        updated_at: time::parse(&updated_at)?,
    })
}

/// Check that `message_id` exists and belongs to `session_id`
pub async fn validate_source_message(
    pool: &SqlitePool,
    session_id: Uuid,
    message_id: Uuid,
) -> Result<()> {
    match get_message(pool, message_id).await? {
        Some(message) if message.session_id == session_id => Ok(()),
        Some(_) => Err(Error::InvalidInput(format!(
            "Message {} belongs to another session",
            message_id
        ))),
        None => Err(Error::NotFound(format!("Chat message {}", message_id))),
    }
}

/// Record an artifact for a session
pub async fn insert_artifact<'e, E>(
    executor: E,
    session_id: Uuid,
    new: NewArtifact,
) -> Result<Artifact>
where
    E: SqliteExecutor<'e>,
{
    new.validate()?;

    let now = time::now();
    let artifact = Artifact {
        id: uuid_utils::generate(),
        session_id,
        artifact_type: new.artifact_type,
        title: new.title,
        content: new.content,
        source_message: new.source_message,
        confidence_score: new.confidence_score.unwrap_or(0.0),
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO artifacts (
            id, session_id, artifact_type, title, content,
            source_message_id, confidence_score, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(artifact.id.to_string())
    .bind(session_id.to_string())
    .bind(artifact.artifact_type.as_str())
    .bind(&artifact.title)
    .bind(&artifact.content)
    .bind(artifact.source_message.map(|id| id.to_string()))
    .bind(artifact.confidence_score)
    .bind(time::to_db_string(&artifact.created_at))
    .bind(time::to_db_string(&artifact.updated_at))
    .execute(executor)
    .await?;

    Ok(artifact)
}

/// Load one artifact
pub async fn get_artifact(pool: &SqlitePool, id: Uuid) -> Result<Option<Artifact>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM artifacts WHERE id = ?",
        ARTIFACT_COLUMNS
    ))
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(artifact_from_row).transpose()
}

/// A session's artifacts, newest first, optionally restricted to one type
pub async fn list_artifacts(
    pool: &SqlitePool,
    session_id: Uuid,
    artifact_type: Option<ArtifactType>,
) -> Result<Vec<Artifact>> {
    let rows = match artifact_type {
        Some(t) => {
            sqlx::query(&format!(
                "SELECT {} FROM artifacts WHERE session_id = ? AND artifact_type = ? \
                 ORDER BY created_at DESC, rowid DESC",
                ARTIFACT_COLUMNS
            ))
            .bind(session_id.to_string())
            .bind(t.as_str())
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query(&format!(
                "SELECT {} FROM artifacts WHERE session_id = ? ORDER BY created_at DESC, rowid DESC",
                ARTIFACT_COLUMNS
            ))
            .bind(session_id.to_string())
            .fetch_all(pool)
            .await?
        }
    };

    rows.iter().map(artifact_from_row).collect()
}
