//! Research statement database operations
//!
//! A statement starts as DRAFT. Refining it records the refined text and
//! moves it to REFINED; any other status change is explicit.

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::models::{
    validate_text, NewStatement, ResearchStatement, StatementRefinement, StatementStatistics,
    StatementStatus, StatementType, MAX_SUBQUESTION_LEN,
};
use crate::{time, uuid_utils, Error, Result};

const STATEMENT_COLUMNS: &str = "id, session_id, original_statement, refined_statement, \
     statement_type, status, subquestions, refinement_notes, refinement_count, \
     created_at, updated_at, last_refined_at";

fn statement_from_row(row: &SqliteRow) -> Result<ResearchStatement> {
    let id: String = row.get("id");
    let session_id: String = row.get("session_id");
    let statement_type: String = row.get("statement_type");
    let status: String = row.get("status");
    let subquestions: String = row.get("subquestions");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");
    let last_refined_at: Option<String> = row.get("last_refined_at");

    Ok(ResearchStatement {
        id: uuid_utils::parse_column("research_statements.id", &id)?,
        session_id: uuid_utils::parse_column("research_statements.session_id", &session_id)?,
        original_statement: row.get("original_statement"),
        refined_statement: row.get("refined_statement"),
        statement_type: statement_type.parse()?,
        status: status.parse()?,
        subquestions: serde_json::from_str(&subquestions)?,
        refinement_notes: row.get("refinement_notes"),
        refinement_count: row.get("refinement_count"),
        created_at: time::parse(&created_at)?,
        updated_at: time::parse(&updated_at)?,
        last_refined_at: last_refined_at.map(|s| time::parse(&s)).transpose()?,
    })
}

/// Create a DRAFT statement in a session
pub async fn create_statement(pool: &SqlitePool, new: NewStatement) -> Result<ResearchStatement> {
    new.validate()?;

    let now = time::now();
    let statement = ResearchStatement {
        id: uuid_utils::generate(),
        session_id: new.session_id,
        original_statement: new.original_statement,
        refined_statement: None,
        statement_type: new.statement_type.unwrap_or(StatementType::Exploratory),
        status: StatementStatus::Draft,
        subquestions: Vec::new(),
        refinement_notes: None,
        refinement_count: 0,
        created_at: now,
        updated_at: now,
        last_refined_at: None,
    };

    sqlx::query(
        r#"
        INSERT INTO research_statements (
            id, session_id, original_statement, statement_type, status,
            subquestions, refinement_count, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, '[]', 0, ?, ?)
        "#,
    )
    .bind(statement.id.to_string())
    .bind(statement.session_id.to_string())
    .bind(&statement.original_statement)
    .bind(statement.statement_type.as_str())
    .bind(statement.status.as_str())
    .bind(time::to_db_string(&statement.created_at))
    .bind(time::to_db_string(&statement.updated_at))
    .execute(pool)
    .await?;

    tracing::debug!(statement_id = %statement.id, session_id = %statement.session_id, "Created research statement");

    Ok(statement)
}

pub async fn get_statement(pool: &SqlitePool, id: Uuid) -> Result<Option<ResearchStatement>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM research_statements WHERE id = ?",
        STATEMENT_COLUMNS
    ))
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(statement_from_row).transpose()
}

/// A session's statements, newest first, optionally restricted to one type
pub async fn list_statements(
    pool: &SqlitePool,
    session_id: Uuid,
    statement_type: Option<StatementType>,
) -> Result<Vec<ResearchStatement>> {
    let rows = match statement_type {
        Some(t) => {
            sqlx::query(&format!(
                "SELECT {} FROM research_statements WHERE session_id = ? AND statement_type = ? \
                 ORDER BY created_at DESC, rowid DESC",
                STATEMENT_COLUMNS
            ))
            .bind(session_id.to_string())
            .bind(t.as_str())
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query(&format!(
                "SELECT {} FROM research_statements WHERE session_id = ? \
                 ORDER BY created_at DESC, rowid DESC",
                STATEMENT_COLUMNS
            ))
            .bind(session_id.to_string())
            .fetch_all(pool)
            .await?
        }
    };

    rows.iter().map(statement_from_row).collect()
}

/// The most recently created ACTIVE statement of a session
pub async fn active_statement(pool: &SqlitePool, session_id: Uuid) -> Result<Option<ResearchStatement>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM research_statements WHERE session_id = ? AND status = 'ACTIVE' \
         ORDER BY created_at DESC, rowid DESC LIMIT 1",
        STATEMENT_COLUMNS
    ))
    .bind(session_id.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(statement_from_row).transpose()
}

/// Record a refinement: stores the refined text and notes, bumps the
/// refinement count and moves the statement to REFINED
pub async fn refine_statement(
    pool: &SqlitePool,
    id: Uuid,
    refinement: StatementRefinement,
) -> Result<Option<ResearchStatement>> {
    refinement.validate()?;
    let Some(mut statement) = get_statement(pool, id).await? else {
        return Ok(None);
    };

    let now = time::now();
    statement.refined_statement = Some(refinement.refined_statement);
    statement.refinement_notes = refinement.refinement_notes;
    statement.status = StatementStatus::Refined;
    statement.refinement_count += 1;
    statement.last_refined_at = Some(now);
    statement.updated_at = now;

    sqlx::query(
        r#"
        UPDATE research_statements
        SET refined_statement = ?, refinement_notes = ?, status = ?,
            refinement_count = refinement_count + 1, last_refined_at = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&statement.refined_statement)
    .bind(&statement.refinement_notes)
    .bind(statement.status.as_str())
    .bind(time::to_db_string(&now))
    .bind(time::to_db_string(&now))
    .bind(id.to_string())
    .execute(pool)
    .await?;

    tracing::info!(statement_id = %id, refinement_count = statement.refinement_count, "Refined research statement");

    Ok(Some(statement))
}

/// Append subquestions, keeping the existing ones
pub async fn add_subquestions(
    pool: &SqlitePool,
    id: Uuid,
    subquestions: Vec<String>,
) -> Result<Option<ResearchStatement>> {
    for subquestion in &subquestions {
        validate_text("subquestion", subquestion, MAX_SUBQUESTION_LEN)?;
    }
    let Some(mut statement) = get_statement(pool, id).await? else {
        return Ok(None);
    };

    statement.subquestions.extend(subquestions);
    statement.updated_at = time::now();

    sqlx::query("UPDATE research_statements SET subquestions = ?, updated_at = ? WHERE id = ?")
        .bind(serde_json::to_string(&statement.subquestions)?)
        .bind(time::to_db_string(&statement.updated_at))
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(Some(statement))
}

pub async fn update_status(
    pool: &SqlitePool,
    id: Uuid,
    status: StatementStatus,
) -> Result<Option<ResearchStatement>> {
    let Some(mut statement) = get_statement(pool, id).await? else {
        return Ok(None);
    };

    statement.status = status;
    statement.updated_at = time::now();

    sqlx::query("UPDATE research_statements SET status = ?, updated_at = ? WHERE id = ?")
        .bind(status.as_str())
        .bind(time::to_db_string(&statement.updated_at))
        .bind(id.to_string())
        .execute(pool)
        .await?;

    tracing::info!(statement_id = %id, status = %status, "Updated research statement status");

    Ok(Some(statement))
}

/// Statements whose original or refined text contains `term`
/// (case-insensitive), newest first
pub async fn search_statements(
    pool: &SqlitePool,
    session_id: Uuid,
    term: &str,
) -> Result<Vec<ResearchStatement>> {
    let term = term.to_lowercase();
    let statements = list_statements(pool, session_id, None).await?;

    Ok(statements
        .into_iter()
        .filter(|s| {
            s.original_statement.to_lowercase().contains(&term)
                || s
                    .refined_statement
                    .as_deref()
                    .is_some_and(|refined| refined.to_lowercase().contains(&term))
        })
        .collect())
}

pub async fn statement_statistics(pool: &SqlitePool, session_id: Uuid) -> Result<StatementStatistics> {
    let row = sqlx::query(
        r#"
        SELECT
            COUNT(*) AS total,
            COALESCE(SUM(statement_type = 'EXPLORATORY'), 0) AS exploratory,
            COALESCE(SUM(statement_type = 'SPECIFIC'), 0) AS specific,
            COALESCE(SUM(statement_type = 'HYPOTHESIS'), 0) AS hypothesis,
            COALESCE(SUM(statement_type = 'RESEARCH_QUESTION'), 0) AS research_question,
            COALESCE(SUM(status = 'ACTIVE'), 0) AS active,
            COALESCE(SUM(status = 'REFINED'), 0) AS refined
        FROM research_statements
        WHERE session_id = ?
        "#,
    )
    .bind(session_id.to_string())
    .fetch_one(pool)
    .await?;

    Ok(StatementStatistics {
        total_statements: row.get("total"),
        exploratory_count: row.get("exploratory"),
        specific_count: row.get("specific"),
        hypothesis_count: row.get("hypothesis"),
        research_question_count: row.get("research_question"),
        active_count: row.get("active"),
        refined_count: row.get("refined"),
    })
}

/// Check that statement `statement_id` exists and belongs to `session_id`
pub async fn require_statement_in_session(
    pool: &SqlitePool,
    session_id: Uuid,
    statement_id: Uuid,
) -> Result<ResearchStatement> {
    match get_statement(pool, statement_id).await? {
        Some(statement) if statement.session_id == session_id => Ok(statement),
        Some(_) => Err(Error::InvalidInput(format!(
            "Research statement {} belongs to another session",
            statement_id
        ))),
        None => Err(Error::NotFound(format!("Research statement {}", statement_id))),
    }
}
