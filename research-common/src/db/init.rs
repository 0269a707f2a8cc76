//! Database initialization
//!
//! Opens (creating if needed) the SQLite database and creates every table
//! idempotently. Both the API and the worker call this on startup.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// SQLite busy timeout applied to every pooled connection
const BUSY_TIMEOUT_MS: u64 = 5000;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // foreign_keys is a per-connection pragma; setting it on the connect
    // options applies it to every connection the pool opens
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(BUSY_TIMEOUT_MS));

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;

    Ok(pool)
}

/// Open a private in-memory database with the full schema
///
/// The pool holds exactly one connection that never expires: every
/// `sqlite::memory:` connection is its own database.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create all tables and indexes (idempotent)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_research_sessions_table(pool).await?;
    create_chat_messages_table(pool).await?;
    create_artifacts_table(pool).await?;
    create_research_statements_table(pool).await?;
    create_evidence_tables(pool).await?;
    create_task_queue_table(pool).await?;
    Ok(())
}

async fn create_research_sessions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS research_sessions (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL DEFAULT 'New Research Session',
            research_question TEXT,
            methodology TEXT NOT NULL DEFAULT 'inquiry_cycle',
            created_by TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_research_sessions_updated_at ON research_sessions(updated_at)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_chat_messages_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS chat_messages (
            id TEXT PRIMARY KEY,
            session_id TEXT NOT NULL REFERENCES research_sessions(id) ON DELETE CASCADE,
            role TEXT NOT NULL CHECK (role IN ('user', 'claude', 'chatgpt', 'grok', 'system')),
            content TEXT NOT NULL,
            timestamp TEXT NOT NULL,
            metadata TEXT NOT NULL DEFAULT '{}'
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_chat_messages_session ON chat_messages(session_id, timestamp)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_artifacts_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS artifacts (
            id TEXT PRIMARY KEY,
            session_id TEXT NOT NULL REFERENCES research_sessions(id) ON DELETE CASCADE,
            artifact_type TEXT NOT NULL CHECK (artifact_type IN
                ('research_statement', 'claim', 'evidence', 'hypothesis', 'question')),
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            source_message_id TEXT REFERENCES chat_messages(id) ON DELETE SET NULL,
            confidence_score REAL NOT NULL DEFAULT 0.0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_artifacts_session ON artifacts(session_id, created_at)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_artifacts_source_message ON artifacts(source_message_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_research_statements_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS research_statements (
            id TEXT PRIMARY KEY,
            session_id TEXT NOT NULL REFERENCES research_sessions(id) ON DELETE CASCADE,
            original_statement TEXT NOT NULL,
            refined_statement TEXT,
            statement_type TEXT NOT NULL CHECK (statement_type IN
                ('EXPLORATORY', 'SPECIFIC', 'HYPOTHESIS', 'RESEARCH_QUESTION')),
            status TEXT NOT NULL DEFAULT 'DRAFT' CHECK (status IN
                ('DRAFT', 'ACTIVE', 'REFINED', 'COMPLETED', 'ARCHIVED')),
            subquestions TEXT NOT NULL DEFAULT '[]',
            refinement_notes TEXT,
            refinement_count INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            last_refined_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_research_statements_session ON research_statements(session_id, created_at)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_evidence_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS evidence (
            id TEXT PRIMARY KEY,
            session_id TEXT NOT NULL REFERENCES research_sessions(id) ON DELETE CASCADE,
            content TEXT NOT NULL,
            evidence_type TEXT NOT NULL CHECK (evidence_type IN ('PRIMARY', 'SECONDARY', 'TERTIARY')),
            source TEXT NOT NULL DEFAULT '',
            reliability_score REAL NOT NULL,
            reliability_reason TEXT,
            tags TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            last_verified_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_evidence_session ON evidence(session_id, created_at)",
    )
    .execute(pool)
    .await?;

    // One link per (evidence, claim) pair; relinking replaces it
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS evidence_claim_links (
            evidence_id TEXT NOT NULL REFERENCES evidence(id) ON DELETE CASCADE,
            statement_id TEXT NOT NULL REFERENCES research_statements(id) ON DELETE CASCADE,
            link_type TEXT NOT NULL CHECK (link_type IN
                ('SUPPORTS', 'CONTRADICTS', 'NEUTRAL', 'PARTIAL')),
            strength REAL NOT NULL,
            created_at TEXT NOT NULL,
            PRIMARY KEY (evidence_id, statement_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_evidence_claim_links_statement ON evidence_claim_links(statement_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_task_queue_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS task_queue (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            args TEXT NOT NULL DEFAULT '[]',
            kwargs TEXT NOT NULL DEFAULT '{}',
            status TEXT NOT NULL DEFAULT 'PENDING',
            result TEXT,
            error TEXT,
            worker TEXT,
            enqueued_at TEXT NOT NULL,
            started_at TEXT,
            finished_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_task_queue_pending ON task_queue(status, enqueued_at)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
