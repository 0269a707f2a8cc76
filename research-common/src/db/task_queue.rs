//! Task queue broker and result backend
//!
//! Rows move PENDING → STARTED → SUCCESS | FAILURE. Claiming is a single
//! `UPDATE … RETURNING` guarded by `status = 'PENDING'`, so concurrent
//! workers (in one or several processes) never run the same task twice.

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::retry::{retry_on_lock, DEFAULT_MAX_LOCK_WAIT_MS};
use crate::tasks::{TaskName, TaskRecord, TaskStatus};
use crate::{time, uuid_utils, Error, Result};

const TASK_COLUMNS: &str = "id, name, args, kwargs, status, result, error, worker, \
     enqueued_at, started_at, finished_at";

fn task_from_row(row: &SqliteRow) -> Result<TaskRecord> {
    let id: String = row.get("id");
    let args: String = row.get("args");
    let kwargs: String = row.get("kwargs");
    let status: String = row.get("status");
    let result: Option<String> = row.get("result");
    let enqueued_at: String = row.get("enqueued_at");
    let started_at: Option<String> = row.get("started_at");
    let finished_at: Option<String> = row.get("finished_at");

    Ok(TaskRecord {
        id: uuid_utils::parse_column("task_queue.id", &id)?,
        name: row.get("name"),
        args: serde_json::from_str(&args)?,
        kwargs: serde_json::from_str(&kwargs)?,
        status: status.parse()?,
        result: result.map(|r| serde_json::from_str(&r)).transpose()?,
        error: row.get("error"),
        worker: row.get("worker"),
        enqueued_at: time::parse(&enqueued_at)?,
        started_at: started_at.map(|s| time::parse(&s)).transpose()?,
        finished_at: finished_at.map(|s| time::parse(&s)).transpose()?,
    })
}

/// Publish a task to the broker
///
/// `args` must be a JSON array and `kwargs` a JSON object.
pub async fn enqueue(
    pool: &SqlitePool,
    name: TaskName,
    args: serde_json::Value,
    kwargs: serde_json::Value,
) -> Result<TaskRecord> {
    if !args.is_array() {
        return Err(Error::InvalidInput("Task args must be a JSON array".to_string()));
    }
    if !kwargs.is_object() {
        return Err(Error::InvalidInput("Task kwargs must be a JSON object".to_string()));
    }

    let record = TaskRecord {
        id: uuid_utils::generate(),
        name: name.as_str().to_string(),
        args,
        kwargs,
        status: TaskStatus::Pending,
        result: None,
        error: None,
        worker: None,
        enqueued_at: time::now(),
        started_at: None,
        finished_at: None,
    };

    let id = record.id.to_string();
    let args = serde_json::to_string(&record.args)?;
    let kwargs = serde_json::to_string(&record.kwargs)?;
    let enqueued_at = time::to_db_string(&record.enqueued_at);

    retry_on_lock("enqueue_task", DEFAULT_MAX_LOCK_WAIT_MS, || async {
        sqlx::query(
            r#"
            INSERT INTO task_queue (id, name, args, kwargs, status, enqueued_at)
            VALUES (?, ?, ?, ?, 'PENDING', ?)
            "#,
        )
        .bind(&id)
        .bind(&record.name)
        .bind(&args)
        .bind(&kwargs)
        .bind(&enqueued_at)
        .execute(pool)
        .await?;
        Ok::<_, Error>(())
    })
    .await?;

    tracing::info!(task_id = %record.id, task = %record.name, "Task enqueued");

    Ok(record)
}

/// Claim the oldest pending task for `worker`, if any
pub async fn claim_next(pool: &SqlitePool, worker: &str) -> Result<Option<TaskRecord>> {
    let started_at = time::to_db_string(&time::now());

    let row = retry_on_lock("claim_task", DEFAULT_MAX_LOCK_WAIT_MS, || async {
        let row = sqlx::query(&format!(
            r#"
            UPDATE task_queue
            SET status = 'STARTED', worker = ?, started_at = ?
            WHERE id = (
                SELECT id FROM task_queue
                WHERE status = 'PENDING'
                ORDER BY enqueued_at ASC, rowid ASC
                LIMIT 1
            )
            AND status = 'PENDING'
            RETURNING {}
            "#,
            TASK_COLUMNS
        ))
        .bind(worker)
        .bind(&started_at)
        .fetch_optional(pool)
        .await?;
        Ok::<_, Error>(row)
    })
    .await?;

    row.as_ref().map(task_from_row).transpose()
}

/// Store a successful result
pub async fn mark_success(pool: &SqlitePool, id: Uuid, result: &serde_json::Value) -> Result<()> {
    let result = serde_json::to_string(result)?;
    finish(pool, id, TaskStatus::Success, Some(result), None).await
}

/// Store a failure
pub async fn mark_failure(pool: &SqlitePool, id: Uuid, error: &str) -> Result<()> {
    finish(pool, id, TaskStatus::Failure, None, Some(error.to_string())).await
}

async fn finish(
    pool: &SqlitePool,
    id: Uuid,
    status: TaskStatus,
    result: Option<String>,
    error: Option<String>,
) -> Result<()> {
    let id_str = id.to_string();
    let finished_at = time::to_db_string(&time::now());

    let rows = retry_on_lock("finish_task", DEFAULT_MAX_LOCK_WAIT_MS, || async {
        let done = sqlx::query(
            r#"
            UPDATE task_queue
            SET status = ?, result = ?, error = ?, finished_at = ?
            WHERE id = ? AND status = 'STARTED'
            "#,
        )
        .bind(status.as_str())
        .bind(&result)
        .bind(&error)
        .bind(&finished_at)
        .bind(&id_str)
        .execute(pool)
        .await?;
        Ok::<_, Error>(done.rows_affected())
    })
    .await?;

    if rows == 0 {
        return Err(Error::InvalidInput(format!(
            "Task {} is not in STARTED state",
            id
        )));
    }

    Ok(())
}

/// Look up a task and its result
pub async fn get_task(pool: &SqlitePool, id: Uuid) -> Result<Option<TaskRecord>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM task_queue WHERE id = ?",
        TASK_COLUMNS
    ))
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(task_from_row).transpose()
}

/// Number of tasks waiting to be claimed
pub async fn pending_count(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM task_queue WHERE status = 'PENDING'")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
