//! Evidence database operations
//!
//! Evidence rows carry their tags as a JSON array; claim links live in
//! `evidence_claim_links` and are attached on every read.

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use uuid::Uuid;

use super::models::{
    initial_reliability, ClaimLink, Evidence, EvidenceStatistics, EvidenceType, LinkType,
    NewEvidence,
};
use super::statements::require_statement_in_session;
use crate::{time, uuid_utils, Error, Result};

const EVIDENCE_COLUMNS: &str = "id, session_id, content, evidence_type, source, \
     reliability_score, reliability_reason, tags, created_at, updated_at, last_verified_at";

/// Maximum characters of one tag
pub const MAX_TAG_LEN: usize = 50;

fn evidence_from_row(row: &SqliteRow) -> Result<Evidence> {
    let id: String = row.get("id");
    let session_id: String = row.get("session_id");
    let evidence_type: String = row.get("evidence_type");
    let tags: String = row.get("tags");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");
    let last_verified_at: Option<String> = row.get("last_verified_at");

    Ok(Evidence {
        id: uuid_utils::parse_column("evidence.id", &id)?,
        session_id: uuid_utils::parse_column("evidence.session_id", &session_id)?,
        content: row.get("content"),
        evidence_type: evidence_type.parse()?,
        source: row.get("source"),
        reliability_score: row.get("reliability_score"),
        reliability_reason: row.get("reliability_reason"),
        tags: serde_json::from_str(&tags)?,
        linked_claims: Vec::new(),
        created_at: time::parse(&created_at)?,
        updated_at: time::parse(&updated_at)?,
        last_verified_at: last_verified_at.map(|s| time::parse(&s)).transpose()?,
    })
}

fn link_from_row(row: &SqliteRow) -> Result<(Uuid, ClaimLink)> {
    let evidence_id: String = row.get("evidence_id");
    let statement_id: String = row.get("statement_id");
    let link_type: String = row.get("link_type");
    let created_at: String = row.get("created_at");

    Ok((
        uuid_utils::parse_column("evidence_claim_links.evidence_id", &evidence_id)?,
        ClaimLink {
            claim_id: uuid_utils::parse_column("evidence_claim_links.statement_id", &statement_id)?,
            link_type: link_type.parse()?,
            strength: row.get("strength"),
            created_at: time::parse(&created_at)?,
        },
    ))
}

/// Fill `linked_claims` of evidence rows belonging to one session
async fn attach_links(pool: &SqlitePool, session_id: Uuid, rows: &[SqliteRow]) -> Result<Vec<Evidence>> {
    let link_rows = sqlx::query(
        r#"
        SELECT l.evidence_id, l.statement_id, l.link_type, l.strength, l.created_at
        FROM evidence_claim_links l
        JOIN evidence e ON e.id = l.evidence_id
        WHERE e.session_id = ?
        ORDER BY l.created_at ASC, l.rowid ASC
        "#,
    )
    .bind(session_id.to_string())
    .fetch_all(pool)
    .await?;

    let mut links: HashMap<Uuid, Vec<ClaimLink>> = HashMap::new();
    for row in &link_rows {
        let (evidence_id, link) = link_from_row(row)?;
        links.entry(evidence_id).or_default().push(link);
    }

    rows.iter()
        .map(|row| {
            let mut evidence = evidence_from_row(row)?;
            evidence.linked_claims = links.remove(&evidence.id).unwrap_or_default();
            Ok(evidence)
        })
        .collect()
}

/// Record an evidence item; its reliability is derived from type and source
pub async fn create_evidence(pool: &SqlitePool, new: NewEvidence) -> Result<Evidence> {
    new.validate()?;

    let now = time::now();
    let evidence = Evidence {
        id: uuid_utils::generate(),
        session_id: new.session_id,
        reliability_score: initial_reliability(new.evidence_type, &new.source),
        content: new.content,
        evidence_type: new.evidence_type,
        source: new.source,
        reliability_reason: None,
        tags: Vec::new(),
        linked_claims: Vec::new(),
        created_at: now,
        updated_at: now,
        last_verified_at: None,
    };

    sqlx::query(
        r#"
        INSERT INTO evidence (
            id, session_id, content, evidence_type, source,
            reliability_score, tags, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, '[]', ?, ?)
        "#,
    )
    .bind(evidence.id.to_string())
    .bind(evidence.session_id.to_string())
    .bind(&evidence.content)
    .bind(evidence.evidence_type.as_str())
    .bind(&evidence.source)
    .bind(evidence.reliability_score)
    .bind(time::to_db_string(&evidence.created_at))
    .bind(time::to_db_string(&evidence.updated_at))
    .execute(pool)
    .await?;

    tracing::debug!(
        evidence_id = %evidence.id,
        session_id = %evidence.session_id,
        reliability = evidence.reliability_score,
        "Created evidence"
    );

    Ok(evidence)
}

pub async fn get_evidence(pool: &SqlitePool, id: Uuid) -> Result<Option<Evidence>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM evidence WHERE id = ?",
        EVIDENCE_COLUMNS
    ))
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };
    let mut evidence = evidence_from_row(&row)?;

    let link_rows = sqlx::query(
        "SELECT evidence_id, statement_id, link_type, strength, created_at \
         FROM evidence_claim_links WHERE evidence_id = ? ORDER BY created_at ASC, rowid ASC",
    )
    .bind(id.to_string())
    .fetch_all(pool)
    .await?;
    evidence.linked_claims = link_rows
        .iter()
        .map(|row| link_from_row(row).map(|(_, link)| link))
        .collect::<Result<_>>()?;

    Ok(Some(evidence))
}

/// A session's evidence, newest first
pub async fn list_evidence(pool: &SqlitePool, session_id: Uuid) -> Result<Vec<Evidence>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM evidence WHERE session_id = ? ORDER BY created_at DESC, rowid DESC",
        EVIDENCE_COLUMNS
    ))
    .bind(session_id.to_string())
    .fetch_all(pool)
    .await?;

    attach_links(pool, session_id, &rows).await
}

/// A session's evidence of one type, most reliable first
pub async fn list_evidence_by_type(
    pool: &SqlitePool,
    session_id: Uuid,
    evidence_type: EvidenceType,
) -> Result<Vec<Evidence>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM evidence WHERE session_id = ? AND evidence_type = ? \
         ORDER BY reliability_score DESC, created_at DESC",
        EVIDENCE_COLUMNS
    ))
    .bind(session_id.to_string())
    .bind(evidence_type.as_str())
    .fetch_all(pool)
    .await?;

    attach_links(pool, session_id, &rows).await
}

/// Evidence linked to research statement `claim_id`, most reliable first
pub async fn evidence_for_claim(
    pool: &SqlitePool,
    session_id: Uuid,
    claim_id: Uuid,
) -> Result<Vec<Evidence>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM evidence WHERE session_id = ? AND id IN \
         (SELECT evidence_id FROM evidence_claim_links WHERE statement_id = ?) \
         ORDER BY reliability_score DESC, created_at DESC",
        EVIDENCE_COLUMNS
    ))
    .bind(session_id.to_string())
    .bind(claim_id.to_string())
    .fetch_all(pool)
    .await?;

    attach_links(pool, session_id, &rows).await
}

/// Link evidence to a research statement of the same session
///
/// Strength is the evidence's current reliability scaled by the link type.
/// Linking the same pair again replaces the earlier link.
pub async fn link_claim(
    pool: &SqlitePool,
    evidence_id: Uuid,
    claim_id: Uuid,
    link_type: LinkType,
) -> Result<Option<Evidence>> {
    let Some(evidence) = get_evidence(pool, evidence_id).await? else {
        return Ok(None);
    };
    require_statement_in_session(pool, evidence.session_id, claim_id).await?;

    let strength = link_type.strength(evidence.reliability_score);
    let now = time::to_db_string(&time::now());

    sqlx::query(
        r#"
        INSERT INTO evidence_claim_links (evidence_id, statement_id, link_type, strength, created_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT (evidence_id, statement_id) DO UPDATE SET
            link_type = excluded.link_type,
            strength = excluded.strength,
            created_at = excluded.created_at
        "#,
    )
    .bind(evidence_id.to_string())
    .bind(claim_id.to_string())
    .bind(link_type.as_str())
    .bind(strength)
    .bind(&now)
    .execute(pool)
    .await?;

    sqlx::query("UPDATE evidence SET updated_at = ? WHERE id = ?")
        .bind(&now)
        .bind(evidence_id.to_string())
        .execute(pool)
        .await?;

    tracing::info!(
        evidence_id = %evidence_id,
        claim_id = %claim_id,
        link_type = %link_type,
        strength,
        "Linked evidence to claim"
    );

    get_evidence(pool, evidence_id).await
}

/// Set a verified reliability score, clamped to 0.0..=1.0
///
/// Existing claim links keep the strength computed when they were made.
pub async fn update_reliability(
    pool: &SqlitePool,
    id: Uuid,
    score: f64,
    reason: Option<String>,
) -> Result<Option<Evidence>> {
    if !score.is_finite() {
        return Err(Error::InvalidInput(format!("Reliability score must be a number, got {}", score)));
    }
    let Some(mut evidence) = get_evidence(pool, id).await? else {
        return Ok(None);
    };

    let now = time::now();
    evidence.reliability_score = score.clamp(0.0, 1.0);
    evidence.reliability_reason = reason;
    evidence.last_verified_at = Some(now);
    evidence.updated_at = now;

    sqlx::query(
        r#"
        UPDATE evidence
        SET reliability_score = ?, reliability_reason = ?, last_verified_at = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(evidence.reliability_score)
    .bind(&evidence.reliability_reason)
    .bind(time::to_db_string(&now))
    .bind(time::to_db_string(&now))
    .bind(id.to_string())
    .execute(pool)
    .await?;

    Ok(Some(evidence))
}

/// Add tags, trimmed; tags already present are skipped
pub async fn add_tags(pool: &SqlitePool, id: Uuid, tags: Vec<String>) -> Result<Option<Evidence>> {
    let mut cleaned = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_string();
        if tag.is_empty() || tag.chars().count() > MAX_TAG_LEN {
            return Err(Error::InvalidInput(format!(
                "Tags must be 1-{} characters",
                MAX_TAG_LEN
            )));
        }
        cleaned.push(tag);
    }

    let Some(mut evidence) = get_evidence(pool, id).await? else {
        return Ok(None);
    };

    for tag in cleaned {
        if !evidence.tags.contains(&tag) {
            evidence.tags.push(tag);
        }
    }
    evidence.updated_at = time::now();

    sqlx::query("UPDATE evidence SET tags = ?, updated_at = ? WHERE id = ?")
        .bind(serde_json::to_string(&evidence.tags)?)
        .bind(time::to_db_string(&evidence.updated_at))
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(Some(evidence))
}

/// Evidence whose content, source or a tag contains `term`
/// (case-insensitive), most reliable first
pub async fn search_evidence(pool: &SqlitePool, session_id: Uuid, term: &str) -> Result<Vec<Evidence>> {
    let term = term.to_lowercase();
    let mut matches: Vec<Evidence> = list_evidence(pool, session_id)
        .await?
        .into_iter()
        .filter(|e| {
            e.content.to_lowercase().contains(&term)
                || e.source.to_lowercase().contains(&term)
                || e.tags.iter().any(|tag| tag.to_lowercase().contains(&term))
        })
        .collect();

    // Stable sort keeps newest-first among equal scores
    matches.sort_by(|a, b| b.reliability_score.total_cmp(&a.reliability_score));
    Ok(matches)
}

pub async fn evidence_statistics(pool: &SqlitePool, session_id: Uuid) -> Result<EvidenceStatistics> {
    let row = sqlx::query(
        r#"
        SELECT
            COUNT(*) AS total,
            COALESCE(SUM(evidence_type = 'PRIMARY'), 0) AS primary_count,
            COALESCE(SUM(evidence_type = 'SECONDARY'), 0) AS secondary_count,
            COALESCE(SUM(evidence_type = 'TERTIARY'), 0) AS tertiary_count,
            COALESCE(AVG(reliability_score), 0.0) AS average_reliability,
            COALESCE(SUM(EXISTS (
                SELECT 1 FROM evidence_claim_links l WHERE l.evidence_id = evidence.id
            )), 0) AS linked_count
        FROM evidence
        WHERE session_id = ?
        "#,
    )
    .bind(session_id.to_string())
    .fetch_one(pool)
    .await?;

    Ok(EvidenceStatistics {
        total_evidence: row.get("total"),
        primary_count: row.get("primary_count"),
        secondary_count: row.get("secondary_count"),
        tertiary_count: row.get("tertiary_count"),
        average_reliability: row.get("average_reliability"),
        linked_count: row.get("linked_count"),
    })
}
