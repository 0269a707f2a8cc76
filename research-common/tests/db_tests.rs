//! Tests for the research data model
//!
//! Covers session defaults, cascade deletion, SET NULL on source message
//! deletion, listing order and updated_at refresh.

use research_common::db::{
    artifacts, init_database, init_memory_database, messages, sessions, ArtifactType,
    MessageRole, NewArtifact, NewMessage, NewSession, SessionUpdate, DEFAULT_SESSION_TITLE,
};
use research_common::Error;
use uuid::Uuid;

fn claim(title: &str, source_message: Option<Uuid>) -> NewArtifact {
    NewArtifact {
        artifact_type: ArtifactType::Claim,
        title: title.to_string(),
        content: format!("{} content", title),
        source_message,
        confidence_score: None,
    }
}

#[tokio::test]
async fn test_session_defaults() {
    let pool = init_memory_database().await.unwrap();

    let session = sessions::create_session(&pool, NewSession::default()).await.unwrap();

    assert_eq!(session.title, DEFAULT_SESSION_TITLE);
    assert_eq!(session.title, "New Research Session");
    assert_eq!(session.methodology, "inquiry_cycle");
    assert!(session.is_active);
    assert!(session.research_question.is_none());
    assert_eq!(session.created_at, session.updated_at);

    let loaded = sessions::get_session(&pool, session.id).await.unwrap().unwrap();
    assert_eq!(loaded, session);
}

#[tokio::test]
async fn test_session_title_over_limit_rejected() {
    let pool = init_memory_database().await.unwrap();

    let result = sessions::create_session(
        &pool,
        NewSession {
            title: Some("t".repeat(256)),
            ..Default::default()
        },
    )
    .await;

    assert!(matches!(result, Err(Error::InvalidInput(_))));
}

#[tokio::test]
async fn test_delete_session_cascades_to_messages_and_artifacts() {
    let pool = init_memory_database().await.unwrap();
    let session = sessions::create_session(&pool, NewSession::default()).await.unwrap();
    let other = sessions::create_session(&pool, NewSession::default()).await.unwrap();

    let message = messages::insert_message(&pool, session.id, NewMessage::new(MessageRole::User, "What causes tides?"))
        .await
        .unwrap();
    artifacts::insert_artifact(&pool, session.id, claim("Moon", Some(message.id)))
        .await
        .unwrap();
    messages::insert_message(&pool, other.id, NewMessage::new(MessageRole::User, "Unrelated"))
        .await
        .unwrap();

    assert!(sessions::delete_session(&pool, session.id).await.unwrap());

    assert!(sessions::get_session(&pool, session.id).await.unwrap().is_none());
    assert!(messages::list_messages(&pool, session.id).await.unwrap().is_empty());
    assert!(artifacts::list_artifacts(&pool, session.id, None).await.unwrap().is_empty());
    assert!(messages::get_message(&pool, message.id).await.unwrap().is_none());

    // Other sessions are untouched
    assert_eq!(messages::list_messages(&pool, other.id).await.unwrap().len(), 1);

    // Deleting again reports nothing deleted
    assert!(!sessions::delete_session(&pool, session.id).await.unwrap());
}

#[tokio::test]
async fn test_deleting_source_message_nulls_artifact_reference() {
    let pool = init_memory_database().await.unwrap();
    let session = sessions::create_session(&pool, NewSession::default()).await.unwrap();

    let message = messages::insert_message(
        &pool,
        session.id,
        NewMessage::new(MessageRole::Claude, "Studies indicate tides follow the moon."),
    )
    .await
    .unwrap();
    let artifact = artifacts::insert_artifact(&pool, session.id, claim("Tides", Some(message.id)))
        .await
        .unwrap();
    assert_eq!(artifact.source_message, Some(message.id));

    assert!(messages::delete_message(&pool, message.id).await.unwrap());

    let reloaded = artifacts::get_artifact(&pool, artifact.id).await.unwrap().unwrap();
    assert_eq!(reloaded.source_message, None);
    assert_eq!(reloaded.title, "Tides");
}

#[tokio::test]
async fn test_messages_listed_oldest_first() {
    let pool = init_memory_database().await.unwrap();
    let session = sessions::create_session(&pool, NewSession::default()).await.unwrap();

    for content in ["first", "second", "third"] {
        messages::insert_message(&pool, session.id, NewMessage::new(MessageRole::User, content))
            .await
            .unwrap();
    }

    let listed: Vec<String> = messages::list_messages(&pool, session.id)
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.content)
        .collect();
    assert_eq!(listed, vec!["first", "second", "third"]);
}

#[tokio::test]
async fn test_message_metadata_round_trips_and_defaults_to_empty_object() {
    let pool = init_memory_database().await.unwrap();
    let session = sessions::create_session(&pool, NewSession::default()).await.unwrap();

    let plain = messages::insert_message(&pool, session.id, NewMessage::new(MessageRole::User, "hi"))
        .await
        .unwrap();
    let tagged = messages::insert_message(
        &pool,
        session.id,
        NewMessage::new(MessageRole::Grok, "hello").with_metadata(serde_json::json!({"model": "Grok-2"})),
    )
    .await
    .unwrap();

    let plain = messages::get_message(&pool, plain.id).await.unwrap().unwrap();
    let tagged = messages::get_message(&pool, tagged.id).await.unwrap().unwrap();
    assert_eq!(plain.metadata, serde_json::json!({}));
    assert_eq!(tagged.metadata["model"], "Grok-2");
    assert_eq!(tagged.role, MessageRole::Grok);
}

#[tokio::test]
async fn test_artifacts_listed_newest_first_and_filtered_by_type() {
    let pool = init_memory_database().await.unwrap();
    let session = sessions::create_session(&pool, NewSession::default()).await.unwrap();

    artifacts::insert_artifact(&pool, session.id, claim("older", None)).await.unwrap();
    artifacts::insert_artifact(
        &pool,
        session.id,
        NewArtifact {
            artifact_type: ArtifactType::Hypothesis,
            title: "guess".to_string(),
            content: "maybe".to_string(),
            source_message: None,
            confidence_score: Some(0.4),
        },
    )
    .await
    .unwrap();
    artifacts::insert_artifact(&pool, session.id, claim("newer", None)).await.unwrap();

    let all = artifacts::list_artifacts(&pool, session.id, None).await.unwrap();
    let titles: Vec<&str> = all.iter().map(|a| a.title.as_str()).collect();
    assert_eq!(titles, vec!["newer", "guess", "older"]);

    let claims = artifacts::list_artifacts(&pool, session.id, Some(ArtifactType::Claim))
        .await
        .unwrap();
    assert_eq!(claims.len(), 2);
    assert!(claims.iter().all(|a| a.confidence_score == 0.0));
}

#[tokio::test]
async fn test_source_message_must_belong_to_session() {
    let pool = init_memory_database().await.unwrap();
    let a = sessions::create_session(&pool, NewSession::default()).await.unwrap();
    let b = sessions::create_session(&pool, NewSession::default()).await.unwrap();
    let message = messages::insert_message(&pool, a.id, NewMessage::new(MessageRole::User, "x"))
        .await
        .unwrap();

    assert!(artifacts::validate_source_message(&pool, a.id, message.id).await.is_ok());
    assert!(matches!(
        artifacts::validate_source_message(&pool, b.id, message.id).await,
        Err(Error::InvalidInput(_))
    ));
    assert!(matches!(
        artifacts::validate_source_message(&pool, a.id, Uuid::new_v4()).await,
        Err(Error::NotFound(_))
    ));
}

#[tokio::test]
async fn test_message_for_missing_session_violates_foreign_key() {
    let pool = init_memory_database().await.unwrap();

    let result = messages::insert_message(&pool, Uuid::new_v4(), NewMessage::new(MessageRole::User, "orphan")).await;

    assert!(matches!(result, Err(Error::Database(_))));
}

#[tokio::test]
async fn test_update_and_deactivate_refresh_updated_at() {
    let pool = init_memory_database().await.unwrap();
    let session = sessions::create_session(&pool, NewSession::default()).await.unwrap();

    let updated = sessions::update_session(
        &pool,
        session.id,
        SessionUpdate {
            title: Some("Ocean tides".to_string()),
            research_question: Some("Why two tides a day?".to_string()),
            methodology: None,
        },
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(updated.id, session.id);
    assert_eq!(updated.created_at, session.created_at);
    assert!(updated.updated_at > session.updated_at);
    assert_eq!(updated.title, "Ocean tides");
    assert_eq!(updated.methodology, "inquiry_cycle");

    let deactivated = sessions::deactivate_session(&pool, session.id).await.unwrap().unwrap();
    assert!(!deactivated.is_active);
    assert!(deactivated.updated_at > updated.updated_at);

    let reloaded = sessions::get_session(&pool, session.id).await.unwrap().unwrap();
    assert_eq!(reloaded, deactivated);
}

#[tokio::test]
async fn test_list_sessions_hides_inactive_by_default() {
    let pool = init_memory_database().await.unwrap();
    let kept = sessions::create_session(&pool, NewSession::default()).await.unwrap();
    let dropped = sessions::create_session(&pool, NewSession::default()).await.unwrap();
    sessions::deactivate_session(&pool, dropped.id).await.unwrap();

    let active = sessions::list_sessions(&pool, false).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, kept.id);

    // Most recently updated first
    let all = sessions::list_sessions(&pool, true).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id, dropped.id);
}

#[tokio::test]
async fn test_missing_session_operations_return_none() {
    let pool = init_memory_database().await.unwrap();
    let id = Uuid::new_v4();

    assert!(sessions::update_session(&pool, id, SessionUpdate::default()).await.unwrap().is_none());
    assert!(sessions::deactivate_session(&pool, id).await.unwrap().is_none());
    assert!(matches!(sessions::require_session(&pool, id).await, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_file_database_enforces_foreign_keys_on_every_connection() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("nested").join("research.db");

    let pool = init_database(&db_path).await.unwrap();
    assert!(db_path.exists());

    let session = sessions::create_session(&pool, NewSession::default()).await.unwrap();
    messages::insert_message(&pool, session.id, NewMessage::new(MessageRole::User, "hello"))
        .await
        .unwrap();

    // Run enough statements to touch several pooled connections
    for _ in 0..5 {
        let fk: i64 = sqlx::query_scalar("PRAGMA foreign_keys").fetch_one(&pool).await.unwrap();
        assert_eq!(fk, 1);
    }

    sessions::delete_session(&pool, session.id).await.unwrap();
    assert!(messages::list_messages(&pool, session.id).await.unwrap().is_empty());

    // Re-opening runs the idempotent schema creation again
    drop(pool);
    let reopened = init_database(&db_path).await.unwrap();
    assert!(sessions::list_sessions(&reopened, true).await.unwrap().is_empty());
}
