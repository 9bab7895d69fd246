//! Concurrent writers against a file-backed store with a multi-connection
//! pool, the way the binary runs it.

use std::sync::Arc;

use domains::ports::{CommentRepository, ContentStore};
use domains::{Actor, DomainError, NewComment, Rating, RequestContext, Role};
use services::{CommentService, ModerationService, ReportDraft};
use storage_adapters::SqliteStore;
use tempfile::TempDir;

async fn file_store(dir: &TempDir) -> Arc<SqliteStore> {
    let url = format!("sqlite://{}", dir.path().join("offcampus.db").display());
    Arc::new(SqliteStore::connect(&url, 4).await.expect("file-backed sqlite"))
}

async fn seed_comment(store: &SqliteStore) -> i64 {
    let mut uow = store.begin_write().await.unwrap();
    let comment = uow
        .insert_comment(NewComment {
            property_id: 7,
            author_id: 1,
            content: "Thin walls but cheap".into(),
            rating: Rating::new(3).unwrap(),
        })
        .await
        .unwrap();
    uow.commit().await.unwrap();
    comment.id
}

fn student(id: i64) -> RequestContext {
    RequestContext::authenticated(Actor::new(id, Role::Student))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn same_user_double_toggle_settles_cleanly() {
    let dir = TempDir::new().unwrap();
    let store = file_store(&dir).await;
    let comments = Arc::new(CommentService::new(store.clone()));
    let id = seed_comment(&store).await;

    for _ in 0..25 {
        let (a, b) = (comments.clone(), comments.clone());
        let first = tokio::spawn(async move { a.toggle_comment_like(&student(10), id).await });
        let second = tokio::spawn(async move { b.toggle_comment_like(&student(10), id).await });
        let first = first.await.unwrap().expect("toggle must not fail under contention");
        let second = second.await.unwrap().expect("toggle must not fail under contention");

        assert_ne!(first.is_liked, second.is_liked);
        let view = comments.get_comment(id).await.unwrap();
        assert_eq!(view.engagement.likes_count, 0);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn likes_from_different_users_both_land() {
    let dir = TempDir::new().unwrap();
    let store = file_store(&dir).await;
    let comments = Arc::new(CommentService::new(store.clone()));

    for _ in 0..25 {
        let id = seed_comment(&store).await;
        let (a, b) = (comments.clone(), comments.clone());
        let alice = tokio::spawn(async move { a.toggle_comment_like(&student(10), id).await });
        let bob = tokio::spawn(async move { b.toggle_comment_like(&student(11), id).await });

        assert!(alice.await.unwrap().unwrap().is_liked);
        assert!(bob.await.unwrap().unwrap().is_liked);
        let view = comments.get_comment(id).await.unwrap();
        assert_eq!(view.engagement.likes_count, 2);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_reports_leave_one_row() {
    let dir = TempDir::new().unwrap();
    let store = file_store(&dir).await;
    let moderation = Arc::new(ModerationService::new(store.clone()));
    let id = seed_comment(&store).await;

    let draft = ReportDraft {
        content_type: "comment".into(),
        content_id: Some(id),
        reasons: vec!["harassment".into()],
        description: None,
    };
    let (a, b) = (moderation.clone(), moderation.clone());
    let (da, db) = (draft.clone(), draft);
    let first = tokio::spawn(async move { a.file_report(&student(12), da).await });
    let second = tokio::spawn(async move { b.file_report(&student(12), db).await });
    let outcomes = [first.await.unwrap(), second.await.unwrap()];

    let filed: Vec<_> = outcomes.iter().filter_map(|o| o.as_ref().ok()).collect();
    assert_eq!(filed.len(), 1);
    let loser = outcomes.iter().find_map(|o| o.as_ref().err()).expect("one report is refused");
    match loser {
        DomainError::DuplicateReport(existing) => assert_eq!(existing.id, filed[0].id),
        other => panic!("unexpected {other:?}"),
    }

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reports")
        .fetch_one(store.pool())
        .await
        .unwrap();
    assert_eq!(rows, 1);
}
