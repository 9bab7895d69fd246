mod common;

use axum::http::StatusCode;
use common::*;
use fake::faker::lorem::en::Sentence;
use fake::Fake;
use serde_json::json;

#[tokio::test]
async fn out_of_range_rating_is_rejected_and_nothing_is_stored() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .post("/property/7/comments", ALICE, json!({ "content": "nice", "rating": 6 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
    assert!(body["error"].as_str().unwrap().contains("rating"));
    assert_eq!(app.count("SELECT COUNT(*) FROM comments").await, 0);

    let (status, body) = app
        .post("/property/7/comments", ALICE, json!({ "content": "ok", "rating": 3 }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["comment"]["rating"], json!(3));
    assert_eq!(body["comment"]["likes_count"], json!(0));
    assert_eq!(app.count("SELECT COUNT(*) FROM comments").await, 1);
}

#[tokio::test]
async fn blank_content_and_missing_rating_are_validation_errors() {
    let app = TestApp::spawn().await;

    let (status, _) = app
        .post("/property/7/comments", ALICE, json!({ "content": "   ", "rating": 3 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post("/property/7/comments", ALICE, json!({ "content": "fine" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn only_the_owner_edits_and_owner_or_admin_deletes() {
    let app = TestApp::spawn().await;
    let mine = app.create_comment(ALICE, 7, "close to campus").await;

    let (status, body) = app
        .put(&format!("/comments/{mine}"), BOB, json!({ "content": "hijacked" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], json!(false));

    let (status, _) = app.delete(&format!("/comments/{mine}"), BOB).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // admins may delete but not edit
    let (status, _) = app
        .put(&format!("/comments/{mine}"), ADMIN, json!({ "content": "edited by admin" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .put(&format!("/comments/{mine}"), ALICE, json!({ "content": "very close to campus", "rating": 5 }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["comment"]["content"], json!("very close to campus"));
    assert_eq!(body["comment"]["rating"], json!(5));

    let (status, _) = app.delete(&format!("/comments/{mine}"), ALICE).await;
    assert_eq!(status, StatusCode::OK);

    let theirs = app.create_comment(BOB, 7, "noisy at night").await;
    let (status, _) = app.delete(&format!("/comments/{theirs}"), ADMIN).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.count("SELECT COUNT(*) FROM comments").await, 0);
}

#[tokio::test]
async fn anonymous_writes_need_authentication() {
    let app = TestApp::spawn().await;
    let (status, _) = app
        .call(
            axum::http::Method::POST,
            "/property/7/comments",
            None,
            Some(json!({ "content": "hi", "rating": 2 })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // reads stay public
    let (status, body) = app.get("/property/7/comments", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["comments"], json!([]));
}

#[tokio::test]
async fn liking_twice_restores_the_original_state() {
    let app = TestApp::spawn().await;
    let id = app.create_comment(ALICE, 7, "great value").await;
    let uri = format!("/comments/{id}/like");

    let (status, first) = app.post(&uri, BOB, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["is_liked"], json!(true));
    assert_eq!(first["likes_count"], json!(1));
    assert_eq!(first["liked_by"], json!([BOB_ID]));

    let (_, second) = app.post(&uri, BOB, json!({})).await;
    assert_eq!(second["is_liked"], json!(false));
    assert_eq!(second["likes_count"], json!(0));
    assert_eq!(app.count("SELECT COUNT(*) FROM comment_likes").await, 0);
}

#[tokio::test]
async fn liking_a_missing_comment_is_not_found() {
    let app = TestApp::spawn().await;
    let (status, body) = app.post("/comments/999/like", BOB, json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn deleting_a_comment_removes_everything_hanging_off_it() {
    let app = TestApp::spawn().await;
    let comment = app.create_comment(ALICE, 7, "spacious rooms").await;
    let mut replies = Vec::new();
    for _ in 0..3 {
        let text: String = Sentence(3..8).fake();
        replies.push(app.create_reply(BOB, comment, &text).await);
    }
    app.post(&format!("/comments/{comment}/like"), BOB, json!({})).await;
    app.post(&format!("/comments/{comment}/like"), LANDLORD, json!({})).await;
    app.post(&format!("/replies/{}/like", replies[0]), ALICE, json!({})).await;
    let (status, _) = app
        .post(
            "/report",
            BOB,
            json!({ "content_type": "comment", "content_id": comment, "reasons": ["spam"] }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = app
        .post(
            "/report",
            ALICE,
            json!({ "content_type": "reply", "content_id": replies[1], "reasons": ["offensive"] }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, detail) = app.get(&format!("/comments/{comment}"), None).await;
    assert_eq!(detail["comment"]["reply_count"], json!(3));
    assert_eq!(detail["comment"]["likes_count"], json!(2));
    assert_eq!(detail["comment"]["reports_count"], json!(1));

    let (status, _) = app.delete(&format!("/comments/{comment}"), ALICE).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(app.count("SELECT COUNT(*) FROM replies").await, 0);
    assert_eq!(app.count("SELECT COUNT(*) FROM comment_likes").await, 0);
    assert_eq!(app.count("SELECT COUNT(*) FROM reply_likes").await, 0);
    assert_eq!(app.count("SELECT COUNT(*) FROM reports").await, 0);
    let (status, _) = app.get(&format!("/comments/{comment}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn comments_list_newest_first_with_pagination() {
    let app = TestApp::spawn().await;
    for n in 0..3 {
        app.create_comment(ALICE, 9, &format!("comment {n}")).await;
    }
    app.create_comment(ALICE, 10, "other listing").await;

    let (status, body) = app.get("/property/9/comments?page=1&per_page=2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], json!(3));
    assert_eq!(body["pages"], json!(2));
    let comments = body["comments"].as_array().unwrap();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0]["content"], json!("comment 2"));
}

#[tokio::test]
async fn replies_are_owned_like_comments() {
    let app = TestApp::spawn().await;
    let comment = app.create_comment(ALICE, 7, "decent").await;
    let reply = app.create_reply(BOB, comment, "agreed").await;

    let (status, _) = app
        .put(&format!("/replies/{reply}"), ALICE, json!({ "content": "not yours" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .put(&format!("/replies/{reply}"), BOB, json!({ "content": "strongly agreed" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reply"]["content"], json!("strongly agreed"));
    assert_eq!(body["reply"]["comment_id"], json!(comment));

    let (_, listed) = app.get(&format!("/comments/{comment}/replies"), None).await;
    assert_eq!(listed["replies"].as_array().unwrap().len(), 1);

    let (status, _) = app.delete(&format!("/replies/{reply}"), ADMIN).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.count("SELECT COUNT(*) FROM replies").await, 0);
}
