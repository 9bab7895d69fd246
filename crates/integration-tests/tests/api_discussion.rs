mod common;

use axum::http::StatusCode;
use common::*;
use serde_json::{json, Value};

async fn create_topic(app: &TestApp, token: &str, title: &str) -> i64 {
    let (status, body) = app
        .post("/topics", token, json!({ "title": title, "description": "spring term" }))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["topic"]["id"].as_i64().unwrap()
}

async fn create_post(app: &TestApp, token: &str, topic: i64, content: &str) -> i64 {
    let (status, body) = app
        .post(&format!("/topics/{topic}/posts"), token, json!({ "content": content }))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["post"]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn pinned_topics_list_first() {
    let app = TestApp::spawn().await;
    let older = create_topic(&app, ALICE, "Sublets near the library").await;
    let newer = create_topic(&app, BOB, "Bike storage").await;

    let (status, body) = app.post(&format!("/topics/{older}/pin"), ALICE, json!({})).await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{body}");

    let (status, body) = app.post(&format!("/topics/{older}/pin"), ADMIN, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_pinned"], json!(true));

    let (_, listed) = app.get("/topics", None).await;
    assert_eq!(listed["topics"][0]["id"], json!(older));
    assert_eq!(listed["topics"][1]["id"], json!(newer));
    assert_eq!(listed["topics"][0]["post_count"], json!(0));

    let (_, body) = app.post(&format!("/topics/{older}/pin"), ADMIN, json!({})).await;
    assert_eq!(body["is_pinned"], json!(false));
}

#[tokio::test]
async fn reading_a_topic_counts_views() {
    let app = TestApp::spawn().await;
    let topic = create_topic(&app, ALICE, "Laundry rooms").await;

    app.get(&format!("/topics/{topic}"), None).await;
    let (status, body) = app.get(&format!("/topics/{topic}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["topic"]["view_count"], json!(2));

    let (status, _) = app.get("/topics/404", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn topics_are_edited_by_their_creator() {
    let app = TestApp::spawn().await;
    let topic = create_topic(&app, ALICE, "Parking permits").await;

    let (status, _) = app
        .put(&format!("/topics/{topic}"), BOB, json!({ "title": "Mine now" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .put(&format!("/topics/{topic}"), ALICE, json!({ "title": "Parking permits 2025" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["topic"]["title"], json!("Parking permits 2025"));
    assert_eq!(body["topic"]["description"], json!("spring term"));

    let (status, body) = app
        .put(&format!("/topics/{topic}"), ALICE, json!({ "description": "  " }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["topic"]["description"], Value::Null);
    assert_eq!(body["topic"]["title"], json!("Parking permits 2025"));

    let (status, _) = app.post("/topics", ALICE, json!({ "title": "  " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn posts_pin_like_and_reply() {
    let app = TestApp::spawn().await;
    let topic = create_topic(&app, ALICE, "Moving out checklist").await;
    let first = create_post(&app, ALICE, topic, "Photograph everything").await;
    let second = create_post(&app, BOB, topic, "Return the keys in person").await;

    let (status, body) = app.post(&format!("/posts/{second}/pin"), ADMIN, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_pinned"], json!(true));

    let (_, listed) = app.get(&format!("/topics/{topic}/posts"), None).await;
    assert_eq!(listed["posts"][0]["id"], json!(second));
    assert_eq!(listed["posts"][1]["id"], json!(first));

    let (_, liked) = app.post(&format!("/posts/{first}/like"), BOB, json!({})).await;
    assert_eq!(liked["is_liked"], json!(true));
    assert_eq!(liked["likes_count"], json!(1));

    let (status, reply) = app
        .post(&format!("/posts/{first}/replies"), BOB, json!({ "content": "and the meter readings" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(reply["reply"]["post_id"], json!(first));

    let (_, replies) = app.get(&format!("/posts/{first}/replies"), None).await;
    assert_eq!(replies["total"], json!(1));

    let (_, listed) = app.get(&format!("/topics/{topic}/posts"), None).await;
    assert_eq!(listed["posts"][1]["reply_count"], json!(1));
    assert_eq!(listed["posts"][1]["liked_by"], json!([BOB_ID]));
}

#[tokio::test]
async fn posting_into_a_missing_topic_is_not_found() {
    let app = TestApp::spawn().await;
    let (status, _) = app.post("/topics/77/posts", ALICE, json!({ "content": "hello" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.get("/topics/77/posts", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_a_topic_takes_its_posts_along() {
    let app = TestApp::spawn().await;
    let topic = create_topic(&app, ALICE, "Quiet hours").await;
    let post = create_post(&app, BOB, topic, "After 10pm please").await;
    app.post(&format!("/posts/{post}/like"), ALICE, json!({})).await;
    app.post(&format!("/posts/{post}/replies"), ALICE, json!({ "content": "agreed" }))
        .await;

    let (status, _) = app.delete(&format!("/topics/{topic}"), BOB).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.delete(&format!("/topics/{topic}"), ADMIN).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.count("SELECT COUNT(*) FROM topics").await, 0);
    assert_eq!(app.count("SELECT COUNT(*) FROM posts").await, 0);
    assert_eq!(app.count("SELECT COUNT(*) FROM post_likes").await, 0);
    assert_eq!(app.count("SELECT COUNT(*) FROM replies").await, 0);
}

#[tokio::test]
async fn post_authors_edit_and_delete_their_posts() {
    let app = TestApp::spawn().await;
    let topic = create_topic(&app, ALICE, "Heating").await;
    let post = create_post(&app, BOB, topic, "Radiators are cold").await;

    let (status, _) = app
        .put(&format!("/posts/{post}"), ALICE, json!({ "content": "edited" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .put(&format!("/posts/{post}"), BOB, json!({ "content": "Fixed now" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["post"]["content"], json!("Fixed now"));

    let (status, _) = app.delete(&format!("/posts/{post}"), BOB).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.count("SELECT COUNT(*) FROM posts").await, 0);
}
