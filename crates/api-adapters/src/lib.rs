//! offcampus/crates/api-adapters/src/lib.rs
//!
//! HTTP and WebSocket transport. Handlers stay thin: extract the request
//! context and input, call one service method, wrap the result in the
//! JSON envelope.

pub mod metrics;
pub mod rooms;
pub mod state;

#[cfg(feature = "web-axum")]
pub mod error;
#[cfg(feature = "web-axum")]
pub mod extract;
#[cfg(feature = "web-axum")]
pub mod handlers;
#[cfg(feature = "web-axum")]
pub mod middleware;
#[cfg(feature = "web-axum")]
pub mod response;
#[cfg(feature = "web-axum")]
pub mod ws;

pub use metrics::Metrics;
pub use rooms::RoomRegistry;
pub use state::AppState;

#[cfg(feature = "web-axum")]
use axum::routing::{get, post, put};
#[cfg(feature = "web-axum")]
use axum::Router;

/// The full route table with middleware applied.
#[cfg(feature = "web-axum")]
pub fn router(state: AppState) -> Router {
    use handlers::{chat, comments, discussion, moderation, ops};

    let content = Router::new()
        .route(
            "/property/{id}/comments",
            get(comments::list_comments).post(comments::create_comment),
        )
        .route(
            "/comments/{id}",
            get(comments::get_comment)
                .put(comments::update_comment)
                .delete(comments::delete_comment),
        )
        .route("/comments/{id}/like", post(comments::like_comment))
        .route(
            "/comments/{id}/replies",
            get(comments::list_replies).post(comments::create_reply),
        )
        .route(
            "/replies/{id}",
            put(comments::update_reply).delete(comments::delete_reply),
        )
        .route("/replies/{id}/like", post(comments::like_reply));

    let board = Router::new()
        .route(
            "/topics",
            get(discussion::list_topics).post(discussion::create_topic),
        )
        .route(
            "/topics/{id}",
            get(discussion::get_topic)
                .put(discussion::update_topic)
                .delete(discussion::delete_topic),
        )
        .route("/topics/{id}/pin", post(discussion::pin_topic))
        .route(
            "/topics/{id}/posts",
            get(discussion::list_posts).post(discussion::create_post),
        )
        .route(
            "/posts/{id}",
            put(discussion::update_post).delete(discussion::delete_post),
        )
        .route("/posts/{id}/pin", post(discussion::pin_post))
        .route("/posts/{id}/like", post(discussion::like_post))
        .route(
            "/posts/{id}/replies",
            get(discussion::list_post_replies).post(discussion::create_post_reply),
        );

    let admin = Router::new()
        .route("/report", post(moderation::file_report))
        .route("/admin/reports", get(moderation::list_reports))
        .route(
            "/admin/reports/{id}",
            get(moderation::get_report).put(moderation::update_report),
        );

    let realtime = Router::new()
        .route("/chat/history", get(chat::history))
        .route("/chat/messages", post(chat::send_message))
        .route("/ws", get(ws::upgrade));

    let app = Router::new()
        .route("/health", get(ops::health))
        .route("/metrics", get(ops::metrics))
        .merge(content)
        .merge(board)
        .merge(admin)
        .merge(realtime)
        .with_state(state);

    middleware::apply(app)
}
