//! Discussion board: topics, posts and post replies.

use axum::extract::State;
use domains::{PostId, TopicId};
use services::{page_size, PostDraft, ReplyDraft, TopicDraft, TopicEdit};

use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery, Identity, PageQuery};
use crate::response::Envelope;
use crate::state::AppState;

pub async fn list_topics(State(state): State<AppState>, ApiQuery(query): ApiQuery<PageQuery>) -> ApiResult<Envelope> {
    let page = state.discussion.list_topics(query.request(page_size::TOPICS)).await?;
    Ok(Envelope::ok().page("topics", page))
}

/// Counts as a view.
pub async fn get_topic(State(state): State<AppState>, ApiPath(id): ApiPath<TopicId>) -> ApiResult<Envelope> {
    let topic = state.discussion.get_topic(id).await?;
    Ok(Envelope::ok().with("topic", topic))
}

pub async fn create_topic(
    State(state): State<AppState>,
    Identity(ctx): Identity,
    ApiJson(draft): ApiJson<TopicDraft>,
) -> ApiResult<Envelope> {
    let topic = state.discussion.create_topic(&ctx, draft).await?;
    state.metrics.mutation("topic", "create");
    Ok(Envelope::created().with("topic", topic))
}

pub async fn update_topic(
    State(state): State<AppState>,
    Identity(ctx): Identity,
    ApiPath(id): ApiPath<TopicId>,
    ApiJson(edit): ApiJson<TopicEdit>,
) -> ApiResult<Envelope> {
    let topic = state.discussion.update_topic(&ctx, id, edit).await?;
    state.metrics.mutation("topic", "update");
    Ok(Envelope::ok().with("topic", topic))
}

pub async fn delete_topic(
    State(state): State<AppState>,
    Identity(ctx): Identity,
    ApiPath(id): ApiPath<TopicId>,
) -> ApiResult<Envelope> {
    state.discussion.delete_topic(&ctx, id).await?;
    state.metrics.mutation("topic", "delete");
    Ok(Envelope::ok().message("Topic deleted successfully"))
}

pub async fn pin_topic(
    State(state): State<AppState>,
    Identity(ctx): Identity,
    ApiPath(id): ApiPath<TopicId>,
) -> ApiResult<Envelope> {
    let topic = state.discussion.toggle_topic_pin(&ctx, id).await?;
    state.metrics.mutation("topic", "pin");
    Ok(Envelope::ok().with("is_pinned", topic.is_pinned).with("topic", topic))
}

pub async fn list_posts(
    State(state): State<AppState>,
    ApiPath(topic_id): ApiPath<TopicId>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult<Envelope> {
    let page = state
        .discussion
        .list_posts(topic_id, query.request(page_size::POSTS))
        .await?;
    Ok(Envelope::ok().page("posts", page))
}

pub async fn create_post(
    State(state): State<AppState>,
    Identity(ctx): Identity,
    ApiPath(topic_id): ApiPath<TopicId>,
    ApiJson(draft): ApiJson<PostDraft>,
) -> ApiResult<Envelope> {
    let post = state.discussion.create_post(&ctx, topic_id, draft).await?;
    state.metrics.mutation("post", "create");
    Ok(Envelope::created().with("post", post))
}

pub async fn update_post(
    State(state): State<AppState>,
    Identity(ctx): Identity,
    ApiPath(id): ApiPath<PostId>,
    ApiJson(draft): ApiJson<PostDraft>,
) -> ApiResult<Envelope> {
    let post = state.discussion.update_post(&ctx, id, draft).await?;
    state.metrics.mutation("post", "update");
    Ok(Envelope::ok().with("post", post))
}

pub async fn delete_post(
    State(state): State<AppState>,
    Identity(ctx): Identity,
    ApiPath(id): ApiPath<PostId>,
) -> ApiResult<Envelope> {
    state.discussion.delete_post(&ctx, id).await?;
    state.metrics.mutation("post", "delete");
    Ok(Envelope::ok().message("Post deleted successfully"))
}

pub async fn pin_post(
    State(state): State<AppState>,
    Identity(ctx): Identity,
    ApiPath(id): ApiPath<PostId>,
) -> ApiResult<Envelope> {
    let post = state.discussion.toggle_post_pin(&ctx, id).await?;
    state.metrics.mutation("post", "pin");
    Ok(Envelope::ok().with("is_pinned", post.post.is_pinned).with("post", post))
}

pub async fn like_post(
    State(state): State<AppState>,
    Identity(ctx): Identity,
    ApiPath(id): ApiPath<PostId>,
) -> ApiResult<Envelope> {
    let toggle = state.discussion.toggle_post_like(&ctx, id).await?;
    state.metrics.mutation("post_like", "toggle");
    Ok(Envelope::ok().flatten(toggle))
}

pub async fn list_post_replies(
    State(state): State<AppState>,
    ApiPath(post_id): ApiPath<PostId>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult<Envelope> {
    let page = state
        .discussion
        .list_post_replies(post_id, query.request(page_size::REPLIES))
        .await?;
    Ok(Envelope::ok().page("replies", page))
}

pub async fn create_post_reply(
    State(state): State<AppState>,
    Identity(ctx): Identity,
    ApiPath(post_id): ApiPath<PostId>,
    ApiJson(draft): ApiJson<ReplyDraft>,
) -> ApiResult<Envelope> {
    let reply = state.discussion.create_post_reply(&ctx, post_id, draft).await?;
    state.metrics.mutation("reply", "create");
    Ok(Envelope::created().with("reply", reply))
}
