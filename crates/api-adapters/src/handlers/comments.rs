//! Listing comments and their replies.

use axum::extract::State;
use domains::{CommentId, PropertyId, ReplyId};
use services::{page_size, CommentDraft, CommentEdit, ReplyDraft};

use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery, Identity, PageQuery};
use crate::response::Envelope;
use crate::state::AppState;

pub async fn list_comments(
    State(state): State<AppState>,
    ApiPath(property_id): ApiPath<PropertyId>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult<Envelope> {
    let page = state
        .comments
        .list_comments(property_id, query.request(page_size::COMMENTS))
        .await?;
    Ok(Envelope::ok().page("comments", page))
}

pub async fn get_comment(State(state): State<AppState>, ApiPath(id): ApiPath<CommentId>) -> ApiResult<Envelope> {
    let comment = state.comments.get_comment(id).await?;
    Ok(Envelope::ok().with("comment", comment))
}

pub async fn create_comment(
    State(state): State<AppState>,
    Identity(ctx): Identity,
    ApiPath(property_id): ApiPath<PropertyId>,
    ApiJson(draft): ApiJson<CommentDraft>,
) -> ApiResult<Envelope> {
    let comment = state.comments.create_comment(&ctx, property_id, draft).await?;
    state.metrics.mutation("comment", "create");
    Ok(Envelope::created().with("comment", comment))
}

pub async fn update_comment(
    State(state): State<AppState>,
    Identity(ctx): Identity,
    ApiPath(id): ApiPath<CommentId>,
    ApiJson(edit): ApiJson<CommentEdit>,
) -> ApiResult<Envelope> {
    let comment = state.comments.update_comment(&ctx, id, edit).await?;
    state.metrics.mutation("comment", "update");
    Ok(Envelope::ok().with("comment", comment))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Identity(ctx): Identity,
    ApiPath(id): ApiPath<CommentId>,
) -> ApiResult<Envelope> {
    state.comments.delete_comment(&ctx, id).await?;
    state.metrics.mutation("comment", "delete");
    Ok(Envelope::ok().message("Comment deleted successfully"))
}

pub async fn like_comment(
    State(state): State<AppState>,
    Identity(ctx): Identity,
    ApiPath(id): ApiPath<CommentId>,
) -> ApiResult<Envelope> {
    let toggle = state.comments.toggle_comment_like(&ctx, id).await?;
    state.metrics.mutation("comment_like", "toggle");
    Ok(Envelope::ok().flatten(toggle))
}

pub async fn list_replies(
    State(state): State<AppState>,
    ApiPath(comment_id): ApiPath<CommentId>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult<Envelope> {
    let page = state
        .comments
        .list_replies(comment_id, query.request(page_size::REPLIES))
        .await?;
    Ok(Envelope::ok().page("replies", page))
}

pub async fn create_reply(
    State(state): State<AppState>,
    Identity(ctx): Identity,
    ApiPath(comment_id): ApiPath<CommentId>,
    ApiJson(draft): ApiJson<ReplyDraft>,
) -> ApiResult<Envelope> {
    let reply = state.comments.create_reply(&ctx, comment_id, draft).await?;
    state.metrics.mutation("reply", "create");
    Ok(Envelope::created().with("reply", reply))
}

pub async fn update_reply(
    State(state): State<AppState>,
    Identity(ctx): Identity,
    ApiPath(id): ApiPath<ReplyId>,
    ApiJson(draft): ApiJson<ReplyDraft>,
) -> ApiResult<Envelope> {
    let reply = state.comments.update_reply(&ctx, id, draft).await?;
    state.metrics.mutation("reply", "update");
    Ok(Envelope::ok().with("reply", reply))
}

pub async fn delete_reply(
    State(state): State<AppState>,
    Identity(ctx): Identity,
    ApiPath(id): ApiPath<ReplyId>,
) -> ApiResult<Envelope> {
    state.comments.delete_reply(&ctx, id).await?;
    state.metrics.mutation("reply", "delete");
    Ok(Envelope::ok().message("Reply deleted successfully"))
}

pub async fn like_reply(
    State(state): State<AppState>,
    Identity(ctx): Identity,
    ApiPath(id): ApiPath<ReplyId>,
) -> ApiResult<Envelope> {
    let toggle = state.comments.toggle_reply_like(&ctx, id).await?;
    state.metrics.mutation("reply_like", "toggle");
    Ok(Envelope::ok().flatten(toggle))
}
