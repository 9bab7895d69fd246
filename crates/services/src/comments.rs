//! Listing comments and the replies underneath them.
//!
//! Replies are addressed by id alone once they exist, so editing, deleting
//! and liking a reply lives here for both comment and post replies.

use std::sync::Arc;

use domains::authz::{ensure, Action, Target};
use domains::pagination::{Page, PageRequest};
use domains::ports::{CommentRepository, ContentStore, ReplyRepository};
use domains::validation::{validate_content, validate_rating};
use domains::{
    CommentChanges, CommentId, CommentView, DomainError, LikeTarget, LikeToggle, NewComment, NewReply,
    PropertyId, ReplyId, ReplyParent, ReplyView, RequestContext, Result,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, instrument};

use crate::engagement::{comment_view, reply_view, toggle_like};

#[derive(Debug, Clone, Deserialize)]
pub struct CommentDraft {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub rating: Option<Value>,
}

/// Fields left out are kept as they are.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentEdit {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub rating: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplyDraft {
    #[serde(default)]
    pub content: String,
}

pub struct CommentService {
    store: Arc<dyn ContentStore>,
}

impl CommentService {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self))]
    pub async fn list_comments(&self, property_id: PropertyId, page: PageRequest) -> Result<Page<CommentView>> {
        let mut uow = self.store.begin().await?;
        let (comments, total) = uow.list_comments(property_id, page).await?;
        let mut items = Vec::with_capacity(comments.len());
        for comment in comments {
            items.push(comment_view(uow.as_mut(), comment).await?);
        }
        uow.commit().await?;
        Ok(Page::new(items, total, page))
    }

    #[instrument(skip(self))]
    pub async fn get_comment(&self, id: CommentId) -> Result<CommentView> {
        let mut uow = self.store.begin().await?;
        let comment = uow
            .find_comment(id)
            .await?
            .ok_or(DomainError::not_found("comment", id))?;
        let view = comment_view(uow.as_mut(), comment).await?;
        uow.commit().await?;
        Ok(view)
    }

    #[instrument(skip(self, ctx, draft), fields(actor = ?ctx.actor))]
    pub async fn create_comment(
        &self,
        ctx: &RequestContext,
        property_id: PropertyId,
        draft: CommentDraft,
    ) -> Result<CommentView> {
        let actor = ctx.require_actor()?;
        ensure(Some(&actor), Action::Create, Target::unowned())?;
        let content = validate_content("comment", &draft.content)?;
        let rating = validate_rating(draft.rating.as_ref())?;

        let mut uow = self.store.begin_write().await?;
        let comment = uow
            .insert_comment(NewComment { property_id, author_id: actor.id, content, rating })
            .await?;
        let view = comment_view(uow.as_mut(), comment).await?;
        uow.commit().await?;

        info!(comment_id = view.comment.id, property_id, "comment created");
        Ok(view)
    }

    #[instrument(skip(self, ctx, edit), fields(actor = ?ctx.actor))]
    pub async fn update_comment(&self, ctx: &RequestContext, id: CommentId, edit: CommentEdit) -> Result<CommentView> {
        let actor = ctx.require_actor()?;
        let changes = CommentChanges {
            content: edit.content.as_deref().map(|c| validate_content("comment", c)).transpose()?,
            rating: edit.rating.as_ref().map(|r| validate_rating(Some(r))).transpose()?,
        };

        let mut uow = self.store.begin_write().await?;
        let existing = uow
            .find_comment(id)
            .await?
            .ok_or(DomainError::not_found("comment", id))?;
        ensure(Some(&actor), Action::Update, Target::of(&existing))?;

        let comment = uow.update_comment(id, changes).await?;
        let view = comment_view(uow.as_mut(), comment).await?;
        uow.commit().await?;
        Ok(view)
    }

    #[instrument(skip(self, ctx), fields(actor = ?ctx.actor))]
    pub async fn delete_comment(&self, ctx: &RequestContext, id: CommentId) -> Result<()> {
        let actor = ctx.require_actor()?;
        let mut uow = self.store.begin_write().await?;
        let existing = uow
            .find_comment(id)
            .await?
            .ok_or(DomainError::not_found("comment", id))?;
        ensure(Some(&actor), Action::Delete, Target::of(&existing))?;

        uow.delete_comment_cascade(id, None).await?;
        uow.commit().await?;
        info!(comment_id = id, by_admin = actor.id != existing.author_id, "comment deleted");
        Ok(())
    }

    #[instrument(skip(self, ctx), fields(actor = ?ctx.actor))]
    pub async fn toggle_comment_like(&self, ctx: &RequestContext, id: CommentId) -> Result<LikeToggle> {
        let actor = ctx.require_actor()?;
        ensure(Some(&actor), Action::Create, Target::unowned())?;
        toggle_like(self.store.as_ref(), actor.id, LikeTarget::Comment(id)).await
    }

    #[instrument(skip(self))]
    pub async fn list_replies(&self, comment_id: CommentId, page: PageRequest) -> Result<Page<ReplyView>> {
        let mut uow = self.store.begin().await?;
        if uow.find_comment(comment_id).await?.is_none() {
            return Err(DomainError::not_found("comment", comment_id));
        }
        let (replies, total) = uow.list_replies(ReplyParent::Comment(comment_id), page).await?;
        let mut items = Vec::with_capacity(replies.len());
        for reply in replies {
            items.push(reply_view(uow.as_mut(), reply).await?);
        }
        uow.commit().await?;
        Ok(Page::new(items, total, page))
    }

    #[instrument(skip(self, ctx, draft), fields(actor = ?ctx.actor))]
    pub async fn create_reply(&self, ctx: &RequestContext, comment_id: CommentId, draft: ReplyDraft) -> Result<ReplyView> {
        let actor = ctx.require_actor()?;
        ensure(Some(&actor), Action::Create, Target::unowned())?;
        let content = validate_content("reply", &draft.content)?;

        let mut uow = self.store.begin_write().await?;
        if uow.find_comment(comment_id).await?.is_none() {
            return Err(DomainError::not_found("comment", comment_id));
        }
        let reply = uow
            .insert_reply(NewReply { parent: ReplyParent::Comment(comment_id), author_id: actor.id, content })
            .await?;
        let view = reply_view(uow.as_mut(), reply).await?;
        uow.commit().await?;
        Ok(view)
    }

    #[instrument(skip(self, ctx, draft), fields(actor = ?ctx.actor))]
    pub async fn update_reply(&self, ctx: &RequestContext, id: ReplyId, draft: ReplyDraft) -> Result<ReplyView> {
        let actor = ctx.require_actor()?;
        let content = validate_content("reply", &draft.content)?;

        let mut uow = self.store.begin_write().await?;
        let existing = uow.find_reply(id).await?.ok_or(DomainError::not_found("reply", id))?;
        ensure(Some(&actor), Action::Update, Target::of(&existing))?;

        let reply = uow.update_reply_content(id, content).await?;
        let view = reply_view(uow.as_mut(), reply).await?;
        uow.commit().await?;
        Ok(view)
    }

    #[instrument(skip(self, ctx), fields(actor = ?ctx.actor))]
    pub async fn delete_reply(&self, ctx: &RequestContext, id: ReplyId) -> Result<()> {
        let actor = ctx.require_actor()?;
        let mut uow = self.store.begin_write().await?;
        let existing = uow.find_reply(id).await?.ok_or(DomainError::not_found("reply", id))?;
        ensure(Some(&actor), Action::Delete, Target::of(&existing))?;

        uow.delete_reply_cascade(id, None).await?;
        uow.commit().await?;
        info!(reply_id = id, "reply deleted");
        Ok(())
    }

    #[instrument(skip(self, ctx), fields(actor = ?ctx.actor))]
    pub async fn toggle_reply_like(&self, ctx: &RequestContext, id: ReplyId) -> Result<LikeToggle> {
        let actor = ctx.require_actor()?;
        ensure(Some(&actor), Action::Create, Target::unowned())?;
        toggle_like(self.store.as_ref(), actor.id, LikeTarget::Reply(id)).await
    }
}
