//! Discussion board: topics, the posts inside them and post replies.

use std::sync::Arc;

use domains::authz::{ensure, Action, Target};
use domains::pagination::{Page, PageRequest};
use domains::ports::{
    ContentStore, EngagementRepository, PostRepository, ReplyRepository, TopicRepository, UnitOfWork,
};
use domains::validation::{validate_content, validate_description, validate_title};
use domains::{
    DomainError, LikeTarget, LikeToggle, NewPost, NewReply, NewTopic, Post, PostId, PostView, ReplyParent,
    ReplyView, RequestContext, Result, Topic, TopicChanges, TopicId, TopicView,
};
use serde::Deserialize;
use tracing::{info, instrument};

use crate::comments::ReplyDraft;
use crate::engagement::{post_view, reply_view, toggle_like};

#[derive(Debug, Clone, Deserialize)]
pub struct TopicDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Fields left out are kept. A blank description clears the current one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TopicEdit {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostDraft {
    #[serde(default)]
    pub content: String,
}

pub struct DiscussionService {
    store: Arc<dyn ContentStore>,
}

impl DiscussionService {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    // ── Topics ──────────────────────────────────────────────────────────────

    #[instrument(skip(self))]
    pub async fn list_topics(&self, page: PageRequest) -> Result<Page<TopicView>> {
        let mut uow = self.store.begin().await?;
        let (topics, total) = uow.list_topics(page).await?;
        let mut items = Vec::with_capacity(topics.len());
        for topic in topics {
            let post_count = uow.post_count(topic.id).await?;
            items.push(TopicView { topic, post_count });
        }
        uow.commit().await?;
        Ok(Page::new(items, total, page))
    }

    /// Detail read. Counts as a view.
    #[instrument(skip(self))]
    pub async fn get_topic(&self, id: TopicId) -> Result<TopicView> {
        let mut uow = self.store.begin_write().await?;
        uow.increment_view_count(id).await?;
        let topic = uow.find_topic(id).await?.ok_or(DomainError::not_found("topic", id))?;
        let post_count = uow.post_count(id).await?;
        uow.commit().await?;
        Ok(TopicView { topic, post_count })
    }

    #[instrument(skip(self, ctx, draft), fields(actor = ?ctx.actor))]
    pub async fn create_topic(&self, ctx: &RequestContext, draft: TopicDraft) -> Result<Topic> {
        let actor = ctx.require_actor()?;
        ensure(Some(&actor), Action::Create, Target::unowned())?;
        let title = validate_title(&draft.title)?;
        let description = validate_description(draft.description.as_deref())?;

        let mut uow = self.store.begin_write().await?;
        let topic = uow
            .insert_topic(NewTopic { title, description, creator_id: actor.id })
            .await?;
        uow.commit().await?;
        info!(topic_id = topic.id, "topic created");
        Ok(topic)
    }

    #[instrument(skip(self, ctx, edit), fields(actor = ?ctx.actor))]
    pub async fn update_topic(&self, ctx: &RequestContext, id: TopicId, edit: TopicEdit) -> Result<Topic> {
        let actor = ctx.require_actor()?;
        let changes = TopicChanges {
            title: edit.title.as_deref().map(validate_title).transpose()?,
            description: edit
                .description
                .as_deref()
                .map(|d| validate_description(Some(d)))
                .transpose()?,
        };

        let mut uow = self.store.begin_write().await?;
        let existing = uow.find_topic(id).await?.ok_or(DomainError::not_found("topic", id))?;
        ensure(Some(&actor), Action::Update, Target::of(&existing))?;

        let topic = uow.update_topic(id, changes).await?;
        uow.commit().await?;
        Ok(topic)
    }

    #[instrument(skip(self, ctx), fields(actor = ?ctx.actor))]
    pub async fn delete_topic(&self, ctx: &RequestContext, id: TopicId) -> Result<()> {
        let actor = ctx.require_actor()?;
        let mut uow = self.store.begin_write().await?;
        let existing = uow.find_topic(id).await?.ok_or(DomainError::not_found("topic", id))?;
        ensure(Some(&actor), Action::Delete, Target::of(&existing))?;

        uow.delete_topic_cascade(id).await?;
        uow.commit().await?;
        info!(topic_id = id, "topic deleted");
        Ok(())
    }

    /// Flips the pin flag and returns the new state.
    #[instrument(skip(self, ctx), fields(actor = ?ctx.actor))]
    pub async fn toggle_topic_pin(&self, ctx: &RequestContext, id: TopicId) -> Result<Topic> {
        let actor = ctx.require_actor()?;
        ensure(Some(&actor), Action::Pin, Target::unowned())?;

        let mut uow = self.store.begin_write().await?;
        let existing = uow.find_topic(id).await?.ok_or(DomainError::not_found("topic", id))?;
        let topic = uow.set_topic_pinned(id, !existing.is_pinned).await?;
        uow.commit().await?;
        info!(topic_id = id, pinned = topic.is_pinned, "topic pin toggled");
        Ok(topic)
    }

    // ── Posts ───────────────────────────────────────────────────────────────

    #[instrument(skip(self))]
    pub async fn list_posts(&self, topic_id: TopicId, page: PageRequest) -> Result<Page<PostView>> {
        let mut uow = self.store.begin().await?;
        if uow.find_topic(topic_id).await?.is_none() {
            return Err(DomainError::not_found("topic", topic_id));
        }
        let (posts, total) = uow.list_posts(topic_id, page).await?;
        let mut items = Vec::with_capacity(posts.len());
        for post in posts {
            items.push(post_view(uow.as_mut(), post).await?);
        }
        uow.commit().await?;
        Ok(Page::new(items, total, page))
    }

    #[instrument(skip(self, ctx, draft), fields(actor = ?ctx.actor))]
    pub async fn create_post(&self, ctx: &RequestContext, topic_id: TopicId, draft: PostDraft) -> Result<PostView> {
        let actor = ctx.require_actor()?;
        ensure(Some(&actor), Action::Create, Target::unowned())?;
        let content = validate_content("post", &draft.content)?;

        let mut uow = self.store.begin_write().await?;
        if uow.find_topic(topic_id).await?.is_none() {
            return Err(DomainError::not_found("topic", topic_id));
        }
        let post = uow.insert_post(NewPost { topic_id, author_id: actor.id, content }).await?;
        let view = post_view(uow.as_mut(), post).await?;
        uow.commit().await?;
        Ok(view)
    }

    #[instrument(skip(self, ctx, draft), fields(actor = ?ctx.actor))]
    pub async fn update_post(&self, ctx: &RequestContext, id: PostId, draft: PostDraft) -> Result<PostView> {
        let actor = ctx.require_actor()?;
        let content = validate_content("post", &draft.content)?;

        let mut uow = self.store.begin_write().await?;
        let existing = self.require_post(uow.as_mut(), id).await?;
        ensure(Some(&actor), Action::Update, Target::of(&existing))?;

        let post = uow.update_post_content(id, content).await?;
        let view = post_view(uow.as_mut(), post).await?;
        uow.commit().await?;
        Ok(view)
    }

    #[instrument(skip(self, ctx), fields(actor = ?ctx.actor))]
    pub async fn delete_post(&self, ctx: &RequestContext, id: PostId) -> Result<()> {
        let actor = ctx.require_actor()?;
        let mut uow = self.store.begin_write().await?;
        let existing = self.require_post(uow.as_mut(), id).await?;
        ensure(Some(&actor), Action::Delete, Target::of(&existing))?;

        uow.delete_post_cascade(id).await?;
        uow.commit().await?;
        info!(post_id = id, "post deleted");
        Ok(())
    }

    #[instrument(skip(self, ctx), fields(actor = ?ctx.actor))]
    pub async fn toggle_post_pin(&self, ctx: &RequestContext, id: PostId) -> Result<PostView> {
        let actor = ctx.require_actor()?;
        ensure(Some(&actor), Action::Pin, Target::unowned())?;

        let mut uow = self.store.begin_write().await?;
        let existing = self.require_post(uow.as_mut(), id).await?;
        let post = uow.set_post_pinned(id, !existing.is_pinned).await?;
        let view = post_view(uow.as_mut(), post).await?;
        uow.commit().await?;
        Ok(view)
    }

    #[instrument(skip(self, ctx), fields(actor = ?ctx.actor))]
    pub async fn toggle_post_like(&self, ctx: &RequestContext, id: PostId) -> Result<LikeToggle> {
        let actor = ctx.require_actor()?;
        ensure(Some(&actor), Action::Create, Target::unowned())?;
        toggle_like(self.store.as_ref(), actor.id, LikeTarget::Post(id)).await
    }

    // ── Post replies ────────────────────────────────────────────────────────

    #[instrument(skip(self))]
    pub async fn list_post_replies(&self, post_id: PostId, page: PageRequest) -> Result<Page<ReplyView>> {
        let mut uow = self.store.begin().await?;
        self.require_post(uow.as_mut(), post_id).await?;
        let (replies, total) = uow.list_replies(ReplyParent::Post(post_id), page).await?;
        let mut items = Vec::with_capacity(replies.len());
        for reply in replies {
            items.push(reply_view(uow.as_mut(), reply).await?);
        }
        uow.commit().await?;
        Ok(Page::new(items, total, page))
    }

    #[instrument(skip(self, ctx, draft), fields(actor = ?ctx.actor))]
    pub async fn create_post_reply(&self, ctx: &RequestContext, post_id: PostId, draft: ReplyDraft) -> Result<ReplyView> {
        let actor = ctx.require_actor()?;
        ensure(Some(&actor), Action::Create, Target::unowned())?;
        let content = validate_content("reply", &draft.content)?;

        let mut uow = self.store.begin_write().await?;
        self.require_post(uow.as_mut(), post_id).await?;
        let reply = uow
            .insert_reply(NewReply { parent: ReplyParent::Post(post_id), author_id: actor.id, content })
            .await?;
        let view = reply_view(uow.as_mut(), reply).await?;
        uow.commit().await?;
        Ok(view)
    }

    async fn require_post(&self, uow: &mut dyn UnitOfWork, id: PostId) -> Result<Post> {
        uow.find_post(id).await?.ok_or(DomainError::not_found("post", id))
    }
}
