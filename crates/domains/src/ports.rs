//! # Ports
//!
//! Any adapter must implement these traits to be wired into the binary.
//!
//! Relational writes go through a [`UnitOfWork`]: the caller opens one with
//! [`ContentStore::begin`] (reads) or [`ContentStore::begin_write`] (anything
//! that mutates), runs every statement of a logical change on it, and decides
//! the boundary with `commit` or `rollback`. A unit of work that is dropped
//! without `commit` rolls back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::chat::{ChatMessage, NewChatMessage, RoomKey, ServerEvent};
use crate::errors::Result;
use crate::identity::Actor;
use crate::models::*;
use crate::pagination::PageRequest;

/// Entry point to the relational store.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>>;
    /// Like `begin`, but the write lock is held from the first statement, so
    /// concurrent writers queue instead of failing on lock upgrade.
    async fn begin_write(&self) -> Result<Box<dyn UnitOfWork>>;
}

/// One open transaction with every content repository available on it.
#[async_trait]
pub trait UnitOfWork:
    CommentRepository
    + ReplyRepository
    + LikeRepository
    + EngagementRepository
    + ReportRepository
    + TopicRepository
    + PostRepository
    + Send
{
    async fn commit(self: Box<Self>) -> Result<()>;
    async fn rollback(self: Box<Self>) -> Result<()>;
}

#[async_trait]
pub trait CommentRepository: Send {
    async fn insert_comment(&mut self, new: NewComment) -> Result<Comment>;
    async fn find_comment(&mut self, id: CommentId) -> Result<Option<Comment>>;
    /// Newest first. Returns the page and the total row count.
    async fn list_comments(&mut self, property_id: PropertyId, page: PageRequest) -> Result<(Vec<Comment>, u64)>;
    async fn update_comment(&mut self, id: CommentId, changes: CommentChanges) -> Result<Comment>;
    /// Removes the comment after its replies, likes and reports. A
    /// `retain_report` survives so a moderator's resolution can outlive the content.
    async fn delete_comment_cascade(&mut self, id: CommentId, retain_report: Option<ReportId>) -> Result<()>;
}

#[async_trait]
pub trait ReplyRepository: Send {
    async fn insert_reply(&mut self, new: NewReply) -> Result<Reply>;
    async fn find_reply(&mut self, id: ReplyId) -> Result<Option<Reply>>;
    /// Oldest first.
    async fn list_replies(&mut self, parent: ReplyParent, page: PageRequest) -> Result<(Vec<Reply>, u64)>;
    async fn update_reply_content(&mut self, id: ReplyId, content: String) -> Result<Reply>;
    /// Removes the reply after its likes and reports, sparing `retain_report`.
    async fn delete_reply_cascade(&mut self, id: ReplyId, retain_report: Option<ReportId>) -> Result<()>;
}

#[async_trait]
pub trait LikeRepository: Send {
    /// Returns true when a like row existed and was removed.
    async fn remove_like(&mut self, target: LikeTarget, user_id: UserId) -> Result<bool>;
    /// Fails with `DuplicateConflict` when the (content, user) pair already exists.
    async fn insert_like(&mut self, target: LikeTarget, user_id: UserId) -> Result<()>;
}

#[async_trait]
pub trait EngagementRepository: Send {
    /// Counts recomputed from the underlying tables; nothing is cached.
    async fn engagement(&mut self, target: LikeTarget) -> Result<Engagement>;
    async fn post_count(&mut self, topic_id: TopicId) -> Result<i64>;
}

#[async_trait]
pub trait ReportRepository: Send {
    /// Fails with `DuplicateConflict` when the reporter already filed one for this content.
    async fn insert_report(&mut self, new: NewReport) -> Result<Report>;
    async fn find_report(&mut self, id: ReportId) -> Result<Option<Report>>;
    async fn find_report_by(
        &mut self,
        reporter_id: UserId,
        content_type: ContentType,
        content_id: i64,
    ) -> Result<Option<Report>>;
    /// Newest first, optionally filtered by status.
    async fn list_reports(&mut self, status: Option<ReportStatus>, page: PageRequest) -> Result<(Vec<Report>, u64)>;
    async fn set_report_status(
        &mut self,
        id: ReportId,
        status: ReportStatus,
        resolved_at: Option<DateTime<Utc>>,
    ) -> Result<Report>;
    /// Whether the reported node still exists.
    async fn content_exists(&mut self, content_type: ContentType, content_id: i64) -> Result<bool>;
}

#[async_trait]
pub trait TopicRepository: Send {
    async fn insert_topic(&mut self, new: NewTopic) -> Result<Topic>;
    async fn find_topic(&mut self, id: TopicId) -> Result<Option<Topic>>;
    /// Pinned first, then most recently updated.
    async fn list_topics(&mut self, page: PageRequest) -> Result<(Vec<Topic>, u64)>;
    async fn update_topic(&mut self, id: TopicId, changes: TopicChanges) -> Result<Topic>;
    async fn set_topic_pinned(&mut self, id: TopicId, pinned: bool) -> Result<Topic>;
    async fn increment_view_count(&mut self, id: TopicId) -> Result<()>;
    /// Removes the topic after all of its posts (with their own cascades).
    async fn delete_topic_cascade(&mut self, id: TopicId) -> Result<()>;
}

#[async_trait]
pub trait PostRepository: Send {
    /// Also touches the parent topic's `updated_at`.
    async fn insert_post(&mut self, new: NewPost) -> Result<Post>;
    async fn find_post(&mut self, id: PostId) -> Result<Option<Post>>;
    /// Pinned first, then oldest first.
    async fn list_posts(&mut self, topic_id: TopicId, page: PageRequest) -> Result<(Vec<Post>, u64)>;
    /// Also touches the parent topic's `updated_at`.
    async fn update_post_content(&mut self, id: PostId, content: String) -> Result<Post>;
    async fn set_post_pinned(&mut self, id: PostId, pinned: bool) -> Result<Post>;
    /// Removes the post after its replies, likes and reply reports.
    async fn delete_post_cascade(&mut self, id: PostId) -> Result<()>;
}

/// Direct-message persistence. Each call is its own single-statement transaction.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ChatStore: Send + Sync {
    async fn save_message(&self, new: NewChatMessage) -> Result<ChatMessage>;
    /// Messages between `a` and `b` in either direction, oldest first.
    async fn history(&self, a: UserId, b: UserId) -> Result<Vec<ChatMessage>>;
}

/// Real-time delivery to connected clients. Best effort, at most once.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait MessageFanout: Send + Sync {
    /// Returns the number of connections the event was handed to.
    fn deliver(&self, room: &RoomKey, event: ServerEvent) -> usize;
}

/// Identity collaborator: turns a bearer credential into an actor.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait IdentityProvider: Send + Sync {
    fn resolve(&self, bearer: &str) -> Result<Actor>;
}
