//! # Domain Models
//!
//! These structs represent the moderated social-content entities of offcampus:
//! listing comments, their replies, discussion topics and posts, likes and
//! reports. Identifiers are the integer keys issued by the relational store.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

pub type UserId = i64;
pub type PropertyId = i64;
pub type CommentId = i64;
pub type ReplyId = i64;
pub type TopicId = i64;
pub type PostId = i64;
pub type ReportId = i64;

/// Anything with a single owning user. Feeds the authorization rules.
pub trait Owned {
    fn owner_id(&self) -> UserId;
}

/// A star rating attached to a listing comment. Always within 1..=5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Rating(u8);

impl Rating {
    pub const MIN: i64 = 1;
    pub const MAX: i64 = 5;

    pub fn new(value: i64) -> Result<Self, DomainError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(DomainError::validation("rating must be an integer between 1 and 5"))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

/// A review left on an accommodation listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comment {
    pub id: CommentId,
    pub property_id: PropertyId,
    pub author_id: UserId,
    pub content: String,
    pub rating: Rating,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Owned for Comment {
    fn owner_id(&self) -> UserId {
        self.author_id
    }
}

/// The node a reply hangs off. Both variants share the `replies` id space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplyParent {
    #[serde(rename = "comment_id")]
    Comment(CommentId),
    #[serde(rename = "post_id")]
    Post(PostId),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reply {
    pub id: ReplyId,
    #[serde(flatten)]
    pub parent: ReplyParent,
    pub author_id: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Owned for Reply {
    fn owner_id(&self) -> UserId {
        self.author_id
    }
}

/// A discussion-board thread header. Posts live underneath it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Topic {
    pub id: TopicId,
    pub title: String,
    pub description: Option<String>,
    pub creator_id: UserId,
    pub is_pinned: bool,
    /// Bumped on every detail read; not transactional
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    /// Touched whenever a post underneath is inserted or edited
    pub updated_at: DateTime<Utc>,
}

impl Owned for Topic {
    fn owner_id(&self) -> UserId {
        self.creator_id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    pub id: PostId,
    pub topic_id: TopicId,
    pub author_id: UserId,
    pub content: String,
    pub is_pinned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Owned for Post {
    fn owner_id(&self) -> UserId {
        self.author_id
    }
}

/// The content node a like row points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeTarget {
    Comment(CommentId),
    Reply(ReplyId),
    Post(PostId),
}

impl LikeTarget {
    pub fn id(self) -> i64 {
        match self {
            Self::Comment(id) | Self::Reply(id) | Self::Post(id) => id,
        }
    }

    pub fn entity(self) -> &'static str {
        match self {
            Self::Comment(_) => "comment",
            Self::Reply(_) => "reply",
            Self::Post(_) => "post",
        }
    }
}

/// Reportable content kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Comment,
    Reply,
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Comment => "comment",
            Self::Reply => "reply",
        }
    }
}

impl FromStr for ContentType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "comment" => Ok(Self::Comment),
            "reply" => Ok(Self::Reply),
            other => Err(DomainError::validation(format!("unknown content_type '{other}'"))),
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a moderation report.
///
/// ```text
/// pending ──► reviewed ──► resolved | rejected
///    └──────────────────► resolved | rejected
/// resolved | rejected ──► pending   (explicit admin reopen)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Pending,
    Reviewed,
    Resolved,
    Rejected,
}

impl ReportStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Reviewed => "reviewed",
            Self::Resolved => "resolved",
            Self::Rejected => "rejected",
        }
    }

    /// Closed reports carry a `resolved_at` timestamp.
    pub fn is_closed(self) -> bool {
        matches!(self, Self::Resolved | Self::Rejected)
    }

    pub fn can_transition_to(self, next: ReportStatus) -> bool {
        use ReportStatus::*;
        matches!(
            (self, next),
            (Pending, Reviewed)
                | (Pending, Resolved)
                | (Pending, Rejected)
                | (Reviewed, Resolved)
                | (Reviewed, Rejected)
                | (Resolved, Pending)
                | (Rejected, Pending)
        )
    }
}

impl FromStr for ReportStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "reviewed" => Ok(Self::Reviewed),
            "resolved" => Ok(Self::Resolved),
            "rejected" => Ok(Self::Rejected),
            other => Err(DomainError::validation(format!("unknown report status '{other}'"))),
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub id: ReportId,
    pub reporter_id: UserId,
    pub content_type: ContentType,
    pub content_id: i64,
    pub reasons: BTreeSet<String>,
    pub description: Option<String>,
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

// ── Write inputs ────────────────────────────────────────────────────────────
// Only the mutable fields appear in the `*Changes` structs, so ownership and
// identity columns can never be rewritten through an update.

#[derive(Debug, Clone)]
pub struct NewComment {
    pub property_id: PropertyId,
    pub author_id: UserId,
    pub content: String,
    pub rating: Rating,
}

#[derive(Debug, Clone, Default)]
pub struct CommentChanges {
    pub content: Option<String>,
    pub rating: Option<Rating>,
}

#[derive(Debug, Clone)]
pub struct NewReply {
    pub parent: ReplyParent,
    pub author_id: UserId,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct NewTopic {
    pub title: String,
    pub description: Option<String>,
    pub creator_id: UserId,
}

#[derive(Debug, Clone, Default)]
pub struct TopicChanges {
    pub title: Option<String>,
    /// `None` keeps the current description, `Some(None)` clears it.
    pub description: Option<Option<String>>,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub topic_id: TopicId,
    pub author_id: UserId,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct NewReport {
    pub reporter_id: UserId,
    pub content_type: ContentType,
    pub content_id: i64,
    pub reasons: BTreeSet<String>,
    pub description: Option<String>,
}

// ── Read views ──────────────────────────────────────────────────────────────

/// Derived counters, recomputed from the like/reply/report tables on every read.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Engagement {
    pub likes_count: i64,
    pub liked_by: Vec<UserId>,
    pub reply_count: i64,
    pub reports_count: i64,
}

/// Outcome of a like toggle, with the post-toggle counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LikeToggle {
    pub is_liked: bool,
    pub likes_count: i64,
    pub liked_by: Vec<UserId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    #[serde(flatten)]
    pub engagement: Engagement,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplyView {
    #[serde(flatten)]
    pub reply: Reply,
    #[serde(flatten)]
    pub engagement: Engagement,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    #[serde(flatten)]
    pub engagement: Engagement,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicView {
    #[serde(flatten)]
    pub topic: Topic,
    pub post_count: i64,
}
