//! offcampus/crates/services/src/lib.rs
//!
//! Use-case orchestration. Every mutation follows the same sequence:
//! authenticate, authorize, validate, run one unit of work, commit.
//! Services depend only on the `domains` ports; adapters are injected.

pub mod chat;
pub mod comments;
pub mod discussion;
mod engagement;
pub mod moderation;

pub use chat::{ChatService, Delivery};
pub use comments::{CommentDraft, CommentEdit, CommentService, ReplyDraft};
pub use discussion::{DiscussionService, PostDraft, TopicDraft, TopicEdit};
pub use moderation::{ModerationService, ReportDraft, ReportOutcome, ReportUpdate};

/// Default page sizes per listing.
pub mod page_size {
    pub const COMMENTS: u32 = 20;
    pub const REPLIES: u32 = 50;
    pub const TOPICS: u32 = 10;
    pub const POSTS: u32 = 20;
    pub const REPORTS: u32 = 20;
}
