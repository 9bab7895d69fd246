pub mod chat;
pub mod comments;
pub mod discussion;
pub mod moderation;
pub mod ops;
