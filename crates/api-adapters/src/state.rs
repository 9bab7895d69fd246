use std::sync::Arc;

use domains::ports::{ChatStore, ContentStore, IdentityProvider};
use services::{ChatService, CommentService, DiscussionService, ModerationService};

use crate::metrics::Metrics;
use crate::rooms::RoomRegistry;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub comments: Arc<CommentService>,
    pub discussion: Arc<DiscussionService>,
    pub moderation: Arc<ModerationService>,
    pub chat: Arc<ChatService>,
    pub identity: Arc<dyn IdentityProvider>,
    pub rooms: Arc<RoomRegistry>,
    pub metrics: Arc<Metrics>,
    /// Outbound frames buffered per WebSocket connection
    pub chat_capacity: usize,
}

impl AppState {
    /// Wires every service onto one store. The room registry doubles as
    /// the chat fan-out.
    pub fn new<S>(store: Arc<S>, identity: Arc<dyn IdentityProvider>, chat_capacity: usize) -> Self
    where
        S: ContentStore + ChatStore + 'static,
    {
        let rooms = Arc::new(RoomRegistry::new());
        let content: Arc<dyn ContentStore> = store.clone();
        let chat_store: Arc<dyn ChatStore> = store;

        Self {
            comments: Arc::new(CommentService::new(content.clone())),
            discussion: Arc::new(DiscussionService::new(content.clone())),
            moderation: Arc::new(ModerationService::new(content)),
            chat: Arc::new(ChatService::new(chat_store, rooms.clone())),
            identity,
            rooms,
            metrics: Arc::new(Metrics::new()),
            chat_capacity: chat_capacity.max(1),
        }
    }
}
