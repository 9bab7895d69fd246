//! Direct messages between two users.
//!
//! Rooms are keyed by the receiving user's id. A message is stored first and
//! only then handed to the fan-out, so a crash between the two loses at most
//! the real-time delivery, never the history.

use std::sync::Arc;

use chrono::Utc;
use domains::chat::{coerce_message_time, ChatMessage, IncomingMessage, JoinRoom, NewChatMessage, RoomKey, ServerEvent};
use domains::ports::{ChatStore, MessageFanout};
use domains::validation::validate_content;
use domains::{DomainError, RequestContext, Result, UserId};
use serde::Serialize;
use tracing::{debug, instrument};

/// A stored message and how many live connections it reached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Delivery {
    pub message: ChatMessage,
    pub delivered: usize,
}

pub struct ChatService {
    store: Arc<dyn ChatStore>,
    fanout: Arc<dyn MessageFanout>,
}

impl ChatService {
    pub fn new(store: Arc<dyn ChatStore>, fanout: Arc<dyn MessageFanout>) -> Self {
        Self { store, fanout }
    }

    /// Resolves the room a connection may subscribe to. Users join only their own room.
    #[instrument(skip(self, ctx), fields(actor = ?ctx.actor))]
    pub fn join_room(&self, ctx: &RequestContext, join: &JoinRoom) -> Result<RoomKey> {
        let actor = ctx.require_actor()?;
        let room = join.room_key()?;
        if room.user_id() != actor.id {
            return Err(DomainError::forbidden("a client may only join its own room"));
        }
        Ok(room)
    }

    /// Persists the message, then delivers it to the receiver's room only.
    #[instrument(skip(self, ctx, incoming), fields(actor = ?ctx.actor))]
    pub async fn send_message(&self, ctx: &RequestContext, incoming: IncomingMessage) -> Result<Delivery> {
        let actor = ctx.require_actor()?;
        let sender_id = incoming.sender.to_user_id("sender")?;
        let receiver_id = incoming.receiver.to_user_id("receiver")?;
        if sender_id != actor.id {
            return Err(DomainError::forbidden("sender must be the authenticated user"));
        }
        let message = validate_content("message", &incoming.message)?;
        let time = coerce_message_time(incoming.time.as_ref(), Utc::now());

        let message = self
            .store
            .save_message(NewChatMessage { sender_id, receiver_id, message, time })
            .await?;

        let delivered = self
            .fanout
            .deliver(&RoomKey::for_user(receiver_id), ServerEvent::NewMessage(message.clone()));
        debug!(message_id = message.id, receiver_id, delivered, "chat message fanned out");

        Ok(Delivery { message, delivered })
    }

    /// Conversation between `a` and `b`, oldest first. Participants and admins only.
    #[instrument(skip(self, ctx), fields(actor = ?ctx.actor))]
    pub async fn history(&self, ctx: &RequestContext, a: UserId, b: UserId) -> Result<Vec<ChatMessage>> {
        let actor = ctx.require_actor()?;
        if actor.id != a && actor.id != b && !actor.is_admin() {
            return Err(DomainError::forbidden("only participants may read this conversation"));
        }
        self.store.history(a, b).await
    }
}
