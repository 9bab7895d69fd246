use axum::extract::State;
use domains::chat::IncomingMessage;

use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiQuery, HistoryQuery, Identity};
use crate::response::Envelope;
use crate::state::AppState;

pub async fn history(
    State(state): State<AppState>,
    Identity(ctx): Identity,
    ApiQuery(query): ApiQuery<HistoryQuery>,
) -> ApiResult<Envelope> {
    let messages = state
        .chat
        .history(&ctx, query.sender_id, query.receiver_id)
        .await?;
    Ok(Envelope::ok().with("messages", messages))
}

/// Same path as a `new_message` event, for clients without a socket.
pub async fn send_message(
    State(state): State<AppState>,
    Identity(ctx): Identity,
    ApiJson(incoming): ApiJson<IncomingMessage>,
) -> ApiResult<Envelope> {
    let delivery = state.chat.send_message(&ctx, incoming).await?;
    state.metrics.chat_delivered(delivery.delivered);
    Ok(Envelope::created()
        .with("message", delivery.message)
        .with("delivered", delivery.delivered))
}
