//! The real-time chat channel.
//!
//! One task reads client frames and dispatches them; a second drains the
//! connection's outbound queue into the socket. The queue's sender is what
//! the [`RoomRegistry`](crate::rooms::RoomRegistry) holds, so fan-out from
//! other connections never touches this socket directly.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use domains::chat::{ClientEvent, JoinRoom, RoomKey, ServerEvent};
use domains::{DomainError, RequestContext};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::error::{client_message, ApiResult};
use crate::extract::Identity;
use crate::rooms::ConnectionId;
use crate::state::AppState;

/// Anonymous upgrades are refused before the handshake completes.
pub async fn upgrade(
    State(state): State<AppState>,
    Identity(ctx): Identity,
    ws: WebSocketUpgrade,
) -> ApiResult<Response> {
    ctx.require_actor()?;
    Ok(ws.on_upgrade(move |socket| serve(socket, state, ctx)))
}

struct Connection {
    id: ConnectionId,
    ctx: RequestContext,
    outbound: mpsc::Sender<String>,
    room: Option<RoomKey>,
}

#[instrument(skip_all, fields(actor = ?ctx.actor))]
async fn serve(socket: WebSocket, state: AppState, ctx: RequestContext) {
    let (mut sink, mut stream) = socket.split();
    let (outbound, mut queue) = mpsc::channel::<String>(state.chat_capacity);

    let writer = tokio::spawn(async move {
        while let Some(frame) = queue.recv().await {
            if sink.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    let mut conn = Connection {
        id: Uuid::new_v4(),
        ctx,
        outbound,
        room: None,
    };
    info!(conn = %conn.id, "chat connection opened");

    while let Some(frame) = stream.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => continue,
        };
        if !handle_frame(&state, &mut conn, text.as_str()).await {
            break;
        }
    }

    disconnect(&state, &mut conn);
    writer.abort();
    info!(conn = %conn.id, "chat connection closed");
}

/// Dispatches one frame and queues the answer for this connection. Returns
/// false once the writer side is gone.
async fn handle_frame(state: &AppState, conn: &mut Connection, frame: &str) -> bool {
    let reply = dispatch(state, conn, frame).await;
    conn.outbound.send(reply.encode()).await.is_ok()
}

fn disconnect(state: &AppState, conn: &mut Connection) {
    if let Some(room) = conn.room.take() {
        state.rooms.leave(&room, conn.id);
    }
}

/// Handles one client event and returns the event echoed to this connection.
async fn dispatch(state: &AppState, conn: &mut Connection, frame: &str) -> ServerEvent {
    let result = match ClientEvent::decode(frame) {
        Ok(ClientEvent::JoinRoom(join)) => join_room(state, conn, &join),
        Ok(ClientEvent::NewMessage(incoming)) => match state.chat.send_message(&conn.ctx, incoming).await {
            Ok(delivery) => {
                state.metrics.chat_delivered(delivery.delivered);
                Ok(ServerEvent::NewMessage(delivery.message))
            }
            Err(err) => Err(err),
        },
        Err(err) => Err(err),
    };
    result.unwrap_or_else(|err| {
        debug!(conn = %conn.id, error = %err, "chat event rejected");
        ServerEvent::Error {
            message: client_message(&err),
        }
    })
}

fn join_room(
    state: &AppState,
    conn: &mut Connection,
    join: &JoinRoom,
) -> Result<ServerEvent, DomainError> {
    let room = state.chat.join_room(&conn.ctx, join)?;
    if conn.room.as_ref() != Some(&room) {
        if let Some(previous) = conn.room.take() {
            state.rooms.leave(&previous, conn.id);
        }
        state.rooms.join(room.clone(), conn.id, conn.outbound.clone());
        conn.room = Some(room.clone());
    }
    Ok(ServerEvent::Joined {
        room: room.as_str().to_string(),
    })
}
