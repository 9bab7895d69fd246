//! # Chat
//!
//! Direct messages between two users and the typed events that travel over
//! the real-time channel. Events are decoded once at the transport boundary
//! into [`ClientEvent`] and answered with [`ServerEvent`].

use std::fmt;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{DomainError, Result};
use crate::models::UserId;

pub type MessageId = i64;

/// A persisted direct message. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub message: String,
    pub time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewChatMessage {
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub message: String,
    pub time: DateTime<Utc>,
}

/// Fan-out room name. The only accepted scheme is the decimal user id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomKey(String);

impl RoomKey {
    pub fn for_user(user_id: UserId) -> Self {
        Self(user_id.to_string())
    }

    /// Accepts only names that are themselves user ids.
    pub fn parse(raw: &str) -> Result<Self> {
        raw.trim()
            .parse::<UserId>()
            .map(Self::for_user)
            .map_err(|_| DomainError::validation(format!("room '{raw}' is not a user id")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn user_id(&self) -> UserId {
        // constructed only from a UserId, so this cannot fail
        self.0.parse().unwrap_or_default()
    }
}

impl fmt::Display for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Clients send ids either as JSON numbers or as strings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum IdValue {
    Int(i64),
    Text(String),
}

impl IdValue {
    pub fn to_user_id(&self, field: &str) -> Result<UserId> {
        match self {
            Self::Int(id) => Ok(*id),
            Self::Text(raw) => raw
                .trim()
                .parse()
                .map_err(|_| DomainError::validation(format!("{field} must be a user id"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JoinRoom {
    #[serde(default)]
    pub user_id: Option<IdValue>,
    /// Older clients name the room directly
    #[serde(default)]
    pub room: Option<String>,
}

impl JoinRoom {
    pub fn room_key(&self) -> Result<RoomKey> {
        match (&self.user_id, &self.room) {
            (Some(id), _) => id.to_user_id("user_id").map(RoomKey::for_user),
            (None, Some(room)) => RoomKey::parse(room),
            (None, None) => Err(DomainError::validation("join_room needs a user_id")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IncomingMessage {
    pub sender: IdValue,
    pub receiver: IdValue,
    pub message: String,
    #[serde(default)]
    pub time: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    JoinRoom(JoinRoom),
    NewMessage(IncomingMessage),
}

impl ClientEvent {
    /// Decodes one text frame. A `data` payload that is itself a JSON string
    /// is unwrapped once, as some clients double-encode it.
    pub fn decode(frame: &str) -> Result<Self> {
        let mut value: Value = serde_json::from_str(frame)
            .map_err(|e| DomainError::validation(format!("malformed event: {e}")))?;
        if let Some(Value::String(inner)) = value.get("data") {
            let inner: Value = serde_json::from_str(inner)
                .map_err(|e| DomainError::validation(format!("malformed event data: {e}")))?;
            value["data"] = inner;
        }
        serde_json::from_value(value)
            .map_err(|e| DomainError::validation(format!("unrecognized event: {e}")))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    Joined { room: String },
    NewMessage(ChatMessage),
    Error { message: String },
}

impl ServerEvent {
    pub fn encode(&self) -> String {
        // plain data enum, serialization is infallible
        serde_json::to_string(self).unwrap_or_default()
    }
}

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Interprets a client-supplied timestamp. RFC 3339 strings, naive ISO
/// strings (taken as UTC) and epoch seconds or milliseconds are accepted;
/// anything else, or no value at all, yields `now`.
pub fn coerce_message_time(raw: Option<&Value>, now: DateTime<Utc>) -> DateTime<Utc> {
    match raw {
        Some(Value::String(text)) => parse_time_text(text.trim()).unwrap_or(now),
        Some(Value::Number(n)) => n
            .as_i64()
            .and_then(|v| {
                if v.abs() >= 100_000_000_000 {
                    Utc.timestamp_millis_opt(v).single()
                } else {
                    Utc.timestamp_opt(v, 0).single()
                }
            })
            .unwrap_or(now),
        _ => now,
    }
}

fn parse_time_text(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|naive| naive.and_utc())
}
