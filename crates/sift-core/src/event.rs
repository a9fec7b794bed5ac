//! Event model for the Sift router.
//!
//! This module provides the data the dispatcher routes on:
//!
//! - [`EventKind`] - the tag classifying what produced an event
//! - [`Event`] - an opaque, read-only JSON record
//! - [`MessageEntity`] - an offset/length annotation inside message text
//! - [`Update`] - a raw transport update split into kind and event
//!
//! Events are never mutated by the router. Extractors borrow them for the
//! duration of one dispatch call.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::UpdateError;

// ============================================================================
// Event Kind
// ============================================================================

/// Classification of an incoming event.
///
/// The set is open: kinds the router does not know about are carried as
/// [`EventKind::Other`] and simply have no subscribed extractors unless one
/// asks for them by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A new message.
    Message,
    /// An edited message.
    EditedMessage,
    /// A new channel post.
    ChannelPost,
    /// An edited channel post.
    EditedChannelPost,
    /// An inline keyboard button press.
    CallbackQuery,
    /// The bot's own membership changed.
    MyChatMember,
    /// Another member's status changed.
    ChatMember,
    /// A request to join a chat.
    ChatJoinRequest,
    /// Any other kind, kept verbatim.
    Other(String),
}

impl EventKind {
    /// Returns the wire name of this kind.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Message => "message",
            Self::EditedMessage => "edited_message",
            Self::ChannelPost => "channel_post",
            Self::EditedChannelPost => "edited_channel_post",
            Self::CallbackQuery => "callback_query",
            Self::MyChatMember => "my_chat_member",
            Self::ChatMember => "chat_member",
            Self::ChatJoinRequest => "chat_join_request",
            Self::Other(name) => name,
        }
    }
}

impl FromStr for EventKind {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "message" => Self::Message,
            "edited_message" => Self::EditedMessage,
            "channel_post" => Self::ChannelPost,
            "edited_channel_post" => Self::EditedChannelPost,
            "callback_query" => Self::CallbackQuery,
            "my_chat_member" => Self::MyChatMember,
            "chat_member" => Self::ChatMember,
            "chat_join_request" => Self::ChatJoinRequest,
            other => Self::Other(other.to_string()),
        })
    }
}

impl From<&str> for EventKind {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(kind) => kind,
            Err(never) => match never {},
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Message Entities
// ============================================================================

/// A typed span inside message text (command, hashtag, mention, ...).
///
/// Offsets and lengths are measured in UTF-16 code units, as delivered by
/// the messaging platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEntity {
    /// Entity type, e.g. `bot_command` or `hashtag`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Start offset in UTF-16 code units.
    pub offset: usize,
    /// Length in UTF-16 code units.
    pub length: usize,
}

impl MessageEntity {
    /// Returns the slice of `text` covered by this entity.
    ///
    /// Returns `None` when the span falls outside the text.
    pub fn slice(&self, text: &str) -> Option<String> {
        let units: Vec<u16> = text.encode_utf16().collect();
        let end = self.offset.checked_add(self.length)?;
        units.get(self.offset..end).map(String::from_utf16_lossy)
    }
}

// ============================================================================
// Event
// ============================================================================

/// An opaque, read-only structured event.
///
/// The router only reads from events through the accessors below; the
/// underlying JSON is available via [`Event::as_value`] for extractors that
/// need something more specific.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Event(Value);

impl Event {
    /// Wraps a JSON value as an event.
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Returns the underlying JSON value.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Consumes the event and returns the underlying JSON value.
    pub fn into_value(self) -> Value {
        self.0
    }

    /// Returns a top-level field, treating `null` as absent.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    /// Returns a nested field by JSON pointer (e.g. `/new_chat_member/status`).
    pub fn pointer(&self, pointer: &str) -> Option<&Value> {
        self.0.pointer(pointer).filter(|v| !v.is_null())
    }

    /// Returns `true` if the top-level field is present and not `null`.
    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Returns a top-level string field.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Returns the message text, falling back to the media caption.
    ///
    /// An empty text falls through to the caption; an empty result is
    /// reported as absent.
    pub fn text_or_caption(&self) -> Option<&str> {
        self.str_field("text")
            .filter(|s| !s.is_empty())
            .or_else(|| self.str_field("caption"))
            .filter(|s| !s.is_empty())
    }

    /// Returns the text entities, falling back to the caption entities.
    ///
    /// Entries that do not have the expected shape are skipped.
    pub fn entities(&self) -> Option<Vec<MessageEntity>> {
        let raw = self
            .get("entities")
            .or_else(|| self.get("caption_entities"))?
            .as_array()?;

        Some(
            raw.iter()
                .filter_map(|item| MessageEntity::deserialize(item).ok())
                .collect(),
        )
    }

    /// Returns the chat id, either from `chat` or from the attached `message`.
    pub fn chat_id(&self) -> Option<i64> {
        self.pointer("/chat/id")
            .or_else(|| self.pointer("/message/chat/id"))
            .and_then(Value::as_i64)
    }
}

impl From<Value> for Event {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// Update
// ============================================================================

/// A raw transport update split into its kind and event payload.
///
/// Updates look like `{"update_id": 1, "message": {...}}`: the key next to
/// `update_id` names the [`EventKind`] and its value is the [`Event`].
#[derive(Debug, Clone)]
pub struct Update {
    /// Transport-assigned sequence number (0 when absent).
    pub update_id: i64,
    /// Kind derived from the payload key.
    pub kind: EventKind,
    /// The event payload.
    pub event: Event,
}

impl Update {
    /// Parses an update from a JSON string.
    pub fn from_json(raw: &str) -> Result<Self, UpdateError> {
        let value: Value = serde_json::from_str(raw)?;
        Self::from_value(value)
    }

    /// Splits a JSON update into kind and event.
    pub fn from_value(value: Value) -> Result<Self, UpdateError> {
        let Value::Object(map) = value else {
            return Err(UpdateError::NotAnObject);
        };

        let update_id = map.get("update_id").and_then(Value::as_i64).unwrap_or(0);
        let (key, payload) = map
            .into_iter()
            .find(|(key, value)| key != "update_id" && value.is_object())
            .ok_or(UpdateError::MissingPayload)?;

        Ok(Self {
            update_id,
            kind: EventKind::from(key.as_str()),
            event: Event::new(payload),
        })
    }
}
