//! Wire protocol for the WebSocket connection.
//!
//! Frames are JSON objects `{"type": ..., "payload": ...}`; payload
//! fields are camelCase. Inbound parsing also accepts the legacy field
//! names `event`/`data`. Unknown inbound event types are ignored, not
//! errors, so older servers tolerate newer clients.

use axum::extract::ws::Message;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::domain::chat::{DirectMessage, Message as ChatMessage, User};
use crate::domain::foundation::{ChannelId, UserId};

// ============================================
// Server -> Client Events
// ============================================

/// All events the server pushes to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum ServerEvent {
    /// A message was posted to a channel.
    #[serde(rename = "message:new")]
    MessageNew(MessageEvent),

    /// A direct message arrived.
    #[serde(rename = "dm:new")]
    DmNew(DmEvent),

    /// Someone started typing in a channel.
    #[serde(rename = "typing:start")]
    TypingStart(TypingEvent),

    /// Someone stopped typing in a channel.
    #[serde(rename = "typing:stop")]
    TypingStop(TypingEvent),

    /// Someone started typing a direct message to the recipient.
    #[serde(rename = "dm:typing:start")]
    DmTypingStart(DmTypingEvent),

    /// Someone stopped typing a direct message to the recipient.
    #[serde(rename = "dm:typing:stop")]
    DmTypingStop(DmTypingEvent),

    /// A user's presence changed.
    #[serde(rename = "presence:update")]
    PresenceUpdate(PresenceEvent),
}

impl ServerEvent {
    /// Serialize to a WebSocket text frame. Called exactly once per
    /// broadcast; the resulting frame is cloned per recipient so the
    /// payload is never re-serialized.
    pub fn to_frame(&self) -> Result<Message, serde_json::Error> {
        Ok(Message::Text(serde_json::to_string(self)?))
    }
}

/// Payload for `message:new`: the stored message plus sender profile.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageEvent {
    #[serde(flatten)]
    pub message: ChatMessage,
    pub sender: User,
}

/// Payload for `dm:new`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DmEvent {
    #[serde(flatten)]
    pub message: DirectMessage,
    pub sender: User,
    pub receiver: User,
}

/// Payload for channel typing indicators.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingEvent {
    pub channel_id: ChannelId,
    pub user_id: UserId,
    pub user_name: String,
}

/// Payload for direct-message typing indicators.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DmTypingEvent {
    pub sender_id: UserId,
    pub receiver_id: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<String>,
}

/// Payload for `presence:update`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceEvent {
    pub user_id: UserId,
    pub user_name: String,
    pub status: &'static str,
}

// ============================================
// Client -> Server Events
// ============================================

/// Typed inbound events after parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    TypingStart { channel_id: ChannelId },
    TypingStop { channel_id: ChannelId },
    ChannelSubscribe { channel_id: ChannelId },
    ChannelUnsubscribe { channel_id: ChannelId },
    DmTypingStart { receiver_id: UserId },
    DmTypingStop { receiver_id: UserId },
}

/// A frame that could not be parsed at all.
#[derive(Debug, Error)]
#[error("malformed frame: {0}")]
pub struct MalformedFrame(#[from] serde_json::Error);

#[derive(Debug, Deserialize)]
struct InboundFrame {
    #[serde(rename = "type", alias = "event")]
    event_type: String,
    #[serde(alias = "data", default)]
    payload: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelRef {
    channel_id: ChannelId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReceiverRef {
    receiver_id: UserId,
}

/// Parse an inbound text frame.
///
/// Returns `Ok(None)` for unknown event types (ignored for forward
/// compatibility) and `Err` for frames whose structure or payload is
/// invalid (logged and dropped by the caller; never closes the
/// connection).
pub fn parse_client_frame(text: &str) -> Result<Option<ClientEvent>, MalformedFrame> {
    let frame: InboundFrame = serde_json::from_str(text)?;

    let event = match frame.event_type.as_str() {
        "typing:start" => {
            let ChannelRef { channel_id } = serde_json::from_value(frame.payload)?;
            ClientEvent::TypingStart { channel_id }
        }
        "typing:stop" => {
            let ChannelRef { channel_id } = serde_json::from_value(frame.payload)?;
            ClientEvent::TypingStop { channel_id }
        }
        "channel:subscribe" => {
            let ChannelRef { channel_id } = serde_json::from_value(frame.payload)?;
            ClientEvent::ChannelSubscribe { channel_id }
        }
        "channel:unsubscribe" => {
            let ChannelRef { channel_id } = serde_json::from_value(frame.payload)?;
            ClientEvent::ChannelUnsubscribe { channel_id }
        }
        "dm:typing:start" => {
            let ReceiverRef { receiver_id } = serde_json::from_value(frame.payload)?;
            ClientEvent::DmTypingStart { receiver_id }
        }
        "dm:typing:stop" => {
            let ReceiverRef { receiver_id } = serde_json::from_value(frame.payload)?;
            ClientEvent::DmTypingStop { receiver_id }
        }
        _ => return Ok(None),
    };

    Ok(Some(event))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn typing_start_parses_with_type_and_payload_keys() {
        let channel = ChannelId::new();
        let text = json!({"type": "typing:start", "payload": {"channelId": channel}}).to_string();
        assert_eq!(
            parse_client_frame(&text).unwrap(),
            Some(ClientEvent::TypingStart {
                channel_id: channel
            })
        );
    }

    #[test]
    fn legacy_event_and_data_keys_are_accepted() {
        let channel = ChannelId::new();
        let text =
            json!({"event": "channel:subscribe", "data": {"channelId": channel}}).to_string();
        assert_eq!(
            parse_client_frame(&text).unwrap(),
            Some(ClientEvent::ChannelSubscribe {
                channel_id: channel
            })
        );
    }

    #[test]
    fn unknown_event_type_is_ignored_not_an_error() {
        let text = json!({"type": "reaction:add", "payload": {"emoji": ":+1:"}}).to_string();
        assert_eq!(parse_client_frame(&text).unwrap(), None);
    }

    #[test]
    fn garbage_is_a_malformed_frame() {
        assert!(parse_client_frame("not json at all").is_err());
    }

    #[test]
    fn known_type_with_bad_payload_is_malformed() {
        let text = json!({"type": "typing:start", "payload": {"channelId": 42}}).to_string();
        assert!(parse_client_frame(&text).is_err());
    }

    #[test]
    fn dm_typing_parses_receiver() {
        let receiver = UserId::new();
        let text =
            json!({"type": "dm:typing:start", "payload": {"receiverId": receiver}}).to_string();
        assert_eq!(
            parse_client_frame(&text).unwrap(),
            Some(ClientEvent::DmTypingStart {
                receiver_id: receiver
            })
        );
    }

    #[test]
    fn server_events_serialize_with_colon_separated_type() {
        let event = ServerEvent::TypingStart(TypingEvent {
            channel_id: ChannelId::new(),
            user_id: UserId::new(),
            user_name: "Alice".into(),
        });

        let Message::Text(text) = event.to_frame().unwrap() else {
            panic!("expected text frame");
        };
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["type"], "typing:start");
        assert_eq!(value["payload"]["userName"], "Alice");
    }

    #[test]
    fn presence_event_carries_status_string() {
        let event = ServerEvent::PresenceUpdate(PresenceEvent {
            user_id: UserId::new(),
            user_name: "Bea".into(),
            status: "online",
        });

        let Message::Text(text) = event.to_frame().unwrap() else {
            panic!("expected text frame");
        };
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["type"], "presence:update");
        assert_eq!(value["payload"]["status"], "online");
    }
}
