//! Chat entities: users, workspaces, channels, and messages.
//!
//! These are plain data records persisted through the `ChatStore` port.
//! Wire serialization is camelCase to match the client protocol; password
//! hashes are never serialized.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    ChannelId, DirectMessageId, MessageId, UserId, WorkspaceId,
};

/// A registered user account.
///
/// `password_hash` is storage-only and skipped during serialization so a
/// user record can be returned from API handlers directly.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub avatar: Option<String>,
    pub status_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A workspace: the top-level membership boundary.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub id: WorkspaceId,
    pub name: String,
    pub owner_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// Role of a user within a workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Owner,
    Member,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Owner => "owner",
            MemberRole::Member => "member",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "owner" => Some(MemberRole::Owner),
            "member" => Some(MemberRole::Member),
            _ => None,
        }
    }
}

/// A channel inside a workspace.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub id: ChannelId,
    pub workspace_id: WorkspaceId,
    pub name: String,
    pub description: Option<String>,
    pub is_private: bool,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

/// A message posted to a channel.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub channel_id: ChannelId,
    pub sender_id: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A direct message between two users.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectMessage {
    pub id: DirectMessageId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Normalizes a channel name the way the client expects: lowercase with
/// whitespace runs collapsed to single hyphens.
pub fn slugify_channel_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_serialization_never_exposes_password_hash() {
        let user = User {
            id: UserId::new(),
            email: "alice@example.com".into(),
            password_hash: "$2b$10$secret".into(),
            name: "Alice".into(),
            avatar: None,
            status_message: None,
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "alice@example.com");
    }

    #[test]
    fn message_serializes_camel_case() {
        let message = Message {
            id: MessageId::new(),
            channel_id: ChannelId::new(),
            sender_id: UserId::new(),
            content: "hello".into(),
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&message).unwrap();
        assert!(json.get("channelId").is_some());
        assert!(json.get("senderId").is_some());
    }

    #[test]
    fn channel_names_are_slugified() {
        assert_eq!(slugify_channel_name("General Chat"), "general-chat");
        assert_eq!(slugify_channel_name("  Dev   Ops  "), "dev-ops");
        assert_eq!(slugify_channel_name("random"), "random");
    }

    #[test]
    fn member_role_round_trips() {
        assert_eq!(MemberRole::parse("owner"), Some(MemberRole::Owner));
        assert_eq!(MemberRole::parse("member"), Some(MemberRole::Member));
        assert_eq!(MemberRole::parse("admin"), None);
        assert_eq!(MemberRole::Owner.as_str(), "owner");
    }
}
