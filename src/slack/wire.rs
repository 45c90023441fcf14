//! Web API response shapes
//!
//! Only the fields the client reads are declared; everything else in the
//! payload is ignored. Conversions into core records live next to the shapes.

use serde::Deserialize;
use serde_json::Value;

use crate::core::types::{
    ConversationKind, ConversationRecord, Marker, MessageRecord, Reaction, UserRecord,
};

#[derive(Debug, Deserialize)]
pub struct ChannelsPage {
    #[serde(default)]
    pub channels: Vec<WireChannel>,
}

#[derive(Debug, Deserialize)]
pub struct ChannelBody {
    pub channel: WireChannel,
}

#[derive(Debug, Deserialize)]
pub struct UserBody {
    pub user: WireUser,
}

#[derive(Debug, Deserialize)]
pub struct UsersPage {
    #[serde(default)]
    pub members: Vec<WireUser>,
}

#[derive(Debug, Deserialize)]
pub struct MessagesPage {
    #[serde(default)]
    pub messages: Vec<WireMessage>,
    #[serde(default)]
    pub has_more: bool,
}

#[derive(Debug, Deserialize)]
pub struct MembersPage {
    #[serde(default)]
    pub members: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct AuthTest {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct Posted {
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub ts: Option<String>,
}

/// `conversations.open` answers with `{"channel": {"id": ...}}`, sometimes
/// with nothing else
#[derive(Debug, Deserialize)]
pub struct Opened {
    pub channel: WireChannel,
    #[serde(default)]
    pub already_open: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct TextValue {
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct WireChannel {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub is_im: bool,
    #[serde(default)]
    pub is_mpim: bool,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(default)]
    pub unread_count: Option<u32>,
    #[serde(default)]
    pub unread_count_display: Option<u32>,
    #[serde(default)]
    pub last_read: Option<String>,
    /// A message object on most methods, a bare ts on some
    #[serde(default)]
    pub latest: Option<Value>,
    #[serde(default)]
    pub topic: Option<TextValue>,
    #[serde(default)]
    pub purpose: Option<TextValue>,
    #[serde(default)]
    pub num_members: Option<u32>,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub creator: Option<String>,
}

impl From<WireChannel> for ConversationRecord {
    fn from(wire: WireChannel) -> Self {
        let kind = if wire.is_im {
            ConversationKind::Direct
        } else if wire.is_mpim {
            ConversationKind::GroupDirect
        } else {
            ConversationKind::Channel
        };
        let latest = wire.latest.as_ref().and_then(latest_ts).map(Marker::from);

        Self {
            id: wire.id,
            kind,
            name: wire.name.filter(|n| !n.is_empty()),
            is_private: wire.is_private,
            is_archived: wire.is_archived,
            user: wire.user.filter(|u| !u.is_empty()),
            members: wire.members,
            unread_count: wire.unread_count,
            unread_count_display: wire.unread_count_display,
            last_read: wire.last_read.filter(|ts| !ts.is_empty()).map(Marker::from),
            latest,
            topic: wire.topic.map(|t| t.value).filter(|v| !v.is_empty()),
            purpose: wire.purpose.map(|p| p.value).filter(|v| !v.is_empty()),
            num_members: wire.num_members,
            created: wire.created,
            creator: wire.creator.filter(|c| !c.is_empty()),
        }
    }
}

fn latest_ts(latest: &Value) -> Option<String> {
    match latest {
        Value::String(ts) if !ts.is_empty() => Some(ts.clone()),
        Value::Object(message) => message
            .get("ts")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct WireProfile {
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub real_name: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WireUser {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub real_name: Option<String>,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub updated: i64,
    #[serde(default)]
    pub profile: WireProfile,
}

impl From<WireUser> for UserRecord {
    fn from(wire: WireUser) -> Self {
        let real_name = wire
            .real_name
            .filter(|n| !n.is_empty())
            .unwrap_or(wire.profile.real_name);
        Self {
            id: wire.id,
            name: wire.name,
            real_name,
            display_name: wire.profile.display_name,
            email: wire.profile.email.filter(|e| !e.is_empty()),
            is_bot: wire.is_bot,
            deleted: wire.deleted,
            updated: wire.updated,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WireReaction {
    pub name: String,
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub users: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct WireMessage {
    pub ts: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub thread_ts: Option<String>,
    #[serde(default)]
    pub reply_count: u32,
    #[serde(default)]
    pub reactions: Vec<WireReaction>,
}

impl From<WireMessage> for MessageRecord {
    fn from(wire: WireMessage) -> Self {
        Self {
            ts: Marker::from(wire.ts),
            user: wire.user.filter(|u| !u.is_empty()),
            text: wire.text,
            thread_ts: wire.thread_ts.map(Marker::from),
            reply_count: wire.reply_count,
            reactions: wire
                .reactions
                .into_iter()
                .map(|r| Reaction {
                    name: r.name,
                    count: r.count,
                    users: r.users,
                })
                .collect(),
        }
    }
}
