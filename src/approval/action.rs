//! Typed write actions
//!
//! Every mutating command is described by a [`WriteAction`] before it runs.
//! The same value feeds the approval prompt, the dry-run envelope and the
//! approval-required envelope.

use serde::Serialize;
use serde_json::Value;

/// Risk classification for write actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Adds or changes content
    Write,
    /// Hard to undo or affects other people's access
    Dangerous,
}

impl RiskLevel {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Write => "Write",
            Self::Dangerous => "Dangerous",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum WriteAction {
    SendMessage {
        channel: String,
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        thread_ts: Option<String>,
        #[serde(skip_serializing_if = "std::ops::Not::not")]
        broadcast: bool,
    },
    SendDm {
        users: Vec<String>,
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        thread_ts: Option<String>,
    },
    EditMessage {
        channel: String,
        ts: String,
        text: String,
    },
    AddReaction {
        channel: String,
        ts: String,
        emoji: String,
    },
    RemoveReaction {
        channel: String,
        ts: String,
        emoji: String,
    },
    CreateChannel {
        name: String,
        private: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        topic: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        purpose: Option<String>,
    },
    ArchiveChannel {
        channel: String,
    },
    UnarchiveChannel {
        channel: String,
    },
    RenameChannel {
        channel: String,
        new_name: String,
    },
    SetTopic {
        channel: String,
        topic: String,
    },
    SetPurpose {
        channel: String,
        purpose: String,
    },
    InviteUsers {
        channel: String,
        users: Vec<String>,
    },
    KickUsers {
        channel: String,
        users: Vec<String>,
    },
    MarkRead {
        channel: String,
        ts: String,
    },
}

impl WriteAction {
    /// Stable snake_case name, as reported in envelopes
    pub fn name(&self) -> &'static str {
        match self {
            Self::SendMessage { .. } => "send_message",
            Self::SendDm { .. } => "send_dm",
            Self::EditMessage { .. } => "edit_message",
            Self::AddReaction { .. } => "add_reaction",
            Self::RemoveReaction { .. } => "remove_reaction",
            Self::CreateChannel { .. } => "create_channel",
            Self::ArchiveChannel { .. } => "archive_channel",
            Self::UnarchiveChannel { .. } => "unarchive_channel",
            Self::RenameChannel { .. } => "rename_channel",
            Self::SetTopic { .. } => "set_topic",
            Self::SetPurpose { .. } => "set_purpose",
            Self::InviteUsers { .. } => "invite_users",
            Self::KickUsers { .. } => "kick_users",
            Self::MarkRead { .. } => "mark_read",
        }
    }

    pub fn risk(&self) -> RiskLevel {
        match self {
            Self::ArchiveChannel { .. } | Self::KickUsers { .. } | Self::RenameChannel { .. } => {
                RiskLevel::Dangerous
            }
            _ => RiskLevel::Write,
        }
    }

    /// One-line human description
    pub fn describe(&self) -> String {
        match self {
            Self::SendMessage {
                channel,
                text,
                thread_ts: Some(ts),
                ..
            } => format!("Reply in thread {} of {}: {:?}", ts, channel, text),
            Self::SendMessage { channel, text, .. } => {
                format!("Send message to {}: {:?}", channel, text)
            }
            Self::SendDm {
                users,
                text,
                thread_ts: Some(ts),
            } => format!("Reply in DM thread {} with {}: {:?}", ts, users.join(", "), text),
            Self::SendDm { users, text, .. } => {
                format!("Send DM to {}: {:?}", users.join(", "), text)
            }
            Self::EditMessage { channel, ts, text } => {
                format!("Edit message {} in {} to {:?}", ts, channel, text)
            }
            Self::AddReaction { channel, emoji, .. } => {
                format!("Add reaction :{}: to message in {}", emoji, channel)
            }
            Self::RemoveReaction { channel, emoji, .. } => {
                format!("Remove reaction :{}: from message in {}", emoji, channel)
            }
            Self::CreateChannel {
                name,
                private: true,
                ..
            } => format!("Create private channel #{}", name),
            Self::CreateChannel { name, .. } => format!("Create channel #{}", name),
            Self::ArchiveChannel { channel } => format!("Archive channel {}", channel),
            Self::UnarchiveChannel { channel } => format!("Unarchive channel {}", channel),
            Self::RenameChannel { channel, new_name } => {
                format!("Rename channel {} to {}", channel, new_name)
            }
            Self::SetTopic { channel, topic } => {
                format!("Set topic of {} to {:?}", channel, topic)
            }
            Self::SetPurpose { channel, purpose } => {
                format!("Set purpose of {} to {:?}", channel, purpose)
            }
            Self::InviteUsers { channel, users } => {
                format!("Invite {} to {}", users.join(", "), channel)
            }
            Self::KickUsers { channel, users } => {
                format!("Remove {} from {}", users.join(", "), channel)
            }
            Self::MarkRead { channel, ts } => format!("Mark {} read up to {}", channel, ts),
        }
    }

    /// Action fields without the tag
    pub fn payload(&self) -> Value {
        match serde_json::to_value(self) {
            Ok(Value::Object(mut fields)) => {
                fields.remove("action");
                Value::Object(fields)
            }
            _ => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_has_no_tag() {
        let action = WriteAction::AddReaction {
            channel: "C1".into(),
            ts: "1.000001".into(),
            emoji: "eyes".into(),
        };
        assert_eq!(action.name(), "add_reaction");
        assert_eq!(
            action.payload(),
            json!({"channel": "C1", "ts": "1.000001", "emoji": "eyes"})
        );
    }

    #[test]
    fn test_describe() {
        let action = WriteAction::CreateChannel {
            name: "ops".into(),
            private: true,
            topic: None,
            purpose: None,
        };
        assert_eq!(action.describe(), "Create private channel #ops");

        let action = WriteAction::SendMessage {
            channel: "C1".into(),
            text: "hi".into(),
            thread_ts: None,
            broadcast: false,
        };
        assert_eq!(action.describe(), "Send message to C1: \"hi\"");
        assert_eq!(action.payload(), json!({"channel": "C1", "text": "hi"}));
    }

    #[test]
    fn test_risk() {
        let archive = WriteAction::ArchiveChannel {
            channel: "C1".into(),
        };
        assert_eq!(archive.risk(), RiskLevel::Dangerous);
        let topic = WriteAction::SetTopic {
            channel: "C1".into(),
            topic: "t".into(),
        };
        assert_eq!(topic.risk(), RiskLevel::Write);
    }
}
