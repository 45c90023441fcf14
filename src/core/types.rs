//! Domain types shared by the core components
//!
//! Two layers live here:
//! - *Records*: the shapes the remote directory hands back (`UserRecord`,
//!   `ConversationRecord`, `MessageRecord`). They mirror what the platform
//!   returns and may have gaps (missing unread counts, missing member lists).
//! - *Values*: what the core produces from them (`UserIdentity`,
//!   `ConversationHandle`, `EngagementRecord`, `UnreadEntry`). All of them are
//!   built per invocation and never persisted.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use super::participants::ParticipantSet;

/// Platform-assigned user identifier (e.g. `U024BE7LH`)
pub type UserId = String;

/// Platform-assigned conversation identifier (e.g. `C024BE91L`, `D024BE91L`)
pub type ConversationId = String;

// ============================================================================
// Markers
// ============================================================================

/// Opaque, monotonically comparable activity marker.
///
/// The platform encodes these as `"<seconds>.<micros>"` strings. Ordering is
/// numeric when both sides parse, so `"999.000001"` sorts before
/// `"1000.000000"`. Markers that do not parse sort after every numeric one
/// and compare as plain strings among themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Marker(String);

impl Marker {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Same point in time, ignoring trailing-zero differences in the fraction
    pub fn same_instant(&self, other: &Self) -> bool {
        match (self.numeric(), other.numeric()) {
            (Some(a), Some(b)) => a == b,
            _ => self.0 == other.0,
        }
    }

    /// `(seconds, micros)` when the marker has the numeric shape
    fn numeric(&self) -> Option<(u64, u64)> {
        let (secs, frac) = match self.0.split_once('.') {
            Some((secs, frac)) => (secs, frac),
            None => (self.0.as_str(), ""),
        };
        if secs.is_empty() || !frac.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let secs = secs.parse::<u64>().ok()?;
        // Right-pad to micro precision so "1.5" and "1.500000" compare equal numerically
        let mut micros = frac.chars().take(6).collect::<String>();
        while micros.len() < 6 {
            micros.push('0');
        }
        Some((secs, micros.parse::<u64>().ok()?))
    }
}

impl Ord for Marker {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric(), other.numeric()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for Marker {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Marker {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for Marker {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

// ============================================================================
// Conversation kinds
// ============================================================================

/// Category of a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConversationKind {
    /// Public or private channel
    Channel,
    /// 1:1 direct message; the counterpart is the only participant
    Direct,
    /// Multi-party direct message
    GroupDirect,
}

impl ConversationKind {
    /// Direct and group-direct conversations are personal messages
    pub fn is_direct(&self) -> bool {
        matches!(self, Self::Direct | Self::GroupDirect)
    }

    /// Kind a direct conversation with `count` distinct participants must have
    pub fn for_participant_count(count: usize) -> Option<Self> {
        match count {
            0 => None,
            1 => Some(Self::Direct),
            _ => Some(Self::GroupDirect),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Channel => "channel",
            Self::Direct => "direct",
            Self::GroupDirect => "group-direct",
        }
    }
}

impl fmt::Display for ConversationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which channels a listing should include
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelVisibility {
    Public,
    Private,
    #[default]
    All,
}

/// Parameters for a single bounded conversation listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationFilter {
    pub kinds: Vec<ConversationKind>,
    pub visibility: ChannelVisibility,
    pub include_archived: bool,
    pub limit: Option<usize>,
}

impl ConversationFilter {
    /// Every conversation kind, archived ones excluded
    pub fn all() -> Self {
        Self::of_kinds(&[
            ConversationKind::Channel,
            ConversationKind::Direct,
            ConversationKind::GroupDirect,
        ])
    }

    pub fn of_kinds(kinds: &[ConversationKind]) -> Self {
        Self {
            kinds: kinds.to_vec(),
            visibility: ChannelVisibility::All,
            include_archived: false,
            limit: None,
        }
    }

    pub fn with_archived(mut self, include_archived: bool) -> Self {
        self.include_archived = include_archived;
        self
    }

    pub fn with_visibility(mut self, visibility: ChannelVisibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit.filter(|l| *l > 0);
        self
    }

    pub fn includes(&self, kind: ConversationKind) -> bool {
        self.kinds.contains(&kind)
    }
}

// ============================================================================
// Records returned by the directory
// ============================================================================

/// A workspace member as the directory reports it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    /// Handle / username
    pub name: String,
    #[serde(default)]
    pub real_name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub updated: i64,
}

impl UserRecord {
    /// Exact match on handle, real name or profile display name
    pub fn answers_to(&self, query: &str) -> bool {
        self.name == query
            || (!self.real_name.is_empty() && self.real_name == query)
            || (!self.display_name.is_empty() && self.display_name == query)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub name: String,
    pub count: u32,
    #[serde(default)]
    pub users: Vec<UserId>,
}

/// A single message with its inline reactions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub ts: Marker,
    /// Author; absent for some bot and system messages
    #[serde(default)]
    pub user: Option<UserId>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub thread_ts: Option<Marker>,
    #[serde(default)]
    pub reply_count: u32,
    #[serde(default)]
    pub reactions: Vec<Reaction>,
}

/// A conversation as the directory reports it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub id: ConversationId,
    pub kind: ConversationKind,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub is_archived: bool,
    /// Counterpart of a 1:1 direct conversation
    #[serde(default)]
    pub user: Option<UserId>,
    /// Members of a group-direct conversation (may be absent on list calls)
    #[serde(default)]
    pub members: Vec<UserId>,
    #[serde(default)]
    pub unread_count: Option<u32>,
    #[serde(default)]
    pub unread_count_display: Option<u32>,
    #[serde(default)]
    pub last_read: Option<Marker>,
    /// Timestamp of the most recent message
    #[serde(default)]
    pub latest: Option<Marker>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default)]
    pub num_members: Option<u32>,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub creator: Option<UserId>,
}

impl ConversationRecord {
    /// Minimal record of the given kind; the rest is filled by the caller
    pub fn new(id: impl Into<String>, kind: ConversationKind) -> Self {
        Self {
            id: id.into(),
            kind,
            name: None,
            is_private: false,
            is_archived: false,
            user: None,
            members: Vec::new(),
            unread_count: None,
            unread_count_display: None,
            last_read: None,
            latest: None,
            topic: None,
            purpose: None,
            num_members: None,
            created: 0,
            creator: None,
        }
    }

    /// Participant IDs as reported, in platform order
    pub fn participants(&self) -> Vec<UserId> {
        match self.kind {
            ConversationKind::Direct => self.user.iter().cloned().collect(),
            ConversationKind::GroupDirect => self.members.clone(),
            ConversationKind::Channel => Vec::new(),
        }
    }

    /// Whether the record carries any unread data at all
    pub fn has_unread_data(&self) -> bool {
        self.unread_count.is_some() || self.unread_count_display.is_some()
    }

    /// Unread count, preferring the raw count and falling back to the
    /// display count when the raw one is zero or absent
    pub fn effective_unread(&self) -> Option<u32> {
        match (self.unread_count, self.unread_count_display) {
            (Some(count), _) if count > 0 => Some(count),
            (raw, Some(display)) if display > 0 || raw.is_none() => Some(display),
            (raw, _) => raw,
        }
    }
}

// ============================================================================
// Core values
// ============================================================================

/// Canonical identity of a workspace member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: UserId,
    pub name: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub is_bot: bool,
}

impl From<&UserRecord> for UserIdentity {
    fn from(user: &UserRecord) -> Self {
        let display_name = [&user.display_name, &user.real_name, &user.name]
            .into_iter()
            .find(|candidate| !candidate.is_empty())
            .cloned()
            .unwrap_or_default();
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            display_name,
            email: user.email.clone(),
            is_bot: user.is_bot,
        }
    }
}

/// A resolved conversation with its canonical participant set
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationHandle {
    pub id: ConversationId,
    pub kind: ConversationKind,
    pub participants: ParticipantSet,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub freshness: Option<Marker>,
    pub unread_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_read: Option<Marker>,
}

impl ConversationHandle {
    pub fn from_record(record: &ConversationRecord) -> Self {
        Self {
            id: record.id.clone(),
            kind: record.kind,
            participants: ParticipantSet::from_ids(record.participants()),
            freshness: record.latest.clone(),
            unread_count: record.effective_unread().unwrap_or(0),
            last_read: record.last_read.clone(),
        }
    }
}

/// Acknowledgment state of a single message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngagementRecord {
    pub timestamp: Marker,
    pub message_author: Option<UserId>,
    /// Distinct non-author reactors, in first-seen order
    pub reacted_users: Vec<UserId>,
    pub reaction_count: usize,
    /// Distinct non-author repliers, in first-seen order
    pub replied_users: Vec<UserId>,
    /// Replies written by someone other than the author
    pub reply_count: usize,
    /// The message carries any reaction at all (author's included)
    pub has_reactions: bool,
    /// The message has a thread at all (author's replies included)
    pub has_replies: bool,
    pub is_acknowledged: bool,
}

/// One conversation in the unread listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnreadEntry {
    pub id: ConversationId,
    pub kind: ConversationKind,
    /// Channel name; absent for direct conversations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub is_private: bool,
    pub unread_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_read: Option<Marker>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub participants: Vec<UserId>,
    /// Filled by the enrichment pass; aligned with `participants` where resolved
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub participant_names: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl UnreadEntry {
    pub fn from_record(record: &ConversationRecord, unread_count: u32) -> Self {
        Self {
            id: record.id.clone(),
            kind: record.kind,
            name: record.name.clone().filter(|_| !record.kind.is_direct()),
            is_private: record.is_private,
            unread_count,
            last_read: record.last_read.clone(),
            participants: record.participants(),
            participant_names: Vec::new(),
            display_name: match record.kind {
                ConversationKind::Channel => record.name.clone(),
                _ => None,
            },
        }
    }
}
