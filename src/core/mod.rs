//! Core domain modules
//!
//! Conversation resolution and engagement tracking over a [`Directory`]:
//! identity resolution, direct-conversation matching, acknowledgment
//! checks and unread aggregation. Nothing here prints, prompts or encodes
//! output; every operation returns a typed result to the command layer.

pub mod channels;
pub mod conversation_matcher;
pub mod engagement;
pub mod errors;
pub mod identity;
pub mod participants;
pub mod traits;
pub mod types;
pub mod unread;

pub use channels::{ChannelListOptions, ChannelResolver};
pub use conversation_matcher::{ConversationMatcher, DirectSummary, OpenOutcome};
pub use engagement::{EngagementTracker, ReactionSummary};
pub use errors::{CoreError, DirectoryError, FailureKind};
pub use identity::{IdentityResolver, LookupField, Resolution, ResolvedUser, UserListOptions};
pub use participants::{same_participants, ParticipantSet};
pub use traits::{Directory, DirectoryResult};
pub use types::{
    ChannelVisibility, ConversationFilter, ConversationHandle, ConversationKind,
    ConversationRecord, EngagementRecord, Marker, MessageRecord, Reaction, UnreadEntry,
    UserIdentity, UserRecord,
};
pub use unread::{OrderBy, UnreadAggregator, UnreadOptions};

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
