//! Core traits for the domain layer
//!
//! The core components never talk to the network themselves. They take a
//! [`Directory`] by reference, so the Slack client, the in-process simulator
//! and test doubles are interchangeable.

use super::errors::DirectoryError;
use super::types::{
    ConversationFilter, ConversationRecord, Marker, MessageRecord, UserId, UserRecord,
};

pub type DirectoryResult<T> = std::result::Result<T, DirectoryError>;

/// Remote directory of users, conversations and messages
///
/// Every call is a blocking round trip. Implementations own retries; callers
/// issue calls sequentially and never assume results are cached.
pub trait Directory {
    /// One bounded listing of conversations matching `filter`
    fn list_conversations(
        &self,
        filter: &ConversationFilter,
    ) -> DirectoryResult<Vec<ConversationRecord>>;

    /// Authoritative single-conversation fetch, including unread data
    fn get_conversation_detail(&self, id: &str) -> DirectoryResult<ConversationRecord>;

    /// `Ok(None)` when no member has that email
    fn lookup_user_by_email(&self, email: &str) -> DirectoryResult<Option<UserRecord>>;

    fn list_all_users(&self) -> DirectoryResult<Vec<UserRecord>>;

    /// `Ok(None)` when the ID is unknown
    fn get_user(&self, id: &str) -> DirectoryResult<Option<UserRecord>>;

    /// The message stamped exactly `ts`, or `Ok(None)` if it is gone
    fn get_message(
        &self,
        conversation: &str,
        ts: &Marker,
    ) -> DirectoryResult<Option<MessageRecord>>;

    /// Thread replies; the first element is always the parent
    fn get_thread_replies(
        &self,
        conversation: &str,
        ts: &Marker,
    ) -> DirectoryResult<Vec<MessageRecord>>;

    /// Open a direct conversation with exactly these participants,
    /// returning the existing one if the platform already has it
    fn open_conversation(&self, participants: &[UserId]) -> DirectoryResult<ConversationRecord>;

    /// Member IDs of a conversation
    fn list_members(&self, conversation: &str) -> DirectoryResult<Vec<UserId>>;

    /// User ID the current credentials act as
    fn whoami(&self) -> DirectoryResult<UserId>;
}
