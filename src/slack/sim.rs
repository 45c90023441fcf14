//! In-process directory simulator
//!
//! Holds a small workspace in memory and records every port call, so tests
//! can assert on both results and call counts (e.g. "the thread was never
//! fetched"). Failures can be injected per operation or per argument.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::core::participants::ParticipantSet;
use crate::core::traits::{Directory, DirectoryResult};
use crate::core::types::{
    ChannelVisibility, ConversationFilter, ConversationKind, ConversationRecord, Marker,
    MessageRecord, UserId, UserRecord,
};
use crate::core::DirectoryError;

/// Port operation, used as the key for call accounting and failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectoryCall {
    ListConversations,
    ConversationDetail,
    LookupByEmail,
    ListUsers,
    GetUser,
    GetMessage,
    ThreadReplies,
    OpenConversation,
    ListMembers,
    Whoami,
}

impl DirectoryCall {
    /// Web API method the operation corresponds to
    pub fn method(&self) -> &'static str {
        match self {
            Self::ListConversations => "conversations.list",
            Self::ConversationDetail => "conversations.info",
            Self::LookupByEmail => "users.lookupByEmail",
            Self::ListUsers => "users.list",
            Self::GetUser => "users.info",
            Self::GetMessage => "conversations.history",
            Self::ThreadReplies => "conversations.replies",
            Self::OpenConversation => "conversations.open",
            Self::ListMembers => "conversations.members",
            Self::Whoami => "auth.test",
        }
    }
}

/// One recorded call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimEvent {
    pub call: DirectoryCall,
    pub argument: String,
}

#[derive(Default)]
struct SimState {
    conversations: Vec<ConversationRecord>,
    next_conversation: usize,
    events: Vec<SimEvent>,
}

/// Simulated workspace implementing [`Directory`]
#[derive(Default)]
pub struct SimDirectory {
    users: Vec<UserRecord>,
    messages: HashMap<(String, String), MessageRecord>,
    threads: HashMap<(String, String), Vec<MessageRecord>>,
    channel_members: HashMap<String, Vec<UserId>>,
    caller: Option<UserId>,
    list_omits_unread: bool,
    list_omits_members: bool,
    /// Operation-wide failures: every call to the op fails with this code
    failures: HashMap<DirectoryCall, String>,
    /// Argument-specific failures
    targeted_failures: HashMap<(DirectoryCall, String), String>,
    state: Mutex<SimState>,
}

impl SimDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, user: UserRecord) -> Self {
        self.users.push(user);
        self
    }

    /// Shorthand for a user with only a handle
    pub fn with_named_user(self, id: &str, name: &str) -> Self {
        self.with_user(UserRecord {
            id: id.to_string(),
            name: name.to_string(),
            ..Default::default()
        })
    }

    pub fn with_conversation(self, record: ConversationRecord) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.conversations.push(record);
        }
        self
    }

    pub fn with_channel_members(mut self, channel: &str, members: &[&str]) -> Self {
        self.channel_members.insert(
            channel.to_string(),
            members.iter().map(|m| m.to_string()).collect(),
        );
        self
    }

    pub fn with_message(mut self, conversation: &str, message: MessageRecord) -> Self {
        self.messages.insert(
            (conversation.to_string(), message.ts.as_str().to_string()),
            message,
        );
        self
    }

    /// Thread under `parent_ts`; the parent is prepended the way the platform does
    pub fn with_thread(
        mut self,
        conversation: &str,
        parent_ts: &str,
        replies: Vec<MessageRecord>,
    ) -> Self {
        let key = (conversation.to_string(), parent_ts.to_string());
        let mut thread = Vec::with_capacity(replies.len() + 1);
        if let Some(parent) = self.messages.get(&key) {
            thread.push(parent.clone());
        }
        thread.extend(replies);
        self.threads.insert(key, thread);
        self
    }

    pub fn with_caller(mut self, id: &str) -> Self {
        self.caller = Some(id.to_string());
        self
    }

    /// Strip unread data from listings, forcing detail fetches
    pub fn listing_without_unread(mut self) -> Self {
        self.list_omits_unread = true;
        self
    }

    /// Strip group members from listings, forcing member fetches
    pub fn listing_without_members(mut self) -> Self {
        self.list_omits_members = true;
        self
    }

    /// Every call of `call` fails with the platform error `code`
    pub fn failing(mut self, call: DirectoryCall, code: &str) -> Self {
        self.failures.insert(call, code.to_string());
        self
    }

    /// Calls of `call` with this exact argument fail with `code`
    pub fn failing_for(mut self, call: DirectoryCall, argument: &str, code: &str) -> Self {
        self.targeted_failures
            .insert((call, argument.to_string()), code.to_string());
        self
    }

    /// Number of times `call` was issued
    pub fn calls(&self, call: DirectoryCall) -> usize {
        self.events().iter().filter(|e| e.call == call).count()
    }

    /// Arguments `call` was issued with, in order
    pub fn arguments(&self, call: DirectoryCall) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|e| e.call == call)
            .map(|e| e.argument)
            .collect()
    }

    pub fn events(&self) -> Vec<SimEvent> {
        self.state
            .lock()
            .map(|state| state.events.clone())
            .unwrap_or_default()
    }

    /// Conversations currently known, including ones opened during the run
    pub fn conversations(&self) -> Vec<ConversationRecord> {
        self.state
            .lock()
            .map(|state| state.conversations.clone())
            .unwrap_or_default()
    }

    fn record(&self, call: DirectoryCall, argument: &str) -> DirectoryResult<()> {
        if let Ok(mut state) = self.state.lock() {
            state.events.push(SimEvent {
                call,
                argument: argument.to_string(),
            });
        }
        let code = self
            .targeted_failures
            .get(&(call, argument.to_string()))
            .or_else(|| self.failures.get(&call));
        match code {
            Some(code) => Err(DirectoryError::from_api_code(call.method(), code, None)),
            None => Ok(()),
        }
    }

    fn find_conversation(&self, id: &str) -> Option<ConversationRecord> {
        self.state
            .lock()
            .ok()?
            .conversations
            .iter()
            .find(|c| c.id == id)
            .cloned()
    }

    fn as_listed(&self, record: &ConversationRecord) -> ConversationRecord {
        let mut listed = record.clone();
        if self.list_omits_unread {
            listed.unread_count = None;
            listed.unread_count_display = None;
            listed.last_read = None;
        }
        if self.list_omits_members && listed.kind == ConversationKind::GroupDirect {
            listed.members.clear();
        }
        listed
    }
}

impl Directory for SimDirectory {
    fn list_conversations(
        &self,
        filter: &ConversationFilter,
    ) -> DirectoryResult<Vec<ConversationRecord>> {
        let kinds = filter
            .kinds
            .iter()
            .map(|k| k.label())
            .collect::<Vec<_>>()
            .join(",");
        self.record(DirectoryCall::ListConversations, &kinds)?;

        let conversations = self.conversations();
        let listed = conversations
            .iter()
            .filter(|c| filter.includes(c.kind))
            .filter(|c| filter.include_archived || !c.is_archived)
            .filter(|c| {
                c.kind != ConversationKind::Channel
                    || match filter.visibility {
                        ChannelVisibility::All => true,
                        ChannelVisibility::Public => !c.is_private,
                        ChannelVisibility::Private => c.is_private,
                    }
            })
            .take(filter.limit.unwrap_or(usize::MAX))
            .map(|c| self.as_listed(c))
            .collect();
        Ok(listed)
    }

    fn get_conversation_detail(&self, id: &str) -> DirectoryResult<ConversationRecord> {
        self.record(DirectoryCall::ConversationDetail, id)?;
        self.find_conversation(id)
            .ok_or_else(|| DirectoryError::NotFound("channel_not_found".to_string()))
    }

    fn lookup_user_by_email(&self, email: &str) -> DirectoryResult<Option<UserRecord>> {
        self.record(DirectoryCall::LookupByEmail, email)?;
        Ok(self
            .users
            .iter()
            .find(|u| u.email.as_deref() == Some(email))
            .cloned())
    }

    fn list_all_users(&self) -> DirectoryResult<Vec<UserRecord>> {
        self.record(DirectoryCall::ListUsers, "")?;
        Ok(self.users.clone())
    }

    fn get_user(&self, id: &str) -> DirectoryResult<Option<UserRecord>> {
        self.record(DirectoryCall::GetUser, id)?;
        Ok(self.users.iter().find(|u| u.id == id).cloned())
    }

    fn get_message(
        &self,
        conversation: &str,
        ts: &Marker,
    ) -> DirectoryResult<Option<MessageRecord>> {
        self.record(DirectoryCall::GetMessage, ts.as_str())?;
        if let Some(message) = self
            .messages
            .iter()
            .find(|((conv, _), message)| conv == conversation && message.ts.same_instant(ts))
            .map(|(_, message)| message)
        {
            return Ok(Some(message.clone()));
        }
        // Thread replies are addressable by their own ts as well
        Ok(self
            .threads
            .iter()
            .filter(|((conv, _), _)| conv == conversation)
            .flat_map(|(_, thread)| thread.iter().skip(1))
            .find(|reply| reply.ts.same_instant(ts))
            .cloned())
    }

    fn get_thread_replies(
        &self,
        conversation: &str,
        ts: &Marker,
    ) -> DirectoryResult<Vec<MessageRecord>> {
        self.record(DirectoryCall::ThreadReplies, ts.as_str())?;
        let key = (conversation.to_string(), ts.as_str().to_string());
        if let Some(thread) = self.threads.get(&key) {
            return Ok(thread.clone());
        }
        match self.messages.get(&key) {
            Some(parent) => Ok(vec![parent.clone()]),
            None => Err(DirectoryError::NotFound("thread_not_found".to_string())),
        }
    }

    fn open_conversation(&self, participants: &[UserId]) -> DirectoryResult<ConversationRecord> {
        let target = ParticipantSet::from_ids(participants.iter().cloned());
        self.record(DirectoryCall::OpenConversation, &target.joined())?;

        let kind = ConversationKind::for_participant_count(target.len())
            .ok_or_else(|| DirectoryError::from_api_code("conversations.open", "no_user", None))?;

        let mut state = self
            .state
            .lock()
            .map_err(|_| DirectoryError::Network("simulator state poisoned".to_string()))?;

        let caller = self.caller.as_deref().unwrap_or_default();
        let existing = state.conversations.iter().find(|c| {
            c.kind == kind
                && ParticipantSet::from_ids(c.participants())
                    .without(caller)
                    .same_members(&target.without(caller))
        });
        if let Some(existing) = existing {
            return Ok(existing.clone());
        }

        state.next_conversation += 1;
        let prefix = if kind == ConversationKind::Direct { "D" } else { "G" };
        let mut created = ConversationRecord::new(
            format!("{}NEW{}", prefix, state.next_conversation),
            kind,
        );
        match kind {
            ConversationKind::Direct => created.user = target.iter().next().cloned(),
            _ => {
                let mut members = target.to_vec();
                if let Some(caller) = &self.caller {
                    if !target.contains(caller) {
                        members.push(caller.clone());
                    }
                }
                created.members = members;
            }
        }
        state.conversations.push(created.clone());
        Ok(created)
    }

    fn list_members(&self, conversation: &str) -> DirectoryResult<Vec<UserId>> {
        self.record(DirectoryCall::ListMembers, conversation)?;
        if let Some(members) = self.channel_members.get(conversation) {
            return Ok(members.clone());
        }
        let record = self
            .find_conversation(conversation)
            .ok_or_else(|| DirectoryError::NotFound("channel_not_found".to_string()))?;
        Ok(record.participants())
    }

    fn whoami(&self) -> DirectoryResult<UserId> {
        self.record(DirectoryCall::Whoami, "")?;
        self.caller
            .clone()
            .ok_or_else(|| DirectoryError::Unauthorized("not_authed".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_calls() {
        let sim = SimDirectory::new().with_named_user("U1", "alice");
        assert!(sim.get_user("U1").unwrap().is_some());
        assert!(sim.get_user("U9").unwrap().is_none());
        assert_eq!(sim.calls(DirectoryCall::GetUser), 2);
        assert_eq!(sim.arguments(DirectoryCall::GetUser), vec!["U1", "U9"]);
    }

    #[test]
    fn test_targeted_failure() {
        let sim = SimDirectory::new()
            .with_named_user("U1", "alice")
            .failing_for(DirectoryCall::GetUser, "U1", "user_not_visible");
        let err = sim.get_user("U1").unwrap_err();
        assert!(matches!(err, DirectoryError::Api { .. }));
    }

    #[test]
    fn test_open_reuses_existing_group() {
        let mut group = ConversationRecord::new("G1", ConversationKind::GroupDirect);
        group.members = vec!["U3".into(), "U1".into(), "U2".into(), "UME".into()];
        let sim = SimDirectory::new().with_caller("UME").with_conversation(group);

        let opened = sim
            .open_conversation(&["U1".into(), "U2".into(), "U3".into()])
            .unwrap();
        assert_eq!(opened.id, "G1");

        let created = sim.open_conversation(&["U1".into(), "U2".into()]).unwrap();
        assert_eq!(created.kind, ConversationKind::GroupDirect);
        assert_eq!(sim.conversations().len(), 2);
    }
}
