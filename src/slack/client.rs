//! Blocking Slack Web API client
//!
//! Implements [`Directory`] plus the write methods the command layer needs.
//! Every call is a form-encoded POST to `<base_url>/<method>` with a bearer
//! token. Rate limits, 5xx responses and connection failures are retried here
//! and nowhere else.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::thread;
use std::time::Duration;

use super::wire;
use crate::config::ApiConfig;
use crate::core::traits::{Directory, DirectoryResult};
use crate::core::types::{
    ChannelVisibility, ConversationFilter, ConversationKind, ConversationRecord, Marker,
    MessageRecord, UserId, UserRecord,
};
use crate::core::DirectoryError;

const RETRY_ATTEMPT_HEADER: &str = "x-slka-retry-attempt";

type Params = Vec<(&'static str, String)>;

/// Options for `chat.postMessage`
#[derive(Debug, Clone, Default)]
pub struct PostOptions {
    pub thread_ts: Option<Marker>,
    /// Also show a thread reply in the channel
    pub broadcast: bool,
    pub unfurl_links: bool,
    pub unfurl_media: bool,
}

/// Where a posted message landed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostedMessage {
    pub channel: String,
    pub ts: Marker,
}

/// Window for `conversations.history`
#[derive(Debug, Clone, Default)]
pub struct HistoryOptions {
    pub limit: Option<usize>,
    /// Only messages after this unix time
    pub oldest: Option<i64>,
    /// Only messages before this unix time
    pub latest: Option<i64>,
}

pub struct SlackClient {
    http: reqwest::blocking::Client,
    base_url: String,
    token: String,
    max_retries: u32,
    retry_base_delay: Duration,
}

impl SlackClient {
    pub fn new(token: &str, api: &ApiConfig) -> DirectoryResult<Self> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(concat!("slka/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(api.timeout_secs.max(1)))
            .build()
            .map_err(DirectoryError::from_network_error)?;

        Ok(Self {
            http,
            base_url: api.base_url.trim_end_matches('/').to_string(),
            token: token.trim().to_string(),
            max_retries: api.max_retries,
            retry_base_delay: Duration::from_millis(500),
        })
    }

    /// Base delay for exponential backoff when no Retry-After is given
    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    /// Call `method` and decode the success payload into `T`
    fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &[(&str, String)],
    ) -> DirectoryResult<T> {
        let value = self.call_value(method, params)?;
        serde_json::from_value(value)
            .map_err(|e| DirectoryError::Decode(format!("{}: {}", method, e)))
    }

    /// Call `method`, retrying transient failures, and return the raw
    /// payload of an `ok: true` envelope
    fn call_value(&self, method: &str, params: &[(&str, String)]) -> DirectoryResult<Value> {
        let url = format!("{}/{}", self.base_url, method);
        let mut attempt: u32 = 0;
        loop {
            tracing::debug!("POST {} (attempt {})", method, attempt + 1);
            let result = self
                .http
                .post(&url)
                .bearer_auth(&self.token)
                .header(RETRY_ATTEMPT_HEADER, attempt.to_string())
                .form(params)
                .send();

            let error = match result {
                Ok(response) => {
                    let status = response.status();
                    let retry_after = parse_retry_after(response.headers());
                    if status.is_success() {
                        let body: Value = response
                            .json()
                            .map_err(|e| DirectoryError::Decode(format!("{}: {}", method, e)))?;
                        match envelope_error(method, &body, retry_after) {
                            None => return Ok(body),
                            Some(err) => err,
                        }
                    } else {
                        let body = response.text().unwrap_or_default();
                        DirectoryError::from_http_status(status, truncate(&body, 400), retry_after)
                    }
                }
                Err(err) => DirectoryError::from_network_error(err),
            };

            if attempt < self.max_retries && error.is_retryable() {
                let delay = retry_delay(self.retry_base_delay, attempt, error.retry_after());
                tracing::warn!(
                    "{} failed ({}), retrying in {:?}",
                    method,
                    error,
                    delay
                );
                thread::sleep(delay);
                attempt += 1;
                continue;
            }
            return Err(error);
        }
    }

    fn message_by_ts(
        &self,
        method: &str,
        mut params: Params,
        ts: &Marker,
    ) -> DirectoryResult<Option<MessageRecord>> {
        params.push(("ts", ts.to_string()));
        let page: wire::MessagesPage = self.call(method, &params)?;
        Ok(page
            .messages
            .into_iter()
            .map(MessageRecord::from)
            .find(|m| m.ts.same_instant(ts)))
    }

    // ---- write operations -------------------------------------------------

    pub fn post_message(
        &self,
        channel: &str,
        text: &str,
        options: &PostOptions,
    ) -> DirectoryResult<PostedMessage> {
        let mut params: Params = vec![
            ("channel", channel.to_string()),
            ("text", text.to_string()),
            ("unfurl_links", options.unfurl_links.to_string()),
            ("unfurl_media", options.unfurl_media.to_string()),
        ];
        if let Some(thread_ts) = &options.thread_ts {
            params.push(("thread_ts", thread_ts.to_string()));
            if options.broadcast {
                params.push(("reply_broadcast", "true".to_string()));
            }
        }
        let posted: wire::Posted = self.call("chat.postMessage", &params)?;
        posted_message(posted, channel, None)
    }

    pub fn update_message(
        &self,
        channel: &str,
        ts: &Marker,
        text: &str,
    ) -> DirectoryResult<PostedMessage> {
        let params: Params = vec![
            ("channel", channel.to_string()),
            ("ts", ts.to_string()),
            ("text", text.to_string()),
        ];
        let posted: wire::Posted = self.call("chat.update", &params)?;
        posted_message(posted, channel, Some(ts))
    }

    pub fn add_reaction(&self, channel: &str, ts: &Marker, emoji: &str) -> DirectoryResult<()> {
        self.reaction("reactions.add", channel, ts, emoji)
    }

    pub fn remove_reaction(&self, channel: &str, ts: &Marker, emoji: &str) -> DirectoryResult<()> {
        self.reaction("reactions.remove", channel, ts, emoji)
    }

    fn reaction(
        &self,
        method: &str,
        channel: &str,
        ts: &Marker,
        emoji: &str,
    ) -> DirectoryResult<()> {
        let params: Params = vec![
            ("channel", channel.to_string()),
            ("timestamp", ts.to_string()),
            ("name", emoji_name(emoji).to_string()),
        ];
        self.call_value(method, &params).map(|_| ())
    }

    pub fn create_channel(
        &self,
        name: &str,
        is_private: bool,
    ) -> DirectoryResult<ConversationRecord> {
        let params: Params = vec![
            ("name", name.to_string()),
            ("is_private", is_private.to_string()),
        ];
        let body: wire::ChannelBody = self.call("conversations.create", &params)?;
        Ok(body.channel.into())
    }

    pub fn archive_channel(&self, channel: &str) -> DirectoryResult<()> {
        self.call_value("conversations.archive", &[("channel", channel.to_string())])
            .map(|_| ())
    }

    pub fn unarchive_channel(&self, channel: &str) -> DirectoryResult<()> {
        self.call_value("conversations.unarchive", &[("channel", channel.to_string())])
            .map(|_| ())
    }

    pub fn rename_channel(
        &self,
        channel: &str,
        name: &str,
    ) -> DirectoryResult<ConversationRecord> {
        let params: Params = vec![("channel", channel.to_string()), ("name", name.to_string())];
        let body: wire::ChannelBody = self.call("conversations.rename", &params)?;
        Ok(body.channel.into())
    }

    pub fn set_topic(&self, channel: &str, topic: &str) -> DirectoryResult<()> {
        let params: Params = vec![("channel", channel.to_string()), ("topic", topic.to_string())];
        self.call_value("conversations.setTopic", &params).map(|_| ())
    }

    pub fn set_purpose(&self, channel: &str, purpose: &str) -> DirectoryResult<()> {
        let params: Params = vec![
            ("channel", channel.to_string()),
            ("purpose", purpose.to_string()),
        ];
        self.call_value("conversations.setPurpose", &params).map(|_| ())
    }

    pub fn invite(&self, channel: &str, users: &[UserId]) -> DirectoryResult<ConversationRecord> {
        let params: Params = vec![("channel", channel.to_string()), ("users", users.join(","))];
        let body: wire::ChannelBody = self.call("conversations.invite", &params)?;
        Ok(body.channel.into())
    }

    pub fn kick(&self, channel: &str, user: &str) -> DirectoryResult<()> {
        let params: Params = vec![("channel", channel.to_string()), ("user", user.to_string())];
        self.call_value("conversations.kick", &params).map(|_| ())
    }

    pub fn mark_read(&self, channel: &str, ts: &Marker) -> DirectoryResult<()> {
        let params: Params = vec![("channel", channel.to_string()), ("ts", ts.to_string())];
        self.call_value("conversations.mark", &params).map(|_| ())
    }

    /// Newest-first message history of a conversation
    pub fn history(
        &self,
        channel: &str,
        options: &HistoryOptions,
    ) -> DirectoryResult<Vec<MessageRecord>> {
        let mut params: Params = vec![("channel", channel.to_string())];
        if let Some(limit) = options.limit.filter(|l| *l > 0) {
            params.push(("limit", limit.to_string()));
        }
        if let Some(oldest) = options.oldest {
            params.push(("oldest", oldest.to_string()));
        }
        if let Some(latest) = options.latest {
            params.push(("latest", latest.to_string()));
        }
        let page: wire::MessagesPage = self.call("conversations.history", &params)?;
        if page.has_more {
            tracing::debug!("History of {} truncated at one page", channel);
        }
        Ok(page.messages.into_iter().map(MessageRecord::from).collect())
    }
}

impl Directory for SlackClient {
    fn list_conversations(
        &self,
        filter: &ConversationFilter,
    ) -> DirectoryResult<Vec<ConversationRecord>> {
        let params: Params = vec![
            ("types", conversation_types(filter)),
            ("exclude_archived", (!filter.include_archived).to_string()),
            ("limit", filter.limit.unwrap_or(1000).min(1000).to_string()),
        ];
        let page: wire::ChannelsPage = self.call("conversations.list", &params)?;
        Ok(page.channels.into_iter().map(ConversationRecord::from).collect())
    }

    fn get_conversation_detail(&self, id: &str) -> DirectoryResult<ConversationRecord> {
        let body: wire::ChannelBody =
            self.call("conversations.info", &[("channel", id.to_string())])?;
        Ok(body.channel.into())
    }

    fn lookup_user_by_email(&self, email: &str) -> DirectoryResult<Option<UserRecord>> {
        match self.call::<wire::UserBody>("users.lookupByEmail", &[("email", email.to_string())]) {
            Ok(body) => Ok(Some(body.user.into())),
            Err(DirectoryError::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn list_all_users(&self) -> DirectoryResult<Vec<UserRecord>> {
        let page: wire::UsersPage = self.call("users.list", &[("limit", "1000".to_string())])?;
        Ok(page.members.into_iter().map(UserRecord::from).collect())
    }

    fn get_user(&self, id: &str) -> DirectoryResult<Option<UserRecord>> {
        match self.call::<wire::UserBody>("users.info", &[("user", id.to_string())]) {
            Ok(body) => Ok(Some(body.user.into())),
            Err(DirectoryError::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn get_message(
        &self,
        conversation: &str,
        ts: &Marker,
    ) -> DirectoryResult<Option<MessageRecord>> {
        let history: Params = vec![
            ("channel", conversation.to_string()),
            ("latest", ts.to_string()),
            ("inclusive", "true".to_string()),
            ("limit", "1".to_string()),
        ];
        let page: wire::MessagesPage = self.call("conversations.history", &history)?;
        if let Some(found) = page
            .messages
            .into_iter()
            .map(MessageRecord::from)
            .find(|m| m.ts.same_instant(ts))
        {
            return Ok(Some(found));
        }

        // Thread replies never show up in channel history. The replies page
        // starts at the thread parent, so bound it at `ts` and scan it.
        let replies: Params = vec![
            ("channel", conversation.to_string()),
            ("oldest", ts.to_string()),
            ("inclusive", "true".to_string()),
            ("limit", "1000".to_string()),
        ];
        match self.message_by_ts("conversations.replies", replies, ts) {
            Err(DirectoryError::NotFound(_)) => Ok(None),
            other => other,
        }
    }

    fn get_thread_replies(
        &self,
        conversation: &str,
        ts: &Marker,
    ) -> DirectoryResult<Vec<MessageRecord>> {
        let params: Params = vec![
            ("channel", conversation.to_string()),
            ("ts", ts.to_string()),
            ("limit", "1000".to_string()),
        ];
        let page: wire::MessagesPage = self.call("conversations.replies", &params)?;
        Ok(page.messages.into_iter().map(MessageRecord::from).collect())
    }

    fn open_conversation(&self, participants: &[UserId]) -> DirectoryResult<ConversationRecord> {
        let params: Params = vec![
            ("users", participants.join(",")),
            ("return_im", "true".to_string()),
        ];
        let opened: wire::Opened = self.call("conversations.open", &params)?;
        if opened.already_open {
            tracing::debug!("Conversation {} was already open", opened.channel.id);
        }
        let mut record = ConversationRecord::from(opened.channel);
        // Sparse responses carry only the ID; fill in what we asked for
        if record.participants().is_empty() {
            if participants.len() == 1 {
                record.kind = ConversationKind::Direct;
                record.user = participants.first().cloned();
            } else {
                record.kind = ConversationKind::GroupDirect;
                record.members = participants.to_vec();
            }
        }
        Ok(record)
    }

    fn list_members(&self, conversation: &str) -> DirectoryResult<Vec<UserId>> {
        let params: Params = vec![
            ("channel", conversation.to_string()),
            ("limit", "1000".to_string()),
        ];
        let page: wire::MembersPage = self.call("conversations.members", &params)?;
        Ok(page.members)
    }

    fn whoami(&self) -> DirectoryResult<UserId> {
        let auth: wire::AuthTest = self.call("auth.test", &[])?;
        Ok(auth.user_id)
    }
}

fn envelope_error(method: &str, body: &Value, retry_after: Option<u64>) -> Option<DirectoryError> {
    if body.get("ok").and_then(Value::as_bool) == Some(true) {
        return None;
    }
    let code = body
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("unknown_error");
    Some(DirectoryError::from_api_code(method, code, retry_after))
}

fn posted_message(
    posted: wire::Posted,
    channel: &str,
    fallback_ts: Option<&Marker>,
) -> DirectoryResult<PostedMessage> {
    let ts = posted
        .ts
        .map(Marker::from)
        .or_else(|| fallback_ts.cloned())
        .ok_or_else(|| DirectoryError::Decode("response missing ts".to_string()))?;
    Ok(PostedMessage {
        channel: posted.channel.unwrap_or_else(|| channel.to_string()),
        ts,
    })
}

fn conversation_types(filter: &ConversationFilter) -> String {
    let mut types = Vec::new();
    if filter.includes(ConversationKind::Channel) {
        match filter.visibility {
            ChannelVisibility::Public => types.push("public_channel"),
            ChannelVisibility::Private => types.push("private_channel"),
            ChannelVisibility::All => types.extend(["public_channel", "private_channel"]),
        }
    }
    if filter.includes(ConversationKind::Direct) {
        types.push("im");
    }
    if filter.includes(ConversationKind::GroupDirect) {
        types.push("mpim");
    }
    types.join(",")
}

/// Emoji name without surrounding colons
pub fn emoji_name(emoji: &str) -> &str {
    emoji.trim().trim_matches(':')
}

fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
}

fn retry_delay(base: Duration, attempt: u32, retry_after_secs: Option<u64>) -> Duration {
    if let Some(secs) = retry_after_secs {
        return Duration::from_secs(secs);
    }
    let scale = 2_u32.saturating_pow(attempt.min(6));
    base.saturating_mul(scale)
}

fn truncate(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let mut truncated: String = value.chars().take(max_chars).collect();
    truncated.push_str("...");
    truncated
}
