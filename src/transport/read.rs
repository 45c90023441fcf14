//! Read commands

use serde::Serialize;
use serde_json::json;

use super::cli::{
    ChannelsCommand, DmCommand, HistoryArgs, ReactionCommand, UnreadCommand, UsersCommand,
};
use super::output::{Failure, Outcome};
use super::time::parse_bound;
use super::Session;
use crate::config::Surface;
use crate::core::{
    ChannelListOptions, ChannelResolver, ChannelVisibility, ConversationMatcher, Directory,
    EngagementTracker, FailureKind, IdentityResolver, LookupField, Marker, MessageRecord, OrderBy,
    Reaction, UnreadAggregator, UnreadOptions, UserListOptions,
};
use crate::links::{self, Link};
use crate::slack::{HistoryOptions, SlackClient};

/// A history message with the links found in its text
#[derive(Debug, Serialize)]
struct HistoryMessage {
    ts: Marker,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<String>,
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    thread_ts: Option<Marker>,
    #[serde(skip_serializing_if = "is_zero")]
    reply_count: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    reactions: Vec<Reaction>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    links: Vec<Link>,
}

fn is_zero(n: &u32) -> bool {
    *n == 0
}

impl From<MessageRecord> for HistoryMessage {
    fn from(message: MessageRecord) -> Self {
        Self {
            links: links::extract(&message.text),
            ts: message.ts,
            user: message.user,
            text: message.text,
            thread_ts: message.thread_ts,
            reply_count: message.reply_count,
            reactions: message.reactions,
        }
    }
}

pub(super) fn channels(session: &Session, cmd: ChannelsCommand) -> Result<Outcome, Failure> {
    let client = session.client(Surface::Read)?;
    let resolver = ChannelResolver::new(&client);

    match cmd {
        ChannelsCommand::List {
            visibility,
            include_archived,
            filter,
            limit,
        } => {
            let filter = filter.map(|f| f.to_lowercase()).filter(|f| !f.is_empty());
            let options = ChannelListOptions {
                visibility: parse_visibility(&visibility)?,
                include_archived,
                // Limit after name filtering
                limit: if filter.is_some() { None } else { Some(limit) },
            };
            let mut channels = resolver.list(&options)?;
            if let Some(filter) = filter {
                channels.retain(|channel| {
                    channel
                        .name
                        .as_deref()
                        .is_some_and(|name| name.to_lowercase().contains(&filter))
                });
                if limit > 0 {
                    channels.truncate(limit);
                }
            }
            Outcome::success(json!({ "channels": channels, "total_count": channels.len() }))
        }
        ChannelsCommand::Info { channel } => Outcome::success(resolver.info(&channel)?),
        ChannelsCommand::History { channel, window } => {
            let channel_id = resolver.resolve(&channel)?;
            let messages = history(&client, &channel_id, &window)?;
            Outcome::success(json!({ "channel_id": channel_id, "messages": messages }))
        }
        ChannelsCommand::Members { channel, limit } => {
            let channel_id = resolver.resolve(&channel)?;
            let mut members = resolver.members(&channel_id)?;
            if limit > 0 {
                members.truncate(limit);
            }
            Outcome::success(json!({ "channel_id": channel_id, "members": members }))
        }
        other => Err(Failure::invalid(
            "unsupported_command",
            format!("{:?} is not a read command", other),
        )),
    }
}

pub(super) fn users(session: &Session, cmd: UsersCommand) -> Result<Outcome, Failure> {
    let client = session.client(Surface::Read)?;
    let resolver = IdentityResolver::new(&client);

    match cmd {
        UsersCommand::List {
            include_bots,
            include_deleted,
            limit,
        } => {
            let users = resolver.list_users(&UserListOptions {
                include_bots,
                include_deleted,
                limit: Some(limit),
            })?;
            Outcome::success(json!({ "users": users, "total_count": users.len() }))
        }
        UsersCommand::Lookup { query, by } => {
            let field: LookupField = by
                .parse()
                .map_err(|e: String| Failure::invalid("invalid_lookup_field", e))?;
            Outcome::success(resolver.lookup(query.trim(), field)?)
        }
    }
}

pub(super) fn dm(session: &Session, cmd: DmCommand) -> Result<Outcome, Failure> {
    let client = session.client(Surface::Read)?;
    let resolver = IdentityResolver::new(&client);

    match cmd {
        DmCommand::List { filter, limit } => {
            let with = match filter.as_deref().map(str::trim).filter(|f| !f.is_empty()) {
                Some(filter) => Some(resolver.resolve_many(filter)?),
                None => None,
            };
            let conversations =
                ConversationMatcher::new(&client).list_direct(with.as_deref(), Some(limit))?;
            Outcome::success(json!({
                "conversations": conversations,
                "total_count": conversations.len(),
            }))
        }
        DmCommand::History { users, window } => {
            let participants = resolver.resolve_many(&users)?;
            let matcher =
                ConversationMatcher::new(&client).with_caller(caller_for(&client, &participants));
            let handle = matcher.find_existing(&participants)?.ok_or_else(|| {
                Failure::new(
                    FailureKind::NotFound,
                    "conversation_not_found",
                    format!("No direct conversation with {}", participants.join(", ")),
                )
            })?;
            let messages = history(&client, &handle.id, &window)?;
            Outcome::success(json!({
                "channel_id": handle.id,
                "participants": handle.participants,
                "messages": messages,
            }))
        }
        other => Err(Failure::invalid(
            "unsupported_command",
            format!("{:?} is not a read command", other),
        )),
    }
}

pub(super) fn reaction(session: &Session, cmd: ReactionCommand) -> Result<Outcome, Failure> {
    let client = session.client(Surface::Read)?;
    let channels = ChannelResolver::new(&client);
    let tracker = EngagementTracker::new(&client);

    match cmd {
        ReactionCommand::List { channel, timestamp } => {
            let channel_id = channels.resolve(&channel)?;
            Outcome::success(tracker.list_reactions(&channel_id, &Marker::from(timestamp))?)
        }
        ReactionCommand::CheckAcknowledged { channel, timestamp } => {
            let channel_id = channels.resolve(&channel)?;
            let record = tracker.check_acknowledgment(&channel_id, &Marker::from(timestamp))?;
            Outcome::success(record)
        }
        other => Err(Failure::invalid(
            "unsupported_command",
            format!("{:?} is not a read command", other),
        )),
    }
}

pub(super) fn unread(session: &Session, cmd: UnreadCommand) -> Result<Outcome, Failure> {
    let UnreadCommand::List {
        channels_only,
        dms_only,
        min_unread,
        order_by,
        limit,
    } = cmd;

    let order_by: OrderBy = order_by.parse().map_err(|e: String| {
        Failure::invalid("invalid_order_by", e)
            .with_suggestion("Use --order-by count or --order-by oldest")
    })?;
    if channels_only && dms_only {
        return Err(Failure::invalid(
            "invalid_filter",
            "--channels-only and --dms-only are mutually exclusive",
        ));
    }

    let client = session.client(Surface::Read)?;
    let entries = UnreadAggregator::new(&client).list(&UnreadOptions {
        channels_only,
        dms_only,
        min_unread,
        order_by,
        limit: Some(limit).filter(|l| *l > 0),
    })?;
    Outcome::success(json!({
        "unread_conversations": entries,
        "total_count": entries.len(),
    }))
}

/// The caller's own ID, needed only to match group conversations
///
/// `auth.test` failures are soft; matching then compares the raw sets.
pub(super) fn caller_for(client: &SlackClient, participants: &[String]) -> Option<String> {
    if participants.len() < 2 {
        return None;
    }
    match client.whoami() {
        Ok(id) => Some(id),
        Err(err) => {
            tracing::debug!("auth.test failed, matching without caller: {}", err);
            None
        }
    }
}

fn history(
    client: &SlackClient,
    conversation: &str,
    window: &HistoryArgs,
) -> Result<Vec<HistoryMessage>, Failure> {
    let options = HistoryOptions {
        limit: Some(window.limit),
        oldest: parse_bound(window.since.as_deref())?,
        latest: parse_bound(window.until.as_deref())?,
    };
    let messages = client.history(conversation, &options)?;
    Ok(messages.into_iter().map(HistoryMessage::from).collect())
}

fn parse_visibility(value: &str) -> Result<ChannelVisibility, Failure> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "all" => Ok(ChannelVisibility::All),
        "public" => Ok(ChannelVisibility::Public),
        "private" => Ok(ChannelVisibility::Private),
        other => Err(Failure::invalid(
            "invalid_type",
            format!("type must be public, private or all, got '{}'", other),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_message_links() {
        let message = HistoryMessage::from(MessageRecord {
            ts: Marker::from("1.000001"),
            user: Some("U1".into()),
            text: "see <https://a.io|docs>".into(),
            ..Default::default()
        });
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["links"][0]["url"], "https://a.io");
        assert_eq!(value["links"][0]["text"], "docs");
        assert!(value.get("reactions").is_none());
        assert!(value.get("reply_count").is_none());
    }

    #[test]
    fn test_parse_visibility() {
        assert_eq!(parse_visibility("PUBLIC").unwrap(), ChannelVisibility::Public);
        assert_eq!(parse_visibility("all").unwrap(), ChannelVisibility::All);
        assert_eq!(parse_visibility("secret").unwrap_err().code, "invalid_type");
    }
}
