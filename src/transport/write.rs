//! Write commands
//!
//! Each command resolves its targets first, so the action shown for approval
//! names concrete IDs, then hands the action to [`Session::execute`].

use serde_json::json;

use super::cli::{ChannelsCommand, DmCommand, MessageCommand, ReactionCommand, UnfurlArgs};
use super::output::{Failure, Outcome};
use super::read::caller_for;
use super::Session;
use crate::approval::WriteAction;
use crate::config::Surface;
use crate::core::{ChannelResolver, ConversationMatcher, IdentityResolver, Marker};
use crate::links;
use crate::slack::{emoji_name, PostOptions, SlackClient};

pub(super) fn message(session: &mut Session, cmd: MessageCommand) -> Result<Outcome, Failure> {
    let client = session.client(Surface::Write)?;
    let channels = ChannelResolver::new(&client);

    match cmd {
        MessageCommand::Send {
            channel,
            text,
            unfurl_links,
            unfurl_media,
        } => {
            let channel = channels.resolve(&channel)?;
            let text = links::to_slack(&text);
            let options = PostOptions {
                unfurl_links,
                unfurl_media,
                ..Default::default()
            };
            let action = WriteAction::SendMessage {
                channel: channel.clone(),
                text: text.clone(),
                thread_ts: None,
                broadcast: false,
            };
            session.execute(action, |_| post(&client, &channel, &text, &options))
        }
        MessageCommand::Reply {
            channel,
            thread_ts,
            text,
            broadcast,
        } => {
            let channel = channels.resolve(&channel)?;
            let text = links::to_slack(&text);
            let options = PostOptions {
                thread_ts: Some(Marker::from(thread_ts.as_str())),
                broadcast,
                ..Default::default()
            };
            let action = WriteAction::SendMessage {
                channel: channel.clone(),
                text: text.clone(),
                thread_ts: Some(thread_ts),
                broadcast,
            };
            session.execute(action, |_| post(&client, &channel, &text, &options))
        }
        MessageCommand::Edit {
            channel,
            timestamp,
            text,
        } => {
            let channel = channels.resolve(&channel)?;
            let text = links::to_slack(&text);
            let action = WriteAction::EditMessage {
                channel: channel.clone(),
                ts: timestamp.clone(),
                text: text.clone(),
            };
            session.execute(action, |_| {
                let updated = client.update_message(&channel, &Marker::from(timestamp), &text)?;
                Outcome::success(json!({
                    "channel": updated.channel,
                    "timestamp": updated.ts,
                    "text": text,
                }))
            })
        }
    }
}

pub(super) fn dm(session: &mut Session, cmd: DmCommand) -> Result<Outcome, Failure> {
    let client = session.client(Surface::Write)?;
    let (users, timestamp, text, unfurl) = match cmd {
        DmCommand::Send {
            users,
            text,
            unfurl,
        } => (users, None, text, unfurl),
        DmCommand::Reply {
            users,
            timestamp,
            text,
            unfurl,
        } => (users, Some(timestamp), text, unfurl),
        other => {
            return Err(Failure::invalid(
                "unsupported_command",
                format!("{:?} is not a write command", other),
            ))
        }
    };

    let participants = IdentityResolver::new(&client).resolve_many(&users)?;
    let text = links::to_slack(&text);
    let options = post_options(&unfurl, timestamp.as_deref());
    let action = WriteAction::SendDm {
        users: participants.clone(),
        text: text.clone(),
        thread_ts: timestamp,
    };

    session.execute(action, |_| {
        let matcher =
            ConversationMatcher::new(&client).with_caller(caller_for(&client, &participants));
        let outcome = matcher.open_or_create(&participants)?;
        let posted = client.post_message(&outcome.handle().id, &text, &options)?;
        Outcome::success(json!({
            "channel": posted.channel,
            "timestamp": posted.ts,
            "users": participants,
            "conversation": if outcome.was_created() { "created" } else { "existing" },
            "text": text,
        }))
    })
}

pub(super) fn reaction(session: &mut Session, cmd: ReactionCommand) -> Result<Outcome, Failure> {
    let client = session.client(Surface::Write)?;
    let channels = ChannelResolver::new(&client);

    let (adding, channel, timestamp, emoji) = match cmd {
        ReactionCommand::Add {
            channel,
            timestamp,
            emoji,
        } => (true, channel, timestamp, emoji),
        ReactionCommand::Remove {
            channel,
            timestamp,
            emoji,
        } => (false, channel, timestamp, emoji),
        other => {
            return Err(Failure::invalid(
                "unsupported_command",
                format!("{:?} is not a write command", other),
            ))
        }
    };

    let channel = channels.resolve(&channel)?;
    let emoji = emoji_name(&emoji).to_string();
    let action = if adding {
        WriteAction::AddReaction {
            channel: channel.clone(),
            ts: timestamp.clone(),
            emoji: emoji.clone(),
        }
    } else {
        WriteAction::RemoveReaction {
            channel: channel.clone(),
            ts: timestamp.clone(),
            emoji: emoji.clone(),
        }
    };

    session.execute(action, |_| {
        let ts = Marker::from(timestamp.as_str());
        if adding {
            client.add_reaction(&channel, &ts, &emoji)?;
        } else {
            client.remove_reaction(&channel, &ts, &emoji)?;
        }
        Outcome::success(json!({ "channel": channel, "timestamp": ts, "emoji": emoji }))
    })
}

pub(super) fn channels(session: &mut Session, cmd: ChannelsCommand) -> Result<Outcome, Failure> {
    let client = session.client(Surface::Write)?;
    let channels = ChannelResolver::new(&client);

    match cmd {
        ChannelsCommand::Create {
            name,
            private,
            topic,
            description,
        } => {
            let name = name.trim().trim_start_matches('#').to_string();
            if name.is_empty() {
                return Err(Failure::invalid("invalid_name", "Channel name is empty"));
            }
            let topic = topic.filter(|t| !t.is_empty());
            let purpose = description.filter(|d| !d.is_empty());
            let action = WriteAction::CreateChannel {
                name: name.clone(),
                private,
                topic: topic.clone(),
                purpose: purpose.clone(),
            };
            session.execute(action, |_| {
                let mut created = client.create_channel(&name, private)?;
                if let Some(topic) = topic {
                    client.set_topic(&created.id, &topic)?;
                    created.topic = Some(topic);
                }
                if let Some(purpose) = purpose {
                    client.set_purpose(&created.id, &purpose)?;
                    created.purpose = Some(purpose);
                }
                Outcome::success(created)
            })
        }
        ChannelsCommand::Archive { channel } => {
            let channel = channels.resolve(&channel)?;
            let action = WriteAction::ArchiveChannel {
                channel: channel.clone(),
            };
            session.execute(action, |_| {
                client.archive_channel(&channel)?;
                Outcome::success(json!({ "channel": channel, "archived": true }))
            })
        }
        ChannelsCommand::Unarchive { channel } => {
            let channel = channels.resolve(&channel)?;
            let action = WriteAction::UnarchiveChannel {
                channel: channel.clone(),
            };
            session.execute(action, |_| {
                client.unarchive_channel(&channel)?;
                Outcome::success(json!({ "channel": channel, "archived": false }))
            })
        }
        ChannelsCommand::Rename { channel, new_name } => {
            let channel = channels.resolve(&channel)?;
            let new_name = new_name.trim().trim_start_matches('#').to_string();
            let action = WriteAction::RenameChannel {
                channel: channel.clone(),
                new_name: new_name.clone(),
            };
            session.execute(action, |_| {
                Outcome::success(client.rename_channel(&channel, &new_name)?)
            })
        }
        ChannelsCommand::SetTopic { channel, topic } => {
            let channel = channels.resolve(&channel)?;
            let action = WriteAction::SetTopic {
                channel: channel.clone(),
                topic: topic.clone(),
            };
            session.execute(action, |_| {
                client.set_topic(&channel, &topic)?;
                Outcome::success(json!({ "channel": channel, "topic": topic }))
            })
        }
        ChannelsCommand::SetPurpose { channel, purpose } => {
            let channel = channels.resolve(&channel)?;
            let action = WriteAction::SetPurpose {
                channel: channel.clone(),
                purpose: purpose.clone(),
            };
            session.execute(action, |_| {
                client.set_purpose(&channel, &purpose)?;
                Outcome::success(json!({ "channel": channel, "purpose": purpose }))
            })
        }
        ChannelsCommand::Invite { channel, users } => {
            let channel = channels.resolve(&channel)?;
            let users = IdentityResolver::new(&client).resolve_many(&users)?;
            let action = WriteAction::InviteUsers {
                channel: channel.clone(),
                users: users.clone(),
            };
            session.execute(action, |_| {
                client.invite(&channel, &users)?;
                Outcome::success(json!({ "channel": channel, "invited": users }))
            })
        }
        ChannelsCommand::Kick { channel, users } => {
            let channel = channels.resolve(&channel)?;
            let users = IdentityResolver::new(&client).resolve_many(&users)?;
            let action = WriteAction::KickUsers {
                channel: channel.clone(),
                users: users.clone(),
            };
            session.execute(action, |_| {
                for user in &users {
                    client.kick(&channel, user)?;
                }
                Outcome::success(json!({ "channel": channel, "removed": users }))
            })
        }
        ChannelsCommand::MarkRead { channel, timestamp } => {
            let channel = channels.resolve(&channel)?;
            let action = WriteAction::MarkRead {
                channel: channel.clone(),
                ts: timestamp.clone(),
            };
            session.execute(action, |_| {
                let ts = Marker::from(timestamp.as_str());
                client.mark_read(&channel, &ts)?;
                Outcome::success(json!({ "channel": channel, "last_read": ts }))
            })
        }
        other => Err(Failure::invalid(
            "unsupported_command",
            format!("{:?} is not a write command", other),
        )),
    }
}

fn post(
    client: &SlackClient,
    channel: &str,
    text: &str,
    options: &PostOptions,
) -> Result<Outcome, Failure> {
    let posted = client.post_message(channel, text, options)?;
    Outcome::success(json!({
        "channel": posted.channel,
        "timestamp": posted.ts,
        "text": text,
    }))
}

fn post_options(unfurl: &UnfurlArgs, thread_ts: Option<&str>) -> PostOptions {
    PostOptions {
        thread_ts: thread_ts.map(Marker::from),
        broadcast: false,
        unfurl_links: unfurl.unfurl_links,
        unfurl_media: unfurl.unfurl_media,
    }
}
