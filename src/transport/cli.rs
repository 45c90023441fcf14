//! Command-line surface

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), env!("SLKA_VERSION_SUFFIX"));

#[derive(Debug, Parser)]
#[command(name = "slka")]
#[command(author, version = VERSION, about = "Slack CLI for agentic workflows", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Slack token for this invocation (overrides config)
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Pretty-print the JSON envelope
    #[arg(long, global = true, alias = "output-pretty")]
    pub pretty: bool,

    /// Describe writes without executing them
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Channel queries and administration
    #[command(subcommand)]
    Channels(ChannelsCommand),

    /// User directory
    #[command(subcommand)]
    Users(UsersCommand),

    /// Direct and group-direct conversations
    #[command(subcommand)]
    Dm(DmCommand),

    /// Post and edit channel messages
    #[command(subcommand)]
    Message(MessageCommand),

    /// Reactions and acknowledgment
    #[command(subcommand)]
    Reaction(ReactionCommand),

    /// Conversations that need attention
    #[command(subcommand)]
    Unread(UnreadCommand),

    /// Show and edit configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// Only messages after this time (unix seconds, RFC 3339 or YYYY-MM-DD)
    #[arg(long)]
    pub since: Option<String>,

    /// Only messages before this time
    #[arg(long)]
    pub until: Option<String>,

    /// Maximum number of messages
    #[arg(long, default_value = "100")]
    pub limit: usize,
}

#[derive(Debug, Args)]
pub struct UnfurlArgs {
    /// Show link previews
    #[arg(long)]
    pub unfurl_links: bool,

    /// Show media previews
    #[arg(long)]
    pub unfurl_media: bool,
}

#[derive(Debug, Subcommand)]
pub enum ChannelsCommand {
    /// List channels, most recently active first
    List {
        /// public, private or all
        #[arg(long = "type", default_value = "all")]
        visibility: String,

        #[arg(long)]
        include_archived: bool,

        /// Case-insensitive name substring
        #[arg(long)]
        filter: Option<String>,

        /// Maximum number of channels (0 = unlimited)
        #[arg(long, default_value = "0")]
        limit: usize,
    },
    /// Channel details
    Info { channel: String },
    /// Message history
    History {
        channel: String,
        #[command(flatten)]
        window: HistoryArgs,
    },
    /// Member IDs
    Members {
        channel: String,
        #[arg(long, default_value = "0")]
        limit: usize,
    },
    /// Create a channel
    Create {
        name: String,
        #[arg(long)]
        private: bool,
        /// Topic to set after creation
        #[arg(long)]
        topic: Option<String>,
        /// Purpose to set after creation
        #[arg(long)]
        description: Option<String>,
    },
    Archive { channel: String },
    Unarchive { channel: String },
    Rename { channel: String, new_name: String },
    SetTopic { channel: String, topic: String },
    #[command(alias = "set-description")]
    SetPurpose { channel: String, purpose: String },
    /// Invite users (comma-separated IDs, emails or names)
    Invite { channel: String, users: String },
    /// Remove users (comma-separated IDs, emails or names)
    Kick { channel: String, users: String },
    /// Move the read marker to a message
    MarkRead { channel: String, timestamp: String },
}

#[derive(Debug, Subcommand)]
pub enum UsersCommand {
    /// List users, most recently updated first
    List {
        #[arg(long)]
        include_bots: bool,
        #[arg(long)]
        include_deleted: bool,
        #[arg(long, default_value = "0")]
        limit: usize,
    },
    /// Find one user by ID, email or name
    Lookup {
        query: String,
        /// auto, email or name
        #[arg(long, default_value = "auto")]
        by: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum DmCommand {
    /// List direct conversations
    List {
        /// Only conversations including these users (comma-separated)
        #[arg(long)]
        filter: Option<String>,
        #[arg(long, default_value = "0")]
        limit: usize,
    },
    /// History of the conversation with exactly these users
    History {
        users: String,
        #[command(flatten)]
        window: HistoryArgs,
    },
    /// Send to the conversation with exactly these users
    Send {
        users: String,
        text: String,
        #[command(flatten)]
        unfurl: UnfurlArgs,
    },
    /// Reply in a thread of the conversation with these users
    Reply {
        users: String,
        timestamp: String,
        text: String,
        #[command(flatten)]
        unfurl: UnfurlArgs,
    },
}

impl DmCommand {
    pub fn is_write(&self) -> bool {
        matches!(self, Self::Send { .. } | Self::Reply { .. })
    }
}

#[derive(Debug, Subcommand)]
pub enum MessageCommand {
    Send {
        channel: String,
        text: String,
        #[arg(long, default_value = "true", action = clap::ArgAction::Set)]
        unfurl_links: bool,
        #[arg(long, default_value = "true", action = clap::ArgAction::Set)]
        unfurl_media: bool,
    },
    Reply {
        channel: String,
        thread_ts: String,
        text: String,
        /// Also post the reply to the channel
        #[arg(long)]
        broadcast: bool,
    },
    Edit {
        channel: String,
        timestamp: String,
        text: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum ReactionCommand {
    /// Every reaction on a message
    List { channel: String, timestamp: String },
    /// Whether anyone other than the author reacted or replied
    CheckAcknowledged { channel: String, timestamp: String },
    Add {
        channel: String,
        timestamp: String,
        emoji: String,
    },
    Remove {
        channel: String,
        timestamp: String,
        emoji: String,
    },
}

impl ReactionCommand {
    pub fn is_write(&self) -> bool {
        matches!(self, Self::Add { .. } | Self::Remove { .. })
    }
}

#[derive(Debug, Subcommand)]
pub enum UnreadCommand {
    /// Conversations with unread messages, most urgent first
    List {
        #[arg(long, conflicts_with = "dms_only")]
        channels_only: bool,
        #[arg(long)]
        dms_only: bool,
        /// Minimum unread count (0 = any)
        #[arg(long, default_value = "0")]
        min_unread: u32,
        /// count or oldest
        #[arg(long, default_value = "count")]
        order_by: String,
        #[arg(long, default_value = "0")]
        limit: usize,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Current settings with tokens masked
    Show,
    /// Set one key
    Set { key: String, value: String },
    /// Prompt for tokens and write the config file
    Init,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "slka", "unread", "list", "--dms-only", "--pretty", "--token", "xoxp-1",
        ])
        .unwrap();
        assert!(cli.pretty);
        assert_eq!(cli.token.as_deref(), Some("xoxp-1"));
        match cli.command {
            Commands::Unread(UnreadCommand::List { dms_only, .. }) => assert!(dms_only),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_channel_filters_conflict() {
        let err = Cli::try_parse_from(["slka", "unread", "list", "--channels-only", "--dms-only"]);
        assert!(err.is_err());
    }

    #[test]
    fn test_message_send_unfurl_defaults() {
        let cli = Cli::try_parse_from(["slka", "message", "send", "C1", "hi"]).unwrap();
        match cli.command {
            Commands::Message(MessageCommand::Send {
                unfurl_links,
                unfurl_media,
                ..
            }) => assert!(unfurl_links && unfurl_media),
            other => panic!("unexpected command {:?}", other),
        }
    }
}
