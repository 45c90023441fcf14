//! Command dispatch: one envelope on stdout per invocation
//!
//! Read commands authenticate with the read token, write commands with the
//! write token; `--token` overrides either. Writes pass through the dry-run
//! check and then the approval gate before anything is sent.

pub mod cli;
mod config_cmd;
pub mod output;
mod read;
mod time;
mod write;

pub use cli::{Cli, Commands, VERSION};
pub use output::{Envelope, Failure, Outcome};
pub use time::parse_timestamp;

use crate::approval::{ApprovalStatus, Approver, WriteAction};
use crate::config::{Config, Surface};
use crate::core::FailureKind;
use crate::slack::SlackClient;
use cli::ChannelsCommand;

/// Everything a command needs besides its own arguments
pub struct Session {
    pub config: Config,
    pub config_path: Option<std::path::PathBuf>,
    token_override: Option<String>,
    dry_run: bool,
    approver: Approver,
}

impl Session {
    pub fn new(config: Config, cli: &Cli, approver: Approver) -> Self {
        Self {
            config,
            config_path: cli.config.clone(),
            token_override: cli.token.clone().filter(|t| !t.trim().is_empty()),
            dry_run: cli.dry_run,
            approver,
        }
    }

    /// Client authenticated for `surface`
    pub fn client(&self, surface: Surface) -> Result<SlackClient, Failure> {
        let token = self
            .token_override
            .as_deref()
            .or_else(|| self.config.token_for(surface))
            .ok_or_else(|| {
                let which = match surface {
                    Surface::Read => "read",
                    Surface::Write => "write",
                };
                Failure::new(
                    FailureKind::Auth,
                    "missing_token",
                    format!("No {} token configured", which),
                )
            })?;
        Ok(SlackClient::new(token, &self.config.api)?)
    }

    /// Dry-run and approval gate around a write
    pub fn execute<F>(&mut self, action: WriteAction, perform: F) -> Result<Outcome, Failure>
    where
        F: FnOnce(&WriteAction) -> Result<Outcome, Failure>,
    {
        if self.dry_run {
            tracing::debug!("Dry run for {}", action.name());
            return Ok(Outcome::DryRun(action));
        }
        match self.approver.require(&action)? {
            ApprovalStatus::Approved => {
                tracing::debug!("Executing {}", action.name());
                perform(&action)
            }
            status => {
                tracing::info!("{} not approved ({:?})", action.name(), status);
                Ok(Outcome::ApprovalRequired(action))
            }
        }
    }
}

/// Run one parsed command and return its envelope and exit code
pub fn run(cli: Cli) -> (Envelope, i32) {
    let result = load_config(&cli).and_then(|config| {
        let approver = Approver::from_terminal(config.require_approval);
        let mut session = Session::new(config, &cli, approver);
        dispatch(&mut session, cli.command)
    });
    output::render(result)
}

fn load_config(cli: &Cli) -> Result<Config, Failure> {
    Config::load(cli.config.as_deref()).map_err(|e| {
        Failure::new(FailureKind::General, "config_error", format!("{:#}", e))
            .with_suggestion("Fix the config file or run 'slka config init'")
    })
}

pub fn dispatch(session: &mut Session, command: Commands) -> Result<Outcome, Failure> {
    match command {
        Commands::Channels(
            cmd @ (ChannelsCommand::List { .. }
            | ChannelsCommand::Info { .. }
            | ChannelsCommand::History { .. }
            | ChannelsCommand::Members { .. }),
        ) => read::channels(session, cmd),
        Commands::Channels(cmd) => write::channels(session, cmd),
        Commands::Users(cmd) => read::users(session, cmd),
        Commands::Dm(cmd) => {
            if cmd.is_write() {
                write::dm(session, cmd)
            } else {
                read::dm(session, cmd)
            }
        }
        Commands::Message(cmd) => write::message(session, cmd),
        Commands::Reaction(cmd) => {
            if cmd.is_write() {
                write::reaction(session, cmd)
            } else {
                read::reaction(session, cmd)
            }
        }
        Commands::Unread(cmd) => read::unread(session, cmd),
        Commands::Config(cmd) => config_cmd::run(session, cmd),
    }
}
