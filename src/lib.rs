//! slka: Slack CLI for agentic workflows
//!
//! This library provides:
//! - Identity resolution from IDs, emails and names
//! - Direct-conversation matching by participant set
//! - Acknowledgment tracking from reactions and thread replies
//! - Unread aggregation across channels and direct messages
//! - A Slack Web API client with retry, and an in-memory directory for tests
//! - Approval-gated write commands with one JSON envelope per invocation

pub mod approval;
pub mod config;
pub mod core;
pub mod links;
pub mod slack;
pub mod transport;

pub use config::Config;
pub use core::{CoreError, Directory, DirectoryError};
pub use slack::SlackClient;
