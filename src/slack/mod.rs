//! Slack Web API access
//!
//! [`SlackClient`] is the real [`Directory`](crate::core::Directory);
//! [`sim::SimDirectory`] is an in-memory workspace used by tests.

mod client;
mod error;
pub mod sim;
mod wire;

pub use client::{emoji_name, HistoryOptions, PostOptions, PostedMessage, SlackClient};
