//! Engagement tracking
//!
//! A message counts as acknowledged once someone other than its author
//! reacted to it or replied in its thread. The author's own reactions and
//! replies never count, even when they are the only activity.

use serde::Serialize;

use super::errors::CoreError;
use super::traits::Directory;
use super::types::{EngagementRecord, Marker, MessageRecord, Reaction, UserId};
use super::Result;

/// Every reaction on a message, with the message text for context
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReactionSummary {
    pub channel: String,
    pub timestamp: Marker,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub message_text: String,
    pub reactions: Vec<Reaction>,
    pub total_reaction_count: u32,
}

pub struct EngagementTracker<'a, D: Directory + ?Sized> {
    directory: &'a D,
}

impl<'a, D: Directory + ?Sized> EngagementTracker<'a, D> {
    pub fn new(directory: &'a D) -> Self {
        Self { directory }
    }

    /// Classify the acknowledgment state of the message at `ts`
    pub fn check_acknowledgment(
        &self,
        conversation: &str,
        ts: &Marker,
    ) -> Result<EngagementRecord> {
        let message = self.fetch(conversation, ts)?;
        let author = message.user.clone();

        let reacted_users = distinct_others(
            message.reactions.iter().flat_map(|r| r.users.iter()),
            author.as_ref(),
        );

        // No thread means nothing to fetch
        let (reply_count, replied_users) = if message.reply_count == 0 {
            (0, Vec::new())
        } else {
            let thread = self.directory.get_thread_replies(conversation, ts)?;
            let replies: Vec<&MessageRecord> = thread
                .iter()
                .skip(1)
                .filter(|reply| reply.user != author)
                .collect();
            let repliers = distinct_others(
                replies.iter().copied().filter_map(|reply| reply.user.as_ref()),
                author.as_ref(),
            );
            (replies.len(), repliers)
        };

        let reaction_count = reacted_users.len();
        Ok(EngagementRecord {
            timestamp: message.ts.clone(),
            message_author: author,
            reaction_count,
            reacted_users,
            reply_count,
            replied_users,
            has_reactions: !message.reactions.is_empty(),
            has_replies: message.reply_count > 0,
            is_acknowledged: reaction_count > 0 || reply_count > 0,
        })
    }

    /// All reactions on the message at `ts`, author's included
    pub fn list_reactions(&self, conversation: &str, ts: &Marker) -> Result<ReactionSummary> {
        let message = self.fetch(conversation, ts)?;
        let total_reaction_count = message.reactions.iter().map(|r| r.count).sum();
        Ok(ReactionSummary {
            channel: conversation.to_string(),
            timestamp: message.ts,
            message_text: message.text,
            reactions: message.reactions,
            total_reaction_count,
        })
    }

    fn fetch(&self, conversation: &str, ts: &Marker) -> Result<MessageRecord> {
        self.directory
            .get_message(conversation, ts)?
            .ok_or_else(|| CoreError::MessageNotFound {
                conversation: conversation.to_string(),
                timestamp: ts.to_string(),
            })
    }
}

/// Distinct IDs other than `author`, in first-seen order
fn distinct_others<'u>(
    ids: impl Iterator<Item = &'u UserId>,
    author: Option<&UserId>,
) -> Vec<UserId> {
    let mut seen: Vec<UserId> = Vec::new();
    for id in ids {
        if Some(id) != author && !seen.contains(id) {
            seen.push(id.clone());
        }
    }
    seen
}
