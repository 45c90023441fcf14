//! Unread aggregation
//!
//! Single pass over every open conversation: gather unread counts, filter,
//! rank, truncate, and only then resolve participant names for what is left.
//! Direct conversations always rank ahead of channels.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::errors::{CoreError, FailureKind};
use super::identity::resolve_names;
use super::participants::ParticipantSet;
use super::traits::Directory;
use super::types::{ConversationFilter, ConversationKind, ConversationRecord, UnreadEntry};
use super::Result;

/// Upper bound on the single conversation listing
pub const LISTING_LIMIT: usize = 1000;

/// Secondary ordering within a kind class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderBy {
    /// Most unread first
    #[default]
    Count,
    /// Longest-neglected (smallest last-read marker) first
    Oldest,
}

impl FromStr for OrderBy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "" | "count" => Ok(Self::Count),
            "oldest" => Ok(Self::Oldest),
            other => Err(format!(
                "invalid order '{}': expected 'count' or 'oldest'",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UnreadOptions {
    pub channels_only: bool,
    pub dms_only: bool,
    /// Ignored when zero
    pub min_unread: u32,
    pub order_by: OrderBy,
    pub limit: Option<usize>,
}

impl UnreadOptions {
    fn admits(&self, kind: ConversationKind) -> bool {
        if self.channels_only && kind.is_direct() {
            return false;
        }
        if self.dms_only && !kind.is_direct() {
            return false;
        }
        true
    }
}

pub struct UnreadAggregator<'a, D: Directory + ?Sized> {
    directory: &'a D,
}

impl<'a, D: Directory + ?Sized> UnreadAggregator<'a, D> {
    pub fn new(directory: &'a D) -> Self {
        Self { directory }
    }

    /// Ranked conversations with unread messages
    pub fn list(&self, options: &UnreadOptions) -> Result<Vec<UnreadEntry>> {
        let filter = ConversationFilter::all().with_limit(Some(LISTING_LIMIT));
        let conversations = self.directory.list_conversations(&filter)?;

        let mut entries = Vec::new();
        for listed in &conversations {
            let Some(record) = self.with_unread_data(listed)? else {
                continue;
            };
            let count = record.effective_unread().unwrap_or(0);
            if count == 0 {
                continue;
            }
            if options.min_unread > 0 && count < options.min_unread {
                continue;
            }
            if !options.admits(record.kind) {
                continue;
            }
            entries.push(UnreadEntry::from_record(&record, count));
        }

        rank(&mut entries, options.order_by);
        if let Some(limit) = options.limit.filter(|l| *l > 0) {
            entries.truncate(limit);
        }

        self.enrich(&mut entries);
        Ok(entries)
    }

    /// The listed record if it already carries unread data, otherwise the
    /// detail record. `None` when the detail fetch fails for this
    /// conversation alone.
    fn with_unread_data(&self, listed: &ConversationRecord) -> Result<Option<ConversationRecord>> {
        if listed.has_unread_data() {
            return Ok(Some(listed.clone()));
        }
        match self.directory.get_conversation_detail(&listed.id) {
            Ok(mut detail) => {
                if detail.members.is_empty() {
                    detail.members = listed.members.clone();
                }
                Ok(Some(detail))
            }
            // Credential and rate-limit failures would hit every conversation
            Err(err)
                if matches!(
                    err.failure_kind(),
                    FailureKind::Auth | FailureKind::RateLimited
                ) =>
            {
                Err(CoreError::from(err))
            }
            Err(err) => {
                tracing::debug!("Skipping {}: detail fetch failed: {}", listed.id, err);
                Ok(None)
            }
        }
    }

    /// Complete group memberships, then fill participant names for the
    /// surviving direct entries
    fn enrich(&self, entries: &mut [UnreadEntry]) {
        self.complete_groups(entries);

        let names = resolve_names(
            self.directory,
            entries
                .iter()
                .filter(|entry| entry.kind.is_direct())
                .flat_map(|entry| entry.participants.iter()),
        );

        for entry in entries.iter_mut().filter(|entry| entry.kind.is_direct()) {
            entry.participant_names = entry
                .participants
                .iter()
                .map(|id| names.get(id).map(|user| user.name.clone()).unwrap_or_default())
                .collect();
            let resolved: Vec<&str> = entry
                .participant_names
                .iter()
                .map(String::as_str)
                .filter(|name| !name.is_empty())
                .collect();
            entry.display_name = if resolved.is_empty() {
                None
            } else {
                Some(resolved.join(", "))
            };
        }
    }

    /// Group entries listed without members get them from the directory, and
    /// the caller's own ID is dropped while at least two others remain
    fn complete_groups(&self, entries: &mut [UnreadEntry]) {
        let mut groups: Vec<&mut UnreadEntry> = entries
            .iter_mut()
            .filter(|entry| entry.kind == ConversationKind::GroupDirect)
            .collect();
        if groups.is_empty() {
            return;
        }

        for entry in groups.iter_mut().filter(|entry| entry.participants.is_empty()) {
            match self.directory.list_members(&entry.id) {
                Ok(members) => entry.participants = members,
                Err(err) => tracing::warn!("Members of {} unavailable: {}", entry.id, err),
            }
        }

        let caller = match self.directory.whoami() {
            Ok(caller) => caller,
            Err(err) => {
                tracing::debug!("auth.test failed, keeping caller in group names: {}", err);
                return;
            }
        };
        for entry in groups {
            let members = ParticipantSet::from_ids(entry.participants.iter().cloned());
            let others = members.without(&caller);
            if members.contains(&caller) && others.len() >= 2 {
                entry.participants.retain(|id| id != &caller);
            }
        }
    }
}

/// Stable ranking: direct kinds first, then the chosen secondary key
pub fn rank(entries: &mut [UnreadEntry], order_by: OrderBy) {
    entries.sort_by(|a, b| {
        let class = b.kind.is_direct().cmp(&a.kind.is_direct());
        class.then_with(|| match order_by {
            OrderBy::Count => b.unread_count.cmp(&a.unread_count),
            OrderBy::Oldest => a.last_read.cmp(&b.last_read),
        })
    });
}
