//! Channel resolution and listing

use once_cell::sync::Lazy;
use regex::Regex;

use super::errors::CoreError;
use super::traits::Directory;
use super::types::{
    ChannelVisibility, ConversationFilter, ConversationId, ConversationKind, ConversationRecord,
};
use super::Result;

static CONVERSATION_ID_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[CGD][A-Z0-9]{2,}$").expect("valid regex"));

pub fn is_conversation_id(token: &str) -> bool {
    CONVERSATION_ID_LITERAL.is_match(token)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ChannelListOptions {
    pub visibility: ChannelVisibility,
    pub include_archived: bool,
    pub limit: Option<usize>,
}

pub struct ChannelResolver<'a, D: Directory + ?Sized> {
    directory: &'a D,
}

impl<'a, D: Directory + ?Sized> ChannelResolver<'a, D> {
    pub fn new(directory: &'a D) -> Self {
        Self { directory }
    }

    /// Channel ID for an ID literal, `#name` or `name`
    pub fn resolve(&self, token: &str) -> Result<ConversationId> {
        let token = token.trim();
        if is_conversation_id(token) {
            return Ok(token.to_string());
        }

        let name = token.trim_start_matches('#');
        let filter = ConversationFilter::of_kinds(&[ConversationKind::Channel]).with_archived(true);
        self.directory
            .list_conversations(&filter)?
            .into_iter()
            .find(|channel| channel.name.as_deref() == Some(name))
            .map(|channel| channel.id)
            .ok_or_else(|| CoreError::not_found(token))
    }

    /// Channels, most recently active first
    pub fn list(&self, options: &ChannelListOptions) -> Result<Vec<ConversationRecord>> {
        let filter = ConversationFilter::of_kinds(&[ConversationKind::Channel])
            .with_visibility(options.visibility)
            .with_archived(options.include_archived);
        let mut channels = self.directory.list_conversations(&filter)?;

        // Newest activity first; channels without activity data fall back to creation time
        channels.sort_by(|a, b| {
            b.latest
                .cmp(&a.latest)
                .then_with(|| b.created.cmp(&a.created))
        });
        if let Some(limit) = options.limit.filter(|l| *l > 0) {
            channels.truncate(limit);
        }
        Ok(channels)
    }

    pub fn info(&self, token: &str) -> Result<ConversationRecord> {
        let id = self.resolve(token)?;
        Ok(self.directory.get_conversation_detail(&id)?)
    }

    pub fn members(&self, token: &str) -> Result<Vec<String>> {
        let id = self.resolve(token)?;
        Ok(self.directory.list_members(&id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Marker;
    use crate::slack::sim::{DirectoryCall, SimDirectory};

    fn channel(id: &str, name: &str, latest: &str) -> ConversationRecord {
        let mut record = ConversationRecord::new(id, ConversationKind::Channel);
        record.name = Some(name.to_string());
        record.latest = Some(Marker::from(latest));
        record
    }

    #[test]
    fn test_id_passes_through() {
        let sim = SimDirectory::new();
        let resolver = ChannelResolver::new(&sim);
        assert_eq!(resolver.resolve("C024BE91L").unwrap(), "C024BE91L");
        assert_eq!(sim.calls(DirectoryCall::ListConversations), 0);
    }

    #[test]
    fn test_resolve_by_name_with_hash() {
        let mut archived = channel("C2", "old-news", "1.0");
        archived.is_archived = true;
        let sim = SimDirectory::new()
            .with_conversation(channel("C1", "general", "2.0"))
            .with_conversation(archived);
        let resolver = ChannelResolver::new(&sim);
        assert_eq!(resolver.resolve("#general").unwrap(), "C1");
        assert_eq!(resolver.resolve("old-news").unwrap(), "C2");
        assert!(matches!(
            resolver.resolve("#random"),
            Err(CoreError::NotFound { .. })
        ));
    }

    #[test]
    fn test_list_sorted_and_limited() {
        let mut private = channel("C3", "secret", "5.0");
        private.is_private = true;
        let sim = SimDirectory::new()
            .with_conversation(channel("C1", "general", "1.0"))
            .with_conversation(channel("C2", "random", "9.0"))
            .with_conversation(private);
        let resolver = ChannelResolver::new(&sim);

        let all = resolver.list(&ChannelListOptions::default()).unwrap();
        let ids: Vec<&str> = all.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["C2", "C3", "C1"]);

        let public = resolver
            .list(&ChannelListOptions {
                visibility: ChannelVisibility::Public,
                limit: Some(1),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(public.len(), 1);
        assert_eq!(public[0].id, "C2");
    }
}
