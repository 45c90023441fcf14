//! Direct-conversation matching
//!
//! Decides whether a direct or group-direct conversation for an exact set of
//! participants already exists. Membership is always compared as a set; the
//! platform does not keep member order stable.

use serde::Serialize;

use super::errors::CoreError;
use super::identity::resolve_names;
use super::participants::ParticipantSet;
use super::traits::Directory;
use super::types::{
    ConversationFilter, ConversationHandle, ConversationKind, ConversationRecord, Marker, UserId,
};
use super::Result;

/// Result of [`ConversationMatcher::open_or_create`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "conversation", rename_all = "snake_case")]
pub enum OpenOutcome {
    /// Matched a conversation in the listing; nothing was changed remotely
    Existing(ConversationHandle),
    /// Opened through the directory
    Created(ConversationHandle),
}

impl OpenOutcome {
    pub fn handle(&self) -> &ConversationHandle {
        match self {
            Self::Existing(handle) | Self::Created(handle) => handle,
        }
    }

    pub fn into_handle(self) -> ConversationHandle {
        match self {
            Self::Existing(handle) | Self::Created(handle) => handle,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// A direct conversation as shown in listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectSummary {
    pub id: String,
    pub kind: ConversationKind,
    pub participants: Vec<UserId>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub participant_names: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest: Option<Marker>,
}

pub struct ConversationMatcher<'a, D: Directory + ?Sized> {
    directory: &'a D,
    /// The caller's own ID; group member lists from the platform include it
    caller: Option<UserId>,
}

impl<'a, D: Directory + ?Sized> ConversationMatcher<'a, D> {
    pub fn new(directory: &'a D) -> Self {
        Self {
            directory,
            caller: None,
        }
    }

    pub fn with_caller(mut self, caller: Option<UserId>) -> Self {
        self.caller = caller.filter(|id| !id.is_empty());
        self
    }

    /// Existing conversation whose participant set equals `participants`
    pub fn find_existing(&self, participants: &[UserId]) -> Result<Option<ConversationHandle>> {
        let target = ParticipantSet::from_ids(participants.iter().cloned());
        let kind =
            ConversationKind::for_participant_count(target.len()).ok_or(CoreError::NoParticipants)?;

        let candidates = self
            .directory
            .list_conversations(&ConversationFilter::of_kinds(&[kind]))?;

        for record in candidates.iter().filter(|c| c.kind == kind) {
            let members = self.candidate_members(record, &target)?;
            if members.same_members(&target) {
                tracing::debug!("Matched {} for participants {}", record.id, target.joined());
                return Ok(Some(self.handle_for(record, target)));
            }
        }
        Ok(None)
    }

    /// Existing conversation, or a new one opened through the directory
    pub fn open_or_create(&self, participants: &[UserId]) -> Result<OpenOutcome> {
        if let Some(existing) = self.find_existing(participants)? {
            return Ok(OpenOutcome::Existing(existing));
        }

        let target = ParticipantSet::from_ids(participants.iter().cloned());
        let record = self.directory.open_conversation(&target.to_vec())?;
        tracing::debug!("Opened {} for participants {}", record.id, target.joined());
        Ok(OpenOutcome::Created(self.handle_for(&record, target)))
    }

    /// Direct and group-direct conversations, most recently active first
    ///
    /// `with` keeps only conversations containing every listed participant.
    pub fn list_direct(
        &self,
        with: Option<&[UserId]>,
        limit: Option<usize>,
    ) -> Result<Vec<DirectSummary>> {
        let filter = ConversationFilter::of_kinds(&[
            ConversationKind::Direct,
            ConversationKind::GroupDirect,
        ])
        .with_limit(limit);
        let records = self.directory.list_conversations(&filter)?;

        let required = with.map(|ids| ParticipantSet::from_ids(ids.iter().cloned()));
        let mut summaries = Vec::with_capacity(records.len());
        for record in &records {
            let participants = match record.kind {
                ConversationKind::GroupDirect if record.members.is_empty() => {
                    self.directory.list_members(&record.id)?
                }
                _ => record.participants(),
            };
            if let Some(required) = &required {
                let present = ParticipantSet::from_ids(participants.iter().cloned());
                if !required.iter().all(|id| present.contains(id)) {
                    continue;
                }
            }
            summaries.push(DirectSummary {
                id: record.id.clone(),
                kind: record.kind,
                participants,
                participant_names: Vec::new(),
                latest: record.latest.clone(),
            });
        }

        let names = resolve_names(
            self.directory,
            summaries.iter().flat_map(|s| s.participants.iter()),
        );
        for summary in &mut summaries {
            summary.participant_names = summary
                .participants
                .iter()
                .filter_map(|id| names.get(id).map(|user| user.name.clone()))
                .collect();
        }

        summaries.sort_by(|a, b| b.latest.cmp(&a.latest));
        Ok(summaries)
    }

    /// Participant set of a candidate, comparable against `target`
    fn candidate_members(
        &self,
        record: &ConversationRecord,
        target: &ParticipantSet,
    ) -> Result<ParticipantSet> {
        let mut members = ParticipantSet::from_ids(record.participants());
        if record.kind == ConversationKind::GroupDirect && members.is_empty() {
            members = ParticipantSet::from_ids(self.directory.list_members(&record.id)?);
        }
        Ok(match &self.caller {
            Some(caller) if !target.contains(caller) => members.without(caller),
            _ => members,
        })
    }

    fn handle_for(
        &self,
        record: &ConversationRecord,
        participants: ParticipantSet,
    ) -> ConversationHandle {
        ConversationHandle {
            participants,
            ..ConversationHandle::from_record(record)
        }
    }
}
