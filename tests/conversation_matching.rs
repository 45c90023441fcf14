//! Integration tests for direct-conversation matching

use proptest::prelude::*;
use slka_cli::core::{
    ConversationKind, ConversationMatcher, ConversationRecord, IdentityResolver, OpenOutcome,
};
use slka_cli::slack::sim::{DirectoryCall, SimDirectory};

fn group(id: &str, members: &[&str]) -> ConversationRecord {
    let mut record = ConversationRecord::new(id, ConversationKind::GroupDirect);
    record.members = members.iter().map(|m| m.to_string()).collect();
    record
}

fn direct(id: &str, user: &str) -> ConversationRecord {
    let mut record = ConversationRecord::new(id, ConversationKind::Direct);
    record.user = Some(user.to_string());
    record
}

fn workspace() -> SimDirectory {
    SimDirectory::new()
        .with_named_user("U1", "u1")
        .with_named_user("U2", "u2")
        .with_named_user("U3", "u3")
        .with_named_user("U4", "u4")
        .with_conversation(direct("D1", "U1"))
        .with_conversation(group("G2", &["U1", "U4"]))
        .with_conversation(group("G1", &["U2", "U3", "U1"]))
}

#[test]
fn names_resolve_to_existing_group() {
    let sim = workspace();
    let ids = IdentityResolver::new(&sim).resolve_many("u1,u2,u3").unwrap();
    let matcher = ConversationMatcher::new(&sim);

    let outcome = matcher.open_or_create(&ids).unwrap();
    assert!(!outcome.was_created());
    assert_eq!(outcome.handle().id, "G1");
    assert_eq!(sim.calls(DirectoryCall::OpenConversation), 0);
}

#[test]
fn subset_and_superset_do_not_match() {
    let sim = workspace();
    let matcher = ConversationMatcher::new(&sim);
    assert!(matcher
        .find_existing(&["U1".into(), "U2".into()])
        .unwrap()
        .is_none());
    assert!(matcher
        .find_existing(&["U1".into(), "U2".into(), "U3".into(), "U4".into()])
        .unwrap()
        .is_none());
}

#[test]
fn single_participant_uses_direct_listing() {
    let sim = workspace();
    let matcher = ConversationMatcher::new(&sim);
    let handle = matcher.find_existing(&["U1".into()]).unwrap().unwrap();
    assert_eq!(handle.id, "D1");
    assert_eq!(handle.kind, ConversationKind::Direct);
    assert_eq!(sim.arguments(DirectoryCall::ListConversations), vec!["direct"]);
}

#[test]
fn missing_group_opens_once() {
    let sim = workspace();
    let matcher = ConversationMatcher::new(&sim);
    let ids: Vec<String> = vec!["U2".into(), "U4".into()];

    let first = matcher.open_or_create(&ids).unwrap();
    assert!(matches!(first, OpenOutcome::Created(_)));
    assert_eq!(sim.calls(DirectoryCall::OpenConversation), 1);

    // The second request finds the conversation opened by the first
    let second = matcher.open_or_create(&ids).unwrap();
    assert!(!second.was_created());
    assert_eq!(second.handle().id, first.handle().id);
    assert_eq!(sim.calls(DirectoryCall::OpenConversation), 1);
}

#[test]
fn caller_is_ignored_when_not_targeted() {
    // The platform lists the caller U9 among the group's members
    let sim = SimDirectory::new()
        .with_caller("U9")
        .with_conversation(group("G7", &["U9", "U2", "U3"]));

    let plain = ConversationMatcher::new(&sim);
    assert!(plain
        .find_existing(&["U2".into(), "U3".into()])
        .unwrap()
        .is_none());

    let aware = ConversationMatcher::new(&sim).with_caller(Some("U9".into()));
    let handle = aware
        .find_existing(&["U3".into(), "U2".into()])
        .unwrap()
        .unwrap();
    assert_eq!(handle.id, "G7");
}

#[test]
fn empty_member_lists_are_fetched() {
    let sim = workspace().listing_without_members();
    let matcher = ConversationMatcher::new(&sim);
    let handle = matcher
        .find_existing(&["U3".into(), "U1".into(), "U2".into()])
        .unwrap()
        .unwrap();
    assert_eq!(handle.id, "G1");
    assert!(sim.calls(DirectoryCall::ListMembers) >= 1);
}

proptest! {
    /// Any ordering of the same participants finds the same conversation
    #[test]
    fn prop_order_does_not_matter(
        order in Just(vec!["U1", "U2", "U3"]).prop_shuffle(),
        dup in 0usize..3,
    ) {
        let sim = workspace();
        let matcher = ConversationMatcher::new(&sim);

        let mut ids: Vec<String> = order.iter().map(|id| id.to_string()).collect();
        ids.push(order[dup].to_string());

        let handle = matcher.find_existing(&ids).unwrap();
        prop_assert_eq!(handle.map(|h| h.id), Some("G1".to_string()));
    }
}
