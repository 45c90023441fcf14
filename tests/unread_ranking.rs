//! Integration tests for unread aggregation and ranking

use slka_cli::core::{
    ConversationKind, ConversationRecord, CoreError, Marker, OrderBy, UnreadAggregator,
    UnreadOptions, UserRecord,
};
use slka_cli::slack::sim::{DirectoryCall, SimDirectory};

fn channel(id: &str, unread: u32, last_read: &str) -> ConversationRecord {
    let mut record = ConversationRecord::new(id, ConversationKind::Channel);
    record.name = Some(format!("chan-{}", id.to_lowercase()));
    record.unread_count = Some(unread);
    record.last_read = Some(Marker::from(last_read));
    record
}

fn direct(id: &str, user: &str, unread: u32, last_read: &str) -> ConversationRecord {
    let mut record = ConversationRecord::new(id, ConversationKind::Direct);
    record.user = Some(user.to_string());
    record.unread_count = Some(unread);
    record.last_read = Some(Marker::from(last_read));
    record
}

fn group(id: &str, members: &[&str], unread: u32, last_read: &str) -> ConversationRecord {
    let mut record = ConversationRecord::new(id, ConversationKind::GroupDirect);
    record.members = members.iter().map(|m| m.to_string()).collect();
    record.unread_count = Some(unread);
    record.last_read = Some(Marker::from(last_read));
    record
}

fn workspace() -> SimDirectory {
    SimDirectory::new()
        .with_user(UserRecord {
            id: "U1".into(),
            name: "alice".into(),
            ..Default::default()
        })
        .with_user(UserRecord {
            id: "U2".into(),
            name: "bob".into(),
            ..Default::default()
        })
        .with_conversation(channel("C1", 0, "10.000000"))
        .with_conversation(channel("C50", 50, "300.000000"))
        .with_conversation(channel("C7", 7, "100.000000"))
        .with_conversation(direct("D2", "U1", 2, "400.000000"))
        .with_conversation(group("G9", &["U1", "U2"], 9, "200.000000"))
}

fn ids(aggregator: &UnreadAggregator<'_, SimDirectory>, options: &UnreadOptions) -> Vec<String> {
    aggregator
        .list(options)
        .unwrap()
        .into_iter()
        .map(|entry| entry.id)
        .collect()
}

#[test]
fn direct_kinds_always_lead() {
    let sim = workspace();
    let aggregator = UnreadAggregator::new(&sim);
    assert_eq!(
        ids(&aggregator, &UnreadOptions::default()),
        vec!["G9", "D2", "C50", "C7"]
    );
}

#[test]
fn oldest_orders_by_last_read_within_class() {
    let sim = workspace();
    let aggregator = UnreadAggregator::new(&sim);
    let options = UnreadOptions {
        order_by: OrderBy::Oldest,
        ..Default::default()
    };
    assert_eq!(ids(&aggregator, &options), vec!["G9", "D2", "C7", "C50"]);
}

#[test]
fn zero_unread_never_listed() {
    let sim = workspace();
    let aggregator = UnreadAggregator::new(&sim);
    let combos = [
        UnreadOptions::default(),
        UnreadOptions {
            channels_only: true,
            ..Default::default()
        },
        UnreadOptions {
            order_by: OrderBy::Oldest,
            ..Default::default()
        },
        UnreadOptions {
            limit: Some(10),
            ..Default::default()
        },
    ];
    for options in &combos {
        assert!(!ids(&aggregator, options).contains(&"C1".to_string()));
    }
}

#[test]
fn filters_and_limit() {
    let sim = workspace();
    let aggregator = UnreadAggregator::new(&sim);

    let channels_only = UnreadOptions {
        channels_only: true,
        ..Default::default()
    };
    assert_eq!(ids(&aggregator, &channels_only), vec!["C50", "C7"]);

    let dms_only = UnreadOptions {
        dms_only: true,
        ..Default::default()
    };
    assert_eq!(ids(&aggregator, &dms_only), vec!["G9", "D2"]);

    let busy = UnreadOptions {
        min_unread: 8,
        ..Default::default()
    };
    assert_eq!(ids(&aggregator, &busy), vec!["G9", "C50"]);

    let top = UnreadOptions {
        limit: Some(3),
        ..Default::default()
    };
    assert_eq!(ids(&aggregator, &top), vec!["G9", "D2", "C50"]);
}

#[test]
fn names_resolved_once_per_user_after_limit() {
    let sim = workspace();
    let aggregator = UnreadAggregator::new(&sim);
    let entries = aggregator.list(&UnreadOptions::default()).unwrap();

    // U1 appears in both G9 and D2 but is looked up once
    assert_eq!(sim.calls(DirectoryCall::GetUser), 2);
    assert_eq!(entries[0].display_name.as_deref(), Some("alice, bob"));
    assert_eq!(entries[1].display_name.as_deref(), Some("alice"));
    assert_eq!(entries[2].display_name.as_deref(), Some("chan-c50"));

    let sim = workspace();
    let aggregator = UnreadAggregator::new(&sim);
    aggregator
        .list(&UnreadOptions {
            channels_only: true,
            ..Default::default()
        })
        .unwrap();
    assert_eq!(sim.calls(DirectoryCall::GetUser), 0);
}

#[test]
fn name_failures_are_soft() {
    let sim = workspace().failing_for(DirectoryCall::GetUser, "U2", "user_not_visible");
    let aggregator = UnreadAggregator::new(&sim);
    let entries = aggregator
        .list(&UnreadOptions {
            dms_only: true,
            ..Default::default()
        })
        .unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].display_name.as_deref(), Some("alice"));
}

#[test]
fn missing_unread_data_falls_back_to_detail() {
    let sim = workspace().listing_without_unread();
    let aggregator = UnreadAggregator::new(&sim);
    let listed = ids(&aggregator, &UnreadOptions::default());
    assert_eq!(listed, vec!["G9", "D2", "C50", "C7"]);
    assert_eq!(sim.calls(DirectoryCall::ConversationDetail), 5);
    assert_eq!(sim.calls(DirectoryCall::ListConversations), 1);
}

#[test]
fn listing_failure_aborts() {
    let sim = workspace().failing(DirectoryCall::ListConversations, "invalid_auth");
    let aggregator = UnreadAggregator::new(&sim);
    let err = aggregator.list(&UnreadOptions::default()).unwrap_err();
    assert!(matches!(err, CoreError::DirectoryUnavailable(_)));
}

#[test]
fn group_members_fetched_when_listing_omits_them() {
    let sim = workspace().listing_without_members();
    let aggregator = UnreadAggregator::new(&sim);
    let entries = aggregator.list(&UnreadOptions::default()).unwrap();

    assert_eq!(entries[0].id, "G9");
    assert_eq!(entries[0].participants, vec!["U1", "U2"]);
    assert_eq!(entries[0].display_name.as_deref(), Some("alice, bob"));
    assert_eq!(sim.arguments(DirectoryCall::ListMembers), vec!["G9"]);
}

#[test]
fn group_members_only_fetched_for_survivors() {
    let sim = workspace().listing_without_members();
    let aggregator = UnreadAggregator::new(&sim);
    aggregator
        .list(&UnreadOptions {
            channels_only: true,
            ..Default::default()
        })
        .unwrap();
    assert_eq!(sim.calls(DirectoryCall::ListMembers), 0);
    assert_eq!(sim.calls(DirectoryCall::Whoami), 0);
}

#[test]
fn group_member_failure_is_soft() {
    let sim = workspace()
        .listing_without_members()
        .failing(DirectoryCall::ListMembers, "channel_not_found");
    let aggregator = UnreadAggregator::new(&sim);
    let entries = aggregator.list(&UnreadOptions::default()).unwrap();

    assert_eq!(entries.len(), 4);
    assert_eq!(entries[0].id, "G9");
    assert!(entries[0].participants.is_empty());
    assert_eq!(entries[0].display_name, None);
}

#[test]
fn caller_left_out_of_group_names() {
    let sim = SimDirectory::new()
        .with_named_user("UME", "me")
        .with_named_user("U1", "alice")
        .with_named_user("U2", "bob")
        .with_caller("UME")
        .with_conversation(group("G1", &["UME", "U1", "U2"], 3, "1.000000"))
        .listing_without_members();
    let aggregator = UnreadAggregator::new(&sim);
    let entries = aggregator.list(&UnreadOptions::default()).unwrap();

    assert_eq!(entries[0].participants, vec!["U1", "U2"]);
    assert_eq!(entries[0].display_name.as_deref(), Some("alice, bob"));
    assert_eq!(sim.calls(DirectoryCall::Whoami), 1);
    assert!(!sim.arguments(DirectoryCall::GetUser).contains(&"UME".to_string()));
}
