//! Integration tests for acknowledgment tracking

use slka_cli::core::{CoreError, EngagementTracker, Marker, MessageRecord, Reaction};
use slka_cli::slack::sim::{DirectoryCall, SimDirectory};

const CHANNEL: &str = "C100";

fn message(
    ts: &str,
    author: &str,
    reactions: Vec<(&str, Vec<&str>)>,
    replies: u32,
) -> MessageRecord {
    MessageRecord {
        ts: Marker::from(ts),
        user: Some(author.to_string()),
        text: format!("message {}", ts),
        reply_count: replies,
        reactions: reactions
            .into_iter()
            .map(|(name, users)| Reaction {
                name: name.to_string(),
                count: users.len() as u32,
                users: users.into_iter().map(str::to_string).collect(),
            })
            .collect(),
        ..Default::default()
    }
}

fn reply(ts: &str, author: &str) -> MessageRecord {
    MessageRecord {
        ts: Marker::from(ts),
        user: Some(author.to_string()),
        thread_ts: Some(Marker::from("100.000001")),
        ..Default::default()
    }
}

#[test]
fn author_and_other_reactor() {
    let sim = SimDirectory::new().with_message(
        CHANNEL,
        message("100.000001", "U1", vec![("eyes", vec!["U1", "U2"])], 0),
    );
    let tracker = EngagementTracker::new(&sim);

    let record = tracker
        .check_acknowledgment(CHANNEL, &Marker::from("100.000001"))
        .unwrap();
    assert_eq!(record.reaction_count, 1);
    assert_eq!(record.reacted_users, vec!["U2"]);
    assert!(record.is_acknowledged);
    assert!(!record.has_replies);
}

#[test]
fn self_reaction_only_is_not_acknowledged() {
    let sim = SimDirectory::new().with_message(
        CHANNEL,
        message(
            "100.000001",
            "U1",
            vec![("thumbsup", vec!["U1"]), ("eyes", vec!["U1"])],
            0,
        ),
    );
    let tracker = EngagementTracker::new(&sim);

    let record = tracker
        .check_acknowledgment(CHANNEL, &Marker::from("100.000001"))
        .unwrap();
    assert_eq!(record.reaction_count, 0);
    assert!(record.reacted_users.is_empty());
    // The author's reactions still show up as reactions
    assert!(record.has_reactions);
    assert!(!record.is_acknowledged);
}

#[test]
fn no_replies_skips_thread_fetch() {
    let sim = SimDirectory::new().with_message(CHANNEL, message("100.000001", "U1", vec![], 0));
    let tracker = EngagementTracker::new(&sim);

    let record = tracker
        .check_acknowledgment(CHANNEL, &Marker::from("100.000001"))
        .unwrap();
    assert!(!record.is_acknowledged);
    assert_eq!(sim.calls(DirectoryCall::ThreadReplies), 0);
}

#[test]
fn replies_skip_parent_and_author() {
    let sim = SimDirectory::new()
        .with_message(CHANNEL, message("100.000001", "U1", vec![], 3))
        .with_thread(
            CHANNEL,
            "100.000001",
            vec![
                reply("101.000001", "U1"),
                reply("102.000001", "U3"),
                reply("103.000001", "U3"),
            ],
        );
    let tracker = EngagementTracker::new(&sim);

    let record = tracker
        .check_acknowledgment(CHANNEL, &Marker::from("100.000001"))
        .unwrap();
    assert_eq!(sim.calls(DirectoryCall::ThreadReplies), 1);
    assert_eq!(record.reply_count, 2);
    assert_eq!(record.replied_users, vec!["U3"]);
    assert!(record.has_replies);
    assert!(record.is_acknowledged);
}

#[test]
fn author_only_thread_is_not_acknowledged() {
    let sim = SimDirectory::new()
        .with_message(CHANNEL, message("100.000001", "U1", vec![], 1))
        .with_thread(CHANNEL, "100.000001", vec![reply("101.000001", "U1")]);
    let tracker = EngagementTracker::new(&sim);

    let record = tracker
        .check_acknowledgment(CHANNEL, &Marker::from("100.000001"))
        .unwrap();
    assert_eq!(record.reply_count, 0);
    assert!(!record.is_acknowledged);
}

#[test]
fn missing_message_is_an_error() {
    let sim = SimDirectory::new();
    let tracker = EngagementTracker::new(&sim);

    let err = tracker
        .check_acknowledgment(CHANNEL, &Marker::from("999.000001"))
        .unwrap_err();
    assert!(matches!(err, CoreError::MessageNotFound { .. }));
    assert_eq!(sim.calls(DirectoryCall::ThreadReplies), 0);
}

#[test]
fn reaction_listing_totals() {
    let sim = SimDirectory::new().with_message(
        CHANNEL,
        message(
            "100.000001",
            "U1",
            vec![("eyes", vec!["U1", "U2"]), ("tada", vec!["U3"])],
            0,
        ),
    );
    let tracker = EngagementTracker::new(&sim);

    let summary = tracker
        .list_reactions(CHANNEL, &Marker::from("100.000001"))
        .unwrap();
    assert_eq!(summary.reactions.len(), 2);
    assert_eq!(summary.total_reaction_count, 3);
    assert_eq!(summary.message_text, "message 100.000001");
}

#[test]
fn thread_reply_found_by_short_timestamp() {
    let mut answer = reply("102.000100", "U3");
    answer.reactions = vec![Reaction {
        name: "eyes".into(),
        count: 1,
        users: vec!["U4".into()],
    }];
    let sim = SimDirectory::new()
        .with_message(CHANNEL, message("100.000001", "U1", vec![], 1))
        .with_thread(CHANNEL, "100.000001", vec![answer]);
    let tracker = EngagementTracker::new(&sim);

    let record = tracker
        .check_acknowledgment(CHANNEL, &Marker::from("102.0001"))
        .unwrap();
    assert_eq!(record.reacted_users, vec!["U4"]);
    assert!(record.is_acknowledged);
}
