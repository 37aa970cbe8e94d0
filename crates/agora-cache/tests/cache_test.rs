//! End-to-end tests of the cache lifecycle: ingesting query results,
//! serving cached pages, sharing pooled messages across queries, vote
//! annotation, and message re-registration.

use agora_cache::ForumCache;
use agora_core::config::CacheConfig;
use agora_core::search::SearchQuery;
use agora_core::types::ids::{MessageId, UserId, GUEST_USER_ID};
use agora_core::types::message::{FileRef, Message};
use agora_core::types::page::ResultPage;
use agora_core::types::user::UserSnapshot;

const READER: UserId = 42;

fn msg(id: MessageId, parent: MessageId, path: &str, sender: UserId) -> Message {
    let mut message = Message::new(id, parent, sender);
    message.path = path.parse().unwrap();
    message.title = format!("message {id}");
    message.sender = Some(UserSnapshot::new(sender, format!("user-{sender}")));
    message
}

fn page(entries: Vec<Message>) -> ResultPage<Message> {
    let total = entries.len() as u32;
    ResultPage::new(entries, total, 0)
}

/// The forum fixture used throughout: topic 10 under section 5 with two
/// replies, plus an unrelated message 13 that may enter the news feed.
fn topic_page() -> ResultPage<Message> {
    page(vec![
        msg(10, 5, "1.5.", 100),
        msg(11, 10, "1.5.10.", 101),
        msg(12, 10, "1.5.10.", 100),
    ])
}

#[test]
fn lookup_misses_until_inserted() {
    let cache = ForumCache::default();
    let query = SearchQuery::navigation(10);

    assert!(cache.lookup(&query, READER).is_none());
    assert!(cache.insert(&query, &topic_page(), READER));

    let served = cache.lookup(&query, READER).unwrap();
    assert_eq!(served.total, 3);
    assert_eq!(served.offset, 0);
    let ids: Vec<MessageId> = served.entries.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![10, 11, 12]);
    assert_eq!(served.entries[0].title, "message 10");
}

#[test]
fn inserting_an_already_cached_query_is_a_noop() {
    let cache = ForumCache::default();
    let query = SearchQuery::navigation(10);
    assert!(cache.insert(&query, &topic_page(), READER));

    // A second writer loses the race; the first page stays.
    let mut other = topic_page();
    other.entries.truncate(1);
    assert!(cache.insert(&query, &other, READER));

    assert_eq!(cache.lookup(&query, READER).unwrap().entries.len(), 3);
    assert_eq!(cache.ref_count(10), Some(1));
}

#[test]
fn shared_messages_are_pooled_once_with_counted_references() {
    let cache = ForumCache::default();
    let navigation = SearchQuery::navigation(10);
    let news = SearchQuery::news_feed();

    cache.insert(&navigation, &topic_page(), READER);
    // The news feed shares message 11 with the navigation page.
    cache.insert(
        &news,
        &page(vec![msg(11, 10, "1.5.10.", 101), msg(13, 2, "1.2.", 102)]),
        READER,
    );

    assert_eq!(cache.envelope_count(), 2);
    assert_eq!(cache.message_count(), 4);
    assert_eq!(cache.ref_count(11), Some(2));
    assert_eq!(cache.ref_count(10), Some(1));
    assert_eq!(cache.ref_count(13), Some(1));

    // Approving a message purges every news-feed query. Message 13 was
    // only held by the news feed, so it leaves the pool; message 11 is
    // still pinned by the navigation page.
    cache.message_approved(13, true);
    assert!(cache.lookup(&news, READER).is_none());
    assert_eq!(cache.ref_count(13), None);
    assert_eq!(cache.ref_count(11), Some(1));
    assert!(cache.lookup(&navigation, READER).is_some());
}

#[test]
fn re_registration_updates_every_query_view() {
    let cache = ForumCache::default();
    let navigation = SearchQuery::navigation(10);
    cache.insert(&navigation, &topic_page(), READER);

    // Message 11 gets a reply elsewhere: a fresher copy arrives through
    // a single-message view.
    let mut updated = msg(11, 10, "1.5.10.", 101);
    updated.title = "message 11 (edited)".into();
    updated.reply_count = 1;
    updated.last_reply_at = 9_000;
    updated.last_replier = Some(UserSnapshot::new(103, "user-103"));
    cache.insert(&SearchQuery::single_message(11), &page(vec![updated]), READER);

    assert_eq!(cache.ref_count(11), Some(2));

    // The navigation page now serves the fresher copy.
    let served = cache.lookup(&navigation, READER).unwrap();
    let entry = served.entries.iter().find(|m| m.id == 11).unwrap();
    assert_eq!(entry.title, "message 11 (edited)");
    assert_eq!(entry.reply_count, 1);
    assert_eq!(
        entry.last_replier.as_ref().map(|u| u.uid),
        Some(103)
    );
}

#[test]
fn votes_mutate_in_place_and_annotate_per_user() {
    let cache = ForumCache::default();
    let query = SearchQuery::navigation(10);
    cache.insert(&query, &topic_page(), READER);

    cache.vote(11, true, READER);
    cache.vote(11, false, 55);

    // The counters are shared; the voted flag is per requesting user.
    let for_voter = cache.lookup(&query, READER).unwrap();
    let entry = for_voter.entries.iter().find(|m| m.id == 11).unwrap();
    assert_eq!(entry.vote_count, 2);
    assert_eq!(entry.vote_score, 1);
    assert!(entry.has_voted);

    let for_other = cache.lookup(&query, 77).unwrap();
    assert!(!for_other.entries.iter().find(|m| m.id == 11).unwrap().has_voted);

    // Guests browse without an identity and never see a voted flag.
    let for_guest = cache.lookup(&query, GUEST_USER_ID).unwrap();
    assert!(for_guest.entries.iter().all(|m| !m.has_voted));

    // Voting never invalidates: the envelope is still served.
    assert_eq!(cache.envelope_count(), 1);
    assert_eq!(cache.voter_count(11), 2);
}

#[test]
fn requester_vote_flags_survive_ingestion() {
    let cache = ForumCache::default();
    let mut entries = topic_page();
    // The search executor annotated message 12 as voted-on by READER.
    entries.entries[2].has_voted = true;
    cache.insert(&SearchQuery::navigation(10), &entries, READER);

    assert!(cache.has_voted(12, READER));
    assert!(!cache.has_voted(12, 55));
    let single = cache.message(12, READER).unwrap();
    assert!(single.has_voted);
}

#[test]
fn single_message_lookup() {
    let cache = ForumCache::default();
    cache.insert(&SearchQuery::navigation(10), &topic_page(), READER);

    assert_eq!(cache.message(11, READER).map(|m| m.title), Some("message 11".into()));
    assert!(cache.message(999, READER).is_none());
}

#[test]
fn full_cache_refuses_admission_without_losing_existing_entries() {
    let cache = ForumCache::new(CacheConfig {
        max_cached_messages: Some(3),
        // Effectively disable clean-ups so the refusal path is taken.
        min_cleanup_interval_ms: Some(u64::MAX),
        ..CacheConfig::default()
    });

    let first = SearchQuery::navigation(10);
    assert!(cache.insert(&first, &topic_page(), READER));
    assert!(!cache.insert(
        &SearchQuery::news_feed(),
        &page(vec![msg(13, 2, "1.2.", 102)]),
        READER,
    ));

    assert_eq!(cache.envelope_count(), 1);
    assert_eq!(cache.message_count(), 3);
    assert!(cache.lookup(&first, READER).is_some());
}

#[test]
fn released_messages_drop_their_interned_users() {
    let cache = ForumCache::default();
    cache.insert(&SearchQuery::navigation(10), &topic_page(), READER);
    // Senders 100 and 101 are interned once each.
    assert_eq!(cache.user_count(), 2);

    // Deleting the topic purges the navigation page; with the last
    // envelope gone the pool and the interner drain completely.
    let mut topic = msg(10, 5, "1.5.", 100);
    topic.reply_count = 2;
    cache.message_deleted(&topic);

    assert_eq!(cache.envelope_count(), 0);
    assert_eq!(cache.message_count(), 0);
    assert_eq!(cache.user_count(), 0);
}

#[test]
fn attachments_travel_with_cached_messages() {
    let cache = ForumCache::default();
    let mut with_file = msg(11, 10, "1.5.10.", 101);
    with_file.attachments.push(FileRef::new(900, "photo.jpg"));
    cache.insert(&SearchQuery::single_message(11), &page(vec![with_file]), READER);

    let served = cache.message(11, READER).unwrap();
    assert_eq!(served.attachments.len(), 1);
    assert_eq!(served.attachments[0].file_id, 900);
}
