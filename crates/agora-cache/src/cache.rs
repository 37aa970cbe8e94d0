//! The forum cache orchestrator.
//!
//! One `ForumCache` instance coordinates the query-result store, the
//! message pool (with its user interner), and the voter registry. All
//! state-mutating operations run under a single coarse mutex: the
//! refcount and classification invariants span every sub-store, so
//! per-store locking would buy nothing but a lock-ordering protocol.
//! Critical sections are short and in-memory, at worst O(cache size)
//! for an eviction sweep.

use std::sync::{Mutex, PoisonError};

use agora_core::config::CacheConfig;
use agora_core::search::SearchQuery;
use agora_core::types::ids::{is_registered_user, FileId, MessageId, UserId};
use agora_core::types::message::Message;
use agora_core::types::page::ResultPage;

use serde::Serialize;

use crate::clock::now_millis;
use crate::envelope::{QueryEnvelope, QueryKind};
use crate::pool::MessagePool;
use crate::store::QueryResultStore;
use crate::voters::VoterRegistry;

/// A point-in-time snapshot of cache occupancy and effectiveness.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CacheStats {
    pub envelopes: usize,
    pub messages: usize,
    pub users: usize,
    pub hits: u64,
    pub misses: u64,
}

struct CacheInner {
    store: QueryResultStore,
    pool: MessagePool,
    voters: VoterRegistry,
    last_cleanup_ms: u64,
    hits: u64,
    misses: u64,
}

/// The in-process cache for forum search results. Caching is advisory:
/// a refused admission or a missed lookup simply means the caller
/// computes from the source of truth.
pub struct ForumCache {
    inner: Mutex<CacheInner>,
    config: CacheConfig,
}

impl ForumCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                store: QueryResultStore::new(),
                pool: MessagePool::new(),
                voters: VoterRegistry::new(),
                last_cleanup_ms: now_millis(),
                hits: 0,
                misses: 0,
            }),
            config,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CacheInner> {
        // A panic while holding the lock leaves data that is at worst
        // stale, never unsafe; recover instead of poisoning forever.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetch the cached result page for `query`, resolving message ids
    /// through the pool and annotating each entry's vote state for the
    /// requesting user. `None` means the caller must run the search.
    pub fn lookup(&self, query: &SearchQuery, user_id: UserId) -> Option<ResultPage<Message>> {
        self.lock().lookup(query, user_id)
    }

    /// Fetch a single cached message with vote annotation.
    pub fn message(&self, message_id: MessageId, user_id: UserId) -> Option<Message> {
        self.lock().message(message_id, user_id)
    }

    /// Ingest freshly computed results for `query`. Returns `false`
    /// when the page was not cached (already present counts as cached;
    /// capacity refusal does not).
    pub fn insert(
        &self,
        query: &SearchQuery,
        page: &ResultPage<Message>,
        user_id: UserId,
    ) -> bool {
        self.lock().insert(query, page, user_id, &self.config)
    }

    /// Apply a vote to the resident message (count always, score on an
    /// up-vote) and remember the voter. Votes never invalidate cached
    /// queries; eventual visibility is fine for them.
    pub fn vote(&self, message_id: MessageId, up: bool, user_id: UserId) {
        let mut inner = self.lock();
        if let Some(message) = inner.pool.message_mut(message_id) {
            message.vote_count += 1;
            if up {
                message.vote_score += 1;
            }
            inner.voters.mark_voted(message_id, user_id);
        }
    }

    /// Remember that a user voted, without touching any counters. Voter
    /// state is only kept for resident messages; it is garbage-collected
    /// when the message leaves the pool.
    pub fn record_vote(&self, message_id: MessageId, user_id: UserId) {
        let mut inner = self.lock();
        if inner.pool.contains(message_id) {
            inner.voters.mark_voted(message_id, user_id);
        }
    }

    pub fn has_voted(&self, message_id: MessageId, user_id: UserId) -> bool {
        self.lock().voters.has_voted(message_id, user_id)
    }

    /// A new message was posted. Custom searches are always stale, and
    /// the navigation listings over the new message's ancestors have
    /// stale reply counts. News-feed queries are deliberately kept: the
    /// hottest read path tolerates briefly stale counters.
    pub fn message_posted(&self, message: &Message) {
        tracing::debug!(message_id = message.id, path = %message.path, "new message posted");
        self.lock()
            .remove_custom_and_navigation(message.path.ids(), false);
    }

    /// A message was edited. Like a post, plus single-message views of
    /// it, plus (if it is approved) every news-feed query, since its
    /// rendered feed content is now stale.
    pub fn message_updated(&self, message: &Message) {
        tracing::debug!(message_id = message.id, "message updated");
        let mut inner = self.lock();
        // Prefer the resident copy: the caller's may carry a stale
        // path or approval flag.
        let (ancestors, approved) = match inner.pool.get(message.id) {
            Some(resident) => (resident.path.ids().to_vec(), resident.approved),
            None => (message.path.ids().to_vec(), message.approved),
        };
        inner.remove_custom_and_navigation(&ancestors, true);
        if approved {
            inner.remove_news_feed_all();
        }
    }

    /// A message was moved under a new parent. Both the old and the new
    /// ancestor chains (and the new parent itself) see changed listings.
    pub fn message_moved(&self, message: &Message, new_parent: &Message) {
        tracing::debug!(
            message_id = message.id,
            new_parent = new_parent.id,
            "message moved"
        );
        let mut affected: Vec<MessageId> = message.path.ids().to_vec();
        affected.extend_from_slice(new_parent.path.ids());
        affected.push(new_parent.id);
        self.lock().remove_custom_and_navigation(&affected, false);
    }

    /// A message's news-feed approval changed. Approving purges every
    /// news-feed query (the message must appear); disapproving purges
    /// only the news-feed queries that listed it. The resident copy's
    /// flag is flipped in place either way.
    pub fn message_approved(&self, message_id: MessageId, approved: bool) {
        tracing::debug!(message_id = message_id, approved, "message approval changed");
        let mut inner = self.lock();
        if approved {
            inner.remove_news_feed_all();
        } else {
            inner.remove_news_feed_containing(&[message_id]);
        }
        if let Some(message) = inner.pool.message_mut(message_id) {
            message.approved = approved;
        }
    }

    /// A message was deleted. Its ancestors and itself invalidate like
    /// an edit; a deleted subtree may additionally have contained
    /// independently news-visible replies, so the whole news feed goes
    /// when replies existed, and only the feeds listing the message
    /// when it was approved and childless.
    pub fn message_deleted(&self, message: &Message) {
        tracing::debug!(message_id = message.id, replies = message.reply_count, "message deleted");
        let mut inner = self.lock();
        let affected = message.self_and_ancestors();
        inner.remove_custom_and_navigation(&affected, true);
        if message.reply_count > 0 {
            inner.remove_news_feed_all();
        } else if message.approved {
            inner.remove_news_feed_containing(&[message.id]);
        }
    }

    /// An attachment file was deleted: every envelope whose page listed
    /// the file goes, regardless of classification.
    pub fn file_deleted(&self, file_id: FileId) {
        tracing::debug!(file = file_id, "attachment file deleted");
        let mut inner = self.lock();
        let keys = inner.store.keys_where(|e| e.contains_file(file_id));
        inner.drop_envelopes(keys);
    }

    /// Number of distinct pooled messages.
    pub fn message_count(&self) -> usize {
        self.lock().pool.len()
    }

    /// Number of cached query envelopes.
    pub fn envelope_count(&self) -> usize {
        self.lock().store.len()
    }

    /// Query-envelope reference count of a pooled message.
    pub fn ref_count(&self, message_id: MessageId) -> Option<u32> {
        self.lock().pool.ref_count(message_id)
    }

    /// Number of interned user snapshots.
    pub fn user_count(&self) -> usize {
        self.lock().pool.user_count()
    }

    /// Number of distinct recorded voters for a message.
    pub fn voter_count(&self, message_id: MessageId) -> usize {
        self.lock().voters.voter_count(message_id)
    }

    /// Number of lookups served from the cache.
    pub fn hit_count(&self) -> u64 {
        self.lock().hits
    }

    /// Number of lookups that fell through to the caller.
    pub fn miss_count(&self) -> u64 {
        self.lock().misses
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        CacheStats {
            envelopes: inner.store.len(),
            messages: inner.pool.len(),
            users: inner.pool.user_count(),
            hits: inner.hits,
            misses: inner.misses,
        }
    }
}

impl Default for ForumCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl CacheInner {
    fn lookup(&mut self, query: &SearchQuery, user_id: UserId) -> Option<ResultPage<Message>> {
        let key = query.cache_key();
        let Some(envelope) = self.store.lookup(&key, now_millis()) else {
            tracing::debug!(key, "query not cached");
            self.misses += 1;
            return None;
        };
        tracing::debug!(key, "cached query found");
        self.hits += 1;

        let mut entries = Vec::with_capacity(envelope.message_count());
        for &id in envelope.message_ids() {
            match self.pool.get(id) {
                Some(mut message) => {
                    if is_registered_user(user_id) {
                        message.has_voted = self.voters.has_voted(id, user_id);
                    }
                    entries.push(message);
                }
                // Every listed id must be pooled; a miss here is an
                // internal inconsistency, degraded to a shorter page.
                None => tracing::error!(
                    message_id = id,
                    key,
                    "cached query lists a message that is not pooled"
                ),
            }
        }
        Some(ResultPage::new(entries, envelope.total(), envelope.offset()))
    }

    fn message(&self, message_id: MessageId, user_id: UserId) -> Option<Message> {
        let mut message = self.pool.get(message_id)?;
        if is_registered_user(user_id) {
            message.has_voted = self.voters.has_voted(message_id, user_id);
        }
        Some(message)
    }

    fn insert(
        &mut self,
        query: &SearchQuery,
        page: &ResultPage<Message>,
        user_id: UserId,
        config: &CacheConfig,
    ) -> bool {
        let key = query.cache_key();
        if self.store.contains(&key) {
            tracing::debug!(key, "query already cached");
            return true;
        }

        if !self.can_admit(page.len(), config) {
            tracing::warn!(key, "no space left, not caching this query");
            return false;
        }

        for message in &page.entries {
            let voted_by_requester = message.has_voted;
            self.pool.acquire(message.clone());
            if voted_by_requester {
                self.voters.mark_voted(message.id, user_id);
            }
        }

        let envelope = QueryEnvelope::new(
            query,
            key,
            page.total,
            page.offset,
            &page.entries,
            now_millis(),
        );
        self.store.insert(envelope);
        true
    }

    /// Check whether `incoming` more messages fit. When they do not, a
    /// clean-up is attempted, but at most once per throttle interval so
    /// bursty load cannot thrash the eviction scan.
    fn can_admit(&mut self, incoming: usize, config: &CacheConfig) -> bool {
        let capacity = config.effective_max_cached_messages();
        let projected = incoming + self.pool.len();
        if projected <= capacity {
            return true;
        }

        let now = now_millis();
        if now.saturating_sub(self.last_cleanup_ms) <= config.effective_min_cleanup_interval_ms() {
            tracing::warn!(
                pooled = self.pool.len(),
                "cache full and last clean-up was recent, refusing admission"
            );
            return false;
        }

        tracing::debug!(pooled = self.pool.len(), "cache full, starting clean-up");
        let admitted = self.evict(projected - capacity, now, config);
        self.last_cleanup_ms = now;
        admitted
    }

    /// Remove low-priority envelopes until at least `required` messages
    /// have left the pool; with `required == 0`, removing any single
    /// envelope counts as success. Partial work is never rolled back.
    fn evict(&mut self, required: usize, now_ms: u64, config: &CacheConfig) -> bool {
        let idle_timeout = config.effective_idle_timeout_ms();
        let min_frequency = config.effective_min_uses_per_hour();
        let candidates = self
            .store
            .keys_where(|e| e.is_low_priority(now_ms, idle_timeout, min_frequency));

        let mut freed = 0usize;
        for key in &candidates {
            let Some(envelope) = self.store.remove(key) else {
                continue;
            };
            freed += self.release_messages(envelope.message_ids());
            tracing::debug!(key, freed, "evicted a low-priority query");
            if freed >= required {
                return true;
            }
        }
        tracing::warn!(required, freed, "clean-up fell short");
        false
    }

    /// Drop a batch of envelopes by key and release their messages.
    fn drop_envelopes(&mut self, keys: Vec<String>) -> usize {
        let mut freed = 0usize;
        for key in keys {
            if let Some(envelope) = self.store.remove(&key) {
                tracing::debug!(key, "invalidating cached query");
                freed += self.release_messages(envelope.message_ids());
            }
        }
        freed
    }

    /// Give back one pool reference per listed message; fully released
    /// messages also lose their voter state. Returns how many messages
    /// actually left the pool.
    fn release_messages(&mut self, ids: &[MessageId]) -> usize {
        let mut removed = 0usize;
        for &id in ids {
            if self.pool.release(id) {
                self.voters.forget(id);
                removed += 1;
            }
        }
        removed
    }

    fn remove_news_feed_all(&mut self) {
        let keys = self.store.keys_where(|e| e.kind() == QueryKind::NewsFeed);
        self.drop_envelopes(keys);
    }

    fn remove_news_feed_containing(&mut self, ids: &[MessageId]) {
        let keys = self.store.keys_where(|e| {
            e.kind() == QueryKind::NewsFeed && ids.iter().any(|&id| e.contains_message(id))
        });
        self.drop_envelopes(keys);
    }

    /// Remove every custom-search envelope, every envelope whose base
    /// message is in `affected`, and (optionally) every single-message
    /// view.
    fn remove_custom_and_navigation(&mut self, affected: &[MessageId], single_views_too: bool) {
        let keys = self.store.keys_where(|e| {
            e.kind() == QueryKind::CustomSearch
                || affected.contains(&e.base_message_id())
                || (single_views_too && e.kind() == QueryKind::SingleMessage)
        });
        self.drop_envelopes(keys);
    }
}
