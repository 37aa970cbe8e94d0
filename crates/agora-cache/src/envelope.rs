//! The cached representation of one query's result page.

use agora_core::search::SearchQuery;
use agora_core::types::collections::FxHashSet;
use agora_core::types::ids::{FileId, MessageId};
use agora_core::types::message::Message;

use serde::Serialize;

/// The four mutually exclusive classifications of a cached query. Each
/// kind has its own invalidation rules under mutation events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum QueryKind {
    /// Browsing the approved-message news feed.
    NewsFeed,
    /// Browsing the replies of a base message (sections, topics).
    Navigation,
    /// Viewing one particular message.
    SingleMessage,
    /// Free-text or otherwise filtered search.
    CustomSearch,
}

impl QueryKind {
    /// Classify a search descriptor. Anything that is not news-feed,
    /// navigation, or a single-message view is a custom search.
    pub fn classify(query: &SearchQuery) -> Self {
        if query.is_news_feed() {
            Self::NewsFeed
        } else if query.is_navigation() {
            Self::Navigation
        } else if query.is_single_message_view() {
            Self::SingleMessage
        } else {
            Self::CustomSearch
        }
    }
}

/// One cached query result: the ordered message ids of the page, the
/// page bookkeeping, usage statistics, and the classification that
/// drives invalidation.
pub struct QueryEnvelope {
    key: String,
    total: u32,
    offset: u32,
    message_ids: Vec<MessageId>,
    file_ids: FxHashSet<FileId>,
    base_message_id: MessageId,
    kind: QueryKind,
    created_ms: u64,
    last_access_ms: u64,
    use_count: u64,
}

impl QueryEnvelope {
    /// Build an envelope for `query` over the page's messages.
    /// Creation counts as the first access.
    pub fn new(
        query: &SearchQuery,
        key: String,
        total: u32,
        offset: u32,
        messages: &[Message],
        now_ms: u64,
    ) -> Self {
        let message_ids: Vec<MessageId> = messages.iter().map(|m| m.id).collect();
        let file_ids: FxHashSet<FileId> = messages
            .iter()
            .flat_map(|m| m.attachments.iter().map(|f| f.file_id))
            .collect();
        Self {
            key,
            total,
            offset,
            message_ids,
            file_ids,
            base_message_id: query.base_message_id,
            kind: QueryKind::classify(query),
            created_ms: now_ms,
            last_access_ms: now_ms,
            use_count: 1,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Message ids in result order.
    pub fn message_ids(&self) -> &[MessageId] {
        &self.message_ids
    }

    pub fn message_count(&self) -> usize {
        self.message_ids.len()
    }

    pub fn kind(&self) -> QueryKind {
        self.kind
    }

    /// The message whose replies this query browses, or the unknown id.
    pub fn base_message_id(&self) -> MessageId {
        self.base_message_id
    }

    pub fn contains_message(&self, id: MessageId) -> bool {
        self.message_ids.contains(&id)
    }

    /// True if any listed message carries the attachment `file_id`.
    pub fn contains_file(&self, file_id: FileId) -> bool {
        self.file_ids.contains(&file_id)
    }

    pub fn use_count(&self) -> u64 {
        self.use_count
    }

    /// Record one use of the cached result.
    pub fn mark_access(&mut self, now_ms: u64) {
        self.last_access_ms = now_ms;
        self.use_count += 1;
    }

    /// The two-factor eviction test: an envelope is low priority only
    /// when it has been idle past the timeout AND its usage frequency
    /// (uses per hour since creation) is below the minimum. An idle but
    /// regularly used query survives; a one-off query does not stay
    /// warm just because it was touched once recently.
    pub fn is_low_priority(
        &self,
        now_ms: u64,
        idle_timeout_ms: u64,
        min_uses_per_hour: f64,
    ) -> bool {
        if now_ms.saturating_sub(self.last_access_ms) <= idle_timeout_ms {
            return false;
        }
        let elapsed_ms = now_ms.saturating_sub(self.created_ms);
        if elapsed_ms == 0 {
            return false;
        }
        let uses_per_hour = self.use_count as f64 / (elapsed_ms as f64 / 3_600_000.0);
        uses_per_hour < min_uses_per_hour
    }

    #[cfg(test)]
    pub(crate) fn set_timestamps(&mut self, created_ms: u64, last_access_ms: u64) {
        self.created_ms = created_ms;
        self.last_access_ms = last_access_ms;
    }
}
