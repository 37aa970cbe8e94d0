//! Map from canonical query keys to cached result envelopes.

use agora_core::types::collections::FxHashMap;

use crate::envelope::QueryEnvelope;

/// Holds the cached envelopes. Admission and invalidation policy live
/// in the orchestrator; this store only answers key-level operations
/// and classification sweeps.
#[derive(Default)]
pub struct QueryResultStore {
    envelopes: FxHashMap<String, QueryEnvelope>,
}

impl QueryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the envelope for `key`, counting the access.
    pub fn lookup(&mut self, key: &str, now_ms: u64) -> Option<&QueryEnvelope> {
        let envelope = self.envelopes.get_mut(key)?;
        envelope.mark_access(now_ms);
        Some(&*envelope)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.envelopes.contains_key(key)
    }

    /// Register an envelope. First writer wins: if the key is already
    /// present the existing envelope is kept and `false` returned.
    pub fn insert(&mut self, envelope: QueryEnvelope) -> bool {
        if self.envelopes.contains_key(envelope.key()) {
            tracing::debug!(key = envelope.key(), "query already cached, keeping it");
            return false;
        }
        self.envelopes.insert(envelope.key().to_owned(), envelope);
        true
    }

    /// Remove and return the envelope for `key`. The caller is
    /// responsible for releasing the listed messages, so one release
    /// sweep can cover a whole batch of removed envelopes.
    pub fn remove(&mut self, key: &str) -> Option<QueryEnvelope> {
        self.envelopes.remove(key)
    }

    /// Keys of all envelopes matching `predicate`, for removal sweeps.
    pub fn keys_where<F>(&self, predicate: F) -> Vec<String>
    where
        F: Fn(&QueryEnvelope) -> bool,
    {
        self.envelopes
            .iter()
            .filter(|(_, envelope)| predicate(envelope))
            .map(|(key, _)| key.clone())
            .collect()
    }

    pub fn envelopes(&self) -> impl Iterator<Item = &QueryEnvelope> {
        self.envelopes.values()
    }

    pub fn len(&self) -> usize {
        self.envelopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.envelopes.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn envelope_mut(&mut self, key: &str) -> Option<&mut QueryEnvelope> {
        self.envelopes.get_mut(key)
    }
}
