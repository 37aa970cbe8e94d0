//! Per-message record of the users who have already voted.

use agora_core::types::collections::{FxHashMap, FxHashSet};
use agora_core::types::ids::{is_registered_user, MessageId, UserId};

/// Tracks which registered users voted for which message. Not
/// reference-counted; the orchestrator forgets a message's voters when
/// the message leaves the pool.
#[derive(Default)]
pub struct VoterRegistry {
    voters: FxHashMap<MessageId, FxHashSet<UserId>>,
}

impl VoterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark that `user_id` voted for `message_id`. Idempotent; votes
    /// by sentinel ids (unknown session, guest account) are not
    /// tracked.
    pub fn mark_voted(&mut self, message_id: MessageId, user_id: UserId) {
        if !is_registered_user(user_id) {
            tracing::debug!(message_id, user_id, "ignoring vote mark for sentinel uid");
            return;
        }
        self.voters.entry(message_id).or_default().insert(user_id);
    }

    pub fn has_voted(&self, message_id: MessageId, user_id: UserId) -> bool {
        self.voters
            .get(&message_id)
            .is_some_and(|set| set.contains(&user_id))
    }

    /// Drop all voter state for a message.
    pub fn forget(&mut self, message_id: MessageId) {
        self.voters.remove(&message_id);
    }

    /// Number of messages with tracked voters.
    pub fn len(&self) -> usize {
        self.voters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voters.is_empty()
    }

    /// Number of distinct voters recorded for a message.
    pub fn voter_count(&self, message_id: MessageId) -> usize {
        self.voters.get(&message_id).map_or(0, FxHashSet::len)
    }
}
