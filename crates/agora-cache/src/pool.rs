//! The reference-counted message pool.
//!
//! Every message listed by any cached query lives here exactly once,
//! keyed by id. The reference count tracks how many cached query
//! envelopes currently list the message. Acquiring an id that is
//! already pooled is a re-registration: the new payload is spliced into
//! the existing slot so the message keeps a single logical identity
//! across, say, a news-feed query and a navigation query, while readers
//! always see the freshest content.

use agora_core::types::collections::FxHashMap;
use agora_core::types::ids::{MessageId, UserId};
use agora_core::types::message::Message;

use crate::interner::UserInterner;

struct PooledMessage {
    refs: u32,
    message: Message,
}

/// Deduplicates full message records by id and owns the user-snapshot
/// interner for their senders and last repliers.
#[derive(Default)]
pub struct MessagePool {
    users: UserInterner,
    messages: FxHashMap<MessageId, PooledMessage>,
}

impl MessagePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take one query reference on `message`, pooling it on first
    /// contact and splicing the new payload in on re-registration.
    pub fn acquire(&mut self, mut message: Message) {
        // The has-voted flag is a per-viewer annotation; the pooled
        // copy stays neutral and readers get it re-annotated.
        message.has_voted = false;

        if let Some(slot) = self.messages.get_mut(&message.id) {
            if slot.message.id != message.id {
                tracing::error!(
                    pooled = slot.message.id,
                    incoming = message.id,
                    "re-registration with a mismatched message id, keeping the cached copy"
                );
                return;
            }
            tracing::debug!(message_id = message.id, "re-registering pooled message");

            // The old payload's last-replier reference is given back;
            // the sender slot is refreshed in place without taking a
            // new reference, since the identity does not change.
            if slot.message.reply_count > 0 {
                if let Some(replier) = &slot.message.last_replier {
                    self.users.release(replier.uid);
                }
            }
            if let Some(sender) = message.sender.take() {
                self.users.refresh(&sender);
                message.sender = self.users.get(sender.uid).or(Some(sender));
            }
            if message.reply_count > 0 {
                if let Some(replier) = message.last_replier.take() {
                    self.users.intern(&replier);
                    message.last_replier = self.users.get(replier.uid).or(Some(replier));
                }
            }

            slot.message = message;
            slot.refs += 1;
            tracing::debug!(
                message_id = slot.message.id,
                refs = slot.refs,
                "message reference count incremented"
            );
        } else {
            tracing::debug!(message_id = message.id, "pooling new message");
            if let Some(sender) = message.sender.take() {
                self.users.intern(&sender);
                message.sender = self.users.get(sender.uid).or(Some(sender));
            } else {
                tracing::warn!(message_id = message.id, "message has no sender snapshot");
            }
            if message.reply_count > 0 {
                if let Some(replier) = message.last_replier.take() {
                    self.users.intern(&replier);
                    message.last_replier = self.users.get(replier.uid).or(Some(replier));
                }
            }
            self.messages
                .insert(message.id, PooledMessage { refs: 1, message });
        }
    }

    /// Give back one query reference. When none remain the message is
    /// removed, its user references released, and `true` is returned so
    /// the caller can forget the voter state. Underflow is clamped to
    /// zero with an error log; a missing id is an anomaly.
    pub fn release(&mut self, id: MessageId) -> bool {
        let Some(slot) = self.messages.get_mut(&id) else {
            tracing::error!(message_id = id, "expected message in the pool, but it is absent");
            return false;
        };
        if slot.refs == 0 {
            tracing::error!(message_id = id, "message reference count underflow, clamping");
        } else {
            slot.refs -= 1;
        }
        tracing::debug!(message_id = id, refs = slot.refs, "message reference count decremented");
        if slot.refs > 0 {
            return false;
        }

        if let Some(slot) = self.messages.remove(&id) {
            if let Some(sender) = &slot.message.sender {
                self.users.release(sender.uid);
            }
            if slot.message.reply_count > 0 {
                if let Some(replier) = &slot.message.last_replier {
                    self.users.release(replier.uid);
                }
            }
        }
        true
    }

    /// Snapshot of the pooled message.
    pub fn get(&self, id: MessageId) -> Option<Message> {
        self.messages.get(&id).map(|slot| slot.message.clone())
    }

    /// In-place access for vote totals and approval flips.
    pub(crate) fn message_mut(&mut self, id: MessageId) -> Option<&mut Message> {
        self.messages.get_mut(&id).map(|slot| &mut slot.message)
    }

    pub fn contains(&self, id: MessageId) -> bool {
        self.messages.contains_key(&id)
    }

    pub fn ref_count(&self, id: MessageId) -> Option<u32> {
        self.messages.get(&id).map(|slot| slot.refs)
    }

    /// Number of distinct pooled messages; this is what the cache
    /// capacity is expressed in.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn user_ref_count(&self, uid: UserId) -> Option<u32> {
        self.users.ref_count(uid)
    }
}
