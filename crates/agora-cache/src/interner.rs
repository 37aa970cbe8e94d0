//! Reference-counted interning of short user snapshots.
//!
//! A message's sender and last replier are deduplicated here so a user
//! appearing in many cached messages occupies one slot. The slot is
//! refreshed (copied onto) whenever a newer snapshot arrives, so every
//! resolution observes the latest profile data.

use agora_core::types::collections::FxHashMap;
use agora_core::types::ids::{UserId, UNKNOWN_USER_ID};
use agora_core::types::user::UserSnapshot;

struct UserSlot {
    refs: u32,
    user: UserSnapshot,
}

/// Deduplicates user snapshots by uid, reference-counted by the number
/// of pooled messages that point at each slot.
#[derive(Default)]
pub struct UserInterner {
    slots: FxHashMap<UserId, UserSlot>,
}

impl UserInterner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `user`: refresh an existing slot and take one more
    /// reference on it, or create a new slot with one reference.
    /// Sentinel uids are rejected with a log line.
    pub fn intern(&mut self, user: &UserSnapshot) {
        if user.uid == UNKNOWN_USER_ID {
            tracing::warn!("refusing to intern a snapshot with an unknown uid");
            return;
        }
        match self.slots.get_mut(&user.uid) {
            Some(slot) => {
                slot.user.copy_from(user);
                slot.refs += 1;
                tracing::debug!(uid = user.uid, refs = slot.refs, "user slot re-referenced");
            }
            None => {
                tracing::debug!(uid = user.uid, "interning new user slot");
                self.slots.insert(
                    user.uid,
                    UserSlot {
                        refs: 1,
                        user: user.clone(),
                    },
                );
            }
        }
    }

    /// Give back one reference; the slot is removed when none remain.
    /// Releasing a uid that is not interned is an anomaly, logged and
    /// ignored.
    pub fn release(&mut self, uid: UserId) {
        let Some(slot) = self.slots.get_mut(&uid) else {
            tracing::warn!(uid, "releasing a user snapshot that is not interned");
            return;
        };
        slot.refs = slot.refs.saturating_sub(1);
        tracing::debug!(uid, refs = slot.refs, "user slot released");
        if slot.refs == 0 {
            self.slots.remove(&uid);
        }
    }

    /// Copy fresher profile fields onto an existing slot without taking
    /// a new reference. No-op with a warning if the uid is not interned.
    pub fn refresh(&mut self, user: &UserSnapshot) {
        match self.slots.get_mut(&user.uid) {
            Some(slot) => slot.user.copy_from(user),
            None => tracing::warn!(uid = user.uid, "no interned snapshot to refresh"),
        }
    }

    /// Snapshot of the interned record for `uid`.
    pub fn get(&self, uid: UserId) -> Option<UserSnapshot> {
        self.slots.get(&uid).map(|slot| slot.user.clone())
    }

    pub fn ref_count(&self, uid: UserId) -> Option<u32> {
        self.slots.get(&uid).map(|slot| slot.refs)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
