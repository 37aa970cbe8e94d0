//! Short user-profile snapshot attached to forum messages.

use serde::{Deserialize, Serialize};

use super::ids::{UserId, UNKNOWN_USER_ID};

/// Login name shown for accounts that no longer exist.
pub const DELETED_USER_LOGIN_NAME: &str = "<Unknown>";

/// The short user-profile record referenced by cached messages as the
/// sender or the last replier. Snapshots are plain copies; the cache
/// keeps one interned slot per uid fresh and hands out clones of it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserSnapshot {
    pub uid: UserId,
    pub login_name: String,
    pub is_online: bool,
    pub is_male: bool,
    /// Unix millis; 0 when unknown.
    pub registered_at: i64,
    /// Unix millis; 0 when unknown.
    pub last_online_at: i64,
}

impl UserSnapshot {
    pub fn new(uid: UserId, login_name: impl Into<String>) -> Self {
        Self {
            uid,
            login_name: login_name.into(),
            ..Self::default()
        }
    }

    /// True if this snapshot belongs to a still-registered account.
    pub fn is_registered(&self) -> bool {
        self.uid != UNKNOWN_USER_ID && self.login_name != DELETED_USER_LOGIN_NAME
    }

    /// Copy all profile fields from `other` without changing identity.
    /// The uid is deliberately left alone.
    pub fn copy_from(&mut self, other: &UserSnapshot) {
        self.login_name = other.login_name.clone();
        self.is_online = other.is_online;
        self.is_male = other.is_male;
        self.registered_at = other.registered_at;
        self.last_online_at = other.last_online_at;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_from_preserves_uid() {
        let mut cached = UserSnapshot::new(7, "alice");
        let mut fresh = UserSnapshot::new(999, "alice2");
        fresh.is_online = true;

        cached.copy_from(&fresh);
        assert_eq!(cached.uid, 7);
        assert_eq!(cached.login_name, "alice2");
        assert!(cached.is_online);
    }
}
