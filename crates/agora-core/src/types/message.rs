//! The forum message record, as produced by the search executor and
//! cached by `agora-cache`.

use serde::{Deserialize, Serialize};

use super::ids::{FileId, MessageId, UserId, UNKNOWN_MESSAGE_ID, UNKNOWN_USER_ID};
use super::path::MessagePath;
use super::user::UserSnapshot;

/// Descriptor of a file attached to a message. Attachments are kept in
/// upload order so the paged attachment viewer can index into the list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileRef {
    pub file_id: FileId,
    pub file_name: String,
}

impl FileRef {
    pub fn new(file_id: FileId, file_name: impl Into<String>) -> Self {
        Self {
            file_id,
            file_name: file_name.into(),
        }
    }
}

/// A full forum message as retrieved from the database, including the
/// reply metadata and the sender / last-replier profile snapshots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub parent_id: MessageId,
    pub sender_id: UserId,
    pub title: String,
    pub body: String,
    /// Ancestor chain from the forum root to the nearest parent.
    pub path: MessagePath,
    /// Set when an administrator approved the message for the news feed.
    pub approved: bool,
    /// Per-viewer annotation: whether the requesting user already voted.
    pub has_voted: bool,
    /// Number of votes cast for or against this message.
    pub vote_count: u32,
    /// Sum of the up-votes.
    pub vote_score: u32,
    pub attachments: Vec<FileRef>,
    /// Unix millis.
    pub sent_at: i64,
    /// Unix millis; 0 when never edited.
    pub updated_at: i64,
    pub sender: Option<UserSnapshot>,
    /// Replies in the whole subtree rooted at this message.
    pub reply_count: u32,
    /// Unix millis of the newest reply in the subtree; 0 when none.
    pub last_reply_at: i64,
    /// Meaningful only when `reply_count > 0`.
    pub last_replier: Option<UserSnapshot>,
}

impl Message {
    pub fn new(id: MessageId, parent_id: MessageId, sender_id: UserId) -> Self {
        Self {
            id,
            parent_id,
            sender_id,
            ..Self::default()
        }
    }

    /// True when the subtree has replies and the last replier is a
    /// still-registered account.
    pub fn has_registered_last_replier(&self) -> bool {
        self.reply_count > 0
            && self
                .last_replier
                .as_ref()
                .is_some_and(UserSnapshot::is_registered)
    }

    /// Id of the message plus its ancestor chain, for invalidation
    /// sweeps that target the message itself as well as its parents.
    pub fn self_and_ancestors(&self) -> Vec<MessageId> {
        let mut ids: Vec<MessageId> = self.path.ids().to_vec();
        ids.push(self.id);
        ids
    }
}

impl Message {
    /// A placeholder record, useful in tests and for defensive lookups.
    pub fn unknown() -> Self {
        Self::new(UNKNOWN_MESSAGE_ID, UNKNOWN_MESSAGE_ID, UNKNOWN_USER_ID)
    }
}
