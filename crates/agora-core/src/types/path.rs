//! Message path — the ancestor chain of a forum message.
//!
//! Rendered as the dot-delimited id chain from the forum root down to
//! the nearest parent, e.g. `"1.5.10."` for a message whose parents are
//! the root (1), a section (5), and a topic (10).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;

use super::ids::{MessageId, ROOT_MESSAGE_ID};

/// Delimiter between ids in the rendered path.
pub const PATH_DELIMITER: char = '.';

/// Ordered ancestor ids of a message, root first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessagePath(SmallVec<[MessageId; 8]>);

impl MessagePath {
    /// Build a path from explicit ancestor ids, root first.
    pub fn from_ids<I: IntoIterator<Item = MessageId>>(ids: I) -> Self {
        Self(ids.into_iter().collect())
    }

    /// The ancestor ids, root first.
    pub fn ids(&self) -> &[MessageId] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of ancestors, i.e. the nesting depth of the message.
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// The path of a direct child of this path's message.
    pub fn child(&self, id: MessageId) -> Self {
        let mut ids = self.0.clone();
        ids.push(id);
        Self(ids)
    }

    /// True for a forum-section message: its only parent is the root.
    pub fn is_section(&self) -> bool {
        self.0.as_slice() == [ROOT_MESSAGE_ID]
    }

    /// True for a topic message: the first level inside a section.
    pub fn is_topic(&self) -> bool {
        self.0.len() == 2 && self.0[0] == ROOT_MESSAGE_ID
    }
}

impl fmt::Display for MessagePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for id in &self.0 {
            write!(f, "{id}{PATH_DELIMITER}")?;
        }
        Ok(())
    }
}

impl FromStr for MessagePath {
    type Err = std::convert::Infallible;

    /// Parses a dot-delimited path. Segments that are not valid ids are
    /// skipped rather than failing the whole path.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(
            s.split(PATH_DELIMITER)
                .filter(|seg| !seg.is_empty())
                .filter_map(|seg| seg.parse::<MessageId>().ok())
                .collect(),
        ))
    }
}

impl Serialize for MessagePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MessagePath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(s.parse().unwrap_or_default())
    }
}
