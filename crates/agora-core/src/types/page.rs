//! One page of paginated server data.

use serde::{Deserialize, Serialize};

/// A single page view of a larger result set, as computed by the search
/// executor and handed to the rendering layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultPage<T> {
    /// The entries shown on this page.
    pub entries: Vec<T>,
    /// The total number of matching entries in the database. Not every
    /// query path fills this in, so treat it as advisory.
    pub total: u32,
    /// The page starts at entry `offset + 1` of the full result set.
    pub offset: u32,
}

impl<T> ResultPage<T> {
    pub fn new(entries: Vec<T>, total: u32, offset: u32) -> Self {
        Self {
            entries,
            total,
            offset,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
