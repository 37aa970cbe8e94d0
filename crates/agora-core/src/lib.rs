//! # agora-core
//!
//! Foundation crate for the agora forum server.
//! Defines the plain data records exchanged with the storage and RPC
//! layers, the structured search descriptor and its canonical cache
//! key, configuration, errors, and tracing setup.
//! The caching subsystem in `agora-cache` depends on this.

pub mod config;
pub mod errors;
pub mod search;
pub mod trace;
pub mod types;

// Re-export the most commonly used types at the crate root.
pub use config::CacheConfig;
pub use errors::ConfigError;
pub use search::SearchQuery;
pub use types::collections::{FxHashMap, FxHashSet};
pub use types::ids::{FileId, MessageId, UserId};
pub use types::message::{FileRef, Message};
pub use types::page::ResultPage;
pub use types::path::MessagePath;
pub use types::user::UserSnapshot;
