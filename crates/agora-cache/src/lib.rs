//! # agora-cache
//!
//! In-process cache for forum search queries and the messages they
//! list. Query results are stored as envelopes of message ids; the
//! messages themselves live once in a reference-counted pool, which in
//! turn interns the short user snapshots for senders and last
//! repliers. Mutation events (post, edit, move, approve, delete, file
//! removal) invalidate the affected envelopes by classification;
//! capacity pressure evicts idle, rarely-used queries.
//!
//! The cache is advisory: every failure mode degrades to a miss and the
//! caller falls through to the source of truth.

pub mod cache;
pub mod envelope;
pub mod interner;
pub mod pool;
pub mod store;
pub mod voters;

mod clock;

pub use cache::{CacheStats, ForumCache};
pub use envelope::{QueryEnvelope, QueryKind};
pub use interner::UserInterner;
pub use pool::MessagePool;
pub use store::QueryResultStore;
pub use voters::VoterRegistry;
