//! Data records cached and served by the forum.

pub mod collections;
pub mod ids;
pub mod message;
pub mod page;
pub mod path;
pub mod user;
