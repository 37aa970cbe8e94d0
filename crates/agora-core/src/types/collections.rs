//! Hash collections used on hot paths throughout the workspace.

pub use rustc_hash::{FxHashMap, FxHashSet};
