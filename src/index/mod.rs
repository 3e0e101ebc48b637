//! Ordered Key Index
//!
//! In-order container for cache entries.
//!
//! ## Responsibilities
//! - Insert, search, delete by probe value
//! - Predicate-driven bulk deletion for the eviction sweep
//! - In-order traversal (ascending keys)
//! - Exact cached length
//!
//! ## Data Structure Choice
//! A plain unbalanced binary search tree of owned nodes. Entries are ordered
//! by key alone, so lookups take a probe value carrying just the key. The
//! node layout is private; callers only see the operation contract.

mod tree;

pub use tree::Bst;
