//! Arbor: live in-memory mirror of a directory tree
//!
//! Maintains a tree of file and folder nodes mirroring a directory subtree,
//! reconciling in-memory children against live storage listings and enforcing
//! that every node's logical parent matches its physical containing directory.

pub mod error;
pub mod events;
pub mod factory;
pub mod storage;
pub mod tree;
pub mod types;
