//! In-memory project workspace.
//!
//! The workspace is a hierarchical tree of named file and folder nodes,
//! addressed by forward-slash paths. Plan steps and direct user edits both
//! mutate it; the sandbox mounts it to disk.

mod tree;

pub use tree::{ApplyOutcome, FileNode, FileTree};
