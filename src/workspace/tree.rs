use std::path::Path;

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::errors::WorkspaceError;
use crate::plan::{Step, StepStatus};

/// One node of the project tree. Node names never contain `/`; `path` is
/// the full forward-slash address from the tree root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FileNode {
    File {
        name: String,
        path: String,
        content: String,
    },
    Folder {
        name: String,
        path: String,
        children: Vec<FileNode>,
    },
}

impl FileNode {
    pub fn name(&self) -> &str {
        match self {
            FileNode::File { name, .. } | FileNode::Folder { name, .. } => name,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            FileNode::File { path, .. } | FileNode::Folder { path, .. } => path,
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, FileNode::File { .. })
    }
}

/// Result of applying a batch of plan steps to the tree.
#[derive(Debug, Default)]
pub struct ApplyOutcome {
    pub completed: Vec<u32>,
    pub failed: Vec<(u32, WorkspaceError)>,
}

/// Hierarchical file tree with create-or-update-by-path semantics.
///
/// Insertion order is preserved; nothing is sorted. Applying the same step
/// twice is idempotent (the second apply overwrites with identical
/// content).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileTree {
    roots: Vec<FileNode>,
}

/// Directories never imported from disk.
const IMPORT_SKIP_DIRS: &[&str] = &["node_modules", ".git", "dist"];

fn split_path(path: &str) -> Result<Vec<&str>, WorkspaceError> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return Err(WorkspaceError::EmptyPath);
    }
    Ok(segments)
}

impl FileTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn roots(&self) -> &[FileNode] {
        &self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Create the file at `path`, or overwrite its content if it already
    /// exists. Folders along the path are created as needed. A mid-path
    /// segment that exists as a file is a structural conflict.
    pub fn upsert_file(&mut self, path: &str, content: &str) -> Result<(), WorkspaceError> {
        let segments = split_path(path)?;
        Self::upsert_into(&mut self.roots, &segments, "", content)
    }

    fn upsert_into(
        nodes: &mut Vec<FileNode>,
        segments: &[&str],
        prefix: &str,
        content: &str,
    ) -> Result<(), WorkspaceError> {
        let segment = segments[0];
        let walked = if prefix.is_empty() {
            segment.to_string()
        } else {
            format!("{}/{}", prefix, segment)
        };
        let position = nodes.iter().position(|n| n.name() == segment);

        if segments.len() == 1 {
            return match position {
                Some(i) => match &mut nodes[i] {
                    FileNode::File { content: existing, .. } => {
                        *existing = content.to_string();
                        Ok(())
                    }
                    FileNode::Folder { .. } => Err(WorkspaceError::NotAFile { path: walked }),
                },
                None => {
                    nodes.push(FileNode::File {
                        name: segment.to_string(),
                        path: walked,
                        content: content.to_string(),
                    });
                    Ok(())
                }
            };
        }

        let i = match position {
            Some(i) => {
                if nodes[i].is_file() {
                    return Err(WorkspaceError::NotAFolder { path: walked });
                }
                i
            }
            None => {
                nodes.push(FileNode::Folder {
                    name: segment.to_string(),
                    path: walked.clone(),
                    children: Vec::new(),
                });
                nodes.len() - 1
            }
        };

        match &mut nodes[i] {
            FileNode::Folder { children, .. } => {
                Self::upsert_into(children, &segments[1..], &walked, content)
            }
            FileNode::File { .. } => unreachable!("file case handled above"),
        }
    }

    /// Overwrite the content of an existing file (direct user edit).
    pub fn update_content(&mut self, path: &str, content: &str) -> Result<(), WorkspaceError> {
        match Self::find_in(&mut self.roots, path) {
            Some(FileNode::File { content: existing, .. }) => {
                *existing = content.to_string();
                Ok(())
            }
            Some(FileNode::Folder { .. }) => Err(WorkspaceError::NotAFile {
                path: path.to_string(),
            }),
            None => Err(WorkspaceError::NotFound {
                path: path.to_string(),
            }),
        }
    }

    /// Remove the node at `path` (file or folder, anywhere in the tree).
    /// Returns whether anything was removed.
    pub fn remove(&mut self, path: &str) -> bool {
        Self::remove_in(&mut self.roots, path)
    }

    fn remove_in(nodes: &mut Vec<FileNode>, path: &str) -> bool {
        if let Some(i) = nodes.iter().position(|n| n.path() == path) {
            nodes.remove(i);
            return true;
        }
        for node in nodes.iter_mut() {
            if let FileNode::Folder { children, .. } = node
                && Self::remove_in(children, path)
            {
                return true;
            }
        }
        false
    }

    /// Path-addressed lookup of any node.
    pub fn find(&self, path: &str) -> Option<&FileNode> {
        Self::find_ref_in(&self.roots, path)
    }

    /// Content of the file at `path`, if it exists and is a file.
    pub fn find_file(&self, path: &str) -> Option<&str> {
        match self.find(path) {
            Some(FileNode::File { content, .. }) => Some(content),
            _ => None,
        }
    }

    fn find_ref_in<'a>(nodes: &'a [FileNode], path: &str) -> Option<&'a FileNode> {
        for node in nodes {
            if node.path() == path {
                return Some(node);
            }
            if let FileNode::Folder { children, .. } = node
                && let Some(found) = Self::find_ref_in(children, path)
            {
                return Some(found);
            }
        }
        None
    }

    fn find_in<'a>(nodes: &'a mut [FileNode], path: &str) -> Option<&'a mut FileNode> {
        for node in nodes {
            if node.path() == path {
                return Some(node);
            }
            if let FileNode::Folder { children, .. } = node
                && let Some(found) = Self::find_in(children, path)
            {
                return Some(found);
            }
        }
        None
    }

    /// Flattened `(path, content)` pairs for every file, in tree order.
    pub fn files(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        Self::collect_files(&self.roots, &mut out);
        out
    }

    fn collect_files(nodes: &[FileNode], out: &mut Vec<(String, String)>) {
        for node in nodes {
            match node {
                FileNode::File { path, content, .. } => {
                    out.push((path.clone(), content.clone()));
                }
                FileNode::Folder { children, .. } => Self::collect_files(children, out),
            }
        }
    }

    pub fn file_count(&self) -> usize {
        self.files().len()
    }

    /// Merge every pending `CreateFile` step into the tree. Steps are
    /// mutated in place: applied ones flip to `Completed`, structural
    /// conflicts flip to `Failed` without aborting the batch. Other step
    /// kinds and non-pending steps are untouched, so concurrent user edits
    /// to unrelated paths survive.
    pub fn apply(&mut self, steps: &mut [Step]) -> ApplyOutcome {
        let mut outcome = ApplyOutcome::default();

        for step in steps.iter_mut().filter(|s| s.is_pending_file()) {
            let Some(path) = step.path.clone() else {
                continue;
            };
            let code = step.code.clone().unwrap_or_default();
            match self.upsert_file(&path, &code) {
                Ok(()) => {
                    step.status = StepStatus::Completed;
                    outcome.completed.push(step.id);
                }
                Err(err) => {
                    tracing::warn!(path = %path, error = %err, "Step could not be applied");
                    step.status = StepStatus::Failed;
                    outcome.failed.push((step.id, err));
                }
            }
        }

        outcome
    }

    /// Load a tree from a directory on disk. Dependency and VCS
    /// directories are skipped; non-UTF-8 files are skipped with a warning.
    pub fn from_dir(dir: &Path) -> Result<Self, WorkspaceError> {
        let mut tree = Self::new();

        let walker = WalkDir::new(dir).into_iter().filter_entry(|entry| {
            entry
                .file_name()
                .to_str()
                .map(|name| !IMPORT_SKIP_DIRS.contains(&name))
                .unwrap_or(true)
        });

        for entry in walker {
            let entry = entry.map_err(|e| WorkspaceError::ReadFailed {
                path: dir.to_path_buf(),
                source: std::io::Error::other(e),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = entry
                .path()
                .strip_prefix(dir)
                .unwrap_or(entry.path())
                .to_string_lossy()
                .replace('\\', "/");
            match std::fs::read_to_string(entry.path()) {
                Ok(content) => tree.upsert_file(&rel, &content)?,
                Err(err) => {
                    tracing::warn!(path = %entry.path().display(), error = %err, "Skipping unreadable file");
                }
            }
        }

        Ok(tree)
    }

    /// Mount the tree into a directory on disk, creating folders along the
    /// way. Existing files at the same paths are overwritten; files not in
    /// the tree are left alone.
    pub fn write_to(&self, dir: &Path) -> Result<(), WorkspaceError> {
        std::fs::create_dir_all(dir).map_err(|source| WorkspaceError::WriteFailed {
            path: dir.to_path_buf(),
            source,
        })?;

        for (path, content) in self.files() {
            let target = dir.join(&path);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent).map_err(|source| WorkspaceError::WriteFailed {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            std::fs::write(&target, content).map_err(|source| WorkspaceError::WriteFailed {
                path: target.clone(),
                source,
            })?;
        }

        Ok(())
    }
}
