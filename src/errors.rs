//! Typed error hierarchy for sitesmith.
//!
//! Three top-level enums cover the three subsystems:
//! - `GenAiError` — provider calls and response handling
//! - `WorkspaceError` — file-tree path resolution and mutation failures
//! - `SandboxError` — preview mount and process lifecycle failures

use thiserror::Error;

/// Errors from the GenAI provider client.
#[derive(Debug, Error)]
pub enum GenAiError {
    #[error("Model still overloaded after {attempts} attempts")]
    Overloaded { attempts: u32 },

    #[error("Provider returned status {status}: {body}")]
    BadStatus { status: u16, body: String },

    #[error("Provider response contained no candidate text")]
    EmptyResponse,

    #[error("Failed to reach provider: {0}")]
    Transport(#[from] reqwest::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Errors from the in-memory file tree.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("Path is empty")]
    EmptyPath,

    #[error("Path component '{path}' is a file, not a folder")]
    NotAFolder { path: String },

    #[error("'{path}' exists as a folder and cannot hold file content")]
    NotAFile { path: String },

    #[error("No file at '{path}'")]
    NotFound { path: String },

    #[error("Failed to read {path}: {source}")]
    ReadFailed {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    WriteFailed {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from the preview sandbox.
#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("Failed to spawn '{command}': {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Install command exited with code {code:?}")]
    InstallFailed { code: Option<i32> },

    #[error("Dev server exited before reporting a ready URL")]
    ServerExited,

    #[error("No ready URL within {secs}s")]
    ReadyTimeout { secs: u64 },

    #[error("Workspace error: {0}")]
    Workspace(#[from] WorkspaceError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genai_overloaded_carries_attempts() {
        let err = GenAiError::Overloaded { attempts: 5 };
        match &err {
            GenAiError::Overloaded { attempts } => assert_eq!(*attempts, 5),
            _ => panic!("Expected Overloaded"),
        }
        assert!(err.to_string().contains('5'));
    }

    #[test]
    fn genai_bad_status_mentions_status_and_body() {
        let err = GenAiError::BadStatus {
            status: 429,
            body: "quota exceeded".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("429"));
        assert!(msg.contains("quota exceeded"));
    }

    #[test]
    fn workspace_not_a_folder_carries_path() {
        let err = WorkspaceError::NotAFolder {
            path: "src/main.tsx".to_string(),
        };
        match &err {
            WorkspaceError::NotAFolder { path } => assert_eq!(path, "src/main.tsx"),
            _ => panic!("Expected NotAFolder"),
        }
    }

    #[test]
    fn workspace_variants_are_distinct() {
        let missing = WorkspaceError::NotFound {
            path: "a".to_string(),
        };
        let folder = WorkspaceError::NotAFile {
            path: "a".to_string(),
        };
        assert!(matches!(missing, WorkspaceError::NotFound { .. }));
        assert!(!matches!(missing, WorkspaceError::NotAFile { .. }));
        assert!(matches!(folder, WorkspaceError::NotAFile { .. }));
    }

    #[test]
    fn sandbox_error_converts_from_workspace_error() {
        let inner = WorkspaceError::EmptyPath;
        let err: SandboxError = inner.into();
        assert!(matches!(
            err,
            SandboxError::Workspace(WorkspaceError::EmptyPath)
        ));
    }

    #[test]
    fn sandbox_spawn_failed_is_matchable() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "npm not found");
        let err = SandboxError::SpawnFailed {
            command: "npm install".to_string(),
            source: io_err,
        };
        match &err {
            SandboxError::SpawnFailed { command, source } => {
                assert_eq!(command, "npm install");
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            _ => panic!("Expected SpawnFailed"),
        }
    }

    #[test]
    fn all_error_types_implement_std_error_trait() {
        fn assert_std_error<E: std::error::Error>(_: &E) {}
        assert_std_error(&GenAiError::EmptyResponse);
        assert_std_error(&WorkspaceError::EmptyPath);
        assert_std_error(&SandboxError::ServerExited);
    }
}
