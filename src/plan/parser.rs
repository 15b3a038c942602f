//! Artifact markup parsing from model output.
//!
//! Replies embed at most one honored artifact block:
//!
//! ```text
//! <boltArtifact id="todo-app" title="React Todo App">
//!   <boltAction type="file" filePath="src/App.tsx">...</boltAction>
//!   <boltAction type="shell">npm install</boltAction>
//! </boltArtifact>
//! ```
//!
//! The artifact title becomes a leading grouping step, each `file` action a
//! `CreateFile` step, each `shell` action a `RunCommand` step. Replies with
//! no artifact parse to an empty list — prose-only answers are legal.

use regex::Regex;
use std::sync::LazyLock;

use super::types::{Step, StepKind, StepStatus};

static ARTIFACT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<boltArtifact[^>]*>(.*?)</boltArtifact>").unwrap()
});

static TITLE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<boltArtifact[^>]*\btitle="([^"]*)""#).unwrap());

static ACTION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<boltAction\s+type="([^"]*)"(?:\s+filePath="([^"]*)")?\s*>(.*?)</boltAction>"#)
        .unwrap()
});

/// Parse the first artifact block of `response` into steps, numbering
/// them from 1.
pub fn parse_artifact(response: &str) -> Vec<Step> {
    parse_artifact_from(response, 1)
}

/// Parse the first artifact block of `response` into steps, numbering
/// them from `start_id`.
///
/// Later artifact blocks in the same reply are ignored, matching the
/// one-artifact-per-reply contract the system prompt imposes. Unknown
/// action types are skipped.
pub fn parse_artifact_from(response: &str, start_id: u32) -> Vec<Step> {
    let Some(artifact) = ARTIFACT_REGEX.captures(response) else {
        return Vec::new();
    };
    let body = artifact.get(1).map_or("", |m| m.as_str());

    let title = TITLE_REGEX
        .captures(response)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().trim())
        .filter(|t| !t.is_empty())
        .unwrap_or("Project Files");

    let mut next_id = start_id;
    let mut steps = vec![Step {
        id: next_id,
        title: title.to_string(),
        kind: StepKind::CreateFolder,
        status: StepStatus::Pending,
        path: None,
        code: None,
    }];
    next_id += 1;

    for cap in ACTION_REGEX.captures_iter(body) {
        let action_type = cap.get(1).map_or("", |m| m.as_str());
        let file_path = cap.get(2).map(|m| m.as_str());
        let content = cap.get(3).map_or("", |m| m.as_str()).trim();

        match action_type {
            "file" => {
                let title = match file_path {
                    Some(path) if !path.is_empty() => format!("Create {}", path),
                    _ => "Create file".to_string(),
                };
                steps.push(Step {
                    id: next_id,
                    title,
                    kind: StepKind::CreateFile,
                    status: StepStatus::Pending,
                    path: file_path.filter(|p| !p.is_empty()).map(str::to_string),
                    code: Some(content.to_string()),
                });
                next_id += 1;
            }
            "shell" => {
                steps.push(Step {
                    id: next_id,
                    title: "Run command".to_string(),
                    kind: StepKind::RunCommand,
                    status: StepStatus::Pending,
                    path: None,
                    code: Some(content.to_string()),
                });
                next_id += 1;
            }
            other => {
                tracing::debug!(action_type = other, "Skipping unknown artifact action");
            }
        }
    }

    steps
}

/// Return the reply with its artifact block removed, for display as prose.
pub fn strip_artifact(response: &str) -> String {
    ARTIFACT_REGEX.replace(response, "").trim().to_string()
}
