use serde::{Deserialize, Serialize};

/// What a step does when applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// Create or overwrite one file in the tree.
    CreateFile,
    /// Grouping step carrying the artifact title; applies nothing itself.
    CreateFolder,
    /// Shell command suggested by the model. Displayed, never auto-run.
    RunCommand,
}

/// Lifecycle of a step as the driver applies it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

/// One discrete unit of work parsed out of a model reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub id: u32,
    pub title: String,
    pub kind: StepKind,
    pub status: StepStatus,
    /// Target path for `CreateFile` steps, forward-slash separated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// File contents or shell command text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl Step {
    pub fn is_pending_file(&self) -> bool {
        self.status == StepStatus::Pending && self.kind == StepKind::CreateFile
    }
}
