//! Chat/plan driver.
//!
//! ## Overview
//!
//! A [`ProjectSession`] owns one conversation with the model and the
//! project state derived from it:
//!
//! ```text
//! prompt ──> resolve_template() ──> seed steps from base template
//!                │
//!                v
//!         chat turn (hidden context + prompt)
//!                │
//!                v
//!         parse_artifact_from() ──> append steps ──> tree.apply()
//!                │                                       │
//!                └── assistant prose              step status events
//! ```
//!
//! Every mutation that changes step status or tree content publishes a
//! [`SessionEvent`] on a broadcast channel, so a UI can reflect per-step
//! completion live while further chat turns keep appending steps.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::errors::{GenAiError, WorkspaceError};
use crate::genai::{self, ChatMessage, TemplateResponse, TextModel, prompts};
use crate::plan::{self, Step, StepKind, StepStatus};
use crate::workspace::FileTree;

/// Capacity of the session event channel. Slow consumers lag rather than
/// block the driver.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// What just happened inside the session.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    StepsAdded(Vec<Step>),
    StepCompleted { id: u32, title: String },
    StepFailed { id: u32, title: String, reason: String },
    FilesChanged { file_count: usize },
}

/// Errors surfaced by driver operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Could not pick a project template for this prompt")]
    NoTemplate,

    #[error(transparent)]
    GenAi(#[from] GenAiError),
}

/// One live project conversation: message history, ordered steps, and the
/// file tree they build up.
pub struct ProjectSession {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    model: Arc<dyn TextModel>,
    messages: Vec<ChatMessage>,
    steps: Vec<Step>,
    tree: FileTree,
    next_step_id: u32,
    events: broadcast::Sender<SessionEvent>,
}

impl ProjectSession {
    pub fn new(model: Arc<dyn TextModel>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            model,
            messages: Vec::new(),
            steps: Vec::new(),
            tree: FileTree::new(),
            next_step_id: 1,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn tree(&self) -> &FileTree {
        &self.tree
    }

    /// Start the project: resolve the template for `prompt`, seed the
    /// step list from its artifact, then run the opening chat turn with
    /// the template's hidden context messages. Returns the assistant's
    /// prose (artifact markup stripped).
    pub async fn bootstrap(&mut self, prompt: &str) -> Result<String, SessionError> {
        tracing::info!(session = %self.id, created_at = %self.created_at, "Bootstrapping project");
        let template = genai::resolve_template(self.model.as_ref(), prompt)
            .await?
            .ok_or(SessionError::NoTemplate)?;

        self.seed_from_template(&template);

        for context in &template.prompts {
            self.messages.push(ChatMessage::user(context));
        }
        self.messages.push(ChatMessage::user(prompt));

        self.run_chat_turn().await
    }

    /// Append a follow-up user prompt, run one chat turn, merge any new
    /// steps, and return the assistant's prose.
    pub async fn send(&mut self, prompt: &str) -> Result<String, SessionError> {
        self.messages.push(ChatMessage::user(prompt));
        self.run_chat_turn().await
    }

    async fn run_chat_turn(&mut self) -> Result<String, SessionError> {
        let reply = self
            .model
            .generate(prompts::SYSTEM_PROMPT, &self.messages, 0.2)
            .await?;

        let new_steps = plan::parse_artifact_from(&reply, self.next_step_id);
        if !new_steps.is_empty() {
            self.next_step_id = new_steps.last().map(|s| s.id + 1).unwrap_or(self.next_step_id);
            self.events
                .send(SessionEvent::StepsAdded(new_steps.clone()))
                .ok();
            self.steps.extend(new_steps);
        }

        self.messages.push(ChatMessage::assistant(&reply));
        self.apply_pending();

        Ok(plan::strip_artifact(&reply))
    }

    fn seed_from_template(&mut self, template: &TemplateResponse) {
        let Some(markup) = template.ui_prompts.first() else {
            return;
        };
        let seeded = plan::parse_artifact_from(markup, self.next_step_id);
        if seeded.is_empty() {
            return;
        }
        self.next_step_id = seeded.last().map(|s| s.id + 1).unwrap_or(self.next_step_id);
        self.events.send(SessionEvent::StepsAdded(seeded.clone())).ok();
        self.steps.extend(seeded);
        self.apply_pending();
    }

    /// Merge pending file steps into the tree and flip their status.
    /// Grouping steps complete immediately; shell steps stay pending —
    /// they are display-only, the sandbox owns the npm lifecycle.
    pub fn apply_pending(&mut self) {
        for step in self
            .steps
            .iter_mut()
            .filter(|s| s.status == StepStatus::Pending && s.kind == StepKind::CreateFolder)
        {
            step.status = StepStatus::Completed;
            self.events
                .send(SessionEvent::StepCompleted {
                    id: step.id,
                    title: step.title.clone(),
                })
                .ok();
        }

        let outcome = self.tree.apply(&mut self.steps);
        if outcome.completed.is_empty() && outcome.failed.is_empty() {
            return;
        }

        for id in &outcome.completed {
            if let Some(step) = self.steps.iter().find(|s| s.id == *id) {
                self.events
                    .send(SessionEvent::StepCompleted {
                        id: *id,
                        title: step.title.clone(),
                    })
                    .ok();
            }
        }
        for (id, err) in &outcome.failed {
            if let Some(step) = self.steps.iter().find(|s| s.id == *id) {
                self.events
                    .send(SessionEvent::StepFailed {
                        id: *id,
                        title: step.title.clone(),
                        reason: err.to_string(),
                    })
                    .ok();
            }
        }

        self.events
            .send(SessionEvent::FilesChanged {
                file_count: self.tree.file_count(),
            })
            .ok();
    }

    // ── Direct user edits (never touch step state) ───────────────────

    pub fn edit_file(&mut self, path: &str, content: &str) -> Result<(), WorkspaceError> {
        self.tree.update_content(path, content)?;
        self.events
            .send(SessionEvent::FilesChanged {
                file_count: self.tree.file_count(),
            })
            .ok();
        Ok(())
    }

    pub fn create_file(&mut self, path: &str) -> Result<(), WorkspaceError> {
        if self.tree.find(path).is_some() {
            return Err(WorkspaceError::NotAFile {
                path: path.to_string(),
            });
        }
        self.tree.upsert_file(path, "")?;
        self.events
            .send(SessionEvent::FilesChanged {
                file_count: self.tree.file_count(),
            })
            .ok();
        Ok(())
    }

    pub fn delete_path(&mut self, path: &str) -> bool {
        let removed = self.tree.remove(path);
        if removed {
            self.events
                .send(SessionEvent::FilesChanged {
                    file_count: self.tree.file_count(),
                })
                .ok();
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genai::testing::ScriptedModel;

    const CHAT_REPLY: &str = r#"I've set up a todo app.

<boltArtifact id="todo" title="Todo App">
  <boltAction type="file" filePath="src/App.tsx">function App() {}</boltAction>
  <boltAction type="shell">npm run dev</boltAction>
</boltArtifact>"#;

    fn session_with(replies: Vec<&str>) -> ProjectSession {
        ProjectSession::new(Arc::new(ScriptedModel::new(replies)))
    }

    #[tokio::test]
    async fn bootstrap_seeds_template_then_merges_chat_steps() {
        let mut session = session_with(vec!["react", CHAT_REPLY]);
        let prose = session.bootstrap("build me a todo app").await.unwrap();

        assert_eq!(prose, "I've set up a todo app.");

        // Template seeds 9 files + grouping step, chat adds grouping +
        // file + shell.
        let file_steps = session
            .steps()
            .iter()
            .filter(|s| s.kind == StepKind::CreateFile)
            .count();
        assert_eq!(file_steps, 10);

        // Template files landed in the tree, chat overwrote App.tsx.
        assert_eq!(session.tree().find_file("src/App.tsx"), Some("function App() {}"));
        assert!(session.tree().find_file("package.json").is_some());
    }

    #[tokio::test]
    async fn bootstrap_history_carries_hidden_context() {
        let mut session = session_with(vec!["react", CHAT_REPLY]);
        session.bootstrap("a recipe site").await.unwrap();

        let messages = session.messages();
        // 2 hidden context prompts + user prompt + assistant reply.
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, crate::genai::Role::User);
        assert!(messages[1].content.contains("boltArtifact"));
        assert_eq!(messages[2].content, "a recipe site");
        assert_eq!(messages[3].role, crate::genai::Role::Assistant);
    }

    #[tokio::test]
    async fn bootstrap_unknown_template_fails() {
        let mut session = session_with(vec!["angular"]);
        let err = session.bootstrap("something weird").await.unwrap_err();
        assert!(matches!(err, SessionError::NoTemplate));
    }

    #[tokio::test]
    async fn step_ids_never_repeat_across_turns() {
        let mut session = session_with(vec!["react", CHAT_REPLY, CHAT_REPLY]);
        session.bootstrap("todo app").await.unwrap();
        session.send("make it pink").await.unwrap();

        let mut ids: Vec<u32> = session.steps().iter().map(|s| s.id).collect();
        let unique = ids.len();
        ids.dedup();
        assert_eq!(ids.len(), unique);
    }

    #[tokio::test]
    async fn shell_steps_stay_pending() {
        let mut session = session_with(vec!["react", CHAT_REPLY]);
        session.bootstrap("todo app").await.unwrap();

        let shell = session
            .steps()
            .iter()
            .find(|s| s.kind == StepKind::RunCommand)
            .unwrap();
        assert_eq!(shell.status, StepStatus::Pending);
    }

    #[tokio::test]
    async fn prose_only_reply_adds_no_steps() {
        let mut session = session_with(vec!["react", CHAT_REPLY, "Sure - that is a CSS color."]);
        session.bootstrap("todo app").await.unwrap();
        let before = session.steps().len();

        let prose = session.send("what is rebeccapurple?").await.unwrap();

        assert_eq!(prose, "Sure - that is a CSS color.");
        assert_eq!(session.steps().len(), before);
    }

    #[tokio::test]
    async fn events_reflect_step_completion() {
        let mut session = session_with(vec!["react", CHAT_REPLY]);
        let mut rx = session.subscribe();
        session.bootstrap("todo app").await.unwrap();

        let mut added = 0usize;
        let mut completed = 0usize;
        while let Ok(event) = rx.try_recv() {
            match event {
                SessionEvent::StepsAdded(steps) => added += steps.len(),
                SessionEvent::StepCompleted { .. } => completed += 1,
                _ => {}
            }
        }
        assert!(added >= 12);
        // Every file and grouping step completed; only the shell step did not.
        assert_eq!(completed, added - 1);
    }

    #[tokio::test]
    async fn user_edits_do_not_touch_step_state() {
        let mut session = session_with(vec!["react", CHAT_REPLY]);
        session.bootstrap("todo app").await.unwrap();
        let statuses: Vec<StepStatus> = session.steps().iter().map(|s| s.status).collect();

        session.edit_file("src/App.tsx", "edited").unwrap();
        assert_eq!(session.tree().find_file("src/App.tsx"), Some("edited"));

        let after: Vec<StepStatus> = session.steps().iter().map(|s| s.status).collect();
        assert_eq!(statuses, after);
    }

    #[tokio::test]
    async fn create_file_rejects_existing_path() {
        let mut session = session_with(vec!["react", CHAT_REPLY]);
        session.bootstrap("todo app").await.unwrap();

        assert!(session.create_file("src/App.tsx").is_err());
        assert!(session.create_file("notes.md").is_ok());
        assert_eq!(session.tree().find_file("notes.md"), Some(""));
    }

    #[tokio::test]
    async fn delete_path_reports_removal() {
        let mut session = session_with(vec!["react", CHAT_REPLY]);
        session.bootstrap("todo app").await.unwrap();

        assert!(session.delete_path("src/App.tsx"));
        assert!(!session.delete_path("src/App.tsx"));
        assert!(session.tree().find_file("src/App.tsx").is_none());
    }
}
