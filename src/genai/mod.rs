//! GenAI provider integration.
//!
//! Everything that talks to (or stands in for) the hosted model lives
//! here: the wire-level Gemini client with its retry policy, the fixed
//! prompts and base-template artifacts, and the template-resolution step
//! that classifies a user prompt into a project kind.
//!
//! The [`TextModel`] trait is the seam: the chat driver and the HTTP
//! handlers only ever see the trait, so both are testable with a scripted
//! fake.

mod client;
pub mod prompts;
pub mod templates;

pub use client::{GeminiClient, RetryPolicy};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::GenAiError;

/// Who authored a chat message. Serialized exactly as the HTTP API spells
/// it; the Gemini wire name for `Assistant` is `model` and the client maps
/// it on the way out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One conversation turn, as carried by both the HTTP API and the driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Minimal text-generation interface over a hosted model.
#[async_trait]
pub trait TextModel: Send + Sync {
    /// Generate one reply for the given history under the given system
    /// instruction.
    async fn generate(
        &self,
        system: &str,
        messages: &[ChatMessage],
        temperature: f32,
    ) -> Result<String, GenAiError>;
}

/// Project kind a user prompt classifies into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    React,
    Node,
}

impl TemplateKind {
    fn from_answer(answer: &str) -> Option<Self> {
        match answer.trim().to_lowercase().as_str() {
            "react" => Some(TemplateKind::React),
            "node" => Some(TemplateKind::Node),
            _ => None,
        }
    }

    pub fn base_template(&self) -> &'static str {
        match self {
            TemplateKind::React => templates::REACT_BASE_TEMPLATE,
            TemplateKind::Node => templates::NODE_BASE_TEMPLATE,
        }
    }
}

/// Payload of a successful template resolution: the hidden context
/// messages to open the chat with, and the artifact markup the client
/// seeds its step list from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateResponse {
    pub prompts: Vec<String>,
    #[serde(rename = "uiPrompts")]
    pub ui_prompts: Vec<String>,
}

/// Classify `prompt` into a project kind and assemble the template
/// response. `Ok(None)` means the model refused to pick a known kind.
pub async fn resolve_template(
    model: &dyn TextModel,
    prompt: &str,
) -> Result<Option<TemplateResponse>, GenAiError> {
    let answer = model
        .generate(
            prompts::TEMPLATE_CLASSIFIER_PROMPT,
            &[ChatMessage::user(prompt)],
            0.2,
        )
        .await?;

    let Some(kind) = TemplateKind::from_answer(&answer) else {
        tracing::warn!(answer = %answer.trim(), "Template classifier returned an unknown kind");
        return Ok(None);
    };

    let base = kind.base_template();
    let prompts = match kind {
        TemplateKind::React => vec![
            prompts::DESIGN_BASELINE_PROMPT.to_string(),
            prompts::file_context_prompt(base),
        ],
        TemplateKind::Node => vec![prompts::file_context_prompt(base)],
    };

    Ok(Some(TemplateResponse {
        prompts,
        ui_prompts: vec![base.to_string()],
    }))
}
