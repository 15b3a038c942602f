use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use console::style;
use dialoguer::{Confirm, Input};

use sitesmith::config::AppConfig;
use sitesmith::genai::GeminiClient;
use sitesmith::plan::{StepKind, StepStatus};
use sitesmith::sandbox::{PreviewConfig, PreviewSandbox};
use sitesmith::session::{ProjectSession, SessionEvent};
use sitesmith::ui::icons::{GLOBE, SHELL, SPARKLE};
use sitesmith::ui::{StepsUi, wrap_prose};

/// Generate a project from a prompt, mount it, and preview it.
pub async fn cmd_create(
    prompt: &str,
    output: &Path,
    yes: bool,
    no_preview: bool,
    no_open: bool,
) -> Result<()> {
    if prompt.trim().is_empty() {
        bail!("Prompt must not be empty");
    }
    confirm_output_dir(output, yes)?;

    let config = AppConfig::from_env()?;
    let model = Arc::new(GeminiClient::new(&config));
    let mut session = ProjectSession::new(model);

    let ui = Arc::new(StepsUi::new());
    let ui_task = spawn_event_renderer(&session, ui.clone());

    ui.println(format!("{}sitesmith", SPARKLE));
    ui.status("Selecting template...");

    let prose = session
        .bootstrap(prompt)
        .await
        .context("Project generation failed")?;

    ui.status("Writing files...");
    session
        .tree()
        .write_to(output)
        .with_context(|| format!("Failed to write project to {}", output.display()))?;

    ui.finish(&format!(
        "Generated {} files in {}",
        session.tree().file_count(),
        output.display()
    ));
    ui_task.abort();

    if !prose.is_empty() {
        println!("\n{}\n", wrap_prose(&prose));
    }
    print_shell_hints(&session);

    let mut sandbox = None;
    if !no_preview {
        sandbox = Some(start_preview(output, no_open).await?);
    }

    if console::user_attended() {
        follow_up_loop(&mut session, output).await?;
    }

    if let Some(mut sandbox) = sandbox {
        sandbox.stop().await;
    }
    Ok(())
}

/// Refuse to write into a non-empty directory without consent.
fn confirm_output_dir(output: &Path, yes: bool) -> Result<()> {
    let occupied = output
        .read_dir()
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false);
    if !occupied || yes {
        return Ok(());
    }
    if !console::user_attended() {
        bail!(
            "{} is not empty. Pass --yes to overwrite files in it.",
            output.display()
        );
    }
    let proceed = Confirm::new()
        .with_prompt(format!(
            "{} is not empty. Overwrite files in it?",
            output.display()
        ))
        .default(false)
        .interact()?;
    if !proceed {
        bail!("Aborted");
    }
    Ok(())
}

/// Translate session events into the steps panel.
fn spawn_event_renderer(
    session: &ProjectSession,
    ui: Arc<StepsUi>,
) -> tokio::task::JoinHandle<()> {
    let mut rx = session.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            match event {
                SessionEvent::StepsAdded(steps) => ui.steps_added(&steps),
                SessionEvent::StepCompleted { title, .. } => ui.step_completed(&title),
                SessionEvent::StepFailed { title, reason, .. } => ui.step_failed(&title, &reason),
                SessionEvent::FilesChanged { .. } => {}
            }
        }
    })
}

/// Commands the model suggested but the driver never auto-runs.
fn print_shell_hints(session: &ProjectSession) {
    let pending: Vec<&str> = session
        .steps()
        .iter()
        .filter(|s| s.kind == StepKind::RunCommand && s.status == StepStatus::Pending)
        .filter_map(|s| s.code.as_deref())
        .collect();
    if pending.is_empty() {
        return;
    }
    println!("{}", style("Suggested commands (not run):").bold());
    for command in pending {
        println!("  {}{}", SHELL, command);
    }
    println!();
}

async fn start_preview(output: &Path, no_open: bool) -> Result<PreviewSandbox> {
    let config = PreviewConfig::load(output)?;
    let mut sandbox = PreviewSandbox::new(config);

    println!("{}", style("Starting preview...").dim());
    let url = sandbox
        .run(output)
        .await
        .context("Preview failed to start")?;

    println!("{}Preview ready at {}", GLOBE, style(&url).cyan().underlined());
    if !no_open
        && let Err(err) = open::that(&url)
    {
        tracing::warn!(error = %err, "Could not open browser");
    }
    Ok(sandbox)
}

/// Chat loop appending further steps to the live session. An empty prompt
/// ends it.
async fn follow_up_loop(session: &mut ProjectSession, output: &Path) -> Result<()> {
    loop {
        let prompt: String = Input::new()
            .with_prompt("Ask for changes (empty to finish)")
            .allow_empty(true)
            .interact_text()?;
        if prompt.trim().is_empty() {
            return Ok(());
        }

        match session.send(&prompt).await {
            Ok(prose) => {
                if !prose.is_empty() {
                    println!("\n{}\n", wrap_prose(&prose));
                }
                session
                    .tree()
                    .write_to(output)
                    .with_context(|| format!("Failed to update {}", output.display()))?;
            }
            Err(err) => {
                eprintln!("{}", style(format!("Chat failed: {}", err)).red());
            }
        }
    }
}
