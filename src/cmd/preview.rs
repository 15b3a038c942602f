use std::path::Path;

use anyhow::{Context, Result, bail};
use console::style;

use sitesmith::sandbox::{OutputSource, PreviewConfig, PreviewEvent, PreviewSandbox};
use sitesmith::ui::icons::GLOBE;
use sitesmith::workspace::FileTree;

/// Mount an existing generated project into the preview sandbox.
pub async fn cmd_preview(dir: &Path, no_open: bool, verbose: bool) -> Result<()> {
    if !dir.is_dir() {
        bail!("{} is not a directory", dir.display());
    }
    let tree = FileTree::from_dir(dir)
        .with_context(|| format!("Failed to read project at {}", dir.display()))?;
    if tree.is_empty() {
        bail!("Nothing to preview: {} contains no files", dir.display());
    }

    println!(
        "{}",
        style(format!("Previewing {} files from {}", tree.file_count(), dir.display())).dim()
    );

    let config = PreviewConfig::load(dir)?;
    let mut sandbox = PreviewSandbox::new(config);
    sandbox.mount(&tree, dir)?;

    if verbose {
        spawn_output_printer(&sandbox);
    }

    let url = sandbox.run(dir).await.context("Preview failed to start")?;
    println!("{}Preview ready at {}", GLOBE, style(&url).cyan().underlined());
    if !no_open
        && let Err(err) = open::that(&url)
    {
        tracing::warn!(error = %err, "Could not open browser");
    }

    println!("{}", style("Press Ctrl+C to stop.").dim());
    tokio::signal::ctrl_c().await.ok();
    sandbox.stop().await;
    Ok(())
}

fn spawn_output_printer(sandbox: &PreviewSandbox) {
    let mut rx = sandbox.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            if let PreviewEvent::OutputLine { source, line } = event {
                let tag = match source {
                    OutputSource::Install => "install",
                    OutputSource::DevServer => "dev",
                };
                eprintln!("[{}] {}", tag, line);
            }
        }
    });
}
