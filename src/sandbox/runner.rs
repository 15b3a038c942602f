use std::path::Path;
use std::process::Stdio;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{broadcast, mpsc};

use crate::errors::SandboxError;
use crate::workspace::FileTree;

use super::config::PreviewConfig;

/// Capacity of the lifecycle event channel.
const EVENT_CHANNEL_CAPACITY: usize = 512;

/// Matches the local URL a dev server prints when it is ready. Vite,
/// `serve`, and plain node servers all print one of these forms.
static READY_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(https?://(?:localhost|127\.0\.0\.1|0\.0\.0\.0):\d+[^\s]*)").unwrap()
});

/// Where an output line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputSource {
    Install,
    DevServer,
}

/// Lifecycle of the preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewStatus {
    Idle,
    Installing,
    Starting,
    Ready { url: String },
    Failed { reason: String },
}

/// Events published while the preview is supervised.
#[derive(Debug, Clone)]
pub enum PreviewEvent {
    Status(PreviewStatus),
    OutputLine { source: OutputSource, line: String },
}

/// Supervises the install + dev-server processes for one mounted project.
pub struct PreviewSandbox {
    config: PreviewConfig,
    events: broadcast::Sender<PreviewEvent>,
    server: Option<Child>,
}

impl PreviewSandbox {
    pub fn new(config: PreviewConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            config,
            events,
            server: None,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PreviewEvent> {
        self.events.subscribe()
    }

    /// Write the tree into `dir`, creating it if needed.
    pub fn mount(&self, tree: &FileTree, dir: &Path) -> Result<(), SandboxError> {
        tree.write_to(dir)?;
        tracing::info!(dir = %dir.display(), files = tree.file_count(), "Mounted project");
        Ok(())
    }

    /// Install dependencies, then start the dev server and wait for its
    /// ready URL. The dev-server process stays alive after this returns;
    /// call [`stop`](Self::stop) to kill it.
    pub async fn run(&mut self, dir: &Path) -> Result<String, SandboxError> {
        self.set_status(PreviewStatus::Installing);
        self.run_install(dir).await?;

        self.set_status(PreviewStatus::Starting);
        let url = self.start_server(dir).await?;

        self.set_status(PreviewStatus::Ready { url: url.clone() });
        Ok(url)
    }

    /// Kill the dev server, if one is running.
    pub async fn stop(&mut self) {
        if let Some(mut child) = self.server.take() {
            if let Err(err) = child.kill().await {
                tracing::warn!(error = %err, "Failed to kill dev server");
            }
        }
    }

    fn set_status(&self, status: PreviewStatus) {
        tracing::info!(?status, "Preview status");
        self.events.send(PreviewEvent::Status(status)).ok();
    }

    fn fail(&self, reason: &str) {
        self.set_status(PreviewStatus::Failed {
            reason: reason.to_string(),
        });
    }

    fn spawn(&self, dir: &Path, argv: &[String]) -> Result<Child, SandboxError> {
        let display = argv.join(" ");
        let (program, args) = argv.split_first().ok_or_else(|| {
            SandboxError::SpawnFailed {
                command: display.clone(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command"),
            }
        })?;

        Command::new(program)
            .args(args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SandboxError::SpawnFailed {
                command: display,
                source,
            })
    }

    async fn run_install(&self, dir: &Path) -> Result<(), SandboxError> {
        let mut child = self.spawn(dir, &self.config.install)?;
        let mut lines = self.pump_output(&mut child, OutputSource::Install);

        // Drain until the process closes its pipes.
        while lines.recv().await.is_some() {}

        let status = child
            .wait()
            .await
            .map_err(anyhow::Error::from)
            .map_err(SandboxError::Other)?;
        if !status.success() {
            self.fail("install failed");
            return Err(SandboxError::InstallFailed {
                code: status.code(),
            });
        }
        Ok(())
    }

    async fn start_server(&mut self, dir: &Path) -> Result<String, SandboxError> {
        let mut child = self.spawn(dir, &self.config.start)?;
        let mut lines = self.pump_output(&mut child, OutputSource::DevServer);
        self.server = Some(child);

        let deadline = Duration::from_secs(self.config.ready_timeout_secs);
        let url = tokio::time::timeout(deadline, async {
            while let Some(line) = lines.recv().await {
                if let Some(url) = extract_ready_url(&line) {
                    return Some(url);
                }
            }
            None
        })
        .await;

        match url {
            Ok(Some(url)) => Ok(url),
            Ok(None) => {
                self.fail("dev server exited");
                Err(SandboxError::ServerExited)
            }
            Err(_) => {
                self.fail("timed out waiting for ready URL");
                Err(SandboxError::ReadyTimeout {
                    secs: self.config.ready_timeout_secs,
                })
            }
        }
    }

    /// Forward both stdio pipes of `child` line-by-line to the event
    /// channel, and return a receiver carrying the same lines for
    /// in-process inspection.
    fn pump_output(&self, child: &mut Child, source: OutputSource) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(pump_lines(stdout, source, self.events.clone(), tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(pump_lines(stderr, source, self.events.clone(), tx));
        }

        rx
    }
}

async fn pump_lines<R: AsyncRead + Unpin>(
    reader: R,
    source: OutputSource,
    events: broadcast::Sender<PreviewEvent>,
    lines_tx: mpsc::Sender<String>,
) {
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        events
            .send(PreviewEvent::OutputLine {
                source,
                line: line.clone(),
            })
            .ok();
        // The in-process receiver may be gone once the caller stops
        // watching; broadcast subscribers still get every line.
        let _ = lines_tx.send(line).await;
    }
}

/// Pull a local URL out of one (possibly ANSI-colored) output line.
fn extract_ready_url(line: &str) -> Option<String> {
    let clean = console::strip_ansi_codes(line);
    READY_URL_REGEX
        .captures(&clean)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn ready_url_detected_in_vite_output() {
        let line = "  ➜  Local:   http://localhost:5173/";
        assert_eq!(
            extract_ready_url(line).as_deref(),
            Some("http://localhost:5173")
        );
    }

    #[test]
    fn ready_url_detected_with_ansi_colors() {
        let line = "\x1b[32m  Local: \x1b[36mhttp://127.0.0.1:3000/\x1b[0m";
        assert_eq!(
            extract_ready_url(line).as_deref(),
            Some("http://127.0.0.1:3000")
        );
    }

    #[test]
    fn plain_lines_have_no_url() {
        assert!(extract_ready_url("installing dependencies...").is_none());
        assert!(extract_ready_url("https://example.com is not local").is_none());
    }

    #[test]
    fn ready_url_keeps_path_suffix() {
        let line = "Server listening on http://localhost:8080/app";
        assert_eq!(
            extract_ready_url(line).as_deref(),
            Some("http://localhost:8080/app")
        );
    }

    #[tokio::test]
    async fn mount_writes_tree_to_disk() {
        let dir = tempdir().unwrap();
        let mut tree = FileTree::new();
        tree.upsert_file("index.html", "<html></html>").unwrap();

        let sandbox = PreviewSandbox::new(PreviewConfig::default());
        sandbox.mount(&tree, dir.path()).unwrap();

        assert_eq!(
            std::fs::read_to_string(dir.path().join("index.html")).unwrap(),
            "<html></html>"
        );
    }

    #[tokio::test]
    async fn install_failure_surfaces_exit_code() {
        let dir = tempdir().unwrap();
        let config = PreviewConfig {
            install: vec!["sh".into(), "-c".into(), "exit 7".into()],
            ..PreviewConfig::default()
        };
        let mut sandbox = PreviewSandbox::new(config);

        let err = sandbox.run(dir.path()).await.unwrap_err();
        assert!(matches!(err, SandboxError::InstallFailed { code: Some(7) }));
    }

    #[tokio::test]
    async fn run_reports_ready_url_from_fake_server() {
        let dir = tempdir().unwrap();
        let config = PreviewConfig {
            install: vec!["true".into()],
            start: vec![
                "sh".into(),
                "-c".into(),
                "echo 'Local: http://localhost:4173/'; sleep 5".into(),
            ],
            ready_timeout_secs: 10,
        };
        let mut sandbox = PreviewSandbox::new(config);
        let mut rx = sandbox.subscribe();

        let url = sandbox.run(dir.path()).await.unwrap();
        assert_eq!(url, "http://localhost:4173");
        sandbox.stop().await;

        let mut saw_installing = false;
        let mut saw_ready = false;
        while let Ok(event) = rx.try_recv() {
            match event {
                PreviewEvent::Status(PreviewStatus::Installing) => saw_installing = true,
                PreviewEvent::Status(PreviewStatus::Ready { .. }) => saw_ready = true,
                _ => {}
            }
        }
        assert!(saw_installing);
        assert!(saw_ready);
    }

    #[tokio::test]
    async fn server_exit_without_url_is_an_error() {
        let dir = tempdir().unwrap();
        let config = PreviewConfig {
            install: vec!["true".into()],
            start: vec!["sh".into(), "-c".into(), "echo 'crashed'".into()],
            ready_timeout_secs: 10,
        };
        let mut sandbox = PreviewSandbox::new(config);

        let err = sandbox.run(dir.path()).await.unwrap_err();
        assert!(matches!(err, SandboxError::ServerExited));
    }

    #[tokio::test]
    async fn missing_program_is_spawn_failed() {
        let dir = tempdir().unwrap();
        let config = PreviewConfig {
            install: vec!["definitely-not-a-real-binary-xyz".into()],
            ..PreviewConfig::default()
        };
        let mut sandbox = PreviewSandbox::new(config);

        let err = sandbox.run(dir.path()).await.unwrap_err();
        assert!(matches!(err, SandboxError::SpawnFailed { .. }));
    }
}
