use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Configuration for the preview sandbox.
#[derive(Debug, Clone)]
pub struct PreviewConfig {
    /// Dependency install command, program first.
    pub install: Vec<String>,
    /// Dev server command, program first.
    pub start: Vec<String>,
    /// How long to wait for the dev server to print its URL.
    pub ready_timeout_secs: u64,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            install: vec!["npm".into(), "install".into()],
            start: vec!["npm".into(), "run".into(), "dev".into()],
            ready_timeout_secs: 120,
        }
    }
}

/// Raw TOML structure for `sitesmith.toml`.
#[derive(Debug, Deserialize)]
struct ProjectToml {
    preview: Option<PreviewSection>,
}

#[derive(Debug, Deserialize)]
struct PreviewSection {
    install: Option<Vec<String>>,
    start: Option<Vec<String>>,
    ready_timeout_secs: Option<u64>,
}

impl PreviewConfig {
    /// Load the `[preview]` section of `sitesmith.toml` in the project
    /// directory. Returns defaults if the file doesn't exist.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let config_path = project_dir.join("sitesmith.toml");
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        let parsed: ProjectToml = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        let mut config = Self::default();
        if let Some(section) = parsed.preview {
            if let Some(install) = section.install {
                config.install = install;
            }
            if let Some(start) = section.start {
                config.start = start;
            }
            if let Some(timeout) = section.ready_timeout_secs {
                config.ready_timeout_secs = timeout;
            }
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_use_npm() {
        let config = PreviewConfig::default();
        assert_eq!(config.install, vec!["npm", "install"]);
        assert_eq!(config.start, vec!["npm", "run", "dev"]);
        assert_eq!(config.ready_timeout_secs, 120);
    }

    #[test]
    fn load_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = PreviewConfig::load(dir.path()).unwrap();
        assert_eq!(config.install, vec!["npm", "install"]);
    }

    #[test]
    fn load_full_section() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("sitesmith.toml"),
            r#"
[preview]
install = ["pnpm", "install"]
start = ["pnpm", "dev"]
ready_timeout_secs = 60
"#,
        )
        .unwrap();

        let config = PreviewConfig::load(dir.path()).unwrap();
        assert_eq!(config.install, vec!["pnpm", "install"]);
        assert_eq!(config.start, vec!["pnpm", "dev"]);
        assert_eq!(config.ready_timeout_secs, 60);
    }

    #[test]
    fn load_partial_section_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("sitesmith.toml"),
            "[preview]\nready_timeout_secs = 30\n",
        )
        .unwrap();

        let config = PreviewConfig::load(dir.path()).unwrap();
        assert_eq!(config.install, vec!["npm", "install"]);
        assert_eq!(config.ready_timeout_secs, 30);
    }

    #[test]
    fn load_invalid_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("sitesmith.toml"), "not toml {{{{").unwrap();
        assert!(PreviewConfig::load(dir.path()).is_err());
    }
}
