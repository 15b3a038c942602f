use anyhow::{Result, bail};

/// Default Gemini model used for both template classification and chat.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Runtime configuration for sitesmith.
///
/// Values come from the environment (a `.env` file is loaded by `main`
/// before this runs). Only the API key is mandatory; everything else has
/// a default.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_key: String,
    pub model: String,
}

impl AppConfig {
    /// Load configuration from the environment.
    pub fn from_env() -> Result<Self> {
        let api_key = match std::env::var("GEMINI_API_KEY") {
            Ok(key) if !key.trim().is_empty() => key,
            _ => bail!(
                "GEMINI_API_KEY is not set. Export it or add it to a .env file in the project directory."
            ),
        };

        let model = std::env::var("SITESMITH_MODEL")
            .ok()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        Ok(Self { api_key, model })
    }

    /// Variant of `from_env` for callers that already hold a key (tests,
    /// embedded use).
    pub fn with_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

/// Parse a listen port, rejecting port 0 (the server must be addressable).
pub fn validate_port(port: u16) -> Result<u16> {
    if port == 0 {
        bail!("Port 0 is not a valid listen port");
    }
    Ok(port)
}
