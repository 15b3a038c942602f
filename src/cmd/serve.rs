use std::sync::Arc;

use anyhow::Result;

use sitesmith::config::{AppConfig, validate_port};
use sitesmith::genai::GeminiClient;
use sitesmith::server::{AppState, ServerConfig, start_server};

/// Run the GenAI proxy server.
pub async fn cmd_serve(port: u16, dev_mode: bool) -> Result<()> {
    let port = validate_port(port)?;
    let config = AppConfig::from_env()?;
    let model = Arc::new(GeminiClient::new(&config));

    tracing::info!(model = %config.model, dev_mode, "Starting proxy");

    let state = Arc::new(AppState { model });
    start_server(ServerConfig { port, dev_mode }, state).await
}
