use anyhow::{Context, Result};
use claude_client::{ClaudeClient, Completer};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use wizard_core::config::{RunMode, WizardConfig, DEFAULT_CONFIG_FILE};

/// Values taken from flags or the environment. Each one beats the file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub config: Option<PathBuf>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub api_base_url: Option<String>,
    pub mode: Option<RunMode>,
    pub port: Option<u16>,
    pub frontend_url: Option<String>,
    pub output_dir: Option<PathBuf>,
}

/// Load the config file (explicit path must exist; the default may not) and
/// layer the overrides on top.
pub fn resolve(overrides: &Overrides) -> Result<WizardConfig> {
    let mut config = match &overrides.config {
        Some(path) => WizardConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => WizardConfig::load_or_default(Path::new(DEFAULT_CONFIG_FILE))
            .context("failed to load wizard.yaml")?,
    };

    if let Some(key) = overrides.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
        config.api_key = Some(key.to_string());
    }
    if let Some(model) = overrides.model.as_deref().filter(|m| !m.trim().is_empty()) {
        config.model = model.to_string();
    }
    if let Some(url) = &overrides.api_base_url {
        config.api_base_url = url.clone();
    }
    if let Some(mode) = overrides.mode {
        config.server.mode = mode;
    }
    if let Some(port) = overrides.port {
        config.server.port = port;
    }
    if let Some(url) = overrides.frontend_url.as_deref().filter(|u| !u.trim().is_empty()) {
        config.server.frontend_url = Some(url.to_string());
    }
    if let Some(dir) = &overrides.output_dir {
        config.output_dir = dir.clone();
    }
    Ok(config)
}

/// Real API client for `config`. Fails before any network use when the key
/// is missing.
pub fn completer(config: &WizardConfig) -> Result<Arc<dyn Completer>> {
    let client = ClaudeClient::new(config.api_key.clone().unwrap_or_default(), &config.model)
        .context("cannot call the Anthropic API")?
        .with_base_url(&config.api_base_url)
        .with_retry(config.retry.policy());
    tracing::debug!(?client, "API client ready");
    Ok(Arc::new(client))
}
