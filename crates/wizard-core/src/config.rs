use crate::error::{Result, WizardError};
use claude_client::{RetryPolicy, DEFAULT_BASE_URL, DEFAULT_MODEL};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "wizard.yaml";

/// Output budget for every step; the later steps produce long documents.
pub const DEFAULT_MAX_TOKENS: u32 = 32_000;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

impl ConfigWarning {
    fn warning(message: impl Into<String>) -> Self {
        Self {
            level: WarnLevel::Warning,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            level: WarnLevel::Error,
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// RunMode
// ---------------------------------------------------------------------------

/// How much of an internal failure reaches a client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Full error chains are sent to clients.
    #[default]
    Development,
    /// 5xx bodies and step errors are replaced with generic messages.
    Production,
}

impl RunMode {
    pub fn as_str(self) -> &'static str {
        match self {
            RunMode::Development => "development",
            RunMode::Production => "production",
        }
    }

    pub fn is_production(self) -> bool {
        self == RunMode::Production
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RunMode {
    type Err = WizardError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(RunMode::Development),
            "production" | "prod" => Ok(RunMode::Production),
            _ => Err(WizardError::InvalidMode(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// RetryConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    1_000
}

fn default_multiplier() -> f64 {
    2.0
}

fn default_max_delay_ms() -> u64 {
    30_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            multiplier: default_multiplier(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            multiplier: self.multiplier,
            max_delay: Duration::from_millis(self.max_delay_ms),
        }
    }
}

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed CORS origin. Any origin is allowed when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frontend_url: Option<String>,
    #[serde(default)]
    pub mode: RunMode,
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            frontend_url: None,
            mode: RunMode::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// WizardConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WizardConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub server: ServerConfig,
    /// Only ever read from the environment; never written to YAML.
    #[serde(skip)]
    pub api_key: Option<String>,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_api_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            max_tokens: default_max_tokens(),
            api_base_url: default_api_base_url(),
            output_dir: default_output_dir(),
            retry: RetryConfig::default(),
            server: ServerConfig::default(),
            api_key: None,
        }
    }
}

impl WizardConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let cfg: WizardConfig = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    /// Load `path` if it exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(path, data.as_bytes())
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if !self.has_api_key() {
            warnings.push(ConfigWarning::error(
                "ANTHROPIC_API_KEY is not set; steps cannot call the API",
            ));
        }

        if self.model.trim().is_empty() {
            warnings.push(ConfigWarning::error("model is empty"));
        }

        if self.max_tokens == 0 {
            warnings.push(ConfigWarning::error("max_tokens must be greater than 0"));
        }

        if !(self.api_base_url.starts_with("http://") || self.api_base_url.starts_with("https://"))
        {
            warnings.push(ConfigWarning::error(format!(
                "api_base_url '{}' is not an http(s) URL",
                self.api_base_url
            )));
        }

        if self.retry.max_retries > 10 {
            warnings.push(ConfigWarning::warning(format!(
                "retry.max_retries={} (>10 is unusual)",
                self.retry.max_retries
            )));
        }

        if self.retry.multiplier < 1.0 {
            warnings.push(ConfigWarning::warning(format!(
                "retry.multiplier={} shrinks the delay between retries",
                self.retry.multiplier
            )));
        }

        if self.retry.initial_delay_ms > self.retry.max_delay_ms {
            warnings.push(ConfigWarning::warning(
                "retry.initial_delay_ms exceeds retry.max_delay_ms; every retry waits max_delay_ms",
            ));
        }

        if self.server.mode.is_production() && self.server.frontend_url.is_none() {
            warnings.push(ConfigWarning::warning(
                "production mode without server.frontend_url allows requests from any origin",
            ));
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
