//! Configuration file support

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use trawl_agent::AdmissionConfig;

pub const DEFAULT_MODEL: &str = "openai/gpt-4.1-nano";
pub use trawl_ai::DEFAULT_BASE_URL;
pub const DEFAULT_RENDERER: &str = "chromium --headless --disable-gpu --no-sandbox --dump-dom";
pub const DEFAULT_INSTALLER: &str = "uv pip install";
pub const DEFAULT_RUN_TIMEOUT_SECS: u64 = 120;

/// Configuration for trawl
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Model id sent to the chat-completions endpoint
    pub model: Option<String>,
    /// Chat-completions base URL
    pub base_url: Option<String>,
    /// Reasoning iterations per run
    pub max_iterations: Option<u32>,
    /// Consecutive model failures tolerated
    pub model_retries: Option<u32>,
    /// Directory for downloads and code files
    pub work_dir: Option<String>,
    /// Headless browser command used to render pages; empty disables rendering
    pub renderer: Option<String>,
    /// Package installer command
    pub installer: Option<String>,
    /// Timeout for code execution and installs, in seconds
    pub run_timeout_secs: Option<u64>,
    /// Credentials (alternative to environment variables)
    #[serde(default)]
    pub credentials: Credentials,
    /// Model request rate limiting
    #[serde(default)]
    pub admission: AdmissionSettings,
}

/// Credential configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub api_key: Option<String>,
    pub email: Option<String>,
    pub secret: Option<String>,
}

/// Admission gate configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdmissionSettings {
    pub min_interval_ms: Option<u64>,
    pub burst: Option<u32>,
}

impl Config {
    /// Get the config directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("trawl")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        // Check for TRAWL_CONFIG_PATH env var first
        if let Ok(path) = std::env::var("TRAWL_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }

    /// Load config from a file, falling back to defaults if it is missing
    /// or unreadable
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Failed to parse config file {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save config to a file
    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let content = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(path, content)
    }

    /// Create a default config file if it doesn't exist
    pub fn init(path: &Path) -> std::io::Result<PathBuf> {
        if path.exists() {
            return Ok(path.to_path_buf());
        }

        let default_config = Config {
            model: Some(DEFAULT_MODEL.to_string()),
            base_url: Some(DEFAULT_BASE_URL.to_string()),
            max_iterations: Some(trawl_agent::agent::DEFAULT_MAX_ITERATIONS),
            renderer: Some(DEFAULT_RENDERER.to_string()),
            installer: Some(DEFAULT_INSTALLER.to_string()),
            ..Default::default()
        };

        default_config.save_to(path)?;
        Ok(path.to_path_buf())
    }

    /// API key: `API_KEY` first, then config
    pub fn api_key(&self) -> Option<String> {
        layered(env_value("API_KEY"), &self.credentials.api_key)
    }

    /// Submission email: `EMAIL` first, then config
    pub fn email(&self) -> Option<String> {
        layered(env_value("EMAIL"), &self.credentials.email)
    }

    /// Submission secret: `SECRET` first, then config
    pub fn secret(&self) -> Option<String> {
        layered(env_value("SECRET"), &self.credentials.secret)
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn work_dir(&self) -> PathBuf {
        self.work_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join("trawl"))
    }

    /// Renderer command line split into program and arguments, or `None`
    /// when rendering is disabled
    pub fn renderer(&self) -> Option<Vec<String>> {
        let command = self.renderer.as_deref().unwrap_or(DEFAULT_RENDERER);
        split_command(command)
    }

    pub fn installer(&self) -> Vec<String> {
        let command = self.installer.as_deref().unwrap_or(DEFAULT_INSTALLER);
        split_command(command).unwrap_or_else(|| {
            DEFAULT_INSTALLER
                .split_whitespace()
                .map(str::to_string)
                .collect()
        })
    }

    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs.unwrap_or(DEFAULT_RUN_TIMEOUT_SECS))
    }

    pub fn admission(&self) -> AdmissionConfig {
        let defaults = AdmissionConfig::default();
        AdmissionConfig {
            min_interval: self
                .admission
                .min_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.min_interval),
            burst: self.admission.burst.unwrap_or(defaults.burst),
        }
    }
}

/// Environment value wins over the config file
fn layered(env: Option<String>, configured: &Option<String>) -> Option<String> {
    env.or_else(|| configured.clone())
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn split_command(command: &str) -> Option<Vec<String>> {
    let parts: Vec<String> = command.split_whitespace().map(str::to_string).collect();
    if parts.is_empty() { None } else { Some(parts) }
}

/// Generate example config content
pub fn example_config() -> &'static str {
    r#"# trawl configuration file
# Place at ~/.config/trawl/config.toml (Linux) or set TRAWL_CONFIG_PATH

# Model id and OpenAI-compatible endpoint
model = "openai/gpt-4.1-nano"
base_url = "https://aipipe.org/openrouter/v1"

# Reasoning iterations before a run gives up
max_iterations = 5000

# Consecutive model failures tolerated before a run fails
# model_retries = 3

# Where downloads and generated code live (defaults to a temp dir)
# work_dir = "/tmp/trawl"

# Headless browser used by get_rendered_html; set to "" to use plain HTTP
renderer = "chromium --headless --disable-gpu --no-sandbox --dump-dom"

# Installer used by add_dependencies
installer = "uv pip install"

# Timeout for run_code and add_dependencies, in seconds
# run_timeout_secs = 120

# Credentials (optional - API_KEY, EMAIL and SECRET environment variables
# or a .env file work too)
[credentials]
# api_key = "..."
# email = "you@example.com"
# secret = "..."

# One model request per interval, with a burst allowance
[admission]
# min_interval_ms = 1000
# burst = 30
"#
}
