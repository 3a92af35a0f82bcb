use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

/// Tool configuration loaded from environment variables (and `.env` when
/// present). Only the API key is required; everything else has defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    /// Directory holding the CV's `.cls`/`.sty` files for the compile check.
    pub style_dir: PathBuf,
    /// Wall-clock bound on one xelatex invocation.
    pub compile_timeout: Duration,
    /// Request timeout for generation-service calls.
    pub llm_timeout: Duration,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            style_dir: PathBuf::from(
                std::env::var("LATEX_STYLE_DIR").unwrap_or_else(|_| "./LaTeX".to_string()),
            ),
            compile_timeout: Duration::from_secs(env_u64("XELATEX_TIMEOUT_SECS", 30)?),
            llm_timeout: Duration::from_secs(env_u64("LLM_TIMEOUT_SECS", 120)?),
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_u64(key: &str, default: u64) -> Result<u64> {
    match std::env::var(key) {
        Ok(value) => value
            .parse::<u64>()
            .with_context(|| format!("{key} must be a number of seconds")),
        Err(_) => Ok(default),
    }
}
