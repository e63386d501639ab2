//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars.
//!
//! Config lives at `~/.threadline/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.
//! The Gemini API key is resolved once, at session construction, from the
//! environment or the config file.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::PathBuf;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ThreadlineConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub gemini: GeminiConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub default_model: Option<String>,
    pub system_preamble: Option<String>,
    pub system_preamble_file: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta";

const DEFAULT_SYSTEM_PREAMBLE: &str = "You are a helpful assistant embedded in a chat application. \
    Keep answers clear and conversational, and be honest about uncertainty. \
    When a reply includes code, wrap it in fenced code blocks and keep the surrounding explanation brief. \
    Answer the user's latest message in the context of the conversation.";

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub model_name: String,
    pub system_preamble: String,
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.threadline/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".threadline").join("config.toml"))
}

/// Load config from `~/.threadline/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `ThreadlineConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<ThreadlineConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(ThreadlineConfig::default());
        }
    };

    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(&path);
        return Ok(ThreadlineConfig::default());
    }

    let contents = fs::read_to_string(&path).map_err(ConfigError::Io)?;
    let config: ThreadlineConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &PathBuf) {
    let default_content = r#"# Threadline Configuration
# All settings are optional — defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars.

# [general]
# default_model = "gemini-1.5-flash"
# system_preamble = "You are a helpful assistant."
# system_preamble_file = "preamble.md"   # Path relative to ~/.threadline/

# [gemini]
# api_key = "AIza..."                    # Or set GEMINI_API_KEY env var
# base_url = "https://generativelanguage.googleapis.com/v1beta"
"#;

    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("Failed to create config directory: {}", e);
            return;
        }
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars.
///
/// Also loads `.env` so `GEMINI_API_KEY` can live there during development;
/// the library has no binary entry point that would do it earlier.
pub fn resolve(config: &ThreadlineConfig) -> ResolvedConfig {
    dotenv::dotenv().ok();

    // Model: env → config → default
    let model_name = std::env::var("THREADLINE_MODEL")
        .ok()
        .or_else(|| config.general.default_model.clone())
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());

    // System preamble: inline config wins over file, both win over default
    let system_preamble = resolve_system_preamble(config);

    // Gemini API key: env → config
    let gemini_api_key = std::env::var("GEMINI_API_KEY")
        .ok()
        .or_else(|| config.gemini.api_key.clone());

    // Gemini base URL: env → config → default
    let gemini_base_url = std::env::var("GEMINI_BASE_URL")
        .ok()
        .or_else(|| config.gemini.base_url.clone())
        .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string());

    ResolvedConfig {
        model_name,
        system_preamble,
        gemini_api_key,
        gemini_base_url,
    }
}

/// Resolves the system preamble: inline wins over file, both win over default.
fn resolve_system_preamble(config: &ThreadlineConfig) -> String {
    if let Some(ref preamble) = config.general.system_preamble {
        return preamble.clone();
    }

    // Try loading from system_preamble_file (relative to ~/.threadline/)
    if let Some(ref file) = config.general.system_preamble_file {
        if let Some(home) = dirs::home_dir() {
            let preamble_path = home.join(".threadline").join(file);
            match fs::read_to_string(&preamble_path) {
                Ok(contents) => {
                    let trimmed = contents.trim().to_string();
                    if !trimmed.is_empty() {
                        info!("Loaded system preamble from {}", preamble_path.display());
                        return trimmed;
                    }
                    warn!("System preamble file is empty: {}", preamble_path.display());
                }
                Err(e) => {
                    warn!(
                        "Failed to read system preamble file {}: {}",
                        preamble_path.display(),
                        e
                    );
                }
            }
        }
    }

    DEFAULT_SYSTEM_PREAMBLE.to_string()
}
