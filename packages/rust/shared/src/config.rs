//! Application configuration for nbtoc.
//!
//! User config lives at `~/.nbtoc/nbtoc.toml`.
//! CLI flags (and their environment variables) override config file values,
//! which override defaults.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{NbTocError, Result};
use crate::types::DEFAULT_MAX_DEPTH;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "nbtoc.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".nbtoc";

/// Default per-request timeout when querying Jupyter servers.
const DEFAULT_TIMEOUT_SECS: u64 = 5;

// ---------------------------------------------------------------------------
// Config structs (matching nbtoc.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Notebook auto-detection settings.
    #[serde(default)]
    pub locator: LocatorConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Deepest heading level to include.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Output format for the `toc` command.
    #[serde(default)]
    pub format: OutputFormat,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            format: OutputFormat::default(),
        }
    }
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

/// `[locator]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocatorConfig {
    /// Timeout for each Jupyter server request, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Jupyter runtime directory holding `jpserver-*.json` files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_dir: Option<String>,

    /// Kernel connection file identifying the active kernel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_file: Option<String>,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            runtime_dir: None,
            connection_file: None,
        }
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// How the table of contents is printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Nested Markdown link list.
    #[default]
    Markdown,
    /// Machine-readable JSON document.
    Json,
}

impl FromStr for OutputFormat {
    type Err = NbTocError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            other => Err(NbTocError::validation(format!(
                "unknown output format '{other}': expected 'markdown' or 'json'"
            ))),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Markdown => f.write_str("markdown"),
            Self::Json => f.write_str("json"),
        }
    }
}

// ---------------------------------------------------------------------------
// TOC config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime TOC configuration, merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct TocConfig {
    /// Explicit notebook path; `None` means auto-detect.
    pub notebook: Option<PathBuf>,
    /// Deepest heading level to include.
    pub max_depth: usize,
    /// Output format.
    pub format: OutputFormat,
    /// Kernel connection file used for auto-detection.
    pub connection_file: Option<PathBuf>,
    /// Jupyter runtime directory override.
    pub runtime_dir: Option<PathBuf>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl From<&AppConfig> for TocConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            notebook: None,
            max_depth: config.defaults.max_depth,
            format: config.defaults.format,
            connection_file: config.locator.connection_file.as_ref().map(PathBuf::from),
            runtime_dir: config.locator.runtime_dir.as_ref().map(PathBuf::from),
            timeout_secs: config.locator.timeout_secs,
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.nbtoc/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| NbTocError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.nbtoc/nbtoc.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| NbTocError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content)
        .map_err(|e| NbTocError::config(format!("failed to parse {}: {e}", path.display())))?;

    validate_max_depth(config.defaults.max_depth)?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| NbTocError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| NbTocError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| NbTocError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Reject heading depths below 1.
pub fn validate_max_depth(max_depth: usize) -> Result<usize> {
    if max_depth == 0 {
        return Err(NbTocError::validation(
            "max_depth must be at least 1 (1 = H1 only)",
        ));
    }
    Ok(max_depth)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("max_depth = 3"));
        assert!(toml_str.contains("timeout_secs = 5"));
        assert!(!toml_str.contains("runtime_dir"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.defaults.max_depth, 3);
        assert_eq!(parsed.defaults.format, OutputFormat::Markdown);
    }

    #[test]
    fn config_with_locator() {
        let toml_str = r#"
[defaults]
max_depth = 2
format = "json"

[locator]
timeout_secs = 1
runtime_dir = "/tmp/jupyter/runtime"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        let toc = TocConfig::from(&config);
        assert_eq!(toc.max_depth, 2);
        assert_eq!(toc.format, OutputFormat::Json);
        assert_eq!(toc.timeout_secs, 1);
        assert_eq!(toc.runtime_dir, Some(PathBuf::from("/tmp/jupyter/runtime")));
        assert!(toc.connection_file.is_none());
        assert!(toc.notebook.is_none());
    }

    #[test]
    fn load_config_from_rejects_zero_depth() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nbtoc.toml");
        std::fs::write(&path, "[defaults]\nmax_depth = 0\n").expect("write");

        let err = load_config_from(&path).unwrap_err();
        assert!(err.to_string().contains("max_depth must be at least 1"));
    }

    #[test]
    fn load_config_from_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = load_config_from(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, NbTocError::NotFound { .. }));
    }

    #[test]
    fn output_format_parsing() {
        assert_eq!("md".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("yaml".parse::<OutputFormat>().is_err());
    }
}
