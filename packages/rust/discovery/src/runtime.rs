//! Jupyter runtime directory scanning.
//!
//! A running Jupyter server drops a `jpserver-<pid>.json` (or, for the
//! classic notebook server, `nbserver-<pid>.json`) file into the runtime
//! directory describing where it listens. Kernels are identified by their
//! connection file, `kernel-<id>.json`.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use nbtoc_shared::{NbTocError, Result};

/// Environment variable Jupyter itself honours for the runtime directory.
pub const RUNTIME_DIR_ENV: &str = "JUPYTER_RUNTIME_DIR";

// ---------------------------------------------------------------------------
// Regex patterns (compiled once)
// ---------------------------------------------------------------------------

/// Matches `jpserver-1234.json` / `nbserver-1234.json`.
static SERVER_FILE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:jp|nb)server-\d+\.json$").expect("server file regex")
});

/// Captures the kernel id: everything after the first `-` up to the first `.`.
static KERNEL_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^-]*-([^.]+)").expect("kernel id regex")
});

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One running Jupyter server, as described by its runtime info file.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerInfo {
    /// Base URL of the server (e.g., `http://localhost:8888/`).
    pub url: String,
    /// API token; empty when auth is disabled.
    #[serde(default)]
    pub token: String,
    /// Directory notebooks are served from (`jupyter_server`).
    #[serde(default)]
    pub root_dir: Option<PathBuf>,
    /// Directory notebooks are served from (classic notebook server).
    #[serde(default)]
    pub notebook_dir: Option<PathBuf>,
}

impl ServerInfo {
    /// The server's content root, whichever key it was written under.
    pub fn content_root(&self) -> Option<&Path> {
        self.root_dir
            .as_deref()
            .or(self.notebook_dir.as_deref())
            .filter(|dir| !dir.as_os_str().is_empty())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Extract the kernel id from a connection file path.
///
/// `/run/jupyter/kernel-4f1e-99.json` → `4f1e-99`.
pub fn kernel_id_from_connection_file(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    KERNEL_ID_RE
        .captures(file_name)
        .map(|caps| caps[1].to_string())
}

/// The platform's default Jupyter runtime directory.
pub fn default_runtime_dir() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os(RUNTIME_DIR_ENV).filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(dir));
    }

    if cfg!(target_os = "macos") {
        return dirs::home_dir().map(|home| home.join("Library").join("Jupyter").join("runtime"));
    }

    dirs::data_dir().map(|data| data.join("jupyter").join("runtime"))
}

/// List the servers recorded in `runtime_dir`, ordered by file name.
///
/// Unreadable or malformed info files are skipped.
pub fn list_running_servers(runtime_dir: &Path) -> Result<Vec<ServerInfo>> {
    let entries = std::fs::read_dir(runtime_dir).map_err(|e| NbTocError::io(runtime_dir, e))?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| SERVER_FILE_RE.is_match(name))
        })
        .collect();
    files.sort();

    let servers: Vec<ServerInfo> = files
        .iter()
        .filter_map(|path| match read_server_info(path) {
            Ok(info) => Some(info),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "skipping server info file");
                None
            }
        })
        .collect();

    debug!(
        runtime_dir = %runtime_dir.display(),
        servers = servers.len(),
        "running servers listed"
    );

    Ok(servers)
}

fn read_server_info(path: &Path) -> Result<ServerInfo> {
    let content = std::fs::read_to_string(path).map_err(|e| NbTocError::io(path, e))?;
    serde_json::from_str(&content)
        .map_err(|e| NbTocError::parse(format!("{}: {e}", path.display())))
}
