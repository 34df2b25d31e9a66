//! Active-notebook discovery for a running Jupyter session.
//!
//! Given the connection file of the current kernel, we ask every running
//! Jupyter server for its sessions (`GET /api/sessions`) and pick the one
//! attached to that kernel. Everything here is best-effort: the
//! [`DocumentLocator`] implementation turns every failure into `None` so the
//! caller can fall back to asking for an explicit notebook.

mod runtime;

use std::path::{Path, PathBuf};
use std::time::Duration;

use nbtoc_shared::{DocumentLocator, NbTocError, Result, TocConfig};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument};
use url::Url;

pub use runtime::{
    RUNTIME_DIR_ENV, ServerInfo, default_runtime_dir, kernel_id_from_connection_file,
    list_running_servers,
};

/// Default timeout in seconds for each server request.
const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Sessions endpoint, relative to the server's base URL.
const SESSIONS_PATH: &str = "api/sessions";

/// User-Agent string for session requests.
const USER_AGENT: &str = concat!("nbtoc/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Locator options
// ---------------------------------------------------------------------------

/// Configuration for session-based notebook discovery.
#[derive(Debug, Clone)]
pub struct LocatorOptions {
    /// Connection file of the kernel whose notebook we want.
    pub connection_file: Option<PathBuf>,
    /// Runtime directory override; `None` uses Jupyter's default.
    pub runtime_dir: Option<PathBuf>,
    /// Timeout for each HTTP request in seconds.
    pub timeout_secs: u64,
}

impl Default for LocatorOptions {
    fn default() -> Self {
        Self {
            connection_file: None,
            runtime_dir: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl From<&TocConfig> for LocatorOptions {
    fn from(config: &TocConfig) -> Self {
        Self {
            connection_file: config.connection_file.clone(),
            runtime_dir: config.runtime_dir.clone(),
            timeout_secs: config.timeout_secs,
        }
    }
}

// ---------------------------------------------------------------------------
// Sessions API schema (only the fields we read)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Session {
    #[serde(default)]
    kernel: Option<KernelRef>,
    #[serde(default)]
    notebook: Option<NotebookRef>,
    #[serde(default)]
    path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct KernelRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct NotebookRef {
    path: String,
}

impl Session {
    fn kernel_id(&self) -> Option<&str> {
        self.kernel.as_ref().map(|k| k.id.as_str())
    }

    /// Notebook path relative to the server root. Older servers nest it
    /// under `notebook`, newer ones put it at the top level.
    fn notebook_path(&self) -> Option<&str> {
        self.notebook
            .as_ref()
            .map(|nb| nb.path.as_str())
            .or(self.path.as_deref())
    }
}

// ---------------------------------------------------------------------------
// SessionLocator
// ---------------------------------------------------------------------------

/// [`DocumentLocator`] backed by the Jupyter sessions API.
#[derive(Debug, Clone, Default)]
pub struct SessionLocator {
    opts: LocatorOptions,
}

impl SessionLocator {
    pub fn new(opts: LocatorOptions) -> Self {
        Self { opts }
    }
}

impl DocumentLocator for SessionLocator {
    async fn locate(&self) -> Option<PathBuf> {
        match find_current_notebook(&self.opts).await {
            Ok(found) => found,
            Err(e) => {
                debug!(error = %e, "notebook auto-detection failed");
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

/// Find the notebook attached to the kernel named by `opts.connection_file`.
///
/// Servers are queried one at a time, in runtime-file order; a server that
/// fails to answer is skipped, never retried. `Ok(None)` means every server
/// answered (or was skipped) without a matching session.
#[instrument(skip_all, fields(connection_file = ?opts.connection_file))]
pub async fn find_current_notebook(opts: &LocatorOptions) -> Result<Option<PathBuf>> {
    let Some(connection_file) = opts.connection_file.as_deref() else {
        debug!("no kernel connection file configured");
        return Ok(None);
    };

    let kernel_id = kernel_id_from_connection_file(connection_file).ok_or_else(|| {
        NbTocError::validation(format!(
            "cannot derive kernel id from {}",
            connection_file.display()
        ))
    })?;

    let runtime_dir = opts
        .runtime_dir
        .clone()
        .or_else(default_runtime_dir)
        .ok_or_else(|| NbTocError::config("could not determine Jupyter runtime directory"))?;

    let servers = list_running_servers(&runtime_dir)?;
    let client = build_client(opts)?;

    for server in &servers {
        match find_in_server(&client, server, &kernel_id).await {
            Ok(Some(path)) => {
                info!(path = %path.display(), server = %server.url, "active notebook found");
                return Ok(Some(path));
            }
            Ok(None) => debug!(server = %server.url, "no session for kernel"),
            Err(e) => debug!(server = %server.url, error = %e, "server query failed"),
        }
    }

    debug!(kernel_id = %kernel_id, servers = servers.len(), "kernel not attached to any session");
    Ok(None)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build a reqwest client with appropriate settings.
fn build_client(opts: &LocatorOptions) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(opts.timeout_secs))
        .build()
        .map_err(|e| NbTocError::Network(format!("failed to build HTTP client: {e}")))
}

/// `{url}/api/sessions`, tolerating a base URL without a trailing slash.
fn sessions_url(base: &str) -> Result<Url> {
    let mut base = Url::parse(base)
        .map_err(|e| NbTocError::validation(format!("invalid server URL '{base}': {e}")))?;

    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }

    base.join(SESSIONS_PATH)
        .map_err(|e| NbTocError::validation(format!("invalid sessions URL: {e}")))
}

/// Query one server for the session running `kernel_id`.
async fn find_in_server(
    client: &Client,
    server: &ServerInfo,
    kernel_id: &str,
) -> Result<Option<PathBuf>> {
    let url = sessions_url(&server.url)?;

    let response = client
        .get(url.clone())
        .query(&[("token", server.token.as_str())])
        .send()
        .await
        .map_err(|e| NbTocError::Network(format!("{url}: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(NbTocError::Network(format!("{url}: HTTP {status}")));
    }

    let sessions: Vec<Session> = response
        .json()
        .await
        .map_err(|e| NbTocError::parse(format!("{url}: invalid sessions response: {e}")))?;

    Ok(sessions
        .iter()
        .find(|session| session.kernel_id() == Some(kernel_id))
        .and_then(Session::notebook_path)
        .map(|path| resolve_session_path(server.content_root(), path)))
}

/// Map a server-relative notebook path to a local path: under the server's
/// root directory when known, otherwise just the file name.
fn resolve_session_path(root: Option<&Path>, session_path: &str) -> PathBuf {
    match root {
        Some(root) => root.join(session_path.trim_start_matches('/')),
        None => PathBuf::from(session_path.rsplit('/').next().unwrap_or(session_path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const KERNEL_ID: &str = "0f9e8d7c-1234-4abc-9def-001122334455";

    struct Runtime {
        dir: tempfile::TempDir,
    }

    impl Runtime {
        fn new() -> Self {
            Self {
                dir: tempfile::tempdir().expect("tempdir"),
            }
        }

        fn add_server(&self, pid: u32, info: serde_json::Value) {
            std::fs::write(
                self.dir.path().join(format!("jpserver-{pid}.json")),
                info.to_string(),
            )
            .expect("write server info");
        }

        fn options(&self, timeout_secs: u64) -> LocatorOptions {
            LocatorOptions {
                connection_file: Some(
                    self.dir.path().join(format!("kernel-{KERNEL_ID}.json")),
                ),
                runtime_dir: Some(self.dir.path().to_path_buf()),
                timeout_secs,
            }
        }
    }

    fn sessions_body(kernel_id: &str, nb_path: &str) -> serde_json::Value {
        serde_json::json!([
            {
                "id": "s-other",
                "path": "other.ipynb",
                "kernel": {"id": "unrelated", "name": "python3"},
                "notebook": {"path": "other.ipynb", "name": ""}
            },
            {
                "id": "s-1",
                "path": nb_path,
                "type": "notebook",
                "kernel": {"id": kernel_id, "name": "python3"},
                "notebook": {"path": nb_path, "name": ""}
            }
        ])
    }

    #[test]
    fn sessions_url_handles_trailing_slash() {
        assert_eq!(
            sessions_url("http://localhost:8888/").unwrap().as_str(),
            "http://localhost:8888/api/sessions"
        );
        assert_eq!(
            sessions_url("http://localhost:8888/lab").unwrap().as_str(),
            "http://localhost:8888/lab/api/sessions"
        );
        assert!(sessions_url("not a url").is_err());
    }

    #[test]
    fn resolve_session_path_prefers_root() {
        assert_eq!(
            resolve_session_path(Some(Path::new("/home/me/work")), "course/day1.ipynb"),
            PathBuf::from("/home/me/work/course/day1.ipynb")
        );
        assert_eq!(
            resolve_session_path(None, "course/day1.ipynb"),
            PathBuf::from("day1.ipynb")
        );
    }

    #[tokio::test]
    async fn test_locate_with_mock_server() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/sessions"))
            .and(query_param("token", "secret"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(sessions_body(KERNEL_ID, "course/day1.ipynb")),
            )
            .mount(&server)
            .await;

        let runtime = Runtime::new();
        runtime.add_server(
            100,
            serde_json::json!({
                "url": format!("{}/", server.uri()),
                "token": "secret",
                "root_dir": "/home/me/work"
            }),
        );

        let locator = SessionLocator::new(runtime.options(5));
        assert_eq!(
            locator.locate().await,
            Some(PathBuf::from("/home/me/work/course/day1.ipynb"))
        );
    }

    #[tokio::test]
    async fn test_locate_without_root_returns_file_name() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/sessions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(sessions_body(KERNEL_ID, "course/day1.ipynb")),
            )
            .mount(&server)
            .await;

        let runtime = Runtime::new();
        runtime.add_server(100, serde_json::json!({ "url": server.uri() }));

        let found = find_current_notebook(&runtime.options(5)).await.unwrap();
        assert_eq!(found, Some(PathBuf::from("day1.ipynb")));
    }

    #[tokio::test]
    async fn test_locate_skips_failing_server() {
        let broken = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/sessions"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&broken)
            .await;

        let healthy = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/sessions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(sessions_body(KERNEL_ID, "nb.ipynb")),
            )
            .mount(&healthy)
            .await;

        let runtime = Runtime::new();
        runtime.add_server(1, serde_json::json!({ "url": broken.uri() }));
        runtime.add_server(2, serde_json::json!({ "url": healthy.uri() }));

        let locator = SessionLocator::new(runtime.options(5));
        assert_eq!(locator.locate().await, Some(PathBuf::from("nb.ipynb")));
    }

    #[tokio::test]
    async fn test_locate_no_matching_kernel() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/sessions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(sessions_body("someone-else", "x.ipynb")),
            )
            .mount(&server)
            .await;

        let runtime = Runtime::new();
        runtime.add_server(1, serde_json::json!({ "url": server.uri() }));

        let locator = SessionLocator::new(runtime.options(5));
        assert_eq!(locator.locate().await, None);
    }

    #[tokio::test]
    async fn test_locate_invalid_sessions_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/sessions"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
            .mount(&server)
            .await;

        let runtime = Runtime::new();
        runtime.add_server(1, serde_json::json!({ "url": server.uri() }));

        assert_eq!(SessionLocator::new(runtime.options(5)).locate().await, None);
    }

    #[tokio::test]
    async fn test_locate_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/sessions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(sessions_body(KERNEL_ID, "slow.ipynb"))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let runtime = Runtime::new();
        runtime.add_server(1, serde_json::json!({ "url": server.uri() }));

        assert_eq!(SessionLocator::new(runtime.options(1)).locate().await, None);
    }

    #[tokio::test]
    async fn test_locate_without_connection_file() {
        let locator = SessionLocator::default();
        assert_eq!(locator.locate().await, None);
    }

    #[tokio::test]
    async fn test_locate_missing_runtime_dir() {
        let runtime = Runtime::new();
        let mut opts = runtime.options(5);
        opts.runtime_dir = Some(runtime.dir.path().join("absent"));

        assert!(find_current_notebook(&opts).await.is_err());
        assert_eq!(SessionLocator::new(opts).locate().await, None);
    }
}
