//! End-to-end `toc` pipeline: locate → load → build.

use std::path::PathBuf;

use tracing::{debug, info, instrument, warn};

use nbtoc_shared::{
    DEFAULT_MAX_DEPTH, DocumentLoader, DocumentLocator, NO_DOCUMENT_MESSAGE, TocConfig,
};

use crate::toc::{self, TocResult};

/// Input to the [`generate_toc`] pipeline.
#[derive(Debug, Clone)]
pub struct TocRequest {
    /// Explicit notebook path; `None` falls back to the locator.
    pub notebook: Option<PathBuf>,
    /// Deepest heading level to include.
    pub max_depth: usize,
}

impl Default for TocRequest {
    fn default() -> Self {
        Self {
            notebook: None,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl From<&TocConfig> for TocRequest {
    fn from(config: &TocConfig) -> Self {
        Self {
            notebook: config.notebook.clone(),
            max_depth: config.max_depth,
        }
    }
}

/// Result of the [`generate_toc`] pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TocOutcome {
    /// A notebook was loaded; its TOC may still be empty.
    Toc(TocResult),
    /// No notebook could be located or loaded.
    DocumentNotFound,
}

impl TocOutcome {
    /// Render the TOC, or the matching placeholder message.
    pub fn render(&self) -> String {
        match self {
            Self::Toc(result) => result.render(),
            Self::DocumentNotFound => NO_DOCUMENT_MESSAGE.to_string(),
        }
    }

    /// Short status label used by machine-readable output.
    pub fn status(&self) -> &'static str {
        match self {
            Self::Toc(TocResult::Entries(_)) => "ok",
            Self::Toc(TocResult::Empty) => "empty",
            Self::DocumentNotFound => "not_found",
        }
    }
}

/// Resolve which notebook to read: the explicit one, else whatever the
/// locator finds. The path must exist on disk.
pub async fn resolve_notebook<L>(notebook: Option<PathBuf>, locator: &L) -> Option<PathBuf>
where
    L: DocumentLocator,
{
    let path = match notebook {
        Some(path) => path,
        None => {
            debug!("no notebook given, trying auto-detection");
            locator.locate().await?
        }
    };

    if !path.exists() {
        debug!(path = %path.display(), "notebook path does not exist");
        return None;
    }

    Some(path)
}

/// Run the full `toc` pipeline.
///
/// 1. Resolve the notebook (explicit path or locator)
/// 2. Load its cells
/// 3. Build the TOC
///
/// Every failure before step 3 collapses into [`TocOutcome::DocumentNotFound`].
#[instrument(skip_all, fields(notebook = ?request.notebook, max_depth = request.max_depth))]
pub async fn generate_toc<L, D>(request: &TocRequest, locator: &L, loader: &D) -> TocOutcome
where
    L: DocumentLocator,
    D: DocumentLoader,
{
    let Some(path) = resolve_notebook(request.notebook.clone(), locator).await else {
        info!("no notebook located");
        return TocOutcome::DocumentNotFound;
    };

    let blocks = match loader.load(&path) {
        Ok(blocks) => blocks,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to load notebook");
            return TocOutcome::DocumentNotFound;
        }
    };

    let result = toc::build_toc(&blocks, request.max_depth);

    info!(
        path = %path.display(),
        cells = blocks.len(),
        entries = result.len(),
        "table of contents generated"
    );

    TocOutcome::Toc(result)
}
