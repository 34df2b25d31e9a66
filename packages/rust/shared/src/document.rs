//! Capability traits for the environment-facing collaborators.
//!
//! The TOC builder itself is pure; everything that touches a running Jupyter
//! session or the filesystem sits behind these two traits.

use std::future::Future;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::types::TextBlock;

/// Resolves the "current" notebook from ambient session state.
///
/// Implementations are best-effort: any failure yields `None`.
pub trait DocumentLocator {
    fn locate(&self) -> impl Future<Output = Option<PathBuf>> + Send;
}

/// Reads a notebook container into its ordered cells.
pub trait DocumentLoader {
    fn load(&self, path: &Path) -> Result<Vec<TextBlock>>;
}
