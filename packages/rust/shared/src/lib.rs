//! Shared types, error model, and configuration for nbtoc.
//!
//! This crate is the foundation depended on by all other nbtoc crates.
//! It provides:
//! - [`NbTocError`], the unified error type
//! - Domain types ([`TextBlock`], [`CellKind`], [`TocEntry`])
//! - Capability traits ([`DocumentLocator`], [`DocumentLoader`])
//! - Configuration ([`AppConfig`], [`TocConfig`], config loading)

pub mod config;
pub mod document;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, LocatorConfig, OutputFormat, TocConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from, validate_max_depth,
};
pub use document::{DocumentLoader, DocumentLocator};
pub use error::{NbTocError, Result};
pub use types::{
    CellKind, DEFAULT_MAX_DEPTH, NO_DOCUMENT_MESSAGE, NO_HEADINGS_MESSAGE, TextBlock, TocEntry,
};
