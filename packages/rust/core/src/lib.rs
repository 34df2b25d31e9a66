//! Core domain logic for nbtoc.
//!
//! This crate holds the pure heading-extraction algorithm (`toc`) and the
//! pipeline that wires a locator and a loader around it (`pipeline`).

pub mod pipeline;
pub mod toc;

pub use pipeline::{TocOutcome, TocRequest, generate_toc, resolve_notebook};
pub use toc::{TocResult, build_toc, heading_title, slugify_anchor};
