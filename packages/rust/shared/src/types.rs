//! Core domain types: notebook cells in, table-of-contents entries out.

use serde::{Deserialize, Serialize};

/// Deepest heading level included when nothing else is configured.
pub const DEFAULT_MAX_DEPTH: usize = 3;

/// Placeholder rendered when no notebook could be located or loaded.
pub const NO_DOCUMENT_MESSAGE: &str = "_Unable to locate the notebook for TOC generation._";

/// Placeholder rendered when a notebook has no qualifying headings.
pub const NO_HEADINGS_MESSAGE: &str = "_Add Markdown headings to populate the table of contents._";

/// Two-space indent unit applied once per nesting level.
const INDENT_UNIT: &str = "  ";

// ---------------------------------------------------------------------------
// TextBlock
// ---------------------------------------------------------------------------

/// Discriminates Markdown cells from everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellKind {
    Markdown,
    Other,
}

/// One cell of a document: its kind and raw text (lines separated by `\n`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBlock {
    pub kind: CellKind,
    pub content: String,
}

impl TextBlock {
    /// A Markdown cell.
    pub fn markdown(content: impl Into<String>) -> Self {
        Self {
            kind: CellKind::Markdown,
            content: content.into(),
        }
    }

    /// A non-Markdown cell (code, raw, ...).
    pub fn other(content: impl Into<String>) -> Self {
        Self {
            kind: CellKind::Other,
            content: content.into(),
        }
    }

    pub fn is_markdown(&self) -> bool {
        self.kind == CellKind::Markdown
    }
}

// ---------------------------------------------------------------------------
// TocEntry
// ---------------------------------------------------------------------------

/// A single heading in the table of contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    /// Heading depth (1 = H1).
    pub level: usize,
    /// Heading text with markers and surrounding whitespace removed.
    pub title: String,
    /// URL fragment (without the leading `#`).
    pub anchor: String,
}

impl TocEntry {
    /// Render as a nested Markdown bullet: `  * [Title](#title)`.
    pub fn render_line(&self) -> String {
        let indent = INDENT_UNIT.repeat(self.level.saturating_sub(1));
        format!("{indent}* [{}](#{})", self.title, self.anchor)
    }
}
