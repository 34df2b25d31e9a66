//! TOC (Table of Contents) builder.
//!
//! Scans the Markdown cells of a notebook for ATX-style heading lines and
//! turns each one into a flat [`TocEntry`] carrying its depth, title, and
//! anchor slug. Nesting is a rendering concern derived from `level`.

use tracing::{debug, instrument};

use nbtoc_shared::{NO_HEADINGS_MESSAGE, TextBlock, TocEntry};

/// The heading marker character.
const HEADING_MARKER: char = '#';

/// Outcome of a TOC build over a set of blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TocResult {
    /// At least one qualifying heading, in document order.
    Entries(Vec<TocEntry>),
    /// No heading survived the kind and depth filters.
    Empty,
}

impl TocResult {
    /// The entries, or an empty slice for [`TocResult::Empty`].
    pub fn entries(&self) -> &[TocEntry] {
        match self {
            Self::Entries(entries) => entries,
            Self::Empty => &[],
        }
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Render as a nested Markdown link list, or the "no headings" placeholder.
    pub fn render(&self) -> String {
        match self {
            Self::Entries(entries) => entries
                .iter()
                .map(TocEntry::render_line)
                .collect::<Vec<_>>()
                .join("\n"),
            Self::Empty => NO_HEADINGS_MESSAGE.to_string(),
        }
    }
}

/// A heading line found while scanning: its depth and the trimmed source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct HeadingLine<'a> {
    pub depth: usize,
    pub line: &'a str,
}

/// Build a TOC from an ordered sequence of notebook cells.
///
/// Non-Markdown cells are skipped. Headings deeper than `max_depth` are
/// dropped before their titles are extracted. A `max_depth` of 0 is treated
/// as 1.
#[instrument(skip_all, fields(block_count = blocks.len(), max_depth = max_depth))]
pub fn build_toc(blocks: &[TextBlock], max_depth: usize) -> TocResult {
    let max_depth = if max_depth == 0 {
        debug!("max_depth 0 clamped to 1");
        1
    } else {
        max_depth
    };

    let entries: Vec<TocEntry> = blocks
        .iter()
        .filter(|block| block.is_markdown())
        .flat_map(|block| block.content.split('\n'))
        .filter_map(parse_heading)
        .filter(|heading| heading.depth <= max_depth)
        .map(|heading| {
            let title = heading_title(heading.line);
            TocEntry {
                level: heading.depth,
                anchor: slugify_anchor(&title),
                title,
            }
        })
        .collect();

    debug!(entries = entries.len(), "TOC built from markdown cells");

    if entries.is_empty() {
        TocResult::Empty
    } else {
        TocResult::Entries(entries)
    }
}

/// Recognize a heading line. Depth is the run of leading `#` characters;
/// no upper bound is applied here.
pub(crate) fn parse_heading(line: &str) -> Option<HeadingLine<'_>> {
    let line = line.trim();
    if !line.starts_with(HEADING_MARKER) {
        return None;
    }

    let depth = line.chars().take_while(|&c| c == HEADING_MARKER).count();
    Some(HeadingLine { depth, line })
}

/// Strip heading markers and whitespace from both ends of a heading line.
///
/// A closing `###` sequence is removed along with the opening one, and so is
/// a literal trailing `#` such as the one in `C#`.
pub fn heading_title(line: &str) -> String {
    line.trim_matches(|c: char| c == HEADING_MARKER || c.is_whitespace())
        .to_string()
}

/// Derive a URL fragment from a heading title.
///
/// Lowercases, drops everything outside `[a-z0-9 -]`, then turns spaces into
/// hyphens. Filtering happens before substitution.
pub fn slugify_anchor(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .filter(|c| matches!(c, 'a'..='z' | '0'..='9' | ' ' | '-'))
        .map(|c| if c == ' ' { '-' } else { c })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
