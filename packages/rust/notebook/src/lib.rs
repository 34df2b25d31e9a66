//! Jupyter notebook (`.ipynb`) reader.
//!
//! Reads the nbformat JSON container and exposes each cell as a
//! [`TextBlock`]: Markdown cells keep their kind, everything else (code, raw,
//! unknown types) becomes [`CellKind::Other`]. nbformat 3 notebooks are
//! upgraded on the fly: their worksheets are flattened and `heading` cells
//! become Markdown headings.

use std::path::Path;

use serde::Deserialize;
use tracing::{debug, instrument};

use nbtoc_shared::{CellKind, DocumentLoader, NbTocError, Result, TextBlock};

/// Oldest nbformat major version whose cell layout we understand.
const MIN_NBFORMAT: u32 = 3;

/// Last major version that kept cells inside `worksheets`.
const WORKSHEET_NBFORMAT: u32 = 3;

// ---------------------------------------------------------------------------
// Raw nbformat schema (only the fields we read)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawNotebook {
    nbformat: u32,
    #[serde(default)]
    cells: Vec<RawCell>,
    /// nbformat 3 only.
    #[serde(default)]
    worksheets: Vec<RawWorksheet>,
}

#[derive(Debug, Deserialize)]
struct RawWorksheet {
    #[serde(default)]
    cells: Vec<RawCell>,
}

#[derive(Debug, Deserialize)]
struct RawCell {
    cell_type: String,
    #[serde(default)]
    source: MultilineString,
    /// nbformat 3 code cells keep their text here.
    #[serde(default)]
    input: Option<MultilineString>,
    /// nbformat 3 heading cells.
    #[serde(default)]
    level: Option<usize>,
}

/// nbformat stores text either as one string or as a list of lines that
/// already carry their own `\n`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MultilineString {
    Single(String),
    Lines(Vec<String>),
}

impl Default for MultilineString {
    fn default() -> Self {
        Self::Single(String::new())
    }
}

impl MultilineString {
    fn into_string(self) -> String {
        match self {
            Self::Single(s) => s,
            Self::Lines(lines) => lines.concat(),
        }
    }
}

impl From<RawCell> for TextBlock {
    fn from(cell: RawCell) -> Self {
        match cell.cell_type.as_str() {
            "markdown" => TextBlock {
                kind: CellKind::Markdown,
                content: cell.source.into_string(),
            },
            "heading" => TextBlock {
                kind: CellKind::Markdown,
                content: heading_cell_markdown(cell.level.unwrap_or(1), &cell.source.into_string()),
            },
            _ => TextBlock {
                kind: CellKind::Other,
                content: cell.input.unwrap_or(cell.source).into_string(),
            },
        }
    }
}

/// A v3 heading cell as a single ATX heading line; multi-line text is
/// joined with spaces.
fn heading_cell_markdown(level: usize, text: &str) -> String {
    let marker = "#".repeat(level.max(1));
    let title = text.lines().collect::<Vec<_>>().join(" ");
    format!("{marker} {title}")
}

// ---------------------------------------------------------------------------
// Loader
// ---------------------------------------------------------------------------

/// [`DocumentLoader`] for `.ipynb` files on disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct IpynbLoader;

impl DocumentLoader for IpynbLoader {
    fn load(&self, path: &Path) -> Result<Vec<TextBlock>> {
        load_notebook(path)
    }
}

/// Read and parse a notebook file.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load_notebook(path: &Path) -> Result<Vec<TextBlock>> {
    let content = std::fs::read_to_string(path).map_err(|e| NbTocError::io(path, e))?;

    parse_notebook(&content).map_err(|e| match e {
        NbTocError::Parse { message } => {
            NbTocError::parse(format!("{}: {message}", path.display()))
        }
        other => other,
    })
}

/// Parse notebook JSON held in memory.
pub fn parse_notebook(content: &str) -> Result<Vec<TextBlock>> {
    let raw: RawNotebook = serde_json::from_str(content)
        .map_err(|e| NbTocError::parse(format!("invalid notebook JSON: {e}")))?;

    if raw.nbformat < MIN_NBFORMAT {
        return Err(NbTocError::validation(format!(
            "nbformat {} not supported (need {MIN_NBFORMAT} or later)",
            raw.nbformat
        )));
    }

    let cells = if raw.nbformat <= WORKSHEET_NBFORMAT {
        raw.worksheets
            .into_iter()
            .flat_map(|worksheet| worksheet.cells)
            .collect()
    } else {
        raw.cells
    };

    let blocks: Vec<TextBlock> = cells.into_iter().map(TextBlock::from).collect();

    debug!(
        nbformat = raw.nbformat,
        cells = blocks.len(),
        markdown = blocks.iter().filter(|b| b.is_markdown()).count(),
        "notebook parsed"
    );

    Ok(blocks)
}
