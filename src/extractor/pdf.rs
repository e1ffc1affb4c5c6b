//! `pdftotext -layout` backed statement reader.
//!
//! Text comes straight from poppler. Table grids are rebuilt from the layout
//! text: a header-like line (two or more non-numeric cells separated by runs of
//! at least two spaces) opens a table, and every following multi-cell line is a
//! row until a line with fewer than two cells, or a summary/total line, closes
//! it.

use super::StatementReader;
use super::cleaner::parse_amount;
use super::summary::is_summary_label;
use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use crate::models::{RawTable, StatementDocument};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::cell::OnceCell;
use std::sync::LazyLock;
use tracing::debug;

static CELL_GAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("valid cell separator regex"));

/// The binary is located on first use, so a run with nothing to read never
/// needs poppler installed.
pub struct PdftotextReader {
    tool: String,
    bin: OnceCell<PathBuf>,
}

impl PdftotextReader {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            tool: config.pdftotext_bin.clone(),
            bin: OnceCell::new(),
        }
    }

    fn bin(&self) -> Result<&PathBuf, ExtractError> {
        if let Some(bin) = self.bin.get() {
            return Ok(bin);
        }
        let found = which::which(&self.tool).map_err(|e| ExtractError::ToolMissing {
            tool: self.tool.clone(),
            reason: e.to_string(),
        })?;
        debug!("Using {:?}", found);
        Ok(self.bin.get_or_init(|| found))
    }

    fn run(&self, path: &Path) -> Result<String, ExtractError> {
        let bin = self.bin()?;
        let tool = bin.display().to_string();
        let output = Command::new(bin)
            .arg("-layout")
            .arg(path)
            .arg("-")
            .output()
            .map_err(|source| ExtractError::Spawn {
                tool: tool.clone(),
                path: path.to_path_buf(),
                source,
            })?;

        if !output.status.success() {
            return Err(ExtractError::ToolFailed {
                tool,
                path: path.to_path_buf(),
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl StatementReader for PdftotextReader {
    fn read(&self, path: &Path) -> Result<StatementDocument, ExtractError> {
        let text = self.run(path)?;
        if text.trim().is_empty() {
            return Err(ExtractError::EmptyText(path.to_path_buf()));
        }

        let doc = document_from_layout(&text);
        debug!(
            "{:?}: {} pages, {} tables",
            path,
            doc.pages.len(),
            doc.tables.len()
        );
        Ok(doc)
    }
}

/// Split layout text into pages (form feed separated) and derive tables.
pub fn document_from_layout(text: &str) -> StatementDocument {
    let mut pages: Vec<String> = text.split('\x0c').map(str::to_string).collect();
    while pages.last().is_some_and(|p| p.trim().is_empty()) {
        pages.pop();
    }
    let tables = pages.iter().flat_map(|p| layout_tables(p)).collect();
    StatementDocument { pages, tables }
}

pub fn split_cells(line: &str) -> Vec<String> {
    CELL_GAP
        .split(line.trim())
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

fn is_header_like(cells: &[String]) -> bool {
    cells.len() >= 2 && cells.iter().all(|c| parse_amount(c).is_none())
}

/// Tables found on one page of layout text.
pub fn layout_tables(page: &str) -> Vec<RawTable> {
    let mut tables = Vec::new();
    let mut current: Option<RawTable> = None;

    for line in page.lines() {
        let cells = split_cells(line);

        let summary_line = cells.first().is_some_and(|c| is_summary_label(c));

        if summary_line {
            if let Some(done) = current.take() {
                tables.push(done);
            }
        } else if is_header_like(&cells) {
            if let Some(done) = current.take() {
                tables.push(done);
            }
            current = Some(RawTable { rows: vec![cells] });
        } else if cells.len() >= 2 {
            if let Some(t) = current.as_mut() {
                t.rows.push(cells);
            }
        } else if let Some(done) = current.take() {
            tables.push(done);
        }
    }
    if let Some(done) = current {
        tables.push(done);
    }

    tables.retain(|t| t.rows.len() >= 2);
    tables
}
