//! Pipeline orchestrator: ties discovery → extraction → ledger together.
//!
//! ## Run
//!
//! 1. Load the ledger (fresh on missing/corrupt file, upgraded if old)
//! 2. Discover statement PDFs under the base directory
//! 3. For each file not already in the ledger: extract, then merge
//! 4. Save the ledger once, only if something was appended
//!
//! Idempotent: re-running over the same files appends nothing and leaves the
//! ledger file untouched.

use crate::config::AppConfig;
use crate::extractor::{StatementExtractor, StatementReader};
use crate::ledger::MergeOutcome;
use crate::loader::{discover_statements, file_name};
use crate::models::{Diagnostic, DiagnosticScope};
use crate::storage::{LedgerStore, LoadOrigin};
use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use tracing::{debug, info, warn};

pub struct Pipeline<R: StatementReader> {
    config: AppConfig,
    reader: R,
}

impl<R: StatementReader> Pipeline<R> {
    pub fn new(config: AppConfig, reader: R) -> Self {
        Self { config, reader }
    }

    pub fn run(&self) -> Result<RunReport> {
        self.run_as_of(Local::now().date_naive())
    }

    /// Run with `today` as the fallback date for undated statements.
    pub fn run_as_of(&self, today: NaiveDate) -> Result<RunReport> {
        let store = LedgerStore::new(&self.config.storage);

        // ── 1. Ledger ──────────────────────────────────────────────────────────
        let loaded = store.load().context("Failed to load ledger")?;
        let mut ledger = loaded.ledger;
        let mut report = RunReport {
            ledger_origin: loaded.origin,
            diagnostics: loaded.diagnostics,
            ..RunReport::default()
        };
        info!("Ledger: {} entries ({:?})", ledger.daily_entries.len(), loaded.origin);

        // ── 2. Discover ────────────────────────────────────────────────────────
        let files = discover_statements(&self.config.scanner)
            .context("Statement discovery failed")?;
        report.files_found = files.len();
        info!(
            "Found {} statement files under {:?}",
            files.len(),
            self.config.scanner.base_dir
        );

        // ── 3. Extract + merge ─────────────────────────────────────────────────
        let extractor = StatementExtractor::new(self.config.extraction.clone());

        for path in &files {
            let Some(name) = file_name(path) else {
                warn!("Skipping {:?}: file name is not UTF-8", path);
                report.failed += 1;
                continue;
            };

            if ledger.contains(name) {
                debug!("{}: already recorded", name);
                report.already_recorded += 1;
                continue;
            }

            let extraction = match extractor.extract_file(&self.reader, path, today) {
                Ok(x) => x,
                Err(e) => {
                    warn!("{}: {:#}", name, e);
                    report.failed += 1;
                    report.diagnostics.push(Diagnostic::new(
                        name,
                        DiagnosticScope::Document,
                        e.to_string(),
                    ));
                    continue;
                }
            };
            report.diagnostics.extend(extraction.diagnostics);

            let Some(record) = extraction.record else {
                report.no_pnl += 1;
                continue;
            };

            let (pnl, source) = (record.pnl, record.pnl_source);
            match ledger.merge(record) {
                MergeOutcome::Appended { cumulative_pnl } => {
                    info!(
                        "{}: P/L {:.2} ({}) → cumulative {:.2}",
                        name,
                        pnl,
                        source.map(|s| s.to_string()).unwrap_or_default(),
                        cumulative_pnl
                    );
                    report.appended += 1;
                }
                MergeOutcome::Duplicate => report.already_recorded += 1,
            }
        }

        // ── 4. Persist ─────────────────────────────────────────────────────────
        report.cumulative_pnl = ledger.last_cumulative();
        report.total_entries = ledger.daily_entries.len();

        if report.appended > 0 {
            store.save(&ledger).context("Failed to save ledger")?;
            report.ledger_written = true;
        } else {
            info!("No new statements, ledger left untouched");
        }

        info!(
            "=== Done: {} found | {} new | {} known | {} without P/L | {} failed | cumulative {:.2} ===",
            report.files_found,
            report.appended,
            report.already_recorded,
            report.no_pnl,
            report.failed,
            report.cumulative_pnl,
        );

        Ok(report)
    }
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub ledger_origin: LoadOrigin,
    pub files_found: usize,
    pub already_recorded: usize,
    pub appended: usize,
    pub no_pnl: usize,
    pub failed: usize,
    pub total_entries: usize,
    pub cumulative_pnl: f64,
    pub ledger_written: bool,
    pub diagnostics: Vec<Diagnostic>,
}

impl Default for RunReport {
    fn default() -> Self {
        Self {
            ledger_origin: LoadOrigin::Missing,
            files_found: 0,
            already_recorded: 0,
            appended: 0,
            no_pnl: 0,
            failed: 0,
            total_entries: 0,
            cumulative_pnl: 0.0,
            ledger_written: false,
            diagnostics: Vec::new(),
        }
    }
}
