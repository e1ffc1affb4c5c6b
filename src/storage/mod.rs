pub mod migrate;

use crate::config::StorageConfig;
use crate::error::StorageError;
use crate::models::{Diagnostic, DiagnosticScope, Ledger};
use chrono::Local;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use self::migrate::{LedgerDefaults, upgrade};

// ── Load result ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOrigin {
    /// No file yet; fresh ledger from config defaults.
    Missing,
    Current,
    /// Upgraded in memory from an older revision.
    Migrated { from: u32 },
    /// File was unreadable as a ledger; fresh ledger from config defaults.
    Recovered,
}

#[derive(Debug, Clone)]
pub struct LoadedLedger {
    pub ledger: Ledger,
    pub origin: LoadOrigin,
    pub diagnostics: Vec<Diagnostic>,
}

// ── Store ─────────────────────────────────────────────────────────────────────

/// The JSON file backing the ledger. Read once, written whole.
pub struct LedgerStore {
    path: PathBuf,
    backup_corrupt: bool,
    defaults: LedgerDefaults,
}

impl LedgerStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            path: config.ledger_path.clone(),
            backup_corrupt: config.backup_corrupt,
            defaults: LedgerDefaults {
                start_date: config.start_date,
                start_pnl: config.start_pnl,
                start_equity: config.start_equity,
            },
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn fresh(&self) -> Ledger {
        Ledger::new(
            self.defaults.start_date,
            self.defaults.start_pnl,
            self.defaults.start_equity,
        )
    }

    /// Load the ledger. A missing file gives a fresh ledger; a corrupt one is
    /// set aside (when configured) and replaced by a fresh ledger. Only I/O
    /// failures other than "not found" are errors.
    pub fn load(&self) -> Result<LoadedLedger, StorageError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No ledger at {:?}, starting fresh", self.path);
                return Ok(LoadedLedger {
                    ledger: self.fresh(),
                    origin: LoadOrigin::Missing,
                    diagnostics: vec![],
                });
            }
            Err(source) => {
                return Err(StorageError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let parsed = serde_json::from_str(&text)
            .map_err(StorageError::from)
            .and_then(|value| upgrade(value, &self.defaults));

        match parsed {
            Ok((ledger, None)) => {
                info!("Loaded {} entries from {:?}", ledger.daily_entries.len(), self.path);
                Ok(LoadedLedger { ledger, origin: LoadOrigin::Current, diagnostics: vec![] })
            }
            Ok((ledger, Some(from))) => Ok(LoadedLedger {
                ledger,
                origin: LoadOrigin::Migrated { from },
                diagnostics: vec![],
            }),
            Err(e @ StorageError::UnsupportedVersion { .. }) => Err(e),
            Err(e) => {
                warn!("Ledger {:?} is unusable ({}), starting fresh", self.path, e);
                let mut diagnostics = vec![Diagnostic::new(
                    self.path.display().to_string(),
                    DiagnosticScope::Store,
                    format!("discarded unusable ledger: {}", e),
                )];
                if self.backup_corrupt {
                    match self.backup() {
                        Ok(copy) => diagnostics.push(Diagnostic::new(
                            self.path.display().to_string(),
                            DiagnosticScope::Store,
                            format!("previous contents saved to {}", copy.display()),
                        )),
                        Err(err) => warn!("Could not back up {:?}: {}", self.path, err),
                    }
                }
                Ok(LoadedLedger {
                    ledger: self.fresh(),
                    origin: LoadOrigin::Recovered,
                    diagnostics,
                })
            }
        }
    }

    fn backup(&self) -> std::io::Result<PathBuf> {
        let stamp = Local::now().format("%Y%m%d%H%M%S");
        let mut name = self.path.as_os_str().to_owned();
        name.push(format!(".corrupt-{}", stamp));
        let copy = PathBuf::from(name);
        std::fs::copy(&self.path, &copy)?;
        Ok(copy)
    }

    /// Overwrite the backing file with the whole ledger (2-space pretty JSON),
    /// going through a temporary sibling so a failed write leaves the old file.
    pub fn save(&self, ledger: &Ledger) -> Result<(), StorageError> {
        let write_err = |source| StorageError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }

        let json = serde_json::to_string_pretty(ledger)?;
        let mut tmp = self.path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        std::fs::write(&tmp, json).map_err(write_err)?;
        std::fs::rename(&tmp, &self.path).map_err(write_err)?;
        info!("Saved {} entries to {:?}", ledger.daily_entries.len(), self.path);
        Ok(())
    }
}

// ── CSV export ────────────────────────────────────────────────────────────────

/// Write one CSV row per day record. Returns the number of rows written.
pub fn export_csv<W: Write>(ledger: &Ledger, out: W) -> Result<usize, StorageError> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record([
        "date",
        "pdf_file",
        "pnl",
        "cumulative_pnl",
        "gross_pnl",
        "fees",
        "trades_count",
        "win_rate",
        "max_drawdown",
    ])?;

    let opt = |v: Option<f64>| v.map(|x| format!("{:.2}", x)).unwrap_or_default();
    for e in &ledger.daily_entries {
        wtr.write_record([
            e.date.to_string(),
            e.pdf_file.clone(),
            format!("{:.2}", e.pnl),
            format!("{:.2}", e.cumulative_pnl),
            opt(e.gross_pnl),
            opt(e.fees),
            e.trades_count.map(|n| n.to_string()).unwrap_or_default(),
            opt(e.win_rate),
            opt(e.max_drawdown),
        ])?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(ledger.daily_entries.len())
}
