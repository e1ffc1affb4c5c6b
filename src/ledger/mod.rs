//! Append-only merge of day records into the ledger.
//!
//! The running total follows insertion order: each new entry's
//! `cumulative_pnl` is the previous entry's value plus its own `pnl`, rounded to
//! cents. Existing entries are never touched.

use crate::models::{DayRecord, Ledger, SCHEMA_VERSION};
use crate::utils::round2;
use chrono::NaiveDate;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MergeOutcome {
    Appended { cumulative_pnl: f64 },
    Duplicate,
}

impl Ledger {
    pub fn new(start_date: NaiveDate, start_pnl: f64, start_equity: Option<f64>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            start_date,
            start_pnl,
            start_equity,
            daily_entries: Vec::new(),
        }
    }

    pub fn contains(&self, pdf_file: &str) -> bool {
        self.daily_entries.iter().any(|e| e.pdf_file == pdf_file)
    }

    /// Cumulative value of the most recent entry, or the baseline when empty.
    pub fn last_cumulative(&self) -> f64 {
        self.daily_entries
            .last()
            .map(|e| e.cumulative_pnl)
            .unwrap_or(self.start_pnl)
    }

    pub fn merge(&mut self, mut record: DayRecord) -> MergeOutcome {
        if self.contains(&record.pdf_file) {
            debug!("{} already recorded, skipping", record.pdf_file);
            return MergeOutcome::Duplicate;
        }

        record.cumulative_pnl = round2(self.last_cumulative() + record.pnl);
        let cumulative_pnl = record.cumulative_pnl;
        debug!(
            "{}: {} → cumulative {}",
            record.pdf_file, record.pnl, cumulative_pnl
        );
        self.daily_entries.push(record);
        MergeOutcome::Appended { cumulative_pnl }
    }

    pub fn summary(&self) -> LedgerSummary {
        let entries = &self.daily_entries;
        let best = entries.iter().max_by(|a, b| a.pnl.total_cmp(&b.pnl));
        let worst = entries.iter().min_by(|a, b| a.pnl.total_cmp(&b.pnl));

        LedgerSummary {
            entries: entries.len(),
            first_date: entries.iter().map(|e| e.date).min(),
            last_date: entries.iter().map(|e| e.date).max(),
            cumulative_pnl: self.last_cumulative(),
            best_day: best.map(|e| (e.date, e.pnl)),
            worst_day: worst.map(|e| (e.date, e.pnl)),
            winning_days: entries.iter().filter(|e| e.pnl > 0.0).count(),
            losing_days: entries.iter().filter(|e| e.pnl < 0.0).count(),
            total_trades: entries.iter().filter_map(|e| e.trades_count).map(u64::from).sum(),
        }
    }
}

/// Figures shown by the `stats` command.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerSummary {
    pub entries: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub cumulative_pnl: f64,
    pub best_day: Option<(NaiveDate, f64)>,
    pub worst_day: Option<(NaiveDate, f64)>,
    pub winning_days: usize,
    pub losing_days: usize,
    pub total_trades: u64,
}
