use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Version written by this build. Older files are upgraded on load.
pub const SCHEMA_VERSION: u32 = 4;

// ── Ledger ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ledger {
    pub schema_version: u32,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub start_pnl: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_equity: Option<f64>,
    #[serde(default)]
    pub daily_entries: Vec<DayRecord>,
}

// ── Day record ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DayRecord {
    pub pdf_file: String,
    pub date: NaiveDate,
    pub pnl: f64,
    #[serde(default)]
    pub cumulative_pnl: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gross_pnl: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fees: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trades_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub win_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expectancy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_runup: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_drawdown: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ending_equity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pnl_source: Option<PnlSource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trades: Vec<TradeRecord>,
}

impl DayRecord {
    /// A bare record with only the key fields set.
    pub fn new(pdf_file: impl Into<String>, date: NaiveDate, pnl: f64) -> Self {
        Self {
            pdf_file: pdf_file.into(),
            date,
            pnl,
            cumulative_pnl: 0.0,
            gross_pnl: None,
            fees: None,
            trades_count: None,
            win_rate: None,
            expectancy: None,
            max_runup: None,
            max_drawdown: None,
            ending_equity: None,
            pnl_source: None,
            trades: Vec::new(),
        }
    }
}

/// Which rule produced a record's `pnl`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PnlSource {
    SummaryNet,
    GrossPlusFees,
    TradeTable,
}

impl fmt::Display for PnlSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PnlSource::SummaryNet => "summary net",
            PnlSource::GrossPlusFees => "gross + fees",
            PnlSource::TradeTable => "trade table",
        };
        f.write_str(s)
    }
}

// ── Trade record ──────────────────────────────────────────────────────────────

/// One row of a statement's trades table. Everything but `pnl` is kept verbatim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TradeRecord {
    pub symbol: String,
    pub qty: String,
    pub buy_price: String,
    pub buy_time: String,
    pub sell_price: String,
    pub pnl: f64,
}

// ── Raw document ──────────────────────────────────────────────────────────────

/// Text and table grids pulled out of one statement.
#[derive(Debug, Clone, Default)]
pub struct StatementDocument {
    pub pages: Vec<String>,
    pub tables: Vec<RawTable>,
}

impl StatementDocument {
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.pages.iter().flat_map(|p| p.lines())
    }
}

/// A cell grid; `rows[0]` is the header row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn header(&self) -> Option<&[String]> {
        self.rows.first().map(|r| r.as_slice())
    }

    pub fn body(&self) -> &[Vec<String>] {
        self.rows.get(1..).unwrap_or(&[])
    }
}

/// Labelled values found in a statement's summary section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryFields {
    pub net_pnl: Option<f64>,
    pub gross_pnl: Option<f64>,
    pub fees: Option<f64>,
    pub win_rate: Option<f64>,
    pub trades_count: Option<f64>,
    pub expectancy: Option<f64>,
    pub max_runup: Option<f64>,
    pub max_drawdown: Option<f64>,
    pub ending_equity: Option<f64>,
}

// ── Diagnostics ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticScope {
    Field(&'static str),
    Row(usize),
    Date,
    Document,
    Store,
}

impl fmt::Display for DiagnosticScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticScope::Field(name) => write!(f, "field {}", name),
            DiagnosticScope::Row(n) => write!(f, "row {}", n),
            DiagnosticScope::Date => f.write_str("date"),
            DiagnosticScope::Document => f.write_str("document"),
            DiagnosticScope::Store => f.write_str("store"),
        }
    }
}

/// Something that was skipped or approximated without failing the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub document: String,
    pub scope: DiagnosticScope,
    pub message: String,
}

impl Diagnostic {
    pub fn new(document: impl Into<String>, scope: DiagnosticScope, message: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            scope,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.document, self.scope, self.message)
    }
}
