pub mod cleaner;
pub mod pdf;
pub mod summary;
pub mod trades;

use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use crate::loader::{date_from_filename, date_from_text, file_name};
use crate::models::{
    DayRecord, Diagnostic, DiagnosticScope, PnlSource, StatementDocument, SummaryFields,
    TradeRecord,
};
use crate::utils::round2;
use chrono::NaiveDate;
use std::path::Path;
use tracing::{debug, info, warn};

use self::summary::scan_summary;
use self::trades::extract_trades;

// ── Reader trait ──────────────────────────────────────────────────────────────

/// Swappable statement text/table source.
pub trait StatementReader {
    fn read(&self, path: &Path) -> Result<StatementDocument, ExtractError>;
}

// ── Extraction result ─────────────────────────────────────────────────────────

/// Outcome of extracting one statement. `record` is None when no PnL could be
/// resolved; `diagnostics` lists everything that was skipped or approximated.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub record: Option<DayRecord>,
    pub diagnostics: Vec<Diagnostic>,
}

// ── Extractor ─────────────────────────────────────────────────────────────────

pub struct StatementExtractor {
    config: ExtractionConfig,
}

impl StatementExtractor {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    /// Read a statement through `reader` and extract its day record.
    pub fn extract_file(
        &self,
        reader: &dyn StatementReader,
        path: &Path,
        today: NaiveDate,
    ) -> Result<Extraction, ExtractError> {
        let name = file_name(path).ok_or_else(|| ExtractError::FileName(path.to_path_buf()))?;
        let doc = reader.read(path)?;
        Ok(self.extract(name, &doc, today))
    }

    /// Extract a day record from an already-read document. The date comes from
    /// the file name, else from a statement-date line in the text, else
    /// `today`.
    pub fn extract(&self, pdf_file: &str, doc: &StatementDocument, today: NaiveDate) -> Extraction {
        let (summary, mut diagnostics) = scan_summary(pdf_file, doc.lines());
        let (trades, trade_diags) =
            extract_trades(pdf_file, &doc.tables, self.config.exact_table_rows);
        diagnostics.extend(trade_diags);

        let Some((pnl, source)) = resolve_pnl(&summary, &trades) else {
            warn!("{}: no P/L found", pdf_file);
            diagnostics.push(Diagnostic::new(
                pdf_file,
                DiagnosticScope::Document,
                "no P/L found in summary or trade tables",
            ));
            return Extraction { record: None, diagnostics };
        };

        if pnl == 0.0 && self.config.zero_pnl_is_missing {
            info!("{}: P/L resolved to 0.00, treated as missing", pdf_file);
            diagnostics.push(Diagnostic::new(
                pdf_file,
                DiagnosticScope::Document,
                format!("P/L from {} is 0.00 and zero_pnl_is_missing is set", source),
            ));
            return Extraction { record: None, diagnostics };
        }

        let date = match date_from_filename(pdf_file) {
            Some(d) => d,
            None => match date_from_text(doc.lines()) {
                Some(d) => {
                    diagnostics.push(Diagnostic::new(
                        pdf_file,
                        DiagnosticScope::Date,
                        format!("no YYYYMMDD in file name, using statement date {}", d),
                    ));
                    d
                }
                None => {
                    diagnostics.push(Diagnostic::new(
                        pdf_file,
                        DiagnosticScope::Date,
                        format!("no date in file name or text, using processing date {}", today),
                    ));
                    today
                }
            },
        };

        let mut record = DayRecord::new(pdf_file, date, pnl);
        record.pnl_source = Some(source);
        record.gross_pnl = summary.gross_pnl;
        record.fees = summary.fees;
        record.expectancy = summary.expectancy;
        record.max_runup = summary.max_runup;
        record.max_drawdown = summary.max_drawdown;
        record.ending_equity = summary.ending_equity;
        record.trades_count = trades_count(pdf_file, &summary, &trades, &mut diagnostics);
        record.win_rate = summary.win_rate.or_else(|| win_rate(&trades));
        record.trades = trades;

        debug!("{}: pnl {} via {}", pdf_file, record.pnl, source);
        Extraction { record: Some(record), diagnostics }
    }
}

/// Summary net total first, then gross + fees, then the trade table sum.
pub fn resolve_pnl(summary: &SummaryFields, trades: &[TradeRecord]) -> Option<(f64, PnlSource)> {
    if let Some(net) = summary.net_pnl {
        return Some((round2(net), PnlSource::SummaryNet));
    }
    if let Some(gross) = summary.gross_pnl {
        let fees = summary.fees.unwrap_or(0.0);
        return Some((round2(gross + fees), PnlSource::GrossPlusFees));
    }
    if !trades.is_empty() {
        let sum: f64 = trades.iter().map(|t| t.pnl).sum();
        return Some((round2(sum), PnlSource::TradeTable));
    }
    None
}

fn trades_count(
    pdf_file: &str,
    summary: &SummaryFields,
    trades: &[TradeRecord],
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<u32> {
    let from_rows = || (!trades.is_empty()).then(|| trades.len() as u32);
    match summary.trades_count {
        Some(v) if v >= 0.0 && v.fract() == 0.0 && v <= u32::MAX as f64 => Some(v as u32),
        Some(v) => {
            diagnostics.push(Diagnostic::new(
                pdf_file,
                DiagnosticScope::Field("trades_count"),
                format!("{} is not a trade count", v),
            ));
            from_rows()
        }
        None => from_rows(),
    }
}

/// Percentage of trades with positive P/L.
fn win_rate(trades: &[TradeRecord]) -> Option<f64> {
    if trades.is_empty() {
        return None;
    }
    let wins = trades.iter().filter(|t| t.pnl > 0.0).count();
    Some(round2(wins as f64 * 100.0 / trades.len() as f64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawTable;
    use std::cell::Cell;

    fn doc(text: &str, tables: Vec<RawTable>) -> StatementDocument {
        StatementDocument {
            pages: vec![text.to_string()],
            tables,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn trade_table() -> RawTable {
        RawTable {
            rows: vec![
                vec!["Symbol".into(), "Qty".into(), "P/L".into()],
                vec!["AAPL".into(), "10".into(), "$120.00".into()],
                vec!["TSLA".into(), "3".into(), "($20.50)".into()],
            ],
        }
    }

    fn extractor() -> StatementExtractor {
        StatementExtractor::new(ExtractionConfig::default())
    }

    #[test]
    fn test_total_pnl_line() {
        let out = extractor().extract(
            "Performance.20260212.pdf",
            &doc("Total P/L $1,335.90\n", vec![]),
            today(),
        );
        let rec = out.record.unwrap();
        assert_eq!(rec.pnl, 1335.9);
        assert_eq!(rec.date, NaiveDate::from_ymd_opt(2026, 2, 12).unwrap());
        assert_eq!(rec.pnl_source, Some(PnlSource::SummaryNet));
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn test_net_overrides_table() {
        let out = extractor().extract(
            "Performance.20260212.pdf",
            &doc("Total P/L $50.00\n", vec![trade_table()]),
            today(),
        );
        let rec = out.record.unwrap();
        assert_eq!(rec.pnl, 50.0);
        assert_eq!(rec.trades.len(), 2);
        assert_eq!(rec.trades_count, Some(2));
        assert_eq!(rec.win_rate, Some(50.0));
    }

    #[test]
    fn test_gross_plus_fees() {
        let out = extractor().extract(
            "Performance.20260212.pdf",
            &doc("Gross P/L $1,400.00\nTrade Fees & Comm. ($64.10)\n", vec![trade_table()]),
            today(),
        );
        let rec = out.record.unwrap();
        assert_eq!(rec.pnl, 1335.9);
        assert_eq!(rec.pnl_source, Some(PnlSource::GrossPlusFees));
        assert_eq!(rec.gross_pnl, Some(1400.0));
        assert_eq!(rec.fees, Some(-64.1));
    }

    #[test]
    fn test_table_fallback() {
        let out = extractor().extract(
            "Performance.20260212.pdf",
            &doc("no summary here\n", vec![trade_table()]),
            today(),
        );
        let rec = out.record.unwrap();
        assert_eq!(rec.pnl, 99.5);
        assert_eq!(rec.pnl_source, Some(PnlSource::TradeTable));
    }

    #[test]
    fn test_nothing_found() {
        let out = extractor().extract("Performance.20260212.pdf", &doc("hello\n", vec![]), today());
        assert!(out.record.is_none());
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].scope, DiagnosticScope::Document);
    }

    #[test]
    fn test_zero_pnl() {
        let d = doc("Total P/L $0.00\n", vec![]);
        let kept = extractor().extract("Performance.20260212.pdf", &d, today());
        assert_eq!(kept.record.unwrap().pnl, 0.0);

        let strict = StatementExtractor::new(ExtractionConfig {
            zero_pnl_is_missing: true,
            ..ExtractionConfig::default()
        });
        assert!(strict.extract("Performance.20260212.pdf", &d, today()).record.is_none());
    }

    #[test]
    fn test_date_fallback() {
        let out = extractor().extract(
            "Performance.report.pdf",
            &doc("Total P/L ($200.00)\n", vec![]),
            today(),
        );
        let rec = out.record.unwrap();
        assert_eq!(rec.date, today());
        assert_eq!(rec.pnl, -200.0);
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].scope, DiagnosticScope::Date);
    }

    #[test]
    fn test_date_from_statement_text() {
        let out = extractor().extract(
            "Performance.report.pdf",
            &doc("Statement Date: 02/12/2026\nTotal P/L $5.00\n", vec![]),
            today(),
        );
        assert_eq!(
            out.record.unwrap().date,
            NaiveDate::from_ymd_opt(2026, 2, 12).unwrap()
        );
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].scope, DiagnosticScope::Date);

        // file name still takes precedence
        let named = extractor().extract(
            "Performance.20260301.pdf",
            &doc("Statement Date: 02/12/2026\nTotal P/L $5.00\n", vec![]),
            today(),
        );
        assert_eq!(
            named.record.unwrap().date,
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
        );
        assert!(named.diagnostics.is_empty());
    }

    #[test]
    fn test_total_line_under_trades_is_not_a_trade() {
        let layout = "\
Symbol   Qty   Buy Price   Buy Time    Sell Price   P/L
AAPL     10    $190.00     09:31:02    $192.50      $25.00
TSLA     5     $250.00     10:02:44    $240.00      ($50.00)
Total P/L        ($25.00)
";
        let out = extractor().extract(
            "Performance.20260212.pdf",
            &pdf::document_from_layout(layout),
            today(),
        );
        let rec = out.record.unwrap();
        assert_eq!(rec.pnl, -25.0);
        assert_eq!(rec.pnl_source, Some(PnlSource::SummaryNet));
        let symbols: Vec<&str> = rec.trades.iter().map(|t| t.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["AAPL", "TSLA"]);
        assert_eq!(rec.trades_count, Some(2));
        assert_eq!(rec.win_rate, Some(50.0));
    }

    #[test]
    fn test_summary_count_and_rate_win() {
        let out = extractor().extract(
            "Performance.20260212.pdf",
            &doc("Total P/L $10.00\n# of Trades 7\n% Profitable Trades 42.86%\n", vec![trade_table()]),
            today(),
        );
        let rec = out.record.unwrap();
        assert_eq!(rec.trades_count, Some(7));
        assert_eq!(rec.win_rate, Some(42.86));
    }

    struct FixedReader {
        calls: Cell<usize>,
    }

    impl StatementReader for FixedReader {
        fn read(&self, _path: &Path) -> Result<StatementDocument, ExtractError> {
            self.calls.set(self.calls.get() + 1);
            Ok(doc("Net P/L 12.34\n", vec![]))
        }
    }

    #[test]
    fn test_extract_file_uses_file_name() {
        let reader = FixedReader { calls: Cell::new(0) };
        let out = extractor()
            .extract_file(&reader, Path::new("statements/Performance.20260301.pdf"), today())
            .unwrap();
        let rec = out.record.unwrap();
        assert_eq!(rec.pdf_file, "Performance.20260301.pdf");
        assert_eq!(rec.pnl, 12.34);
        assert_eq!(reader.calls.get(), 1);
    }
}
