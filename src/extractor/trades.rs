//! Trade rows from tables whose header carries a P/L column.

use super::cleaner::parse_amount;
use crate::models::{Diagnostic, DiagnosticScope, RawTable, TradeRecord};
use tracing::debug;

/// Lower-case header fragments that mark the P/L column.
const PNL_HEADERS: &[&str] = &["p/l", "pnl", "p&l", "profit/loss", "net profit"];

/// Column positions for one trade table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Columns {
    symbol: usize,
    qty: usize,
    buy_price: usize,
    buy_time: usize,
    sell_price: usize,
    pnl: Option<usize>,
}

impl Columns {
    fn from_header(header: &[String]) -> Self {
        let lower: Vec<String> = header.iter().map(|h| h.trim().to_lowercase()).collect();
        let find = |names: &[&str]| lower.iter().position(|h| names.iter().any(|n| h.contains(n)));

        Self {
            symbol: find(&["symbol", "ticker"]).unwrap_or(0),
            qty: find(&["qty", "quantity", "shares"]).unwrap_or(1),
            buy_price: find(&["buy price", "entry price"]).unwrap_or(2),
            buy_time: find(&["buy time", "entry time"]).unwrap_or(3),
            sell_price: find(&["sell price", "exit price"]).unwrap_or(4),
            pnl: pnl_column(header),
        }
    }
}

fn pnl_column(header: &[String]) -> Option<usize> {
    header.iter().position(|h| {
        let h = h.to_lowercase();
        PNL_HEADERS.iter().any(|s| h.contains(s))
    })
}

/// Tables that look like trade listings, optionally gated on an exact row
/// count (header included).
pub fn select_trade_tables(tables: &[RawTable], exact_rows: Option<usize>) -> Vec<&RawTable> {
    tables
        .iter()
        .filter(|t| t.header().and_then(pnl_column).is_some())
        .filter(|t| exact_rows.map_or(true, |n| t.rows.len() == n))
        .collect()
}

/// Parse every data row of the selected tables. Rows whose P/L cell does not
/// parse are skipped and reported.
pub fn extract_trades(
    document: &str,
    tables: &[RawTable],
    exact_rows: Option<usize>,
) -> (Vec<TradeRecord>, Vec<Diagnostic>) {
    let mut trades = Vec::new();
    let mut diagnostics = Vec::new();

    for table in select_trade_tables(tables, exact_rows) {
        let Some(header) = table.header() else { continue };
        let cols = Columns::from_header(header);

        for (i, row) in table.body().iter().enumerate() {
            if row.iter().all(|c| c.trim().is_empty()) {
                continue;
            }

            let idx = cols
                .pnl
                .filter(|&p| p < row.len())
                .unwrap_or(row.len().saturating_sub(1));
            let cell = row.get(idx).map(|s| s.as_str()).unwrap_or("");

            let Some(pnl) = parse_amount(cell) else {
                diagnostics.push(Diagnostic::new(
                    document,
                    DiagnosticScope::Row(i + 1),
                    format!("unparseable P/L cell {:?}", cell),
                ));
                continue;
            };

            let text = |j: usize| row.get(j).map(|s| s.trim().to_string()).unwrap_or_default();
            trades.push(TradeRecord {
                symbol: text(cols.symbol),
                qty: text(cols.qty),
                buy_price: text(cols.buy_price),
                buy_time: text(cols.buy_time),
                sell_price: text(cols.sell_price),
                pnl,
            });
        }
    }

    debug!("{}: {} trades from tables", document, trades.len());
    (trades, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[&[&str]]) -> RawTable {
        RawTable {
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    fn trades_table() -> RawTable {
        table(&[
            &["Symbol", "Qty", "Buy Price", "Buy Time", "Sell Price", "P/L"],
            &["AAPL", "10", "$190.00", "09:31:02", "$192.50", "$25.00"],
            &["TSLA", "5", "$250.00", "10:02:44", "$240.00", "($50.00)"],
            &["NVDA", "2", "$900.00", "11:15:00", "$910.00", "$20.00"],
        ])
    }

    #[test]
    fn test_extract_trades() {
        let (trades, diags) = extract_trades("doc", &[trades_table()], None);
        assert!(diags.is_empty());
        assert_eq!(trades.len(), 3);
        assert_eq!(trades[1].symbol, "TSLA");
        assert_eq!(trades[1].qty, "5");
        assert_eq!(trades[1].buy_time, "10:02:44");
        assert_eq!(trades[1].pnl, -50.0);
        let sum: f64 = trades.iter().map(|t| t.pnl).sum();
        assert_eq!(sum, -5.0);
    }

    #[test]
    fn test_ignores_tables_without_pnl_header() {
        let other = table(&[&["Date", "Deposit"], &["2026-02-12", "$1,000.00"]]);
        let (trades, _) = extract_trades("doc", &[other], None);
        assert!(trades.is_empty());
    }

    #[test]
    fn test_header_match_is_case_insensitive() {
        let t = table(&[&["Ticker", "Shares", "PnL"], &["SPY", "1", "$3.00"]]);
        let (trades, _) = extract_trades("doc", &[t], None);
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].symbol, "SPY");
        assert_eq!(trades[0].qty, "1");
        assert_eq!(trades[0].pnl, 3.0);
    }

    #[test]
    fn test_short_row_uses_last_column() {
        let t = table(&[
            &["Symbol", "Qty", "Buy Price", "Buy Time", "Sell Price", "P/L"],
            &["AMD", "$7.25"],
        ]);
        let (trades, _) = extract_trades("doc", &[t], None);
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].pnl, 7.25);
        assert_eq!(trades[0].sell_price, "");
    }

    #[test]
    fn test_unparseable_cell_is_skipped() {
        let t = table(&[
            &["Symbol", "P/L"],
            &["AAPL", "$10.00"],
            &["MSFT", "pending"],
            &["", ""],
        ]);
        let (trades, diags) = extract_trades("doc", &[t], None);
        assert_eq!(trades.len(), 1);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].scope, DiagnosticScope::Row(2));
    }

    #[test]
    fn test_exact_row_gate() {
        let t = trades_table();
        assert_eq!(select_trade_tables(std::slice::from_ref(&t), Some(4)).len(), 1);
        assert!(select_trade_tables(std::slice::from_ref(&t), Some(9)).is_empty());
    }
}
