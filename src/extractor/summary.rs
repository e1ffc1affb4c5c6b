//! Labelled summary fields ("Total P/L", "Max Drawdown", ...) scanned from
//! statement text.

use super::cleaner::summary_value;
use crate::models::{Diagnostic, DiagnosticScope, SummaryFields};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    NetPnl,
    GrossPnl,
    Fees,
    WinRate,
    TradesCount,
    Expectancy,
    MaxRunup,
    MaxDrawdown,
    EndingEquity,
}

impl Field {
    fn name(self) -> &'static str {
        match self {
            Field::NetPnl => "net_pnl",
            Field::GrossPnl => "gross_pnl",
            Field::Fees => "fees",
            Field::WinRate => "win_rate",
            Field::TradesCount => "trades_count",
            Field::Expectancy => "expectancy",
            Field::MaxRunup => "max_runup",
            Field::MaxDrawdown => "max_drawdown",
            Field::EndingEquity => "ending_equity",
        }
    }

    fn slot(self, fields: &mut SummaryFields) -> &mut Option<f64> {
        match self {
            Field::NetPnl => &mut fields.net_pnl,
            Field::GrossPnl => &mut fields.gross_pnl,
            Field::Fees => &mut fields.fees,
            Field::WinRate => &mut fields.win_rate,
            Field::TradesCount => &mut fields.trades_count,
            Field::Expectancy => &mut fields.expectancy,
            Field::MaxRunup => &mut fields.max_runup,
            Field::MaxDrawdown => &mut fields.max_drawdown,
            Field::EndingEquity => &mut fields.ending_equity,
        }
    }
}

const LABELS: &[(&str, Field)] = &[
    ("Total P/L", Field::NetPnl),
    ("Net P/L", Field::NetPnl),
    ("Daily P/L", Field::NetPnl),
    ("Gross P/L", Field::GrossPnl),
    ("Trade Fees & Comm.", Field::Fees),
    ("% Profitable Trades", Field::WinRate),
    ("# of Trades", Field::TradesCount),
    ("Expectancy", Field::Expectancy),
    ("Max Run-up", Field::MaxRunup),
    ("Max Drawdown", Field::MaxDrawdown),
    ("Ending Equity", Field::EndingEquity),
    ("Account Equity", Field::EndingEquity),
];

/// True when a table cell is a summary label ("Total P/L", "Max Drawdown",
/// ...) or a "Total ..." footer rather than trade data.
pub fn is_summary_label(cell: &str) -> bool {
    let cell = cell.trim();
    cell.starts_with("Total") || LABELS.iter().any(|(label, _)| cell.starts_with(label))
}

/// Scan every line for every label. A later matching line overwrites an
/// earlier one; a matching line whose value does not parse leaves the field
/// as it was and is reported.
pub fn scan_summary<'a>(
    document: &str,
    lines: impl IntoIterator<Item = &'a str>,
) -> (SummaryFields, Vec<Diagnostic>) {
    let mut fields = SummaryFields::default();
    let mut diagnostics = Vec::new();

    for (n, raw) in lines.into_iter().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        for &(label, field) in LABELS {
            if !line.contains(label) {
                continue;
            }

            match summary_value(line, label) {
                Some(value) => {
                    debug!("{}: {} = {} (line {})", document, field.name(), value, n + 1);
                    *field.slot(&mut fields) = Some(value);
                }
                None => diagnostics.push(Diagnostic::new(
                    document,
                    DiagnosticScope::Field(field.name()),
                    format!("line {}: no numeric value for {:?} in {:?}", n + 1, label, line),
                )),
            }
        }
    }

    (fields, diagnostics)
}
