//! Upgrade of older ledger layouts to the current schema.
//!
//! Known layouts:
//! - revision 1: `{ history: [{date, pnl, equity, cumulative_pnl, running_equity}], start_equity, start_date }`
//! - revisions 2/3: `{ start_date, start_pnl | start_equity, daily_entries: [{pdf_file, date, pnl | net_pnl, cumulative_pnl, ...}] }`
//!   with no `schema_version`
//! - revision 4: the current layout, tagged with `schema_version`

use crate::error::StorageError;
use crate::models::{DayRecord, Ledger, SCHEMA_VERSION};
use crate::utils::round2;
use chrono::NaiveDate;
use serde_json::Value;
use tracing::{info, warn};

/// Ledger fields used when an old file does not carry them.
#[derive(Debug, Clone, Copy)]
pub struct LedgerDefaults {
    pub start_date: NaiveDate,
    pub start_pnl: f64,
    pub start_equity: Option<f64>,
}

/// Turn parsed JSON into a current-schema ledger. Returns the revision the
/// file was upgraded from, or None when it was already current.
pub fn upgrade(value: Value, defaults: &LedgerDefaults) -> Result<(Ledger, Option<u32>), StorageError> {
    let Value::Object(ref map) = value else {
        return Err(StorageError::UnknownLayout("top level is not an object".into()));
    };

    if let Some(version) = map.get("schema_version").and_then(Value::as_u64) {
        if version > u64::from(SCHEMA_VERSION) {
            return Err(StorageError::UnsupportedVersion {
                found: version,
                supported: SCHEMA_VERSION,
            });
        }
        let ledger: Ledger = serde_json::from_value(value)?;
        return Ok((ledger, None));
    }

    if let Some(history) = map.get("history").and_then(Value::as_array) {
        info!("Upgrading revision 1 ledger ({} entries)", history.len());
        return Ok((from_history(map, history, defaults), Some(1)));
    }

    if let Some(entries) = map.get("daily_entries").and_then(Value::as_array) {
        info!("Upgrading revision 3 ledger ({} entries)", entries.len());
        return Ok((from_daily_entries(map, entries, defaults)?, Some(3)));
    }

    Err(StorageError::UnknownLayout(
        "expected schema_version, history or daily_entries".into(),
    ))
}

type Map = serde_json::Map<String, Value>;

fn number(map: &Map, key: &str) -> Option<f64> {
    map.get(key).and_then(Value::as_f64)
}

fn date(map: &Map, key: &str) -> Option<NaiveDate> {
    let s = map.get(key)?.as_str()?;
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

fn base_ledger(map: &Map, defaults: &LedgerDefaults) -> Ledger {
    Ledger::new(
        date(map, "start_date").unwrap_or(defaults.start_date),
        number(map, "start_pnl").unwrap_or(defaults.start_pnl),
        number(map, "start_equity").or(defaults.start_equity),
    )
}

fn from_history(map: &Map, history: &[Value], defaults: &LedgerDefaults) -> Ledger {
    let mut ledger = base_ledger(map, defaults);
    let mut running = ledger.start_pnl;

    for (i, entry) in history.iter().enumerate() {
        let Some(entry) = entry.as_object() else {
            warn!("Dropping non-object history entry #{}", i);
            continue;
        };
        let when = date(entry, "date").unwrap_or(ledger.start_date);
        let pnl = number(entry, "pnl").unwrap_or(0.0);
        running = round2(running + pnl);

        let mut record = DayRecord::new(format!("legacy:{}:{}", i, when), when, pnl);
        record.cumulative_pnl = running;
        record.ending_equity = number(entry, "equity").or_else(|| number(entry, "running_equity"));
        ledger.daily_entries.push(record);
    }
    ledger
}

fn from_daily_entries(
    map: &Map,
    entries: &[Value],
    defaults: &LedgerDefaults,
) -> Result<Ledger, StorageError> {
    let mut ledger = base_ledger(map, defaults);

    for (i, entry) in entries.iter().enumerate() {
        let Some(obj) = entry.as_object() else {
            warn!("Dropping non-object ledger entry #{}", i);
            continue;
        };
        let mut obj = obj.clone();

        if !obj.contains_key("pnl") {
            if let Some(net) = obj.remove("net_pnl") {
                obj.insert("pnl".into(), net);
            }
        }
        if !obj.contains_key("pdf_file") {
            let label = obj.get("date").and_then(Value::as_str).unwrap_or("undated").to_string();
            obj.insert("pdf_file".into(), Value::String(format!("legacy:{}:{}", i, label)));
        }
        if date(&obj, "date").is_none() {
            obj.insert("date".into(), Value::String(ledger.start_date.to_string()));
        }
        let had_cumulative = obj.contains_key("cumulative_pnl");

        let mut record: DayRecord = serde_json::from_value(Value::Object(obj))?;
        if !had_cumulative {
            record.cumulative_pnl = round2(ledger.last_cumulative() + record.pnl);
        }
        ledger.daily_entries.push(record);
    }
    Ok(ledger)
}
