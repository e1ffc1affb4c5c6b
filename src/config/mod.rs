use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application configuration
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub scanner: ScannerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
}

/// Where statements are looked for and which file names count
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScannerConfig {
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,

    /// Case-sensitive substring every statement file name contains.
    #[serde(default = "default_pattern")]
    pub pattern: String,

    #[serde(default = "default_extension")]
    pub extension: String,

    #[serde(default = "default_true")]
    pub recursive: bool,
}

/// Ledger file location and the baseline used for a fresh ledger
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_ledger_path")]
    pub ledger_path: PathBuf,

    #[serde(default = "default_start_date")]
    pub start_date: NaiveDate,

    #[serde(default)]
    pub start_pnl: f64,

    #[serde(default = "default_start_equity")]
    pub start_equity: Option<f64>,

    #[serde(default = "default_true")]
    pub backup_corrupt: bool,
}

/// Statement extraction knobs
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExtractionConfig {
    #[serde(default = "default_pdftotext")]
    pub pdftotext_bin: String,

    /// Only accept trade tables with exactly this many rows (header included).
    #[serde(default)]
    pub exact_table_rows: Option<usize>,

    /// Treat a resolved PnL of exactly 0.0 as "nothing found".
    #[serde(default)]
    pub zero_pnl_is_missing: bool,
}

// ── Defaults ─────────────────────────────────────────────────────────────────

fn default_base_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_pattern() -> String {
    "Performance".to_string()
}
fn default_extension() -> String {
    "pdf".to_string()
}
fn default_ledger_path() -> PathBuf {
    PathBuf::from("cumulative_data.json")
}
fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 12, 18).unwrap_or_default()
}
fn default_start_equity() -> Option<f64> {
    Some(1000.0)
}
fn default_pdftotext() -> String {
    "pdftotext".to_string()
}
fn default_true() -> bool {
    true
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            pattern: default_pattern(),
            extension: default_extension(),
            recursive: true,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            ledger_path: default_ledger_path(),
            start_date: default_start_date(),
            start_pnl: 0.0,
            start_equity: default_start_equity(),
            backup_corrupt: true,
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            pdftotext_bin: default_pdftotext(),
            exact_table_rows: None,
            zero_pnl_is_missing: false,
        }
    }
}

// ── Loader ───────────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from file + environment overrides
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let cfg = config::Config::builder()
            .add_source(
                config::File::with_name("config/default")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::File::with_name("config/local")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(config::Environment::with_prefix("PNL").separator("__"))
            .build()?;

        cfg.try_deserialize().context("Invalid configuration")
    }

    /// Apply command-line overrides on top of the loaded values.
    pub fn with_overrides(mut self, base_dir: Option<PathBuf>, ledger: Option<PathBuf>) -> Self {
        if let Some(dir) = base_dir {
            self.scanner.base_dir = dir;
        }
        if let Some(path) = ledger {
            self.storage.ledger_path = path;
        }
        self
    }
}
