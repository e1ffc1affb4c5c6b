mod config;
mod error;
mod extractor;
mod ledger;
mod loader;
mod models;
mod pipeline;
mod storage;
mod utils;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::AppConfig;
use crate::extractor::StatementExtractor;
use crate::extractor::pdf::PdftotextReader;
use crate::pipeline::Pipeline;
use crate::storage::{LedgerStore, LoadOrigin, export_csv};

#[derive(Parser)]
#[command(name = "pnl-ledger", about = "Daily P/L ledger from brokerage performance statements", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Directory scanned for statement PDFs (overrides config)
    #[arg(short, long, global = true, env = "PNL_BASE_DIR")]
    base_dir: Option<PathBuf>,

    /// Ledger JSON file (overrides config)
    #[arg(short, long, global = true, env = "PNL_LEDGER")]
    ledger: Option<PathBuf>,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Scan for new statements and append them to the ledger (default)
    Update,

    /// Extract one statement and print the day record, without touching the ledger
    Extract {
        /// Statement PDF
        file: PathBuf,
    },

    /// Show ledger statistics
    Stats,

    /// Write ledger entries as CSV
    Export {
        /// Output file (default: stdout)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Rewrite the ledger in the current schema
    Migrate,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "pnl_ledger=info,warn",
        1 => "pnl_ledger=debug,info",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::new(filter))
        .init();

    let config = AppConfig::load()?.with_overrides(cli.base_dir, cli.ledger);

    match cli.command.unwrap_or(Command::Update) {
        Command::Update => {
            let _t = utils::Timer::start("Statement update");
            let reader = PdftotextReader::new(&config.extraction);
            let report = Pipeline::new(config, reader).run()?;

            for d in &report.diagnostics {
                warn!("{}", d);
            }
            println!("─────────────────────────────────");
            println!("  Statements found : {}", report.files_found);
            println!("  Newly recorded   : {}", report.appended);
            println!("  Already recorded : {}", report.already_recorded);
            println!("  Without P/L      : {}", report.no_pnl);
            println!("  Failed           : {}", report.failed);
            println!("  Ledger entries   : {}", report.total_entries);
            println!("  Cumulative P/L   : {}", utils::fmt_money(report.cumulative_pnl));
            println!("─────────────────────────────────");
            if report.ledger_written {
                println!("Ledger updated.");
            } else {
                println!("Nothing new, ledger unchanged.");
            }
        }

        Command::Extract { file } => {
            let reader = PdftotextReader::new(&config.extraction);
            let extractor = StatementExtractor::new(config.extraction.clone());
            let extraction = extractor
                .extract_file(&reader, &file, Local::now().date_naive())
                .with_context(|| format!("Could not read {:?}", file))?;

            for d in &extraction.diagnostics {
                warn!("{}", d);
            }
            match extraction.record {
                Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
                None => println!("No P/L found in {:?}", file),
            }
        }

        Command::Stats => {
            let store = LedgerStore::new(&config.storage);
            let loaded = store.load()?;
            let s = loaded.ledger.summary();
            let day = |d: Option<(chrono::NaiveDate, f64)>| {
                d.map(|(date, pnl)| format!("{} ({})", utils::fmt_money(pnl), date))
                    .unwrap_or("-".into())
            };
            println!("─────────────────────────────────");
            println!("  P/L Ledger: {}", store.path().display());
            println!("─────────────────────────────────");
            println!("  Entries    : {}", s.entries);
            println!("  From       : {}", s.first_date.map(|d| d.to_string()).unwrap_or("-".into()));
            println!("  To         : {}", s.last_date.map(|d| d.to_string()).unwrap_or("-".into()));
            println!("  Cumulative : {}", utils::fmt_money(s.cumulative_pnl));
            println!("  Best day   : {}", day(s.best_day));
            println!("  Worst day  : {}", day(s.worst_day));
            println!("  Up / down  : {} / {}", s.winning_days, s.losing_days);
            println!("  Trades     : {}", s.total_trades);
            println!("─────────────────────────────────");
        }

        Command::Export { out } => {
            let loaded = LedgerStore::new(&config.storage).load()?;
            let n = match out {
                Some(path) => {
                    let file = std::fs::File::create(&path)
                        .with_context(|| format!("Could not create {:?}", path))?;
                    export_csv(&loaded.ledger, file)?
                }
                None => export_csv(&loaded.ledger, std::io::stdout().lock())?,
            };
            info!("Exported {} entries", n);
        }

        Command::Migrate => {
            let store = LedgerStore::new(&config.storage);
            let loaded = store.load()?;
            match loaded.origin {
                LoadOrigin::Migrated { from } => {
                    store.save(&loaded.ledger)?;
                    println!("Ledger upgraded from revision {} ({} entries).", from, loaded.ledger.daily_entries.len());
                }
                LoadOrigin::Current => println!("Ledger already current."),
                LoadOrigin::Missing => println!("No ledger at {:?}.", store.path()),
                LoadOrigin::Recovered => {
                    for d in &loaded.diagnostics {
                        warn!("{}", d);
                    }
                    println!("Ledger at {:?} is unusable; left as is.", store.path());
                }
            }
        }
    }

    Ok(())
}
