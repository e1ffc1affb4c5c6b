//! Statement discovery on disk and file-name based dating.

use crate::config::ScannerConfig;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Statement date from a file name like `Performance.20260212.pdf`.
///
/// The second dot-delimited segment has to start with eight digits forming a
/// real calendar date.
pub fn date_from_filename(name: &str) -> Option<NaiveDate> {
    let segment = name.split('.').nth(1)?;
    let token = segment.get(..8)?;
    if !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year = token[..4].parse().ok()?;
    let month = token[4..6].parse().ok()?;
    let day = token[6..].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Statement date printed in the text, e.g. "Statement Date: 02/12/2026" or
/// "Equity as of Date 2026-02-12".
///
/// Only lines mentioning `Date` together with `Equity` or `Statement` count;
/// the first token after `Date` that reads as an ISO or `%m/%d/%Y` date is
/// taken. The last such line wins.
pub fn date_from_text<'a>(lines: impl IntoIterator<Item = &'a str>) -> Option<NaiveDate> {
    lines
        .into_iter()
        .filter(|l| l.contains("Date") && (l.contains("Equity") || l.contains("Statement")))
        .filter_map(|l| {
            let idx = l.rfind("Date")?;
            l[idx + "Date".len()..]
                .split_whitespace()
                .map(|t| t.trim_matches(|c: char| c == ':' || c == ','))
                .find_map(parse_text_date)
        })
        .last()
}

fn parse_text_date(token: &str) -> Option<NaiveDate> {
    ["%Y-%m-%d", "%m/%d/%Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(token, fmt).ok())
}

/// File name as a string, used as the ledger key.
pub fn file_name(path: &Path) -> Option<&str> {
    path.file_name()?.to_str()
}

pub fn is_statement_file(path: &Path, pattern: &str, extension: &str) -> bool {
    let Some(name) = file_name(path) else {
        return false;
    };
    let ext_ok = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e == extension)
        .unwrap_or(false);
    ext_ok && name.contains(pattern)
}

/// All statement files under the base directory, sorted by path.
pub fn discover_statements(config: &ScannerConfig) -> Result<Vec<PathBuf>> {
    let dir = &config.base_dir;
    if !dir.exists() {
        info!("Base directory {:?} does not exist", dir);
        return Ok(vec![]);
    }

    let mut files = Vec::new();
    walk(dir, config, &mut files)?;
    files.sort();
    debug!("{} statement files under {:?}", files.len(), dir);
    Ok(files)
}

fn walk(dir: &Path, config: &ScannerConfig, files: &mut Vec<PathBuf>) -> Result<()> {
    let entries = std::fs::read_dir(dir).with_context(|| format!("Could not list {:?}", dir))?;
    for entry in entries {
        let path = entry?.path();
        if path.is_dir() {
            if config.recursive {
                walk(&path, config, files)?;
            }
        } else if path.is_file() && is_statement_file(&path, &config.pattern, &config.extension) {
            files.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_date_from_filename() {
        assert_eq!(
            date_from_filename("Performance.20260212.pdf"),
            NaiveDate::from_ymd_opt(2026, 2, 12)
        );
        assert_eq!(
            date_from_filename("Performance.20260212_123456.pdf"),
            NaiveDate::from_ymd_opt(2026, 2, 12)
        );
        assert_eq!(date_from_filename("Performance.report.pdf"), None);
        assert_eq!(date_from_filename("Performance.20261340.pdf"), None);
        assert_eq!(date_from_filename("Performance"), None);
    }

    #[test]
    fn test_date_from_text() {
        let feb12 = NaiveDate::from_ymd_opt(2026, 2, 12);
        assert_eq!(date_from_text(["Statement Date: 02/12/2026"]), feb12);
        assert_eq!(date_from_text(["Equity as of Date 2026-02-12"]), feb12);
        assert_eq!(
            date_from_text(["Statement Date 2026-02-11", "noise", "Statement Date: 2026-02-12"]),
            feb12
        );
        assert_eq!(date_from_text(["Trade Date 2026-02-12"]), None);
        assert_eq!(date_from_text(["Statement Date: pending"]), None);
        assert_eq!(date_from_text(["Statement Date: 02/30/2026"]), None);
    }

    #[test]
    fn test_is_statement_file() {
        assert!(is_statement_file(Path::new("a/Performance.20260212.pdf"), "Performance", "pdf"));
        assert!(is_statement_file(Path::new("Account Performance.pdf"), "Performance", "pdf"));
        assert!(!is_statement_file(Path::new("Account Performance.PDF"), "Performance", "pdf"));
        assert!(!is_statement_file(Path::new("performance.20260212.pdf"), "Performance", "pdf"));
        assert!(!is_statement_file(Path::new("Performance.20260212.csv"), "Performance", "pdf"));
    }

    #[test]
    fn test_discover_recursive_and_sorted() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("2026").join("feb");
        fs::create_dir_all(&nested).unwrap();
        fs::write(tmp.path().join("Performance.20260213.pdf"), b"").unwrap();
        fs::write(nested.join("Performance.20260212.pdf"), b"").unwrap();
        fs::write(tmp.path().join("notes.pdf"), b"").unwrap();
        fs::write(tmp.path().join("Performance.txt"), b"").unwrap();

        let cfg = ScannerConfig {
            base_dir: tmp.path().to_path_buf(),
            ..ScannerConfig::default()
        };
        let files = discover_statements(&cfg).unwrap();
        let names: Vec<&str> = files.iter().filter_map(|p| file_name(p)).collect();
        assert_eq!(names, vec!["Performance.20260212.pdf", "Performance.20260213.pdf"]);

        let flat = ScannerConfig { recursive: false, ..cfg };
        assert_eq!(discover_statements(&flat).unwrap().len(), 1);
    }

    #[test]
    fn test_discover_missing_dir() {
        let cfg = ScannerConfig {
            base_dir: PathBuf::from("/definitely/not/here"),
            ..ScannerConfig::default()
        };
        assert!(discover_statements(&cfg).unwrap().is_empty());
    }
}
