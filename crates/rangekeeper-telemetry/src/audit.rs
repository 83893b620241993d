//! Append-only CSV decision trail. One row per significant event, flushed
//! immediately — the audit log must never lose a row to a later crash.

use std::fs::OpenOptions;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::error::Result;

const HEADER: [&str; 6] = ["Timestamp", "Block", "Type", "Price", "Tick", "Details"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditKind {
    Entry,
    Rebalance,
    StopLoss,
    Error,
    Info,
    StrategyMetrics,
}

impl std::fmt::Display for AuditKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AuditKind::Entry => "Entry",
            AuditKind::Rebalance => "Rebalance",
            AuditKind::StopLoss => "StopLoss",
            AuditKind::Error => "Error",
            AuditKind::Info => "Info",
            AuditKind::StrategyMetrics => "StrategyMetrics",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,
    pub block: u64,
    pub kind: AuditKind,
    pub price: Decimal,
    pub tick: i32,
    pub details: String,
}

pub struct AuditWriter {
    path: PathBuf,
}

impl AuditWriter {
    /// Opens (or creates) the CSV file at `path`, writing the header row
    /// only if the file doesn't already exist.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            let file = OpenOptions::new().create(true).write(true).open(&path)?;
            let mut writer = csv::Writer::from_writer(file);
            writer.write_record(HEADER)?;
            writer.flush()?;
        }
        Ok(Self { path })
    }

    /// Appends one row and flushes to disk before returning.
    pub fn record(&self, record: &AuditRecord) -> Result<()> {
        let file = OpenOptions::new().append(true).open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer.write_record([
            record.timestamp.to_rfc3339(),
            record.block.to_string(),
            record.kind.to_string(),
            record.price.to_string(),
            record.tick.to_string(),
            record.details.clone(),
        ])?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    fn sample(kind: AuditKind) -> AuditRecord {
        AuditRecord {
            timestamp: Utc::now(),
            block: 100,
            kind,
            price: dec!(3000.5),
            tick: 12345,
            details: "test, with a comma".to_string(),
        }
    }

    #[test]
    fn new_writer_creates_header_row() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audit.csv");
        AuditWriter::new(&path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("Timestamp,Block,Type,Price,Tick,Details"));
    }

    #[test]
    fn reopening_an_existing_file_does_not_duplicate_the_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audit.csv");
        AuditWriter::new(&path).unwrap();
        AuditWriter::new(&path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.matches("Timestamp").count(), 1);
    }

    #[test]
    fn record_appends_and_quotes_fields_with_commas() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audit.csv");
        let writer = AuditWriter::new(&path).unwrap();
        writer.record(&sample(AuditKind::Rebalance)).unwrap();
        writer.record(&sample(AuditKind::Entry)).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("\"test, with a comma\""));
        assert!(lines[2].contains("Entry"));
    }
}
