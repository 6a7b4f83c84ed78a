//! Append-only CSV ledger journal.
//!
//! Columns: `portfolio,ticker,shares,date,kind`. The header is written when
//! the file is created; every save appends its rows in one write and flushes.

use crate::domain::calendar::DATE_FORMAT;
use crate::domain::error::StockfolioError;
use crate::domain::transaction::{LedgerEvent, TransactionKind};
use crate::ports::ledger_store_port::LedgerStorePort;
use chrono::NaiveDate;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

const HEADER: [&str; 5] = ["portfolio", "ticker", "shares", "date", "kind"];

pub struct CsvJournalAdapter {
    path: PathBuf,
}

impl CsvJournalAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn storage_error(&self, reason: impl std::fmt::Display) -> StockfolioError {
        StockfolioError::Storage {
            reason: format!("journal {}: {}", self.path.display(), reason),
        }
    }

    /// Encode every row first, then append them with a single write so a
    /// failed save leaves no partial batch behind.
    fn write_rows(&self, events: &[LedgerEvent]) -> Result<(), StockfolioError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        if needs_header(&self.path)? {
            writer
                .write_record(HEADER)
                .map_err(|e| self.storage_error(e))?;
        }
        for event in events {
            let shares = event.shares.to_string();
            let date = event.date.format(DATE_FORMAT).to_string();
            writer
                .write_record([
                    event.portfolio.as_str(),
                    event.ticker.as_str(),
                    shares.as_str(),
                    date.as_str(),
                    event.kind.as_str(),
                ])
                .map_err(|e| self.storage_error(e))?;
        }
        let rows = writer
            .into_inner()
            .map_err(|e| self.storage_error(e.error()))?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(&rows)?;
        file.flush()?;
        debug!(rows = events.len(), path = %self.path.display(), "appended journal rows");
        Ok(())
    }
}

/// A header is due when the journal is missing or empty.
fn needs_header(path: &Path) -> std::io::Result<bool> {
    match fs::metadata(path) {
        Ok(meta) => Ok(meta.len() == 0),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(true),
        Err(e) => Err(e),
    }
}

impl LedgerStorePort for CsvJournalAdapter {
    fn save(&self, event: &LedgerEvent) -> Result<(), StockfolioError> {
        self.write_rows(std::slice::from_ref(event))
    }

    fn save_all(&self, events: &[LedgerEvent]) -> Result<(), StockfolioError> {
        if events.is_empty() {
            return Ok(());
        }
        self.write_rows(events)
    }

    fn load(&self) -> Result<Vec<LedgerEvent>, StockfolioError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StockfolioError::Io(e)),
        };

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut events = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| self.storage_error(e))?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            let field = |i: usize, name: &str| {
                record
                    .get(i)
                    .map(str::trim)
                    .ok_or_else(|| self.storage_error(format!("line {line}: missing {name}")))
            };

            let shares: f64 = field(2, "shares")?
                .parse()
                .map_err(|e| self.storage_error(format!("line {line}: invalid shares: {e}")))?;
            let date = NaiveDate::parse_from_str(field(3, "date")?, DATE_FORMAT)
                .map_err(|e| self.storage_error(format!("line {line}: invalid date: {e}")))?;
            let kind: TransactionKind = field(4, "kind")?
                .parse()
                .map_err(|e: String| self.storage_error(format!("line {line}: {e}")))?;

            events.push(LedgerEvent {
                portfolio: field(0, "portfolio")?.to_string(),
                ticker: field(1, "ticker")?.to_string(),
                shares,
                date,
                kind,
            });
        }
        debug!(events = events.len(), path = %self.path.display(), "loaded journal");
        Ok(events)
    }
}
