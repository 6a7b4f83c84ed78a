//! SQLite storage adapter: daily closes in `prices`, the ledger journal in
//! `ledger_events`.

use crate::domain::calendar::DATE_FORMAT;
use crate::domain::error::StockfolioError;
use crate::domain::price_series::{PricePoint, PriceSeries};
use crate::domain::transaction::{LedgerEvent, TransactionKind};
use crate::ports::config_port::ConfigPort;
use crate::ports::ledger_store_port::LedgerStorePort;
use crate::ports::price_port::PricePort;
use chrono::NaiveDate;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use tracing::debug;

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn pool_error(e: r2d2::Error) -> StockfolioError {
    StockfolioError::Storage {
        reason: e.to_string(),
    }
}

fn query_error(e: rusqlite::Error) -> StockfolioError {
    StockfolioError::StorageQuery {
        reason: e.to_string(),
    }
}

fn parse_date_column(value: String) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(&value, DATE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            value.len(),
            rusqlite::types::Type::Text,
            Box::new(e),
        )
    })
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, StockfolioError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| StockfolioError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("sqlite", "pool_size", 4).max(1) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(pool_error)?;

        debug!(path = %db_path, pool_size, "opened sqlite database");
        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, StockfolioError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(pool_error)?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, StockfolioError> {
        self.pool.get().map_err(pool_error)
    }

    pub fn initialize_schema(&self) -> Result<(), StockfolioError> {
        self.conn()?
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS prices (
                    ticker TEXT NOT NULL,
                    date TEXT NOT NULL,
                    close REAL NOT NULL,
                    PRIMARY KEY (ticker, date)
                );
                CREATE TABLE IF NOT EXISTS ledger_events (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    portfolio TEXT NOT NULL,
                    ticker TEXT NOT NULL,
                    shares REAL NOT NULL,
                    date TEXT NOT NULL,
                    kind TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_ledger_events_portfolio ON ledger_events(portfolio);",
            )
            .map_err(query_error)
    }

    /// Insert or replace every close of `series`. Returns the rows written.
    pub fn import_series(&self, series: &PriceSeries) -> Result<usize, StockfolioError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_error)?;

        for point in series.points() {
            tx.execute(
                "INSERT OR REPLACE INTO prices (ticker, date, close) VALUES (?1, ?2, ?3)",
                params![
                    series.ticker,
                    point.date.format(DATE_FORMAT).to_string(),
                    point.close
                ],
            )
            .map_err(query_error)?;
        }

        tx.commit().map_err(query_error)?;
        debug!(ticker = %series.ticker, rows = series.len(), "imported price series");
        Ok(series.len())
    }

    /// First date, last date and row count stored for `ticker`.
    pub fn price_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, StockfolioError> {
        let result: (Option<String>, Option<String>, i64) = self
            .conn()?
            .query_row(
                "SELECT MIN(date), MAX(date), COUNT(*) FROM prices WHERE ticker = ?1",
                params![ticker],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .map_err(query_error)?;

        match result {
            (Some(min), Some(max), count) if count > 0 => Ok(Some((
                parse_date_column(min).map_err(query_error)?,
                parse_date_column(max).map_err(query_error)?,
                count as usize,
            ))),
            _ => Ok(None),
        }
    }
}

impl PricePort for SqliteAdapter {
    fn fetch_series(&self, ticker: &str) -> Result<PriceSeries, StockfolioError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT date, close FROM prices WHERE ticker = ?1 ORDER BY date ASC")
            .map_err(query_error)?;

        let rows = stmt
            .query_map(params![ticker], |row| {
                let date = parse_date_column(row.get(0)?)?;
                Ok(PricePoint::new(date, row.get(1)?))
            })
            .map_err(query_error)?;

        let mut points = Vec::new();
        for row in rows {
            points.push(row.map_err(query_error)?);
        }

        if points.is_empty() {
            return Err(StockfolioError::no_price_data(ticker, "no rows in prices table"));
        }
        Ok(PriceSeries::new(ticker, points))
    }

    fn list_tickers(&self) -> Result<Vec<String>, StockfolioError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT DISTINCT ticker FROM prices ORDER BY ticker")
            .map_err(query_error)?;

        let rows = stmt.query_map([], |row| row.get(0)).map_err(query_error)?;

        let mut tickers = Vec::new();
        for row in rows {
            tickers.push(row.map_err(query_error)?);
        }
        Ok(tickers)
    }
}

impl LedgerStorePort for SqliteAdapter {
    fn save(&self, event: &LedgerEvent) -> Result<(), StockfolioError> {
        self.save_all(std::slice::from_ref(event))
    }

    fn save_all(&self, events: &[LedgerEvent]) -> Result<(), StockfolioError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_error)?;

        for event in events {
            tx.execute(
                "INSERT INTO ledger_events (portfolio, ticker, shares, date, kind)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    event.portfolio,
                    event.ticker,
                    event.shares,
                    event.date.format(DATE_FORMAT).to_string(),
                    event.kind.as_str()
                ],
            )
            .map_err(query_error)?;
        }

        tx.commit().map_err(query_error)
    }

    fn load(&self) -> Result<Vec<LedgerEvent>, StockfolioError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT portfolio, ticker, shares, date, kind
                 FROM ledger_events
                 ORDER BY id ASC",
            )
            .map_err(query_error)?;

        let rows = stmt
            .query_map([], |row| {
                let kind: String = row.get(4)?;
                let kind = kind.parse::<TransactionKind>().map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        4,
                        rusqlite::types::Type::Text,
                        e.into(),
                    )
                })?;
                Ok(LedgerEvent {
                    portfolio: row.get(0)?,
                    ticker: row.get(1)?,
                    shares: row.get(2)?,
                    date: parse_date_column(row.get(3)?)?,
                    kind,
                })
            })
            .map_err(query_error)?;

        let mut events = Vec::new();
        for row in rows {
            events.push(row.map_err(query_error)?);
        }
        Ok(events)
    }
}
