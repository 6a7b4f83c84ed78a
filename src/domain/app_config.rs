//! Resolved runtime configuration: where prices come from and where the
//! ledger journal lives.

use std::path::PathBuf;

pub const DEFAULT_PRICE_DIR: &str = "prices";
pub const DEFAULT_JOURNAL: &str = "journal.csv";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriceSource {
    /// One `<TICKER>.csv` file per ticker under `dir`.
    Csv { dir: PathBuf },
    /// `prices` table of the `[sqlite]` database.
    Sqlite,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Csv { journal: PathBuf },
    /// `ledger_events` table of the `[sqlite]` database.
    Sqlite,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub prices: PriceSource,
    pub store: StoreBackend,
}

impl AppConfig {
    pub fn uses_sqlite(&self) -> bool {
        self.prices == PriceSource::Sqlite || self.store == StoreBackend::Sqlite
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            prices: PriceSource::Csv {
                dir: PathBuf::from(DEFAULT_PRICE_DIR),
            },
            store: StoreBackend::Csv {
                journal: PathBuf::from(DEFAULT_JOURNAL),
            },
        }
    }
}
