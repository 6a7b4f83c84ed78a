//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error, info};

use crate::adapters::csv_adapter::CsvPriceAdapter;
use crate::adapters::csv_journal_adapter::CsvJournalAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::text_chart::format_performance_chart;
use crate::domain::app_config::{AppConfig, PriceSource, StoreBackend, DEFAULT_JOURNAL, DEFAULT_PRICE_DIR};
use crate::domain::calendar::parse_date;
use crate::domain::config_validation::{backend_kind, validate_app_config, BackendKind};
use crate::domain::engine::Engine;
use crate::domain::error::StockfolioError;
use crate::ports::config_port::ConfigPort;
use crate::ports::ledger_store_port::LedgerStorePort;
use crate::ports::price_port::PricePort;

#[cfg(feature = "sqlite")]
use crate::adapters::sqlite_adapter::SqliteAdapter;

#[derive(Parser, Debug)]
#[command(name = "stockfolio", about = "Dated-lot stock portfolio tracker")]
pub struct Cli {
    /// INI configuration file; defaults apply when omitted
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Buy shares into a portfolio, creating it on first use
    Buy {
        #[arg(short, long)]
        portfolio: String,
        #[arg(short, long)]
        ticker: String,
        #[arg(short, long)]
        shares: f64,
        #[arg(short, long, value_parser = parse_date)]
        date: NaiveDate,
    },
    /// Sell shares held as of a date
    Sell {
        #[arg(short, long)]
        portfolio: String,
        #[arg(short, long)]
        ticker: String,
        #[arg(short, long)]
        shares: f64,
        #[arg(short, long, value_parser = parse_date)]
        date: NaiveDate,
    },
    /// Shares per ticker as of a date
    Composition {
        #[arg(short, long)]
        portfolio: String,
        #[arg(short, long, value_parser = parse_date)]
        date: NaiveDate,
    },
    /// Market value per ticker as of a date
    Distribution {
        #[arg(short, long)]
        portfolio: String,
        #[arg(short, long, value_parser = parse_date)]
        date: NaiveDate,
    },
    /// Total market value as of a date
    Value {
        #[arg(short, long)]
        portfolio: String,
        #[arg(short, long, value_parser = parse_date)]
        date: NaiveDate,
        /// Also print the close used for each held ticker
        #[arg(long)]
        breakdown: bool,
    },
    /// Rebalance held tickers to integer percentage weights
    Rebalance {
        #[arg(short, long)]
        portfolio: String,
        #[arg(short, long, value_parser = parse_date)]
        date: NaiveDate,
        /// One weight per held ticker in holding order, e.g. 50,30,20
        #[arg(short, long, value_delimiter = ',', allow_negative_numbers = true, required = true)]
        weights: Vec<i64>,
    },
    /// Trailing moving average of closes ending at a date
    MovingAverage {
        #[arg(short, long)]
        ticker: String,
        #[arg(short, long, value_parser = parse_date)]
        date: NaiveDate,
        #[arg(short, long)]
        window: usize,
    },
    /// Dates whose close is above the trailing moving average
    Crossovers {
        #[arg(short, long)]
        ticker: String,
        #[arg(long, value_parser = parse_date)]
        start: NaiveDate,
        #[arg(long, value_parser = parse_date)]
        end: NaiveDate,
        #[arg(short, long)]
        window: usize,
    },
    /// Close on the recent date minus close on the initial date
    GainLoss {
        #[arg(short, long)]
        ticker: String,
        #[arg(long, value_parser = parse_date)]
        recent: NaiveDate,
        #[arg(long, value_parser = parse_date)]
        initial: NaiveDate,
    },
    /// Bar chart of portfolio value over a date range
    Chart {
        #[arg(short, long)]
        portfolio: String,
        #[arg(long, value_parser = parse_date)]
        start: NaiveDate,
        #[arg(long, value_parser = parse_date)]
        end: NaiveDate,
    },
    /// List portfolio names
    Portfolios,
    /// List tickers with price history
    Tickers,
    /// Copy CSV price files into the SQLite database
    ImportPrices {
        /// Directory of <TICKER>.csv files
        #[arg(long)]
        dir: PathBuf,
        /// Tickers to import; every file in the directory when empty
        tickers: Vec<String>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            (&e).into()
        }
    }
}

pub fn execute(cli: Cli) -> Result<(), StockfolioError> {
    let config = load_config(cli.config.as_ref())?;
    let app = build_app_config(&config)?;
    let backends = Backends::open(&app, &config)?;
    let mut engine = Engine::open(backends.price_port()?, backends.store_port()?)?;
    dispatch(&mut engine, &config, cli.command)
}

pub fn load_config(path: Option<&PathBuf>) -> Result<FileConfigAdapter, StockfolioError> {
    match path {
        Some(path) => {
            info!("Loading config from {}", path.display());
            FileConfigAdapter::from_file(path)
        }
        None => Ok(FileConfigAdapter::empty()),
    }
}

pub fn build_app_config(config: &dyn ConfigPort) -> Result<AppConfig, StockfolioError> {
    validate_app_config(config)?;

    let prices = match backend_kind(config, "prices", "source")? {
        BackendKind::Csv => PriceSource::Csv {
            dir: PathBuf::from(config.get_string_or("prices", "dir", DEFAULT_PRICE_DIR)),
        },
        BackendKind::Sqlite => PriceSource::Sqlite,
    };
    let store = match backend_kind(config, "store", "backend")? {
        BackendKind::Csv => StoreBackend::Csv {
            journal: PathBuf::from(config.get_string_or("store", "journal", DEFAULT_JOURNAL)),
        },
        BackendKind::Sqlite => StoreBackend::Sqlite,
    };
    Ok(AppConfig { prices, store })
}

/// Adapters opened for one invocation. The SQLite database is shared when
/// both prices and the journal live there.
struct Backends {
    csv_prices: Option<CsvPriceAdapter>,
    csv_journal: Option<CsvJournalAdapter>,
    #[cfg(feature = "sqlite")]
    sqlite: Option<SqliteAdapter>,
}

impl Backends {
    fn open(app: &AppConfig, config: &dyn ConfigPort) -> Result<Self, StockfolioError> {
        let csv_prices = match &app.prices {
            PriceSource::Csv { dir } => Some(CsvPriceAdapter::new(dir.clone())),
            PriceSource::Sqlite => None,
        };
        let csv_journal = match &app.store {
            StoreBackend::Csv { journal } => {
                let adapter = CsvJournalAdapter::new(journal.clone());
                debug!("Journal at {}", adapter.path().display());
                Some(adapter)
            }
            StoreBackend::Sqlite => None,
        };

        #[cfg(feature = "sqlite")]
        let sqlite = if app.uses_sqlite() {
            Some(open_sqlite(config)?)
        } else {
            None
        };
        #[cfg(not(feature = "sqlite"))]
        let _ = config;

        Ok(Self {
            csv_prices,
            csv_journal,
            #[cfg(feature = "sqlite")]
            sqlite,
        })
    }

    fn price_port(&self) -> Result<&dyn PricePort, StockfolioError> {
        if let Some(adapter) = &self.csv_prices {
            return Ok(adapter);
        }
        #[cfg(feature = "sqlite")]
        if let Some(adapter) = &self.sqlite {
            return Ok(adapter);
        }
        Err(StockfolioError::ConfigMissing {
            section: "prices".into(),
            key: "source".into(),
        })
    }

    fn store_port(&self) -> Result<&dyn LedgerStorePort, StockfolioError> {
        if let Some(adapter) = &self.csv_journal {
            return Ok(adapter);
        }
        #[cfg(feature = "sqlite")]
        if let Some(adapter) = &self.sqlite {
            return Ok(adapter);
        }
        Err(StockfolioError::ConfigMissing {
            section: "store".into(),
            key: "backend".into(),
        })
    }
}

#[cfg(feature = "sqlite")]
fn open_sqlite(config: &dyn ConfigPort) -> Result<SqliteAdapter, StockfolioError> {
    let adapter = SqliteAdapter::from_config(config)?;
    adapter.initialize_schema()?;
    Ok(adapter)
}

fn dispatch(
    engine: &mut Engine<'_>,
    config: &dyn ConfigPort,
    command: Command,
) -> Result<(), StockfolioError> {
    match command {
        Command::Buy {
            portfolio,
            ticker,
            shares,
            date,
        } => {
            let event = engine.buy(&portfolio, &ticker, shares, date)?;
            println!(
                "Bought {} {} on {} into {}",
                format_shares(event.shares),
                event.ticker,
                event.date,
                event.portfolio
            );
        }
        Command::Sell {
            portfolio,
            ticker,
            shares,
            date,
        } => {
            let event = engine.sell(&portfolio, &ticker, shares, date)?;
            println!(
                "Sold {} {} on {} from {}",
                format_shares(event.shares),
                event.ticker,
                event.date,
                event.portfolio
            );
        }
        Command::Composition { portfolio, date } => {
            let composition = engine.composition(&portfolio, date)?;
            print!("{}", format_table(&composition, format_shares));
        }
        Command::Distribution { portfolio, date } => {
            let distribution = engine.distribution(&portfolio, date)?;
            print!("{}", format_table(&distribution, format_money));
        }
        Command::Value {
            portfolio,
            date,
            breakdown,
        } => {
            if breakdown {
                for (ticker, close) in engine.closing_prices(&portfolio, date)? {
                    println!("{ticker} close {}", format_money(close));
                }
            }
            let value = engine.value(&portfolio, date)?;
            println!("Value of {portfolio} on {date}: {}", format_money(value));
        }
        Command::Rebalance {
            portfolio,
            date,
            weights,
        } => {
            let outcome = engine.rebalance(&portfolio, date, &weights)?;
            for (ticker, shares) in &outcome.holdings {
                println!("{ticker} {}", format_shares(*shares));
            }
        }
        Command::MovingAverage {
            ticker,
            date,
            window,
        } => {
            let average = engine.moving_average(&ticker, date, window)?;
            println!("{window}-day moving average of {ticker} on {date}: {}", format_money(average));
        }
        Command::Crossovers {
            ticker,
            start,
            end,
            window,
        } => {
            let dates = engine.crossovers(&ticker, start, end, window)?;
            if dates.is_empty() {
                info!("No {window}-day crossovers for {ticker} between {start} and {end}");
            }
            for date in dates {
                println!("{date}");
            }
        }
        Command::GainLoss {
            ticker,
            recent,
            initial,
        } => {
            let change = engine.gain_loss(&ticker, recent, initial)?;
            println!("{ticker} change from {initial} to {recent}: {}", format_money(change));
        }
        Command::Chart {
            portfolio,
            start,
            end,
        } => {
            let points = engine.performance(&portfolio, start, end)?;
            print!("{}", format_performance_chart(&portfolio, &points));
        }
        Command::Portfolios => {
            for name in engine.portfolios() {
                println!("{name}");
            }
        }
        Command::Tickers => {
            for ticker in engine.available_tickers()? {
                println!("{ticker}");
            }
        }
        Command::ImportPrices { dir, tickers } => run_import_prices(config, &dir, &tickers)?,
    }
    Ok(())
}

fn run_import_prices(
    config: &dyn ConfigPort,
    dir: &PathBuf,
    tickers: &[String],
) -> Result<(), StockfolioError> {
    #[cfg(feature = "sqlite")]
    {
        let source = CsvPriceAdapter::new(dir.clone());
        let target = open_sqlite(config)?;

        let tickers = if tickers.is_empty() {
            source.list_tickers()?
        } else {
            tickers.iter().map(|t| t.trim().to_uppercase()).collect()
        };

        for ticker in &tickers {
            let series = source.fetch_series(ticker)?;
            target.import_series(&series)?;
            if let Some((first, last, rows)) = target.price_range(ticker)? {
                println!("{ticker}: {rows} closes from {first} to {last}");
            }
        }
        info!("Imported {} tickers from {}", tickers.len(), dir.display());
        Ok(())
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = (config, dir, tickers);
        Err(StockfolioError::ConfigInvalid {
            section: "sqlite".into(),
            key: "path".into(),
            reason: "sqlite feature is required for import-prices".into(),
        })
    }
}

pub fn format_shares(shares: f64) -> String {
    let text = format!("{shares:.4}");
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

pub fn format_money(amount: f64) -> String {
    format!("{amount:.2}")
}

pub fn format_table(rows: &BTreeMap<String, f64>, format: fn(f64) -> String) -> String {
    rows.iter()
        .map(|(ticker, amount)| format!("{ticker} {}\n", format(*amount)))
        .collect()
}
