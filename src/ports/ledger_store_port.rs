//! Durable mirror of ledger mutations.

use crate::domain::error::StockfolioError;
use crate::domain::transaction::LedgerEvent;

/// Append-only event journal. `load` is only read at startup.
pub trait LedgerStorePort {
    fn save(&self, event: &LedgerEvent) -> Result<(), StockfolioError>;

    /// Events in the order they were saved.
    fn load(&self) -> Result<Vec<LedgerEvent>, StockfolioError>;

    fn save_all(&self, events: &[LedgerEvent]) -> Result<(), StockfolioError> {
        for event in events {
            self.save(event)?;
        }
        Ok(())
    }
}
