//! Port traits the domain talks through.

pub mod config_port;
pub mod ledger_store_port;
pub mod price_port;
