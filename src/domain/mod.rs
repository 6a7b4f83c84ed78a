//! Core domain types and logic: the position ledger, price analytics and the
//! session orchestrator.

pub mod calendar;
pub mod price_series;
pub mod lot;
pub mod transaction;
pub mod portfolio;
pub mod registry;
pub mod valuation;
pub mod rebalance;
pub mod indicator;
pub mod sampler;
pub mod app_config;
pub mod config_validation;
pub mod engine;
pub mod error;
