//! # EQUIPOS billing
//!
//! Billing core for a heavy-equipment rental business: the amount of a
//! rental under its billing modality (hours, volume or fixed price), the
//! rental lifecycle over a SQLite store, general client payment allocation
//! and the performance, dashboard and account statement reports computed
//! from a JSON dataset export.

pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod reports;
pub mod storage;

pub use config::EquiposConfig;
pub use error::{BillingError, Result};
