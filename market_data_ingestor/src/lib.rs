//! Price-series ingestion: vendor-agnostic bar models and the providers that
//! fill them.
//!
//! Every provider implements [`providers::DataProvider`] and returns
//! [`models::bar::BarSeries`]; downstream crates never see vendor payloads.

pub mod models;
pub mod providers;
