//! Alpaca market-data REST provider (`/v2/stocks/bars`).

pub mod params;
pub mod provider;
pub mod response;

pub use provider::AlpacaProvider;
