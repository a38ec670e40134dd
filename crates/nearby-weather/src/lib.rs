//! Weather service for Nearby
//!
//! Provides current conditions via an Open-Meteo compatible API.

pub mod provider;
pub mod types;

pub use provider::WeatherProvider;
pub use types::*;
