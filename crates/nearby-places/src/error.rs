//! Places-specific error types.

use nearby_core::{AppError, ReqwestErrorExt};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlacesError {
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    Parse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl From<PlacesError> for AppError {
    fn from(e: PlacesError) -> Self {
        match e {
            PlacesError::Network(e) => AppError::Network(e.into_network_error()),
            other => AppError::Places(other.to_string()),
        }
    }
}
