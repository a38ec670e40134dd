//! Nearby place search.
//!
//! Provides the list-in-boundary client and the place types shared with the
//! view state, including the admission rule applied to every fetched record.

pub mod client;
pub mod error;
pub mod types;

pub use client::PlacesClient;
pub use error::PlacesError;
pub use types::{Category, Place, RawPlace};
