//! View state synchronization for Nearby.
//!
//! One [`ViewStore`] owns every signal the view reads (coordinates, bounds,
//! category, rating threshold, fetched results, weather, highlight). The
//! [`Session`] controller feeds user and map events into it, dispatches the
//! fetches it asks for, and applies their responses one at a time.

pub mod bootstrap;
pub mod coordinator;
pub mod error;
pub mod filter;
pub mod selection;
pub mod session;
pub mod store;

pub use bootstrap::GeolocationBootstrap;
pub use coordinator::{FetchCoordinator, FetchEvent, PlacesSource, WeatherSource};
pub use error::StateError;
pub use filter::{displayed_results, RatingThreshold};
pub use selection::Highlight;
pub use session::Session;
pub use store::{ApplyOutcome, FetchKind, FetchRequest, ViewStore};
