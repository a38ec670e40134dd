//! Device location and place search for Nearby.
//!
//! `location` answers "where is the device" once at startup; `geocode` backs the
//! autocomplete box (query to coordinates) and labels coordinates for display.

pub mod geocode;
pub mod location;

pub use geocode::{GeocodeClient, GeocodeError, PlaceSuggestion};
pub use location::{ConfiguredLocation, FixedLocation, IpLocation, LocationSource};
