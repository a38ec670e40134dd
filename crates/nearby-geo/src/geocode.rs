//! Forward and reverse geocoding against a Nominatim compatible API.
//!
//! Forward search backs the autocomplete box: the user picks one suggestion
//! and its coordinates replace the current ones.

use std::time::Duration;

use nearby_core::{Coordinates, GeocodingConfig};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

const SEARCH_LIMIT: &str = "5";

#[derive(Error, Debug)]
pub enum GeocodeError {
    #[error("Empty search query")]
    EmptyQuery,

    #[error("API error: {status}")]
    Api { status: u16 },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// One entry of the autocomplete dropdown.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceSuggestion {
    pub label: String,
    pub lat: f64,
    pub lng: f64,
}

impl PlaceSuggestion {
    /// The single coordinate pair carried by the chosen place.
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lng)
    }
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    display_name: Option<String>,
    lat: String,
    lon: String,
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    address: Option<ReverseAddress>,
}

#[derive(Debug, Deserialize)]
struct ReverseAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
    county: Option<String>,
    state: Option<String>,
    country: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GeocodeClient {
    client: Client,
    base_url: String,
}

impl GeocodeClient {
    pub fn new(config: &GeocodingConfig, timeout: Duration) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Search places matching `query`, best match first.
    ///
    /// Hits with unparsable coordinates are skipped.
    #[instrument(skip(self), level = "info")]
    pub async fn search(&self, query: &str) -> Result<Vec<PlaceSuggestion>, GeocodeError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(GeocodeError::EmptyQuery);
        }

        let url = format!("{}/search", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("q", query), ("format", "json"), ("limit", SEARCH_LIMIT)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GeocodeError::Api {
                status: response.status().as_u16(),
            });
        }

        let hits: Vec<SearchHit> = response.json().await?;

        Ok(hits
            .into_iter()
            .filter_map(|hit| {
                let lat = hit.lat.trim().parse::<f64>().ok()?;
                let lng = hit.lon.trim().parse::<f64>().ok()?;
                Some(PlaceSuggestion {
                    label: hit.display_name.unwrap_or_else(|| format!("{:.4}, {:.4}", lat, lng)),
                    lat,
                    lng,
                })
            })
            .collect())
    }

    /// Reverse geocode coordinates to a human-readable place name (e.g. "Seattle, Washington").
    /// Returns `None` on failure; the caller can fall back to coordinates.
    #[instrument(skip(self), level = "debug")]
    pub async fn reverse(&self, coords: Coordinates) -> Option<String> {
        let url = format!("{}/reverse", self.base_url);

        let response = match self
            .client
            .get(&url)
            .query(&[
                ("lat", coords.lat.to_string()),
                ("lon", coords.lng.to_string()),
                ("format", "json".to_string()),
                ("zoom", "10".to_string()),
            ])
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!("Reverse geocode request failed: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::debug!("Reverse geocode returned status {}", response.status());
            return None;
        }

        let body: ReverseResponse = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                tracing::debug!("Reverse geocode parse error: {}", e);
                return None;
            }
        };

        let addr = body.address?;
        let state = addr.state.clone();
        let country = addr.country.clone();

        let place = addr
            .city
            .or(addr.town)
            .or(addr.village)
            .or(addr.municipality)
            .or(addr.county)
            .or(addr.state)
            .or(addr.country)?;

        let suffix = state
            .filter(|s| !s.is_empty() && *s != place)
            .or_else(|| country.filter(|c| !c.is_empty() && *c != place));

        Some(match suffix {
            Some(s) => format!("{}, {}", place, s),
            None => place,
        })
    }
}
