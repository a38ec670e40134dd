//! List-in-boundary places API client.

use std::time::Duration;

use nearby_core::{Coordinates, PlacesConfig};
use serde::Deserialize;
use tracing::instrument;

use crate::error::PlacesError;
use crate::types::{Category, RawPlace};

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    data: Vec<RawPlace>,
}

#[derive(Debug, Clone)]
pub struct PlacesClient {
    client: reqwest::Client,
    base_url: String,
    api_host: String,
    api_key: Option<String>,
}

impl PlacesClient {
    pub fn new(config: &PlacesConfig, timeout: Duration) -> Result<Self, PlacesError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_host: config.api_host.clone(),
            api_key: config.resolved_api_key(),
        })
    }

    /// List places of `category` inside the rectangle spanned by `sw` and `ne`.
    ///
    /// Returns every record of the payload unfiltered; admission is the
    /// caller's job.
    #[instrument(skip(self), level = "info")]
    pub async fn nearby_places(
        &self,
        category: Category,
        sw: Coordinates,
        ne: Coordinates,
    ) -> Result<Vec<RawPlace>, PlacesError> {
        let url = format!("{}/{}/list-in-boundary", self.base_url, category.as_str());

        let mut request = self
            .client
            .get(&url)
            .query(&[
                ("bl_latitude", sw.lat),
                ("bl_longitude", sw.lng),
                ("tr_longitude", ne.lng),
                ("tr_latitude", ne.lat),
            ])
            .header("x-rapidapi-host", &self.api_host);

        if let Some(key) = &self.api_key {
            request = request.header("x-rapidapi-key", key);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!("Places API returned {}: {}", status, message);
            return Err(PlacesError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        let parsed: ListResponse =
            serde_json::from_str(&body).map_err(|e| PlacesError::Parse(e.to_string()))?;

        tracing::debug!("Received {} place records", parsed.data.len());
        Ok(parsed.data)
    }
}
