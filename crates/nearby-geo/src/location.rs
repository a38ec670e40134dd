use std::future::Future;
use std::time::Duration;

use nearby_core::{Coordinates, LocationConfig, LocationError};
use reqwest::Client;
use serde::Deserialize;

/// A one-shot source of device coordinates.
pub trait LocationSource: Send + Sync {
    fn locate(&self) -> impl Future<Output = Result<Coordinates, LocationError>> + Send;
}

/// Coordinates pinned in the config file.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub Coordinates);

impl LocationSource for FixedLocation {
    async fn locate(&self) -> Result<Coordinates, LocationError> {
        Ok(self.0)
    }
}

#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

/// Approximate location from an IP geolocation endpoint.
#[derive(Debug, Clone)]
pub struct IpLocation {
    client: Client,
    url: String,
}

impl IpLocation {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, LocationError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LocationError::Other(e.to_string()))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl LocationSource for IpLocation {
    async fn locate(&self) -> Result<Coordinates, LocationError> {
        let response = self.client.get(&self.url).send().await.map_err(|e| {
            if e.is_timeout() {
                LocationError::Timeout
            } else {
                LocationError::ServiceUnavailable
            }
        })?;

        if !response.status().is_success() {
            tracing::debug!("IP lookup returned status {}", response.status());
            return Err(LocationError::ServiceUnavailable);
        }

        let body: IpLookupResponse = response
            .json()
            .await
            .map_err(|e| LocationError::Other(e.to_string()))?;

        if body.status.as_deref() == Some("fail") {
            return Err(LocationError::Other(
                body.message.unwrap_or_else(|| "lookup failed".to_string()),
            ));
        }

        match (body.lat, body.lon) {
            (Some(lat), Some(lon)) => {
                let coords = Coordinates::new(lat, lon);
                if coords.is_valid() {
                    Ok(coords)
                } else {
                    Err(LocationError::Other(format!("invalid coordinates {}", coords)))
                }
            }
            _ => Err(LocationError::Other("lookup returned no coordinates".to_string())),
        }
    }
}

/// The location source selected by configuration.
///
/// A fixed location wins; otherwise the IP lookup is used when configured.
#[derive(Debug, Clone)]
pub enum ConfiguredLocation {
    Fixed(FixedLocation),
    Ip(IpLocation),
    Unavailable,
}

impl ConfiguredLocation {
    pub fn from_config(config: &LocationConfig, timeout: Duration) -> Self {
        if let (Some(lat), Some(lng)) = (config.latitude, config.longitude) {
            return Self::Fixed(FixedLocation(Coordinates::new(lat, lng)));
        }

        if config.ip_lookup_url.is_empty() {
            return Self::Unavailable;
        }

        match IpLocation::new(config.ip_lookup_url.clone(), timeout) {
            Ok(ip) => Self::Ip(ip),
            Err(e) => {
                tracing::warn!("Failed to create IP location client: {}", e);
                Self::Unavailable
            }
        }
    }
}

impl LocationSource for ConfiguredLocation {
    async fn locate(&self) -> Result<Coordinates, LocationError> {
        match self {
            Self::Fixed(fixed) => fixed.locate().await,
            Self::Ip(ip) => ip.locate().await,
            Self::Unavailable => Err(LocationError::ServiceUnavailable),
        }
    }
}
