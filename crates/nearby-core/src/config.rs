use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Environment variable consulted when the places API key is left empty.
pub const PLACES_API_KEY_ENV: &str = "NEARBY_PLACES_API_KEY";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application configuration directory
    pub config_dir: PathBuf,

    /// Place search provider
    #[serde(default)]
    pub places: PlacesConfig,

    /// Weather provider
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Place search / reverse geocoding for the autocomplete box
    #[serde(default)]
    pub geocoding: GeocodingConfig,

    /// Device location sources
    #[serde(default)]
    pub location: LocationConfig,

    /// Initial search state
    #[serde(default)]
    pub search: SearchConfig,

    /// Shared HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacesConfig {
    /// Base URL of the list-in-boundary API
    pub base_url: String,

    /// Value sent as `x-rapidapi-host`
    pub api_host: String,

    /// Value sent as `x-rapidapi-key`; falls back to `NEARBY_PLACES_API_KEY`
    #[serde(default)]
    pub api_key: String,
}

impl Default for PlacesConfig {
    fn default() -> Self {
        Self {
            base_url: "https://travel-advisor.p.rapidapi.com".to_string(),
            api_host: "travel-advisor.p.rapidapi.com".to_string(),
            api_key: String::new(),
        }
    }
}

impl PlacesConfig {
    /// The configured key, or the environment override when the file leaves it empty.
    pub fn resolved_api_key(&self) -> Option<String> {
        if !self.api_key.is_empty() {
            return Some(self.api_key.clone());
        }
        std::env::var(PLACES_API_KEY_ENV)
            .ok()
            .filter(|k| !k.is_empty())
    }
}

/// Temperature unit preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Base URL of an Open-Meteo compatible forecast API
    pub base_url: String,

    /// Temperature unit preference
    pub temperature_unit: TemperatureUnit,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.open-meteo.com".to_string(),
            temperature_unit: TemperatureUnit::Celsius,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodingConfig {
    /// Base URL of a Nominatim compatible API
    pub base_url: String,

    /// Nominatim requires an identifying user agent
    pub user_agent: String,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: "Nearby/0.1.0".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    /// Fixed device latitude, used instead of a lookup when set with `longitude`
    #[serde(default)]
    pub latitude: Option<f64>,

    #[serde(default)]
    pub longitude: Option<f64>,

    /// IP geolocation endpoint returning `{"lat": .., "lon": ..}`; empty disables it
    #[serde(default = "default_ip_lookup_url")]
    pub ip_lookup_url: String,
}

fn default_ip_lookup_url() -> String {
    "http://ip-api.com/json".to_string()
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            latitude: None,
            longitude: None,
            ip_lookup_url: default_ip_lookup_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Category selected on startup (restaurants, hotels, attractions)
    #[serde(default = "default_category")]
    pub default_category: String,

    /// Width/height of the simulated map viewport in degrees
    #[serde(default = "default_viewport_span")]
    pub viewport_span_degrees: f64,
}

fn default_category() -> String {
    "restaurants".to_string()
}

fn default_viewport_span() -> f64 {
    0.05
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_category: default_category(),
            viewport_span_degrees: default_viewport_span(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds for every provider
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("nearby");

        Self {
            config_dir,
            places: PlacesConfig::default(),
            weather: WeatherConfig::default(),
            geocoding: GeocodingConfig::default(),
            location: LocationConfig::default(),
            search: SearchConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, creating it if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from `path`, writing defaults there if it doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let contents = std::fs::read_to_string(path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns an error if validation fails; warnings are logged.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            anyhow::bail!(
                "Configuration validation failed: {}",
                validation.error_summary()
            );
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(&self.places.base_url, "places.base_url", &mut result);
        self.validate_url(&self.weather.base_url, "weather.base_url", &mut result);
        self.validate_url(&self.geocoding.base_url, "geocoding.base_url", &mut result);

        if !self.location.ip_lookup_url.is_empty() {
            self.validate_url(
                &self.location.ip_lookup_url,
                "location.ip_lookup_url",
                &mut result,
            );
        }

        if self.places.api_host.is_empty() {
            result.add_error("places.api_host", "API host must not be empty");
        }

        if self.places.resolved_api_key().is_none() {
            result.add_warning(
                "places.api_key",
                format!(
                    "No places API key configured (set it here or in {})",
                    PLACES_API_KEY_ENV
                ),
            );
        }

        match (self.location.latitude, self.location.longitude) {
            (Some(lat), Some(lng)) => {
                if !(-90.0..=90.0).contains(&lat) {
                    result.add_error("location.latitude", "Latitude must be within -90..90");
                }
                if !(-180.0..=180.0).contains(&lng) {
                    result.add_error("location.longitude", "Longitude must be within -180..180");
                }
            }
            (None, None) => {}
            _ => result.add_warning(
                "location",
                "Only one of latitude/longitude is set; fixed location ignored",
            ),
        }

        if !matches!(
            self.search.default_category.as_str(),
            "restaurants" | "hotels" | "attractions"
        ) {
            result.add_error(
                "search.default_category",
                format!("Unknown category: {}", self.search.default_category),
            );
        }

        let span = self.search.viewport_span_degrees;
        if !(span.is_finite() && span > 0.0) {
            result.add_error(
                "search.viewport_span_degrees",
                "Viewport span must be greater than 0",
            );
        } else if span > 5.0 {
            result.add_warning(
                "search.viewport_span_degrees",
                "Viewport span is unusually large (>5 degrees)",
            );
        }

        if self.http.timeout_secs == 0 {
            result.add_error("http.timeout_secs", "Timeout must be greater than 0");
        }

        result
    }

    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("nearby");

        Ok(config_dir.join("config.toml"))
    }
}
