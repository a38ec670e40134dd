use nearby_core::Coordinates;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// The kind of place being searched for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Restaurants,
    Hotels,
    Attractions,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Restaurants, Category::Hotels, Category::Attractions];

    /// Path segment used by the list-in-boundary API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Restaurants => "restaurants",
            Self::Hotels => "hotels",
            Self::Attractions => "attractions",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "restaurants" => Ok(Self::Restaurants),
            "hotels" => Ok(Self::Hotels),
            "attractions" => Ok(Self::Attractions),
            other => Err(format!("unknown category: {}", other)),
        }
    }
}

/// A place record as delivered by the provider.
///
/// Numeric fields arrive as strings or numbers depending on the endpoint, and
/// listings are interleaved with filler rows that carry no name at all.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPlace {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub rating: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub num_reviews: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub price_level: Option<String>,
    #[serde(default)]
    pub ranking: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// A place admitted into the result set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Place {
    pub name: String,
    pub rating: Option<f64>,
    pub num_reviews: u64,
    pub location: Option<Coordinates>,
    pub address: Option<String>,
    pub price_level: Option<String>,
    pub ranking: Option<String>,
    pub website: Option<String>,
    pub phone: Option<String>,
}

impl Place {
    /// Admit a raw record: it needs a non-empty name and at least one review.
    ///
    /// Records that fail are dropped here and never reach the view state.
    pub fn admit(raw: RawPlace) -> Option<Place> {
        let name = raw.name.filter(|n| !n.is_empty())?;
        let num_reviews = raw
            .num_reviews
            .filter(|n| n.is_finite() && *n >= 1.0)
            .map(|n| n as u64)?;

        let location = match (raw.latitude, raw.longitude) {
            (Some(lat), Some(lng)) => Some(Coordinates::new(lat, lng)).filter(Coordinates::is_valid),
            _ => None,
        };

        Some(Place {
            name,
            rating: raw.rating.filter(|r| r.is_finite()),
            num_reviews,
            location,
            address: raw.address,
            price_level: raw.price_level,
            ranking: raw.ranking,
            website: raw.website,
            phone: raw.phone,
        })
    }

    /// Admit every record of a fetched batch, preserving provider order.
    pub fn admit_all(raw: impl IntoIterator<Item = RawPlace>) -> Vec<Place> {
        raw.into_iter().filter_map(Place::admit).collect()
    }
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(|v| match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }))
}
