//! Minimum-rating filter over the raw result set.

use std::sync::Arc;

use nearby_places::Place;

/// The minimum rating typed by the user. Empty means "no filter".
///
/// Kept as the raw text so the input box round-trips exactly; comparisons go
/// through [`RatingThreshold::numeric`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RatingThreshold(String);

impl RatingThreshold {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Blank input counts as empty.
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// The threshold as a number, or `None` when empty.
    ///
    /// Text that is not a number becomes NaN, which no rating exceeds.
    pub fn numeric(&self) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        Some(self.0.trim().parse::<f64>().unwrap_or(f64::NAN))
    }

    /// Strictly-greater comparison; unrated places never pass a set threshold.
    pub fn admits(&self, place: &Place) -> bool {
        match self.numeric() {
            None => true,
            Some(min) => place.rating.is_some_and(|rating| rating > min),
        }
    }
}

impl std::fmt::Display for RatingThreshold {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Places to display for `raw` under `threshold`.
///
/// With no threshold the raw set itself is returned (same allocation).
pub fn displayed_results(raw: &Arc<[Place]>, threshold: &RatingThreshold) -> Arc<[Place]> {
    if threshold.is_empty() {
        return Arc::clone(raw);
    }
    raw.iter()
        .filter(|place| threshold.admits(place))
        .cloned()
        .collect()
}
