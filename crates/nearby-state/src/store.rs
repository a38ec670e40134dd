//! The single owner of view state.
//!
//! Every mutation goes through a typed method. Mutators of a watched signal
//! (bounds, coordinates, category) end in [`ViewStore::reconcile`], which hands
//! back the fetch to dispatch, if any. Fetch responses come back through
//! `apply_places` / `apply_weather` tagged with the generation they were issued
//! under; anything older than the current generation is discarded.

use std::sync::Arc;

use nearby_core::{AppError, Coordinates, ViewportBounds};
use nearby_places::{Category, Place, PlacesError, RawPlace};
use nearby_weather::{WeatherError, WeatherSnapshot};

use crate::error::StateError;
use crate::filter::{displayed_results, RatingThreshold};
use crate::selection::Highlight;

/// Everything needed to issue the two fetches for one trigger.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FetchRequest {
    pub generation: u64,
    pub category: Category,
    pub bounds: ViewportBounds,
    /// Weather is only fetched once coordinates are known.
    pub coordinates: Option<Coordinates>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    Places,
    Weather,
}

/// What happened to a fetch response handed to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied(FetchKind),
    Failed(FetchKind),
    /// Issued under an older generation; state untouched.
    Stale(FetchKind),
}

#[derive(Debug, Clone, Copy, Default)]
struct Pending {
    places: bool,
    weather: bool,
}

#[derive(Debug, Clone)]
pub struct ViewStore {
    coordinates: Option<Coordinates>,
    bounds: Option<ViewportBounds>,
    category: Category,
    threshold: RatingThreshold,
    raw: Arc<[Place]>,
    displayed: Arc<[Place]>,
    weather: Option<WeatherSnapshot>,
    highlight: Highlight,
    generation: u64,
    pending: Pending,
    notices: Vec<&'static str>,
}

impl Default for ViewStore {
    fn default() -> Self {
        Self::new(Category::default())
    }
}

impl ViewStore {
    pub fn new(category: Category) -> Self {
        let raw: Arc<[Place]> = Arc::from(Vec::new());
        Self {
            coordinates: None,
            bounds: None,
            category,
            threshold: RatingThreshold::default(),
            displayed: Arc::clone(&raw),
            raw,
            weather: None,
            highlight: Highlight::default(),
            generation: 0,
            pending: Pending::default(),
            notices: Vec::new(),
        }
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        self.coordinates
    }

    pub fn bounds(&self) -> Option<ViewportBounds> {
        self.bounds
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn rating_threshold(&self) -> &RatingThreshold {
        &self.threshold
    }

    /// Admitted places from the latest successful fetch, unfiltered.
    pub fn raw_results(&self) -> &Arc<[Place]> {
        &self.raw
    }

    /// The places shown in the list and on the map.
    ///
    /// Recomputed only when the raw set or the threshold changes, so repeated
    /// reads return the same allocation.
    pub fn displayed_results(&self) -> &Arc<[Place]> {
        &self.displayed
    }

    pub fn weather(&self) -> Option<&WeatherSnapshot> {
        self.weather.as_ref()
    }

    /// True while a fetch of the current generation is outstanding.
    pub fn is_loading(&self) -> bool {
        self.pending.places || self.pending.weather
    }

    pub fn highlighted_index(&self) -> Option<usize> {
        self.highlight.index()
    }

    pub fn highlighted_place(&self) -> Option<&Place> {
        self.highlight.index().and_then(|i| self.displayed.get(i))
    }

    pub fn is_highlighted(&self, index: usize) -> bool {
        self.highlight.is_highlighted(index)
    }

    /// Number of fetch triggers so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Select a new category; triggers a fetch only if it differs.
    pub fn set_category(&mut self, category: Category) -> Option<FetchRequest> {
        if category == self.category {
            return None;
        }
        self.category = category;
        self.reconcile()
    }

    /// Replace the coordinates; triggers a fetch only if they differ.
    pub fn set_coordinates(&mut self, coordinates: Coordinates) -> Option<FetchRequest> {
        if self.coordinates == Some(coordinates) {
            return None;
        }
        self.coordinates = Some(coordinates);
        self.reconcile()
    }

    /// Record the map's bounds. Every bounds event re-triggers while bounds are present.
    pub fn set_bounds(&mut self, bounds: Option<ViewportBounds>) -> Option<FetchRequest> {
        self.bounds = bounds;
        self.reconcile()
    }

    /// Replace the rating threshold. Never triggers a fetch.
    pub fn set_rating_threshold(&mut self, threshold: RatingThreshold) {
        if threshold == self.threshold {
            return;
        }
        self.threshold = threshold;
        self.rederive();
    }

    /// Highlight an entry of the displayed set, or clear with `None`.
    pub fn set_highlighted_index(&mut self, index: Option<usize>) -> Result<(), StateError> {
        self.highlight.select(index, self.displayed.len())
    }

    /// Start a new generation if bounds are present.
    ///
    /// Marks the fetches of the new generation pending and returns them;
    /// responses of earlier generations are discarded from here on.
    pub fn reconcile(&mut self) -> Option<FetchRequest> {
        let bounds = self.bounds?;

        self.generation += 1;
        self.pending = Pending {
            places: true,
            weather: self.coordinates.is_some(),
        };

        Some(FetchRequest {
            generation: self.generation,
            category: self.category,
            bounds,
            coordinates: self.coordinates,
        })
    }

    /// Apply a places response issued under `generation`.
    ///
    /// Success replaces the raw set with the admitted records and resets the
    /// threshold and highlight. Failure keeps the previous results.
    pub fn apply_places(
        &mut self,
        generation: u64,
        result: Result<Vec<RawPlace>, PlacesError>,
    ) -> ApplyOutcome {
        if generation != self.generation {
            tracing::debug!(
                "Discarding places response from generation {} (current {})",
                generation,
                self.generation
            );
            return ApplyOutcome::Stale(FetchKind::Places);
        }

        self.pending.places = false;

        match result {
            Ok(records) => {
                let received = records.len();
                self.raw = Place::admit_all(records).into();
                self.threshold = RatingThreshold::default();
                self.rederive();
                tracing::info!(
                    "Loaded {} {} ({} records dropped)",
                    self.raw.len(),
                    self.category,
                    received - self.raw.len()
                );
                ApplyOutcome::Applied(FetchKind::Places)
            }
            Err(e) => {
                tracing::error!("Error fetching places data: {}", e);
                self.notices.push(AppError::from(e).user_message());
                ApplyOutcome::Failed(FetchKind::Places)
            }
        }
    }

    /// Apply a weather response issued under `generation`.
    ///
    /// Failure leaves the previous snapshot in place.
    pub fn apply_weather(
        &mut self,
        generation: u64,
        result: Result<WeatherSnapshot, WeatherError>,
    ) -> ApplyOutcome {
        if generation != self.generation {
            tracing::debug!(
                "Discarding weather response from generation {} (current {})",
                generation,
                self.generation
            );
            return ApplyOutcome::Stale(FetchKind::Weather);
        }

        self.pending.weather = false;

        match result {
            Ok(snapshot) => {
                self.weather = Some(snapshot);
                ApplyOutcome::Applied(FetchKind::Weather)
            }
            Err(e) => {
                tracing::warn!("Error fetching weather data: {}", e);
                self.notices.push(AppError::from(e).user_message());
                ApplyOutcome::Failed(FetchKind::Weather)
            }
        }
    }

    /// User-facing messages for failed fetches of the current generation, oldest first.
    pub fn take_notices(&mut self) -> Vec<&'static str> {
        std::mem::take(&mut self.notices)
    }

    // The displayed set is replaced here, so the old highlight means nothing.
    fn rederive(&mut self) {
        self.displayed = displayed_results(&self.raw, &self.threshold);
        self.highlight.clear();
    }
}
