//! The controller the view layer talks to.
//!
//! Owns the [`ViewStore`] and the receiving end of the coordinator's channel,
//! so every state transition (user input, map event, fetch response) happens
//! on whoever drives the session, one at a time.

use nearby_core::{Coordinates, LocationError, ViewportBounds};
use nearby_geo::{LocationSource, PlaceSuggestion};
use nearby_places::Category;
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::bootstrap::GeolocationBootstrap;
use crate::coordinator::{FetchCoordinator, FetchEvent, PlacesSource, WeatherSource};
use crate::error::StateError;
use crate::filter::RatingThreshold;
use crate::store::{ApplyOutcome, FetchRequest, ViewStore};

pub struct Session<P, W> {
    store: ViewStore,
    coordinator: FetchCoordinator<P, W>,
    events: mpsc::UnboundedReceiver<FetchEvent>,
}

impl<P: PlacesSource, W: WeatherSource> Session<P, W> {
    /// Create a session whose fetches run on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime; use [`Session::with_runtime`] there.
    pub fn new(places: P, weather: W, category: Category) -> Self {
        Self::with_runtime(places, weather, category, Handle::current())
    }

    /// Create a session whose fetches are spawned onto `runtime`.
    pub fn with_runtime(places: P, weather: W, category: Category, runtime: Handle) -> Self {
        let (coordinator, events) = FetchCoordinator::new(places, weather, runtime);
        Self {
            store: ViewStore::new(category),
            coordinator,
            events,
        }
    }

    /// Read-only view of the current state.
    pub fn store(&self) -> &ViewStore {
        &self.store
    }

    /// Run the one-shot device location lookup and adopt its coordinates.
    ///
    /// On failure coordinates stay unset and the error is handed back for display.
    pub async fn bootstrap<L: LocationSource>(
        &mut self,
        bootstrap: GeolocationBootstrap<L>,
    ) -> Result<Coordinates, LocationError> {
        let coords = bootstrap.run().await?;
        self.set_coordinates(coords);
        Ok(coords)
    }

    pub fn set_category(&mut self, category: Category) {
        let request = self.store.set_category(category);
        self.dispatch(request);
    }

    pub fn set_coordinates(&mut self, coordinates: Coordinates) {
        let request = self.store.set_coordinates(coordinates);
        self.dispatch(request);
    }

    /// Bounds-changed event from the map surface.
    pub fn set_bounds(&mut self, bounds: Option<ViewportBounds>) {
        let request = self.store.set_bounds(bounds);
        self.dispatch(request);
    }

    pub fn set_rating_threshold(&mut self, value: impl Into<String>) {
        self.store.set_rating_threshold(RatingThreshold::new(value));
    }

    /// List click (or marker click) on the given displayed index.
    pub fn set_highlighted_index(&mut self, index: Option<usize>) -> Result<(), StateError> {
        self.store.set_highlighted_index(index)
    }

    /// Autocomplete selection: the chosen place's coordinates replace the current ones.
    ///
    /// The map recenters on them and reports new bounds on its own.
    pub fn select_place(&mut self, suggestion: &PlaceSuggestion) {
        tracing::info!("Selected place: {}", suggestion.label);
        self.set_coordinates(suggestion.coordinates());
    }

    /// Re-issue both fetches for the current inputs, if bounds are known.
    pub fn refresh(&mut self) {
        let request = self.store.reconcile();
        self.dispatch(request);
    }

    /// Drain the user-facing messages left by failed fetches.
    pub fn take_notices(&mut self) -> Vec<&'static str> {
        self.store.take_notices()
    }

    /// Hand one fetch response to the store.
    pub fn apply(&mut self, event: FetchEvent) -> ApplyOutcome {
        match event {
            FetchEvent::Places { generation, result } => {
                self.store.apply_places(generation, result)
            }
            FetchEvent::Weather { generation, result } => {
                self.store.apply_weather(generation, result)
            }
        }
    }

    /// Wait for the next fetch response and apply it.
    pub async fn next_event(&mut self) -> Option<ApplyOutcome> {
        let event = self.events.recv().await?;
        Some(self.apply(event))
    }

    /// Apply every response that has already arrived, without waiting.
    pub fn apply_ready(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events.try_recv() {
            self.apply(event);
            applied += 1;
        }
        applied
    }

    /// Apply responses until no fetch of the current generation is outstanding.
    pub async fn settle(&mut self) {
        while self.store.is_loading() {
            if self.next_event().await.is_none() {
                break;
            }
        }
    }

    fn dispatch(&mut self, request: Option<FetchRequest>) {
        if let Some(request) = request {
            self.coordinator.dispatch(&request);
        }
    }
}
