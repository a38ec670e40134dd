//! Dispatches the places and weather fetches for a [`FetchRequest`].
//!
//! The two fetches run as independent tasks and report back over a channel;
//! neither waits for the other. Results are not applied here: the owner of
//! the receiving end hands each [`FetchEvent`] to the store.

use std::future::Future;
use std::sync::Arc;

use nearby_core::Coordinates;
use nearby_places::{Category, PlacesClient, PlacesError, RawPlace};
use nearby_weather::{WeatherError, WeatherProvider, WeatherSnapshot};
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::store::FetchRequest;

/// Source of nearby place records.
pub trait PlacesSource: Send + Sync + 'static {
    fn fetch_places(
        &self,
        category: Category,
        sw: Coordinates,
        ne: Coordinates,
    ) -> impl Future<Output = Result<Vec<RawPlace>, PlacesError>> + Send;
}

/// Source of local weather.
pub trait WeatherSource: Send + Sync + 'static {
    fn fetch_weather(
        &self,
        lat: f64,
        lng: f64,
    ) -> impl Future<Output = Result<WeatherSnapshot, WeatherError>> + Send;
}

impl PlacesSource for PlacesClient {
    async fn fetch_places(
        &self,
        category: Category,
        sw: Coordinates,
        ne: Coordinates,
    ) -> Result<Vec<RawPlace>, PlacesError> {
        self.nearby_places(category, sw, ne).await
    }
}

impl WeatherSource for WeatherProvider {
    async fn fetch_weather(&self, lat: f64, lng: f64) -> Result<WeatherSnapshot, WeatherError> {
        self.fetch(lat, lng).await
    }
}

/// A fetch response, tagged with the generation it was issued under.
#[derive(Debug)]
pub enum FetchEvent {
    Places {
        generation: u64,
        result: Result<Vec<RawPlace>, PlacesError>,
    },
    Weather {
        generation: u64,
        result: Result<WeatherSnapshot, WeatherError>,
    },
}

impl FetchEvent {
    pub fn generation(&self) -> u64 {
        match self {
            Self::Places { generation, .. } | Self::Weather { generation, .. } => *generation,
        }
    }
}

pub struct FetchCoordinator<P, W> {
    places: Arc<P>,
    weather: Arc<W>,
    tx: mpsc::UnboundedSender<FetchEvent>,
    runtime: Handle,
}

impl<P: PlacesSource, W: WeatherSource> FetchCoordinator<P, W> {
    /// Create a coordinator and the receiver its events arrive on.
    ///
    /// Fetches are spawned onto `runtime`, so `dispatch` may be called from
    /// outside any runtime context.
    pub fn new(
        places: P,
        weather: W,
        runtime: Handle,
    ) -> (Self, mpsc::UnboundedReceiver<FetchEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let coordinator = Self {
            places: Arc::new(places),
            weather: Arc::new(weather),
            tx,
            runtime,
        };
        (coordinator, rx)
    }

    /// Spawn the fetches for `request` onto the coordinator's runtime.
    ///
    /// Exactly one event is sent per spawned fetch, success or failure.
    pub fn dispatch(&self, request: &FetchRequest) {
        let generation = request.generation;
        tracing::debug!(
            "Dispatching generation {} ({} in {:?})",
            generation,
            request.category,
            request.bounds
        );

        if let Some(coords) = request.coordinates {
            let weather = Arc::clone(&self.weather);
            let tx = self.tx.clone();
            self.runtime.spawn(async move {
                let result = weather.fetch_weather(coords.lat, coords.lng).await;
                if tx.send(FetchEvent::Weather { generation, result }).is_err() {
                    tracing::debug!("Weather response for generation {} dropped", generation);
                }
            });
        }

        let places = Arc::clone(&self.places);
        let tx = self.tx.clone();
        let category = request.category;
        let bounds = request.bounds;
        self.runtime.spawn(async move {
            let result = places.fetch_places(category, bounds.sw, bounds.ne).await;
            if tx.send(FetchEvent::Places { generation, result }).is_err() {
                tracing::debug!("Places response for generation {} dropped", generation);
            }
        });
    }
}
