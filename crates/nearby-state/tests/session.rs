//! Session tests against in-process fake sources.
//!
//! Places responses are gated per category with oneshot channels so each test
//! decides exactly when (and in which order) responses arrive.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use nearby_core::{Coordinates, LocationError, ViewportBounds};
use nearby_geo::{FixedLocation, LocationSource, PlaceSuggestion};
use nearby_places::{Category, PlacesError, RawPlace};
use nearby_state::{
    ApplyOutcome, FetchKind, GeolocationBootstrap, PlacesSource, Session, WeatherSource,
};
use nearby_weather::{CurrentWeather, WeatherCondition, WeatherError, WeatherSnapshot};
use tokio::sync::oneshot;

type PlacesResult = Result<Vec<RawPlace>, PlacesError>;

#[derive(Clone, Default)]
struct GatedPlaces {
    gates: Arc<Mutex<HashMap<Category, oneshot::Receiver<PlacesResult>>>>,
    calls: Arc<AtomicUsize>,
}

impl GatedPlaces {
    /// Arm the next request for `category`; its response is whatever gets sent.
    fn expect(&self, category: Category) -> oneshot::Sender<PlacesResult> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(category, rx);
        tx
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PlacesSource for GatedPlaces {
    fn fetch_places(
        &self,
        category: Category,
        _sw: Coordinates,
        _ne: Coordinates,
    ) -> impl std::future::Future<Output = PlacesResult> + Send {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gates.lock().unwrap().remove(&category);
        async move {
            match gate {
                Some(rx) => rx
                    .await
                    .unwrap_or_else(|_| Err(PlacesError::Parse("gate dropped".into()))),
                None => Ok(Vec::new()),
            }
        }
    }
}

#[derive(Clone, Default)]
struct InstantWeather {
    calls: Arc<AtomicUsize>,
    fail: bool,
}

impl InstantWeather {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl WeatherSource for InstantWeather {
    async fn fetch_weather(&self, lat: f64, lng: f64) -> Result<WeatherSnapshot, WeatherError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(WeatherError::Parse("offline".into()));
        }
        Ok(WeatherSnapshot {
            coordinates: Coordinates::new(lat, lng),
            current: CurrentWeather {
                temperature: 18.0,
                feels_like: 17.0,
                humidity: 60,
                wind_speed: 4.0,
                condition: WeatherCondition::PartlyCloudy,
            },
            fetched_at: Utc::now(),
        })
    }
}

fn raw(name: &str, rating: f64, num_reviews: f64) -> RawPlace {
    RawPlace {
        name: Some(name.to_string()),
        rating: Some(rating),
        num_reviews: Some(num_reviews),
        ..RawPlace::default()
    }
}

fn seattle() -> Coordinates {
    Coordinates::new(47.6062, -122.3321)
}

fn bounds_around(center: Coordinates) -> ViewportBounds {
    ViewportBounds::around(center, 0.05)
}

fn displayed_names<P: PlacesSource, W: WeatherSource>(session: &Session<P, W>) -> Vec<String> {
    session
        .store()
        .displayed_results()
        .iter()
        .map(|p| p.name.clone())
        .collect()
}

async fn settle<P: PlacesSource, W: WeatherSource>(session: &mut Session<P, W>) {
    tokio::time::timeout(Duration::from_secs(5), session.settle())
        .await
        .expect("session did not settle");
}

/// Apply responses until the stale places response has been seen.
async fn drain_until_stale_places<P: PlacesSource, W: WeatherSource>(session: &mut Session<P, W>) {
    let wait = async {
        while let Some(outcome) = session.next_event().await {
            if outcome == ApplyOutcome::Stale(FetchKind::Places) {
                return;
            }
        }
    };
    tokio::time::timeout(Duration::from_secs(5), wait)
        .await
        .expect("stale places response never arrived");
}

#[tokio::test]
async fn test_no_bounds_means_no_network_calls() {
    let places = GatedPlaces::default();
    let weather = InstantWeather::default();
    let mut session = Session::new(places.clone(), weather.clone(), Category::Restaurants);

    session.set_coordinates(seattle());
    session.set_category(Category::Hotels);
    session.set_coordinates(Coordinates::new(40.7, -74.0));
    session.set_rating_threshold("4");
    tokio::task::yield_now().await;

    assert_eq!(places.calls(), 0);
    assert_eq!(weather.calls(), 0);
    assert!(!session.store().is_loading());
    assert_eq!(session.apply_ready(), 0);
}

#[tokio::test]
async fn test_fetch_cycle_loads_places_and_weather() {
    let places = GatedPlaces::default();
    let weather = InstantWeather::default();
    let mut session = Session::new(places.clone(), weather.clone(), Category::Restaurants);

    let gate = places.expect(Category::Restaurants);
    session.set_coordinates(seattle());
    session.set_bounds(Some(bounds_around(seattle())));
    assert!(session.store().is_loading());

    gate.send(Ok(vec![raw("A", 4.5, 10.0), raw("B", 3.0, 0.0)]))
        .unwrap();
    settle(&mut session).await;

    assert!(!session.store().is_loading());
    assert_eq!(displayed_names(&session), vec!["A"]);
    let snapshot = session.store().weather().unwrap();
    assert_eq!(snapshot.coordinates, seattle());
    assert_eq!(places.calls(), 1);
    assert_eq!(weather.calls(), 1);
}

#[tokio::test]
async fn test_rating_filter_does_not_refetch() {
    let places = GatedPlaces::default();
    let weather = InstantWeather::default();
    let mut session = Session::new(places.clone(), weather.clone(), Category::Restaurants);

    let gate = places.expect(Category::Restaurants);
    session.set_bounds(Some(bounds_around(seattle())));
    gate.send(Ok(vec![raw("hi", 4.5, 3.0), raw("lo", 2.0, 3.0)]))
        .unwrap();
    settle(&mut session).await;

    session.set_rating_threshold("3");
    tokio::task::yield_now().await;

    assert_eq!(displayed_names(&session), vec!["hi"]);
    assert_eq!(places.calls(), 1);
    assert!(!session.store().is_loading());
}

#[tokio::test]
async fn test_places_failure_clears_loading_and_keeps_results() {
    let places = GatedPlaces::default();
    let weather = InstantWeather::default();
    let mut session = Session::new(places.clone(), weather.clone(), Category::Restaurants);

    let gate = places.expect(Category::Restaurants);
    session.set_coordinates(seattle());
    session.set_bounds(Some(bounds_around(seattle())));
    gate.send(Ok(vec![raw("Kept", 4.0, 12.0)])).unwrap();
    settle(&mut session).await;
    let before = Arc::clone(session.store().displayed_results());

    let gate = places.expect(Category::Restaurants);
    session.set_bounds(Some(bounds_around(seattle())));
    assert!(session.store().is_loading());

    gate.send(Err(PlacesError::Api {
        status: 502,
        message: "bad gateway".into(),
    }))
    .unwrap();
    settle(&mut session).await;

    assert!(!session.store().is_loading());
    assert!(Arc::ptr_eq(&before, session.store().displayed_results()));
    assert_eq!(displayed_names(&session), vec!["Kept"]);

    let notices = session.take_notices();
    assert_eq!(notices.len(), 1);
    assert!(notices[0].contains("places"));
}

#[tokio::test]
async fn test_weather_failure_is_not_fatal() {
    let places = GatedPlaces::default();
    let weather = InstantWeather {
        fail: true,
        ..InstantWeather::default()
    };
    let mut session = Session::new(places.clone(), weather, Category::Restaurants);

    let gate = places.expect(Category::Restaurants);
    session.set_coordinates(seattle());
    session.set_bounds(Some(bounds_around(seattle())));
    gate.send(Ok(vec![raw("A", 4.0, 1.0)])).unwrap();
    settle(&mut session).await;

    assert!(session.store().weather().is_none());
    assert_eq!(displayed_names(&session), vec!["A"]);
    assert!(!session.store().is_loading());
}

#[tokio::test]
async fn test_stale_category_response_cannot_overwrite_newer_results() {
    let places = GatedPlaces::default();
    let weather = InstantWeather::default();
    let mut session = Session::new(places.clone(), weather, Category::Restaurants);

    let restaurants = places.expect(Category::Restaurants);
    let hotels = places.expect(Category::Hotels);

    session.set_coordinates(seattle());
    session.set_bounds(Some(bounds_around(seattle())));
    session.set_category(Category::Hotels);

    hotels.send(Ok(vec![raw("Hotel", 4.2, 50.0)])).unwrap();
    settle(&mut session).await;
    assert_eq!(displayed_names(&session), vec!["Hotel"]);

    restaurants
        .send(Ok(vec![raw("Diner", 4.8, 300.0)]))
        .unwrap();
    drain_until_stale_places(&mut session).await;

    assert_eq!(session.store().category(), Category::Hotels);
    assert_eq!(displayed_names(&session), vec!["Hotel"]);
    assert!(!session.store().is_loading());
}

#[tokio::test]
async fn test_new_results_reset_threshold_and_highlight() {
    let places = GatedPlaces::default();
    let weather = InstantWeather::default();
    let mut session = Session::new(places.clone(), weather, Category::Restaurants);

    let gate = places.expect(Category::Restaurants);
    session.set_bounds(Some(bounds_around(seattle())));
    gate.send(Ok(vec![raw("A", 4.5, 2.0), raw("B", 3.5, 2.0)]))
        .unwrap();
    settle(&mut session).await;

    session.set_rating_threshold("4");
    session.set_highlighted_index(Some(0)).unwrap();
    assert!(session.set_highlighted_index(Some(1)).is_err());

    let gate = places.expect(Category::Attractions);
    session.set_category(Category::Attractions);
    gate.send(Ok(vec![raw("Museum", 4.9, 80.0)])).unwrap();
    settle(&mut session).await;

    assert!(session.store().rating_threshold().is_empty());
    assert_eq!(session.store().highlighted_index(), None);
    assert_eq!(displayed_names(&session), vec!["Museum"]);
}

#[tokio::test]
async fn test_autocomplete_selection_replaces_coordinates() {
    let places = GatedPlaces::default();
    let weather = InstantWeather::default();
    let mut session = Session::new(places.clone(), weather.clone(), Category::Restaurants);

    session.set_bounds(Some(bounds_around(seattle())));
    session.set_coordinates(seattle());
    settle(&mut session).await;

    let suggestion = PlaceSuggestion {
        label: "Portland, Oregon".to_string(),
        lat: 45.5152,
        lng: -122.6784,
    };
    session.select_place(&suggestion);
    assert_eq!(session.store().coordinates(), Some(suggestion.coordinates()));

    // The map recenters and reports the new viewport.
    session.set_bounds(Some(bounds_around(suggestion.coordinates())));
    settle(&mut session).await;

    let snapshot = session.store().weather().unwrap();
    assert_eq!(snapshot.coordinates, suggestion.coordinates());
}

#[tokio::test]
async fn test_bootstrap_sets_coordinates_once() {
    let places = GatedPlaces::default();
    let weather = InstantWeather::default();
    let mut session = Session::new(places, weather, Category::Restaurants);

    let found = session
        .bootstrap(GeolocationBootstrap::new(FixedLocation(seattle())))
        .await;

    assert_eq!(found.ok(), Some(seattle()));
    assert_eq!(session.store().coordinates(), Some(seattle()));
    assert!(!session.store().is_loading());
}

struct Unavailable;

impl LocationSource for Unavailable {
    async fn locate(&self) -> Result<Coordinates, LocationError> {
        Err(LocationError::ServiceUnavailable)
    }
}

#[tokio::test]
async fn test_bootstrap_failure_leaves_coordinates_unset() {
    let places = GatedPlaces::default();
    let weather = InstantWeather::default();
    let mut session = Session::new(places, weather, Category::Restaurants);

    let found = session.bootstrap(GeolocationBootstrap::new(Unavailable)).await;

    assert!(matches!(found, Err(LocationError::ServiceUnavailable)));
    assert_eq!(session.store().coordinates(), None);
}

#[tokio::test]
async fn test_refresh_reissues_fetches() {
    let places = GatedPlaces::default();
    let weather = InstantWeather::default();
    let mut session = Session::new(places.clone(), weather.clone(), Category::Restaurants);

    session.refresh();
    assert_eq!(session.store().generation(), 0);

    session.set_coordinates(seattle());
    session.set_bounds(Some(bounds_around(seattle())));
    settle(&mut session).await;
    session.refresh();
    settle(&mut session).await;

    assert_eq!(session.store().generation(), 2);
    assert_eq!(places.calls(), 2);
    assert_eq!(weather.calls(), 2);
}

#[test]
fn test_mutators_work_outside_the_runtime() {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let places = GatedPlaces::default();
    let weather = InstantWeather::default();
    let mut session = Session::with_runtime(
        places.clone(),
        weather.clone(),
        Category::Restaurants,
        runtime.handle().clone(),
    );

    let gate = places.expect(Category::Restaurants);
    session.set_coordinates(seattle());
    session.set_bounds(Some(bounds_around(seattle())));
    assert!(session.store().is_loading());

    gate.send(Ok(vec![raw("A", 4.1, 2.0)])).unwrap();
    runtime.block_on(settle(&mut session));

    assert!(!session.store().is_loading());
    assert_eq!(displayed_names(&session), vec!["A"]);
    assert_eq!(weather.calls(), 1);
}
