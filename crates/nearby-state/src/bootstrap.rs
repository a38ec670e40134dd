use nearby_core::{Coordinates, LocationError};
use nearby_geo::LocationSource;

/// Startup device location request.
///
/// `run` consumes the bootstrap, so the lookup happens at most once and is
/// never re-triggered by later state changes. No retry, no timeout of its own.
pub struct GeolocationBootstrap<L> {
    source: L,
}

impl<L: LocationSource> GeolocationBootstrap<L> {
    pub fn new(source: L) -> Self {
        Self { source }
    }

    pub async fn run(self) -> Result<Coordinates, LocationError> {
        let result = self.source.locate().await;
        match &result {
            Ok(coords) => tracing::info!("Got location: {}", coords),
            Err(e) => tracing::warn!("Device location unavailable: {}", e),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nearby_geo::FixedLocation;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Denied(Arc<AtomicUsize>);

    impl LocationSource for Denied {
        async fn locate(&self) -> Result<Coordinates, LocationError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Err(LocationError::PermissionDenied)
        }
    }

    #[tokio::test]
    async fn test_success_yields_coordinates() {
        let coords = Coordinates::new(47.6, -122.3);
        let found = GeolocationBootstrap::new(FixedLocation(coords)).run().await;
        assert_eq!(found.ok(), Some(coords));
    }

    #[tokio::test]
    async fn test_denied_yields_nothing_and_asks_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let found = GeolocationBootstrap::new(Denied(Arc::clone(&calls))).run().await;
        assert!(matches!(found, Err(LocationError::PermissionDenied)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
