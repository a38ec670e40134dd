//! Geographic primitives shared by every crate in the workspace.
//!
//! Both types are plain values: they are created by an external source
//! (device, map surface, autocomplete) and only ever replaced wholesale.

use serde::{Deserialize, Serialize};

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// True if both components are finite and inside the WGS84 ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Shift by the given deltas, clamping latitude and wrapping longitude.
    pub fn offset(&self, dlat: f64, dlng: f64) -> Self {
        let lat = (self.lat + dlat).clamp(-90.0, 90.0);
        Self {
            lat,
            lng: wrap_longitude(self.lng + dlng),
        }
    }
}

/// Normalise any longitude into `[-180, 180)`.
pub fn wrap_longitude(lng: f64) -> f64 {
    (lng + 180.0).rem_euclid(360.0) - 180.0
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.lat, self.lng)
    }
}

/// The rectangle currently visible on the map, as southwest/northeast corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportBounds {
    pub sw: Coordinates,
    pub ne: Coordinates,
}

impl ViewportBounds {
    pub fn new(sw: Coordinates, ne: Coordinates) -> Self {
        Self { sw, ne }
    }

    /// Bounds of a viewport centered on `center` spanning `span_degrees` in each axis.
    ///
    /// This is what a map surface reports after recentering.
    pub fn around(center: Coordinates, span_degrees: f64) -> Self {
        let half = span_degrees.abs() / 2.0;
        Self {
            sw: Coordinates::new((center.lat - half).max(-90.0), wrap_longitude(center.lng - half)),
            ne: Coordinates::new((center.lat + half).min(90.0), wrap_longitude(center.lng + half)),
        }
    }

    pub fn center(&self) -> Coordinates {
        Coordinates::new(
            (self.sw.lat + self.ne.lat) / 2.0,
            (self.sw.lng + self.ne.lng) / 2.0,
        )
    }

    pub fn contains(&self, point: &Coordinates) -> bool {
        point.lat >= self.sw.lat
            && point.lat <= self.ne.lat
            && point.lng >= self.sw.lng
            && point.lng <= self.ne.lng
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_around_is_centered() {
        let center = Coordinates::new(47.6, -122.3);
        let bounds = ViewportBounds::around(center, 0.1);
        assert!((bounds.sw.lat - 47.55).abs() < 1e-9);
        assert!((bounds.ne.lng - -122.25).abs() < 1e-9);
        let c = bounds.center();
        assert!((c.lat - center.lat).abs() < 1e-9);
        assert!((c.lng - center.lng).abs() < 1e-9);
    }

    #[test]
    fn test_around_clamps_latitude() {
        let bounds = ViewportBounds::around(Coordinates::new(89.9, 0.0), 1.0);
        assert_eq!(bounds.ne.lat, 90.0);
    }

    #[test]
    fn test_contains() {
        let bounds = ViewportBounds::around(Coordinates::new(0.0, 0.0), 2.0);
        assert!(bounds.contains(&Coordinates::new(0.5, -0.5)));
        assert!(!bounds.contains(&Coordinates::new(1.5, 0.0)));
    }

    #[test]
    fn test_offset_wraps_longitude() {
        let c = Coordinates::new(10.0, 179.5).offset(0.0, 1.0);
        assert!((c.lng - -179.5).abs() < 1e-9);
        let c = Coordinates::new(89.5, 0.0).offset(1.0, 0.0);
        assert_eq!(c.lat, 90.0);
    }

    #[test]
    fn test_offset_wraps_any_distance() {
        let c = Coordinates::new(0.0, 0.0).offset(0.0, 1000.0);
        assert!((c.lng - -80.0).abs() < 1e-9);
        let c = Coordinates::new(0.0, 0.0).offset(0.0, -1000.0);
        assert!((c.lng - 80.0).abs() < 1e-9);
        assert!(c.is_valid());
    }

    #[test]
    fn test_around_wraps_corner_longitudes() {
        let bounds = ViewportBounds::around(Coordinates::new(0.0, 539.0), 2.0);
        assert!((bounds.sw.lng - 178.0).abs() < 1e-9);
        assert!((bounds.ne.lng - -180.0).abs() < 1e-9);
    }

    #[test]
    fn test_is_valid() {
        assert!(Coordinates::new(47.6, -122.3).is_valid());
        assert!(!Coordinates::new(91.0, 0.0).is_valid());
        assert!(!Coordinates::new(f64::NAN, 0.0).is_valid());
    }
}
